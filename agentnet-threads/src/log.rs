//! Message log: append, paginated reads, counts and mention detection.

use std::sync::Arc;

use tracing::debug;

use agentnet_core::{
    agent_key, is_user_sender, now, resolve_limit, Message, MessageId, MessageOrder,
    NetworkResult, NewMessage, Page, StorageError, Thread, ThreadId, ValidateNonEmpty,
    ValidationError, DEFAULT_MESSAGE_PAGE_SIZE, MAX_MESSAGE_PAGE_SIZE,
};
use agentnet_storage::NetworkStorage;

/// Append-only per-thread message sequence with soft deletes.
#[derive(Clone)]
pub struct MessageLog {
    storage: Arc<dyn NetworkStorage>,
}

impl MessageLog {
    pub fn new(storage: Arc<dyn NetworkStorage>) -> Self {
        Self { storage }
    }

    fn thread(&self, id: ThreadId) -> NetworkResult<Thread> {
        self.storage
            .thread_get(id)?
            .ok_or_else(|| StorageError::ThreadNotFound { id }.into())
    }

    /// Append a message and return its id.
    ///
    /// Threads with a participant list only accept messages from those
    /// participants or from the user.
    pub fn append(&self, message: NewMessage) -> NetworkResult<MessageId> {
        message.validate()?;
        let thread = self.thread(message.thread_id)?;
        if !thread.is_open()
            && !is_user_sender(&message.sender)
            && !thread.has_participant(&message.sender)
        {
            return Err(ValidationError::NotAParticipant {
                thread_id: thread.id,
                sender: message.sender,
            }
            .into());
        }

        let stored = self.storage.message_append(message, now())?;
        debug!(
            thread_id = %stored.thread_id,
            message_id = %stored.id,
            sender = %stored.sender,
            tool_calls = stored.tool_calls.len(),
            "Appended message"
        );
        Ok(stored.id)
    }

    /// One page of non-deleted messages past `cursor` in `order`.
    ///
    /// `next_cursor` is the id of the last returned message when more remain.
    /// An unknown thread reads as an empty page.
    pub fn list(
        &self,
        thread_id: ThreadId,
        order: MessageOrder,
        cursor: MessageId,
        limit: Option<usize>,
    ) -> NetworkResult<Page<Message>> {
        if self.storage.thread_get(thread_id)?.is_none() {
            return Ok(Page::empty());
        }
        let limit = resolve_limit(limit, DEFAULT_MESSAGE_PAGE_SIZE, MAX_MESSAGE_PAGE_SIZE);
        let candidates = self
            .storage
            .message_list(thread_id, order, cursor, limit + 1)?;
        Ok(Page::from_overfetch(candidates, limit, |m| m.id.get()))
    }

    /// Number of non-deleted messages in a thread.
    pub fn count(&self, thread_id: ThreadId) -> NetworkResult<usize> {
        self.thread(thread_id)?;
        self.storage.message_count(thread_id)
    }

    /// Soft-delete a message. Deleting an already deleted message succeeds.
    pub fn delete(&self, id: MessageId) -> NetworkResult<()> {
        let deleted = self.storage.message_soft_delete(id, now())?;
        debug!(thread_id = %deleted.thread_id, message_id = %id, "Deleted message");
        Ok(())
    }

    /// Ids of threads whose current messages mention `agent_name` exactly
    /// once in total, ascending.
    pub fn mentioned_once(&self, agent_name: &str) -> NetworkResult<Vec<ThreadId>> {
        agent_name.validate_non_empty("agent_name")?;
        let counts = self.storage.mention_counts(&agent_key(agent_name))?;
        Ok(counts
            .into_iter()
            .filter(|(_, total)| *total == 1)
            .map(|(thread_id, _)| thread_id)
            .collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ThreadStore;
    use agentnet_core::{MessageToolCall, NetworkError, NewThread, USER_SENDER};
    use agentnet_storage::InMemoryStorage;
    use serde_json::json;

    fn setup() -> (ThreadStore, MessageLog) {
        let storage: Arc<dyn NetworkStorage> = Arc::new(InMemoryStorage::new());
        (ThreadStore::new(storage.clone()), MessageLog::new(storage))
    }

    fn say(log: &MessageLog, thread_id: ThreadId, content: &str) -> MessageId {
        log.append(NewMessage::new(thread_id, USER_SENDER, content)).unwrap()
    }

    fn ids(page: &Page<Message>) -> Vec<MessageId> {
        page.items.iter().map(|m| m.id).collect()
    }

    #[test]
    fn test_three_message_pagination() {
        let (threads, log) = setup();
        let t = threads.create(NewThread::new()).unwrap();
        let m1 = say(&log, t, "one");
        let m2 = say(&log, t, "two");
        let m3 = say(&log, t, "three");

        let page = log.list(t, MessageOrder::Oldest, MessageId::NONE, Some(2)).unwrap();
        assert_eq!(ids(&page), vec![m1, m2]);
        assert_eq!(page.next_cursor, Some(m2.get()));

        let page = log.list(t, MessageOrder::Oldest, m2, Some(2)).unwrap();
        assert_eq!(ids(&page), vec![m3]);
        assert_eq!(page.next_cursor, None);

        let page = log.list(t, MessageOrder::Latest, MessageId::NONE, Some(2)).unwrap();
        assert_eq!(ids(&page), vec![m3, m2]);
    }

    #[test]
    fn test_list_unknown_thread_is_empty() {
        let (_, log) = setup();
        let page = log
            .list(ThreadId::new(42), MessageOrder::Latest, MessageId::NONE, None)
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn test_list_empty_thread() {
        let (threads, log) = setup();
        let t = threads.create(NewThread::new()).unwrap();
        let page = log.list(t, MessageOrder::Latest, MessageId::NONE, None).unwrap();
        assert!(page.items.is_empty());
        assert!(!page.has_more());
    }

    #[test]
    fn test_append_unknown_thread() {
        let (_, log) = setup();
        let err = log
            .append(NewMessage::new(ThreadId::new(7), USER_SENDER, "hi"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_closed_thread_rejects_outsiders() {
        let (threads, log) = setup();
        let t = threads
            .create(NewThread::new().with_participants(["planner"]))
            .unwrap();
        assert!(log.append(NewMessage::new(t, "Planner", "ok")).is_ok());
        assert!(log.append(NewMessage::new(t, USER_SENDER, "ok")).is_ok());
        let err = log.append(NewMessage::new(t, "writer", "nope")).unwrap_err();
        assert!(matches!(
            err,
            NetworkError::Validation(ValidationError::NotAParticipant { .. })
        ));
    }

    #[test]
    fn test_open_thread_accepts_anyone() {
        let (threads, log) = setup();
        let t = threads.create(NewThread::new()).unwrap();
        assert!(log.append(NewMessage::new(t, "anyone", "hello")).is_ok());
    }

    #[test]
    fn test_tool_call_requires_name() {
        let (threads, log) = setup();
        let t = threads.create(NewThread::new()).unwrap();
        let msg = NewMessage::new(t, USER_SENDER, "x").with_tool_call(MessageToolCall::new(" ", json!(null)));
        assert!(matches!(log.append(msg), Err(NetworkError::Validation(_))));
        assert_eq!(log.count(t).unwrap(), 0);
    }

    #[test]
    fn test_count_excludes_deleted() {
        let (threads, log) = setup();
        let t = threads.create(NewThread::new()).unwrap();
        let m1 = say(&log, t, "a");
        say(&log, t, "b");
        log.delete(m1).unwrap();
        log.delete(m1).unwrap();
        assert_eq!(log.count(t).unwrap(), 1);
        assert!(log.count(ThreadId::new(99)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_mentioned_once_lifecycle() {
        let (threads, log) = setup();
        let t = threads.create(NewThread::new()).unwrap();
        let first = say(&log, t, "@agent-x can you look?");
        assert_eq!(log.mentioned_once("agent-x").unwrap(), vec![t]);

        say(&log, t, "ping @AGENT-X.");
        assert!(log.mentioned_once("agent-x").unwrap().is_empty());

        log.delete(first).unwrap();
        assert_eq!(log.mentioned_once("Agent-X").unwrap(), vec![t]);
    }

    #[test]
    fn test_mentioned_once_across_threads() {
        let (threads, log) = setup();
        let t1 = threads.create(NewThread::new()).unwrap();
        let t2 = threads.create(NewThread::new()).unwrap();
        let t3 = threads.create(NewThread::new()).unwrap();
        say(&log, t1, "@bot hi");
        say(&log, t2, "@bot @bot");
        say(&log, t3, "bot without marker");
        say(&log, t3, "hey @bot");
        assert_eq!(log.mentioned_once("bot").unwrap(), vec![t1, t3]);
        assert!(log.mentioned_once("").is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_keep_order() {
        let (threads, log) = setup();
        let log = Arc::new(log);
        let t = threads.create(NewThread::new()).unwrap();

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let log = log.clone();
                tokio::spawn(async move {
                    log.append(NewMessage::new(t, USER_SENDER, format!("msg {}", i)))
                        .unwrap()
                })
            })
            .collect();
        let mut appended = Vec::new();
        for handle in handles {
            appended.push(handle.await.unwrap());
        }

        appended.sort();
        appended.dedup();
        assert_eq!(appended.len(), 32);

        let page = log.list(t, MessageOrder::Oldest, MessageId::NONE, Some(100)).unwrap();
        assert_eq!(ids(&page), appended);
        assert_eq!(page.items.len(), log.count(t).unwrap());
    }
}
