//! In-memory storage backend.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use agentnet_core::{
    extract_mentions, AgentRuntime, Message, MessageId, MessageOrder, NetworkResult, NewMessage,
    NewThread, StorageError, Thread, ThreadId, Timestamp,
};

use crate::NetworkStorage;

/// Per-message mention tally, keyed by agent key then thread.
type MentionIndex = HashMap<String, BTreeMap<ThreadId, BTreeMap<MessageId, usize>>>;

/// Threads, messages and the id counters share one lock so that id
/// allocation and appends are linearizable.
#[derive(Debug, Default)]
struct ThreadTables {
    threads: BTreeMap<ThreadId, Thread>,
    messages: BTreeMap<MessageId, Message>,
    /// Message ids per thread in append (= id) order.
    thread_messages: HashMap<ThreadId, Vec<MessageId>>,
    mentions: MentionIndex,
    last_thread_id: ThreadId,
    last_message_id: MessageId,
}

impl ThreadTables {
    fn index_mentions(&mut self, message: &Message) {
        for key in extract_mentions(&message.content) {
            *self
                .mentions
                .entry(key)
                .or_default()
                .entry(message.thread_id)
                .or_default()
                .entry(message.id)
                .or_insert(0) += 1;
        }
    }

    fn unindex_mentions(&mut self, message: &Message) {
        for key in extract_mentions(&message.content) {
            if let Some(by_thread) = self.mentions.get_mut(&key) {
                if let Some(by_message) = by_thread.get_mut(&message.thread_id) {
                    by_message.remove(&message.id);
                    if by_message.is_empty() {
                        by_thread.remove(&message.thread_id);
                    }
                }
                if by_thread.is_empty() {
                    self.mentions.remove(&key);
                }
            }
        }
    }
}

/// In-memory storage. Cloning shares the underlying tables.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStorage {
    agents: Arc<RwLock<BTreeMap<String, AgentRuntime>>>,
    tables: Arc<RwLock<ThreadTables>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn agents_read(&self) -> NetworkResult<RwLockReadGuard<'_, BTreeMap<String, AgentRuntime>>> {
        self.agents.read().map_err(|_| StorageError::LockPoisoned.into())
    }

    fn agents_write(&self) -> NetworkResult<RwLockWriteGuard<'_, BTreeMap<String, AgentRuntime>>> {
        self.agents.write().map_err(|_| StorageError::LockPoisoned.into())
    }

    fn tables_read(&self) -> NetworkResult<RwLockReadGuard<'_, ThreadTables>> {
        self.tables.read().map_err(|_| StorageError::LockPoisoned.into())
    }

    fn tables_write(&self) -> NetworkResult<RwLockWriteGuard<'_, ThreadTables>> {
        self.tables.write().map_err(|_| StorageError::LockPoisoned.into())
    }
}

impl NetworkStorage for InMemoryStorage {
    // === Agent Operations ===

    fn agent_upsert_batch(&self, agents: Vec<AgentRuntime>) -> NetworkResult<()> {
        let mut table = self.agents_write()?;
        for mut agent in agents {
            let key = agent.key();
            if let Some(existing) = table.get(&key) {
                agent.registered_at = existing.registered_at;
            }
            table.insert(key, agent);
        }
        Ok(())
    }

    fn agent_get(&self, key: &str) -> NetworkResult<Option<AgentRuntime>> {
        Ok(self.agents_read()?.get(key).cloned())
    }

    fn agent_list(&self) -> NetworkResult<Vec<AgentRuntime>> {
        Ok(self.agents_read()?.values().cloned().collect())
    }

    fn agent_remove(&self, keys: &[String]) -> NetworkResult<Vec<String>> {
        let mut table = self.agents_write()?;
        Ok(keys
            .iter()
            .filter_map(|key| table.remove(key))
            .map(|agent| agent.info.name)
            .collect())
    }

    fn agent_touch(&self, keys: &[String], now: Timestamp) -> NetworkResult<()> {
        let mut table = self.agents_write()?;
        for key in keys {
            if let Some(agent) = table.get_mut(key) {
                agent.heartbeat(now);
            }
        }
        Ok(())
    }

    fn agent_remove_stale(&self, cutoff: Timestamp) -> NetworkResult<Vec<String>> {
        let mut table = self.agents_write()?;
        let mut removed = Vec::new();
        table.retain(|_, agent| {
            let keep = agent.last_live_at >= cutoff;
            if !keep {
                removed.push(agent.info.name.clone());
            }
            keep
        });
        Ok(removed)
    }

    // === Thread Operations ===

    fn thread_insert(&self, thread: NewThread, now: Timestamp) -> NetworkResult<Thread> {
        let mut tables = self.tables_write()?;
        let id = tables.last_thread_id.next();
        if tables.threads.contains_key(&id) {
            return Err(StorageError::IdConflict {
                entity: "thread".to_string(),
                id: id.get(),
            }
            .into());
        }
        let thread = thread.into_thread(id, now);
        tables.last_thread_id = id;
        tables.threads.insert(id, thread.clone());
        Ok(thread)
    }

    fn thread_get(&self, id: ThreadId) -> NetworkResult<Option<Thread>> {
        Ok(self.tables_read()?.threads.get(&id).cloned())
    }

    fn thread_list_desc(&self, cursor: ThreadId, take: usize) -> NetworkResult<Vec<Thread>> {
        let tables = self.tables_read()?;
        let threads: Vec<Thread> = if cursor.is_none() {
            tables.threads.values().rev().take(take).cloned().collect()
        } else {
            tables
                .threads
                .range(..cursor)
                .rev()
                .take(take)
                .map(|(_, t)| t.clone())
                .collect()
        };
        Ok(threads)
    }

    // === Message Operations ===

    fn message_append(&self, message: NewMessage, now: Timestamp) -> NetworkResult<Message> {
        let mut tables = self.tables_write()?;
        let thread_id = message.thread_id;
        match tables.threads.get_mut(&thread_id) {
            Some(thread) => thread.updated_at = now,
            None => return Err(StorageError::ThreadNotFound { id: thread_id }.into()),
        }

        let id = tables.last_message_id.next();
        let message = message.into_message(id, now);
        tables.last_message_id = id;
        tables.index_mentions(&message);
        tables.thread_messages.entry(thread_id).or_default().push(id);
        tables.messages.insert(id, message.clone());
        Ok(message)
    }

    fn message_list(
        &self,
        thread_id: ThreadId,
        order: MessageOrder,
        cursor: MessageId,
        take: usize,
    ) -> NetworkResult<Vec<Message>> {
        let tables = self.tables_read()?;
        let Some(ids) = tables.thread_messages.get(&thread_id) else {
            return Ok(Vec::new());
        };

        let live = |id: &&MessageId| {
            order.is_after_cursor(id.get(), cursor.get())
                && tables.messages.get(*id).is_some_and(|m| !m.is_deleted())
        };
        let pick = |id: &MessageId| tables.messages.get(id).cloned();

        let messages: Vec<Message> = match order {
            MessageOrder::Oldest => ids.iter().filter(live).take(take).filter_map(pick).collect(),
            MessageOrder::Latest => ids
                .iter()
                .rev()
                .filter(live)
                .take(take)
                .filter_map(pick)
                .collect(),
        };
        Ok(messages)
    }

    fn message_count(&self, thread_id: ThreadId) -> NetworkResult<usize> {
        let tables = self.tables_read()?;
        let count = tables
            .thread_messages
            .get(&thread_id)
            .map(|ids| {
                ids.iter()
                    .filter(|id| tables.messages.get(*id).is_some_and(|m| !m.is_deleted()))
                    .count()
            })
            .unwrap_or(0);
        Ok(count)
    }

    fn message_soft_delete(&self, id: MessageId, now: Timestamp) -> NetworkResult<Message> {
        let mut tables = self.tables_write()?;
        let message = match tables.messages.get_mut(&id) {
            Some(message) => message,
            None => return Err(StorageError::MessageNotFound { id }.into()),
        };
        if message.is_deleted() {
            return Ok(message.clone());
        }
        message.deleted_at = Some(now);
        message.updated_at = now;
        let deleted = message.clone();
        tables.unindex_mentions(&deleted);
        Ok(deleted)
    }

    fn mention_counts(&self, agent_key: &str) -> NetworkResult<BTreeMap<ThreadId, usize>> {
        let tables = self.tables_read()?;
        let counts = tables
            .mentions
            .get(agent_key)
            .map(|by_thread| {
                by_thread
                    .iter()
                    .map(|(thread_id, by_message)| (*thread_id, by_message.values().sum::<usize>()))
                    .filter(|(_, total)| *total > 0)
                    .collect()
            })
            .unwrap_or_default();
        Ok(counts)
    }
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod prop_tests {
    use super::*;
    use agentnet_core::now;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: message ids are strictly increasing in append order
        /// regardless of how appends interleave between threads.
        #[test]
        fn prop_message_ids_strictly_increase(targets in prop::collection::vec(0usize..3, 1..40)) {
            let storage = InMemoryStorage::new();
            let threads: Vec<ThreadId> = (0..3)
                .map(|_| storage.thread_insert(NewThread::new(), now()).unwrap().id)
                .collect();

            let mut last = MessageId::NONE;
            for t in targets {
                let msg = storage
                    .message_append(NewMessage::new(threads[t], "USER", "x"), now())
                    .unwrap();
                prop_assert!(msg.id > last);
                last = msg.id;
            }
        }

        /// Property: listing `latest` is the reverse of listing `oldest`.
        #[test]
        fn prop_latest_reverses_oldest(n in 0usize..30, deletes in prop::collection::vec(any::<bool>(), 30)) {
            let storage = InMemoryStorage::new();
            let thread_id = storage.thread_insert(NewThread::new(), now()).unwrap().id;
            for i in 0..n {
                let msg = storage
                    .message_append(NewMessage::new(thread_id, "USER", "x"), now())
                    .unwrap();
                if deletes[i] {
                    storage.message_soft_delete(msg.id, now()).unwrap();
                }
            }
            let oldest = storage.message_list(thread_id, MessageOrder::Oldest, MessageId::NONE, 100).unwrap();
            let mut latest = storage.message_list(thread_id, MessageOrder::Latest, MessageId::NONE, 100).unwrap();
            latest.reverse();
            prop_assert_eq!(oldest, latest);
        }
    }
}
