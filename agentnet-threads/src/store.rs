//! Thread store.

use std::sync::Arc;

use tracing::debug;

use agentnet_core::{
    now, resolve_limit, NetworkResult, NewThread, Page, StorageError, Thread, ThreadId,
    DEFAULT_THREAD_PAGE_SIZE, MAX_THREAD_PAGE_SIZE,
};
use agentnet_storage::NetworkStorage;

/// Creates and reads threads.
#[derive(Clone)]
pub struct ThreadStore {
    storage: Arc<dyn NetworkStorage>,
}

impl ThreadStore {
    pub fn new(storage: Arc<dyn NetworkStorage>) -> Self {
        Self { storage }
    }

    /// Create a thread and return its freshly allocated id.
    pub fn create(&self, thread: NewThread) -> NetworkResult<ThreadId> {
        let thread = self.storage.thread_insert(thread, now())?;
        debug!(thread_id = %thread.id, participants = thread.participants.len(), "Created thread");
        Ok(thread.id)
    }

    pub fn get(&self, id: ThreadId) -> NetworkResult<Thread> {
        self.storage
            .thread_get(id)?
            .ok_or_else(|| StorageError::ThreadNotFound { id }.into())
    }

    /// Newest-first page of threads strictly below `cursor`.
    pub fn list(&self, cursor: ThreadId, limit: Option<usize>) -> NetworkResult<Page<Thread>> {
        let limit = resolve_limit(limit, DEFAULT_THREAD_PAGE_SIZE, MAX_THREAD_PAGE_SIZE);
        let candidates = self.storage.thread_list_desc(cursor, limit + 1)?;
        Ok(Page::from_overfetch(candidates, limit, |t| t.id.get()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentnet_storage::InMemoryStorage;
    use std::collections::BTreeMap;

    fn store() -> ThreadStore {
        ThreadStore::new(Arc::new(InMemoryStorage::new()))
    }

    #[test]
    fn test_create_and_get() {
        let store = store();
        let mut metadata = BTreeMap::new();
        metadata.insert("topic".to_string(), "travel".to_string());
        let id = store
            .create(
                NewThread::new()
                    .with_instruction("plan")
                    .with_participants(["a", "b", "A"])
                    .with_metadata(metadata.clone()),
            )
            .unwrap();
        let thread = store.get(id).unwrap();
        assert_eq!(thread.participants, vec!["a", "b"]);
        assert_eq!(thread.metadata, metadata);
    }

    #[test]
    fn test_get_missing_thread() {
        let err = store().get(ThreadId::new(1)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_list_pages_through_all_threads() {
        let store = store();
        for _ in 0..5 {
            store.create(NewThread::new()).unwrap();
        }

        let first = store.list(ThreadId::NONE, Some(2)).unwrap();
        assert_eq!(first.items.iter().map(|t| t.id.get()).collect::<Vec<_>>(), vec![5, 4]);
        assert_eq!(first.next_cursor, Some(4));

        let second = store.list(ThreadId::new(4), Some(2)).unwrap();
        assert_eq!(second.items.iter().map(|t| t.id.get()).collect::<Vec<_>>(), vec![3, 2]);

        let last = store.list(ThreadId::new(2), Some(2)).unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.next_cursor, None);
    }

    #[test]
    fn test_list_default_limit() {
        let store = store();
        for _ in 0..(DEFAULT_THREAD_PAGE_SIZE + 1) {
            store.create(NewThread::new()).unwrap();
        }
        let page = store.list(ThreadId::NONE, None).unwrap();
        assert_eq!(page.items.len(), DEFAULT_THREAD_PAGE_SIZE);
        assert!(page.has_more());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_get_distinct_ids() {
        let store = store();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                (0..25)
                    .map(|_| store.create(NewThread::new()).unwrap())
                    .collect::<Vec<_>>()
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            let ids = handle.await.unwrap();
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
            all.extend(ids);
        }
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 200);
    }
}
