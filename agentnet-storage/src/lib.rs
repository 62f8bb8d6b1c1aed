//! Agent Network Storage Layer
//!
//! The `NetworkStorage` trait is the durable get/put seam consumed by the
//! registry, thread store and message log. Every mutating operation is a
//! single transaction: id allocation, upserts and appends happen under one
//! write lock so callers never observe a partial record.

mod memory;

pub use memory::InMemoryStorage;

use agentnet_core::{
    AgentRuntime, Message, MessageId, MessageOrder, NetworkResult, NewMessage, NewThread, Thread,
    ThreadId, Timestamp,
};
use std::collections::BTreeMap;

// ============================================================================
// STORAGE TRAIT
// ============================================================================

/// Storage backend for agents, threads and messages.
///
/// Agent keys are the case-insensitive names produced by
/// [`agentnet_core::agent_key`].
pub trait NetworkStorage: Send + Sync {
    // === Agent Operations ===

    /// Insert or overwrite every record in one transaction. An existing
    /// record keeps its original `registered_at`.
    fn agent_upsert_batch(&self, agents: Vec<AgentRuntime>) -> NetworkResult<()>;

    /// Get an agent by key.
    fn agent_get(&self, key: &str) -> NetworkResult<Option<AgentRuntime>>;

    /// List all agents ordered by key.
    fn agent_list(&self) -> NetworkResult<Vec<AgentRuntime>>;

    /// Remove agents by key. Returns the names actually removed.
    fn agent_remove(&self, keys: &[String]) -> NetworkResult<Vec<String>>;

    /// Advance `last_live_at` for the given keys. Unknown keys are skipped.
    fn agent_touch(&self, keys: &[String], now: Timestamp) -> NetworkResult<()>;

    /// Remove agents whose `last_live_at` is before `cutoff`.
    fn agent_remove_stale(&self, cutoff: Timestamp) -> NetworkResult<Vec<String>>;

    // === Thread Operations ===

    /// Allocate the next thread id and store the thread.
    fn thread_insert(&self, thread: NewThread, now: Timestamp) -> NetworkResult<Thread>;

    /// Get a thread by id.
    fn thread_get(&self, id: ThreadId) -> NetworkResult<Option<Thread>>;

    /// Threads with id strictly below `cursor` (or all when `cursor` is
    /// none), newest first, at most `take` of them.
    fn thread_list_desc(&self, cursor: ThreadId, take: usize) -> NetworkResult<Vec<Thread>>;

    // === Message Operations ===

    /// Allocate the next message id and append to an existing thread.
    /// Fails with `ThreadNotFound` if the thread does not exist.
    fn message_append(&self, message: NewMessage, now: Timestamp) -> NetworkResult<Message>;

    /// Non-deleted messages of a thread past `cursor` in `order`, at most
    /// `take` of them.
    fn message_list(
        &self,
        thread_id: ThreadId,
        order: MessageOrder,
        cursor: MessageId,
        take: usize,
    ) -> NetworkResult<Vec<Message>>;

    /// Count of non-deleted messages in a thread.
    fn message_count(&self, thread_id: ThreadId) -> NetworkResult<usize>;

    /// Mark a message deleted. Deleting twice keeps the first timestamp.
    fn message_soft_delete(&self, id: MessageId, now: Timestamp) -> NetworkResult<Message>;

    /// Mention totals of `agent_key` per thread, over non-deleted messages.
    /// Threads without mentions are absent.
    fn mention_counts(&self, agent_key: &str) -> NetworkResult<BTreeMap<ThreadId, usize>>;
}
