//! Agent Network Threads - Conversations and Messages
//!
//! `ThreadStore` owns thread creation and listing. `MessageLog` owns the
//! per-thread message sequence, its cursor pagination and mention-once
//! detection. Both share one `NetworkStorage` handle.

pub mod log;
pub mod store;

pub use log::MessageLog;
pub use store::ThreadStore;
