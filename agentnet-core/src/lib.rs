//! Agent Network Core - Entity Types
//!
//! Data types shared by every Agent Network crate: identifiers, agents,
//! threads, messages, pagination, mention detection and the error taxonomy.
//! This crate contains no I/O.

pub mod entities;
pub mod error;
pub mod identity;
pub mod mention;
pub mod pagination;
pub mod validation;

pub use entities::{
    AgentInfo, AgentRuntime, Message, MessageToolCall, Metadata, NewMessage, NewThread, Thread,
};
pub use error::{
    ConfigError, LivenessError, NetworkError, NetworkResult, StorageError, ValidationError,
};
pub use identity::{agent_key, is_user_sender, now, MessageId, ThreadId, Timestamp, USER_SENDER};
pub use mention::{count_mentions, extract_mentions};
pub use pagination::{
    resolve_limit, MessageOrder, Page, DEFAULT_MESSAGE_PAGE_SIZE, DEFAULT_THREAD_PAGE_SIZE,
    MAX_MESSAGE_PAGE_SIZE, MAX_THREAD_PAGE_SIZE,
};
pub use validation::ValidateNonEmpty;
