//! Identity types for Agent Network entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Reserved sender name for messages authored by the human caller.
pub const USER_SENDER: &str = "USER";

macro_rules! define_numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Sentinel used by cursors to mean "no position".
            pub const NONE: Self = Self(0);

            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> u64 {
                self.0
            }

            pub const fn is_none(self) -> bool {
                self.0 == 0
            }

            /// The id following this one. Ids start at 1.
            pub const fn next(self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_numeric_id!(
    /// Store-assigned thread identifier, monotonically increasing from 1.
    ThreadId
);

define_numeric_id!(
    /// Log-wide message identifier. Id order is chronological order.
    MessageId
);

/// Canonical registry key for an agent name.
///
/// Names are unique case-insensitively, so every lookup goes through this.
pub fn agent_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Returns true if `sender` is the reserved user sender.
pub fn is_user_sender(sender: &str) -> bool {
    sender == USER_SENDER
}

/// Current time, the single clock source for entity timestamps.
pub fn now() -> Timestamp {
    Utc::now()
}
