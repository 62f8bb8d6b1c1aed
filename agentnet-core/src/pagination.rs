//! Cursor pagination types shared by thread and message listings.
//!
//! Cursors are entity ids. A cursor is exclusive and `0` means "start from the
//! end selected by the ordering".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

// ============================================================================
// LIMITS
// ============================================================================

/// Default page size for `GetThreads`.
pub const DEFAULT_THREAD_PAGE_SIZE: usize = 20;

/// Upper bound for a `GetThreads` page.
pub const MAX_THREAD_PAGE_SIZE: usize = 100;

/// Default page size for `GetMessages`.
pub const DEFAULT_MESSAGE_PAGE_SIZE: usize = 50;

/// Upper bound for a `GetMessages` page.
pub const MAX_MESSAGE_PAGE_SIZE: usize = 1000;

/// Resolves a caller-supplied limit. `None` and `0` fall back to the default;
/// anything above `max` is clamped.
pub fn resolve_limit(requested: Option<usize>, default: usize, max: usize) -> usize {
    match requested {
        None | Some(0) => default.min(max),
        Some(n) => n.min(max),
    }
}

// ============================================================================
// ORDERING
// ============================================================================

/// Direction of a message listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageOrder {
    /// Newest first (id descending).
    Latest,
    /// Oldest first (id ascending).
    Oldest,
}

impl MessageOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageOrder::Latest => "latest",
            MessageOrder::Oldest => "oldest",
        }
    }

    /// Whether `id` lies strictly past `cursor` in this direction.
    /// A zero cursor admits every id.
    pub fn is_after_cursor(self, id: u64, cursor: u64) -> bool {
        if cursor == 0 {
            return true;
        }
        match self {
            MessageOrder::Latest => id < cursor,
            MessageOrder::Oldest => id > cursor,
        }
    }
}

impl fmt::Display for MessageOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(MessageOrder::Latest),
            "oldest" => Ok(MessageOrder::Oldest),
            other => Err(ValidationError::InvalidValue {
                field: "order".to_string(),
                reason: format!("expected 'latest' or 'oldest', got '{}'", other),
            }),
        }
    }
}

// ============================================================================
// PAGE
// ============================================================================

/// One page of results plus the cursor for the next page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Id of the last returned item when more items remain.
    pub next_cursor: Option<u64>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }

    /// Builds a page from up to `limit + 1` candidates already in output
    /// order. The extra candidate only signals that another page exists.
    pub fn from_overfetch(mut candidates: Vec<T>, limit: usize, id_of: impl Fn(&T) -> u64) -> Self {
        let has_more = candidates.len() > limit;
        candidates.truncate(limit);
        let next_cursor = if has_more {
            candidates.last().map(&id_of)
        } else {
            None
        };
        Self {
            items: candidates,
            next_cursor,
        }
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_limit() {
        assert_eq!(resolve_limit(None, 50, 1000), 50);
        assert_eq!(resolve_limit(Some(0), 50, 1000), 50);
        assert_eq!(resolve_limit(Some(2), 50, 1000), 2);
        assert_eq!(resolve_limit(Some(5000), 50, 1000), 1000);
    }

    #[test]
    fn test_order_parse() {
        assert_eq!("latest".parse::<MessageOrder>().unwrap(), MessageOrder::Latest);
        assert_eq!("oldest".parse::<MessageOrder>().unwrap(), MessageOrder::Oldest);
        assert!("newest".parse::<MessageOrder>().is_err());
        assert!("LATEST".parse::<MessageOrder>().is_err());
    }

    #[test]
    fn test_cursor_direction() {
        assert!(MessageOrder::Latest.is_after_cursor(2, 3));
        assert!(!MessageOrder::Latest.is_after_cursor(3, 3));
        assert!(MessageOrder::Oldest.is_after_cursor(4, 3));
        assert!(MessageOrder::Oldest.is_after_cursor(1, 0));
    }

    #[test]
    fn test_page_from_overfetch() {
        let page = Page::from_overfetch(vec![1u64, 2, 3], 2, |v| *v);
        assert_eq!(page.items, vec![1, 2]);
        assert_eq!(page.next_cursor, Some(2));

        let last = Page::from_overfetch(vec![3u64], 2, |v| *v);
        assert_eq!(last.items, vec![3]);
        assert!(!last.has_more());
    }
}
