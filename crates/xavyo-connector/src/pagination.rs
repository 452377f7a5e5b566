//! Cursor-based pagination between the host orchestrator and a syncer.
//!
//! Each call handles exactly one page. An empty input token starts from the
//! beginning; an empty output token means there are no further pages.

use serde::{Deserialize, Serialize};

/// Page request passed in by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PageToken {
    /// Requested page size; 0 lets the connector choose.
    #[serde(default)]
    pub size: u32,
    /// Opaque cursor from the previous page; empty for the first page.
    #[serde(default)]
    pub token: String,
}

impl PageToken {
    /// A request for the first page.
    #[must_use]
    pub fn first() -> Self {
        Self::default()
    }

    /// A request continuing from `token`.
    pub fn resume(token: impl Into<String>) -> Self {
        Self {
            size: 0,
            token: token.into(),
        }
    }

    /// Set the page size.
    #[must_use]
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// The cursor, or `None` when starting from the beginning.
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        if self.token.is_empty() {
            None
        } else {
            Some(&self.token)
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the next page; empty when done.
    #[serde(default)]
    pub next_page_token: String,
}

impl<T> Page<T> {
    /// A final page.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page_token: String::new(),
        }
    }

    /// A page followed by more; an empty `next` also marks the final page.
    pub fn with_next(items: Vec<T>, next: impl Into<String>) -> Self {
        Self {
            items,
            next_page_token: next.into(),
        }
    }

    /// An empty final page.
    pub fn empty() -> Self {
        Self::last(Vec::new())
    }

    /// Whether more pages follow.
    #[must_use]
    pub fn has_more(&self) -> bool {
        !self.next_page_token.is_empty()
    }
}
