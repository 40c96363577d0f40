#![forbid(unsafe_code)]

//! Pagination cursor of one feed instance.

use serde::{Deserialize, Serialize};

/// Where a feed is and whether it may fetch again.
///
/// `blocked` guards against concurrent fetches and clears once a page is
/// classified; `exhausted` is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCursor {
    pub page: u64,
    pub blocked: bool,
    pub exhausted: bool,
    pub source_url: String,
}

impl FeedCursor {
    #[must_use]
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            page: 0,
            blocked: false,
            exhausted: false,
            source_url: source_url.into(),
        }
    }

    /// True when a scroll trigger may start a fetch.
    #[must_use]
    pub fn accepts_trigger(&self) -> bool {
        !self.blocked && !self.exhausted
    }

    /// URL of `page`, with `page=N` appended to the source query.
    #[must_use]
    pub fn page_url(&self, page: u64) -> String {
        let separator = match self.source_url.find('?') {
            None => "?",
            Some(at) if at + 1 == self.source_url.len() || self.source_url.ends_with('&') => "",
            Some(_) => "&",
        };
        format!("{}{separator}page={page}", self.source_url)
    }
}
