#![forbid(unsafe_code)]

//! History state objects for pseudo-navigation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marker stored in `state.page` for entries written by the navigator.
pub const PAGE_MARKER: &str = "page";

/// The object handed to `history.pushState` / `replaceState`.
///
/// `content` is a full serialized body snapshot: restoring it needs no
/// network access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    pub page: String,
    pub content: String,
}

impl HistoryState {
    #[must_use]
    pub fn page(content: impl Into<String>) -> Self {
        Self {
            page: PAGE_MARKER.to_owned(),
            content: content.into(),
        }
    }

    /// Decode a popped state object, ignoring states written by others.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let state: Self = serde_json::from_value(value.clone()).ok()?;
        (state.page == PAGE_MARKER).then_some(state)
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "page": self.page, "content": self.content })
    }
}

/// A URL together with the snapshot that restores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub url: String,
    pub content: String,
}

impl From<HistoryEntry> for HistoryState {
    fn from(entry: HistoryEntry) -> Self {
        Self::page(entry.content)
    }
}
