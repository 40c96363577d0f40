#![forbid(unsafe_code)]

//! In-memory browser history stack.

use serde_json::Value;

use quill_core::HistoryState;
use quill_runtime::HistoryHost;

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    state: Value,
    url: String,
}

/// Session history with `pushState`, `replaceState`, back and forward.
///
/// Pushing while not at the newest entry discards the forward entries, as
/// browsers do.
#[derive(Debug, Clone)]
pub struct WebHistory {
    entries: Vec<Entry>,
    index: usize,
}

impl WebHistory {
    /// A history holding one entry for `url` with a null state.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            entries: vec![Entry {
                state: Value::Null,
                url: url.into(),
            }],
            index: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// State object of the current entry.
    #[must_use]
    pub fn state(&self) -> &Value {
        &self.entries[self.index].state
    }

    /// Step back; returns the popstate payload.
    pub fn back(&mut self) -> Option<Value> {
        self.index = self.index.checked_sub(1)?;
        Some(self.state().clone())
    }

    /// Step forward; returns the popstate payload.
    pub fn forward(&mut self) -> Option<Value> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.state().clone())
    }
}

impl HistoryHost for WebHistory {
    fn location(&self) -> String {
        self.entries[self.index].url.clone()
    }

    fn replace_state(&mut self, state: HistoryState, _title: &str, url: &str) {
        self.entries[self.index] = Entry {
            state: state.to_value(),
            url: url.to_owned(),
        };
    }

    fn push_state(&mut self, state: HistoryState, _title: &str, url: &str) {
        self.entries.truncate(self.index + 1);
        self.entries.push(Entry {
            state: state.to_value(),
            url: url.to_owned(),
        });
        self.index = self.entries.len() - 1;
    }
}
