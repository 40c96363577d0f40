#![forbid(unsafe_code)]

//! Client-side pseudo-navigation over the browser history stack.
//!
//! [`navigate`] snapshots the current body into the current history entry,
//! pushes a new entry carrying the replacement markup, and swaps the body in
//! place. No request is made, and each entry can be restored offline from
//! its own snapshot.

use serde_json::Value;
use tracing::debug;

use quill_core::{HistoryState, SyncError};

/// The page document, as seen by the navigator.
pub trait DocumentHost {
    /// Serialized markup of the body's first element child.
    fn first_element_html(&self) -> Option<String>;

    /// Replace the whole body markup.
    fn set_body_html(&mut self, html: &str);
}

/// The browser history API, as seen by the navigator.
pub trait HistoryHost {
    /// Current location.
    fn location(&self) -> String;

    /// `history.replaceState(state, title, url)`.
    fn replace_state(&mut self, state: HistoryState, title: &str, url: &str);

    /// `history.pushState(state, title, url)`.
    fn push_state(&mut self, state: HistoryState, title: &str, url: &str);
}

/// Result of [`navigate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The body now shows the new content and a history entry was pushed.
    Completed,
    /// The current body could not be snapshotted; nothing changed.
    Aborted,
}

/// Navigate to `url`, replacing the body with `html`.
pub fn navigate(
    document: &mut dyn DocumentHost,
    history: &mut dyn HistoryHost,
    url: &str,
    html: &str,
) -> Navigation {
    let Some(snapshot) = document.first_element_html() else {
        debug!(url, error = %SyncError::SerializationFailure, "navigation skipped");
        return Navigation::Aborted;
    };
    let location = history.location();
    history.replace_state(HistoryState::page(snapshot), url, &location);
    history.push_state(HistoryState::page(html), url, url);
    document.set_body_html(html);
    debug!(url, from = %location, "navigated");
    Navigation::Completed
}

/// Restore a popped history entry.
pub fn restore(document: &mut dyn DocumentHost, state: &HistoryState) {
    document.set_body_html(&state.content);
}

/// Restore a raw popstate object. Returns `false` for states this navigator
/// did not write.
pub fn restore_value(document: &mut dyn DocumentHost, state: &Value) -> bool {
    match HistoryState::from_value(state) {
        Some(state) => {
            restore(document, &state);
            true
        }
        None => {
            debug!("popstate ignored: foreign state");
            false
        }
    }
}
