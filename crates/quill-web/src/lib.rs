#![forbid(unsafe_code)]

//! `quill-web` is a deterministic in-memory browser host for quill.
//!
//! Design goals:
//! - **Host-driven I/O**: the driver answers requests explicitly, in any order.
//! - **Deterministic time**: a monotonic clock advanced by hand.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! The JS glue of a real page plays the same role; this crate backs the
//! scenario tests and serves as a reference embedding.

pub mod document;
pub mod history;
pub mod host;

use std::cell::{Cell, RefCell};

use web_time::Duration;

use quill_runtime::{Notice, Notifier, RequestId};

pub use document::WebDocument;
pub use history::WebHistory;
pub use host::WebHost;

/// Web host error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebHostError {
    /// No outstanding request carries this id.
    UnknownRequest(RequestId),
    /// The request was aborted by its issuer.
    Aborted(RequestId),
}

impl std::fmt::Display for WebHostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownRequest(id) => write!(f, "unknown request {id}"),
            Self::Aborted(id) => write!(f, "request {id} was aborted"),
        }
    }
}

impl std::error::Error for WebHostError {}

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self { now: Duration::ZERO }
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

/// Notifier that records what it was asked to show.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: RefCell<Vec<Notice>>,
    prompts: Cell<u32>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    /// Number of sign-in prompts shown.
    #[must_use]
    pub fn prompts(&self) -> u32 {
        self.prompts.get()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        tracing::info!(kind = ?notice.kind, text = %notice.text, "notice");
        self.notices.borrow_mut().push(notice);
    }

    fn prompt_authentication(&self) {
        self.prompts.set(self.prompts.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_advances_monotonically() {
        let mut clock = DeterministicClock::new();
        clock.advance(Duration::from_millis(5));
        clock.advance(Duration::from_millis(5));
        assert_eq!(clock.now(), Duration::from_millis(10));
        clock.set(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::from_secs(1));
    }

    #[test]
    fn notifier_records_in_order() {
        let notifier = RecordingNotifier::default();
        notifier.notify(Notice::info("one"));
        notifier.notify(Notice::error("two"));
        notifier.prompt_authentication();
        let texts: Vec<_> = notifier.notices().into_iter().map(|n| n.text).collect();
        assert_eq!(texts, ["one", "two"]);
        assert_eq!(notifier.prompts(), 1);
    }
}
