#![forbid(unsafe_code)]

//! Paginated, scroll-triggered feeds.
//!
//! A feed instance owns a [`FeedCursor`] and walks the phases
//! `Idle -> Loading -> Success | Empty | Exhausted | Error`. The last three
//! are terminal: once a feed has run out, come back empty or failed, no
//! scroll event will fetch again.

mod loader;
mod merge;

pub use loader::PaginatedFeedLoader;
pub use merge::merge;
pub use quill_core::FeedCursor;

use quill_core::FeedItem;

/// What the feed should display next.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedRender {
    /// Loading placeholder below the current rows.
    Loading,
    /// Append these rows.
    Items(Vec<FeedItem>),
    /// Nothing to show at all.
    Empty,
    /// End-of-feed marker.
    Last,
    /// Generic error terminal.
    Error,
}

/// Lifecycle phase of a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    Idle,
    Loading,
    /// A full page arrived; more may follow.
    Success,
    Empty,
    Exhausted,
    Error,
}

impl FeedPhase {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Empty | Self::Exhausted | Self::Error)
    }
}

/// Window geometry at a scroll event, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_y: f64,
    pub document_height: f64,
    pub viewport_height: f64,
}

impl ScrollMetrics {
    /// True once the viewport is within `margin` of the document bottom.
    #[must_use]
    pub fn near_bottom(&self, margin: f64) -> bool {
        self.scroll_y > self.document_height - self.viewport_height - margin
    }
}
