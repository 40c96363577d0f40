#![forbid(unsafe_code)]

//! quill public facade crate.
//!
//! Re-exports the stable surface of the client runtime and offers a
//! prelude for wiring components into a page.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use quill_core::{
    Action, ActionMessage, CounterEvent, CounterField, CounterState, EntityHash, EntityKind,
    EntityReference, FeedCursor, FeedItem, FeedResponse, FlagField, Hashes, HistoryEntry,
    HistoryState, ProtocolError, PushMessage, Session, SyncError, ToggleResponse,
};

// --- Runtime re-exports ----------------------------------------------------

pub use quill_runtime::feed::{FeedRender, merge};
pub use quill_runtime::history::{navigate, restore, restore_value};
pub use quill_runtime::{
    ConfigError, CounterChannel, Effect, EntityView, FeedPhase, LocalBus, MessageBus,
    MessageRouter, Navigation, Notice, NoticeKind, Notifier, NumberScroll,
    OptimisticActionController, PaginatedFeedLoader, Reconciliation, Request, RequestId,
    RouteBinding, RuntimeConfig, RuntimeContext, ScrollMetrics, ToggleKind,
};

// --- Web host re-exports ---------------------------------------------------

#[cfg(feature = "web")]
pub use quill_web::{DeterministicClock, RecordingNotifier, WebDocument, WebHistory, WebHost};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for quill embedders.
#[derive(Debug)]
pub enum Error {
    /// Invalid runtime configuration.
    Config(ConfigError),
    /// Rejected inbound frame or response body.
    Protocol(ProtocolError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Protocol(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Protocol(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<ProtocolError> for Error {
    fn from(err: ProtocolError) -> Self {
        Self::Protocol(err)
    }
}

/// Standard result type for quill APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude ---------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        CounterState, Effect, EntityReference, EntityView, Error, MessageRouter,
        OptimisticActionController, PaginatedFeedLoader, Result, RouteBinding, RuntimeConfig,
        RuntimeContext, Session, ToggleKind,
    };

    pub use crate::{core, runtime};
}

pub use quill_core as core;
pub use quill_runtime as runtime;
#[cfg(feature = "web")]
pub use quill_web as web;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    fn load(json: &str) -> Result<RuntimeConfig> {
        Ok(crate::RuntimeConfig::from_json_str(json)?)
    }

    #[test]
    fn config_errors_convert() {
        assert!(load(r#"{"feed":{"page_size":4}}"#).is_ok());
        let err = load("{").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn protocol_errors_convert() {
        let err: Error = crate::PushMessage::parse("[]").unwrap_err().into();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[cfg(feature = "web")]
    #[test]
    fn prelude_wires_a_page() {
        let host = crate::WebHost::new(Session::authenticated("me"), RuntimeConfig::immediate());
        let view = EntityView::attach(
            &host.context().channel,
            EntityReference::story("s1"),
            CounterState::default(),
        );
        let _router =
            MessageRouter::attach(host.context(), RouteBinding::new(EntityReference::story("s1")));
        assert_eq!(host.bus().handler_count(), 1);
        assert_eq!(view.shown(), CounterState::default());
    }
}
