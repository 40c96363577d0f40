#![forbid(unsafe_code)]

//! Error taxonomy.
//!
//! Failures are handled where they occur: an optimistic action rolls back,
//! a feed renders its error terminal, a navigation aborts. Nothing here is
//! meant to bubble past the component that owns the failed operation.

use std::fmt;

/// Failure of a server round trip or of a local snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The client-side abort timer fired before a response arrived.
    NetworkTimeout,
    /// The request could not complete (offline, DNS, reset, bad body).
    NetworkFailure(String),
    /// The server answered with `success: false`.
    ServerRejected(String),
    /// The server requires the visitor to (re)authenticate.
    Unverified,
    /// No body element was available to snapshot into history.
    SerializationFailure,
}

impl SyncError {
    /// Whether the error came from the transport rather than the server.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::NetworkTimeout | Self::NetworkFailure(_))
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkTimeout => f.write_str("request timed out"),
            Self::NetworkFailure(reason) => write!(f, "network failure: {reason}"),
            Self::ServerRejected(message) if message.is_empty() => {
                f.write_str("server rejected the request")
            }
            Self::ServerRejected(message) => write!(f, "server rejected the request: {message}"),
            Self::Unverified => f.write_str("authentication required"),
            Self::SerializationFailure => f.write_str("no page snapshot available"),
        }
    }
}

impl std::error::Error for SyncError {}

/// A frame or payload that does not fit the wire contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Not valid JSON, or JSON of the wrong shape.
    Malformed(String),
    /// An entity kind outside `story | reply | topic | user`.
    UnknownKind(String),
    /// An action outside the known action set.
    UnknownAction(String),
    /// A required field was absent.
    MissingField(&'static str),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(reason) => write!(f, "malformed message: {reason}"),
            Self::UnknownKind(kind) => write!(f, "unknown entity kind {kind:?}"),
            Self::UnknownAction(action) => write!(f, "unknown action {action:?}"),
            Self::MissingField(field) => write!(f, "missing field `{field}`"),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}
