#![forbid(unsafe_code)]

//! Requests, effects and client-side abort deadlines.
//!
//! Components never perform I/O. They hand [`Effect`]s back to the host,
//! which issues the fetch, and later feed the outcome back in through the
//! component's `on_response`. Every request carries a host-visible
//! [`RequestId`] so late answers to aborted requests can be recognized and
//! dropped.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use web_time::Duration;

use quill_core::SyncError;

use crate::feed::FeedRender;

/// Identifies one outstanding request for the lifetime of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req#{}", self.0)
    }
}

/// Page-wide request id allocator.
///
/// Clones share the same counter, so ids stay unique across components.
#[derive(Debug, Clone, Default)]
pub struct RequestIds {
    next: Rc<Cell<u64>>,
}

impl RequestIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> RequestId {
        let id = self.next.get() + 1;
        self.next.set(id);
        RequestId(id)
    }
}

/// HTTP verb of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
        }
    }
}

/// A request the host should issue.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: RequestId,
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    /// Abort window; the issuing component enforces it on `tick`.
    pub timeout: Duration,
}

/// Side effects components ask the host to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Start a network request.
    Fetch(Request),
    /// Abort an outstanding request; its eventual answer will be ignored.
    Abort(RequestId),
    /// Render a feed state (feeds only).
    Render(FeedRender),
}

impl Effect {
    #[must_use]
    pub fn as_fetch(&self) -> Option<&Request> {
        match self {
            Self::Fetch(request) => Some(request),
            _ => None,
        }
    }
}

/// Outcome of a request as reported by the host.
pub type Response<T> = Result<T, SyncError>;

/// A request that is still waiting for an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    pub id: RequestId,
    pub deadline: Duration,
}

impl InFlight {
    #[must_use]
    pub fn new(id: RequestId, now: Duration, timeout: Duration) -> Self {
        Self {
            id,
            deadline: now.saturating_add(timeout),
        }
    }

    #[must_use]
    pub fn expired(&self, now: Duration) -> bool {
        now >= self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_shared_across_clones() {
        let ids = RequestIds::new();
        let other = ids.clone();
        let a = ids.next_id();
        let b = other.next_id();
        assert!(b > a);
        assert_eq!(a.to_string(), "req#1");
    }

    #[test]
    fn in_flight_expiry() {
        let ids = RequestIds::new();
        let flight = InFlight::new(ids.next_id(), Duration::from_secs(1), Duration::from_secs(9));
        assert!(!flight.expired(Duration::from_millis(9_999)));
        assert!(flight.expired(Duration::from_secs(10)));
    }
}
