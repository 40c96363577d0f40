#![forbid(unsafe_code)]

//! The page-wide push message bus.
//!
//! # Design
//!
//! One bus lives for the whole page. Components register a handler on
//! attach and remove it on detach; every inbound frame is validated once,
//! stamped with a monotonically increasing sequence number, and fanned out
//! to all registered handlers in registration order.
//!
//! # Invariants
//!
//! 1. `seq` strictly increases across deliveries of one bus.
//! 2. A handler removed during a fan-out is not invoked for the remainder
//!    of that fan-out.
//! 3. Handlers may add or remove handlers re-entrantly.
//!
//! # Failure Modes
//!
//! - **Invalid frame**: logged at `warn` and dropped; no handler runs.
//! - **Lost frame**: delivery is at-most-once. Nothing is retried or
//!   reconciled against server truth.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, debug_span, warn};
use web_time::Instant;

use quill_core::{ProtocolError, PushMessage};

/// A validated inbound message with its bus sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub seq: u64,
    pub message: PushMessage,
}

/// Handle returned by [`MessageBus::add_handler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// A registered message callback.
pub type Handler = Rc<dyn Fn(&Delivery)>;

/// Contract of the shared bus as seen by components.
pub trait MessageBus {
    fn add_handler(&self, handler: Handler) -> HandlerId;

    /// Returns `false` if the handler was not registered.
    fn remove_handler(&self, id: HandlerId) -> bool;

    /// Send an outbound frame to the server.
    fn send(&self, frame: Value);
}

#[derive(Default)]
struct BusInner {
    handlers: Vec<(HandlerId, Handler)>,
    next_handler: u64,
    seq: u64,
    outbox: Vec<Value>,
    rejected: u64,
}

/// Single-threaded in-page bus.
///
/// The socket glue calls [`LocalBus::deliver_raw`] for every text frame;
/// outbound frames collect in an outbox the glue drains.
#[derive(Clone, Default)]
pub struct LocalBus {
    inner: Rc<RefCell<BusInner>>,
}

impl std::fmt::Debug for LocalBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("LocalBus")
            .field("handlers", &inner.handlers.len())
            .field("seq", &inner.seq)
            .field("outbox", &inner.outbox.len())
            .field("rejected", &inner.rejected)
            .finish()
    }
}

impl LocalBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and fan out a text frame. Returns the number of handlers run.
    pub fn deliver_raw(&self, frame: &str) -> Result<usize, ProtocolError> {
        match PushMessage::parse(frame) {
            Ok(message) => Ok(self.deliver(message)),
            Err(err) => {
                self.inner.borrow_mut().rejected += 1;
                warn!(error = %err, "dropping invalid push frame");
                Err(err)
            }
        }
    }

    /// Fan out an already-validated message. Returns the number of handlers run.
    pub fn deliver(&self, message: PushMessage) -> usize {
        let (delivery, handlers) = {
            let mut inner = self.inner.borrow_mut();
            inner.seq += 1;
            let delivery = Delivery {
                seq: inner.seq,
                message,
            };
            (delivery, inner.handlers.clone())
        };

        let started = Instant::now();
        let _span = debug_span!(
            "bus.deliver",
            seq = delivery.seq,
            handlers = handlers.len() as u64
        )
        .entered();

        let mut invoked = 0;
        for (id, handler) in handlers {
            if !self.is_registered(id) {
                continue;
            }
            handler(&delivery);
            invoked += 1;
        }
        debug!(
            seq = delivery.seq,
            invoked,
            duration_us = started.elapsed().as_micros() as u64,
            "push message fanned out"
        );
        invoked
    }

    fn is_registered(&self, id: HandlerId) -> bool {
        self.inner.borrow().handlers.iter().any(|(h, _)| *h == id)
    }

    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.inner.borrow().handlers.len()
    }

    /// Number of frames dropped as invalid.
    #[must_use]
    pub fn rejected_count(&self) -> u64 {
        self.inner.borrow().rejected
    }

    /// Take every outbound frame queued so far.
    pub fn drain_outbox(&self) -> Vec<Value> {
        std::mem::take(&mut self.inner.borrow_mut().outbox)
    }
}

impl MessageBus for LocalBus {
    fn add_handler(&self, handler: Handler) -> HandlerId {
        let mut inner = self.inner.borrow_mut();
        inner.next_handler += 1;
        let id = HandlerId(inner.next_handler);
        inner.handlers.push((id, handler));
        id
    }

    fn remove_handler(&self, id: HandlerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.handlers.len();
        inner.handlers.retain(|(h, _)| *h != id);
        inner.handlers.len() != before
    }

    fn send(&self, frame: Value) {
        self.inner.borrow_mut().outbox.push(frame);
    }
}
