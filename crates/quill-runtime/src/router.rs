#![forbid(unsafe_code)]

//! Per-component routing of push messages into counter updates.
//!
//! Each interested component owns one [`MessageRouter`]. On attach it
//! registers a single handler with the message bus; on detach (or drop) it
//! removes it. For every delivery the handler decides relevance with
//! [`route`] and publishes the resulting events to the counter channel,
//! which mirrors them into every view of the affected entity.
//!
//! # Dispatch
//!
//! | action    | matched against          | effect |
//! |-----------|--------------------------|--------|
//! | `connect` | `hashes.to` vs author    | `followers += value`, see below |
//! | `follow`  | `hashes.target` vs entity| `followers += value` |
//! | `reply`   | `hashes.target` vs entity| `replies += value` |
//! | `view`    | `hashes.target` vs entity| `views += value` |
//! | `like`    | `hashes.target` vs entity| `likes += value` |
//! | `vote`    | `hashes.target` vs entity| `votes += value` |
//!
//! For `connect`, `followed = value > 0` is also set when `hashes.from` is
//! the current user.
//!
//! Echoes of `like`, `vote` and `follow` sent by the current user are
//! discarded: the optimistic update already applied them.

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, trace};

use quill_core::{
    Action, ActionMessage, CounterEvent, EntityHash, EntityKind, EntityReference, FlagField,
    PushMessage, Session,
};

use crate::bus::{Delivery, HandlerId, MessageBus};
use crate::channel::{ApplyOutcome, CounterChannel, Origin};
use crate::context::RuntimeContext;

/// What a router listens for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteBinding {
    /// The entity the component renders.
    pub entity: EntityReference,
    /// Author shown by the component, for `connect` events.
    pub author: Option<EntityHash>,
}

impl RouteBinding {
    #[must_use]
    pub fn new(entity: EntityReference) -> Self {
        Self {
            entity,
            author: None,
        }
    }

    #[must_use]
    pub fn with_author(mut self, author: impl Into<EntityHash>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// The user whose follower count this component shows.
    ///
    /// A user component is its own author.
    #[must_use]
    pub fn followed_user(&self) -> Option<&EntityHash> {
        self.author.as_ref().or(match self.entity.kind {
            EntityKind::User => Some(&self.entity.hash),
            _ => None,
        })
    }
}

/// Why a delivery was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Envelope `type` was not `"action"`.
    NotAction,
    /// Target hash does not name this component's entity.
    TargetMismatch,
    /// `connect` for a component that shows no author.
    NoAuthor,
    /// Echo of the current user's own optimistic action.
    SelfOriginated,
    /// The current user's follow was already applied locally.
    AlreadyApplied,
}

/// Outcome of routing one message for one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Apply {
        hash: EntityHash,
        events: Vec<CounterEvent>,
    },
    Ignore(IgnoreReason),
}

/// Decide what `message` means for the component described by `binding`.
///
/// Pure apart from reading the channel, which is consulted only for a
/// `connect` issued by the current user.
#[must_use]
pub fn route(
    binding: &RouteBinding,
    session: &Session,
    channel: &CounterChannel,
    message: &PushMessage,
) -> RouteDecision {
    let Some(action) = message.as_action() else {
        return RouteDecision::Ignore(IgnoreReason::NotAction);
    };
    match action.action {
        Action::Connect => route_connect(binding, session, channel, action),
        other => {
            if action.hashes.target != binding.entity.hash {
                return RouteDecision::Ignore(IgnoreReason::TargetMismatch);
            }
            if other.applied_optimistically() && session.is_current_user(action.user.as_deref()) {
                return RouteDecision::Ignore(IgnoreReason::SelfOriginated);
            }
            RouteDecision::Apply {
                hash: binding.entity.hash.clone(),
                events: vec![CounterEvent::Adjust {
                    field: other.counter(),
                    delta: action.value,
                }],
            }
        }
    }
}

fn route_connect(
    binding: &RouteBinding,
    session: &Session,
    channel: &CounterChannel,
    action: &ActionMessage,
) -> RouteDecision {
    let Some(author) = binding.followed_user() else {
        return RouteDecision::Ignore(IgnoreReason::NoAuthor);
    };
    if action.hashes.to.as_ref() != Some(author) {
        return RouteDecision::Ignore(IgnoreReason::TargetMismatch);
    }
    let mut events = Vec::with_capacity(2);
    if session.is_current_user(action.hashes.from.as_deref()) {
        let following = action.value > 0;
        let shown = channel
            .snapshot(author.as_str())
            .map(|state| state.followed);
        if shown == Some(following) {
            return RouteDecision::Ignore(IgnoreReason::AlreadyApplied);
        }
        events.push(CounterEvent::Flag {
            flag: FlagField::Followed,
            value: following,
        });
    }
    events.push(CounterEvent::Adjust {
        field: Action::Connect.counter(),
        delta: action.value,
    });
    RouteDecision::Apply {
        hash: author.clone(),
        events,
    }
}

/// Bus subscription of one component.
pub struct MessageRouter {
    bus: Rc<dyn MessageBus>,
    handler: Option<HandlerId>,
    binding: Rc<RouteBinding>,
    applied: Rc<Cell<u64>>,
}

impl std::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRouter")
            .field("binding", &self.binding)
            .field("attached", &self.handler.is_some())
            .field("applied", &self.applied.get())
            .finish()
    }
}

impl MessageRouter {
    /// Register with the context's bus.
    #[must_use]
    pub fn attach(ctx: &RuntimeContext, binding: RouteBinding) -> Self {
        let binding = Rc::new(binding);
        let applied = Rc::new(Cell::new(0));
        let handler = {
            let binding = Rc::clone(&binding);
            let applied = Rc::clone(&applied);
            let session = Rc::clone(&ctx.session);
            let channel = ctx.channel.clone();
            ctx.bus.add_handler(Rc::new(move |delivery: &Delivery| {
                match route(&binding, &session, &channel, &delivery.message) {
                    RouteDecision::Apply { hash, events } => {
                        let outcome = channel.apply(&hash, Origin::Push(delivery.seq), &events);
                        if outcome == ApplyOutcome::Applied {
                            applied.set(applied.get() + 1);
                        }
                        debug!(seq = delivery.seq, %hash, ?outcome, "push routed");
                    }
                    RouteDecision::Ignore(reason) => {
                        trace!(
                            seq = delivery.seq,
                            entity = %binding.entity.hash,
                            ?reason,
                            "push ignored"
                        );
                    }
                }
            }))
        };
        Self {
            bus: Rc::clone(&ctx.bus),
            handler: Some(handler),
            binding,
            applied,
        }
    }

    /// Remove the bus handler. Idempotent.
    pub fn detach(&mut self) {
        if let Some(id) = self.handler.take() {
            self.bus.remove_handler(id);
        }
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.handler.is_some()
    }

    #[must_use]
    pub fn binding(&self) -> &RouteBinding {
        &self.binding
    }

    /// Deliveries this router turned into a state change.
    #[must_use]
    pub fn applied_count(&self) -> u64 {
        self.applied.get()
    }
}

impl Drop for MessageRouter {
    fn drop(&mut self) {
        self.detach();
    }
}
