#![forbid(unsafe_code)]

//! Counter-update channel scoped by entity hash.
//!
//! # Design
//!
//! [`CounterChannel`] stores the live [`CounterState`] of every entity that
//! is on screen, keyed by [`EntityHash`], and notifies the views subscribed
//! to that hash whenever it changes. Any node that displays an entity (a
//! post, the author snapshot embedded in it, a profile summary) subscribes
//! to the hash instead of being poked through parent/sibling references.
//!
//! Cloning a `CounterChannel` yields a new handle to the **same** store.
//!
//! # Invariants
//!
//! 1. A push delivery (`Origin::Push(seq)`) is applied to a given hash at
//!    most once, however many routers react to it.
//! 2. `version` of a hash increments by exactly 1 per state-changing apply.
//! 3. Subscribers of a hash are notified in registration order, only when
//!    the state actually changed.
//! 4. A hash whose views have all detached, and which has no optimistic
//!    toggle in flight, is discarded; a later `seed` starts from the new
//!    server-rendered state.
//!
//! # Failure Modes
//!
//! - **Stale snapshot**: `seed` while the hash is still displayed (or
//!   after live updates to it) is ignored; the live state is newer than
//!   any server-rendered attributes.
//! - **Subscriber leak**: guards kept forever keep callbacks alive.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::{debug_span, trace};

use quill_core::{CounterEvent, CounterState, EntityHash};

type CallbackRc = Rc<dyn Fn(&CounterState)>;
type CallbackWeak = Weak<dyn Fn(&CounterState)>;

/// Where a change originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// A push message with the given bus sequence number.
    Push(u64),
    /// An optimistic update or reconciliation made on this page.
    Local,
}

/// Result of [`CounterChannel::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// State changed and subscribers were notified.
    Applied,
    /// Events were no-ops (e.g. decrementing a zero counter).
    Unchanged,
    /// This push delivery was already applied to the hash.
    Duplicate,
}

#[derive(Default)]
struct Topic {
    state: CounterState,
    version: u64,
    seeded: bool,
    last_push: u64,
    /// Outstanding optimistic toggles on this hash.
    pending: u32,
    /// At least one view ever subscribed.
    attached: bool,
    subscribers: Vec<CallbackWeak>,
}

impl Topic {
    fn live_subscribers(&self) -> usize {
        self.subscribers.iter().filter(|w| w.strong_count() > 0).count()
    }

    fn is_abandoned(&self) -> bool {
        self.attached && self.pending == 0 && self.live_subscribers() == 0
    }
}

#[derive(Default)]
struct ChannelInner {
    topics: HashMap<EntityHash, Topic>,
}

impl ChannelInner {
    /// Drop `hash` if nothing displays it or waits on it any more.
    fn release(&mut self, hash: &EntityHash) {
        if self.topics.get(hash).is_some_and(Topic::is_abandoned) {
            self.topics.remove(hash);
            trace!(%hash, "counter topic discarded");
        }
    }
}

/// Shared counter store with per-hash subscriptions.
#[derive(Clone, Default)]
pub struct CounterChannel {
    inner: Rc<RefCell<ChannelInner>>,
}

impl std::fmt::Debug for CounterChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("CounterChannel")
            .field("topics", &inner.topics.len())
            .finish()
    }
}

impl CounterChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the server-rendered state of `hash`.
    ///
    /// Returns `false` (and keeps the current state) if the hash was
    /// already seeded or has live updates.
    pub fn seed(&self, hash: &EntityHash, state: CounterState) -> bool {
        let changed = {
            let mut inner = self.inner.borrow_mut();
            let topic = inner.topics.entry(hash.clone()).or_default();
            if topic.seeded || topic.version > 0 {
                topic.seeded = true;
                return false;
            }
            topic.seeded = true;
            let changed = topic.state != state;
            if changed {
                topic.state = state;
                topic.version += 1;
            }
            changed
        };
        if changed {
            self.notify(hash);
        }
        true
    }

    /// Current state of `hash`, if any view or update has touched it.
    #[must_use]
    pub fn snapshot(&self, hash: &str) -> Option<CounterState> {
        self.inner.borrow().topics.get(hash).map(|t| t.state)
    }

    /// Version of `hash`; 0 for unknown hashes.
    #[must_use]
    pub fn version(&self, hash: &str) -> u64 {
        self.inner.borrow().topics.get(hash).map_or(0, |t| t.version)
    }

    /// Apply `events` to `hash` and notify its subscribers.
    pub fn apply(
        &self,
        hash: &EntityHash,
        origin: Origin,
        events: &[CounterEvent],
    ) -> ApplyOutcome {
        let outcome = {
            let mut inner = self.inner.borrow_mut();
            let topic = inner.topics.entry(hash.clone()).or_default();
            if let Origin::Push(seq) = origin {
                if seq <= topic.last_push {
                    trace!(%hash, seq, "push already applied");
                    return ApplyOutcome::Duplicate;
                }
                topic.last_push = seq;
            }
            if topic.state.apply_all(events) {
                topic.version += 1;
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Unchanged
            }
        };
        if outcome == ApplyOutcome::Applied {
            self.notify(hash);
        }
        outcome
    }

    /// Replace the whole state of `hash`. Returns `true` if it changed.
    pub fn overwrite(&self, hash: &EntityHash, state: CounterState) -> bool {
        let changed = {
            let mut inner = self.inner.borrow_mut();
            let topic = inner.topics.entry(hash.clone()).or_default();
            let changed = topic.state != state;
            if changed {
                topic.state = state;
                topic.version += 1;
            }
            changed
        };
        if changed {
            self.notify(hash);
        }
        changed
    }

    /// Subscribe to state changes of `hash`.
    ///
    /// Dropping the returned guard unsubscribes the callback.
    pub fn subscribe(
        &self,
        hash: &EntityHash,
        callback: impl Fn(&CounterState) + 'static,
    ) -> Subscription {
        let strong: CallbackRc = Rc::new(callback);
        let weak = Rc::downgrade(&strong);
        {
            let mut inner = self.inner.borrow_mut();
            let topic = inner.topics.entry(hash.clone()).or_default();
            topic.attached = true;
            topic.subscribers.push(weak);
        }
        Subscription {
            channel: Rc::downgrade(&self.inner),
            hash: hash.clone(),
            callback: Some(strong),
        }
    }

    /// Keep `hash` alive while an optimistic toggle on it is in flight.
    pub fn begin_pending(&self, hash: &EntityHash) {
        let mut inner = self.inner.borrow_mut();
        inner.topics.entry(hash.clone()).or_default().pending += 1;
    }

    /// Counterpart of [`begin_pending`](Self::begin_pending), called once the
    /// toggle is reconciled.
    pub fn end_pending(&self, hash: &EntityHash) {
        let mut inner = self.inner.borrow_mut();
        if let Some(topic) = inner.topics.get_mut(hash) {
            topic.pending = topic.pending.saturating_sub(1);
        }
        inner.release(hash);
    }

    /// Number of hashes currently held.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.inner.borrow().topics.len()
    }

    /// Registered subscribers of `hash`, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self, hash: &str) -> usize {
        self.inner
            .borrow()
            .topics
            .get(hash)
            .map_or(0, |t| t.subscribers.len())
    }

    fn notify(&self, hash: &EntityHash) {
        let (state, callbacks): (CounterState, Vec<CallbackRc>) = {
            let mut inner = self.inner.borrow_mut();
            let Some(topic) = inner.topics.get_mut(hash) else {
                return;
            };
            topic.subscribers.retain(|w| w.strong_count() > 0);
            let callbacks = topic.subscribers.iter().filter_map(Weak::upgrade).collect();
            let state = topic.state;
            inner.release(hash);
            (state, callbacks)
        };
        if callbacks.is_empty() {
            return;
        }
        let _span = debug_span!(
            "channel.publish",
            %hash,
            views = callbacks.len() as u64
        )
        .entered();
        for cb in &callbacks {
            cb(&state);
        }
    }
}

/// RAII guard for a channel subscriber.
///
/// Dropping the last guard of a hash discards its state.
pub struct Subscription {
    channel: Weak<RefCell<ChannelInner>>,
    hash: EntityHash,
    callback: Option<CallbackRc>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        drop(self.callback.take());
        let Some(inner) = self.channel.upgrade() else {
            return;
        };
        // Dropped while the channel is mid-update: the next notify prunes it.
        if let Ok(mut inner) = inner.try_borrow_mut() {
            if let Some(topic) = inner.topics.get_mut(&self.hash) {
                topic.subscribers.retain(|w| w.strong_count() > 0);
            }
            inner.release(&self.hash);
        }
    }
}
