#![forbid(unsafe_code)]

//! Toggle-then-reconcile controller for like, follow and vote.
//!
//! # Design
//!
//! [`OptimisticActionController::perform`] flips the viewer flag and moves
//! the counter by one *before* asking the server, publishing both through
//! the counter channel so every view of the subject updates at once, and
//! starts the counter roll. The confirm request carries the new intended
//! state. When the answer arrives the controller either keeps the guess,
//! adopts the server's value, or rolls back to the exact pre-action state.
//!
//! # Invariants
//!
//! 1. Every optimistic mutation is paired with exactly one reconciliation:
//!    a response, a failure, or an expired abort timer. Later answers for
//!    the same request are [`Reconciliation::Stale`].
//! 2. A rollback restores the flag and counter captured when the toggle
//!    was performed.
//! 3. Anonymous visitors are sent to the sign-in prompt; nothing is mutated
//!    and no request is issued.
//!
//! # Failure Modes
//!
//! - **Racing toggles**: there is no request lock. A second toggle before
//!   the first confirm resolves issues a second request; answers apply in
//!   arrival order, so a late failure of the first request can roll back
//!   past the second toggle.

use std::collections::BTreeMap;

use serde_json::json;
use tracing::{info, warn};
use web_time::Duration;

use quill_core::{
    CounterEvent, CounterField, EntityHash, EntityReference, FlagField, SyncError,
    ToggleResponse,
};

use crate::animator::NumberScroll;
use crate::channel::Origin;
use crate::context::{Notice, RuntimeContext};
use crate::transport::{Effect, InFlight, Method, Request, RequestId, Response};

/// A toggleable viewer action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToggleKind {
    Like,
    Follow,
    Vote,
}

impl ToggleKind {
    #[must_use]
    pub const fn flag(self) -> FlagField {
        match self {
            Self::Like => FlagField::Liked,
            Self::Follow => FlagField::Followed,
            Self::Vote => FlagField::Voted,
        }
    }

    #[must_use]
    pub const fn counter(self) -> CounterField {
        match self {
            Self::Like => CounterField::Likes,
            Self::Follow => CounterField::Followers,
            Self::Vote => CounterField::Votes,
        }
    }

    /// Last path segment of the confirm endpoint.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Follow => "follow",
            Self::Vote => "vote",
        }
    }

    #[must_use]
    pub const fn method(self) -> Method {
        match self {
            Self::Like | Self::Vote => Method::Post,
            Self::Follow => Method::Patch,
        }
    }

    const fn body_key(self) -> &'static str {
        match self {
            Self::Like => "liked",
            Self::Follow => "followed",
            Self::Vote => "voted",
        }
    }
}

/// Flag and counter of one toggle at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleSnapshot {
    pub flag: bool,
    pub count: u64,
}

/// How a confirm request was settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The server agreed with the optimistic guess.
    Confirmed,
    /// The server reported a different value, which now shows.
    Overwritten(ToggleSnapshot),
    /// The action failed and the pre-action state was restored.
    Reverted(SyncError),
    /// No pending toggle for this request (already settled or unknown).
    Stale,
}

#[derive(Debug, Clone)]
struct PendingToggle {
    kind: ToggleKind,
    subject: EntityHash,
    before: ToggleSnapshot,
    intended: ToggleSnapshot,
    flight: InFlight,
}

/// Optimistic like/follow/vote for one component.
pub struct OptimisticActionController {
    ctx: RuntimeContext,
    entity: EntityReference,
    author: Option<EntityHash>,
    pending: Vec<PendingToggle>,
    animators: BTreeMap<ToggleKind, NumberScroll>,
}

impl std::fmt::Debug for OptimisticActionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimisticActionController")
            .field("entity", &self.entity)
            .field("author", &self.author)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl OptimisticActionController {
    #[must_use]
    pub fn new(ctx: &RuntimeContext, entity: EntityReference) -> Self {
        Self {
            ctx: ctx.clone(),
            entity,
            author: None,
            pending: Vec::new(),
            animators: BTreeMap::new(),
        }
    }

    /// Follow actions target this user instead of the entity.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<EntityHash>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Entity a toggle of `kind` applies to.
    #[must_use]
    pub fn subject(&self, kind: ToggleKind) -> EntityReference {
        match (kind, &self.author) {
            (ToggleKind::Follow, Some(author)) => EntityReference::user(author.clone()),
            _ => self.entity.clone(),
        }
    }

    fn current(&self, subject: &EntityHash, kind: ToggleKind) -> ToggleSnapshot {
        let state = self
            .ctx
            .channel
            .snapshot(subject.as_str())
            .unwrap_or_default();
        ToggleSnapshot {
            flag: state.flag(kind.flag()),
            count: state.counter(kind.counter()),
        }
    }

    fn show(
        &mut self,
        subject: &EntityHash,
        kind: ToggleKind,
        shown: ToggleSnapshot,
        now: Duration,
    ) {
        let from = self.current(subject, kind).count;
        self.ctx.channel.apply(
            subject,
            Origin::Local,
            &[
                CounterEvent::Flag {
                    flag: kind.flag(),
                    value: shown.flag,
                },
                CounterEvent::Set {
                    field: kind.counter(),
                    value: shown.count,
                },
            ],
        );
        let config = &self.ctx.config.animator;
        self.animators
            .entry(kind)
            .or_insert_with(|| NumberScroll::new(config, from))
            .roll(from, shown.count, now);
    }

    /// Toggle `kind` now and return the confirm request to issue.
    pub fn perform(&mut self, kind: ToggleKind, now: Duration) -> Vec<Effect> {
        if !self.ctx.session.is_authenticated() {
            info!(entity = %self.entity.hash, ?kind, "toggle needs sign-in");
            self.ctx.notifier.prompt_authentication();
            return Vec::new();
        }

        let subject = self.subject(kind);
        let before = self.current(&subject.hash, kind);
        let intended = ToggleSnapshot {
            flag: !before.flag,
            count: if before.flag {
                before.count.saturating_sub(1)
            } else {
                before.count.saturating_add(1)
            },
        };
        self.show(&subject.hash, kind, intended, now);
        self.ctx.channel.begin_pending(&subject.hash);

        let timeout = self.ctx.config.actions.request_timeout();
        let id = self.ctx.request_ids.next_id();
        let request = Request {
            id,
            method: kind.method(),
            url: confirm_url(&self.ctx.config.actions.api_base, &subject, kind),
            body: Some(json!({ kind.body_key(): intended.flag })),
            timeout,
        };
        self.pending.push(PendingToggle {
            kind,
            subject: subject.hash,
            before,
            intended,
            flight: InFlight::new(id, now, timeout),
        });
        info!(
            %id,
            ?kind,
            flag = intended.flag,
            count = intended.count,
            "optimistic toggle applied"
        );
        vec![Effect::Fetch(request)]
    }

    /// Settle the confirm request `id`.
    pub fn on_response(
        &mut self,
        id: RequestId,
        response: Response<ToggleResponse>,
        now: Duration,
    ) -> Reconciliation {
        let Some(index) = self.pending.iter().position(|p| p.flight.id == id) else {
            return Reconciliation::Stale;
        };
        let pending = self.pending.remove(index);
        let outcome = self.reconcile(&pending, response, now);
        self.ctx.channel.end_pending(&pending.subject);
        outcome
    }

    fn reconcile(
        &mut self,
        pending: &PendingToggle,
        response: Response<ToggleResponse>,
        now: Duration,
    ) -> Reconciliation {
        let id = pending.flight.id;
        match response {
            Ok(answer) if answer.unverified => {
                self.revert(pending, now);
                warn!(%id, kind = ?pending.kind, "toggle rejected: authentication required");
                self.ctx
                    .notifier
                    .notify(Notice::for_failed_action(&SyncError::Unverified));
                self.ctx.notifier.prompt_authentication();
                Reconciliation::Reverted(SyncError::Unverified)
            }
            Ok(answer) if !answer.success => {
                self.fail(pending, SyncError::ServerRejected(answer.message), now)
            }
            Ok(answer) => match answer.flag(pending.kind.flag()) {
                Some(server) if server != pending.intended.flag => {
                    let shown = self.current(&pending.subject, pending.kind);
                    let adopted = ToggleSnapshot {
                        flag: server,
                        count: match (shown.flag, server) {
                            (false, true) => shown.count.saturating_add(1),
                            (true, false) => shown.count.saturating_sub(1),
                            _ => shown.count,
                        },
                    };
                    self.show(&pending.subject, pending.kind, adopted, now);
                    info!(
                        %id,
                        kind = ?pending.kind,
                        flag = server,
                        "server overrode optimistic toggle"
                    );
                    Reconciliation::Overwritten(adopted)
                }
                _ => {
                    info!(%id, kind = ?pending.kind, "optimistic toggle confirmed");
                    Reconciliation::Confirmed
                }
            },
            Err(err) => self.fail(pending, err, now),
        }
    }

    fn fail(&mut self, pending: &PendingToggle, err: SyncError, now: Duration) -> Reconciliation {
        self.revert(pending, now);
        warn!(
            id = %pending.flight.id,
            kind = ?pending.kind,
            error = %err,
            "optimistic toggle rolled back"
        );
        self.ctx.notifier.notify(Notice::for_failed_action(&err));
        Reconciliation::Reverted(err)
    }

    fn revert(&mut self, pending: &PendingToggle, now: Duration) {
        self.show(&pending.subject, pending.kind, pending.before, now);
    }

    /// Timer callback: step counter rolls and expire overdue confirms.
    pub fn tick(&mut self, now: Duration) -> Vec<Effect> {
        for animator in self.animators.values_mut() {
            animator.step(now);
        }
        let (expired, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.flight.expired(now));
        self.pending = live;
        let mut effects = Vec::with_capacity(expired.len());
        for pending in expired {
            effects.push(Effect::Abort(pending.flight.id));
            self.fail(&pending, SyncError::NetworkTimeout, now);
            self.ctx.channel.end_pending(&pending.subject);
        }
        effects
    }

    /// Earliest time the host should call [`tick`](Self::tick) again.
    #[must_use]
    pub fn next_wakeup(&self, now: Duration) -> Option<Duration> {
        let frames = self.animators.values().filter_map(|a| a.next_step_at(now));
        let deadlines = self.pending.iter().map(|p| p.flight.deadline);
        frames.chain(deadlines).min()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn animator(&self, kind: ToggleKind) -> Option<&NumberScroll> {
        self.animators.get(&kind)
    }

    #[must_use]
    pub fn entity(&self) -> &EntityReference {
        &self.entity
    }
}

fn confirm_url(api_base: &str, subject: &EntityReference, kind: ToggleKind) -> String {
    format!(
        "{}/{}/{}/{}",
        api_base.trim_end_matches('/'),
        subject.kind.as_str(),
        subject.hash,
        kind.endpoint()
    )
}
