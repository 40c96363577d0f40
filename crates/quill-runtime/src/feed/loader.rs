#![forbid(unsafe_code)]

use tracing::{debug, info, warn};
use web_time::Duration;

use quill_core::{FeedCursor, FeedResponse, SyncError};

use super::{FeedPhase, FeedRender, ScrollMetrics, merge};
use crate::config::FeedConfig;
use crate::context::RuntimeContext;
use crate::transport::{Effect, InFlight, Method, Request, RequestId, RequestIds, Response};

/// Single-flight, timeout-bounded pager for one feed.
///
/// # Invariants
///
/// 1. At most one page request is outstanding: `blocked` is set before a
///    fetch effect is emitted and cleared only after its answer is
///    classified.
/// 2. Terminal phases never fetch again.
/// 3. Answers to aborted or unknown requests are dropped.
#[derive(Debug)]
pub struct PaginatedFeedLoader {
    config: FeedConfig,
    request_ids: RequestIds,
    cursor: FeedCursor,
    phase: FeedPhase,
    start_at: Option<Duration>,
    in_flight: Option<InFlight>,
    fetches: usize,
}

impl PaginatedFeedLoader {
    #[must_use]
    pub fn new(config: FeedConfig, request_ids: RequestIds, source_url: impl Into<String>) -> Self {
        Self {
            config,
            request_ids,
            cursor: FeedCursor::new(source_url),
            phase: FeedPhase::Idle,
            start_at: None,
            in_flight: None,
            fetches: 0,
        }
    }

    #[must_use]
    pub fn from_context(ctx: &RuntimeContext, source_url: impl Into<String>) -> Self {
        Self::new(ctx.config.feed.clone(), ctx.request_ids.clone(), source_url)
    }

    /// Start the feed.
    ///
    /// A `known_total` of zero renders the empty state without any request.
    /// Otherwise page 1 is fetched once the startup delay has elapsed, right
    /// away when the delay is zero.
    pub fn attach(&mut self, known_total: Option<u64>, now: Duration) -> Vec<Effect> {
        if self.phase != FeedPhase::Idle {
            warn!(url = %self.cursor.source_url, phase = ?self.phase, "feed attached twice");
            return Vec::new();
        }
        if known_total == Some(0) {
            self.cursor.exhausted = true;
            self.phase = FeedPhase::Empty;
            debug!(url = %self.cursor.source_url, "feed known empty");
            return vec![Effect::Render(FeedRender::Empty)];
        }

        self.cursor.page = 1;
        self.cursor.blocked = true;
        self.phase = FeedPhase::Loading;
        let mut effects = vec![Effect::Render(FeedRender::Loading)];
        let delay = self.config.startup_delay();
        if delay.is_zero() {
            effects.push(self.fetch(now));
        } else {
            self.start_at = Some(now.saturating_add(delay));
        }
        effects
    }

    /// React to a scroll event.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics, now: Duration) -> Vec<Effect> {
        // Only a settled, non-final page may pull the next one.
        if self.phase != FeedPhase::Success
            || !metrics.near_bottom(self.config.scroll_margin_px)
            || !self.cursor.accepts_trigger()
        {
            return Vec::new();
        }
        self.cursor.page += 1;
        self.cursor.blocked = true;
        self.phase = FeedPhase::Loading;
        vec![Effect::Render(FeedRender::Loading), self.fetch(now)]
    }

    fn fetch(&mut self, now: Duration) -> Effect {
        let id = self.request_ids.next_id();
        let timeout = self.config.request_timeout();
        self.in_flight = Some(InFlight::new(id, now, timeout));
        self.fetches += 1;
        let url = self.cursor.page_url(self.cursor.page);
        debug!(%id, %url, page = self.cursor.page, "feed page requested");
        Effect::Fetch(Request {
            id,
            method: Method::Get,
            url,
            body: None,
            timeout,
        })
    }

    /// Classify the answer to page request `id`.
    pub fn on_response(
        &mut self,
        id: RequestId,
        response: Response<FeedResponse>,
        _now: Duration,
    ) -> Vec<Effect> {
        if self.in_flight.is_none_or(|flight| flight.id != id) {
            debug!(%id, "feed answer ignored");
            return Vec::new();
        }
        self.in_flight = None;

        let data = match response {
            Ok(answer) if answer.success => answer.data.unwrap_or_default(),
            Ok(answer) => {
                let message = answer.message.unwrap_or_default();
                return self.fail(SyncError::ServerRejected(message));
            }
            Err(err) => return self.fail(err),
        };

        let count = data.item_count();
        let page = self.cursor.page;
        self.cursor.blocked = false;
        if count == 0 && page == 1 {
            self.cursor.exhausted = true;
            self.phase = FeedPhase::Empty;
            info!(url = %self.cursor.source_url, "feed empty");
            return vec![Effect::Render(FeedRender::Empty)];
        }

        let last = count < self.config.page_size
            || data.last
            || data.pages.is_some_and(|pages| page >= pages);
        let items = merge(data.stories, data.replies);
        let mut effects = Vec::with_capacity(2);
        if !items.is_empty() {
            effects.push(Effect::Render(FeedRender::Items(items)));
        }
        if last {
            self.cursor.exhausted = true;
            self.phase = FeedPhase::Exhausted;
            effects.push(Effect::Render(FeedRender::Last));
            info!(url = %self.cursor.source_url, page, count, "feed exhausted");
        } else {
            self.phase = FeedPhase::Success;
            debug!(page, count, "feed page loaded");
        }
        effects
    }

    fn fail(&mut self, err: SyncError) -> Vec<Effect> {
        self.cursor.blocked = false;
        self.cursor.exhausted = true;
        self.phase = FeedPhase::Error;
        warn!(url = %self.cursor.source_url, page = self.cursor.page, error = %err, "feed failed");
        vec![Effect::Render(FeedRender::Error)]
    }

    /// Timer callback: start the delayed first fetch or expire a request.
    pub fn tick(&mut self, now: Duration) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.start_at.is_some_and(|at| now >= at) {
            self.start_at = None;
            effects.push(self.fetch(now));
        }
        if let Some(flight) = self.in_flight.filter(|flight| flight.expired(now)) {
            self.in_flight = None;
            effects.push(Effect::Abort(flight.id));
            effects.extend(self.fail(SyncError::NetworkTimeout));
        }
        effects
    }

    /// Earliest time the host should call [`tick`](Self::tick) again.
    #[must_use]
    pub fn next_wakeup(&self) -> Option<Duration> {
        match (self.start_at, self.in_flight) {
            (Some(at), _) => Some(at),
            (None, Some(flight)) => Some(flight.deadline),
            (None, None) => None,
        }
    }

    #[must_use]
    pub fn cursor(&self) -> &FeedCursor {
        &self.cursor
    }

    #[must_use]
    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    /// Page requests issued so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    #[must_use]
    pub fn in_flight(&self) -> Option<RequestId> {
        self.in_flight.map(|flight| flight.id)
    }
}
