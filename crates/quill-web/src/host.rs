#![forbid(unsafe_code)]

//! Effect executor and transport log.

use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{debug, info};
use web_time::Duration;

use quill_core::Session;
use quill_runtime::feed::FeedRender;
use quill_runtime::{Effect, LocalBus, Request, RequestId, RuntimeConfig, RuntimeContext};

use crate::{DeterministicClock, RecordingNotifier, WebHostError};

/// In-memory page host.
///
/// Owns the page-lifetime bus and context, executes the effects components
/// return, and lets the driver answer outstanding requests in any order.
#[derive(Debug)]
pub struct WebHost {
    clock: DeterministicClock,
    bus: Rc<LocalBus>,
    notifier: Rc<RecordingNotifier>,
    context: RuntimeContext,
    outstanding: BTreeMap<RequestId, Request>,
    fetched: Vec<Request>,
    aborted: Vec<RequestId>,
    renders: Vec<FeedRender>,
}

impl WebHost {
    #[must_use]
    pub fn new(session: Session, config: RuntimeConfig) -> Self {
        let bus = Rc::new(LocalBus::new());
        let notifier = Rc::new(RecordingNotifier::default());
        let context = RuntimeContext::new(session, bus.clone(), notifier.clone(), config);
        Self {
            clock: DeterministicClock::new(),
            bus,
            notifier,
            context,
            outstanding: BTreeMap::new(),
            fetched: Vec::new(),
            aborted: Vec::new(),
            renders: Vec::new(),
        }
    }

    #[must_use]
    pub fn context(&self) -> &RuntimeContext {
        &self.context
    }

    #[must_use]
    pub fn bus(&self) -> &LocalBus {
        &self.bus
    }

    #[must_use]
    pub fn notifier(&self) -> &RecordingNotifier {
        &self.notifier
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn advance(&mut self, dt: Duration) -> Duration {
        self.clock.advance(dt);
        self.clock.now()
    }

    /// Perform `effects` in order.
    pub fn execute(&mut self, effects: impl IntoIterator<Item = Effect>) {
        for effect in effects {
            match effect {
                Effect::Fetch(request) => {
                    debug!(
                        id = %request.id,
                        method = request.method.as_str(),
                        url = %request.url,
                        "fetch"
                    );
                    self.fetched.push(request.clone());
                    self.outstanding.insert(request.id, request);
                }
                Effect::Abort(id) => {
                    if self.outstanding.remove(&id).is_some() {
                        info!(%id, "request aborted");
                        self.aborted.push(id);
                    }
                }
                Effect::Render(render) => self.renders.push(render),
            }
        }
    }

    /// Take outstanding request `id` so the driver can answer it.
    pub fn complete(&mut self, id: RequestId) -> Result<Request, WebHostError> {
        if self.aborted.contains(&id) {
            return Err(WebHostError::Aborted(id));
        }
        self.outstanding.remove(&id).ok_or(WebHostError::UnknownRequest(id))
    }

    /// Outstanding requests, oldest first.
    pub fn outstanding(&self) -> impl Iterator<Item = &Request> {
        self.outstanding.values()
    }

    /// Every request issued so far.
    #[must_use]
    pub fn fetched(&self) -> &[Request] {
        &self.fetched
    }

    #[must_use]
    pub fn aborted(&self) -> &[RequestId] {
        &self.aborted
    }

    /// Feed renders in the order they were executed.
    #[must_use]
    pub fn renders(&self) -> &[FeedRender] {
        &self.renders
    }
}
