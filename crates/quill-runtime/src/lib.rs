#![forbid(unsafe_code)]

//! Runtime: push routing, optimistic actions, navigation and feeds.
//!
//! # Role in quill
//! `quill-runtime` holds every stateful component of a page. Components are
//! host-driven state machines: the embedder feeds events in (`attach`,
//! `on_scroll`, `on_response`, `tick(now)`) and executes the [`Effect`]s
//! handed back. Nothing here reads a clock, spawns a task or touches the
//! network.
//!
//! # Primary responsibilities
//! - **Bus** ([`bus`]): message bus contract and the page-lifetime local bus.
//! - **Counter channel** ([`channel`], [`view`]): pub/sub of counter state by
//!   entity hash, so every view of an entity stays in sync.
//! - **MessageRouter** ([`router`]): turns push messages into counter updates.
//! - **OptimisticActionController** ([`optimistic`]): like/follow/vote with
//!   rollback.
//! - **NumberScroll** ([`animator`]): rolling counter transition.
//! - **Navigation** ([`history`]): body swaps backed by history snapshots.
//! - **Feeds** ([`feed`]): single-flight paginated loading.
//!
//! # How it fits in the system
//! Types come from `quill-core`. `quill-web` provides an in-memory host that
//! executes effects and drives time.

pub mod animator;
pub mod bus;
pub mod channel;
pub mod config;
pub mod context;
pub mod feed;
pub mod history;
pub mod optimistic;
pub mod router;
pub mod transport;
pub mod view;

pub use animator::{NumberScroll, ScrollLabels, StepOutcome};
pub use bus::{Delivery, Handler, HandlerId, LocalBus, MessageBus};
pub use channel::{ApplyOutcome, CounterChannel, Origin, Subscription};
pub use config::{ActionConfig, AnimatorConfig, ConfigError, FeedConfig, RuntimeConfig};
pub use context::{Notice, NoticeKind, Notifier, RuntimeContext};
pub use feed::{FeedPhase, FeedRender, PaginatedFeedLoader, ScrollMetrics};
pub use history::{DocumentHost, HistoryHost, Navigation};
pub use optimistic::{OptimisticActionController, Reconciliation, ToggleKind, ToggleSnapshot};
pub use router::{IgnoreReason, MessageRouter, RouteBinding, RouteDecision};
pub use transport::{Effect, InFlight, Method, Request, RequestId, RequestIds, Response};
pub use view::EntityView;
