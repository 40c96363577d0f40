#![forbid(unsafe_code)]

//! Core: session, entities, counters and wire messages for quill.
//!
//! # Role in quill
//! `quill-core` is the vocabulary layer. It owns the validated types that
//! cross the system boundary (push frames from the message bus, REST
//! responses, history state objects) and the counter model that views
//! mirror. It performs no I/O and holds no runtime state.
//!
//! # How it fits in the system
//! `quill-runtime` consumes these types to route push messages, reconcile
//! optimistic actions and drive feed pagination. `quill-web` uses them to
//! serialize history snapshots and to fabricate server responses in tests.

pub mod animation;
pub mod counters;
pub mod cursor;
pub mod entity;
pub mod error;
pub mod history;
pub mod logging;
pub mod message;
pub mod response;
pub mod session;

pub use counters::{CounterEvent, CounterField, CounterState, FlagField};
pub use cursor::FeedCursor;
pub use entity::{EntityHash, EntityKind, EntityReference};
pub use error::{ProtocolError, SyncError};
pub use history::{HistoryEntry, HistoryState};
pub use message::{Action, ActionMessage, Hashes, PushMessage};
pub use response::{FeedData, FeedItem, FeedResponse, ToggleResponse};
pub use session::Session;
