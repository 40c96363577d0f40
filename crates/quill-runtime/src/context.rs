#![forbid(unsafe_code)]

//! Injected runtime context.
//!
//! Everything a component needs from the page (who is signed in, the shared
//! message bus, the notification surface, the counter channel) arrives in a
//! [`RuntimeContext`] at construction instead of being read from globals.

use std::fmt;
use std::rc::Rc;

use quill_core::{Session, SyncError};

use crate::bus::MessageBus;
use crate::channel::CounterChannel;
use crate::config::RuntimeConfig;
use crate::transport::RequestIds;

/// A transient user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

impl Notice {
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    /// The notice shown when an optimistic action is rolled back.
    #[must_use]
    pub fn for_failed_action(err: &SyncError) -> Self {
        match err {
            SyncError::ServerRejected(message) if !message.is_empty() => {
                Self::error(message.clone())
            }
            SyncError::NetworkTimeout => {
                Self::error("The server took too long to respond, try again")
            }
            SyncError::Unverified => Self::error("Sign in to continue"),
            _ => Self::error("Something went wrong, try again"),
        }
    }
}

/// Notification and authentication-prompt collaborators.
pub trait Notifier {
    /// Show a transient notification.
    fn notify(&self, notice: Notice);

    /// Ask the visitor to sign in.
    fn prompt_authentication(&self);
}

/// Page-lifetime dependencies shared by every component.
#[derive(Clone)]
pub struct RuntimeContext {
    pub session: Rc<Session>,
    pub bus: Rc<dyn MessageBus>,
    pub notifier: Rc<dyn Notifier>,
    pub channel: CounterChannel,
    pub request_ids: RequestIds,
    pub config: Rc<RuntimeConfig>,
}

impl RuntimeContext {
    #[must_use]
    pub fn new(
        session: Session,
        bus: Rc<dyn MessageBus>,
        notifier: Rc<dyn Notifier>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            session: Rc::new(session),
            bus,
            notifier,
            channel: CounterChannel::new(),
            request_ids: RequestIds::new(),
            config: Rc::new(config),
        }
    }
}

impl fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("session", &self.session)
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}
