#![forbid(unsafe_code)]

//! Entity references: the subject a component renders.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Kind of entity a component displays.
///
/// The wire carries these as lowercase strings; anything else is rejected
/// at the boundary instead of silently defaulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Story,
    Reply,
    Topic,
    User,
}

impl EntityKind {
    /// Wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::Reply => "reply",
            Self::Topic => "topic",
            Self::User => "user",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "story" => Ok(Self::Story),
            "reply" => Ok(Self::Reply),
            "topic" => Ok(Self::Topic),
            "user" => Ok(Self::User),
            other => Err(ProtocolError::UnknownKind(other.to_owned())),
        }
    }
}

/// Opaque server-issued identifier of a story, reply, topic or user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityHash(String);

impl EntityHash {
    #[must_use]
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityHash {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for EntityHash {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for EntityHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EntityHash {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for EntityHash {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Identifies the subject a component renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityReference {
    pub kind: EntityKind,
    pub hash: EntityHash,
}

impl EntityReference {
    #[must_use]
    pub fn new(kind: EntityKind, hash: impl Into<EntityHash>) -> Self {
        Self {
            kind,
            hash: hash.into(),
        }
    }

    #[must_use]
    pub fn story(hash: impl Into<EntityHash>) -> Self {
        Self::new(EntityKind::Story, hash)
    }

    #[must_use]
    pub fn reply(hash: impl Into<EntityHash>) -> Self {
        Self::new(EntityKind::Reply, hash)
    }

    #[must_use]
    pub fn topic(hash: impl Into<EntityHash>) -> Self {
        Self::new(EntityKind::Topic, hash)
    }

    #[must_use]
    pub fn user(hash: impl Into<EntityHash>) -> Self {
        Self::new(EntityKind::User, hash)
    }
}
