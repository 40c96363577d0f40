#![forbid(unsafe_code)]

//! REST response shapes consumed by the runtime.
//!
//! The server API itself is a black box; these types only describe what
//! the runtime reads back. Unknown fields are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::counters::FlagField;
use crate::error::ProtocolError;

/// One rendered row of a feed. The payload is opaque to the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedItem(pub Value);

impl FeedItem {
    /// Entity hash of the row, when the server includes one.
    #[must_use]
    pub fn hash(&self) -> Option<&str> {
        self.0.get("hash").and_then(Value::as_str)
    }
}

impl From<Value> for FeedItem {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Body of a successful feed page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedData {
    pub stories: Vec<FeedItem>,
    pub replies: Vec<FeedItem>,
    /// Server-side "no more pages" hint.
    pub last: bool,
    /// Total number of pages, when known.
    pub pages: Option<u64>,
}

impl FeedData {
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.stories.len() + self.replies.len()
    }
}

/// `{ success, data: { stories, replies, last, pages? } }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<FeedData>,
}

impl FeedResponse {
    pub fn from_json_str(body: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(body)?)
    }

    /// A successful page with the given rows.
    #[must_use]
    pub fn page(stories: Vec<FeedItem>, replies: Vec<FeedItem>) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(FeedData {
                stories,
                replies,
                last: false,
                pages: None,
            }),
        }
    }

    /// A `success: false` answer.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// `{ success, message, liked?, followed?, voted?, unverified? }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voted: Option<bool>,
    #[serde(default)]
    pub unverified: bool,
}

impl ToggleResponse {
    pub fn from_json_str(body: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Server's authoritative value for `flag`, if reported.
    #[must_use]
    pub fn flag(&self, flag: FlagField) -> Option<bool> {
        match flag {
            FlagField::Liked => self.liked,
            FlagField::Followed => self.followed,
            FlagField::Voted => self.voted,
        }
    }

    /// A successful answer reporting `value` for `flag`.
    #[must_use]
    pub fn confirmed(flag: FlagField, value: bool) -> Self {
        let mut response = Self {
            success: true,
            ..Self::default()
        };
        match flag {
            FlagField::Liked => response.liked = Some(value),
            FlagField::Followed => response.followed = Some(value),
            FlagField::Voted => response.voted = Some(value),
        }
        response
    }

    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn unverified() -> Self {
        Self {
            success: false,
            message: "login required".into(),
            unverified: true,
            ..Self::default()
        }
    }
}
