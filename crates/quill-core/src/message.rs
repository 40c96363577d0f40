#![forbid(unsafe_code)]

//! Push messages delivered over the shared message bus.
//!
//! Frames arrive as JSON:
//!
//! ```json
//! { "type": "action",
//!   "data": { "kind": "story", "action": "like", "value": 1,
//!             "user": "u42", "hashes": { "target": "s1" } } }
//! ```
//!
//! Parsing validates `kind` and `action` into closed enums. Envelopes whose
//! `type` is not `"action"` are accepted as [`PushMessage::Other`] so that
//! routers can ignore them cheaply; malformed action payloads are rejected.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::counters::CounterField;
use crate::entity::{EntityHash, EntityKind};
use crate::error::ProtocolError;

/// Action carried by an `action` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Follow,
    Reply,
    View,
    Like,
    Vote,
    Connect,
}

impl Action {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Follow => "follow",
            Self::Reply => "reply",
            Self::View => "view",
            Self::Like => "like",
            Self::Vote => "vote",
            Self::Connect => "connect",
        }
    }

    /// Counter this action moves on its subject.
    #[must_use]
    pub const fn counter(self) -> CounterField {
        match self {
            Self::Follow | Self::Connect => CounterField::Followers,
            Self::Reply => CounterField::Replies,
            Self::View => CounterField::Views,
            Self::Like => CounterField::Likes,
            Self::Vote => CounterField::Votes,
        }
    }

    /// Actions the originating client already applied optimistically.
    ///
    /// Echoes of these from the current user are dropped.
    #[must_use]
    pub const fn applied_optimistically(self) -> bool {
        matches!(self, Self::Like | Self::Vote | Self::Follow)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "follow" => Ok(Self::Follow),
            "reply" => Ok(Self::Reply),
            "view" => Ok(Self::View),
            "like" => Ok(Self::Like),
            "vote" => Ok(Self::Vote),
            "connect" => Ok(Self::Connect),
            other => Err(ProtocolError::UnknownAction(other.to_owned())),
        }
    }
}

/// Hashes naming the subject(s) of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hashes {
    pub target: EntityHash,
    /// User being followed (`connect`).
    pub to: Option<EntityHash>,
    /// User doing the following (`connect`).
    pub from: Option<String>,
}

/// A validated `action` frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionMessage {
    pub kind: EntityKind,
    pub action: Action,
    pub value: i64,
    /// User who caused the event, if the server disclosed it.
    pub user: Option<String>,
    pub hashes: Hashes,
}

impl ActionMessage {
    /// Re-encode as a wire frame.
    #[must_use]
    pub fn to_frame(&self) -> Value {
        let mut hashes = json!({ "target": self.hashes.target.as_str() });
        if let Some(to) = &self.hashes.to {
            hashes["to"] = json!(to.as_str());
        }
        if let Some(from) = &self.hashes.from {
            hashes["from"] = json!(from);
        }
        json!({
            "type": "action",
            "data": {
                "kind": self.kind.as_str(),
                "action": self.action.as_str(),
                "value": self.value,
                "user": self.user,
                "hashes": hashes,
            }
        })
    }
}

/// An inbound bus message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushMessage {
    Action(ActionMessage),
    /// Any envelope whose `type` is not `"action"`.
    Other { kind: String },
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Deserialize)]
struct RawAction {
    kind: String,
    action: String,
    value: Option<serde_json::Number>,
    #[serde(default)]
    user: Option<String>,
    hashes: Option<RawHashes>,
}

#[derive(Deserialize)]
struct RawHashes {
    target: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    from: Option<String>,
}

impl PushMessage {
    /// Parse a text frame.
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(frame)?;
        Self::from_value(value)
    }

    /// Validate an already-decoded frame.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let envelope: RawEnvelope = serde_json::from_value(value)?;
        if envelope.kind != "action" {
            return Ok(Self::Other {
                kind: envelope.kind,
            });
        }
        let data = envelope.data.ok_or(ProtocolError::MissingField("data"))?;
        let raw: RawAction = serde_json::from_value(data)?;
        let kind = raw.kind.parse::<EntityKind>()?;
        let action = raw.action.parse::<Action>()?;
        let value = raw
            .value
            .as_ref()
            .and_then(number_as_i64)
            .ok_or(ProtocolError::MissingField("value"))?;
        let hashes = raw.hashes.ok_or(ProtocolError::MissingField("hashes"))?;
        let target = hashes
            .target
            .filter(|t| !t.is_empty())
            .ok_or(ProtocolError::MissingField("hashes.target"))?;
        Ok(Self::Action(ActionMessage {
            kind,
            action,
            value,
            user: raw.user,
            hashes: Hashes {
                target: EntityHash::new(target),
                to: hashes.to.map(EntityHash::new),
                from: hashes.from,
            },
        }))
    }

    #[must_use]
    pub fn as_action(&self) -> Option<&ActionMessage> {
        match self {
            Self::Action(action) => Some(action),
            Self::Other { .. } => None,
        }
    }
}

// JS numbers may arrive as floats (`1.0`); truncate toward zero.
fn number_as_i64(number: &serde_json::Number) -> Option<i64> {
    number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_like_frame() {
        let msg = PushMessage::parse(
            r#"{"type":"action","data":{"kind":"story","action":"like","value":1,
                "user":"u1","hashes":{"target":"s1"}}}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            PushMessage::Action(ActionMessage {
                kind: EntityKind::Story,
                action: Action::Like,
                value: 1,
                user: Some("u1".into()),
                hashes: Hashes {
                    target: "s1".into(),
                    to: None,
                    from: None,
                },
            })
        );
    }

    #[test]
    fn non_action_envelope_is_other() {
        let msg = PushMessage::parse(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(msg, PushMessage::Other { kind: "ping".into() });
        assert!(msg.as_action().is_none());
    }

    #[test]
    fn unknown_action_is_rejected() {
        let err = PushMessage::parse(
            r#"{"type":"action","data":{"kind":"story","action":"poke","value":1,
                "hashes":{"target":"s1"}}}"#,
        )
        .unwrap_err();
        assert_eq!(err, ProtocolError::UnknownAction("poke".into()));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = PushMessage::parse(
            r#"{"type":"action","data":{"kind":"poll","action":"vote","value":1,
                "hashes":{"target":"p1"}}}"#,
        )
        .unwrap_err();
        assert_eq!(err, ProtocolError::UnknownKind("poll".into()));
    }

    #[test]
    fn missing_target_is_rejected() {
        let err = PushMessage::parse(
            r#"{"type":"action","data":{"kind":"story","action":"view","value":1,
                "hashes":{}}}"#,
        )
        .unwrap_err();
        assert_eq!(err, ProtocolError::MissingField("hashes.target"));
    }

    #[test]
    fn float_values_truncate() {
        let msg = PushMessage::parse(
            r#"{"type":"action","data":{"kind":"reply","action":"view","value":-1.0,
                "user":null,"hashes":{"target":"r1"}}}"#,
        )
        .unwrap();
        assert_eq!(msg.as_action().map(|a| a.value), Some(-1));
    }

    #[test]
    fn frame_reencodes_connect_hashes() {
        let original = ActionMessage {
            kind: EntityKind::User,
            action: Action::Connect,
            value: 1,
            user: Some("u2".into()),
            hashes: Hashes {
                target: "u9".into(),
                to: Some("u9".into()),
                from: Some("u2".into()),
            },
        };
        let reparsed = PushMessage::from_value(original.to_frame()).unwrap();
        assert_eq!(reparsed, PushMessage::Action(original));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            PushMessage::parse("not json"),
            Err(ProtocolError::Malformed(_))
        ));
    }
}
