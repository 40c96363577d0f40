#![forbid(unsafe_code)]

//! Counter state mirrored by entity views.
//!
//! # Invariants
//!
//! 1. Counters never go negative: deltas saturate at 0 and at `u64::MAX`.
//! 2. Applying an event touches exactly one field or flag.
//! 3. `apply` reports whether the state actually changed, so publishers can
//!    skip notifying views on no-op events.

use serde::{Deserialize, Serialize};

/// Numeric counters a component may display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterField {
    Likes,
    Replies,
    Views,
    Votes,
    Followers,
    Following,
}

/// Per-viewer boolean flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagField {
    /// The current user likes the entity.
    Liked,
    /// The current user follows the entity (a user or a topic).
    Followed,
    /// The current user voted on the entity.
    Voted,
}

/// A single mutation of a [`CounterState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterEvent {
    /// Add a signed delta to a counter.
    Adjust { field: CounterField, delta: i64 },
    /// Overwrite a counter.
    Set { field: CounterField, value: u64 },
    /// Overwrite a flag.
    Flag { flag: FlagField, value: bool },
}

/// Counters and viewer flags for one logical entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterState {
    pub likes: u64,
    pub replies: u64,
    pub views: u64,
    pub votes: u64,
    pub followers: u64,
    pub following: u64,
    pub liked: bool,
    pub followed: bool,
    pub voted: bool,
}

impl CounterState {
    #[must_use]
    pub fn counter(&self, field: CounterField) -> u64 {
        match field {
            CounterField::Likes => self.likes,
            CounterField::Replies => self.replies,
            CounterField::Views => self.views,
            CounterField::Votes => self.votes,
            CounterField::Followers => self.followers,
            CounterField::Following => self.following,
        }
    }

    fn counter_mut(&mut self, field: CounterField) -> &mut u64 {
        match field {
            CounterField::Likes => &mut self.likes,
            CounterField::Replies => &mut self.replies,
            CounterField::Views => &mut self.views,
            CounterField::Votes => &mut self.votes,
            CounterField::Followers => &mut self.followers,
            CounterField::Following => &mut self.following,
        }
    }

    #[must_use]
    pub fn flag(&self, flag: FlagField) -> bool {
        match flag {
            FlagField::Liked => self.liked,
            FlagField::Followed => self.followed,
            FlagField::Voted => self.voted,
        }
    }

    fn flag_mut(&mut self, flag: FlagField) -> &mut bool {
        match flag {
            FlagField::Liked => &mut self.liked,
            FlagField::Followed => &mut self.followed,
            FlagField::Voted => &mut self.voted,
        }
    }

    /// Apply one event. Returns `true` if the state changed.
    pub fn apply(&mut self, event: CounterEvent) -> bool {
        match event {
            CounterEvent::Adjust { field, delta } => {
                let slot = self.counter_mut(field);
                let next = saturating_offset(*slot, delta);
                let changed = next != *slot;
                *slot = next;
                changed
            }
            CounterEvent::Set { field, value } => {
                let slot = self.counter_mut(field);
                let changed = *slot != value;
                *slot = value;
                changed
            }
            CounterEvent::Flag { flag, value } => {
                let slot = self.flag_mut(flag);
                let changed = *slot != value;
                *slot = value;
                changed
            }
        }
    }

    /// Apply a batch of events. Returns `true` if any of them changed state.
    pub fn apply_all(&mut self, events: &[CounterEvent]) -> bool {
        events
            .iter()
            .fold(false, |changed, event| self.apply(*event) | changed)
    }
}

fn saturating_offset(value: u64, delta: i64) -> u64 {
    if delta >= 0 {
        value.saturating_add(delta.unsigned_abs())
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}
