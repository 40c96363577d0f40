//! Property-based invariants for counters and push-frame validation.
//!
//! 1. Counter arithmetic matches a floor-at-zero reference model
//! 2. Only the addressed counter moves
//! 3. Frame parsing never panics on arbitrary input
//! 4. Valid action frames survive a re-encode

use proptest::prelude::*;
use quill_core::{
    Action, ActionMessage, CounterEvent, CounterField, CounterState, EntityKind, Hashes,
    PushMessage,
};

// ── Strategies ──────────────────────────────────────────────────────────

fn field_strategy() -> impl Strategy<Value = CounterField> {
    prop_oneof![
        Just(CounterField::Likes),
        Just(CounterField::Replies),
        Just(CounterField::Views),
        Just(CounterField::Votes),
        Just(CounterField::Followers),
        Just(CounterField::Following),
    ]
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Follow),
        Just(Action::Reply),
        Just(Action::View),
        Just(Action::Like),
        Just(Action::Vote),
        Just(Action::Connect),
    ]
}

fn kind_strategy() -> impl Strategy<Value = EntityKind> {
    prop_oneof![
        Just(EntityKind::Story),
        Just(EntityKind::Reply),
        Just(EntityKind::Topic),
        Just(EntityKind::User),
    ]
}

const ALL_FIELDS: [CounterField; 6] = [
    CounterField::Likes,
    CounterField::Replies,
    CounterField::Views,
    CounterField::Votes,
    CounterField::Followers,
    CounterField::Following,
];

proptest! {
    #[test]
    fn adjustments_match_floor_model(
        start in 0u64..1_000,
        deltas in prop::collection::vec(-50i64..50, 0..64),
        field in field_strategy(),
    ) {
        let mut state = CounterState::default();
        state.apply(CounterEvent::Set { field, value: start });
        let mut model = i128::from(start);
        for delta in deltas {
            state.apply(CounterEvent::Adjust { field, delta });
            model = (model + i128::from(delta)).max(0);
            prop_assert_eq!(i128::from(state.counter(field)), model);
        }
    }

    #[test]
    fn only_addressed_counter_moves(
        field in field_strategy(),
        delta in -20i64..20,
    ) {
        let mut state = CounterState {
            likes: 5, replies: 5, views: 5, votes: 5, followers: 5, following: 5,
            ..Default::default()
        };
        state.apply(CounterEvent::Adjust { field, delta });
        for other in ALL_FIELDS.into_iter().filter(|f| *f != field) {
            prop_assert_eq!(state.counter(other), 5);
        }
    }

    #[test]
    fn parsing_never_panics(frame in ".{0,200}") {
        let _ = PushMessage::parse(&frame);
    }

    #[test]
    fn action_frames_survive_reencode(
        kind in kind_strategy(),
        action in action_strategy(),
        value in -5i64..5,
        target in "[a-z0-9]{1,12}",
        user in prop::option::of("[a-z0-9]{1,8}"),
    ) {
        let message = ActionMessage {
            kind,
            action,
            value,
            user,
            hashes: Hashes { target: target.into(), to: None, from: None },
        };
        let reparsed = PushMessage::from_value(message.to_frame()).unwrap();
        prop_assert_eq!(reparsed, PushMessage::Action(message));
    }
}
