//! Property-based invariants for routing, reconciliation and feeds.
//!
//! 1. A push whose target differs from the component never mutates it
//! 2. The current user's own like/vote echoes are discarded
//! 3. A failed confirm restores the exact pre-toggle flag and counter
//! 4. Merge keeps every item, preserves per-list order and alternates
//! 5. Scroll bursts during a fetch issue exactly one request

use std::rc::Rc;

use proptest::prelude::*;
use quill_core::{
    Action, ActionMessage, CounterState, EntityKind, EntityReference, FeedResponse, Hashes,
    PushMessage, Session, SyncError, ToggleResponse,
};
use quill_runtime::feed::merge;
use quill_runtime::{
    Effect, EntityView, FeedConfig, IgnoreReason, LocalBus, MessageRouter, Notice, Notifier,
    OptimisticActionController, PaginatedFeedLoader, Reconciliation, RequestIds, RouteBinding,
    RouteDecision, RuntimeConfig, RuntimeContext, ScrollMetrics, ToggleKind,
};
use web_time::Duration;

struct Silent;

impl Notifier for Silent {
    fn notify(&self, _notice: Notice) {}
    fn prompt_authentication(&self) {}
}

fn context(user: &str) -> (RuntimeContext, Rc<LocalBus>) {
    let bus = Rc::new(LocalBus::new());
    let ctx = RuntimeContext::new(
        Session::authenticated(user),
        bus.clone(),
        Rc::new(Silent),
        RuntimeConfig::immediate(),
    );
    (ctx, bus)
}

// ── Strategies ──────────────────────────────────────────────────────────

fn hash_strategy() -> impl Strategy<Value = String> {
    "[a-f0-9]{1,6}"
}

fn counted_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Follow),
        Just(Action::Reply),
        Just(Action::View),
        Just(Action::Like),
        Just(Action::Vote),
    ]
}

fn state_strategy() -> impl Strategy<Value = CounterState> {
    (0u64..1_000, 0u64..1_000, 0u64..1_000, any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(likes, votes, followers, liked, voted, followed)| CounterState {
            likes,
            votes,
            followers,
            liked,
            voted,
            followed,
            ..CounterState::default()
        },
    )
}

fn toggle_strategy() -> impl Strategy<Value = ToggleKind> {
    prop_oneof![Just(ToggleKind::Like), Just(ToggleKind::Vote), Just(ToggleKind::Follow)]
}

fn failure_strategy() -> impl Strategy<Value = Result<ToggleResponse, SyncError>> {
    prop_oneof![
        Just(Ok(ToggleResponse::rejected("rejected"))),
        Just(Err(SyncError::NetworkTimeout)),
        Just(Err(SyncError::NetworkFailure("reset".into()))),
    ]
}

fn push(action: Action, target: &str, user: Option<String>, value: i64) -> PushMessage {
    PushMessage::Action(ActionMessage {
        kind: EntityKind::Story,
        action,
        value,
        user,
        hashes: Hashes {
            target: target.into(),
            to: None,
            from: None,
        },
    })
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn mismatched_target_never_mutates(
        mine in hash_strategy(),
        other in hash_strategy(),
        action in counted_action(),
        value in -5i64..5,
        initial in state_strategy(),
    ) {
        prop_assume!(mine != other);
        let (ctx, bus) = context("me");
        let view = EntityView::attach(&ctx.channel, EntityReference::story(mine.as_str()), initial);
        let binding = RouteBinding::new(EntityReference::story(mine.as_str()));
        let _router = MessageRouter::attach(&ctx, binding);
        bus.deliver(push(action, &other, Some("someone".into()), value));
        prop_assert_eq!(view.shown(), initial);
        prop_assert_eq!(view.render_count(), 0);
    }

    #[test]
    fn own_like_and_vote_echoes_are_discarded(
        hash in hash_strategy(),
        like in any::<bool>(),
        value in 1i64..5,
    ) {
        let (ctx, _bus) = context("me");
        let binding = RouteBinding::new(EntityReference::story(hash.as_str()));
        let action = if like { Action::Like } else { Action::Vote };
        let decision = quill_runtime::router::route(
            &binding,
            &ctx.session,
            &ctx.channel,
            &push(action, &hash, Some("me".into()), value),
        );
        prop_assert_eq!(decision, RouteDecision::Ignore(IgnoreReason::SelfOriginated));
    }

    #[test]
    fn failed_confirm_restores_pre_toggle_state(
        initial in state_strategy(),
        kind in toggle_strategy(),
        failure in failure_strategy(),
    ) {
        let (ctx, _bus) = context("me");
        let view = EntityView::attach(&ctx.channel, EntityReference::story("s1"), initial);
        let mut controller = OptimisticActionController::new(&ctx, EntityReference::story("s1"));
        let effects = controller.perform(kind, Duration::ZERO);
        let id = effects[0].as_fetch().unwrap().id;
        prop_assert_ne!(view.shown(), initial);

        let outcome = controller.on_response(id, failure, Duration::from_millis(40));
        prop_assert!(matches!(outcome, Reconciliation::Reverted(_)));
        prop_assert_eq!(view.shown(), initial);
    }

    #[test]
    fn merge_preserves_order_and_alternates(
        stories in prop::collection::vec(0u32..1_000, 0..30),
        replies in prop::collection::vec(1_000u32..2_000, 0..30),
    ) {
        let merged = merge(stories.clone(), replies.clone());
        prop_assert_eq!(merged.len(), stories.len() + replies.len());

        let only_stories: Vec<_> = merged.iter().copied().filter(|v| *v < 1_000).collect();
        let only_replies: Vec<_> = merged.iter().copied().filter(|v| *v >= 1_000).collect();
        prop_assert_eq!(only_stories, stories.clone());
        prop_assert_eq!(only_replies, replies.clone());

        let paired = stories.len().min(replies.len());
        let (longer, shorter) = if replies.len() > stories.len() {
            (&replies, &stories)
        } else {
            (&stories, &replies)
        };
        for i in 0..paired {
            prop_assert_eq!(merged[2 * i], longer[i]);
            prop_assert_eq!(merged[2 * i + 1], shorter[i]);
        }
    }

    #[test]
    fn scroll_burst_issues_one_fetch(bursts in 2usize..20) {
        let config = FeedConfig { startup_delay_ms: 0, ..FeedConfig::default() };
        let mut feed = PaginatedFeedLoader::new(config, RequestIds::new(), "/api/v1/feed");
        let id = feed.attach(None, Duration::ZERO).iter().find_map(Effect::as_fetch).unwrap().id;
        let full: Vec<_> = (0..10)
            .map(|i| quill_core::FeedItem(serde_json::json!({ "hash": i })))
            .collect();
        feed.on_response(id, Ok(FeedResponse::page(full, Vec::new())), Duration::ZERO);

        let bottom = ScrollMetrics {
            scroll_y: 2_000.0,
            document_height: 2_100.0,
            viewport_height: 800.0,
        };
        let fetches: usize = (0..bursts)
            .map(|i| {
                feed.on_scroll(bottom, Duration::from_millis(i as u64))
                    .iter()
                    .filter(|effect| effect.as_fetch().is_some())
                    .count()
            })
            .sum();
        prop_assert_eq!(fetches, 1);
        prop_assert_eq!(feed.fetch_count(), 2);
    }
}
