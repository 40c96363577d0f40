//! End-to-end propagation from the bus to mirrored views.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use quill_core::{CounterState, EntityReference, Session};
use quill_runtime::{
    EntityView, LocalBus, MessageRouter, Notice, Notifier, OptimisticActionController,
    RouteBinding, RuntimeConfig, RuntimeContext, ToggleKind,
};
use serde_json::json;
use web_time::Duration;

#[derive(Default)]
struct Recorder {
    notices: RefCell<Vec<Notice>>,
}

impl Notifier for Recorder {
    fn notify(&self, notice: Notice) {
        self.notices.borrow_mut().push(notice);
    }

    fn prompt_authentication(&self) {}
}

fn page(user: &str) -> (RuntimeContext, Rc<LocalBus>) {
    let bus = Rc::new(LocalBus::new());
    let ctx = RuntimeContext::new(
        Session::authenticated(user),
        bus.clone(),
        Rc::new(Recorder::default()),
        RuntimeConfig::immediate(),
    );
    (ctx, bus)
}

fn frame(action: &str, target: &str, user: Option<&str>, value: i64) -> String {
    json!({
        "type": "action",
        "data": {
            "kind": "story",
            "action": action,
            "value": value,
            "user": user,
            "hashes": { "target": target }
        }
    })
    .to_string()
}

fn connect(to: &str, from: &str, value: i64) -> String {
    json!({
        "type": "action",
        "data": {
            "kind": "user",
            "action": "connect",
            "value": value,
            "user": from,
            "hashes": { "target": to, "to": to, "from": from }
        }
    })
    .to_string()
}

#[test]
fn connect_reaches_every_view_of_the_author() {
    let (ctx, bus) = page("me");
    let author = CounterState {
        followers: 3,
        ..Default::default()
    };
    // Author snapshot embedded in a story, plus the author's profile card.
    let embedded = EntityView::attach(&ctx.channel, EntityReference::user("u1"), author);
    let profile = EntityView::attach(&ctx.channel, EntityReference::user("u1"), author);
    let _story = MessageRouter::attach(
        &ctx,
        RouteBinding::new(EntityReference::story("s1")).with_author("u1"),
    );
    let _card = MessageRouter::attach(&ctx, RouteBinding::new(EntityReference::user("u1")));

    bus.deliver_raw(&connect("u1", "someone", 1)).unwrap();
    assert_eq!(embedded.shown().followers, 4);
    assert_eq!(profile.shown().followers, 4);
    assert!(!profile.shown().followed);

    bus.deliver_raw(&connect("u1", "me", 1)).unwrap();
    assert_eq!(embedded.shown().followers, 5);
    assert!(embedded.shown().followed);
}

#[test]
fn own_follow_echo_is_not_double_counted() {
    let (ctx, bus) = page("me");
    let card = EntityView::attach(
        &ctx.channel,
        EntityReference::user("u1"),
        CounterState {
            followers: 3,
            ..Default::default()
        },
    );
    let _router = MessageRouter::attach(&ctx, RouteBinding::new(EntityReference::user("u1")));
    let mut controller = OptimisticActionController::new(&ctx, EntityReference::user("u1"));
    controller.perform(ToggleKind::Follow, Duration::ZERO);
    assert_eq!((card.shown().followed, card.shown().followers), (true, 4));

    bus.deliver_raw(&connect("u1", "me", 1)).unwrap();
    assert_eq!((card.shown().followed, card.shown().followers), (true, 4));
}

#[test]
fn likes_from_others_count_once_across_routers() {
    let (ctx, bus) = page("me");
    let view =
        EntityView::attach(&ctx.channel, EntityReference::story("s1"), CounterState::default());
    let first = MessageRouter::attach(&ctx, RouteBinding::new(EntityReference::story("s1")));
    let second = MessageRouter::attach(&ctx, RouteBinding::new(EntityReference::story("s1")));

    assert_eq!(bus.deliver_raw(&frame("like", "s1", Some("other"), 1)), Ok(2));
    assert_eq!(view.shown().likes, 1);
    assert_eq!(first.applied_count() + second.applied_count(), 1);
}

#[test]
fn own_like_echo_is_discarded() {
    let (ctx, bus) = page("me");
    let view = EntityView::attach(
        &ctx.channel,
        EntityReference::story("s1"),
        CounterState {
            likes: 10,
            ..Default::default()
        },
    );
    let _router = MessageRouter::attach(&ctx, RouteBinding::new(EntityReference::story("s1")));
    bus.deliver_raw(&frame("like", "s1", Some("me"), 1)).unwrap();
    bus.deliver_raw(&frame("vote", "s1", Some("me"), 1)).unwrap();
    assert_eq!(view.shown().likes, 10);
    assert_eq!(view.render_count(), 0);

    bus.deliver_raw(&frame("reply", "s1", Some("me"), 1)).unwrap();
    assert_eq!(view.shown().replies, 1);
}

#[test]
fn detached_router_stops_listening() {
    let (ctx, bus) = page("me");
    let view =
        EntityView::attach(&ctx.channel, EntityReference::story("s1"), CounterState::default());
    let router = MessageRouter::attach(&ctx, RouteBinding::new(EntityReference::story("s1")));
    assert_eq!(bus.handler_count(), 1);
    drop(router);
    assert_eq!(bus.handler_count(), 0);
    bus.deliver_raw(&frame("view", "s1", None, 1)).unwrap();
    assert_eq!(view.shown().views, 0);
}

#[test]
fn invalid_frames_never_reach_views() {
    let (ctx, bus) = page("me");
    let view =
        EntityView::attach(&ctx.channel, EntityReference::story("s1"), CounterState::default());
    let _router = MessageRouter::attach(&ctx, RouteBinding::new(EntityReference::story("s1")));
    assert!(bus.deliver_raw("{not json").is_err());
    assert!(bus.deliver_raw(&frame("teleport", "s1", None, 1)).is_err());
    assert_eq!(bus.rejected_count(), 2);
    assert_eq!(view.render_count(), 0);
}
