#![forbid(unsafe_code)]

//! Span hierarchy of a push delivery and of an optimistic rollback.
//!
//! Run:
//!   cargo test -p quill-runtime --test tracing_span_hierarchy

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use quill_core::{CounterState, EntityReference, Session, SyncError};
use quill_runtime::{
    EntityView, LocalBus, MessageRouter, Notice, Notifier, OptimisticActionController,
    RouteBinding, RuntimeConfig, RuntimeContext, ToggleKind,
};
use serde_json::json;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use web_time::Duration;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
    parent_name: Option<String>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
    parent_span_name: Option<String>,
}

#[derive(Clone, Default)]
struct Capture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl Capture {
    fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        let parent_name = ctx
            .current_span()
            .id()
            .and_then(|pid| ctx.span(pid))
            .map(|span_ref| span_ref.name().to_string());
        self.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
            parent_name,
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let message = visitor
            .0
            .iter()
            .find(|(k, _)| k == "message")
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        let parent_span_name = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span_ref| span_ref.name().to_string());
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            parent_span_name,
        });
    }
}

fn with_capture(f: impl FnOnce()) -> Capture {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    tracing::subscriber::with_default(subscriber, f);
    capture
}

struct Silent;

impl Notifier for Silent {
    fn notify(&self, _notice: Notice) {}
    fn prompt_authentication(&self) {}
}

fn context() -> (RuntimeContext, Rc<LocalBus>) {
    let bus = Rc::new(LocalBus::new());
    let ctx = RuntimeContext::new(
        Session::authenticated("me"),
        bus.clone(),
        Rc::new(Silent),
        RuntimeConfig::immediate(),
    );
    (ctx, bus)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn channel_publish_nests_under_bus_delivery() {
    let capture = with_capture(|| {
        let (ctx, bus) = context();
        let _view =
            EntityView::attach(&ctx.channel, EntityReference::story("s1"), CounterState::default());
        let _a = MessageRouter::attach(&ctx, RouteBinding::new(EntityReference::story("s1")));
        let _b = MessageRouter::attach(&ctx, RouteBinding::new(EntityReference::story("s2")));
        let frame = json!({
            "type": "action",
            "data": {
                "kind": "story",
                "action": "view",
                "value": 1,
                "user": null,
                "hashes": { "target": "s1" }
            }
        });
        bus.deliver_raw(&frame.to_string()).unwrap();
    });

    let spans = capture.spans();
    let deliver = spans.iter().find(|s| s.name == "bus.deliver").expect("bus.deliver span");
    assert_eq!(deliver.fields.get("seq").map(String::as_str), Some("1"));
    assert_eq!(deliver.fields.get("handlers").map(String::as_str), Some("2"));
    assert_eq!(deliver.parent_name, None);

    let publish: Vec<_> = spans.iter().filter(|s| s.name == "channel.publish").collect();
    assert_eq!(publish.len(), 1);
    assert_eq!(publish[0].parent_name.as_deref(), Some("bus.deliver"));
    assert_eq!(publish[0].fields.get("views").map(String::as_str), Some("1"));

    let routed = capture
        .events()
        .into_iter()
        .find(|e| e.message == "push routed")
        .expect("routing event");
    assert_eq!(routed.level, tracing::Level::DEBUG);
    assert_eq!(routed.parent_span_name.as_deref(), Some("bus.deliver"));
}

#[test]
fn invalid_frame_warns_without_span() {
    let capture = with_capture(|| {
        let (_ctx, bus) = context();
        assert!(bus.deliver_raw("not json").is_err());
    });
    assert!(capture.spans().iter().all(|s| s.name != "bus.deliver"));
    assert!(
        capture
            .events()
            .iter()
            .any(|e| e.level == tracing::Level::WARN && e.message == "dropping invalid push frame")
    );
}

#[test]
fn rollback_logs_a_warning() {
    let capture = with_capture(|| {
        let (ctx, _bus) = context();
        let mut controller = OptimisticActionController::new(&ctx, EntityReference::story("s1"));
        let effects = controller.perform(ToggleKind::Like, Duration::ZERO);
        let id = effects[0].as_fetch().unwrap().id;
        controller.on_response(id, Err(SyncError::NetworkFailure("reset".into())), Duration::ZERO);
    });
    let events = capture.events();
    let logged = |level: tracing::Level, message: &str| {
        events.iter().any(|e| e.level == level && e.message == message)
    };
    assert!(logged(tracing::Level::INFO, "optimistic toggle applied"));
    assert!(logged(tracing::Level::WARN, "optimistic toggle rolled back"));
}
