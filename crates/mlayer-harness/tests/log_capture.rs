#![forbid(unsafe_code)]

//! Integration tests: structured logging emitted by the runtime.
//!
//! Run:
//!   cargo test -p mlayer-harness --test log_capture

use std::cell::Cell;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use mlayer_core::{ModalConfig, Resolution};
use mlayer_harness::MockHost;
use mlayer_runtime::LayerService;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: Level,
    message: Option<String>,
    fields: HashMap<String, String>,
}

#[derive(Clone, Default)]
struct Capture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
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
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        self.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let fields: HashMap<String, String> = visitor.0.into_iter().collect();
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: fields.get("message").cloned(),
            fields,
        });
    }
}

fn with_capture<F: FnOnce()>(f: F) -> (Vec<CapturedSpan>, Vec<CapturedEvent>) {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    tracing::subscriber::with_default(subscriber, f);
    let spans = capture.spans.lock().unwrap().clone();
    let events = capture.events.lock().unwrap().clone();
    (spans, events)
}

fn has_event(events: &[CapturedEvent], level: Level, message: &str) -> bool {
    events
        .iter()
        .any(|e| e.level == level && e.message.as_deref() == Some(message))
}

struct Never;

impl Future for Never {
    type Output = bool;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<bool> {
        Poll::Pending
    }
}

#[test]
fn open_span_carries_kind() {
    let (spans, _) = with_capture(|| {
        let mut svc = LayerService::new(MockHost::new());
        svc.confirm(ModalConfig::new()).expect("confirm");
    });
    let span = spans
        .iter()
        .find(|s| s.name == "layer_open")
        .expect("layer_open span");
    assert_eq!(span.fields.get("kind").map(String::as_str), Some("confirm"));
}

#[test]
fn rejected_rule_logs_warning() {
    let (_, events) = with_capture(|| {
        let mut svc = LayerService::new(MockHost::new().rejecting_rules());
        svc.alert(ModalConfig::new()).expect("alert");
        svc.advance(Duration::from_millis(20)).expect("settle");
    });
    let warning = events
        .iter()
        .find(|e| e.level == Level::WARN)
        .expect("warn event");
    assert_eq!(warning.message.as_deref(), Some("keyframe rule rejected"));
    assert_eq!(warning.fields.get("rule").map(String::as_str), Some("zoom"));
}

#[test]
fn ignored_trigger_is_logged() {
    let calls = Rc::new(Cell::new(0));
    let (_, events) = with_capture(|| {
        let mut svc = LayerService::new(MockHost::new());
        let layer = svc.confirm(ModalConfig::new()).expect("confirm");
        layer.confirm_callback(|_| Resolution::pending(Never));
        let c = Rc::clone(&calls);
        layer.cancel_callback(move |_| {
            c.set(c.get() + 1);
            true
        });
        svc.advance(Duration::from_millis(20)).expect("settle");
        layer.on_confirm(None);
        layer.on_cancel(None);
        svc.pump().expect("pump");
    });
    assert_eq!(calls.get(), 0);
    assert!(has_event(
        &events,
        Level::DEBUG,
        "layer already resolving; trigger ignored"
    ));
}

#[test]
fn lock_transitions_are_logged() {
    let (_, events) = with_capture(|| {
        let mut svc = LayerService::new(MockHost::new().with_scrollbar(12.0));
        let layer = svc.alert(ModalConfig::new()).expect("alert");
        svc.advance(Duration::from_millis(20)).expect("settle");
        layer.on_close();
        svc.advance(Duration::from_millis(300)).expect("exit");
    });
    assert!(has_event(&events, Level::DEBUG, "scroll lock engaged"));
    assert!(has_event(&events, Level::DEBUG, "scroll lock released"));
    assert!(has_event(&events, Level::DEBUG, "layer destroyed"));
}
