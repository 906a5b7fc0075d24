//! In-process capture of log events by name.
//!
//! [`EventCapture`] is a `tracing_subscriber` layer that keeps the `event`
//! field of every event it sees. Hosts can stack it next to their own
//! layers; tests use [`EventCapture::run`] to scope it to one closure.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Records the `event` field of each event, in order.
#[derive(Debug, Clone, Default)]
pub struct EventCapture {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Event names seen so far.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// How many times `name` was seen.
    pub fn count(&self, name: &str) -> usize {
        self.events.lock().iter().filter(|e| *e == name).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Run `f` with this capture as the current thread's subscriber.
    pub fn run<T>(&self, f: impl FnOnce() -> T) -> T {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::with_default(subscriber, f)
    }
}

impl<S: Subscriber> Layer<S> for EventCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = EventName(None);
        event.record(&mut visitor);
        if let Some(name) = visitor.0 {
            self.events.lock().push(name);
        }
    }
}

struct EventName(Option<String>);

impl Visit for EventName {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "event" {
            self.0 = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "event" && self.0.is_none() {
            self.0 = Some(format!("{value:?}"));
        }
    }
}
