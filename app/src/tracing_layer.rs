// In app/src/tracing_layer.rs

use chrono::Utc;
use events::{WsLogMessage, WsMessage};
use tokio::sync::broadcast;
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use web_server::{WsCache, push_cached};

/// Forwards every log event to WebSocket clients, live and through the replay cache.
pub struct WsBroadcastLayer {
    tx: broadcast::Sender<WsMessage>,
    cache: WsCache,
}

impl WsBroadcastLayer {
    pub fn new(tx: broadcast::Sender<WsMessage>, cache: WsCache) -> Self {
        Self { tx, cache }
    }
}

impl<S> Layer<S> for WsBroadcastLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = LogMessageVisitor::default();
        event.record(&mut visitor);
        let msg = WsMessage::Log(WsLogMessage {
            timestamp: Utc::now(),
            level: event.metadata().level().to_string(),
            message: visitor.render(),
        });
        let _ = self.tx.send(msg.clone());
        push_cached(&self.cache, msg);
    }
}

/// Captures the `message` of a log event plus its structured fields as `key=value`.
#[derive(Default)]
struct LogMessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl LogMessageVisitor {
    fn render(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else {
            format!("{} {}", self.message, self.fields.join(" "))
        }
    }
}

impl tracing::field::Visit for LogMessageVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}
