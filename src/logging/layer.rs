use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use super::handler::BatchedLogHandler;
use crate::db::NewLogEntry;

/// Targets whose events never reach the database.
const BLOCKED_TARGETS: &[&str] = &[
    "relaybot::logging",
    "relaybot::logging::handler",
    "relaybot::logging::layer",
    "serenity::gateway::shard",
    "serenity::gateway::ws",
    "serenity::http::ratelimiting",
    "tracing::span",
];

/// Storage, transport and file-watcher crates, matched anywhere in the target.
const BLOCKED_TARGET_PARTS: &[&str] = &[
    "rusqlite",
    "sqlite",
    "::db",
    "notify",
    "hyper",
    "h2",
    "reqwest",
    "tungstenite",
    "rustls",
];

/// Lowercased phrases of high-volume gateway chatter.
const NOISY_PHRASES: &[&str] = &[
    "heartbeat",
    "websocket",
    "received event",
    "shard runner",
    "keep-alive",
    "connection pool",
];

/// Forwards `tracing` events to a [`BatchedLogHandler`].
///
/// The well-known fields `event_type`, `server_id`, `channel_id` and
/// `user_id` fill the matching columns; every other field is stored as JSON
/// in `extra_data`. Events carrying `internal = true` are skipped.
pub struct DbLogLayer {
    handler: Arc<BatchedLogHandler>,
}

impl DbLogLayer {
    pub fn new(handler: Arc<BatchedLogHandler>) -> Self {
        Self { handler }
    }
}

impl<S> Layer<S> for DbLogLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        if self.handler.is_flushing() {
            return;
        }

        let metadata = event.metadata();
        if is_blocked_target(metadata.target()) {
            return;
        }

        let mut fields = EventFields::default();
        event.record(&mut fields);
        if fields.internal || is_noisy(&fields.message) {
            return;
        }

        let extra_data = if fields.extra.is_empty() {
            None
        } else {
            serde_json::to_string(&fields.extra).ok()
        };

        self.handler.enqueue(NewLogEntry {
            timestamp: chrono::Local::now().to_rfc3339(),
            level: level_name(metadata.level()).to_string(),
            logger_name: metadata.target().to_string(),
            event_type: fields.event_type.unwrap_or_else(|| "app_log".to_string()),
            message: fields.message,
            server_id: fields.server_id,
            user_id: fields.user_id,
            channel_id: fields.channel_id,
            module: metadata.module_path().map(str::to_string),
            function_name: ctx.event_span(event).map(|span| span.name().to_string()),
            line_number: metadata.line(),
            extra_data,
        });
    }
}

pub(crate) fn is_blocked_target(target: &str) -> bool {
    BLOCKED_TARGETS.contains(&target)
        || BLOCKED_TARGET_PARTS.iter().any(|part| target.contains(part))
}

pub(crate) fn is_noisy(message: &str) -> bool {
    let message = message.to_lowercase();
    NOISY_PHRASES.iter().any(|phrase| message.contains(phrase))
}

pub(crate) fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

#[derive(Default)]
struct EventFields {
    message: String,
    event_type: Option<String>,
    server_id: Option<u64>,
    channel_id: Option<u64>,
    user_id: Option<u64>,
    internal: bool,
    extra: Map<String, Value>,
}

impl EventFields {
    fn record_value(&mut self, field: &Field, value: Value) {
        let name = field.name();
        match name {
            "message" => {
                self.message = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                }
            }
            "event_type" => {
                self.event_type = Some(match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
            }
            "server_id" => self.server_id = as_id(&value),
            "channel_id" => self.channel_id = as_id(&value),
            "user_id" => self.user_id = as_id(&value),
            "internal" => self.internal = value.as_bool().unwrap_or(false),
            _ if name.starts_with("log.") => {}
            _ => {
                self.extra.insert(name.to_string(), value);
            }
        }
    }
}

fn as_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, Value::String(value.to_string()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, Value::Bool(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, Value::String(format!("{:?}", value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::logging::LogHandlerSettings;
    use tracing_subscriber::layer::SubscriberExt;

    fn capture(f: impl FnOnce()) -> Vec<NewLogEntry> {
        let db = Database::open(":memory:").unwrap();
        let handler = BatchedLogHandler::new(db, LogHandlerSettings::default());
        let subscriber =
            tracing_subscriber::registry().with(DbLogLayer::new(Arc::clone(&handler)));
        tracing::subscriber::with_default(subscriber, f);
        handler.take_queue()
    }

    #[test]
    fn test_event_fields_map_to_columns() {
        let entries = capture(|| {
            tracing::warn!(
                target: "relaybot::events",
                event_type = "discord_message",
                server_id = 10u64,
                channel_id = "20",
                user_id = 30u64,
                preview = "hi there",
                attempts = 2,
                "Message from {}",
                "alice"
            );
        });

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.level, "WARNING");
        assert_eq!(entry.logger_name, "relaybot::events");
        assert_eq!(entry.event_type, "discord_message");
        assert_eq!(entry.message, "Message from alice");
        assert_eq!(entry.server_id, Some(10));
        assert_eq!(entry.channel_id, Some(20));
        assert_eq!(entry.user_id, Some(30));
        assert!(entry.line_number.is_some());

        let extra: Value = serde_json::from_str(entry.extra_data.as_deref().unwrap()).unwrap();
        assert_eq!(extra["preview"], "hi there");
        assert_eq!(extra["attempts"], 2);
        assert!(extra.get("server_id").is_none());
    }

    #[test]
    fn test_defaults_to_app_log_without_extra_data() {
        let entries = capture(|| {
            tracing::info!(target: "relaybot::api", "plain");
        });
        assert_eq!(entries[0].event_type, "app_log");
        assert_eq!(entries[0].extra_data, None);
        assert_eq!(entries[0].function_name, None);
    }

    #[test]
    fn test_function_name_is_innermost_span() {
        let entries = capture(|| {
            let outer = tracing::info_span!("outer");
            let _outer = outer.enter();
            let inner = tracing::info_span!("handle_query");
            let _inner = inner.enter();
            tracing::info!(target: "relaybot::commands", "inside");
        });
        assert_eq!(entries[0].function_name.as_deref(), Some("handle_query"));
    }

    #[test]
    fn test_filtered_events_are_not_queued() {
        let entries = capture(|| {
            tracing::info!(target: "serenity::gateway::shard", "exact block");
            tracing::info!(target: "relaybot::db::entities", "storage");
            tracing::info!(target: "hyper_util::client", "transport");
            tracing::info!(target: "relaybot::events", "Sending heartbeat");
            tracing::info!(target: "relaybot::events", internal = true, "internal");
            tracing::info!(target: "relaybot::events", internal = false, "kept");
        });
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "kept");
    }

    #[test]
    fn test_events_during_flush_are_skipped() {
        let db = Database::open(":memory:").unwrap();
        let handler = BatchedLogHandler::new(db, LogHandlerSettings::default());
        let subscriber =
            tracing_subscriber::registry().with(DbLogLayer::new(Arc::clone(&handler)));

        tracing::subscriber::with_default(subscriber, || {
            handler.flushing.store(true, std::sync::atomic::Ordering::SeqCst);
            tracing::info!(target: "relaybot::api", "during flush");
            handler.flushing.store(false, std::sync::atomic::Ordering::SeqCst);
            tracing::info!(target: "relaybot::api", "after flush");
        });

        let entries = handler.take_queue();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "after flush");
    }

    #[test]
    fn test_level_names() {
        assert_eq!(level_name(&Level::WARN), "WARNING");
        assert_eq!(level_name(&Level::TRACE), "TRACE");
        assert_eq!(level_name(&Level::ERROR), "ERROR");
    }
}
