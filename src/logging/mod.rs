//! Application logging: console output plus a batched copy of every
//! interesting event in the `Logs` table.

use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::db::Database;

pub mod handler;
pub mod layer;

pub use handler::{BatchedLogHandler, LogHandlerSettings};
pub use layer::DbLogLayer;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber for the bot and starts the flush timer.
/// Must be called inside a tokio runtime.
pub fn init(config: &Config, db: Database) -> anyhow::Result<Arc<BatchedLogHandler>> {
    let handler = BatchedLogHandler::new(
        db,
        LogHandlerSettings {
            batch_size: config.log_batch_size.max(1),
            flush_interval: config.log_flush_interval,
        },
    );

    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .with(DbLogLayer::new(Arc::clone(&handler)))
        .try_init()?;

    handler.start();
    Ok(handler)
}

/// Console-only subscriber, used by the API server.
pub fn init_console() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}
