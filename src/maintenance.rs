use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::db::Database;

/// How often expired log rows are swept.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// Spawns a ticker that deletes log rows older than `retention_days`.
/// The first sweep runs immediately.
pub fn start_retention_task(db: Database, retention_days: u64, period: Duration) -> JoinHandle<()> {
    info!(
        "Starting log retention task (keep {} days, sweep every {})",
        retention_days,
        humantime::format_duration(period)
    );
    tokio::spawn(async move {
        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            match db
                .run_blocking(move |db| db.cleanup_old_logs(retention_days))
                .await
            {
                Ok(deleted) => debug!("Retention sweep removed {} rows", deleted),
                Err(e) => warn!("Log retention sweep failed: {:#}", e),
            }
        }
    })
}
