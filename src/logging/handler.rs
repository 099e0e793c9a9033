use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::db::{Database, NewLogEntry};

#[derive(Debug, Clone, Copy)]
pub struct LogHandlerSettings {
    /// Queue length that triggers an early flush.
    pub batch_size: usize,
    pub flush_interval: Duration,
}

impl Default for LogHandlerSettings {
    fn default() -> Self {
        Self {
            batch_size: 50,
            flush_interval: Duration::from_secs(5),
        }
    }
}

/// Buffers log records in memory and writes them to the `Logs` table in
/// batches, on a timer and whenever the queue reaches `batch_size`.
///
/// At most one flush runs at a time. Triggers that find a flush in progress
/// do nothing; the records they would have written go out with the next one.
pub struct BatchedLogHandler {
    db: Database,
    settings: LogHandlerSettings,
    queue: Mutex<Vec<NewLogEntry>>,
    flush_guard: tokio::sync::Mutex<()>,
    pub(super) flushing: AtomicBool,
    timer: Mutex<Option<(oneshot::Sender<()>, JoinHandle<()>)>>,
}

/// Clears the flushing flag when a flush ends, including by error.
struct FlushingFlag<'a>(&'a AtomicBool);

impl<'a> FlushingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for FlushingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl BatchedLogHandler {
    pub fn new(db: Database, settings: LogHandlerSettings) -> Arc<Self> {
        Arc::new(Self {
            db,
            settings,
            queue: Mutex::new(Vec::new()),
            flush_guard: tokio::sync::Mutex::new(()),
            flushing: AtomicBool::new(false),
            timer: Mutex::new(None),
        })
    }

    /// Starts the periodic flush task. Must be called inside a tokio runtime.
    pub fn start(self: &Arc<Self>) {
        let mut timer = lock_or_recover(&self.timer);
        if timer.is_some() {
            return;
        }

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let handler = Arc::downgrade(self);
        let period = self.settings.flush_interval.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let Some(handler) = handler.upgrade() else { break };
                        handler.try_flush().await;
                    }
                }
            }
        });

        *timer = Some((stop_tx, task));
    }

    /// True while a batch is being written.
    pub fn is_flushing(&self) -> bool {
        self.flushing.load(Ordering::SeqCst)
    }

    /// Queues one record. Reaching `batch_size` schedules a flush on the
    /// current runtime; outside a runtime the record waits for the timer.
    pub fn enqueue(self: &Arc<Self>, entry: NewLogEntry) {
        let len = {
            let mut queue = lock_or_recover(&self.queue);
            queue.push(entry);
            queue.len()
        };

        if len >= self.settings.batch_size {
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                let handler = Arc::clone(self);
                runtime.spawn(async move {
                    handler.try_flush().await;
                });
            }
        }
    }

    pub fn pending(&self) -> usize {
        lock_or_recover(&self.queue).len()
    }

    pub(crate) fn take_queue(&self) -> Vec<NewLogEntry> {
        std::mem::take(&mut *lock_or_recover(&self.queue))
    }

    /// Writes everything queued so far unless another flush is running.
    /// Returns the number of records written.
    pub async fn try_flush(&self) -> usize {
        let Ok(_guard) = self.flush_guard.try_lock() else {
            return 0;
        };
        self.flush_locked().await
    }

    async fn flush_locked(&self) -> usize {
        let _flag = FlushingFlag::raise(&self.flushing);

        let batch = self.take_queue();
        if batch.is_empty() {
            return 0;
        }

        let count = batch.len();
        match self
            .db
            .run_blocking(move |db| db.insert_log_batch(&batch))
            .await
        {
            Ok(_) => count,
            Err(e) => {
                // Logging this through tracing would feed it straight back
                // into the queue.
                eprintln!("Failed to write {} log records to the database: {:#}", count, e);
                0
            }
        }
    }

    /// Stops the timer and writes whatever is still queued. Waits for an
    /// in-flight flush first.
    pub async fn shutdown(&self) {
        let timer = lock_or_recover(&self.timer).take();
        if let Some((stop, task)) = timer {
            let _ = stop.send(());
            let _ = task.await;
        }

        let _guard = self.flush_guard.lock().await;
        self.flush_locked().await;
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
