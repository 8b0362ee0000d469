//! Background task that evicts expired cache entries.

use crate::domain::DomainCaches;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

/// Handle to the periodic sweep task.
///
/// Dropping the handle aborts the task; [`CacheSweeper::shutdown`] stops it
/// gracefully and waits for it.
#[derive(Debug)]
pub struct CacheSweeper {
    /// Shutdown signal.
    shutdown_tx: watch::Sender<bool>,
    /// Sweep task.
    handle: Option<JoinHandle<()>>,
}

impl CacheSweeper {
    /// Starts sweeping `caches` every `period`. Must be called inside a tokio runtime.
    ///
    /// The first sweep happens one full period after start.
    #[must_use]
    pub fn start(caches: Arc<DomainCaches>, period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            info!(period_ms = period.as_millis() as u64, "Cache sweeper started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let report = caches.cleanup_all();
                        debug!(removed = report.total(), "Cache sweep finished");
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("Cache sweeper stopped");
        });

        Self {
            shutdown_tx,
            handle: Some(handle),
        }
    }

    /// Starts a sweeper with the period from the caches' own config.
    #[must_use]
    pub fn for_caches(caches: Arc<DomainCaches>) -> Self {
        let period = caches.config().sweep_interval;
        Self::start(caches, period)
    }

    /// Whether the sweep task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the sweep task and waits for it to exit.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for CacheSweeper {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
