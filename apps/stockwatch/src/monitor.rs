//! # Low-Stock Monitor
//!
//! A background task that periodically asks a [`LowStockSource`] for entries
//! below the alert threshold and prints one consolidated alert block when it
//! finds any.
//!
//! ## State machine
//!
//! ```text
//! Running ──request_stop()──▶ StopRequested ──loop exits──▶ Stopped
//! ```
//!
//! The wait between scans is interruptible: a stop request wakes a sleeping
//! monitor immediately. A scan already in progress is never abandoned; it
//! runs on the blocking pool and the monitor stops once it returns.

use crate::console::Console;
use std::sync::Arc;
use std::time::Duration;
use stockwatch_core::primitives::{
    DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SHUTDOWN_GRACE_MS,
};
use stockwatch_core::{CatalogEntry, LowStockSource};
use tokio::sync::watch;
use tokio::task::JoinHandle;

// =============================================================================
// SETTINGS & STATE
// =============================================================================

/// Timing and threshold of one monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Time between the end of one scan and the start of the next.
    pub interval: Duration,
    /// Entries with `quantity < threshold` are reported.
    pub threshold: i64,
    /// How long shutdown waits for the monitor to reach `Stopped`.
    pub shutdown_grace: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            shutdown_grace: Duration::from_millis(DEFAULT_SHUTDOWN_GRACE_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Running,
    StopRequested,
    /// Terminal.
    Stopped,
}

// =============================================================================
// HANDLE
// =============================================================================

/// Owner-side handle of a running monitor.
#[derive(Debug)]
pub struct MonitorHandle {
    stop_tx: watch::Sender<bool>,
    state_tx: Arc<watch::Sender<MonitorState>>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Spawn a monitor on the current tokio runtime. The first scan runs
    /// immediately.
    pub fn spawn(
        source: Arc<dyn LowStockSource>,
        settings: MonitorSettings,
        console: Arc<Console>,
    ) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        let state_tx = Arc::new(watch::Sender::new(MonitorState::Running));

        let task = tokio::spawn(run(
            source,
            settings,
            console,
            stop_rx,
            Arc::clone(&state_tx),
        ));

        Self {
            stop_tx,
            state_tx,
            task,
        }
    }

    pub fn state(&self) -> MonitorState {
        *self.state_tx.borrow()
    }

    /// Ask the monitor to stop. Calling this more than once has no further
    /// effect.
    pub fn request_stop(&self) {
        self.state_tx.send_if_modified(|state| {
            if *state == MonitorState::Running {
                *state = MonitorState::StopRequested;
                true
            } else {
                false
            }
        });
        self.stop_tx.send_replace(true);
    }

    /// Wait up to `grace` for the monitor to reach `Stopped`.
    ///
    /// Returns `true` if it did.
    pub async fn wait_stopped(&self, grace: Duration) -> bool {
        let mut state_rx = self.state_tx.subscribe();
        let stopped = tokio::time::timeout(
            grace,
            state_rx.wait_for(|state| *state == MonitorState::Stopped),
        )
        .await;
        matches!(stopped, Ok(Ok(_)))
    }

    /// Reap a stopped monitor task.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "monitor task ended abnormally");
        }
    }

    /// Let the task run on without an owner. Process exit reclaims it.
    pub fn detach(self) {
        drop(self.task);
    }
}

// =============================================================================
// MONITOR LOOP
// =============================================================================

async fn run(
    source: Arc<dyn LowStockSource>,
    settings: MonitorSettings,
    console: Arc<Console>,
    mut stop_rx: watch::Receiver<bool>,
    state_tx: Arc<watch::Sender<MonitorState>>,
) {
    tracing::info!(
        interval_secs = settings.interval.as_secs(),
        threshold = settings.threshold,
        "low-stock monitor started"
    );

    loop {
        let stop = *stop_rx.borrow_and_update();
        if stop {
            break;
        }

        scan(&source, settings.threshold, &console, &stop_rx).await;

        tokio::select! {
            () = tokio::time::sleep(settings.interval) => {}
            changed = stop_rx.changed() => {
                if changed.is_err() {
                    // handle dropped without a stop request
                    break;
                }
            }
        }
    }

    state_tx.send_replace(MonitorState::Stopped);
    tracing::info!("low-stock monitor stopped");
}

/// One scan. Failures are logged and never end the monitor.
///
/// An alert found after a stop request is dropped.
async fn scan(
    source: &Arc<dyn LowStockSource>,
    threshold: i64,
    console: &Console,
    stop_rx: &watch::Receiver<bool>,
) {
    let source = Arc::clone(source);
    let result = tokio::task::spawn_blocking(move || source.low_stock(threshold)).await;

    let stop_requested = *stop_rx.borrow();
    if stop_requested {
        tracing::debug!("stop requested during scan, alert suppressed");
        return;
    }

    match result {
        Ok(Ok(entries)) if entries.is_empty() => {
            tracing::debug!(threshold, "no low-stock entries");
        }
        Ok(Ok(entries)) => {
            tracing::warn!(count = entries.len(), threshold, "low-stock entries found");
            if let Err(e) = console.block(&alert_lines(&entries)) {
                tracing::error!(error = %e, "failed to write low-stock alert");
            }
        }
        Ok(Err(e)) => tracing::error!(error = %e, "low-stock scan failed"),
        Err(e) => tracing::error!(error = %e, "low-stock scan panicked"),
    }
}

/// The alert block for `entries`.
pub fn alert_lines(entries: &[CatalogEntry]) -> Vec<String> {
    let mut lines = Vec::with_capacity(entries.len() + 3);
    lines.push(String::new());
    lines.push("LOW STOCK ALERT! The following products are running low:".to_string());
    lines.extend(
        entries
            .iter()
            .map(|e| format!("   {} (ID: {}) - Only {} left!", e.name, e.id, e.quantity)),
    );
    lines.push("Please restock these items soon!".to_string());
    lines
}
