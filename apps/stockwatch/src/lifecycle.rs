//! # Lifecycle Controller
//!
//! Starts the low-stock monitor once the catalog is loaded and stops it with
//! a bounded wait at shutdown.
//!
//! Shutdown order:
//! 1. the foreground shell has returned
//! 2. the monitor is asked to stop and given `shutdown_grace` to do so
//! 3. the farewell is written and the console sealed, so a detached monitor
//!    cannot print after it

use crate::console::Console;
use crate::error::AppError;
use crate::monitor::{MonitorHandle, MonitorSettings};
use crate::shell::{Shell, ShellExit};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use stockwatch_core::LowStockSource;
use tokio::io::AsyncBufRead;

/// Result of [`Lifecycle::shutdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The monitor reached `Stopped` within the grace period.
    Clean,
    /// The grace period expired; the monitor task was detached.
    TimedOut,
}

impl ShutdownOutcome {
    pub fn farewell(self) -> &'static str {
        match self {
            Self::Clean => "Monitor stopped. Goodbye!",
            Self::TimedOut => "Monitor did not stop in time. Goodbye!",
        }
    }
}

#[derive(Debug)]
pub struct Lifecycle {
    monitor: MonitorHandle,
    grace: Duration,
}

impl Lifecycle {
    /// Spawn the monitor. Call after the stores are loaded.
    pub fn start(
        source: Arc<dyn LowStockSource>,
        settings: MonitorSettings,
        console: Arc<Console>,
    ) -> Self {
        Self {
            monitor: MonitorHandle::spawn(source, settings, console),
            grace: settings.shutdown_grace,
        }
    }

    /// Stop the monitor, waiting at most the grace period.
    pub async fn shutdown(self) -> ShutdownOutcome {
        self.monitor.request_stop();

        if self.monitor.wait_stopped(self.grace).await {
            self.monitor.join().await;
            tracing::info!("shutdown complete");
            ShutdownOutcome::Clean
        } else {
            tracing::warn!(
                grace_ms = self.grace.as_millis() as u64,
                "monitor did not stop within the grace period, detaching"
            );
            self.monitor.detach();
            ShutdownOutcome::TimedOut
        }
    }

    /// Run `shell` until it ends, then shut down and write the farewell.
    ///
    /// Shutdown happens even when the shell fails; the shell error is
    /// returned afterwards.
    pub async fn run_session<I>(
        self,
        shell: &Shell,
        console: &Console,
        input: I,
        interrupt: impl Future<Output = ()>,
    ) -> Result<ShutdownOutcome, AppError>
    where
        I: AsyncBufRead + Unpin,
    {
        let exit = shell.run(input, interrupt).await;
        match &exit {
            Ok(ShellExit::Interrupted) => tracing::info!("interrupted, shutting down"),
            Ok(ShellExit::EndOfInput) => tracing::info!("end of input, shutting down"),
            Ok(ShellExit::Quit) => tracing::debug!("quit requested"),
            Err(e) => tracing::error!(error = %e, "shell failed, shutting down"),
        }

        let outcome = self.shutdown().await;
        console.close(&[outcome.farewell()])?;
        exit.map(|_| outcome)
    }
}
