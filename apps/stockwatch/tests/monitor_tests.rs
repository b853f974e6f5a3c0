//! Monitor and lifecycle behaviour under a real tokio runtime.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use stockwatch::{
    Console, Lifecycle, MonitorHandle, MonitorSettings, MonitorState, Shell, ShutdownOutcome,
};
use stockwatch_core::{
    CatalogEntry, Decimal, Inventory, LowStockSource, MemoryBacking, RecordStore, StockError,
    SupplierRegistry,
};

// =============================================================================
// HELPERS
// =============================================================================

/// In-memory console sink that tests can read back.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn captured_console() -> (Arc<Console>, Captured) {
    let captured = Captured::default();
    (Arc::new(Console::new(captured.clone())), captured)
}

fn settings(interval: Duration, grace: Duration) -> MonitorSettings {
    MonitorSettings {
        interval,
        threshold: 10,
        shutdown_grace: grace,
    }
}

fn stocked_inventory() -> Arc<Inventory> {
    let inv = Inventory::new(RecordStore::empty(MemoryBacking::default()));
    inv.add_entry(CatalogEntry::new("P1", "Widget", "Tools", 3, Decimal::ONE, "S1"))
        .unwrap();
    inv.add_entry(CatalogEntry::new("P2", "Gadget", "Toys", 50, Decimal::ONE, "S1"))
        .unwrap();
    inv.add_entry(CatalogEntry::new("P3", "Bolt", "Tools", 0, Decimal::ONE, "S1"))
        .unwrap();
    Arc::new(inv)
}

/// Counts scans; fails or panics on alternating calls.
struct FlakySource {
    calls: AtomicUsize,
}

impl LowStockSource for FlakySource {
    fn low_stock(&self, _threshold: i64) -> Result<Vec<CatalogEntry>, StockError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match call % 3 {
            0 => Err(StockError::IoFailure("disk unavailable".into())),
            1 => panic!("scan blew up"),
            _ => Ok(Vec::new()),
        }
    }
}

/// A scan that blocks far longer than any grace period.
struct WedgedSource {
    delay: Duration,
}

impl LowStockSource for WedgedSource {
    fn low_stock(&self, _threshold: i64) -> Result<Vec<CatalogEntry>, StockError> {
        std::thread::sleep(self.delay);
        Ok(Vec::new())
    }
}

/// A slow scan that always finds one low entry.
struct SlowLow {
    delay: Duration,
}

impl LowStockSource for SlowLow {
    fn low_stock(&self, _threshold: i64) -> Result<Vec<CatalogEntry>, StockError> {
        std::thread::sleep(self.delay);
        Ok(vec![CatalogEntry::new(
            "P1",
            "Widget",
            "Tools",
            1,
            Decimal::ONE,
            "S1",
        )])
    }
}

fn idle_shell(console: &Arc<Console>) -> Shell {
    Shell::new(
        Arc::new(Inventory::new(RecordStore::empty(MemoryBacking::default()))),
        Arc::new(SupplierRegistry::new(RecordStore::empty(
            MemoryBacking::default(),
        ))),
        Arc::clone(console),
        10,
        Duration::from_secs(5),
    )
}

async fn wait_until(mut condition: impl FnMut() -> bool, limit: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < limit {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

// =============================================================================
// TESTS
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_wakes_a_sleeping_monitor() {
    let (console, _) = captured_console();
    let source: Arc<dyn LowStockSource> = stocked_inventory();
    let handle = MonitorHandle::spawn(
        source,
        settings(Duration::from_secs(60), Duration::from_secs(5)),
        console,
    );

    // let the immediate first scan finish so the monitor is asleep
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(handle.state(), MonitorState::Running);

    let start = Instant::now();
    handle.request_stop();
    assert!(handle.wait_stopped(Duration::from_secs(5)).await);

    assert!(start.elapsed() < Duration::from_millis(500));
    assert_eq!(handle.state(), MonitorState::Stopped);
    handle.join().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn request_stop_is_idempotent() {
    let (console, _) = captured_console();
    let handle = MonitorHandle::spawn(
        stocked_inventory(),
        settings(Duration::from_secs(60), Duration::from_secs(5)),
        console,
    );

    handle.request_stop();
    handle.request_stop();
    assert!(handle.wait_stopped(Duration::from_secs(5)).await);

    handle.request_stop();
    assert_eq!(handle.state(), MonitorState::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn first_scan_prints_one_whole_alert_block() {
    let (console, captured) = captured_console();
    let lifecycle = Lifecycle::start(
        stocked_inventory(),
        settings(Duration::from_secs(60), Duration::from_secs(5)),
        console,
    );

    assert!(wait_until(|| captured.text().contains("restock"), Duration::from_secs(5)).await);
    assert_eq!(lifecycle.shutdown().await, ShutdownOutcome::Clean);

    let text = captured.text();
    let lines: Vec<_> = text.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(
        lines,
        vec![
            "LOW STOCK ALERT! The following products are running low:",
            "   Widget (ID: P1) - Only 3 left!",
            "   Bolt (ID: P3) - Only 0 left!",
            "Please restock these items soon!",
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scan_failures_do_not_stop_the_monitor() {
    let (console, _) = captured_console();
    let source = Arc::new(FlakySource {
        calls: AtomicUsize::new(0),
    });
    let handle = MonitorHandle::spawn(
        Arc::clone(&source) as Arc<dyn LowStockSource>,
        settings(Duration::from_millis(10), Duration::from_secs(5)),
        console,
    );

    let survived = wait_until(
        || source.calls.load(Ordering::SeqCst) >= 7,
        Duration::from_secs(5),
    )
    .await;

    assert!(survived, "monitor stopped scanning after a failure");
    assert_eq!(handle.state(), MonitorState::Running);
    handle.request_stop();
    assert!(handle.wait_stopped(Duration::from_secs(5)).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn wedged_scan_times_out_within_grace() {
    let (console, _) = captured_console();
    let lifecycle = Lifecycle::start(
        Arc::new(WedgedSource {
            delay: Duration::from_millis(500),
        }),
        settings(Duration::from_secs(60), Duration::from_millis(50)),
        console,
    );

    // the first scan is now stuck on the blocking pool
    tokio::time::sleep(Duration::from_millis(20)).await;

    let start = Instant::now();
    let outcome = lifecycle.shutdown().await;

    assert_eq!(outcome, ShutdownOutcome::TimedOut);
    assert!(start.elapsed() < Duration::from_millis(400));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn detached_monitor_never_prints_after_farewell() {
    let (console, captured) = captured_console();
    let lifecycle = Lifecycle::start(
        Arc::new(SlowLow {
            delay: Duration::from_millis(200),
        }),
        settings(Duration::from_secs(60), Duration::from_millis(50)),
        Arc::clone(&console),
    );
    let shell = idle_shell(&console);

    let outcome = lifecycle
        .run_session(&shell, &console, "".as_bytes(), std::future::pending())
        .await
        .unwrap();
    assert_eq!(outcome, ShutdownOutcome::TimedOut);

    // the abandoned scan returns while we wait here
    tokio::time::sleep(Duration::from_millis(400)).await;

    let text = captured.text();
    assert_eq!(
        text.lines().last(),
        Some("Monitor did not stop in time. Goodbye!")
    );
    assert!(!text.contains("LOW STOCK ALERT"), "{text}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_during_scan_shuts_down_cleanly_without_waiting_interval() {
    let (console, captured) = captured_console();
    let lifecycle = Lifecycle::start(
        Arc::new(SlowLow {
            delay: Duration::from_millis(100),
        }),
        settings(Duration::from_secs(60), Duration::from_secs(2)),
        Arc::clone(&console),
    );
    let shell = idle_shell(&console);

    // the first scan is in progress
    tokio::time::sleep(Duration::from_millis(20)).await;

    let start = Instant::now();
    let outcome = lifecycle
        .run_session(&shell, &console, "".as_bytes(), std::future::pending())
        .await
        .unwrap();

    assert_eq!(outcome, ShutdownOutcome::Clean);
    assert!(start.elapsed() < Duration::from_secs(1));

    let text = captured.text();
    let farewell = text.find("Monitor stopped. Goodbye!").unwrap();
    if let Some(alert) = text.find("LOW STOCK ALERT") {
        assert!(alert < farewell, "{text}");
    }
    assert_eq!(text.lines().last(), Some("Monitor stopped. Goodbye!"));
}
