//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use std::sync::Arc;
use stockwatch::shell::{low_stock_lines, report_lines};
use stockwatch::{AppError, Config, Console, Lifecycle, Shell};
use stockwatch_core::{FlatFile, Inventory, LoadReport, LowStockSource, SupplierRegistry};
use tokio::io::BufReader;

// =============================================================================
// CATALOG LOADING
// =============================================================================

/// Load both backing files. Rejected lines are logged and skipped.
fn open_catalogs(config: &Config) -> (Arc<Inventory>, Arc<SupplierRegistry>) {
    let (inventory, report) = Inventory::load(FlatFile::new(config.catalog_path()));
    log_load_report(&inventory.store().backing_name(), &report);

    let (suppliers, report) = SupplierRegistry::load(FlatFile::new(config.supplier_path()));
    log_load_report(&suppliers.store().backing_name(), &report);

    (Arc::new(inventory), Arc::new(suppliers))
}

fn log_load_report(file: &str, report: &LoadReport) {
    for rejected in &report.rejected {
        tracing::warn!(
            file,
            line = rejected.line,
            error = %rejected.error,
            "skipping malformed line"
        );
    }
    if let Some(failure) = &report.failure {
        tracing::warn!(file, error = %failure, "cannot read backing file, starting empty");
    }
    tracing::info!(
        file,
        loaded = report.loaded,
        rejected = report.rejected.len(),
        "backing file loaded"
    );
}

// =============================================================================
// RUN COMMAND
// =============================================================================

/// Interactive shell plus background monitor, until quit, end of input or
/// Ctrl-C.
pub async fn cmd_run(config: &Config) -> Result<(), AppError> {
    let (inventory, suppliers) = open_catalogs(config);
    let console = Arc::new(Console::stdout());
    let settings = config.monitor_settings();

    let source: Arc<dyn LowStockSource> = inventory.clone();
    let lifecycle = Lifecycle::start(source, settings, Arc::clone(&console));

    let shell = Shell::new(
        inventory,
        suppliers,
        Arc::clone(&console),
        settings.threshold,
        config.persist_timeout(),
    );

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    lifecycle
        .run_session(&shell, &console, BufReader::new(tokio::io::stdin()), interrupt)
        .await?;
    Ok(())
}

// =============================================================================
// ONE-SHOT COMMANDS
// =============================================================================

/// Catalog totals.
pub fn cmd_report(config: &Config, json: bool) -> Result<(), AppError> {
    let (inventory, suppliers) = open_catalogs(config);
    let report = inventory.report(Some(&suppliers));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        Console::stdout().block(&report_lines(&report))?;
    }
    Ok(())
}

/// Entries below the configured threshold.
pub fn cmd_low(config: &Config, json: bool) -> Result<(), AppError> {
    let (inventory, _) = open_catalogs(config);
    let threshold = config.monitor.threshold;
    let entries = inventory.low_stock(threshold);

    if json {
        let output = serde_json::json!({
            "threshold": threshold,
            "count": entries.len(),
            "entries": entries,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        Console::stdout().block(&low_stock_lines(&entries))?;
    }
    Ok(())
}

/// Every registered supplier.
pub fn cmd_suppliers(config: &Config, json: bool) -> Result<(), AppError> {
    let (_, suppliers) = open_catalogs(config);
    let list = suppliers.list();

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
    } else if list.is_empty() {
        Console::stdout().line("No suppliers found.")?;
    } else {
        let lines: Vec<String> = list.iter().map(ToString::to_string).collect();
        Console::stdout().block(&lines)?;
    }
    Ok(())
}
