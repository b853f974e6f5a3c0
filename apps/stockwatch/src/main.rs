//! # stockwatch
//!
//! Inventory catalog shell with a background low-stock monitor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   apps/stockwatch (THE BINARY)                  │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐    │
//! │  │   CLI       │    │   Shell     │    │ Low-stock monitor│    │
//! │  │  (clap)     │    │ (foreground)│    │  (tokio task)    │    │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘    │
//! │         │                  │                    │              │
//! │         └──────────────────┼────────────────────┘              │
//! │                            ▼                                   │
//! │                  ┌──────────────────┐                          │
//! │                  │ stockwatch-core  │                          │
//! │                  │   (THE LOGIC)    │                          │
//! │                  └──────────────────┘                          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Interactive shell with the monitor running
//! stockwatch --data-dir ./data
//!
//! # One-shot commands
//! stockwatch report --json
//! stockwatch low --threshold 5
//! stockwatch suppliers
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Logs go to stderr; STOCKWATCH_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("STOCKWATCH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stockwatch=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    if !cli.quiet && cli.is_interactive() {
        print_banner();
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Error: cannot start runtime: {}", e);
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(cli::execute(cli));

    // A detached monitor scan or a pending stdin read must not hold up exit.
    runtime.shutdown_background();

    if let Err(e) = result {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the stockwatch startup banner.
fn print_banner() {
    println!(
        r#"
  INVENTORY MANAGEMENT SYSTEM
  stockwatch v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
