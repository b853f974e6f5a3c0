//! # stockwatch
//!
//! The async half of stockwatch: the background low-stock monitor, its
//! lifecycle controller, the interactive shell and the shared console.
//!
//! The catalog itself lives in `stockwatch-core`; everything here reaches it
//! through `Inventory`, `SupplierRegistry` and the `LowStockSource` trait.

pub mod config;
pub mod console;
pub mod error;
pub mod lifecycle;
pub mod monitor;
pub mod shell;

pub use config::{Config, ConfigError};
pub use console::Console;
pub use error::AppError;
pub use lifecycle::{Lifecycle, ShutdownOutcome};
pub use monitor::{MonitorHandle, MonitorSettings, MonitorState};
pub use shell::{Command, Shell, ShellExit};
