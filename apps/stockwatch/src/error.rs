//! # Application Errors
//!
//! Errors that end a stockwatch process. Catalog errors inside the shell are
//! reported to the user and never reach this type.

use crate::config::ConfigError;
use stockwatch_core::StockError;
use thiserror::Error;

/// Fatal error of a CLI invocation.
#[derive(Debug, Error)]
pub enum AppError {
    /// Catalog operation failed.
    #[error(transparent)]
    Stock(#[from] StockError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Console or terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output could not be produced.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A blocking task was cancelled or panicked.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
