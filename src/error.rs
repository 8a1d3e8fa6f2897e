//! Centralized error handling for the warehouse.
//!
//! Ingestion and integrity code returns [`WarehouseError`] so callers can tell
//! a malformed extract apart from an I/O failure. Orchestration layers
//! (pipeline, CLI, lifecycle storage) use `anyhow` and wrap these errors with
//! context.
//!
//! ```
//! use medallion::error::WarehouseError;
//!
//! fn describe(err: &WarehouseError) -> String {
//!     match err {
//!         WarehouseError::Ingestion { source, line: Some(line), .. } => {
//!             format!("{source} rejected at line {line}")
//!         }
//!         other => other.to_string(),
//!     }
//! }
//! ```
//!
//! The [`ResultExt`] trait adds `.context()` to any result whose error
//! converts into [`WarehouseError`]:
//!
//! ```no_run
//! use medallion::error::ResultExt as _;
//!
//! fn read_extract() -> medallion::error::Result<String> {
//!     std::fs::read_to_string("crm_cust_info.csv").context("Failed to read extract")
//! }
//! ```

use std::fmt;

/// Main error type for warehouse operations.
#[derive(Debug)]
pub enum WarehouseError {
    /// I/O errors (file operations)
    Io(std::io::Error),

    /// A source extract could not be parsed. The load for that source is
    /// abandoned; other sources are unaffected.
    Ingestion {
        source: String,
        /// 1-based line in the extract (the header is line 1); `None` when
        /// the CSV reader rejected the file as a whole
        line: Option<usize>,
        message: String,
    },

    /// Data processing errors (Polars, frame conversion)
    DataProcessing(String),

    /// Configuration errors
    Config(String),

    /// File not found or invalid path
    InvalidPath(String),

    /// Generic error with context
    Other(String),
}

impl WarehouseError {
    pub fn ingestion(
        source: impl Into<String>,
        line: Option<usize>,
        message: impl Into<String>,
    ) -> Self {
        Self::Ingestion {
            source: source.into(),
            line,
            message: message.into(),
        }
    }

    /// True for malformed-input failures, as opposed to environment failures.
    pub fn is_ingestion(&self) -> bool {
        matches!(self, Self::Ingestion { .. })
    }
}

impl fmt::Display for WarehouseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Ingestion {
                source,
                line: Some(line),
                message,
            } => write!(f, "Ingestion error in {source} at line {line}: {message}"),
            Self::Ingestion {
                source,
                line: None,
                message,
            } => write!(f, "Ingestion error in {source}: {message}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::InvalidPath(msg) => write!(f, "Invalid path: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for WarehouseError {}

impl From<std::io::Error> for WarehouseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for WarehouseError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for WarehouseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for WarehouseError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

/// Result type alias for warehouse operations.
pub type Result<T> = std::result::Result<T, WarehouseError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<WarehouseError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: WarehouseError = e.into();
            WarehouseError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: WarehouseError = e.into();
            WarehouseError::Other(format!("{}: {}", f(), err))
        })
    }
}
