//! Centralized error handling for tidycsv.
//!
//! Errors that abort processing of a file are represented by [`TidyError`].
//! Everything else a dataset can be wrong about (missing columns, bad
//! values, duplicates) is a recoverable
//! [`ValidationIssue`](crate::analyser::logic::types::ValidationIssue) and
//! never surfaces here.
//!
//! ```
//! use tidycsv::error::TidyError;
//!
//! fn describe(err: &TidyError) -> &'static str {
//!     match err {
//!         TidyError::FileNotFound(_) | TidyError::Io(_) => "could not read input",
//!         TidyError::Encoding(_) => "wrong encoding",
//!         TidyError::RuleSet(_) => "bad rule set",
//!         _ => "processing failed",
//!     }
//! }
//! ```
//!
//! The library returns [`Result`]; the CLI wraps it in `anyhow` and adds
//! context with `.context(...)` before printing.

use std::fmt;

/// Main error type for tidycsv operations.
#[derive(Debug)]
pub enum TidyError {
    /// Input path does not exist
    FileNotFound(String),

    /// I/O errors while reading inputs or writing outputs
    Io(std::io::Error),

    /// Input bytes do not match the requested encoding
    Encoding(String),

    /// File extension is not a supported tabular format
    UnsupportedFormat(String),

    /// Rule set could not be read, parsed or compiled
    RuleSet(String),

    /// Errors raised by the tabular engine (Polars, calamine)
    DataProcessing(String),

    /// HTML report template failed to render
    Report(String),
}

impl fmt::Display for TidyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileNotFound(path) => write!(f, "File not found: {path}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Encoding(msg) => write!(f, "Encoding error: {msg}"),
            Self::UnsupportedFormat(ext) => write!(f, "Unsupported file type: {ext}"),
            Self::RuleSet(msg) => write!(f, "Invalid rule set: {msg}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Report(msg) => write!(f, "Report rendering error: {msg}"),
        }
    }
}

impl std::error::Error for TidyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TidyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<polars::error::PolarsError> for TidyError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

impl From<serde_json::Error> for TidyError {
    fn from(err: serde_json::Error) -> Self {
        Self::RuleSet(format!("JSON error: {err}"))
    }
}

impl From<regex::Error> for TidyError {
    fn from(err: regex::Error) -> Self {
        Self::RuleSet(format!("regex error: {err}"))
    }
}

impl From<handlebars::RenderError> for TidyError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Report(err.to_string())
    }
}

#[cfg(feature = "excel")]
impl From<calamine::Error> for TidyError {
    fn from(err: calamine::Error) -> Self {
        Self::DataProcessing(format!("workbook error: {err}"))
    }
}

/// Result type alias for tidycsv operations.
pub type Result<T> = std::result::Result<T, TidyError>;
