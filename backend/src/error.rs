//! Error types for the transitclean pipeline.
//!
//! The hierarchy mirrors the pipeline stages:
//!
//! - [`LoadError`] - reading and parsing the input file
//! - [`TransformError`] - cleaning steps that hit a shape they cannot handle
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ConfigError`] - invalid runtime configuration
//! - [`ServerError`] - HTTP presentation boundary
//!
//! Conversion is automatic via `From` implementations, so `?` works across
//! stage boundaries. None of these are recovered from: a load or transform
//! error aborts the run.

use thiserror::Error;

// =============================================================================
// Load Errors
// =============================================================================

/// Errors while loading the raw table.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Content could not be decoded.
    #[error("Failed to decode content: {0}")]
    Encoding(String),

    /// Malformed CSV record.
    #[error("Invalid CSV format: {0}")]
    Csv(#[from] csv::Error),

    /// A record has more fields than the header.
    #[error("Line {line}: expected {expected} fields, found {found}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// Records could not be assembled into a table.
    #[error("Malformed table: {0}")]
    Malformed(String),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,

    /// A column the pipeline depends on is absent from the file.
    #[error("Input is missing required column: {0}")]
    MissingColumn(String),
}

// =============================================================================
// Transform Errors
// =============================================================================

/// Errors raised by a cleaning step.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Step referenced a column that is not (or no longer) in the table.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A non-empty timestamp could not be parsed.
    #[error("Invalid timestamp in column '{column}' at row {row}: '{value}'")]
    InvalidTimestamp {
        column: String,
        row: usize,
        value: String,
    },

    /// A numeric rule met a text value.
    #[error("Non-numeric value in column '{column}' at row {row}: '{value}'")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    /// A column was inserted with the wrong number of cells.
    #[error("Column '{column}' has {actual} cells, table has {expected} rows")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// This is the error type returned by [`crate::transform::pipeline::run_file`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Load error.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Cleaning error.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Report serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Config Errors
// =============================================================================

/// Invalid runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port value is not a valid TCP port.
    #[error("Invalid port '{value}' in {source_name}")]
    InvalidPort { value: String, source_name: String },
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Socket or listener error.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking pipeline task panicked or was cancelled.
    #[error("Pipeline task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for cleaning operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
