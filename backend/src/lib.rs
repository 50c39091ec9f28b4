//! # Transitclean - Transjakarta smart-card transaction cleaning
//!
//! Transitclean loads a Transjakarta tap-in/tap-out CSV export, profiles it,
//! runs a fixed sequence of cleaning steps, and produces the tables and chart
//! data a presentation layer displays.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│    Clean    │────▶│ Report JSON │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ (9 steps)   │     │ (+ charts)  │
//! └─────────────┘     └──────┬──────┘     └─────────────┘     └─────────────┘
//!                            │
//!                            ▼
//!                     ┌─────────────┐
//!                     │   Profile   │
//!                     │ (raw views) │
//!                     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use transitclean::run_file;
//!
//! fn main() {
//!     let output = run_file("Transjakarta.csv").unwrap();
//!     println!("{} rows after cleaning", output.cleaned.n_rows());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Column-major table (Cell, Column, Table)
//! - [`parser`] - CSV parsing with auto-detection
//! - [`profile`] - Raw-data views and quality audit
//! - [`transform`] - Cleaning, summary, charts, and pipeline
//! - [`config`] - Runtime configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Profiling
pub mod profile;

// Transformation
pub mod transform;

// Configuration
pub mod config;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, LoadError, PipelineError, PipelineResult, ServerError, TransformError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{columns, Cell, Column, DType, Table};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_file_auto,
    parse_str, ParseResult,
};

// =============================================================================
// Re-exports - Profiling
// =============================================================================

pub use profile::{
    audit, describe_categorical, describe_numeric, info, raw_preview, unique_values, Audit,
    CategoricalStats, NumericStats, TableInfo, UniqueValues,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    describe, run, run_bytes, run_file, PipelineOutput, PipelineReport, RawViews, SourceInfo,
};
pub use transform::{
    chart_data, clean_table, data_summary, data_summary_random, ChartData, CleaningStats,
    FeatureSummary,
};

// =============================================================================
// Re-exports - Config / API
// =============================================================================

pub use api::types::{error_response, ReportResponse};
pub use config::AppConfig;

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
