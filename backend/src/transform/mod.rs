//! Transformation module.
//!
//! This module turns the raw transaction table into the cleaned one:
//! - Clean: the ordered cleaning steps
//! - Summary: per-feature overview of the cleaned table
//! - Charts: value counts for the presentation layer
//! - Pipeline: load, describe, clean, summarize

pub mod charts;
pub mod clean;
pub mod pipeline;
pub mod summary;

#[cfg(test)]
pub(crate) mod fixtures;

pub use charts::{chart_data, value_counts_sorted, ChartData, ValueCount};
pub use clean::{clean_table, CleaningStats, FareFills};
pub use pipeline::*;
pub use summary::{data_summary, data_summary_random, FeatureSummary};
