//! High-level pipeline API: load, describe, clean, summarize.
//!
//! Every call recomputes everything from the input; nothing is cached
//! between runs and no state is shared, so independent runs can execute
//! in parallel.
//!
//! # Example
//!
//! ```rust,ignore
//! use transitclean::transform::pipeline::run_file;
//!
//! let output = run_file("Transjakarta.csv")?;
//! println!("{} rows after cleaning", output.cleaned.n_rows());
//! println!("{}", serde_json::to_string_pretty(&output.report)?);
//! ```

use rand::Rng;
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

use super::charts::{chart_data, ChartData};
use super::clean::{clean_table, CleaningStats};
use super::summary::{data_summary, FeatureSummary};
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::PipelineResult;
use crate::models::columns::RAW;
use crate::models::Table;
use crate::parser::{parse_bytes_auto, parse_file_auto, require_columns, ParseResult};
use crate::profile::{
    audit, describe_categorical, describe_numeric, info, raw_preview, unique_values, Audit,
    CategoricalStats, NumericStats, TableInfo, UniqueValues,
};

/// Rows of the cleaned table included in the report.
pub const CLEANED_PREVIEW_ROWS: usize = 5;

/// Input file information
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub encoding: String,
    pub delimiter: char,
    pub row_count: usize,
    pub columns: Vec<String>,
}

/// Display views of the raw table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawViews {
    pub preview: Table,
    pub info: TableInfo,
    pub numeric: Vec<NumericStats>,
    pub categorical: Vec<CategoricalStats>,
    pub unique_values: Vec<UniqueValues>,
}

/// Everything the presentation layer shows for one run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub run_id: String,
    pub source: SourceInfo,
    pub raw: RawViews,
    pub audit: Audit,
    pub cleaning: CleaningStats,
    pub cleaned_preview: Table,
    pub summary: Vec<FeatureSummary>,
    pub charts: ChartData,
}

impl PipelineReport {
    /// Serialize the report, optionally pretty-printed.
    pub fn to_json(&self, pretty: bool) -> PipelineResult<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

/// Report plus the full cleaned table.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub report: PipelineReport,
    pub cleaned: Table,
}

/// Run the pipeline over a CSV file.
pub fn run_file<P: AsRef<Path>>(path: P) -> PipelineResult<PipelineOutput> {
    log_info(format!("📖 Reading {}...", path.as_ref().display()));
    let parsed = parse_file_auto(path)?;
    run(parsed, &mut rand::thread_rng())
}

/// Run the pipeline over CSV bytes (e.g. an upload).
pub fn run_bytes(bytes: &[u8]) -> PipelineResult<PipelineOutput> {
    log_info(format!("📖 Reading {} bytes...", bytes.len()));
    let parsed = parse_bytes_auto(bytes)?;
    run(parsed, &mut rand::thread_rng())
}

/// Describe the raw table.
pub fn describe(table: &Table) -> RawViews {
    RawViews {
        preview: raw_preview(table),
        info: info(table),
        numeric: describe_numeric(table),
        categorical: describe_categorical(table),
        unique_values: unique_values(table),
    }
}

/// Run every stage over an already-loaded table. `rng` drives the summary
/// sampling.
pub fn run<R: Rng + ?Sized>(parsed: ParseResult, rng: &mut R) -> PipelineResult<PipelineOutput> {
    let ParseResult {
        table,
        encoding,
        delimiter,
    } = parsed;

    log_success(format!("Detected encoding: {}", encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(delimiter)));
    log_success(format!("Read {} rows, {} columns", table.n_rows(), table.n_cols()));
    require_columns(&table, &RAW)?;

    let source = SourceInfo {
        encoding,
        delimiter,
        row_count: table.n_rows(),
        columns: table.headers().iter().map(|h| h.to_string()).collect(),
    };

    log_info("📊 Describing raw data...");
    let raw = describe(&table);
    let audit = audit(&table);
    if audit.duplicate_rows > 0 {
        log_warning(format!("{} duplicate rows", audit.duplicate_rows));
    }
    for share in audit.missing.iter().filter(|m| m.missing_percent > 0.0) {
        log_info_indent(format!("{}: {:.2}% missing", share.column, share.missing_percent), 1);
    }

    log_info("🧹 Cleaning...");
    let mut cleaned = table;
    let cleaning = clean_table(&mut cleaned)?;
    print_cleaning(&cleaning);

    log_info("📋 Summarizing cleaned data...");
    let summary = data_summary(&cleaned, rng);
    let charts = chart_data(&cleaned)?;
    log_success(format!(
        "{} rows, {} columns after cleaning",
        cleaned.n_rows(),
        cleaned.n_cols()
    ));

    let report = PipelineReport {
        run_id: Uuid::new_v4().to_string(),
        source,
        raw,
        audit,
        cleaning,
        cleaned_preview: cleaned.head(CLEANED_PREVIEW_ROWS),
        summary,
        charts,
    };

    Ok(PipelineOutput { report, cleaned })
}

/// Format delimiter for display
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}

fn print_cleaning(stats: &CleaningStats) {
    log_success(format!("Removed {} duplicate rows", stats.duplicates_removed));
    log_success(format!("Remapped {} corridor ids from names", stats.corridor_ids_remapped));
    if stats.corridor_ids_defaulted > 0 {
        log_success(format!("Defaulted {} corridor ids", stats.corridor_ids_defaulted));
    }
    if stats.corridor_names_defaulted > 0 {
        log_success(format!("Defaulted {} corridor names", stats.corridor_names_defaulted));
    }
    log_success(format!(
        "Dropped {} rows without tap-in stop, {} without tap-out stop",
        stats.missing_tap_in_dropped, stats.missing_tap_out_dropped
    ));
    log_success(format!(
        "Filled payAmount: {} senior, {} premium, {} standard",
        stats.fares.senior, stats.fares.premium, stats.fares.standard
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LoadError, PipelineError};
    use crate::models::columns::*;
    use crate::transform::fixtures::{csv, row};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn run_csv(text: &str) -> PipelineResult<PipelineOutput> {
        let parsed = parse_bytes_auto(text.as_bytes())?;
        run(parsed, &mut StdRng::seed_from_u64(42))
    }

    fn sample_csv() -> String {
        csv(&[
            row(&[("transID", "A"), ("payCardSex", "F"), ("payCardBirthDate", "1960"), ("payAmount", "")]),
            row(&[("transID", "A"), ("payCardSex", "F"), ("payCardBirthDate", "1960"), ("payAmount", "")]),
            row(&[("transID", "B"), ("payCardBirthDate", "1990"), ("corridorID", "B14"), ("corridorName", "Bekasi - Cawang"), ("payAmount", "")]),
            row(&[("transID", "C"), ("payCardBirthDate", "1990"), ("corridorID", "JAK01"), ("corridorName", "Tanah Abang - Kebayoran"), ("payAmount", "")]),
            row(&[("transID", "D"), ("tapInStops", "")]),
            row(&[("transID", "E"), ("tapInTime", "2023-04-05 08:07:00")]),
        ])
    }

    #[test]
    fn test_full_run() {
        let output = run_csv(&sample_csv()).unwrap();
        let report = &output.report;

        assert_eq!(report.source.row_count, 6);
        assert_eq!(report.source.delimiter, ',');
        assert_eq!(report.audit.duplicate_rows, 1);
        assert_eq!(report.raw.preview.n_rows(), 6);
        assert_eq!(report.raw.info.n_cols, 22);

        assert_eq!(report.cleaning.duplicates_removed, 1);
        assert_eq!(report.cleaning.missing_tap_in_dropped, 1);
        assert_eq!(output.cleaned.n_rows(), 4);
        assert_eq!(report.cleaned_preview.n_rows(), 4);
        assert_eq!(report.summary.len(), 18);
    }

    #[test]
    fn test_fare_scenarios() {
        let output = run_csv(&sample_csv()).unwrap();
        let amounts = &output.cleaned.column(PAY_AMOUNT).unwrap().cells;

        assert_eq!(amounts[0].as_f64(), Some(0.0));
        assert_eq!(amounts[1].as_f64(), Some(20000.0));
        assert_eq!(amounts[2].as_f64(), Some(3500.0));
        assert!(amounts.iter().all(|a| !a.is_missing()));
    }

    #[test]
    fn test_schema_positions() {
        let output = run_csv(&sample_csv()).unwrap();
        let headers = output.cleaned.headers();

        assert_eq!(headers[3], AGE);
        assert_eq!(&headers[8..=10], &[TAP_IN_TIME, TAP_IN_DAY, TAP_IN_DATE]);
        assert_eq!(&headers[13..=15], &[TAP_OUT_TIME, TAP_OUT_DAY, TAP_OUT_DATE]);
    }

    #[test]
    fn test_chart_counts() {
        let output = run_csv(&sample_csv()).unwrap();
        let charts = &output.report.charts;

        let sexes: Vec<(String, usize)> = charts
            .sex_counts
            .iter()
            .map(|c| (c.value.to_string(), c.count))
            .collect();
        assert_eq!(sexes, vec![("F".to_string(), 1), ("M".to_string(), 3)]);

        let amounts: Vec<String> = charts
            .pay_amount_counts
            .iter()
            .map(|c| c.value.to_string())
            .collect();
        assert_eq!(amounts, vec!["0.0", "3500.0", "20000.0"]);
    }

    #[test]
    fn test_report_serializes() {
        let output = run_csv(&sample_csv()).unwrap();
        let json = serde_json::to_value(&output.report).unwrap();

        assert_eq!(json["cleanedPreview"]["columns"][3], "Age");
        assert_eq!(json["audit"]["duplicateRows"], 1);
        assert_eq!(json["raw"]["numeric"][0]["column"], "payCardID");
        assert!(json["runId"].as_str().is_some());

        let compact = output.report.to_json(false).unwrap();
        let pretty = output.report.to_json(true).unwrap();
        assert!(!compact.contains('\n'));
        assert!(pretty.contains('\n'));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&compact).unwrap(),
            serde_json::from_str::<serde_json::Value>(&pretty).unwrap()
        );
    }

    #[test]
    fn test_missing_schema_column_is_load_error() {
        let result = run_csv("transID,payAmount\nA,3500");
        assert!(matches!(
            result,
            Err(PipelineError::Load(LoadError::MissingColumn(_)))
        ));
    }

    #[test]
    fn test_bad_timestamp_aborts_run() {
        let text = csv(&[row(&[("tapOutTime", "25/13/2023")])]);
        assert!(matches!(run_csv(&text), Err(PipelineError::Transform(_))));
    }

    #[test]
    fn test_run_file_missing_path() {
        assert!(matches!(
            run_file("/nowhere/Transjakarta.csv"),
            Err(PipelineError::Load(LoadError::Io(_)))
        ));
    }
}
