//! Descriptive statistics and the missing/duplicate audit.
//!
//! Everything here is read-only: these views are computed from the raw
//! table for display and never feed back into cleaning.
//!
//! - [`raw_preview`] - first and last three rows
//! - [`info`] - shape, per-column type and non-null count
//! - [`describe_numeric`] / [`describe_categorical`] - summary statistics
//! - [`unique_values`] - distinct count and first five distinct values
//! - [`audit`] - missing percentage per column and duplicate-row count

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::models::{Cell, DType, Table};

/// Rows taken from each end of the raw table for the preview.
pub const PREVIEW_ROWS: usize = 3;

/// Distinct values listed per column in [`unique_values`].
pub const UNIQUE_SAMPLE_SIZE: usize = 5;

// =============================================================================
// Preview & info
// =============================================================================

/// First [`PREVIEW_ROWS`] rows followed by the last [`PREVIEW_ROWS`] rows.
///
/// Rows appear twice when the table is shorter than both ends combined.
pub fn raw_preview(table: &Table) -> Table {
    let n = table.n_rows();
    let head = 0..PREVIEW_ROWS.min(n);
    let tail = n.saturating_sub(PREVIEW_ROWS)..n;
    let indices: Vec<usize> = head.chain(tail).collect();
    table.select_rows(&indices)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    pub non_null: usize,
    pub dtype: DType,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub n_rows: usize,
    pub n_cols: usize,
    pub columns: Vec<ColumnInfo>,
}

pub fn info(table: &Table) -> TableInfo {
    TableInfo {
        n_rows: table.n_rows(),
        n_cols: table.n_cols(),
        columns: table
            .columns()
            .iter()
            .map(|c| ColumnInfo {
                name: c.name.clone(),
                non_null: c.non_null_count(),
                dtype: c.dtype,
            })
            .collect(),
    }
}

/// Layout follows pandas' `DataFrame.info()`.
impl fmt::Display for TableInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RangeIndex: {} entries", self.n_rows)?;
        writeln!(f, "Data columns (total {} columns):", self.n_cols)?;
        writeln!(f, " #   {:<18} {:<16} Dtype", "Column", "Non-Null Count")?;
        for (i, column) in self.columns.iter().enumerate() {
            writeln!(
                f,
                " {:<3} {:<18} {:<16} {}",
                i,
                column.name,
                format!("{} non-null", column.non_null),
                column.dtype
            )?;
        }

        let mut counts: Vec<(DType, usize)> = Vec::new();
        for column in &self.columns {
            match counts.iter_mut().find(|(d, _)| *d == column.dtype) {
                Some((_, n)) => *n += 1,
                None => counts.push((column.dtype, 1)),
            }
        }
        counts.sort_by_key(|(d, _)| d.as_str());
        let dtypes: Vec<String> = counts.iter().map(|(d, n)| format!("{}({})", d, n)).collect();
        write!(f, "dtypes: {}", dtypes.join(", "))
    }
}

// =============================================================================
// Describe
// =============================================================================

/// Summary of a numeric column. Statistics over zero values are `None`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericStats {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q25: Option<f64>,
    #[serde(rename = "50%")]
    pub q50: Option<f64>,
    #[serde(rename = "75%")]
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Summary of a text column.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoricalStats {
    pub column: String,
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: usize,
}

/// Linear-interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

fn numeric_stats(name: &str, cells: &[Cell]) -> NumericStats {
    let mut values: Vec<f64> = cells.iter().filter_map(Cell::as_f64).collect();
    values.sort_by(f64::total_cmp);

    let count = values.len();
    let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
    // sample standard deviation (ddof = 1)
    let std = match (mean, count) {
        (Some(m), n) if n > 1 => {
            let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
            Some((ss / (n - 1) as f64).sqrt())
        }
        _ => None,
    };

    NumericStats {
        column: name.to_string(),
        count,
        mean,
        std,
        min: values.first().copied(),
        q25: quantile(&values, 0.25),
        q50: quantile(&values, 0.50),
        q75: quantile(&values, 0.75),
        max: values.last().copied(),
    }
}

/// Statistics for every numeric column, in column order.
pub fn describe_numeric(table: &Table) -> Vec<NumericStats> {
    table
        .columns()
        .iter()
        .filter(|c| c.dtype.is_numeric())
        .map(|c| numeric_stats(&c.name, &c.cells))
        .collect()
}

/// Statistics for every text column, in column order.
///
/// `top` is the most frequent value; ties go to the value seen first.
pub fn describe_categorical(table: &Table) -> Vec<CategoricalStats> {
    table
        .columns()
        .iter()
        .filter(|c| c.dtype == DType::Object)
        .map(|c| {
            let mut counts: HashMap<&Cell, usize> = HashMap::new();
            for cell in c.cells.iter().filter(|c| !c.is_missing()) {
                *counts.entry(cell).or_default() += 1;
            }

            let mut top: Option<(&Cell, usize)> = None;
            for cell in c.distinct() {
                let n = counts.get(cell).copied().unwrap_or(0);
                if n > top.map(|(_, best)| best).unwrap_or(0) {
                    top = Some((cell, n));
                }
            }

            CategoricalStats {
                column: c.name.clone(),
                count: c.non_null_count(),
                unique: counts.len(),
                top: top.map(|(cell, _)| cell.to_string()),
                freq: top.map(|(_, n)| n).unwrap_or(0),
            }
        })
        .collect()
}

/// Distinct-value overview of one column.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueValues {
    pub column_name: String,
    pub number_of_unique: usize,
    pub unique_sample: Vec<String>,
}

/// For every column: distinct non-missing count and the first
/// [`UNIQUE_SAMPLE_SIZE`] distinct values in first-seen order (missing
/// rendered as `nan`).
pub fn unique_values(table: &Table) -> Vec<UniqueValues> {
    table
        .columns()
        .iter()
        .map(|c| UniqueValues {
            column_name: c.name.clone(),
            number_of_unique: c.n_unique(),
            unique_sample: c
                .distinct()
                .into_iter()
                .take(UNIQUE_SAMPLE_SIZE)
                .map(|cell| cell.to_string())
                .collect(),
        })
        .collect()
}

// =============================================================================
// Audit
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingShare {
    pub column: String,
    pub missing_percent: f64,
}

/// Missing-value and duplicate audit of the raw table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    pub missing: Vec<MissingShare>,
    pub duplicate_rows: usize,
}

/// Percentage of missing values per column and the number of rows that
/// exactly repeat an earlier row.
pub fn audit(table: &Table) -> Audit {
    let total = table.n_rows();
    let missing = table
        .columns()
        .iter()
        .map(|c| MissingShare {
            column: c.name.clone(),
            missing_percent: if total == 0 {
                f64::NAN
            } else {
                c.missing_count() as f64 / total as f64 * 100.0
            },
        })
        .collect();

    Audit {
        missing,
        duplicate_rows: table.duplicated().into_iter().filter(|d| *d).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Column;

    fn table() -> Table {
        Table::new(vec![
            Column::inferred(
                "n",
                vec![Cell::Int(1), Cell::Int(2), Cell::Int(3), Cell::Int(4), Cell::Int(4)],
            ),
            Column::inferred(
                "s",
                vec!["F".into(), "M".into(), "M".into(), Cell::Missing, Cell::Missing],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_raw_preview_head_and_tail() {
        let preview = raw_preview(&table());
        let firsts: Vec<String> = (0..preview.n_rows()).map(|i| preview.row(i)[0].to_string()).collect();
        assert_eq!(firsts, vec!["1", "2", "3", "3", "4", "4"]);
    }

    #[test]
    fn test_info_counts() {
        let info = info(&table());
        assert_eq!(info.n_rows, 5);
        assert_eq!(info.columns[1].non_null, 3);
        assert_eq!(info.columns[1].dtype, DType::Object);

        let text = info.to_string();
        assert!(text.contains("5 entries"));
        assert!(text.contains("dtypes: int64(1), object(1)"));
    }

    #[test]
    fn test_info_dtypes_sorted_by_name() {
        let table = Table::new(vec![
            Column::inferred("id", vec!["T1".into(), "T2".into()]),
            Column::inferred("year", vec![Cell::Int(1990), Cell::Int(2008)]),
            Column::inferred("amount", vec![Cell::Float(3500.0), Cell::Missing]),
            Column::inferred("stop", vec!["P1".into(), "P2".into()]),
        ])
        .unwrap();

        let text = info(&table).to_string();
        assert!(text.ends_with("dtypes: float64(1), int64(1), object(2)"));
    }

    #[test]
    fn test_describe_numeric() {
        let stats = describe_numeric(&table());
        assert_eq!(stats.len(), 1);

        let n = &stats[0];
        assert_eq!(n.count, 5);
        assert_eq!(n.mean, Some(2.8));
        assert_eq!(n.min, Some(1.0));
        assert_eq!(n.q25, Some(2.0));
        assert_eq!(n.q50, Some(3.0));
        assert_eq!(n.q75, Some(4.0));
        assert_eq!(n.max, Some(4.0));
        let std = n.std.unwrap();
        assert!((std - 1.303840).abs() < 1e-6);
    }

    #[test]
    fn test_quantile_interpolates() {
        assert_eq!(quantile(&[1.0, 2.0], 0.25), Some(1.25));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_describe_categorical() {
        let stats = describe_categorical(&table());
        assert_eq!(stats.len(), 1);

        let s = &stats[0];
        assert_eq!(s.count, 3);
        assert_eq!(s.unique, 2);
        assert_eq!(s.top.as_deref(), Some("M"));
        assert_eq!(s.freq, 2);
    }

    #[test]
    fn test_unique_values_first_seen_with_nan() {
        let values = unique_values(&table());
        assert_eq!(values[1].number_of_unique, 2);
        assert_eq!(values[1].unique_sample, vec!["F", "M", "nan"]);
        assert_eq!(values[0].unique_sample, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_audit() {
        let audit = audit(&table());
        assert_eq!(audit.missing[0].missing_percent, 0.0);
        assert_eq!(audit.missing[1].missing_percent, 40.0);
        assert_eq!(audit.duplicate_rows, 1);
    }
}
