//! Per-column summary of the cleaned table.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::models::{DType, Table};

/// Values drawn per column when it has more distinct values than this.
pub const SAMPLE_SIZE: usize = 2;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSummary {
    pub data_features: String,
    pub data_type: DType,
    pub null: usize,
    pub unique: usize,
    pub unique_sample: String,
}

/// Summarize every column: type, missing count, distinct count and a
/// sample of its distinct values.
///
/// Columns with more than [`SAMPLE_SIZE`] distinct (non-missing) values get
/// [`SAMPLE_SIZE`] values drawn without replacement from their distinct set;
/// others list the whole set. The distinct set includes a missing value if
/// the column has one.
pub fn data_summary<R: Rng + ?Sized>(table: &Table, rng: &mut R) -> Vec<FeatureSummary> {
    table
        .columns()
        .iter()
        .map(|column| {
            let distinct = column.distinct();
            let unique = column.n_unique();

            let sample: Vec<String> = if unique > SAMPLE_SIZE {
                distinct
                    .choose_multiple(rng, SAMPLE_SIZE)
                    .map(|cell| cell.to_string())
                    .collect()
            } else {
                distinct.iter().map(|cell| cell.to_string()).collect()
            };

            FeatureSummary {
                data_features: column.name.clone(),
                data_type: column.dtype,
                null: column.missing_count(),
                unique,
                unique_sample: sample.join(", "),
            }
        })
        .collect()
}

/// [`data_summary`] with the thread-local RNG.
pub fn data_summary_random(table: &Table) -> Vec<FeatureSummary> {
    data_summary(table, &mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cell, Column};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn table() -> Table {
        Table::new(vec![
            Column::inferred("sex", vec!["F".into(), "M".into(), "F".into(), "M".into()]),
            Column::inferred("stop", vec!["A".into(), "B".into(), "C".into(), Cell::Missing]),
            Column::inferred("amount", vec![Cell::Float(0.0), Cell::Missing, Cell::Float(0.0), Cell::Missing]),
        ])
        .unwrap()
    }

    #[test]
    fn test_small_columns_list_all_values() {
        let summary = data_summary(&table(), &mut StdRng::seed_from_u64(7));

        assert_eq!(summary[0].data_features, "sex");
        assert_eq!(summary[0].data_type, DType::Object);
        assert_eq!(summary[0].unique, 2);
        assert_eq!(summary[0].unique_sample, "F, M");

        assert_eq!(summary[2].null, 2);
        assert_eq!(summary[2].unique, 1);
        assert_eq!(summary[2].unique_sample, "0.0, nan");
    }

    #[test]
    fn test_large_columns_sample_two_distinct_values() {
        let allowed = ["A", "B", "C", "nan"];

        for seed in 0..20 {
            let summary = data_summary(&table(), &mut StdRng::seed_from_u64(seed));
            let stop = &summary[1];
            assert_eq!(stop.unique, 3);
            assert_eq!(stop.null, 1);

            let picked: Vec<&str> = stop.unique_sample.split(", ").collect();
            assert_eq!(picked.len(), SAMPLE_SIZE);
            assert_ne!(picked[0], picked[1]);
            assert!(picked.iter().all(|p| allowed.contains(p)));
        }
    }

    #[test]
    fn test_random_summary_covers_every_column() {
        let summary = data_summary_random(&table());
        assert_eq!(summary.len(), 3);
    }
}
