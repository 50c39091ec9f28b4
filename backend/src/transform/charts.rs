//! Count tables behind the two bar charts.

use serde::Serialize;
use std::collections::HashMap;

use crate::error::TransformResult;
use crate::models::columns::{PAY_AMOUNT, PAY_CARD_SEX};
use crate::models::{Cell, Column, Table};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: Cell,
    pub count: usize,
}

/// Rows per distinct non-missing value, sorted by value.
pub fn value_counts_sorted(column: &Column) -> Vec<ValueCount> {
    let mut counts: HashMap<&Cell, usize> = HashMap::new();
    for cell in column.cells.iter().filter(|c| !c.is_missing()) {
        *counts.entry(cell).or_default() += 1;
    }

    let mut counts: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.clone(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| a.value.sort_cmp(&b.value));
    counts
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub sex_counts: Vec<ValueCount>,
    pub pay_amount_counts: Vec<ValueCount>,
}

pub fn chart_data(table: &Table) -> TransformResult<ChartData> {
    Ok(ChartData {
        sex_counts: value_counts_sorted(table.require(PAY_CARD_SEX)?),
        pay_amount_counts: value_counts_sorted(table.require(PAY_AMOUNT)?),
    })
}
