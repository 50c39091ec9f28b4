//! The cleaning sequence.
//!
//! Each step is a function over `&mut Table`. Steps depend on each other's
//! output (the corridor fallbacks read what the remapping left behind, the
//! fare tiers read the repaired corridor ids, the timestamp split counts
//! positions after `Age` is placed), so they must run in the order
//! [`clean_table`] runs them.

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{TransformError, TransformResult};
use crate::models::columns::*;
use crate::models::{Cell, Column, DType, Table};

/// Year ages are computed against.
pub const REFERENCE_YEAR: i64 = 2023;

/// Cardholders born in or before this year ride free.
pub const SENIOR_BIRTH_YEAR_MAX: f64 = 1963.0;

/// Corridors charged the premium flat fare.
pub const PREMIUM_CORRIDORS: [&str; 11] = [
    "1T", "B14", "3B", "T21", "D32", "S31", "B13", "D31", "1K", "6P", "S12",
];

pub const SENIOR_FARE: f64 = 0.0;
pub const PREMIUM_FARE: f64 = 20000.0;
pub const STANDARD_FARE: f64 = 3500.0;

/// Corridor whose presence among id-less rows triggers the id fallback.
pub const MARUNDA_CORRIDOR_NAME: &str = "Rusun Marunda - Terminal Terpadu Pulo Gebang";
pub const MARUNDA_CORRIDOR_ID: &str = "JAK110A";

/// Name given to every row without a corridor name.
pub const FALLBACK_CORRIDOR_NAME: &str = "Rusun Flamboyan-Kalideres";

/// Columns with no use downstream.
pub const UNUSED_COLUMNS: [&str; 8] = [
    TAP_IN_STOPS_LAT,
    TAP_IN_STOPS_LON,
    TAP_OUT_STOPS_LAT,
    TAP_OUT_STOPS_LON,
    PAY_CARD_NAME,
    TRANS_ID,
    STOP_END_SEQ,
    STOP_START_SEQ,
];

/// Output position of `Age`.
pub const AGE_POSITION: usize = 3;

/// Where a timestamp is split into time-of-day, weekday and month-day.
#[derive(Debug, Clone, Copy)]
pub struct TimestampSplit {
    /// Raw timestamp column; the time-of-day column takes over its name.
    pub source: &'static str,
    /// Name of the time-of-day column until the source is dropped.
    pub staging: &'static str,
    pub day: &'static str,
    pub date: &'static str,
    /// Position of the time-of-day column; day and date follow it.
    pub position: usize,
}

pub const TAP_IN_SPLIT: TimestampSplit = TimestampSplit {
    source: TAP_IN_TIME,
    staging: "tapInTime2",
    day: TAP_IN_DAY,
    date: TAP_IN_DATE,
    position: 8,
};

pub const TAP_OUT_SPLIT: TimestampSplit = TimestampSplit {
    source: TAP_OUT_TIME,
    staging: "tapOutTime2",
    day: TAP_OUT_DAY,
    date: TAP_OUT_DATE,
    position: 13,
};

/// What the payment imputation filled, per tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FareFills {
    pub senior: usize,
    pub premium: usize,
    pub standard: usize,
}

/// Row and cell counts touched by each step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleaningStats {
    pub rows_in: usize,
    pub duplicates_removed: usize,
    pub corridor_ids_remapped: usize,
    pub corridor_ids_defaulted: usize,
    pub corridor_names_defaulted: usize,
    pub missing_tap_in_dropped: usize,
    pub missing_tap_out_dropped: usize,
    pub fares: FareFills,
    pub rows_out: usize,
}

/// Run the full cleaning sequence in place.
pub fn clean_table(table: &mut Table) -> TransformResult<CleaningStats> {
    let mut stats = CleaningStats {
        rows_in: table.n_rows(),
        ..Default::default()
    };

    stats.duplicates_removed = drop_duplicates(table);
    drop_unused_columns(table)?;
    stats.corridor_ids_remapped = remap_corridor_ids(table)?;
    stats.corridor_ids_defaulted = fill_marunda_corridor_ids(table)?;
    stats.corridor_names_defaulted = fill_corridor_names(table)?;
    stats.missing_tap_in_dropped = drop_missing(table, TAP_IN_STOPS)?;
    stats.missing_tap_out_dropped = drop_missing(table, TAP_OUT_STOPS)?;
    stats.fares = impute_pay_amount(table)?;
    derive_age(table)?;
    split_timestamp(table, &TAP_IN_SPLIT)?;
    split_timestamp(table, &TAP_OUT_SPLIT)?;

    stats.rows_out = table.n_rows();
    Ok(stats)
}

/// Remove exact duplicate rows, keeping the first. Returns rows removed.
pub fn drop_duplicates(table: &mut Table) -> usize {
    let keep: Vec<bool> = table.duplicated().into_iter().map(|d| !d).collect();
    let before = table.n_rows();
    table.retain_rows(&keep);
    before - table.n_rows()
}

pub fn drop_unused_columns(table: &mut Table) -> TransformResult<()> {
    table.drop_columns(&UNUSED_COLUMNS)
}

/// Last corridor id seen for each corridor name, scanning top to bottom.
///
/// A missing name is a key like any other, so all name-less rows share the
/// id of the last name-less row. A missing id is a value: if the last row
/// for a name has no id, the name maps to missing.
pub fn corridor_id_map(table: &Table) -> TransformResult<IndexMap<Cell, Cell>> {
    let names = table.require(CORRIDOR_NAME)?;
    let ids = table.require(CORRIDOR_ID)?;

    let mut map = IndexMap::new();
    for (name, id) in names.cells.iter().zip(&ids.cells) {
        map.insert(name.clone(), id.clone());
    }
    Ok(map)
}

/// Replace each row's corridor id with the id mapped from its name, when
/// the name is a key. Returns the number of ids that changed.
pub fn remap_corridor_ids(table: &mut Table) -> TransformResult<usize> {
    let map = corridor_id_map(table)?;
    let names = table.require(CORRIDOR_NAME)?.cells.clone();
    let ids = table.require_mut(CORRIDOR_ID)?;

    let mut changed = 0;
    for (row, name) in names.iter().enumerate() {
        if let Some(mapped) = map.get(name) {
            if ids.cells[row] != *mapped {
                ids.set(row, mapped.clone());
                changed += 1;
            }
        }
    }
    Ok(changed)
}

/// If the Marunda corridor is among the rows still missing an id, give
/// every id-less row the Marunda id. Returns rows filled.
pub fn fill_marunda_corridor_ids(table: &mut Table) -> TransformResult<usize> {
    let names = table.require(CORRIDOR_NAME)?.cells.clone();
    let ids = table.require_mut(CORRIDOR_ID)?;

    let missing: Vec<usize> = (0..ids.len()).filter(|&i| ids.cells[i].is_missing()).collect();
    let marunda = Cell::text(MARUNDA_CORRIDOR_NAME);
    if !missing.iter().any(|&i| names[i] == marunda) {
        return Ok(0);
    }

    for &row in &missing {
        ids.set(row, Cell::text(MARUNDA_CORRIDOR_ID));
    }
    Ok(missing.len())
}

/// Give every row without a corridor name the fallback name.
pub fn fill_corridor_names(table: &mut Table) -> TransformResult<usize> {
    let names = table.require_mut(CORRIDOR_NAME)?;

    let mut filled = 0;
    for row in 0..names.len() {
        if names.cells[row].is_missing() {
            names.set(row, Cell::text(FALLBACK_CORRIDOR_NAME));
            filled += 1;
        }
    }
    Ok(filled)
}

/// Drop rows missing a value in `column`. Returns rows dropped.
pub fn drop_missing(table: &mut Table, column: &str) -> TransformResult<usize> {
    let keep: Vec<bool> = table
        .require(column)?
        .cells
        .iter()
        .map(|c| !c.is_missing())
        .collect();
    let before = table.n_rows();
    table.retain_rows(&keep);
    Ok(before - table.n_rows())
}

/// Numeric birth years, failing on text.
fn birth_years(table: &Table) -> TransformResult<Vec<Option<f64>>> {
    table
        .require(PAY_CARD_BIRTH_DATE)?
        .cells
        .iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            Cell::Text(value) => Err(TransformError::NonNumeric {
                column: PAY_CARD_BIRTH_DATE.to_string(),
                row,
                value: value.clone(),
            }),
            other => Ok(other.as_f64()),
        })
        .collect()
}

/// Fill missing payment amounts in three tiers, each applied only to rows
/// still missing after the previous one: seniors ride free, premium
/// corridors pay the flat premium fare, everyone else the standard fare.
pub fn impute_pay_amount(table: &mut Table) -> TransformResult<FareFills> {
    let births = birth_years(table)?;
    let ids = table.require(CORRIDOR_ID)?.cells.clone();
    let amounts = table.require_mut(PAY_AMOUNT)?;

    let mut fills = FareFills::default();

    for (row, birth) in births.iter().enumerate() {
        if amounts.cells[row].is_missing() && birth.is_some_and(|b| b <= SENIOR_BIRTH_YEAR_MAX) {
            amounts.set(row, Cell::Float(SENIOR_FARE));
            fills.senior += 1;
        }
    }

    for (row, id) in ids.iter().enumerate() {
        let premium = id.as_str().is_some_and(|id| PREMIUM_CORRIDORS.contains(&id));
        if amounts.cells[row].is_missing() && premium {
            amounts.set(row, Cell::Float(PREMIUM_FARE));
            fills.premium += 1;
        }
    }

    for row in 0..amounts.len() {
        if amounts.cells[row].is_missing() {
            amounts.set(row, Cell::Float(STANDARD_FARE));
            fills.standard += 1;
        }
    }

    Ok(fills)
}

/// Replace the birth year with `Age` at [`AGE_POSITION`].
pub fn derive_age(table: &mut Table) -> TransformResult<()> {
    let births = table.require(PAY_CARD_BIRTH_DATE)?;
    let mut cells = Vec::with_capacity(births.len());
    let non_numeric = |row: usize, value: String| TransformError::NonNumeric {
        column: PAY_CARD_BIRTH_DATE.to_string(),
        row,
        value,
    };

    for (row, cell) in births.cells.iter().enumerate() {
        cells.push(match cell {
            Cell::Int(year) => REFERENCE_YEAR
                .checked_sub(*year)
                .map(Cell::Int)
                .ok_or_else(|| non_numeric(row, year.to_string()))?,
            Cell::Float(year) => Cell::Float(REFERENCE_YEAR as f64 - year),
            Cell::Missing => Cell::Missing,
            Cell::Text(value) => return Err(non_numeric(row, value.clone())),
        });
    }
    let dtype = births.dtype;

    table.push_column(Column::new(AGE, dtype, cells))?;
    table.move_column(AGE, AGE_POSITION)?;
    table.drop_columns(&[PAY_CARD_BIRTH_DATE])
}

/// Parse a timestamp in any of the layouts the dataset uses.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    const LAYOUTS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];

    let raw = raw.trim();
    LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn text_column(name: &str, values: &[Option<NaiveDateTime>], layout: &str) -> Column {
    let cells = values
        .iter()
        .map(|v| match v {
            Some(ts) => Cell::Text(ts.format(layout).to_string()),
            None => Cell::Missing,
        })
        .collect();
    Column::new(name, DType::Object, cells)
}

/// Split a timestamp column into `HH:MM`, weekday name and `MM-DD`.
///
/// The three derived columns are placed at `split.position` onwards, the
/// raw column is dropped and the time-of-day column takes its name. Missing
/// timestamps give missing parts; unparsable ones are an error.
pub fn split_timestamp(table: &mut Table, split: &TimestampSplit) -> TransformResult<()> {
    let source = table.require(split.source)?;
    let mut parsed = Vec::with_capacity(source.len());
    for (row, cell) in source.cells.iter().enumerate() {
        let value = match cell {
            Cell::Missing => None,
            Cell::Text(raw) => Some(parse_timestamp(raw).ok_or_else(|| {
                TransformError::InvalidTimestamp {
                    column: split.source.to_string(),
                    row,
                    value: raw.clone(),
                }
            })?),
            other => {
                return Err(TransformError::InvalidTimestamp {
                    column: split.source.to_string(),
                    row,
                    value: other.to_string(),
                })
            }
        };
        parsed.push(value);
    }

    table.push_column(text_column(split.staging, &parsed, "%H:%M"))?;
    table.push_column(text_column(split.day, &parsed, "%A"))?;
    table.push_column(text_column(split.date, &parsed, "%m-%d"))?;
    table.move_column(split.staging, split.position)?;
    table.move_column(split.day, split.position + 1)?;
    table.move_column(split.date, split.position + 2)?;
    table.drop_columns(&[split.source])?;
    table.rename_column(split.staging, split.source);
    Ok(())
}
