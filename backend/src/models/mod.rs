//! Domain models for the transitclean pipeline.
//!
//! The pipeline works on a small column-major dataframe:
//!
//! - [`Cell`] - a single value (missing, integer, float, or text)
//! - [`DType`] - the column type, inferred at load the way pandas does
//! - [`Column`] - a named, typed vector of cells
//! - [`Table`] - an ordered list of equally long columns
//! - [`columns`] - names of the Transjakarta dataset columns

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{TransformError, TransformResult};

// =============================================================================
// Column names
// =============================================================================

/// Column names of the Transjakarta transaction dataset.
pub mod columns {
    pub const TRANS_ID: &str = "transID";
    pub const PAY_CARD_ID: &str = "payCardID";
    pub const PAY_CARD_BANK: &str = "payCardBank";
    pub const PAY_CARD_NAME: &str = "payCardName";
    pub const PAY_CARD_SEX: &str = "payCardSex";
    pub const PAY_CARD_BIRTH_DATE: &str = "payCardBirthDate";
    pub const CORRIDOR_ID: &str = "corridorID";
    pub const CORRIDOR_NAME: &str = "corridorName";
    pub const DIRECTION: &str = "direction";
    pub const TAP_IN_STOPS: &str = "tapInStops";
    pub const TAP_IN_STOPS_NAME: &str = "tapInStopsName";
    pub const TAP_IN_STOPS_LAT: &str = "tapInStopsLat";
    pub const TAP_IN_STOPS_LON: &str = "tapInStopsLon";
    pub const STOP_START_SEQ: &str = "stopStartSeq";
    pub const TAP_IN_TIME: &str = "tapInTime";
    pub const TAP_OUT_STOPS: &str = "tapOutStops";
    pub const TAP_OUT_STOPS_NAME: &str = "tapOutStopsName";
    pub const TAP_OUT_STOPS_LAT: &str = "tapOutStopsLat";
    pub const TAP_OUT_STOPS_LON: &str = "tapOutStopsLon";
    pub const STOP_END_SEQ: &str = "stopEndSeq";
    pub const TAP_OUT_TIME: &str = "tapOutTime";
    pub const PAY_AMOUNT: &str = "payAmount";

    pub const AGE: &str = "Age";
    pub const TAP_IN_DAY: &str = "tapInDay";
    pub const TAP_IN_DATE: &str = "tapInDate";
    pub const TAP_OUT_DAY: &str = "tapOutDay";
    pub const TAP_OUT_DATE: &str = "tapOutDate";

    /// Full raw column set, in file order.
    pub const RAW: [&str; 22] = [
        TRANS_ID,
        PAY_CARD_ID,
        PAY_CARD_BANK,
        PAY_CARD_NAME,
        PAY_CARD_SEX,
        PAY_CARD_BIRTH_DATE,
        CORRIDOR_ID,
        CORRIDOR_NAME,
        DIRECTION,
        TAP_IN_STOPS,
        TAP_IN_STOPS_NAME,
        TAP_IN_STOPS_LAT,
        TAP_IN_STOPS_LON,
        STOP_START_SEQ,
        TAP_IN_TIME,
        TAP_OUT_STOPS,
        TAP_OUT_STOPS_NAME,
        TAP_OUT_STOPS_LAT,
        TAP_OUT_STOPS_LON,
        STOP_END_SEQ,
        TAP_OUT_TIME,
        PAY_AMOUNT,
    ];
}

// =============================================================================
// Cell
// =============================================================================

/// A single table value.
///
/// Equality and hashing are exact: floats compare by bit pattern (with
/// `-0.0` folded into `0.0`) and two missing cells are equal, which is what
/// duplicate detection needs.
#[derive(Debug, Clone)]
pub enum Cell {
    Missing,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Build a float cell; NaN becomes [`Cell::Missing`].
    pub fn float(value: f64) -> Self {
        if value.is_nan() {
            Cell::Missing
        } else {
            Cell::Float(value)
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Numeric view of the cell, if it is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Ordering used for sorted aggregates: numbers by value, then text,
    /// then missing.
    pub fn sort_cmp(&self, other: &Cell) -> Ordering {
        fn rank(cell: &Cell) -> u8 {
            match cell {
                Cell::Int(_) | Cell::Float(_) => 0,
                Cell::Text(_) => 1,
                Cell::Missing => 2,
            }
        }

        match (self, other) {
            (Cell::Int(a), Cell::Int(b)) => a.cmp(b),
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => rank(a).cmp(&rank(b)),
            },
        }
    }

    fn float_key(value: f64) -> u64 {
        if value == 0.0 {
            0.0f64.to_bits()
        } else {
            value.to_bits()
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Missing, Cell::Missing) => true,
            (Cell::Int(a), Cell::Int(b)) => a == b,
            (Cell::Float(a), Cell::Float(b)) => Self::float_key(*a) == Self::float_key(*b),
            (Cell::Text(a), Cell::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Cell::Missing => {}
            Cell::Int(i) => i.hash(state),
            Cell::Float(f) => Self::float_key(*f).hash(state),
            Cell::Text(s) => s.hash(state),
        }
    }
}

/// Renders like Python's `str()`: `nan` for missing, whole floats keep `.0`.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => write!(f, "nan"),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(v) if v.is_infinite() => {
                write!(f, "{}", if *v > 0.0 { "inf" } else { "-inf" })
            }
            Cell::Float(v) if v.fract() == 0.0 && v.abs() < 1e16 => write!(f, "{:.1}", v),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Missing => serializer.serialize_none(),
            Cell::Int(i) => serializer.serialize_i64(*i),
            Cell::Float(f) => serializer.serialize_f64(*f),
            Cell::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::float(value)
    }
}

// =============================================================================
// DType
// =============================================================================

/// Column type, named the way pandas names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Int64,
    Float64,
    Object,
}

impl DType {
    /// Infer a type from already-typed cells.
    ///
    /// Integers with any missing value widen to `Float64`; an all-missing
    /// column is `Float64`; any text makes the column `Object`.
    pub fn infer(cells: &[Cell]) -> Self {
        let mut has_missing = false;
        let mut has_float = false;

        for cell in cells {
            match cell {
                Cell::Missing => has_missing = true,
                Cell::Float(_) => has_float = true,
                Cell::Int(_) => {}
                Cell::Text(_) => return DType::Object,
            }
        }

        if has_missing || has_float {
            DType::Float64
        } else {
            DType::Int64
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DType::Int64 | DType::Float64)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DType::Int64 => "int64",
            DType::Float64 => "float64",
            DType::Object => "object",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Column
// =============================================================================

/// A named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub dtype: DType,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: DType, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            dtype,
            cells,
        }
    }

    /// Build a column whose type is inferred from its cells.
    ///
    /// In a `Float64` column integers are widened so every number shares a
    /// representation.
    pub fn inferred(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        let dtype = DType::infer(&cells);
        let cells = if dtype == DType::Float64 {
            cells
                .into_iter()
                .map(|c| match c {
                    Cell::Int(i) => Cell::Float(i as f64),
                    other => other,
                })
                .collect()
        } else {
            cells
        };
        Self::new(name, dtype, cells)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Overwrite one cell, upcasting the column type when needed: a float
    /// widens an integer column, text turns a numeric column into `Object`.
    pub fn set(&mut self, index: usize, cell: Cell) {
        match (&cell, self.dtype) {
            (Cell::Text(_), DType::Int64 | DType::Float64) => self.dtype = DType::Object,
            (Cell::Float(_) | Cell::Missing, DType::Int64) => {
                self.dtype = DType::Float64;
                for existing in &mut self.cells {
                    if let Cell::Int(i) = existing {
                        *existing = Cell::Float(*i as f64);
                    }
                }
            }
            _ => {}
        }

        let cell = match (cell, self.dtype) {
            (Cell::Int(i), DType::Float64) => Cell::Float(i as f64),
            (other, _) => other,
        };
        self.cells[index] = cell;
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_missing()).count()
    }

    pub fn non_null_count(&self) -> usize {
        self.len() - self.missing_count()
    }

    /// Distinct values in first-seen order, missing included.
    pub fn distinct(&self) -> Vec<&Cell> {
        let mut seen = std::collections::HashSet::new();
        self.cells.iter().filter(|c| seen.insert(*c)).collect()
    }

    /// Number of distinct non-missing values.
    pub fn n_unique(&self) -> usize {
        self.distinct().into_iter().filter(|c| !c.is_missing()).count()
    }
}

// =============================================================================
// Table
// =============================================================================

/// Column-major table. All columns have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    /// Build a table, checking that all columns have the same length.
    pub fn new(columns: Vec<Column>) -> TransformResult<Self> {
        let n_rows = columns.first().map(Column::len).unwrap_or(0);
        for column in &columns {
            if column.len() != n_rows {
                return Err(TransformError::ColumnLength {
                    column: column.name.clone(),
                    expected: n_rows,
                    actual: column.len(),
                });
            }
        }
        Ok(Self { columns, n_rows })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a column, failing if it is absent.
    pub fn require(&self, name: &str) -> TransformResult<&Column> {
        self.column(name)
            .ok_or_else(|| TransformError::MissingColumn(name.to_string()))
    }

    pub fn require_mut(&mut self, name: &str) -> TransformResult<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| TransformError::MissingColumn(name.to_string()))
    }

    /// One row, in column order.
    pub fn row(&self, index: usize) -> Vec<&Cell> {
        self.columns.iter().map(|c| &c.cells[index]).collect()
    }

    /// Flags rows that exactly repeat an earlier row across all columns.
    pub fn duplicated(&self) -> Vec<bool> {
        let mut seen = std::collections::HashSet::with_capacity(self.n_rows);
        (0..self.n_rows).map(|i| !seen.insert(self.row(i))).collect()
    }

    /// Keep the rows whose mask entry is `true`.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        for column in &mut self.columns {
            let mut flags = keep.iter();
            column.cells.retain(|_| *flags.next().unwrap_or(&false));
        }
        self.n_rows = keep.iter().filter(|k| **k).count().min(self.n_rows);
    }

    /// New table holding the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                Column::new(
                    c.name.clone(),
                    c.dtype,
                    indices.iter().map(|&i| c.cells[i].clone()).collect(),
                )
            })
            .collect();
        Table {
            columns,
            n_rows: indices.len(),
        }
    }

    pub fn head(&self, n: usize) -> Table {
        let indices: Vec<usize> = (0..n.min(self.n_rows)).collect();
        self.select_rows(&indices)
    }

    pub fn tail(&self, n: usize) -> Table {
        let start = self.n_rows.saturating_sub(n);
        let indices: Vec<usize> = (start..self.n_rows).collect();
        self.select_rows(&indices)
    }

    /// Append a column at the end.
    pub fn push_column(&mut self, column: Column) -> TransformResult<()> {
        let len = self.columns.len();
        self.insert_column(len, column)
    }

    /// Insert a column at `position` (clamped to the column count).
    pub fn insert_column(&mut self, position: usize, column: Column) -> TransformResult<()> {
        let actual = column.len();
        if !self.columns.is_empty() && actual != self.n_rows {
            return Err(TransformError::ColumnLength {
                column: column.name,
                expected: self.n_rows,
                actual,
            });
        }
        if self.columns.is_empty() {
            self.n_rows = column.len();
        }
        let position = position.min(self.columns.len());
        self.columns.insert(position, column);
        Ok(())
    }

    /// Remove a column and return it.
    pub fn pop_column(&mut self, name: &str) -> TransformResult<Column> {
        let position = self
            .position(name)
            .ok_or_else(|| TransformError::MissingColumn(name.to_string()))?;
        Ok(self.columns.remove(position))
    }

    /// Move an existing column to `position`, counted after its removal.
    pub fn move_column(&mut self, name: &str, position: usize) -> TransformResult<()> {
        let column = self.pop_column(name)?;
        self.insert_column(position, column)
    }

    /// Drop every named column. Fails without touching the table if any
    /// name is absent. Repeated names are fine.
    pub fn drop_columns(&mut self, names: &[&str]) -> TransformResult<()> {
        if let Some(missing) = names.iter().find(|n| self.position(n).is_none()) {
            return Err(TransformError::MissingColumn(missing.to_string()));
        }
        self.columns.retain(|c| !names.contains(&c.name.as_str()));
        Ok(())
    }

    /// Rename a column. Returns `false` if no column has that name.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.columns.iter_mut().find(|c| c.name == from) {
            Some(column) => {
                column.name = to.to_string();
                true
            }
            None => false,
        }
    }
}

/// Serialized as `{ "columns": [...], "dtypes": [...], "rows": [[...]] }`.
impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rows: Vec<Vec<&Cell>> = (0..self.n_rows).map(|i| self.row(i)).collect();
        let dtypes: Vec<DType> = self.columns.iter().map(|c| c.dtype).collect();

        let mut state = serializer.serialize_struct("Table", 3)?;
        state.serialize_field("columns", &self.headers())?;
        state.serialize_field("dtypes", &dtypes)?;
        state.serialize_field("rows", &rows)?;
        state.end()
    }
}
