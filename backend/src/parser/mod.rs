//! CSV loader with encoding and delimiter auto-detection.
//!
//! Reads a delimited file into a typed [`Table`]. Column types are inferred
//! the way pandas' `read_csv` does it: integer columns without gaps stay
//! integers, numeric columns with gaps become floats, anything else is text.

use std::path::Path;

use crate::error::{LoadError, LoadResult};
use crate::models::{Cell, Column, DType, Table};

/// Field values read as missing.
const NA_VALUES: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Result of loading with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Loaded table
    pub table: Table,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> LoadResult<String> {
    let content = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec())
            .map_err(|e| LoadError::Encoding(e.to_string()))?,
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        // Unknown charset: best effort
        _ => String::from_utf8_lossy(bytes).to_string(),
    };

    Ok(content.trim_start_matches('\u{feff}').to_string())
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

fn is_na(raw: &str) -> bool {
    NA_VALUES.contains(&raw)
}

/// Type one column of raw fields.
fn infer_column(name: String, raw: Vec<Option<String>>) -> Column {
    let present = || raw.iter().flatten();
    let has_missing = raw.iter().any(Option::is_none);

    if !has_missing && present().all(|s| s.parse::<i64>().is_ok()) {
        let cells = present()
            .map(|s| s.parse::<i64>().map(Cell::Int).unwrap_or(Cell::Missing))
            .collect();
        return Column::new(name, DType::Int64, cells);
    }

    if present().all(|s| s.parse::<f64>().is_ok()) {
        let cells = raw
            .iter()
            .map(|field| match field {
                Some(s) => s.parse::<f64>().map(Cell::float).unwrap_or(Cell::Missing),
                None => Cell::Missing,
            })
            .collect();
        return Column::new(name, DType::Float64, cells);
    }

    let cells = raw
        .into_iter()
        .map(|field| field.map(Cell::Text).unwrap_or(Cell::Missing))
        .collect();
    Column::new(name, DType::Object, cells)
}

/// Parse CSV text with an explicit delimiter.
///
/// # Example
/// ```ignore
/// use transitclean::parser::parse_str;
///
/// let table = parse_str("corridorID,payAmount\nB14,20000\n1T,", ',').unwrap();
///
/// assert_eq!(table.n_rows(), 2);
/// assert_eq!(table.column("payAmount").unwrap().dtype.as_str(), "float64");
/// ```
pub fn parse_str(content: &str, delimiter: char) -> LoadResult<Table> {
    if content.trim().is_empty() {
        return Err(LoadError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(LoadError::NoHeaders);
    }

    let mut raw_columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

    for record in reader.records() {
        let record = record?;
        if record.len() > headers.len() {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            return Err(LoadError::RaggedRow {
                line,
                expected: headers.len(),
                found: record.len(),
            });
        }

        for (i, raw) in raw_columns.iter_mut().enumerate() {
            let field = record.get(i).filter(|s| !is_na(s)).map(str::to_string);
            raw.push(field);
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw_columns)
        .map(|(name, raw)| infer_column(name, raw))
        .collect();

    Table::new(columns).map_err(|e| LoadError::Malformed(e.to_string()))
}

/// Load a CSV file with auto-detection of encoding and delimiter.
///
/// # Example
/// ```ignore
/// let result = parse_file_auto("Transjakarta.csv")?;
/// println!("Encoding: {}, Delimiter: '{}'", result.encoding, result.delimiter);
/// println!("Rows: {}", result.table.n_rows());
/// ```
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> LoadResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Load CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> LoadResult<ParseResult> {
    if bytes.is_empty() {
        return Err(LoadError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    let table = parse_str(&content, delimiter)?;

    Ok(ParseResult {
        table,
        encoding,
        delimiter,
    })
}

/// Fail if any of `names` is not a column of `table`.
pub fn require_columns(table: &Table, names: &[&str]) -> LoadResult<()> {
    match names.iter().find(|n| table.column(n).is_none()) {
        Some(missing) => Err(LoadError::MissingColumn(missing.to_string())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_simple_csv() {
        let table = parse_str("name,age\nAlice,30\nBob,25", ',').unwrap();

        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.headers(), vec!["name", "age"]);
        assert_eq!(table.column("age").unwrap().dtype, DType::Int64);
        assert_eq!(table.row(1)[0], &Cell::text("Bob"));
        assert_eq!(table.row(1)[1], &Cell::Int(25));
    }

    #[test]
    fn test_missing_values_widen_integers() {
        let table = parse_str("a,b,c\n1,,3\n2,NaN,4", ',').unwrap();

        let b = table.column("b").unwrap();
        assert_eq!(b.dtype, DType::Float64);
        assert_eq!(b.missing_count(), 2);

        let c = table.column("c").unwrap();
        assert_eq!(c.dtype, DType::Int64);
    }

    #[test]
    fn test_int_column_with_gap_becomes_float() {
        let table = parse_str("x,payAmount\na,3500\nb,\nc,20000", ',').unwrap();
        let column = table.column("payAmount").unwrap();
        assert_eq!(column.dtype, DType::Float64);
        assert_eq!(column.cells[0], Cell::Float(3500.0));
        assert!(column.cells[1].is_missing());
    }

    #[test]
    fn test_mixed_column_is_object() {
        let table = parse_str("corridorID\n5\nB14\n", ',').unwrap();
        let column = table.column("corridorID").unwrap();

        assert_eq!(column.dtype, DType::Object);
        assert_eq!(column.cells[0], Cell::text("5"));
    }

    #[test]
    fn test_quoted_values() {
        let table = parse_str("name;value\n\"Alice\";\"Hello; World\"", ';').unwrap();
        assert_eq!(table.row(0)[1], &Cell::text("Hello; World"));
    }

    #[test]
    fn test_short_rows_padded_with_missing() {
        let table = parse_str("a,b,c\n1,2", ',').unwrap();
        assert!(table.row(0)[2].is_missing());
    }

    #[test]
    fn test_long_rows_rejected() {
        let result = parse_str("a,b\n1,2,3", ',');
        assert!(matches!(result, Err(LoadError::RaggedRow { expected: 2, found: 3, .. })));
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_str("", ','), Err(LoadError::EmptyFile)));
        assert!(matches!(parse_bytes_auto(b""), Err(LoadError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_auto_parse() {
        let result = parse_bytes_auto(b"name;age\nAlice;30\nBob;25").unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.table.n_rows(), 2);
    }

    #[test]
    fn test_bom_is_stripped() {
        let result = parse_bytes_auto("\u{feff}transID,payAmount\nA1,3500".as_bytes()).unwrap();
        assert_eq!(result.table.headers(), vec!["transID", "payAmount"]);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert!(decoded.starts_with("Soci"));
    }

    #[test]
    fn test_parse_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "transID,payAmount").unwrap();
        writeln!(file, "T1,3500").unwrap();

        let result = parse_file_auto(file.path()).unwrap();
        assert_eq!(result.table.n_rows(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = parse_file_auto("/definitely/not/here.csv");
        assert!(matches!(result, Err(LoadError::Io(_))));
    }

    #[test]
    fn test_require_columns() {
        let table = parse_str("a,b\n1,2", ',').unwrap();
        assert!(require_columns(&table, &["a", "b"]).is_ok());
        assert!(matches!(
            require_columns(&table, &["a", "c"]),
            Err(LoadError::MissingColumn(c)) if c == "c"
        ));
    }
}
