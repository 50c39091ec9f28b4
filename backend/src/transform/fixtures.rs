//! Raw transaction rows for tests.

use crate::models::columns::RAW;
use crate::models::Table;
use crate::parser::parse_str;

const DEFAULTS: [&str; 22] = [
    "EIIW227B8L34VB",
    "180062659848800",
    "emoney",
    "Bajragin Usada",
    "M",
    "2008",
    "JAK.88",
    "Terminal Tanjung Priok - Ancol Barat",
    "1",
    "P00142",
    "Pal Putih",
    "-6.184631",
    "106.84402",
    "7",
    "2023-04-03 05:21:44",
    "P00253",
    "Tegalan",
    "-6.203101",
    "106.85715",
    "12",
    "2023-04-03 06:00:53",
    "3500",
];

/// One CSV line: default values with the given columns replaced.
pub fn row(overrides: &[(&str, &str)]) -> String {
    RAW.iter()
        .zip(DEFAULTS)
        .map(|(name, default)| {
            let value = overrides
                .iter()
                .find(|(column, _)| column == name)
                .map(|(_, v)| *v)
                .unwrap_or(default);
            if value.contains(',') {
                format!("\"{}\"", value)
            } else {
                value.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// CSV text with the raw header and the given lines.
pub fn csv(rows: &[String]) -> String {
    let mut text = RAW.join(",");
    for line in rows {
        text.push('\n');
        text.push_str(line);
    }
    text
}

/// Raw table built from override sets.
pub fn raw_table(rows: &[&[(&str, &str)]]) -> Table {
    let lines: Vec<String> = rows.iter().map(|r| row(r)).collect();
    parse_str(&csv(&lines), ',').expect("fixture CSV parses")
}
