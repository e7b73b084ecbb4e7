use std::path::Path;

use serde::Serialize;
use serde_json::{Number, Value};

use super::EtlError;
use crate::records::{Record, RecordSet};

/// Cell spellings read as missing values.
const NA_VALUES: &[&str] = &[
    "", "NA", "N/A", "n/a", "#N/A", "NaN", "nan", "-nan", "null", "NULL", "None",
];

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CsvTable {
    pub data: RecordSet,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

impl ColumnKind {
    fn of(cell: &str) -> Self {
        if cell.parse::<i64>().is_ok() {
            ColumnKind::Int
        } else if cell.parse::<f64>().is_ok() {
            ColumnKind::Float
        } else if parse_bool(cell).is_some() {
            ColumnKind::Bool
        } else {
            ColumnKind::Text
        }
    }

    fn widen(self, other: ColumnKind) -> ColumnKind {
        use ColumnKind::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Int, Float) | (Float, Int) => Float,
            _ => Text,
        }
    }

    fn convert(self, cell: &str) -> Value {
        match self {
            ColumnKind::Int => cell.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            ColumnKind::Float => cell
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ColumnKind::Bool => parse_bool(cell).map(Value::Bool).unwrap_or(Value::Null),
            ColumnKind::Text => Value::String(cell.to_string()),
        }
    }
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

fn is_missing(cell: &str) -> bool {
    NA_VALUES.contains(&cell)
}

/// Reads a CSV file into records, inferring one scalar type per column.
pub fn read_csv_file(path: impl AsRef<Path>, encoding: &str) -> Result<CsvTable, EtlError> {
    let path = path.as_ref();
    let csv_error = |reason: String| EtlError::Csv {
        path: path.display().to_string(),
        reason,
    };

    let bytes = std::fs::read(path).map_err(|e| csv_error(e.to_string()))?;
    let text = decode(&bytes, encoding).map_err(csv_error)?;
    read_csv_str(&text).map_err(|e| csv_error(e.to_string()))
}

pub fn read_csv_str(text: &str) -> Result<CsvTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        raw_rows.push(record.iter().map(|c| c.to_string()).collect());
    }

    let kinds: Vec<Option<ColumnKind>> = (0..columns.len())
        .map(|i| {
            raw_rows
                .iter()
                .filter_map(|row| row.get(i))
                .filter(|cell| !is_missing(cell))
                .map(|cell| ColumnKind::of(cell))
                .reduce(ColumnKind::widen)
        })
        .collect();

    let rows = raw_rows
        .iter()
        .map(|row| {
            let mut record = Record::new();
            for (i, column) in columns.iter().enumerate() {
                let value = match (row.get(i), kinds[i]) {
                    (Some(cell), Some(kind)) if !is_missing(cell) => kind.convert(cell),
                    _ => Value::Null,
                };
                record.insert(column.clone(), value);
            }
            record
        })
        .collect();

    Ok(CsvTable {
        data: RecordSet::new(rows),
        columns,
    })
}

fn decode(bytes: &[u8], encoding: &str) -> Result<String, String> {
    match encoding.to_ascii_lowercase().replace('_', "-").as_str() {
        "utf-8" | "utf8" | "utf-8-sig" => {
            let text = String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string())?;
            Ok(text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text))
        }
        "latin-1" | "latin1" | "iso-8859-1" => Ok(bytes.iter().map(|&b| b as char).collect()),
        other => Err(format!("unsupported encoding '{}'", other)),
    }
}
