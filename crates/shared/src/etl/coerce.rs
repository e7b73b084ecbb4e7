use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Number, Value};

use super::EtlError;
use crate::records::RecordSet;

/// Target types accepted by `check_data_types`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int,
    Float,
    Str,
    Bool,
    DateTime,
}

impl DataType {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "int" | "int64" | "int32" | "integer" => Some(DataType::Int),
            "float" | "float64" | "float32" | "double" => Some(DataType::Float),
            "str" | "string" | "object" => Some(DataType::Str),
            "bool" | "boolean" => Some(DataType::Bool),
            "datetime" | "datetime64" | "datetime64[ns]" | "date" => Some(DataType::DateTime),
            _ => None,
        }
    }

    fn cast(&self, value: &Value) -> Result<Value, String> {
        match self {
            DataType::Int => to_int(value),
            DataType::Float => to_float(value),
            DataType::Str => Ok(match value {
                Value::Null => Value::Null,
                Value::String(s) => Value::String(s.clone()),
                other => Value::String(other.to_string()),
            }),
            DataType::Bool => to_bool(value),
            DataType::DateTime => to_datetime(value),
        }
    }
}

/// Casts every named column; the first failing cell aborts the whole call.
pub fn check_data_types(
    data: &RecordSet,
    type_mapping: &HashMap<String, String>,
) -> Result<RecordSet, EtlError> {
    let mut out = data.clone();

    for (column, dtype_name) in type_mapping {
        let dtype = DataType::parse(dtype_name).ok_or_else(|| EtlError::UnknownType {
            column: column.clone(),
            dtype: dtype_name.clone(),
        })?;

        if !out.is_empty() && !out.has_column(column) {
            return Err(EtlError::MissingColumn { column: column.clone() });
        }

        for (i, row) in out.rows_mut().iter_mut().enumerate() {
            let current = row.get(column).cloned().unwrap_or(Value::Null);
            let cast = dtype.cast(&current).map_err(|reason| EtlError::Cast {
                column: column.clone(),
                dtype: dtype_name.clone(),
                reason: format!("row {}: {}", i, reason),
            })?;
            row.insert(column.clone(), cast);
        }
    }

    Ok(out)
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn to_int(value: &Value) -> Result<Value, String> {
    match value {
        Value::Null => Err("cannot convert missing values to integer".to_string()),
        Value::Bool(b) => Ok(Value::from(*b as i64)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                if f.is_finite() && f.abs() < i64::MAX as f64 {
                    Ok(Value::from(f.trunc() as i64))
                } else {
                    Err(format!("{} is out of integer range", f))
                }
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("invalid literal for int: '{}'", s)),
        other => Err(format!("unsupported value {}", other)),
    }
}

fn to_float(value: &Value) -> Result<Value, String> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Bool(b) => Ok(float_value(if *b { 1.0 } else { 0.0 })),
        Value::Number(n) => Ok(float_value(n.as_f64().unwrap_or(f64::NAN))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(float_value)
            .map_err(|_| format!("could not convert string to float: '{}'", s)),
        other => Err(format!("unsupported value {}", other)),
    }
}

fn to_bool(value: &Value) -> Result<Value, String> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::Number(n) => Ok(Value::Bool(n.as_f64().map(|f| f != 0.0).unwrap_or(false))),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "y" | "t" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "n" | "f" => Ok(Value::Bool(false)),
            _ => Err(format!("'{}' is not a boolean", s)),
        },
        other => Err(format!("unsupported value {}", other)),
    }
}

fn to_datetime(value: &Value) -> Result<Value, String> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::String(s) => parse_datetime(s)
            .map(|dt| Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string()))
            .ok_or_else(|| format!("'{}' is not a recognizable date", s)),
        other => Err(format!("unsupported value {}", other)),
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%B %d, %Y", "%d %B %Y"];

/// Lenient date parsing shared by type coercion and date standardization.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn casts_numeric_strings_to_int() {
        let data = RecordSet::from_value(&json!([{"age": "5"}, {"age": " 12 "}])).unwrap();
        let out = check_data_types(&data, &mapping(&[("age", "int")])).unwrap();
        assert_eq!(out.to_value(), json!([{"age": 5}, {"age": 12}]));
    }

    #[test]
    fn non_numeric_column_to_numeric_fails_naming_column() {
        let data = RecordSet::from_value(&json!([{"name": "ana"}, {"name": "bo"}])).unwrap();
        let err = check_data_types(&data, &mapping(&[("name", "float")])).unwrap_err();
        assert!(matches!(&err, EtlError::Cast { column, .. } if column == "name"));
        assert!(err.to_string().contains("'name'"));
        assert!(err.to_string().contains("float"));
    }

    #[test]
    fn null_cannot_become_int() {
        let data = RecordSet::from_value(&json!([{"n": 1}, {"n": null}])).unwrap();
        assert!(check_data_types(&data, &mapping(&[("n", "int")])).is_err());
    }

    #[test]
    fn float_truncates_to_int_and_numbers_to_str() {
        let data = RecordSet::from_value(&json!([{"x": 2.9, "y": 7}])).unwrap();
        let out = check_data_types(&data, &mapping(&[("x", "int"), ("y", "str")])).unwrap();
        assert_eq!(out.to_value(), json!([{"x": 2, "y": "7"}]));
    }

    #[test]
    fn dates_are_normalized() {
        let data = RecordSet::from_value(&json!([{"d": "2024-03-01"}, {"d": "03/15/2024"}])).unwrap();
        let out = check_data_types(&data, &mapping(&[("d", "datetime")])).unwrap();
        assert_eq!(
            out.to_value(),
            json!([{"d": "2024-03-01T00:00:00"}, {"d": "2024-03-15T00:00:00"}])
        );
    }

    #[test]
    fn unknown_type_and_column_are_reported() {
        let data = RecordSet::from_value(&json!([{"a": 1}])).unwrap();
        assert!(matches!(
            check_data_types(&data, &mapping(&[("a", "complex")])),
            Err(EtlError::UnknownType { .. })
        ));
        assert!(matches!(
            check_data_types(&data, &mapping(&[("b", "int")])),
            Err(EtlError::MissingColumn { .. })
        ));
    }
}
