use serde_json::{Map, Value};

use super::EtlError;
use crate::records::RecordSet;

#[derive(Debug, Clone, PartialEq)]
pub enum MissingStrategy {
    Drop,
    ForwardFill,
    BackwardFill,
    Fill(Value),
}

impl MissingStrategy {
    pub fn from_value(column: &str, value: &Value) -> Result<Self, EtlError> {
        match value {
            Value::String(s) if s == "drop" => Ok(MissingStrategy::Drop),
            Value::String(s) if s == "ffill" => Ok(MissingStrategy::ForwardFill),
            Value::String(s) if s == "bfill" => Ok(MissingStrategy::BackwardFill),
            Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                Ok(MissingStrategy::Fill(value.clone()))
            }
            other => Err(EtlError::InvalidRule {
                column: column.to_string(),
                reason: format!("fill value must be a scalar, got {}", other),
            }),
        }
    }
}

/// Applies one strategy per column, in the order the strategies are given.
pub fn handle_missing_values(
    data: &RecordSet,
    strategy: &Map<String, Value>,
) -> Result<RecordSet, EtlError> {
    let mut out = data.clone();

    for (column, raw) in strategy {
        let action = MissingStrategy::from_value(column, raw)?;
        if !out.is_empty() && !out.has_column(column) {
            return Err(EtlError::MissingColumn { column: column.clone() });
        }

        match action {
            MissingStrategy::Drop => {
                out.rows_mut()
                    .retain(|row| !RecordSet::cell(row, column).is_null());
            }
            MissingStrategy::Fill(fill) => {
                for row in out.rows_mut().iter_mut() {
                    if RecordSet::cell(row, column).is_null() {
                        row.insert(column.clone(), fill.clone());
                    }
                }
            }
            MissingStrategy::ForwardFill => carry(out.rows_mut().iter_mut(), column),
            MissingStrategy::BackwardFill => carry(out.rows_mut().iter_mut().rev(), column),
        }
    }

    Ok(out)
}

/// Copies the last seen non-null value into following nulls.
fn carry<'a>(rows: impl Iterator<Item = &'a mut Map<String, Value>>, column: &str) {
    let mut last: Option<Value> = None;
    for row in rows {
        match row.get(column) {
            Some(v) if !v.is_null() => last = Some(v.clone()),
            _ => {
                if let Some(v) = &last {
                    row.insert(column.to_string(), v.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strategy(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn data() -> RecordSet {
        RecordSet::from_value(&json!([
            {"city": null, "age": 30},
            {"city": "Rome", "age": null},
            {"city": null, "age": 41}
        ]))
        .unwrap()
    }

    #[test]
    fn drop_removes_rows_with_null() {
        let out = handle_missing_values(&data(), &strategy(json!({"age": "drop"}))).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn forward_and_backward_fill() {
        let out = handle_missing_values(&data(), &strategy(json!({"city": "ffill"}))).unwrap();
        assert_eq!(
            out.to_value(),
            json!([
                {"city": null, "age": 30},
                {"city": "Rome", "age": null},
                {"city": "Rome", "age": 41}
            ])
        );

        let out = handle_missing_values(&data(), &strategy(json!({"city": "bfill"}))).unwrap();
        assert_eq!(out.rows()[0]["city"], json!("Rome"));
        assert_eq!(out.rows()[2]["city"], json!(null));
    }

    #[test]
    fn literal_fill_values() {
        let out = handle_missing_values(
            &data(),
            &strategy(json!({"age": 0, "city": "unknown"})),
        )
        .unwrap();
        assert_eq!(out.rows()[1]["age"], json!(0));
        assert_eq!(out.rows()[0]["city"], json!("unknown"));
    }

    #[test]
    fn object_fill_is_rejected() {
        let err = handle_missing_values(&data(), &strategy(json!({"age": {"x": 1}}))).unwrap_err();
        assert!(err.to_string().contains("'age'"));
    }
}
