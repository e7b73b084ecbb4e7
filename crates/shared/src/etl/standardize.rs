use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use serde_json::Value;

use super::EtlError;
use super::coerce::parse_datetime;
use crate::records::RecordSet;

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StandardizeRule {
    #[serde(default)]
    pub lower: bool,
    #[serde(default)]
    pub strip: bool,
    #[serde(default)]
    pub date_format: Option<String>,
}

pub fn standardize_values(
    data: &RecordSet,
    rules: &BTreeMap<String, StandardizeRule>,
) -> Result<RecordSet, EtlError> {
    let mut out = data.clone();

    for (column, rule) in rules {
        if !out.is_empty() && !out.has_column(column) {
            return Err(EtlError::MissingColumn { column: column.clone() });
        }
        if let Some(fmt) = &rule.date_format {
            if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
                return Err(EtlError::InvalidRule {
                    column: column.clone(),
                    reason: format!("invalid date format '{}'", fmt),
                });
            }
        }

        for row in out.rows_mut().iter_mut() {
            let Some(cell) = row.get_mut(column) else { continue };

            if let Value::String(s) = cell {
                if rule.lower {
                    *s = s.to_lowercase();
                }
                if rule.strip {
                    *s = s.trim().to_string();
                }
            }

            if let Some(fmt) = &rule.date_format {
                *cell = reformat_date(cell, fmt);
            }
        }
    }

    Ok(out)
}

fn reformat_date(cell: &Value, fmt: &str) -> Value {
    let Some(parsed) = cell.as_str().and_then(parse_datetime) else {
        return Value::Null;
    };
    let mut text = String::new();
    match write!(text, "{}", parsed.format(fmt)) {
        Ok(()) => Value::String(text),
        Err(_) => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules(value: Value) -> BTreeMap<String, StandardizeRule> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn lower_and_strip_leave_non_strings_alone() {
        let data = RecordSet::from_value(&json!([{"name": "  ALICE "}, {"name": 7}])).unwrap();
        let out = standardize_values(&data, &rules(json!({"name": {"lower": true, "strip": true}})))
            .unwrap();
        assert_eq!(out.to_value(), json!([{"name": "alice"}, {"name": 7}]));
    }

    #[test]
    fn unparseable_dates_become_null() {
        let data = RecordSet::from_value(&json!([
            {"d": "2024-01-31"},
            {"d": "yesterday"},
            {"d": null}
        ]))
        .unwrap();
        let out = standardize_values(&data, &rules(json!({"d": {"date_format": "%d/%m/%Y"}}))).unwrap();
        assert_eq!(
            out.to_value(),
            json!([{"d": "31/01/2024"}, {"d": null}, {"d": null}])
        );
    }

    #[test]
    fn bad_format_names_column() {
        let data = RecordSet::from_value(&json!([{"d": "2024-01-31"}])).unwrap();
        let err = standardize_values(&data, &rules(json!({"d": {"date_format": "%Q%"}}))).unwrap_err();
        assert!(matches!(err, EtlError::InvalidRule { ref column, .. } if column == "d"));
    }
}
