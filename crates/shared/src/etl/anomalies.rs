use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::EtlError;
use crate::records::{Record, RecordSet};

/// Inclusive bounds for a numeric column. Either side may be omitted.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RangeRule {
    #[serde(default)]
    pub min: Option<Number>,
    #[serde(default)]
    pub max: Option<Number>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AnomalyViolation {
    pub row: usize,
    pub column: String,
    pub rule: &'static str,
    pub limit: Number,
    pub value: Value,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AnomalyReport {
    pub anomalies: Vec<Record>,
    pub violations: Vec<AnomalyViolation>,
}

/// Reports every row breaking a min/max rule. Each offending row appears once
/// in `anomalies`, in input order; `violations` lists every broken rule.
pub fn detect_and_report_anomalies(
    data: &RecordSet,
    rules: &BTreeMap<String, RangeRule>,
) -> Result<AnomalyReport, EtlError> {
    for column in rules.keys() {
        if !data.is_empty() && !data.has_column(column) {
            return Err(EtlError::MissingColumn { column: column.clone() });
        }
    }

    let mut anomalies = Vec::new();
    let mut violations = Vec::new();

    for (i, row) in data.rows().iter().enumerate() {
        let before = violations.len();

        for (column, rule) in rules {
            let cell = RecordSet::cell(row, column);
            if cell.is_null() {
                continue;
            }
            let value = cell.as_f64().ok_or_else(|| EtlError::NotNumeric {
                column: column.clone(),
                value: cell.to_string(),
            })?;

            let checks = [("min", &rule.min), ("max", &rule.max)];
            for (name, limit) in checks {
                let Some(limit) = limit else { continue };
                let bound = limit.as_f64().unwrap_or(f64::NAN);
                let broken = match name {
                    "min" => value < bound,
                    _ => value > bound,
                };
                if broken {
                    violations.push(AnomalyViolation {
                        row: i,
                        column: column.clone(),
                        rule: name,
                        limit: limit.clone(),
                        value: cell.clone(),
                    });
                }
            }
        }

        if violations.len() > before {
            anomalies.push(row.clone());
        }
    }

    Ok(AnomalyReport { anomalies, violations })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn age_rules() -> BTreeMap<String, RangeRule> {
        serde_json::from_value(json!({"age": {"min": 0, "max": 120}})).unwrap()
    }

    #[test]
    fn age_example_reports_exactly_two_rows() {
        let data = RecordSet::from_value(&json!([
            {"name": "a", "age": 25},
            {"name": "b", "age": -5},
            {"name": "c", "age": 130},
            {"name": "d", "age": 40}
        ]))
        .unwrap();

        let report = detect_and_report_anomalies(&data, &age_rules()).unwrap();
        assert_eq!(
            serde_json::to_value(&report.anomalies).unwrap(),
            json!([{"name": "b", "age": -5}, {"name": "c", "age": 130}])
        );
        assert_eq!(report.violations.len(), 2);
        assert_eq!(report.violations[0].rule, "min");
        assert_eq!(report.violations[1].rule, "max");
        assert_eq!(report.violations[1].row, 2);
    }

    #[test]
    fn out_of_range_ages_are_the_anomalies() {
        let data = RecordSet::from_value(&json!([{"age": 5}, {"age": -1}, {"age": 200}])).unwrap();
        let report = detect_and_report_anomalies(&data, &age_rules()).unwrap();
        assert_eq!(
            serde_json::to_value(&report.anomalies).unwrap(),
            json!([{"age": -1}, {"age": 200}])
        );
    }

    #[test]
    fn row_breaking_two_rules_is_listed_once() {
        let data = RecordSet::from_value(&json!([{"age": 200, "score": -1}])).unwrap();
        let rules: BTreeMap<String, RangeRule> = serde_json::from_value(json!({
            "age": {"max": 120},
            "score": {"min": 0}
        }))
        .unwrap();

        let report = detect_and_report_anomalies(&data, &rules).unwrap();
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.violations.len(), 2);
    }

    #[test]
    fn nulls_are_skipped_and_text_is_rejected() {
        let data = RecordSet::from_value(&json!([{"age": null}, {"age": 10}])).unwrap();
        let report = detect_and_report_anomalies(&data, &age_rules()).unwrap();
        assert!(report.anomalies.is_empty());

        let data = RecordSet::from_value(&json!([{"age": "old"}])).unwrap();
        let err = detect_and_report_anomalies(&data, &age_rules()).unwrap_err();
        assert!(matches!(err, EtlError::NotNumeric { ref column, .. } if column == "age"));
    }
}
