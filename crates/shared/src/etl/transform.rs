use serde_json::{Map, Value};

use super::EtlError;
use crate::expr::Expr;
use crate::records::{Record, RecordSet};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformRules {
    pub rename_columns: Vec<(String, String)>,
    pub new_columns: Vec<(String, String)>,
}

impl TransformRules {
    /// Reads `{"rename_columns": {...}, "new_columns": {...}}`, keeping key order.
    pub fn from_value(value: &Value) -> Result<Self, EtlError> {
        let object = value.as_object().ok_or_else(|| EtlError::InvalidRule {
            column: "transformation_rules".to_string(),
            reason: "expected an object".to_string(),
        })?;

        Ok(Self {
            rename_columns: string_pairs(object, "rename_columns")?,
            new_columns: string_pairs(object, "new_columns")?,
        })
    }
}

fn string_pairs(object: &Map<String, Value>, key: &str) -> Result<Vec<(String, String)>, EtlError> {
    let Some(section) = object.get(key) else {
        return Ok(Vec::new());
    };
    let map = section.as_object().ok_or_else(|| EtlError::InvalidRule {
        column: key.to_string(),
        reason: "expected an object of column names".to_string(),
    })?;

    map.iter()
        .map(|(column, v)| {
            v.as_str()
                .map(|s| (column.clone(), s.to_string()))
                .ok_or_else(|| EtlError::InvalidRule {
                    column: column.clone(),
                    reason: format!("expected a string in {}, got {}", key, v),
                })
        })
        .collect()
}

/// Renames first, then derives new columns in order; later expressions may
/// reference columns derived earlier.
pub fn transform_data(data: &RecordSet, rules: &TransformRules) -> Result<RecordSet, EtlError> {
    let mut rows: Vec<Record> = data
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|(key, value)| {
                    let renamed = rules
                        .rename_columns
                        .iter()
                        .find(|(from, _)| from == key)
                        .map(|(_, to)| to.clone())
                        .unwrap_or_else(|| key.clone());
                    (renamed, value.clone())
                })
                .collect()
        })
        .collect();

    for (column, source) in &rules.new_columns {
        let expr = Expr::parse(source).map_err(|reason| EtlError::Expression {
            column: column.clone(),
            reason: format!("'{}': {}", source, reason),
        })?;

        for row in rows.iter_mut() {
            let value = expr.eval(row).map_err(|reason| EtlError::Expression {
                column: column.clone(),
                reason,
            })?;
            row.insert(column.clone(), value);
        }
    }

    Ok(RecordSet::new(rows))
}
