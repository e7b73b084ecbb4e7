use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;

use super::{ConstraintViolation, EtlError};
use crate::records::{RecordSet, value_key};

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ConstraintRule {
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub unique: bool,
}

/// Checks every rule before failing, so the error lists all offenders.
/// Data is returned unchanged when nothing is violated.
pub fn enforce_constraints(
    data: &RecordSet,
    constraints: &BTreeMap<String, ConstraintRule>,
) -> Result<RecordSet, EtlError> {
    let mut violations = Vec::new();

    for (column, rule) in constraints {
        if !data.is_empty() && !data.has_column(column) {
            return Err(EtlError::MissingColumn { column: column.clone() });
        }

        if rule.not_null {
            let count = data
                .rows()
                .iter()
                .filter(|row| RecordSet::cell(row, column).is_null())
                .count();
            if count > 0 {
                violations.push(ConstraintViolation::NotNull {
                    column: column.clone(),
                    count,
                });
            }
        }

        if rule.unique {
            let mut seen = HashSet::new();
            let duplicates = data
                .rows()
                .iter()
                .filter(|row| !seen.insert(value_key(RecordSet::cell(row, column))))
                .count();
            if duplicates > 0 {
                violations.push(ConstraintViolation::Unique {
                    column: column.clone(),
                    duplicates,
                });
            }
        }
    }

    if violations.is_empty() {
        Ok(data.clone())
    } else {
        Err(EtlError::Constraints(violations))
    }
}
