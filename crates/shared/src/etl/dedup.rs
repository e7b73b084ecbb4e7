use std::collections::HashSet;

use serde::Serialize;

use super::EtlError;
use crate::records::{RecordSet, value_key};

pub const NO_DUPLICATES_MESSAGE: &str = "No duplicates found. No changes needed.";

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DedupOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub data: RecordSet,
}

/// Keeps the first row of each group of rows equal on `subset_cols`
/// (all columns when `None`).
pub fn remove_duplicates(
    data: &RecordSet,
    subset_cols: Option<&[String]>,
) -> Result<DedupOutcome, EtlError> {
    let columns = match subset_cols {
        Some(cols) => {
            for column in cols {
                if !data.is_empty() && !data.has_column(column) {
                    return Err(EtlError::MissingColumn { column: column.clone() });
                }
            }
            cols.to_vec()
        }
        None => data.columns(),
    };

    let mut seen = HashSet::new();
    let kept: Vec<_> = data
        .rows()
        .iter()
        .filter(|row| {
            let key: Vec<String> = columns
                .iter()
                .map(|c| value_key(RecordSet::cell(row, c)))
                .collect();
            seen.insert(key)
        })
        .cloned()
        .collect();

    let message = (kept.len() == data.len()).then_some(NO_DUPLICATES_MESSAGE);

    Ok(DedupOutcome {
        message,
        data: RecordSet::new(kept),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn drops_later_copies_and_omits_message() {
        let data = RecordSet::from_value(&json!([
            {"id": 1, "v": "a"},
            {"id": 1, "v": "a"},
            {"id": 2, "v": "b"}
        ]))
        .unwrap();

        let outcome = remove_duplicates(&data, None).unwrap();
        assert_eq!(outcome.data.len(), 2);
        assert_eq!(outcome.message, None);
        assert!(serde_json::to_value(&outcome).unwrap().get("message").is_none());
    }

    #[test]
    fn unchanged_input_carries_message() {
        let data = RecordSet::from_value(&json!([{"id": 1}, {"id": 2}])).unwrap();
        let outcome = remove_duplicates(&data, None).unwrap();
        assert_eq!(outcome.data, data);
        assert_eq!(outcome.message, Some(NO_DUPLICATES_MESSAGE));
    }

    #[test]
    fn subset_keeps_first_occurrence() {
        let data = RecordSet::from_value(&json!([
            {"email": "x@y", "n": 1},
            {"email": "x@y", "n": 2}
        ]))
        .unwrap();

        let outcome = remove_duplicates(&data, Some(&["email".to_string()][..])).unwrap();
        assert_eq!(outcome.data.to_value(), json!([{"email": "x@y", "n": 1}]));
    }

    #[test]
    fn integral_floats_equal_their_integers() {
        let data = RecordSet::from_value(&json!([
            {"id": 1, "v": "a"},
            {"id": 1.0, "v": "a"},
            {"id": "1", "v": "a"}
        ]))
        .unwrap();

        let outcome = remove_duplicates(&data, None).unwrap();
        assert_eq!(outcome.data.to_value(), json!([{"id": 1, "v": "a"}, {"id": "1", "v": "a"}]));
    }

    #[test]
    fn unknown_subset_column_fails() {
        let data = RecordSet::from_value(&json!([{"a": 1}])).unwrap();
        assert!(remove_duplicates(&data, Some(&["b".to_string()][..])).is_err());
    }
}
