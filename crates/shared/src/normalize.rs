//! Turns whatever a tool server sent back into something displayable.
//!
//! Agent servers return a serialized crew result, direct servers return plain
//! JSON, and failures come back as prose. The front-ends never trust the
//! shape: every step falls back to showing the text it was given.

use serde_json::Value;

use crate::records::RecordSet;

pub const STRUCTURED_PLACEHOLDER: &str = "[Structured output above]";

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    /// Array whose elements are all objects (an empty array included).
    Table(RecordSet),
    Json(Value),
    Text(String),
}

impl Rendered {
    /// What a chat transcript stores for this response.
    pub fn transcript_entry(&self) -> String {
        match self {
            Rendered::Table(_) | Rendered::Json(_) => STRUCTURED_PLACEHOLDER.to_string(),
            Rendered::Text(text) => text.clone(),
        }
    }
}

/// Extracts the text worth showing from a raw response.
///
/// Prefers `tasks_output[0].raw`, then a top-level `raw`, then the response
/// itself.
pub fn display_payload(response: &str) -> String {
    let Ok(Value::Object(object)) = serde_json::from_str::<Value>(response) else {
        return response.to_string();
    };

    let first_task_raw = object
        .get("tasks_output")
        .and_then(Value::as_array)
        .and_then(|tasks| tasks.first())
        .and_then(Value::as_object)
        .and_then(|task| task.get("raw"));

    match first_task_raw.or_else(|| object.get("raw")) {
        Some(Value::String(raw)) => raw.clone(),
        Some(other) => other.to_string(),
        None => response.to_string(),
    }
}

pub fn normalize(response: &str) -> Rendered {
    let payload = display_payload(response);

    match serde_json::from_str::<Value>(&payload) {
        Ok(value) => match RecordSet::from_value(&value) {
            Ok(records) => Rendered::Table(records),
            Err(_) => Rendered::Json(value),
        },
        Err(_) => Rendered::Text(payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_text_is_shown_verbatim() {
        assert_eq!(display_payload("not json"), "not json");
        assert_eq!(normalize("not json"), Rendered::Text("not json".to_string()));
    }

    #[test]
    fn top_level_raw_is_unwrapped() {
        assert_eq!(display_payload(r#"{"raw":"hello"}"#), "hello");
        assert_eq!(normalize(r#"{"raw":"hello"}"#).transcript_entry(), "hello");
    }

    #[test]
    fn first_task_output_wins_and_renders_as_table() {
        let response = json!({
            "raw": "ignored",
            "tasks_output": [{"raw": "[{\"a\":1},{\"a\":2}]"}]
        })
        .to_string();

        match normalize(&response) {
            Rendered::Table(records) => {
                assert_eq!(records.len(), 2);
                assert_eq!(records.columns(), vec!["a"]);
            }
            other => panic!("expected a table, got {other:?}"),
        }
    }

    #[test]
    fn task_output_without_top_level_raw() {
        let response = r#"{"tasks_output":[{"raw":"[{\"a\":1}]"}]}"#;
        let Rendered::Table(records) = normalize(response) else {
            panic!("expected a table");
        };
        assert_eq!(records.to_value(), json!([{"a": 1}]));
    }

    #[test]
    fn empty_tasks_output_falls_back_to_raw() {
        let response = json!({"tasks_output": [], "raw": "fallback"}).to_string();
        assert_eq!(display_payload(&response), "fallback");
    }

    #[test]
    fn object_without_raw_is_json() {
        let response = r#"{"data": [1, 2]}"#;
        assert_eq!(display_payload(response), response);
        let rendered = normalize(response);
        assert_eq!(rendered, Rendered::Json(json!({"data": [1, 2]})));
        assert_eq!(rendered.transcript_entry(), STRUCTURED_PLACEHOLDER);
    }

    #[test]
    fn shape_decides_table_or_json() {
        assert_eq!(normalize("[{\"a\":1}, 2]"), Rendered::Json(json!([{"a": 1}, 2])));
        assert_eq!(normalize("42"), Rendered::Json(json!(42)));
        assert_eq!(normalize("[]"), Rendered::Table(RecordSet::default()));
    }

    #[test]
    fn non_string_raw_uses_its_json_text() {
        let response = json!({"raw": {"k": "v"}}).to_string();
        assert_eq!(normalize(&response), Rendered::Json(json!({"k": "v"})));
    }
}
