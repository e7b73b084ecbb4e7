use serde::{Deserialize, Serialize};

/// Output of a single task within a crew run.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TaskOutput {
    pub description: String,
    pub expected_output: String,
    pub agent: String,
    pub raw: String,
}

/// Result of a crew run; `raw` mirrors the last task's output.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct CrewOutput {
    pub raw: String,
    pub tasks_output: Vec<TaskOutput>,
}

impl CrewOutput {
    pub fn from_tasks(tasks_output: Vec<TaskOutput>) -> Self {
        let raw = tasks_output
            .last()
            .map(|t| t.raw.clone())
            .unwrap_or_default();
        Self { raw, tasks_output }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::display_payload;

    fn task(agent: &str, raw: &str) -> TaskOutput {
        TaskOutput {
            description: "d".to_string(),
            expected_output: "e".to_string(),
            agent: agent.to_string(),
            raw: raw.to_string(),
        }
    }

    #[test]
    fn raw_is_last_task_output() {
        let out = CrewOutput::from_tasks(vec![task("a", "first"), task("b", "second")]);
        assert_eq!(out.raw, "second");
    }

    #[test]
    fn serialized_output_normalizes_to_first_task() {
        let out = CrewOutput::from_tasks(vec![task("a", "first"), task("b", "second")]);
        assert_eq!(display_payload(&out.to_json().unwrap()), "first");
    }
}
