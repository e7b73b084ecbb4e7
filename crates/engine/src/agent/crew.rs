use anyhow::{Context, Result};
use switchboard_shared::{CrewOutput, TaskOutput};

use super::{Agent, AgentTask, ToolCaller};

pub struct CrewMember<'a, T> {
    pub agent: Agent,
    pub task: AgentTask,
    pub tools: &'a T,
}

/// Agents run one after another; each sees the outputs of the tasks before it.
pub struct Crew<'a, T> {
    members: Vec<CrewMember<'a, T>>,
}

impl<'a, T: ToolCaller + Sync> Crew<'a, T> {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    pub fn member(mut self, agent: Agent, task: AgentTask, tools: &'a T) -> Self {
        self.members.push(CrewMember { agent, task, tools });
        self
    }

    pub async fn kickoff(&self) -> Result<CrewOutput> {
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(self.members.len());

        for member in &self.members {
            let context: Vec<String> = outputs.iter().map(|o| o.raw.clone()).collect();
            let raw = member
                .agent
                .execute(&member.task, &context, member.tools)
                .await
                .with_context(|| format!("Agent '{}' failed", member.agent.role))?;

            outputs.push(TaskOutput {
                description: member.task.description.clone(),
                expected_output: member.task.expected_output.clone(),
                agent: member.agent.role.clone(),
                raw,
            });
        }

        Ok(CrewOutput::from_tasks(outputs))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use switchboard_shared::display_payload;

    use super::*;
    use crate::agent::testing::*;
    use crate::llm::LlmClient;

    fn task(description: &str) -> AgentTask {
        AgentTask {
            description: description.to_string(),
            expected_output: "text".to_string(),
        }
    }

    #[tokio::test]
    async fn runs_members_in_order_with_context() {
        let (url, recorded) = mock_llm(vec![text_reply("flights: A"), text_reply("stay: B")]).await;
        let tools = EchoTools::new();
        let llm = LlmClient::new(&url, "m", None, 0.2);

        let output = Crew::new()
            .member(Agent::new("Flights", "g", "b", llm.clone()), task("find flights"), &tools)
            .member(Agent::new("Stays", "g", "b", llm), task("find stays"), &tools)
            .kickoff()
            .await
            .unwrap();

        assert_eq!(output.raw, "stay: B");
        assert_eq!(output.tasks_output.len(), 2);
        assert_eq!(output.tasks_output[0].agent, "Flights");
        assert_eq!(display_payload(&output.to_json().unwrap()), "flights: A");

        let requests = recorded.requests.lock().unwrap();
        let second_prompt = requests[1]["messages"][1]["content"].as_str().unwrap();
        assert!(second_prompt.contains("flights: A"));
        assert_eq!(requests[0]["model"], json!("m"));
    }
}
