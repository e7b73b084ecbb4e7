pub mod crew;

use std::future::Future;

use anyhow::{Result, bail};
use serde_json::Value;
use switchboard_shared::Tool;
use switchboard_shared::protocol::ToolDefinition;
use tracing::{debug, info};

use crate::llm::{LlmClient, Message};

pub use crew::Crew;

pub const DEFAULT_MAX_ROUNDS: usize = 15;

/// Something that exposes tools to an agent: a child tool process, or
/// several of them.
pub trait ToolCaller {
    fn tools(&self) -> &[ToolDefinition];

    fn call_tool(&self, name: &str, arguments: Value)
    -> impl Future<Output = Result<String>> + Send;
}

pub struct Agent {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub llm: LlmClient,
    pub max_rounds: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentTask {
    pub description: String,
    pub expected_output: String,
}

impl Agent {
    pub fn new(role: &str, goal: &str, backstory: &str, llm: LlmClient) -> Self {
        Self {
            role: role.to_string(),
            goal: goal.to_string(),
            backstory: backstory.to_string(),
            llm,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}\n\
             Use the available tools when they help. When you have the final answer, \
             reply with it directly and do not call any more tools.",
            self.role, self.backstory, self.goal
        )
    }

    fn task_prompt(task: &AgentTask, context: &[String]) -> String {
        let mut prompt = format!(
            "Current Task: {}\n\nThis is the expected criteria for your final answer: {}",
            task.description, task.expected_output
        );
        if !context.is_empty() {
            prompt.push_str("\n\nThis is the context you're working with:\n");
            prompt.push_str(&context.join("\n\n"));
        }
        prompt
    }

    /// Runs the agentic loop: every tool call the model asks for goes to
    /// `tools`, results are fed back, and the first reply without tool calls
    /// is the answer.
    pub async fn execute<T: ToolCaller + Sync>(
        &self,
        task: &AgentTask,
        context: &[String],
        tools: &T,
    ) -> Result<String> {
        let llm_tools: Vec<Tool> = tools.tools().iter().map(Tool::from).collect();
        let mut messages = vec![
            Message::system(self.system_prompt()),
            Message::user(Self::task_prompt(task, context)),
        ];

        info!(role = %self.role, model = %self.llm.model(), "Agent starting task");

        for round in 0..self.max_rounds {
            let mut response = self.llm.complete(&messages, &llm_tools).await?;
            // Tool results must answer an id present in the history.
            for call in response.tool_calls.iter_mut().flatten() {
                if call.id.is_empty() {
                    call.id = uuid::Uuid::new_v4().to_string();
                }
            }
            messages.push(response.clone());

            let calls = response.requested_tools();
            if calls.is_empty() {
                debug!(role = %self.role, round, "Agent finished");
                return Ok(response.content.unwrap_or_default());
            }

            for call in calls {
                let name = &call.function.name;
                let args = call.function.parsed_arguments();
                debug!(role = %self.role, tool = %name, %args, "Calling tool");

                let result = tools
                    .call_tool(name, args)
                    .await
                    .unwrap_or_else(|e| format!("Error: {:#}", e));

                messages.push(Message::tool_result(&call.id, result));
            }
        }

        bail!(
            "Agent '{}' did not finish within {} tool rounds",
            self.role,
            self.max_rounds
        )
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::testing::*;
    use super::*;

    fn agent(base_url: &str) -> Agent {
        Agent::new(
            "Tester",
            "Answer questions",
            "You test things.",
            LlmClient::new(base_url, "test-model", None, 0.7),
        )
    }

    fn task() -> AgentTask {
        AgentTask {
            description: "Say hello".to_string(),
            expected_output: "A greeting".to_string(),
        }
    }

    #[tokio::test]
    async fn feeds_tool_results_back_until_a_plain_reply() {
        let (url, recorded) = mock_llm(vec![
            tool_reply("call_1", "echo", json!({"text": "hi"})),
            text_reply("hello"),
        ])
        .await;

        let out = agent(&url).execute(&task(), &[], &EchoTools::new()).await.unwrap();
        assert_eq!(out, "hello");

        let requests = recorded.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0]["tools"][0]["function"]["name"], "echo");

        let last = requests[1]["messages"].as_array().unwrap().last().unwrap().clone();
        assert_eq!(last["role"], "tool");
        assert_eq!(last["tool_call_id"], "call_1");
        assert_eq!(last["content"], "echo: hi");
    }

    #[tokio::test]
    async fn tool_failures_become_error_text() {
        let (url, recorded) = mock_llm(vec![
            tool_reply("call_1", "missing", json!({})),
            text_reply("gave up"),
        ])
        .await;

        let out = agent(&url).execute(&task(), &[], &EchoTools::new()).await.unwrap();
        assert_eq!(out, "gave up");

        let requests = recorded.requests.lock().unwrap();
        let last = requests[1]["messages"].as_array().unwrap().last().unwrap().clone();
        assert_eq!(last["content"], "Error: no tool missing");
    }

    #[tokio::test]
    async fn missing_call_ids_are_filled_in_consistently() {
        let (url, recorded) = mock_llm(vec![
            tool_reply("", "echo", json!({"text": "hi"})),
            text_reply("hello"),
        ])
        .await;

        agent(&url).execute(&task(), &[], &EchoTools::new()).await.unwrap();

        let requests = recorded.requests.lock().unwrap();
        let messages = requests[1]["messages"].as_array().unwrap();
        let assistant = &messages[messages.len() - 2];
        let tool = &messages[messages.len() - 1];
        let id = assistant["tool_calls"][0]["id"].as_str().unwrap();
        assert!(!id.is_empty());
        assert_eq!(tool["tool_call_id"], id);
    }

    #[tokio::test]
    async fn exceeding_max_rounds_is_an_error() {
        let replies = (0..3)
            .map(|i| tool_reply(&format!("call_{i}"), "echo", json!({"text": "again"})))
            .collect();
        let (url, _) = mock_llm(replies).await;

        let mut agent = agent(&url);
        agent.max_rounds = 2;
        let err = agent.execute(&task(), &[], &EchoTools::new()).await.unwrap_err();
        assert!(err.to_string().contains("did not finish within 2 tool rounds"));
    }

    #[test]
    fn context_is_appended_to_the_task_prompt() {
        let prompt = Agent::task_prompt(&task(), &["flights found".to_string()]);
        assert!(prompt.starts_with("Current Task: Say hello"));
        assert!(prompt.ends_with("flights found"));
    }
}
