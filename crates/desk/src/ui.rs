use anyhow::{Result, bail};
use crossterm::{
    cursor, execute,
    style::Stylize,
    terminal::{Clear, ClearType},
};
use serde_json::{Value, json};
use std::io::{self, Write};
use switchboard_shared::normalize;

use crate::agents::{self, AGENTS, AgentEntry};
use crate::client::McpClient;
use crate::config::Config;
use crate::render;

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub role: &'static str,
    pub content: String,
}

/// Chat state for one run of the front-end.
pub struct ChatSession {
    pub agent: &'static AgentEntry,
    pub llm: String,
    host: String,
    client_name: String,
    pub transcript: Vec<TranscriptEntry>,
}

impl ChatSession {
    pub fn new(config: &Config, agent: Option<&str>, llm: Option<&str>) -> Result<Self> {
        let agent_name = agent.unwrap_or(&config.agent);
        let Some(agent) = agents::find(agent_name) else {
            bail!("Unknown agent '{}'. Run `desk agents` to see the options.", agent_name);
        };

        Ok(Self {
            agent,
            llm: llm.unwrap_or(&config.llm).to_string(),
            host: config.host.clone(),
            client_name: config.client_name.clone(),
            transcript: Vec::new(),
        })
    }

    fn client(&self) -> McpClient {
        McpClient::new(self.agent.url(&self.host), self.client_name.clone())
    }

    /// Sends one question, prints the answer and records both sides.
    pub async fn ask(&mut self, question: &str) {
        self.transcript.push(TranscriptEntry {
            role: "user",
            content: question.to_string(),
        });

        let arguments = json!({"question": question, "llm": self.llm});
        let content = match call_with_indicator(&self.client(), self.agent.tool, arguments).await {
            Ok(response) => {
                let rendered = normalize(&response);
                render::print_rendered(&rendered);
                rendered.transcript_entry()
            }
            Err(e) => {
                render::error(&e);
                format!("Error: {:#}", e)
            }
        };

        self.transcript.push(TranscriptEntry {
            role: "assistant",
            content,
        });
    }

    /// Handles a `/command`. Returns false for input that is not a command.
    pub fn command(&mut self, input: &str) -> bool {
        let mut parts = input.splitn(2, ' ');
        let command = parts.next().unwrap_or("");
        let arg = parts.next().map(str::trim).unwrap_or("");

        match command {
            "/agent" if arg.is_empty() => print_agents(Some(self.agent)),
            "/agent" => match agents::find(arg) {
                Some(agent) => {
                    self.agent = agent;
                    println!("Now talking to {} at {}", agent.name, agent.url(&self.host));
                }
                None => render::warning(&format!("Unknown agent '{}'", arg)),
            },
            "/llm" if arg.is_empty() => println!("LLM: {}", self.llm),
            "/llm" => {
                self.llm = arg.to_string();
                println!("LLM set to {}", self.llm);
            }
            "/history" => self.print_history(),
            _ => return false,
        }
        true
    }

    fn print_history(&self) {
        print_transcript(&self.transcript, self.agent.name);
    }
}

pub fn print_transcript(transcript: &[TranscriptEntry], assistant: &str) {
    if transcript.is_empty() {
        println!("(no messages yet)");
    }
    for entry in transcript {
        let label = match entry.role {
            "user" => "You".bold().green(),
            _ => assistant.bold().blue(),
        };
        println!("{}: {}", label, entry.content);
    }
}

/// Handshake before a session starts; a server that is down is reported
/// but does not stop the front-end.
pub async fn connect(client: &McpClient) {
    match client.initialize().await {
        Ok(name) => println!("{}", format!("Connected to {} at {}", name, client.url()).dim()),
        Err(e) => render::warning(&format!("{:#}", e)),
    }
}

/// Calls a tool with a "thinking" line that is cleared once the answer is in.
pub async fn call_with_indicator(client: &McpClient, tool: &str, arguments: Value) -> Result<String> {
    let mut stdout = io::stdout();
    print!("{}", "The agent is thinking...".dim());
    stdout.flush()?;

    let result = client.call_tool(tool, arguments).await;

    execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    result
}

pub fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

pub async fn interactive_chat(mut session: ChatSession) -> Result<()> {
    render::heading("Switchboard chat");
    println!(
        "Talking to {} with {}. Commands: /agent [NAME], /llm [PRESET], /history, quit\n",
        session.agent.name, session.llm
    );

    loop {
        let Some(input) = read_line(&format!("{} ", "You:".bold().green()))? else {
            break;
        };

        if input.eq_ignore_ascii_case("quit") {
            println!("Goodbye!");
            break;
        }
        if input.is_empty() || session.command(&input) {
            continue;
        }

        println!();
        session.ask(&input).await;
        println!();
    }

    Ok(())
}

pub fn print_agents(current: Option<&AgentEntry>) {
    for agent in AGENTS {
        let marker = if current == Some(agent) { "*" } else { " " };
        println!(
            "{} {:<10} {:<18} {:<20} port {}",
            marker, agent.id, agent.name, agent.tool, agent.port
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ChatSession {
        ChatSession::new(&Config::default(), Some("github"), Some("gpt_4o")).unwrap()
    }

    #[test]
    fn defaults_come_from_config() {
        let session = ChatSession::new(&Config::default(), None, None).unwrap();
        assert_eq!(session.agent.id, "supabase");
        assert_eq!(session.llm, "gpt_4_1_mini");
        assert!(ChatSession::new(&Config::default(), Some("nope"), None).is_err());
    }

    #[test]
    fn commands_switch_agent_and_llm() {
        let mut session = session();
        assert!(session.command("/agent Context7 Analyst"));
        assert_eq!(session.agent.tool, "context7_analyst");
        assert!(session.command("/llm llama3_3_groq"));
        assert_eq!(session.llm, "llama3_3_groq");
        assert!(session.command("/history"));
        assert!(!session.command("what is in my table?"));
    }

    #[tokio::test]
    async fn failed_calls_are_recorded_as_errors() {
        let mut session = session();
        session.host = "127.0.0.1".to_string();
        session.agent = &AgentEntry {
            id: "dead",
            name: "Dead",
            tool: "x",
            port: 1,
        };
        session.ask("hello").await;

        assert_eq!(session.transcript.len(), 2);
        assert_eq!(session.transcript[0].content, "hello");
        assert!(session.transcript[1].content.starts_with("Error: "));
    }

    #[tokio::test]
    async fn tool_failures_are_recorded_as_errors() {
        let url = crate::client::tests::serve_failing_tool().await;
        let port = url
            .trim_end_matches("/mcp")
            .rsplit(':')
            .next()
            .unwrap()
            .parse()
            .unwrap();

        let mut session = session();
        session.host = "127.0.0.1".to_string();
        session.agent = Box::leak(Box::new(AgentEntry {
            id: "analyst",
            name: "Data Analyst",
            tool: "data_analyst",
            port,
        }));
        session.ask("how many rows?").await;

        assert_eq!(
            session.transcript[1].content,
            "Error: Agent 'Data Analyst' failed: LLM connection failed"
        );
    }
}
