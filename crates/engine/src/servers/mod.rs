//! The server catalog: which tools each server exposes and how a call runs.

pub mod profiles;

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use switchboard_shared::protocol::ToolDefinition;
use switchboard_shared::{ParameterSchema, ToolSchema, TravelInput, get_tools_for, use_tool};
use thiserror::Error;
use tracing::{info, warn};

use crate::agent::{Agent, AgentTask, Crew};
use crate::llm::{DEFAULT_TEMPERATURE, LlmClient, LlmError};
use crate::toolproc::{ToolProcess, ToolProcessSpec};

use profiles::{TRAVEL_CREW, TravelMember, travel_tasks};

#[derive(Debug, Error)]
pub enum ToolCallError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("{0}")]
    InvalidParams(String),

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Child process an agent server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessCommand {
    External {
        program: &'static str,
        args: &'static [&'static str],
    },
    /// One of this binary's own direct servers, over stdio.
    SelfServe(&'static str),
}

impl ProcessCommand {
    pub fn spec(&self, label: &str) -> Result<ToolProcessSpec> {
        match self {
            ProcessCommand::External { program, args } => {
                Ok(ToolProcessSpec::new(label, program, args))
            }
            ProcessCommand::SelfServe(server_id) => ToolProcessSpec::self_serve(label, server_id),
        }
    }
}

/// Arguments an agent tool accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentInput {
    /// `question` plus an optional `llm` preset.
    Question,
    /// `question` plus an optional `csv_path`.
    QuestionWithCsv,
    Url,
}

#[derive(Debug, Clone, Copy)]
pub struct AgentProfile {
    pub tool_name: &'static str,
    pub tool_description: &'static str,
    pub input: AgentInput,
    pub process: ProcessCommand,
    pub credential_env: Option<&'static str>,
    pub default_llm: &'static str,
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
    /// `{question}`, `{url}` and `{csv_path}` are filled from the call.
    pub task_template: &'static str,
    pub expected_output: &'static str,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AgentRequest {
    pub question: Option<String>,
    pub url: Option<String>,
    pub csv_path: Option<String>,
    pub llm: Option<String>,
}

impl AgentProfile {
    pub fn definition(&self, server_id: &'static str) -> ToolDefinition {
        let param = |name, description, required| ParameterSchema {
            name,
            type_name: "string",
            description,
            required,
        };

        let parameters = match self.input {
            AgentInput::Question => vec![
                param("question", "The question or instruction for the agent", true),
                param("llm", "LLM preset name (optional)", false),
            ],
            AgentInput::QuestionWithCsv => vec![
                param("question", "What to do with the data", true),
                param("csv_path", "Path of the uploaded CSV file", false),
            ],
            AgentInput::Url => vec![param("url", "Product page URL", true)],
        };

        ToolSchema {
            name: self.tool_name,
            toolbelt: server_id,
            description: self.tool_description,
            parameters,
        }
        .to_definition()
    }

    pub fn parse_request(&self, args: &Value) -> Result<AgentRequest, ToolCallError> {
        let text = |key: &str| -> Result<Option<String>, ToolCallError> {
            match args.get(key) {
                None | Some(Value::Null) => Ok(None),
                Some(Value::String(s)) => Ok(Some(s.clone())),
                Some(_) => Err(ToolCallError::InvalidParams(format!("'{}' must be a string", key))),
            }
        };
        let required = |key: &str| -> Result<String, ToolCallError> {
            text(key)?.ok_or_else(|| ToolCallError::InvalidParams(format!("Missing required argument '{}'", key)))
        };

        let request = match self.input {
            AgentInput::Question => AgentRequest {
                question: Some(required("question")?),
                llm: text("llm")?,
                ..Default::default()
            },
            AgentInput::QuestionWithCsv => AgentRequest {
                question: Some(required("question")?),
                csv_path: text("csv_path")?,
                ..Default::default()
            },
            AgentInput::Url => AgentRequest {
                url: Some(required("url")?),
                ..Default::default()
            },
        };
        Ok(request)
    }

    pub fn task(&self, request: &AgentRequest) -> AgentTask {
        let description = self
            .task_template
            .replace("{question}", request.question.as_deref().unwrap_or(""))
            .replace("{url}", request.url.as_deref().unwrap_or(""))
            .replace("{csv_path}", request.csv_path.as_deref().unwrap_or("(no file uploaded)"));

        AgentTask {
            description,
            expected_output: self.expected_output.to_string(),
        }
    }

    fn llm(&self, request: &AgentRequest) -> Result<LlmClient, ToolCallError> {
        let name = request.llm.as_deref().unwrap_or(self.default_llm);
        llm_client(name, DEFAULT_TEMPERATURE)
    }

    async fn run(&self, request: AgentRequest) -> Result<String, ToolCallError> {
        let llm = self.llm(&request)?;
        let agent = Agent::new(self.role, self.goal, self.backstory, llm);
        let task = self.task(&request);

        warn_missing_credential(self.credential_env);
        let spec = self.process.spec(self.tool_name)?;
        let process = ToolProcess::start(&spec).await?;

        let result = Crew::new().member(agent, task, &process).kickoff().await;
        process.shutdown().await;

        Ok(result?.to_json()?)
    }
}

fn llm_client(name: &str, temperature: f32) -> Result<LlmClient, ToolCallError> {
    LlmClient::from_preset(name, temperature).map_err(|e| match e {
        LlmError::UnknownPreset(_) => ToolCallError::InvalidParams(e.to_string()),
        other => ToolCallError::Failed(other.into()),
    })
}

fn warn_missing_credential(env: Option<&'static str>) {
    if let Some(env) = env {
        if std::env::var_os(env).is_none() {
            warn!("{} is not set; the tool process will likely fail to authenticate", env);
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ServerKind {
    /// Registry tools from these toolbelts, run in-process.
    Direct(&'static [&'static str]),
    Agent(&'static AgentProfile),
    Travel,
}

macro_rules! define_servers {
    (
        $(
            $variant:ident {
                id: $id:literal,
                name: $name:literal,
                port: $port:literal,
                port_env: $port_env:expr,
                kind: $kind:expr,
            }
        ),* $(,)?
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Server {
            $($variant),*
        }

        impl Server {
            pub fn all() -> &'static [Server] {
                &[$(Server::$variant),*]
            }

            pub fn from_id(s: &str) -> Option<Self> {
                match s {
                    $($id => Some(Server::$variant),)*
                    _ => None,
                }
            }

            /// Identifier used on the command line.
            pub fn id(&self) -> &'static str {
                match self {
                    $(Server::$variant => $id),*
                }
            }

            /// Name reported in `serverInfo`.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Server::$variant => $name),*
                }
            }

            pub fn default_port(&self) -> u16 {
                match self {
                    $(Server::$variant => $port),*
                }
            }

            /// Environment variable that overrides the default port, if any.
            pub fn port_env(&self) -> Option<&'static str> {
                match self {
                    $(Server::$variant => $port_env),*
                }
            }

            pub fn kind(&self) -> ServerKind {
                match self {
                    $(Server::$variant => $kind),*
                }
            }
        }
    };
}

define_servers! {
    Etl {
        id: "etl",
        name: "etl-server",
        port: 8010,
        port_env: None,
        kind: ServerKind::Direct(&["Etl"]),
    },
    EtlAgent {
        id: "etl-agent",
        name: "etl-agent",
        port: 8001,
        port_env: None,
        kind: ServerKind::Agent(&profiles::ETL_AGENT),
    },
    Price {
        id: "price",
        name: "scraper-server",
        port: 8011,
        port_env: None,
        kind: ServerKind::Direct(&["PriceScraper"]),
    },
    Scraper {
        id: "scraper",
        name: "scraper-agent-server",
        port: 8000,
        port_env: None,
        kind: ServerKind::Agent(&profiles::SCRAPER),
    },
    Supabase {
        id: "supabase",
        name: "supabase-agent-server",
        port: 8000,
        port_env: None,
        kind: ServerKind::Agent(&profiles::SUPABASE),
    },
    Github {
        id: "github",
        name: "github-agent-server",
        port: 8001,
        port_env: None,
        kind: ServerKind::Agent(&profiles::GITHUB),
    },
    Docker {
        id: "docker",
        name: "docker-agent-server",
        port: 8002,
        port_env: None,
        kind: ServerKind::Agent(&profiles::DOCKER),
    },
    Brave {
        id: "brave",
        name: "brave-web-agent-server",
        port: 8003,
        port_env: None,
        kind: ServerKind::Agent(&profiles::BRAVE),
    },
    Context7 {
        id: "context7",
        name: "context7-agent-server",
        port: 8004,
        port_env: None,
        kind: ServerKind::Agent(&profiles::CONTEXT7),
    },
    Yfinance {
        id: "yfinance",
        name: "yfinance-agent-server",
        port: 8005,
        port_env: Some("PORT"),
        kind: ServerKind::Agent(&profiles::YFINANCE),
    },
    Selenium {
        id: "selenium",
        name: "selenium-agent-server",
        port: 8006,
        port_env: None,
        kind: ServerKind::Agent(&profiles::SELENIUM),
    },
    Airbnb {
        id: "airbnb",
        name: "airbnb-search-server",
        port: 8007,
        port_env: None,
        kind: ServerKind::Agent(&profiles::AIRBNB),
    },
    Travel {
        id: "travel",
        name: "agent-server",
        port: 8003,
        port_env: None,
        kind: ServerKind::Travel,
    },
}

impl Server {
    /// Port precedence: command line, then the server's port variable, then
    /// the default.
    pub fn resolve_port(&self, cli: Option<u16>, env_value: Option<&str>) -> Result<u16> {
        if let Some(port) = cli {
            return Ok(port);
        }
        match (self.port_env(), env_value) {
            (Some(env), Some(value)) => value
                .trim()
                .parse()
                .with_context(|| format!("{} must be a port number, got '{}'", env, value)),
            _ => Ok(self.default_port()),
        }
    }

    pub fn port(&self, cli: Option<u16>) -> Result<u16> {
        let env_value = self.port_env().and_then(|env| std::env::var(env).ok());
        self.resolve_port(cli, env_value.as_deref())
    }

    pub fn tools(&self) -> Vec<ToolDefinition> {
        match self.kind() {
            ServerKind::Direct(toolbelts) => get_tools_for(toolbelts),
            ServerKind::Agent(profile) => vec![profile.definition(self.id())],
            ServerKind::Travel => vec![travel_definition()],
        }
    }

    pub async fn call_tool(&self, name: &str, args: Value) -> Result<String, ToolCallError> {
        if !self.tools().iter().any(|t| t.name == name) {
            return Err(ToolCallError::UnknownTool(name.to_string()));
        }
        info!(server = self.id(), tool = name, "Tool call");

        match self.kind() {
            ServerKind::Direct(_) => {
                let name = name.to_string();
                // Tools that fetch pages block on the runtime handle.
                tokio::task::spawn_blocking(move || use_tool(&name, &args))
                    .await
                    .map_err(|e| anyhow!("Tool task failed: {}", e))?
                    .map_err(ToolCallError::Failed)
            }
            ServerKind::Agent(profile) => {
                let request = profile.parse_request(&args)?;
                profile.run(request).await
            }
            ServerKind::Travel => {
                let input = args
                    .get("input_data")
                    .ok_or_else(|| ToolCallError::InvalidParams("Missing required argument 'input_data'".to_string()))
                    .and_then(|raw| {
                        TravelInput::from_value(raw).map_err(|e| ToolCallError::InvalidParams(e.to_string()))
                    })?;
                run_travel(&input).await
            }
        }
    }
}

fn travel_definition() -> ToolDefinition {
    ToolDefinition {
        name: "travel_planner".to_string(),
        description: "Plan a trip: flights, accommodation and local experiences from three cooperating agents."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {"input_data": TravelInput::json_schema()},
            "required": ["input_data"]
        }),
    }
}

async fn run_travel(input: &TravelInput) -> Result<String, ToolCallError> {
    let agents = TRAVEL_CREW
        .iter()
        .map(|m| -> Result<Agent, ToolCallError> {
            Ok(Agent::new(m.role, m.goal, m.backstory, llm_client(m.llm, m.temperature)?))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let processes = start_all(&TRAVEL_CREW).await?;

    let mut crew = Crew::new();
    for ((agent, task), process) in agents.into_iter().zip(travel_tasks(input)).zip(&processes) {
        crew = crew.member(agent, task, process);
    }
    let result = crew.kickoff().await;
    drop(crew);

    for process in processes {
        process.shutdown().await;
    }

    Ok(result?.to_json()?)
}

/// Starts one process per member; if any fails, the ones already running are
/// shut down.
async fn start_all(members: &[TravelMember]) -> Result<Vec<ToolProcess>> {
    let mut started = Vec::with_capacity(members.len());
    for member in members {
        warn_missing_credential(member.credential_env);
        let attempt = match member.process.spec(member.label) {
            Ok(spec) => ToolProcess::start(&spec).await,
            Err(e) => Err(e),
        };
        match attempt {
            Ok(process) => started.push(process),
            Err(e) => {
                for process in started {
                    process.shutdown().await;
                }
                return Err(e);
            }
        }
    }
    Ok(started)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_and_are_unique() {
        for server in Server::all() {
            assert_eq!(Server::from_id(server.id()), Some(*server));
        }
        let mut ids: Vec<_> = Server::all().iter().map(|s| s.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), Server::all().len());
        assert_eq!(Server::from_id("nope"), None);
    }

    #[test]
    fn port_precedence() {
        let finance = Server::Yfinance;
        assert_eq!(finance.resolve_port(None, None).unwrap(), 8005);
        assert_eq!(finance.resolve_port(None, Some("9100")).unwrap(), 9100);
        assert_eq!(finance.resolve_port(Some(7000), Some("9100")).unwrap(), 7000);
        assert!(finance.resolve_port(None, Some("high")).is_err());

        // Only servers with a port variable read it.
        assert_eq!(Server::Supabase.resolve_port(None, Some("9100")).unwrap(), 8000);
    }

    #[test]
    fn default_ports_match_the_front_end_table() {
        let ports: Vec<_> = [
            Server::Supabase,
            Server::Github,
            Server::Docker,
            Server::Brave,
            Server::Context7,
            Server::Yfinance,
        ]
        .iter()
        .map(|s| s.default_port())
        .collect();
        assert_eq!(ports, vec![8000, 8001, 8002, 8003, 8004, 8005]);
    }

    #[test]
    fn each_agent_server_exposes_one_tool() {
        let tools = Server::Github.tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "github_analyst");
        assert_eq!(tools[0].input_schema["required"], json!(["question"]));

        let tools = Server::EtlAgent.tools();
        assert!(tools[0].input_schema["properties"].get("csv_path").is_some());

        let tools = Server::Travel.tools();
        assert_eq!(tools[0].name, "travel_planner");
        assert_eq!(Server::Etl.tools().len(), 8);
    }

    #[test]
    fn agent_tasks_interpolate_arguments() {
        let request = profiles::SCRAPER.parse_request(&json!({"url": "https://shop/x"})).unwrap();
        assert_eq!(
            profiles::SCRAPER.task(&request).description,
            "Scrape and analyze product pricing for the page: https://shop/x"
        );

        let request = profiles::ETL_AGENT
            .parse_request(&json!({"question": "drop duplicates", "csv_path": "/tmp/a.csv"}))
            .unwrap();
        let description = profiles::ETL_AGENT.task(&request).description;
        assert!(description.contains("/tmp/a.csv"));
        assert!(description.contains("Your task is: drop duplicates"));
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected_before_anything_runs() {
        let err = Server::Supabase.call_tool("github_analyst", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolCallError::UnknownTool(_)));
    }

    #[tokio::test]
    async fn bad_agent_arguments_are_invalid_params() {
        let err = Server::Supabase.call_tool("supabase_analyst", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolCallError::InvalidParams(_)));

        let err = Server::Supabase
            .call_tool("supabase_analyst", json!({"question": "q", "llm": "gpt_9"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown LLM preset"));

        let err = Server::Travel
            .call_tool("travel_planner", json!({"input_data": {"departure": "x"}}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolCallError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn direct_tools_run_in_process() {
        let out = Server::Etl
            .call_tool("remove_duplicates", json!({"data": [{"a": 1}, {"a": 1}]}))
            .await
            .unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["data"], json!([{"a": 1}]));

        let err = Server::Etl
            .call_tool("check_data_types", json!({"data": [{"a": "x"}], "type_mapping": {"a": "int"}}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolCallError::Failed(_)));
    }
}
