//! OpenAI-compatible chat-completions client.
//!
//! Every supported provider (OpenAI, Groq, Ollama, Gemini) exposes the same
//! `/chat/completions` endpoint with tool calling, so one client covers them
//! all; only the base URL, credential and model name differ.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use switchboard_shared::Tool;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Unknown LLM preset '{0}'")]
    UnknownPreset(String),

    #[error("LLM preset '{preset}' needs the {env} environment variable")]
    MissingCredential { preset: String, env: &'static str },

    #[error("LLM connection failed: {0}")]
    Connection(String),

    #[error("LLM API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid LLM response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Groq,
    Ollama,
    Gemini,
}

impl Provider {
    pub fn base_url(&self) -> String {
        match self {
            Provider::OpenAi => std::env::var("OPENAI_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            Provider::Groq => "https://api.groq.com/openai/v1".to_string(),
            Provider::Ollama => {
                let host = std::env::var("OLLAMA_HOST")
                    .unwrap_or_else(|_| "http://localhost:11434".to_string());
                format!("{}/v1", host.trim_end_matches('/'))
            }
            Provider::Gemini => {
                "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
            }
        }
    }

    pub fn credential_env(&self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => Some("OPENAI_API_KEY"),
            Provider::Groq => Some("GROQ_API_KEY"),
            Provider::Ollama => None,
            Provider::Gemini => Some("GEMINI_API_KEY"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmPreset {
    pub name: &'static str,
    pub provider: Provider,
    pub model: &'static str,
}

pub const PRESETS: &[LlmPreset] = &[
    LlmPreset { name: "gpt_4_1_mini", provider: Provider::OpenAi, model: "gpt-4.1-mini" },
    LlmPreset { name: "gpt_4_1_nano", provider: Provider::OpenAi, model: "gpt-4.1-nano" },
    LlmPreset { name: "gpt_4o", provider: Provider::OpenAi, model: "gpt-4o" },
    LlmPreset { name: "gpt_3_5_turbo", provider: Provider::OpenAi, model: "gpt-3.5-turbo" },
    LlmPreset { name: "gemini_2_0_flash", provider: Provider::Gemini, model: "gemini-2.0-flash" },
    LlmPreset { name: "gemini_2_0_flash_lite", provider: Provider::Gemini, model: "gemini-2.0-flash-lite" },
    LlmPreset { name: "deepseek_r1_8b_ollama", provider: Provider::Ollama, model: "deepseek-r1:8b" },
    LlmPreset { name: "deepseek_r1_8b_groq", provider: Provider::Groq, model: "deepseek-r1:8b" },
    LlmPreset { name: "llama3_3_ollama", provider: Provider::Ollama, model: "llama3.3:latest" },
    LlmPreset { name: "llama3_3_groq", provider: Provider::Groq, model: "llama3.3:latest" },
];

pub fn preset(name: &str) -> Result<&'static LlmPreset, LlmError> {
    PRESETS
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| LlmError::UnknownPreset(name.to_string()))
}

pub fn preset_names() -> Vec<&'static str> {
    PRESETS.iter().map(|p| p.name).collect()
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Message {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::text("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text("user", content)
    }

    pub fn tool_result(tool_call_id: &str, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.to_string()),
        }
    }

    fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn requested_tools(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or(&[])
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolCall {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

/// `arguments` is JSON text, as the API sends it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

impl FunctionCall {
    pub fn parsed_arguments(&self) -> serde_json::Value {
        serde_json::from_str(&self.arguments)
            .unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Tool]>,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: Message,
}

#[derive(Debug, Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
}

impl LlmClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        temperature: f32,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key,
            temperature,
        }
    }

    /// Builds a client for a named preset, reading its credential from the
    /// environment.
    pub fn from_preset(name: &str, temperature: f32) -> Result<Self, LlmError> {
        let preset = preset(name)?;
        let api_key = match preset.provider.credential_env() {
            Some(env) => Some(std::env::var(env).map_err(|_| LlmError::MissingCredential {
                preset: name.to_string(),
                env,
            })?),
            None => None,
        };

        Ok(Self::new(
            preset.provider.base_url(),
            preset.model,
            api_key,
            temperature,
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn complete(&self, messages: &[Message], tools: &[Tool]) -> Result<Message, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            tools: if tools.is_empty() { None } else { Some(tools) },
        };

        debug!(
            model = %self.model,
            message_count = messages.len(),
            tool_count = tools.len(),
            "Sending chat completion request"
        );

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))
    }
}
