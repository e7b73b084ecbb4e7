use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::{Context, Result, anyhow, bail};
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Value, json};
use switchboard_shared::protocol::{
    InitializeParams, InitializeResult, McpRequest, McpResponse, RequestId, ToolsCallResult, methods,
    result_payload,
};
use tracing::debug;

/// Calls tools on one MCP server over HTTP. Each call is a single POST.
pub struct McpClient {
    client: reqwest::Client,
    url: String,
    client_name: String,
    next_id: AtomicI64,
}

impl McpClient {
    pub fn new(url: impl Into<String>, client_name: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            client_name: client_name.into(),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Handshake; returns the server's name.
    pub async fn initialize(&self) -> Result<String> {
        let params = serde_json::to_value(InitializeParams::for_client(&self.client_name))?;
        let result: InitializeResult =
            serde_json::from_value(self.request(methods::INITIALIZE, Some(params)).await?)
                .context("Invalid initialize result")?;
        Ok(result.server_info.name)
    }

    /// Calls `name` and returns the first text content, or the whole result
    /// as JSON text when there is none. A result flagged `isError` is an error.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<String> {
        let result = self
            .request(methods::TOOLS_CALL, Some(json!({"name": name, "arguments": arguments})))
            .await?;

        if let Ok(call) = serde_json::from_value::<ToolsCallResult>(result.clone()) {
            if call.is_error() {
                bail!("{}", call.joined_text());
            }
        }
        Ok(result_payload(&result))
    }

    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        let request = McpRequest::new(id.clone(), method, params);
        debug!(url = %self.url, method, "MCP request");

        let response = self
            .client
            .post(&self.url)
            .header(ACCEPT, "application/json, text/event-stream")
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Could not reach {}", self.url))?;

        if !response.status().is_success() {
            return Err(anyhow!("Request failed: {}", response.status()));
        }

        let is_sse = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/event-stream"));

        let message = if is_sse {
            read_event_stream(response, &id).await?
        } else {
            response.json::<McpResponse>().await?
        };

        Ok(message.into_result()?)
    }
}

/// Servers may answer in an event stream; the response is the `data:` line
/// carrying our id.
async fn read_event_stream(response: reqwest::Response, id: &RequestId) -> Result<McpResponse> {
    let mut stream = response.bytes_stream();
    let mut buffer = Vec::new();

    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        buffer.extend_from_slice(&bytes);

        while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=newline_pos).collect();
            let line = String::from_utf8_lossy(&line);

            if let Some(message) = parse_data_line(&line, id) {
                return Ok(message);
            }
        }
    }

    let line = String::from_utf8_lossy(&buffer);
    parse_data_line(&line, id).ok_or_else(|| anyhow!("Event stream ended without a response"))
}

fn parse_data_line(line: &str, id: &RequestId) -> Option<McpResponse> {
    let data = line.strip_prefix("data:")?.trim();
    if data.is_empty() {
        return None;
    }
    serde_json::from_str::<McpResponse>(data)
        .ok()
        .filter(|message| message.id.as_ref() == Some(id))
}
