//! Client side of a stdio MCP server running as a child process.
//!
//! The child speaks newline-delimited JSON-RPC on stdin/stdout and logs on
//! stderr, which is inherited. One request is in flight at a time.

use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value;
use switchboard_shared::protocol::{
    InitializeParams, McpRequest, McpResponse, RequestId, ToolDefinition, ToolsCallParams,
    ToolsCallResult, ToolsListResult, methods,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::agent::ToolCaller;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// How to launch a tool process.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolProcessSpec {
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
}

impl ToolProcessSpec {
    pub fn new(label: &str, program: &str, args: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// This binary, serving one of its own direct servers over stdio.
    pub fn self_serve(label: &str, server_id: &str) -> Result<Self> {
        let exe = std::env::current_exe().context("Failed to locate the switchboard binary")?;
        Ok(Self {
            label: label.to_string(),
            program: exe.to_string_lossy().into_owned(),
            args: vec![
                "serve".to_string(),
                server_id.to_string(),
                "--stdio".to_string(),
            ],
        })
    }
}

struct Io {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

pub struct ToolProcess {
    label: String,
    child: Child,
    io: Mutex<Io>,
    next_id: AtomicI64,
    tools: Vec<ToolDefinition>,
}

impl ToolProcess {
    /// Spawns the process, performs the MCP handshake and lists its tools.
    /// The child inherits the full environment, credentials included.
    pub async fn start(spec: &ToolProcessSpec) -> Result<Self> {
        info!(label = %spec.label, program = %spec.program, "Starting tool process");

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start tool process '{}'", spec.program))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("Tool process '{}' has no stdin", spec.label))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("Tool process '{}' has no stdout", spec.label))?;

        let mut process = Self {
            label: spec.label.clone(),
            child,
            io: Mutex::new(Io {
                stdin,
                stdout: BufReader::new(stdout).lines(),
            }),
            next_id: AtomicI64::new(1),
            tools: Vec::new(),
        };

        // On failure the child is killed when `process` drops.
        process.handshake().await?;
        Ok(process)
    }

    async fn handshake(&mut self) -> Result<()> {
        let params = serde_json::to_value(InitializeParams::for_client("switchboard"))?;
        self.request(methods::INITIALIZE, Some(params))
            .await
            .with_context(|| format!("Tool process '{}' failed to initialize", self.label))?;
        self.notify(methods::INITIALIZED).await?;

        let listed: ToolsListResult =
            serde_json::from_value(self.request(methods::TOOLS_LIST, None).await?)
                .with_context(|| format!("Tool process '{}' sent an invalid tool list", self.label))?;

        info!(label = %self.label, tools = listed.tools.len(), "Tool process ready");
        self.tools = listed.tools;
        Ok(())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    async fn notify(&self, method: &str) -> Result<()> {
        let mut io = self.io.lock().await;
        write_message(&mut io.stdin, &McpRequest::notification(method)).await
    }

    /// Sends a request and waits for the response with the same id. Other
    /// lines (server notifications, stray output) are skipped.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        let request = McpRequest::new(id.clone(), method, params);

        let mut io = self.io.lock().await;
        write_message(&mut io.stdin, &request).await?;

        loop {
            let line = io
                .stdout
                .next_line()
                .await?
                .ok_or_else(|| anyhow!("Tool process '{}' closed its output", self.label))?;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let Ok(response) = serde_json::from_str::<McpResponse>(line) else {
                debug!(label = %self.label, line, "Skipping non-response line");
                continue;
            };
            if response.id.as_ref() != Some(&id) {
                continue;
            }

            return response
                .into_result()
                .map_err(|e| anyhow!("Tool process '{}' returned an error: {}", self.label, e));
        }
    }

    /// Closes stdin and waits briefly for the child to exit, then kills it.
    pub async fn shutdown(self) {
        let Self {
            label,
            mut child,
            io,
            ..
        } = self;
        drop(io);

        match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
            Ok(Ok(status)) => debug!(label = %label, %status, "Tool process exited"),
            Ok(Err(e)) => warn!(label = %label, "Failed waiting for tool process: {}", e),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!(label = %label, "Failed to kill tool process: {}", e);
                }
            }
        }
    }
}

impl ToolCaller for ToolProcess {
    fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<String> {
        let params = serde_json::to_value(ToolsCallParams {
            name: name.to_string(),
            arguments: Some(arguments),
        })?;

        let result: ToolsCallResult =
            serde_json::from_value(self.request(methods::TOOLS_CALL, Some(params)).await?)
                .with_context(|| format!("Invalid tools/call result from '{}'", self.label))?;

        if result.is_error() {
            bail!("{}", result.joined_text());
        }
        Ok(result.joined_text())
    }
}

async fn write_message(stdin: &mut ChildStdin, request: &McpRequest) -> Result<()> {
    let mut line = serde_json::to_string(request)?;
    line.push('\n');
    stdin.write_all(line.as_bytes()).await?;
    stdin.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_serve_runs_the_stdio_transport() {
        let spec = ToolProcessSpec::self_serve("etl", "etl").unwrap();
        assert_eq!(spec.args, vec!["serve", "etl", "--stdio"]);
    }

    #[tokio::test]
    async fn missing_program_fails_to_start() {
        let spec = ToolProcessSpec::new("ghost", "switchboard-no-such-program", &[]);
        let err = ToolProcess::start(&spec).await.err().unwrap();
        assert!(err.to_string().contains("Failed to start tool process"));
    }

    // A shell script standing in for an MCP server: it answers the handshake,
    // then one tools/call, echoing a notification line first.
    #[cfg(unix)]
    #[tokio::test]
    async fn talks_to_a_scripted_server() {
        let script = r#"
read init
echo '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","capabilities":{},"serverInfo":{"name":"fake","version":"0"}}}'
read initialized
read list
echo '{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"echo","description":"Echo","inputSchema":{"type":"object"}}]}}'
read call
echo '{"jsonrpc":"2.0","method":"notifications/progress"}'
echo '{"jsonrpc":"2.0","id":3,"result":{"content":[{"type":"text","text":"pong"}]}}'
read call
echo '{"jsonrpc":"2.0","id":4,"result":{"content":[{"type":"text","text":"boom"}],"isError":true}}'
"#;
        let spec = ToolProcessSpec::new("fake", "sh", &["-c", script]);
        let process = ToolProcess::start(&spec).await.unwrap();

        assert_eq!(process.tools().len(), 1);
        assert_eq!(process.tools()[0].name, "echo");

        let out = process.call_tool("echo", serde_json::json!({})).await.unwrap();
        assert_eq!(out, "pong");

        let err = process.call_tool("echo", serde_json::json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");

        process.shutdown().await;
    }
}
