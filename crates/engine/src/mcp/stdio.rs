//! Newline-delimited JSON-RPC over stdin/stdout.

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info};

use super::McpServer;

pub async fn serve_stdio(server: &McpServer) -> Result<()> {
    info!(server = server.server().id(), "Serving MCP over stdio");
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    serve_lines(server, stdin, tokio::io::stdout()).await
}

/// Answers each line of `input` on `output` until `input` ends.
pub async fn serve_lines<R, W>(server: &McpServer, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let Some(response) = server.handle_message(&line).await else {
            continue;
        };

        match serde_json::to_string(&response) {
            Ok(mut json) => {
                json.push('\n');
                output.write_all(json.as_bytes()).await?;
                output.flush().await?;
            }
            Err(e) => error!("Failed to serialize MCP response: {}", e),
        }
    }

    info!("stdin closed, stopping");
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::servers::Server;

    #[tokio::test]
    async fn answers_requests_and_skips_notifications() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
        );
        let mut output = Vec::new();
        serve_lines(&McpServer::new(Server::Etl), input.as_bytes(), &mut output)
            .await
            .unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[0]["result"]["serverInfo"]["name"], "etl-server");
        assert_eq!(lines[1]["id"], 2);
        assert_eq!(lines[1]["result"], serde_json::json!({}));
    }
}
