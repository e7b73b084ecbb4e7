//! JSON-RPC dispatch shared by the HTTP and stdio transports.
//!
//! Every message is handled on its own; there is no session, so `tools/list`
//! and `tools/call` do not require a prior `initialize`.

use serde_json::Value;
use switchboard_shared::protocol::{
    Implementation, InitializeResult, JSONRPC_VERSION, MCP_PROTOCOL_VERSION, McpError, McpRequest,
    McpResponse, ServerCapabilities, ToolsCallParams, ToolsCallResult, ToolsCapability,
    ToolsListResult, methods,
};
use tracing::{debug, warn};

use crate::servers::{Server, ToolCallError};

pub struct McpServer {
    server: Server,
}

impl McpServer {
    pub fn new(server: Server) -> Self {
        Self { server }
    }

    pub fn server(&self) -> Server {
        self.server
    }

    /// Handles one raw message. Notifications yield no response.
    pub async fn handle_message(&self, text: &str) -> Option<McpResponse> {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => return Some(McpResponse::error(None, McpError::ParseError(e.to_string()))),
        };

        let request: McpRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(McpResponse::error(
                    None,
                    McpError::InvalidRequest(e.to_string()),
                ));
            }
        };

        self.handle_request(request).await
    }

    pub async fn handle_request(&self, request: McpRequest) -> Option<McpResponse> {
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(McpResponse::error(
                request.id,
                McpError::InvalidRequest(format!("Unsupported jsonrpc version '{}'", request.jsonrpc)),
            ));
        }

        let Some(request_id) = request.id.clone() else {
            debug!(method = %request.method, "Notification received");
            return None;
        };

        let result = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(),
            methods::PING => Ok(serde_json::json!({})),
            methods::TOOLS_LIST => self.handle_tools_list(),
            methods::TOOLS_CALL => self.handle_tools_call(&request).await,
            other => Err(McpError::MethodNotFound(other.to_string())),
        };

        Some(match result {
            Ok(value) => McpResponse::success(request_id, value),
            Err(error) => McpResponse::error(Some(request_id), error),
        })
    }

    fn handle_initialize(&self) -> Result<Value, McpError> {
        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: None }),
            },
            server_info: Implementation {
                name: self.server.name().to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    fn handle_tools_list(&self) -> Result<Value, McpError> {
        let result = ToolsListResult {
            tools: self.server.tools(),
        };

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_tools_call(&self, request: &McpRequest) -> Result<Value, McpError> {
        let params: ToolsCallParams = request
            .params
            .clone()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Missing params".to_string()))?;

        let arguments = params.arguments.unwrap_or_else(|| serde_json::json!({}));

        let result = match self.server.call_tool(&params.name, arguments).await {
            Ok(text) => ToolsCallResult::text(text),
            Err(ToolCallError::UnknownTool(name)) => {
                return Err(McpError::MethodNotFound(format!("Unknown tool: {}", name)));
            }
            Err(ToolCallError::InvalidParams(msg)) => return Err(McpError::InvalidParams(msg)),
            Err(ToolCallError::Failed(e)) => {
                warn!(tool = %params.name, "Tool failed: {:#}", e);
                ToolsCallResult::error(format!("{:#}", e))
            }
        };

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use switchboard_shared::protocol::{RequestId, result_payload};

    use super::*;

    async fn send(server: Server, message: Value) -> Option<McpResponse> {
        McpServer::new(server).handle_message(&message.to_string()).await
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() {
        let response = McpServer::new(Server::Etl).handle_message("{not json").await.unwrap();
        assert_eq!(response.error.unwrap().code, -32700);
        assert!(response.id.is_none());
    }

    #[tokio::test]
    async fn wrong_shape_or_version_is_an_invalid_request() {
        let response = send(Server::Etl, json!({"jsonrpc": "2.0", "id": 1})).await.unwrap();
        assert_eq!(response.error.unwrap().code, -32600);

        let response = send(Server::Etl, json!({"jsonrpc": "1.0", "id": 1, "method": "ping"}))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32600);
        assert_eq!(response.id, Some(RequestId::Number(1)));
    }

    #[tokio::test]
    async fn initialize_reports_the_server_name() {
        let response = send(
            Server::Price,
            json!({"jsonrpc": "2.0", "id": "a", "method": "initialize", "params": {}}),
        )
        .await
        .unwrap();

        let result = response.into_result().unwrap();
        assert_eq!(result["serverInfo"]["name"], "scraper-server");
        assert_eq!(result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let response = send(
            Server::Etl,
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        )
        .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn unknown_method_and_unknown_tool_are_method_not_found() {
        let response = send(Server::Etl, json!({"jsonrpc": "2.0", "id": 1, "method": "resources/list"}))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32601);

        let response = send(
            Server::Etl,
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {"name": "check_price"}}),
        )
        .await
        .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32601);
        assert!(error.message.contains("Unknown tool: check_price"));
    }

    #[tokio::test]
    async fn tools_call_without_params_is_invalid_params() {
        let response = send(Server::Etl, json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call"}))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn tools_list_returns_the_toolbelt() {
        let response = send(Server::Etl, json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
            .await
            .unwrap();
        let result: ToolsListResult = serde_json::from_value(response.into_result().unwrap()).unwrap();
        let names: Vec<_> = result.tools.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"read_csv_file"));
        assert!(names.contains(&"transform_data"));
        assert_eq!(names.len(), 8);
    }

    #[tokio::test]
    async fn tool_success_and_failure_are_results() {
        let response = send(
            Server::Etl,
            json!({
                "jsonrpc": "2.0", "id": 1, "method": "tools/call",
                "params": {"name": "transform_data", "arguments": {
                    "data": [{"a": 2, "b": 3}],
                    "transformation_rules": {"new_columns": {"c": "a * b"}}
                }}
            }),
        )
        .await
        .unwrap();
        let result = response.into_result().unwrap();
        assert!(result.get("isError").is_none());
        let payload: Value = serde_json::from_str(&result_payload(&result)).unwrap();
        assert_eq!(payload["data"][0]["c"], 6);

        let response = send(
            Server::Etl,
            json!({
                "jsonrpc": "2.0", "id": 2, "method": "tools/call",
                "params": {"name": "enforce_constraints", "arguments": {
                    "data": [{"id": null}],
                    "constraints": {"id": {"not_null": true}}
                }}
            }),
        )
        .await
        .unwrap();
        let result = response.into_result().unwrap();
        assert_eq!(result["isError"], true);
        assert!(result_payload(&result).contains("id"));
    }
}
