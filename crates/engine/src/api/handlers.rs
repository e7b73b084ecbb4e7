use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::mcp::McpServer;

pub async fn health_check(State(mcp): State<Arc<McpServer>>) -> String {
    format!("{} is running", mcp.server().name())
}

/// One JSON-RPC message per POST. The body is read as text so malformed JSON
/// still gets a JSON-RPC parse error instead of an HTTP rejection.
pub async fn handle_mcp(State(mcp): State<Arc<McpServer>>, body: String) -> Response {
    match mcp.handle_message(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
