use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use std::sync::Arc;

use super::{handlers, middleware};
use crate::mcp::McpServer;

pub fn create_router(mcp: Arc<McpServer>) -> Router {
    Router::new()
        .route("/", get(handlers::health_check))
        .route("/mcp", post(handlers::handle_mcp))
        .layer(axum_middleware::from_fn(middleware::log_requests))
        .with_state(mcp)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::servers::Server;

    fn app() -> Router {
        create_router(Arc::new(McpServer::new(Server::Etl)))
    }

    fn post_mcp(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/mcp")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn health_check_names_the_server() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "etl-server is running");
    }

    #[tokio::test]
    async fn mcp_lists_tools() {
        let request = json!({"jsonrpc": "2.0", "id": 7, "method": "tools/list"});
        let response = app().oneshot(post_mcp(request.to_string())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["id"], 7);
        assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn notifications_are_accepted_without_a_body() {
        let request = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        let response = app().oneshot(post_mcp(request.to_string())).await.unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(body_text(response).await.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_a_json_rpc_parse_error() {
        let response = app().oneshot(post_mcp("{oops".to_string())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let response = app()
            .oneshot(Request::builder().uri("/sse").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
