pub mod agent;
pub mod api;
pub mod llm;
pub mod mcp;
pub mod servers;
pub mod toolproc;

pub use mcp::McpServer;
pub use servers::Server;
