pub mod dispatch;
pub mod stdio;

pub use dispatch::McpServer;
