//! The analysts the chat front-end can talk to.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub tool: &'static str,
    pub port: u16,
}

pub const AGENTS: &[AgentEntry] = &[
    AgentEntry { id: "supabase", name: "Supabase Analyst", tool: "supabase_analyst", port: 8000 },
    AgentEntry { id: "github", name: "GitHub Analyst", tool: "github_analyst", port: 8001 },
    AgentEntry { id: "docker", name: "Docker Analyst", tool: "docker_mcp_tool", port: 8002 },
    AgentEntry { id: "brave", name: "Brave Web Search", tool: "brave_web_search", port: 8003 },
    AgentEntry { id: "context7", name: "Context7 Analyst", tool: "context7_analyst", port: 8004 },
    AgentEntry { id: "yfinance", name: "YFinance Analyst", tool: "yfinance_analyst", port: 8005 },
];

impl AgentEntry {
    pub fn url(&self, host: &str) -> String {
        format!("http://{}:{}/mcp", host, self.port)
    }
}

/// Matches an id or a display name, ignoring case.
pub fn find(name: &str) -> Option<&'static AgentEntry> {
    let name = name.trim();
    AGENTS
        .iter()
        .find(|a| a.id.eq_ignore_ascii_case(name) || a.name.eq_ignore_ascii_case(name))
}
