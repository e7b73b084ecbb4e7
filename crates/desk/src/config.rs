use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Host the agent servers listen on.
    pub host: String,
    /// Reported to servers as the MCP client name.
    pub client_name: String,
    pub agent: String,
    pub llm: String,
    pub etl_url: String,
    pub travel_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            client_name: get_hostname(),
            agent: "supabase".to_string(),
            llm: "gpt_4_1_mini".to_string(),
            etl_url: "http://127.0.0.1:8001/mcp".to_string(),
            travel_url: "http://127.0.0.1:8003/mcp".to_string(),
        }
    }
}

pub const KEYS: &[&str] = &["host", "client", "agent", "llm", "etl-url", "travel-url"];

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let slot = match key {
            "host" => &mut self.host,
            "client" => &mut self.client_name,
            "agent" => &mut self.agent,
            "llm" => &mut self.llm,
            "etl-url" => &mut self.etl_url,
            "travel-url" => &mut self.travel_url,
            other => bail!("Unknown config key '{}'. Keys: {}", other, KEYS.join(", ")),
        };
        *slot = value.to_string();
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find the config directory"))?;
        Ok(dir.join("switchboard").join("desk.json"))
    }
}

fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "desk".to_string())
}
