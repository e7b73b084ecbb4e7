use once_cell::sync::Lazy;
use std::collections::HashMap;
use anyhow::Result;
use serde_json::Value;

use crate::protocol::ToolDefinition;
use crate::schemas::{ToolHandler, ToolSchema};
use crate::toolbelts::{etl, price_scraper};

static TOOL_REGISTRY: Lazy<HashMap<&'static str, ToolHandler>> = Lazy::new(|| {
    let mut map = HashMap::new();

    for (name, handler) in etl::TOOL_ENTRIES {
        map.insert(*name, *handler);
    }
    for (name, handler) in price_scraper::TOOL_ENTRIES {
        map.insert(*name, *handler);
    }

    map
});

static TOOL_SCHEMAS: Lazy<Vec<ToolSchema>> = Lazy::new(|| {
    let mut schemas = Vec::new();
    schemas.extend(etl::TOOL_SCHEMAS.iter().cloned());
    schemas.extend(price_scraper::TOOL_SCHEMAS.iter().cloned());
    schemas
});

/// Runs a tool synchronously. Tools that do network I/O block on the current
/// runtime handle, so async callers must invoke this from a blocking thread.
pub fn use_tool(name: &str, args: &Value) -> Result<String> {
    tracing::debug!(tool = name, "Running direct tool");
    TOOL_REGISTRY
        .get(name)
        .ok_or_else(|| anyhow::anyhow!("Tool '{}' not found", name))
        .and_then(|handler| handler(args))
}

/// Definitions of every tool belonging to the named toolbelts.
pub fn get_tools_for(toolbelts: &[&str]) -> Vec<ToolDefinition> {
    TOOL_SCHEMAS
        .iter()
        .filter(|s| toolbelts.contains(&s.toolbelt))
        .map(|s| s.to_definition())
        .collect()
}

pub fn get_tool_schema(name: &str) -> Result<&'static ToolSchema> {
    TOOL_SCHEMAS
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| anyhow::anyhow!("Tool schema '{}' not found", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tools_are_grouped_by_toolbelt() {
        assert_eq!(get_tools_for(&[etl::TOOLBELT]).len(), 8);
        let price = get_tools_for(&[price_scraper::TOOLBELT]);
        assert_eq!(price.len(), 1);
        assert_eq!(price[0].name, "check_price");
        assert!(get_tools_for(&["Nope"]).is_empty());
    }

    #[test]
    fn unknown_tool_is_an_error() {
        assert!(use_tool("nope", &json!({})).is_err());
        assert!(get_tool_schema("nope").is_err());
    }

    #[test]
    fn dispatches_by_bare_name() {
        let out = use_tool("remove_duplicates", &json!({"data": [{"a": 1}]})).unwrap();
        assert!(out.contains("No duplicates found"));
        assert_eq!(get_tool_schema("remove_duplicates").unwrap().toolbelt, "Etl");
    }
}
