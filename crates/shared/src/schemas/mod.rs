// crates/shared/src/schemas/mod.rs
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::protocol::ToolDefinition;

#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub name: &'static str,
    pub toolbelt: &'static str,
    pub description: &'static str,
    pub parameters: Vec<ParameterSchema>,
}

/// `type_name` is a JSON schema type; `array<T>` describes an array of `T`.
#[derive(Debug, Clone)]
pub struct ParameterSchema {
    pub name: &'static str,
    pub type_name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

impl ParameterSchema {
    fn to_json(&self) -> Value {
        match self
            .type_name
            .strip_prefix("array<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            Some(item) => json!({
                "type": "array",
                "items": {"type": item},
                "description": self.description
            }),
            None => json!({
                "type": self.type_name,
                "description": self.description
            }),
        }
    }
}

/// OpenAI-style function tool, as sent to chat-completion endpoints.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Tool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolSchema {
    pub fn input_schema(&self) -> Value {
        let mut properties = json!({});
        let mut required = vec![];

        for param in &self.parameters {
            properties[param.name] = param.to_json();
            if param.required {
                required.push(param.name);
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }

    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.to_string(),
            description: self.description.to_string(),
            input_schema: self.input_schema(),
        }
    }
}

impl From<&ToolDefinition> for Tool {
    fn from(def: &ToolDefinition) -> Self {
        let parameters = if def.input_schema.is_object() {
            def.input_schema.clone()
        } else {
            json!({"type": "object", "properties": {}})
        };

        Tool {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: def.name.clone(),
                description: def.description.clone(),
                parameters,
            },
        }
    }
}

pub type ToolHandler = fn(&Value) -> anyhow::Result<String>;
