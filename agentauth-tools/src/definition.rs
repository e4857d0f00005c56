//! Tool definitions advertised to the agent's model.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

/// Name, description, and JSON Schema parameters of a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    /// Name the model calls the tool by.
    pub name: String,

    /// Shown to the model when it decides whether to call the tool.
    pub description: String,

    /// Object schema of the accepted arguments.
    pub parameters_json_schema: JsonValue,
}

impl ToolDefinition {
    /// Create a definition that takes no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters_json_schema: empty_object_schema(),
        }
    }

    /// Replace the argument schema.
    #[must_use]
    pub fn with_parameters(mut self, schema: JsonValue) -> Self {
        self.parameters_json_schema = schema;
        self
    }

    /// Get the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Argument schema.
    #[must_use]
    pub fn parameters(&self) -> &JsonValue {
        &self.parameters_json_schema
    }

    /// Names of required parameters.
    pub fn required(&self) -> Vec<&str> {
        self.parameters_json_schema["required"]
            .as_array()
            .map(|names| names.iter().filter_map(JsonValue::as_str).collect())
            .unwrap_or_default()
    }

    /// Render as an OpenAI-style `function` tool entry.
    #[must_use]
    pub fn to_openai_function(&self) -> JsonValue {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters_json_schema.clone()
            }
        })
    }
}

fn empty_object_schema() -> JsonValue {
    json!({
        "type": "object",
        "properties": {},
        "additionalProperties": false
    })
}
