//! Tool Schemas
//!
//! JSON Schema builder for tool parameters, plus the validation that runs
//! before any handler sees its arguments.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ToolError;

/// Tool definition as advertised by `tools/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// JSON Schema for tool parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name (snake_case)
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema for parameters
    pub parameters: Value,
    /// Required parameter names
    pub required: Vec<String>,
}

impl ToolSchema {
    /// Create a new tool schema
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters: json!({
                "type": "object",
                "properties": {}
            }),
            required: vec![],
        }
    }

    fn with_param(mut self, name: &str, property: Value, required: bool) -> Self {
        if let Some(props) = self.parameters.get_mut("properties") {
            props[name] = property;
        }
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    /// Add a string parameter
    pub fn with_string_param(self, name: &str, description: &str, required: bool) -> Self {
        self.with_param(
            name,
            json!({
                "type": "string",
                "description": description
            }),
            required,
        )
    }

    /// Add an integer parameter
    pub fn with_int_param(self, name: &str, description: &str, required: bool) -> Self {
        self.with_param(
            name,
            json!({
                "type": "integer",
                "description": description
            }),
            required,
        )
    }

    /// Add a boolean parameter
    pub fn with_bool_param(self, name: &str, description: &str, required: bool) -> Self {
        self.with_param(
            name,
            json!({
                "type": "boolean",
                "description": description
            }),
            required,
        )
    }

    /// Add an array-of-strings parameter
    pub fn with_string_array_param(self, name: &str, description: &str, required: bool) -> Self {
        self.with_param(
            name,
            json!({
                "type": "array",
                "items": { "type": "string" },
                "description": description
            }),
            required,
        )
    }

    /// Record the default for an already declared parameter
    pub fn with_default(mut self, name: &str, default: Value) -> Self {
        if let Some(prop) = self
            .parameters
            .get_mut("properties")
            .and_then(|props| props.get_mut(name))
        {
            prop["default"] = default;
        }
        self
    }

    /// Validate parameters against schema
    pub fn validate(&self, params: &Value) -> Result<(), ToolError> {
        if !params.is_object() {
            return Err(ToolError::invalid("Arguments must be a JSON object"));
        }

        for req in &self.required {
            if params.get(req).map_or(true, Value::is_null) {
                return Err(ToolError::invalid(format!("Missing required parameter: {}", req)));
            }
        }

        let Some(props) = self.parameters.get("properties").and_then(Value::as_object) else {
            return Ok(());
        };

        for (name, schema) in props {
            let Some(value) = params.get(name).filter(|v| !v.is_null()) else {
                continue;
            };

            let expected_type = schema.get("type").and_then(Value::as_str);
            if !type_matches(expected_type, value) {
                return Err(ToolError::invalid(format!(
                    "Parameter '{}' has wrong type, expected {}",
                    name,
                    expected_type.unwrap_or("unknown")
                )));
            }

            if let (Some(items), Some(item_type)) = (
                value.as_array(),
                schema.pointer("/items/type").and_then(Value::as_str),
            ) {
                if !items.iter().all(|item| type_matches(Some(item_type), item)) {
                    return Err(ToolError::invalid(format!(
                        "Parameter '{}' must contain only {} values",
                        name, item_type
                    )));
                }
            }
        }

        Ok(())
    }

    /// Format as MCP tool definition
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: json!({
                "type": "object",
                "properties": self.parameters.get("properties").cloned().unwrap_or_else(|| json!({})),
                "required": self.required
            }),
        }
    }
}

fn type_matches(expected: Option<&str>, value: &Value) -> bool {
    match expected {
        Some("string") => value.is_string(),
        Some("integer") => value.is_i64() || value.is_u64(),
        Some("number") => value.is_number(),
        Some("boolean") => value.is_boolean(),
        Some("array") => value.is_array(),
        Some("object") => value.is_object(),
        _ => true,
    }
}
