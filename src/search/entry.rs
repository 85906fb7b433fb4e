//! Normalization of raw tool descriptors into searchable catalog entries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mcp::McpToolDefinition;

/// Separator between origin and local name in the combined identifier.
pub const ID_SEPARATOR: char = '_';

/// Origin server plus the tool name that server reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolIdentifier {
    pub origin: String,
    pub local_name: String,
}

impl ToolIdentifier {
    pub fn new(origin: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            local_name: local_name.into(),
        }
    }

    /// Combined `origin_localName` key used by the index and by callers.
    pub fn qualified(&self) -> String {
        format!("{}{}{}", self.origin, ID_SEPARATOR, self.local_name)
    }
}

impl std::fmt::Display for ToolIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.origin, ID_SEPARATOR, self.local_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolArgument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ToolArgument {
    /// An argument counts as optional when its description says so.
    pub fn is_optional(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains("optional"))
    }
}

/// Immutable searchable record for one tool. Re-indexing replaces it.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub id: ToolIdentifier,
    pub qualified_name: String,
    pub description: String,
    pub input_schema: Value,
    pub searchable_text: String,
    pub arguments: Vec<ToolArgument>,
    pub estimated_tokens: usize,
}

impl CatalogEntry {
    pub fn from_mcp_tool(origin: &str, tool: &McpToolDefinition) -> Self {
        let id = ToolIdentifier::new(origin, &tool.name);
        let qualified_name = id.qualified();
        let arguments = extract_arguments(&tool.input_schema);
        let searchable_text =
            build_searchable_text(&qualified_name, &tool.name, &tool.description, &arguments);

        Self {
            id,
            qualified_name,
            description: tool.description.clone(),
            input_schema: tool.input_schema.clone(),
            searchable_text,
            arguments,
            estimated_tokens: tool.estimated_tokens(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.id.origin
    }

    pub fn local_name(&self) -> &str {
        &self.id.local_name
    }
}

/// Reads declared properties of an object schema in declaration order.
///
/// Anything that is not `{"type": "object", "properties": {..}}` yields no
/// arguments; the tool stays indexable by name and description.
pub fn extract_arguments(schema: &Value) -> Vec<ToolArgument> {
    if schema.get("type").and_then(Value::as_str) != Some("object") {
        return Vec::new();
    }
    let Some(props) = schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };

    props
        .iter()
        .map(|(name, prop)| ToolArgument {
            name: name.clone(),
            description: prop
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
        .collect()
}

fn build_searchable_text(
    qualified_name: &str,
    local_name: &str,
    description: &str,
    arguments: &[ToolArgument],
) -> String {
    let mut parts: Vec<&str> = vec![qualified_name, local_name];
    if !description.is_empty() {
        parts.push(description);
    }
    for arg in arguments {
        parts.push(&arg.name);
        if let Some(desc) = &arg.description {
            parts.push(desc);
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool(name: &str, desc: &str, schema: Value) -> McpToolDefinition {
        McpToolDefinition {
            name: name.to_string(),
            description: desc.to_string(),
            input_schema: schema,
        }
    }

    #[test]
    fn test_identifier_joins_with_underscore() {
        let id = ToolIdentifier::new("time", "get_current_time");
        assert_eq!(id.qualified(), "time_get_current_time");
        assert_eq!(id.to_string(), "time_get_current_time");
    }

    #[test]
    fn test_entry_creation() {
        let entry = CatalogEntry::from_mcp_tool(
            "time",
            &tool(
                "get_current_time",
                "Get current time in a specific timezone",
                json!({
                    "type": "object",
                    "properties": {
                        "timezone": { "type": "string", "description": "IANA timezone name" }
                    }
                }),
            ),
        );

        assert_eq!(entry.qualified_name, "time_get_current_time");
        assert_eq!(entry.origin(), "time");
        assert_eq!(entry.local_name(), "get_current_time");
        assert_eq!(
            entry.searchable_text,
            "time_get_current_time get_current_time Get current time in a specific timezone timezone IANA timezone name"
        );
        assert!(entry.estimated_tokens > 0);
    }

    #[test]
    fn test_arguments_keep_declaration_order() {
        let args = extract_arguments(&json!({
            "type": "object",
            "properties": {
                "to": { "type": "string", "description": "Recipient" },
                "subject": { "type": "string" },
                "body": { "type": "string", "description": "Body, optional" }
            }
        }));

        let names: Vec<&str> = args.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["to", "subject", "body"]);
        assert_eq!(args[1].description, None);
        assert!(args[2].is_optional());
        assert!(!args[0].is_optional());
    }

    #[test]
    fn test_non_string_description_is_ignored() {
        let args = extract_arguments(&json!({
            "type": "object",
            "properties": { "n": { "description": 42 } }
        }));
        assert_eq!(args.len(), 1);
        assert_eq!(args[0].description, None);
    }

    #[test]
    fn test_malformed_schema_yields_no_arguments() {
        assert!(extract_arguments(&json!(null)).is_empty());
        assert!(extract_arguments(&json!({"type": "array", "properties": {"a": {}}})).is_empty());
        assert!(extract_arguments(&json!({"type": "object"})).is_empty());
        assert!(extract_arguments(&json!({"type": "object", "properties": []})).is_empty());
        assert!(extract_arguments(&json!({"properties": {"a": {}}})).is_empty());
    }

    #[test]
    fn test_empty_description_is_omitted() {
        let entry = CatalogEntry::from_mcp_tool("calc", &tool("add", "", json!({})));
        assert_eq!(entry.searchable_text, "calc_add add");
        assert!(entry.arguments.is_empty());
    }
}
