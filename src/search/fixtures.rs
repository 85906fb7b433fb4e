//! Shared catalog fixtures for unit tests.

use serde_json::{Value, json};

use super::entry::CatalogEntry;
use crate::mcp::McpToolDefinition;

pub(crate) fn tool(name: &str, desc: &str, args: &[(&str, &str)]) -> McpToolDefinition {
    let properties: serde_json::Map<String, Value> = args
        .iter()
        .map(|(arg, arg_desc)| {
            (
                arg.to_string(),
                json!({ "type": "string", "description": arg_desc }),
            )
        })
        .collect();

    McpToolDefinition {
        name: name.to_string(),
        description: desc.to_string(),
        input_schema: json!({ "type": "object", "properties": properties }),
    }
}

pub(crate) fn entry(origin: &str, name: &str, desc: &str, args: &[(&str, &str)]) -> CatalogEntry {
    CatalogEntry::from_mcp_tool(origin, &tool(name, desc, args))
}

/// The three-tool catalog used by the ranking scenarios.
pub(crate) fn basic_catalog() -> Vec<CatalogEntry> {
    vec![
        entry(
            "time",
            "get_current_time",
            "Get current time in a specific timezone",
            &[("timezone", "IANA timezone name")],
        ),
        entry("calculator", "add", "Add two numbers", &[]),
        entry("search", "web_search", "Search the web for information", &[]),
    ]
}

/// A larger mixed catalog for chunking and ordering checks.
pub(crate) fn mixed_catalog() -> Vec<CatalogEntry> {
    let mut entries = basic_catalog();
    entries.extend([
        entry("time", "convert_time", "Convert time between timezones", &[
            ("source_timezone", "Source timezone"),
            ("target_timezone", "Target timezone"),
            ("time", "Time to convert"),
        ]),
        entry("weather", "get_weather", "Get current weather for a location", &[(
            "location",
            "City name",
        )]),
        entry("weather", "get_forecast", "Get weather forecast for days", &[(
            "days",
            "Number of days, optional",
        )]),
        entry("database", "query", "Execute database query", &[("sql", "SQL text")]),
        entry("database", "insert", "Insert data into database", &[]),
        entry("files", "read_file", "Read file contents", &[("path", "File path")]),
        entry("files", "write_file", "Write file contents to disk", &[
            ("path", "File path"),
            ("content", "File content"),
        ]),
        entry("calculator", "multiply", "Multiply two numbers", &[]),
    ]);
    entries
}
