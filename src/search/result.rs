//! Uniform result shape shared by relevance and pattern search.

use serde::Serialize;

use super::entry::{CatalogEntry, ToolIdentifier};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub tool: ToolIdentifier,
    pub qualified_name: String,
    pub score: f64,
    pub preview: String,
    pub signature: String,
}

impl SearchResult {
    pub fn from_entry(entry: &CatalogEntry, score: f64) -> Self {
        Self {
            tool: entry.id.clone(),
            qualified_name: entry.qualified_name.clone(),
            score,
            preview: entry.description.clone(),
            signature: signature(entry),
        }
    }
}

/// Call shape `name(a, b?)`; `?` marks arguments described as optional.
pub fn signature(entry: &CatalogEntry) -> String {
    let args: Vec<String> = entry
        .arguments
        .iter()
        .map(|arg| {
            if arg.is_optional() {
                format!("{}?", arg.name)
            } else {
                arg.name.clone()
            }
        })
        .collect();
    format!("{}({})", entry.local_name(), args.join(", "))
}
