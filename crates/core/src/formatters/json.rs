use serde::Serialize;

use crate::Result;
use crate::dom_tree::GuardTrip;
use crate::result::Extraction;
use crate::scoring::Selection;

/// Complete JSON output structure
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    pub title: &'a str,
    /// Content as Markdown
    pub content: &'a str,
    /// Source URL or path the document came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'a str>,
    /// How the content node was chosen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,
    /// Resource guards that tripped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard_trips: Option<&'a [GuardTrip]>,
}

/// Configuration for JSON output
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Include the source field
    pub include_source: bool,
    /// Include selection strategy and guard trips
    pub include_diagnostics: bool,
    /// Pretty print JSON output
    pub pretty: bool,
}

/// Convert an extraction to JSON
pub fn convert_to_json(extraction: &Extraction, source: &str, config: &JsonConfig) -> Result<String> {
    let output = JsonOutput {
        title: &extraction.result.title,
        content: &extraction.result.content,
        source: if config.include_source && !source.is_empty() { Some(source) } else { None },
        selection: if config.include_diagnostics { extraction.selection } else { None },
        guard_trips: if config.include_diagnostics { Some(extraction.guard_trips.as_slice()) } else { None },
    };

    if config.pretty { Ok(serde_json::to_string_pretty(&output)?) } else { Ok(serde_json::to_string(&output)?) }
}
