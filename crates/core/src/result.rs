//! Extraction output types.
//!
//! [`ExtractionResult`] is the `{title, content}` pair handed to downstream
//! indexing. [`Extraction`] wraps it with diagnostics about how the content
//! was chosen and which resource guards tripped along the way.

use serde::Serialize;
use std::str::FromStr;

use crate::dom_tree::GuardTrip;
use crate::formatters::json::{JsonConfig, convert_to_json};
use crate::formatters::markdown::generate_frontmatter;
use crate::scoring::Selection;
use crate::{ReadmarkError, Result};

/// Output format options for an extraction result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Markdown content, optionally preceded by TOML frontmatter.
    #[default]
    Markdown,
    /// JSON object with title and content.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {}. Valid options: markdown, json", s)),
        }
    }
}

/// The title and Markdown content extracted from one document.
///
/// On empty or whitespace-only input both fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    /// Single-line title without Markdown markup.
    pub title: String,
    /// Main content as Markdown.
    pub content: String,
}

impl ExtractionResult {
    /// Whether both title and content are empty
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.content.is_empty()
    }

    /// Content preceded by TOML frontmatter holding the title and source.
    pub fn to_markdown_document(&self, source: &str) -> String {
        let frontmatter = generate_frontmatter(&self.title, source);
        if self.content.is_empty() { frontmatter } else { format!("{frontmatter}\n{}\n", self.content) }
    }

    /// Gets the result as structured JSON.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Serializes the result as a JSON string.
    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        if pretty { Ok(serde_json::to_string_pretty(self)?) } else { Ok(serde_json::to_string(self)?) }
    }
}

/// An extraction result together with pipeline diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub result: ExtractionResult,
    /// How the content node was chosen; `None` when the input was empty
    pub selection: Option<Selection>,
    /// Resource guards that tripped while the tree was built
    pub guard_trips: Vec<GuardTrip>,
}

impl Extraction {
    /// Fail if a resource guard tripped, otherwise return the result.
    ///
    /// # Errors
    ///
    /// Returns [`ReadmarkError::ResourceGuardTripped`] with the first trip.
    pub fn into_strict(self) -> Result<ExtractionResult> {
        match self.guard_trips.first() {
            Some(&trip) => Err(ReadmarkError::ResourceGuardTripped(trip)),
            None => Ok(self.result),
        }
    }

    /// Render the extraction in the requested format.
    pub fn to_format(&self, format: OutputFormat, source: &str, frontmatter: bool) -> Result<String> {
        match format {
            OutputFormat::Markdown if frontmatter => Ok(self.result.to_markdown_document(source)),
            OutputFormat::Markdown => Ok(self.result.content.clone()),
            OutputFormat::Json => {
                let config = JsonConfig { include_source: frontmatter, include_diagnostics: true, pretty: true };
                convert_to_json(self, source, &config)
            }
        }
    }
}
