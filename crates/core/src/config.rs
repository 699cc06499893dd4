//! Extraction configuration.
//!
//! Every heuristic constant used by the pipeline lives in [`ExtractConfig`]
//! so it can be tuned without touching algorithm code. Configurations can be
//! built in code with [`ExtractConfig::builder`] or loaded from a partial TOML
//! document where missing keys keep their defaults.
//!
//! # Example
//!
//! ```rust
//! use readmark_core::ExtractConfig;
//!
//! let config = ExtractConfig::builder().max_depth(256).max_link_density(0.7).strip_images(true).build();
//! assert_eq!(config.limits.max_depth, 256);
//!
//! let config = ExtractConfig::from_toml_str("[prune]\nmax_link_density = 0.9\n").unwrap();
//! assert_eq!(config.prune.max_link_density, 0.9);
//! assert_eq!(config.limits.max_depth, 512);
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::formatters::markdown::MarkdownConfig;
use crate::metadata::TitleConfig;
use crate::postprocess::PruneConfig;
use crate::scoring::ScoreConfig;
use crate::{ReadmarkError, Result};

/// Resource caps applied while building the tree
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseLimits {
    /// Input beyond this many bytes is dropped (default: 8 MiB)
    pub max_input_bytes: usize,
    /// Elements nested deeper than this become flat text (default: 512)
    pub max_depth: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self { max_input_bytes: 8 * 1024 * 1024, max_depth: 512 }
    }
}

/// Configuration for the whole extraction pipeline
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractConfig {
    pub limits: ParseLimits,
    pub scoring: ScoreConfig,
    pub prune: PruneConfig,
    pub title: TitleConfig,
    pub markdown: MarkdownConfig,
}

impl ExtractConfig {
    /// Creates a new builder for ExtractConfig.
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder::new()
    }

    /// Parse a (possibly partial) TOML configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ReadmarkError::ConfigError`] for malformed TOML or unknown keys.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ReadmarkError::FileNotFound`] if the path does not exist, and
    /// [`ReadmarkError::ConfigError`] if its contents are invalid.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ReadmarkError::FileNotFound(path.to_path_buf()));
        }
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

/// Builder for ExtractConfig.
///
/// Provides a fluent API over the most commonly tuned settings.
pub struct ExtractConfigBuilder {
    config: ExtractConfig,
}

impl ExtractConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ExtractConfig::default() }
    }

    /// Sets the input size cap in bytes.
    pub fn max_input_bytes(mut self, value: usize) -> Self {
        self.config.limits.max_input_bytes = value;
        self
    }

    /// Sets the nesting depth cap.
    pub fn max_depth(mut self, value: usize) -> Self {
        self.config.limits.max_depth = value;
        self
    }

    /// Sets the weight added or subtracted per class/id keyword match.
    pub fn keyword_weight(mut self, value: f64) -> Self {
        self.config.scoring.keyword_weight = value;
        self
    }

    /// Sets the fractions of a candidate's score handed to its ancestors.
    pub fn propagation(mut self, fractions: Vec<f64>) -> Self {
        self.config.scoring.propagation = fractions;
        self
    }

    /// Sets the score a candidate must exceed to be selected.
    pub fn min_score(mut self, value: f64) -> Self {
        self.config.scoring.min_score = value;
        self
    }

    /// Sets the link density above which link-only blocks are pruned.
    pub fn max_link_density(mut self, value: f64) -> Self {
        self.config.prune.max_link_density = value;
        self
    }

    /// Sets the longest heading accepted as a page title.
    pub fn max_title_chars(mut self, value: usize) -> Self {
        self.config.title.max_heading_chars = value;
        self
    }

    /// Sets whether images are dropped from the Markdown output.
    pub fn strip_images(mut self, value: bool) -> Self {
        self.config.markdown.strip_images = value;
        self
    }

    /// Sets whether links are rendered as plain text.
    pub fn strip_links(mut self, value: bool) -> Self {
        self.config.markdown.strip_links = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> ExtractConfig {
        self.config
    }
}

impl Default for ExtractConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
