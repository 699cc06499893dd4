//! Main content extraction API.
//!
//! [`Extractor`] composes the pipeline stages in order: build the tree,
//! strip structural noise, select the main content, prune low-value
//! containers, resolve the title, then serialize to Markdown. The free
//! function [`extract`] runs it with default settings.
//!
//! Extraction is pure and total. Any string input yields a result, and
//! empty or whitespace-only input yields an empty title and content.
//!
//! # Example
//!
//! ```rust
//! use readmark_core::extract;
//!
//! let html = "<article><h1>How to Build a RAG System</h1>\
//!             <p>Building a RAG system involves a few steps, in order.</p></article>";
//! let result = extract(html, "https://example.com/blog/rag-system");
//! assert_eq!(result.title, "How to Build a RAG System");
//! assert!(result.content.starts_with("# How to Build a RAG System"));
//! ```

use tracing::debug;

use crate::config::ExtractConfig;
use crate::dom_tree::DomTree;
use crate::formatters::markdown::convert_to_markdown;
use crate::metadata::resolve_title;
use crate::postprocess::prune_low_value;
use crate::preprocess::strip_structural;
use crate::result::{Extraction, ExtractionResult};
use crate::scoring::{Selection, select_main_content};
use crate::url_utils::parse_base_url;

/// Aggregate score a candidate needs before a page counts as readable
const READABLE_SCORE: f64 = 20.0;

/// Reusable extraction pipeline with a fixed configuration.
///
/// # Example
///
/// ```rust
/// use readmark_core::{ExtractConfig, Extractor};
///
/// let extractor = Extractor::with_config(ExtractConfig::builder().strip_images(true).build());
/// let result = extractor.extract("<p>Text <img src=\"a.png\" alt=\"a\"></p>", "");
/// assert_eq!(result.content, "Text");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractConfig,
}

impl Extractor {
    /// Creates an extractor with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an extractor with a custom configuration.
    pub fn with_config(config: ExtractConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Extract the title and Markdown content of a document.
    ///
    /// `source_url` is used only to resolve relative links and as a last
    /// resort for the title. It may be a file path, or empty.
    pub fn extract(&self, html: &str, source_url: &str) -> ExtractionResult {
        self.run(html, source_url).result
    }

    /// Run the pipeline and keep its diagnostics.
    pub fn run(&self, html: &str, source_url: &str) -> Extraction {
        let Some(mut tree) = DomTree::parse(html, &self.config.limits) else {
            debug!("empty input, nothing to extract");
            return Extraction { result: ExtractionResult::default(), selection: None, guard_trips: Vec::new() };
        };

        strip_structural(&mut tree);

        let selection = select_main_content(&tree, &self.config.scoring);
        let node = selection.node();
        prune_low_value(&mut tree, node, &self.config.prune);

        let title = resolve_title(&tree, node, source_url, &self.config.title);

        let base = match parse_base_url(source_url) {
            Ok(base) => Some(base),
            Err(err) => {
                debug!(%err, "relative links left unresolved");
                None
            }
        };
        let content = convert_to_markdown(&tree, node, base.as_ref(), &self.config.markdown);

        debug!(?selection, title_chars = title.chars().count(), content_bytes = content.len(), "extraction finished");

        Extraction {
            result: ExtractionResult { title, content },
            selection: Some(selection),
            guard_trips: tree.guard_trips().to_vec(),
        }
    }

    /// Checks if a page appears to have readable main content.
    ///
    /// A quick heuristic that runs parsing and scoring only: the page counts
    /// as readable when some candidate's aggregate score reaches 20.
    ///
    /// # Example
    ///
    /// ```rust
    /// use readmark_core::Extractor;
    ///
    /// let reader = Extractor::new();
    /// let html_nav = "<html><body><nav><a href=\"#\">Link</a></nav></body></html>";
    /// assert!(!reader.is_probably_readable(html_nav));
    /// ```
    pub fn is_probably_readable(&self, html: &str) -> bool {
        let Some(mut tree) = DomTree::parse(html, &self.config.limits) else {
            return false;
        };
        strip_structural(&mut tree);

        let selection = select_main_content(&tree, &self.config.scoring);
        matches!(selection, Selection::Candidate { score, .. } if score >= READABLE_SCORE)
    }
}

/// Extract with default settings.
///
/// Never fails: malformed markup yields a best-effort result and empty input
/// yields an empty one.
pub fn extract(html: &str, source_url: &str) -> ExtractionResult {
    Extractor::new().extract(html, source_url)
}

/// Extract with a custom configuration.
pub fn extract_with_config(html: &str, source_url: &str, config: &ExtractConfig) -> ExtractionResult {
    Extractor::with_config(config.clone()).extract(html, source_url)
}

/// Convenience function for a quick readability check with defaults.
pub fn is_probably_readable(html: &str) -> bool {
    Extractor::new().is_probably_readable(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom_tree::Guard;

    const RAG_HTML: &str = "<article><h1>How to Build a RAG System</h1><p>Building a RAG system involves...</p>\
        <h2>Step 1: Document Ingestion</h2><p>First, you need to parse and chunk your documents.</p></article>";

    #[test]
    fn test_empty_input() {
        for html in ["", "   ", "\n\t\r\n "] {
            let extraction = Extractor::new().run(html, "https://example.com/page");
            assert_eq!(extraction.result, ExtractionResult::default());
            assert_eq!(extraction.selection, None);
        }
    }

    #[test]
    fn test_rag_scenario() {
        let result = extract(RAG_HTML, "https://example.com/blog/rag-system");
        assert_eq!(result.title, "How to Build a RAG System");
        assert!(result.content.lines().any(|line| line == "## Step 1: Document Ingestion"));
        assert!(result.content.contains("First, you need to parse and chunk your documents."));
    }

    #[test]
    fn test_article_selected_over_body() {
        let extraction = Extractor::new().run(RAG_HTML, "");
        assert!(matches!(extraction.selection, Some(Selection::Candidate { .. })));
    }

    #[test]
    fn test_noise_excluded() {
        let html = r#"
            <nav><a href="/">Home</a> <a href="/about">About us</a></nav>
            <main>
                <p>The substantive paragraph, which has commas, clauses, and real prose.</p>
                <p>A second paragraph, to make the container clearly win.</p>
            </main>
            <aside>Sidebar promo text</aside>
            <footer>Copyright notice</footer>
        "#;
        let result = extract(html, "");

        assert!(result.content.contains("The substantive paragraph"));
        assert!(result.content.contains("A second paragraph"));
        for noise in ["Home", "About us", "Sidebar promo", "Copyright"] {
            assert!(!result.content.contains(noise), "{noise} leaked into content");
        }
    }

    #[test]
    fn test_relative_links_resolved() {
        let html = r#"<p>See <a href="/docs/intro">the intro</a>, then continue.</p>"#;
        let resolved = extract(html, "https://example.com/blog/post").content;
        assert!(resolved.contains("[the intro](https://example.com/docs/intro)"));
        assert!(extract(html, "saved/page.html").content.contains("[the intro](/docs/intro)"));
    }

    #[test]
    fn test_url_title_fallback() {
        assert_eq!(extract("<p>Just text, nothing else.</p>", "https://example.com/page").title, "page");
    }

    #[test]
    fn test_guard_trip_still_produces_result() {
        let html = format!("{}<p>deep</p>{}", "<div>".repeat(40), "</div>".repeat(40));
        let extractor = Extractor::with_config(ExtractConfig::builder().max_depth(8).build());
        let extraction = extractor.run(&html, "");

        assert_eq!(extraction.guard_trips[0].guard, Guard::NestingDepth);
        assert!(extraction.result.content.contains("deep"));
        assert!(extraction.into_strict().is_err());
    }

    #[test]
    fn test_deterministic() {
        let first = extract(RAG_HTML, "https://example.com/x");
        let second = extract(RAG_HTML, "https://example.com/x");
        assert_eq!(first, second);
    }

    #[test]
    fn test_extract_with_config() {
        let config = ExtractConfig::builder().strip_links(true).build();
        let result = extract_with_config(r#"<p><a href="https://example.com">Example</a>, a site.</p>"#, "", &config);
        assert_eq!(result.content, "Example, a site.");
    }

    #[test]
    fn test_is_probably_readable() {
        let paragraph = "<p>This paragraph has commas, clauses, asides, and more, so it reads like prose.</p>";
        let html = format!("<article>{}</article>", paragraph.repeat(4));
        assert!(is_probably_readable(&html));
        assert!(!is_probably_readable("<nav><a href='#'>Link</a></nav>"));
        assert!(!is_probably_readable(""));
    }
}
