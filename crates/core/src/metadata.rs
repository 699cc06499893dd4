use serde::Deserialize;
use tracing::debug;

use crate::dom_tree::{DomTree, ElementKind, NodeId};
use crate::url_utils::name_from_source;

/// Configuration for title resolution
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TitleConfig {
    /// Longest heading (in characters) still read as a page title
    pub max_heading_chars: usize,
    /// Whether `og:title` / `twitter:title` are consulted after `<title>`
    pub use_meta_title: bool,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self { max_heading_chars: 150, use_meta_title: true }
    }
}

/// Collapse a title to one line and drop leading Markdown heading markers
pub fn normalize_title(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_start_matches(|c: char| c == '#' || c.is_whitespace()).to_string()
}

fn non_empty(title: String) -> Option<String> {
    if title.is_empty() { None } else { Some(title) }
}

impl DomTree {
    /// Text of the single highest-level heading under `id`.
    ///
    /// Returns `None` when there is no heading, or when several headings
    /// share the highest level present (no one heading dominates).
    pub fn dominant_heading(&self, id: NodeId) -> Option<String> {
        let headings: Vec<(u8, NodeId)> = self
            .descendants(id)
            .filter_map(|node| Some((self.kind(node)?.heading_level()?, node)))
            .collect();

        let top = headings.iter().map(|&(level, _)| level).min()?;
        let mut at_top = headings.iter().filter(|&&(level, _)| level == top);

        match (at_top.next(), at_top.next()) {
            (Some(&(_, node)), None) => Some(self.text_content(node)),
            _ => None,
        }
    }

    /// Text of the document's `<title>` element
    pub fn title_text(&self) -> Option<String> {
        let title = self.find_first(self.root(), ElementKind::Title)?;
        Some(self.text_content(title))
    }

    /// `content` of the first `<meta>` whose `property` or `name` is `key`
    pub fn meta_content(&self, key: &str) -> Option<String> {
        self.descendants(self.root())
            .filter(|&node| self.element(node).is_some_and(|el| el.name == "meta"))
            .find(|&node| {
                ["property", "name"]
                    .iter()
                    .any(|attr| self.attr(node, attr).is_some_and(|value| value.eq_ignore_ascii_case(key)))
            })
            .and_then(|node| self.attr(node, "content"))
            .map(str::to_string)
    }
}

/// Resolve the document title with priority fallback:
/// 1. The single dominant heading of the selected content
/// 2. The `<title>` element
/// 3. Meta `og:title` / `twitter:title`
/// 4. The last path segment of `source_url`
///
/// The tree is only read; a heading used as the title stays in the content.
pub fn resolve_title(tree: &DomTree, selected: NodeId, source_url: &str, config: &TitleConfig) -> String {
    if let Some(heading) = tree.dominant_heading(selected).map(|text| normalize_title(&text))
        && !heading.is_empty()
        && heading.chars().count() <= config.max_heading_chars
    {
        debug!(source = "heading", "resolved title");
        return heading;
    }

    if let Some(title) = tree.title_text().map(|text| normalize_title(&text)).and_then(non_empty) {
        debug!(source = "title element", "resolved title");
        return title;
    }

    if config.use_meta_title {
        for key in ["og:title", "twitter:title"] {
            if let Some(title) = tree.meta_content(key).map(|text| normalize_title(&text)).and_then(non_empty) {
                debug!(source = key, "resolved title");
                return title;
            }
        }
    }

    if let Some(name) = name_from_source(source_url).map(|text| normalize_title(&text)).and_then(non_empty) {
        debug!(source = "source url", "resolved title");
        return name;
    }

    debug!("no title found");
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseLimits;

    fn parse(html: &str) -> DomTree {
        DomTree::parse(html, &ParseLimits::default()).unwrap()
    }

    fn resolve(html: &str, source_url: &str) -> String {
        let tree = parse(html);
        let body = tree.body().unwrap();
        resolve_title(&tree, body, source_url, &TitleConfig::default())
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  ## Getting\n   started  "), "Getting started");
        assert_eq!(normalize_title("#"), "");
        assert_eq!(normalize_title("C# in depth"), "C# in depth");
    }

    #[test]
    fn test_single_h1_wins() {
        let html = "<title>Site | Page</title><article><h1>How to Build a RAG System</h1><h2>Step 1</h2></article>";
        assert_eq!(resolve(html, ""), "How to Build a RAG System");
    }

    #[test]
    fn test_lone_h2_is_dominant() {
        assert_eq!(resolve("<title>Doc</title><h2>Only Section</h2><p>Text</p>", ""), "Only Section");
    }

    #[test]
    fn test_competing_headings_fall_back_to_title() {
        let html = "<title>  Declared\n Title </title><h2>First</h2><h2>Second</h2>";
        assert_eq!(resolve(html, "https://example.com/page"), "Declared Title");
    }

    #[test]
    fn test_long_heading_rejected() {
        let html = format!("<title>Short</title><h1>{}</h1>", "word ".repeat(60));
        assert_eq!(resolve(&html, ""), "Short");
    }

    #[test]
    fn test_heading_outside_selection_ignored() {
        let tree = parse("<title>Declared</title><h1>Site Name</h1><div><p>Body text</p></div>");
        let div = tree.find_first(tree.root(), ElementKind::Div).unwrap();
        assert_eq!(resolve_title(&tree, div, "", &TitleConfig::default()), "Declared");
    }

    #[test]
    fn test_meta_title_fallback() {
        let html = r#"<meta property="og:title" content="Open Graph Title"><p>Text</p>"#;
        assert_eq!(resolve(html, "https://example.com/page"), "Open Graph Title");

        let tree = parse(html);
        let config = TitleConfig { use_meta_title: false, ..Default::default() };
        assert_eq!(resolve_title(&tree, tree.body().unwrap(), "https://example.com/page", &config), "page");
    }

    #[test]
    fn test_url_fallback() {
        assert_eq!(resolve("<p>No title here</p>", "https://example.com/page"), "page");
        assert_eq!(resolve("<p>No title here</p>", "/home/me/notes/weekly-review.html"), "weekly-review");
    }

    #[test]
    fn test_empty_when_nothing_resolves() {
        assert_eq!(resolve("<p>No title here</p>", ""), "");
        assert_eq!(resolve("<title> </title><h1>#</h1>", "https://example.com/"), "");
    }

    #[test]
    fn test_title_never_starts_with_marker() {
        assert_eq!(resolve("<title># Hashed</title><p>x</p>", ""), "Hashed");
        assert_eq!(resolve("<h1>### Marked heading</h1>", ""), "Marked heading");
    }

    #[test]
    fn test_resolution_leaves_tree_untouched() {
        let tree = parse("<article><h1>Title</h1><p>Body</p></article>");
        let before = tree.text_content(tree.root());
        resolve_title(&tree, tree.root(), "", &TitleConfig::default());
        assert_eq!(tree.text_content(tree.root()), before);
    }
}
