//! Structural noise removal.
//!
//! Drops every subtree whose element kind can never carry primary content
//! (scripts, styles, navigation, page headers and footers, asides, forms,
//! embedded frames, `noscript` fallbacks) along with elements the page hides
//! from readers. Runs before scoring, over the whole document.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::dom_tree::{DomTree, ElementKind, NodeId};

static HIDDEN_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(display\s*:\s*none|visibility\s*:\s*hidden)").expect("valid hidden-style regex")
});

/// Whether the element is marked hidden via the `hidden` attribute or an inline style.
///
/// Page-level containers are never treated as hidden, since anti-flicker
/// snippets hide `body` until their scripts run.
fn is_hidden(tree: &DomTree, id: NodeId) -> bool {
    if matches!(tree.kind(id), Some(ElementKind::Html | ElementKind::Body | ElementKind::Main)) {
        return false;
    }
    tree.attr(id, "hidden").is_some() || tree.attr(id, "style").is_some_and(|style| HIDDEN_STYLE.is_match(style))
}

/// Remove structural noise anywhere under the document root.
///
/// Returns the number of subtrees removed. Applying it twice removes nothing
/// the second time.
pub fn strip_structural(tree: &mut DomTree) -> usize {
    let mut doomed = Vec::new();
    let mut stack = vec![tree.root()];

    while let Some(id) = stack.pop() {
        if let Some(kind) = tree.kind(id)
            && (kind.is_structural_noise() || is_hidden(tree, id))
        {
            doomed.push(id);
            continue;
        }
        stack.extend(tree.children(id).iter().rev());
    }

    for &id in &doomed {
        tree.detach(id);
    }

    debug!(removed = doomed.len(), "stripped structural noise");
    doomed.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseLimits;

    fn parse(html: &str) -> DomTree {
        DomTree::parse(html, &ParseLimits::default()).unwrap()
    }

    #[test]
    fn test_remove_unwanted_tags() {
        let html = r#"
            <html>
                <head><script>alert('test');</script><style>body{color:red;}</style></head>
                <body>
                    <noscript>Enable JavaScript</noscript>
                    <iframe src="https://example.com"></iframe>
                    <svg><rect width="100" height="100"/></svg>
                    <nav>Home | About</nav>
                    <header>Site header</header>
                    <form><input name="q"> Search</form>
                    <p>Content</p>
                    <aside>Related reading</aside>
                    <footer>Copyright</footer>
                </body>
            </html>
        "#;

        let mut tree = parse(html);
        let removed = strip_structural(&mut tree);
        let text = tree.text_content(tree.root());

        assert_eq!(removed, 10);
        assert!(text.contains("Content"));
        for noise in [
            "alert", "color:red", "Enable JavaScript", "Home", "Site header", "Search", "Related", "Copyright",
        ] {
            assert!(!text.contains(noise), "{noise} should be removed");
        }
        assert!(tree.find_first(tree.root(), ElementKind::Frame).is_none());
        assert!(tree.find_first(tree.root(), ElementKind::Graphic).is_none());
    }

    #[test]
    fn test_remove_hidden_elements() {
        let html = r#"
            <div style="display:none">Hidden content</div>
            <div style="visibility: hidden">Invisible content</div>
            <div hidden>Attribute hidden</div>
            <div>Visible content</div>
        "#;

        let mut tree = parse(html);
        strip_structural(&mut tree);
        let text = tree.text_content(tree.root());

        assert!(!text.contains("Hidden content"));
        assert!(!text.contains("Invisible content"));
        assert!(!text.contains("Attribute hidden"));
        assert!(text.contains("Visible content"));
    }

    #[test]
    fn test_hidden_page_containers_kept() {
        let html = r#"<html style="display:none"><body style="visibility:hidden">
            <main hidden><article><h1>Real</h1><p>Real article text, with commas, here.</p>
            <div style="display: none">Tracking pixel</div></article></main></body></html>"#;

        let mut tree = parse(html);
        assert_eq!(strip_structural(&mut tree), 1);
        let text = tree.text_content(tree.root());

        assert!(text.contains("Real article text"));
        assert!(!text.contains("Tracking pixel"));
    }

    #[test]
    fn test_nested_noise_removed_once() {
        let mut tree = parse("<footer><nav><a href='/'>Home</a></nav></footer><p>Body</p>");
        assert_eq!(strip_structural(&mut tree), 1);
        assert_eq!(tree.text_content(tree.root()), "Body");
    }

    #[test]
    fn test_idempotent() {
        let mut tree = parse("<article><script>x()</script><p>Text</p><aside>Side</aside></article>");
        strip_structural(&mut tree);
        let once = tree.text_content(tree.root());

        assert_eq!(strip_structural(&mut tree), 0);
        assert_eq!(tree.text_content(tree.root()), once);
    }
}
