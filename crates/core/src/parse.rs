//! Tolerant HTML parsing into a [`DomTree`].
//!
//! Tokenization and tree construction are delegated to `scraper` (html5ever),
//! so malformed markup is repaired the way browsers repair it:
//!
//! - an open `p` closes when another block element starts, `li`/`dt`/`dd`
//!   close on a sibling item, `td`/`th`/`tr` close on the next cell or row
//! - end tags without a matching open element are dropped
//! - content outside `html`/`body` is moved into `body`, a missing `head`
//!   or `body` is synthesized, and character references are decoded
//!
//! The html5ever tree is then copied into the crate's own arena. That copy is
//! where the resource guards apply: oversized input is truncated and elements
//! nested deeper than [`ParseLimits::max_depth`] collapse into one text leaf.
//!
//! # Example
//!
//! ```rust
//! use readmark_core::{DomTree, ParseLimits};
//!
//! let tree = DomTree::parse("<p>Unclosed <b>markup", &ParseLimits::default()).unwrap();
//! assert_eq!(tree.text_content(tree.root()), "Unclosed markup");
//! assert!(DomTree::parse("   ", &ParseLimits::default()).is_none());
//! ```

use scraper::{ElementRef, Html, Node};
use tracing::{debug, warn};

use crate::config::ParseLimits;
use crate::dom_tree::{DomTree, ElementData, ElementKind, Guard, GuardTrip, NodeData};

/// Safely truncate a string to at most `max_len` bytes at a character boundary
fn truncate_at_char_boundary(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }

    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Text of a subtree cut off by the depth cap.
///
/// Structural noise is skipped so script or navigation text never survives as
/// a bare leaf, and block boundaries become a single space.
fn flatten_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    let mut boundary = false;
    // `None` marks the end of a block element
    let mut stack = vec![Some(*element)];

    while let Some(entry) = stack.pop() {
        let Some(node) = entry else {
            boundary = true;
            continue;
        };
        match node.value() {
            Node::Text(chunk) => {
                let chunk: &str = chunk;
                if boundary && !text.ends_with(char::is_whitespace) && !chunk.starts_with(char::is_whitespace) {
                    text.push(' ');
                }
                boundary = false;
                text.push_str(chunk);
            }
            Node::Element(child) => {
                let kind = ElementKind::from_tag(&child.name().to_ascii_lowercase());
                if kind.is_structural_noise() {
                    continue;
                }
                if kind.is_block() {
                    boundary = !text.is_empty();
                    stack.push(None);
                }
                stack.extend(node.children().rev().map(Some));
            }
            _ => {}
        }
    }
    text
}

impl DomTree {
    /// Parse an HTML string into a tree.
    ///
    /// Returns `None` for empty or whitespace-only input. Any other input
    /// yields a best-effort tree; malformed markup never causes a failure.
    pub fn parse(html: &str, limits: &ParseLimits) -> Option<Self> {
        if html.trim().is_empty() {
            return None;
        }

        let mut tree = DomTree::new();
        let input = if html.len() > limits.max_input_bytes {
            tree.record_guard_trip(GuardTrip { guard: Guard::InputSize, limit: limits.max_input_bytes });
            truncate_at_char_boundary(html, limits.max_input_bytes)
        } else {
            html
        };

        let document = Html::parse_document(input);
        let mut stack: Vec<_> = document.tree.root().children().rev().map(|child| (child, tree.root(), 1)).collect();

        while let Some((node, parent, depth)) = stack.pop() {
            match node.value() {
                Node::Text(text) => {
                    let content: &str = text;
                    tree.append(parent, NodeData::Text(content.to_string()));
                }
                Node::Element(element) => {
                    if depth > limits.max_depth {
                        tree.record_guard_trip(GuardTrip { guard: Guard::NestingDepth, limit: limits.max_depth });
                        let flattened = ElementRef::wrap(node).map(flatten_text).unwrap_or_default();
                        if !flattened.is_empty() {
                            tree.append(parent, NodeData::Text(flattened));
                        }
                        continue;
                    }

                    let name = element.name().to_ascii_lowercase();
                    let attrs = element
                        .attrs()
                        .map(|(key, value)| (key.to_ascii_lowercase(), value.to_string()))
                        .collect();
                    let kind = ElementKind::from_tag(&name);
                    let id = tree.append(parent, NodeData::Element(ElementData { kind, name, attrs }));
                    stack.extend(node.children().rev().map(|child| (child, id, depth + 1)));
                }
                _ => {}
            }
        }

        for trip in tree.guard_trips() {
            warn!(%trip, "resource guard tripped while building tree");
        }
        debug!(nodes = tree.len(), input_bytes = input.len(), "built document tree");

        Some(tree)
    }
}
