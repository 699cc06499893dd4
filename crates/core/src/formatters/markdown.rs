//! Markdown serialization of a content subtree.
//!
//! The serializer walks the tree in document order. Block-level children are
//! rendered as separate blocks joined by exactly one blank line; runs of
//! inline children between them become paragraphs.
//!
//! | Element | Markdown |
//! |---|---|
//! | `h1`..`h6` | `#`×n, a space, the inline content |
//! | `p`, generic blocks | inline content |
//! | `a href=U` with text T | `[T](U)`, relative U joined with the base URL |
//! | `b`/`strong`, `i`/`em` | `**text**`, `*text*` |
//! | `code` | `` `text` `` |
//! | `pre` | fenced block, text copied byte-for-byte |
//! | `li` at depth d | `- ` or `N. `, indented 2×d spaces |
//! | `img` | `![alt](src)` |
//! | `blockquote`, `hr`, simple `table` | `> `, `---`, GFM pipe table |
//!
//! # Example
//!
//! ```rust
//! use readmark_core::formatters::markdown::{MarkdownConfig, convert_to_markdown};
//! use readmark_core::{DomTree, ParseLimits};
//!
//! let tree = DomTree::parse("<h2>Setup</h2><p>Run <code>make</code>.</p>", &ParseLimits::default()).unwrap();
//! let markdown = convert_to_markdown(&tree, tree.body().unwrap(), None, &MarkdownConfig::default());
//! assert_eq!(markdown, "## Setup\n\nRun `make`.");
//! ```

use serde::Deserialize;
use url::Url;

use crate::dom_tree::{DomTree, ElementKind, NodeData, NodeId};
use crate::url_utils::resolve_link;

/// CommonMark allows at most nine digits in an ordered list marker
const MAX_LIST_NUMBER: u64 = 999_999_999;

/// Configuration for Markdown conversion
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    /// Strip images from output
    pub strip_images: bool,
    /// Render links as their text only
    pub strip_links: bool,
    /// Append a reference table of every link
    pub include_references: bool,
}

/// A collected link reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReference {
    /// The link text
    pub text: String,
    /// The resolved link URL
    pub url: String,
}

/// Whitespace as HTML defines it; other Unicode spaces are content
fn is_html_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

fn trim_html(text: &str) -> &str {
    text.trim_matches(is_html_whitespace)
}

/// Push a single separating space unless one is already there
fn push_space(out: &mut String) {
    if !out.ends_with([' ', '\n']) {
        out.push(' ');
    }
}

/// Append a text run, collapsing whitespace and escaping Markdown syntax
fn push_text(out: &mut String, text: &str) {
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if is_html_whitespace(c) {
            push_space(out);
            continue;
        }

        let next = chars.peek().copied();
        let escape = match c {
            '\\' | '`' | '*' | '[' | ']' => true,
            '_' => {
                let intraword = out.chars().next_back().is_some_and(char::is_alphanumeric)
                    && next.is_some_and(char::is_alphanumeric);
                !intraword
            }
            '<' => next.is_some_and(|n| n.is_ascii_alphabetic() || matches!(n, '/' | '!' | '?')),
            _ => false,
        };

        if escape {
            out.push('\\');
        }
        out.push(c);
    }
}

/// Escape characters that would start a Markdown block construct
fn escape_line_start(line: &str) -> String {
    let digits = line.chars().take_while(char::is_ascii_digit).count();

    let needs_escape = match line.chars().next() {
        Some('#' | '>') => true,
        Some('-' | '+') => line.len() == 1 || line[1..].starts_with(' ') || line.chars().all(|c| c == '-'),
        Some('=') => line.chars().all(|c| c == '='),
        _ => false,
    };

    if needs_escape {
        return format!("\\{line}");
    }

    if (1..=9).contains(&digits) {
        let rest = &line[digits..];
        if let Some(after) = rest.strip_prefix(['.', ')'])
            && (after.is_empty() || after.starts_with(' '))
        {
            return format!("{}\\{}", &line[..digits], rest);
        }
    }

    line.to_string()
}

/// Finish an inline run and push it as a paragraph block.
///
/// Consecutive line breaks leave at most one blank line.
fn push_paragraph(blocks: &mut Vec<String>, run: &str) {
    let mut lines: Vec<String> = Vec::new();
    for line in trim_html(run).split('\n').map(|line| escape_line_start(trim_html(line))) {
        if line.is_empty() && lines.last().is_some_and(String::is_empty) {
            continue;
        }
        lines.push(line);
    }
    let paragraph = lines.join("\n");

    if !paragraph.is_empty() {
        blocks.push(paragraph);
    }
}

/// Length of the longest run of `target` in `text`
fn longest_run(text: &str, target: char) -> usize {
    text.split(|c| c != target).map(str::len).max().unwrap_or(0)
}

/// Append inline code with a fence longer than any backtick run inside it
fn push_code(out: &mut String, code: &str) {
    let code: String = code.chars().map(|c| if is_html_whitespace(c) { ' ' } else { c }).collect();
    if trim_html(&code).is_empty() {
        return;
    }

    let fence = "`".repeat(longest_run(&code, '`') + 1);
    let pad = if code.starts_with('`') || code.ends_with('`') { " " } else { "" };
    out.push_str(&format!("{fence}{pad}{code}{pad}{fence}"));
}

fn quote(text: &str) -> String {
    text.lines()
        .map(|line| if line.is_empty() { ">".to_string() } else { format!("> {line}") })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Tree walker producing Markdown for one subtree
pub struct MarkdownSerializer<'a> {
    tree: &'a DomTree,
    base: Option<&'a Url>,
    config: &'a MarkdownConfig,
    references: Vec<LinkReference>,
    /// Emphasis markers open around the current inline position
    emphasis: Vec<&'static str>,
}

/// Parts of a list item collected while walking its children
#[derive(Default)]
struct ItemParts {
    blocks: Vec<String>,
    nested: Vec<String>,
    run: String,
}

impl<'a> MarkdownSerializer<'a> {
    pub fn new(tree: &'a DomTree, base: Option<&'a Url>, config: &'a MarkdownConfig) -> Self {
        Self { tree, base, config, references: Vec::new(), emphasis: Vec::new() }
    }

    /// Serialize the subtree rooted at `node`
    pub fn serialize(mut self, node: NodeId) -> String {
        let mut blocks = Vec::new();
        self.block(node, &mut blocks);

        if self.config.include_references && !self.references.is_empty() {
            blocks.push(format!("## References\n\n{}", generate_reference_table(&self.references)));
        }

        blocks.join("\n\n")
    }

    fn block(&mut self, id: NodeId, out: &mut Vec<String>) {
        let Some(node) = self.tree.get_node(id) else { return };
        let kind = match &node.data {
            NodeData::Element(element) => element.kind,
            NodeData::Document => return self.children_blocks(id, out),
            NodeData::Text(_) => {
                let mut run = String::new();
                self.inline_node(id, &mut run);
                return push_paragraph(out, &run);
            }
        };

        match kind {
            ElementKind::Heading(level) => {
                let mut run = String::new();
                self.inline_children(id, &mut run);
                let text = trim_html(&run).replace('\n', " ");
                if !text.is_empty() {
                    out.push(format!("{} {}", "#".repeat(level as usize), text));
                }
            }
            ElementKind::Paragraph | ElementKind::Title => self.children_blocks(id, out),
            ElementKind::Pre => out.extend(self.code_block(id)),
            ElementKind::Blockquote => {
                let mut inner = Vec::new();
                self.children_blocks(id, &mut inner);
                if !inner.is_empty() {
                    out.push(quote(&inner.join("\n\n")));
                }
            }
            ElementKind::UnorderedList | ElementKind::OrderedList => {
                let list = self.list(id, 0);
                if !list.is_empty() {
                    out.push(list);
                }
            }
            ElementKind::Table => self.table(id, out),
            ElementKind::Rule => out.push("---".to_string()),
            ElementKind::Html
            | ElementKind::Head
            | ElementKind::Body
            | ElementKind::Nav
            | ElementKind::Header
            | ElementKind::Footer
            | ElementKind::Aside
            | ElementKind::Form
            | ElementKind::Article
            | ElementKind::Section
            | ElementKind::Main
            | ElementKind::Div
            | ElementKind::ListItem
            | ElementKind::TableSection
            | ElementKind::TableRow
            | ElementKind::TableCell
            | ElementKind::Block => self.children_blocks(id, out),
            ElementKind::Meta
            | ElementKind::Script
            | ElementKind::Style
            | ElementKind::Noscript
            | ElementKind::Template
            | ElementKind::Frame
            | ElementKind::Graphic => {}
            ElementKind::Link
            | ElementKind::Bold
            | ElementKind::Italic
            | ElementKind::Code
            | ElementKind::Image
            | ElementKind::LineBreak
            | ElementKind::Inline => {
                if self.wraps_blocks(id) {
                    return self.children_blocks(id, out);
                }
                let mut run = String::new();
                self.inline_node(id, &mut run);
                push_paragraph(out, &run);
            }
        }
    }

    /// Whether an inline element holds block content, as in `<span><pre>` or a custom-element wrapper
    fn wraps_blocks(&self, id: NodeId) -> bool {
        let tree = self.tree;
        matches!(
            tree.kind(id),
            Some(ElementKind::Inline | ElementKind::Link | ElementKind::Bold | ElementKind::Italic | ElementKind::Code)
        ) && tree.descendants(id).skip(1).any(|node| tree.kind(node).is_some_and(ElementKind::is_block))
    }

    /// Render children as blocks, grouping inline runs into paragraphs
    fn children_blocks(&mut self, id: NodeId, out: &mut Vec<String>) {
        let mut run = String::new();
        self.flow(id, out, &mut run);
        push_paragraph(out, &run);
    }

    /// Walk children into `out`, descending through inline wrappers that hold blocks
    fn flow(&mut self, id: NodeId, out: &mut Vec<String>, run: &mut String) {
        let tree = self.tree;
        for &child in tree.children(id) {
            if tree.kind(child).is_some_and(ElementKind::is_block) {
                push_paragraph(out, &std::mem::take(run));
                self.block(child, out);
            } else if self.wraps_blocks(child) {
                self.flow(child, out, run);
            } else {
                self.inline_node(child, run);
            }
        }
    }

    fn inline_children(&mut self, id: NodeId, out: &mut String) {
        let tree = self.tree;
        for &child in tree.children(id) {
            self.inline_node(child, out);
        }
    }

    fn inline_node(&mut self, id: NodeId, out: &mut String) {
        let Some(node) = self.tree.get_node(id) else { return };
        let kind = match &node.data {
            NodeData::Text(text) => return push_text(out, text),
            NodeData::Document => return self.inline_children(id, out),
            NodeData::Element(element) => element.kind,
        };

        match kind {
            ElementKind::Link => self.link(id, out),
            ElementKind::Bold => self.emphasis(id, "**", out),
            ElementKind::Italic => self.emphasis(id, "*", out),
            ElementKind::Code => push_code(out, &self.tree.text_content(id)),
            ElementKind::Image => self.image(id, out),
            ElementKind::LineBreak => {
                out.truncate(out.trim_end_matches(' ').len());
                out.push('\n');
            }
            ElementKind::Inline => self.inline_children(id, out),
            ElementKind::Meta
            | ElementKind::Script
            | ElementKind::Style
            | ElementKind::Noscript
            | ElementKind::Template
            | ElementKind::Frame
            | ElementKind::Graphic => {}
            // block content reached from an inline context is flattened
            ElementKind::Html
            | ElementKind::Head
            | ElementKind::Body
            | ElementKind::Title
            | ElementKind::Nav
            | ElementKind::Header
            | ElementKind::Footer
            | ElementKind::Aside
            | ElementKind::Form
            | ElementKind::Article
            | ElementKind::Section
            | ElementKind::Main
            | ElementKind::Div
            | ElementKind::Paragraph
            | ElementKind::Blockquote
            | ElementKind::Pre
            | ElementKind::Heading(_)
            | ElementKind::UnorderedList
            | ElementKind::OrderedList
            | ElementKind::ListItem
            | ElementKind::Table
            | ElementKind::TableSection
            | ElementKind::TableRow
            | ElementKind::TableCell
            | ElementKind::Rule
            | ElementKind::Block => {
                push_space(out);
                self.inline_children(id, out);
                push_space(out);
            }
        }
    }

    /// Wrap rendered inline content, keeping edge whitespace outside the markers
    fn wrap_inline(out: &mut String, inner: &str, render: impl FnOnce(&str) -> String) {
        let core = trim_html(inner);
        if core.is_empty() {
            if !inner.is_empty() {
                push_space(out);
            }
            return;
        }

        if inner.starts_with(is_html_whitespace) {
            push_space(out);
        }
        out.push_str(&render(core));
        if inner.ends_with(is_html_whitespace) {
            push_space(out);
        }
    }

    fn emphasis(&mut self, id: NodeId, marker: &'static str, out: &mut String) {
        if self.emphasis.contains(&marker) {
            return self.inline_children(id, out);
        }

        let mut inner = String::new();
        self.emphasis.push(marker);
        self.inline_children(id, &mut inner);
        self.emphasis.pop();
        Self::wrap_inline(out, &inner, |core| format!("{marker}{core}{marker}"));
    }

    fn link(&mut self, id: NodeId, out: &mut String) {
        let mut inner = String::new();
        self.inline_children(id, &mut inner);

        let destination = if self.config.strip_links {
            None
        } else {
            self.tree.attr(id, "href").and_then(|href| resolve_link(href, self.base))
        };

        let Some(url) = destination else {
            return Self::wrap_inline(out, &inner, str::to_string);
        };

        if self.config.include_references && !self.references.iter().any(|reference| reference.url == url) {
            let text = self.tree.text_content(id).split_whitespace().collect::<Vec<_>>().join(" ");
            if !text.is_empty() {
                self.references.push(LinkReference { text, url: url.clone() });
            }
        }

        Self::wrap_inline(out, &inner, |core| format!("[{core}]({url})"));
    }

    fn image(&self, id: NodeId, out: &mut String) {
        if self.config.strip_images {
            return;
        }

        let Some(src) = self
            .tree
            .attr(id, "src")
            .map(str::trim)
            .filter(|src| !src.starts_with("data:"))
            .and_then(|src| resolve_link(src, self.base))
        else {
            return;
        };

        let mut alt = String::new();
        push_text(&mut alt, self.tree.attr(id, "alt").unwrap_or_default());
        out.push_str(&format!("![{}]({src})", trim_html(&alt)));
    }

    /// Raw text of a preformatted subtree, with `br` as a line break
    fn raw_text(&self, id: NodeId) -> String {
        let mut text = String::new();
        for node in self.tree.descendants(id) {
            if let Some(chunk) = self.tree.text(node) {
                text.push_str(chunk);
            } else if self.tree.kind(node) == Some(ElementKind::LineBreak) {
                text.push('\n');
            }
        }
        text
    }

    fn code_block(&self, id: NodeId) -> Option<String> {
        let code = self.raw_text(id);
        if code.trim().is_empty() {
            return None;
        }

        let language = std::iter::once(id)
            .chain(self.tree.find_first(id, ElementKind::Code))
            .filter_map(|node| self.tree.attr(node, "class"))
            .flat_map(str::split_whitespace)
            .find_map(|class| class.strip_prefix("language-").or_else(|| class.strip_prefix("lang-")))
            .unwrap_or_default();

        let fence = "`".repeat(longest_run(&code, '`').max(2) + 1);
        let newline = if code.ends_with('\n') { "" } else { "\n" };
        Some(format!("{fence}{language}\n{code}{newline}{fence}"))
    }

    fn list(&mut self, id: NodeId, depth: usize) -> String {
        let tree = self.tree;
        let ordered = tree.kind(id) == Some(ElementKind::OrderedList);
        let mut number = tree
            .attr(id, "start")
            .and_then(|start| start.trim().parse::<u64>().ok())
            .map_or(1, |start| start.min(MAX_LIST_NUMBER));
        let indent = "  ".repeat(depth);
        let mut lines = Vec::new();

        for &child in tree.children(id) {
            match tree.kind(child) {
                Some(ElementKind::UnorderedList | ElementKind::OrderedList) => {
                    let nested = self.list(child, depth + 1);
                    if !nested.is_empty() {
                        lines.push(nested);
                    }
                    continue;
                }
                None if tree.text(child).is_none_or(|text| trim_html(text).is_empty()) => continue,
                _ => {}
            }

            let (content, nested) = self.list_item(child, depth);
            if content.is_empty() && nested.is_empty() {
                continue;
            }

            let marker = if ordered { format!("{number}. ") } else { "- ".to_string() };
            let continuation = " ".repeat(marker.len());
            let mut content_lines = content.lines();
            lines.push(format!("{indent}{marker}{}", content_lines.next().unwrap_or_default()));
            for line in content_lines {
                lines.push(if line.is_empty() { String::new() } else { format!("{indent}{continuation}{line}") });
            }
            lines.extend(nested);
            number = (number + 1).min(MAX_LIST_NUMBER);
        }

        lines.join("\n")
    }

    /// Content of one list item and the nested lists it holds
    fn list_item(&mut self, id: NodeId, depth: usize) -> (String, Vec<String>) {
        let mut parts = ItemParts::default();
        if self.tree.kind(id) == Some(ElementKind::ListItem) {
            self.item_flow(id, depth, &mut parts);
        } else {
            self.item_child(id, depth, &mut parts);
        }
        push_paragraph(&mut parts.blocks, &parts.run);

        (parts.blocks.join("\n"), parts.nested)
    }

    fn item_flow(&mut self, id: NodeId, depth: usize, parts: &mut ItemParts) {
        let tree = self.tree;
        for &child in tree.children(id) {
            self.item_child(child, depth, parts);
        }
    }

    fn item_child(&mut self, child: NodeId, depth: usize, parts: &mut ItemParts) {
        match self.tree.kind(child) {
            Some(ElementKind::UnorderedList | ElementKind::OrderedList) => {
                push_paragraph(&mut parts.blocks, &std::mem::take(&mut parts.run));
                let list = self.list(child, depth + 1);
                if !list.is_empty() {
                    parts.nested.push(list);
                }
            }
            Some(kind) if kind.is_block() => {
                push_paragraph(&mut parts.blocks, &std::mem::take(&mut parts.run));
                self.block(child, &mut parts.blocks);
            }
            _ if self.wraps_blocks(child) => self.item_flow(child, depth, parts),
            _ => self.inline_node(child, &mut parts.run),
        }
    }

    fn cell_text(&mut self, id: NodeId) -> String {
        let mut run = String::new();
        self.inline_children(id, &mut run);
        trim_html(&run).replace('\n', " ").replace('|', "\\|")
    }

    /// Render a data table as a GFM pipe table; layout tables render as blocks
    fn table(&mut self, id: NodeId, out: &mut Vec<String>) {
        let tree = self.tree;
        let rows: Vec<Vec<NodeId>> = tree
            .descendants(id)
            .filter(|&node| tree.kind(node) == Some(ElementKind::TableRow))
            .filter(|&row| tree.ancestors(row).find(|&a| tree.kind(a) == Some(ElementKind::Table)) == Some(id))
            .map(|row| {
                tree.children(row).iter().copied().filter(|&c| tree.kind(c) == Some(ElementKind::TableCell)).collect()
            })
            .collect();

        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let has_blocks = rows
            .iter()
            .flatten()
            .any(|&cell| tree.descendants(cell).skip(1).any(|node| tree.kind(node).is_some_and(ElementKind::is_block)));

        if columns < 2 || has_blocks {
            return self.children_blocks(id, out);
        }

        let mut lines = Vec::new();
        for (index, row) in rows.iter().enumerate() {
            let mut cells: Vec<String> = row.iter().map(|&cell| self.cell_text(cell)).collect();
            cells.resize(columns, String::new());
            lines.push(format!("| {} |", cells.join(" | ")));
            if index == 0 {
                lines.push(format!("|{}", " --- |".repeat(columns)));
            }
        }
        out.push(lines.join("\n"));
    }
}

/// Convert a subtree to Markdown
pub fn convert_to_markdown(tree: &DomTree, node: NodeId, base: Option<&Url>, config: &MarkdownConfig) -> String {
    MarkdownSerializer::new(tree, base, config).serialize(node)
}

/// Generate a reference table from collected links
fn generate_reference_table(links: &[LinkReference]) -> String {
    let mut lines = vec!["| # | Text | URL |".to_string(), "|---|------|-----|".to_string()];
    for (i, link) in links.iter().enumerate() {
        lines.push(format!("| {} | {} | {} |", i + 1, escape_pipe(&link.text), escape_pipe(&link.url)));
    }
    lines.join("\n")
}

/// Escape pipe characters for Markdown tables
fn escape_pipe(s: &str) -> String {
    s.replace('|', "\\|")
}

/// Generate TOML frontmatter for an extracted document
pub fn generate_frontmatter(title: &str, source: &str) -> String {
    let mut frontmatter = String::from("+++");

    if !title.is_empty() {
        frontmatter.push_str(&format!("\ntitle = {}", toml_escape_string(title)));
    }
    if !source.is_empty() {
        frontmatter.push_str(&format!("\nsource = {}", toml_escape_string(source)));
    }

    frontmatter.push_str("\n+++\n");
    frontmatter
}

/// Quote a string as a TOML basic string
fn toml_escape_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len() + 2);
    escaped.push('"');
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if c.is_control() => escaped.push_str(&format!("\\u{:04X}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped.push('"');
    escaped
}
