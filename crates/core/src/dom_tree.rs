//! Arena-backed element tree.
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`]. A node's
//! `parent` is a lookup relation only; ownership always flows from parent to
//! children. Removing a subtree detaches it from its parent, after which no
//! traversal starting at the root can reach it.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Index of a node inside a [`DomTree`].
pub type NodeId = usize;

/// Closed set of element kinds the pipeline distinguishes.
///
/// Tags that need no special treatment map to [`ElementKind::Block`] or
/// [`ElementKind::Inline`], so every consumer can match exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Html,
    Head,
    Body,
    Title,
    /// `meta`, `link` and `base`
    Meta,
    Script,
    Style,
    Noscript,
    Template,
    Nav,
    Header,
    Footer,
    Aside,
    Form,
    /// `iframe`, `frame`, `frameset`, `object` and `embed`
    Frame,
    /// `svg` and `canvas`
    Graphic,
    Article,
    Section,
    Main,
    Div,
    Paragraph,
    Blockquote,
    Pre,
    Heading(u8),
    UnorderedList,
    OrderedList,
    ListItem,
    Table,
    /// `thead`, `tbody` and `tfoot`
    TableSection,
    TableRow,
    /// `td` and `th`
    TableCell,
    Rule,
    Link,
    Bold,
    Italic,
    Code,
    Image,
    LineBreak,
    /// Any other block-level tag.
    Block,
    /// Any other tag, rendered as its inline content.
    Inline,
}

impl ElementKind {
    /// Classify a lowercase tag name.
    pub fn from_tag(name: &str) -> Self {
        match name {
            "html" => Self::Html,
            "head" => Self::Head,
            "body" => Self::Body,
            "title" => Self::Title,
            "meta" | "link" | "base" => Self::Meta,
            "script" => Self::Script,
            "style" => Self::Style,
            "noscript" => Self::Noscript,
            "template" => Self::Template,
            "nav" => Self::Nav,
            "header" => Self::Header,
            "footer" => Self::Footer,
            "aside" => Self::Aside,
            "form" => Self::Form,
            "iframe" | "frame" | "frameset" | "object" | "embed" => Self::Frame,
            "svg" | "canvas" => Self::Graphic,
            "article" => Self::Article,
            "section" => Self::Section,
            "main" => Self::Main,
            "div" => Self::Div,
            "p" => Self::Paragraph,
            "blockquote" => Self::Blockquote,
            "pre" => Self::Pre,
            "h1" => Self::Heading(1),
            "h2" => Self::Heading(2),
            "h3" => Self::Heading(3),
            "h4" => Self::Heading(4),
            "h5" => Self::Heading(5),
            "h6" => Self::Heading(6),
            "ul" | "menu" => Self::UnorderedList,
            "ol" => Self::OrderedList,
            "li" => Self::ListItem,
            "table" => Self::Table,
            "thead" | "tbody" | "tfoot" => Self::TableSection,
            "tr" => Self::TableRow,
            "td" | "th" => Self::TableCell,
            "hr" => Self::Rule,
            "a" => Self::Link,
            "b" | "strong" => Self::Bold,
            "i" | "em" => Self::Italic,
            "code" | "kbd" | "samp" | "tt" => Self::Code,
            "img" => Self::Image,
            "br" => Self::LineBreak,
            "address" | "caption" | "center" | "dd" | "details" | "dl" | "dt" | "fieldset" | "figcaption"
            | "figure" | "hgroup" | "summary" => Self::Block,
            _ => Self::Inline,
        }
    }

    /// Kinds removed together with their subtree before scoring.
    pub fn is_structural_noise(self) -> bool {
        match self {
            Self::Script
            | Self::Style
            | Self::Noscript
            | Self::Template
            | Self::Nav
            | Self::Header
            | Self::Footer
            | Self::Aside
            | Self::Form
            | Self::Frame
            | Self::Graphic => true,
            Self::Html
            | Self::Head
            | Self::Body
            | Self::Title
            | Self::Meta
            | Self::Article
            | Self::Section
            | Self::Main
            | Self::Div
            | Self::Paragraph
            | Self::Blockquote
            | Self::Pre
            | Self::Heading(_)
            | Self::UnorderedList
            | Self::OrderedList
            | Self::ListItem
            | Self::Table
            | Self::TableSection
            | Self::TableRow
            | Self::TableCell
            | Self::Rule
            | Self::Link
            | Self::Bold
            | Self::Italic
            | Self::Code
            | Self::Image
            | Self::LineBreak
            | Self::Block
            | Self::Inline => false,
        }
    }

    /// Whether the kind starts a new block when serialized.
    pub fn is_block(self) -> bool {
        match self {
            Self::Html
            | Self::Head
            | Self::Body
            | Self::Title
            | Self::Nav
            | Self::Header
            | Self::Footer
            | Self::Aside
            | Self::Form
            | Self::Article
            | Self::Section
            | Self::Main
            | Self::Div
            | Self::Paragraph
            | Self::Blockquote
            | Self::Pre
            | Self::Heading(_)
            | Self::UnorderedList
            | Self::OrderedList
            | Self::ListItem
            | Self::Table
            | Self::TableSection
            | Self::TableRow
            | Self::TableCell
            | Self::Rule
            | Self::Block => true,
            Self::Meta
            | Self::Script
            | Self::Style
            | Self::Noscript
            | Self::Template
            | Self::Frame
            | Self::Graphic
            | Self::Link
            | Self::Bold
            | Self::Italic
            | Self::Code
            | Self::Image
            | Self::LineBreak
            | Self::Inline => false,
        }
    }

    /// Heading level for `h1`..`h6`.
    pub fn heading_level(self) -> Option<u8> {
        match self {
            Self::Heading(level) => Some(level),
            _ => None,
        }
    }
}

/// Payload of an element node.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub kind: ElementKind,
    /// Lowercase tag name as written in the source.
    pub name: String,
    pub attrs: BTreeMap<String, String>,
}

/// What a node holds.
#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
}

/// A node in the tree.
#[derive(Debug, Clone)]
pub struct DomNode {
    pub data: NodeData,
    /// Parent node ID (if attached)
    pub parent: Option<NodeId>,
    /// Child node IDs in document order
    pub children: Vec<NodeId>,
}

/// Which resource cap was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Guard {
    InputSize,
    NestingDepth,
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::InputSize => f.write_str("input size"),
            Guard::NestingDepth => f.write_str("nesting depth"),
        }
    }
}

/// Record of a resource guard that tripped while building a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GuardTrip {
    pub guard: Guard,
    pub limit: usize,
}

impl fmt::Display for GuardTrip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} exceeded limit of {}", self.guard, self.limit)
    }
}

/// A document tree with index-based parent links.
///
/// Node IDs are handed out in document order by the builder, so comparing
/// two IDs compares their position in the source.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<DomNode>,
    guard_trips: Vec<GuardTrip>,
}

impl DomTree {
    /// Create a tree holding only the document root
    pub fn new() -> Self {
        let root = DomNode { data: NodeData::Document, parent: None, children: Vec::new() };
        Self { nodes: vec![root], guard_trips: Vec::new() }
    }

    /// The document root
    pub fn root(&self) -> NodeId {
        0
    }

    /// Append a new node as the last child of `parent`
    pub fn append(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(DomNode { data, parent: Some(parent), children: Vec::new() });
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(id);
        }
        id
    }

    /// Detach a node (and with it, its subtree) from its parent
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes.get_mut(id).and_then(|node| node.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.retain(|&child| child != id);
        }
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(id)
    }

    /// Element payload of a node, if it is an element
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(id)?.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Element kind of a node, if it is an element
    pub fn kind(&self, id: NodeId) -> Option<ElementKind> {
        self.element(id).map(|element| element.kind)
    }

    /// Text payload of a node, if it is a text leaf
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id)?.data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Attribute value of an element
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attrs.get(name).map(String::as_str)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|node| node.children.as_slice()).unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.parent
    }

    /// Ancestors of a node, nearest first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }

    /// Pre-order traversal of the subtree rooted at `id`, `id` included
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let stack = if id < self.nodes.len() { vec![id] } else { Vec::new() };
        Descendants { tree: self, stack }
    }

    /// Concatenated text of every text leaf under `id`
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id).filter_map(|node| self.text(node)).collect()
    }

    /// First element of `kind` under `id` in document order
    pub fn find_first(&self, id: NodeId, kind: ElementKind) -> Option<NodeId> {
        self.descendants(id).find(|&node| self.kind(node) == Some(kind))
    }

    /// The `body` element, if still attached
    pub fn body(&self) -> Option<NodeId> {
        self.find_first(self.root(), ElementKind::Body)
    }

    /// The `head` element, if present
    pub fn head(&self) -> Option<NodeId> {
        self.find_first(self.root(), ElementKind::Head)
    }

    pub fn record_guard_trip(&mut self, trip: GuardTrip) {
        if !self.guard_trips.contains(&trip) {
            self.guard_trips.push(trip);
        }
    }

    /// Resource guards that tripped while the tree was built
    pub fn guard_trips(&self) -> &[GuardTrip] {
        &self.guard_trips
    }

    /// Total number of nodes ever allocated, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds nothing beyond the document root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator returned by [`DomTree::descendants`].
pub struct Descendants<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.tree.children(id).iter().rev());
        Some(id)
    }
}
