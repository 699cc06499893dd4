use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};

use crate::dom_tree::{DomTree, ElementKind, NodeData, NodeId};

/// Base weights added to a candidate's own score by tag
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TagWeights {
    pub article: f64,
    pub section: f64,
    pub main: f64,
    pub div: f64,
    pub table_cell: f64,
    pub blockquote: f64,
}

impl Default for TagWeights {
    fn default() -> Self {
        Self { article: 10.0, section: 8.0, main: 8.0, div: 5.0, table_cell: 3.0, blockquote: 3.0 }
    }
}

/// Configuration for content scoring algorithm
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreConfig {
    /// Class/ID keywords that suggest main content
    pub positive_keywords: Vec<String>,
    /// Class/ID keywords that suggest boilerplate
    pub negative_keywords: Vec<String>,
    /// Bonus (or penalty) per matched keyword
    pub keyword_weight: f64,
    /// Absolute cap on the summed keyword adjustment
    pub keyword_cap: f64,
    /// Base weight per candidate tag
    pub tag_weights: TagWeights,
    /// Characters per point for the text-length bonus
    pub chars_per_point: usize,
    /// Maximum text-length bonus
    pub max_length_bonus: f64,
    /// Fraction of a candidate's score given to its parent, grandparent, ...
    pub propagation: Vec<f64>,
    /// A candidate must score above this to be selected
    pub min_score: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(|word| word.to_string()).collect();
        Self {
            positive_keywords: words(&[
                "article", "content", "main", "post", "entry", "body", "text", "story", "blog", "hentry",
            ]),
            negative_keywords: words(&[
                "sidebar", "comment", "footer", "nav", "widget", "ad", "advert", "banner", "menu", "related", "share",
                "social", "sponsor", "promo", "breadcrumb", "pagination", "popup",
            ]),
            keyword_weight: 25.0,
            keyword_cap: 50.0,
            tag_weights: TagWeights::default(),
            chars_per_point: 100,
            max_length_bonus: 3.0,
            propagation: vec![1.0, 0.5, 0.25],
            min_score: 0.0,
        }
    }
}

/// Text measurements for one node, aggregated over its subtree
///
/// Lengths count non-whitespace characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStats {
    /// All text in the subtree
    pub text_len: usize,
    /// Text inside links
    pub link_len: usize,
    /// Number of links in the subtree
    pub links: usize,
    /// Text that is not inside a nested block element
    pub direct_len: usize,
    /// Part of the direct text that sits inside links
    pub direct_link_len: usize,
    /// Comma-like punctuation in the direct text
    pub direct_commas: usize,
}

impl TextStats {
    /// Ratio of link text to all text, from 0.0 (no links) to 1.0 (all links)
    pub fn link_density(&self) -> f64 {
        if self.text_len == 0 {
            return 0.0;
        }
        self.link_len as f64 / self.text_len as f64
    }
}

fn is_comma_like(c: char) -> bool {
    matches!(c, ',' | '，' | '、' | '،')
}

/// Compute [`TextStats`] for every node under `root`, indexed by node ID
///
/// IDs are assigned in document order, so walking a pre-order listing
/// backwards visits every child before its parent.
pub fn text_stats(tree: &DomTree, root: NodeId) -> Vec<TextStats> {
    let mut stats = vec![TextStats::default(); tree.len()];
    let order: Vec<NodeId> = tree.descendants(root).collect();

    for &id in order.iter().rev() {
        let Some(node) = tree.get_node(id) else { continue };
        let mut own = stats[id];
        let passes_direct = match &node.data {
            NodeData::Text(text) => {
                let len = text.chars().filter(|c| !c.is_whitespace()).count();
                let commas = text.chars().filter(|&c| is_comma_like(c)).count();
                own = TextStats { text_len: len, direct_len: len, direct_commas: commas, ..Default::default() };
                true
            }
            NodeData::Element(element) => {
                if element.kind == ElementKind::Link {
                    own.link_len = own.text_len;
                    own.direct_link_len = own.direct_len;
                    own.links += 1;
                }
                !element.kind.is_block()
            }
            NodeData::Document => false,
        };
        stats[id] = own;

        if id == root {
            continue;
        }
        if let Some(parent) = node.parent {
            let into = &mut stats[parent];
            into.text_len += own.text_len;
            into.link_len += own.link_len;
            into.links += own.links;
            if passes_direct {
                into.direct_len += own.direct_len;
                into.direct_link_len += own.direct_link_len;
                into.direct_commas += own.direct_commas;
            }
        }
    }

    stats
}

/// Whether an element kind is scored as a content candidate
fn is_candidate(kind: ElementKind) -> bool {
    matches!(
        kind,
        ElementKind::Body
            | ElementKind::Article
            | ElementKind::Section
            | ElementKind::Main
            | ElementKind::Div
            | ElementKind::Paragraph
            | ElementKind::Pre
            | ElementKind::Blockquote
            | ElementKind::TableCell
    )
}

/// Whether an element may collect score propagated from its descendants
fn receives_propagation(kind: ElementKind) -> bool {
    kind.is_block() && !matches!(kind, ElementKind::Html | ElementKind::Head)
}

/// Base weight for a candidate tag
pub fn base_tag_score(kind: ElementKind, config: &ScoreConfig) -> f64 {
    let weights = &config.tag_weights;
    match kind {
        ElementKind::Article => weights.article,
        ElementKind::Section => weights.section,
        ElementKind::Main => weights.main,
        ElementKind::Div => weights.div,
        ElementKind::TableCell => weights.table_cell,
        ElementKind::Blockquote => weights.blockquote,
        _ => 0.0,
    }
}

fn keyword_matches(token: &str, keyword: &str) -> bool {
    token == keyword
        || token.strip_suffix('s') == Some(keyword)
        || (keyword.len() >= 3 && token.starts_with(keyword))
        || (keyword.len() >= 4 && token.contains(keyword))
}

/// Calculate the class/ID weight adjustment for an element
///
/// Each distinct positive keyword found among the class and id tokens adds
/// `keyword_weight`, each negative one subtracts it, and the sum is clamped
/// to `±keyword_cap`.
pub fn class_id_weight(tree: &DomTree, id: NodeId, config: &ScoreConfig) -> f64 {
    let tokens: Vec<String> = ["class", "id"]
        .iter()
        .filter_map(|name| tree.attr(id, name))
        .flat_map(|value| value.split(|c: char| !c.is_alphanumeric()))
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect();

    if tokens.is_empty() {
        return 0.0;
    }

    let count = |keywords: &[String]| {
        keywords.iter().filter(|keyword| tokens.iter().any(|token| keyword_matches(token, keyword))).count() as f64
    };

    let net = (count(&config.positive_keywords) - count(&config.negative_keywords)) * config.keyword_weight;
    net.clamp(-config.keyword_cap, config.keyword_cap)
}

/// Bonus for longer direct text, capped at `max_length_bonus`
pub fn length_bonus(stats: &TextStats, config: &ScoreConfig) -> f64 {
    if config.chars_per_point == 0 {
        return 0.0;
    }
    ((stats.direct_len / config.chars_per_point) as f64).min(config.max_length_bonus)
}

/// Calculate a candidate's own score
///
/// The score combines the tag weight, the class/ID keyword weight, the
/// text-length bonus and one point per comma-like mark in the direct text,
/// then scales the sum by `1 - link_density`.
pub fn calculate_score(tree: &DomTree, id: NodeId, stats: &TextStats, config: &ScoreConfig) -> f64 {
    let kind = tree.kind(id).unwrap_or(ElementKind::Inline);
    let raw = base_tag_score(kind, config)
        + class_id_weight(tree, id, config)
        + length_bonus(stats, config)
        + stats.direct_commas as f64;

    raw * (1.0 - stats.link_density())
}

/// A node with its own score and the score propagated from descendants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredNode {
    pub id: NodeId,
    pub score: f64,
    pub propagated: f64,
}

impl ScoredNode {
    pub fn aggregate(&self) -> f64 {
        self.score + self.propagated
    }
}

/// Score every candidate under the document root, in document order
pub fn score_candidates(tree: &DomTree, stats: &[TextStats], config: &ScoreConfig) -> Vec<ScoredNode> {
    let mut scored: BTreeMap<NodeId, ScoredNode> = BTreeMap::new();

    for id in tree.descendants(tree.root()) {
        let Some(kind) = tree.kind(id) else { continue };
        if !is_candidate(kind) || stats[id].text_len == 0 {
            continue;
        }

        let own = calculate_score(tree, id, &stats[id], config);
        scored.entry(id).or_insert(ScoredNode { id, score: 0.0, propagated: 0.0 }).score = own;

        for (ancestor, fraction) in tree.ancestors(id).zip(&config.propagation) {
            if tree.kind(ancestor).is_some_and(receives_propagation) {
                scored
                    .entry(ancestor)
                    .or_insert(ScoredNode { id: ancestor, score: 0.0, propagated: 0.0 })
                    .propagated += own * fraction;
            }
        }
    }

    scored.into_values().collect()
}

/// How the main content node was chosen
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Selection {
    /// A scored candidate beat the threshold
    Candidate { node: NodeId, score: f64 },
    /// No candidate qualified; the whole body is used
    Body { node: NodeId },
    /// The body is empty; the whole document is used
    Document { node: NodeId },
}

impl Selection {
    /// The selected node
    pub fn node(&self) -> NodeId {
        match *self {
            Selection::Candidate { node, .. } | Selection::Body { node } | Selection::Document { node } => node,
        }
    }
}

fn has_content(tree: &DomTree, id: NodeId, stats: &[TextStats]) -> bool {
    stats[id].text_len > 0 || tree.find_first(id, ElementKind::Image).is_some()
}

/// Select the node holding the page's main content
///
/// The highest aggregate score wins; ties go to the node with more text,
/// then to the one earliest in the document. Without a candidate above
/// `min_score` this falls back to the body, and to the whole document when
/// the body is empty.
pub fn select_main_content(tree: &DomTree, config: &ScoreConfig) -> Selection {
    let stats = text_stats(tree, tree.root());
    let candidates = score_candidates(tree, &stats, config);

    for candidate in &candidates {
        trace!(
            node = candidate.id,
            tag = tree.element(candidate.id).map(|el| el.name.as_str()).unwrap_or_default(),
            score = candidate.score,
            propagated = candidate.propagated,
            "scored candidate"
        );
    }

    let best = candidates
        .iter()
        .filter(|candidate| candidate.aggregate() > config.min_score)
        .max_by(|a, b| {
            a.aggregate()
                .total_cmp(&b.aggregate())
                .then(stats[a.id].text_len.cmp(&stats[b.id].text_len))
                .then(b.id.cmp(&a.id))
        });

    let selection = match (best, tree.body()) {
        (Some(best), _) => Selection::Candidate { node: best.id, score: best.aggregate() },
        (None, Some(body)) if has_content(tree, body, &stats) => Selection::Body { node: body },
        (None, _) => Selection::Document { node: tree.root() },
    };

    debug!(candidates = candidates.len(), ?selection, "selected main content");
    selection
}
