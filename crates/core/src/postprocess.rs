use serde::Deserialize;
use tracing::debug;

use crate::dom_tree::{DomTree, ElementKind, NodeId};
use crate::scoring::{TextStats, text_stats};

/// Configuration for the post-selection cleanup of the content subtree
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PruneConfig {
    /// Link density above which a container is considered link noise (0.0 to 1.0)
    pub max_link_density: f64,
    /// A link-noise container may hold at most this much non-link direct text
    pub max_direct_text: usize,
    /// A link-noise container must hold at least this many links
    pub min_links: usize,
    /// Whether to remove containers left with neither text nor images
    pub remove_empty_nodes: bool,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self { max_link_density: 0.8, max_direct_text: 3, min_links: 2, remove_empty_nodes: true }
    }
}

/// Kinds the pruner may remove
///
/// Paragraphs, headings and list items always survive so a single
/// anchored line of prose is never mistaken for a link farm.
fn is_prunable(kind: ElementKind) -> bool {
    matches!(
        kind,
        ElementKind::Div
            | ElementKind::Section
            | ElementKind::Block
            | ElementKind::UnorderedList
            | ElementKind::OrderedList
            | ElementKind::Table
    )
}

fn is_link_noise(stats: &TextStats, config: &PruneConfig) -> bool {
    stats.links >= config.min_links
        && stats.link_density() > config.max_link_density
        && stats.direct_len - stats.direct_link_len <= config.max_direct_text
}

/// Remove every prunable descendant of `root` that matches `is_doomed`
///
/// Walks top-down and does not descend into doomed subtrees.
fn remove_where(tree: &mut DomTree, root: NodeId, is_doomed: impl Fn(&DomTree, NodeId) -> bool) -> usize {
    let mut doomed = Vec::new();
    let mut stack: Vec<NodeId> = tree.children(root).iter().rev().copied().collect();

    while let Some(id) = stack.pop() {
        if tree.kind(id).is_some_and(is_prunable) && is_doomed(&*tree, id) {
            doomed.push(id);
            continue;
        }
        stack.extend(tree.children(id).iter().rev());
    }

    for &id in &doomed {
        tree.detach(id);
    }
    doomed.len()
}

/// Remove low-value containers from the selected content subtree
///
/// A container goes when it is mostly link text with almost no prose of its
/// own (related-post lists, tag clouds, share bars built from generic tags).
/// Containers emptied of text and images are removed afterwards. The root
/// itself is never removed, and running the pass again removes nothing.
pub fn prune_low_value(tree: &mut DomTree, root: NodeId, config: &PruneConfig) -> usize {
    let stats = text_stats(tree, root);
    let link_noise = remove_where(tree, root, |_, id| is_link_noise(&stats[id], config));

    let empty = if config.remove_empty_nodes {
        let stats = text_stats(tree, root);
        remove_where(tree, root, |tree, id| {
            stats[id].text_len == 0 && tree.find_first(id, ElementKind::Image).is_none()
        })
    } else {
        0
    };

    debug!(link_noise, empty, "pruned low-value containers");
    link_noise + empty
}
