//! Mutation reconciliation: from change notifications to re-scan roots
//!
//! Consumes one delivered batch of tree-change notifications and computes
//! the minimal set of sub-roots that need re-walking, so a mutation never
//! costs a full-tree rescan:
//! - a text change re-scans the nearest container ancestor;
//! - a child-list change re-scans the mutated container, every added
//!   container whose text quick-matches, and the parent of every added
//!   text leaf whose content quick-matches;
//! - an added late-initializing component additionally forces its
//!   encapsulated sub-tree (and one further nested level) into the set,
//!   because such components build their private content asynchronously
//!   after insertion.
//!
//! Candidates are deduplicated and keep first-seen order. Attachment
//! checks happen at application time, not here: a candidate can detach
//! between batch delivery and processing.

use std::collections::HashSet;

use crate::host::{Mutation, NodeId, NodeKind, Selector, TreeHost};

use super::lexicon::TermMatcher;

// ==================== TYPE DEFINITIONS ====================

/// A sub-root selected for re-walking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Candidate {
    /// Re-walk this element at its natural depth.
    Element(NodeId),
    /// Evict this encapsulated sub-tree from the ledger, then re-walk it.
    Subtree(NodeId),
}

/// Late-initializing component pattern: a host tag whose encapsulated
/// content (and one nested inner component level) must be force-rescanned
/// whenever the host appears.
pub struct LatePattern<'a> {
    pub host_tag: &'a str,
    pub inner_tag: &'a str,
}

// ==================== CORE FUNCTIONS ====================

/// Build the candidate re-scan set for one reconciliation batch.
pub fn collect_candidates<H: TreeHost>(
    host: &H,
    matcher: &TermMatcher,
    late: &LatePattern<'_>,
    batch: &[Mutation],
) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut push = |candidate: Candidate| {
        if seen.insert(candidate) {
            out.push(candidate);
        }
    };

    for mutation in batch {
        match mutation {
            Mutation::TextChanged { target } => {
                if let Some(ancestor) = nearest_element(host, *target) {
                    push(Candidate::Element(ancestor));
                }
            }
            Mutation::ChildList { target, added, .. } => {
                if host.node_kind(*target) == NodeKind::Element {
                    push(Candidate::Element(*target));
                }
                for &node in added {
                    match host.node_kind(node) {
                        NodeKind::Element => {
                            if !matcher.quick_match(&host.text_content(node)) {
                                continue;
                            }
                            push(Candidate::Element(node));
                            if host.tag_name(node).as_deref() == Some(late.host_tag) {
                                for subtree in late_component_subtrees(host, node, late) {
                                    push(Candidate::Subtree(subtree));
                                }
                            }
                        }
                        NodeKind::Text => {
                            if matcher.quick_match(&host.text_content(node)) {
                                if let Some(parent) = nearest_element(host, node) {
                                    push(Candidate::Element(parent));
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    out
}

/// The encapsulated sub-tree of a late component present at mutation
/// time, plus the sub-trees of its nested inner components.
pub fn late_component_subtrees<H: TreeHost>(
    host: &H,
    component: NodeId,
    late: &LatePattern<'_>,
) -> Vec<NodeId> {
    let mut subtrees = Vec::new();
    let Some(root) = host.owned_subtree(component) else {
        return subtrees;
    };
    subtrees.push(root);
    let inners = host
        .query_all(root, &Selector::Tag(late.inner_tag.to_string()))
        .unwrap_or_default();
    for inner in inners {
        if let Some(inner_root) = host.owned_subtree(inner) {
            subtrees.push(inner_root);
        }
    }
    subtrees
}

/// Climb from `node` to the closest enclosing element, not counting the
/// node itself.
fn nearest_element<H: TreeHost>(host: &H, node: NodeId) -> Option<NodeId> {
    let mut cursor = host.parent(node);
    while let Some(current) = cursor {
        if host.node_kind(current) == NodeKind::Element {
            return Some(current);
        }
        cursor = host.parent(current);
    }
    None
}

// ==================== TESTS ====================
