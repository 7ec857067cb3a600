//! Tree walking: enumerate, classify, hide, rewrite
//!
//! One `WalkPass` scrubs everything under a sub-root: the element pass
//! classifies and hides containers, owned encapsulated sub-trees are
//! queued for their own pass, and the text pass rewrites matching leaves
//! whose nearest container is renderable and not display-suppressed.
//!
//! Sub-tree descent uses an explicit worklist with the ledger as visited
//! guard, so arbitrarily deep component nesting cannot exhaust the stack.
//! A traversal failure inside one sub-root is recorded and that sub-root
//! abandoned; the rest of the walk continues.

use instant::Instant;

use crate::host::{NodeId, NodeKind, Selector, TreeHost};

use super::classify::{Classification, Classifier};
use super::engine::{ScanError, ScrubStats};
use super::ledger::VisitLedger;
use super::lexicon::TermMatcher;
use super::rewrite::{Rewriter, SiblingContext};

// ==================== MAIN IMPLEMENTATION ====================

/// One scrubbing pass over a sub-root and the encapsulated sub-trees
/// discovered beneath it. Borrows the engine's shared parts for the
/// duration of the pass.
pub struct WalkPass<'a, H: TreeHost> {
    pub host: &'a mut H,
    pub matcher: &'a TermMatcher,
    pub classifier: &'a Classifier,
    pub rewriter: &'a Rewriter,
    pub ledger: &'a mut VisitLedger,
    pub skip_tags: &'a [String],
    pub stats: &'a mut ScrubStats,
    pub errors: &'a mut Vec<ScanError>,
}

impl<'a, H: TreeHost> WalkPass<'a, H> {
    /// Walk `root` at `depth`, then every owned sub-tree discovered along
    /// the way at increasing depth.
    pub fn run(&mut self, root: NodeId, depth: u32) {
        let started = Instant::now();
        let mut worklist = vec![(root, depth)];
        while let Some((sub_root, d)) = worklist.pop() {
            self.process_sub_root(sub_root, d, &mut worklist);
        }
        self.stats.last_pass_us = started.elapsed().as_micros() as u64;
    }

    fn process_sub_root(&mut self, root: NodeId, depth: u32, worklist: &mut Vec<(NodeId, u32)>) {
        self.stats.subtree_passes += 1;
        if self.host.node_kind(root) == NodeKind::SubtreeRoot {
            // Walking a sub-tree root counts as processing it; eviction
            // beforehand is what forces a re-walk.
            self.ledger.mark_subtree(root);
        }

        let mut elements = Vec::new();
        if self.host.node_kind(root) == NodeKind::Element {
            elements.push(root);
        }
        match self.host.query_all(root, &Selector::AnyElement) {
            Ok(descendants) => elements.extend(descendants),
            Err(message) => {
                self.errors.push(ScanError::new("walk", message));
                return;
            }
        }

        for el in elements {
            let Some(tag) = self.host.tag_name(el) else {
                continue;
            };
            if self.skip_tags.iter().any(|t| *t == tag) {
                continue;
            }

            self.stats.elements_classified += 1;
            let verdict = self
                .classifier
                .classify(&*self.host, self.matcher, self.ledger, el);
            let hidden = verdict == Classification::Hide;
            if hidden {
                self.host.apply_hidden_style(el);
                self.stats.elements_hidden += 1;
            }

            // A hidden host's private content is still scanned: the
            // sub-tree may be re-attached visibly elsewhere later.
            if let Some(subtree) = self.host.owned_subtree(el) {
                if !self.ledger.is_subtree_processed(subtree) {
                    worklist.push((subtree, depth + 1));
                }
            }
        }

        for leaf in self.collect_text_leaves(root) {
            let original = self.host.text_content(leaf);
            if !self.matcher.test(&original) {
                continue;
            }
            let ctx = self.sibling_context(leaf);
            if let Some(updated) = self.rewriter.rewrite(self.matcher, &original, ctx) {
                self.host.set_text(leaf, &updated);
                self.stats.leaves_rewritten += 1;
            }
        }
    }

    /// Text leaves under `root` whose parent container is renderable and
    /// not display-suppressed. Does not pierce encapsulated sub-trees.
    fn collect_text_leaves(&self, root: NodeId) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            for child in self.host.children(node) {
                match self.host.node_kind(child) {
                    NodeKind::Element => stack.push(child),
                    NodeKind::Text => {
                        if self.leaf_parent_renderable(child) {
                            leaves.push(child);
                        }
                    }
                    _ => {}
                }
            }
        }
        leaves
    }

    fn leaf_parent_renderable(&self, leaf: NodeId) -> bool {
        let Some(parent) = self.host.parent(leaf) else {
            return false;
        };
        if let Some(tag) = self.host.tag_name(parent) {
            if self.skip_tags.iter().any(|t| *t == tag) {
                return false;
            }
            if self.host.is_display_suppressed(parent) {
                return false;
            }
        }
        true
    }

    fn sibling_context(&self, leaf: NodeId) -> SiblingContext {
        match self.host.prev_sibling(leaf) {
            None => SiblingContext::none(),
            Some(prev) => SiblingContext {
                has_preceding_sibling: true,
                preceding_text_ends_with_space: self.host.node_kind(prev) == NodeKind::Text
                    && self
                        .host
                        .text_content(prev)
                        .chars()
                        .last()
                        .is_some_and(|c| c.is_whitespace()),
            },
        }
    }
}

/// Concatenated character data of every text leaf under `root`, in
/// document order, with no renderability filtering. This is the
/// classifier's second extraction method.
pub fn gather_leaf_text<H: TreeHost>(host: &H, root: NodeId) -> String {
    let mut out = String::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node != root && host.node_kind(node) == NodeKind::Text {
            out.push_str(&host.text_content(node));
            continue;
        }
        let mut children = host.children(node);
        children.reverse();
        stack.extend(children);
    }
    out
}

// ==================== TESTS ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::MemoryTree;

    #[test]
    fn test_gather_leaf_text_document_order() {
        let mut tree = MemoryTree::new();
        let body = tree.init_root("body");
        let p = tree.append_element(body, "p");
        tree.append_text(p, "one ");
        let em = tree.append_element(p, "em");
        tree.append_text(em, "two");
        tree.append_text(p, " three");

        assert_eq!(gather_leaf_text(&tree, p), "one two three");
    }

    #[test]
    fn test_gather_leaf_text_ignores_comments_and_subtrees() {
        let mut tree = MemoryTree::new();
        let body = tree.init_root("body");
        let p = tree.append_element(body, "p");
        tree.append_text(p, "light");
        tree.append_comment(p, "hidden note");
        let shadow = tree.attach_subtree(p);
        tree.append_text(shadow, "encapsulated");

        assert_eq!(gather_leaf_text(&tree, p), "light");
    }
}
