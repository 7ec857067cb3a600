//! VisitLedger - processed-node tracking
//!
//! Identity-keyed membership sets for elements and encapsulated sub-tree
//! roots that have completed classification, so repeat scans are cheap and
//! safe. Keys are plain `NodeId` values: the ledger never owns a node and
//! cannot keep a detached one alive.
//!
//! Element entries are permanent for the node's identity (there is no
//! un-hide path). Sub-tree entries are evicted when a mutation or the
//! late-component rescan intentionally forces a re-walk.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::host::NodeId;

#[derive(Debug, Default)]
pub struct VisitLedger {
    elements: HashSet<NodeId>,
    subtrees: HashSet<NodeId>,
}

/// Snapshot of ledger occupancy for stats reporting.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LedgerStats {
    pub elements: usize,
    pub subtrees: usize,
}

impl VisitLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_element_processed(&self, el: NodeId) -> bool {
        self.elements.contains(&el)
    }

    /// Returns false if the element was already marked.
    pub fn mark_element(&mut self, el: NodeId) -> bool {
        self.elements.insert(el)
    }

    pub fn is_subtree_processed(&self, root: NodeId) -> bool {
        self.subtrees.contains(&root)
    }

    pub fn mark_subtree(&mut self, root: NodeId) -> bool {
        self.subtrees.insert(root)
    }

    /// Force the next walk of this sub-tree to re-process it.
    pub fn evict_subtree(&mut self, root: NodeId) {
        self.subtrees.remove(&root);
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            elements: self.elements.len(),
            subtrees: self.subtrees.len(),
        }
    }

    pub fn clear(&mut self) {
        self.elements.clear();
        self.subtrees.clear();
    }
}

// ==================== TESTS ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_check() {
        let mut ledger = VisitLedger::new();
        let a = NodeId(1);

        assert!(!ledger.is_element_processed(a));
        assert!(ledger.mark_element(a));
        assert!(ledger.is_element_processed(a));
        // Second mark reports the duplicate.
        assert!(!ledger.mark_element(a));
    }

    #[test]
    fn test_subtree_eviction_forces_reprocess() {
        let mut ledger = VisitLedger::new();
        let root = NodeId(7);

        ledger.mark_subtree(root);
        assert!(ledger.is_subtree_processed(root));

        ledger.evict_subtree(root);
        assert!(!ledger.is_subtree_processed(root));
        assert!(ledger.mark_subtree(root));
    }

    #[test]
    fn test_element_and_subtree_sets_are_independent() {
        let mut ledger = VisitLedger::new();
        let id = NodeId(3);

        ledger.mark_element(id);
        assert!(!ledger.is_subtree_processed(id));

        assert_eq!(ledger.stats().elements, 1);
        assert_eq!(ledger.stats().subtrees, 0);
    }

    #[test]
    fn test_clear() {
        let mut ledger = VisitLedger::new();
        ledger.mark_element(NodeId(1));
        ledger.mark_subtree(NodeId(2));
        ledger.clear();
        assert_eq!(ledger.stats().elements, 0);
        assert_eq!(ledger.stats().subtrees, 0);
    }
}
