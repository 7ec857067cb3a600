//! Host tree abstraction
//!
//! The engine never owns the document tree it scrubs. Everything it needs
//! from the environment is expressed here as the `TreeHost` trait over
//! compact, copyable `NodeId` handles, so the same engine runs against the
//! in-memory reference tree (`crate::tree::MemoryTree`), a server-side
//! document, or a bridged browser DOM.
//!
//! Lifecycle events (readiness, load completion, mutation batches, timer
//! ticks) travel in the opposite direction: the host calls the matching
//! `ScrubEngine` entry point.

use serde::{Deserialize, Serialize};

/// Compact node identifier. Plain value handle into the host's tree;
/// holding one never extends the node's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Kind of tree node as the engine distinguishes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Container node holding children and styling.
    Element,
    /// Text leaf holding only character data.
    Text,
    /// Comment node. Never rendered; ignored by text passes.
    Comment,
    /// Root of an encapsulated sub-tree privately owned by an element,
    /// not reachable through ordinary child enumeration of its host.
    SubtreeRoot,
}

/// Subtree element query, the subset of selector syntax the engine uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Every descendant element.
    AnyElement,
    /// Descendant elements with the given lowercase tag name.
    Tag(String),
}

/// One tree-change notification. Hosts deliver these in batches to
/// `ScrubEngine::on_mutations`; a batch is processed as a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Mutation {
    /// Character data of a text leaf changed in place.
    TextChanged { target: NodeId },
    /// The child list of a container changed.
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
}

/// Minimum host surface the scrubbing engine requires.
///
/// Tag names are reported lowercase. `query_all` is the only fallible
/// operation: hosts may fail on malformed sub-trees, and the engine
/// recovers by skipping that sub-root. All other operations must be total
/// for any id the host has handed out, even after the node is detached.
pub trait TreeHost {
    /// Main processing root (the body-or-document-element equivalent), or
    /// `None` while the document is not yet available.
    fn root(&self) -> Option<NodeId>;

    fn node_kind(&self, node: NodeId) -> NodeKind;

    /// Lowercase tag name for elements, `None` for every other kind.
    fn tag_name(&self, node: NodeId) -> Option<String>;

    /// Ordinary children, in document order. Does not pierce encapsulated
    /// sub-trees.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn prev_sibling(&self, node: NodeId) -> Option<NodeId>;

    /// Descendant elements of `root` matching `selector`, excluding `root`
    /// itself. `root` may be an element or a sub-tree root.
    fn query_all(&self, root: NodeId, selector: &Selector) -> Result<Vec<NodeId>, String>;

    /// Rendered text: character data for text leaves, concatenated
    /// descendant character data for containers. Owned sub-trees are not
    /// included in a container's text.
    fn text_content(&self, node: NodeId) -> String;

    /// Replace a text leaf's character data.
    fn set_text(&mut self, leaf: NodeId, text: &str);

    /// Serialized markup of the element's content, if the host can produce
    /// it. Used only as a fallback text-extraction hedge.
    fn inner_markup(&self, el: NodeId) -> Option<String>;

    /// The element's privately owned encapsulated sub-tree root, if any.
    fn owned_subtree(&self, el: NodeId) -> Option<NodeId>;

    /// Apply fully display-suppressing, zero-footprint styling.
    fn apply_hidden_style(&mut self, el: NodeId);

    /// Whether the element currently contributes nothing to layout
    /// (hidden styling applied, or host-side display:none).
    fn is_display_suppressed(&self, el: NodeId) -> bool;

    /// Whether the node is still connected to the live tree. For a
    /// sub-tree root this reports the liveness of its owning element.
    fn is_attached(&self, node: NodeId) -> bool;

    /// Start delivering mutation batches for the tree under `root`.
    /// Idempotent; the engine calls it exactly once per watch lifecycle.
    fn observe(&mut self, root: NodeId);
}
