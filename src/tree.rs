//! MemoryTree: arena-backed reference host
//!
//! A mutable in-memory content tree implementing `TreeHost`, with
//! encapsulated sub-trees, hidden styling, attachment tracking, and
//! mutation recording. Backs the test suite and works as a host for
//! server-side document scrubbing.
//!
//! Nodes live in a flat arena addressed by `NodeId`, compact and
//! cache-friendly. Detached nodes stay in the arena (ids remain valid
//! handles) but report as unattached.
//!
//! Mutation recording mimics an observer subscribed at the document
//! root: once `observe` has been called, text and child-list changes in
//! the main tree are recorded, while changes inside encapsulated
//! sub-trees are not - private content mutates outside the observer's
//! view, which is exactly the gap the engine's fallback sweeps cover.

use crate::host::{Mutation, NodeId, NodeKind, Selector, TreeHost};
use std::collections::HashSet;

// ==================== TYPE DEFINITIONS ====================

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    /// Lowercase tag name; empty for non-elements.
    tag: String,
    /// Character data for text and comment nodes.
    data: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Encapsulated sub-tree owned by this element.
    subtree: Option<NodeId>,
    /// Owning element, set on sub-tree roots.
    subtree_host: Option<NodeId>,
    hidden: bool,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            tag: String::new(),
            data: String::new(),
            parent: None,
            children: Vec::new(),
            subtree: None,
            subtree_host: None,
            hidden: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryTree {
    nodes: Vec<NodeData>,
    root: Option<NodeId>,
    observing: bool,
    pending: Vec<Mutation>,
    /// Roots whose subtree queries fail, for error-path testing.
    poisoned: HashSet<NodeId>,
}

// ==================== MAIN IMPLEMENTATION ====================

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(data);
        id
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0 as usize]
    }

    /// Create the document root element.
    pub fn init_root(&mut self, tag: &str) -> NodeId {
        let mut data = NodeData::new(NodeKind::Element);
        data.tag = tag.to_lowercase();
        let id = self.alloc(data);
        self.root = Some(id);
        id
    }

    /// Create a detached element.
    pub fn element(&mut self, tag: &str) -> NodeId {
        let mut data = NodeData::new(NodeKind::Element);
        data.tag = tag.to_lowercase();
        self.alloc(data)
    }

    /// Create a detached text leaf.
    pub fn text(&mut self, data: &str) -> NodeId {
        let mut node = NodeData::new(NodeKind::Text);
        node.data = data.to_string();
        self.alloc(node)
    }

    /// Create a detached comment node.
    pub fn comment(&mut self, data: &str) -> NodeId {
        let mut node = NodeData::new(NodeKind::Comment);
        node.data = data.to_string();
        self.alloc(node)
    }

    /// Append an existing node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
        self.record_child_list(parent, vec![child], vec![]);
    }

    /// Remove a child from its parent. The node stays in the arena and
    /// its id remains a valid, unattached handle.
    pub fn remove(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(parent).children.retain(|c| *c != child);
        self.node_mut(child).parent = None;
        self.record_child_list(parent, vec![], vec![child]);
    }

    /// Create and append an element in one step.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let el = self.element(tag);
        self.append(parent, el);
        el
    }

    /// Create and append a text leaf in one step.
    pub fn append_text(&mut self, parent: NodeId, data: &str) -> NodeId {
        let leaf = self.text(data);
        self.append(parent, leaf);
        leaf
    }

    /// Create and append a comment in one step.
    pub fn append_comment(&mut self, parent: NodeId, data: &str) -> NodeId {
        let comment = self.comment(data);
        self.append(parent, comment);
        comment
    }

    /// Attach an encapsulated sub-tree to an element and return its
    /// root. Like the real thing, attaching is not an observable
    /// child-list mutation.
    pub fn attach_subtree(&mut self, el: NodeId) -> NodeId {
        let mut data = NodeData::new(NodeKind::SubtreeRoot);
        data.subtree_host = Some(el);
        let root = self.alloc(data);
        self.node_mut(el).subtree = Some(root);
        root
    }

    /// Drain the mutation records accumulated since the last call.
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_hidden(&self, el: NodeId) -> bool {
        self.node(el).hidden
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    /// Make subtree queries rooted at `node` fail, simulating a
    /// malformed sub-tree.
    pub fn poison(&mut self, node: NodeId) {
        self.poisoned.insert(node);
    }

    // ---- internals ----

    fn record_child_list(&mut self, target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) {
        if self.observing && self.in_observed_tree(target) {
            self.pending.push(Mutation::ChildList {
                target,
                added,
                removed,
            });
        }
    }

    /// A node is in the observer's view when the plain parent chain
    /// (never crossing a sub-tree boundary) reaches the document root.
    fn in_observed_tree(&self, node: NodeId) -> bool {
        let Some(root) = self.root else {
            return false;
        };
        let mut cursor = node;
        loop {
            if cursor == root {
                return true;
            }
            match self.node(cursor).parent {
                Some(parent) => cursor = parent,
                None => return false,
            }
        }
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let data = self.node(node);
        match data.kind {
            NodeKind::Text => out.push_str(&data.data),
            NodeKind::Comment => {}
            _ => {
                for &child in &data.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    fn serialize_node(&self, node: NodeId, out: &mut String) {
        let data = self.node(node);
        match data.kind {
            NodeKind::Text => out.push_str(&data.data),
            NodeKind::Comment => {
                out.push_str("<!--");
                out.push_str(&data.data);
                out.push_str("-->");
            }
            NodeKind::Element => {
                out.push('<');
                out.push_str(&data.tag);
                out.push('>');
                for &child in &data.children {
                    self.serialize_node(child, out);
                }
                out.push_str("</");
                out.push_str(&data.tag);
                out.push('>');
            }
            NodeKind::SubtreeRoot => {}
        }
    }

    fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        let data = self.node(node);
        if data.kind != NodeKind::Element {
            return false;
        }
        match selector {
            Selector::AnyElement => true,
            Selector::Tag(tag) => data.tag == *tag,
        }
    }
}

// ==================== TreeHost ====================

impl TreeHost for MemoryTree {
    fn root(&self) -> Option<NodeId> {
        self.root
    }

    fn node_kind(&self, node: NodeId) -> NodeKind {
        self.node(node).kind
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        let data = self.node(node);
        if data.kind == NodeKind::Element {
            Some(data.tag.clone())
        } else {
            None
        }
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).children.clone()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.node(node).parent?;
        let siblings = &self.node(parent).children;
        let index = siblings.iter().position(|s| *s == node)?;
        if index == 0 {
            None
        } else {
            Some(siblings[index - 1])
        }
    }

    fn query_all(&self, root: NodeId, selector: &Selector) -> Result<Vec<NodeId>, String> {
        if self.poisoned.contains(&root) {
            return Err(format!("malformed sub-tree at node {}", root.0));
        }
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(root).children.clone();
        stack.reverse();
        while let Some(node) = stack.pop() {
            if self.matches(node, selector) {
                out.push(node);
            }
            let mut kids = self.node(node).children.clone();
            kids.reverse();
            stack.extend(kids);
        }
        Ok(out)
    }

    fn text_content(&self, node: NodeId) -> String {
        match self.node(node).kind {
            NodeKind::Text | NodeKind::Comment => self.node(node).data.clone(),
            _ => {
                let mut out = String::new();
                self.collect_text(node, &mut out);
                out
            }
        }
    }

    fn set_text(&mut self, leaf: NodeId, text: &str) {
        self.node_mut(leaf).data = text.to_string();
        if self.observing && self.in_observed_tree(leaf) {
            self.pending.push(Mutation::TextChanged { target: leaf });
        }
    }

    fn inner_markup(&self, el: NodeId) -> Option<String> {
        if self.node(el).kind != NodeKind::Element {
            return None;
        }
        let mut out = String::new();
        for &child in &self.node(el).children {
            self.serialize_node(child, &mut out);
        }
        Some(out)
    }

    fn owned_subtree(&self, el: NodeId) -> Option<NodeId> {
        self.node(el).subtree
    }

    fn apply_hidden_style(&mut self, el: NodeId) {
        self.node_mut(el).hidden = true;
    }

    fn is_display_suppressed(&self, el: NodeId) -> bool {
        self.node(el).hidden
    }

    fn is_attached(&self, node: NodeId) -> bool {
        let Some(root) = self.root else {
            return false;
        };
        let mut cursor = node;
        loop {
            if cursor == root {
                return true;
            }
            let data = self.node(cursor);
            if let Some(parent) = data.parent {
                cursor = parent;
            } else if let Some(host) = data.subtree_host {
                cursor = host;
            } else {
                return false;
            }
        }
    }

    fn observe(&mut self, _root: NodeId) {
        self.observing = true;
    }
}

// ==================== TESTS ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_and_navigation() {
        let mut tree = MemoryTree::new();
        let body = tree.init_root("body");
        let p = tree.append_element(body, "p");
        let a = tree.append_text(p, "one");
        let b = tree.append_text(p, "two");

        assert_eq!(tree.parent(a), Some(p));
        assert_eq!(tree.prev_sibling(b), Some(a));
        assert_eq!(tree.prev_sibling(a), None);
        assert_eq!(tree.tag_name(p).as_deref(), Some("p"));
        assert_eq!(tree.tag_name(a), None);
    }

    #[test]
    fn test_text_content_excludes_comments_and_subtrees() {
        let mut tree = MemoryTree::new();
        let body = tree.init_root("body");
        let p = tree.append_element(body, "p");
        tree.append_text(p, "light");
        tree.append_comment(p, "secret");
        let shadow = tree.attach_subtree(p);
        tree.append_text(shadow, "dark");

        assert_eq!(tree.text_content(p), "light");
        assert_eq!(tree.text_content(shadow), "dark");
    }

    #[test]
    fn test_query_all_document_order_and_tag_filter() {
        let mut tree = MemoryTree::new();
        let body = tree.init_root("body");
        let div = tree.append_element(body, "div");
        let span = tree.append_element(div, "span");
        let td = tree.append_element(body, "td");

        assert_eq!(
            tree.query_all(body, &Selector::AnyElement).unwrap(),
            vec![div, span, td]
        );
        assert_eq!(
            tree.query_all(body, &Selector::Tag("span".to_string()))
                .unwrap(),
            vec![span]
        );
    }

    #[test]
    fn test_inner_markup_serialization() {
        let mut tree = MemoryTree::new();
        let body = tree.init_root("body");
        let div = tree.append_element(body, "div");
        let em = tree.append_element(div, "em");
        tree.append_text(em, "hi");
        tree.append_comment(div, "note");

        assert_eq!(
            tree.inner_markup(div).as_deref(),
            Some("<em>hi</em><!--note-->")
        );
    }

    #[test]
    fn test_attachment_through_subtree_host() {
        let mut tree = MemoryTree::new();
        let body = tree.init_root("body");
        let widget = tree.append_element(body, "div");
        let shadow = tree.attach_subtree(widget);
        let leaf = tree.append_text(shadow, "deep");

        assert!(tree.is_attached(leaf));
        tree.remove(body, widget);
        assert!(!tree.is_attached(leaf));
        assert!(!tree.is_attached(widget));
        assert!(tree.is_attached(body));
    }

    #[test]
    fn test_mutations_recorded_only_while_observing() {
        let mut tree = MemoryTree::new();
        let body = tree.init_root("body");
        let p = tree.append_element(body, "p");
        let leaf = tree.append_text(p, "x");
        assert!(tree.take_mutations().is_empty());

        tree.observe(body);
        tree.set_text(leaf, "y");
        let div = tree.append_element(body, "div");
        tree.remove(body, div);

        let batch = tree.take_mutations();
        assert_eq!(batch.len(), 3);
        assert!(matches!(batch[0], Mutation::TextChanged { target } if target == leaf));
    }

    #[test]
    fn test_subtree_mutations_invisible_to_observer() {
        let mut tree = MemoryTree::new();
        let body = tree.init_root("body");
        let widget = tree.append_element(body, "div");
        tree.observe(body);

        let shadow = tree.attach_subtree(widget);
        tree.append_text(shadow, "quiet");

        assert!(tree.take_mutations().is_empty());
    }

    #[test]
    fn test_detached_parent_mutations_not_recorded() {
        let mut tree = MemoryTree::new();
        let body = tree.init_root("body");
        tree.observe(body);

        let div = tree.element("div");
        tree.append_text(div, "building offscreen");
        assert!(tree.take_mutations().is_empty());

        tree.append(body, div);
        assert_eq!(tree.take_mutations().len(), 1);
    }

    #[test]
    fn test_poisoned_query_fails() {
        let mut tree = MemoryTree::new();
        let body = tree.init_root("body");
        let div = tree.append_element(body, "div");
        tree.poison(div);

        assert!(tree.query_all(div, &Selector::AnyElement).is_err());
        assert!(tree.query_all(body, &Selector::AnyElement).is_ok());
    }
}
