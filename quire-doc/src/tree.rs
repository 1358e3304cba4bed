//! Document tree arena
//!
//! All live nodes are owned by one keyed table. Structure is expressed through
//! child key lists and parent back-links, never through references between
//! nodes, so a whole tree can be cloned cheaply for a transaction working copy.
//!
//! Invariants kept by every mutation:
//!     - a non-root node has exactly one parent and appears once in its child list
//!     - keys are unique
//!     - no cycles; the root is never attached anywhere
//!
//! Shadow-root placement is checked against the registry by [`DocumentTree::check_integrity`],
//! which transactions run before committing.

use crate::error::{DocError, Result};
use crate::node_registry::NodeTypeRegistry;
use crate::node_type::{NodeClass, NodePayload};
use crate::nodes::base::{Root, ROOT_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Process-unique node identifier, stable for the node's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(u64);

impl NodeKey {
    fn next() -> Self {
        NodeKey(NEXT_KEY.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node instance.
#[derive(Debug)]
pub struct Node {
    key: NodeKey,
    type_tag: &'static str,
    class: NodeClass,
    parent: Option<NodeKey>,
    children: Option<Vec<NodeKey>>,
    payload: Box<dyn NodePayload>,
}

impl Clone for Node {
    fn clone(&self) -> Self {
        Node {
            key: self.key,
            type_tag: self.type_tag,
            class: self.class,
            parent: self.parent,
            children: self.children.clone(),
            payload: self.payload.as_ref().clone_boxed(),
        }
    }
}

impl Node {
    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn type_tag(&self) -> &'static str {
        self.type_tag
    }

    pub fn class(&self) -> NodeClass {
        self.class
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Child keys in order; empty for leaf and decorator nodes.
    pub fn children(&self) -> &[NodeKey] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn payload(&self) -> &dyn NodePayload {
        self.payload.as_ref()
    }

    pub fn payload_as<T: 'static>(&self) -> Option<&T> {
        self.payload.as_ref().as_any().downcast_ref::<T>()
    }
}

/// Ordered, keyed arena tree with one designated root.
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: HashMap<NodeKey, Node>,
    root: NodeKey,
    dirty: BTreeSet<NodeKey>,
}

impl DocumentTree {
    /// Create a tree holding only an empty root.
    pub fn new() -> Self {
        let root = NodeKey::next();
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                key: root,
                type_tag: ROOT_TYPE,
                class: NodeClass::Root,
                parent: None,
                children: Some(Vec::new()),
                payload: Box::new(Root),
            },
        );
        DocumentTree {
            nodes,
            root,
            dirty: BTreeSet::new(),
        }
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    pub fn get(&self, key: NodeKey) -> Result<&Node> {
        self.nodes.get(&key).ok_or(DocError::NodeNotFound(key))
    }

    fn get_mut(&mut self, key: NodeKey) -> Result<&mut Node> {
        self.nodes.get_mut(&key).ok_or(DocError::NodeNotFound(key))
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(&key).and_then(|node| node.parent)
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes.get(&key).map(Node::children).unwrap_or(&[])
    }

    pub fn type_of(&self, key: NodeKey) -> Option<&'static str> {
        self.nodes.get(&key).map(|node| node.type_tag)
    }

    pub fn index_in_parent(&self, key: NodeKey) -> Option<usize> {
        let parent = self.parent(key)?;
        self.children(parent).iter().position(|k| *k == key)
    }

    pub fn previous_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        let index = self.index_in_parent(key)?;
        let parent = self.parent(key)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    /// Whether `ancestor` is a proper ancestor of `key`.
    pub fn is_ancestor(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        let mut current = self.parent(key);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.parent(k);
        }
        false
    }

    /// Ancestors of `key`, nearest first.
    pub fn ancestors(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut current = self.parent(key);
        while let Some(k) = current {
            out.push(k);
            current = self.parent(k);
        }
        out
    }

    /// Number of ancestors; the root and detached nodes have depth 0.
    pub fn depth(&self, key: NodeKey) -> usize {
        self.ancestors(key).len()
    }

    /// All descendants of `key` in pre-order, excluding `key`.
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeKey> = self.children(key).iter().rev().copied().collect();
        while let Some(k) = stack.pop() {
            out.push(k);
            stack.extend(self.children(k).iter().rev().copied());
        }
        out
    }

    /// Create a detached node.
    pub fn create_node(
        &mut self,
        type_tag: &'static str,
        class: NodeClass,
        payload: Box<dyn NodePayload>,
    ) -> NodeKey {
        let key = NodeKey::next();
        self.nodes.insert(
            key,
            Node {
                key,
                type_tag,
                class,
                parent: None,
                children: class.has_children().then(Vec::new),
                payload,
            },
        );
        self.dirty.insert(key);
        key
    }

    /// Attach `child` as the last child of `parent`, detaching it first if needed.
    pub fn append(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        let len = self.children(parent).len();
        self.attach(parent, len, child)
    }

    /// Attach `child` at `index` of `parent`; an index past the end appends.
    pub fn insert_at(&mut self, parent: NodeKey, index: usize, child: NodeKey) -> Result<()> {
        self.attach(parent, index, child)
    }

    /// Move `node` so it directly precedes `sibling`.
    pub fn move_before(&mut self, node: NodeKey, sibling: NodeKey) -> Result<()> {
        let parent = self.sibling_parent(node, sibling)?;
        self.validate_attach(parent, node)?;
        self.detach(node)?;
        let index = self.index_in_parent(sibling).unwrap_or(0);
        self.attach(parent, index, node)
    }

    /// Move `node` so it directly follows `sibling`.
    pub fn insert_after(&mut self, node: NodeKey, sibling: NodeKey) -> Result<()> {
        let parent = self.sibling_parent(node, sibling)?;
        self.validate_attach(parent, node)?;
        self.detach(node)?;
        let index = self.index_in_parent(sibling).map(|i| i + 1).unwrap_or(0);
        self.attach(parent, index, node)
    }

    fn sibling_parent(&self, node: NodeKey, sibling: NodeKey) -> Result<NodeKey> {
        self.get(sibling)?;
        if node == sibling {
            return Err(DocError::InvalidStructure(format!(
                "{node} cannot be placed next to itself"
            )));
        }
        self.parent(sibling).ok_or_else(|| {
            DocError::InvalidStructure(format!("{sibling} has no parent to insert next to"))
        })
    }

    fn validate_attach(&self, parent: NodeKey, child: NodeKey) -> Result<()> {
        let parent_node = self.get(parent)?;
        self.get(child)?;
        if child == self.root {
            return Err(DocError::InvalidStructure(
                "the root cannot be attached under another node".to_string(),
            ));
        }
        if !parent_node.class.has_children() {
            return Err(DocError::NotAnElement(parent));
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(DocError::Cycle { parent, child });
        }
        Ok(())
    }

    fn attach(&mut self, parent: NodeKey, index: usize, child: NodeKey) -> Result<()> {
        self.validate_attach(parent, child)?;
        self.detach(child)?;
        let parent_node = self.get_mut(parent)?;
        if let Some(children) = parent_node.children.as_mut() {
            let index = index.min(children.len());
            children.insert(index, child);
        }
        self.get_mut(child)?.parent = Some(parent);
        self.dirty.insert(parent);
        self.dirty.insert(child);
        Ok(())
    }

    /// Unlink `key` from its parent, leaving it detached.
    pub fn detach(&mut self, key: NodeKey) -> Result<()> {
        let Some(parent) = self.get(key)?.parent else {
            return Ok(());
        };
        if let Some(children) = self.get_mut(parent)?.children.as_mut() {
            children.retain(|k| *k != key);
        }
        self.get_mut(key)?.parent = None;
        self.dirty.insert(parent);
        self.dirty.insert(key);
        Ok(())
    }

    /// Remove `key` and every descendant it owns.
    pub fn remove(&mut self, key: NodeKey) -> Result<()> {
        if key == self.root {
            return Err(DocError::InvalidStructure(
                "the root cannot be removed".to_string(),
            ));
        }
        self.detach(key)?;
        let mut doomed = self.descendants(key);
        doomed.push(key);
        for k in doomed {
            self.nodes.remove(&k);
            self.dirty.insert(k);
        }
        Ok(())
    }

    /// Remove every child of `key`.
    pub fn clear_children(&mut self, key: NodeKey) -> Result<()> {
        for child in self.children(key).to_vec() {
            self.remove(child)?;
        }
        Ok(())
    }

    pub fn payload_as<T: 'static>(&self, key: NodeKey) -> Result<&T> {
        let node = self.get(key)?;
        node.payload_as::<T>()
            .ok_or_else(|| DocError::malformed(node.type_tag, "payload has the wrong type"))
    }

    /// Mutate a payload in place, marking the node dirty.
    pub fn update_payload<T: 'static, R>(
        &mut self,
        key: NodeKey,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R> {
        let node = self.get_mut(key)?;
        let type_tag = node.type_tag;
        let payload = node
            .payload
            .as_mut()
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| DocError::malformed(type_tag, "payload has the wrong type"))?;
        let out = f(payload);
        self.dirty.insert(key);
        Ok(out)
    }

    /// Deep-copy the subtree at `key` under fresh keys, using each type's cloner.
    /// The copy is detached.
    pub fn duplicate_subtree(
        &mut self,
        key: NodeKey,
        registry: &NodeTypeRegistry,
    ) -> Result<NodeKey> {
        let node = self.get(key)?;
        let node_type = registry.get(node.type_tag)?;
        let payload = node_type.clone_payload(node.payload());
        let (type_tag, class) = (node.type_tag, node.class);
        let children = node.children().to_vec();
        let copy = self.create_node(type_tag, class, payload);
        for child in children {
            let child_copy = self.duplicate_subtree(child, registry)?;
            self.append(copy, child_copy)?;
        }
        Ok(copy)
    }

    /// Drop nodes not reachable from the root. Returns how many were dropped.
    pub fn collect_garbage(&mut self) -> usize {
        let mut live: HashSet<NodeKey> = self.descendants(self.root).into_iter().collect();
        live.insert(self.root);
        let before = self.nodes.len();
        let dead: Vec<NodeKey> = self
            .nodes
            .keys()
            .filter(|k| !live.contains(k))
            .copied()
            .collect();
        for key in &dead {
            self.nodes.remove(key);
            self.dirty.remove(key);
        }
        before - self.nodes.len()
    }

    /// Verify structural invariants and registry placement rules.
    pub fn check_integrity(&self, registry: &NodeTypeRegistry) -> Result<()> {
        let root = self.get(self.root)?;
        if root.parent.is_some() {
            return Err(DocError::InvalidStructure("root has a parent".to_string()));
        }
        let mut seen = HashSet::new();
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            if !seen.insert(key) {
                return Err(DocError::InvalidStructure(format!(
                    "{key} is reachable more than once"
                )));
            }
            let node = self.get(key)?;
            if node.children.is_some() != node.class.has_children() {
                return Err(DocError::InvalidStructure(format!(
                    "{key} ({}) has a child list that does not match its class",
                    node.type_tag
                )));
            }
            if let Some(allowed) = registry.get(node.type_tag)?.parent_types() {
                let parent_type = node.parent.and_then(|p| self.type_of(p));
                if !parent_type.is_some_and(|t| allowed.contains(&t)) {
                    return Err(DocError::InvalidStructure(format!(
                        "'{}' {key} must be placed under one of {allowed:?}",
                        node.type_tag
                    )));
                }
            }
            for child in node.children() {
                let child_node = self.get(*child)?;
                if child_node.parent != Some(key) {
                    return Err(DocError::InvalidStructure(format!(
                        "{child} is listed under {key} but links to another parent"
                    )));
                }
                stack.push(*child);
            }
        }
        if seen.len() != self.nodes.len() {
            return Err(DocError::InvalidStructure(format!(
                "{} detached node(s) remain in the arena",
                self.nodes.len() - seen.len()
            )));
        }
        Ok(())
    }

    /// Keys affected since the last call.
    pub fn take_dirty(&mut self) -> BTreeSet<NodeKey> {
        std::mem::take(&mut self.dirty)
    }

    pub fn dirty(&self) -> &BTreeSet<NodeKey> {
        &self.dirty
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::base::Paragraph;
    use crate::nodes::layout::LayoutItem;

    fn paragraph(tree: &mut DocumentTree) -> NodeKey {
        tree.create_node("paragraph", NodeClass::Element, Box::new(Paragraph))
    }

    #[test]
    fn test_append_and_order() {
        let mut tree = DocumentTree::new();
        let a = paragraph(&mut tree);
        let b = paragraph(&mut tree);
        tree.append(tree.root(), a).unwrap();
        tree.append(tree.root(), b).unwrap();
        assert_eq!(tree.children(tree.root()), &[a, b]);
        assert_eq!(tree.parent(a), Some(tree.root()));
        assert_eq!(tree.index_in_parent(b), Some(1));
        assert_eq!(tree.previous_sibling(b), Some(a));
    }

    #[test]
    fn test_append_rejects_cycle() {
        let mut tree = DocumentTree::new();
        let outer = paragraph(&mut tree);
        let inner = paragraph(&mut tree);
        tree.append(tree.root(), outer).unwrap();
        tree.append(outer, inner).unwrap();

        let err = tree.append(inner, outer).unwrap_err();
        assert_eq!(
            err,
            DocError::Cycle {
                parent: inner,
                child: outer
            }
        );
        assert_eq!(tree.parent(outer), Some(tree.root()));
        assert_eq!(tree.children(inner), &[] as &[NodeKey]);

        assert!(matches!(
            tree.append(outer, outer),
            Err(DocError::Cycle { .. })
        ));
    }

    #[test]
    fn test_root_cannot_move_or_be_removed() {
        let mut tree = DocumentTree::new();
        let p = paragraph(&mut tree);
        assert!(matches!(
            tree.append(p, tree.root()),
            Err(DocError::InvalidStructure(_))
        ));
        assert!(matches!(
            tree.remove(tree.root()),
            Err(DocError::InvalidStructure(_))
        ));
    }

    #[test]
    fn test_move_before_and_insert_after() {
        let mut tree = DocumentTree::new();
        let root = tree.root();
        let a = paragraph(&mut tree);
        let b = paragraph(&mut tree);
        let c = paragraph(&mut tree);
        for k in [a, b, c] {
            tree.append(root, k).unwrap();
        }
        tree.move_before(c, a).unwrap();
        assert_eq!(tree.children(root), &[c, a, b]);
        tree.insert_after(c, b).unwrap();
        assert_eq!(tree.children(root), &[a, b, c]);
        tree.insert_after(a, a).unwrap_err();
    }

    #[test]
    fn test_remove_is_recursive() {
        let mut tree = DocumentTree::new();
        let outer = paragraph(&mut tree);
        let inner = paragraph(&mut tree);
        tree.append(tree.root(), outer).unwrap();
        tree.append(outer, inner).unwrap();
        tree.remove(outer).unwrap();
        assert!(!tree.contains(outer));
        assert!(!tree.contains(inner));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_garbage_collection_drops_detached() {
        let mut tree = DocumentTree::new();
        let kept = paragraph(&mut tree);
        let _lost = paragraph(&mut tree);
        tree.append(tree.root(), kept).unwrap();
        assert_eq!(tree.collect_garbage(), 1);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_integrity_checks_shadow_root_placement() {
        let registry = NodeTypeRegistry::with_defaults();
        let mut tree = DocumentTree::new();
        let cell = tree.create_node("layout-item", NodeClass::ShadowRoot, Box::new(LayoutItem));
        tree.append(tree.root(), cell).unwrap();
        assert!(matches!(
            tree.check_integrity(&registry),
            Err(DocError::InvalidStructure(_))
        ));
    }

    #[test]
    fn test_depth_and_descendants() {
        let mut tree = DocumentTree::new();
        let a = paragraph(&mut tree);
        let b = paragraph(&mut tree);
        let c = paragraph(&mut tree);
        tree.append(tree.root(), a).unwrap();
        tree.append(a, b).unwrap();
        tree.append(tree.root(), c).unwrap();
        assert_eq!(tree.depth(b), 2);
        assert_eq!(tree.descendants(tree.root()), vec![a, b, c]);
        assert!(tree.is_ancestor(a, b));
        assert!(!tree.is_ancestor(b, a));
    }
}
