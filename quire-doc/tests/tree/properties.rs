//! Structural properties of the tree under arbitrary moves

use proptest::prelude::*;
use quire_doc::nodes::base::{Paragraph, PARAGRAPH_TYPE};
use quire_doc::{DocError, DocumentTree, NodeClass, NodeKey, NodeTypeRegistry};
use std::collections::HashMap;

fn parent_map(
    tree: &DocumentTree,
    keys: &[NodeKey],
) -> HashMap<NodeKey, (Option<NodeKey>, Vec<NodeKey>)> {
    keys.iter()
        .map(|k| (*k, (tree.parent(*k), tree.children(*k).to_vec())))
        .collect()
}

proptest! {
    #[test]
    fn append_keeps_tree_acyclic(
        size in 2usize..12,
        moves in prop::collection::vec((0usize..12, 0usize..12), 1..40),
    ) {
        let registry = NodeTypeRegistry::with_defaults();
        let mut tree = DocumentTree::new();
        let root = tree.root();
        let mut keys = vec![root];
        for _ in 0..size {
            let key = tree.create_node(PARAGRAPH_TYPE, NodeClass::Element, Box::new(Paragraph));
            tree.append(root, key).unwrap();
            keys.push(key);
        }

        for (p, c) in moves {
            let parent = keys[p % keys.len()];
            let child = keys[1 + c % (keys.len() - 1)];
            let before = parent_map(&tree, &keys);
            let would_cycle = parent == child || tree.is_ancestor(child, parent);

            match tree.append(parent, child) {
                Ok(()) => {
                    prop_assert!(!would_cycle);
                    prop_assert_eq!(tree.parent(child), Some(parent));
                    prop_assert_eq!(tree.children(parent).last().copied(), Some(child));
                }
                Err(DocError::Cycle { .. }) => {
                    prop_assert!(would_cycle);
                    prop_assert_eq!(parent_map(&tree, &keys), before);
                }
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
            prop_assert!(tree.check_integrity(&registry).is_ok());
        }
        prop_assert_eq!(tree.descendants(root).len(), size);
    }
}

#[test]
fn duplicate_subtree_copies_structure_with_fresh_keys() {
    let registry = NodeTypeRegistry::with_defaults();
    let mut tree = DocumentTree::new();
    let outer = tree.create_node(PARAGRAPH_TYPE, NodeClass::Element, Box::new(Paragraph));
    let inner = tree.create_node(PARAGRAPH_TYPE, NodeClass::Element, Box::new(Paragraph));
    tree.append(tree.root(), outer).unwrap();
    tree.append(outer, inner).unwrap();

    let copy = tree.duplicate_subtree(outer, &registry).unwrap();
    assert_ne!(copy, outer);
    assert_eq!(tree.parent(copy), None);
    assert_eq!(tree.children(copy).len(), 1);
    assert_ne!(tree.children(copy)[0], inner);

    tree.append(tree.root(), copy).unwrap();
    assert!(
        quire_doc::formats::json::subtrees_equal(&registry, (&tree, outer), (&tree, copy)).unwrap()
    );
}
