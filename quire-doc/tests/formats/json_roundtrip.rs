//! Interchange round trips over generated documents

use proptest::prelude::*;
use quire_doc::formats::json::{export_document, import_subtree, subtrees_equal, SerializedNode};
use quire_doc::nodes::base::{Heading, HeadingTag, TextFormat, TextNode};
use quire_doc::nodes::collapsible::CollapsibleContainer;
use quire_doc::nodes::equation::Equation;
use quire_doc::nodes::image::{Alignment, Image};
use quire_doc::nodes::layout::LayoutContainer;
use quire_doc::nodes::youtube::YouTube;
use quire_doc::{DocumentTree, Editor, NodeKey, NodePayload, NodeTypeRegistry};

#[derive(Debug, Clone)]
enum Block {
    Paragraph(Vec<(String, u32)>),
    Heading(u8, String),
    Equation(String, bool),
    Image(String, Option<u32>, u8),
    Layout(usize),
    Collapsible(bool, String),
    PageBreak,
    YouTube(String),
}

fn block() -> impl Strategy<Value = Block> {
    prop_oneof![
        prop::collection::vec(("[a-z ]{0,12}", 0u32..32), 0..4).prop_map(Block::Paragraph),
        (0u8..6, "[A-Za-z ]{1,10}").prop_map(|(l, t)| Block::Heading(l, t)),
        (r"[a-z\\^_{}0-9]{0,12}", any::<bool>()).prop_map(|(e, i)| Block::Equation(e, i)),
        ("[a-z]{1,8}", prop::option::of(1u32..2000), 0u8..3)
            .prop_map(|(s, w, a)| Block::Image(format!("https://img.example/{s}.png"), w, a)),
        (1usize..5).prop_map(Block::Layout),
        (any::<bool>(), "[a-z]{0,8}").prop_map(|(o, t)| Block::Collapsible(o, t)),
        Just(Block::PageBreak),
        "[A-Za-z0-9_-]{11}".prop_map(Block::YouTube),
    ]
}

fn node(
    tree: &mut DocumentTree,
    registry: &NodeTypeRegistry,
    tag: &str,
    payload: impl NodePayload,
) -> NodeKey {
    let (tag, class, _) = registry.create(tag).unwrap();
    tree.create_node(tag, class, Box::new(payload))
}

fn default_node(tree: &mut DocumentTree, registry: &NodeTypeRegistry, tag: &str) -> NodeKey {
    let (tag, class, payload) = registry.create(tag).unwrap();
    tree.create_node(tag, class, payload)
}

fn text(
    tree: &mut DocumentTree,
    registry: &NodeTypeRegistry,
    parent: NodeKey,
    value: &str,
    bits: u32,
) {
    let key = node(tree, registry, "text", TextNode::new(value, TextFormat::from_bits(bits)));
    tree.append(parent, key).unwrap();
}

fn build(blocks: &[Block], registry: &NodeTypeRegistry) -> DocumentTree {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    for block in blocks {
        let key = match block {
            Block::Paragraph(runs) => {
                let p = default_node(&mut tree, registry, "paragraph");
                for (value, bits) in runs {
                    text(&mut tree, registry, p, value, *bits);
                }
                p
            }
            Block::Heading(level, value) => {
                let tag = [
                    HeadingTag::H1,
                    HeadingTag::H2,
                    HeadingTag::H3,
                    HeadingTag::H4,
                    HeadingTag::H5,
                    HeadingTag::H6,
                ][*level as usize];
                let h = node(&mut tree, registry, "heading", Heading { tag });
                text(&mut tree, registry, h, value, 0);
                h
            }
            Block::Equation(equation, inline) => node(
                &mut tree,
                registry,
                "equation",
                Equation { equation: equation.clone(), inline: *inline },
            ),
            Block::Image(src, width, align) => {
                let alignment =
                    [Alignment::Left, Alignment::Center, Alignment::Right][*align as usize];
                let image = Image::new(src, "alt")
                    .with_alignment(alignment)
                    .with_size(*width, width.map(|w| w / 2 + 1));
                node(&mut tree, registry, "image", image)
            }
            Block::Layout(columns) => {
                let container = node(&mut tree, registry, "layout-container", LayoutContainer { columns: *columns });
                for _ in 0..*columns {
                    let cell = default_node(&mut tree, registry, "layout-item");
                    let p = default_node(&mut tree, registry, "paragraph");
                    tree.append(cell, p).unwrap();
                    tree.append(container, cell).unwrap();
                }
                container
            }
            Block::Collapsible(open, title) => {
                let container = node(&mut tree, registry, "collapsible-container", CollapsibleContainer { open: *open });
                let t = default_node(&mut tree, registry, "collapsible-title");
                text(&mut tree, registry, t, title, 0);
                let content = default_node(&mut tree, registry, "collapsible-content");
                tree.append(container, t).unwrap();
                tree.append(container, content).unwrap();
                container
            }
            Block::PageBreak => default_node(&mut tree, registry, "page-break"),
            Block::YouTube(id) => node(&mut tree, registry, "youtube", YouTube { video_id: id.clone() }),
        };
        tree.append(root, key).unwrap();
    }
    tree
}

proptest! {
    #[test]
    fn subtree_round_trip(blocks in prop::collection::vec(block(), 0..8)) {
        let registry = NodeTypeRegistry::with_defaults();
        let tree = build(&blocks, &registry);
        prop_assert!(tree.check_integrity(&registry).is_ok());

        for key in tree.children(tree.root()).to_vec() {
            let record = quire_doc::formats::json::export_subtree(&tree, &registry, key).unwrap();
            let text = serde_json::to_string(&record).unwrap();
            let parsed: SerializedNode = serde_json::from_str(&text).unwrap();

            let mut target = DocumentTree::new();
            let copy = import_subtree(&mut target, &registry, &parsed).unwrap();
            prop_assert!(subtrees_equal(&registry, (&tree, key), (&target, copy)).unwrap());
        }
    }

    #[test]
    fn document_round_trip_through_editor(blocks in prop::collection::vec(block(), 0..8)) {
        let registry = NodeTypeRegistry::with_defaults();
        let tree = build(&blocks, &registry);
        let source = serde_json::to_string(&export_document(&tree, &registry).unwrap()).unwrap();

        let mut editor = Editor::with_defaults();
        let warnings = editor.load_json(&source).unwrap();
        prop_assert!(warnings.is_empty());
        let again: SerializedNode = serde_json::from_str(&editor.to_json().unwrap()).unwrap();
        prop_assert_eq!(again, export_document(&tree, &registry).unwrap());
    }
}

#[test]
fn unknown_child_type_is_a_warning_not_an_error() {
    let mut editor = Editor::with_defaults();
    let warnings = editor
        .load_json(
            r#"{"type":"root","version":1,"children":[
                {"type":"paragraph","version":1,"children":[]},
                {"type":"poll","version":1,"question":"?"}
            ]}"#,
        )
        .unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].node_type, "poll");
    assert_eq!(editor.tree().children(editor.tree().root()).len(), 1);
}

#[test]
fn malformed_document_leaves_editor_untouched() {
    let mut editor = Editor::with_defaults();
    editor.dispatch(&quire_doc::Command::InsertPageBreak).unwrap();
    let before = editor.to_json().unwrap();
    let err = editor
        .load_json(r#"{"type":"root","version":1,"children":[{"type":"layout-container","version":1,"columns":0,"children":[]}]}"#)
        .unwrap_err();
    assert!(matches!(err, quire_doc::DocError::MalformedPayload { .. }));
    assert_eq!(editor.to_json().unwrap(), before);
}
