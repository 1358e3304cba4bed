//! HTML parsing (markup → tree)
//!
//! The fragment is parsed with html5ever, then the body is walked element by
//! element. For each element every registered importer for its tag is asked for a
//! [`Conversion`]; the highest priority wins, earlier registrations winning ties.
//!
//! Elements nobody claims are dropped and their children are imported in their
//! place, so text inside unknown wrappers survives. Inline nodes that land where
//! only blocks may live are gathered into the registry's block wrapper type, and
//! whitespace-only text between blocks is ignored.

use super::dom::{element_name, parse_body};
use crate::error::Result;
use crate::node_registry::NodeTypeRegistry;
use crate::node_type::{Conversion, ImportContext, MarkupConversion};
use crate::nodes::base::{TextFormat, TextNode, ROOT_TYPE, TEXT_TYPE};
use crate::tree::{DocumentTree, NodeKey};
use log::trace;
use markup5ever_rcdom::{Handle, NodeData};

const IGNORED_ELEMENTS: &[&str] = &["script", "style", "template", "noscript", "head"];

/// Import a markup fragment as detached top-level nodes, in document order.
pub fn import_from_markup(
    tree: &mut DocumentTree,
    registry: &NodeTypeRegistry,
    fragment: &str,
) -> Result<Vec<NodeKey>> {
    let body = parse_body(fragment)?;
    let mut importer = MarkupImporter { tree, registry };
    let mut sink = Sink::detached(ROOT_TYPE);
    importer.import_children(&body, &mut sink, 0)?;
    Ok(sink.out)
}

/// Parse a complete markup document into a fresh tree.
pub fn parse_document(source: &str, registry: &NodeTypeRegistry) -> Result<DocumentTree> {
    let mut tree = DocumentTree::new();
    let keys = import_from_markup(&mut tree, registry, source)?;
    let root = tree.root();
    for key in keys {
        tree.append(root, key)?;
    }
    tree.check_integrity(registry)?;
    tree.take_dirty();
    Ok(tree)
}

/// Where imported nodes go: a parent node, or a detached list at the top level.
struct Sink {
    parent: Option<NodeKey>,
    parent_type: &'static str,
    text_capable: bool,
    wrapper: Option<NodeKey>,
    out: Vec<NodeKey>,
}

impl Sink {
    fn detached(parent_type: &'static str) -> Self {
        Sink {
            parent: None,
            parent_type,
            text_capable: false,
            wrapper: None,
            out: Vec::new(),
        }
    }
}

struct MarkupImporter<'a> {
    tree: &'a mut DocumentTree,
    registry: &'a NodeTypeRegistry,
}

impl MarkupImporter<'_> {
    fn import_children(&mut self, element: &Handle, sink: &mut Sink, format: u32) -> Result<()> {
        let children = element.children.borrow().clone();
        for child in &children {
            match &child.data {
                NodeData::Text { contents } => {
                    let text = contents.borrow().to_string();
                    self.import_text(&text, sink, format)?;
                }
                NodeData::Element { .. } => self.import_element(child, sink, format)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn import_text(&mut self, text: &str, sink: &mut Sink, format: u32) -> Result<()> {
        if text.is_empty() || (!sink.text_capable && text.trim().is_empty()) {
            return Ok(());
        }
        let text_type = self.registry.get(TEXT_TYPE)?;
        let key = self.tree.create_node(
            text_type.type_tag(),
            text_type.class(),
            Box::new(TextNode::new(text, TextFormat::from_bits(format))),
        );
        self.emit(sink, key, true)
    }

    fn import_element(&mut self, element: &Handle, sink: &mut Sink, format: u32) -> Result<()> {
        let Some(tag) = element_name(element) else {
            return Ok(());
        };
        if IGNORED_ELEMENTS.contains(&tag.as_str()) {
            return Ok(());
        }

        let context = ImportContext {
            parent_type: sink.parent_type,
            format,
        };
        let mut best: Option<(&'static str, Conversion)> = None;
        for node_type in self.registry.types_for_markup_tag(&tag) {
            if let Some(conversion) = node_type.import_markup(element, &context) {
                if best
                    .as_ref()
                    .map_or(true, |(_, b)| conversion.priority > b.priority)
                {
                    best = Some((node_type.type_tag(), conversion));
                }
            }
        }

        let Some((type_tag, conversion)) = best else {
            trace!("event=lift_unknown_element module=html tag={tag}");
            return self.import_children(element, sink, format);
        };

        match conversion.output {
            MarkupConversion::Skip => Ok(()),
            MarkupConversion::Format(bits) => self.import_children(element, sink, format | bits),
            MarkupConversion::Node { payload, descend } => {
                let node_type = self.registry.get(type_tag)?;
                let inline = node_type.is_inline(payload.as_ref());
                let key = self
                    .tree
                    .create_node(node_type.type_tag(), node_type.class(), payload);
                if descend && node_type.class().has_children() {
                    let mut inner = Sink {
                        parent: Some(key),
                        parent_type: node_type.type_tag(),
                        text_capable: node_type.can_contain_text(),
                        wrapper: None,
                        out: Vec::new(),
                    };
                    self.import_children(element, &mut inner, format)?;
                }
                self.emit(sink, key, inline)
            }
        }
    }

    fn emit(&mut self, sink: &mut Sink, key: NodeKey, inline: bool) -> Result<()> {
        if inline && !sink.text_capable {
            let wrapper = match sink.wrapper {
                Some(wrapper) => wrapper,
                None => {
                    let (tag, class, payload) =
                        self.registry.create(self.registry.block_wrapper())?;
                    let wrapper = self.tree.create_node(tag, class, payload);
                    self.place(sink, wrapper)?;
                    sink.wrapper = Some(wrapper);
                    wrapper
                }
            };
            return self.tree.append(wrapper, key);
        }
        if !inline {
            sink.wrapper = None;
        }
        self.place(sink, key)
    }

    fn place(&mut self, sink: &mut Sink, key: NodeKey) -> Result<()> {
        match sink.parent {
            Some(parent) => self.tree.append(parent, key),
            None => {
                sink.out.push(key);
                Ok(())
            }
        }
    }
}
