//! Small helpers over the `markup5ever_rcdom` tree
//!
//! Node type modules build and inspect markup through these instead of touching
//! `NodeData` directly.

use crate::error::{DocError, Result};
use html5ever::tendril::TendrilSink;
use html5ever::{
    ns, parse_document, serialize, serialize::SerializeOpts, serialize::TraversalScope, Attribute,
    LocalName, ParseOpts, QualName,
};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Create an element node with attributes
pub fn create_element(tag: &str, attrs: Vec<(&str, &str)>) -> Handle {
    let qual_name = QualName::new(None, ns!(html), LocalName::from(tag));
    let attributes = attrs
        .into_iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.to_string().into(),
        })
        .collect();

    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Element {
            name: qual_name,
            attrs: RefCell::new(attributes),
            template_contents: Default::default(),
            mathml_annotation_xml_integration_point: false,
        },
    })
}

/// Create a text node
pub fn create_text(text: &str) -> Handle {
    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Text {
            contents: RefCell::new(text.to_string().into()),
        },
    })
}

pub fn append_child(parent: &Handle, child: Handle) {
    parent.children.borrow_mut().push(child);
}

/// Local name of an element, `None` for other node kinds
pub fn element_name(handle: &Handle) -> Option<String> {
    match &handle.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

pub fn attr(handle: &Handle, name: &str) -> Option<String> {
    match &handle.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

pub fn has_attr(handle: &Handle, name: &str) -> bool {
    attr(handle, name).is_some()
}

pub fn has_class(handle: &Handle, class: &str) -> bool {
    attr(handle, "class").is_some_and(|value| value.split_whitespace().any(|c| c == class))
}

/// Value of one declaration in the inline `style` attribute, lowercased and trimmed
pub fn style_property(handle: &Handle, property: &str) -> Option<String> {
    let style = attr(handle, "style")?;
    style.split(';').find_map(|declaration| {
        let (name, value) = declaration.split_once(':')?;
        (name.trim().eq_ignore_ascii_case(property)).then(|| value.trim().to_ascii_lowercase())
    })
}

/// First descendant element with the given tag, depth first
pub fn find_descendant(handle: &Handle, tag: &str) -> Option<Handle> {
    for child in handle.children.borrow().iter() {
        if element_name(child).as_deref() == Some(tag) {
            return Some(child.clone());
        }
        if let Some(found) = find_descendant(child, tag) {
            return Some(found);
        }
    }
    None
}

/// Concatenated text of all descendant text nodes
pub fn text_content(handle: &Handle) -> String {
    let mut out = String::new();
    collect_text(handle, &mut out);
    out
}

fn collect_text(handle: &Handle, out: &mut String) {
    if let NodeData::Text { contents } = &handle.data {
        out.push_str(&contents.borrow());
    }
    for child in handle.children.borrow().iter() {
        collect_text(child, out);
    }
}

/// Parse markup with the HTML5 algorithm and return the `<body>` element.
pub fn parse_body(source: &str) -> Result<Handle> {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(source);
    let html = dom
        .document
        .children
        .borrow()
        .iter()
        .find(|c| element_name(c).as_deref() == Some("html"))
        .cloned()
        .ok_or_else(|| DocError::Parse("markup has no html element".to_string()))?;
    let body = html
        .children
        .borrow()
        .iter()
        .find(|c| element_name(c).as_deref() == Some("body"))
        .cloned()
        .ok_or_else(|| DocError::Parse("markup has no body element".to_string()))?;
    Ok(body)
}

/// Parse a fragment into detached top-level nodes.
pub fn parse_fragment_nodes(source: &str) -> Result<Vec<Handle>> {
    let body = parse_body(source)?;
    let nodes = body.children.borrow().clone();
    Ok(nodes)
}

/// Serialize nodes (and their subtrees) to a markup string
pub fn serialize_nodes(nodes: &[Handle]) -> Result<String> {
    let mut output = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };

    for node in nodes {
        let serializable = SerializableHandle::from(node.clone());
        serialize(&mut output, &serializable, opts.clone()).map_err(|e| {
            DocError::Serialization(format!("HTML serialization failed: {e}"))
        })?;
    }

    String::from_utf8(output)
        .map_err(|e| DocError::Serialization(format!("UTF-8 conversion failed: {e}")))
}

/// Escape HTML special characters in text
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
