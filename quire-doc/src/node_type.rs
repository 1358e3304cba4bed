//! Node type contract
//!
//! Every node variant is described by a [`NodeType`]: the tag it is stored under,
//! its structural class, and the hooks the codecs call to build, copy, import and
//! export its payload. The payload itself is an opaque [`NodePayload`] that only the
//! owning type module downcasts.

use crate::error::{DocError, Result};
use crate::formats::json::SerializedNode;
use markup5ever_rcdom::Handle;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt::Debug;

/// Type-specific data carried by a node.
pub trait NodePayload: Any + Debug {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn clone_boxed(&self) -> Box<dyn NodePayload>;
}

impl<T: Any + Debug + Clone> NodePayload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn NodePayload> {
        Box::new(self.clone())
    }
}

/// Structural class of a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeClass {
    /// The single document root
    Root,
    /// Owns an ordered child list
    Element,
    /// Owns children and behaves as an insertion boundary, attachable only under
    /// its declared container types
    ShadowRoot,
    /// Self-contained, never has children
    Decorator,
    /// Inline leaf such as text
    Leaf,
}

impl NodeClass {
    pub fn has_children(self) -> bool {
        matches!(self, NodeClass::Root | NodeClass::Element | NodeClass::ShadowRoot)
    }

    /// Root and shadow roots are the boundaries block insertion targets.
    pub fn is_root_like(self) -> bool {
        matches!(self, NodeClass::Root | NodeClass::ShadowRoot)
    }
}

/// Context handed to markup importers.
#[derive(Debug, Clone, Copy)]
pub struct ImportContext<'a> {
    /// Type tag of the node the imported content will be attached to
    pub parent_type: &'a str,
    /// Inline text format bits active at this point of the markup tree
    pub format: u32,
}

/// What a markup importer wants done with an element.
#[derive(Debug)]
pub enum MarkupConversion {
    /// Create a node of the importer's type; when `descend` is set the element's
    /// children are imported into it
    Node {
        payload: Box<dyn NodePayload>,
        descend: bool,
    },
    /// Import the children in the current context with extra text format bits
    Format(u32),
    /// Drop the element and its subtree
    Skip,
}

/// A candidate conversion; the highest priority wins.
#[derive(Debug)]
pub struct Conversion {
    pub priority: i32,
    pub output: MarkupConversion,
}

impl Conversion {
    pub fn node(priority: i32, payload: impl NodePayload, descend: bool) -> Self {
        Conversion {
            priority,
            output: MarkupConversion::Node {
                payload: Box::new(payload),
                descend,
            },
        }
    }
}

/// Behavior contract of a node variant.
pub trait NodeType {
    /// Stable tag used in records and the registry (e.g. "paragraph")
    fn type_tag(&self) -> &'static str;

    fn class(&self) -> NodeClass;

    /// Record version written on export
    fn version(&self) -> u32 {
        1
    }

    /// Container types a shadow root may be attached under
    fn parent_types(&self) -> Option<&'static [&'static str]> {
        None
    }

    /// Whether inline nodes may be attached directly under this type
    fn can_contain_text(&self) -> bool {
        false
    }

    /// Factory for a default payload
    fn create(&self) -> Box<dyn NodePayload>;

    /// Copy a payload; types with shared or derived state override this
    fn clone_payload(&self, payload: &dyn NodePayload) -> Box<dyn NodePayload> {
        payload.clone_boxed()
    }

    /// Build a payload from a serialized record
    fn import_json(&self, record: &SerializedNode) -> Result<Box<dyn NodePayload>>;

    /// Type-specific fields written next to `type` and `version`
    fn export_json(&self, payload: &dyn NodePayload) -> Result<Map<String, Value>>;

    /// Markup element names this type has an importer for
    fn markup_tags(&self) -> &'static [&'static str] {
        &[]
    }

    fn import_markup(&self, _element: &Handle, _context: &ImportContext<'_>) -> Option<Conversion> {
        None
    }

    /// Build the markup element for a payload; element children are appended by
    /// the codec
    fn export_markup(&self, payload: &dyn NodePayload) -> Result<Handle>;

    fn is_inline(&self, _payload: &dyn NodePayload) -> bool {
        false
    }

    /// Short label for tree visualizations
    fn describe(&self, _payload: &dyn NodePayload) -> String {
        String::new()
    }
}

/// Downcast a payload to the concrete type of `node_type`.
pub fn downcast<'a, T: 'static>(node_type: &str, payload: &'a dyn NodePayload) -> Result<&'a T> {
    payload
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| DocError::malformed(node_type, "payload has the wrong type"))
}

/// Deserialize the type fields of a record into a payload struct.
pub fn fields_into<T: DeserializeOwned>(record: &SerializedNode) -> Result<T> {
    serde_json::from_value(Value::Object(record.fields.clone()))
        .map_err(|err| DocError::malformed(&record.node_type, err.to_string()))
}

/// Serialize a payload struct into a field map.
pub fn fields_from<T: Serialize>(node_type: &str, payload: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(other) => Err(DocError::Serialization(format!(
            "'{node_type}' payload serialized to {other}, expected an object"
        ))),
        Err(err) => Err(DocError::Serialization(err.to_string())),
    }
}

/// Reject records written by a newer version of a type.
pub fn check_version(node_type: &dyn NodeType, record: &SerializedNode) -> Result<()> {
    if record.version > node_type.version() {
        return Err(DocError::malformed(
            node_type.type_tag(),
            format!(
                "record version {} is newer than supported version {}",
                record.version,
                node_type.version()
            ),
        ));
    }
    Ok(())
}
