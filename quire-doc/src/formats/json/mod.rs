//! Interchange JSON codec
//!
//! Every node serializes to a record:
//!
//! ```text
//! { "type": "<tag>", "version": 1, ...type fields, "children": [ ... ] }
//! ```
//!
//! Nodes that own children always write `children` (possibly empty); leaf and
//! decorator nodes never do. A whole document is the record of its root.
//!
//! Round-trip law: importing an exported subtree yields a subtree that exports to
//! the same record. Keys are not part of the format, so imported nodes get fresh
//! keys.
//!
//! Import comes in two strengths:
//!     - strict ([`import_subtree`]): an unregistered type anywhere fails the import
//!     - lenient ([`import_subtree_lenient`], [`import_document`]): unknown subtrees
//!       are skipped and reported as [`ImportWarning`]s

use crate::error::{DocError, Result};
use crate::format::Format;
use crate::node_registry::NodeTypeRegistry;
use crate::nodes::base::ROOT_TYPE;
use crate::tree::{DocumentTree, NodeKey};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Serialized form of one node and its subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNode {
    #[serde(rename = "type")]
    pub node_type: String,
    pub version: u32,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SerializedNode>>,
}

impl SerializedNode {
    pub fn new(node_type: &str, version: u32, fields: Map<String, Value>) -> Self {
        SerializedNode {
            node_type: node_type.to_string(),
            version,
            fields,
            children: None,
        }
    }

    pub fn with_children(mut self, children: Vec<SerializedNode>) -> Self {
        self.children = Some(children);
        self
    }
}

/// A subtree skipped during lenient import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportWarning {
    /// Type tag that was not registered
    pub node_type: String,
    /// Child indexes from the import root down to the skipped record
    pub path: Vec<usize>,
}

impl std::fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "skipped unknown node type '{}' at {:?}", self.node_type, self.path)
    }
}

/// Export the subtree rooted at `key`.
pub fn export_subtree(
    tree: &DocumentTree,
    registry: &NodeTypeRegistry,
    key: NodeKey,
) -> Result<SerializedNode> {
    let node = tree.get(key)?;
    let node_type = registry.get(node.type_tag())?;
    let fields = node_type.export_json(node.payload())?;
    let record = SerializedNode::new(node_type.type_tag(), node_type.version(), fields);
    if !node.class().has_children() {
        return Ok(record);
    }
    let children = node
        .children()
        .iter()
        .map(|child| export_subtree(tree, registry, *child))
        .collect::<Result<Vec<_>>>()?;
    Ok(record.with_children(children))
}

/// Export the whole document as its root record.
pub fn export_document(tree: &DocumentTree, registry: &NodeTypeRegistry) -> Result<SerializedNode> {
    export_subtree(tree, registry, tree.root())
}

/// Import a record as a detached subtree, failing on any unknown type.
pub fn import_subtree(
    tree: &mut DocumentTree,
    registry: &NodeTypeRegistry,
    record: &SerializedNode,
) -> Result<NodeKey> {
    let key = import_node(tree, registry, record)?;
    if let Some(children) = &record.children {
        if tree.get(key)?.class().has_children() {
            for child in children {
                let child_key = import_subtree(tree, registry, child)?;
                tree.append(key, child_key)?;
            }
        }
    }
    Ok(key)
}

/// Import a record as a detached subtree, skipping unknown types.
///
/// Returns `None` when the record itself has an unknown type.
pub fn import_subtree_lenient(
    tree: &mut DocumentTree,
    registry: &NodeTypeRegistry,
    record: &SerializedNode,
    warnings: &mut Vec<ImportWarning>,
) -> Result<Option<NodeKey>> {
    let mut path = Vec::new();
    import_lenient_at(tree, registry, record, &mut path, warnings)
}

fn import_lenient_at(
    tree: &mut DocumentTree,
    registry: &NodeTypeRegistry,
    record: &SerializedNode,
    path: &mut Vec<usize>,
    warnings: &mut Vec<ImportWarning>,
) -> Result<Option<NodeKey>> {
    if !registry.has(&record.node_type) {
        warn!(
            "event=skip_unknown_type module=json type={} path={path:?}",
            record.node_type
        );
        warnings.push(ImportWarning {
            node_type: record.node_type.clone(),
            path: path.clone(),
        });
        return Ok(None);
    }
    let key = import_node(tree, registry, record)?;
    if let Some(children) = &record.children {
        if tree.get(key)?.class().has_children() {
            for (index, child) in children.iter().enumerate() {
                path.push(index);
                let child_key = import_lenient_at(tree, registry, child, path, warnings)?;
                path.pop();
                if let Some(child_key) = child_key {
                    tree.append(key, child_key)?;
                }
            }
        }
    }
    Ok(Some(key))
}

fn import_node(
    tree: &mut DocumentTree,
    registry: &NodeTypeRegistry,
    record: &SerializedNode,
) -> Result<NodeKey> {
    let node_type = registry.get(&record.node_type)?;
    crate::node_type::check_version(node_type, record)?;
    if node_type.type_tag() == ROOT_TYPE {
        return Err(DocError::InvalidStructure(
            "a root record can only be imported as a document".to_string(),
        ));
    }
    let payload = node_type.import_json(record)?;
    Ok(tree.create_node(node_type.type_tag(), node_type.class(), payload))
}

/// Replace the document content with the children of a root record.
///
/// Unknown child types are skipped and returned as warnings.
pub fn import_document(
    tree: &mut DocumentTree,
    registry: &NodeTypeRegistry,
    record: &SerializedNode,
) -> Result<Vec<ImportWarning>> {
    if record.node_type != ROOT_TYPE {
        return Err(DocError::Parse(format!(
            "document record must have type '{ROOT_TYPE}', found '{}'",
            record.node_type
        )));
    }
    crate::node_type::check_version(registry.get(ROOT_TYPE)?, record)?;
    let root = tree.root();
    tree.clear_children(root)?;
    let mut warnings = Vec::new();
    let mut path = Vec::new();
    for (index, child) in record.children.iter().flatten().enumerate() {
        path.push(index);
        let key = import_lenient_at(tree, registry, child, &mut path, &mut warnings)?;
        path.pop();
        if let Some(key) = key {
            tree.append(root, key)?;
        }
    }
    Ok(warnings)
}

/// Whether two subtrees export to the same record (keys are ignored).
pub fn subtrees_equal(
    registry: &NodeTypeRegistry,
    left: (&DocumentTree, NodeKey),
    right: (&DocumentTree, NodeKey),
) -> Result<bool> {
    Ok(export_subtree(left.0, registry, left.1)? == export_subtree(right.0, registry, right.1)?)
}

/// Document-level interchange format
#[derive(Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "Interchange JSON (lossless)"
    }

    fn file_extensions(&self) -> &[&str] {
        &["json"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str, registry: &NodeTypeRegistry) -> Result<DocumentTree> {
        let record: SerializedNode =
            serde_json::from_str(source).map_err(|err| DocError::Parse(err.to_string()))?;
        let mut tree = DocumentTree::new();
        import_document(&mut tree, registry, &record)?;
        tree.check_integrity(registry)?;
        tree.take_dirty();
        Ok(tree)
    }

    fn serialize(&self, tree: &DocumentTree, registry: &NodeTypeRegistry) -> Result<String> {
        let record = export_document(tree, registry)?;
        let mut out = serde_json::to_string_pretty(&record)
            .map_err(|err| DocError::Serialization(err.to_string()))?;
        out.push('\n');
        Ok(out)
    }
}
