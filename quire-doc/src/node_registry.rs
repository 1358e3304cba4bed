//! Node type registry
//!
//! Maps type tags to [`NodeType`] behavior. Codecs and transactions never match on
//! concrete payload types; they look the tag up here and call the type's hooks.

use crate::error::{DocError, Result};
use crate::node_type::{NodeClass, NodePayload, NodeType};
use log::debug;
use std::collections::HashMap;

/// Registry of node types
///
/// # Examples
///
/// ```ignore
/// let mut registry = NodeTypeRegistry::new();
/// registry.register(ParagraphType)?;
///
/// let paragraph = registry.get("paragraph")?;
/// let payload = paragraph.create();
/// ```
pub struct NodeTypeRegistry {
    types: HashMap<&'static str, Box<dyn NodeType>>,
    order: Vec<&'static str>,
    block_wrapper: &'static str,
}

impl NodeTypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        NodeTypeRegistry {
            types: HashMap::new(),
            order: Vec::new(),
            block_wrapper: crate::nodes::base::PARAGRAPH_TYPE,
        }
    }

    /// Register a node type
    ///
    /// Fails with [`DocError::DuplicateType`] if the tag is already taken.
    pub fn register<T: NodeType + 'static>(&mut self, node_type: T) -> Result<()> {
        self.register_boxed(Box::new(node_type))
    }

    pub fn register_boxed(&mut self, node_type: Box<dyn NodeType>) -> Result<()> {
        let tag = node_type.type_tag();
        if self.types.contains_key(tag) {
            return Err(DocError::DuplicateType(tag.to_string()));
        }
        debug!("event=register_node_type module=node_registry type={tag}");
        self.order.push(tag);
        self.types.insert(tag, node_type);
        Ok(())
    }

    /// Get a node type by tag
    pub fn get(&self, tag: &str) -> Result<&dyn NodeType> {
        self.types
            .get(tag)
            .map(|t| t.as_ref())
            .ok_or_else(|| DocError::UnknownType(tag.to_string()))
    }

    /// Check if a node type exists
    pub fn has(&self, tag: &str) -> bool {
        self.types.contains_key(tag)
    }

    /// List all registered type tags (sorted)
    pub fn list_types(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.order.iter().map(|t| t.to_string()).collect();
        tags.sort();
        tags
    }

    /// Types with a markup importer for `tag`, in registration order
    pub fn types_for_markup_tag(&self, tag: &str) -> Vec<&dyn NodeType> {
        self.order
            .iter()
            .filter_map(|t| self.types.get(t))
            .filter(|t| t.markup_tags().contains(&tag))
            .map(|t| t.as_ref())
            .collect()
    }

    /// Build a default payload for `tag`, returning the static tag and class with it
    pub fn create(&self, tag: &str) -> Result<(&'static str, NodeClass, Box<dyn NodePayload>)> {
        let node_type = self.get(tag)?;
        Ok((node_type.type_tag(), node_type.class(), node_type.create()))
    }

    /// Type used to wrap stray inline content at block level
    pub fn block_wrapper(&self) -> &'static str {
        self.block_wrapper
    }

    pub fn set_block_wrapper(&mut self, tag: &str) -> Result<()> {
        let node_type = self.get(tag)?;
        if !node_type.can_contain_text() {
            return Err(DocError::InvalidStructure(format!(
                "'{tag}' cannot hold inline content"
            )));
        }
        self.block_wrapper = node_type.type_tag();
        Ok(())
    }

    /// Create a registry with every built-in node type
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for node_type in crate::nodes::builtin_types() {
            if let Err(err) = registry.register_boxed(node_type) {
                log::error!("event=register_builtin_failed module=node_registry error={err}");
            }
        }
        registry
    }
}

impl Default for NodeTypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
