//! Format trait definition
//!
//! This module defines the Format trait that every document-level format implements.
//! A format converts between a textual representation and a [`DocumentTree`], using
//! the node registry to build and read node payloads.

use crate::error::{DocError, Result};
use crate::node_registry::NodeTypeRegistry;
use crate::tree::DocumentTree;
use std::collections::HashMap;

/// Trait for document formats
///
/// Formats can support parsing, serialization, or both.
///
/// # Examples
///
/// ```ignore
/// struct MyFormat;
///
/// impl Format for MyFormat {
///     fn name(&self) -> &str {
///         "my-format"
///     }
///
///     fn supports_serialization(&self) -> bool {
///         true
///     }
///
///     fn serialize(&self, tree: &DocumentTree, registry: &NodeTypeRegistry) -> Result<String> {
///         todo!()
///     }
/// }
/// ```
pub trait Format: Send + Sync {
    /// The name of this format (e.g., "json", "html")
    fn name(&self) -> &str;

    /// Optional description of this format
    fn description(&self) -> &str {
        ""
    }

    /// File extensions associated with this format, without the leading dot
    fn file_extensions(&self) -> &[&str] {
        &[]
    }

    /// Whether this format supports parsing (source → tree)
    fn supports_parsing(&self) -> bool {
        false
    }

    /// Whether this format supports serialization (tree → source)
    fn supports_serialization(&self) -> bool {
        false
    }

    /// Parse source text into a document tree
    fn parse(&self, _source: &str, _registry: &NodeTypeRegistry) -> Result<DocumentTree> {
        Err(DocError::NotSupported(format!(
            "Format '{}' does not support parsing",
            self.name()
        )))
    }

    /// Serialize a document tree into text
    fn serialize(&self, _tree: &DocumentTree, _registry: &NodeTypeRegistry) -> Result<String> {
        Err(DocError::NotSupported(format!(
            "Format '{}' does not support serialization",
            self.name()
        )))
    }

    /// Serialize with format-specific parameters.
    ///
    /// The default implementation accepts no parameters and delegates to
    /// [`Format::serialize`].
    fn serialize_with_options(
        &self,
        tree: &DocumentTree,
        registry: &NodeTypeRegistry,
        options: &HashMap<String, String>,
    ) -> Result<String> {
        if options.is_empty() {
            self.serialize(tree, registry)
        } else {
            Err(DocError::NotSupported(format!(
                "Format '{}' does not support extra parameters",
                self.name()
            )))
        }
    }
}
