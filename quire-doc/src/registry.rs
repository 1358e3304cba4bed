//! Format registry for format discovery and selection
//!
//! Document-level formats are registered by name and looked up by name or by file
//! extension. Node types have their own registry in [`crate::node_registry`].

use crate::error::{DocError, Result};
use crate::format::Format;
use crate::node_registry::NodeTypeRegistry;
use crate::tree::DocumentTree;
use std::collections::HashMap;

/// Registry of document formats
///
/// # Examples
///
/// ```ignore
/// let registry = FormatRegistry::default();
/// let nodes = NodeTypeRegistry::default();
///
/// let tree = registry.parse(&source, "json", &nodes)?;
/// let html = registry.serialize(&tree, "html", &nodes)?;
/// ```
pub struct FormatRegistry {
    formats: HashMap<String, Box<dyn Format>>,
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        FormatRegistry {
            formats: HashMap::new(),
        }
    }

    /// Register a format, replacing any format of the same name
    pub fn register<F: Format + 'static>(&mut self, format: F) {
        self.formats
            .insert(format.name().to_string(), Box::new(format));
    }

    /// Get a format by name
    pub fn get(&self, name: &str) -> Result<&dyn Format> {
        self.formats
            .get(name)
            .map(|f| f.as_ref())
            .ok_or_else(|| DocError::FormatNotFound(name.to_string()))
    }

    /// Check if a format exists
    pub fn has(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// List all available format names (sorted)
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formats.keys().cloned().collect();
        names.sort();
        names
    }

    /// Detect format from filename based on file extension
    pub fn detect_format_from_filename(&self, filename: &str) -> Option<String> {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())?;

        self.formats
            .values()
            .find(|format| format.file_extensions().contains(&extension))
            .map(|format| format.name().to_string())
    }

    /// Parse source text using the specified format
    pub fn parse(
        &self,
        source: &str,
        format: &str,
        registry: &NodeTypeRegistry,
    ) -> Result<DocumentTree> {
        let fmt = self.get(format)?;
        if !fmt.supports_parsing() {
            return Err(DocError::NotSupported(format!(
                "Format '{format}' does not support parsing"
            )));
        }
        fmt.parse(source, registry)
    }

    /// Serialize a document using the specified format
    pub fn serialize(
        &self,
        tree: &DocumentTree,
        format: &str,
        registry: &NodeTypeRegistry,
    ) -> Result<String> {
        self.serialize_with_options(tree, format, registry, &HashMap::new())
    }

    /// Serialize a document using the specified format and options
    pub fn serialize_with_options(
        &self,
        tree: &DocumentTree,
        format: &str,
        registry: &NodeTypeRegistry,
        options: &HashMap<String, String>,
    ) -> Result<String> {
        let fmt = self.get(format)?;
        if !fmt.supports_serialization() {
            return Err(DocError::NotSupported(format!(
                "Format '{format}' does not support serialization"
            )));
        }
        fmt.serialize_with_options(tree, registry, options)
    }

    /// Create a registry with default formats
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register(crate::formats::json::JsonFormat);
        registry.register(crate::formats::html::HtmlFormat::default());
        registry.register(crate::formats::treeviz::TreevizFormat);

        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
