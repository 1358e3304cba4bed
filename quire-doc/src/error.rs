//! Error types for document operations

use crate::tree::NodeKey;
use thiserror::Error;

/// Errors raised by the registry, the tree, the codecs and command handlers.
///
/// Any error returned from inside [`crate::editor::Editor::update`] discards the
/// whole transaction, so callers never observe a half-applied mutation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocError {
    /// A node type with this tag is already registered
    #[error("node type '{0}' is already registered")]
    DuplicateType(String),

    /// An extension with this name is already installed
    #[error("extension '{0}' is already installed")]
    DuplicateExtension(String),

    /// No node type is registered under this tag
    #[error("unknown node type '{0}'")]
    UnknownType(String),

    /// Attaching `child` under `parent` would create a cycle
    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle { parent: NodeKey, child: NodeKey },

    /// A payload or record failed validation for its type
    #[error("malformed '{node_type}' payload: {message}")]
    MalformedPayload { node_type: String, message: String },

    /// The key does not name a live node
    #[error("node {0} not found")]
    NodeNotFound(NodeKey),

    /// The node cannot own children
    #[error("node {0} cannot have children")]
    NotAnElement(NodeKey),

    /// A structural invariant of the tree would be violated
    #[error("invalid structure: {0}")]
    InvalidStructure(String),

    /// Format not found in the format registry
    #[error("format '{0}' not found")]
    FormatNotFound(String),

    /// The format does not support the requested direction
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// Error while reading a source document
    #[error("parse error: {0}")]
    Parse(String),

    /// Error while producing output
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl DocError {
    pub(crate) fn malformed(node_type: &str, message: impl Into<String>) -> Self {
        DocError::MalformedPayload {
            node_type: node_type.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DocError>;
