//! Structured rich-document engine
//!
//!     A document is a tree of typed nodes. The set of node types is open: each type
//!     registers its tag, structural class and conversion hooks with a registry, and
//!     everything else (the tree, the codecs, the editor) works through that
//!     registry without knowing any concrete payload.
//!
//!     This is a pure lib, shell agnostic: no printing, no env vars, no files. The
//!     quire-cli crate is the shell around it.
//!
//! Architecture
//!
//!     .
//!     ├── error.rs                # DocError
//!     ├── node_type.rs            # NodeType trait, NodePayload, markup conversions
//!     ├── node_registry.rs        # NodeTypeRegistry: tag → behavior
//!     ├── tree.rs                 # DocumentTree arena, NodeKey
//!     ├── commands.rs             # Command catalog, prioritized CommandBus
//!     ├── editor.rs               # Editor, transactions, listeners, extensions
//!     ├── format.rs               # Format trait (document-level codecs)
//!     ├── registry.rs             # FormatRegistry for discovery and selection
//!     ├── formats
//!     │   ├── json                # Interchange records (lossless)
//!     │   ├── html                # HTML5 import and export (lossy-tolerant)
//!     │   └── treeviz             # Visual tree dump
//!     └── nodes                   # Built-in node types and their extensions
//!
//! Node Model
//!
//!     A node is a key, a type tag, a structural class and an opaque payload. The
//!     classes are:
//!
//!     - root: the single document root
//!     - element: owns an ordered child list
//!     - shadow root: owns children, acts as an insertion boundary and may only
//!       live under the container types it declares
//!     - decorator: self-contained embed, no children
//!     - leaf: inline content such as text
//!
//!     Nodes live in one arena keyed by NodeKey; parents and children refer to each
//!     other by key. This keeps the tree cheap to clone, which is what makes
//!     transactions all-or-nothing: a transaction runs against a copy, and the copy
//!     only replaces the committed state if every step succeeded.
//!
//! Commands
//!
//!     Editing operations are data (the Command enum). Extensions register handlers
//!     for a command kind at an integer priority; dispatch tries handlers from the
//!     highest priority down and stops at the first that reports the command
//!     handled. This is how the list indent limiter overrides the default indent.
//!
//! Formats
//!
//!     - json: the interchange document, one record per node, round-trips exactly
//!     - html: standalone page or fragment; unknown markup is dropped with its text kept
//!     - treeviz: output only, for inspection
//!
//! Testing
//!
//!     tests
//!     └── <area>
//!         └── <testname>.rs
//!
//!     Note that rust does not by default discover tests in subdirectories, so they
//!     are included from tests/lib.rs.

pub mod commands;
pub mod editor;
pub mod error;
pub mod format;
pub mod formats;
pub mod node_registry;
pub mod node_type;
pub mod nodes;
pub mod registry;
pub mod tree;

pub use commands::{Command, CommandBus, CommandKind, HandlerId};
pub use editor::{Editor, EditorOptions, EditorState, Extension, Transaction, UpdateEvent};
pub use error::{DocError, Result};
pub use format::Format;
pub use formats::{HtmlFormat, HtmlOptions, JsonFormat, TreevizFormat};
pub use node_registry::NodeTypeRegistry;
pub use node_type::{NodeClass, NodePayload, NodeType};
pub use registry::FormatRegistry;
pub use tree::{DocumentTree, Node, NodeKey};
