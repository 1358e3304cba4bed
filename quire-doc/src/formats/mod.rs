//! Format implementations
//!
//! Document-level codecs that convert between a [`crate::DocumentTree`] and text.
//! Per-node conversion lives with each node type; these modules only walk the tree.

pub mod html;
pub mod icons;
pub mod json;
pub mod treeviz;

pub use html::{get_default_css, HtmlFormat, HtmlOptions};
pub use json::JsonFormat;
pub use treeviz::TreevizFormat;
