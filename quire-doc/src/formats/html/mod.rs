//! HTML format implementation
//!
//! Bidirectional conversion between the document tree and HTML5.
//!
//! # Library Choice
//!
//! We use the `html5ever` + `markup5ever_rcdom` ecosystem for parsing and serialization:
//! - `html5ever`: Browser-grade HTML5 parser from the Servo project, tolerant of the
//!   malformed markup that arrives through paste
//! - `markup5ever_rcdom`: Reference-counted DOM the node types build their export on
//!
//! # Element Mapping Table
//!
//! | Node type               | HTML                                                                 | Import                                  |
//! |-------------------------|----------------------------------------------------------------------|-----------------------------------------|
//! | root                    | (children only)                                                      | body content                            |
//! | paragraph               | `<p>`                                                                | `p`                                     |
//! | heading                 | `<h1>`..`<h6>`                                                       | `h1`..`h6`                              |
//! | list / listitem         | `<ul>`/`<ol>`, `<li>`                                                | `ul`, `ol`, `li`                        |
//! | text                    | text wrapped in `strong`/`em`/`s`/`u`/`code` per format bit          | text; `b`,`i`,`strike`,`del` accepted   |
//! | collapsible-container   | `<details class="collapsible-container" [open]>`                     | `details`                               |
//! | collapsible-title       | `<summary class="collapsible-title">`                                | `summary`                               |
//! | collapsible-content     | `<div class="collapsible-content">`                                  | same, only inside a container           |
//! | image                   | `<figure style="text-align: A"><img class="editor-image">[<figcaption>]` | that figure, or a bare `img`        |
//! | layout-container        | `<div class="layout-container" style="grid-template-columns: ...">` | same                                    |
//! | layout-item             | `<div class="layout-item">`                                          | same, only inside a container           |
//! | equation                | `<span|div class="equation" data-equation data-inline>` + rendering  | same                                    |
//! | page-break              | `<figure class="page-break" style="page-break-after: always">`      | figure with that style or class         |
//! | youtube                 | `<iframe data-youtube-id src=".../embed/ID">`                         | iframe with `data-youtube-id`           |
//! | figma                   | `<div class="figma-embed" data-figma-id>` + iframe                   | same                                    |
//!
//! # Lossy Conversions
//!
//! - Unknown elements are dropped; their content is kept in their place
//! - Inline content outside a block is wrapped in a paragraph
//! - Whitespace-only text between blocks is discarded
//!
//! # Output Format
//!
//! The `html` format emits a self-contained HTML5 page with the baseline stylesheet
//! (`css/baseline.css`) embedded, including the print rules page breaks rely on.
//! Set the `standalone` option to `false` to get the bare fragment.

pub mod dom;
mod parser;
mod serializer;

pub use parser::{import_from_markup, parse_document};
pub use serializer::{export_node, export_to_markup, serialize_document};

use crate::error::{DocError, Result};
use crate::format::Format;
use crate::node_registry::NodeTypeRegistry;
use crate::tree::DocumentTree;
use std::collections::HashMap;

/// Options for HTML serialization
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlOptions {
    /// Wrap the fragment in a complete page with embedded CSS
    pub standalone: bool,
    /// Page title for standalone output
    pub title: String,
    /// Extra CSS appended after the baseline stylesheet
    pub custom_css: Option<String>,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        HtmlOptions {
            standalone: true,
            title: "Quire Document".to_string(),
            custom_css: None,
        }
    }
}

impl HtmlOptions {
    /// Apply string parameters (`standalone`, `title`, `css`) over these options.
    pub fn with_params(mut self, params: &HashMap<String, String>) -> Result<Self> {
        for (key, value) in params {
            match key.as_str() {
                "standalone" => {
                    self.standalone = parse_bool(value).ok_or_else(|| {
                        DocError::NotSupported(format!("invalid boolean '{value}' for standalone"))
                    })?;
                }
                "title" => self.title = value.clone(),
                "css" => self.custom_css = Some(value.clone()),
                other => {
                    return Err(DocError::NotSupported(format!(
                        "unknown html parameter '{other}'"
                    )))
                }
            }
        }
        Ok(self)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Some(true),
        "false" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Get the baseline CSS embedded in standalone output
pub fn get_default_css() -> &'static str {
    include_str!("../../../css/baseline.css")
}

/// Format implementation for HTML
#[derive(Default)]
pub struct HtmlFormat {
    options: HtmlOptions,
}

impl HtmlFormat {
    pub fn new(options: HtmlOptions) -> Self {
        Self { options }
    }
}

impl Format for HtmlFormat {
    fn name(&self) -> &str {
        "html"
    }

    fn description(&self) -> &str {
        "HTML5 markup (standalone page or fragment)"
    }

    fn file_extensions(&self) -> &[&str] {
        &["html", "htm"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str, registry: &NodeTypeRegistry) -> Result<DocumentTree> {
        parse_document(source, registry)
    }

    fn serialize(&self, tree: &DocumentTree, registry: &NodeTypeRegistry) -> Result<String> {
        serialize_document(tree, registry, &self.options)
    }

    fn serialize_with_options(
        &self,
        tree: &DocumentTree,
        registry: &NodeTypeRegistry,
        options: &HashMap<String, String>,
    ) -> Result<String> {
        let options = self.options.clone().with_params(options)?;
        serialize_document(tree, registry, &options)
    }
}
