//! Treeviz formatter for document trees
//!
//! A visual, line-based rendering of the tree, one node per line:
//!
//! <prefix><connector> <icon> <type> <label>
//!
//! Labels come from each node type's `describe` hook and are truncated to 40
//! characters. Example:
//!
//! ⧉ root
//! ├─ § heading h1
//! │ └─ ◦ text "Quire"
//! ├─ ▸ collapsible-container open
//! │ ├─ ⊤ collapsible-title
//! │ └─ ➔ collapsible-content
//! │   └─ ¶ paragraph
//! └─ ⎯ page-break
//!
//! Output only; there is no parser for this format.

use super::icons::get_icon;
use crate::error::Result;
use crate::format::Format;
use crate::node_registry::NodeTypeRegistry;
use crate::tree::{DocumentTree, NodeKey};
use std::collections::HashMap;

const MAX_LABEL: usize = 40;

fn truncate(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL {
        return label.to_string();
    }
    let cut: String = label.chars().take(MAX_LABEL - 1).collect();
    format!("{cut}…")
}

fn node_line(
    tree: &DocumentTree,
    registry: &NodeTypeRegistry,
    key: NodeKey,
    show_keys: bool,
) -> Result<String> {
    let node = tree.get(key)?;
    let label = registry.get(node.type_tag())?.describe(node.payload());
    let mut line = format!("{} {}", get_icon(node.type_tag()), node.type_tag());
    if !label.is_empty() {
        line.push(' ');
        line.push_str(&truncate(&label));
    }
    if show_keys {
        line.push_str(&format!(" {key}"));
    }
    Ok(line)
}

fn format_children(
    tree: &DocumentTree,
    registry: &NodeTypeRegistry,
    key: NodeKey,
    prefix: &str,
    show_keys: bool,
    output: &mut String,
) -> Result<()> {
    let children = tree.children(key);
    for (index, child) in children.iter().enumerate() {
        let is_last = index == children.len() - 1;
        let connector = if is_last { "└─" } else { "├─" };
        output.push_str(&format!(
            "{prefix}{connector} {}\n",
            node_line(tree, registry, *child, show_keys)?
        ));
        let child_prefix = format!("{prefix}{}", if is_last { "  " } else { "│ " });
        format_children(tree, registry, *child, &child_prefix, show_keys, output)?;
    }
    Ok(())
}

/// Render the subtree at `key`.
pub fn to_treeviz_str(
    tree: &DocumentTree,
    registry: &NodeTypeRegistry,
    key: NodeKey,
    show_keys: bool,
) -> Result<String> {
    let mut output = format!("{}\n", node_line(tree, registry, key, show_keys)?);
    format_children(tree, registry, key, "", show_keys, &mut output)?;
    Ok(output)
}

/// Format implementation for treeviz
#[derive(Default)]
pub struct TreevizFormat;

impl Format for TreevizFormat {
    fn name(&self) -> &str {
        "treeviz"
    }

    fn description(&self) -> &str {
        "Visual tree representation with indentation and Unicode icons"
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn serialize(&self, tree: &DocumentTree, registry: &NodeTypeRegistry) -> Result<String> {
        to_treeviz_str(tree, registry, tree.root(), false)
    }

    fn serialize_with_options(
        &self,
        tree: &DocumentTree,
        registry: &NodeTypeRegistry,
        options: &HashMap<String, String>,
    ) -> Result<String> {
        let show_keys = options
            .get("show-keys")
            .map(|v| v == "true")
            .unwrap_or(false);
        to_treeviz_str(tree, registry, tree.root(), show_keys)
    }
}
