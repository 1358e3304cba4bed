//! Inspect views
//!
//! Each view renders a loaded document tree for a human or a diffing tool:
//!
//! - `treeviz`: one node per line with icons (default)
//! - `json`: the interchange record, pretty-printed
//! - `html`: the bare markup fragment, no page wrapper
//! - `types`: node count per type tag
//!
//! ## Extra Parameters
//!
//! - `show-keys`: "true" appends each node's arena key to its treeviz line
//!
//! Example: `quire inspect doc.json treeviz --extra-show-keys`

use quire_doc::formats::html::export_to_markup;
use quire_doc::formats::json::export_document;
use quire_doc::formats::treeviz::to_treeviz_str;
use quire_doc::{DocumentTree, NodeTypeRegistry};
use std::collections::{BTreeMap, HashMap};

/// All available inspect views
pub const AVAILABLE_TRANSFORMS: &[&str] = &["treeviz", "json", "html", "types"];

/// Render `tree` with the named view.
pub fn execute_transform(
    tree: &DocumentTree,
    registry: &NodeTypeRegistry,
    transform_name: &str,
    extra_params: &HashMap<String, String>,
) -> Result<String, String> {
    match transform_name {
        "treeviz" => {
            let show_keys = extra_params
                .get("show-keys")
                .is_some_and(|v| v == "true");
            to_treeviz_str(tree, registry, tree.root(), show_keys)
                .map_err(|e| format!("Transform failed: {e}"))
        }
        "json" => {
            let record =
                export_document(tree, registry).map_err(|e| format!("Transform failed: {e}"))?;
            let mut out = serde_json::to_string_pretty(&record)
                .map_err(|e| format!("JSON serialization failed: {e}"))?;
            out.push('\n');
            Ok(out)
        }
        "html" => {
            let mut out = export_to_markup(tree, registry, tree.root())
                .map_err(|e| format!("Transform failed: {e}"))?;
            out.push('\n');
            Ok(out)
        }
        "types" => Ok(type_counts(tree)),
        other => Err(format!(
            "Unknown transform '{other}'. Available: {}",
            AVAILABLE_TRANSFORMS.join(", ")
        )),
    }
}

fn type_counts(tree: &DocumentTree) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for key in tree.descendants(tree.root()) {
        if let Some(tag) = tree.type_of(key) {
            *counts.entry(tag).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|(tag, count)| format!("{tag:<24}{count}\n"))
        .collect()
}
