//! HTML serialization (tree → markup)
//!
//! Pipeline: DocumentTree → per-node `export_markup` → RcDom → HTML string.
//! Each node type builds its own element; element children are appended here so
//! types never walk the tree themselves.

use super::dom::{append_child, html_escape, serialize_nodes};
use super::HtmlOptions;
use crate::error::Result;
use crate::node_registry::NodeTypeRegistry;
use crate::node_type::NodeClass;
use crate::tree::{DocumentTree, NodeKey};
use markup5ever_rcdom::Handle;

/// Build the markup node for `key` and its subtree.
pub fn export_node(
    tree: &DocumentTree,
    registry: &NodeTypeRegistry,
    key: NodeKey,
) -> Result<Handle> {
    let node = tree.get(key)?;
    let node_type = registry.get(node.type_tag())?;
    let handle = node_type.export_markup(node.payload())?;
    if node.class().has_children() {
        for child in node.children() {
            append_child(&handle, export_node(tree, registry, *child)?);
        }
    }
    Ok(handle)
}

/// Export the subtree at `key` as a markup fragment.
///
/// The root has no element of its own, so exporting it yields its children.
pub fn export_to_markup(
    tree: &DocumentTree,
    registry: &NodeTypeRegistry,
    key: NodeKey,
) -> Result<String> {
    let handles = if tree.get(key)?.class() == NodeClass::Root {
        tree.children(key)
            .iter()
            .map(|child| export_node(tree, registry, *child))
            .collect::<Result<Vec<_>>>()?
    } else {
        vec![export_node(tree, registry, key)?]
    };
    serialize_nodes(&handles)
}

/// Export the whole document, wrapped in a complete page when `options.standalone`.
pub fn serialize_document(
    tree: &DocumentTree,
    registry: &NodeTypeRegistry,
    options: &HtmlOptions,
) -> Result<String> {
    let body = export_to_markup(tree, registry, tree.root())?;
    if !options.standalone {
        return Ok(body);
    }
    Ok(wrap_in_document(&body, options))
}

/// Wrap the content in a complete HTML document with embedded CSS
fn wrap_in_document(body_html: &str, options: &HtmlOptions) -> String {
    let baseline_css = include_str!("../../../css/baseline.css");
    let custom_css = options.custom_css.as_deref().unwrap_or("");
    let escaped_title = html_escape(&options.title);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <meta name="generator" content="quire-doc">
  <title>{escaped_title}</title>
  <style>
{baseline_css}
{custom_css}
  </style>
</head>
<body>
<div class="quire-document">
{body_html}
</div>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::Editor;
    use crate::nodes::base::{Paragraph, TextFormat, TextNode};

    fn editor_with_text(text: &str, format: TextFormat) -> Editor {
        let mut editor = Editor::with_defaults();
        editor
            .update(|txn| {
                let p = txn.create_node_with("paragraph", Paragraph)?;
                let t = txn.create_node_with("text", TextNode::new(text, format))?;
                txn.tree_mut().append(p, t)?;
                txn.insert_block(p)
            })
            .unwrap();
        editor
    }

    #[test]
    fn test_simple_paragraph() {
        let editor = editor_with_text("Hello", TextFormat::default());
        assert_eq!(editor.to_html().unwrap(), "<p>Hello</p>");
    }

    #[test]
    fn test_formatted_text() {
        let editor = editor_with_text("Hi", TextFormat::BOLD | TextFormat::ITALIC);
        assert_eq!(
            editor.to_html().unwrap(),
            "<p><strong><em>Hi</em></strong></p>"
        );
    }

    #[test]
    fn test_standalone_document() {
        let editor = editor_with_text("Body", TextFormat::default());
        let html = editor
            .to_html_document(&HtmlOptions {
                title: "A <b> title".into(),
                ..HtmlOptions::default()
            })
            .unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>A &lt;b&gt; title</title>"));
        assert!(html.contains("page-break-after"));
        assert!(html.contains("<p>Body</p>"));
    }
}
