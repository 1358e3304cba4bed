//! Shared icon mapping for tree visualization

/// Get the Unicode icon for a node type tag
///
/// Returns a single character that identifies the node type at a glance in
/// treeviz output. Unregistered tags fall back to a hollow circle.
pub fn get_icon(type_tag: &str) -> &'static str {
    match type_tag {
        "root" => "⧉",
        "paragraph" => "¶",
        "text" => "◦",
        "heading" => "§",
        "list" => "☰",
        "listitem" => "•",
        "collapsible-container" => "▸",
        "collapsible-title" => "⊤",
        "collapsible-content" => "➔",
        "image" => "▣",
        "layout-container" => "▥",
        "layout-item" => "▯",
        "equation" => "√",
        "page-break" => "⎯",
        "youtube" => "▶",
        "figma" => "◈",
        _ => "○",
    }
}
