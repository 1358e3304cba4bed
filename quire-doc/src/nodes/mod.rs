//! Built-in node types and their behavior extensions
//!
//! Each module owns one feature: its payload structs, the [`NodeType`] impls the
//! registry dispatches to, and an [`Extension`] with the feature's command
//! handlers.
//!
//! | Module        | Types                                                        | Extension         |
//! |---------------|--------------------------------------------------------------|-------------------|
//! | `base`        | root, paragraph, text, heading                               | `base`            |
//! | `list`        | list, listitem                                               | `list`            |
//! | `list_indent` |                                                              | `list-max-indent` |
//! | `collapsible` | collapsible-container, collapsible-title, collapsible-content | `collapsible`     |
//! | `image`       | image                                                        | `image`           |
//! | `layout`      | layout-container, layout-item                                | `layout`          |
//! | `equation`    | equation                                                     | `equation`        |
//! | `page_break`  | page-break                                                   | `page-break`      |
//! | `youtube`     | youtube                                                      | `youtube`         |
//! | `figma`       | figma                                                        | `figma`           |

pub mod base;
pub mod collapsible;
pub mod equation;
pub mod figma;
pub mod image;
pub mod layout;
pub mod list;
pub mod list_indent;
pub mod page_break;
pub mod youtube;

use crate::editor::Extension;
use crate::node_type::NodeType;

/// Every built-in node type, in registration order.
///
/// Order matters for markup import: when two types claim an element with the
/// same priority, the one registered first wins.
pub fn builtin_types() -> Vec<Box<dyn NodeType>> {
    vec![
        Box::new(base::RootType),
        Box::new(base::ParagraphType),
        Box::new(base::TextType),
        Box::new(base::HeadingType),
        Box::new(list::ListType),
        Box::new(list::ListItemType),
        Box::new(collapsible::CollapsibleContainerType),
        Box::new(collapsible::CollapsibleTitleType),
        Box::new(collapsible::CollapsibleContentType),
        Box::new(image::ImageType),
        Box::new(layout::LayoutContainerType),
        Box::new(layout::LayoutItemType),
        Box::new(equation::EquationType),
        Box::new(page_break::PageBreakType),
        Box::new(youtube::YouTubeType),
        Box::new(figma::FigmaType),
    ]
}

/// Every built-in extension.
pub fn builtin_extensions() -> Vec<Box<dyn Extension>> {
    vec![
        Box::new(base::BaseExtension),
        Box::new(list::ListExtension),
        Box::new(list_indent::ListIndentLimit),
        Box::new(collapsible::CollapsibleExtension),
        Box::new(image::ImageExtension),
        Box::new(layout::LayoutExtension),
        Box::new(equation::EquationExtension),
        Box::new(page_break::PageBreakExtension),
        Box::new(youtube::YouTubeExtension),
        Box::new(figma::FigmaExtension),
    ]
}
