//! Multi-column layouts
//!
//! A `layout-container` carries a column count hint and owns one `layout-item`
//! shadow root per column. Changing the hint alone leaves the cells in place;
//! a rebuild makes the cell count match.

use crate::commands::{Command, CommandBus, CommandKind, HandlerId, PRIORITY_EDITOR};
use crate::editor::{Extension, Transaction};
use crate::error::{DocError, Result};
use crate::formats::html::dom::{create_element, element_name, has_class, style_property};
use crate::formats::json::SerializedNode;
use crate::node_type::{
    check_version, downcast, fields_from, fields_into, Conversion, ImportContext, NodeClass,
    NodePayload, NodeType,
};
use crate::nodes::base::PARAGRAPH_TYPE;
use crate::tree::NodeKey;
use log::debug;
use markup5ever_rcdom::Handle;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CONTAINER_TYPE: &str = "layout-container";
pub const ITEM_TYPE: &str = "layout-item";

static REPEAT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"repeat\(\s*(\d+)\s*,").expect("valid grid repeat regex"));

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutContainer {
    pub columns: usize,
}

impl Default for LayoutContainer {
    fn default() -> Self {
        LayoutContainer { columns: 2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutItem;

/// Widest layout a container may hold.
pub const MAX_LAYOUT_COLUMNS: usize = 12;

fn check_columns(columns: usize) -> Result<()> {
    if columns == 0 {
        return Err(DocError::malformed(
            CONTAINER_TYPE,
            "a layout needs at least one column",
        ));
    }
    if columns > MAX_LAYOUT_COLUMNS {
        return Err(DocError::malformed(
            CONTAINER_TYPE,
            format!("a layout has at most {MAX_LAYOUT_COLUMNS} columns, got {columns}"),
        ));
    }
    Ok(())
}

/// Build a detached container with `columns` cells, each holding an empty paragraph.
pub fn create_columns_layout(txn: &mut Transaction<'_>, columns: usize) -> Result<NodeKey> {
    check_columns(columns)?;
    let container = txn.create_node_with(CONTAINER_TYPE, LayoutContainer { columns })?;
    for _ in 0..columns {
        let cell = seeded_cell(txn)?;
        txn.tree_mut().append(container, cell)?;
    }
    Ok(container)
}

fn seeded_cell(txn: &mut Transaction<'_>) -> Result<NodeKey> {
    let cell = txn.create_node(ITEM_TYPE)?;
    let paragraph = txn.create_node(PARAGRAPH_TYPE)?;
    txn.tree_mut().append(cell, paragraph)?;
    Ok(cell)
}

/// Change the column hint without touching the cells.
pub fn set_columns(txn: &mut Transaction<'_>, container: NodeKey, columns: usize) -> Result<()> {
    check_columns(columns)?;
    txn.tree_mut()
        .update_payload::<LayoutContainer, _>(container, |c| c.columns = columns)
}

/// Change the column hint and add or remove cells to match it.
///
/// Content of removed trailing cells is moved to the end of the last kept cell.
pub fn rebuild_columns(
    txn: &mut Transaction<'_>,
    container: NodeKey,
    columns: usize,
) -> Result<()> {
    set_columns(txn, container, columns)?;
    let cells = txn.tree().children(container).to_vec();
    if cells.len() < columns {
        for _ in cells.len()..columns {
            let cell = seeded_cell(txn)?;
            txn.tree_mut().append(container, cell)?;
        }
    } else if cells.len() > columns {
        let last_kept = cells[columns - 1];
        for cell in &cells[columns..] {
            for child in txn.tree().children(*cell).to_vec() {
                txn.tree_mut().append(last_kept, child)?;
            }
            txn.tree_mut().remove(*cell)?;
        }
    }
    debug!("event=rebuild module=layout key={container} columns={columns}");
    Ok(())
}

pub struct LayoutContainerType;

impl NodeType for LayoutContainerType {
    fn type_tag(&self) -> &'static str {
        CONTAINER_TYPE
    }

    fn class(&self) -> NodeClass {
        NodeClass::Element
    }

    fn create(&self) -> Box<dyn NodePayload> {
        Box::new(LayoutContainer::default())
    }

    fn import_json(&self, record: &SerializedNode) -> Result<Box<dyn NodePayload>> {
        check_version(self, record)?;
        let container = fields_into::<LayoutContainer>(record)?;
        check_columns(container.columns)?;
        Ok(Box::new(container))
    }

    fn export_json(&self, payload: &dyn NodePayload) -> Result<Map<String, Value>> {
        fields_from(
            CONTAINER_TYPE,
            downcast::<LayoutContainer>(CONTAINER_TYPE, payload)?,
        )
    }

    fn markup_tags(&self) -> &'static [&'static str] {
        &["div"]
    }

    fn import_markup(&self, element: &Handle, _context: &ImportContext<'_>) -> Option<Conversion> {
        if !has_class(element, "layout-container") {
            return None;
        }
        let from_style = style_property(element, "grid-template-columns")
            .and_then(|value| {
                REPEAT_RE
                    .captures(&value)
                    .and_then(|caps| caps[1].parse::<usize>().ok())
            });
        let columns = from_style
            .unwrap_or_else(|| {
                element
                    .children
                    .borrow()
                    .iter()
                    .filter(|c| element_name(c).is_some() && has_class(c, "layout-item"))
                    .count()
            })
            .clamp(1, MAX_LAYOUT_COLUMNS);
        Some(Conversion::node(1, LayoutContainer { columns }, true))
    }

    fn export_markup(&self, payload: &dyn NodePayload) -> Result<Handle> {
        let container = downcast::<LayoutContainer>(CONTAINER_TYPE, payload)?;
        let style = format!("grid-template-columns: repeat({}, 1fr)", container.columns);
        Ok(create_element(
            "div",
            vec![("class", "layout-container"), ("style", style.as_str())],
        ))
    }

    fn describe(&self, payload: &dyn NodePayload) -> String {
        downcast::<LayoutContainer>(CONTAINER_TYPE, payload)
            .map(|c| format!("{} columns", c.columns))
            .unwrap_or_default()
    }
}

pub struct LayoutItemType;

impl NodeType for LayoutItemType {
    fn type_tag(&self) -> &'static str {
        ITEM_TYPE
    }

    fn class(&self) -> NodeClass {
        NodeClass::ShadowRoot
    }

    fn parent_types(&self) -> Option<&'static [&'static str]> {
        Some(&[CONTAINER_TYPE])
    }

    fn create(&self) -> Box<dyn NodePayload> {
        Box::new(LayoutItem)
    }

    fn import_json(&self, _record: &SerializedNode) -> Result<Box<dyn NodePayload>> {
        Ok(Box::new(LayoutItem))
    }

    fn export_json(&self, _payload: &dyn NodePayload) -> Result<Map<String, Value>> {
        Ok(Map::new())
    }

    fn markup_tags(&self) -> &'static [&'static str] {
        &["div"]
    }

    fn import_markup(&self, element: &Handle, context: &ImportContext<'_>) -> Option<Conversion> {
        if context.parent_type != CONTAINER_TYPE || !has_class(element, "layout-item") {
            return None;
        }
        Some(Conversion::node(1, LayoutItem, true))
    }

    fn export_markup(&self, _payload: &dyn NodePayload) -> Result<Handle> {
        Ok(create_element("div", vec![("class", "layout-item")]))
    }
}

pub struct LayoutExtension;

impl Extension for LayoutExtension {
    fn name(&self) -> &'static str {
        "layout"
    }

    fn required_types(&self) -> &'static [&'static str] {
        &[CONTAINER_TYPE, ITEM_TYPE, PARAGRAPH_TYPE]
    }

    fn register(&self, bus: &mut CommandBus) -> Vec<HandlerId> {
        vec![
            bus.register(CommandKind::InsertLayout, PRIORITY_EDITOR, insert_layout),
            bus.register(CommandKind::UpdateLayout, PRIORITY_EDITOR, update_layout),
        ]
    }
}

fn insert_layout(txn: &mut Transaction<'_>, command: &Command) -> Result<bool> {
    let Command::InsertLayout { columns } = command else {
        return Ok(false);
    };
    let columns = columns.unwrap_or(txn.options().default_layout_columns);
    let container = create_columns_layout(txn, columns)?;
    txn.insert_block(container)?;
    if let Some(first_cell) = txn.tree().children(container).first().copied() {
        let paragraph = txn.tree().children(first_cell).first().copied();
        txn.set_selection(paragraph);
    }
    debug!("event=insert module=layout key={container} columns={columns}");
    Ok(true)
}

fn update_layout(txn: &mut Transaction<'_>, command: &Command) -> Result<bool> {
    let Command::UpdateLayout {
        key,
        columns,
        rebuild,
    } = command
    else {
        return Ok(false);
    };
    let target = txn.target(*key)?;
    let Some(container) = txn.closest_of_type(target, CONTAINER_TYPE) else {
        return Ok(false);
    };
    if *rebuild {
        rebuild_columns(txn, container, *columns)?;
    } else {
        set_columns(txn, container, *columns)?;
    }
    Ok(true)
}
