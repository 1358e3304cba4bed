//! Collapsible sections
//!
//! A `collapsible-container` holds a `collapsible-title` and a
//! `collapsible-content` shadow root. The container's `open` flag is the only
//! state; it maps to the `open` attribute of `<details>`.

use crate::commands::{Command, CommandBus, CommandKind, HandlerId, PRIORITY_EDITOR};
use crate::editor::{Extension, Transaction};
use crate::error::Result;
use crate::formats::html::dom::{create_element, has_attr, has_class};
use crate::formats::json::SerializedNode;
use crate::node_type::{
    downcast, fields_from, fields_into, Conversion, ImportContext, NodeClass, NodePayload,
    NodeType,
};
use crate::nodes::base::PARAGRAPH_TYPE;
use crate::tree::{DocumentTree, NodeKey};
use log::debug;
use markup5ever_rcdom::Handle;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CONTAINER_TYPE: &str = "collapsible-container";
pub const TITLE_TYPE: &str = "collapsible-title";
pub const CONTENT_TYPE: &str = "collapsible-content";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollapsibleContainer {
    pub open: bool,
}

impl Default for CollapsibleContainer {
    fn default() -> Self {
        CollapsibleContainer { open: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollapsibleTitle;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollapsibleContent;

pub fn is_open(tree: &DocumentTree, key: NodeKey) -> Result<bool> {
    Ok(tree.payload_as::<CollapsibleContainer>(key)?.open)
}

pub fn set_open(tree: &mut DocumentTree, key: NodeKey, open: bool) -> Result<()> {
    tree.update_payload::<CollapsibleContainer, _>(key, |c| c.open = open)
}

/// Flip the open flag, returning the new value.
pub fn toggle_open(tree: &mut DocumentTree, key: NodeKey) -> Result<bool> {
    tree.update_payload::<CollapsibleContainer, _>(key, |c| {
        c.open = !c.open;
        c.open
    })
}

pub struct CollapsibleContainerType;

impl NodeType for CollapsibleContainerType {
    fn type_tag(&self) -> &'static str {
        CONTAINER_TYPE
    }

    fn class(&self) -> NodeClass {
        NodeClass::Element
    }

    fn create(&self) -> Box<dyn NodePayload> {
        Box::new(CollapsibleContainer::default())
    }

    fn import_json(&self, record: &SerializedNode) -> Result<Box<dyn NodePayload>> {
        Ok(Box::new(fields_into::<CollapsibleContainer>(record)?))
    }

    fn export_json(&self, payload: &dyn NodePayload) -> Result<Map<String, Value>> {
        fields_from(
            CONTAINER_TYPE,
            downcast::<CollapsibleContainer>(CONTAINER_TYPE, payload)?,
        )
    }

    fn markup_tags(&self) -> &'static [&'static str] {
        &["details"]
    }

    fn import_markup(&self, element: &Handle, _context: &ImportContext<'_>) -> Option<Conversion> {
        let open = has_attr(element, "open");
        Some(Conversion::node(1, CollapsibleContainer { open }, true))
    }

    fn export_markup(&self, payload: &dyn NodePayload) -> Result<Handle> {
        let container = downcast::<CollapsibleContainer>(CONTAINER_TYPE, payload)?;
        let mut attrs = vec![("class", "collapsible-container")];
        if container.open {
            attrs.push(("open", ""));
        }
        Ok(create_element("details", attrs))
    }

    fn describe(&self, payload: &dyn NodePayload) -> String {
        match downcast::<CollapsibleContainer>(CONTAINER_TYPE, payload) {
            Ok(c) if c.open => "open".to_string(),
            Ok(_) => "closed".to_string(),
            Err(_) => String::new(),
        }
    }
}

pub struct CollapsibleTitleType;

impl NodeType for CollapsibleTitleType {
    fn type_tag(&self) -> &'static str {
        TITLE_TYPE
    }

    fn class(&self) -> NodeClass {
        NodeClass::Element
    }

    fn can_contain_text(&self) -> bool {
        true
    }

    fn create(&self) -> Box<dyn NodePayload> {
        Box::new(CollapsibleTitle)
    }

    fn import_json(&self, _record: &SerializedNode) -> Result<Box<dyn NodePayload>> {
        Ok(Box::new(CollapsibleTitle))
    }

    fn export_json(&self, _payload: &dyn NodePayload) -> Result<Map<String, Value>> {
        Ok(Map::new())
    }

    fn markup_tags(&self) -> &'static [&'static str] {
        &["summary"]
    }

    fn import_markup(&self, _element: &Handle, _context: &ImportContext<'_>) -> Option<Conversion> {
        Some(Conversion::node(1, CollapsibleTitle, true))
    }

    fn export_markup(&self, _payload: &dyn NodePayload) -> Result<Handle> {
        Ok(create_element("summary", vec![("class", "collapsible-title")]))
    }
}

pub struct CollapsibleContentType;

impl NodeType for CollapsibleContentType {
    fn type_tag(&self) -> &'static str {
        CONTENT_TYPE
    }

    fn class(&self) -> NodeClass {
        NodeClass::ShadowRoot
    }

    fn parent_types(&self) -> Option<&'static [&'static str]> {
        Some(&[CONTAINER_TYPE])
    }

    fn create(&self) -> Box<dyn NodePayload> {
        Box::new(CollapsibleContent)
    }

    fn import_json(&self, _record: &SerializedNode) -> Result<Box<dyn NodePayload>> {
        Ok(Box::new(CollapsibleContent))
    }

    fn export_json(&self, _payload: &dyn NodePayload) -> Result<Map<String, Value>> {
        Ok(Map::new())
    }

    fn markup_tags(&self) -> &'static [&'static str] {
        &["div"]
    }

    fn import_markup(&self, element: &Handle, context: &ImportContext<'_>) -> Option<Conversion> {
        if context.parent_type != CONTAINER_TYPE || !has_class(element, "collapsible-content") {
            return None;
        }
        Some(Conversion::node(1, CollapsibleContent, true))
    }

    fn export_markup(&self, _payload: &dyn NodePayload) -> Result<Handle> {
        Ok(create_element("div", vec![("class", "collapsible-content")]))
    }
}

pub struct CollapsibleExtension;

impl Extension for CollapsibleExtension {
    fn name(&self) -> &'static str {
        "collapsible"
    }

    fn required_types(&self) -> &'static [&'static str] {
        &[CONTAINER_TYPE, TITLE_TYPE, CONTENT_TYPE, PARAGRAPH_TYPE]
    }

    fn register(&self, bus: &mut CommandBus) -> Vec<HandlerId> {
        vec![
            bus.register(CommandKind::InsertCollapsible, PRIORITY_EDITOR, insert_collapsible),
            bus.register(CommandKind::ToggleCollapsible, PRIORITY_EDITOR, toggle_collapsible),
        ]
    }
}

fn insert_collapsible(txn: &mut Transaction<'_>, _command: &Command) -> Result<bool> {
    let container = txn.create_node_with(CONTAINER_TYPE, CollapsibleContainer { open: true })?;
    let title = txn.create_node(TITLE_TYPE)?;
    let content = txn.create_node(CONTENT_TYPE)?;
    let paragraph = txn.create_node(PARAGRAPH_TYPE)?;
    txn.tree_mut().append(content, paragraph)?;
    txn.tree_mut().append(container, title)?;
    txn.tree_mut().append(container, content)?;
    txn.insert_block(container)?;
    txn.set_selection(Some(title));
    debug!("event=insert module=collapsible key={container}");
    Ok(true)
}

fn toggle_collapsible(txn: &mut Transaction<'_>, command: &Command) -> Result<bool> {
    let Command::ToggleCollapsible { key } = command else {
        return Ok(false);
    };
    let target = txn.target(*key)?;
    let Some(container) = txn.closest_of_type(target, CONTAINER_TYPE) else {
        return Ok(false);
    };
    let open = toggle_open(txn.tree_mut(), container)?;
    debug!("event=toggle module=collapsible key={container} open={open}");
    Ok(true)
}
