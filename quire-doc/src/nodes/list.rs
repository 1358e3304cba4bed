//! Bullet and numbered lists
//!
//! Nesting is expressed by a `list` child at the end of a `listitem`. Indenting
//! moves the selected item into its previous sibling's nested list; outdenting
//! lifts it back out after the item that owned that list.

use crate::commands::{Command, CommandBus, CommandKind, HandlerId, PRIORITY_EDITOR};
use crate::editor::{Extension, Transaction};
use crate::error::Result;
use crate::formats::html::dom::{create_element, element_name};
use crate::formats::json::SerializedNode;
use crate::node_type::{
    downcast, fields_from, fields_into, Conversion, ImportContext, NodeClass, NodePayload,
    NodeType,
};
use crate::tree::{DocumentTree, NodeKey};
use log::debug;
use markup5ever_rcdom::Handle;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const LIST_TYPE: &str = "list";
pub const LIST_ITEM_TYPE: &str = "listitem";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    #[default]
    Bullet,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct List {
    #[serde(rename = "listType")]
    pub list_type: ListKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ListItem;

pub struct ListType;

impl NodeType for ListType {
    fn type_tag(&self) -> &'static str {
        LIST_TYPE
    }

    fn class(&self) -> NodeClass {
        NodeClass::Element
    }

    fn create(&self) -> Box<dyn NodePayload> {
        Box::new(List::default())
    }

    fn import_json(&self, record: &SerializedNode) -> Result<Box<dyn NodePayload>> {
        Ok(Box::new(fields_into::<List>(record)?))
    }

    fn export_json(&self, payload: &dyn NodePayload) -> Result<Map<String, Value>> {
        fields_from(LIST_TYPE, downcast::<List>(LIST_TYPE, payload)?)
    }

    fn markup_tags(&self) -> &'static [&'static str] {
        &["ul", "ol"]
    }

    fn import_markup(&self, element: &Handle, _context: &ImportContext<'_>) -> Option<Conversion> {
        let list_type = match element_name(element)?.as_str() {
            "ol" => ListKind::Number,
            _ => ListKind::Bullet,
        };
        Some(Conversion::node(0, List { list_type }, true))
    }

    fn export_markup(&self, payload: &dyn NodePayload) -> Result<Handle> {
        let list = downcast::<List>(LIST_TYPE, payload)?;
        let tag = match list.list_type {
            ListKind::Bullet => "ul",
            ListKind::Number => "ol",
        };
        Ok(create_element(tag, vec![]))
    }

    fn describe(&self, payload: &dyn NodePayload) -> String {
        match downcast::<List>(LIST_TYPE, payload).map(|l| l.list_type) {
            Ok(ListKind::Bullet) => "bullet".to_string(),
            Ok(ListKind::Number) => "number".to_string(),
            Err(_) => String::new(),
        }
    }
}

pub struct ListItemType;

impl NodeType for ListItemType {
    fn type_tag(&self) -> &'static str {
        LIST_ITEM_TYPE
    }

    fn class(&self) -> NodeClass {
        NodeClass::Element
    }

    fn can_contain_text(&self) -> bool {
        true
    }

    fn create(&self) -> Box<dyn NodePayload> {
        Box::new(ListItem)
    }

    fn import_json(&self, _record: &SerializedNode) -> Result<Box<dyn NodePayload>> {
        Ok(Box::new(ListItem))
    }

    fn export_json(&self, _payload: &dyn NodePayload) -> Result<Map<String, Value>> {
        Ok(Map::new())
    }

    fn markup_tags(&self) -> &'static [&'static str] {
        &["li"]
    }

    fn import_markup(&self, _element: &Handle, _context: &ImportContext<'_>) -> Option<Conversion> {
        Some(Conversion::node(0, ListItem, true))
    }

    fn export_markup(&self, _payload: &dyn NodePayload) -> Result<Handle> {
        Ok(create_element("li", vec![]))
    }
}

/// Number of list items among `key` and its ancestors.
pub fn list_item_depth(tree: &DocumentTree, key: NodeKey) -> usize {
    std::iter::once(key)
        .chain(tree.ancestors(key))
        .filter(|k| tree.type_of(*k) == Some(LIST_ITEM_TYPE))
        .count()
}

/// Default indent and outdent behavior for list items
pub struct ListExtension;

impl Extension for ListExtension {
    fn name(&self) -> &'static str {
        "list"
    }

    fn required_types(&self) -> &'static [&'static str] {
        &[LIST_TYPE, LIST_ITEM_TYPE]
    }

    fn register(&self, bus: &mut CommandBus) -> Vec<HandlerId> {
        vec![
            bus.register(CommandKind::IndentContent, PRIORITY_EDITOR, indent_list_item),
            bus.register(CommandKind::OutdentContent, PRIORITY_EDITOR, outdent_list_item),
        ]
    }
}

/// The list item holding the selection, if any.
pub(crate) fn selected_list_item(txn: &Transaction<'_>) -> Option<NodeKey> {
    let selection = txn.selection()?;
    txn.closest_of_type(selection, LIST_ITEM_TYPE)
}

fn indent_list_item(txn: &mut Transaction<'_>, _command: &Command) -> Result<bool> {
    let Some(item) = selected_list_item(txn) else {
        return Ok(false);
    };
    let Some(previous) = txn.tree().previous_sibling(item) else {
        return Ok(false);
    };
    if txn.tree().type_of(previous) != Some(LIST_ITEM_TYPE) {
        return Ok(false);
    }

    let trailing_list = txn
        .tree()
        .children(previous)
        .last()
        .copied()
        .filter(|k| txn.tree().type_of(*k) == Some(LIST_TYPE));
    let nested = match trailing_list {
        Some(list) => list,
        None => {
            let list_type = txn
                .tree()
                .parent(item)
                .and_then(|p| txn.tree().payload_as::<List>(p).ok())
                .map(|l| l.list_type)
                .unwrap_or_default();
            let list = txn.create_node_with(LIST_TYPE, List { list_type })?;
            txn.tree_mut().append(previous, list)?;
            list
        }
    };
    txn.tree_mut().append(nested, item)?;
    debug!(
        "event=indent module=list item={item} depth={}",
        list_item_depth(txn.tree(), item)
    );
    Ok(true)
}

fn outdent_list_item(txn: &mut Transaction<'_>, _command: &Command) -> Result<bool> {
    let Some(item) = selected_list_item(txn) else {
        return Ok(false);
    };
    let tree = txn.tree();
    let Some(list) = tree.parent(item) else {
        return Ok(false);
    };
    let Some(owner) = tree.parent(list).filter(|k| tree.type_of(*k) == Some(LIST_ITEM_TYPE))
    else {
        return Ok(false);
    };

    txn.tree_mut().insert_after(item, owner)?;
    if txn.tree().children(list).is_empty() {
        txn.tree_mut().remove(list)?;
    }
    debug!("event=outdent module=list item={item}");
    Ok(true)
}
