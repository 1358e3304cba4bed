//! Page breaks

use crate::commands::{Command, CommandBus, CommandKind, HandlerId, PRIORITY_EDITOR};
use crate::editor::{Extension, Transaction};
use crate::error::Result;
use crate::formats::html::dom::{create_element, has_class, style_property};
use crate::formats::json::SerializedNode;
use crate::node_type::{
    check_version, Conversion, ImportContext, NodeClass, NodePayload, NodeType,
};
use log::debug;
use markup5ever_rcdom::Handle;
use serde_json::{Map, Value};

pub const PAGE_BREAK_TYPE: &str = "page-break";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageBreak;

pub struct PageBreakType;

impl NodeType for PageBreakType {
    fn type_tag(&self) -> &'static str {
        PAGE_BREAK_TYPE
    }

    fn class(&self) -> NodeClass {
        NodeClass::Decorator
    }

    fn create(&self) -> Box<dyn NodePayload> {
        Box::new(PageBreak)
    }

    fn import_json(&self, record: &SerializedNode) -> Result<Box<dyn NodePayload>> {
        check_version(self, record)?;
        Ok(Box::new(PageBreak))
    }

    fn export_json(&self, _payload: &dyn NodePayload) -> Result<Map<String, Value>> {
        Ok(Map::new())
    }

    fn markup_tags(&self) -> &'static [&'static str] {
        &["figure"]
    }

    fn import_markup(&self, element: &Handle, _context: &ImportContext<'_>) -> Option<Conversion> {
        let breaks_after = style_property(element, "page-break-after").as_deref() == Some("always");
        if !breaks_after && !has_class(element, "page-break") {
            return None;
        }
        Some(Conversion::node(1, PageBreak, false))
    }

    fn export_markup(&self, _payload: &dyn NodePayload) -> Result<Handle> {
        Ok(create_element(
            "figure",
            vec![
                ("class", "page-break"),
                ("style", "page-break-after: always"),
            ],
        ))
    }
}

pub struct PageBreakExtension;

impl Extension for PageBreakExtension {
    fn name(&self) -> &'static str {
        "page-break"
    }

    fn required_types(&self) -> &'static [&'static str] {
        &[PAGE_BREAK_TYPE]
    }

    fn register(&self, bus: &mut CommandBus) -> Vec<HandlerId> {
        vec![bus.register(
            CommandKind::InsertPageBreak,
            PRIORITY_EDITOR,
            insert_page_break,
        )]
    }
}

fn insert_page_break(txn: &mut Transaction<'_>, _command: &Command) -> Result<bool> {
    let key = txn.create_node(PAGE_BREAK_TYPE)?;
    txn.insert_block(key)?;
    debug!("event=insert module=page_break key={key}");
    Ok(true)
}
