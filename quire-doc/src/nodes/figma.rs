//! Figma embeds
//!
//! The payload keeps the document URL as pasted. The embed player URL is
//! derived from it at export time.

use crate::commands::{Command, CommandBus, CommandKind, HandlerId, PRIORITY_EDITOR};
use crate::editor::{Extension, Transaction};
use crate::error::{DocError, Result};
use crate::formats::html::dom::{append_child, attr, create_element, has_class};
use crate::formats::json::SerializedNode;
use crate::node_type::{
    check_version, downcast, fields_from, fields_into, Conversion, ImportContext, NodeClass,
    NodePayload, NodeType,
};
use log::{debug, warn};
use markup5ever_rcdom::Handle;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

pub const FIGMA_TYPE: &str = "figma";

const FIGMA_HOSTS: &[&str] = &["figma.com", "www.figma.com"];

static FIGMA_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/(file|proto)/[^/]+").expect("valid figma path regex"));

/// Whether `url` points at a Figma file or prototype on figma.com.
pub fn is_valid_figma_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let host = parsed.host_str().map(str::to_ascii_lowercase);
    host.is_some_and(|h| FIGMA_HOSTS.contains(&h.as_str()))
        && FIGMA_PATH_RE.is_match(parsed.path())
}

/// Player URL embedding the document at `document_url`.
pub fn embed_url(document_url: &str) -> Result<String> {
    Url::parse_with_params(
        "https://www.figma.com/embed",
        &[("embed_host", "share"), ("url", document_url)],
    )
    .map(String::from)
    .map_err(|err| DocError::Serialization(format!("figma embed url: {err}")))
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Figma {
    #[serde(rename = "documentId")]
    pub document_id: String,
}

pub struct FigmaType;

impl NodeType for FigmaType {
    fn type_tag(&self) -> &'static str {
        FIGMA_TYPE
    }

    fn class(&self) -> NodeClass {
        NodeClass::Decorator
    }

    fn create(&self) -> Box<dyn NodePayload> {
        Box::new(Figma::default())
    }

    fn import_json(&self, record: &SerializedNode) -> Result<Box<dyn NodePayload>> {
        check_version(self, record)?;
        Ok(Box::new(fields_into::<Figma>(record)?))
    }

    fn export_json(&self, payload: &dyn NodePayload) -> Result<Map<String, Value>> {
        fields_from(FIGMA_TYPE, downcast::<Figma>(FIGMA_TYPE, payload)?)
    }

    fn markup_tags(&self) -> &'static [&'static str] {
        &["div"]
    }

    fn import_markup(&self, element: &Handle, _context: &ImportContext<'_>) -> Option<Conversion> {
        if !has_class(element, "figma-embed") {
            return None;
        }
        let document_id = attr(element, "data-figma-id").filter(|u| is_valid_figma_url(u))?;
        Some(Conversion::node(1, Figma { document_id }, false))
    }

    fn export_markup(&self, payload: &dyn NodePayload) -> Result<Handle> {
        let figma = downcast::<Figma>(FIGMA_TYPE, payload)?;
        let element = create_element(
            "div",
            vec![
                ("class", "figma-embed"),
                ("data-figma-id", figma.document_id.as_str()),
            ],
        );
        let src = embed_url(&figma.document_id)?;
        append_child(
            &element,
            create_element(
                "iframe",
                vec![
                    ("src", src.as_str()),
                    ("class", "figma-iframe"),
                    ("allowfullscreen", ""),
                    ("title", "Figma Document"),
                ],
            ),
        );
        Ok(element)
    }

    fn describe(&self, payload: &dyn NodePayload) -> String {
        downcast::<Figma>(FIGMA_TYPE, payload)
            .map(|f| f.document_id.clone())
            .unwrap_or_default()
    }
}

pub struct FigmaExtension;

impl Extension for FigmaExtension {
    fn name(&self) -> &'static str {
        "figma"
    }

    fn required_types(&self) -> &'static [&'static str] {
        &[FIGMA_TYPE]
    }

    fn register(&self, bus: &mut CommandBus) -> Vec<HandlerId> {
        vec![bus.register(CommandKind::InsertFigma, PRIORITY_EDITOR, insert_figma)]
    }
}

fn insert_figma(txn: &mut Transaction<'_>, command: &Command) -> Result<bool> {
    let Command::InsertFigma { document_id } = command else {
        return Ok(false);
    };
    let document_id = document_id.trim();
    if !is_valid_figma_url(document_id) {
        warn!("event=insert_rejected module=figma reason=invalid_url url={document_id}");
        return Ok(false);
    }
    let key = txn.create_node_with(
        FIGMA_TYPE,
        Figma {
            document_id: document_id.to_string(),
        },
    )?;
    txn.insert_block(key)?;
    debug!("event=insert module=figma key={key}");
    Ok(true)
}
