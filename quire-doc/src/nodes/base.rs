//! Base node kinds: root, paragraph, text and heading
//!
//! These are the types every document needs. Text carries its inline formatting
//! as a bit set so a run of text stays a single leaf.

use crate::commands::{Command, CommandBus, CommandKind, HandlerId, PRIORITY_EDITOR};
use crate::editor::{Extension, Transaction};
use crate::error::Result;
use crate::formats::html::dom::{append_child, create_element, create_text, element_name};
use crate::formats::json::SerializedNode;
use crate::node_type::{
    check_version, downcast, fields_from, fields_into, Conversion, ImportContext,
    MarkupConversion, NodeClass, NodePayload, NodeType,
};
use crate::tree::{DocumentTree, NodeKey};
use markup5ever_rcdom::Handle;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::{BitOr, BitOrAssign};

pub const ROOT_TYPE: &str = "root";
pub const PARAGRAPH_TYPE: &str = "paragraph";
pub const TEXT_TYPE: &str = "text";
pub const HEADING_TYPE: &str = "heading";

/// Payload of the document root
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Root;

/// Payload of a paragraph
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Paragraph;

/// Inline text formatting bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextFormat(u32);

impl TextFormat {
    pub const BOLD: TextFormat = TextFormat(1);
    pub const ITALIC: TextFormat = TextFormat(1 << 1);
    pub const STRIKETHROUGH: TextFormat = TextFormat(1 << 2);
    pub const UNDERLINE: TextFormat = TextFormat(1 << 3);
    pub const CODE: TextFormat = TextFormat(1 << 4);

    pub fn from_bits(bits: u32) -> Self {
        TextFormat(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: TextFormat) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_plain(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for TextFormat {
    type Output = TextFormat;

    fn bitor(self, rhs: TextFormat) -> TextFormat {
        TextFormat(self.0 | rhs.0)
    }
}

impl BitOrAssign for TextFormat {
    fn bitor_assign(&mut self, rhs: TextFormat) {
        self.0 |= rhs.0;
    }
}

/// Innermost first; bold ends up as the outermost wrapper.
const FORMAT_TAGS: [(TextFormat, &str); 5] = [
    (TextFormat::CODE, "code"),
    (TextFormat::UNDERLINE, "u"),
    (TextFormat::STRIKETHROUGH, "s"),
    (TextFormat::ITALIC, "em"),
    (TextFormat::BOLD, "strong"),
];

/// Payload of a text leaf
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(default)]
    pub format: TextFormat,
}

impl TextNode {
    pub fn new(text: impl Into<String>, format: TextFormat) -> Self {
        TextNode {
            text: text.into(),
            format,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingTag {
    #[default]
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingTag {
    pub fn as_str(self) -> &'static str {
        match self {
            HeadingTag::H1 => "h1",
            HeadingTag::H2 => "h2",
            HeadingTag::H3 => "h3",
            HeadingTag::H4 => "h4",
            HeadingTag::H5 => "h5",
            HeadingTag::H6 => "h6",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "h1" => Some(HeadingTag::H1),
            "h2" => Some(HeadingTag::H2),
            "h3" => Some(HeadingTag::H3),
            "h4" => Some(HeadingTag::H4),
            "h5" => Some(HeadingTag::H5),
            "h6" => Some(HeadingTag::H6),
            _ => None,
        }
    }
}

/// Payload of a heading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Heading {
    pub tag: HeadingTag,
}

pub struct RootType;

impl NodeType for RootType {
    fn type_tag(&self) -> &'static str {
        ROOT_TYPE
    }

    fn class(&self) -> NodeClass {
        NodeClass::Root
    }

    fn create(&self) -> Box<dyn NodePayload> {
        Box::new(Root)
    }

    fn import_json(&self, record: &SerializedNode) -> Result<Box<dyn NodePayload>> {
        check_version(self, record)?;
        Ok(Box::new(Root))
    }

    fn export_json(&self, _payload: &dyn NodePayload) -> Result<Map<String, Value>> {
        Ok(Map::new())
    }

    fn export_markup(&self, _payload: &dyn NodePayload) -> Result<Handle> {
        Ok(create_element("div", vec![("class", "quire-document")]))
    }
}

pub struct ParagraphType;

impl NodeType for ParagraphType {
    fn type_tag(&self) -> &'static str {
        PARAGRAPH_TYPE
    }

    fn class(&self) -> NodeClass {
        NodeClass::Element
    }

    fn can_contain_text(&self) -> bool {
        true
    }

    fn create(&self) -> Box<dyn NodePayload> {
        Box::new(Paragraph)
    }

    fn import_json(&self, _record: &SerializedNode) -> Result<Box<dyn NodePayload>> {
        Ok(Box::new(Paragraph))
    }

    fn export_json(&self, _payload: &dyn NodePayload) -> Result<Map<String, Value>> {
        Ok(Map::new())
    }

    fn markup_tags(&self) -> &'static [&'static str] {
        &["p"]
    }

    fn import_markup(&self, _element: &Handle, _context: &ImportContext<'_>) -> Option<Conversion> {
        Some(Conversion::node(0, Paragraph, true))
    }

    fn export_markup(&self, _payload: &dyn NodePayload) -> Result<Handle> {
        Ok(create_element("p", vec![]))
    }
}

pub struct TextType;

impl NodeType for TextType {
    fn type_tag(&self) -> &'static str {
        TEXT_TYPE
    }

    fn class(&self) -> NodeClass {
        NodeClass::Leaf
    }

    fn create(&self) -> Box<dyn NodePayload> {
        Box::new(TextNode::default())
    }

    fn import_json(&self, record: &SerializedNode) -> Result<Box<dyn NodePayload>> {
        Ok(Box::new(fields_into::<TextNode>(record)?))
    }

    fn export_json(&self, payload: &dyn NodePayload) -> Result<Map<String, Value>> {
        fields_from(TEXT_TYPE, downcast::<TextNode>(TEXT_TYPE, payload)?)
    }

    fn markup_tags(&self) -> &'static [&'static str] {
        &["strong", "b", "em", "i", "s", "strike", "del", "u", "code"]
    }

    fn import_markup(&self, element: &Handle, _context: &ImportContext<'_>) -> Option<Conversion> {
        let tag = element_name(element)?;
        let format = match tag.as_str() {
            "strong" | "b" => TextFormat::BOLD,
            "em" | "i" => TextFormat::ITALIC,
            "s" | "strike" | "del" => TextFormat::STRIKETHROUGH,
            "u" => TextFormat::UNDERLINE,
            "code" => TextFormat::CODE,
            _ => return None,
        };
        Some(Conversion {
            priority: 0,
            output: MarkupConversion::Format(format.bits()),
        })
    }

    fn export_markup(&self, payload: &dyn NodePayload) -> Result<Handle> {
        let text = downcast::<TextNode>(TEXT_TYPE, payload)?;
        let mut handle = create_text(&text.text);
        for (bit, tag) in FORMAT_TAGS {
            if text.format.contains(bit) {
                let wrapper = create_element(tag, vec![]);
                append_child(&wrapper, handle);
                handle = wrapper;
            }
        }
        Ok(handle)
    }

    fn is_inline(&self, _payload: &dyn NodePayload) -> bool {
        true
    }

    fn describe(&self, payload: &dyn NodePayload) -> String {
        downcast::<TextNode>(TEXT_TYPE, payload)
            .map(|t| format!("{:?}", t.text))
            .unwrap_or_default()
    }
}

pub struct HeadingType;

impl NodeType for HeadingType {
    fn type_tag(&self) -> &'static str {
        HEADING_TYPE
    }

    fn class(&self) -> NodeClass {
        NodeClass::Element
    }

    fn can_contain_text(&self) -> bool {
        true
    }

    fn create(&self) -> Box<dyn NodePayload> {
        Box::new(Heading::default())
    }

    fn import_json(&self, record: &SerializedNode) -> Result<Box<dyn NodePayload>> {
        Ok(Box::new(fields_into::<Heading>(record)?))
    }

    fn export_json(&self, payload: &dyn NodePayload) -> Result<Map<String, Value>> {
        fields_from(HEADING_TYPE, downcast::<Heading>(HEADING_TYPE, payload)?)
    }

    fn markup_tags(&self) -> &'static [&'static str] {
        &["h1", "h2", "h3", "h4", "h5", "h6"]
    }

    fn import_markup(&self, element: &Handle, _context: &ImportContext<'_>) -> Option<Conversion> {
        let tag = element_name(element)?;
        let tag = HeadingTag::from_tag(&tag)?;
        Some(Conversion::node(0, Heading { tag }, true))
    }

    fn export_markup(&self, payload: &dyn NodePayload) -> Result<Handle> {
        let heading = downcast::<Heading>(HEADING_TYPE, payload)?;
        Ok(create_element(heading.tag.as_str(), vec![]))
    }

    fn describe(&self, payload: &dyn NodePayload) -> String {
        downcast::<Heading>(HEADING_TYPE, payload)
            .map(|h| h.tag.as_str().to_string())
            .unwrap_or_default()
    }
}

/// Paragraph insertion
pub struct BaseExtension;

impl Extension for BaseExtension {
    fn name(&self) -> &'static str {
        "base"
    }

    fn required_types(&self) -> &'static [&'static str] {
        &[PARAGRAPH_TYPE, TEXT_TYPE]
    }

    fn register(&self, bus: &mut CommandBus) -> Vec<HandlerId> {
        vec![bus.register(
            CommandKind::InsertParagraph,
            PRIORITY_EDITOR,
            insert_paragraph,
        )]
    }
}

fn insert_paragraph(txn: &mut Transaction<'_>, command: &Command) -> Result<bool> {
    let Command::InsertParagraph { text } = command else {
        return Ok(false);
    };
    let paragraph = txn.create_node(PARAGRAPH_TYPE)?;
    if !text.is_empty() {
        let leaf = txn.create_node_with(
            TEXT_TYPE,
            TextNode::new(text.clone(), TextFormat::default()),
        )?;
        txn.tree_mut().append(paragraph, leaf)?;
    }
    txn.insert_block(paragraph)?;
    Ok(true)
}

/// Read the text of every text leaf under `key`, in order.
pub fn plain_text(tree: &DocumentTree, key: NodeKey) -> String {
    tree.descendants(key)
        .into_iter()
        .filter_map(|k| tree.payload_as::<TextNode>(k).ok())
        .map(|t| t.text.as_str())
        .collect()
}
