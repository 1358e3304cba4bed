//! Images
//!
//! An image is a block decorator with a source, alt text, an optional caption,
//! an alignment and an optional display size. Cloud storage share links are
//! rewritten to direct image URLs whenever a payload is built, so the stored
//! `src` always points at the image itself.
//!
//! Interactive resizing is modelled by [`ImageResizer`]: it holds the natural
//! size reported by the host, the aspect-ratio lock and the pending size, and
//! produces a resize command when applied.

use crate::commands::{Command, CommandBus, CommandKind, HandlerId, PRIORITY_EDITOR};
use crate::editor::{Extension, Transaction};
use crate::error::{DocError, Result};
use crate::formats::html::dom::{
    append_child, attr, create_element, create_text, element_name, find_descendant, has_class,
    style_property, text_content,
};
use crate::formats::json::SerializedNode;
use crate::node_type::{
    check_version, downcast, fields_from, fields_into, Conversion, ImportContext, NodeClass,
    NodePayload, NodeType,
};
use crate::tree::NodeKey;
use log::{debug, warn};
use markup5ever_rcdom::Handle;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

pub const IMAGE_TYPE: &str = "image";

static DRIVE_FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/file/d/([a-zA-Z0-9_-]+)").expect("valid drive file regex"));
static DRIVE_ID_PARAM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]id=([a-zA-Z0-9_-]+)").expect("valid drive id regex"));
static DRIVE_UC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/uc\?.*id=([a-zA-Z0-9_-]+)").expect("valid drive uc regex"));

const GOOGLE_HOSTS: &[&str] = &["drive.google.com", "docs.google.com"];
const DROPBOX_HOSTS: &[&str] = &["dropbox.com", "www.dropbox.com"];
const ONEDRIVE_HOSTS: &[&str] = &["onedrive.live.com", "1drv.ms"];

/// Rewrite a cloud storage share link into a direct image URL.
///
/// Google Drive links become thumbnail URLs, Dropbox links move to the content
/// host without the `dl` flag and OneDrive links switch to their embed form.
/// Anything else, including text that is not a URL, is returned unchanged.
pub fn convert_to_direct_image_url(src: &str) -> String {
    let Ok(mut url) = Url::parse(src) else {
        return src.to_string();
    };
    let Some(host) = url.host_str().map(str::to_ascii_lowercase) else {
        return src.to_string();
    };

    if GOOGLE_HOSTS.contains(&host.as_str()) {
        let file_id = [&*DRIVE_FILE_RE, &*DRIVE_ID_PARAM_RE, &*DRIVE_UC_RE]
            .iter()
            .find_map(|re| re.captures(src))
            .map(|caps| caps[1].to_string());
        return match file_id {
            Some(id) => format!("https://drive.google.com/thumbnail?id={id}&sz=w2000"),
            None => src.to_string(),
        };
    }

    if DROPBOX_HOSTS.contains(&host.as_str()) {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(name, _)| name != "dl")
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
        if url.set_host(Some("dl.dropboxusercontent.com")).is_err() {
            return src.to_string();
        }
        return url.to_string();
    }

    if ONEDRIVE_HOSTS.contains(&host.as_str()) {
        let path = url
            .path()
            .replace("view.aspx", "embed.aspx")
            .replace("redir", "embed");
        url.set_path(&path);
        return url.to_string();
    }

    src.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

impl Alignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "left" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            _ => None,
        }
    }
}

/// Payload of an image node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    #[serde(rename = "altText", default)]
    pub alt_text: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub alignment: Alignment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl Image {
    pub fn new(src: &str, alt_text: impl Into<String>) -> Self {
        Image {
            src: convert_to_direct_image_url(src),
            alt_text: alt_text.into(),
            caption: String::new(),
            alignment: Alignment::default(),
            width: None,
            height: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_size(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Reject a display size with a zero dimension. Unset dimensions are fine.
pub fn check_size(width: Option<u32>, height: Option<u32>) -> Result<()> {
    if width == Some(0) || height == Some(0) {
        let show = |d: Option<u32>| d.map_or_else(|| "auto".to_string(), |v| v.to_string());
        return Err(DocError::malformed(
            IMAGE_TYPE,
            format!("image size must be positive, got {}x{}", show(width), show(height)),
        ));
    }
    Ok(())
}

/// Height matching `width` at the natural aspect ratio.
pub fn locked_height(width: u32, natural_width: u32, natural_height: u32) -> Option<u32> {
    if natural_width == 0 || natural_height == 0 {
        return None;
    }
    Some((f64::from(width) * f64::from(natural_height) / f64::from(natural_width)).round() as u32)
}

/// Width matching `height` at the natural aspect ratio.
pub fn locked_width(height: u32, natural_width: u32, natural_height: u32) -> Option<u32> {
    if natural_width == 0 || natural_height == 0 {
        return None;
    }
    Some((f64::from(height) * f64::from(natural_width) / f64::from(natural_height)).round() as u32)
}

/// State of one interactive resize of an image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResizer {
    natural_width: u32,
    natural_height: u32,
    locked: bool,
    width: u32,
    height: u32,
}

impl ImageResizer {
    /// Start a session. The pending size starts at the image's current size,
    /// falling back to the natural size for unset dimensions.
    pub fn open(image: &Image, natural_width: u32, natural_height: u32, locked: bool) -> Self {
        ImageResizer {
            natural_width,
            natural_height,
            locked,
            width: image.width.unwrap_or(natural_width),
            height: image.height.unwrap_or(natural_height),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn natural_size(&self) -> (u32, u32) {
        (self.natural_width, self.natural_height)
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn set_width(&mut self, width: u32) {
        self.width = width;
        if self.locked {
            if let Some(height) = locked_height(width, self.natural_width, self.natural_height) {
                self.height = height;
            }
        }
    }

    pub fn set_height(&mut self, height: u32) {
        self.height = height;
        if self.locked {
            if let Some(width) = locked_width(height, self.natural_width, self.natural_height) {
                self.width = width;
            }
        }
    }

    /// Return the pending size to the natural size.
    pub fn reset(&mut self) {
        self.width = self.natural_width;
        self.height = self.natural_height;
    }

    /// Command that commits the pending size to `key`.
    pub fn apply(&self, key: NodeKey) -> Command {
        Command::ResizeImage {
            key: Some(key),
            width: self.width,
            height: self.height,
        }
    }
}

pub struct ImageType;

fn dimension(element: &Handle, name: &str) -> Option<u32> {
    attr(element, name)
        .and_then(|v| v.trim().parse().ok())
        .filter(|v| *v > 0)
}

impl NodeType for ImageType {
    fn type_tag(&self) -> &'static str {
        IMAGE_TYPE
    }

    fn class(&self) -> NodeClass {
        NodeClass::Decorator
    }

    fn create(&self) -> Box<dyn NodePayload> {
        Box::new(Image::new("", ""))
    }

    fn import_json(&self, record: &SerializedNode) -> Result<Box<dyn NodePayload>> {
        check_version(self, record)?;
        let mut image = fields_into::<Image>(record)?;
        check_size(image.width, image.height)?;
        image.src = convert_to_direct_image_url(&image.src);
        Ok(Box::new(image))
    }

    fn export_json(&self, payload: &dyn NodePayload) -> Result<Map<String, Value>> {
        fields_from(IMAGE_TYPE, downcast::<Image>(IMAGE_TYPE, payload)?)
    }

    fn markup_tags(&self) -> &'static [&'static str] {
        &["figure", "img"]
    }

    fn import_markup(&self, element: &Handle, _context: &ImportContext<'_>) -> Option<Conversion> {
        if has_class(element, "page-break")
            || style_property(element, "page-break-after").as_deref() == Some("always")
        {
            return None;
        }
        let (img, priority) = match element_name(element)?.as_str() {
            "img" => (element.clone(), 0),
            _ => (find_descendant(element, "img")?, 1),
        };
        let src = attr(&img, "src").unwrap_or_default();
        let mut image = Image::new(&src, attr(&img, "alt").unwrap_or_default())
            .with_size(dimension(&img, "width"), dimension(&img, "height"));
        if priority == 1 {
            if let Some(caption) = find_descendant(element, "figcaption") {
                image.caption = text_content(&caption).trim().to_string();
            }
            if let Some(alignment) =
                style_property(element, "text-align").and_then(|v| Alignment::parse(&v))
            {
                image.alignment = alignment;
            }
        }
        Some(Conversion::node(priority, image, false))
    }

    fn export_markup(&self, payload: &dyn NodePayload) -> Result<Handle> {
        let image = downcast::<Image>(IMAGE_TYPE, payload)?;
        let style = format!("text-align: {}", image.alignment.as_str());
        let figure = create_element("figure", vec![("style", style.as_str())]);

        let width = image.width.map(|w| w.to_string());
        let height = image.height.map(|h| h.to_string());
        let mut attrs = vec![
            ("src", image.src.as_str()),
            ("alt", image.alt_text.as_str()),
            ("class", "editor-image"),
        ];
        if let Some(width) = &width {
            attrs.push(("width", width.as_str()));
        }
        if let Some(height) = &height {
            attrs.push(("height", height.as_str()));
        }
        append_child(&figure, create_element("img", attrs));

        if !image.caption.is_empty() {
            let caption = create_element("figcaption", vec![]);
            append_child(&caption, create_text(&image.caption));
            append_child(&figure, caption);
        }
        Ok(figure)
    }

    fn describe(&self, payload: &dyn NodePayload) -> String {
        downcast::<Image>(IMAGE_TYPE, payload)
            .map(|i| i.src.clone())
            .unwrap_or_default()
    }
}

pub struct ImageExtension;

impl Extension for ImageExtension {
    fn name(&self) -> &'static str {
        "image"
    }

    fn required_types(&self) -> &'static [&'static str] {
        &[IMAGE_TYPE]
    }

    fn register(&self, bus: &mut CommandBus) -> Vec<HandlerId> {
        vec![
            bus.register(CommandKind::InsertImage, PRIORITY_EDITOR, insert_image),
            bus.register(CommandKind::SetImageCaption, PRIORITY_EDITOR, set_caption),
            bus.register(CommandKind::SetImageAlignment, PRIORITY_EDITOR, set_alignment),
            bus.register(CommandKind::ResizeImage, PRIORITY_EDITOR, resize_image),
        ]
    }
}

fn insert_image(txn: &mut Transaction<'_>, command: &Command) -> Result<bool> {
    let Command::InsertImage {
        src,
        alt_text,
        caption,
        alignment,
        width,
        height,
    } = command
    else {
        return Ok(false);
    };
    if src.trim().is_empty() {
        warn!("event=insert_rejected module=image reason=empty_src");
        return Ok(false);
    }
    check_size(*width, *height)?;
    let image = Image::new(src.trim(), alt_text.clone())
        .with_caption(caption.clone().unwrap_or_default())
        .with_alignment(alignment.unwrap_or_default())
        .with_size(*width, *height);
    let key = txn.create_node_with(IMAGE_TYPE, image)?;
    txn.insert_block(key)?;
    debug!("event=insert module=image key={key}");
    Ok(true)
}

fn target_image(txn: &Transaction<'_>, key: Option<NodeKey>) -> Result<Option<NodeKey>> {
    let target = txn.target(key)?;
    Ok(txn.closest_of_type(target, IMAGE_TYPE))
}

fn set_caption(txn: &mut Transaction<'_>, command: &Command) -> Result<bool> {
    let Command::SetImageCaption { key, caption } = command else {
        return Ok(false);
    };
    let Some(image) = target_image(txn, *key)? else {
        return Ok(false);
    };
    txn.tree_mut()
        .update_payload::<Image, _>(image, |i| i.caption = caption.clone())?;
    Ok(true)
}

fn set_alignment(txn: &mut Transaction<'_>, command: &Command) -> Result<bool> {
    let Command::SetImageAlignment { key, alignment } = command else {
        return Ok(false);
    };
    let Some(image) = target_image(txn, *key)? else {
        return Ok(false);
    };
    txn.tree_mut()
        .update_payload::<Image, _>(image, |i| i.alignment = *alignment)?;
    Ok(true)
}

fn resize_image(txn: &mut Transaction<'_>, command: &Command) -> Result<bool> {
    let Command::ResizeImage { key, width, height } = command else {
        return Ok(false);
    };
    check_size(Some(*width), Some(*height))?;
    let Some(image) = target_image(txn, *key)? else {
        return Ok(false);
    };
    txn.tree_mut().update_payload::<Image, _>(image, |i| {
        i.width = Some(*width);
        i.height = Some(*height);
    })?;
    debug!("event=resize module=image key={image} width={width} height={height}");
    Ok(true)
}
