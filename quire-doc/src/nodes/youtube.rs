//! YouTube embeds

use crate::commands::{Command, CommandBus, CommandKind, HandlerId, PRIORITY_EDITOR};
use crate::editor::{Extension, Transaction};
use crate::error::Result;
use crate::formats::html::dom::{attr, create_element};
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

pub const YOUTUBE_TYPE: &str = "youtube";

const VIDEO_ID_LEN: usize = 11;
const EMBED_BASE: &str = "https://www.youtube-nocookie.com/embed/";
const EMBED_ALLOW: &str =
    "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture";

static VIDEO_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*")
        .expect("valid youtube url regex")
});

/// Pull the 11-character video id out of the usual YouTube URL shapes.
pub fn extract_video_id(url: &str) -> Option<String> {
    let caps = VIDEO_URL_RE.captures(url)?;
    let id = caps.get(2)?.as_str();
    (id.chars().count() == VIDEO_ID_LEN).then(|| id.to_string())
}

pub fn embed_url(video_id: &str) -> String {
    format!("{EMBED_BASE}{video_id}")
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct YouTube {
    #[serde(rename = "videoID")]
    pub video_id: String,
}

pub struct YouTubeType;

impl NodeType for YouTubeType {
    fn type_tag(&self) -> &'static str {
        YOUTUBE_TYPE
    }

    fn class(&self) -> NodeClass {
        NodeClass::Decorator
    }

    fn create(&self) -> Box<dyn NodePayload> {
        Box::new(YouTube::default())
    }

    fn import_json(&self, record: &SerializedNode) -> Result<Box<dyn NodePayload>> {
        check_version(self, record)?;
        Ok(Box::new(fields_into::<YouTube>(record)?))
    }

    fn export_json(&self, payload: &dyn NodePayload) -> Result<Map<String, Value>> {
        fields_from(YOUTUBE_TYPE, downcast::<YouTube>(YOUTUBE_TYPE, payload)?)
    }

    fn markup_tags(&self) -> &'static [&'static str] {
        &["iframe"]
    }

    fn import_markup(&self, element: &Handle, _context: &ImportContext<'_>) -> Option<Conversion> {
        let video_id = attr(element, "data-youtube-id")
            .or_else(|| attr(element, "data-lexical-youtube"))
            .filter(|id| !id.is_empty())?;
        Some(Conversion::node(1, YouTube { video_id }, false))
    }

    fn export_markup(&self, payload: &dyn NodePayload) -> Result<Handle> {
        let video = downcast::<YouTube>(YOUTUBE_TYPE, payload)?;
        let src = embed_url(&video.video_id);
        Ok(create_element(
            "iframe",
            vec![
                ("data-youtube-id", video.video_id.as_str()),
                ("width", "560"),
                ("height", "315"),
                ("src", src.as_str()),
                ("frameborder", "0"),
                ("allow", EMBED_ALLOW),
                ("allowfullscreen", "true"),
                ("title", "YouTube video"),
            ],
        ))
    }

    fn describe(&self, payload: &dyn NodePayload) -> String {
        downcast::<YouTube>(YOUTUBE_TYPE, payload)
            .map(|v| v.video_id.clone())
            .unwrap_or_default()
    }
}

pub struct YouTubeExtension;

impl Extension for YouTubeExtension {
    fn name(&self) -> &'static str {
        "youtube"
    }

    fn required_types(&self) -> &'static [&'static str] {
        &[YOUTUBE_TYPE]
    }

    fn register(&self, bus: &mut CommandBus) -> Vec<HandlerId> {
        vec![bus.register(CommandKind::InsertYouTube, PRIORITY_EDITOR, insert_youtube)]
    }
}

fn insert_youtube(txn: &mut Transaction<'_>, command: &Command) -> Result<bool> {
    let Command::InsertYouTube { url } = command else {
        return Ok(false);
    };
    let Some(video_id) = extract_video_id(url) else {
        warn!("event=insert_rejected module=youtube reason=no_video_id url={url}");
        return Ok(false);
    };
    let key = txn.create_node_with(YOUTUBE_TYPE, YouTube { video_id })?;
    txn.insert_block(key)?;
    debug!("event=insert module=youtube key={key}");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id_shapes() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ?start=10",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://www.youtube.com/v/dQw4w9WgXcQ",
        ] {
            assert_eq!(extract_video_id(url).as_deref(), Some("dQw4w9WgXcQ"), "{url}");
        }
    }

    #[test]
    fn test_rejects_short_or_missing_ids() {
        assert_eq!(extract_video_id("v=abc"), None);
        assert_eq!(extract_video_id("https://youtu.be/short"), None);
        assert_eq!(extract_video_id("https://example.com"), None);
    }

    #[test]
    fn test_export_attributes() {
        let handle = YouTubeType
            .export_markup(&YouTube {
                video_id: "dQw4w9WgXcQ".into(),
            })
            .unwrap();
        assert_eq!(attr(&handle, "data-youtube-id").as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(
            attr(&handle, "src").as_deref(),
            Some("https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ")
        );
        assert_eq!(attr(&handle, "width").as_deref(), Some("560"));
    }
}
