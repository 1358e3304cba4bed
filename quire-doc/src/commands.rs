//! Command catalog and prioritized dispatch
//!
//! Commands are plain data. Extensions register handlers per [`CommandKind`] with
//! an integer priority; [`CommandBus::dispatch`] tries them from the highest
//! priority down and stops at the first handler reporting the command handled.
//! Handlers of equal priority run in registration order.
//!
//! Handlers always run inside a write transaction, so an error from any of them
//! discards every mutation made while dispatching.

use crate::editor::Transaction;
use crate::error::Result;
use crate::nodes::image::Alignment;
use crate::tree::NodeKey;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Priority of the editor's built-in handlers
pub const PRIORITY_EDITOR: i32 = 0;
pub const PRIORITY_LOW: i32 = 1;
pub const PRIORITY_NORMAL: i32 = 2;
pub const PRIORITY_HIGH: i32 = 3;
pub const PRIORITY_CRITICAL: i32 = 4;

/// Every command the editor understands.
///
/// Serialized as `{"type": "...", "payload": {...}}`. Commands that target an
/// existing node take an optional `key`; when absent the current selection is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Command {
    #[serde(rename = "INSERT_PARAGRAPH_COMMAND")]
    InsertParagraph {
        #[serde(default)]
        text: String,
    },
    #[serde(rename = "INSERT_COLLAPSIBLE_COMMAND")]
    InsertCollapsible,
    #[serde(rename = "TOGGLE_COLLAPSIBLE_COMMAND")]
    ToggleCollapsible {
        #[serde(default)]
        key: Option<NodeKey>,
    },
    #[serde(rename = "INSERT_EQUATION_COMMAND")]
    InsertEquation {
        equation: String,
        #[serde(default)]
        inline: bool,
    },
    #[serde(rename = "UPDATE_EQUATION_COMMAND")]
    UpdateEquation {
        #[serde(default)]
        key: Option<NodeKey>,
        equation: String,
    },
    #[serde(rename = "INSERT_YOUTUBE_COMMAND")]
    InsertYouTube { url: String },
    #[serde(rename = "INSERT_FIGMA_COMMAND")]
    InsertFigma {
        #[serde(rename = "documentId")]
        document_id: String,
    },
    #[serde(rename = "INSERT_LAYOUT_COMMAND")]
    InsertLayout {
        #[serde(default)]
        columns: Option<usize>,
    },
    #[serde(rename = "UPDATE_LAYOUT_COMMAND")]
    UpdateLayout {
        #[serde(default)]
        key: Option<NodeKey>,
        columns: usize,
        #[serde(default)]
        rebuild: bool,
    },
    #[serde(rename = "INSERT_PAGE_BREAK_COMMAND")]
    InsertPageBreak,
    #[serde(rename = "INSERT_IMAGE_COMMAND")]
    InsertImage {
        src: String,
        #[serde(rename = "altText", default)]
        alt_text: String,
        #[serde(default)]
        caption: Option<String>,
        #[serde(default)]
        alignment: Option<Alignment>,
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        height: Option<u32>,
    },
    #[serde(rename = "SET_IMAGE_CAPTION_COMMAND")]
    SetImageCaption {
        #[serde(default)]
        key: Option<NodeKey>,
        caption: String,
    },
    #[serde(rename = "SET_IMAGE_ALIGNMENT_COMMAND")]
    SetImageAlignment {
        #[serde(default)]
        key: Option<NodeKey>,
        alignment: Alignment,
    },
    #[serde(rename = "RESIZE_IMAGE_COMMAND")]
    ResizeImage {
        #[serde(default)]
        key: Option<NodeKey>,
        width: u32,
        height: u32,
    },
    #[serde(rename = "INDENT_CONTENT_COMMAND")]
    IndentContent,
    #[serde(rename = "OUTDENT_CONTENT_COMMAND")]
    OutdentContent,
}

/// Discriminant of a [`Command`], used as the dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    InsertParagraph,
    InsertCollapsible,
    ToggleCollapsible,
    InsertEquation,
    UpdateEquation,
    InsertYouTube,
    InsertFigma,
    InsertLayout,
    UpdateLayout,
    InsertPageBreak,
    InsertImage,
    SetImageCaption,
    SetImageAlignment,
    ResizeImage,
    IndentContent,
    OutdentContent,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::InsertParagraph => "INSERT_PARAGRAPH_COMMAND",
            CommandKind::InsertCollapsible => "INSERT_COLLAPSIBLE_COMMAND",
            CommandKind::ToggleCollapsible => "TOGGLE_COLLAPSIBLE_COMMAND",
            CommandKind::InsertEquation => "INSERT_EQUATION_COMMAND",
            CommandKind::UpdateEquation => "UPDATE_EQUATION_COMMAND",
            CommandKind::InsertYouTube => "INSERT_YOUTUBE_COMMAND",
            CommandKind::InsertFigma => "INSERT_FIGMA_COMMAND",
            CommandKind::InsertLayout => "INSERT_LAYOUT_COMMAND",
            CommandKind::UpdateLayout => "UPDATE_LAYOUT_COMMAND",
            CommandKind::InsertPageBreak => "INSERT_PAGE_BREAK_COMMAND",
            CommandKind::InsertImage => "INSERT_IMAGE_COMMAND",
            CommandKind::SetImageCaption => "SET_IMAGE_CAPTION_COMMAND",
            CommandKind::SetImageAlignment => "SET_IMAGE_ALIGNMENT_COMMAND",
            CommandKind::ResizeImage => "RESIZE_IMAGE_COMMAND",
            CommandKind::IndentContent => "INDENT_CONTENT_COMMAND",
            CommandKind::OutdentContent => "OUTDENT_CONTENT_COMMAND",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::InsertParagraph { .. } => CommandKind::InsertParagraph,
            Command::InsertCollapsible => CommandKind::InsertCollapsible,
            Command::ToggleCollapsible { .. } => CommandKind::ToggleCollapsible,
            Command::InsertEquation { .. } => CommandKind::InsertEquation,
            Command::UpdateEquation { .. } => CommandKind::UpdateEquation,
            Command::InsertYouTube { .. } => CommandKind::InsertYouTube,
            Command::InsertFigma { .. } => CommandKind::InsertFigma,
            Command::InsertLayout { .. } => CommandKind::InsertLayout,
            Command::UpdateLayout { .. } => CommandKind::UpdateLayout,
            Command::InsertPageBreak => CommandKind::InsertPageBreak,
            Command::InsertImage { .. } => CommandKind::InsertImage,
            Command::SetImageCaption { .. } => CommandKind::SetImageCaption,
            Command::SetImageAlignment { .. } => CommandKind::SetImageAlignment,
            Command::ResizeImage { .. } => CommandKind::ResizeImage,
            Command::IndentContent => CommandKind::IndentContent,
            Command::OutdentContent => CommandKind::OutdentContent,
        }
    }
}

/// Handler signature: returns `Ok(true)` when the command was handled.
pub type CommandHandler = Box<dyn Fn(&mut Transaction<'_>, &Command) -> Result<bool>>;

/// Opaque handle returned by [`CommandBus::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct Registration {
    id: HandlerId,
    priority: i32,
    handler: CommandHandler,
}

/// Prioritized, short-circuiting command dispatcher.
#[derive(Default)]
pub struct CommandBus {
    handlers: HashMap<CommandKind, Vec<Registration>>,
    next_id: u64,
}

impl CommandBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Registrations for a kind stay sorted by descending
    /// priority; a new handler goes after existing ones of equal priority.
    pub fn register<F>(&mut self, kind: CommandKind, priority: i32, handler: F) -> HandlerId
    where
        F: Fn(&mut Transaction<'_>, &Command) -> Result<bool> + 'static,
    {
        self.next_id += 1;
        let id = HandlerId(self.next_id);
        let list = self.handlers.entry(kind).or_default();
        let index = list
            .iter()
            .position(|r| r.priority < priority)
            .unwrap_or(list.len());
        list.insert(
            index,
            Registration {
                id,
                priority,
                handler: Box::new(handler),
            },
        );
        debug!("event=register_handler module=commands command={kind} priority={priority}");
        id
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn unregister(&mut self, id: HandlerId) -> bool {
        for list in self.handlers.values_mut() {
            if let Some(index) = list.iter().position(|r| r.id == id) {
                list.remove(index);
                return true;
            }
        }
        false
    }

    pub fn handler_count(&self, kind: CommandKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Offer `command` to its handlers in priority order.
    ///
    /// Returns `Ok(false)` when no handler claims it, including when none is
    /// registered.
    pub fn dispatch(&self, txn: &mut Transaction<'_>, command: &Command) -> Result<bool> {
        let kind = command.kind();
        let Some(list) = self.handlers.get(&kind) else {
            trace!("event=dispatch_unhandled module=commands command={kind}");
            return Ok(false);
        };
        for registration in list {
            if (registration.handler)(txn, command)? {
                trace!(
                    "event=dispatch_handled module=commands command={kind} priority={}",
                    registration.priority
                );
                return Ok(true);
            }
        }
        Ok(false)
    }
}
