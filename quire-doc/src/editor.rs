//! Editor state and write transactions
//!
//! The [`Editor`] owns the committed [`EditorState`]. Every mutation goes through
//! [`Editor::update`], which runs the body against a working copy:
//!
//!     committed ──clone──▶ working copy ──body──▶ gc ──▶ integrity ──▶ commit ──▶ listeners
//!                                           │                │
//!                                           └──── error ─────┴──▶ discard working copy
//!
//! Reads outside a transaction see the last committed state. Commands dispatched
//! from inside a handler fold into the transaction that is already open.

use crate::commands::{Command, CommandBus, HandlerId};
use crate::error::{DocError, Result};
use crate::formats::html::{self, HtmlOptions};
use crate::formats::json::{self, ImportWarning, SerializedNode};
use crate::node_registry::NodeTypeRegistry;
use crate::node_type::NodePayload;
use crate::tree::{DocumentTree, NodeKey};
use log::{debug, info};
use std::any::Any;
use std::collections::BTreeSet;

/// Behavior knobs shared by the built-in extensions.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorOptions {
    /// Deepest list nesting the indent limiter allows
    pub max_list_indent_depth: usize,
    /// Column count used when an insert-layout command names none
    pub default_layout_columns: usize,
    /// Whether image resizes keep the natural aspect ratio
    pub lock_aspect_ratio: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        EditorOptions {
            max_list_indent_depth: 7,
            default_layout_columns: 2,
            lock_aspect_ratio: true,
        }
    }
}

/// Committed document plus selection and version.
#[derive(Debug, Clone, Default)]
pub struct EditorState {
    pub tree: DocumentTree,
    /// Insertion anchor for insert commands and target of indent/outdent
    pub selection: Option<NodeKey>,
    pub version: u64,
}

/// Passed to update listeners after each commit.
#[derive(Debug)]
pub struct UpdateEvent<'a> {
    pub version: u64,
    pub dirty: &'a BTreeSet<NodeKey>,
    pub state: &'a EditorState,
}

/// Handle returned by [`Editor::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&UpdateEvent<'_>)>;

/// A bundle of command handlers contributed by a node behavior module.
pub trait Extension {
    fn name(&self) -> &'static str;

    /// Node types that must be registered before installing
    fn required_types(&self) -> &'static [&'static str] {
        &[]
    }

    /// Register handlers, returning their ids so they can be removed again
    fn register(&self, bus: &mut CommandBus) -> Vec<HandlerId>;
}

struct InstalledExtension {
    name: &'static str,
    handlers: Vec<HandlerId>,
}

/// Open write transaction over a working copy of the editor state.
pub struct Transaction<'a> {
    state: &'a mut EditorState,
    registry: &'a NodeTypeRegistry,
    bus: &'a CommandBus,
    options: &'a EditorOptions,
}

impl<'a> Transaction<'a> {
    pub fn registry(&self) -> &'a NodeTypeRegistry {
        self.registry
    }

    pub fn options(&self) -> &'a EditorOptions {
        self.options
    }

    pub fn tree(&self) -> &DocumentTree {
        &self.state.tree
    }

    pub fn tree_mut(&mut self) -> &mut DocumentTree {
        &mut self.state.tree
    }

    pub fn selection(&self) -> Option<NodeKey> {
        self.state.selection
    }

    pub fn set_selection(&mut self, key: Option<NodeKey>) {
        self.state.selection = key;
    }

    /// Create a detached node with the type's default payload.
    pub fn create_node(&mut self, tag: &str) -> Result<NodeKey> {
        let (tag, class, payload) = self.registry.create(tag)?;
        Ok(self.state.tree.create_node(tag, class, payload))
    }

    /// Create a detached node with an explicit payload.
    ///
    /// The payload must have the concrete type the registered type creates.
    pub fn create_node_with(&mut self, tag: &str, payload: impl NodePayload) -> Result<NodeKey> {
        let node_type = self.registry.get(tag)?;
        if Any::type_id(payload.as_any()) != Any::type_id(node_type.create().as_any()) {
            return Err(DocError::malformed(
                node_type.type_tag(),
                format!("payload {payload:?} is not the type's payload"),
            ));
        }
        Ok(self
            .state
            .tree
            .create_node(node_type.type_tag(), node_type.class(), Box::new(payload)))
    }

    /// Dispatch a nested command inside this transaction.
    pub fn dispatch(&mut self, command: &Command) -> Result<bool> {
        let bus = self.bus;
        bus.dispatch(self, command)
    }

    /// Resolve an explicit target key or fall back to the selection.
    pub fn target(&self, key: Option<NodeKey>) -> Result<NodeKey> {
        key.or(self.state.selection)
            .ok_or_else(|| DocError::InvalidStructure("command needs a target node".to_string()))
    }

    /// Nearest ancestor-or-self of `key` with the given type tag.
    pub fn closest_of_type(&self, key: NodeKey, tag: &str) -> Option<NodeKey> {
        let tree = &self.state.tree;
        std::iter::once(key)
            .chain(tree.ancestors(key))
            .find(|k| tree.type_of(*k) == Some(tag))
    }

    /// Insert a block node at the nearest root after the selection's block, or
    /// at the end of the document without a selection. Selects the new node.
    pub fn insert_block(&mut self, key: NodeKey) -> Result<()> {
        let anchor = self
            .state
            .selection
            .filter(|k| self.state.tree.contains(*k) && *k != key);
        match anchor.map(|a| self.nearest_root_slot(a)).transpose()? {
            Some(Slot::Inside(parent)) => self.state.tree.append(parent, key)?,
            Some(Slot::After(sibling)) => self.state.tree.insert_after(key, sibling)?,
            None => {
                let root = self.state.tree.root();
                self.state.tree.append(root, key)?;
            }
        }
        self.state.selection = Some(key);
        Ok(())
    }

    /// Insert an inline node at the selection, wrapping it in the block wrapper
    /// when the selection cannot hold inline content.
    pub fn insert_inline(&mut self, key: NodeKey) -> Result<()> {
        if let Some(anchor) = self.state.selection.filter(|k| self.state.tree.contains(*k)) {
            let anchor_type = self.registry.get(self.state.tree.get(anchor)?.type_tag())?;
            if anchor_type.can_contain_text() {
                self.state.tree.append(anchor, key)?;
                return Ok(());
            }
            if let Some(parent) = self.state.tree.parent(anchor) {
                let parent_tag = self.state.tree.get(parent)?.type_tag();
                if self.registry.get(parent_tag)?.can_contain_text() {
                    self.state.tree.insert_after(key, anchor)?;
                    return Ok(());
                }
            }
        }
        let wrapper = self.create_node(self.registry.block_wrapper())?;
        self.state.tree.append(wrapper, key)?;
        self.insert_block(wrapper)?;
        self.state.selection = Some(key);
        Ok(())
    }

    fn nearest_root_slot(&self, anchor: NodeKey) -> Result<Slot> {
        let tree = &self.state.tree;
        if tree.get(anchor)?.class().is_root_like() {
            return Ok(Slot::Inside(anchor));
        }
        let mut current = anchor;
        while let Some(parent) = tree.parent(current) {
            if tree.get(parent)?.class().is_root_like() {
                return Ok(Slot::After(current));
            }
            current = parent;
        }
        Ok(Slot::Inside(tree.root()))
    }
}

enum Slot {
    Inside(NodeKey),
    After(NodeKey),
}

/// Document editor: registry, command bus, committed state and listeners.
pub struct Editor {
    registry: NodeTypeRegistry,
    bus: CommandBus,
    options: EditorOptions,
    state: EditorState,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    extensions: Vec<InstalledExtension>,
}

impl Editor {
    /// Create an editor with an empty document and no extensions installed.
    pub fn new(registry: NodeTypeRegistry, options: EditorOptions) -> Self {
        Editor {
            registry,
            bus: CommandBus::new(),
            options,
            state: EditorState::default(),
            listeners: Vec::new(),
            next_listener: 0,
            extensions: Vec::new(),
        }
    }

    /// Editor with every built-in node type and extension.
    pub fn with_options(options: EditorOptions) -> Self {
        let mut editor = Editor::new(NodeTypeRegistry::with_defaults(), options);
        for extension in crate::nodes::builtin_extensions() {
            if let Err(err) = editor.install(extension.as_ref()) {
                log::error!("event=install_builtin_failed module=editor error={err}");
            }
        }
        editor
    }

    pub fn with_defaults() -> Self {
        Self::with_options(EditorOptions::default())
    }

    pub fn registry(&self) -> &NodeTypeRegistry {
        &self.registry
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// The last committed state.
    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn tree(&self) -> &DocumentTree {
        &self.state.tree
    }

    pub fn bus_mut(&mut self) -> &mut CommandBus {
        &mut self.bus
    }

    /// Install an extension's handlers.
    pub fn install(&mut self, extension: &dyn Extension) -> Result<()> {
        let name = extension.name();
        if self.extensions.iter().any(|e| e.name == name) {
            return Err(DocError::DuplicateExtension(name.to_string()));
        }
        for tag in extension.required_types() {
            self.registry.get(tag)?;
        }
        let handlers = extension.register(&mut self.bus);
        debug!(
            "event=install_extension module=editor extension={name} handlers={}",
            handlers.len()
        );
        self.extensions.push(InstalledExtension { name, handlers });
        Ok(())
    }

    /// Remove an installed extension's handlers. Returns false if it was not installed.
    pub fn uninstall(&mut self, name: &str) -> bool {
        let Some(index) = self.extensions.iter().position(|e| e.name == name) else {
            return false;
        };
        let installed = self.extensions.remove(index);
        for id in installed.handlers {
            self.bus.unregister(id);
        }
        true
    }

    pub fn extension_names(&self) -> Vec<&'static str> {
        self.extensions.iter().map(|e| e.name).collect()
    }

    pub fn add_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&UpdateEvent<'_>) + 'static,
    {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        before != self.listeners.len()
    }

    /// Run an all-or-nothing write transaction.
    pub fn update<R, F>(&mut self, body: F) -> Result<R>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<R>,
    {
        let mut working = self.state.clone();
        let output = {
            let mut txn = Transaction {
                state: &mut working,
                registry: &self.registry,
                bus: &self.bus,
                options: &self.options,
            };
            body(&mut txn)?
        };

        let collected = working.tree.collect_garbage();
        working.tree.check_integrity(&self.registry)?;
        if working
            .selection
            .is_some_and(|k| !working.tree.contains(k))
        {
            working.selection = None;
        }

        let dirty = working.tree.take_dirty();
        if dirty.is_empty() && working.selection == self.state.selection {
            return Ok(output);
        }

        working.version = self.state.version + 1;
        self.state = working;
        debug!(
            "event=commit module=editor version={} dirty={} collected={collected}",
            self.state.version,
            dirty.len()
        );

        let event = UpdateEvent {
            version: self.state.version,
            dirty: &dirty,
            state: &self.state,
        };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
        Ok(output)
    }

    /// Dispatch one command in its own transaction.
    pub fn dispatch(&mut self, command: &Command) -> Result<bool> {
        self.update(|txn| txn.dispatch(command))
    }

    /// Replace the document with an interchange JSON document.
    ///
    /// Unknown node types are skipped and reported as warnings.
    pub fn load_json(&mut self, source: &str) -> Result<Vec<ImportWarning>> {
        let record: SerializedNode =
            serde_json::from_str(source).map_err(|err| DocError::Parse(err.to_string()))?;
        let warnings = self.update(|txn| {
            let registry = txn.registry();
            let warnings = json::import_document(txn.tree_mut(), registry, &record)?;
            txn.set_selection(None);
            Ok(warnings)
        })?;
        info!(
            "event=load_json module=editor nodes={} warnings={}",
            self.state.tree.len(),
            warnings.len()
        );
        Ok(warnings)
    }

    /// Export the committed document as pretty-printed interchange JSON.
    pub fn to_json(&self) -> Result<String> {
        let record = json::export_document(&self.state.tree, &self.registry)?;
        serde_json::to_string_pretty(&record)
            .map_err(|err| DocError::Serialization(err.to_string()))
    }

    /// Import a markup fragment at the selection (or the end of the document).
    pub fn import_html(&mut self, fragment: &str) -> Result<Vec<NodeKey>> {
        self.update(|txn| {
            let registry = txn.registry();
            let keys = html::import_from_markup(txn.tree_mut(), registry, fragment)?;
            for key in &keys {
                txn.insert_block(*key)?;
            }
            Ok(keys)
        })
    }

    /// Export the committed document as a markup fragment.
    pub fn to_html(&self) -> Result<String> {
        html::export_to_markup(&self.state.tree, &self.registry, self.state.tree.root())
    }

    /// Export the committed document as a standalone HTML page.
    pub fn to_html_document(&self, options: &HtmlOptions) -> Result<String> {
        html::serialize_document(&self.state.tree, &self.registry, options)
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::with_defaults()
    }
}
