//! Maximum list nesting
//!
//! Registers a high-priority indent handler that claims the command, doing
//! nothing, once the selected item is already at the configured depth. Below the
//! limit it declines and the default list handler runs.

use super::list::{list_item_depth, selected_list_item, LIST_ITEM_TYPE};
use crate::commands::{Command, CommandBus, CommandKind, HandlerId, PRIORITY_HIGH};
use crate::editor::{Extension, Transaction};
use crate::error::Result;
use log::debug;

pub struct ListIndentLimit;

impl Extension for ListIndentLimit {
    fn name(&self) -> &'static str {
        "list-max-indent"
    }

    fn required_types(&self) -> &'static [&'static str] {
        &[LIST_ITEM_TYPE]
    }

    fn register(&self, bus: &mut CommandBus) -> Vec<HandlerId> {
        vec![bus.register(CommandKind::IndentContent, PRIORITY_HIGH, block_deep_indent)]
    }
}

fn block_deep_indent(txn: &mut Transaction<'_>, _command: &Command) -> Result<bool> {
    let Some(item) = selected_list_item(txn) else {
        return Ok(false);
    };
    let depth = list_item_depth(txn.tree(), item);
    let max = txn.options().max_list_indent_depth;
    if depth >= max {
        debug!("event=indent_blocked module=list_indent item={item} depth={depth} max={max}");
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{Editor, EditorOptions};
    use crate::nodes::list::LIST_TYPE;
    use crate::tree::NodeKey;

    fn editor_with_items(max: usize, items: usize) -> (Editor, Vec<NodeKey>) {
        let mut editor = Editor::with_options(EditorOptions {
            max_list_indent_depth: max,
            ..EditorOptions::default()
        });
        let keys = editor
            .update(|txn| {
                let list = txn.create_node(LIST_TYPE)?;
                let mut keys = Vec::new();
                for _ in 0..items {
                    let item = txn.create_node(LIST_ITEM_TYPE)?;
                    txn.tree_mut().append(list, item)?;
                    keys.push(item);
                }
                txn.insert_block(list)?;
                Ok(keys)
            })
            .unwrap();
        (editor, keys)
    }

    #[test]
    fn test_indent_stops_at_max_depth() {
        let (mut editor, items) = editor_with_items(2, 3);
        editor
            .update(|txn| {
                txn.set_selection(Some(items[1]));
                Ok(())
            })
            .unwrap();
        assert!(editor.dispatch(&Command::IndentContent).unwrap());
        assert_eq!(list_item_depth(editor.tree(), items[1]), 2);

        editor
            .update(|txn| {
                txn.set_selection(Some(items[2]));
                Ok(())
            })
            .unwrap();
        assert!(editor.dispatch(&Command::IndentContent).unwrap());
        assert_eq!(editor.tree().previous_sibling(items[2]), Some(items[1]));

        let version = editor.state().version;
        assert!(editor.dispatch(&Command::IndentContent).unwrap());
        assert_eq!(list_item_depth(editor.tree(), items[2]), 2);
        assert_eq!(editor.state().version, version);
    }

    #[test]
    fn test_limit_ignores_non_list_selection() {
        let mut editor = Editor::with_defaults();
        editor.dispatch(&Command::InsertPageBreak).unwrap();
        assert!(!editor.dispatch(&Command::IndentContent).unwrap());
    }
}
