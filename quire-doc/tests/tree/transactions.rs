use quire_doc::nodes::base::{TextFormat, TextNode, PARAGRAPH_TYPE, TEXT_TYPE};
use quire_doc::{Command, DocError, Editor};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn failed_transaction_keeps_committed_state() {
    let mut editor = Editor::with_defaults();
    editor
        .dispatch(&Command::InsertParagraph {
            text: "kept".into(),
        })
        .unwrap();
    let before = editor.to_json().unwrap();
    let version = editor.state().version;

    let result = editor.update(|txn| {
        let root = txn.tree().root();
        txn.tree_mut().clear_children(root)?;
        let p = txn.create_node(PARAGRAPH_TYPE)?;
        txn.insert_block(p)?;
        let t = txn.create_node_with(TEXT_TYPE, TextNode::new("lost", TextFormat::BOLD))?;
        // a text leaf cannot own children
        txn.tree_mut().append(t, p)
    });

    assert!(matches!(result, Err(DocError::NotAnElement(_))));
    assert_eq!(editor.state().version, version);
    assert_eq!(editor.to_json().unwrap(), before);
}

#[test]
fn listeners_fire_once_per_commit_in_order() {
    let mut editor = Editor::with_defaults();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    editor.add_listener(move |event| {
        sink.borrow_mut().push((event.version, event.dirty.len()));
    });

    editor.dispatch(&Command::InsertPageBreak).unwrap();
    editor.dispatch(&Command::InsertPageBreak).unwrap();
    let _ = editor.dispatch(&Command::InsertLayout { columns: Some(0) });

    let seen = seen.borrow();
    assert_eq!(seen.iter().map(|(v, _)| *v).collect::<Vec<_>>(), vec![1, 2]);
    assert!(seen.iter().all(|(_, dirty)| *dirty > 0));
}

#[test]
fn removed_listener_stops_receiving() {
    let mut editor = Editor::with_defaults();
    let count = Rc::new(RefCell::new(0));
    let sink = count.clone();
    let id = editor.add_listener(move |_| *sink.borrow_mut() += 1);
    editor.dispatch(&Command::InsertPageBreak).unwrap();
    assert!(editor.remove_listener(id));
    editor.dispatch(&Command::InsertPageBreak).unwrap();
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn selection_of_removed_node_is_cleared() {
    let mut editor = Editor::with_defaults();
    editor.dispatch(&Command::InsertPageBreak).unwrap();
    let selected = editor.state().selection.unwrap();
    editor.update(|txn| txn.tree_mut().remove(selected)).unwrap();
    assert_eq!(editor.state().selection, None);
    assert!(editor.tree().is_empty());
}
