use quire_doc::nodes::collapsible::{is_open, CONTAINER_TYPE, TITLE_TYPE};
use quire_doc::{Command, Editor};
use std::cell::RefCell;
use std::rc::Rc;

fn container(editor: &Editor) -> quire_doc::NodeKey {
    editor.tree().children(editor.tree().root())[0]
}

#[test]
fn insert_selects_title() {
    let mut editor = Editor::with_defaults();
    assert!(editor.dispatch(&Command::InsertCollapsible).unwrap());
    let selected = editor.state().selection.unwrap();
    assert_eq!(editor.tree().type_of(selected), Some(TITLE_TYPE));
    assert_eq!(editor.tree().type_of(container(&editor)), Some(CONTAINER_TYPE));
    assert!(is_open(editor.tree(), container(&editor)).unwrap());
}

#[test]
fn toggle_twice_restores_open_and_notifies_each_time() {
    let mut editor = Editor::with_defaults();
    editor.dispatch(&Command::InsertCollapsible).unwrap();
    let key = container(&editor);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    editor.add_listener(move |event| {
        let open = is_open(&event.state.tree, key).unwrap();
        sink.borrow_mut().push(open);
    });

    let toggle = Command::ToggleCollapsible { key: Some(key) };
    assert!(editor.dispatch(&toggle).unwrap());
    assert!(!is_open(editor.tree(), key).unwrap());
    assert!(editor.dispatch(&toggle).unwrap());
    assert!(is_open(editor.tree(), key).unwrap());

    assert_eq!(*seen.borrow(), vec![false, true]);
}

#[test]
fn toggle_from_inside_content_finds_container() {
    let mut editor = Editor::with_defaults();
    editor.dispatch(&Command::InsertCollapsible).unwrap();
    let key = container(&editor);
    let paragraph = editor.tree().descendants(key).into_iter().last().unwrap();

    editor
        .dispatch(&Command::ToggleCollapsible { key: Some(paragraph) })
        .unwrap();
    assert!(!is_open(editor.tree(), key).unwrap());
}

#[test]
fn toggle_outside_any_container_is_not_handled() {
    let mut editor = Editor::with_defaults();
    editor
        .dispatch(&Command::InsertParagraph { text: "x".into() })
        .unwrap();
    let version = editor.state().version;
    assert!(!editor.dispatch(&Command::ToggleCollapsible { key: None }).unwrap());
    assert_eq!(editor.state().version, version);
}
