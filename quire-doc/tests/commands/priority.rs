use quire_doc::commands::{PRIORITY_EDITOR, PRIORITY_HIGH};
use quire_doc::{Command, CommandKind, Editor, EditorOptions, NodeTypeRegistry, Result, Transaction};
use std::cell::RefCell;
use std::rc::Rc;

type Calls = Rc<RefCell<Vec<&'static str>>>;

fn recorder(
    calls: &Calls,
    name: &'static str,
    handled: bool,
) -> impl Fn(&mut Transaction<'_>, &Command) -> Result<bool> {
    let calls = calls.clone();
    move |_: &mut Transaction<'_>, _: &Command| {
        calls.borrow_mut().push(name);
        Ok(handled)
    }
}

fn bare_editor() -> Editor {
    Editor::new(NodeTypeRegistry::with_defaults(), EditorOptions::default())
}

#[test]
fn higher_priority_runs_first_and_short_circuits() {
    let mut editor = bare_editor();
    let calls = Calls::default();
    editor
        .bus_mut()
        .register(CommandKind::InsertPageBreak, 10, recorder(&calls, "a", true));
    editor
        .bus_mut()
        .register(CommandKind::InsertPageBreak, 20, recorder(&calls, "b", true));

    assert!(editor.dispatch(&Command::InsertPageBreak).unwrap());
    assert_eq!(*calls.borrow(), vec!["b"]);
}

#[test]
fn equal_priorities_run_in_registration_order() {
    let mut editor = bare_editor();
    let calls = Calls::default();
    for name in ["first", "second", "third"] {
        editor
            .bus_mut()
            .register(CommandKind::IndentContent, 5, recorder(&calls, name, false));
    }
    assert!(!editor.dispatch(&Command::IndentContent).unwrap());
    assert_eq!(*calls.borrow(), vec!["first", "second", "third"]);
}

#[test]
fn unhandled_command_reports_false_without_commit() {
    let mut editor = bare_editor();
    assert!(!editor.dispatch(&Command::InsertCollapsible).unwrap());
    assert_eq!(editor.state().version, 0);
}

#[test]
fn override_sits_above_builtin_handler() {
    let mut editor = Editor::with_defaults();
    let calls = Calls::default();
    let id = editor
        .bus_mut()
        .register(CommandKind::InsertPageBreak, PRIORITY_HIGH, recorder(&calls, "veto", true));

    assert!(editor.dispatch(&Command::InsertPageBreak).unwrap());
    assert!(editor.tree().is_empty());

    assert!(editor.bus_mut().unregister(id));
    assert!(editor.dispatch(&Command::InsertPageBreak).unwrap());
    assert_eq!(editor.tree().children(editor.tree().root()).len(), 1);
    assert_eq!(*calls.borrow(), vec!["veto"]);
}

#[test]
fn uninstall_removes_extension_handlers() {
    let mut editor = Editor::with_defaults();
    assert_eq!(editor.bus_mut().handler_count(CommandKind::InsertFigma), 1);
    assert!(editor.uninstall("figma"));
    assert_eq!(editor.bus_mut().handler_count(CommandKind::InsertFigma), 0);
    assert!(!editor.uninstall("figma"));

    editor
        .bus_mut()
        .register(CommandKind::InsertFigma, PRIORITY_EDITOR, |_, _| Ok(false));
    assert!(!editor
        .dispatch(&Command::InsertFigma {
            document_id: "https://www.figma.com/file/abc".into(),
        })
        .unwrap());
}
