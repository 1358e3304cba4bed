//! Replaying serialized command scripts

use quire_doc::nodes::base::plain_text;
use quire_doc::nodes::layout::{LayoutContainer, CONTAINER_TYPE};
use quire_doc::{Command, Editor};

const SCRIPT: &str = r#"[
    {"type": "INSERT_PARAGRAPH_COMMAND", "payload": {"text": "Intro"}},
    {"type": "INSERT_LAYOUT_COMMAND", "payload": {"columns": 3}},
    {"type": "UPDATE_LAYOUT_COMMAND", "payload": {"columns": 2, "rebuild": true}},
    {"type": "INSERT_EQUATION_COMMAND", "payload": {"equation": "x^2", "inline": true}},
    {"type": "INSERT_PAGE_BREAK_COMMAND"},
    {"type": "INSERT_YOUTUBE_COMMAND", "payload": {"url": "https://youtu.be/dQw4w9WgXcQ"}}
]"#;

#[test]
fn script_replays_in_order() {
    let commands: Vec<Command> = serde_json::from_str(SCRIPT).unwrap();
    assert_eq!(commands.len(), 6);

    let mut editor = Editor::with_defaults();
    for command in &commands {
        assert!(editor.dispatch(command).unwrap(), "{} declined", command.kind());
    }
    assert_eq!(editor.state().version, 6);

    let root = editor.tree().root();
    let top: Vec<_> = editor
        .tree()
        .children(root)
        .iter()
        .map(|k| editor.tree().type_of(*k).unwrap())
        .collect();
    assert_eq!(top[0], "paragraph");
    assert_eq!(top[1], CONTAINER_TYPE);
    assert_eq!(plain_text(editor.tree(), editor.tree().children(root)[0]), "Intro");

    let layout = editor.tree().children(root)[1];
    assert_eq!(editor.tree().payload_as::<LayoutContainer>(layout).unwrap().columns, 2);
    assert_eq!(editor.tree().children(layout).len(), 2);
}

#[test]
fn commands_serialize_back_to_the_same_script() {
    let commands: Vec<Command> = serde_json::from_str(SCRIPT).unwrap();
    let text = serde_json::to_string(&commands).unwrap();
    let again: Vec<Command> = serde_json::from_str(&text).unwrap();
    assert_eq!(again, commands);
}

#[test]
fn unknown_command_type_fails_to_parse() {
    let result: Result<Vec<Command>, _> =
        serde_json::from_str(r#"[{"type": "FORMAT_TEXT_COMMAND", "payload": {}}]"#);
    assert!(result.is_err());
}
