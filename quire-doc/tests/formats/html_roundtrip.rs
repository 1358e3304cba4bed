use quire_doc::nodes::base::{
    plain_text, Heading, HeadingTag, TextFormat, TextNode, HEADING_TYPE, TEXT_TYPE,
};
use quire_doc::nodes::image::Alignment;
use quire_doc::{Command, Editor};

/// Export `editor` as markup, import it into a fresh editor and compare interchange output.
fn assert_markup_round_trip(editor: &Editor) {
    let html = editor.to_html().unwrap();
    let mut copy = Editor::with_defaults();
    copy.import_html(&html).unwrap();
    assert_eq!(copy.to_json().unwrap(), editor.to_json().unwrap(), "markup was: {html}");
}

fn editor_with(commands: &[Command]) -> Editor {
    let mut editor = Editor::with_defaults();
    for command in commands {
        assert!(editor.dispatch(command).unwrap(), "{:?} not handled", command.kind());
    }
    editor
}

#[test]
fn paragraphs_with_formatting() {
    let mut editor = editor_with(&[Command::InsertParagraph { text: "plain".into() }]);
    editor
        .update(|txn| {
            let p = txn.selection().unwrap();
            let t = txn.create_node_with(TEXT_TYPE, TextNode::new(" loud", TextFormat::BOLD | TextFormat::ITALIC))?;
            txn.tree_mut().append(p, t)
        })
        .unwrap();
    assert_markup_round_trip(&editor);
}

#[test]
fn collapsible_open_and_closed() {
    let mut editor = editor_with(&[Command::InsertCollapsible, Command::InsertCollapsible]);
    assert_markup_round_trip(&editor);

    assert!(editor.dispatch(&Command::ToggleCollapsible { key: None }).unwrap());
    assert_markup_round_trip(&editor);
}

#[test]
fn images_keep_caption_alignment_and_size() {
    let editor = editor_with(&[Command::InsertImage {
        src: "https://example.com/cat.png".into(),
        alt_text: "a cat".into(),
        caption: Some("Cat <3".into()),
        alignment: Some(Alignment::Right),
        width: Some(320),
        height: Some(200),
    }]);
    assert_markup_round_trip(&editor);
}

#[test]
fn layouts_equations_and_page_breaks() {
    let editor = editor_with(&[
        Command::InsertLayout { columns: Some(3) },
        Command::InsertPageBreak,
        Command::InsertEquation {
            equation: "\\frac{a}{b} + x^2".into(),
            inline: false,
        },
    ]);
    assert_markup_round_trip(&editor);
}

#[test]
fn embeds() {
    let editor = editor_with(&[
        Command::InsertYouTube {
            url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".into(),
        },
        Command::InsertFigma {
            document_id: "https://www.figma.com/file/abc123/Design".into(),
        },
    ]);
    assert_markup_round_trip(&editor);
}

#[test]
fn nested_lists() {
    let mut editor = Editor::with_defaults();
    editor
        .import_html("<ul><li>one</li><li>two<ol><li>three</li></ol></li></ul>")
        .unwrap();
    assert_markup_round_trip(&editor);
}

#[test]
fn unknown_wrappers_are_dropped_but_text_survives() {
    let mut editor = Editor::with_defaults();
    let keys = editor
        .import_html("<section><article>Hello <b>world</b></article></section><script>alert(1)</script>")
        .unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(plain_text(editor.tree(), keys[0]), "Hello world");
    assert!(!editor.to_html().unwrap().contains("alert"));
}

#[test]
fn page_break_figure_is_not_an_image() {
    let mut editor = Editor::with_defaults();
    let keys = editor
        .import_html(r#"<figure style="page-break-after: always"></figure>"#)
        .unwrap();
    assert_eq!(editor.tree().type_of(keys[0]), Some("page-break"));
}

#[test]
fn document_snapshot() {
    let mut editor = Editor::with_defaults();
    editor
        .update(|txn| {
            let h = txn.create_node_with(HEADING_TYPE, Heading { tag: HeadingTag::H2 })?;
            let t = txn.create_node_with(TEXT_TYPE, TextNode::new("Title", TextFormat::default()))?;
            txn.tree_mut().append(h, t)?;
            txn.insert_block(h)
        })
        .unwrap();
    editor
        .dispatch(&Command::InsertParagraph { text: "Body & more".into() })
        .unwrap();
    editor.dispatch(&Command::InsertPageBreak).unwrap();

    insta::assert_snapshot!(editor.to_html().unwrap(), @r###"<h2>Title</h2><p>Body &amp; more</p><figure class="page-break" style="page-break-after: always"></figure>"###);
}
