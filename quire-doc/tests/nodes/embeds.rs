use quire_doc::nodes::figma::{Figma, FIGMA_TYPE};
use quire_doc::nodes::youtube::{YouTube, YOUTUBE_TYPE};
use quire_doc::{Command, Editor};

fn youtube(editor: &mut Editor, url: &str) -> bool {
    editor
        .dispatch(&Command::InsertYouTube { url: url.into() })
        .unwrap()
}

#[test]
fn youtube_urls_insert_video_nodes() {
    let mut editor = Editor::with_defaults();
    assert!(youtube(&mut editor, "https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
    assert!(youtube(&mut editor, "https://youtu.be/dQw4w9WgXcQ"));

    let root = editor.tree().root();
    let ids: Vec<_> = editor
        .tree()
        .children(root)
        .iter()
        .map(|k| {
            assert_eq!(editor.tree().type_of(*k), Some(YOUTUBE_TYPE));
            editor.tree().payload_as::<YouTube>(*k).unwrap().video_id.clone()
        })
        .collect();
    assert_eq!(ids, vec!["dQw4w9WgXcQ", "dQw4w9WgXcQ"]);
}

#[test]
fn short_video_id_is_declined() {
    let mut editor = Editor::with_defaults();
    assert!(!youtube(&mut editor, "https://www.youtube.com/watch?v=abc"));
    assert!(!youtube(&mut editor, "not a url"));
    assert!(editor.tree().is_empty());
    assert_eq!(editor.state().version, 0);
}

#[test]
fn youtube_markup_is_nocookie_embed() {
    let mut editor = Editor::with_defaults();
    youtube(&mut editor, "https://youtu.be/dQw4w9WgXcQ");
    let html = editor.to_html().unwrap();
    assert!(html.contains(r#"data-youtube-id="dQw4w9WgXcQ""#));
    assert!(html.contains("https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ"));
}

#[test]
fn figma_accepts_file_and_prototype_links() {
    let mut editor = Editor::with_defaults();
    for url in [
        "https://www.figma.com/file/abc123/Design",
        "https://figma.com/proto/abc123/Flow",
    ] {
        assert!(editor
            .dispatch(&Command::InsertFigma { document_id: url.into() })
            .unwrap());
        let key = editor.state().selection.unwrap();
        assert_eq!(editor.tree().type_of(key), Some(FIGMA_TYPE));
        assert_eq!(editor.tree().payload_as::<Figma>(key).unwrap().document_id, url);
    }
    assert!(editor.to_html().unwrap().contains("https://www.figma.com/embed?embed_host=share"));
}

#[test]
fn figma_rejects_other_hosts() {
    let mut editor = Editor::with_defaults();
    assert!(!editor
        .dispatch(&Command::InsertFigma {
            document_id: "https://www.figma.com/community/plugin/1".into(),
        })
        .unwrap());
    assert!(editor.tree().is_empty());
}
