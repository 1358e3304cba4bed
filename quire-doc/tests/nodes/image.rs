use proptest::prelude::*;
use quire_doc::nodes::image::{
    convert_to_direct_image_url, Alignment, Image, ImageResizer, IMAGE_TYPE,
};
use quire_doc::{Command, DocError, Editor};

fn insert(editor: &mut Editor, src: &str) -> bool {
    editor
        .dispatch(&Command::InsertImage {
            src: src.into(),
            alt_text: "alt".into(),
            caption: None,
            alignment: None,
            width: None,
            height: None,
        })
        .unwrap()
}

proptest! {
    #[test]
    fn locked_resize_keeps_natural_ratio(
        natural_width in 1u32..4000,
        natural_height in 1u32..4000,
        width in 1u32..4000,
    ) {
        let image = Image::new("a.png", "");
        let mut resizer = ImageResizer::open(&image, natural_width, natural_height, true);
        resizer.set_width(width);
        let (w, h) = resizer.size();
        prop_assert_eq!(w, width);
        let exact = f64::from(width) * f64::from(natural_height) / f64::from(natural_width);
        prop_assert!((f64::from(h) - exact).abs() <= 0.5);
    }

    #[test]
    fn unlocked_resize_touches_one_side(
        natural in (1u32..4000, 1u32..4000),
        height in 1u32..4000,
    ) {
        let image = Image::new("a.png", "");
        let mut resizer = ImageResizer::open(&image, natural.0, natural.1, false);
        resizer.set_height(height);
        prop_assert_eq!(resizer.size(), (natural.0, height));
        resizer.reset();
        prop_assert_eq!(resizer.size(), natural);
    }
}

#[test]
fn resizer_applies_through_the_bus() {
    let mut editor = Editor::with_defaults();
    assert!(insert(&mut editor, "https://example.com/a.png"));
    let key = editor.state().selection.unwrap();

    let image = editor.tree().payload_as::<Image>(key).unwrap().clone();
    let mut resizer = ImageResizer::open(&image, 800, 600, editor.options().lock_aspect_ratio);
    resizer.set_width(400);
    assert!(editor.dispatch(&resizer.apply(key)).unwrap());

    let image = editor.tree().payload_as::<Image>(key).unwrap();
    assert_eq!((image.width, image.height), (Some(400), Some(300)));
}

#[test]
fn zero_size_is_rejected() {
    let mut editor = Editor::with_defaults();
    insert(&mut editor, "https://example.com/a.png");
    let err = editor
        .dispatch(&Command::ResizeImage {
            key: None,
            width: 0,
            height: 10,
        })
        .unwrap_err();
    assert!(matches!(err, DocError::MalformedPayload { .. }));
}

#[test]
fn empty_src_inserts_nothing() {
    let mut editor = Editor::with_defaults();
    assert!(!insert(&mut editor, "   "));
    assert!(editor.tree().is_empty());
}

#[test]
fn cloud_share_links_are_rewritten_on_insert() {
    let mut editor = Editor::with_defaults();
    insert(&mut editor, "https://drive.google.com/file/d/ABC123/view?usp=sharing");
    let key = editor.state().selection.unwrap();
    assert_eq!(editor.tree().type_of(key), Some(IMAGE_TYPE));
    assert_eq!(
        editor.tree().payload_as::<Image>(key).unwrap().src,
        "https://drive.google.com/thumbnail?id=ABC123&sz=w2000"
    );

    assert_eq!(
        convert_to_direct_image_url("https://www.dropbox.com/s/xyz/cat.png?dl=0"),
        "https://dl.dropboxusercontent.com/s/xyz/cat.png"
    );
    assert_eq!(
        convert_to_direct_image_url("https://example.com/file/d/ABC123/view"),
        "https://example.com/file/d/ABC123/view"
    );
}

#[test]
fn caption_and_alignment_commands_target_selection() {
    let mut editor = Editor::with_defaults();
    insert(&mut editor, "a.png");
    assert!(editor
        .dispatch(&Command::SetImageCaption {
            key: None,
            caption: "A caption".into(),
        })
        .unwrap());
    assert!(editor
        .dispatch(&Command::SetImageAlignment {
            key: None,
            alignment: Alignment::Left,
        })
        .unwrap());

    let key = editor.state().selection.unwrap();
    let image = editor.tree().payload_as::<Image>(key).unwrap();
    assert_eq!(image.caption, "A caption");
    assert_eq!(image.alignment, Alignment::Left);
}

#[test]
fn zero_size_insert_is_rejected() {
    let mut editor = Editor::with_defaults();
    let err = editor
        .dispatch(&Command::InsertImage {
            src: "https://example.com/cat.png".into(),
            alt_text: "alt".into(),
            caption: None,
            alignment: None,
            width: Some(0),
            height: Some(0),
        })
        .unwrap_err();
    assert!(matches!(err, DocError::MalformedPayload { .. }));
    assert!(editor.tree().is_empty());
    assert_eq!(editor.state().version, 0);
}

#[test]
fn zero_size_in_json_is_rejected() {
    let mut editor = Editor::with_defaults();
    let err = editor
        .load_json(
            r#"{"type":"root","version":1,"children":[
                {"type":"image","version":1,"src":"https://example.com/cat.png","altText":"","width":0,"height":0}
            ]}"#,
        )
        .unwrap_err();
    assert!(matches!(err, DocError::MalformedPayload { .. }));
    assert!(editor.tree().is_empty());
}

#[test]
fn zero_size_in_markup_is_ignored() {
    let mut editor = Editor::with_defaults();
    let keys = editor
        .import_html(r#"<img src="https://example.com/cat.png" alt="" width="0" height="120">"#)
        .unwrap();
    let image = editor.tree().payload_as::<Image>(keys[0]).unwrap();
    assert_eq!(image.width, None);
    assert_eq!(image.height, Some(120));
    assert!(!editor.to_html().unwrap().contains("width=\"0\""));
}
