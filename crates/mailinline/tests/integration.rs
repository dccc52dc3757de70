//! Integration tests for the inliner.
//!
//! Stylesheets are written to temporary directories and messages are run
//! through the public entry points the way a send pipeline would.

#![allow(clippy::unwrap_used)]

use std::fs;
use std::path::Path;

use proptest::prelude::*;

use mailinline::mime::{ContentType, Headers, Message, OtherPart, Part, TextPart};
use mailinline::{Config, Email, Inliner, MessageEvent, MessageSending, RawMessage, SendListener};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn write_css(dir: &Path, name: &str, css: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, css).unwrap();
    path.to_string_lossy().into_owned()
}

fn inliner_with_global(css: &str) -> (tempfile::TempDir, Inliner) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_css(dir.path(), "global.css", css);
    let inliner = Inliner::new(&Config::builder().stylesheet(path).build()).unwrap();
    (dir, inliner)
}

fn message(body: impl Into<Part>) -> Message {
    let mut headers = Headers::new();
    headers.add("From", "shop@example.com");
    headers.add("Subject", "Your order");
    Message::new(headers).with_body(body)
}

fn image(name: &str) -> Part {
    OtherPart::new(&ContentType::new("image", "png"), "iVBORw0KGgo=")
        .with_header("Content-ID", format!("<{name}>"))
        .into()
}

fn html_body(message: &Message) -> &str {
    match message.body() {
        Some(Part::Text(text)) => text.body(),
        other => panic!("expected a text body, got {other:?}"),
    }
}

#[test]
fn test_global_css_on_single_html_body() {
    init_tracing();
    let (_dir, inliner) = inliner_with_global("p{color:red}");

    let mut msg = message(TextPart::html("<p>hi</p>"));
    inliner.handle_message(&mut msg).unwrap();

    assert_eq!(html_body(&msg), "<p style=\"color: red\">hi</p>");
}

#[test]
fn test_linked_stylesheet_in_full_document() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let css = write_css(dir.path(), "x.css", "p{color:blue}");
    let html = format!(
        "<html><head><link rel=\"stylesheet\" href=\"{css}\"></head><body><p>hi</p></body></html>"
    );

    let inliner = Inliner::new(&Config::new()).unwrap();
    let mut msg = message(TextPart::html(html));
    inliner.handle_message(&mut msg).unwrap();

    let body = html_body(&msg);
    assert!(!body.contains("<link"));
    assert!(body.contains("<p style=\"color: blue\">hi</p>"));
}

#[test]
fn test_linked_and_global_css_combined() {
    init_tracing();
    let (dir, inliner) = inliner_with_global("p { margin: 0 } .note { color: gray }");
    let linked = write_css(dir.path(), "a.css", ".note { color: teal }");
    let html = format!("<link rel=\"stylesheet\" href=\"{linked}\"><p class=\"note\">x</p>");

    let mut msg = message(TextPart::html(html));
    inliner.handle_message(&mut msg).unwrap();

    // Linked rules come after global ones, so they win on equal specificity
    assert_eq!(
        html_body(&msg),
        "<p class=\"note\" style=\"margin: 0; color: teal\">x</p>"
    );
}

#[test]
fn test_link_free_html_unchanged_without_css() {
    init_tracing();
    let inliner = Inliner::new(&Config::new()).unwrap();
    let html = "<div><P>Keep   my <b>markup</P></div>";

    let mut msg = message(TextPart::html(html));
    inliner.handle_message(&mut msg).unwrap();

    assert_eq!(html_body(&msg), html);
}

#[test]
fn test_mixed_only_alternative_html_transformed() {
    init_tracing();
    let (_dir, inliner) = inliner_with_global("p{color:red}");

    let plain: Part = TextPart::plain("<p>plain</p>").into();
    let attachment: Part = OtherPart::new(&ContentType::new("application", "pdf"), "JVBERi0=")
        .with_header("Content-Disposition", "attachment; filename=\"invoice.pdf\"")
        .into();
    let mut msg = message(Part::Mixed(vec![
        plain.clone(),
        Part::Alternative(vec![
            TextPart::plain("hi").into(),
            TextPart::html("<p>hi</p>").into(),
        ]),
        attachment.clone(),
    ]));
    inliner.handle_message(&mut msg).unwrap();

    let children = msg.body().unwrap().children();
    assert_eq!(children.len(), 3);
    assert_eq!(children[0], plain);
    assert_eq!(
        children[1],
        Part::Alternative(vec![
            TextPart::plain("hi").into(),
            TextPart::html("<p style=\"color: red\">hi</p>").into(),
        ])
    );
    assert_eq!(children[2], attachment);
}

#[test]
fn test_related_main_first_resources_in_order() {
    init_tracing();
    let (_dir, inliner) = inliner_with_global("img{border:0}");

    let mut msg = message(Part::Related(vec![
        TextPart::html("<img src=\"cid:logo\">").into(),
        image("logo"),
        image("banner"),
    ]));
    inliner.handle_message(&mut msg).unwrap();

    let Some(Part::Related(children)) = msg.body() else {
        panic!("expected a related body");
    };
    assert_eq!(children.len(), 3);
    assert_eq!(
        children[0],
        Part::Text(TextPart::html("<img src=\"cid:logo\" style=\"border: 0\">"))
    );
    assert_eq!(children[1], image("logo"));
    assert_eq!(children[2], image("banner"));
}

#[test]
fn test_missing_linked_stylesheet_fails_without_changes() {
    init_tracing();
    let (dir, inliner) = inliner_with_global("p{color:red}");
    let missing = dir.path().join("missing.css");
    let html = format!(
        "<link rel=\"stylesheet\" href=\"{}\"><p>hi</p>",
        missing.display()
    );

    let mut msg = message(Part::Mixed(vec![
        TextPart::html("<p>first</p>").into(),
        TextPart::html(html).into(),
    ]));
    let before = msg.clone();

    let err = inliner.handle_message(&mut msg).unwrap_err();
    assert!(err.is_io());
    assert!(err.to_string().contains("missing.css"));
    assert_eq!(msg, before);
}

#[test]
fn test_missing_global_stylesheet_fails_construction() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::builder().stylesheet(dir.path().join("nope.css")).build();

    let err = Inliner::new(&config).unwrap_err();
    assert!(err.is_io());
}

#[test]
fn test_linked_stylesheet_read_fresh_each_time() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let css = write_css(dir.path(), "live.css", "p{color:red}");
    let html = format!("<link rel=\"stylesheet\" href=\"{css}\"><p>x</p>");
    let inliner = Inliner::new(&Config::new()).unwrap();

    let mut first = message(TextPart::html(html.clone()));
    inliner.handle_message(&mut first).unwrap();
    assert_eq!(html_body(&first), "<p style=\"color: red\">x</p>");

    fs::write(&css, "p{color:green}").unwrap();
    let mut second = message(TextPart::html(html));
    inliner.handle_message(&mut second).unwrap();
    assert_eq!(html_body(&second), "<p style=\"color: green\">x</p>");
}

#[test]
fn test_listeners_handle_both_events() {
    init_tracing();
    let (_dir, inliner) = inliner_with_global("p{color:red}");
    let listeners: Vec<Box<dyn SendListener>> = vec![Box::new(inliner)];

    let mut sending = MessageSending::new(message(TextPart::html("<p>a</p>")));
    let mut transport = MessageEvent::new(message(TextPart::html("<p>b</p>")), "smtp", false);
    let mut raw = MessageEvent::new(RawMessage::new("Subject: raw\r\n\r\n<p>c</p>"), "smtp", true);
    for listener in &listeners {
        listener.on_sending(&mut sending).unwrap();
        listener.on_message(&mut transport).unwrap();
        listener.on_message(&mut raw).unwrap();
    }

    assert_eq!(
        html_body(sending.message.as_mime().unwrap()),
        "<p style=\"color: red\">a</p>"
    );
    assert_eq!(
        html_body(transport.message().as_mime().unwrap()),
        "<p style=\"color: red\">b</p>"
    );
    assert_eq!(
        raw.message(),
        &Email::Raw(RawMessage::new("Subject: raw\r\n\r\n<p>c</p>"))
    );
}

#[test]
fn test_inline_raw_message() {
    init_tracing();
    let (_dir, inliner) = inliner_with_global("p{color:red}");
    let raw = concat!(
        "From: shop@example.com\r\n",
        "Subject: Receipt\r\n",
        "MIME-Version: 1.0\r\n",
        "Content-Type: multipart/alternative; boundary=\"b1\"\r\n",
        "\r\n",
        "--b1\r\n",
        "Content-Type: text/plain; charset=utf-8\r\n",
        "\r\n",
        "Thanks\r\n",
        "--b1\r\n",
        "Content-Type: text/html; charset=utf-8\r\n",
        "Content-Transfer-Encoding: quoted-printable\r\n",
        "\r\n",
        "<p>Thanks</p>\r\n",
        "--b1--\r\n",
    );

    let out = inliner.inline_raw(raw).unwrap();
    let parsed = Message::parse(&out).unwrap();

    assert_eq!(parsed.subject(), Some("Receipt"));
    let body = parsed.body().unwrap();
    assert!(matches!(body, Part::Alternative(children) if children.len() == 2));
    assert_eq!(body.children()[0], Part::Text(TextPart::plain("Thanks")));
    let html = body.html_parts();
    assert_eq!(html.len(), 1);
    assert_eq!(html[0].body(), "<p style=\"color: red\">Thanks</p>");
}

#[test]
fn test_inline_raw_latin1_message() {
    init_tracing();
    let (_dir, inliner) = inliner_with_global("p{color:red}");
    let raw = concat!(
        "Subject: Menu\r\n",
        "Content-Type: text/html; charset=iso-8859-1\r\n",
        "Content-Transfer-Encoding: quoted-printable\r\n",
        "\r\n",
        "<p>caf=E9</p>",
    );

    let out = inliner.inline_raw(raw).unwrap();
    assert!(out.contains("charset=iso-8859-1"));
    assert!(out.contains("caf=E9"));

    let parsed = Message::parse(&out).unwrap();
    assert_eq!(html_body(&parsed), "<p style=\"color: red\">café</p>");
}

fn opaque_part() -> impl Strategy<Value = Part> {
    (
        prop::sample::select(vec![
            ("application", "pdf"),
            ("application", "octet-stream"),
            ("image", "png"),
            ("multipart", "signed"),
            ("audio", "mpeg"),
        ]),
        "[A-Za-z0-9+/=]{0,120}",
    )
        .prop_map(|((main, sub), body)| {
            Part::Other(OtherPart::new(&ContentType::new(main, sub), body))
        })
}

proptest! {
    #[test]
    fn opaque_body_is_left_alone(part in opaque_part()) {
        let inliner = Inliner::new(&Config::new()).unwrap();
        prop_assert_eq!(inliner.transform_part(&part).unwrap(), None);

        let mut msg = message(part);
        let before = msg.clone();
        inliner.handle_message(&mut msg).unwrap();
        prop_assert_eq!(msg, before);
    }

    #[test]
    fn opaque_mixed_children_survive(parts in prop::collection::vec(opaque_part(), 1..5)) {
        let inliner = Inliner::new(&Config::new()).unwrap();
        let mut children = parts.clone();
        children.insert(0, TextPart::html("<p>x</p>").into());

        let mut msg = message(Part::Mixed(children));
        inliner.handle_message(&mut msg).unwrap();

        let after = msg.body().unwrap().children();
        prop_assert_eq!(after.len(), parts.len() + 1);
        prop_assert_eq!(&after[1..], parts.as_slice());
    }
}
