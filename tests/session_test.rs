//! End-to-end reading sessions: load, bookmark, resume and save.

use fb2mark::{
    BookmarkOutcome, DisplayKind, DisplayTree, Error, Fb2Document, JumpOutcome, ReaderConfig, RowLayout,
    ScrollPosition, Selection, Session, TouchPoint, render,
};

const BOOK: &[u8] = b"<FictionBook><body><section><title>Ch1</title><p>Hello</p><p>World</p></section></body></FictionBook>";

fn session_at(millis: u64) -> Session {
    Session::with_clock(ReaderConfig::default(), Box::new(move || millis))
}

fn paragraph_texts(display: &DisplayTree) -> Vec<String> {
    display
        .paragraphs()
        .into_iter()
        .map(|p| display.text_content(p))
        .collect()
}

fn select_paragraph(session: &mut Session, index: usize) -> BookmarkOutcome {
    let display = session.display().unwrap();
    let target = display.nth_paragraph(index).unwrap();
    let selection = Selection::in_paragraph(display, target);
    session.on_set_bookmark(&selection).unwrap()
}

// ============================================================================
// Load
// ============================================================================

#[test]
fn test_load_renders_section_heading_and_paragraphs() {
    let mut session = session_at(1);
    let display = session.on_file_loaded(BOOK).unwrap();

    let root = display.children(display.root());
    assert_eq!(root.len(), 1);
    assert_eq!(display.kind(root[0]), Some(&DisplayKind::Section));

    let parts = display.children(root[0]);
    assert_eq!(parts.len(), 3);
    assert_eq!(display.kind(parts[0]), Some(&DisplayKind::Heading(2)));
    assert_eq!(display.text_content(parts[0]), "Ch1");
    assert_eq!(paragraph_texts(display), vec!["Hello", "World"]);
    assert!(display.bookmarked().is_empty());
}

#[test]
fn test_load_failure_reports_parse_failure() {
    let mut session = session_at(1);
    let err = session.on_file_loaded(b"<FictionBook><body><p>open").unwrap_err();
    assert!(matches!(err, Error::ParseFailure(_)));
    assert!(session.html().is_none());
}

// ============================================================================
// Set bookmark
// ============================================================================

#[test]
fn test_set_bookmark_on_selected_paragraph() {
    let mut session = session_at(1_700_000_000_123);
    session.on_file_loaded(BOOK).unwrap();

    let outcome = select_paragraph(&mut session, 1);
    let BookmarkOutcome::Set(id) = outcome else {
        panic!("expected bookmark to be set, got {outcome:?}");
    };
    assert_eq!(id.as_str(), "bookmark-1700000000123");
    assert_eq!(session.last_bookmark(), Some(&id));

    let display = session.display().unwrap();
    let hello = display.nth_paragraph(0).unwrap();
    let world = display.nth_paragraph(1).unwrap();
    assert_eq!(display.bookmarked(), vec![world]);
    assert!(display.paragraph(world).unwrap().bookmarked);
    assert!(!display.paragraph(hello).unwrap().is_marked());

    let doc = session.document().unwrap();
    assert_eq!(doc.bookmark_records(), vec![id]);
}

#[test]
fn test_second_bookmark_replaces_first() {
    let mut session = session_at(5);
    session.on_file_loaded(BOOK).unwrap();

    select_paragraph(&mut session, 0);
    let BookmarkOutcome::Set(second) = select_paragraph(&mut session, 1) else {
        panic!("expected bookmark to be set");
    };
    // Same clock reading: the id still moves forward.
    assert_eq!(second.as_str(), "bookmark-6");

    let display = session.display().unwrap();
    assert_eq!(display.bookmarked(), vec![display.nth_paragraph(1).unwrap()]);
    assert_eq!(session.document().unwrap().bookmark_records(), vec![second]);
}

#[test]
fn test_selection_outside_paragraph_waits_for_tap() {
    let mut session = session_at(9);
    session.on_file_loaded(BOOK).unwrap();

    let display = session.display().unwrap();
    let section = display.children(display.root())[0];
    let heading = display.children(section)[0];
    let selection = Selection::in_paragraph(display, heading);
    assert_eq!(session.on_set_bookmark(&selection).unwrap(), BookmarkOutcome::Pending);
    assert!(session.last_bookmark().is_none());

    // Rows: heading, Hello, World.
    let layout = RowLayout { row_height: 24.0 };
    let id = session.on_touch_end(TouchPoint::new(10.0, 50.0), &layout).unwrap();
    assert_eq!(id.as_ref().map(|b| b.as_str()), Some("bookmark-9"));

    let display = session.display().unwrap();
    assert_eq!(display.bookmarked(), vec![display.nth_paragraph(1).unwrap()]);
}

#[test]
fn test_touch_without_pending_tap_is_ignored() {
    let mut session = session_at(9);
    session.on_file_loaded(BOOK).unwrap();

    let layout = RowLayout { row_height: 24.0 };
    assert_eq!(session.on_touch_end(TouchPoint::new(0.0, 30.0), &layout).unwrap(), None);
    assert!(session.display().unwrap().bookmarked().is_empty());
}

#[test]
fn test_new_load_drops_pending_tap() {
    let mut session = session_at(9);
    session.on_file_loaded(BOOK).unwrap();
    session.on_set_bookmark(&Selection::none()).unwrap();
    assert!(session.has_pending_tap());

    session.on_file_loaded(BOOK).unwrap();
    assert!(!session.has_pending_tap());
}

// ============================================================================
// Load from bookmark
// ============================================================================

#[test]
fn test_load_from_bookmark_clears_preceding_paragraphs() {
    let mut session = session_at(2);
    session.on_file_loaded(BOOK).unwrap();
    select_paragraph(&mut session, 1);

    let mut viewport = ScrollPosition::default();
    let outcome = session.on_load_from_bookmark(&mut viewport).unwrap();

    let display = session.display().unwrap();
    let world = display.nth_paragraph(1).unwrap();
    assert_eq!(outcome, JumpOutcome::Found { target: world, cleared: 1 });
    assert_eq!(viewport.target, Some(world));
    assert_eq!(paragraph_texts(display), vec!["", "World"]);
}

#[test]
fn test_load_all_restores_cleared_text() {
    let mut session = session_at(2);
    session.on_file_loaded(BOOK).unwrap();
    select_paragraph(&mut session, 1);
    session
        .on_load_from_bookmark(&mut ScrollPosition::default())
        .unwrap();

    let display = session.on_load_all().unwrap();
    assert_eq!(paragraph_texts(display), vec!["Hello", "World"]);
}

#[test]
fn test_load_from_bookmark_after_load_all_clears_everything() {
    let mut session = session_at(2);
    session.on_file_loaded(BOOK).unwrap();
    select_paragraph(&mut session, 1);
    session.on_load_all().unwrap();

    let mut viewport = ScrollPosition::default();
    let outcome = session.on_load_from_bookmark(&mut viewport).unwrap();
    assert_eq!(outcome, JumpOutcome::NotFound { cleared: 2 });
    assert_eq!(viewport.target, None);
    assert_eq!(paragraph_texts(session.display().unwrap()), vec!["", ""]);
}

// ============================================================================
// Save
// ============================================================================

#[test]
fn test_save_writes_bookmark_onto_matching_paragraph() {
    let mut session = session_at(77);
    session.on_file_loaded(BOOK).unwrap();
    let BookmarkOutcome::Set(id) = select_paragraph(&mut session, 1) else {
        panic!("expected bookmark to be set");
    };

    let saved = session.on_save().unwrap();
    assert_eq!(saved.file_name, "modified.fb2");
    assert_eq!(saved.media_type, "application/xml");

    let text = String::from_utf8(saved.bytes).unwrap();
    assert!(text.contains(&format!("<p data-bookmark-id=\"{id}\">World</p>")));
    assert!(text.contains("<p>Hello</p>"));
    assert_eq!(text.matches("data-bookmark-id").count(), 1);
    assert!(text.contains(&format!("<bookmarks><bookmark id=\"{id}\"/></bookmarks>")));
}

#[test]
fn test_save_after_jump_keeps_document_text() {
    let mut session = session_at(77);
    session.on_file_loaded(BOOK).unwrap();
    select_paragraph(&mut session, 1);
    session
        .on_load_from_bookmark(&mut ScrollPosition::default())
        .unwrap();

    let saved = session.on_save().unwrap();
    let text = String::from_utf8(saved.bytes).unwrap();
    assert!(text.contains("<p>Hello</p>"));
}

#[test]
fn test_saved_file_reloads_with_bookmark() {
    let mut session = session_at(300);
    session.on_file_loaded(BOOK).unwrap();
    let BookmarkOutcome::Set(id) = select_paragraph(&mut session, 1) else {
        panic!("expected bookmark to be set");
    };
    let saved = session.on_save().unwrap();

    let doc = Fb2Document::from_bytes(&saved.bytes).unwrap();
    assert_eq!(doc.bookmarked_paragraph().map(|p| p.text.as_str()), Some("World"));
    let display = render(doc.body());
    assert_eq!(display.find_bookmark(&id), display.nth_paragraph(1));

    let mut reopened = session_at(301);
    reopened.on_file_loaded(&saved.bytes).unwrap();
    assert_eq!(reopened.last_bookmark(), Some(&id));
    let outcome = reopened
        .on_load_from_bookmark(&mut ScrollPosition::default())
        .unwrap();
    assert_eq!(outcome.cleared(), 1);
}

#[test]
fn test_save_with_duplicate_text_marks_every_copy() {
    let mut session = session_at(4);
    session
        .on_file_loaded(b"<FictionBook><body><p>Again</p><p>Other</p><p>Again</p></body></FictionBook>")
        .unwrap();
    select_paragraph(&mut session, 2);

    let saved = session.on_save().unwrap();
    let doc = Fb2Document::from_bytes(&saved.bytes).unwrap();
    let marked: Vec<usize> = doc
        .body()
        .paragraphs()
        .into_iter()
        .filter(|p| p.bookmark_id.is_some())
        .map(|p| p.index)
        .collect();
    assert_eq!(marked, vec![0, 2]);
}

#[test]
fn test_save_strips_bookmark_from_epigraph() {
    let mut session = session_at(5);
    session
        .on_file_loaded(
            b"<FictionBook><body><section><epigraph><p data-bookmark-id=\"bookmark-1\">Motto</p></epigraph><p>A</p><p>B</p></section></body></FictionBook>",
        )
        .unwrap();
    assert_eq!(session.last_bookmark().map(|b| b.as_str()), Some("bookmark-1"));

    let BookmarkOutcome::Set(id) = select_paragraph(&mut session, 1) else {
        panic!("expected bookmark to be set");
    };
    let text = String::from_utf8(session.on_save().unwrap().bytes).unwrap();

    assert_eq!(text.matches("data-bookmark-id").count(), 1);
    assert!(text.contains("<epigraph><p>Motto</p></epigraph>"));
    assert!(text.contains(&format!("<p data-bookmark-id=\"{id}\">B</p>")));
}

#[test]
fn test_save_marks_title_paragraph_with_same_text() {
    let mut session = session_at(6);
    session
        .on_file_loaded(b"<FictionBook><body><section><title><p>Prologue</p></title><p>Prologue</p><p>Text</p></section></body></FictionBook>")
        .unwrap();
    let BookmarkOutcome::Set(id) = select_paragraph(&mut session, 0) else {
        panic!("expected bookmark to be set");
    };

    let text = String::from_utf8(session.on_save().unwrap().bytes).unwrap();
    assert_eq!(text.matches(&format!("data-bookmark-id=\"{id}\"")).count(), 2);

    // The reloaded display still finds the bookmark on the rendered paragraph.
    let mut reopened = session_at(7);
    reopened.on_file_loaded(text.as_bytes()).unwrap();
    let outcome = reopened
        .on_load_from_bookmark(&mut ScrollPosition::default())
        .unwrap();
    assert_eq!(outcome.cleared(), 0);
}

#[test]
fn test_undefined_entity_is_parse_failure() {
    let mut session = session_at(1);
    let err = session
        .on_file_loaded(b"<FictionBook><body><p>a &foo; b</p></body></FictionBook>")
        .unwrap_err();
    assert!(matches!(err, Error::ParseFailure(_)));
    assert!(session.document().is_none());
}

#[test]
fn test_html_reflects_bookmark() {
    let mut session = session_at(8);
    session.on_file_loaded(BOOK).unwrap();
    select_paragraph(&mut session, 0);

    let html = session.html().unwrap();
    assert!(html.contains("<p data-bookmark-id=\"bookmark-8\" class=\"bookmark\">Hello</p>"));
    assert!(html.contains("<p>World</p>"));
}
