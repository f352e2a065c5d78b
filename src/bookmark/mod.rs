//! Single-bookmark management.
//!
//! At most one paragraph carries a bookmark id at any time. Setting a
//! bookmark first strips every existing one from the display tree, then
//! marks the target and rewrites the document's `<bookmarks>` container with
//! exactly one record. The document's own paragraphs are reconciled later,
//! on save, by [`commit_to_document`].

mod id;

pub use id::{BookmarkId, BookmarkIds, Clock, SystemClock};

use crate::error::{Error, Result};
use crate::fb2::Fb2Document;
use crate::render::{DisplayNodeId, DisplayTree, Viewport};

/// Result of [`BookmarkManager::jump_to_bookmark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpOutcome {
    /// The bookmarked paragraph was found and scrolled to. `cleared`
    /// paragraphs before it had their text removed.
    Found { target: DisplayNodeId, cleared: usize },
    /// No paragraph carries the bookmark. Every paragraph was cleared and no
    /// scroll happened.
    NotFound { cleared: usize },
}

impl JumpOutcome {
    pub fn cleared(&self) -> usize {
        match *self {
            JumpOutcome::Found { cleared, .. } | JumpOutcome::NotFound { cleared } => cleared,
        }
    }
}

/// Result of [`commit_to_document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit {
    /// The display tree has no bookmarked paragraph; the document was left
    /// as it was.
    Unchanged,
    /// `matched` document paragraphs had the same text as the bookmarked
    /// display paragraph and now carry `id`.
    Committed { id: BookmarkId, matched: usize },
}

/// Issues bookmark ids and remembers the last one set.
pub struct BookmarkManager {
    ids: BookmarkIds,
    last: Option<BookmarkId>,
}

impl BookmarkManager {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_clock(prefix, Box::new(SystemClock))
    }

    pub fn with_clock(prefix: impl Into<String>, clock: Box<dyn Clock>) -> Self {
        Self {
            ids: BookmarkIds::new(prefix, clock),
            last: None,
        }
    }

    /// The most recently set (or adopted) bookmark.
    pub fn last(&self) -> Option<&BookmarkId> {
        self.last.as_ref()
    }

    /// Replace the last-bookmark pointer, e.g. with one found in a freshly
    /// loaded file.
    pub fn adopt(&mut self, bookmark: Option<BookmarkId>) {
        self.last = bookmark;
    }

    /// Set the bookmark on `target`.
    ///
    /// Fails with [`Error::NoSelectionTarget`] and changes nothing if
    /// `target` is not a paragraph of `display`.
    pub fn set_bookmark(
        &mut self,
        display: &mut DisplayTree,
        doc: &mut Fb2Document,
        target: DisplayNodeId,
    ) -> Result<BookmarkId> {
        if !display.is_paragraph(target) {
            return Err(Error::NoSelectionTarget);
        }

        for paragraph in display.paragraphs() {
            if let Some(mark) = display.paragraph_mut(paragraph)
                && mark.is_marked()
            {
                mark.bookmark_id = None;
                mark.bookmarked = false;
            }
        }

        let id = self.ids.next_id();
        if let Some(mark) = display.paragraph_mut(target) {
            mark.bookmark_id = Some(id.clone());
            mark.bookmarked = true;
        }

        doc.replace_bookmark_record(&id);
        self.last = Some(id.clone());

        log::info!("Bookmark added with ID: {id}");
        Ok(id)
    }

    /// Show the display tree from the last bookmark onwards.
    ///
    /// Every paragraph strictly before the bookmarked one has its text
    /// cleared (a view-only edit), then the bookmarked paragraph is scrolled
    /// into view. If no paragraph carries the bookmark, all of them end up
    /// cleared: see [`JumpOutcome::NotFound`].
    pub fn jump_to_bookmark(
        &self,
        display: &mut DisplayTree,
        viewport: &mut dyn Viewport,
    ) -> Result<JumpOutcome> {
        let bookmark = self.last.as_ref().ok_or(Error::NoBookmarkSet)?;

        let mut cleared = 0;
        let mut target = None;
        for paragraph in display.paragraphs() {
            let carries = display
                .paragraph(paragraph)
                .and_then(|m| m.bookmark_id.as_ref())
                == Some(bookmark);
            if carries {
                log::info!("Found bookmark with ID: {bookmark}");
                target = Some(paragraph);
                break;
            }

            log::debug!("Clearing content of <p>: {}", display.text_content(paragraph));
            display.clear_text(paragraph);
            cleared += 1;
        }

        match target {
            Some(target) => {
                viewport.scroll_into_view(display, target);
                Ok(JumpOutcome::Found { target, cleared })
            }
            None => {
                log::warn!("No paragraph carries bookmark {bookmark}; every paragraph was cleared");
                Ok(JumpOutcome::NotFound { cleared })
            }
        }
    }
}

/// Reconcile the display tree's bookmark into the document.
///
/// The first bookmarked display paragraph is matched against every `<p>` of
/// the document body by text equality, rendered or not: every one with the
/// same text receives its id, every other one loses any id it had. When nothing
/// matches, the document is left without a bookmarked paragraph and
/// [`Error::NoMatchingParagraph`] is returned.
pub fn commit_to_document(doc: &mut Fb2Document, display: &DisplayTree) -> Result<Commit> {
    let Some((node, id)) = display.bookmarked().into_iter().find_map(|node| {
        display
            .paragraph(node)
            .and_then(|m| m.bookmark_id.clone())
            .map(|id| (node, id))
    }) else {
        return Ok(Commit::Unchanged);
    };

    let text = display.text_content(node);
    let matched = doc.update_paragraph_bookmarks(|candidate| (candidate == text).then(|| id.clone()));

    if matched == 0 {
        return Err(Error::NoMatchingParagraph(id));
    }
    Ok(Commit::Committed { id, matched })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{ScrollPosition, render};

    const BOOK: &str = "<FictionBook><body><section><title>Ch1</title><p>Hello</p><p>World</p></section></body></FictionBook>";

    fn manager(start: u64) -> BookmarkManager {
        BookmarkManager::with_clock("bookmark-", Box::new(move || start))
    }

    fn loaded() -> (Fb2Document, DisplayTree) {
        let doc = Fb2Document::parse(BOOK).unwrap();
        let display = render(doc.body());
        (doc, display)
    }

    #[test]
    fn test_set_bookmark_marks_target_only() {
        let (mut doc, mut display) = loaded();
        let mut bookmarks = manager(1000);
        let world = display.nth_paragraph(1).unwrap();

        let id = bookmarks.set_bookmark(&mut display, &mut doc, world).unwrap();

        assert_eq!(id.as_str(), "bookmark-1000");
        assert_eq!(display.bookmarked(), vec![world]);
        assert!(display.paragraph(world).unwrap().bookmarked);
        assert_eq!(doc.bookmark_records(), vec![id.clone()]);
        assert_eq!(bookmarks.last(), Some(&id));
    }

    #[test]
    fn test_set_bookmark_replaces_previous() {
        let (mut doc, mut display) = loaded();
        let mut bookmarks = manager(1000);
        let hello = display.nth_paragraph(0).unwrap();
        let world = display.nth_paragraph(1).unwrap();

        let first = bookmarks.set_bookmark(&mut display, &mut doc, hello).unwrap();
        let second = bookmarks.set_bookmark(&mut display, &mut doc, world).unwrap();

        assert_ne!(first, second);
        assert_eq!(display.bookmarked(), vec![world]);
        assert!(!display.paragraph(hello).unwrap().bookmarked);
        assert_eq!(doc.bookmark_records(), vec![second]);
    }

    #[test]
    fn test_set_bookmark_rejects_non_paragraph() {
        let (mut doc, mut display) = loaded();
        let mut bookmarks = manager(1000);
        let section = display.children(display.root())[0];

        let err = bookmarks.set_bookmark(&mut display, &mut doc, section).unwrap_err();

        assert!(matches!(err, Error::NoSelectionTarget));
        assert!(doc.bookmark_records().is_empty());
        assert!(bookmarks.last().is_none());
    }

    #[test]
    fn test_jump_clears_paragraphs_before_bookmark() {
        let (mut doc, mut display) = loaded();
        let mut bookmarks = manager(1000);
        let hello = display.nth_paragraph(0).unwrap();
        let world = display.nth_paragraph(1).unwrap();
        bookmarks.set_bookmark(&mut display, &mut doc, world).unwrap();

        let mut viewport = ScrollPosition::default();
        let outcome = bookmarks.jump_to_bookmark(&mut display, &mut viewport).unwrap();

        assert_eq!(outcome, JumpOutcome::Found { target: world, cleared: 1 });
        assert_eq!(display.text_content(hello), "");
        assert_eq!(display.text_content(world), "World");
        assert_eq!(viewport.target, Some(world));
    }

    #[test]
    fn test_jump_to_first_paragraph_clears_nothing() {
        let (mut doc, mut display) = loaded();
        let mut bookmarks = manager(1000);
        let hello = display.nth_paragraph(0).unwrap();
        bookmarks.set_bookmark(&mut display, &mut doc, hello).unwrap();

        let mut viewport = ScrollPosition::default();
        let outcome = bookmarks.jump_to_bookmark(&mut display, &mut viewport).unwrap();

        assert_eq!(outcome.cleared(), 0);
        assert_eq!(viewport.target, Some(hello));
    }

    #[test]
    fn test_jump_without_match_clears_everything() {
        let (_doc, mut display) = loaded();
        let mut bookmarks = manager(1000);
        bookmarks.adopt(Some(BookmarkId::new("bookmark-missing")));

        let mut viewport = ScrollPosition::default();
        let outcome = bookmarks.jump_to_bookmark(&mut display, &mut viewport).unwrap();

        assert_eq!(outcome, JumpOutcome::NotFound { cleared: 2 });
        assert!(display.paragraphs().iter().all(|&p| display.text_content(p).is_empty()));
        assert_eq!(viewport.target, None);
    }

    #[test]
    fn test_jump_without_bookmark_fails() {
        let (_doc, mut display) = loaded();
        let bookmarks = manager(1000);
        let mut viewport = ScrollPosition::default();

        let err = bookmarks.jump_to_bookmark(&mut display, &mut viewport).unwrap_err();
        assert!(matches!(err, Error::NoBookmarkSet));
    }

    #[test]
    fn test_commit_matches_by_text() {
        let src = "<FictionBook><body><p data-bookmark-id=\"old\">Hello</p><p>World</p></body></FictionBook>";
        let mut doc = Fb2Document::parse(src).unwrap();
        let mut display = render(doc.body());
        let mut bookmarks = manager(1000);
        let world = display.nth_paragraph(1).unwrap();
        let id = bookmarks.set_bookmark(&mut display, &mut doc, world).unwrap();

        let commit = commit_to_document(&mut doc, &display).unwrap();

        assert_eq!(commit, Commit::Committed { id: id.clone(), matched: 1 });
        let xml = doc.to_xml_string();
        assert!(xml.contains("<p>Hello</p>"));
        assert!(xml.contains(&format!("<p data-bookmark-id=\"{id}\">World</p>")));
    }

    #[test]
    fn test_commit_marks_every_duplicate_text() {
        let src = "<FictionBook><body><p>Same</p><p>Other</p><p>Same</p></body></FictionBook>";
        let mut doc = Fb2Document::parse(src).unwrap();
        let mut display = render(doc.body());
        let mut bookmarks = manager(1000);
        let last = display.nth_paragraph(2).unwrap();
        bookmarks.set_bookmark(&mut display, &mut doc, last).unwrap();

        let commit = commit_to_document(&mut doc, &display).unwrap();
        assert!(matches!(commit, Commit::Committed { matched: 2, .. }));
    }

    #[test]
    fn test_commit_without_match_strips_document() {
        let src = "<FictionBook><body><p data-bookmark-id=\"old\">Hello</p><p>World</p></body></FictionBook>";
        let mut doc = Fb2Document::parse(src).unwrap();
        let mut display = render(doc.body());
        let hello = display.nth_paragraph(0).unwrap();
        // A display paragraph whose text no longer matches the document.
        display.clear_text(hello);

        let err = commit_to_document(&mut doc, &display).unwrap_err();

        assert!(matches!(err, Error::NoMatchingParagraph(ref id) if id.as_str() == "old"));
        assert!(doc.bookmarked_paragraph().is_none());
    }

    #[test]
    fn test_commit_without_display_bookmark_is_unchanged() {
        let (mut doc, display) = loaded();
        assert_eq!(commit_to_document(&mut doc, &display).unwrap(), Commit::Unchanged);
    }

    #[test]
    fn test_commit_strips_unrendered_paragraphs() {
        let src = "<FictionBook><body><section><epigraph><p data-bookmark-id=\"bookmark-1\">Motto</p></epigraph><p>A</p><p>B</p></section></body></FictionBook>";
        let mut doc = Fb2Document::parse(src).unwrap();
        let mut display = render(doc.body());
        let mut bookmarks = manager(5);
        let b = display.nth_paragraph(1).unwrap();
        let id = bookmarks.set_bookmark(&mut display, &mut doc, b).unwrap();

        commit_to_document(&mut doc, &display).unwrap();

        let xml = doc.to_xml_string();
        assert_eq!(xml.matches("data-bookmark-id").count(), 1);
        assert!(xml.contains("<epigraph><p>Motto</p></epigraph>"));
        assert!(xml.contains(&format!("<p data-bookmark-id=\"{id}\">B</p>")));
    }

    #[test]
    fn test_commit_marks_title_paragraph_with_same_text() {
        let src = "<FictionBook><body><section><title><p>Same</p></title><p>Same</p></section></body></FictionBook>";
        let mut doc = Fb2Document::parse(src).unwrap();
        let mut display = render(doc.body());
        let mut bookmarks = manager(5);
        let paragraph = display.nth_paragraph(0).unwrap();
        let id = bookmarks.set_bookmark(&mut display, &mut doc, paragraph).unwrap();

        let commit = commit_to_document(&mut doc, &display).unwrap();

        assert_eq!(commit, Commit::Committed { id: id.clone(), matched: 2 });
        assert!(doc
            .to_xml_string()
            .contains(&format!("<title><p data-bookmark-id=\"{id}\">Same</p></title>")));
        assert_eq!(doc.existing_bookmark(), Some(id));
    }
}
