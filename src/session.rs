//! Reading session: the controller behind a reader UI.
//!
//! A [`Session`] owns the loaded document, its current display tree, the
//! bookmark manager and the pending touch continuation. Each host event maps
//! to one method; every method runs to completion and leaves the session
//! usable whatever it returns.
//!
//! ```
//! use fb2mark::{BookmarkOutcome, ScrollPosition, Selection, Session};
//!
//! let mut session = Session::new();
//! session.on_file_loaded(b"<FictionBook><body><p>Hello</p><p>World</p></body></FictionBook>")?;
//!
//! let display = session.display().unwrap();
//! let world = display.nth_paragraph(1).unwrap();
//! let selection = Selection::in_paragraph(display, world);
//! let BookmarkOutcome::Set(id) = session.on_set_bookmark(&selection)? else { unreachable!() };
//!
//! let mut viewport = ScrollPosition::default();
//! session.on_load_from_bookmark(&mut viewport)?;
//! assert_eq!(viewport.target, Some(world));
//!
//! let saved = session.on_save()?;
//! assert_eq!(saved.file_name, "modified.fb2");
//! assert!(String::from_utf8(saved.bytes).unwrap().contains(&format!("data-bookmark-id=\"{id}\"")));
//! # Ok::<(), fb2mark::Error>(())
//! ```

use crate::bookmark::{BookmarkId, BookmarkManager, Clock, Commit, JumpOutcome, SystemClock, commit_to_document};
use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use crate::fb2::Fb2Document;
use crate::render::{DisplayTree, Viewport, render_with, synthesize_html};
use crate::selection::{PendingTap, Resolution, Selection, Surface, TouchPoint, resolve};

/// Placeholder shown in place of content when a file cannot be loaded.
pub const PARSE_FAILURE_MESSAGE: &str = "Could not parse FB2 content.";

/// Result of [`Session::on_set_bookmark`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkOutcome {
    /// The selection resolved and the bookmark was set.
    Set(BookmarkId),
    /// The selection did not resolve; the bookmark will be set by the next
    /// [`Session::on_touch_end`] if it lands on a paragraph.
    Pending,
}

/// A serialized document ready to be offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

struct Loaded {
    document: Fb2Document,
    display: DisplayTree,
}

pub struct Session {
    config: ReaderConfig,
    loaded: Option<Loaded>,
    bookmarks: BookmarkManager,
    pending: Option<PendingTap>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_config(ReaderConfig::default())
    }

    pub fn with_config(config: ReaderConfig) -> Self {
        Self::with_clock(config, Box::new(SystemClock))
    }

    /// A session whose bookmark ids are stamped by `clock`.
    pub fn with_clock(config: ReaderConfig, clock: Box<dyn Clock>) -> Self {
        let bookmarks = BookmarkManager::with_clock(config.bookmark_prefix.clone(), clock);
        Self {
            config,
            loaded: None,
            bookmarks,
            pending: None,
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn document(&self) -> Option<&Fb2Document> {
        self.loaded.as_ref().map(|l| &l.document)
    }

    pub fn display(&self) -> Option<&DisplayTree> {
        self.loaded.as_ref().map(|l| &l.display)
    }

    pub fn last_bookmark(&self) -> Option<&BookmarkId> {
        self.bookmarks.last()
    }

    /// Whether a touch continuation is waiting for [`Session::on_touch_end`].
    pub fn has_pending_tap(&self) -> bool {
        self.pending.is_some()
    }

    /// Markup of the current display tree.
    pub fn html(&self) -> Option<String> {
        self.display().map(|d| synthesize_html(d, &self.config))
    }

    /// Load a new file, replacing whatever was loaded before.
    ///
    /// The previous document, display tree, last bookmark and pending tap
    /// are discarded first, so a failed load leaves an empty session. A
    /// bookmark id already present on a paragraph of the new file becomes
    /// the last bookmark.
    pub fn on_file_loaded(&mut self, bytes: &[u8]) -> Result<&DisplayTree> {
        self.loaded = None;
        self.pending = None;
        self.bookmarks.adopt(None);

        let document = match Fb2Document::from_bytes_with(bytes, &self.config) {
            Ok(document) => document,
            Err(e) => {
                log::error!("{PARSE_FAILURE_MESSAGE} {e}");
                return Err(match e {
                    Error::ParseFailure(_) => e,
                    other => Error::ParseFailure(other.to_string()),
                });
            }
        };
        log::info!("FB2 content loaded successfully.");

        let existing = document.existing_bookmark();
        if let Some(id) = &existing {
            log::info!("Bookmark found with ID: {id}");
        }
        self.bookmarks.adopt(existing);

        let display = render_with(document.body(), &self.config);
        let loaded = self.loaded.insert(Loaded { document, display });
        Ok(&loaded.display)
    }

    /// Re-render the full content from the document.
    pub fn on_load_all(&mut self) -> Result<&DisplayTree> {
        let Some(loaded) = self.loaded.as_mut() else {
            log::error!("No XML document loaded.");
            return Err(Error::NoDocumentLoaded);
        };
        loaded.display = render_with(loaded.document.body(), &self.config);
        Ok(&loaded.display)
    }

    /// Bookmark the paragraph the selection points at.
    ///
    /// When the selection does not resolve, a touch continuation is
    /// registered (replacing any earlier one) and [`BookmarkOutcome::Pending`]
    /// is returned.
    pub fn on_set_bookmark(&mut self, selection: &Selection) -> Result<BookmarkOutcome> {
        let Some(loaded) = self.loaded.as_mut() else {
            log::error!("No XML document loaded.");
            return Err(Error::NoDocumentLoaded);
        };

        match resolve(&loaded.display, selection) {
            Resolution::Resolved(target) => {
                let id = self
                    .bookmarks
                    .set_bookmark(&mut loaded.display, &mut loaded.document, target)?;
                Ok(BookmarkOutcome::Set(id))
            }
            Resolution::Deferred(pending) => {
                log::info!("Selection is not within a paragraph; waiting for a tap.");
                self.pending = Some(pending);
                Ok(BookmarkOutcome::Pending)
            }
        }
    }

    /// Deliver a touch release.
    ///
    /// Fires the pending continuation, if there is one, and removes it.
    /// Returns `Ok(None)` when nothing was pending.
    pub fn on_touch_end(&mut self, point: TouchPoint, surface: &dyn Surface) -> Result<Option<BookmarkId>> {
        let Some(pending) = self.pending.take() else {
            return Ok(None);
        };
        let Some(loaded) = self.loaded.as_mut() else {
            return Ok(None);
        };

        match pending.fire(&loaded.display, surface, point) {
            Some(target) => {
                let id = self
                    .bookmarks
                    .set_bookmark(&mut loaded.display, &mut loaded.document, target)?;
                Ok(Some(id))
            }
            None => {
                log::error!("Selection is not within a paragraph.");
                Err(Error::NoSelectionTarget)
            }
        }
    }

    /// Hide everything before the last bookmark and scroll to it.
    pub fn on_load_from_bookmark(&mut self, viewport: &mut dyn Viewport) -> Result<JumpOutcome> {
        let Some(loaded) = self.loaded.as_mut() else {
            log::error!("No bookmark found or no content loaded.");
            return Err(Error::NoDocumentLoaded);
        };
        self.bookmarks
            .jump_to_bookmark(&mut loaded.display, viewport)
            .inspect_err(|_| log::error!("No bookmark found or no content loaded."))
    }

    /// Commit the display bookmark into the document and serialize it.
    ///
    /// A failed text match is logged and the document is saved without a
    /// bookmarked paragraph.
    pub fn on_save(&mut self) -> Result<SavedFile> {
        let Some(loaded) = self.loaded.as_mut() else {
            log::error!("No XML document loaded to save.");
            return Err(Error::NoDocumentLoaded);
        };

        match commit_to_document(&mut loaded.document, &loaded.display) {
            Ok(Commit::Committed { id, matched }) => {
                log::info!("File saved with updated bookmark {id} ({matched} paragraph(s)).");
            }
            Ok(Commit::Unchanged) => log::info!("File saved."),
            Err(e) => log::error!("{e}"),
        }

        Ok(SavedFile {
            file_name: self.config.output_file_name.clone(),
            media_type: self.config.output_media_type.clone(),
            bytes: loaded.document.to_bytes(),
        })
    }
}
