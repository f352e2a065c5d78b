//! # fb2mark
//!
//! Reader core for FictionBook (FB2) e-books with in-place bookmarking.
//!
//! ## Features
//!
//! - Load FB2 files in UTF-8 or their declared legacy encoding
//! - Render the `<body>` into a display tree (sections, headings, paragraphs)
//!   and synthesize HTML from it
//! - Keep exactly one bookmark per document, resolved from a text selection
//!   or, failing that, from the next touch tap
//! - Resume reading from the bookmark
//! - Save the document with the bookmark written back into it
//!
//! ## Quick Start
//!
//! ```no_run
//! use fb2mark::{BookmarkOutcome, Selection, Session};
//!
//! let bytes = std::fs::read("book.fb2").unwrap();
//! let mut session = Session::new();
//! let display = session.on_file_loaded(&bytes).unwrap();
//!
//! // Bookmark the tenth paragraph
//! let target = display.nth_paragraph(9).unwrap();
//! let selection = Selection::in_paragraph(display, target);
//! if let BookmarkOutcome::Set(id) = session.on_set_bookmark(&selection).unwrap() {
//!     println!("bookmarked as {id}");
//! }
//!
//! let saved = session.on_save().unwrap();
//! std::fs::write(&saved.file_name, &saved.bytes).unwrap();
//! ```
//!
//! ## Working with documents directly
//!
//! [`Session`] is a thin controller; the pieces it wires together are usable
//! on their own:
//!
//! ```
//! use fb2mark::{Fb2Document, render};
//!
//! let doc = Fb2Document::parse(
//!     "<FictionBook><body><section><title>Ch1</title><p>Hello</p></section></body></FictionBook>",
//! ).unwrap();
//! let display = render(doc.body());
//! assert_eq!(display.paragraphs().len(), 1);
//! ```

pub mod bookmark;
pub mod config;
pub mod error;
pub mod fb2;
pub mod render;
pub mod selection;
pub mod session;
pub(crate) mod util;
pub mod xml;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use bookmark::{BookmarkId, BookmarkManager, Clock, Commit, JumpOutcome, SystemClock, commit_to_document};
pub use config::ReaderConfig;
pub use error::{Error, Result};
pub use fb2::{Body, ContentNode, Fb2Document, Paragraph, Section, Title};
pub use render::{DisplayKind, DisplayNodeId, DisplayTree, ScrollPosition, Viewport, render, render_with};
pub use selection::{PendingTap, Resolution, RowLayout, Selection, Surface, TouchPoint, resolve, resolve_sync};
pub use session::{BookmarkOutcome, PARSE_FAILURE_MESSAGE, SavedFile, Session};
