//! Error types for fb2mark operations.

use thiserror::Error;

use crate::bookmark::BookmarkId;

/// Errors that can occur while loading, bookmarking or saving a book.
///
/// None of these are fatal to a [`Session`](crate::Session): every variant
/// leaves the session usable, and hosts typically just log them.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Could not parse FB2 content: {0}")]
    ParseFailure(String),

    #[error("No FB2 document loaded")]
    NoDocumentLoaded,

    #[error("Selection is not within a paragraph")]
    NoSelectionTarget,

    #[error("Matching <p> element not found for bookmark {0}")]
    NoMatchingParagraph(BookmarkId),

    #[error("No bookmark set")]
    NoBookmarkSet,

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
