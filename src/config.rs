//! Reader configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Names and markers used when rendering, bookmarking and saving.
///
/// Every field has a default, so a JSON config only needs the keys it
/// changes:
///
/// ```
/// use fb2mark::ReaderConfig;
///
/// let config = ReaderConfig::from_json_str(r#"{ "output_file_name": "book.fb2" }"#).unwrap();
/// assert_eq!(config.output_file_name, "book.fb2");
/// assert_eq!(config.bookmark_prefix, "bookmark-");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// File name offered for the saved document.
    pub output_file_name: String,
    /// MIME type of the saved document.
    pub output_media_type: String,
    /// Prefix of generated bookmark ids.
    pub bookmark_prefix: String,
    /// Attribute carrying the bookmark id on `<p>` elements, in both the
    /// document and the display tree.
    pub bookmark_attribute: String,
    /// Class given to the bookmarked display paragraph.
    pub bookmark_class: String,
    /// Class given to section containers.
    pub section_class: String,
    /// Heading level titles are rendered at.
    pub heading_level: u8,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            output_file_name: "modified.fb2".to_string(),
            output_media_type: "application/xml".to_string(),
            bookmark_prefix: "bookmark-".to_string(),
            bookmark_attribute: "data-bookmark-id".to_string(),
            bookmark_class: "bookmark".to_string(),
            section_class: "section".to_string(),
            heading_level: 2,
        }
    }
}

impl ReaderConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
