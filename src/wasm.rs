//! WASM bindings for a browser-based reader.
//!
//! This module exposes a [`Session`] to JavaScript via wasm-bindgen. The page
//! owns the DOM: it injects the returned markup into its content container
//! and reports selections and taps back as paragraph indices (the position
//! of a `<p>` among all rendered `<p>` elements).

use wasm_bindgen::prelude::*;

use crate::render::{DisplayNodeId, DisplayTree, ScrollPosition};
use crate::selection::{Selection, TouchPoint};
use crate::{BookmarkOutcome, ReaderConfig, Session};

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_js(e: crate::Error) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Reader session handle.
#[wasm_bindgen]
pub struct FbReader {
    session: Session,
    scroll: ScrollPosition,
}

#[wasm_bindgen]
impl FbReader {
    /// Create a reader, optionally from a JSON configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<FbReader, JsValue> {
        let config = match config_json {
            Some(json) => ReaderConfig::from_json_str(&json).map_err(to_js)?,
            None => ReaderConfig::default(),
        };
        Ok(FbReader {
            session: Session::with_config(config),
            scroll: ScrollPosition::default(),
        })
    }

    /// Load raw file bytes. Returns the content markup.
    pub fn load(&mut self, data: &[u8]) -> Result<String, JsValue> {
        self.scroll = ScrollPosition::default();
        self.session.on_file_loaded(data).map_err(to_js)?;
        Ok(self.html())
    }

    /// Re-render the full content. Returns the content markup.
    pub fn load_all(&mut self) -> Result<String, JsValue> {
        self.session.on_load_all().map_err(to_js)?;
        Ok(self.html())
    }

    /// Bookmark the paragraph holding the selection.
    ///
    /// Pass `undefined` when the page has no selection inside a paragraph;
    /// the bookmark is then set by the next [`FbReader::touch_end`] and an
    /// empty string is returned.
    pub fn set_bookmark(&mut self, paragraph_index: Option<usize>) -> Result<String, JsValue> {
        let selection = match (self.session.display(), paragraph_index) {
            (Some(display), Some(index)) => display
                .nth_paragraph(index)
                .map(|p| Selection::in_paragraph(display, p))
                .unwrap_or_default(),
            _ => Selection::none(),
        };

        match self.session.on_set_bookmark(&selection).map_err(to_js)? {
            BookmarkOutcome::Set(id) => Ok(id.to_string()),
            BookmarkOutcome::Pending => Ok(String::new()),
        }
    }

    /// Report a touch release on the paragraph at `paragraph_index`
    /// (`undefined` when the release hit no paragraph). Returns the new
    /// bookmark id, or an empty string when nothing was pending.
    pub fn touch_end(&mut self, paragraph_index: Option<usize>) -> Result<String, JsValue> {
        let surface = move |tree: &DisplayTree, _: TouchPoint| -> Option<DisplayNodeId> {
            paragraph_index.and_then(|i| tree.nth_paragraph(i))
        };
        let id = self
            .session
            .on_touch_end(TouchPoint::new(0.0, 0.0), &surface)
            .map_err(to_js)?;
        Ok(id.map(|id| id.to_string()).unwrap_or_default())
    }

    /// Hide everything before the bookmark. Returns the content markup; the
    /// page scrolls to `[data-bookmark-id='<bookmark_id()>']`.
    pub fn load_from_bookmark(&mut self) -> Result<String, JsValue> {
        self.session
            .on_load_from_bookmark(&mut self.scroll)
            .map_err(to_js)?;
        Ok(self.html())
    }

    /// Serialize the document with its bookmark. The page offers the bytes
    /// for download as [`FbReader::file_name`].
    pub fn save(&mut self) -> Result<Vec<u8>, JsValue> {
        let saved = self.session.on_save().map_err(to_js)?;
        Ok(saved.bytes)
    }

    pub fn file_name(&self) -> String {
        self.session.config().output_file_name.clone()
    }

    pub fn media_type(&self) -> String {
        self.session.config().output_media_type.clone()
    }

    /// The last bookmark id, or an empty string.
    pub fn bookmark_id(&self) -> String {
        self.session
            .last_bookmark()
            .map(|id| id.to_string())
            .unwrap_or_default()
    }

    /// Markup of the current display tree, or an empty string.
    pub fn html(&self) -> String {
        self.session.html().unwrap_or_default()
    }
}
