//! FictionBook document model.
//!
//! [`Fb2Document`] owns the parsed XML tree of an FB2 file and exposes the
//! two parts of it this crate cares about: the first `<body>` element, as a
//! classified [`Body`], and the `<bookmarks>` side-channel container.
//!
//! The XML tree is authoritative. Every bookmark mutation made through this
//! type is written to the paragraph element and to the classified tree in the
//! same call, so the two never disagree.

mod content;

pub use content::{Body, ContentNode, Paragraph, Section, Title};

use encoding_rs::Encoding;

use crate::bookmark::BookmarkId;
use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use crate::util::{decode_text, encode_text};
use crate::xml::{XmlDocument, XmlNodeId, parse_xml, write_xml};

const BOOKMARKS_ELEMENT: &str = "bookmarks";
const BOOKMARK_ELEMENT: &str = "bookmark";
const PARAGRAPH_ELEMENT: &str = "p";

/// A loaded FB2 file.
#[derive(Debug, Clone)]
pub struct Fb2Document {
    xml: XmlDocument,
    body_element: XmlNodeId,
    body: Body,
    encoding: &'static Encoding,
    bom: bool,
    bookmark_attribute: String,
}

impl Fb2Document {
    /// Decode and parse raw file bytes with the default configuration.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes_with(bytes, &ReaderConfig::default())
    }

    /// Decode and parse raw file bytes.
    ///
    /// The text encoding is taken from the byte order mark or the XML
    /// declaration, falling back to UTF-8 and then windows-1251.
    pub fn from_bytes_with(bytes: &[u8], config: &ReaderConfig) -> Result<Self> {
        let decoded = decode_text(bytes);
        let xml = parse_xml(&decoded.text)?;
        Self::from_xml(xml, decoded.encoding, decoded.bom, config)
    }

    /// Parse an already-decoded document with the default configuration.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with(text, &ReaderConfig::default())
    }

    /// Parse an already-decoded document. It is written back as UTF-8.
    pub fn parse_with(text: &str, config: &ReaderConfig) -> Result<Self> {
        let xml = parse_xml(text)?;
        Self::from_xml(xml, encoding_rs::UTF_8, false, config)
    }

    fn from_xml(xml: XmlDocument, encoding: &'static Encoding, bom: bool, config: &ReaderConfig) -> Result<Self> {
        let body_element = xml
            .first_element_by_name(XmlNodeId::DOCUMENT, "body")
            .ok_or_else(|| Error::ParseFailure("no <body> element".to_string()))?;
        let body = Body::classify(&xml, body_element, &config.bookmark_attribute);

        Ok(Self {
            xml,
            body_element,
            body,
            encoding,
            bom,
            bookmark_attribute: config.bookmark_attribute.clone(),
        })
    }

    /// The classified content of the first `<body>` element.
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// The underlying XML tree.
    pub fn xml(&self) -> &XmlDocument {
        &self.xml
    }

    /// Encoding the file was decoded from, and will be written back in.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// `description/title-info/book-title`, if present.
    pub fn title(&self) -> Option<String> {
        let info = self
            .xml
            .first_element_by_name(XmlNodeId::DOCUMENT, "title-info")?;
        let title = self.xml.first_element_by_name(info, "book-title")?;
        let text = self.xml.text_content(title);
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// The first paragraph in document order that carries a bookmark id.
    pub fn bookmarked_paragraph(&self) -> Option<&Paragraph> {
        self.body
            .paragraphs()
            .into_iter()
            .find(|p| p.bookmark_id.is_some())
    }

    /// The first bookmark id carried by any element of the body, in
    /// document order.
    ///
    /// Unlike [`Fb2Document::bookmarked_paragraph`] this also sees elements
    /// that are not rendered, such as a `<p>` inside an `<epigraph>`.
    pub fn existing_bookmark(&self) -> Option<BookmarkId> {
        self.xml
            .descendants(self.body_element)
            .find_map(|id| self.xml.attr(id, &self.bookmark_attribute).filter(|v| !v.is_empty()))
            .map(BookmarkId::new)
    }

    /// Recompute the bookmark of every `<p>` element of the body.
    ///
    /// This covers all of them, including paragraphs inside titles,
    /// epigraphs, poems and citations that have no content node. `decide`
    /// sees the text of each one in document order; `Some` sets that
    /// bookmark id on the element, `None` strips any it has. Returns how
    /// many elements ended up bookmarked.
    pub fn update_paragraph_bookmarks<F>(&mut self, mut decide: F) -> usize
    where
        F: FnMut(&str) -> Option<BookmarkId>,
    {
        let Self {
            xml,
            body_element,
            body,
            bookmark_attribute,
            ..
        } = self;
        let attribute = bookmark_attribute.as_str();

        let elements: Vec<XmlNodeId> = xml.elements_by_name(*body_element, PARAGRAPH_ELEMENT).collect();
        let mut marked = 0;
        for element in elements {
            match decide(&xml.text_content(element)) {
                Some(id) => {
                    xml.set_attr(element, attribute, id.as_str());
                    marked += 1;
                }
                None => {
                    xml.remove_attr(element, attribute);
                }
            }
        }

        for paragraph in body.paragraphs_mut() {
            paragraph.bookmark_id = xml
                .attr(paragraph.source, attribute)
                .filter(|v| !v.is_empty())
                .map(BookmarkId::new);
        }
        marked
    }

    /// Ids recorded in the `<bookmarks>` container.
    pub fn bookmark_records(&self) -> Vec<BookmarkId> {
        let Some(container) = self
            .xml
            .first_element_by_name(XmlNodeId::DOCUMENT, BOOKMARKS_ELEMENT)
        else {
            return Vec::new();
        };

        self.xml
            .children(container)
            .iter()
            .filter(|&&id| self.xml.local_name(id) == Some(BOOKMARK_ELEMENT))
            .filter_map(|&id| self.xml.attr(id, "id"))
            .map(BookmarkId::new)
            .collect()
    }

    /// Replace the contents of the `<bookmarks>` container with a single
    /// record for `id`, creating the container under the root element if the
    /// document has none.
    pub fn replace_bookmark_record(&mut self, id: &BookmarkId) {
        let container = match self
            .xml
            .first_element_by_name(XmlNodeId::DOCUMENT, BOOKMARKS_ELEMENT)
        {
            Some(container) => container,
            None => {
                let root = self.xml.root_element().unwrap_or(XmlNodeId::DOCUMENT);
                let container = self.xml.create_element(BOOKMARKS_ELEMENT);
                self.xml.append(root, container);
                container
            }
        };

        self.xml.remove_children(container);
        let record = self.xml.create_element(BOOKMARK_ELEMENT);
        self.xml.set_attr(record, "id", id.as_str());
        self.xml.append(container, record);
    }

    /// Serialize the document as XML text.
    pub fn to_xml_string(&self) -> String {
        write_xml(&self.xml)
    }

    /// Serialize the document and encode it in its source encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let text = self.to_xml_string();
        encode_text(&text, self.encoding, self.bom).into_owned()
    }
}
