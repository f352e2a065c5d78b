//! Content model of an FB2 body.

use crate::bookmark::BookmarkId;
use crate::xml::{XmlDocument, XmlNodeId};

/// A node of the body tree.
///
/// Classified once when the document is loaded; elements other than
/// `section`, `title` and `p` have no variant and are left out of the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentNode {
    Section(Section),
    Title(Title),
    Paragraph(Paragraph),
}

/// A `<section>`: an ordered, recursively nestable group of content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    pub children: Vec<ContentNode>,
}

/// A `<title>`, flattened to its text.
#[derive(Debug, Clone, PartialEq)]
pub struct Title {
    pub text: String,
}

/// A `<p>`, flattened to its text.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub text: String,
    pub bookmark_id: Option<BookmarkId>,
    /// Position among all paragraphs of the body, in document order.
    pub index: usize,
    pub(crate) source: XmlNodeId,
}

/// The classified `<body>` element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    pub children: Vec<ContentNode>,
}

impl Body {
    /// Classify the children of `body` in `xml`.
    pub(crate) fn classify(xml: &XmlDocument, body: XmlNodeId, bookmark_attribute: &str) -> Self {
        let mut classifier = Classifier {
            xml,
            bookmark_attribute,
            next_index: 0,
        };
        Self {
            children: classifier.children_of(body),
        }
    }

    /// All paragraphs in document order, depth-first.
    pub fn paragraphs(&self) -> Vec<&Paragraph> {
        let mut out = Vec::new();
        collect_paragraphs(&self.children, &mut out);
        out
    }

    pub(crate) fn paragraphs_mut(&mut self) -> Vec<&mut Paragraph> {
        let mut out = Vec::new();
        collect_paragraphs_mut(&mut self.children, &mut out);
        out
    }

    /// Number of sections at any depth.
    pub fn section_count(&self) -> usize {
        fn count(nodes: &[ContentNode]) -> usize {
            nodes
                .iter()
                .map(|n| match n {
                    ContentNode::Section(s) => 1 + count(&s.children),
                    _ => 0,
                })
                .sum()
        }
        count(&self.children)
    }
}

struct Classifier<'a> {
    xml: &'a XmlDocument,
    bookmark_attribute: &'a str,
    next_index: usize,
}

impl Classifier<'_> {
    fn children_of(&mut self, parent: XmlNodeId) -> Vec<ContentNode> {
        let mut out = Vec::new();
        for &child in self.xml.children(parent) {
            if let Some(node) = self.classify(child) {
                out.push(node);
            }
        }
        out
    }

    fn classify(&mut self, id: XmlNodeId) -> Option<ContentNode> {
        match self.xml.local_name(id)? {
            "section" => Some(ContentNode::Section(Section {
                children: self.children_of(id),
            })),
            "title" => Some(ContentNode::Title(Title {
                text: self.xml.text_content(id),
            })),
            "p" => {
                let index = self.next_index;
                self.next_index += 1;
                let bookmark_id = self
                    .xml
                    .attr(id, self.bookmark_attribute)
                    .filter(|v| !v.is_empty())
                    .map(BookmarkId::new);
                Some(ContentNode::Paragraph(Paragraph {
                    text: self.xml.text_content(id),
                    bookmark_id,
                    index,
                    source: id,
                }))
            }
            _ => None,
        }
    }
}

fn collect_paragraphs<'a>(nodes: &'a [ContentNode], out: &mut Vec<&'a Paragraph>) {
    for node in nodes {
        match node {
            ContentNode::Section(section) => collect_paragraphs(&section.children, out),
            ContentNode::Paragraph(p) => out.push(p),
            ContentNode::Title(_) => {}
        }
    }
}

fn collect_paragraphs_mut<'a>(nodes: &'a mut [ContentNode], out: &mut Vec<&'a mut Paragraph>) {
    for node in nodes {
        match node {
            ContentNode::Section(section) => collect_paragraphs_mut(&mut section.children, out),
            ContentNode::Paragraph(p) => out.push(p),
            ContentNode::Title(_) => {}
        }
    }
}
