//! Display tree: the on-screen projection of an FB2 body.
//!
//! [`render`] rebuilds the whole tree from a [`Body`] every time; there is
//! no incremental update path. Sections become grouping containers, titles
//! become headings and paragraphs keep their text and bookmark id. Like a
//! DOM, headings and paragraphs hold their text in child [`DisplayKind::Text`]
//! nodes, so a selection can start inside a text node and has to be walked up
//! to its paragraph.

mod html;

pub use html::{synthesize_html, synthesize_page};

use crate::bookmark::BookmarkId;
use crate::config::ReaderConfig;
use crate::fb2::{Body, ContentNode};

/// Unique identifier for a node within a [`DisplayTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DisplayNodeId(pub u32);

impl DisplayNodeId {
    /// The root node ID (always 0).
    pub const ROOT: DisplayNodeId = DisplayNodeId(0);
}

/// Bookmark state of a display paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParagraphMark {
    pub bookmark_id: Option<BookmarkId>,
    /// Visual "bookmarked" marker (the bookmark class in HTML output).
    pub bookmarked: bool,
}

impl ParagraphMark {
    pub fn is_marked(&self) -> bool {
        self.bookmark_id.is_some() || self.bookmarked
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayKind {
    /// Container of the whole rendered body.
    Root,
    /// Grouping container for a section.
    Section,
    /// Heading with its level.
    Heading(u8),
    Paragraph(ParagraphMark),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayNode {
    pub kind: DisplayKind,
    pub parent: Option<DisplayNodeId>,
    pub children: Vec<DisplayNodeId>,
}

/// Arena of display nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTree {
    nodes: Vec<DisplayNode>,
}

impl Default for DisplayTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayTree {
    /// An empty tree with only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![DisplayNode {
                kind: DisplayKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    fn push(&mut self, parent: DisplayNodeId, kind: DisplayKind) -> DisplayNodeId {
        let id = DisplayNodeId(self.nodes.len() as u32);
        self.nodes.push(DisplayNode {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(node) = self.nodes.get_mut(parent.0 as usize) {
            node.children.push(id);
        }
        id
    }

    pub fn root(&self) -> DisplayNodeId {
        DisplayNodeId::ROOT
    }

    pub fn get(&self, id: DisplayNodeId) -> Option<&DisplayNode> {
        self.nodes.get(id.0 as usize)
    }

    pub fn kind(&self, id: DisplayNodeId) -> Option<&DisplayKind> {
        self.get(id).map(|n| &n.kind)
    }

    pub fn parent(&self, id: DisplayNodeId) -> Option<DisplayNodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: DisplayNodeId) -> &[DisplayNodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn is_paragraph(&self, id: DisplayNodeId) -> bool {
        matches!(self.kind(id), Some(DisplayKind::Paragraph(_)))
    }

    pub fn paragraph(&self, id: DisplayNodeId) -> Option<&ParagraphMark> {
        match self.kind(id) {
            Some(DisplayKind::Paragraph(mark)) => Some(mark),
            _ => None,
        }
    }

    pub fn paragraph_mut(&mut self, id: DisplayNodeId) -> Option<&mut ParagraphMark> {
        match self.nodes.get_mut(id.0 as usize).map(|n| &mut n.kind) {
            Some(DisplayKind::Paragraph(mark)) => Some(mark),
            _ => None,
        }
    }

    /// All nodes reachable from the root, in document order.
    pub fn descendants(&self) -> Vec<DisplayNodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// All paragraph nodes in document order.
    pub fn paragraphs(&self) -> Vec<DisplayNodeId> {
        self.descendants()
            .into_iter()
            .filter(|&id| self.is_paragraph(id))
            .collect()
    }

    /// The `n`th paragraph in document order.
    pub fn nth_paragraph(&self, n: usize) -> Option<DisplayNodeId> {
        self.paragraphs().get(n).copied()
    }

    /// Paragraphs carrying a bookmark id, in document order.
    pub fn bookmarked(&self) -> Vec<DisplayNodeId> {
        self.paragraphs()
            .into_iter()
            .filter(|&id| self.paragraph(id).is_some_and(|m| m.bookmark_id.is_some()))
            .collect()
    }

    /// The first paragraph carrying `bookmark`.
    pub fn find_bookmark(&self, bookmark: &BookmarkId) -> Option<DisplayNodeId> {
        self.paragraphs().into_iter().find(|&id| {
            self.paragraph(id)
                .and_then(|m| m.bookmark_id.as_ref())
                == Some(bookmark)
        })
    }

    /// `id` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, id: DisplayNodeId) -> impl Iterator<Item = DisplayNodeId> + '_ {
        std::iter::successors(self.get(id).map(|_| id), move |&current| self.parent(current))
    }

    /// Concatenated text of `id` and its descendants.
    pub fn text_content(&self, id: DisplayNodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: DisplayNodeId, out: &mut String) {
        if let Some(DisplayKind::Text(text)) = self.kind(id) {
            out.push_str(text);
        }
        for &child in self.children(id) {
            self.collect_text(child, out);
        }
    }

    /// The first text node under `id`, if any.
    pub fn first_text(&self, id: DisplayNodeId) -> Option<DisplayNodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| matches!(self.kind(child), Some(DisplayKind::Text(_))))
    }

    /// Remove all text of `id` by detaching its children.
    pub fn clear_text(&mut self, id: DisplayNodeId) {
        let children = match self.nodes.get_mut(id.0 as usize) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in children {
            if let Some(node) = self.nodes.get_mut(child.0 as usize) {
                node.parent = None;
            }
        }
    }
}

/// Host hook for bringing a rendered node on screen.
pub trait Viewport {
    fn scroll_into_view(&mut self, tree: &DisplayTree, node: DisplayNodeId);
}

/// A [`Viewport`] that only remembers where it was asked to scroll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollPosition {
    pub target: Option<DisplayNodeId>,
}

impl Viewport for ScrollPosition {
    fn scroll_into_view(&mut self, _tree: &DisplayTree, node: DisplayNodeId) {
        self.target = Some(node);
    }
}

/// Render a body with the default configuration.
pub fn render(body: &Body) -> DisplayTree {
    render_with(body, &ReaderConfig::default())
}

/// Render a body into a fresh display tree.
///
/// Traversal is depth-first in document order. The source tree is not
/// modified.
pub fn render_with(body: &Body, config: &ReaderConfig) -> DisplayTree {
    let mut tree = DisplayTree::new();
    let root = tree.root();
    render_nodes(&body.children, root, &mut tree, config);
    tree
}

fn render_nodes(nodes: &[ContentNode], parent: DisplayNodeId, tree: &mut DisplayTree, config: &ReaderConfig) {
    for node in nodes {
        match node {
            ContentNode::Section(section) => {
                let id = tree.push(parent, DisplayKind::Section);
                render_nodes(&section.children, id, tree, config);
            }
            ContentNode::Title(title) => {
                let id = tree.push(parent, DisplayKind::Heading(config.heading_level));
                push_text(tree, id, &title.text);
            }
            ContentNode::Paragraph(paragraph) => {
                let mark = ParagraphMark {
                    bookmarked: paragraph.bookmark_id.is_some(),
                    bookmark_id: paragraph.bookmark_id.clone(),
                };
                let id = tree.push(parent, DisplayKind::Paragraph(mark));
                push_text(tree, id, &paragraph.text);
            }
        }
    }
}

fn push_text(tree: &mut DisplayTree, parent: DisplayNodeId, text: &str) {
    if !text.is_empty() {
        tree.push(parent, DisplayKind::Text(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fb2::Fb2Document;

    fn doc(body: &str) -> Fb2Document {
        Fb2Document::parse(&format!("<FictionBook><body>{body}</body></FictionBook>")).unwrap()
    }

    #[test]
    fn test_render_section_title_paragraphs() {
        let doc = doc("<section><title>Ch1</title><p>Hello</p><p>World</p></section>");
        let tree = render(doc.body());

        let root_children = tree.children(tree.root());
        assert_eq!(root_children.len(), 1);
        let section = root_children[0];
        assert_eq!(tree.kind(section), Some(&DisplayKind::Section));

        let parts = tree.children(section);
        assert_eq!(parts.len(), 3);
        assert_eq!(tree.kind(parts[0]), Some(&DisplayKind::Heading(2)));
        assert_eq!(tree.text_content(parts[0]), "Ch1");
        assert_eq!(tree.text_content(parts[1]), "Hello");
        assert_eq!(tree.text_content(parts[2]), "World");
        assert!(tree.bookmarked().is_empty());
    }

    #[test]
    fn test_render_marks_bookmarked_paragraph() {
        let doc = doc(r#"<p>a</p><p data-bookmark-id="bookmark-5">b</p>"#);
        let tree = render(doc.body());

        let marked = tree.bookmarked();
        assert_eq!(marked.len(), 1);
        let mark = tree.paragraph(marked[0]).unwrap();
        assert!(mark.bookmarked);
        assert_eq!(mark.bookmark_id, Some(BookmarkId::new("bookmark-5")));
        assert_eq!(tree.find_bookmark(&BookmarkId::new("bookmark-5")), Some(marked[0]));
    }

    #[test]
    fn test_render_nested_sections_keep_order() {
        let doc = doc("<section><p>1</p><section><p>2</p></section><p>3</p></section><p>4</p>");
        let tree = render(doc.body());
        let texts: Vec<_> = tree.paragraphs().iter().map(|&p| tree.text_content(p)).collect();
        assert_eq!(texts, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_render_is_idempotent() {
        let doc = doc("<section><title>T</title><p>x</p><section><p>y</p></section></section>");
        assert_eq!(render(doc.body()), render(doc.body()));
    }

    #[test]
    fn test_render_skips_unknown_elements() {
        let doc = doc("<image href=\"#c\"/><section><empty-line/><p>x</p></section>");
        let tree = render(doc.body());
        assert_eq!(tree.descendants().len(), 4); // root, section, p, text
    }

    #[test]
    fn test_heading_level_from_config() {
        let doc = doc("<title>T</title>");
        let config = ReaderConfig {
            heading_level: 3,
            ..Default::default()
        };
        let tree = render_with(doc.body(), &config);
        let heading = tree.children(tree.root())[0];
        assert_eq!(tree.kind(heading), Some(&DisplayKind::Heading(3)));
    }

    #[test]
    fn test_ancestors_walk_to_root() {
        let doc = doc("<section><p>x</p></section>");
        let tree = render(doc.body());
        let p = tree.nth_paragraph(0).unwrap();
        let text = tree.first_text(p).unwrap();
        let chain: Vec<_> = tree.ancestors(text).collect();
        assert_eq!(chain.len(), 4);
        assert_eq!(chain[1], p);
        assert_eq!(chain[3], tree.root());
    }

    #[test]
    fn test_clear_text() {
        let doc = doc("<p>gone</p>");
        let mut tree = render(doc.body());
        let p = tree.nth_paragraph(0).unwrap();
        tree.clear_text(p);
        assert_eq!(tree.text_content(p), "");
        assert!(tree.first_text(p).is_none());
    }
}
