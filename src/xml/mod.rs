//! Arena-based XML document.
//!
//! Holds a parsed XML file as a flat vector of nodes linked by index, so the
//! tree can be queried and mutated in place and then written back out with
//! everything that was not touched (prolog, comments, unknown elements)
//! preserved.

mod parser;
mod writer;

pub use parser::parse_xml;
pub use writer::write_xml;

use crate::util::local_name;

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct XmlNodeId(pub u32);

impl XmlNodeId {
    /// The document node ID (always 0).
    pub const DOCUMENT: XmlNodeId = XmlNodeId(0);
}

/// Node payload.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNodeData {
    /// Document root. Its children are the prolog and the root element.
    Document,
    /// Element with its qualified name and attributes in source order.
    Element {
        name: String,
        attrs: Vec<XmlAttribute>,
    },
    /// Character data, unescaped.
    Text(String),
    /// `<![CDATA[...]]>` content, raw.
    CData(String),
    /// `<!--...-->` content, raw.
    Comment(String),
    /// `<?xml ...?>` declaration content, raw.
    Declaration(String),
    /// `<?target ...?>` content, raw.
    ProcessingInstruction(String),
    /// `<!DOCTYPE ...>` content, raw.
    DocType(String),
}

/// XML attribute with an unescaped value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct XmlNode {
    pub data: XmlNodeData,
    pub parent: Option<XmlNodeId>,
    pub children: Vec<XmlNodeId>,
}

/// Arena-based XML tree.
///
/// Detached nodes stay allocated but are unreachable from the document node,
/// so they never show up in traversals or serialized output.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<XmlNode>,
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlDocument {
    /// Create an empty document containing only the document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![XmlNode {
                data: XmlNodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    fn alloc(&mut self, data: XmlNodeData) -> XmlNodeId {
        let id = XmlNodeId(self.nodes.len() as u32);
        self.nodes.push(XmlNode {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Get a node by ID.
    pub fn get(&self, id: XmlNodeId) -> Option<&XmlNode> {
        self.nodes.get(id.0 as usize)
    }

    fn get_mut(&mut self, id: XmlNodeId) -> Option<&mut XmlNode> {
        self.nodes.get_mut(id.0 as usize)
    }

    fn data_mut(&mut self, id: XmlNodeId) -> Option<&mut XmlNodeData> {
        self.get_mut(id).map(|n| &mut n.data)
    }

    /// Children of a node, in document order.
    pub fn children(&self, id: XmlNodeId) -> &[XmlNodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, name: impl Into<String>) -> XmlNodeId {
        self.alloc(XmlNodeData::Element {
            name: name.into(),
            attrs: Vec::new(),
        })
    }

    /// Create a detached node with arbitrary data.
    pub fn create_node(&mut self, data: XmlNodeData) -> XmlNodeId {
        self.alloc(data)
    }

    /// Append `child` as the last child of `parent`.
    pub fn append(&mut self, parent: XmlNodeId, child: XmlNodeId) {
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.get_mut(parent) {
            node.children.push(child);
        }
    }

    /// Detach every child of `id`.
    pub fn remove_children(&mut self, id: XmlNodeId) {
        let children = match self.get_mut(id) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in children {
            if let Some(node) = self.get_mut(child) {
                node.parent = None;
            }
        }
    }

    /// The root element (the first element child of the document node).
    pub fn root_element(&self) -> Option<XmlNodeId> {
        self.children(XmlNodeId::DOCUMENT)
            .iter()
            .copied()
            .find(|&id| self.is_element(id))
    }

    pub fn is_element(&self, id: XmlNodeId) -> bool {
        matches!(
            self.get(id).map(|n| &n.data),
            Some(XmlNodeData::Element { .. })
        )
    }

    /// Qualified name of an element.
    pub fn name(&self, id: XmlNodeId) -> Option<&str> {
        match self.get(id).map(|n| &n.data) {
            Some(XmlNodeData::Element { name, .. }) => Some(name),
            _ => None,
        }
    }

    /// Local name of an element (namespace prefix stripped).
    pub fn local_name(&self, id: XmlNodeId) -> Option<&str> {
        self.name(id).map(local_name)
    }

    /// Get an attribute value.
    pub fn attr(&self, id: XmlNodeId, name: &str) -> Option<&str> {
        match self.get(id).map(|n| &n.data) {
            Some(XmlNodeData::Element { attrs, .. }) => attrs
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.value.as_str()),
            _ => None,
        }
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, id: XmlNodeId, name: &str, value: impl Into<String>) {
        let Some(XmlNodeData::Element { attrs, .. }) = self.get_mut(id).map(|n| &mut n.data) else {
            return;
        };
        let value = value.into();
        match attrs.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value,
            None => attrs.push(XmlAttribute {
                name: name.to_string(),
                value,
            }),
        }
    }

    /// Remove an attribute. Returns `true` if it was present.
    pub fn remove_attr(&mut self, id: XmlNodeId, name: &str) -> bool {
        let Some(XmlNodeData::Element { attrs, .. }) = self.get_mut(id).map(|n| &mut n.data) else {
            return false;
        };
        let before = attrs.len();
        attrs.retain(|a| a.name != name);
        attrs.len() != before
    }

    /// Iterate all descendants of `id` in document order (pre-order),
    /// excluding `id` itself.
    pub fn descendants(&self, id: XmlNodeId) -> Descendants<'_> {
        let mut stack: Vec<XmlNodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// Descendant elements of `id` whose local name is `name`.
    pub fn elements_by_name<'a>(
        &'a self,
        id: XmlNodeId,
        name: &'a str,
    ) -> impl Iterator<Item = XmlNodeId> + 'a {
        self.descendants(id)
            .filter(move |&d| self.local_name(d) == Some(name))
    }

    /// First descendant element of `id` whose local name is `name`.
    pub fn first_element_by_name(&self, id: XmlNodeId, name: &str) -> Option<XmlNodeId> {
        self.elements_by_name(id, name).next()
    }

    /// Concatenated text of all descendant text and CDATA nodes.
    pub fn text_content(&self, id: XmlNodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.own_text(id) {
            out.push_str(text);
        }
        for d in self.descendants(id) {
            if let Some(text) = self.own_text(d) {
                out.push_str(text);
            }
        }
        out
    }

    fn own_text(&self, id: XmlNodeId) -> Option<&str> {
        match self.get(id).map(|n| &n.data) {
            Some(XmlNodeData::Text(text)) | Some(XmlNodeData::CData(text)) => Some(text),
            _ => None,
        }
    }
}

/// Pre-order iterator over the descendants of a node.
pub struct Descendants<'a> {
    doc: &'a XmlDocument,
    stack: Vec<XmlNodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = XmlNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(id).iter().rev().copied());
        Some(id)
    }
}
