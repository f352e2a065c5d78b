//! Arena tree back to XML text.

use quick_xml::escape::{escape, partial_escape};

use super::{XmlDocument, XmlNodeData, XmlNodeId};

/// Serialize the whole document.
///
/// Nodes are emitted exactly as they were parsed except for escaping, which
/// is normalized: text escapes `&`, `<` and `>`, attribute values also
/// escape quotes. Childless elements are written self-closing.
pub fn write_xml(doc: &XmlDocument) -> String {
    let mut out = String::new();
    for &child in doc.children(XmlNodeId::DOCUMENT) {
        write_node(doc, child, &mut out);
    }
    out
}

fn write_node(doc: &XmlDocument, id: XmlNodeId, out: &mut String) {
    let Some(node) = doc.get(id) else {
        return;
    };

    match &node.data {
        XmlNodeData::Document => {
            for &child in &node.children {
                write_node(doc, child, out);
            }
        }
        XmlNodeData::Element { name, attrs } => {
            out.push('<');
            out.push_str(name);
            for attr in attrs {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                out.push_str(&escape(attr.value.as_str()));
                out.push('"');
            }

            if node.children.is_empty() {
                out.push_str("/>");
                return;
            }

            out.push('>');
            for &child in &node.children {
                write_node(doc, child, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        XmlNodeData::Text(text) => out.push_str(&partial_escape(text.as_str())),
        XmlNodeData::CData(text) => {
            out.push_str("<![CDATA[");
            out.push_str(text);
            out.push_str("]]>");
        }
        XmlNodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        XmlNodeData::Declaration(text) | XmlNodeData::ProcessingInstruction(text) => {
            out.push_str("<?");
            out.push_str(text);
            out.push_str("?>");
        }
        XmlNodeData::DocType(text) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(text);
            out.push('>');
        }
    }
}
