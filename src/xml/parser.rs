//! quick-xml event stream to arena tree.

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use super::{XmlAttribute, XmlDocument, XmlNodeData, XmlNodeId};
use crate::error::{Error, Result};

/// Parse an XML document into an [`XmlDocument`].
///
/// Whitespace-only text is kept so that writing the document back out
/// reproduces the original layout. Fails on malformed markup, on undefined
/// entity references, on unclosed elements and on input without a root
/// element.
pub fn parse_xml(content: &str) -> Result<XmlDocument> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut doc = XmlDocument::new();
    let mut stack: Vec<XmlNodeId> = vec![XmlNodeId::DOCUMENT];

    loop {
        let parent = stack.last().copied().unwrap_or(XmlNodeId::DOCUMENT);

        match reader.read_event()? {
            Event::Start(e) => {
                let id = element_from(&mut doc, &e)?;
                doc.append(parent, id);
                stack.push(id);
            }
            Event::Empty(e) => {
                let id = element_from(&mut doc, &e)?;
                doc.append(parent, id);
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            Event::Text(e) => {
                push_text(&mut doc, parent, &String::from_utf8_lossy(e.as_ref()));
            }
            Event::GeneralRef(e) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                let resolved = resolve_entity(&entity)
                    .ok_or_else(|| Error::ParseFailure(format!("undefined entity &{entity};")))?;
                push_text(&mut doc, parent, &resolved);
            }
            Event::CData(e) => {
                let id = doc.create_node(XmlNodeData::CData(String::from_utf8_lossy(&e).into_owned()));
                doc.append(parent, id);
            }
            Event::Comment(e) => {
                let id = doc.create_node(XmlNodeData::Comment(String::from_utf8_lossy(&e).into_owned()));
                doc.append(parent, id);
            }
            Event::Decl(e) => {
                let id = doc.create_node(XmlNodeData::Declaration(String::from_utf8_lossy(&e).into_owned()));
                doc.append(parent, id);
            }
            Event::PI(e) => {
                let id = doc.create_node(XmlNodeData::ProcessingInstruction(
                    String::from_utf8_lossy(&e).into_owned(),
                ));
                doc.append(parent, id);
            }
            Event::DocType(e) => {
                let id = doc.create_node(XmlNodeData::DocType(String::from_utf8_lossy(&e).into_owned()));
                doc.append(parent, id);
            }
            Event::Eof => break,
            #[allow(unreachable_patterns)]
            _ => {}
        }
    }

    if stack.len() > 1 {
        let open = stack
            .last()
            .and_then(|&id| doc.name(id))
            .unwrap_or_default()
            .to_string();
        return Err(Error::ParseFailure(format!("unclosed element <{open}>")));
    }

    if doc.root_element().is_none() {
        return Err(Error::ParseFailure("no root element".to_string()));
    }

    Ok(doc)
}

fn element_from(doc: &mut XmlDocument, e: &BytesStart) -> Result<XmlNodeId> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();

    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let raw = String::from_utf8_lossy(&attr.value);
        let value = unescape(&raw).map_err(quick_xml::Error::from)?.into_owned();
        attrs.push(XmlAttribute {
            name: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value,
        });
    }

    Ok(doc.create_node(XmlNodeData::Element { name, attrs }))
}

/// Append text to `parent`, merging with a preceding text node so that
/// entity references do not split character data.
fn push_text(doc: &mut XmlDocument, parent: XmlNodeId, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(&last) = doc.children(parent).last()
        && let Some(XmlNodeData::Text(existing)) = doc.data_mut(last)
    {
        existing.push_str(text);
        return;
    }
    let id = doc.create_node(XmlNodeData::Text(text.to_string()));
    doc.append(parent, id);
}

/// Resolve XML entity references.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        entity.strip_prefix('#').and_then(|dec| dec.parse::<u32>().ok())
    };

    code.and_then(char::from_u32).map(|c| c.to_string())
}
