//! HTML synthesis of a display tree.
//!
//! Produces the markup a browser host injects into its content container:
//!
//! ```
//! use fb2mark::{Fb2Document, render};
//! use fb2mark::render::synthesize_html;
//!
//! let doc = Fb2Document::parse("<FictionBook><body><section><title>Ch1</title><p>Hi</p></section></body></FictionBook>").unwrap();
//! let html = synthesize_html(&render(doc.body()), &Default::default());
//! assert_eq!(html, r#"<div class="section"><h2>Ch1</h2><p>Hi</p></div>"#);
//! ```

use std::fmt::Write;

use quick_xml::escape::{escape, partial_escape};

use super::{DisplayKind, DisplayNodeId, DisplayTree};
use crate::config::ReaderConfig;

/// Synthesize the body markup of a display tree.
///
/// Text is escaped the way assigning `textContent` would treat it, so the
/// markup shows exactly the characters of the source paragraphs.
pub fn synthesize_html(tree: &DisplayTree, config: &ReaderConfig) -> String {
    let mut out = String::new();
    for &child in tree.children(tree.root()) {
        walk_node(tree, child, config, &mut out);
    }
    out
}

/// Synthesize a complete XHTML page around the display tree.
pub fn synthesize_page(tree: &DisplayTree, config: &ReaderConfig, title: &str) -> String {
    let mut doc = String::new();

    doc.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
  <meta charset="utf-8"/>
  <title>"#,
    );
    doc.push_str(&partial_escape(title));
    doc.push_str("</title>\n");
    let _ = writeln!(
        doc,
        "  <style>.{} {{ background: #ffef9f; }}</style>",
        config.bookmark_class
    );
    doc.push_str("</head>\n<body>\n<div id=\"content\">");
    doc.push_str(&synthesize_html(tree, config));
    doc.push_str("</div>\n</body>\n</html>\n");
    doc
}

fn walk_node(tree: &DisplayTree, id: DisplayNodeId, config: &ReaderConfig, out: &mut String) {
    let Some(kind) = tree.kind(id) else {
        return;
    };

    match kind {
        DisplayKind::Root => walk_children(tree, id, config, out),
        DisplayKind::Section => {
            let _ = write!(out, "<div class=\"{}\">", escape(config.section_class.as_str()));
            walk_children(tree, id, config, out);
            out.push_str("</div>");
        }
        DisplayKind::Heading(level) => {
            let _ = write!(out, "<h{level}>");
            walk_children(tree, id, config, out);
            let _ = write!(out, "</h{level}>");
        }
        DisplayKind::Paragraph(mark) => {
            out.push_str("<p");
            if let Some(bookmark) = &mark.bookmark_id {
                let _ = write!(
                    out,
                    " {}=\"{}\"",
                    config.bookmark_attribute,
                    escape(bookmark.as_str())
                );
            }
            if mark.bookmarked {
                let _ = write!(out, " class=\"{}\"", escape(config.bookmark_class.as_str()));
            }
            out.push('>');
            walk_children(tree, id, config, out);
            out.push_str("</p>");
        }
        DisplayKind::Text(text) => out.push_str(&partial_escape(text.as_str())),
    }
}

fn walk_children(tree: &DisplayTree, id: DisplayNodeId, config: &ReaderConfig, out: &mut String) {
    for &child in tree.children(id) {
        walk_node(tree, child, config, out);
    }
}
