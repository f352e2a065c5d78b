//! Mapping user input to the paragraph it points at.
//!
//! Two input modalities are supported, tried in order:
//!
//! 1. A text selection. The start container of the first range is walked up
//!    to the nearest paragraph; this resolves synchronously.
//! 2. A touch tap. When the selection does not resolve, [`resolve`] hands
//!    back a [`PendingTap`]: a one-shot continuation that the host fires with
//!    the coordinates of the next touch release. Firing consumes it, so it
//!    can complete at most once.

use crate::render::{DisplayKind, DisplayNodeId, DisplayTree};

/// A position inside the display tree (a node and an offset within it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayPoint {
    pub node: DisplayNodeId,
    /// Character offset within `node`, as reported by the host. Resolution
    /// only looks at the node.
    pub offset: usize,
}

/// A selected range of the display tree.
///
/// Hosts pass ranges through as they have them; only `start.node` decides
/// which paragraph a selection belongs to, so a range that ends in another
/// paragraph still resolves to the one it starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    pub start: DisplayPoint,
    pub end: DisplayPoint,
}

/// The user's current text selection; possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ranges: Vec<SelectionRange>,
}

impl Selection {
    /// No selection at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// A collapsed selection (a caret) at `offset` within `node`.
    pub fn caret(node: DisplayNodeId, offset: usize) -> Self {
        let point = DisplayPoint { node, offset };
        Self {
            ranges: vec![SelectionRange {
                start: point,
                end: point,
            }],
        }
    }

    /// A caret at the start of the text of paragraph `paragraph`, or on the
    /// paragraph itself when it has no text.
    pub fn in_paragraph(tree: &DisplayTree, paragraph: DisplayNodeId) -> Self {
        Self::caret(tree.first_text(paragraph).unwrap_or(paragraph), 0)
    }

    pub fn from_ranges(ranges: Vec<SelectionRange>) -> Self {
        Self { ranges }
    }

    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn range(&self, index: usize) -> Option<&SelectionRange> {
        self.ranges.get(index)
    }
}

/// Coordinates of a touch release on the rendered surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub x: f64,
    pub y: f64,
}

impl TouchPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Host hook for hit-testing the rendered surface.
pub trait Surface {
    /// The display node rendered at `point`, if any.
    fn hit_test(&self, tree: &DisplayTree, point: TouchPoint) -> Option<DisplayNodeId>;
}

impl<F> Surface for F
where
    F: Fn(&DisplayTree, TouchPoint) -> Option<DisplayNodeId>,
{
    fn hit_test(&self, tree: &DisplayTree, point: TouchPoint) -> Option<DisplayNodeId> {
        self(tree, point)
    }
}

/// A surface that stacks every heading and paragraph as one row of fixed
/// height, top to bottom in document order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowLayout {
    pub row_height: f64,
}

impl Surface for RowLayout {
    fn hit_test(&self, tree: &DisplayTree, point: TouchPoint) -> Option<DisplayNodeId> {
        if point.y < 0.0 || self.row_height <= 0.0 {
            return None;
        }
        let row = (point.y / self.row_height) as usize;
        tree.descendants()
            .into_iter()
            .filter(|&id| {
                matches!(
                    tree.kind(id),
                    Some(DisplayKind::Heading(_)) | Some(DisplayKind::Paragraph(_))
                )
            })
            .nth(row)
    }
}

/// Outcome of [`resolve`].
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The selection lies inside this paragraph.
    Resolved(DisplayNodeId),
    /// The selection did not resolve; the target comes from the next touch
    /// release instead.
    Deferred(PendingTap),
}

/// Resolve a text selection to its enclosing paragraph.
///
/// Returns `None` when there is no range or the start container of the
/// first range has no paragraph ancestor.
pub fn resolve_sync(tree: &DisplayTree, selection: &Selection) -> Option<DisplayNodeId> {
    let range = selection.range(0)?;
    tree.ancestors(range.start.node)
        .find(|&id| tree.is_paragraph(id))
}

/// Resolve a selection, falling back to a deferred touch tap.
pub fn resolve(tree: &DisplayTree, selection: &Selection) -> Resolution {
    match resolve_sync(tree, selection) {
        Some(paragraph) => Resolution::Resolved(paragraph),
        None => Resolution::Deferred(PendingTap { _private: () }),
    }
}

/// One-shot continuation waiting for a touch release.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a pending tap does nothing unless it is fired"]
pub struct PendingTap {
    _private: (),
}

impl PendingTap {
    /// Hit-test `point` and return the paragraph under it.
    ///
    /// Only a hit on a paragraph node resolves; anything else (headings,
    /// section padding, nothing at all) yields `None`. Either way the
    /// continuation is used up.
    pub fn fire(self, tree: &DisplayTree, surface: &dyn Surface, point: TouchPoint) -> Option<DisplayNodeId> {
        surface
            .hit_test(tree, point)
            .filter(|&id| tree.is_paragraph(id))
    }
}
