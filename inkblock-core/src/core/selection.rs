//! Rectangle selection of whole blocks during a pointer drag.
//!
//! The selector works on abstract rectangles. The host measures its rendered
//! blocks and hands them over through [`BlockGeometry`]; the selector never
//! sees the rendering layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An axis-aligned rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// The rectangle spanned by two corner points, in any order.
    #[must_use]
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            left: a.0.min(b.0),
            top: a.1.min(b.1),
            width: (a.0 - b.0).abs(),
            height: (a.1 - b.1).abs(),
        }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// True for boxes with no area, or with a non-finite coordinate or extent.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        let finite = [self.left, self.top, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        !finite || self.width <= 0.0 || self.height <= 0.0
    }

    /// True unless one rectangle lies entirely left, right, above or below the other.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.right() < other.left
            || self.left > other.right()
            || self.bottom() < other.top
            || self.top > other.bottom())
    }
}

/// The live drag rectangle.
pub type SelectionBox = Rect;

/// Rendered bounds of one block as measured by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRect {
    /// Document position of the block, used for ordering.
    pub pos: usize,
    /// Nesting depth; only depth zero takes part in selection.
    pub depth: usize,
    pub block_id: String,
    pub rect: Rect,
}

/// Host collaborator supplying the current rendered block positions.
pub trait BlockGeometry {
    fn block_rects(&self) -> Vec<BlockRect>;
}

impl BlockGeometry for [BlockRect] {
    fn block_rects(&self) -> Vec<BlockRect> {
        self.to_vec()
    }
}

impl BlockGeometry for Vec<BlockRect> {
    fn block_rects(&self) -> Vec<BlockRect> {
        self.clone()
    }
}

/// A committed selection spanning whole top-level blocks in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSelection {
    /// Position of the first selected block.
    pub from: usize,
    /// Position of the last selected block.
    pub to: usize,
    /// IDs of the intersected blocks, in document order.
    pub block_ids: Vec<String>,
}

/// Drag-to-select state machine.
///
/// # Examples
///
/// ```rust
/// use inkblock_core::{BlockRect, BlockSelector, Rect};
///
/// let rects = vec![
///     BlockRect {
///         pos: 0,
///         depth: 0,
///         block_id: "a".into(),
///         rect: Rect::new(0.0, 0.0, 100.0, 20.0),
///     },
///     BlockRect {
///         pos: 12,
///         depth: 0,
///         block_id: "b".into(),
///         rect: Rect::new(0.0, 30.0, 100.0, 20.0),
///     },
/// ];
/// let mut selector = BlockSelector::default();
/// selector.start_drag(-10.0, 5.0);
/// selector.update_drag(50.0, 40.0, &rects);
/// let selection = selector.end_drag().unwrap();
/// assert_eq!((selection.from, selection.to), (0, 12));
/// ```
#[derive(Debug, Clone, Default)]
pub struct BlockSelector {
    anchor: Option<(f64, f64)>,
    selection_box: Option<SelectionBox>,
    intersecting: BTreeMap<usize, String>,
    selection: Option<BlockSelection>,
}

impl BlockSelector {
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }

    /// The current drag rectangle, if a drag has moved.
    #[must_use]
    pub fn selection_box(&self) -> Option<SelectionBox> {
        self.selection_box
    }

    /// Positions of the blocks hit by the current or last drag, in document order.
    #[must_use]
    pub fn intersecting_positions(&self) -> Vec<usize> {
        self.intersecting.keys().copied().collect()
    }

    /// The last committed selection.
    #[must_use]
    pub fn selection(&self) -> Option<&BlockSelection> {
        self.selection.as_ref()
    }

    /// Anchors a new drag at `(x, y)` and discards any previous box and result.
    pub fn start_drag(&mut self, x: f64, y: f64) {
        self.anchor = Some((x, y));
        self.selection_box = None;
        self.intersecting.clear();
        self.selection = None;
    }

    /// Recomputes the box and the intersected top-level blocks. No-op when not dragging.
    pub fn update_drag<G: BlockGeometry + ?Sized>(&mut self, x: f64, y: f64, geometry: &G) {
        let Some(anchor) = self.anchor else {
            return;
        };
        let selection_box = Rect::from_corners(anchor, (x, y));
        self.selection_box = Some(selection_box);
        self.intersecting = intersecting_blocks(&selection_box, &geometry.block_rects());
    }

    /// Commits the intersected blocks as one contiguous selection and ends the drag.
    ///
    /// Returns `None`, and sets no selection, if no block was hit or no drag
    /// was in progress. The intersected set stays readable for feedback.
    pub fn end_drag(&mut self) -> Option<BlockSelection> {
        self.anchor.take()?;
        self.selection_box = None;

        let from = *self.intersecting.keys().next()?;
        let to = *self.intersecting.keys().next_back()?;
        let selection = BlockSelection {
            from,
            to,
            block_ids: self.intersecting.values().cloned().collect(),
        };
        self.selection = Some(selection.clone());
        Some(selection)
    }

    /// Cancels any drag and forgets all selection state. Safe from any state.
    pub fn clear_selection(&mut self) {
        *self = Self::default();
    }
}

/// Top-level blocks whose bounds intersect `selection_box`, keyed by position.
///
/// A degenerate box selects nothing.
#[must_use]
pub fn intersecting_blocks(selection_box: &Rect, rects: &[BlockRect]) -> BTreeMap<usize, String> {
    if selection_box.is_degenerate() {
        return BTreeMap::new();
    }
    rects
        .iter()
        .filter(|r| r.depth == 0 && selection_box.intersects(&r.rect))
        .map(|r| (r.pos, r.block_id.clone()))
        .collect()
}
