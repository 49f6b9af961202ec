//! Placement regions.
//!
//! Coordinates are in points with the origin at the top-left of the page and
//! y growing downward, the same convention [`LayoutBox`](super::LayoutBox)
//! uses. An area with infinite height is unbounded: content is laid out in
//! full and clipped afterwards by the caller.

use crate::model::Edges;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// The rectangle inside `edges`. Sizes never go negative.
    pub fn shrink(&self, edges: &Edges) -> Rect {
        Rect {
            x: self.x + edges.left,
            y: self.y + edges.top,
            width: (self.width - edges.horizontal()).max(0.0),
            height: (self.height - edges.vertical()).max(0.0),
        }
    }
}

/// Space offered to one layout call. Owned by that call for its duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutArea {
    /// 1-based page number.
    pub page: usize,
    pub bbox: Rect,
}

impl LayoutArea {
    pub fn new(page: usize, bbox: Rect) -> Self {
        Self { page, bbox }
    }

    /// Split into the top `height` points (the used portion) and the rest.
    pub fn split_at(&self, height: f64) -> (LayoutArea, LayoutArea) {
        let used = height.clamp(0.0, self.bbox.height.max(0.0));
        let top = LayoutArea::new(
            self.page,
            Rect::new(self.bbox.x, self.bbox.y, self.bbox.width, used),
        );
        let rest = LayoutArea::new(
            self.page,
            Rect::new(
                self.bbox.x,
                self.bbox.y + used,
                self.bbox.width,
                self.bbox.height - used,
            ),
        );
        (top, rest)
    }

    /// The remainder below what `occupied` already took.
    pub fn below(&self, occupied: &OccupiedArea) -> LayoutArea {
        self.split_at(occupied.bbox.bottom() - self.bbox.y).1
    }

    pub fn with_height(&self, height: f64) -> LayoutArea {
        LayoutArea::new(
            self.page,
            Rect::new(self.bbox.x, self.bbox.y, self.bbox.width, height),
        )
    }

    pub fn unbounded(&self) -> LayoutArea {
        self.with_height(f64::INFINITY)
    }

    pub fn is_bounded(&self) -> bool {
        self.bbox.height.is_finite()
    }
}

/// What a layout call actually took: grows downward from the area top as
/// content is placed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OccupiedArea {
    pub page: usize,
    pub bbox: Rect,
}

impl OccupiedArea {
    /// Nothing occupied yet: zero height at the top of `area`.
    pub fn start(area: &LayoutArea) -> Self {
        Self {
            page: area.page,
            bbox: Rect::new(area.bbox.x, area.bbox.y, area.bbox.width, 0.0),
        }
    }

    pub fn new(page: usize, bbox: Rect) -> Self {
        Self { page, bbox }
    }

    pub fn height(&self) -> f64 {
        self.bbox.height
    }

    /// Extend downward so the occupied bottom is at least `bottom`.
    pub fn grow_to(&mut self, bottom: f64) {
        if bottom > self.bbox.bottom() {
            self.bbox.height = bottom - self.bbox.y;
        }
    }
}
