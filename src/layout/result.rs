//! The verdict of one layout call.

use super::area::OccupiedArea;
use super::LayoutBox;
use crate::model::{Element, ElementType};
use serde::Serialize;

/// What happened when an element was laid out into an area.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum LayoutResult {
    /// Everything was placed.
    Full {
        occupied: OccupiedArea,
        placed: LayoutBox,
    },
    /// Part was placed. `split` is the placed part as an element, `overflow`
    /// the remainder to lay out in the next area.
    Partial {
        occupied: OccupiedArea,
        placed: LayoutBox,
        split: Element,
        overflow: Element,
    },
    /// Nothing was placed; no area was consumed.
    Nothing { cause: NothingCause },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutStatus {
    Full,
    Partial,
    Nothing,
}

/// Why an element placed nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NothingCause {
    /// The element that could not be placed, possibly a descendant of the
    /// one that was asked.
    pub element: ElementType,
    pub id: Option<String>,
    pub reason: NothingReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NothingReason {
    /// Not even the smallest unit of content fits.
    DoesNotFit,
    /// Part would fit, but the element must not be split.
    KeepTogether,
}

impl NothingCause {
    pub fn new(element: &Element, reason: NothingReason) -> Self {
        Self {
            element: element.element_type(),
            id: element.id.clone(),
            reason,
        }
    }
}

impl LayoutResult {
    pub fn nothing(element: &Element, reason: NothingReason) -> Self {
        LayoutResult::Nothing {
            cause: NothingCause::new(element, reason),
        }
    }

    pub fn status(&self) -> LayoutStatus {
        match self {
            LayoutResult::Full { .. } => LayoutStatus::Full,
            LayoutResult::Partial { .. } => LayoutStatus::Partial,
            LayoutResult::Nothing { .. } => LayoutStatus::Nothing,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, LayoutResult::Full { .. })
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, LayoutResult::Partial { .. })
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, LayoutResult::Nothing { .. })
    }

    pub fn occupied(&self) -> Option<&OccupiedArea> {
        match self {
            LayoutResult::Full { occupied, .. } | LayoutResult::Partial { occupied, .. } => {
                Some(occupied)
            }
            LayoutResult::Nothing { .. } => None,
        }
    }

    pub fn placed(&self) -> Option<&LayoutBox> {
        match self {
            LayoutResult::Full { placed, .. } | LayoutResult::Partial { placed, .. } => {
                Some(placed)
            }
            LayoutResult::Nothing { .. } => None,
        }
    }

    pub fn split(&self) -> Option<&Element> {
        match self {
            LayoutResult::Partial { split, .. } => Some(split),
            _ => None,
        }
    }

    pub fn overflow(&self) -> Option<&Element> {
        match self {
            LayoutResult::Partial { overflow, .. } => Some(overflow),
            _ => None,
        }
    }

    /// Height taken from the area, zero for NOTHING.
    pub fn occupied_height(&self) -> f64 {
        self.occupied().map(OccupiedArea::height).unwrap_or(0.0)
    }
}
