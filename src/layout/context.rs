//! Shared state for one layout pass: configuration, the measurement
//! service, forced mode and the warning side channel.

use crate::model::{Element, ElementType};
use crate::style::{Defaults, ResolvedStyle};
use crate::text::TextMeasurer;
use serde::Serialize;
use std::fmt;

use super::area::LayoutArea;

/// A structured layout diagnostic. Warnings never stop layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LayoutWarning {
    /// Content beyond a fixed or maximum height was cut off, or forced
    /// placement put content into an area too small for it.
    #[serde(rename_all = "camelCase")]
    ElementClipped {
        element: ElementType,
        id: Option<String>,
        page: usize,
    },
    /// An element did not fit a fresh area and was placed in forced mode.
    #[serde(rename_all = "camelCase")]
    ElementDoesNotFitArea {
        element: ElementType,
        id: Option<String>,
        page: usize,
    },
    /// A table row section ended with free slots, filled with empty cells.
    #[serde(rename_all = "camelCase")]
    LastRowIsNotComplete { id: Option<String> },
}

impl fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutWarning::ElementClipped { element, page, .. } => write!(
                f,
                "{element} content was clipped on page {page} because some height properties are set"
            ),
            LayoutWarning::ElementDoesNotFitArea { element, page, .. } => {
                write!(f, "{element} does not fit the area on page {page}")
            }
            LayoutWarning::LastRowIsNotComplete { .. } => {
                write!(f, "last table row is not complete, empty cells were added")
            }
        }
    }
}

impl LayoutWarning {
    pub fn clipped(element: &Element, page: usize) -> Self {
        LayoutWarning::ElementClipped {
            element: element.element_type(),
            id: element.id.clone(),
            page,
        }
    }

    pub fn does_not_fit(element: &Element, page: usize) -> Self {
        LayoutWarning::ElementDoesNotFitArea {
            element: element.element_type(),
            id: element.id.clone(),
            page,
        }
    }

    /// Emit this warning through `tracing`.
    pub fn log(&self) {
        match self {
            LayoutWarning::ElementClipped { element, id, page }
            | LayoutWarning::ElementDoesNotFitArea { element, id, page } => {
                tracing::warn!(element = %element, id = ?id, page, "{}", self)
            }
            LayoutWarning::LastRowIsNotComplete { id } => tracing::warn!(id = ?id, "{}", self),
        }
    }
}

/// Per-pass layout state handed down the call tree.
///
/// Warnings are collected here and only reach the log once the pass is
/// over, so attempts that are thrown away (a NOTHING result, a trial
/// layout) leave no trace.
pub struct LayoutContext<'a> {
    pub defaults: &'a Defaults,
    pub measurer: &'a dyn TextMeasurer,
    forced: bool,
    warnings: Vec<LayoutWarning>,
}

impl<'a> LayoutContext<'a> {
    pub fn new(defaults: &'a Defaults, measurer: &'a dyn TextMeasurer) -> Self {
        Self {
            defaults,
            measurer,
            forced: false,
            warnings: Vec::new(),
        }
    }

    /// Resolve an element's properties for layout into `area`.
    pub fn resolve(
        &self,
        element: &Element,
        parent: Option<&ResolvedStyle>,
        area: &LayoutArea,
    ) -> ResolvedStyle {
        ResolvedStyle::resolve(
            &element.properties,
            element.element_type(),
            parent,
            self.defaults,
            area.bbox.width,
            area.bbox.height,
        )
    }

    pub fn warn(&mut self, warning: LayoutWarning) {
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[LayoutWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<LayoutWarning> {
        self.warnings
    }

    /// A marker to roll back to if the next attempt is discarded.
    pub(crate) fn checkpoint(&self) -> usize {
        self.warnings.len()
    }

    pub(crate) fn rollback(&mut self, checkpoint: usize) {
        self.warnings.truncate(checkpoint);
    }

    /// Remove and return the warnings recorded since `checkpoint`, so the
    /// caller can decide later whether the attempt is kept.
    pub(crate) fn take_since(&mut self, checkpoint: usize) -> Vec<LayoutWarning> {
        self.warnings.split_off(checkpoint.min(self.warnings.len()))
    }

    /// In forced mode content must make progress: keep-together is ignored
    /// and whatever cannot fit is placed clipped.
    pub fn is_forced(&self) -> bool {
        self.forced
    }

    /// Set forced mode, returning the previous value for restoring.
    pub(crate) fn set_forced(&mut self, forced: bool) -> bool {
        std::mem::replace(&mut self.forced, forced)
    }
}

impl fmt::Debug for LayoutContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutContext")
            .field("forced", &self.forced)
            .field("warnings", &self.warnings.len())
            .finish()
    }
}
