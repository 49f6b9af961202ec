//! # Quire
//!
//! A pagination and table-layout engine.
//!
//! Quire lays content INTO areas of known size. Each element is asked to
//! fit what it can into the area it is given and reports back: everything
//! fit, part of it fit (with the rest handed back as a new element for the
//! next area), or nothing fit. Tables split between rows or inside them,
//! cut spanning cells at the split line, repeat their header and footer,
//! and keep their column widths from one area to the next.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]    : Document tree: elements, properties, tables and cells
//!       ↓
//!   [style]    : Resolve properties: own, inherited, defaults
//!       ↓
//!   [layout]   : Area-based layout: results, splits, pages
//!       ↓
//! Pages of positioned boxes (JSON)
//! ```

pub mod error;
pub mod layout;
pub mod model;
pub mod style;
pub mod text;

pub use error::QuireError;

use layout::{LayoutArea, LayoutAttempt, LayoutEngine, LayoutOutput};
use model::{Document, Element};
use style::Defaults;

/// Lay out a document into pages.
///
/// This is the primary entry point. Invalid dimensions fail before any
/// layout happens; content that does not fit never fails.
pub fn layout_document(document: &Document) -> Result<LayoutOutput, QuireError> {
    LayoutEngine::new().layout(document)
}

/// Lay out a document described as JSON.
pub fn layout_json(json: &str) -> Result<LayoutOutput, QuireError> {
    let document: Document = serde_json::from_str(json)?;
    layout_document(&document)
}

/// Lay out a single element into a single area with the default settings.
pub fn layout_element(element: &Element, area: &LayoutArea) -> Result<LayoutAttempt, QuireError> {
    element.validate()?;
    Ok(LayoutEngine::new().layout_element(element, area, &Defaults::default()))
}
