//! # Document Model
//!
//! The input to the layout engine: a tree of content elements, each with a
//! kind, a property map and children. Nesting is a strict tree (a cell holds
//! a table that holds cells, never a cycle).
//!
//! Elements are built before layout and never mutated during it. When layout
//! splits an element across areas it produces fresh split and overflow
//! copies instead.

mod cell;
mod table;

pub use cell::Cell;
pub use table::{Table, TableEntry, TableModel, TableRows};

use crate::error::{check_dimension, QuireError};
use crate::layout::dispatch::LayoutStrategy;
use crate::style::{Defaults, FloatSide, Properties, Styled};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A complete document ready for layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Top-level content, laid out in order across pages.
    pub children: Vec<Element>,

    /// Page size and margins used for every page.
    #[serde(default)]
    pub page: PageConfig,

    /// Default property values (cell border, font size, page guard).
    #[serde(default)]
    pub defaults: Defaults,
}

impl Document {
    pub fn new(children: Vec<Element>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    /// Reject invalid dimensions anywhere in the tree.
    pub fn validate(&self) -> Result<(), QuireError> {
        let (width, height) = self.page.size.dimensions();
        check_dimension("page width", width)?;
        check_dimension("page height", height)?;
        for m in [
            self.page.margin.top,
            self.page.margin.right,
            self.page.margin.bottom,
            self.page.margin.left,
        ] {
            check_dimension("page margin", m)?;
        }
        check_dimension("default font size", self.defaults.font_size)?;
        check_dimension("default line height", self.defaults.line_height)?;
        self.children.iter().try_for_each(Element::validate)
    }
}

/// Configuration for a page: size and margins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    /// Page size. Defaults to A4.
    #[serde(default = "PageSize::default")]
    pub size: PageSize,

    /// Page margins in points (1/72 inch).
    #[serde(default = "default_page_margin")]
    pub margin: Edges,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            margin: default_page_margin(),
        }
    }
}

fn default_page_margin() -> Edges {
    Edges::uniform(36.0) // half an inch
}

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Tabloid => (792.0, 1224.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Edge values (top, right, bottom, left) used for margin, padding and
/// border widths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn symmetric(vertical: f64, horizontal: f64) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// The closed set of element variants, without their payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Paragraph,
    Image,
    Div,
    Table,
    Cell,
    AreaBreak,
}

impl ElementType {
    pub fn name(self) -> &'static str {
        match self {
            ElementType::Paragraph => "Paragraph",
            ElementType::Image => "Image",
            ElementType::Div => "Div",
            ElementType::Table => "Table",
            ElementType::Cell => "Cell",
            ElementType::AreaBreak => "AreaBreak",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A node in the content tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// What kind of element this is.
    pub kind: ElementKind,

    #[serde(default)]
    pub properties: Properties,

    /// Child elements (Div and Cell content).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,

    /// Optional identifier, carried into layout boxes and warnings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Custom layout strategy replacing the built-in one.
    #[serde(skip)]
    strategy: Option<Arc<dyn LayoutStrategy>>,
}

/// The different kinds of elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ElementKind {
    /// A block of flowed text.
    Paragraph { text: String },

    /// An atomic image with its intrinsic size in points.
    Image { width: f64, height: f64 },

    /// A block container.
    Div,

    /// A table: columns, body, header and footer cells.
    Table(Box<TableModel>),

    /// A table cell. Spans are at least 1.
    Cell {
        #[serde(default = "default_span")]
        rowspan: u32,
        #[serde(default = "default_span")]
        colspan: u32,
    },

    /// Finish the current area; following content starts in the next one.
    AreaBreak,
}

fn default_span() -> u32 {
    1
}

impl Element {
    fn of_kind(kind: ElementKind) -> Self {
        Self {
            kind,
            properties: Properties::new(),
            children: vec![],
            id: None,
            strategy: None,
        }
    }

    /// Create a Paragraph element.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::of_kind(ElementKind::Paragraph { text: text.into() })
    }

    /// Create an Image element with an intrinsic size.
    pub fn image(width: f64, height: f64) -> Result<Self, QuireError> {
        check_dimension("image width", width)?;
        check_dimension("image height", height)?;
        Ok(Self::of_kind(ElementKind::Image { width, height }))
    }

    /// Create a Div holding `children`.
    pub fn div(children: Vec<Element>) -> Self {
        Self {
            children,
            ..Self::of_kind(ElementKind::Div)
        }
    }

    pub fn area_break() -> Self {
        Self::of_kind(ElementKind::AreaBreak)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Append a child element.
    pub fn add(mut self, child: impl Into<Element>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn element_type(&self) -> ElementType {
        match &self.kind {
            ElementKind::Paragraph { .. } => ElementType::Paragraph,
            ElementKind::Image { .. } => ElementType::Image,
            ElementKind::Div => ElementType::Div,
            ElementKind::Table(_) => ElementType::Table,
            ElementKind::Cell { .. } => ElementType::Cell,
            ElementKind::AreaBreak => ElementType::AreaBreak,
        }
    }

    pub fn is_floated(&self) -> bool {
        self.properties.float_side() != FloatSide::None
    }

    pub fn is_area_break(&self) -> bool {
        matches!(self.kind, ElementKind::AreaBreak)
    }

    pub fn as_table(&self) -> Option<&TableModel> {
        match &self.kind {
            ElementKind::Table(model) => Some(model),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Paragraph { text } => Some(text),
            _ => None,
        }
    }

    /// Declared spans of a cell, clamped to at least 1.
    pub fn spans(&self) -> Option<(usize, usize)> {
        match self.kind {
            ElementKind::Cell { rowspan, colspan } => {
                Some((rowspan.max(1) as usize, colspan.max(1) as usize))
            }
            _ => None,
        }
    }

    pub fn strategy(&self) -> Option<&Arc<dyn LayoutStrategy>> {
        self.strategy.as_ref()
    }

    /// Replace the built-in layout strategy. A strategy built for another
    /// element type is refused and the built-in one stays in place.
    pub fn set_strategy(&mut self, strategy: Arc<dyn LayoutStrategy>) -> Result<(), QuireError> {
        let element = self.element_type();
        let capability = strategy.element_type();
        if capability != element {
            tracing::warn!(
                element = %element,
                strategy = %capability,
                id = ?self.id,
                "incompatible layout strategy ignored, keeping the default"
            );
            return Err(QuireError::IncompatibleStrategy {
                element,
                strategy: capability,
            });
        }
        self.strategy = Some(strategy);
        Ok(())
    }

    pub fn clear_strategy(&mut self) {
        self.strategy = None;
    }

    /// Reject invalid dimensions in this element and its subtree.
    pub fn validate(&self) -> Result<(), QuireError> {
        for (key, value) in self.properties.iter() {
            use crate::style::PropertyValue;
            match value {
                PropertyValue::Length(v) | PropertyValue::Number(v) => {
                    check_dimension(property_name(key), v)?
                }
                PropertyValue::Dimension(d) => d.validate(property_name(key))?,
                PropertyValue::Border(b) => check_dimension("border width", b.width)?,
                _ => {}
            }
        }
        match &self.kind {
            ElementKind::Image { width, height } => {
                check_dimension("image width", *width)?;
                check_dimension("image height", *height)?;
            }
            ElementKind::Table(model) => model.validate()?,
            _ => {}
        }
        self.children.iter().try_for_each(Element::validate)
    }

    /// A copy of this element with different children: same kind,
    /// properties, id and strategy.
    pub(crate) fn fragment(&self, children: Vec<Element>) -> Element {
        Element {
            kind: self.kind.clone(),
            properties: self.properties.clone(),
            children,
            id: self.id.clone(),
            strategy: self.strategy.clone(),
        }
    }

    /// The part of this element still to be placed after `consumed` points
    /// of its height went into a previous area.
    pub(crate) fn continuation(&self, children: Vec<Element>, consumed: f64) -> Element {
        let mut next = self.fragment(children);
        next.properties.reduce_heights(consumed);
        next
    }

    /// A copy with a different payload of the same element type.
    pub(crate) fn with_kind(&self, kind: ElementKind) -> Element {
        Element {
            kind,
            ..self.fragment(self.children.clone())
        }
    }
}

impl Styled for Element {
    fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }
}

fn property_name(key: crate::style::Property) -> &'static str {
    use crate::style::Property::*;
    match key {
        Width => "width",
        Height => "height",
        MinHeight => "min height",
        MaxHeight => "max height",
        MarginTop | MarginRight | MarginBottom | MarginLeft => "margin",
        PaddingTop | PaddingRight | PaddingBottom | PaddingLeft => "padding",
        FontSize => "font size",
        LineHeight => "line height",
        _ => "property",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Dimension;

    #[test]
    fn element_json_shape() {
        let json = r#"{
            "kind": {"type": "Paragraph", "text": "hello"},
            "properties": {"fontSize": {"length": 10}},
            "id": "p1"
        }"#;
        let el: Element = serde_json::from_str(json).unwrap();
        assert_eq!(el.element_type(), ElementType::Paragraph);
        assert_eq!(el.text(), Some("hello"));
        assert_eq!(el.id.as_deref(), Some("p1"));
    }

    #[test]
    fn cell_spans_default_to_one() {
        let el: Element = serde_json::from_str(r#"{"kind": {"type": "Cell"}}"#).unwrap();
        assert_eq!(el.spans(), Some((1, 1)));
        let el: Element =
            serde_json::from_str(r#"{"kind": {"type": "Cell", "rowspan": 0, "colspan": 3}}"#)
                .unwrap();
        assert_eq!(el.spans(), Some((1, 3)));
    }

    #[test]
    fn negative_image_is_rejected() {
        assert!(Element::image(-1.0, 10.0).is_err());
        assert!(Element::image(10.0, f64::NAN).is_err());
    }

    #[test]
    fn validate_walks_the_tree() {
        let doc = Document::new(vec![Element::div(vec![
            Element::paragraph("x").with_width(Dimension::Pt(-5.0))
        ])]);
        assert!(matches!(
            doc.validate(),
            Err(QuireError::InvalidDimension { what: "width", .. })
        ));
    }

    #[test]
    fn continuation_reduces_heights() {
        let el = Element::div(vec![]).with_min_height(100.0);
        let rest = el.continuation(vec![], 30.0);
        assert_eq!(
            rest.properties.get(crate::style::Property::MinHeight),
            Some(crate::style::PropertyValue::Dimension(Dimension::Pt(70.0)))
        );
    }

    #[test]
    fn page_defaults() {
        let config = PageConfig::default();
        assert!((config.margin.top - 36.0).abs() < 0.001);
        let (w, h) = config.size.dimensions();
        assert!((w - 595.28).abs() < 0.001);
        assert!((h - 841.89).abs() < 0.001);
    }
}
