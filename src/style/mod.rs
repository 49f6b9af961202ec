//! # Property System
//!
//! Every element carries a property map over a closed key set. Lookups fall
//! back along a fixed chain: the element's own value, then the parent's
//! resolved value (inherited keys only), then the per-element-type default
//! supplied by [`Defaults`].
//!
//! Layout never reads the raw map. Each layout call resolves the map once
//! into a [`ResolvedStyle`] with every value concrete, so the resolved value
//! of a key is stable for the whole pass over a node.

pub mod defaults;

pub use defaults::Defaults;

use crate::model::{Edges, ElementType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The closed set of property keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Property {
    // ── Box Model ──────────────────────────────────────────────
    Width,
    Height,
    MinHeight,
    MaxHeight,
    MarginTop,
    MarginRight,
    MarginBottom,
    MarginLeft,
    PaddingTop,
    PaddingRight,
    PaddingBottom,
    PaddingLeft,

    // ── Border ─────────────────────────────────────────────────
    Border,
    BorderTop,
    BorderRight,
    BorderBottom,
    BorderLeft,

    // ── Placement ──────────────────────────────────────────────
    Float,
    KeepTogether,
    HorizontalAlignment,
    VerticalAlignment,
    TableLayout,

    // ── Typography & Color ─────────────────────────────────────
    FontSize,
    LineHeight,
    BackgroundColor,
}

impl Property {
    /// Whether an unset value is taken from the parent element.
    pub fn is_inherited(self) -> bool {
        matches!(
            self,
            Property::FontSize | Property::LineHeight | Property::HorizontalAlignment
        )
    }
}

/// A typed property value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyValue {
    /// A length in points (margins, paddings, font size).
    Length(f64),
    /// A unitless number (line-height ratio).
    Number(f64),
    Dimension(Dimension),
    Border(Border),
    Flag(bool),
    Float(FloatSide),
    HorizontalAlignment(HorizontalAlignment),
    VerticalAlignment(VerticalAlignment),
    TableLayout(TableLayout),
    Color(Color),
}

impl PropertyValue {
    pub fn as_length(self) -> Option<f64> {
        match self {
            PropertyValue::Length(v) | PropertyValue::Number(v) => Some(v),
            PropertyValue::Dimension(Dimension::Pt(v)) => Some(v),
            _ => None,
        }
    }

    pub fn as_dimension(self) -> Option<Dimension> {
        match self {
            PropertyValue::Dimension(d) => Some(d),
            PropertyValue::Length(v) => Some(Dimension::Pt(v)),
            _ => None,
        }
    }

    pub fn as_border(self) -> Option<Border> {
        match self {
            PropertyValue::Border(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_flag(self) -> Option<bool> {
        match self {
            PropertyValue::Flag(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_float_side(self) -> Option<FloatSide> {
        match self {
            PropertyValue::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_horizontal_alignment(self) -> Option<HorizontalAlignment> {
        match self {
            PropertyValue::HorizontalAlignment(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_vertical_alignment(self) -> Option<VerticalAlignment> {
        match self {
            PropertyValue::VerticalAlignment(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_table_layout(self) -> Option<TableLayout> {
        match self {
            PropertyValue::TableLayout(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_color(self) -> Option<Color> {
        match self {
            PropertyValue::Color(c) => Some(c),
            _ => None,
        }
    }
}

/// The property map owned by every element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<Property, PropertyValue>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: Property) -> Option<PropertyValue> {
        self.0.get(&key).copied()
    }

    pub fn set(&mut self, key: Property, value: PropertyValue) {
        self.0.insert(key, value);
    }

    pub fn remove(&mut self, key: Property) -> Option<PropertyValue> {
        self.0.remove(&key)
    }

    pub fn contains(&self, key: Property) -> bool {
        self.0.contains_key(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Property, PropertyValue)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// The float side, read without resolution: FLOAT is neither inherited
    /// nor defaulted.
    pub fn float_side(&self) -> FloatSide {
        self.get(Property::Float)
            .and_then(PropertyValue::as_float_side)
            .unwrap_or_default()
    }

    pub fn keep_together(&self) -> bool {
        self.get(Property::KeepTogether)
            .and_then(PropertyValue::as_flag)
            .unwrap_or(false)
    }

    /// Reduce fixed heights by the height already placed in a previous area.
    /// Heights that drop to zero are removed.
    pub(crate) fn reduce_heights(&mut self, consumed: f64) {
        for key in [Property::Height, Property::MinHeight, Property::MaxHeight] {
            if let Some(PropertyValue::Dimension(Dimension::Pt(h))) = self.get(key) {
                let rest = h - consumed;
                if rest > 0.0 {
                    self.set(key, PropertyValue::Dimension(Dimension::Pt(rest)));
                } else {
                    self.remove(key);
                }
            }
        }
    }
}

/// Fluent property setters shared by elements and their builders.
pub trait Styled: Sized {
    fn properties_mut(&mut self) -> &mut Properties;

    fn with_property(mut self, key: Property, value: PropertyValue) -> Self {
        self.properties_mut().set(key, value);
        self
    }

    fn with_width(self, width: Dimension) -> Self {
        self.with_property(Property::Width, PropertyValue::Dimension(width))
    }

    fn with_height(self, height: f64) -> Self {
        self.with_property(Property::Height, PropertyValue::Dimension(Dimension::Pt(height)))
    }

    fn with_min_height(self, height: f64) -> Self {
        self.with_property(Property::MinHeight, PropertyValue::Dimension(Dimension::Pt(height)))
    }

    fn with_max_height(self, height: f64) -> Self {
        self.with_property(Property::MaxHeight, PropertyValue::Dimension(Dimension::Pt(height)))
    }

    fn with_margins(mut self, margin: Edges) -> Self {
        let props = self.properties_mut();
        props.set(Property::MarginTop, PropertyValue::Length(margin.top));
        props.set(Property::MarginRight, PropertyValue::Length(margin.right));
        props.set(Property::MarginBottom, PropertyValue::Length(margin.bottom));
        props.set(Property::MarginLeft, PropertyValue::Length(margin.left));
        self
    }

    fn with_margin(self, margin: f64) -> Self {
        self.with_margins(Edges::uniform(margin))
    }

    fn with_paddings(mut self, padding: Edges) -> Self {
        let props = self.properties_mut();
        props.set(Property::PaddingTop, PropertyValue::Length(padding.top));
        props.set(Property::PaddingRight, PropertyValue::Length(padding.right));
        props.set(Property::PaddingBottom, PropertyValue::Length(padding.bottom));
        props.set(Property::PaddingLeft, PropertyValue::Length(padding.left));
        self
    }

    fn with_padding(self, padding: f64) -> Self {
        self.with_paddings(Edges::uniform(padding))
    }

    /// Set the border on all four sides. Per-side keys already set still win.
    fn with_border(self, border: Border) -> Self {
        self.with_property(Property::Border, PropertyValue::Border(border))
    }

    fn with_border_top(self, border: Border) -> Self {
        self.with_property(Property::BorderTop, PropertyValue::Border(border))
    }

    fn with_border_right(self, border: Border) -> Self {
        self.with_property(Property::BorderRight, PropertyValue::Border(border))
    }

    fn with_border_bottom(self, border: Border) -> Self {
        self.with_property(Property::BorderBottom, PropertyValue::Border(border))
    }

    fn with_border_left(self, border: Border) -> Self {
        self.with_property(Property::BorderLeft, PropertyValue::Border(border))
    }

    fn with_float(self, side: FloatSide) -> Self {
        self.with_property(Property::Float, PropertyValue::Float(side))
    }

    fn with_keep_together(self, keep: bool) -> Self {
        self.with_property(Property::KeepTogether, PropertyValue::Flag(keep))
    }

    fn with_horizontal_alignment(self, alignment: HorizontalAlignment) -> Self {
        self.with_property(
            Property::HorizontalAlignment,
            PropertyValue::HorizontalAlignment(alignment),
        )
    }

    fn with_vertical_alignment(self, alignment: VerticalAlignment) -> Self {
        self.with_property(
            Property::VerticalAlignment,
            PropertyValue::VerticalAlignment(alignment),
        )
    }

    fn with_font_size(self, size: f64) -> Self {
        self.with_property(Property::FontSize, PropertyValue::Length(size))
    }

    fn with_line_height(self, ratio: f64) -> Self {
        self.with_property(Property::LineHeight, PropertyValue::Number(ratio))
    }

    fn with_background_color(self, color: Color) -> Self {
        self.with_property(Property::BackgroundColor, PropertyValue::Color(color))
    }
}

/// A dimension that can be points, percentage, or auto.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Dimension {
    /// Fixed size in points (1/72 inch).
    Pt(f64),
    /// Percentage of the containing area's corresponding dimension.
    Percent(f64),
    /// Size determined by content.
    Auto,
}

impl Dimension {
    /// Resolve this dimension given a parent size.
    /// Returns None for Auto, and for percentages of an unbounded parent.
    pub fn resolve(&self, parent_size: f64) -> Option<f64> {
        match self {
            Dimension::Pt(v) => Some(*v),
            Dimension::Percent(p) if parent_size.is_finite() => Some(parent_size * p / 100.0),
            Dimension::Percent(_) | Dimension::Auto => None,
        }
    }

    pub(crate) fn validate(&self, what: &'static str) -> Result<(), crate::error::QuireError> {
        match self {
            Dimension::Pt(v) | Dimension::Percent(v) => crate::error::check_dimension(what, *v),
            Dimension::Auto => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloatSide {
    #[default]
    None,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl HorizontalAlignment {
    /// Offset of a box placed in `free` points of spare width.
    pub fn offset(self, free: f64) -> f64 {
        let free = free.max(0.0);
        match self {
            HorizontalAlignment::Left => 0.0,
            HorizontalAlignment::Center => free / 2.0,
            HorizontalAlignment::Right => free,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalAlignment {
    #[default]
    Top,
    Middle,
    Bottom,
}

impl VerticalAlignment {
    pub fn offset(self, free: f64) -> f64 {
        let free = free.max(0.0);
        match self {
            VerticalAlignment::Top => 0.0,
            VerticalAlignment::Middle => free / 2.0,
            VerticalAlignment::Bottom => free,
        }
    }
}

/// Column width algorithm for tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableLayout {
    /// Automatic columns share width by sampled content width.
    #[default]
    Auto,
    /// Automatic columns share width evenly; content is not sampled.
    Fixed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BorderStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// A border line. A zero-width border draws nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Border {
    pub width: f64,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub style: BorderStyle,
}

impl Border {
    pub const NONE: Border = Border {
        width: 0.0,
        color: Color::BLACK,
        style: BorderStyle::Solid,
    };

    pub fn solid(width: f64, color: Color) -> Self {
        Self {
            width,
            color,
            style: BorderStyle::Solid,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.width > 0.0
    }
}

impl Default for Border {
    fn default() -> Self {
        Border::NONE
    }
}

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
    }

    pub fn hex(hex: &str) -> Self {
        let hex = hex.trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0);
        match hex.len() {
            3 => Self::rgb8(
                channel(&hex[0..1].repeat(2)),
                channel(&hex[1..2].repeat(2)),
                channel(&hex[2..3].repeat(2)),
            ),
            6 => Self::rgb8(channel(&hex[0..2]), channel(&hex[2..4]), channel(&hex[4..6])),
            _ => Color::BLACK,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Values for each edge (top, right, bottom, left).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeValues<T: Copy> {
    pub top: T,
    pub right: T,
    pub bottom: T,
    pub left: T,
}

impl<T: Copy> EdgeValues<T> {
    pub fn uniform(v: T) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }
}

impl EdgeValues<Border> {
    pub fn widths(&self) -> Edges {
        Edges {
            top: self.top.width,
            right: self.right.width,
            bottom: self.bottom.width,
            left: self.left.width,
        }
    }
}

/// Resolved style: every value concrete. This is what layout works with.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    // Box model
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub min_height: f64,
    pub max_height: Option<f64>,
    pub margin: Edges,
    pub padding: Edges,
    pub border: EdgeValues<Border>,

    // Placement
    pub float: FloatSide,
    pub keep_together: bool,
    pub horizontal_alignment: HorizontalAlignment,
    pub vertical_alignment: VerticalAlignment,
    pub table_layout: TableLayout,

    // Text & visual
    pub font_size: f64,
    pub line_height: f64,
    pub background_color: Option<Color>,
}

/// One element's view of the fallback chain.
pub struct PropertyResolver<'a> {
    properties: &'a Properties,
    kind: ElementType,
    parent: Option<&'a ResolvedStyle>,
    defaults: &'a Defaults,
}

impl<'a> PropertyResolver<'a> {
    pub fn new(
        properties: &'a Properties,
        kind: ElementType,
        parent: Option<&'a ResolvedStyle>,
        defaults: &'a Defaults,
    ) -> Self {
        Self {
            properties,
            kind,
            parent,
            defaults,
        }
    }

    /// Own value, then the parent's (inherited keys only), then the type default.
    pub fn get(&self, key: Property) -> Option<PropertyValue> {
        self.properties
            .get(key)
            .or_else(|| {
                if key.is_inherited() {
                    self.parent.and_then(|p| p.inherited(key))
                } else {
                    None
                }
            })
            .or_else(|| self.defaults.lookup(self.kind, key))
    }

    /// A side border: the side key beats BORDER at each level of the chain.
    fn border(&self, side: Property) -> Border {
        self.properties
            .get(side)
            .or_else(|| self.properties.get(Property::Border))
            .or_else(|| self.defaults.lookup(self.kind, side))
            .or_else(|| self.defaults.lookup(self.kind, Property::Border))
            .and_then(PropertyValue::as_border)
            .unwrap_or(Border::NONE)
    }

    fn length(&self, key: Property) -> f64 {
        self.get(key).and_then(PropertyValue::as_length).unwrap_or(0.0)
    }

    fn dimension(&self, key: Property, parent_size: f64) -> Option<f64> {
        self.get(key)
            .and_then(PropertyValue::as_dimension)
            .and_then(|d| d.resolve(parent_size))
    }

    pub fn resolve(&self, available_width: f64, available_height: f64) -> ResolvedStyle {
        ResolvedStyle {
            width: self.dimension(Property::Width, available_width),
            height: self.dimension(Property::Height, available_height),
            min_height: self
                .dimension(Property::MinHeight, available_height)
                .unwrap_or(0.0),
            max_height: self.dimension(Property::MaxHeight, available_height),
            margin: Edges {
                top: self.length(Property::MarginTop),
                right: self.length(Property::MarginRight),
                bottom: self.length(Property::MarginBottom),
                left: self.length(Property::MarginLeft),
            },
            padding: Edges {
                top: self.length(Property::PaddingTop),
                right: self.length(Property::PaddingRight),
                bottom: self.length(Property::PaddingBottom),
                left: self.length(Property::PaddingLeft),
            },
            border: EdgeValues {
                top: self.border(Property::BorderTop),
                right: self.border(Property::BorderRight),
                bottom: self.border(Property::BorderBottom),
                left: self.border(Property::BorderLeft),
            },

            float: self
                .get(Property::Float)
                .and_then(PropertyValue::as_float_side)
                .unwrap_or_default(),
            keep_together: self
                .get(Property::KeepTogether)
                .and_then(PropertyValue::as_flag)
                .unwrap_or(false),
            horizontal_alignment: self
                .get(Property::HorizontalAlignment)
                .and_then(PropertyValue::as_horizontal_alignment)
                .unwrap_or_default(),
            vertical_alignment: self
                .get(Property::VerticalAlignment)
                .and_then(PropertyValue::as_vertical_alignment)
                .unwrap_or_default(),
            table_layout: self
                .get(Property::TableLayout)
                .and_then(PropertyValue::as_table_layout)
                .unwrap_or_default(),

            font_size: self
                .get(Property::FontSize)
                .and_then(PropertyValue::as_length)
                .unwrap_or(self.defaults.font_size),
            line_height: self
                .get(Property::LineHeight)
                .and_then(PropertyValue::as_length)
                .unwrap_or(self.defaults.line_height),
            background_color: self
                .get(Property::BackgroundColor)
                .and_then(PropertyValue::as_color),
        }
    }
}

impl ResolvedStyle {
    /// Resolve an element's properties against its parent and the area it is
    /// being laid out into.
    pub fn resolve(
        properties: &Properties,
        kind: ElementType,
        parent: Option<&ResolvedStyle>,
        defaults: &Defaults,
        available_width: f64,
        available_height: f64,
    ) -> Self {
        PropertyResolver::new(properties, kind, parent, defaults)
            .resolve(available_width, available_height)
    }

    /// The value a child inherits for an inherited key.
    pub fn inherited(&self, key: Property) -> Option<PropertyValue> {
        match key {
            Property::FontSize => Some(PropertyValue::Length(self.font_size)),
            Property::LineHeight => Some(PropertyValue::Number(self.line_height)),
            Property::HorizontalAlignment => {
                Some(PropertyValue::HorizontalAlignment(self.horizontal_alignment))
            }
            _ => None,
        }
    }

    pub fn border_widths(&self) -> Edges {
        self.border.widths()
    }

    /// Horizontal space taken by border and padding.
    pub fn decoration_horizontal(&self) -> f64 {
        self.border_widths().horizontal() + self.padding.horizontal()
    }

    /// Vertical space taken by border and padding.
    pub fn decoration_vertical(&self) -> f64 {
        self.border_widths().vertical() + self.padding.vertical()
    }

    /// The hard cap on the border-box height: HEIGHT if set, else MAX_HEIGHT.
    pub fn height_cap(&self) -> Option<f64> {
        match (self.height, self.max_height) {
            (Some(h), Some(max)) => Some(h.min(max)),
            (Some(h), None) => Some(h),
            (None, max) => max,
        }
    }

    /// Border-box height for content of the given height, before capping.
    pub fn stretched_height(&self, content: f64) -> f64 {
        let natural = content + self.decoration_vertical();
        natural.max(self.min_height).max(self.height.unwrap_or(0.0))
    }

    pub fn line_advance(&self) -> f64 {
        self.font_size * self.line_height
    }
}
