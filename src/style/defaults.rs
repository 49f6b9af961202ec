//! Immutable default configuration, threaded through every resolution.

use super::{Border, Color, Property, PropertyValue, TableLayout};
use crate::model::ElementType;
use serde::{Deserialize, Serialize};

/// Per-document defaults: the last link of every property lookup chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Defaults {
    /// Base font size in points.
    pub font_size: f64,
    /// Line height as a multiple of the font size.
    pub line_height: f64,
    /// Border drawn around cells that set none.
    pub cell_border: Border,
    /// Padding on every side of cells that set none.
    pub cell_padding: f64,
    pub table_layout: TableLayout,
    /// The document driver fails after this many pages.
    pub max_pages: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            line_height: 1.2,
            cell_border: Border::solid(0.5, Color::rgb8(160, 160, 160)),
            cell_padding: 2.0,
            table_layout: TableLayout::Auto,
            max_pages: 10_000,
        }
    }
}

impl Defaults {
    /// The default value of `key` for an element of type `kind`.
    pub fn lookup(&self, kind: ElementType, key: Property) -> Option<PropertyValue> {
        match (kind, key) {
            (_, Property::FontSize) => Some(PropertyValue::Length(self.font_size)),
            (_, Property::LineHeight) => Some(PropertyValue::Number(self.line_height)),
            (ElementType::Cell, Property::Border) => Some(PropertyValue::Border(self.cell_border)),
            (
                ElementType::Cell,
                Property::PaddingTop
                | Property::PaddingRight
                | Property::PaddingBottom
                | Property::PaddingLeft,
            ) => Some(PropertyValue::Length(self.cell_padding)),
            (ElementType::Table, Property::TableLayout) => {
                Some(PropertyValue::TableLayout(self.table_layout))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_deserialize_partially() {
        let d: Defaults = serde_json::from_str(r#"{"fontSize": 10, "maxPages": 3}"#).unwrap();
        assert!((d.font_size - 10.0).abs() < 0.001);
        assert_eq!(d.max_pages, 3);
        assert!((d.cell_padding - 2.0).abs() < 0.001);
    }

    #[test]
    fn table_layout_default_only_for_tables() {
        let d = Defaults::default();
        assert!(d.lookup(ElementType::Table, Property::TableLayout).is_some());
        assert!(d.lookup(ElementType::Div, Property::TableLayout).is_none());
        assert!(d.lookup(ElementType::Div, Property::Border).is_none());
    }
}
