use super::{Element, ElementKind};
use crate::style::{Properties, Styled};

/// Builder for a table cell.
///
/// Spans below 1 are raised to 1. The grid position and the colspan clamp
/// are assigned later, when the table's grid is built.
#[derive(Debug, Clone)]
pub struct Cell {
    element: Element,
}

impl Cell {
    pub fn new(rowspan: u32, colspan: u32) -> Self {
        Self {
            element: Element::of_kind(ElementKind::Cell {
                rowspan: rowspan.max(1),
                colspan: colspan.max(1),
            }),
        }
    }

    /// Append content to the cell.
    pub fn add(mut self, child: impl Into<Element>) -> Self {
        self.element.children.push(child.into());
        self
    }

    /// Append a paragraph of text.
    pub fn add_text(self, text: impl Into<String>) -> Self {
        self.add(Element::paragraph(text))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.element.id = Some(id.into());
        self
    }

    pub fn rowspan(&self) -> u32 {
        match self.element.kind {
            ElementKind::Cell { rowspan, .. } => rowspan,
            _ => 1,
        }
    }

    pub fn colspan(&self) -> u32 {
        match self.element.kind {
            ElementKind::Cell { colspan, .. } => colspan,
            _ => 1,
        }
    }

    pub fn into_element(self) -> Element {
        self.element
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::new(1, 1)
    }
}

impl Styled for Cell {
    fn properties_mut(&mut self) -> &mut Properties {
        &mut self.element.properties
    }
}

impl From<Cell> for Element {
    fn from(cell: Cell) -> Self {
        cell.element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ElementType;

    #[test]
    fn spans_are_at_least_one() {
        let cell = Cell::new(0, 0);
        assert_eq!(cell.rowspan(), 1);
        assert_eq!(cell.colspan(), 1);
    }

    #[test]
    fn builder_produces_cell_element() {
        let el: Element = Cell::new(2, 1)
            .add_text("a")
            .with_keep_together(true)
            .with_height(40.0)
            .into();
        assert_eq!(el.element_type(), ElementType::Cell);
        assert_eq!(el.spans(), Some((2, 1)));
        assert_eq!(el.children.len(), 1);
        assert!(el.properties.keep_together());
    }
}
