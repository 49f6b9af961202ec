//! # Renderer Dispatch
//!
//! Every element type maps to one built-in layout strategy. An element can
//! carry a custom strategy instead; it is checked against the element type
//! when it is assigned (see [`Element::set_strategy`]), so by the time layout
//! runs the override is known to be compatible.

use std::fmt;

use super::area::LayoutArea;
use super::context::LayoutContext;
use super::result::LayoutResult;
use super::{block, leaf, table};
use crate::model::{Element, ElementKind, ElementType};
use crate::style::ResolvedStyle;

/// Lays out elements of one type into an area.
///
/// Implementations must honor the same contract as the built-in strategies:
/// a NOTHING result consumes no space, and split and overflow elements are
/// fresh copies.
pub trait LayoutStrategy: fmt::Debug + Send + Sync {
    /// The element type this strategy can lay out.
    fn element_type(&self) -> ElementType;

    fn layout(
        &self,
        element: &Element,
        area: &LayoutArea,
        parent: Option<&ResolvedStyle>,
        ctx: &mut LayoutContext<'_>,
    ) -> LayoutResult;
}

/// The closed set of built-in strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinStrategy {
    Paragraph,
    Image,
    Div,
    Table,
    Cell,
    AreaBreak,
}

impl BuiltinStrategy {
    pub fn for_element(element: &Element) -> Self {
        match element.element_type() {
            ElementType::Paragraph => BuiltinStrategy::Paragraph,
            ElementType::Image => BuiltinStrategy::Image,
            ElementType::Div => BuiltinStrategy::Div,
            ElementType::Table => BuiltinStrategy::Table,
            ElementType::Cell => BuiltinStrategy::Cell,
            ElementType::AreaBreak => BuiltinStrategy::AreaBreak,
        }
    }
}

impl LayoutStrategy for BuiltinStrategy {
    fn element_type(&self) -> ElementType {
        match self {
            BuiltinStrategy::Paragraph => ElementType::Paragraph,
            BuiltinStrategy::Image => ElementType::Image,
            BuiltinStrategy::Div => ElementType::Div,
            BuiltinStrategy::Table => ElementType::Table,
            BuiltinStrategy::Cell => ElementType::Cell,
            BuiltinStrategy::AreaBreak => ElementType::AreaBreak,
        }
    }

    fn layout(
        &self,
        element: &Element,
        area: &LayoutArea,
        parent: Option<&ResolvedStyle>,
        ctx: &mut LayoutContext<'_>,
    ) -> LayoutResult {
        match &element.kind {
            ElementKind::Paragraph { text } => leaf::layout_paragraph(element, text, area, parent, ctx),
            ElementKind::Image { width, height } => {
                leaf::layout_image(element, (*width, *height), area, parent, ctx)
            }
            ElementKind::Div => block::layout_div(element, area, parent, ctx),
            ElementKind::Cell { .. } => block::layout_cell(element, area, parent, ctx),
            ElementKind::Table(model) => table::layout_table(element, model, area, parent, ctx),
            ElementKind::AreaBreak => leaf::layout_area_break(element, area),
        }
    }
}

/// Lay out `element` into `area` with its strategy.
///
/// Warnings raised by an attempt that places nothing are dropped with it.
pub fn layout(
    element: &Element,
    area: &LayoutArea,
    parent: Option<&ResolvedStyle>,
    ctx: &mut LayoutContext<'_>,
) -> LayoutResult {
    let checkpoint = ctx.checkpoint();
    let result = match element.strategy() {
        Some(strategy) => strategy.layout(element, area, parent, ctx),
        None => BuiltinStrategy::for_element(element).layout(element, area, parent, ctx),
    };
    if result.is_nothing() {
        ctx.rollback(checkpoint);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuireError;
    use crate::layout::area::{OccupiedArea, Rect};
    use crate::layout::LayoutBox;
    use crate::style::Defaults;
    use crate::text::FixedAdvanceMeasurer;
    use std::sync::Arc;

    /// Places every paragraph as a fixed 10pt tall box.
    #[derive(Debug)]
    struct Stamp;

    impl LayoutStrategy for Stamp {
        fn element_type(&self) -> ElementType {
            ElementType::Paragraph
        }

        fn layout(
            &self,
            element: &Element,
            area: &LayoutArea,
            _parent: Option<&ResolvedStyle>,
            _ctx: &mut LayoutContext<'_>,
        ) -> LayoutResult {
            let rect = Rect::new(area.bbox.x, area.bbox.y, area.bbox.width, 10.0);
            LayoutResult::Full {
                occupied: OccupiedArea::new(area.page, rect),
                placed: LayoutBox::new(element, rect),
            }
        }
    }

    fn run(element: &Element) -> LayoutResult {
        let defaults = Defaults::default();
        let measurer = FixedAdvanceMeasurer::default();
        let mut ctx = LayoutContext::new(&defaults, &measurer);
        let area = LayoutArea::new(1, Rect::new(0.0, 0.0, 200.0, 100.0));
        layout(element, &area, None, &mut ctx)
    }

    #[test]
    fn builtin_matches_element_type() {
        for element in [
            Element::paragraph("x"),
            Element::div(vec![]),
            Element::area_break(),
        ] {
            let strategy = BuiltinStrategy::for_element(&element);
            assert_eq!(strategy.element_type(), element.element_type());
        }
    }

    #[test]
    fn custom_strategy_replaces_builtin() {
        let mut p = Element::paragraph("one\ntwo\nthree");
        p.set_strategy(Arc::new(Stamp)).unwrap();
        let result = run(&p);
        assert!((result.occupied_height() - 10.0).abs() < 0.001);
    }

    #[test]
    fn incompatible_strategy_keeps_default() {
        let mut div = Element::div(vec![Element::paragraph("a")]);
        let err = div.set_strategy(Arc::new(Stamp)).unwrap_err();
        assert!(matches!(err, QuireError::IncompatibleStrategy { .. }));
        assert!(div.strategy().is_none());
        let result = run(&div);
        assert!(result.is_full());
        assert_eq!(result.placed().unwrap().children.len(), 1);
    }

    #[test]
    fn nothing_rolls_back_warnings() {
        let defaults = Defaults::default();
        let measurer = FixedAdvanceMeasurer::default();
        let mut ctx = LayoutContext::new(&defaults, &measurer);
        let area = LayoutArea::new(1, Rect::new(0.0, 0.0, 200.0, 5.0));
        let result = layout(&Element::paragraph("too tall"), &area, None, &mut ctx);
        assert!(result.is_nothing());
        assert!(ctx.warnings().is_empty());
    }
}
