//! # Floats
//!
//! Floated children are placed whole at the current flow position, anchored
//! to their side, before the siblings that follow them. Each placed float
//! narrows the band those siblings flow in until the flow passes its bottom.
//!
//! Placement is single-pass: content already laid out is never revisited
//! when a later float lands next to it.

use super::area::{LayoutArea, Rect};
use super::context::{LayoutContext, LayoutWarning};
use super::measure;
use super::result::LayoutResult;
use super::{dispatch, LayoutBox, EPSILON};
use crate::model::{Element, ElementKind};
use crate::style::{FloatSide, ResolvedStyle};

#[derive(Debug, Clone, Copy)]
struct PlacedFloat {
    side: FloatSide,
    rect: Rect,
}

/// The floats placed so far in one flow.
#[derive(Debug, Default)]
pub(crate) struct FloatManager {
    floats: Vec<PlacedFloat>,
}

impl FloatManager {
    /// Horizontal band `(x, width)` left free at flow position `y`.
    pub fn band_at(&self, y: f64, bounds: &Rect) -> (f64, f64) {
        let mut left = bounds.x;
        let mut right = bounds.right();
        for float in &self.floats {
            let overlaps = float.rect.y <= y + EPSILON && float.rect.bottom() > y + EPSILON;
            if !overlaps {
                continue;
            }
            match float.side {
                FloatSide::Right => right = right.min(float.rect.x),
                _ => left = left.max(float.rect.right()),
            }
        }
        (left, (right - left).max(0.0))
    }

    /// Where a `width` x `height` float goes at or below `y`, moving down
    /// past earlier floats until it fits the band. `None` when it does not
    /// fit the rest of the area.
    pub fn find_position(
        &self,
        side: FloatSide,
        width: f64,
        height: f64,
        y: f64,
        bounds: &Rect,
    ) -> Option<Rect> {
        let mut top = y;
        loop {
            let (band_x, band_width) = self.band_at(top, bounds);
            if width <= band_width + EPSILON {
                if top + height > bounds.bottom() + EPSILON {
                    return None;
                }
                let x = match side {
                    FloatSide::Right => band_x + band_width - width,
                    _ => band_x,
                };
                return Some(Rect::new(x, top, width, height));
            }
            top = self
                .floats
                .iter()
                .map(|f| f.rect.bottom())
                .filter(|bottom| *bottom > top + EPSILON)
                .fold(None, |acc: Option<f64>, b| Some(acc.map_or(b, |a| a.min(b))))?;
        }
    }

    pub fn add(&mut self, side: FloatSide, rect: Rect) {
        self.floats.push(PlacedFloat { side, rect });
    }

    /// Bottom of the lowest float.
    pub fn bottom(&self) -> Option<f64> {
        self.floats
            .iter()
            .map(|f| f.rect.bottom())
            .fold(None, |acc, b| Some(acc.map_or(b, |a: f64| a.max(b))))
    }
}

/// Place a floated element at flow position `y`. Returns `None` when the
/// float does not fit what is left of the area and must move to the next.
pub(crate) fn place_float(
    element: &Element,
    floats: &mut FloatManager,
    y: f64,
    area: &LayoutArea,
    parent: &ResolvedStyle,
    ctx: &mut LayoutContext<'_>,
) -> Option<LayoutBox> {
    let side = match element.properties.float_side() {
        FloatSide::Right => FloatSide::Right,
        _ => FloatSide::Left,
    };
    let style = ctx.resolve(element, Some(parent), area);

    // Explicit widths resolve against the full flow width; everything else
    // shrinks to its content.
    let (trial_width, outer_width) = match (&element.kind, style.width) {
        (ElementKind::Image { .. }, _) | (_, None) => {
            let preferred = measure::max_content_width(element, Some(parent), ctx);
            let minimum = measure::min_content_width(element, Some(parent), ctx);
            let w = preferred.min(area.bbox.width).max(minimum);
            (w, w)
        }
        (_, Some(w)) => (area.bbox.width, w + style.margin.horizontal()),
    };

    let checkpoint = ctx.checkpoint();
    let trial_area = LayoutArea::new(
        area.page,
        Rect::new(area.bbox.x, y, trial_width, f64::INFINITY),
    );
    let mut placed = match dispatch::layout(element, &trial_area, Some(parent), ctx) {
        LayoutResult::Full { placed, .. } => placed,
        LayoutResult::Partial { mut placed, .. } => {
            tracing::debug!(
                element = %element.element_type(),
                id = ?element.id,
                "area break inside a float, content after it is dropped"
            );
            ctx.warn(LayoutWarning::clipped(element, area.page));
            placed.clipped = true;
            placed
        }
        LayoutResult::Nothing { .. } => {
            ctx.rollback(checkpoint);
            return None;
        }
    };
    let outer_height = placed.height + style.margin.vertical();
    let origin_x = placed.x - style.margin.left;

    let rect = match floats.find_position(side, outer_width, outer_height, y, &area.bbox) {
        Some(rect) => rect,
        None if ctx.is_forced() => {
            let x = match side {
                FloatSide::Right => area.bbox.right() - outer_width,
                _ => area.bbox.x,
            };
            let visible = (area.bbox.bottom() - y).max(0.0);
            if outer_height > visible + EPSILON {
                ctx.warn(LayoutWarning::clipped(element, area.page));
                placed.height = (visible - style.margin.vertical()).max(0.0);
                placed.clipped = true;
            }
            Rect::new(x, y, outer_width, outer_height.min(visible))
        }
        None => {
            ctx.rollback(checkpoint);
            return None;
        }
    };

    placed.translate(rect.x - origin_x, rect.y - y);
    floats.add(side, rect);
    Some(placed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Defaults, Dimension, Styled};
    use crate::text::FixedAdvanceMeasurer;

    fn bounds() -> Rect {
        Rect::new(0.0, 0.0, 300.0, 200.0)
    }

    #[test]
    fn band_narrows_while_overlapping() {
        let mut floats = FloatManager::default();
        floats.add(FloatSide::Left, Rect::new(0.0, 0.0, 100.0, 50.0));
        floats.add(FloatSide::Right, Rect::new(250.0, 0.0, 50.0, 80.0));
        let (x, w) = floats.band_at(10.0, &bounds());
        assert!((x - 100.0).abs() < 0.001);
        assert!((w - 150.0).abs() < 0.001);
        let (x, w) = floats.band_at(60.0, &bounds());
        assert!(x.abs() < 0.001);
        assert!((w - 250.0).abs() < 0.001);
        let (_, w) = floats.band_at(80.0, &bounds());
        assert!((w - 300.0).abs() < 0.001);
    }

    #[test]
    fn floats_stack_side_by_side() {
        let mut floats = FloatManager::default();
        floats.add(FloatSide::Left, Rect::new(0.0, 0.0, 100.0, 50.0));
        let rect = floats
            .find_position(FloatSide::Left, 100.0, 30.0, 0.0, &bounds())
            .unwrap();
        assert!((rect.x - 100.0).abs() < 0.001);
        assert!(rect.y.abs() < 0.001);
    }

    #[test]
    fn too_wide_moves_below() {
        let mut floats = FloatManager::default();
        floats.add(FloatSide::Left, Rect::new(0.0, 0.0, 250.0, 50.0));
        let rect = floats
            .find_position(FloatSide::Right, 100.0, 30.0, 0.0, &bounds())
            .unwrap();
        assert!((rect.y - 50.0).abs() < 0.001);
        assert!((rect.x - 200.0).abs() < 0.001);
    }

    #[test]
    fn too_tall_has_no_position() {
        let floats = FloatManager::default();
        assert!(floats
            .find_position(FloatSide::Left, 10.0, 30.0, 180.0, &bounds())
            .is_none());
    }

    #[test]
    fn place_float_defers_and_rolls_back() {
        let defaults = Defaults::default();
        let measurer = FixedAdvanceMeasurer::default();
        let mut ctx = LayoutContext::new(&defaults, &measurer);
        let parent = ResolvedStyle::resolve(
            &Default::default(),
            crate::model::ElementType::Div,
            None,
            &defaults,
            300.0,
            200.0,
        );
        let area = LayoutArea::new(1, bounds());
        let mut floats = FloatManager::default();
        let div = Element::div(vec![])
            .with_width(Dimension::Pt(80.0))
            .with_height(150.0)
            .with_float(FloatSide::Left);

        let placed = place_float(&div, &mut floats, 0.0, &area, &parent, &mut ctx).unwrap();
        assert!((placed.width - 80.0).abs() < 0.001);
        assert!(place_float(&div, &mut floats, 100.0, &area, &parent, &mut ctx).is_none());
        assert!(ctx.warnings().is_empty());
    }

    #[test]
    fn area_break_in_a_float_clips_the_rest() {
        let defaults = Defaults::default();
        let measurer = FixedAdvanceMeasurer::default();
        let mut ctx = LayoutContext::new(&defaults, &measurer);
        let parent = ResolvedStyle::resolve(
            &Default::default(),
            crate::model::ElementType::Div,
            None,
            &defaults,
            300.0,
            200.0,
        );
        let area = LayoutArea::new(1, bounds());
        let mut floats = FloatManager::default();
        let div = Element::div(vec![
            Element::paragraph("kept"),
            Element::area_break(),
            Element::paragraph("dropped"),
        ])
        .with_width(Dimension::Pt(80.0))
        .with_float(FloatSide::Right);

        let placed = place_float(&div, &mut floats, 0.0, &area, &parent, &mut ctx).unwrap();
        assert!(placed.clipped);
        assert_eq!(placed.children.len(), 1);
        assert!(matches!(
            ctx.warnings(),
            [LayoutWarning::ElementClipped { page: 1, .. }]
        ));
    }
}
