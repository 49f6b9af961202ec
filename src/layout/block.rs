//! Block containers: Div and the content of a Cell.
//!
//! Children are stacked top to bottom. Floated children go through the
//! [`FloatManager`] and narrow the band later siblings flow in. When a child
//! only partly fits, the container splits: the placed children become the
//! split element, the rest the overflow.

use super::area::{LayoutArea, OccupiedArea, Rect};
use super::context::{LayoutContext, LayoutWarning};
use super::dispatch;
use super::float::{place_float, FloatManager};
use super::result::{LayoutResult, NothingCause, NothingReason};
use super::{LayoutBox, EPSILON};
use crate::model::{Edges, Element};
use crate::style::{HorizontalAlignment, ResolvedStyle};

/// Geometry of one box inside the area it is laid out into.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BoxFrame {
    page: usize,
    area: Rect,
    margin: Edges,
    pub x: f64,
    pub y: f64,
    /// Border-box width.
    pub width: f64,
    /// Border-box height the area leaves after margins. Negative when the
    /// margins alone do not fit.
    pub avail_height: f64,
    pub inner_x: f64,
    pub inner_y: f64,
    pub inner_width: f64,
}

impl BoxFrame {
    pub fn new(style: &ResolvedStyle, area: &LayoutArea, width: f64) -> Self {
        let border = style.border_widths();
        let x = area.bbox.x + style.margin.left;
        let y = area.bbox.y + style.margin.top;
        Self {
            page: area.page,
            area: area.bbox,
            margin: style.margin,
            x,
            y,
            width,
            avail_height: area.bbox.height - style.margin.vertical(),
            inner_x: x + border.left + style.padding.left,
            inner_y: y + border.top + style.padding.top,
            inner_width: (width - style.decoration_horizontal()).max(0.0),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Shift the box horizontally inside `avail_width` of spare room.
    pub fn aligned(mut self, alignment: HorizontalAlignment, avail_width: f64) -> Self {
        let dx = alignment.offset(avail_width - self.width);
        self.x += dx;
        self.inner_x += dx;
        self
    }

    /// Content height available inside border and padding.
    pub fn inner_height(&self, style: &ResolvedStyle) -> f64 {
        self.avail_height - style.decoration_vertical()
    }

    /// Content area for the children, `height` tall.
    pub fn content_area(&self, height: f64) -> LayoutArea {
        LayoutArea::new(
            self.page,
            Rect::new(self.inner_x, self.inner_y, self.inner_width, height),
        )
    }

    pub fn make_box(&self, element: &Element, style: &ResolvedStyle, height: f64) -> LayoutBox {
        LayoutBox::new(element, Rect::new(self.x, self.y, self.width, height)).styled(style)
    }

    fn occupied(&self, placed: &LayoutBox) -> OccupiedArea {
        let height = (placed.height + self.margin.vertical()).min(self.area.height.max(0.0));
        OccupiedArea::new(
            self.page,
            Rect::new(self.area.x, self.area.y, self.area.width, height),
        )
    }

    pub fn full(&self, placed: LayoutBox) -> LayoutResult {
        LayoutResult::Full {
            occupied: self.occupied(&placed),
            placed,
        }
    }

    pub fn partial(&self, placed: LayoutBox, split: Element, overflow: Element) -> LayoutResult {
        LayoutResult::Partial {
            occupied: self.occupied(&placed),
            placed,
            split,
            overflow,
        }
    }
}

pub(crate) fn layout_div(
    element: &Element,
    area: &LayoutArea,
    parent: Option<&ResolvedStyle>,
    ctx: &mut LayoutContext<'_>,
) -> LayoutResult {
    let style = ctx.resolve(element, parent, area);
    let avail_width = area.bbox.width - style.margin.horizontal();
    let frame = match style.width {
        Some(width) => BoxFrame::new(&style, area, width).aligned(style.horizontal_alignment, avail_width),
        None => BoxFrame::new(&style, area, avail_width.max(0.0)),
    };
    layout_block(element, &style, &frame, ctx)
}

/// A cell fills the width of the columns it spans.
pub(crate) fn layout_cell(
    element: &Element,
    area: &LayoutArea,
    parent: Option<&ResolvedStyle>,
    ctx: &mut LayoutContext<'_>,
) -> LayoutResult {
    let style = ctx.resolve(element, parent, area);
    let width = (area.bbox.width - style.margin.horizontal()).max(0.0);
    let frame = BoxFrame::new(&style, area, width);
    layout_block(element, &style, &frame, ctx)
}

/// Lay out a block's children inside its frame, honoring the height
/// properties and keep-together.
pub(crate) fn layout_block(
    element: &Element,
    style: &ResolvedStyle,
    frame: &BoxFrame,
    ctx: &mut LayoutContext<'_>,
) -> LayoutResult {
    let forced = ctx.is_forced();
    if frame.avail_height < -EPSILON && !forced {
        return LayoutResult::nothing(element, NothingReason::DoesNotFit);
    }

    // Bounded by a fixed or maximum height that fits the area: lay out
    // everything, then cut at the cap.
    if let Some(cap) = style
        .height_cap()
        .filter(|cap| *cap <= frame.avail_height + EPSILON)
    {
        let flow = layout_flow(&element.children, &frame.content_area(f64::INFINITY), style, ctx);
        let truncated = match flow.status {
            FlowStatus::Complete => false,
            FlowStatus::Split { .. } => true,
            FlowStatus::Nothing(cause) => return LayoutResult::Nothing { cause },
        };
        let clipped = truncated || flow.height + style.decoration_vertical() > cap + EPSILON;
        if clipped {
            ctx.warn(LayoutWarning::clipped(element, frame.page));
        }
        let box_h = match style.height {
            Some(_) => cap,
            None => style.stretched_height(flow.height).min(cap),
        };
        let mut placed = frame.make_box(element, style, box_h);
        placed.children = flow.boxes;
        placed.clipped = clipped;
        return frame.full(placed);
    }

    let inner = frame.inner_height(style).max(0.0);
    let flow = layout_flow(&element.children, &frame.content_area(inner), style, ctx);
    match flow.status {
        FlowStatus::Complete => {
            let box_h = style.stretched_height(flow.height);
            let mut placed = frame.make_box(element, style, box_h);
            placed.children = flow.boxes;
            if box_h <= frame.avail_height + EPSILON {
                return frame.full(placed);
            }
            if style.keep_together && !forced {
                return LayoutResult::nothing(element, NothingReason::KeepTogether);
            }
            // All content is here but the box is taller than the area.
            let box_h = frame.avail_height.max(0.0);
            placed.height = box_h;
            let overflow = element.continuation(vec![], box_h);
            frame.partial(placed, element.clone(), overflow)
        }
        FlowStatus::Split { split, overflow } => {
            if style.keep_together && !forced {
                return LayoutResult::nothing(element, NothingReason::KeepTogether);
            }
            let box_h = style
                .stretched_height(flow.height)
                .min(frame.avail_height.max(flow.height + style.decoration_vertical()));
            let mut placed = frame.make_box(element, style, box_h);
            placed.children = flow.boxes;
            frame.partial(
                placed,
                element.fragment(split),
                element.continuation(overflow, box_h),
            )
        }
        FlowStatus::Nothing(cause) => LayoutResult::Nothing { cause },
    }
}

/// Result of stacking a list of children into an area.
#[derive(Debug)]
pub(crate) struct Flow {
    /// Height used from the area top, floats included.
    pub height: f64,
    pub boxes: Vec<LayoutBox>,
    pub status: FlowStatus,
    /// The last child placed was split, its continuation heads the overflow.
    pub split_inside: bool,
}

#[derive(Debug)]
pub(crate) enum FlowStatus {
    Complete,
    /// Stopped early. `split` holds the children (or parts) placed,
    /// `overflow` what is left, deferred floats first.
    Split {
        split: Vec<Element>,
        overflow: Vec<Element>,
    },
    /// The first child placed nothing.
    Nothing(NothingCause),
}

/// Stack `children` into `area` top to bottom.
///
/// In forced mode only the first child is forced: once something is placed
/// the rest may defer normally.
pub(crate) fn layout_flow(
    children: &[Element],
    area: &LayoutArea,
    parent: &ResolvedStyle,
    ctx: &mut LayoutContext<'_>,
) -> Flow {
    let forced = ctx.is_forced();
    let mut floats = FloatManager::default();
    let mut boxes: Vec<LayoutBox> = Vec::new();
    let mut placed: Vec<Element> = Vec::new();
    let mut deferred: Vec<Element> = Vec::new();
    let mut y = area.bbox.y;
    let bottom = area.bbox.bottom();

    let mut status = FlowStatus::Complete;
    let mut split_inside = false;
    for (i, child) in children.iter().enumerate() {
        ctx.set_forced(forced && boxes.is_empty());

        if child.is_area_break() {
            if boxes.is_empty() {
                continue;
            }
            let mut overflow = std::mem::take(&mut deferred);
            overflow.extend(children[i + 1..].iter().cloned());
            status = FlowStatus::Split {
                split: std::mem::take(&mut placed),
                overflow,
            };
            break;
        }

        if child.is_floated() {
            match place_float(child, &mut floats, y, area, parent, ctx) {
                Some(float_box) => {
                    boxes.push(float_box);
                    placed.push(child.clone());
                }
                None => deferred.push(child.clone()),
            }
            continue;
        }

        let (band_x, band_width) = floats.band_at(y, &area.bbox);
        let child_area = LayoutArea::new(area.page, Rect::new(band_x, y, band_width, bottom - y));
        match dispatch::layout(child, &child_area, Some(parent), ctx) {
            LayoutResult::Full {
                occupied,
                placed: child_box,
            } => {
                y = y.max(occupied.bbox.bottom());
                boxes.push(child_box);
                placed.push(child.clone());
            }
            LayoutResult::Partial {
                occupied,
                placed: child_box,
                split,
                overflow,
            } => {
                y = y.max(occupied.bbox.bottom());
                boxes.push(child_box);
                placed.push(split);
                split_inside = deferred.is_empty();
                let mut rest = std::mem::take(&mut deferred);
                rest.push(overflow);
                rest.extend(children[i + 1..].iter().cloned());
                status = FlowStatus::Split {
                    split: std::mem::take(&mut placed),
                    overflow: rest,
                };
                break;
            }
            LayoutResult::Nothing { cause } => {
                if boxes.is_empty() {
                    status = FlowStatus::Nothing(cause);
                    break;
                }
                let mut rest = std::mem::take(&mut deferred);
                rest.extend(children[i..].iter().cloned());
                status = FlowStatus::Split {
                    split: std::mem::take(&mut placed),
                    overflow: rest,
                };
                break;
            }
        }
    }
    ctx.set_forced(forced);

    if matches!(status, FlowStatus::Complete) && !deferred.is_empty() {
        status = FlowStatus::Split {
            split: placed,
            overflow: deferred,
        };
    }

    let content_bottom = floats.bottom().map_or(y, |b| b.max(y));
    Flow {
        height: content_bottom - area.bbox.y,
        boxes,
        status,
        split_inside,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Defaults, Dimension, Styled};
    use crate::text::FixedAdvanceMeasurer;

    fn area(width: f64, height: f64) -> LayoutArea {
        LayoutArea::new(1, Rect::new(0.0, 0.0, width, height))
    }

    fn run(element: &Element, area: &LayoutArea) -> (LayoutResult, Vec<LayoutWarning>) {
        let defaults = Defaults::default();
        let measurer = FixedAdvanceMeasurer::default();
        let mut ctx = LayoutContext::new(&defaults, &measurer);
        let result = layout_div(element, area, None, &mut ctx);
        (result, ctx.into_warnings())
    }

    fn lines(n: usize) -> Vec<Element> {
        (0..n).map(|i| Element::paragraph(format!("line {i}"))).collect()
    }

    #[test]
    fn div_stacks_children() {
        let div = Element::div(lines(3)).with_padding(5.0);
        let (result, _) = run(&div, &area(200.0, 500.0));
        assert!(result.is_full());
        let placed = result.placed().unwrap();
        assert_eq!(placed.children.len(), 3);
        assert!((placed.height - (3.0 * 14.4 + 10.0)).abs() < 0.001);
        assert!((placed.children[1].y - (5.0 + 14.4)).abs() < 0.001);
    }

    #[test]
    fn div_splits_between_children() {
        let div = Element::div(lines(5));
        let (result, _) = run(&div, &area(200.0, 50.0));
        assert!(result.is_partial());
        assert_eq!(result.split().unwrap().children.len(), 3);
        assert_eq!(result.overflow().unwrap().children.len(), 2);
    }

    #[test]
    fn keep_together_div_is_nothing() {
        let div = Element::div(lines(5)).with_keep_together(true);
        let (result, _) = run(&div, &area(200.0, 50.0));
        assert!(result.is_nothing());
    }

    #[test]
    fn fixed_height_clips_overflowing_content() {
        let div = Element::div(lines(5)).with_height(30.0);
        let (result, warnings) = run(&div, &area(200.0, 500.0));
        assert!(result.is_full());
        let placed = result.placed().unwrap();
        assert!((placed.height - 30.0).abs() < 0.001);
        assert!(placed.clipped);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn min_height_continues_with_remainder() {
        let div = Element::div(lines(1)).with_min_height(80.0);
        let (result, _) = run(&div, &area(200.0, 50.0));
        assert!(result.is_partial());
        let (next, _) = run(result.overflow().unwrap(), &area(200.0, 50.0));
        assert!(next.is_full());
        assert!((next.occupied_height() - 30.0).abs() < 0.001);
    }

    #[test]
    fn area_break_splits_the_container() {
        let div = Element::div(vec![
            Element::paragraph("a"),
            Element::area_break(),
            Element::paragraph("b"),
        ]);
        let (result, _) = run(&div, &area(200.0, 500.0));
        assert!(result.is_partial());
        let overflow = result.overflow().unwrap();
        assert_eq!(overflow.children.len(), 1);
        assert_eq!(overflow.children[0].text(), Some("b"));
    }

    #[test]
    fn fixed_width_is_aligned() {
        let div = Element::div(lines(1))
            .with_width(Dimension::Pt(100.0))
            .with_horizontal_alignment(HorizontalAlignment::Right);
        let (result, _) = run(&div, &area(300.0, 500.0));
        let placed = result.placed().unwrap();
        assert!((placed.x - 200.0).abs() < 0.001);
        assert!((placed.width - 100.0).abs() < 0.001);
    }

    #[test]
    fn margins_are_occupied() {
        let div = Element::div(lines(1)).with_margin(10.0);
        let (result, _) = run(&div, &area(300.0, 500.0));
        assert!((result.occupied_height() - (14.4 + 20.0)).abs() < 0.001);
        assert!((result.placed().unwrap().x - 10.0).abs() < 0.001);
    }
}
