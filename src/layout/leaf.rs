//! Leaf layouts: paragraphs, images and area breaks.

use super::area::{LayoutArea, Rect};
use super::block::BoxFrame;
use super::context::{LayoutContext, LayoutWarning};
use super::page_break::{decide_break, BreakDecision};
use super::result::{LayoutResult, NothingReason};
use super::{DrawCommand, LayoutBox, TextLine, EPSILON};
use crate::model::{Element, ElementKind};
use crate::style::ResolvedStyle;
use crate::text::LineSpan;

/// Lay out a paragraph, splitting between lines when the area runs out.
pub(crate) fn layout_paragraph(
    element: &Element,
    text: &str,
    area: &LayoutArea,
    parent: Option<&ResolvedStyle>,
    ctx: &mut LayoutContext<'_>,
) -> LayoutResult {
    let style = ctx.resolve(element, parent, area);
    let forced = ctx.is_forced();
    let width = style
        .width
        .unwrap_or(area.bbox.width - style.margin.horizontal())
        .max(0.0);
    let frame = BoxFrame::new(&style, area, width);
    if frame.avail_height < -EPSILON && !forced {
        return LayoutResult::nothing(element, NothingReason::DoesNotFit);
    }

    let spans = ctx
        .measurer
        .break_lines(text, frame.inner_width, style.font_size);
    let advance = style.line_advance();
    let content = spans.len() as f64 * advance;

    // A fixed or maximum height that fits: every line is laid out, the
    // box is cut at the cap.
    if let Some(cap) = style
        .height_cap()
        .filter(|cap| *cap <= frame.avail_height + EPSILON)
    {
        let clipped = content + style.decoration_vertical() > cap + EPSILON;
        if clipped {
            ctx.warn(LayoutWarning::clipped(element, area.page));
        }
        let box_h = match style.height {
            Some(_) => cap,
            None => style.stretched_height(content).min(cap),
        };
        let placed = paragraph_box(element, text, &spans, &frame, &style, box_h, clipped);
        return frame.full(placed);
    }

    let units = vec![advance; spans.len()];
    let breakable = !style.keep_together || forced;
    match decide_break(frame.inner_height(&style), &units, breakable) {
        BreakDecision::Place => {
            let box_h = style.stretched_height(content);
            if box_h <= frame.avail_height + EPSILON {
                let placed = paragraph_box(element, text, &spans, &frame, &style, box_h, false);
                return frame.full(placed);
            }
            if style.keep_together && !forced {
                return LayoutResult::nothing(element, NothingReason::KeepTogether);
            }
            // A minimum height taller than the area: the text is all here,
            // the rest of the height continues in the next area.
            let box_h = frame.avail_height.max(content + style.decoration_vertical());
            let placed = paragraph_box(element, text, &spans, &frame, &style, box_h, false);
            let overflow = element
                .with_kind(ElementKind::Paragraph {
                    text: String::new(),
                })
                .continuation(vec![], box_h);
            frame.partial(placed, element.clone(), overflow)
        }
        BreakDecision::Split { units_in_area } => {
            split_paragraph(element, text, &spans, units_in_area, &frame, &style, false)
        }
        BreakDecision::Defer { would_split } => {
            if !forced {
                let reason = if would_split {
                    NothingReason::KeepTogether
                } else {
                    NothingReason::DoesNotFit
                };
                return LayoutResult::nothing(element, reason);
            }
            ctx.warn(LayoutWarning::clipped(element, area.page));
            if spans.len() <= 1 {
                let box_h = frame.avail_height.max(0.0);
                let placed = paragraph_box(element, text, &spans, &frame, &style, box_h, true);
                return frame.full(placed);
            }
            split_paragraph(element, text, &spans, 1, &frame, &style, true)
        }
    }
}

/// Place the first `count` lines; the rest of the text overflows.
fn split_paragraph(
    element: &Element,
    text: &str,
    spans: &[LineSpan],
    count: usize,
    frame: &BoxFrame,
    style: &ResolvedStyle,
    clipped: bool,
) -> LayoutResult {
    let placed_content = count as f64 * style.line_advance();
    let box_h = if clipped {
        frame.avail_height.max(0.0)
    } else {
        style
            .stretched_height(placed_content)
            .min(frame.avail_height.max(placed_content + style.decoration_vertical()))
    };
    let placed = paragraph_box(element, text, &spans[..count], frame, style, box_h, clipped);
    let split_text = text[..spans[count - 1].end].to_string();
    let rest_text = text[spans[count].start..].to_string();
    let split = element.with_kind(ElementKind::Paragraph { text: split_text });
    let overflow = element
        .with_kind(ElementKind::Paragraph { text: rest_text })
        .continuation(vec![], box_h);
    frame.partial(placed, split, overflow)
}

fn paragraph_box(
    element: &Element,
    text: &str,
    spans: &[LineSpan],
    frame: &BoxFrame,
    style: &ResolvedStyle,
    box_h: f64,
    clipped: bool,
) -> LayoutBox {
    let advance = style.line_advance();
    let lines = spans
        .iter()
        .enumerate()
        .map(|(i, span)| TextLine {
            x: frame.inner_x
                + style
                    .horizontal_alignment
                    .offset(frame.inner_width - span.width),
            y: frame.inner_y + i as f64 * advance,
            width: span.width,
            height: advance,
            text: text[span.start..span.end].to_string(),
        })
        .collect();
    let mut placed = frame.make_box(element, style, box_h);
    placed.draw = DrawCommand::Text {
        lines,
        font_size: style.font_size,
    };
    placed.clipped = clipped;
    placed
}

/// Size of an image drawn with the given WIDTH and HEIGHT. A single given
/// side scales the other to keep the aspect ratio.
pub(crate) fn scaled_image_size(
    intrinsic_width: f64,
    intrinsic_height: f64,
    width: Option<f64>,
    height: Option<f64>,
) -> (f64, f64) {
    match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) if intrinsic_width > 0.0 => (w, w * intrinsic_height / intrinsic_width),
        (None, Some(h)) if intrinsic_height > 0.0 => (h * intrinsic_width / intrinsic_height, h),
        (Some(w), None) => (w, intrinsic_height),
        (None, Some(h)) => (intrinsic_width, h),
        (None, None) => (intrinsic_width, intrinsic_height),
    }
}

/// Lay out an image. Images are atomic: all or nothing.
pub(crate) fn layout_image(
    element: &Element,
    intrinsic: (f64, f64),
    area: &LayoutArea,
    parent: Option<&ResolvedStyle>,
    ctx: &mut LayoutContext<'_>,
) -> LayoutResult {
    let style = ctx.resolve(element, parent, area);
    let (w, h) = scaled_image_size(intrinsic.0, intrinsic.1, style.width, style.height);
    let box_w = w + style.decoration_horizontal();
    let box_h = h + style.decoration_vertical();
    let avail_w = area.bbox.width - style.margin.horizontal();

    let frame = BoxFrame::new(&style, area, box_w).aligned(style.horizontal_alignment, avail_w);
    let fits = box_w <= avail_w + EPSILON && box_h <= frame.avail_height + EPSILON;
    if !fits && !ctx.is_forced() {
        return LayoutResult::nothing(element, NothingReason::DoesNotFit);
    }

    let mut placed = frame.make_box(element, &style, box_h);
    placed.draw = DrawCommand::Image {
        width: w,
        height: h,
    };
    if !fits {
        ctx.warn(LayoutWarning::clipped(element, area.page));
        placed.height = box_h.min(frame.avail_height.max(0.0));
        placed.clipped = true;
    }
    frame.full(placed)
}

/// An area break laid out on its own takes no space. Containers and the
/// document driver act on it before it gets here.
pub(crate) fn layout_area_break(element: &Element, area: &LayoutArea) -> LayoutResult {
    let rect = Rect::new(area.bbox.x, area.bbox.y, area.bbox.width, 0.0);
    LayoutResult::Full {
        occupied: super::area::OccupiedArea::new(area.page, rect),
        placed: LayoutBox::new(element, rect),
    }
}
