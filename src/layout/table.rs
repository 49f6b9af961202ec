//! # Table Split Controller
//!
//! Places a table into one area: header first, then body rows until a row
//! does not fit, then the footer. The footer's height is reserved up front
//! with a trial layout. When the body does not end here, the table splits:
//! the split copy holds the placed rows, the overflow copy the rest plus the
//! header and footer so they repeat in the next area.
//!
//! Split and overflow copies carry their grids already built and the column
//! widths fixed by the first placement, so every area of a table lines up.

use super::area::LayoutArea;
use super::block::BoxFrame;
use super::context::{LayoutContext, LayoutWarning};
use super::grid::{resolve_column_widths, Grid};
use super::measure::{column_samples, Extent};
use super::row::{layout_rows, RowGeometry, RowsLayout, RowsVerdict};
use super::result::{LayoutResult, NothingCause, NothingReason};
use super::EPSILON;
use crate::model::{Element, ElementKind, TableModel, TableRows};
use crate::style::{Dimension, ResolvedStyle, TableLayout};

/// Where the controller is in the table. A table that does not end in the
/// area stops at its footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    BeforeHeader,
    InBody,
    AtFooter,
    Done,
}

/// The three sections laid out for one area.
struct Sections {
    header: Option<RowsLayout>,
    body: RowsLayout,
    footer: Option<RowsLayout>,
}

struct TableFrame<'a> {
    element: &'a Element,
    style: ResolvedStyle,
    frame: BoxFrame,
    widths: Vec<f64>,
    /// Height for header, body and footer together.
    available: f64,
}

impl TableFrame<'_> {
    fn geometry(&self, y: f64, available: f64) -> RowGeometry<'_> {
        RowGeometry {
            page: self.page(),
            x: self.frame.inner_x,
            y,
            widths: &self.widths,
            available,
        }
    }

    fn page(&self) -> usize {
        self.frame.page()
    }

    fn cause(&self, reason: NothingReason) -> NothingCause {
        NothingCause::new(self.element, reason)
    }

    /// Header and footer are never forced: they either fit or are dropped.
    fn fixed_rows(
        &self,
        grid: &Grid,
        y: f64,
        available: f64,
        ctx: &mut LayoutContext<'_>,
    ) -> Option<RowsLayout> {
        let previous = ctx.set_forced(false);
        let rows = layout_rows(grid, &self.geometry(y, available), &self.style, ctx);
        ctx.set_forced(previous);
        matches!(rows.verdict, RowsVerdict::Complete).then_some(rows)
    }

    fn sections(
        &self,
        header: Option<&Grid>,
        body: &Grid,
        footer: Option<&Grid>,
        ctx: &mut LayoutContext<'_>,
    ) -> Result<Sections, NothingCause> {
        let checkpoint = ctx.checkpoint();
        let mut phase = Phase::BeforeHeader;
        tracing::trace!(?phase, "laying out table sections");
        let mut used = 0.0;

        let header = match header {
            Some(grid) => {
                let rows = self.fixed_rows(grid, self.frame.inner_y, self.available, ctx);
                let Some(rows) = rows else {
                    ctx.rollback(checkpoint);
                    return Err(self.cause(NothingReason::DoesNotFit));
                };
                used += rows.height();
                Some(rows)
            }
            None => None,
        };
        phase = Phase::InBody;
        tracing::trace!(?phase, header = used);

        // Trial footer at y = 0, moved under the body once its height is known.
        let footer = match footer {
            Some(grid) => {
                let Some(rows) = self.fixed_rows(grid, 0.0, self.available - used, ctx) else {
                    ctx.rollback(checkpoint);
                    return Err(self.cause(NothingReason::DoesNotFit));
                };
                Some(rows)
            }
            None => None,
        };
        let footer_height = footer.as_ref().map_or(0.0, RowsLayout::height);

        let body_available = self.available - used - footer_height;
        let body = layout_rows(
            body,
            &self.geometry(self.frame.inner_y + used, body_available),
            &self.style,
            ctx,
        );
        if let RowsVerdict::Nothing(cause) = &body.verdict {
            ctx.rollback(checkpoint);
            return Err(self.cause(cause.reason));
        }
        phase = match body.verdict {
            RowsVerdict::Complete => Phase::Done,
            _ => Phase::AtFooter,
        };
        tracing::debug!(
            ?phase,
            header = used,
            footer = footer_height,
            body = body.height(),
            "table sections laid out"
        );

        Ok(Sections {
            header,
            body,
            footer,
        })
    }
}

pub(crate) fn layout_table(
    element: &Element,
    model: &TableModel,
    area: &LayoutArea,
    parent: Option<&ResolvedStyle>,
    ctx: &mut LayoutContext<'_>,
) -> LayoutResult {
    let _span = tracing::debug_span!(
        "table",
        id = ?element.id,
        page = area.page,
        continued = model.continued
    )
    .entered();

    let style = ctx.resolve(element, parent, area);
    let forced = ctx.is_forced();
    let n = model.num_columns();
    let (header, _) = model.header.grid(n);
    let (body, last_row_incomplete) = model.body.grid(n);
    let (footer, _) = model.footer.grid(n);
    if last_row_incomplete {
        ctx.warn(LayoutWarning::LastRowIsNotComplete {
            id: element.id.clone(),
        });
    }

    let avail_width = (area.bbox.width - style.margin.horizontal()).max(0.0);
    let (table_width, widths) = match &model.column_widths {
        Some(widths) => (
            widths.iter().sum::<f64>() + style.decoration_horizontal(),
            widths.clone(),
        ),
        None => {
            let samples =
                column_samples(&[&*header, &*body, &*footer], n, &style, ctx, Extent::Max);
            let table_width = table_width(model, &style, avail_width, &samples);
            let inner = (table_width - style.decoration_horizontal()).max(0.0);
            let widths = resolve_column_widths(&model.columns, inner, style.table_layout, &samples);
            (table_width, widths)
        }
    };

    let frame = BoxFrame::new(&style, area, table_width)
        .aligned(style.horizontal_alignment, avail_width);
    if frame.avail_height < -EPSILON && !forced {
        return LayoutResult::nothing(element, NothingReason::DoesNotFit);
    }
    let mut available = frame.inner_height(&style).max(0.0);
    if let Some(max) = style.max_height {
        available = available.min((max - style.decoration_vertical()).max(0.0));
    }
    let table = TableFrame {
        element,
        style,
        frame,
        widths,
        available,
    };

    let has_header = header.num_rows() > 0 && !(model.skip_first_header && !model.continued);
    let has_footer = footer.num_rows() > 0;
    let mut plans = vec![(has_header, has_footer)];
    if forced {
        plans.push((has_header, false));
        plans.push((false, false));
        plans.dedup();
    }

    let mut failure = table.cause(NothingReason::DoesNotFit);
    let mut chosen = None;
    for (with_header, with_footer) in plans {
        let header_grid = with_header.then_some(&*header);
        if with_footer && model.skip_last_footer {
            // the footer is left off where the table ends
            let checkpoint = ctx.checkpoint();
            match table.sections(header_grid, &body, None, ctx) {
                Ok(sections) if matches!(sections.body.verdict, RowsVerdict::Complete) => {
                    chosen = Some(sections);
                    break;
                }
                _ => ctx.rollback(checkpoint),
            }
        }
        match table.sections(header_grid, &body, with_footer.then_some(&*footer), ctx) {
            Ok(sections) => {
                chosen = Some(sections);
                break;
            }
            Err(cause) => failure = cause,
        }
        tracing::debug!(with_header, with_footer, "table does not fit, retrying with fewer sections");
    }
    let Some(sections) = chosen else {
        return LayoutResult::Nothing { cause: failure };
    };

    let ends_here = matches!(sections.body.verdict, RowsVerdict::Complete);
    if !ends_here && table.style.keep_together && !forced {
        return LayoutResult::nothing(element, NothingReason::KeepTogether);
    }

    let header_height = sections.header.as_ref().map_or(0.0, RowsLayout::height);
    let footer_height = sections.footer.as_ref().map_or(0.0, RowsLayout::height);
    let body_room = table.available - header_height - footer_height;
    let min_body = if area.is_bounded() {
        body_extension(model, &table.style, ends_here, body_room, header_height + footer_height)
    } else {
        None
    };

    let Sections {
        header: header_rows,
        body: mut body_rows,
        footer: footer_rows,
    } = sections;
    let verdict = body_rows.take_verdict();

    let (header_height, mut boxes) = header_rows.map_or((0.0, vec![]), |rows| rows.finish(None));
    let (body_height, body_boxes) = body_rows.finish(min_body);
    boxes.extend(body_boxes);
    let mut footer_height = 0.0;
    if let Some(rows) = footer_rows {
        let (height, mut footer_boxes) = rows.finish(None);
        let dy = table.frame.inner_y + header_height + body_height;
        for b in &mut footer_boxes {
            b.translate(0.0, dy);
        }
        boxes.extend(footer_boxes);
        footer_height = height;
    }

    let box_h = header_height + body_height + footer_height + table.style.decoration_vertical();
    let mut placed = table.frame.make_box(element, &table.style, box_h);
    placed.children = boxes;

    match verdict {
        RowsVerdict::Complete => table.frame.full(placed),
        RowsVerdict::Split { split, overflow } => {
            tracing::debug!(
                split_rows = split.num_rows(),
                overflow_rows = overflow.num_rows(),
                "table split"
            );
            let copy = |body: Grid, continued: bool| {
                let mut next = model.clone();
                next.body = TableRows::Grid(body);
                next.header = TableRows::Grid(header.as_ref().clone());
                next.footer = TableRows::Grid(footer.as_ref().clone());
                next.column_widths = Some(table.widths.clone());
                next.continued = continued;
                element.with_kind(ElementKind::Table(Box::new(next)))
            };
            let split = copy(split, model.continued);
            let overflow = copy(overflow, true).continuation(vec![], box_h);
            table.frame.partial(placed, split, overflow)
        }
        RowsVerdict::Nothing(cause) => LayoutResult::Nothing { cause },
    }
}

/// Table width when the columns do not come from an earlier placement.
fn table_width(model: &TableModel, style: &ResolvedStyle, available: f64, samples: &[f64]) -> f64 {
    if let Some(width) = style.width {
        return width;
    }
    let decoration = style.decoration_horizontal();
    let all_points = model.columns.iter().all(|c| matches!(c, Dimension::Pt(_)));
    let content: f64 = model
        .columns
        .iter()
        .zip(samples)
        .map(|(column, sample)| match column {
            Dimension::Pt(w) => *w,
            _ => *sample,
        })
        .sum();
    let has_percent = model
        .columns
        .iter()
        .any(|c| matches!(c, Dimension::Percent(_)));
    if all_points {
        content + decoration
    } else if has_percent || style.table_layout == TableLayout::Fixed {
        available
    } else {
        (content + decoration).min(available)
    }
}

/// The height the body must reach in this area: the room left when the
/// bottom row is extended, or what HEIGHT and MIN_HEIGHT ask for.
fn body_extension(
    model: &TableModel,
    style: &ResolvedStyle,
    ends_here: bool,
    body_room: f64,
    sections_height: f64,
) -> Option<f64> {
    let extend = if ends_here {
        model.extend_bottom_row
    } else {
        model.extend_bottom_row_on_split
    };
    let mut target: Option<f64> = extend.then_some(body_room);
    if ends_here {
        let wanted = style.min_height.max(style.height.unwrap_or(0.0));
        let body_wanted = wanted - style.decoration_vertical() - sections_height;
        if body_wanted > 0.0 {
            let body_wanted = body_wanted.min(body_room);
            target = Some(target.map_or(body_wanted, |t| t.max(body_wanted)));
        }
    }
    target
}
