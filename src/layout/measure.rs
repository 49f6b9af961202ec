//! Intrinsic widths: how wide an element wants to be (max-content) and how
//! narrow it can get (min-content). Used to size automatic table columns and
//! shrink-to-fit floats.

use super::context::LayoutContext;
use super::grid::Grid;
use super::leaf::scaled_image_size;
use crate::model::{Element, ElementKind, TableModel};
use crate::style::{Dimension, ResolvedStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Extent {
    Min,
    Max,
}

/// Margin-box width of `element` laid out without line breaks.
pub(crate) fn max_content_width(
    element: &Element,
    parent: Option<&ResolvedStyle>,
    ctx: &LayoutContext<'_>,
) -> f64 {
    intrinsic_width(element, parent, ctx, Extent::Max)
}

/// Margin-box width of `element` broken at every opportunity.
pub(crate) fn min_content_width(
    element: &Element,
    parent: Option<&ResolvedStyle>,
    ctx: &LayoutContext<'_>,
) -> f64 {
    intrinsic_width(element, parent, ctx, Extent::Min)
}

fn intrinsic_width(
    element: &Element,
    parent: Option<&ResolvedStyle>,
    ctx: &LayoutContext<'_>,
    extent: Extent,
) -> f64 {
    // Percentages have nothing to resolve against here and count as unset.
    let style = ResolvedStyle::resolve(
        &element.properties,
        element.element_type(),
        parent,
        ctx.defaults,
        f64::INFINITY,
        f64::INFINITY,
    );
    let margin = style.margin.horizontal();
    let decoration = style.decoration_horizontal();

    let fixed = style
        .width
        .filter(|_| !matches!(element.kind, ElementKind::Image { .. }));
    if let Some(width) = fixed {
        return width + margin;
    }

    let content = match &element.kind {
        ElementKind::Image { width, height } => {
            scaled_image_size(*width, *height, style.width, style.height).0
        }
        ElementKind::Paragraph { text } => match extent {
            Extent::Max => ctx.measurer.max_content_width(text, style.font_size),
            Extent::Min => ctx.measurer.min_content_width(text, style.font_size),
        },
        ElementKind::Div | ElementKind::Cell { .. } => element
            .children
            .iter()
            .map(|child| intrinsic_width(child, Some(&style), ctx, extent))
            .fold(0.0, f64::max),
        ElementKind::Table(model) => table_width(model, &style, ctx, extent),
        ElementKind::AreaBreak => 0.0,
    };
    content + decoration + margin
}

fn table_width(
    model: &TableModel,
    style: &ResolvedStyle,
    ctx: &LayoutContext<'_>,
    extent: Extent,
) -> f64 {
    if let Some(widths) = &model.column_widths {
        return widths.iter().sum();
    }
    let n = model.num_columns();
    let (header, _) = model.header.grid(n);
    let (body, _) = model.body.grid(n);
    let (footer, _) = model.footer.grid(n);
    let samples = column_samples(&[&*header, &*body, &*footer], n, style, ctx, extent);
    model
        .columns
        .iter()
        .zip(&samples)
        .map(|(column, sample)| match column {
            Dimension::Pt(w) => *w,
            _ => *sample,
        })
        .sum()
}

/// The intrinsic width each column needs, sampled over the cells of
/// `grids`. Spanning cells spread what they need beyond the columns they
/// cover evenly over those columns.
pub(crate) fn column_samples(
    grids: &[&Grid],
    num_columns: usize,
    table_style: &ResolvedStyle,
    ctx: &LayoutContext<'_>,
    extent: Extent,
) -> Vec<f64> {
    let mut samples = vec![0.0_f64; num_columns];
    let cells = || grids.iter().flat_map(|g| g.cells());

    for cell in cells().filter(|c| c.colspan == 1) {
        if let Some(sample) = samples.get_mut(cell.col) {
            *sample = sample.max(intrinsic_width(&cell.cell, Some(table_style), ctx, extent));
        }
    }
    for cell in cells().filter(|c| c.colspan > 1) {
        let end = (cell.col + cell.colspan).min(num_columns);
        if cell.col >= end {
            continue;
        }
        let need = intrinsic_width(&cell.cell, Some(table_style), ctx, extent);
        let have: f64 = samples[cell.col..end].iter().sum();
        if need > have {
            let extra = (need - have) / (end - cell.col) as f64;
            for sample in &mut samples[cell.col..end] {
                *sample += extra;
            }
        }
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, Table};
    use crate::style::{Defaults, Styled};
    use crate::text::FixedAdvanceMeasurer;

    fn with_ctx<T>(f: impl FnOnce(&LayoutContext<'_>) -> T) -> T {
        let defaults = Defaults::default();
        let measurer = FixedAdvanceMeasurer::default();
        let ctx = LayoutContext::new(&defaults, &measurer);
        f(&ctx)
    }

    #[test]
    fn paragraph_extents() {
        let p = Element::paragraph("ab abcd").with_padding(1.0);
        with_ctx(|ctx| {
            // 6pt per char at 12pt
            assert!((max_content_width(&p, None, ctx) - 44.0).abs() < 0.001);
            assert!((min_content_width(&p, None, ctx) - 26.0).abs() < 0.001);
        });
    }

    #[test]
    fn fixed_width_wins() {
        let div = Element::div(vec![Element::paragraph("a very long line of text")])
            .with_width(Dimension::Pt(50.0))
            .with_margin(5.0);
        with_ctx(|ctx| assert!((max_content_width(&div, None, ctx) - 60.0).abs() < 0.001));
    }

    #[test]
    fn samples_include_cell_decoration() {
        let mut table = Table::with_columns(2).unwrap();
        table.add_text_cell("abc").add_text_cell("a");
        let model = table.model().clone();
        let (grid, _) = model.body.grid(2);
        with_ctx(|ctx| {
            let samples = column_samples(
                &[&*grid],
                2,
                &ResolvedStyle::resolve(
                    &Default::default(),
                    crate::model::ElementType::Table,
                    None,
                    ctx.defaults,
                    500.0,
                    500.0,
                ),
                ctx,
                Extent::Max,
            );
            // text + 2pt padding each side + 0.5pt border each side
            assert!((samples[0] - 23.0).abs() < 0.001);
            assert!((samples[1] - 11.0).abs() < 0.001);
        });
    }

    #[test]
    fn spanning_cell_spreads_its_need() {
        let mut table = Table::with_point_widths(&[10.0, 10.0]).unwrap();
        table
            .add_cell(Cell::new(1, 2).add_text("abcdefgh").with_padding(0.0).with_border(crate::style::Border::NONE))
            .add_cell(Cell::default().with_padding(0.0).with_border(crate::style::Border::NONE))
            .add_cell(Cell::default().with_padding(0.0).with_border(crate::style::Border::NONE));
        let (grid, _) = table.model().body.grid(2);
        with_ctx(|ctx| {
            let style = ResolvedStyle::resolve(
                &Default::default(),
                crate::model::ElementType::Table,
                None,
                ctx.defaults,
                500.0,
                500.0,
            );
            let samples = column_samples(&[&*grid], 2, &style, ctx, Extent::Max);
            assert!((samples[0] - 24.0).abs() < 0.001);
            assert!((samples[1] - 24.0).abs() < 0.001);
        });
    }
}
