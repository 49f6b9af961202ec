//! # Rows
//!
//! Lays out the rows of a grid one at a time and decides where the grid
//! ends in the area:
//! - a row is complete when every cell that ends in it placed FULL; a
//!   spanning cell is laid out at its first row but only judged at its last
//! - a row is NOTHING when a cell that ends in it placed nothing; the grid
//!   then splits on the row's top edge
//! - otherwise the row itself is split, each cell contributing the part it
//!   placed
//!
//! Spanning cells that straddle the split are cut at the split line; their
//! remainder is carried into the overflow grid with a reduced rowspan.

use super::area::{LayoutArea, OccupiedArea, Rect};
use super::context::{LayoutContext, LayoutWarning};
use super::dispatch;
use super::grid::{column_x_offset, span_width, Grid, GridCell};
use super::result::{LayoutResult, NothingCause, NothingReason};
use super::{GridPosition, LayoutBox, EPSILON};
use crate::model::{Element, ElementKind};
use crate::style::{ResolvedStyle, VerticalAlignment};

/// Where the rows go: the top-left of the first row, the column widths and
/// the height available below that point.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RowGeometry<'w> {
    pub page: usize,
    pub x: f64,
    pub y: f64,
    pub widths: &'w [f64],
    pub available: f64,
}

impl RowGeometry<'_> {
    fn cell_area(&self, cell: &GridCell, top: f64, height: f64) -> LayoutArea {
        LayoutArea::new(
            self.page,
            Rect::new(
                self.x + column_x_offset(cell.col, self.widths),
                self.y + top,
                span_width(cell.col, cell.colspan, self.widths),
                height,
            ),
        )
    }
}

/// A cell box ready to be stretched to its final row height.
#[derive(Debug, Clone)]
pub(crate) struct PlacedCell {
    row: usize,
    rowspan: usize,
    position: GridPosition,
    margin_vertical: f64,
    alignment: VerticalAlignment,
    placed: LayoutBox,
}

#[derive(Debug)]
pub(crate) enum RowsVerdict {
    Complete,
    Split { split: Grid, overflow: Grid },
    Nothing(NothingCause),
}

#[derive(Debug)]
pub(crate) struct RowsLayout {
    /// Heights of the placed rows, a split row included.
    pub heights: Vec<f64>,
    cells: Vec<PlacedCell>,
    pub verdict: RowsVerdict,
}

impl RowsLayout {
    pub fn height(&self) -> f64 {
        self.heights.iter().sum()
    }

    pub fn take_verdict(&mut self) -> RowsVerdict {
        std::mem::replace(&mut self.verdict, RowsVerdict::Complete)
    }

    /// Stretch the last row so the rows are at least `min_height` tall, pad
    /// every cell to its rows, and hand back the boxes.
    pub fn finish(mut self, min_height: Option<f64>) -> (f64, Vec<LayoutBox>) {
        let total = self.height();
        if let (Some(target), Some(last)) = (min_height, self.heights.last_mut()) {
            if target > total + EPSILON {
                *last += target - total;
            }
        }
        let mut tops = Vec::with_capacity(self.heights.len() + 1);
        tops.push(0.0);
        for h in &self.heights {
            let next = tops.last().copied().unwrap_or(0.0) + h;
            tops.push(next);
        }
        let span = |from: usize, count: usize| {
            let end = (from + count).min(tops.len() - 1);
            tops[end] - tops[from.min(end)]
        };

        let boxes = self
            .cells
            .into_iter()
            .map(|mut cell| {
                let height = span(cell.row, cell.rowspan) - cell.margin_vertical;
                cell.placed.stretch_to(height, cell.alignment);
                cell.placed.grid = Some(cell.position);
                cell.placed
            })
            .collect();
        (tops.last().copied().unwrap_or(0.0), boxes)
    }
}

/// One cell laid out, with the warnings it produced held back until the
/// result is known to be kept.
struct Attempt {
    result: LayoutResult,
    warnings: Vec<LayoutWarning>,
    alignment: VerticalAlignment,
    margin_vertical: f64,
}

impl Attempt {
    fn occupied(&self) -> f64 {
        self.result.occupied_height()
    }
}

fn attempt(
    cell: &GridCell,
    area: &LayoutArea,
    table_style: &ResolvedStyle,
    forced: bool,
    ctx: &mut LayoutContext<'_>,
) -> Attempt {
    let style = ctx.resolve(&cell.cell, Some(table_style), area);
    let previous = ctx.set_forced(forced);
    let checkpoint = ctx.checkpoint();
    let result = dispatch::layout(&cell.cell, area, Some(table_style), ctx);
    let warnings = ctx.take_since(checkpoint);
    ctx.set_forced(previous);
    Attempt {
        result,
        warnings,
        alignment: style.vertical_alignment,
        margin_vertical: style.margin.vertical(),
    }
}

/// Lay out `grid` row by row into the space described by `geometry`.
pub(crate) fn layout_rows(
    grid: &Grid,
    geometry: &RowGeometry<'_>,
    table_style: &ResolvedStyle,
    ctx: &mut LayoutContext<'_>,
) -> RowsLayout {
    let forced = ctx.is_forced();
    let cells: Vec<&GridCell> = grid.cells().collect();
    let mut attempts: Vec<Option<Attempt>> = cells.iter().map(|_| None).collect();
    let mut tops = vec![0.0];
    let mut heights: Vec<f64> = Vec::new();
    let mut failed_row = None;

    for r in 0..grid.num_rows() {
        let top = tops[r];
        let remaining = geometry.available - top;
        for (i, cell) in cells.iter().enumerate().filter(|(_, c)| c.row == r) {
            let area = geometry.cell_area(cell, top, remaining);
            attempts[i] = Some(attempt(cell, &area, table_style, forced && r == 0, ctx));
        }

        let mut height = 0.0_f64;
        let mut complete = true;
        for (i, cell) in cells.iter().enumerate().filter(|(_, c)| c.last_row() == r) {
            let Some(a) = &attempts[i] else { continue };
            if a.result.is_full() {
                height = height.max(a.occupied() - (top - tops[cell.row]));
            } else {
                complete = false;
            }
        }
        if !complete {
            failed_row = Some(r);
            break;
        }
        heights.push(height);
        tops.push(top + height);
    }

    let Some(r0) = failed_row else {
        let placed = cells
            .iter()
            .zip(attempts)
            .filter_map(|(cell, a)| a.map(|a| keep(ctx, cell, grid, a, cell.rowspan)))
            .collect();
        return RowsLayout {
            heights,
            cells: placed,
            verdict: RowsVerdict::Complete,
        };
    };

    let nothing_cause = cells
        .iter()
        .zip(&attempts)
        .filter(|(cell, _)| cell.last_row() == r0)
        .find_map(|(_, a)| match a.as_ref().map(|a| &a.result) {
            Some(LayoutResult::Nothing { cause }) => Some(cause.clone()),
            _ => None,
        });

    match nothing_cause {
        Some(cause) => split_before_row(
            grid,
            &cells,
            attempts,
            r0,
            tops,
            heights,
            cause,
            geometry,
            table_style,
            ctx,
        ),
        None => split_inside_row(grid, &cells, attempts, r0, tops, heights, ctx),
    }
}

/// The row at `r0` placed nothing: the grid ends on its top edge. Spanning
/// cells crossing that edge are laid out again, cut at it. A keep-together
/// cell that cannot be cut moves the edge up to the cell's first row.
#[allow(clippy::too_many_arguments)]
fn split_before_row(
    grid: &Grid,
    cells: &[&GridCell],
    mut attempts: Vec<Option<Attempt>>,
    r0: usize,
    tops: Vec<f64>,
    mut heights: Vec<f64>,
    mut cause: NothingCause,
    geometry: &RowGeometry<'_>,
    table_style: &ResolvedStyle,
    ctx: &mut LayoutContext<'_>,
) -> RowsLayout {
    let forced = ctx.is_forced();
    let mut boundary = r0;
    let mut cut: Vec<Option<Attempt>> = cells.iter().map(|_| None).collect();

    'settle: loop {
        cut.iter_mut().for_each(|c| *c = None);
        for (i, cell) in cells.iter().enumerate() {
            if cell.row >= boundary || cell.last_row() < boundary {
                continue;
            }
            let portion = tops[boundary] - tops[cell.row];
            let area = geometry.cell_area(cell, tops[cell.row], portion);
            let row_forced = forced && cell.row == 0;
            let retry = attempt(cell, &area, table_style, row_forced, ctx);
            if retry.result.is_nothing() && cell.cell.properties.keep_together() && !row_forced {
                cause = NothingCause::new(&cell.cell, NothingReason::KeepTogether);
                boundary = cell.row;
                continue 'settle;
            }
            cut[i] = Some(retry);
        }
        break;
    }

    if boundary == 0 {
        return RowsLayout {
            heights: vec![],
            cells: vec![],
            verdict: RowsVerdict::Nothing(cause),
        };
    }
    heights.truncate(boundary);

    let mut placed = Vec::new();
    let mut split_cells = Vec::new();
    let mut overflow_cells = Vec::new();
    for (i, cell) in cells.iter().enumerate() {
        if cell.row >= boundary {
            overflow_cells.push(GridCell {
                row: cell.row - boundary,
                ..(*cell).clone()
            });
            continue;
        }
        if cell.last_row() < boundary {
            if let Some(a) = attempts[i].take() {
                placed.push(keep(ctx, cell, grid, a, cell.rowspan));
            }
            split_cells.push((*cell).clone());
            continue;
        }

        // straddles the boundary
        let Some(mut a) = cut[i].take() else { continue };
        let rowspan_here = boundary - cell.row;
        let rowspan_rest = cell.last_row() - boundary + 1;
        let (split_part, rest) = divide(&cell.cell, &a.result);
        if a.result.is_nothing() {
            // nothing fit above the line: an empty box holds the slot
            let area = geometry.cell_area(cell, tops[cell.row], tops[boundary] - tops[cell.row]);
            let style = ctx.resolve(&cell.cell, Some(table_style), &area);
            a.result = LayoutResult::Full {
                occupied: OccupiedArea::new(area.page, area.bbox),
                placed: LayoutBox::new(&cell.cell, area.bbox).styled(&style),
            };
        }
        placed.push(keep(ctx, cell, grid, a, rowspan_here));
        split_cells.push(respan(cell, cell.row, rowspan_here, split_part));
        overflow_cells.push(respan(cell, 0, rowspan_rest, rest));
    }

    let sources = |rows: std::ops::Range<usize>| -> Vec<usize> {
        rows.map(|r| grid.rows[r].source).collect()
    };
    RowsLayout {
        heights,
        cells: placed,
        verdict: RowsVerdict::Split {
            split: Grid::from_cells(grid.num_columns, sources(0..boundary), split_cells),
            overflow: Grid::from_cells(
                grid.num_columns,
                sources(boundary..grid.num_rows()),
                overflow_cells,
            ),
        },
    }
}

/// Cells at `r0` placed something but not everything: `r0` becomes a split
/// row. Every cell active in it keeps what it placed; the rest goes to the
/// first row of the overflow.
fn split_inside_row(
    grid: &Grid,
    cells: &[&GridCell],
    mut attempts: Vec<Option<Attempt>>,
    r0: usize,
    tops: Vec<f64>,
    mut heights: Vec<f64>,
    ctx: &mut LayoutContext<'_>,
) -> RowsLayout {
    let active = |cell: &GridCell| cell.row <= r0 && cell.last_row() >= r0;

    let split_height = cells
        .iter()
        .zip(&attempts)
        .filter(|(cell, _)| active(cell))
        .filter_map(|(cell, a)| a.as_ref().map(|a| a.occupied() - (tops[r0] - tops[cell.row])))
        .fold(0.0_f64, f64::max);
    heights.push(split_height);

    let mut placed = Vec::new();
    let mut split_cells = Vec::new();
    let mut overflow_cells = Vec::new();
    for (i, cell) in cells.iter().enumerate() {
        if cell.row > r0 {
            overflow_cells.push(GridCell {
                row: cell.row - r0,
                ..(*cell).clone()
            });
            continue;
        }
        let Some(a) = attempts[i].take() else { continue };
        if !active(cell) {
            split_cells.push((*cell).clone());
            placed.push(keep(ctx, cell, grid, a, cell.rowspan));
            continue;
        }
        let rowspan_here = r0 - cell.row + 1;
        let (split_part, rest) = divide(&cell.cell, &a.result);
        split_cells.push(respan(cell, cell.row, rowspan_here, split_part));
        overflow_cells.push(respan(cell, 0, cell.last_row() - r0 + 1, rest));
        placed.push(keep(ctx, cell, grid, a, rowspan_here));
    }

    RowsLayout {
        heights,
        cells: placed,
        verdict: RowsVerdict::Split {
            split: Grid::from_cells(
                grid.num_columns,
                grid.rows[..=r0].iter().map(|r| r.source).collect(),
                split_cells,
            ),
            overflow: Grid::from_cells(
                grid.num_columns,
                grid.rows[r0..].iter().map(|r| r.source).collect(),
                overflow_cells,
            ),
        },
    }
}

/// Record a kept cell: replay its held-back warnings and wrap its box.
fn keep(
    ctx: &mut LayoutContext<'_>,
    cell: &GridCell,
    grid: &Grid,
    attempt: Attempt,
    rowspan: usize,
) -> PlacedCell {
    for warning in attempt.warnings {
        ctx.warn(warning);
    }
    let placed = match attempt.result {
        LayoutResult::Full { placed, .. } | LayoutResult::Partial { placed, .. } => placed,
        LayoutResult::Nothing { .. } => LayoutBox::new(&cell.cell, Rect::default()),
    };
    PlacedCell {
        row: cell.row,
        rowspan,
        position: position(cell, grid, rowspan),
        margin_vertical: attempt.margin_vertical,
        alignment: attempt.alignment,
        placed,
    }
}

fn position(cell: &GridCell, grid: &Grid, rowspan: usize) -> GridPosition {
    GridPosition {
        row: grid.rows.get(cell.row).map_or(cell.row, |r| r.source),
        col: cell.col,
        rowspan,
        colspan: cell.colspan,
    }
}

/// The placed part and the remainder of a cell after `result`.
fn divide(cell: &Element, result: &LayoutResult) -> (Element, Element) {
    match result {
        LayoutResult::Full { occupied, .. } => {
            (cell.clone(), cell.continuation(vec![], occupied.height()))
        }
        LayoutResult::Partial {
            split, overflow, ..
        } => (split.clone(), overflow.clone()),
        LayoutResult::Nothing { .. } => (cell.fragment(vec![]), cell.clone()),
    }
}

/// `element` as a grid cell at `row` spanning `rowspan` rows.
fn respan(original: &GridCell, row: usize, rowspan: usize, element: Element) -> GridCell {
    let element = element.with_kind(ElementKind::Cell {
        rowspan: rowspan as u32,
        colspan: original.colspan as u32,
    });
    GridCell {
        row,
        col: original.col,
        rowspan,
        colspan: original.colspan,
        cell: element,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, ElementType, Table};
    use crate::style::{Defaults, Properties, Styled};
    use crate::text::FixedAdvanceMeasurer;

    // A one-line cell is 14.4 of text plus 2pt padding and 0.5pt border on
    // each side: 19.4.
    const LINE_CELL: f64 = 19.4;

    fn run(table: &Table, widths: &[f64], available: f64) -> (RowsLayout, Vec<LayoutWarning>) {
        let defaults = Defaults::default();
        let measurer = FixedAdvanceMeasurer::default();
        let mut ctx = LayoutContext::new(&defaults, &measurer);
        let style = ResolvedStyle::resolve(
            &Properties::new(),
            ElementType::Table,
            None,
            &defaults,
            500.0,
            available,
        );
        let (grid, _) = table.model().body.grid(widths.len());
        let geometry = RowGeometry {
            page: 1,
            x: 0.0,
            y: 0.0,
            widths,
            available,
        };
        let rows = layout_rows(&grid, &geometry, &style, &mut ctx);
        (rows, ctx.into_warnings())
    }

    #[test]
    fn row_height_is_tallest_cell() {
        let mut table = Table::with_columns(2).unwrap();
        table.add_text_cell("a").add_text_cell("b\nc");
        let (rows, _) = run(&table, &[100.0, 100.0], 500.0);
        assert!(matches!(rows.verdict, RowsVerdict::Complete));
        assert!((rows.heights[0] - 33.8).abs() < 0.001);
        let (height, boxes) = rows.finish(None);
        assert!((height - 33.8).abs() < 0.001);
        assert!(boxes.iter().all(|b| (b.height - 33.8).abs() < 0.001));
    }

    #[test]
    fn spanning_cell_is_cut_at_the_split() {
        let mut table = Table::with_columns(2).unwrap();
        table
            .add_text_cell("r0")
            .add_cell(Cell::new(5, 1).add_text("x"))
            .add_text_cell("r1")
            .add_text_cell("r2")
            .add_text_cell("r3")
            .add_text_cell("r4");
        let (rows, _) = run(&table, &[100.0, 100.0], 3.0 * LINE_CELL + 5.0);
        let RowsVerdict::Split { split, overflow } = &rows.verdict else {
            panic!("expected a split, got {:?}", rows.verdict);
        };
        assert_eq!(split.num_rows(), 3);
        assert!(split.coverage().iter().flatten().all(|&c| c == 1));
        assert_eq!(overflow.num_rows(), 2);
        assert!(overflow.coverage().iter().flatten().all(|&c| c == 1));
        let carried = overflow.cells().find(|c| c.col == 1).unwrap();
        assert_eq!((carried.row, carried.rowspan), (0, 2));
        assert_eq!(carried.cell.spans(), Some((2, 1)));
        assert_eq!(
            overflow.rows.iter().map(|r| r.source).collect::<Vec<_>>(),
            vec![3, 4]
        );

        let (_, boxes) = rows.finish(None);
        let spanning = boxes
            .iter()
            .find(|b| b.grid.map(|g| g.col) == Some(1))
            .unwrap();
        assert!((spanning.height - 3.0 * LINE_CELL).abs() < 0.001);
        assert_eq!(spanning.grid.unwrap().rowspan, 3);
    }

    fn straddling_table(keep_together: bool) -> Table {
        let mut table = Table::with_columns(2).unwrap();
        table
            .add_text_cell("a")
            .add_text_cell("b")
            .add_text_cell("c")
            .add_cell(
                Cell::new(3, 1)
                    .add_text("x\ny\nz")
                    .with_keep_together(keep_together),
            )
            .add_text_cell("d")
            .add_text_cell("e");
        table
    }

    #[test]
    fn straddling_cell_splits_its_content() {
        let (rows, _) = run(&straddling_table(false), &[100.0, 100.0], 70.0);
        let RowsVerdict::Split { split, overflow } = &rows.verdict else {
            panic!("expected a split");
        };
        assert_eq!(split.num_rows(), 3);
        let carried = overflow.cells().find(|c| c.col == 1).unwrap();
        assert_eq!(carried.rowspan, 1);
        let text = carried.cell.children[0].text();
        assert_eq!(text, Some("z"));
    }

    #[test]
    fn keep_together_straddler_moves_the_split_up() {
        let (rows, _) = run(&straddling_table(true), &[100.0, 100.0], 70.0);
        let RowsVerdict::Split { split, overflow } = &rows.verdict else {
            panic!("expected a split");
        };
        assert_eq!(split.num_rows(), 1);
        assert_eq!(overflow.num_rows(), 3);
        let carried = overflow.cells().find(|c| c.col == 1).unwrap();
        assert_eq!((carried.row, carried.rowspan), (0, 3));
        assert_eq!(rows.heights.len(), 1);
    }

    #[test]
    fn nothing_in_first_row_is_nothing() {
        let mut table = Table::with_columns(1).unwrap();
        table.add_text_cell("a");
        let (rows, _) = run(&table, &[100.0], 10.0);
        assert!(matches!(rows.verdict, RowsVerdict::Nothing(_)));
    }

    #[test]
    fn partial_row_keeps_both_halves() {
        let mut table = Table::with_columns(2).unwrap();
        table.add_text_cell("a").add_text_cell("l1\nl2\nl3");
        let (rows, _) = run(&table, &[100.0, 100.0], 40.0);
        let RowsVerdict::Split { split, overflow } = &rows.verdict else {
            panic!("expected a split");
        };
        assert_eq!(split.num_rows(), 1);
        assert_eq!(overflow.num_rows(), 1);
        assert_eq!(split.rows[0].source, overflow.rows[0].source);
        let rest = overflow.cells().find(|c| c.col == 1).unwrap();
        assert_eq!(rest.cell.children[0].text(), Some("l3"));
        // the finished cell continues empty
        let done = overflow.cells().find(|c| c.col == 0).unwrap();
        assert!(done.cell.children.is_empty());
    }

    #[test]
    fn tall_spanning_cell_lets_its_rows_fill_the_area() {
        let lines: Vec<String> = (0..20).map(|i| format!("l{i}")).collect();
        let mut table = Table::with_columns(2).unwrap();
        table
            .add_text_cell("r0")
            .add_cell(Cell::new(5, 1).add_text(lines.join("\n")))
            .add_text_cell("r1")
            .add_text_cell("r2")
            .add_text_cell("r3")
            .add_text_cell("r4");
        let (rows, _) = run(&table, &[100.0, 100.0], 8.0 * LINE_CELL);
        let RowsVerdict::Split { split, overflow } = &rows.verdict else {
            panic!("expected a split, got {:?}", rows.verdict);
        };
        // every ordinary row fits; the last spanned row takes what the
        // spanning cell placed below the others
        assert_eq!(split.num_rows(), 5);
        assert_eq!(rows.heights.len(), 5);
        assert!(rows.heights[..4].iter().all(|h| (h - LINE_CELL).abs() < 0.001));
        // ten 14.4pt lines fit in 150.2pt of content height
        let placed = 10.0 * 14.4 + 5.0;
        assert!((rows.height() - placed).abs() < 0.001);
        assert_eq!(
            overflow.rows.iter().map(|r| r.source).collect::<Vec<_>>(),
            vec![4]
        );
        let carried = overflow.cells().find(|c| c.col == 1).unwrap();
        assert_eq!((carried.row, carried.rowspan), (0, 1));
        let rest = carried.cell.children[0].text().unwrap_or_default();
        assert!(rest.starts_with("l10"), "rest was {rest:?}");

        let (_, boxes) = rows.finish(None);
        let first = boxes
            .iter()
            .find(|b| b.grid.map(|g| (g.row, g.col)) == Some((0, 0)))
            .unwrap();
        assert!((first.height - LINE_CELL).abs() < 0.001);
        let spanning = boxes
            .iter()
            .find(|b| b.grid.map(|g| g.col) == Some(1))
            .unwrap();
        assert_eq!(spanning.grid.unwrap().rowspan, 5);
        assert!((spanning.height - placed).abs() < 0.001);
    }

    #[test]
    fn extension_stretches_the_last_row() {
        let mut table = Table::with_columns(1).unwrap();
        table.add_text_cell("a").add_text_cell("b");
        let (rows, _) = run(&table, &[100.0], 500.0);
        let (height, boxes) = rows.finish(Some(100.0));
        assert!((height - 100.0).abs() < 0.001);
        assert!((boxes[1].height - (100.0 - LINE_CELL)).abs() < 0.001);
        assert!((boxes[0].height - LINE_CELL).abs() < 0.001);
    }
}
