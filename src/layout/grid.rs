//! # Table Grid
//!
//! Turns the ordered cell list of a table into a fully resolved grid:
//! - Auto-placement in reading order (row-major sparse)
//! - Colspans clamped to the free run of columns at insertion
//! - Rowspans reserving their footprint in the rows below
//! - Gaps filled with synthesized empty cells
//!
//! Placement is a pure function: it returns new cell records and never
//! touches the caller's cells. The union of the footprints it produces tiles
//! `[0, rows) x [0, columns)` exactly.

use crate::model::{Cell, Element, ElementKind, TableEntry};
use crate::style::{Dimension, TableLayout};
use serde::{Deserialize, Serialize};

/// A cell with its resolved grid position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    pub rowspan: usize,
    pub colspan: usize,
    pub cell: Element,
}

impl GridCell {
    /// Index of the last row this cell covers.
    pub fn last_row(&self) -> usize {
        self.row + self.rowspan - 1
    }
}

/// One grid row: the cells whose footprint starts in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRow {
    /// Index of this row in the table as authored. Split and overflow
    /// copies keep it, so a row split across areas reports the same source.
    pub source: usize,
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub num_columns: usize,
    pub rows: Vec<GridRow>,
}

/// Output of [`place`].
#[derive(Debug, Clone)]
pub struct GridBuild {
    pub grid: Grid,
    /// The last row had free slots filled with synthesized cells.
    pub last_row_incomplete: bool,
}

impl Grid {
    pub fn empty(num_columns: usize) -> Self {
        Self {
            num_columns,
            rows: vec![],
        }
    }

    /// Group `cells` into rows by their start row. `sources` gives the
    /// source index of each row and fixes the row count.
    pub(crate) fn from_cells(num_columns: usize, sources: Vec<usize>, cells: Vec<GridCell>) -> Self {
        let mut rows: Vec<GridRow> = sources
            .into_iter()
            .map(|source| GridRow {
                source,
                cells: vec![],
            })
            .collect();
        for cell in cells {
            if let Some(row) = rows.get_mut(cell.row) {
                row.cells.push(cell);
            }
        }
        for row in &mut rows {
            row.cells.sort_by_key(|c| c.col);
        }
        Self { num_columns, rows }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn cells(&self) -> impl Iterator<Item = &GridCell> + '_ {
        self.rows.iter().flat_map(|r| r.cells.iter())
    }

    /// Occupancy count for every slot. A well-formed grid has 1 everywhere.
    pub fn coverage(&self) -> Vec<Vec<usize>> {
        let mut cover = vec![vec![0; self.num_columns]; self.rows.len()];
        for cell in self.cells() {
            for row in cover.iter_mut().skip(cell.row).take(cell.rowspan) {
                for slot in row.iter_mut().skip(cell.col).take(cell.colspan) {
                    *slot += 1;
                }
            }
        }
        cover
    }

    /// The cells back in reading order, each declaring the spans it was
    /// given. Placing them again rebuilds this grid: every slot is covered,
    /// so no row breaks are needed.
    pub(crate) fn into_entries(self) -> Vec<TableEntry> {
        self.rows
            .into_iter()
            .flat_map(|row| row.cells)
            .map(|c| {
                TableEntry::Cell(c.cell.with_kind(ElementKind::Cell {
                    rowspan: c.rowspan as u32,
                    colspan: c.colspan as u32,
                }))
            })
            .collect()
    }
}

/// Place cells in reading order on a grid of `num_columns` columns.
///
/// A cell goes to the next free slot. Its colspan is clamped to the run of
/// free columns starting there; its rowspan reserves the slots below so
/// later cells skip them. [`TableEntry::NewRow`] moves the cursor to the
/// start of the next row.
pub fn place(entries: &[TableEntry], num_columns: usize) -> GridBuild {
    if num_columns == 0 {
        return GridBuild {
            grid: Grid::empty(0),
            last_row_incomplete: false,
        };
    }

    let mut occupied: Vec<Vec<bool>> = Vec::new();
    let mut placed: Vec<GridCell> = Vec::new();
    let mut total_rows = 0;
    let mut row = 0;
    let mut col = 0;

    for entry in entries {
        let element = match entry {
            TableEntry::NewRow => {
                row += 1;
                col = 0;
                total_rows = total_rows.max(row);
                continue;
            }
            TableEntry::Cell(element) => element,
        };
        let (rowspan, declared_colspan) = element.spans().unwrap_or((1, 1));

        // Find next free slot
        loop {
            if col >= num_columns {
                col = 0;
                row += 1;
            }
            while occupied.len() <= row {
                occupied.push(vec![false; num_columns]);
            }
            if !occupied[row][col] {
                break;
            }
            col += 1;
        }

        let free_run = occupied[row][col..]
            .iter()
            .take_while(|taken| !**taken)
            .count();
        let colspan = declared_colspan.min(free_run);
        if colspan < declared_colspan {
            tracing::debug!(
                row,
                col,
                declared = declared_colspan,
                clamped = colspan,
                "colspan clamped to the free columns"
            );
        }

        while occupied.len() < row + rowspan {
            occupied.push(vec![false; num_columns]);
        }
        for r in occupied.iter_mut().skip(row).take(rowspan) {
            for slot in r.iter_mut().skip(col).take(colspan) {
                *slot = true;
            }
        }

        placed.push(GridCell {
            row,
            col,
            rowspan,
            colspan,
            cell: element.clone(),
        });
        total_rows = total_rows.max(row + rowspan);
        col += colspan;
    }

    while occupied.len() < total_rows {
        occupied.push(vec![false; num_columns]);
    }

    let mut last_row_incomplete = false;
    for (r, slots) in occupied.iter().enumerate().take(total_rows) {
        for (c, taken) in slots.iter().enumerate() {
            if !*taken {
                if r + 1 == total_rows {
                    last_row_incomplete = true;
                }
                placed.push(GridCell {
                    row: r,
                    col: c,
                    rowspan: 1,
                    colspan: 1,
                    cell: Cell::new(1, 1).into(),
                });
            }
        }
    }

    GridBuild {
        grid: Grid::from_cells(num_columns, (0..total_rows).collect(), placed),
        last_row_incomplete,
    }
}

/// Resolve column widths in points.
///
/// 1. Point columns → exact size
/// 2. Percent columns → share of `table_width`
/// 3. Auto columns → what remains, split in proportion to `samples` (each
///    column's widest content) under [`TableLayout::Auto`], evenly under
///    [`TableLayout::Fixed`] or when nothing was sampled
pub fn resolve_column_widths(
    columns: &[Dimension],
    table_width: f64,
    layout: TableLayout,
    samples: &[f64],
) -> Vec<f64> {
    let mut widths = vec![0.0_f64; columns.len()];
    let mut remaining = table_width;
    let mut auto = Vec::new();

    for (i, column) in columns.iter().enumerate() {
        match column {
            Dimension::Pt(w) => {
                widths[i] = *w;
                remaining -= w;
            }
            Dimension::Percent(p) => {
                widths[i] = table_width * p / 100.0;
                remaining -= widths[i];
            }
            Dimension::Auto => auto.push(i),
        }
    }

    if auto.is_empty() {
        return widths;
    }

    remaining = remaining.max(0.0);
    let sampled: f64 = auto
        .iter()
        .map(|&i| samples.get(i).copied().unwrap_or(0.0))
        .sum();

    for &i in &auto {
        widths[i] = match layout {
            TableLayout::Auto if sampled > 0.0 => {
                remaining * samples.get(i).copied().unwrap_or(0.0) / sampled
            }
            _ => remaining / auto.len() as f64,
        };
    }

    widths
}

/// Width of a cell spanning `colspan` columns starting at `col`.
pub fn span_width(col: usize, colspan: usize, widths: &[f64]) -> f64 {
    widths.iter().skip(col).take(colspan).sum()
}

/// X offset of column `col` from the table's content edge.
pub fn column_x_offset(col: usize, widths: &[f64]) -> f64 {
    widths.iter().take(col).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cell(rowspan: u32, colspan: u32) -> TableEntry {
        TableEntry::Cell(Cell::new(rowspan, colspan).into())
    }

    fn is_tiled(grid: &Grid) -> bool {
        grid.coverage().iter().all(|row| row.iter().all(|n| *n == 1))
    }

    #[test]
    fn simple_reading_order() {
        let build = place(&[cell(1, 1), cell(1, 1), cell(1, 1), cell(1, 1)], 2);
        let grid = &build.grid;
        assert_eq!(grid.num_rows(), 2);
        let positions: Vec<_> = grid.cells().map(|c| (c.row, c.col)).collect();
        assert_eq!(positions, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
        assert!(!build.last_row_incomplete);
    }

    #[test]
    fn rowspan_reserves_slots() {
        // 2 columns: [a][B], [c][B], [d][e]
        let build = place(&[cell(1, 1), cell(2, 1), cell(1, 1), cell(1, 1), cell(1, 1)], 2);
        let grid = &build.grid;
        assert_eq!(grid.num_rows(), 3);
        let positions: Vec<_> = grid.cells().map(|c| (c.row, c.col, c.rowspan)).collect();
        assert_eq!(
            positions,
            vec![(0, 0, 1), (0, 1, 2), (1, 0, 1), (2, 0, 1), (2, 1, 1)]
        );
        assert!(is_tiled(grid));
    }

    #[test]
    fn colspan_is_clamped_not_wrapped() {
        let build = place(&[cell(1, 1), cell(1, 5)], 3);
        let spans: Vec<_> = build.grid.cells().map(|c| (c.row, c.col, c.colspan)).collect();
        assert_eq!(spans, vec![(0, 0, 1), (0, 1, 2)]);
    }

    #[test]
    fn colspan_clamped_by_rowspan_reservation() {
        // [A rowspan 2 at col 2], then row 1 starts with a colspan 3 cell
        let build = place(&[cell(1, 1), cell(1, 1), cell(2, 1), cell(1, 3)], 3);
        let grid = &build.grid;
        let last = grid.rows[1].cells.first().unwrap();
        assert_eq!((last.row, last.col, last.colspan), (1, 0, 2));
        assert!(is_tiled(grid));
    }

    #[test]
    fn incomplete_last_row_is_filled_and_reported() {
        let build = place(&[cell(1, 1), cell(1, 1), cell(1, 1)], 2);
        assert!(build.last_row_incomplete);
        assert_eq!(build.grid.cells().count(), 4);
        assert!(is_tiled(&build.grid));
    }

    #[test]
    fn new_row_fills_gaps_without_warning_for_middle_rows() {
        let build = place(
            &[cell(1, 1), TableEntry::NewRow, cell(1, 1), cell(1, 1)],
            2,
        );
        assert_eq!(build.grid.num_rows(), 2);
        assert!(!build.last_row_incomplete);
        assert!(is_tiled(&build.grid));
    }

    #[test]
    fn trailing_new_row_after_full_row_is_ignored() {
        let build = place(&[cell(1, 1), cell(1, 1), TableEntry::NewRow], 2);
        // the cursor sat past the last column, so the new row opens row 1
        assert_eq!(build.grid.num_rows(), 1);
        assert!(!build.last_row_incomplete);
    }

    #[test]
    fn input_cells_are_not_mutated() {
        let entries = vec![cell(1, 9)];
        let _ = place(&entries, 2);
        match &entries[0] {
            TableEntry::Cell(el) => assert_eq!(el.spans(), Some((1, 9))),
            TableEntry::NewRow => unreachable!(),
        }
    }

    #[test]
    fn column_widths_mixed() {
        let widths = resolve_column_widths(
            &[Dimension::Pt(100.0), Dimension::Percent(25.0), Dimension::Auto],
            400.0,
            TableLayout::Auto,
            &[0.0, 0.0, 10.0],
        );
        assert!((widths[0] - 100.0).abs() < 0.001);
        assert!((widths[1] - 100.0).abs() < 0.001);
        assert!((widths[2] - 200.0).abs() < 0.001);
    }

    #[test]
    fn auto_columns_proportional_to_content() {
        let widths = resolve_column_widths(
            &[Dimension::Auto, Dimension::Auto],
            300.0,
            TableLayout::Auto,
            &[10.0, 20.0],
        );
        assert!((widths[0] - 100.0).abs() < 0.001);
        assert!((widths[1] - 200.0).abs() < 0.001);

        let fixed = resolve_column_widths(
            &[Dimension::Auto, Dimension::Auto],
            300.0,
            TableLayout::Fixed,
            &[10.0, 20.0],
        );
        assert!((fixed[0] - 150.0).abs() < 0.001);
    }

    #[test]
    fn span_helpers() {
        let widths = [10.0, 20.0, 30.0];
        assert!((span_width(1, 2, &widths) - 50.0).abs() < 0.001);
        assert!((column_x_offset(2, &widths) - 30.0).abs() < 0.001);
    }

    proptest! {
        #[test]
        fn placement_always_tiles(
            spans in proptest::collection::vec((1u32..4, 1u32..5, any::<bool>()), 0..40),
            columns in 1usize..6,
        ) {
            let entries: Vec<TableEntry> = spans
                .iter()
                .flat_map(|(r, c, new_row)| {
                    let mut v = vec![cell(*r, *c)];
                    if *new_row {
                        v.push(TableEntry::NewRow);
                    }
                    v
                })
                .collect();
            let build = place(&entries, columns);
            prop_assert!(is_tiled(&build.grid));
            for c in build.grid.cells() {
                prop_assert!(c.col + c.colspan <= columns);
                prop_assert!(c.row + c.rowspan <= build.grid.num_rows());
            }
        }
    }
}
