use super::{Cell, Element, ElementKind};
use crate::error::{check_dimension, QuireError};
use crate::layout::grid::{self, Grid};
use crate::style::{Dimension, Properties, Property, PropertyValue, Styled, TableLayout};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// The table payload of an [`Element`]: columns, cells and repetition flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableModel {
    /// Declared column widths. Never empty.
    pub columns: Vec<Dimension>,

    #[serde(default)]
    pub body: TableRows,

    /// Rows repeated at the top of every area the table occupies.
    #[serde(default)]
    pub header: TableRows,

    /// Rows repeated at the bottom of every area the table occupies.
    #[serde(default)]
    pub footer: TableRows,

    /// Omit the header on the table's first area.
    #[serde(default)]
    pub skip_first_header: bool,

    /// Omit the footer on the area where the table ends.
    #[serde(default)]
    pub skip_last_footer: bool,

    /// Stretch the last row to the bottom of the area when the table ends.
    #[serde(default)]
    pub extend_bottom_row: bool,

    /// Stretch the last row to the bottom of the area when the table splits.
    #[serde(default)]
    pub extend_bottom_row_on_split: bool,

    /// Set on overflow copies: this table already started in an earlier area.
    #[serde(default)]
    pub continued: bool,

    /// Column widths fixed by the first placement. Continuations reuse them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_widths: Option<Vec<f64>>,
}

/// Table rows, either as authored or as a grid already built by a previous
/// placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableRows {
    Entries(Vec<TableEntry>),
    Grid(Grid),
}

impl Default for TableRows {
    fn default() -> Self {
        TableRows::Entries(vec![])
    }
}

/// One step of table construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TableEntry {
    Cell(Element),
    /// Finish the current row; the next cell starts a new one.
    NewRow,
}

impl TableRows {
    /// The grid for these rows and whether the last row had to be completed
    /// with synthesized cells. A prebuilt grid is borrowed as-is.
    pub fn grid(&self, num_columns: usize) -> (Cow<'_, Grid>, bool) {
        match self {
            TableRows::Entries(entries) => {
                let built = grid::place(entries, num_columns);
                (Cow::Owned(built.grid), built.last_row_incomplete)
            }
            TableRows::Grid(g) => (Cow::Borrowed(g), false),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            TableRows::Entries(entries) => entries.is_empty(),
            TableRows::Grid(g) => g.rows.is_empty(),
        }
    }

    pub fn as_grid(&self) -> Option<&Grid> {
        match self {
            TableRows::Grid(g) => Some(g),
            TableRows::Entries(_) => None,
        }
    }

    fn cells(&self) -> Box<dyn Iterator<Item = &Element> + '_> {
        match self {
            TableRows::Entries(entries) => Box::new(entries.iter().filter_map(|e| match e {
                TableEntry::Cell(cell) => Some(cell),
                TableEntry::NewRow => None,
            })),
            TableRows::Grid(g) => Box::new(g.cells().map(|c| &c.cell)),
        }
    }
}

impl TableModel {
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Source row indices of the body, in order. Available once a grid has
    /// been built (on split and overflow copies).
    pub fn source_rows(&self) -> Option<Vec<usize>> {
        self.body
            .as_grid()
            .map(|g| g.rows.iter().map(|r| r.source).collect())
    }

    pub(crate) fn validate(&self) -> Result<(), QuireError> {
        validate_columns(&self.columns)?;
        if let Some(widths) = &self.column_widths {
            for w in widths {
                check_dimension("column width", *w)?;
            }
        }
        for rows in [&self.body, &self.header, &self.footer] {
            for cell in rows.cells() {
                cell.validate()?;
            }
        }
        Ok(())
    }
}

fn validate_columns(columns: &[Dimension]) -> Result<(), QuireError> {
    if columns.is_empty() {
        return Err(QuireError::NoColumns);
    }
    columns.iter().try_for_each(|c| c.validate("column width"))
}

/// Builder for a table element.
///
/// ```
/// use quire::model::{Cell, Table};
///
/// let mut table = Table::with_columns(2).unwrap();
/// table
///     .add_header_cell(Cell::new(1, 2).add_text("Header"))
///     .add_text_cell("a")
///     .add_text_cell("b");
/// ```
#[derive(Debug, Clone)]
pub struct Table {
    model: TableModel,
    properties: Properties,
    id: Option<String>,
}

impl Table {
    /// A table with the given column widths.
    pub fn new(columns: Vec<Dimension>) -> Result<Self, QuireError> {
        validate_columns(&columns)?;
        Ok(Self {
            model: TableModel {
                columns,
                body: TableRows::default(),
                header: TableRows::default(),
                footer: TableRows::default(),
                skip_first_header: false,
                skip_last_footer: false,
                extend_bottom_row: false,
                extend_bottom_row_on_split: false,
                continued: false,
                column_widths: None,
            },
            properties: Properties::new(),
            id: None,
        })
    }

    /// `count` automatic columns.
    pub fn with_columns(count: usize) -> Result<Self, QuireError> {
        Self::new(vec![Dimension::Auto; count])
    }

    pub fn with_point_widths(widths: &[f64]) -> Result<Self, QuireError> {
        Self::new(widths.iter().map(|w| Dimension::Pt(*w)).collect())
    }

    pub fn with_percent_widths(percents: &[f64]) -> Result<Self, QuireError> {
        Self::new(percents.iter().map(|p| Dimension::Percent(*p)).collect())
    }

    /// Columns sized in proportion to `weights`, filling the container.
    pub fn with_relative_widths(weights: &[f64]) -> Result<Self, QuireError> {
        for w in weights {
            check_dimension("relative column width", *w)?;
        }
        let total: f64 = weights.iter().sum();
        if weights.is_empty() {
            return Err(QuireError::NoColumns);
        }
        if total <= 0.0 {
            return Err(QuireError::InvalidDimension {
                what: "relative column widths",
                value: total,
            });
        }
        let mut table = Self::new(
            weights
                .iter()
                .map(|w| Dimension::Percent(w / total * 100.0))
                .collect(),
        )?;
        table.set_width(Dimension::Percent(100.0));
        Ok(table)
    }

    pub fn number_of_columns(&self) -> usize {
        self.model.num_columns()
    }

    pub fn model(&self) -> &TableModel {
        &self.model
    }

    pub fn add_cell(&mut self, cell: Cell) -> &mut Self {
        push_entry(&mut self.model.body, TableEntry::Cell(cell.into()));
        self
    }

    /// Add a 1x1 cell holding one paragraph.
    pub fn add_text_cell(&mut self, text: impl Into<String>) -> &mut Self {
        self.add_cell(Cell::new(1, 1).add_text(text))
    }

    pub fn add_header_cell(&mut self, cell: Cell) -> &mut Self {
        push_entry(&mut self.model.header, TableEntry::Cell(cell.into()));
        self
    }

    pub fn add_footer_cell(&mut self, cell: Cell) -> &mut Self {
        push_entry(&mut self.model.footer, TableEntry::Cell(cell.into()));
        self
    }

    /// Finish the current body row even if it has free slots left.
    pub fn start_new_row(&mut self) -> &mut Self {
        push_entry(&mut self.model.body, TableEntry::NewRow);
        self
    }

    pub fn set_skip_first_header(&mut self, skip: bool) -> &mut Self {
        self.model.skip_first_header = skip;
        self
    }

    pub fn set_skip_last_footer(&mut self, skip: bool) -> &mut Self {
        self.model.skip_last_footer = skip;
        self
    }

    pub fn set_extend_bottom_row(&mut self, extend: bool) -> &mut Self {
        self.model.extend_bottom_row = extend;
        self
    }

    pub fn set_extend_bottom_row_on_split(&mut self, extend: bool) -> &mut Self {
        self.model.extend_bottom_row_on_split = extend;
        self
    }

    pub fn set_keep_together(&mut self, keep: bool) -> &mut Self {
        self.properties
            .set(Property::KeepTogether, PropertyValue::Flag(keep));
        self
    }

    /// Share automatic column widths evenly instead of sampling content.
    pub fn set_fixed_layout(&mut self) -> &mut Self {
        self.properties.set(
            Property::TableLayout,
            PropertyValue::TableLayout(TableLayout::Fixed),
        );
        self
    }

    pub fn set_width(&mut self, width: Dimension) -> &mut Self {
        self.properties
            .set(Property::Width, PropertyValue::Dimension(width));
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn into_element(self) -> Element {
        let mut element = Element::of_kind(ElementKind::Table(Box::new(self.model)));
        element.properties = self.properties;
        element.id = self.id;
        element
    }
}

fn push_entry(rows: &mut TableRows, entry: TableEntry) {
    match rows {
        TableRows::Entries(entries) => entries.push(entry),
        TableRows::Grid(grid) => {
            let grid = std::mem::replace(grid, Grid::empty(0));
            let mut entries = grid.into_entries();
            entries.push(entry);
            *rows = TableRows::Entries(entries);
        }
    }
}

impl Styled for Table {
    fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }
}

impl From<Table> for Element {
    fn from(table: Table) -> Self {
        table.into_element()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_columns_fail_fast() {
        assert!(matches!(Table::with_columns(0), Err(QuireError::NoColumns)));
        assert!(matches!(Table::new(vec![]), Err(QuireError::NoColumns)));
    }

    #[test]
    fn invalid_widths_fail_fast() {
        assert!(Table::with_point_widths(&[10.0, -1.0]).is_err());
        assert!(Table::with_point_widths(&[f64::NAN]).is_err());
        assert!(Table::with_relative_widths(&[0.0, 0.0]).is_err());
    }

    #[test]
    fn relative_widths_normalize_to_percent() {
        let table = Table::with_relative_widths(&[1.0, 3.0]).unwrap();
        let cols = &table.model().columns;
        assert_eq!(cols[0], Dimension::Percent(25.0));
        assert_eq!(cols[1], Dimension::Percent(75.0));
        let el = table.into_element();
        assert_eq!(
            el.properties.get(Property::Width),
            Some(PropertyValue::Dimension(Dimension::Percent(100.0)))
        );
    }

    #[test]
    fn builder_records_entries_in_order() {
        let mut table = Table::with_columns(3).unwrap();
        table
            .add_text_cell("a")
            .start_new_row()
            .add_text_cell("b")
            .add_header_cell(Cell::new(1, 3))
            .set_skip_first_header(true);
        let model = table.model();
        match &model.body {
            TableRows::Entries(entries) => {
                assert_eq!(entries.len(), 3);
                assert!(matches!(entries[1], TableEntry::NewRow));
            }
            TableRows::Grid(_) => panic!("expected entries"),
        }
        assert!(!model.header.is_empty());
        assert!(model.footer.is_empty());
        assert!(model.skip_first_header);
    }

    #[test]
    fn adding_to_a_built_grid_keeps_its_cells() {
        let mut table = Table::with_columns(2).unwrap();
        table
            .add_cell(Cell::new(2, 1).add_text("span"))
            .add_text_cell("a")
            .add_text_cell("b")
            .add_text_cell("c")
            .add_text_cell("x");
        let built = table.model.body.grid(2).0.into_owned();
        table.model.body = TableRows::Grid(built);

        table.add_text_cell("d");
        let (grid, incomplete) = table.model.body.grid(2);
        assert!(incomplete);
        assert_eq!(grid.num_rows(), 4);
        assert!(grid.coverage().iter().flatten().all(|&c| c == 1));
        let span = grid.cells().find(|c| c.rowspan == 2).unwrap();
        assert_eq!((span.row, span.col), (0, 0));
        let d = grid
            .cells()
            .find(|c| c.cell.children.first().and_then(|p| p.text()) == Some("d"))
            .unwrap();
        assert_eq!((d.row, d.col), (3, 0));
    }

    #[test]
    fn table_json_round_trip_keeps_flags() {
        let mut table = Table::with_point_widths(&[50.0, 50.0]).unwrap();
        table.add_text_cell("x").set_skip_last_footer(true);
        let el: Element = table.into();
        let json = serde_json::to_string(&el).unwrap();
        let back: Element = serde_json::from_str(&json).unwrap();
        let model = back.as_table().unwrap();
        assert!(model.skip_last_footer);
        assert_eq!(model.num_columns(), 2);
    }
}
