//! # Area-Based Layout Engine
//!
//! Content is never laid out on an endless canvas and sliced afterwards.
//! Every element is asked to lay itself out INTO an area of known size and
//! answers with a [`LayoutResult`]:
//!
//! 1. FULL: everything fit; the occupied part of the area is reported
//! 2. PARTIAL: part fit; the element hands back a split copy (what was
//!    placed) and an overflow copy (what is left for the next area)
//! 3. NOTHING: not even the first unit fit; no space is consumed
//!
//! Containers recurse with the same contract, so a table inside a cell
//! inside a div splits the same way a paragraph does. The document driver
//! here only opens pages and feeds the overflow of one page into the next.
//!
//! When an element places nothing even on a fresh page, the driver warns
//! once and lays it out again in forced mode: keep-together is ignored and
//! whatever cannot fit is clipped. This guarantees progress.

pub mod area;
pub mod context;
pub mod dispatch;
pub mod grid;
pub mod page_break;
pub mod result;

mod block;
mod float;
mod leaf;
mod measure;
mod row;
mod table;

use serde::Serialize;

use crate::error::QuireError;
use crate::model::{Document, Element, ElementType, PageConfig};
use crate::style::{Border, Color, Defaults, EdgeValues, Properties, ResolvedStyle, VerticalAlignment};
use crate::text::{FixedAdvanceMeasurer, TextMeasurer};

pub use area::{LayoutArea, OccupiedArea, Rect};
pub use context::{LayoutContext, LayoutWarning};
pub use result::{LayoutResult, LayoutStatus, NothingCause, NothingReason};

use block::{layout_flow, FlowStatus};

/// Tolerance for comparing heights and widths in points.
pub(crate) const EPSILON: f64 = 1e-4;

/// A positioned box on a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutBox {
    pub kind: ElementType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Absolute position on the page (top-left of the border box).
    pub x: f64,
    pub y: f64,
    /// Border-box size, margins excluded.
    pub width: f64,
    pub height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
    pub border: EdgeValues<Border>,
    pub draw: DrawCommand,
    /// Child boxes, positioned relative to the page, not the parent.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LayoutBox>,
    /// Content was cut off at this box's bottom edge.
    pub clipped: bool,
    /// For cells: where in the table grid the box sits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridPosition>,
}

/// What a box draws besides its background and border.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DrawCommand {
    /// Nothing to draw (just a container).
    #[default]
    None,
    #[serde(rename_all = "camelCase")]
    Text { lines: Vec<TextLine>, font_size: f64 },
    /// The image scaled to `width` x `height`.
    Image { width: f64, height: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
}

/// A cell's slot in the grid of the table part it was placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridPosition {
    pub row: usize,
    pub col: usize,
    pub rowspan: usize,
    pub colspan: usize,
}

impl LayoutBox {
    pub fn new(element: &Element, rect: Rect) -> Self {
        Self {
            kind: element.element_type(),
            id: element.id.clone(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            background: None,
            border: EdgeValues::default(),
            draw: DrawCommand::None,
            children: vec![],
            clipped: false,
            grid: None,
        }
    }

    pub(crate) fn styled(mut self, style: &ResolvedStyle) -> Self {
        self.background = style.background_color;
        self.border = style.border;
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Shift this box and everything in it.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
        if let DrawCommand::Text { ref mut lines, .. } = self.draw {
            for line in lines.iter_mut() {
                line.x += dx;
                line.y += dy;
            }
        }
        for child in &mut self.children {
            child.translate(dx, dy);
        }
    }

    /// Grow the box to `height`, moving the content inside by the vertical
    /// alignment.
    pub(crate) fn stretch_to(&mut self, height: f64, alignment: VerticalAlignment) {
        if height <= self.height + EPSILON {
            return;
        }
        let dy = alignment.offset(height - self.height);
        if dy > 0.0 {
            for child in &mut self.children {
                child.translate(0.0, dy);
            }
        }
        self.height = height;
    }

    /// This box and all boxes below it, depth first.
    pub fn descendants(&self) -> Vec<&LayoutBox> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.descendants());
        }
        out
    }

    /// The first box in this tree with the given id.
    pub fn find(&self, id: &str) -> Option<&LayoutBox> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Text drawn by this box, lines joined with `\n`.
    pub fn text(&self) -> Option<String> {
        match &self.draw {
            DrawCommand::Text { lines, .. } => Some(
                lines
                    .iter()
                    .map(|l| l.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            _ => None,
        }
    }
}

/// A laid-out page.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutPage {
    /// 1-based.
    pub number: usize,
    pub width: f64,
    pub height: f64,
    pub boxes: Vec<LayoutBox>,
}

impl LayoutPage {
    /// Every box on the page, depth first.
    pub fn all_boxes(&self) -> Vec<&LayoutBox> {
        self.boxes.iter().flat_map(LayoutBox::descendants).collect()
    }

    pub fn find(&self, id: &str) -> Option<&LayoutBox> {
        self.boxes.iter().find_map(|b| b.find(id))
    }
}

/// The result of laying out a whole document.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutOutput {
    pub pages: Vec<LayoutPage>,
    pub warnings: Vec<LayoutWarning>,
}

/// The result of one layout call, with the warnings it raised.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutAttempt {
    pub result: LayoutResult,
    pub warnings: Vec<LayoutWarning>,
}

/// Tracks the page being filled.
#[derive(Debug, Clone)]
struct PageCursor {
    config: PageConfig,
    number: usize,
}

impl PageCursor {
    fn new(config: &PageConfig) -> Self {
        Self {
            config: config.clone(),
            number: 1,
        }
    }

    fn area(&self) -> LayoutArea {
        let (page_w, page_h) = self.config.size.dimensions();
        let margin = &self.config.margin;
        LayoutArea::new(
            self.number,
            Rect::new(
                margin.left,
                margin.top,
                (page_w - margin.horizontal()).max(0.0),
                (page_h - margin.vertical()).max(0.0),
            ),
        )
    }

    fn finalize(&mut self, boxes: Vec<LayoutBox>) -> LayoutPage {
        let (width, height) = self.config.size.dimensions();
        let page = LayoutPage {
            number: self.number,
            width,
            height,
            boxes,
        };
        self.number += 1;
        page
    }
}

/// The layout engine. Holds the text measurement service.
#[derive(Debug)]
pub struct LayoutEngine {
    measurer: Box<dyn TextMeasurer>,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self {
            measurer: Box::new(FixedAdvanceMeasurer::default()),
        }
    }

    pub fn with_measurer(measurer: impl TextMeasurer + 'static) -> Self {
        Self {
            measurer: Box::new(measurer),
        }
    }

    /// Lay out a document into pages.
    pub fn layout(&self, document: &Document) -> Result<LayoutOutput, QuireError> {
        document.validate()?;
        let defaults = &document.defaults;
        let mut ctx = LayoutContext::new(defaults, self.measurer.as_ref());
        let mut cursor = PageCursor::new(&document.page);
        let mut pages: Vec<LayoutPage> = Vec::new();
        let mut pending = document.children.clone();
        let mut forced = false;

        while !pending.is_empty() {
            if cursor.number > defaults.max_pages {
                return Err(QuireError::PageLimitExceeded(defaults.max_pages));
            }
            let area = cursor.area();
            let root = ResolvedStyle::resolve(
                &Properties::new(),
                ElementType::Div,
                None,
                defaults,
                area.bbox.width,
                area.bbox.height,
            );

            let _span = tracing::debug_span!("page", number = area.page, forced).entered();
            ctx.set_forced(forced);
            let flow = layout_flow(&pending, &area, &root, &mut ctx);
            ctx.set_forced(false);

            let stuck = match &flow.status {
                FlowStatus::Nothing(cause) => Some(cause.clone()),
                // only floats deferred, nothing placed
                FlowStatus::Split { .. } if flow.boxes.is_empty() => pending
                    .first()
                    .map(|e| NothingCause::new(e, NothingReason::DoesNotFit)),
                _ => None,
            };
            if let Some(cause) = stuck {
                if forced {
                    tracing::error!(
                        element = %cause.element,
                        id = ?cause.id,
                        page = area.page,
                        "element cannot be placed even in forced mode, dropping it"
                    );
                    let index = pending
                        .iter()
                        .position(|e| !e.is_area_break())
                        .unwrap_or(0);
                    pending.remove(index);
                    forced = false;
                } else {
                    ctx.warn(LayoutWarning::ElementDoesNotFitArea {
                        element: cause.element,
                        id: cause.id,
                        page: area.page,
                    });
                    forced = true;
                }
                continue;
            }

            let placed = flow.boxes.len();
            pages.push(cursor.finalize(flow.boxes));
            match flow.status {
                FlowStatus::Split { split, overflow } => {
                    // a forced element stays forced through its continuations
                    forced = forced && flow.split_inside && split.len() == 1;
                    tracing::debug!(placed, remaining = overflow.len(), "page full");
                    pending = overflow;
                }
                _ => pending.clear(),
            }
        }

        let warnings = ctx.into_warnings();
        for warning in &warnings {
            warning.log();
        }
        Ok(LayoutOutput { pages, warnings })
    }

    /// Lay out one element into one area.
    pub fn layout_element(
        &self,
        element: &Element,
        area: &LayoutArea,
        defaults: &Defaults,
    ) -> LayoutAttempt {
        let mut ctx = LayoutContext::new(defaults, self.measurer.as_ref());
        let result = dispatch::layout(element, area, None, &mut ctx);
        let warnings = ctx.into_warnings();
        for warning in &warnings {
            warning.log();
        }
        LayoutAttempt { result, warnings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edges, PageSize};
    use crate::style::Styled;

    fn document(children: Vec<Element>, height: f64) -> Document {
        let mut doc = Document::new(children);
        doc.page = PageConfig {
            size: PageSize::Custom {
                width: 200.0,
                height,
            },
            margin: Edges::uniform(0.0),
        };
        doc
    }

    fn lines(n: usize) -> Vec<Element> {
        (0..n).map(|i| Element::paragraph(format!("line {i}"))).collect()
    }

    #[test]
    fn translate_moves_text_lines() {
        let mut b = LayoutBox::new(&Element::paragraph("x"), Rect::new(0.0, 0.0, 10.0, 10.0));
        b.draw = DrawCommand::Text {
            lines: vec![TextLine {
                x: 1.0,
                y: 2.0,
                width: 5.0,
                height: 5.0,
                text: "x".into(),
            }],
            font_size: 12.0,
        };
        b.translate(3.0, 4.0);
        assert!((b.x - 3.0).abs() < 0.001);
        match &b.draw {
            DrawCommand::Text { lines, .. } => {
                assert!((lines[0].x - 4.0).abs() < 0.001);
                assert!((lines[0].y - 6.0).abs() < 0.001);
            }
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn stretch_centers_children() {
        let mut cell = LayoutBox::new(&Element::div(vec![]), Rect::new(0.0, 0.0, 10.0, 20.0));
        cell.children
            .push(LayoutBox::new(&Element::paragraph("x"), Rect::new(0.0, 0.0, 10.0, 20.0)));
        cell.stretch_to(40.0, VerticalAlignment::Middle);
        assert!((cell.height - 40.0).abs() < 0.001);
        assert!((cell.children[0].y - 10.0).abs() < 0.001);
    }

    #[test]
    fn content_flows_onto_next_page() {
        // 14.4pt lines, three per page
        let output = LayoutEngine::new()
            .layout(&document(lines(7), 45.0))
            .unwrap();
        assert_eq!(output.pages.len(), 3);
        assert_eq!(output.pages[0].boxes.len(), 3);
        assert_eq!(output.pages[2].boxes.len(), 1);
        assert_eq!(output.pages[2].number, 3);
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn area_break_starts_new_page() {
        let children = vec![
            Element::paragraph("a"),
            Element::area_break(),
            Element::paragraph("b"),
        ];
        let output = LayoutEngine::new()
            .layout(&document(children, 400.0))
            .unwrap();
        assert_eq!(output.pages.len(), 2);
        assert_eq!(output.pages[1].boxes[0].text().as_deref(), Some("b"));
    }

    #[test]
    fn oversized_element_is_forced_with_one_warning() {
        let image = Element::image(100.0, 500.0).unwrap().with_id("big");
        let output = LayoutEngine::new()
            .layout(&document(vec![image, Element::paragraph("after")], 200.0))
            .unwrap();
        let does_not_fit = output
            .warnings
            .iter()
            .filter(|w| matches!(w, LayoutWarning::ElementDoesNotFitArea { .. }))
            .count();
        assert_eq!(does_not_fit, 1);
        let big = output.pages[0].find("big").unwrap();
        assert!(big.clipped);
        assert!((big.height - 200.0).abs() < 0.001);
        // the page is full, what follows goes to the next one
        assert_eq!(output.pages.len(), 2);
        assert_eq!(output.pages[1].boxes[0].text().as_deref(), Some("after"));
    }

    #[test]
    fn forced_split_keeps_going_without_repeating_the_warning() {
        let div = Element::div(lines(8)).with_keep_together(true);
        let output = LayoutEngine::new().layout(&document(vec![div], 45.0)).unwrap();
        assert_eq!(output.pages.len(), 3);
        assert_eq!(output.warnings.len(), 1);
    }

    #[test]
    fn page_limit_is_enforced() {
        let mut doc = document(lines(10), 20.0);
        doc.defaults.max_pages = 3;
        let err = LayoutEngine::new().layout(&doc).unwrap_err();
        assert!(matches!(err, QuireError::PageLimitExceeded(3)));
    }

    #[test]
    fn invalid_document_fails_before_layout() {
        let doc = document(vec![Element::div(vec![]).with_height(-5.0)], 100.0);
        assert!(matches!(
            LayoutEngine::new().layout(&doc),
            Err(QuireError::InvalidDimension { .. })
        ));
    }
}
