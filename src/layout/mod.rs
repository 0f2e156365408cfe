//! Flowing paragraphs of text around shapes.
//!
//! The driver walks the canvas in columns. Within a column it lays out one
//! paragraph after another, row by row: every row is cut into slots by the
//! [`SlotFinder`], and each slot receives at most one line fragment, as
//! measured by a [`LineBreaker`]. Measuring is the expensive part, so the
//! driver asks for a batch of lines at a time and only asks again when the
//! slot width changes or the batch runs out.

pub mod breaker;
pub mod justify;
pub mod monospace;
pub mod style;

use std::ops::Range;

use kurbo::{Point, Rect, Size};

pub use breaker::{HyphenEdit, LineBreaker, LineMeasure};
pub use monospace::MonospaceBreaker;
pub use style::{StyleProperty, StyleRun, StyleSpan, TextStyle};

use crate::{
    shape::{FlowShape, TextDirection},
    slots::SlotFinder,
    Error,
};

/// Whether lines are stretched to fill their slots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Justification {
    /// Lines keep their natural width. Overlong lines may still be shrunk.
    #[default]
    Off,
    /// Every line but the last of a paragraph fills its slot.
    Auto,
}

/// Whether the line breaker may split words.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Hyphenation {
    /// Words are only broken at explicit opportunities.
    #[default]
    Off,
    /// Words may be hyphenated wherever the breaker sees fit.
    Auto,
}

/// Options for a layout pass.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// The number of columns. Zero is treated as one, and the count is
    /// reduced until every column has a positive width.
    pub columns: usize,
    /// The gap between neighbouring columns.
    pub column_spacing: f64,
    /// See [`Justification`].
    pub justification: Justification,
    /// See [`Hyphenation`].
    pub hyphenation: Hyphenation,
    /// The direction of the text, which also decides the order of the
    /// columns and the meaning of [`FlowType::Start`](crate::FlowType::Start)
    /// and [`FlowType::End`](crate::FlowType::End).
    pub direction: TextDirection,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            columns: 1,
            column_spacing: 0.0,
            justification: Justification::Off,
            hyphenation: Hyphenation::Off,
            direction: TextDirection::Ltr,
        }
    }
}

impl LayoutOptions {
    /// The number of columns that fit in `width`, and their width.
    pub fn resolve_columns(&self, width: f64) -> (usize, f64) {
        let mut columns = self.columns.max(1);
        if !(width > 0.0) {
            return (1, width);
        }
        if self.column_spacing > 0.0 {
            let fit = (width / self.column_spacing).floor() + 1.0;
            if fit < columns as f64 {
                columns = fit as usize;
            }
        }
        loop {
            let spacing = self.column_spacing * (columns - 1) as f64;
            let column_width = (width - spacing) / columns as f64;
            if columns > 1 && column_width <= 0.0 {
                columns -= 1;
            } else {
                return (columns, column_width);
            }
        }
    }
}

/// A piece of a line, placed in one slot.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct LineFragment {
    /// The index of the paragraph this fragment belongs to.
    pub paragraph: usize,
    /// The index of the column, in reading order.
    pub column: usize,
    /// The byte range of the text in this fragment, including trailing
    /// whitespace.
    pub range: Range<usize>,
    /// See [`LineMeasure::start_edit`].
    pub start_edit: HyphenEdit,
    /// See [`LineMeasure::end_edit`].
    pub end_edit: HyphenEdit,
    /// The extra advance of every stretchable space.
    pub word_spacing: f64,
    /// The left end of the baseline.
    pub baseline: Point,
    /// The distance from the top of the fragment to the baseline.
    pub ascent: f64,
    /// The distance from the baseline to the bottom of the fragment.
    pub descent: f64,
    /// The natural width of the text, before adding word spacing.
    pub width: f64,
    /// The indices into [`LayoutResult::runs`] of the runs this fragment
    /// touches.
    pub run_range: Range<usize>,
}

impl LineFragment {
    /// The bounding box of the line as placed.
    pub fn bounds(&self, stretchable_spaces: usize) -> Rect {
        let width = self.width + self.word_spacing * stretchable_spaces as f64;
        Rect::new(
            self.baseline.x,
            self.baseline.y - self.ascent,
            self.baseline.x + width,
            self.baseline.y + self.descent,
        )
    }
}

/// The output of a layout pass.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct LayoutResult {
    /// The placed fragments, in reading order.
    pub fragments: Vec<LineFragment>,
    /// The resolved style runs of every paragraph that was started.
    pub runs: Vec<StyleRun>,
    /// The height used, over all columns.
    pub height: f64,
    /// The byte offset of the first character that didn't fit, or the length
    /// of the text if everything did.
    pub last_offset: usize,
    /// The number of columns actually used for layout.
    pub columns: usize,
}

/// The reusable state of a layout pass.
///
/// Laying out with the same `FlowLayout` repeatedly avoids allocating new
/// scratch buffers every time.
#[derive(Clone, Debug, Default)]
pub struct FlowLayout {
    finder: SlotFinder,
    slots: Vec<Rect>,
    batch: Batch,
}

// Lines measured at one width, consumed in order.
#[derive(Clone, Debug, Default)]
struct Batch {
    lines: Vec<LineMeasure>,
    // The style runs of the measured text, relative to `start`.
    runs: Vec<StyleRun>,
    start: usize,
    width: Option<f64>,
    next: usize,
}

impl Batch {
    fn invalidate(&mut self) {
        self.width = None;
    }

    fn is_valid_for(&self, width: f64) -> bool {
        self.width == Some(width) && self.next < self.lines.len()
    }
}

struct Input<'a> {
    text: &'a str,
    shapes: &'a [FlowShape],
    options: &'a LayoutOptions,
    canvas_width: f64,
}

struct Paragraph {
    index: usize,
    range: Range<usize>,
    // Into `LayoutResult::runs`.
    runs: Range<usize>,
    nominal_height: f64,
    offset: usize,
}

struct Column {
    index: usize,
    rect: Rect,
}

enum Flow {
    Done,
    ColumnFull,
}

enum Placement {
    Placed { height: f64 },
    Rejected,
    TooTall,
}

// An empty text has no paragraphs at all, rather than one empty one.
fn paragraph_ranges(text: &str) -> impl Iterator<Item = Range<usize>> + '_ {
    let pieces = (!text.is_empty()).then(|| text.split('\n'));
    let mut start = 0;
    pieces.into_iter().flatten().map(move |p| {
        let range = start..start + p.len();
        start = range.end + 1;
        range
    })
}

fn check_size(value: f64, name: &'static str) -> Result<(), Error> {
    crate::check_finite(value)?;
    if value < 0.0 {
        return Err(Error::InvalidParameter { name, value });
    }
    Ok(())
}

impl FlowLayout {
    /// Creates a layout with empty scratch buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lays out `text` on a canvas of `size`, flowing around `shapes`.
    ///
    /// `root_style` applies to the whole text, and `spans` override parts of
    /// it (with later spans winning). Paragraphs are separated by `'\n'`.
    /// Layout stops when the columns are full; [`LayoutResult::last_offset`]
    /// tells how far it got.
    #[allow(clippy::too_many_arguments)]
    pub fn layout<B: LineBreaker + ?Sized>(
        &mut self,
        text: &str,
        root_style: &TextStyle,
        spans: &[StyleSpan],
        shapes: &[FlowShape],
        size: Size,
        options: &LayoutOptions,
        breaker: &mut B,
    ) -> Result<LayoutResult, Error> {
        check_size(size.width, "width")?;
        check_size(size.height, "height")?;
        check_size(options.column_spacing, "column_spacing")?;
        root_style.check_finite()?;
        for span in spans {
            span.property.check_finite()?;
        }

        let (columns, column_width) = options.resolve_columns(size.width);
        let input = Input {
            text,
            shapes,
            options,
            canvas_width: size.width,
        };
        let mut result = LayoutResult {
            columns,
            ..LayoutResult::default()
        };
        self.batch.invalidate();

        let mut paragraphs = paragraph_ranges(text).enumerate();
        let mut current: Option<Paragraph> = None;

        'columns: for index in 0..columns {
            let physical = match options.direction {
                TextDirection::Ltr => index,
                TextDirection::Rtl => columns - 1 - index,
            };
            let x0 = physical as f64 * (column_width + options.column_spacing);
            let column = Column {
                index,
                rect: Rect::new(x0, 0.0, x0 + column_width, size.height),
            };
            tracing::debug!(column = index, rect = ?column.rect, "starting column");

            let mut y = 0.0;
            loop {
                if current.is_none() {
                    let Some((index, range)) = paragraphs.next() else {
                        break 'columns;
                    };
                    current = Some(self.begin_paragraph(
                        index,
                        range,
                        root_style,
                        spans,
                        &*breaker,
                        &mut result,
                    ));
                }
                let Some(para) = current.as_mut() else {
                    break 'columns;
                };
                if !(para.nominal_height > 0.0) {
                    tracing::debug!(
                        paragraph = para.index,
                        nominal_height = para.nominal_height,
                        "line height isn't positive, giving up"
                    );
                    break 'columns;
                }
                match self.flow_paragraph(para, &mut y, &column, &input, breaker, &mut result) {
                    Flow::Done => current = None,
                    Flow::ColumnFull => {
                        self.batch.invalidate();
                        continue 'columns;
                    }
                }
            }
        }

        result.last_offset = current.map_or(text.len(), |para| para.offset);
        tracing::debug!(
            fragments = result.fragments.len(),
            height = result.height,
            last_offset = result.last_offset,
            "finished layout"
        );
        Ok(result)
    }

    fn begin_paragraph<B: LineBreaker + ?Sized>(
        &mut self,
        index: usize,
        range: Range<usize>,
        root_style: &TextStyle,
        spans: &[StyleSpan],
        breaker: &B,
        result: &mut LayoutResult,
    ) -> Paragraph {
        let first_run = result.runs.len();
        style::flatten_runs(root_style, spans, range.clone(), &mut result.runs);
        let runs = first_run..result.runs.len();
        let nominal_height = match style::dominant_run(&result.runs[runs.clone()]) {
            Some(run) => breaker.line_height(&run.style),
            None => breaker.line_height(&style::style_at(root_style, spans, range.start)),
        };
        tracing::debug!(paragraph = index, ?range, nominal_height, "starting paragraph");

        self.batch.invalidate();
        Paragraph {
            index,
            offset: range.start,
            range,
            runs,
            nominal_height,
        }
    }

    fn flow_paragraph<B: LineBreaker + ?Sized>(
        &mut self,
        para: &mut Paragraph,
        y: &mut f64,
        column: &Column,
        input: &Input<'_>,
        breaker: &mut B,
        result: &mut LayoutResult,
    ) -> Flow {
        let bottom = column.rect.y1;
        if para.range.is_empty() {
            if *y >= bottom {
                return Flow::ColumnFull;
            }
            *y += para.nominal_height;
            result.height = result.height.max(*y);
            return Flow::Done;
        }

        while para.offset < para.range.end {
            if *y >= bottom {
                return Flow::ColumnFull;
            }
            let top = *y;
            let row_bottom = top + para.nominal_height;
            let strip = Rect::new(column.rect.x0, top, column.rect.x1, row_bottom);
            let container = Rect::new(0.0, top, input.canvas_width, row_bottom);
            self.slots.clear();
            self.slots.extend_from_slice(self.finder.find_slots(
                strip,
                container,
                input.shapes,
                input.options.direction,
            ));
            tracing::trace!(y = top, slots = self.slots.len(), "starting row");

            let mut advance = 0.0f64;
            for i in 0..self.slots.len() {
                if para.offset >= para.range.end {
                    break;
                }
                let slot = self.slots[i];
                match self.place_line(para, slot, top, column, input, breaker, result) {
                    Placement::Placed { height } => advance = advance.max(height),
                    Placement::Rejected => {}
                    Placement::TooTall => return Flow::ColumnFull,
                }
            }

            *y += if advance > 0.0 {
                advance
            } else {
                para.nominal_height
            };
            result.height = result.height.max(*y);
        }
        Flow::Done
    }

    fn measure<B: LineBreaker + ?Sized>(
        &mut self,
        para: &Paragraph,
        width: f64,
        input: &Input<'_>,
        breaker: &mut B,
        result: &LayoutResult,
    ) {
        let batch = &mut self.batch;
        batch.runs.clear();
        for run in &result.runs[para.runs.clone()] {
            let start = run.range.start.max(para.offset);
            let end = run.range.end.min(para.range.end);
            if start < end {
                batch.runs.push(StyleRun {
                    range: start - para.offset..end - para.offset,
                    style: run.style.clone(),
                });
            }
        }
        breaker.break_lines(
            &input.text[para.offset..para.range.end],
            &batch.runs,
            width,
            input.options.hyphenation,
            &mut batch.lines,
        );
        batch.start = para.offset;
        batch.width = Some(width);
        batch.next = 0;
        tracing::trace!(offset = para.offset, width, lines = batch.lines.len(), "measured");
    }

    #[allow(clippy::too_many_arguments)]
    fn place_line<B: LineBreaker + ?Sized>(
        &mut self,
        para: &mut Paragraph,
        slot: Rect,
        top: f64,
        column: &Column,
        input: &Input<'_>,
        breaker: &mut B,
        result: &mut LayoutResult,
    ) -> Placement {
        let width = slot.width();
        if !self.batch.is_valid_for(width) {
            self.measure(para, width, input, breaker, result);
        }
        let Some(&measure) = self.batch.lines.get(self.batch.next) else {
            return Placement::Rejected;
        };

        let start = para.offset;
        let end = (self.batch.start + measure.end).min(para.range.end);
        if end <= start || !input.text.is_char_boundary(end) {
            tracing::trace!(offset = start, width, "no progress");
            return Placement::Rejected;
        }
        if top + measure.height() > column.rect.y1 {
            return Placement::TooTall;
        }

        let line = &input.text[start..end];
        let is_last = end >= para.range.end;
        let Some(word_spacing) = justify::word_spacing(
            line,
            &measure,
            width,
            is_last,
            input.options.justification,
        ) else {
            tracing::trace!(offset = start, width, measured = measure.width, "line doesn't fit");
            return Placement::Rejected;
        };

        let runs = &result.runs[para.runs.clone()];
        let run_range = para.runs.start + runs.partition_point(|r| r.range.end <= start)
            ..para.runs.start + runs.partition_point(|r| r.range.start < end);
        let fragment = LineFragment {
            paragraph: para.index,
            column: column.index,
            range: start..end,
            start_edit: measure.start_edit,
            end_edit: measure.end_edit,
            word_spacing,
            baseline: Point::new(slot.x0, top + measure.ascent),
            ascent: measure.ascent,
            descent: measure.descent,
            width: measure.width,
            run_range,
        };
        tracing::trace!(?fragment, "placed fragment");
        result.fragments.push(fragment);
        result.height = result.height.max(top + measure.height());

        para.offset = end;
        self.batch.next += 1;
        Placement::Placed {
            height: measure.height(),
        }
    }
}
