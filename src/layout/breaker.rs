//! The interface to a line-breaking and measuring backend.

use super::{
    style::{StyleRun, TextStyle},
    Hyphenation,
};

/// A change to the text at a line boundary caused by hyphenation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum HyphenEdit {
    /// The text is drawn as is.
    #[default]
    None,
    /// A hyphen is drawn in addition to the text.
    InsertHyphen,
    /// The character at the boundary (typically a soft hyphen) is drawn as a
    /// hyphen.
    ReplaceWithHyphen,
}

/// The measurements of one line, as chosen by a [`LineBreaker`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct LineMeasure {
    /// The byte offset just after the line, relative to the text passed to
    /// [`LineBreaker::break_lines`].
    ///
    /// Trailing whitespace is part of the line.
    pub end: usize,
    /// The advance width of the line, excluding trailing whitespace but
    /// including any inserted hyphen.
    pub width: f64,
    /// The distance from the top of the line to its baseline.
    pub ascent: f64,
    /// The distance from the baseline to the bottom of the line.
    pub descent: f64,
    /// The edit at the start of the line.
    pub start_edit: HyphenEdit,
    /// The edit at the end of the line.
    pub end_edit: HyphenEdit,
}

impl LineMeasure {
    /// The total height of the line.
    pub fn height(&self) -> f64 {
        self.ascent + self.descent
    }
}

/// Breaks text into lines and measures them.
///
/// This is the seam between flow layout and shaping: the layout driver
/// knows where lines may go, and the breaker knows how wide text is.
pub trait LineBreaker {
    /// Breaks `text` into consecutive lines no wider than `width`, writing
    /// them to `out` (which is cleared first).
    ///
    /// The first line starts at the beginning of `text`, and each further
    /// line starts where the previous one ended. Only the first line is
    /// required; the driver asks again when it runs out. If not even a
    /// single character fits, the first line should still make progress,
    /// in which case it will be wider than `width`.
    ///
    /// The byte ranges of `runs` are relative to `text`, and cover it.
    fn break_lines(
        &mut self,
        text: &str,
        runs: &[StyleRun],
        width: f64,
        hyphenation: Hyphenation,
        out: &mut Vec<LineMeasure>,
    );

    /// The nominal distance between baselines of text in `style`.
    fn line_height(&self, style: &TextStyle) -> f64;
}

impl<B: LineBreaker + ?Sized> LineBreaker for &mut B {
    fn break_lines(
        &mut self,
        text: &str,
        runs: &[StyleRun],
        width: f64,
        hyphenation: Hyphenation,
        out: &mut Vec<LineMeasure>,
    ) {
        (**self).break_lines(text, runs, width, hyphenation, out);
    }

    fn line_height(&self, style: &TextStyle) -> f64 {
        (**self).line_height(style)
    }
}
