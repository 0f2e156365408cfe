//! Text styles and their resolution into runs.

use std::ops::Range;

use crate::Error;

/// A fully resolved text style.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// The font size, in pixels.
    pub font_size: f64,
    /// The nominal line height, as a multiple of the font size.
    pub line_height: f64,
    /// Extra space after every character, in pixels.
    pub letter_spacing: f64,
    /// The font weight, with 400 being regular.
    pub weight: u16,
    /// Is the text italic?
    pub italic: bool,
    /// The font family, or `None` for the host's default.
    pub family: Option<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle {
            font_size: 16.0,
            line_height: 1.2,
            letter_spacing: 0.0,
            weight: 400,
            italic: false,
            family: None,
        }
    }
}

impl TextStyle {
    /// Overrides one property.
    pub fn apply(&mut self, property: &StyleProperty) {
        match property {
            StyleProperty::FontSize(size) => self.font_size = *size,
            StyleProperty::LineHeight(height) => self.line_height = *height,
            StyleProperty::LetterSpacing(spacing) => self.letter_spacing = *spacing,
            StyleProperty::Weight(weight) => self.weight = *weight,
            StyleProperty::Italic(italic) => self.italic = *italic,
            StyleProperty::Family(family) => self.family.clone_from(family),
        }
    }

    /// Would applying `property` leave this style unchanged?
    pub fn has(&self, property: &StyleProperty) -> bool {
        match property {
            StyleProperty::FontSize(size) => self.font_size == *size,
            StyleProperty::LineHeight(height) => self.line_height == *height,
            StyleProperty::LetterSpacing(spacing) => self.letter_spacing == *spacing,
            StyleProperty::Weight(weight) => self.weight == *weight,
            StyleProperty::Italic(italic) => self.italic == *italic,
            StyleProperty::Family(family) => self.family == *family,
        }
    }

    pub(crate) fn check_finite(&self) -> Result<(), Error> {
        for x in [self.font_size, self.line_height, self.letter_spacing] {
            crate::check_finite(x)?;
        }
        Ok(())
    }
}

/// A single style property.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum StyleProperty {
    /// See [`TextStyle::font_size`].
    FontSize(f64),
    /// See [`TextStyle::line_height`].
    LineHeight(f64),
    /// See [`TextStyle::letter_spacing`].
    LetterSpacing(f64),
    /// See [`TextStyle::weight`].
    Weight(u16),
    /// See [`TextStyle::italic`].
    Italic(bool),
    /// See [`TextStyle::family`].
    Family(Option<String>),
}

impl StyleProperty {
    pub(crate) fn check_finite(&self) -> Result<(), Error> {
        match self {
            StyleProperty::FontSize(x)
            | StyleProperty::LineHeight(x)
            | StyleProperty::LetterSpacing(x) => crate::check_finite(*x),
            _ => Ok(()),
        }
    }
}

/// A style property applied to a byte range of the text.
///
/// Spans may overlap; later spans win.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StyleSpan {
    /// The byte range the property applies to.
    pub range: Range<usize>,
    /// The property.
    pub property: StyleProperty,
}

impl StyleSpan {
    /// Creates a new span.
    pub fn new(range: Range<usize>, property: StyleProperty) -> Self {
        StyleSpan { range, property }
    }
}

/// A maximal range of text sharing one resolved style.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StyleRun {
    /// The byte range covered by this run.
    pub range: Range<usize>,
    /// The resolved style.
    pub style: TextStyle,
}

// Splits the run containing `at` so that a run boundary falls on `at`.
fn split_at(runs: &mut Vec<StyleRun>, at: usize) {
    let idx = runs.partition_point(|run| run.range.end <= at);
    if let Some(run) = runs.get_mut(idx) {
        if run.range.start < at {
            let tail = StyleRun {
                range: at..run.range.end,
                style: run.style.clone(),
            };
            run.range.end = at;
            runs.insert(idx + 1, tail);
        }
    }
}

/// Resolves the style spans over `range` into disjoint runs, appending them
/// to `out`.
///
/// The new runs are contiguous, cover all of `range` (if it isn't empty) and
/// no two neighbours share a style. Spans are clipped to `range`.
pub fn flatten_runs(
    root: &TextStyle,
    spans: &[StyleSpan],
    range: Range<usize>,
    out: &mut Vec<StyleRun>,
) {
    if range.start >= range.end {
        return;
    }
    let mut runs = vec![StyleRun {
        range: range.clone(),
        style: root.clone(),
    }];

    for span in spans {
        let start = span.range.start.max(range.start);
        let end = span.range.end.min(range.end);
        if start >= end {
            continue;
        }
        split_at(&mut runs, start);
        split_at(&mut runs, end);
        for run in &mut runs {
            if run.range.start >= start && run.range.end <= end {
                run.style.apply(&span.property);
            }
        }
    }

    let first_new = out.len();
    for run in runs {
        if out.len() > first_new {
            if let Some(prev) = out.last_mut().filter(|prev| prev.style == run.style) {
                prev.range.end = run.range.end;
                continue;
            }
        }
        out.push(run);
    }
}

/// The style in effect at byte `pos`, ignoring spans that end at or before
/// it.
pub fn style_at(root: &TextStyle, spans: &[StyleSpan], pos: usize) -> TextStyle {
    let mut style = root.clone();
    for span in spans {
        if span.range.start <= pos && pos < span.range.end {
            style.apply(&span.property);
        }
    }
    style
}

/// The run covering the most bytes, with ties going to the earlier run.
pub fn dominant_run(runs: &[StyleRun]) -> Option<&StyleRun> {
    runs.iter().fold(None, |best: Option<&StyleRun>, run| match best {
        Some(b) if b.range.len() >= run.range.len() => Some(b),
        _ => Some(run),
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn size(s: f64) -> StyleProperty {
        StyleProperty::FontSize(s)
    }

    fn sizes(runs: &[StyleRun]) -> Vec<(Range<usize>, f64)> {
        runs.iter()
            .map(|r| (r.range.clone(), r.style.font_size))
            .collect()
    }

    #[test]
    fn no_spans() {
        let mut out = Vec::new();
        flatten_runs(&TextStyle::default(), &[], 3..10, &mut out);
        assert_eq!(sizes(&out), vec![(3..10, 16.0)]);
    }

    #[test]
    fn nested_spans() {
        let spans = [
            StyleSpan::new(2..8, size(20.0)),
            StyleSpan::new(4..6, StyleProperty::Italic(true)),
        ];
        let mut out = Vec::new();
        flatten_runs(&TextStyle::default(), &spans, 0..10, &mut out);
        assert_eq!(
            sizes(&out),
            vec![(0..2, 16.0), (2..4, 20.0), (4..6, 20.0), (6..8, 20.0), (8..10, 16.0)]
        );
        assert!(out[2].style.italic);
        assert!(!out[1].style.italic);
    }

    #[test]
    fn overlapping_spans_later_wins() {
        let spans = [
            StyleSpan::new(0..6, size(20.0)),
            StyleSpan::new(4..10, size(30.0)),
        ];
        let mut out = Vec::new();
        flatten_runs(&TextStyle::default(), &spans, 0..10, &mut out);
        assert_eq!(sizes(&out), vec![(0..4, 20.0), (4..10, 30.0)]);
    }

    #[test]
    fn equal_neighbours_merge() {
        // The second span restores the root size, so everything merges.
        let spans = [
            StyleSpan::new(2..5, size(20.0)),
            StyleSpan::new(2..5, size(16.0)),
        ];
        let mut out = Vec::new();
        flatten_runs(&TextStyle::default(), &spans, 0..10, &mut out);
        assert_eq!(sizes(&out), vec![(0..10, 16.0)]);
    }

    #[test]
    fn spans_are_clipped() {
        let spans = [StyleSpan::new(0..100, size(20.0))];
        let mut out = vec![StyleRun {
            range: 0..5,
            style: TextStyle::default(),
        }];
        flatten_runs(&TextStyle::default(), &spans, 6..12, &mut out);
        // Runs from an earlier paragraph are left alone.
        assert_eq!(sizes(&out), vec![(0..5, 16.0), (6..12, 20.0)]);
    }

    #[test]
    fn dominant() {
        let spans = [
            StyleSpan::new(0..3, size(20.0)),
            StyleSpan::new(6..9, size(30.0)),
        ];
        let mut out = Vec::new();
        flatten_runs(&TextStyle::default(), &spans, 0..9, &mut out);
        // All three runs are 3 bytes long.
        assert_eq!(dominant_run(&out).unwrap().style.font_size, 20.0);
        assert_eq!(dominant_run(&[]), None);
    }

    #[test]
    fn style_at_position() {
        let spans = [StyleSpan::new(2..4, size(20.0))];
        let root = TextStyle::default();
        assert_eq!(style_at(&root, &spans, 1).font_size, 16.0);
        assert_eq!(style_at(&root, &spans, 2).font_size, 20.0);
        assert_eq!(style_at(&root, &spans, 4).font_size, 16.0);
    }

    fn span() -> impl Strategy<Value = StyleSpan> {
        (0usize..40, 0usize..40, 0u8..4).prop_map(|(a, b, s)| {
            StyleSpan::new(a.min(b)..a.max(b), size(10.0 + f64::from(s)))
        })
    }

    proptest! {
        #[test]
        fn runs_are_contiguous(
            spans in prop::collection::vec(span(), 0..8),
            start in 0usize..20,
            len in 1usize..20,
        ) {
            let range = start..start + len;
            let mut out = Vec::new();
            flatten_runs(&TextStyle::default(), &spans, range.clone(), &mut out);

            prop_assert!(!out.is_empty());
            prop_assert_eq!(out[0].range.start, range.start);
            prop_assert_eq!(out[out.len() - 1].range.end, range.end);
            for pair in out.windows(2) {
                prop_assert_eq!(pair[0].range.end, pair[1].range.start);
                prop_assert!(pair[0].style != pair[1].style);
            }
            for run in &out {
                prop_assert!(run.range.start < run.range.end);
                prop_assert_eq!(&run.style, &style_at(&TextStyle::default(), &spans, run.range.start));
            }
        }
    }
}
