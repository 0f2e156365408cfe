//! A line breaker for text where every character has the same advance.
//!
//! This is not a shaper. It knows nothing about glyphs, only about font
//! sizes, which makes it predictable enough for tests and benchmarks, and
//! good enough for terminals and other grid-based hosts.

use super::{
    breaker::{HyphenEdit, LineBreaker, LineMeasure},
    style::{StyleRun, TextStyle},
    Hyphenation,
};

/// The soft hyphen, which marks a hyphenation point without being drawn.
pub const SOFT_HYPHEN: char = '\u{ad}';

// The most lines measured in one go. Later lines are often re-measured at a
// different width anyway.
const MAX_BATCH: usize = 32;

// Words are never hyphenated so as to leave fewer than this many characters
// on either side.
const MIN_HYPHENATED_PIECE: usize = 2;

/// Breaks lines assuming a fixed advance for every character of a style.
///
/// All metrics are ratios of the font size.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MonospaceBreaker {
    /// The advance of every character (and of inserted hyphens).
    pub advance: f64,
    /// The font's ascent.
    pub ascent: f64,
    /// The font's descent.
    pub descent: f64,
}

impl Default for MonospaceBreaker {
    fn default() -> Self {
        MonospaceBreaker {
            advance: 0.6,
            ascent: 0.8,
            descent: 0.2,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Break {
    end: usize,
    width: f64,
    edit: HyphenEdit,
}

fn is_word_boundary(c: char) -> bool {
    c.is_whitespace() || c == '-' || c == SOFT_HYPHEN
}

fn style_at<'a>(runs: &'a [StyleRun], pos: usize, fallback: &'a TextStyle) -> &'a TextStyle {
    let idx = runs.partition_point(|run| run.range.end <= pos);
    runs.get(idx).map_or(fallback, |run| &run.style)
}

impl MonospaceBreaker {
    /// Creates a breaker with typical metrics for a monospace font.
    pub fn new() -> Self {
        Self::default()
    }

    /// The advance of every character in `style`, including letter spacing.
    pub fn char_advance(&self, style: &TextStyle) -> f64 {
        style.font_size * self.advance + style.letter_spacing
    }

    /// The ascent and descent of a line in `style`.
    ///
    /// The gap between the font's own height and the nominal line height is
    /// split evenly above and below, so a line's height is its nominal line
    /// height.
    pub fn metrics(&self, style: &TextStyle) -> (f64, f64) {
        let ascent = style.font_size * self.ascent;
        let descent = style.font_size * self.descent;
        let half_leading = (self.line_height(style) - ascent - descent) / 2.0;
        (ascent + half_leading, descent + half_leading)
    }

    // Looks for the last place in the word starting at `word_start` where
    // the word can be hyphenated and still fit. `word_edges` holds the pen
    // position after every character of the word seen so far.
    fn hyphenation_point(
        &self,
        text: &str,
        runs: &[StyleRun],
        fallback: &TextStyle,
        word_start: usize,
        word_edges: &[(usize, f64)],
        width: f64,
    ) -> Option<Break> {
        for (prefix_len, &(pos, x)) in word_edges.iter().enumerate().rev() {
            if prefix_len + 1 < MIN_HYPHENATED_PIECE {
                break;
            }
            let rest = text[pos..]
                .chars()
                .take_while(|&c| !is_word_boundary(c))
                .take(MIN_HYPHENATED_PIECE)
                .count();
            if rest < MIN_HYPHENATED_PIECE {
                continue;
            }
            let last_char = text[word_start..pos].chars().next_back()?;
            let style = style_at(runs, pos - last_char.len_utf8(), fallback);
            let with_hyphen = x + self.char_advance(style);
            if with_hyphen <= width {
                return Some(Break {
                    end: pos,
                    width: with_hyphen,
                    edit: HyphenEdit::InsertHyphen,
                });
            }
        }
        None
    }

    #[allow(clippy::too_many_arguments)]
    fn next_line(
        &self,
        text: &str,
        runs: &[StyleRun],
        fallback: &TextStyle,
        start: usize,
        width: f64,
        hyphenation: Hyphenation,
        word_edges: &mut Vec<(usize, f64)>,
    ) -> Break {
        // The pen position, including trailing spaces.
        let mut x = 0.0;
        // The width up to the last character that isn't a space.
        let mut content = 0.0;
        let mut has_content = false;
        let mut after_space = false;
        let mut last_break: Option<Break> = None;
        let mut word_start = start;
        word_edges.clear();

        for (i, c) in text[start..].char_indices() {
            let i = start + i;
            let style = style_at(runs, i, fallback);
            if c == ' ' {
                x += self.char_advance(style);
                after_space = true;
                continue;
            }
            if after_space {
                after_space = false;
                if has_content {
                    last_break = Some(Break {
                        end: i,
                        width: content,
                        edit: HyphenEdit::None,
                    });
                }
                word_start = i;
                word_edges.clear();
            }

            let advance = if c == SOFT_HYPHEN {
                0.0
            } else {
                self.char_advance(style)
            };
            if x + advance > width && has_content {
                let hyphenated = match hyphenation {
                    Hyphenation::Auto => self.hyphenation_point(
                        text, runs, fallback, word_start, word_edges, width,
                    ),
                    Hyphenation::Off => None,
                };
                return hyphenated.or(last_break).unwrap_or(Break {
                    end: i,
                    width: content,
                    edit: HyphenEdit::None,
                });
            }

            x += advance;
            content = x;
            has_content = true;
            let next = i + c.len_utf8();
            if c == '-' {
                last_break = Some(Break {
                    end: next,
                    width: content,
                    edit: HyphenEdit::None,
                });
                word_start = next;
                word_edges.clear();
            } else if c == SOFT_HYPHEN {
                let with_hyphen = content + self.char_advance(style);
                if with_hyphen <= width {
                    last_break = Some(Break {
                        end: next,
                        width: with_hyphen,
                        edit: HyphenEdit::ReplaceWithHyphen,
                    });
                }
                word_start = next;
                word_edges.clear();
            } else {
                word_edges.push((next, x));
            }
        }

        Break {
            end: text.len(),
            width: content,
            edit: HyphenEdit::None,
        }
    }

    fn line_metrics(
        &self,
        runs: &[StyleRun],
        fallback: &TextStyle,
        start: usize,
        end: usize,
    ) -> (f64, f64) {
        let mut ret: Option<(f64, f64)> = None;
        for run in runs
            .iter()
            .filter(|run| run.range.start < end && run.range.end > start)
        {
            let (a, d) = self.metrics(&run.style);
            ret = Some(match ret {
                Some((ascent, descent)) => (ascent.max(a), descent.max(d)),
                None => (a, d),
            });
        }
        ret.unwrap_or_else(|| self.metrics(style_at(runs, start, fallback)))
    }
}

impl LineBreaker for MonospaceBreaker {
    fn break_lines(
        &mut self,
        text: &str,
        runs: &[StyleRun],
        width: f64,
        hyphenation: Hyphenation,
        out: &mut Vec<LineMeasure>,
    ) {
        out.clear();
        let fallback = TextStyle::default();
        let mut word_edges = Vec::new();
        let mut start = 0;
        while start < text.len() && out.len() < MAX_BATCH {
            let line = self.next_line(
                text,
                runs,
                &fallback,
                start,
                width,
                hyphenation,
                &mut word_edges,
            );
            debug_assert!(line.end > start);
            let (ascent, descent) = self.line_metrics(runs, &fallback, start, line.end);
            out.push(LineMeasure {
                end: line.end,
                width: line.width,
                ascent,
                descent,
                start_edit: HyphenEdit::None,
                end_edit: line.edit,
            });
            start = line.end;
        }
    }

    fn line_height(&self, style: &TextStyle) -> f64 {
        style.font_size * style.line_height
    }
}
