//! Distributing leftover width between words.

use super::{
    breaker::{HyphenEdit, LineMeasure},
    Justification,
};

/// Counts the spaces in `line` that may stretch or shrink.
///
/// Only U+0020 counts. Trailing spaces and tabs don't, unless the line ends
/// with an inserted hyphen (in which case there is no trailing whitespace
/// to speak of).
pub fn stretchable_spaces(line: &str, end_edit: HyphenEdit) -> usize {
    let line = if end_edit == HyphenEdit::InsertHyphen {
        line
    } else {
        line.trim_end_matches([' ', '\t'])
    };
    line.bytes().filter(|&b| b == b' ').count()
}

/// Chooses the extra width to add to every stretchable space of `line`,
/// which was measured as `measure`, when placing it in a slot of width
/// `slot_width`.
///
/// A negative result shrinks an overlong line. Returns `None` if the line
/// is too long and there's nothing to shrink, in which case it can't go in
/// this slot.
pub fn word_spacing(
    line: &str,
    measure: &LineMeasure,
    slot_width: f64,
    is_last: bool,
    justification: Justification,
) -> Option<f64> {
    let overlong = measure.width > slot_width;
    let spaces = stretchable_spaces(line, measure.end_edit);
    if spaces == 0 {
        return (!overlong).then_some(0.0);
    }

    let fill = (slot_width - measure.width) / spaces as f64;
    let spacing = match justification {
        _ if overlong => fill,
        Justification::Auto if !is_last => fill,
        _ => 0.0,
    };
    Some(spacing)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measure(width: f64, end_edit: HyphenEdit) -> LineMeasure {
        LineMeasure {
            end: 0,
            width,
            ascent: 8.0,
            descent: 2.0,
            start_edit: HyphenEdit::None,
            end_edit,
        }
    }

    #[test]
    fn counting_spaces() {
        assert_eq!(stretchable_spaces("a b  c ", HyphenEdit::None), 3);
        assert_eq!(stretchable_spaces("a\tb\u{a0}c", HyphenEdit::None), 0);
        assert_eq!(stretchable_spaces("ab c", HyphenEdit::InsertHyphen), 1);
        assert_eq!(stretchable_spaces("   ", HyphenEdit::None), 0);
        // Only spaces and tabs are trailing whitespace.
        assert_eq!(stretchable_spaces("a b \u{a0}", HyphenEdit::None), 2);
        assert_eq!(stretchable_spaces("a b\t \t", HyphenEdit::None), 1);
    }

    #[test]
    fn auto_fills_the_slot() {
        let m = measure(80.0, HyphenEdit::None);
        assert_eq!(
            word_spacing("aa bb cc ", &m, 100.0, false, Justification::Auto),
            Some(10.0)
        );
        // Except on the last line.
        assert_eq!(
            word_spacing("aa bb cc", &m, 100.0, true, Justification::Auto),
            Some(0.0)
        );
    }

    #[test]
    fn off_only_shrinks() {
        let m = measure(80.0, HyphenEdit::None);
        assert_eq!(
            word_spacing("aa bb cc ", &m, 100.0, false, Justification::Off),
            Some(0.0)
        );
        assert_eq!(
            word_spacing("aa bb cc ", &m, 70.0, false, Justification::Off),
            Some(-5.0)
        );
        // An overlong last line shrinks too.
        assert_eq!(
            word_spacing("aa bb cc", &m, 70.0, true, Justification::Auto),
            Some(-5.0)
        );
    }

    #[test]
    fn overlong_without_spaces_is_rejected() {
        let m = measure(80.0, HyphenEdit::None);
        for justification in [Justification::Off, Justification::Auto] {
            assert_eq!(
                word_spacing("aaaaaaaa ", &m, 70.0, false, justification),
                None
            );
        }
        assert_eq!(
            word_spacing("aaaaaaaa", &m, 90.0, false, Justification::Auto),
            Some(0.0)
        );
    }
}
