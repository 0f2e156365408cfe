//! Utilities for fuzz and/or property testing using `arbitrary`.

use arbitrary::Unstructured;
use kurbo::{BezPath, Point, Rect, Shape as _};

use crate::{
    interval_tree::Interval,
    layout::{Hyphenation, Justification, LayoutOptions, StyleProperty, StyleSpan},
    mask::AlphaMask,
    shape::{FlowShape, FlowType, TextDirection},
};

/// Generate an arbitrary float in some range.
pub fn float_in_range(
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    let num: u32 = u.arbitrary()?;
    let t = num as f64 / u32::MAX as f64;
    Ok((1.0 - t) * start + t * end)
}

fn point_in(bounds: Rect, u: &mut Unstructured<'_>) -> Result<Point, arbitrary::Error> {
    Ok(Point::new(
        float_in_range(bounds.x0, bounds.x1, u)?,
        float_in_range(bounds.y0, bounds.y1, u)?,
    ))
}

/// Generate an arbitrary flow policy.
pub fn flow_type(u: &mut Unstructured<'_>) -> Result<FlowType, arbitrary::Error> {
    u.choose(&[
        FlowType::Left,
        FlowType::Right,
        FlowType::Both,
        FlowType::None,
        FlowType::Start,
        FlowType::End,
    ])
    .copied()
}

/// Generate an arbitrary rectangle, which may stick out of `bounds` a bit.
pub fn rect_in(bounds: Rect, u: &mut Unstructured<'_>) -> Result<Rect, arbitrary::Error> {
    let slop = bounds.inflate(bounds.width() / 4.0, bounds.height() / 4.0);
    Ok(Rect::from_points(point_in(slop, u)?, point_in(slop, u)?))
}

/// Generate an arbitrary polygon with a handful of vertices in `bounds`.
///
/// The polygon may intersect itself.
pub fn polygon_in(bounds: Rect, u: &mut Unstructured<'_>) -> Result<BezPath, arbitrary::Error> {
    let n: usize = u.int_in_range(3..=8)?;
    let mut path = BezPath::new();
    path.move_to(point_in(bounds, u)?);
    for _ in 1..n {
        path.line_to(point_in(bounds, u)?);
    }
    path.close_path();
    Ok(path)
}

/// Generate an arbitrary flow shape: a rectangle, a polygon or an ellipse.
pub fn flow_shape(bounds: Rect, u: &mut Unstructured<'_>) -> Result<FlowShape, arbitrary::Error> {
    let outline = match u.int_in_range(0..=2)? {
        0 => rect_in(bounds, u)?.to_path(0.1),
        1 => polygon_in(bounds, u)?,
        _ => kurbo::Ellipse::from_rect(rect_in(bounds, u)?).to_path(0.1),
    };
    FlowShape::new(outline, flow_type(u)?).map_err(|_| arbitrary::Error::IncorrectFormat)
}

/// Generate up to four arbitrary flow shapes.
pub fn flow_shapes(
    bounds: Rect,
    u: &mut Unstructured<'_>,
) -> Result<Vec<FlowShape>, arbitrary::Error> {
    let n: usize = u.int_in_range(0..=4)?;
    (0..n).map(|_| flow_shape(bounds, u)).collect()
}

/// Generate an arbitrary alpha mask of at most `max_size` pixels on each
/// side.
///
/// Pixels tend to be fully opaque or fully transparent, as in most real
/// masks.
pub fn alpha_mask(max_size: u32, u: &mut Unstructured<'_>) -> Result<AlphaMask, arbitrary::Error> {
    let width = u.int_in_range(1..=max_size.max(1))?;
    let height = u.int_in_range(1..=max_size.max(1))?;
    let mut data = Vec::with_capacity(width as usize * height as usize);
    for _ in 0..(width * height) {
        let px = match u.int_in_range(0u8..=3)? {
            0 => u.arbitrary()?,
            1 | 2 => 0,
            _ => 255,
        };
        data.push(px);
    }
    AlphaMask::new(width, height, data).map_err(|_| arbitrary::Error::IncorrectFormat)
}

/// Generate arbitrary intervals, with plenty of repeated endpoints.
///
/// The payload of each interval is its position in the returned list.
pub fn intervals(u: &mut Unstructured<'_>) -> Result<Vec<Interval<usize>>, arbitrary::Error> {
    let n: usize = u.int_in_range(0..=64)?;
    let mut ret = Vec::with_capacity(n);
    for i in 0..n {
        let start = f64::from(u.int_in_range(0u8..=40)?) / 2.0;
        let len = f64::from(u.int_in_range(0u8..=10)?) / 2.0;
        ret.push(Interval::new(start, start + len, i));
    }
    Ok(ret)
}

/// Generate arbitrary text: short words of ASCII and non-ASCII letters,
/// separated by spaces, hyphens and the occasional newline.
pub fn text(u: &mut Unstructured<'_>) -> Result<String, arbitrary::Error> {
    let words: usize = u.int_in_range(0..=40)?;
    let mut ret = String::new();
    for _ in 0..words {
        let len: usize = u.int_in_range(1..=12)?;
        for _ in 0..len {
            ret.push(*u.choose(&['a', 'b', 'c', 'é', 'ß', 'ж', '\u{ad}'])?);
        }
        ret.push(*u.choose(&[' ', ' ', ' ', '-', '\n'])?);
    }
    Ok(ret)
}

/// Generate arbitrary style spans over `text`, starting and ending on
/// character boundaries.
pub fn style_spans(text: &str, u: &mut Unstructured<'_>) -> Result<Vec<StyleSpan>, arbitrary::Error> {
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let n: usize = u.int_in_range(0..=4)?;
    let mut ret = Vec::with_capacity(n);
    for _ in 0..n {
        let a = *u.choose(&boundaries)?;
        let b = *u.choose(&boundaries)?;
        let property = match u.int_in_range(0..=2)? {
            0 => StyleProperty::FontSize(float_in_range(6.0, 30.0, u)?),
            1 => StyleProperty::LetterSpacing(float_in_range(0.0, 3.0, u)?),
            _ => StyleProperty::Italic(u.arbitrary()?),
        };
        ret.push(StyleSpan::new(a.min(b)..a.max(b), property));
    }
    Ok(ret)
}

/// Generate arbitrary layout options.
pub fn layout_options(u: &mut Unstructured<'_>) -> Result<LayoutOptions, arbitrary::Error> {
    Ok(LayoutOptions {
        columns: u.int_in_range(0..=4)?,
        column_spacing: float_in_range(0.0, 40.0, u)?,
        justification: *u.choose(&[Justification::Off, Justification::Auto])?,
        hyphenation: *u.choose(&[Hyphenation::Off, Hyphenation::Auto])?,
        direction: *u.choose(&[TextDirection::Ltr, TextDirection::Rtl])?,
    })
}

/// Property checks driven by `arbitrary`, shared by the unit tests and the
/// fuzz targets.
pub mod arbtests {
    use arbitrary::Unstructured;
    use kurbo::{Rect, Size};

    use crate::{
        interval_tree::{Interval, IntervalTree},
        layout::{FlowLayout, MonospaceBreaker, TextStyle},
        shape::{FlowType, TextDirection},
        slots::{intrusion, SlotFinder},
        trace::{simplify_contour, trace_mask},
    };

    /// Checks overlap queries against brute force.
    pub fn interval_tree(u: &mut Unstructured<'_>) -> arbitrary::Result<()> {
        let intervals = super::intervals(u)?;
        let mut tree = IntervalTree::new();
        for i in &intervals {
            tree.insert(*i);
        }
        tree.check_invariants();
        assert_eq!(tree.len(), intervals.len());

        let queries: usize = u.int_in_range(0..=16)?;
        for _ in 0..queries {
            let start = f64::from(u.int_in_range(0u8..=50)?) / 2.0;
            let len = f64::from(u.int_in_range(0u8..=10)?) / 2.0;
            let query = Interval::span(start, start + len);

            let mut found: Vec<usize> = tree.find_overlaps(&query).iter().map(|i| i.data).collect();
            found.sort_unstable();
            let expected: Vec<usize> = intervals
                .iter()
                .filter(|i| i.overlaps(&query))
                .map(|i| i.data)
                .collect();
            assert_eq!(found, expected);
        }
        Ok(())
    }

    /// Checks that slots are disjoint, inside their strip, and clear of
    /// every intrusion.
    pub fn slots(u: &mut Unstructured<'_>) -> arbitrary::Result<()> {
        let canvas = Rect::new(0.0, 0.0, 200.0, 200.0);
        let shapes = super::flow_shapes(canvas, u)?;
        let direction = *u.choose(&[TextDirection::Ltr, TextDirection::Rtl])?;
        let y = super::float_in_range(0.0, 190.0, u)?;
        let x0 = super::float_in_range(0.0, 100.0, u)?;
        let x1 = super::float_in_range(100.0, 200.0, u)?;
        let container = Rect::new(canvas.x0, y, canvas.x1, y + 10.0);
        let strip = Rect::new(x0, y, x1, y + 10.0);

        let slots = SlotFinder::new().find_slots(strip, container, &shapes, direction).to_vec();
        for s in &slots {
            assert!(s.x0 < s.x1, "empty slot {s:?}");
            assert!(s.x0 >= strip.x0 && s.x1 <= strip.x1, "{s:?} sticks out of {strip:?}");
        }
        for pair in slots.windows(2) {
            assert!(pair[0].x1 <= pair[1].x0, "overlapping slots {pair:?}");
        }
        for shape in &shapes {
            if shape.flow().resolve(direction) == FlowType::None {
                continue;
            }
            if let Some(i) = intrusion(shape, strip, container) {
                for s in &slots {
                    assert!(s.x1 <= i.min || s.x0 >= i.max, "{s:?} overlaps {i:?}");
                }
            }
        }
        Ok(())
    }

    /// Checks that every traced contour is closed, before and after
    /// simplification.
    pub fn contours(u: &mut Unstructured<'_>) -> arbitrary::Result<()> {
        let mask = super::alpha_mask(16, u)?;
        let threshold = super::float_in_range(0.01, 0.99, u)?;
        for mut contour in trace_mask(&mask, threshold) {
            assert!(contour.is_closed(), "{contour:?}");
            assert!(contour.len() >= 3, "{contour:?}");
            simplify_contour(&mut contour, 15.0);
            assert!(contour.is_closed(), "{contour:?}");
            assert!(contour.len() >= 3, "{contour:?}");
        }
        Ok(())
    }

    /// Checks that layout terminates, consumes the text in order and keeps
    /// its fragments on the canvas.
    pub fn layout(u: &mut Unstructured<'_>) -> arbitrary::Result<()> {
        let size = Size::new(
            super::float_in_range(0.0, 300.0, u)?,
            super::float_in_range(0.0, 300.0, u)?,
        );
        let text = super::text(u)?;
        let spans = super::style_spans(&text, u)?;
        let shapes = super::flow_shapes(size.to_rect(), u)?;
        let options = super::layout_options(u)?;
        let root = TextStyle {
            font_size: super::float_in_range(6.0, 20.0, u)?,
            ..TextStyle::default()
        };

        let result = FlowLayout::new()
            .layout(
                &text,
                &root,
                &spans,
                &shapes,
                size,
                &options,
                &mut MonospaceBreaker::new(),
            )
            .map_err(|_| arbitrary::Error::IncorrectFormat)?;

        assert!(result.columns >= 1);
        assert!(result.last_offset <= text.len());
        assert!(text.is_char_boundary(result.last_offset));
        let mut prev_end = 0;
        for f in &result.fragments {
            assert!(f.range.start < f.range.end);
            assert!(f.range.start >= prev_end, "{f:?} goes backwards");
            assert!(f.range.end <= result.last_offset);
            assert!(f.baseline.x >= 0.0 && f.baseline.x <= size.width);
            assert!(f.baseline.y - f.ascent >= 0.0);
            assert!(f.baseline.y + f.descent <= size.height + 1e-9);
            assert!(!text[f.range.clone()].contains('\n'));
            prev_end = f.range.end;
        }
        Ok(())
    }
}
