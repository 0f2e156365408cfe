//! Utilities for generating examples, benchmarks, and test cases.

use kurbo::{BezPath, Circle, Point, Rect, Shape as _};

use crate::{
    mask::AlphaMask,
    shape::{FlowShape, FlowType},
};

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua",
];

/// Generate a bunch of squares, arranged in an `n` by `n` grid.
///
/// The top-left of the first square is at (x0, y0). Each square has size
/// `size x size`, and the distance between squares (both horizontally and
/// vertically) is `offset`.
///
/// If `slant` is non-zero, generates parallelograms instead of squares: the
/// right-hand side of each square gets translated down by `slant`.
pub fn squares((x0, y0): (f64, f64), size: f64, offset: f64, slant: f64, n: usize) -> Vec<BezPath> {
    let mut ret = Vec::with_capacity(n * n);
    for i in 0..n {
        let x = x0 + i as f64 * offset;
        for j in 0..n {
            let y = y0 + j as f64 * offset;
            let mut path = BezPath::new();
            path.move_to(Point::new(x, y));
            path.line_to(Point::new(x, y + size));
            path.line_to(Point::new(x + size, y + size + slant));
            path.line_to(Point::new(x + size, y + slant));
            path.close_path();
            ret.push(path);
        }
    }
    ret
}

/// An `n` by `n` grid of obstacles on a canvas of width and height
/// `40 * n`, alternating between the flow types that split rows.
///
/// Every other row of the grid is slanted, so that edges aren't all
/// axis-aligned.
pub fn obstacle_grid(n: usize) -> Vec<FlowShape> {
    let flows = [FlowType::Both, FlowType::Left, FlowType::Right];
    let mut ret = Vec::with_capacity(n * n);
    for (i, mut outline) in squares((5.0, 5.0), 20.0, 40.0, 0.0, n).into_iter().enumerate() {
        if (i % n) % 2 == 1 {
            outline.apply_affine(kurbo::Affine::skew(0.25, 0.0));
        }
        // Squares are always finite.
        if let Ok(shape) = FlowShape::new(outline, flows[i % flows.len()]) {
            ret.push(shape);
        }
    }
    ret
}

/// A single circular obstacle in the middle of a square canvas of side
/// `size`, where text flows on both sides.
pub fn circle_obstacle(size: f64) -> Option<FlowShape> {
    let circle = Circle::new((size / 2.0, size / 2.0), size / 4.0);
    FlowShape::new(circle.to_path(0.1), FlowType::Both).ok()
}

/// A `size x size` mask with a filled disc, a ring around it and some
/// antialiasing on the edges.
pub fn circle_mask(size: u32) -> AlphaMask {
    let c = f64::from(size) / 2.0;
    AlphaMask::from_fn(size, size, |x, y| {
        let d = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5).distance(Point::new(c, c));
        let coverage = |r: f64| (r - d + 0.5).clamp(0.0, 1.0);
        let disc = coverage(c * 0.4);
        let ring = coverage(c * 0.9) - coverage(c * 0.7);
        ((disc + ring) * 255.0).round() as u8
    })
}

/// The bounding box of a set of shapes, or an empty rect if none of them
/// have any edges.
pub fn bounds(shapes: &[FlowShape]) -> Rect {
    shapes
        .iter()
        .filter_map(FlowShape::bounds)
        .reduce(|a, b| a.union(b))
        .unwrap_or(Rect::ZERO)
}

/// Generate `paragraphs` paragraphs of filler text, each with `words` words.
///
/// The output is deterministic.
pub fn lorem(paragraphs: usize, words: usize) -> String {
    let mut ret = String::new();
    for p in 0..paragraphs {
        if p > 0 {
            ret.push('\n');
        }
        for w in 0..words {
            if w > 0 {
                ret.push(' ');
            }
            ret.push_str(WORDS[(p * 7 + w * 3) % WORDS.len()]);
        }
        ret.push('.');
    }
    ret
}
