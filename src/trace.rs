//! Boundary tracing of alpha masks.
//!
//! The tracer walks every 2x2 block of pixel centers (including a transparent
//! one-pixel border around the mask), classifies its corners as solid or
//! empty, and emits the boundary edges of that block from a lookup table.
//! The edges are stitched into closed contours by a [`ContourSet`].

use kurbo::{BezPath, Cap, Join, Point, Stroke, StrokeOpts};

use crate::{
    contour::{Contour, ContourSet},
    mask::OpacitySampler,
    Error,
};

/// Accuracy used when stroking outlines to apply a margin.
pub const MARGIN_TOLERANCE: f64 = 0.1;

/// Parameters for [`trace_contours`](crate::trace_contours).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TraceOptions {
    /// Pixels with `opacity / 255 >= threshold` are solid.
    pub threshold: f64,
    /// The smallest turn, in degrees, that survives simplification.
    ///
    /// `None` disables simplification.
    pub min_angle: Option<f64>,
    /// How far to push the outline outwards.
    pub margin: f64,
}

impl Default for TraceOptions {
    fn default() -> Self {
        TraceOptions {
            threshold: 0.5,
            min_angle: Some(15.0),
            margin: 0.0,
        }
    }
}

impl TraceOptions {
    fn validate(&self) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::InvalidParameter {
                name: "threshold",
                value: self.threshold,
            });
        }
        if let Some(angle) = self.min_angle {
            if !(angle.is_finite() && angle >= 0.0) {
                return Err(Error::InvalidParameter {
                    name: "min_angle",
                    value: angle,
                });
            }
        }
        check_margin(self.margin)
    }
}

fn check_margin(margin: f64) -> Result<(), Error> {
    if margin.is_finite() && margin >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name: "margin",
            value: margin,
        })
    }
}

/// The midpoints of the four sides of a 2x2 block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mid {
    Top,
    Right,
    Bottom,
    Left,
}

use Mid::{Bottom as B, Left as L, Right as R, Top as T};

// Indexed by the block key: top-left is bit 3, top-right bit 2, bottom-left
// bit 1 and bottom-right bit 0. Every edge has the solid corners on its
// right (with y pointing down). The saddles 0x6 and 0x9 keep their solid
// corners apart.
const EDGES: [&[(Mid, Mid)]; 16] = [
    &[],
    &[(B, R)],
    &[(L, B)],
    &[(L, R)],
    &[(R, T)],
    &[(B, T)],
    &[(R, T), (L, B)],
    &[(L, T)],
    &[(T, L)],
    &[(T, L), (B, R)],
    &[(T, B)],
    &[(T, R)],
    &[(R, L)],
    &[(B, L)],
    &[(R, B)],
    &[],
];

// Sample points are pixel centers, so the block whose top-left pixel is
// `(bx, by)` spans `[bx + 0.5, bx + 1.5] x [by + 0.5, by + 1.5]`.
fn midpoint(mid: Mid, bx: i64, by: i64) -> Point {
    let (x, y) = (bx as f64, by as f64);
    match mid {
        Mid::Top => Point::new(x + 1.0, y + 0.5),
        Mid::Right => Point::new(x + 1.5, y + 1.0),
        Mid::Bottom => Point::new(x + 1.0, y + 1.5),
        Mid::Left => Point::new(x + 0.5, y + 1.0),
    }
}

struct SolidGrid {
    width: i64,
    height: i64,
    solid: Vec<bool>,
}

impl SolidGrid {
    fn new(sampler: &impl OpacitySampler, threshold: f64) -> Self {
        let (w, h) = (sampler.width(), sampler.height());
        let mut solid = Vec::with_capacity(w as usize * h as usize);
        for y in 0..h {
            for x in 0..w {
                solid.push(f64::from(sampler.opacity(x, y)) / 255.0 >= threshold);
            }
        }
        SolidGrid {
            width: i64::from(w),
            height: i64::from(h),
            solid,
        }
    }

    // Everything outside the mask is empty.
    fn get(&self, x: i64, y: i64) -> bool {
        x >= 0
            && y >= 0
            && x < self.width
            && y < self.height
            && self.solid[(y * self.width + x) as usize]
    }

    fn key(&self, bx: i64, by: i64) -> usize {
        usize::from(self.get(bx, by)) << 3
            | usize::from(self.get(bx + 1, by)) << 2
            | usize::from(self.get(bx, by + 1)) << 1
            | usize::from(self.get(bx + 1, by + 1))
    }
}

fn bounds_contour(width: u32, height: u32) -> Contour {
    let (w, h) = (f64::from(width), f64::from(height));
    Contour::closed([
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(w, h),
        Point::new(0.0, h),
    ])
}

/// Traces the boundaries between solid and empty pixels.
///
/// Returns no contours for an empty mask, and a single rectangle covering
/// the mask if it has no alpha channel or no empty pixel.
pub fn trace_mask(sampler: &impl OpacitySampler, threshold: f64) -> Vec<Contour> {
    let (width, height) = (sampler.width(), sampler.height());
    if width == 0 || height == 0 {
        return Vec::new();
    }
    if !sampler.has_alpha() {
        return vec![bounds_contour(width, height)];
    }

    let grid = SolidGrid::new(sampler, threshold);
    let solid_count = grid.solid.iter().filter(|&&s| s).count();
    if solid_count == 0 {
        return Vec::new();
    }
    if solid_count == grid.solid.len() {
        return vec![bounds_contour(width, height)];
    }

    let mut set = ContourSet::new();
    for by in -1..grid.height {
        for bx in -1..grid.width {
            for &(from, to) in EDGES[grid.key(bx, by)] {
                set.add_segment(midpoint(from, bx, by), midpoint(to, bx, by));
            }
        }
    }

    let contours = set.finish();
    tracing::debug!(
        width,
        height,
        solid_count,
        contours = contours.len(),
        "traced mask"
    );
    contours
}

fn is_turn(prev: Point, cur: Point, next: Point, cos_tolerance: f64) -> bool {
    let incoming = cur - prev;
    let outgoing = next - cur;
    let lengths = incoming.hypot() * outgoing.hypot();
    lengths > 0.0 && incoming.dot(outgoing) / lengths < cos_tolerance
}

/// Drops the points of a closed polyline where it turns by less than
/// `min_angle` degrees.
///
/// The incoming direction is measured from the last point that was kept, so
/// a run of nearly collinear points collapses to its ends. Polylines are
/// never simplified below three points.
pub fn simplify_polyline(points: &[Point], min_angle: f64) -> Vec<Point> {
    let n = points.len();
    if n <= 3 {
        return points.to_vec();
    }
    let cos_tolerance = min_angle.to_radians().cos();

    let mut kept = Vec::with_capacity(n);
    kept.push(points[0]);
    for i in 1..n {
        let prev = kept[kept.len() - 1];
        if is_turn(prev, points[i], points[(i + 1) % n], cos_tolerance) {
            kept.push(points[i]);
        }
    }

    // The first point was kept unconditionally; now that we know its real
    // predecessor, check it too.
    if kept.len() > 3 && !is_turn(kept[kept.len() - 1], kept[0], kept[1], cos_tolerance) {
        kept.remove(0);
    }

    if kept.len() < 3 {
        points.to_vec()
    } else {
        kept
    }
}

/// Simplifies a closed contour in place, see [`simplify_polyline`].
pub fn simplify_contour(contour: &mut Contour, min_angle: f64) {
    if !contour.is_closed() {
        return;
    }
    let points: Vec<Point> = contour.points().collect();
    contour.set_points(simplify_polyline(&points, min_angle));
}

/// Pushes an outline outwards by `margin`.
///
/// The outline is stroked with round joins and caps at width `2 * margin`,
/// and the stroke's outline is added to the original. Filled with the
/// non-zero rule, the result covers every point within `margin` of the
/// original shape. A zero margin returns the outline unchanged.
pub fn expand_outline(outline: &BezPath, margin: f64) -> Result<BezPath, Error> {
    check_margin(margin)?;
    if margin == 0.0 {
        return Ok(outline.clone());
    }

    let style = Stroke::new(2.0 * margin)
        .with_join(Join::Round)
        .with_caps(Cap::Round);
    let stroked = kurbo::stroke(
        outline.iter(),
        &style,
        &StrokeOpts::default(),
        MARGIN_TOLERANCE,
    );
    let mut ret = outline.clone();
    ret.extend(stroked.iter());
    Ok(ret)
}

pub(crate) fn trace(
    sampler: &impl OpacitySampler,
    options: &TraceOptions,
) -> Result<BezPath, Error> {
    options.validate()?;

    let mut path = BezPath::new();
    for mut contour in trace_mask(sampler, options.threshold) {
        if let Some(angle) = options.min_angle {
            simplify_contour(&mut contour, angle);
        }
        contour.append_to(&mut path);
    }
    expand_outline(&path, options.margin)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use kurbo::{Point, Rect, Shape as _};
    use proptest::prelude::*;

    use super::*;
    use crate::mask::AlphaMask;

    fn sorted(points: impl Iterator<Item = Point>) -> Vec<(f64, f64)> {
        let mut ret: Vec<_> = points.map(|p| (p.x, p.y)).collect();
        ret.sort_by(|a, b| a.partial_cmp(b).unwrap());
        ret
    }

    fn check_closed(contours: &[Contour]) {
        for c in contours {
            assert!(c.is_closed(), "open contour {c:?}");
            assert!(c.len() >= 3);
            let points: Vec<_> = c.points().collect();
            for (i, p) in points.iter().enumerate() {
                assert_ne!(*p, points[(i + 1) % points.len()]);
            }
        }
    }

    #[test]
    fn empty_mask() {
        let mask = AlphaMask::from_ascii(&["...", "..."]).unwrap();
        assert!(trace_mask(&mask, 0.5).is_empty());
        let path = crate::trace_contours(&mask, &TraceOptions::default()).unwrap();
        assert!(path.elements().is_empty());
    }

    #[test]
    fn solid_mask_is_its_bounds() {
        let mask = AlphaMask::from_ascii(&["###", "###"]).unwrap();
        let contours = trace_mask(&mask, 0.5);
        assert_eq!(contours.len(), 1);
        assert_eq!(
            contours[0].points().collect::<Vec<_>>(),
            vec![
                Point::new(0.0, 0.0),
                Point::new(3.0, 0.0),
                Point::new(3.0, 2.0),
                Point::new(0.0, 2.0)
            ]
        );
    }

    struct Opaque;

    impl OpacitySampler for Opaque {
        fn width(&self) -> u32 {
            4
        }

        fn height(&self) -> u32 {
            5
        }

        fn opacity(&self, _x: u32, _y: u32) -> u8 {
            0
        }

        fn has_alpha(&self) -> bool {
            false
        }
    }

    #[test]
    fn no_alpha_channel() {
        let path = crate::trace_contours(&Opaque, &TraceOptions::default()).unwrap();
        assert_eq!(path.bounding_box(), Rect::new(0.0, 0.0, 4.0, 5.0));
    }

    #[test]
    fn single_pixel() {
        let mask = AlphaMask::from_ascii(&["...", ".#.", "..."]).unwrap();
        let contours = trace_mask(&mask, 0.5);
        check_closed(&contours);
        assert_eq!(contours.len(), 1);
        assert_eq!(
            sorted(contours[0].points()),
            vec![(1.0, 1.5), (1.5, 1.0), (1.5, 2.0), (2.0, 1.5)]
        );
    }

    #[test]
    fn saddle_keeps_pixels_apart() {
        let mask = AlphaMask::from_ascii(&["#.", ".#"]).unwrap();
        let contours = trace_mask(&mask, 0.5);
        check_closed(&contours);
        assert_eq!(contours.len(), 2);

        let mask = AlphaMask::from_ascii(&[".#", "#."]).unwrap();
        let contours = trace_mask(&mask, 0.5);
        check_closed(&contours);
        assert_eq!(contours.len(), 2);
    }

    #[test]
    fn ring_has_a_hole() {
        let mask = AlphaMask::from_ascii(&[
            ".....", //
            ".###.", //
            ".#.#.", //
            ".###.", //
            ".....",
        ])
        .unwrap();
        let contours = trace_mask(&mask, 0.5);
        check_closed(&contours);
        assert_eq!(contours.len(), 2);
    }

    #[test]
    fn simplified_square() {
        let mask = AlphaMask::from_ascii(&[
            ".....", //
            ".###.", //
            ".###.", //
            ".###.", //
            ".....",
        ])
        .unwrap();
        let mut contours = trace_mask(&mask, 0.5);
        check_closed(&contours);
        assert_eq!(contours.len(), 1);
        assert!(contours[0].len() > 8);

        simplify_contour(&mut contours[0], 15.0);
        assert_eq!(
            sorted(contours[0].points()),
            vec![
                (1.0, 1.5),
                (1.0, 3.5),
                (1.5, 1.0),
                (1.5, 4.0),
                (3.5, 1.0),
                (3.5, 4.0),
                (4.0, 1.5),
                (4.0, 3.5)
            ]
        );
    }

    #[test]
    fn threshold_is_inclusive() {
        let mask = AlphaMask::new(3, 1, vec![0, 128, 0]).unwrap();
        assert_eq!(trace_mask(&mask, 128.0 / 255.0).len(), 1);
        assert!(trace_mask(&mask, 129.0 / 255.0).is_empty());
    }

    #[test]
    fn invalid_parameters() {
        let mask = AlphaMask::from_ascii(&["#"]).unwrap();
        let bad_threshold = TraceOptions {
            threshold: 1.5,
            ..TraceOptions::default()
        };
        assert_matches!(
            crate::trace_contours(&mask, &bad_threshold),
            Err(Error::InvalidParameter { name: "threshold", .. })
        );
        let bad_margin = TraceOptions {
            margin: -1.0,
            ..TraceOptions::default()
        };
        assert_matches!(
            crate::trace_contours(&mask, &bad_margin),
            Err(Error::InvalidParameter { name: "margin", .. })
        );
    }

    #[test]
    fn zero_margin_is_identity() {
        let mask = AlphaMask::from_ascii(&["....", ".##.", ".#..", "...."]).unwrap();
        let options = TraceOptions {
            margin: 0.0,
            ..TraceOptions::default()
        };
        let traced = crate::trace_contours(&mask, &options).unwrap();
        assert_eq!(expand_outline(&traced, 0.0).unwrap(), traced);
    }

    #[test]
    fn margin_grows_the_outline() {
        let mask = AlphaMask::from_ascii(&["....", ".##.", ".##.", "...."]).unwrap();
        let plain = crate::trace_contours(&mask, &TraceOptions::default()).unwrap();
        let options = TraceOptions {
            margin: 2.0,
            ..TraceOptions::default()
        };
        let grown = crate::trace_contours(&mask, &options).unwrap();

        let inner = plain.bounding_box().inflate(1.9, 1.9);
        let outer = plain.bounding_box().inflate(2.1, 2.1);
        let bbox = grown.bounding_box();
        assert_eq!(bbox.union(inner), bbox, "{bbox:?} doesn't contain {inner:?}");
        assert_eq!(outer.union(bbox), outer, "{outer:?} doesn't contain {bbox:?}");
    }

    fn mask() -> impl Strategy<Value = AlphaMask> {
        (1u32..12, 1u32..12).prop_flat_map(|(w, h)| {
            prop::collection::vec(any::<u8>(), (w * h) as usize)
                .prop_map(move |data| AlphaMask::new(w, h, data).unwrap())
        })
    }

    proptest! {
        #[test]
        fn contours_are_closed(mask in mask(), threshold in 0.01..0.99f64) {
            let contours = trace_mask(&mask, threshold);
            check_closed(&contours);

            for mut c in contours {
                simplify_contour(&mut c, 15.0);
                prop_assert!(c.is_closed());
                prop_assert!(c.len() >= 3);
            }
        }
    }
}
