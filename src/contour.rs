//! Polylines assembled from directed boundary segments.

use std::collections::VecDeque;

use kurbo::{BezPath, Point};

/// A polyline that grows at both ends.
///
/// Consecutive points always differ. A closed contour doesn't repeat its
/// first point at the end: the last point is implicitly connected to the
/// first.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct Contour {
    points: VecDeque<Point>,
    closed: bool,
}

impl Contour {
    fn from_segment(p0: Point, p1: Point) -> Self {
        Contour {
            points: VecDeque::from([p0, p1]),
            closed: false,
        }
    }

    /// Creates a closed contour from its points.
    pub fn closed(points: impl IntoIterator<Item = Point>) -> Self {
        let mut points: VecDeque<Point> = points.into_iter().collect();
        points.dedup_consecutive();
        if points.len() > 1 && points.front() == points.back() {
            points.pop_back();
        }
        Contour {
            points,
            closed: true,
        }
    }

    /// The first point, if there is one.
    pub fn start(&self) -> Option<Point> {
        self.points.front().copied()
    }

    /// The last point, if there is one.
    pub fn end(&self) -> Option<Point> {
        self.points.back().copied()
    }

    /// Has this contour been closed into a loop?
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Are there no points at all?
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterates over the points, in order.
    pub fn points(&self) -> impl ExactSizeIterator<Item = Point> + '_ {
        self.points.iter().copied()
    }

    /// Iterates over the segments, including the closing one for closed
    /// contours.
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let closing = if self.closed && self.points.len() > 2 {
            self.points.back().copied().zip(self.points.front().copied())
        } else {
            None
        };
        self.points
            .iter()
            .zip(self.points.iter().skip(1))
            .map(|(p, q)| (*p, *q))
            .chain(closing)
    }

    /// Appends this contour to `path` as its own subpath.
    pub fn append_to(&self, path: &mut BezPath) {
        let mut points = self.points();
        let Some(first) = points.next() else {
            return;
        };
        path.move_to(first);
        for p in points {
            path.line_to(p);
        }
        if self.closed {
            path.close_path();
        }
    }

    /// Replaces the points of a closed contour, keeping it closed.
    pub(crate) fn set_points(&mut self, points: impl IntoIterator<Item = Point>) {
        self.points.clear();
        self.points.extend(points);
    }

    fn push_back(&mut self, p: Point) {
        if self.points.back() != Some(&p) {
            self.points.push_back(p);
        }
    }

    fn push_front(&mut self, p: Point) {
        if self.points.front() != Some(&p) {
            self.points.push_front(p);
        }
    }

    // Closes the contour. The segment that closes it ends at our start, so
    // the start point must not be repeated.
    fn close(&mut self) {
        if self.points.len() > 1 && self.points.front() == self.points.back() {
            self.points.pop_back();
        }
        self.closed = true;
    }
}

trait DedupConsecutive {
    fn dedup_consecutive(&mut self);
}

impl DedupConsecutive for VecDeque<Point> {
    fn dedup_consecutive(&mut self) {
        let mut prev: Option<Point> = None;
        self.retain(|&p| {
            let keep = prev != Some(p);
            prev = Some(p);
            keep
        });
    }
}

/// Contours under construction.
///
/// Segments are added one at a time and stitched, by exact endpoint
/// matching, onto the open contours collected so far. At any time, at most
/// one open contour starts at a given point and at most one ends there, as
/// long as every point has at most one incoming and one outgoing segment
/// (which is what the marching-squares table produces).
#[derive(Clone, Debug, Default)]
pub struct ContourSet {
    open: Vec<Contour>,
    closed: Vec<Contour>,
}

impl ContourSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the directed segment from `p0` to `p1`.
    ///
    /// The segment may extend an open contour at its tail or its head, close
    /// a contour into a loop, join two open contours into one, or start a
    /// new contour. Zero-length segments are ignored.
    pub fn add_segment(&mut self, p0: Point, p1: Point) {
        if p0 == p1 {
            return;
        }

        // The contour that ends where the segment starts, and the one that
        // starts where the segment ends.
        let tail = self.open.iter().position(|c| c.end() == Some(p0));
        let head = self.open.iter().position(|c| c.start() == Some(p1));

        match (tail, head) {
            (Some(t), Some(h)) if t == h => {
                let mut contour = self.open.swap_remove(t);
                contour.close();
                self.closed.push(contour);
            }
            (Some(t), Some(h)) => {
                let other = std::mem::take(&mut self.open[h]);
                self.open[t].points.extend(other.points);
                self.open.swap_remove(h);
            }
            (Some(t), None) => self.open[t].push_back(p1),
            (None, Some(h)) => self.open[h].push_front(p0),
            (None, None) => self.open.push(Contour::from_segment(p0, p1)),
        }
    }

    /// The number of contours, open or closed.
    pub fn len(&self) -> usize {
        self.open.len() + self.closed.len()
    }

    /// Is the set empty?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finishes construction, returning every contour.
    ///
    /// Closed contours come first, in the order they were closed. Contours
    /// that never met their own start remain open.
    pub fn finish(self) -> Vec<Contour> {
        let mut ret = self.closed;
        ret.extend(self.open);
        ret
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Point;

    use super::{Contour, ContourSet};

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn square_in_order() {
        let mut set = ContourSet::new();
        set.add_segment(p(0.0, 0.0), p(1.0, 0.0));
        set.add_segment(p(1.0, 0.0), p(1.0, 1.0));
        set.add_segment(p(1.0, 1.0), p(0.0, 1.0));
        set.add_segment(p(0.0, 1.0), p(0.0, 0.0));

        let contours = set.finish();
        assert_eq!(contours.len(), 1);
        assert!(contours[0].is_closed());
        assert_eq!(
            contours[0].points().collect::<Vec<_>>(),
            vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)]
        );
        assert_eq!(contours[0].segments().count(), 4);
    }

    #[test]
    fn square_merged_from_two_halves() {
        let mut set = ContourSet::new();
        set.add_segment(p(0.0, 0.0), p(1.0, 0.0));
        set.add_segment(p(1.0, 1.0), p(0.0, 1.0));
        assert_eq!(set.len(), 2);

        // Joins the two open contours.
        set.add_segment(p(1.0, 0.0), p(1.0, 1.0));
        assert_eq!(set.len(), 1);

        // Prepends, then closes the loop.
        set.add_segment(p(0.0, 1.0), p(0.0, 0.0));
        let contours = set.finish();
        assert_eq!(contours.len(), 1);
        assert!(contours[0].is_closed());
        assert_eq!(contours[0].len(), 4);
    }

    #[test]
    fn prepend() {
        let mut set = ContourSet::new();
        set.add_segment(p(1.0, 0.0), p(2.0, 0.0));
        set.add_segment(p(0.0, 0.0), p(1.0, 0.0));
        let contours = set.finish();
        assert_eq!(contours.len(), 1);
        assert!(!contours[0].is_closed());
        assert_eq!(
            contours[0].points().collect::<Vec<_>>(),
            vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)]
        );
    }

    #[test]
    fn two_segment_loop() {
        // The smallest possible loop: a segment and its reverse.
        let mut set = ContourSet::new();
        set.add_segment(p(0.0, 0.0), p(1.0, 0.0));
        set.add_segment(p(1.0, 0.0), p(0.0, 0.0));
        let contours = set.finish();
        assert_eq!(contours.len(), 1);
        assert!(contours[0].is_closed());
        assert_eq!(contours[0].len(), 2);
    }

    #[test]
    fn ignores_degenerate_segments() {
        let mut set = ContourSet::new();
        set.add_segment(p(3.0, 3.0), p(3.0, 3.0));
        assert!(set.is_empty());
    }

    #[test]
    fn closed_constructor_drops_repeats() {
        let c = Contour::closed([p(0.0, 0.0), p(1.0, 0.0), p(1.0, 0.0), p(0.0, 1.0), p(0.0, 0.0)]);
        assert_eq!(c.len(), 3);
        assert!(c.is_closed());
    }
}
