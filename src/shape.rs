//! Obstacles that text flows around.

use kurbo::{Affine, BezPath, Line, PathEl, Point, Rect, Size};

use crate::{
    interval_tree::{Interval, IntervalTree},
    Error,
};

/// Outlines are flattened to polylines with this accuracy, in device pixels.
pub const FLATTEN_TOLERANCE: f64 = 1.0;

/// The direction that lines of text run in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TextDirection {
    /// Left to right.
    #[default]
    Ltr,
    /// Right to left.
    Rtl,
}

/// Which sides of a shape text is allowed to occupy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FlowType {
    /// Text only flows to the left of the shape.
    Left,
    /// Text only flows to the right of the shape.
    Right,
    /// Text flows on both sides.
    #[default]
    Both,
    /// The shape doesn't affect text at all.
    None,
    /// The side where lines start: left for left-to-right text.
    Start,
    /// The side where lines end: right for left-to-right text.
    End,
}

impl FlowType {
    /// Replaces `Start` and `End` by the physical side they mean in `direction`.
    pub fn resolve(self, direction: TextDirection) -> FlowType {
        match (self, direction) {
            (FlowType::Start, TextDirection::Ltr) | (FlowType::End, TextDirection::Rtl) => {
                FlowType::Left
            }
            (FlowType::Start, TextDirection::Rtl) | (FlowType::End, TextDirection::Ltr) => {
                FlowType::Right
            }
            (flow, _) => flow,
        }
    }

    /// May text be placed to the left of the shape?
    ///
    /// `Start` and `End` must be resolved first; they permit nothing.
    pub fn allows_left(self) -> bool {
        matches!(self, FlowType::Left | FlowType::Both)
    }

    /// May text be placed to the right of the shape?
    ///
    /// `Start` and `End` must be resolved first; they permit nothing.
    pub fn allows_right(self) -> bool {
        matches!(self, FlowType::Right | FlowType::Both)
    }
}

/// An obstacle outline together with its flow policy.
///
/// The outline is flattened once, when the shape is built, into an interval
/// tree of its edges keyed by their vertical extent. A `FlowShape` can only
/// be constructed with that tree in place.
#[derive(Clone, Debug)]
pub struct FlowShape {
    outline: BezPath,
    flow: FlowType,
    edges: IntervalTree<Line>,
    bounds: Option<Rect>,
}

impl FlowShape {
    /// Builds a shape from an outline.
    ///
    /// Every subpath is treated as closed. Fails if the outline has a
    /// non-finite coordinate.
    pub fn new(outline: BezPath, flow: FlowType) -> Result<Self, Error> {
        let mut ret = FlowShape {
            outline: BezPath::new(),
            flow,
            edges: IntervalTree::new(),
            bounds: None,
        };
        ret.set_outline(outline)?;
        Ok(ret)
    }

    /// Builds a shape from whatever outline `provider` gives for an element
    /// at `container` on a canvas of `size`.
    ///
    /// Returns `Ok(None)` if the provider has no outline.
    pub fn from_provider(
        provider: &impl ShapeProvider,
        size: Size,
        container: Rect,
        flow: FlowType,
    ) -> Result<Option<Self>, Error> {
        provider
            .outline(size, container)
            .map(|outline| FlowShape::new(outline, flow))
            .transpose()
    }

    /// Replaces the outline, rebuilding the edge index.
    ///
    /// On error the shape is left empty.
    pub fn set_outline(&mut self, outline: BezPath) -> Result<(), Error> {
        self.edges.clear();
        self.bounds = None;
        self.outline = BezPath::new();
        crate::check_finite_path(&outline)?;

        let mut edges = EdgeCollector::default();
        kurbo::flatten(outline.iter(), FLATTEN_TOLERANCE, |el| edges.push(el));
        edges.close_subpath();

        for line in edges.lines {
            let (top, bottom) = if line.p0.y <= line.p1.y {
                (line.p0.y, line.p1.y)
            } else {
                (line.p1.y, line.p0.y)
            };
            self.edges.insert(Interval::new(top, bottom, line));
        }
        self.bounds = edges.bounds;
        self.outline = outline;
        Ok(())
    }

    /// Pushes the outline outwards by `margin`, keeping the flow policy.
    pub fn with_margin(mut self, margin: f64) -> Result<Self, Error> {
        if margin != 0.0 {
            let outline = crate::trace::expand_outline(&self.outline, margin)?;
            self.set_outline(outline)?;
        }
        Ok(self)
    }

    /// Changes the flow policy.
    pub fn set_flow(&mut self, flow: FlowType) {
        self.flow = flow;
    }

    /// The outline this shape was built from.
    pub fn outline(&self) -> &BezPath {
        &self.outline
    }

    /// The flow policy.
    pub fn flow(&self) -> FlowType {
        self.flow
    }

    /// The bounding box of the flattened outline, or `None` if it's empty.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// The flattened edges, keyed by vertical extent.
    pub fn edges(&self) -> &IntervalTree<Line> {
        &self.edges
    }

    /// Calls `f` on every flattened edge whose vertical extent meets
    /// `[top, bottom]`.
    pub fn for_each_edge_in(&self, top: f64, bottom: f64, mut f: impl FnMut(Line)) {
        self.edges
            .for_each_overlap(top, bottom, |interval| f(interval.data));
    }
}

#[derive(Default)]
struct EdgeCollector {
    lines: Vec<Line>,
    bounds: Option<Rect>,
    start: Option<Point>,
    current: Option<Point>,
}

impl EdgeCollector {
    fn add_point(&mut self, p: Point) {
        self.bounds = Some(match self.bounds {
            Some(b) => b.union_pt(p),
            None => Rect::from_points(p, p),
        });
    }

    fn line_to(&mut self, p: Point) {
        if let Some(q) = self.current {
            if q != p {
                self.lines.push(Line::new(q, p));
            }
        }
        self.add_point(p);
        self.current = Some(p);
    }

    fn close_subpath(&mut self) {
        if let Some(start) = self.start {
            self.line_to(start);
        }
    }

    fn push(&mut self, el: PathEl) {
        match el {
            PathEl::MoveTo(p) => {
                self.close_subpath();
                self.start = Some(p);
                self.current = Some(p);
                self.add_point(p);
            }
            PathEl::LineTo(p) => self.line_to(p),
            PathEl::ClosePath => self.close_subpath(),
            // `flatten` only emits lines.
            PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p) => self.line_to(p),
        }
    }
}

/// Something that can produce an obstacle outline for an element.
pub trait ShapeProvider {
    /// The outline of an element occupying `container` on a canvas of
    /// `size`, in canvas coordinates.
    fn outline(&self, size: Size, container: Rect) -> Option<BezPath>;
}

impl ShapeProvider for BezPath {
    fn outline(&self, _size: Size, _container: Rect) -> Option<BezPath> {
        Some(self.clone())
    }
}

impl<P: ShapeProvider + ?Sized> ShapeProvider for &P {
    fn outline(&self, size: Size, container: Rect) -> Option<BezPath> {
        (**self).outline(size, container)
    }
}

/// An outline in some source coordinate system (typically the pixels of a
/// traced mask) that gets stretched over its element.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaledOutline {
    /// The outline, in source coordinates.
    pub outline: BezPath,
    /// The size of the source coordinate space.
    pub source_size: Size,
}

impl ScaledOutline {
    /// Wraps an outline drawn on a `source_size` canvas.
    pub fn new(outline: BezPath, source_size: Size) -> Self {
        ScaledOutline {
            outline,
            source_size,
        }
    }
}

impl ShapeProvider for ScaledOutline {
    fn outline(&self, _size: Size, container: Rect) -> Option<BezPath> {
        let Size { width, height } = self.source_size;
        if !(width > 0.0 && height > 0.0) {
            return None;
        }
        let container = container.abs();
        let transform = Affine::translate(container.origin().to_vec2())
            * Affine::scale_non_uniform(container.width() / width, container.height() / height);
        Some(transform * &self.outline)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use kurbo::{BezPath, Rect, Shape as _, Size};

    use super::*;

    fn rect_path(x0: f64, y0: f64, x1: f64, y1: f64) -> BezPath {
        Rect::new(x0, y0, x1, y1).to_path(0.1)
    }

    #[test]
    fn resolve_direction() {
        assert_eq!(FlowType::Start.resolve(TextDirection::Ltr), FlowType::Left);
        assert_eq!(FlowType::End.resolve(TextDirection::Ltr), FlowType::Right);
        assert_eq!(FlowType::Start.resolve(TextDirection::Rtl), FlowType::Right);
        assert_eq!(FlowType::End.resolve(TextDirection::Rtl), FlowType::Left);
        assert_eq!(FlowType::Both.resolve(TextDirection::Rtl), FlowType::Both);
        assert_eq!(FlowType::None.resolve(TextDirection::Ltr), FlowType::None);
    }

    #[test]
    fn rectangle_edges() {
        let shape = FlowShape::new(rect_path(10.0, 20.0, 30.0, 50.0), FlowType::Both).unwrap();
        assert_eq!(shape.bounds(), Some(Rect::new(10.0, 20.0, 30.0, 50.0)));
        assert_eq!(shape.edges().len(), 4);
        shape.edges().check_invariants();

        let mut hits = Vec::new();
        shape.for_each_edge_in(30.0, 40.0, |l| hits.push(l));
        // The two vertical sides.
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|l| l.p0.x == l.p1.x));
    }

    #[test]
    fn unclosed_subpaths_are_closed() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 0.0));
        path.line_to((10.0, 10.0));
        path.move_to((20.0, 0.0));
        path.line_to((30.0, 10.0));
        path.line_to((20.0, 10.0));
        let shape = FlowShape::new(path, FlowType::Both).unwrap();
        assert_eq!(shape.edges().len(), 6);
        assert_eq!(shape.bounds(), Some(Rect::new(0.0, 0.0, 30.0, 10.0)));
    }

    #[test]
    fn curves_are_flattened() {
        let circle = kurbo::Circle::new((50.0, 50.0), 20.0).to_path(0.1);
        let shape = FlowShape::new(circle, FlowType::Both).unwrap();
        assert!(shape.edges().len() > 8);
        // Flattened points are on the curve, so they can't stray outside the
        // circle but may cut its extremes by up to the tolerance.
        let bounds = shape.bounds().unwrap();
        let exact = Rect::new(30.0, 30.0, 70.0, 70.0);
        assert_eq!(exact.inflate(0.1, 0.1).union(bounds), exact.inflate(0.1, 0.1));
        assert_eq!(bounds.union(exact.inflate(-1.0, -1.0)), bounds);
    }

    #[test]
    fn empty_outline() {
        let shape = FlowShape::new(BezPath::new(), FlowType::Left).unwrap();
        assert_eq!(shape.bounds(), None);
        assert!(shape.edges().is_empty());
    }

    #[test]
    fn non_finite_outline() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((f64::NAN, 1.0));
        assert_matches!(FlowShape::new(path, FlowType::Both), Err(Error::NaN));

        let mut path = BezPath::new();
        path.move_to((0.0, f64::INFINITY));
        path.line_to((1.0, 1.0));
        assert_matches!(FlowShape::new(path, FlowType::Both), Err(Error::Infinity));
    }

    #[test]
    fn set_outline_rebuilds() {
        let mut shape = FlowShape::new(rect_path(0.0, 0.0, 10.0, 10.0), FlowType::Right).unwrap();
        shape.set_outline(rect_path(100.0, 100.0, 120.0, 130.0)).unwrap();
        assert_eq!(shape.bounds(), Some(Rect::new(100.0, 100.0, 120.0, 130.0)));
        assert_eq!(shape.edges().len(), 4);
        assert_eq!(shape.flow(), FlowType::Right);

        let mut hits = 0;
        shape.for_each_edge_in(0.0, 10.0, |_| hits += 1);
        assert_eq!(hits, 0);
    }

    #[test]
    fn margin_grows_bounds() {
        let shape = FlowShape::new(rect_path(10.0, 10.0, 20.0, 20.0), FlowType::Both)
            .unwrap()
            .with_margin(5.0)
            .unwrap();
        let bounds = shape.bounds().unwrap();
        assert!((bounds.x0 - 5.0).abs() < 0.5, "{bounds:?}");
        assert!((bounds.x1 - 25.0).abs() < 0.5, "{bounds:?}");
        assert!((bounds.y0 - 5.0).abs() < 0.5, "{bounds:?}");
        assert!((bounds.y1 - 25.0).abs() < 0.5, "{bounds:?}");
    }

    #[test]
    fn scaled_provider() {
        let provider = ScaledOutline::new(rect_path(0.0, 0.0, 2.0, 2.0), Size::new(4.0, 4.0));
        let shape = FlowShape::from_provider(
            &provider,
            Size::new(200.0, 200.0),
            Rect::new(100.0, 50.0, 140.0, 90.0),
            FlowType::Both,
        )
        .unwrap()
        .unwrap();
        assert_eq!(shape.bounds(), Some(Rect::new(100.0, 50.0, 120.0, 70.0)));

        let degenerate = ScaledOutline::new(rect_path(0.0, 0.0, 2.0, 2.0), Size::ZERO);
        assert!(degenerate
            .outline(Size::new(10.0, 10.0), Rect::new(0.0, 0.0, 10.0, 10.0))
            .is_none());
    }

    #[test]
    fn path_provider_is_a_copy() {
        let path = rect_path(1.0, 2.0, 3.0, 4.0);
        assert_eq!(
            path.outline(Size::new(10.0, 10.0), Rect::ZERO),
            Some(path.clone())
        );
    }
}
