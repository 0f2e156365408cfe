#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

#[macro_use]
mod typed_vec;

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary;
pub mod clip;
pub mod contour;
pub mod interval_tree;
pub mod layout;
pub mod mask;
pub mod shape;
pub mod slots;
pub mod trace;

#[cfg(feature = "debug-svg")]
pub mod debug_svg;
#[cfg(feature = "generators")]
pub mod generators;

pub use kurbo;
use kurbo::{BezPath, PathEl, Size};

pub use layout::{
    FlowLayout, Hyphenation, Justification, LayoutOptions, LayoutResult, LineBreaker,
    LineFragment, MonospaceBreaker, StyleProperty, StyleRun, StyleSpan, TextStyle,
};
pub use mask::{AlphaMask, OpacitySampler};
pub use shape::{FlowShape, FlowType, ShapeProvider, TextDirection};
pub use slots::{find_slots, Intrusion, SlotFinder};
pub use trace::TraceOptions;

/// The input was faulty.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// At least one of the inputs was infinite.
    #[error("one of the inputs was infinite")]
    Infinity,
    /// At least one of the inputs was not a number.
    #[error("one of the inputs had a NaN")]
    NaN,
    /// A mask's buffer doesn't match its dimensions.
    #[error("a {width}x{height} mask can't have {len} bytes")]
    MaskSize {
        /// The claimed width.
        width: u32,
        /// The claimed height.
        height: u32,
        /// The actual length of the buffer.
        len: usize,
    },
    /// A parameter was out of range.
    #[error("invalid {name}: {value}")]
    InvalidParameter {
        /// The name of the parameter.
        name: &'static str,
        /// Its value.
        value: f64,
    },
}

pub(crate) fn check_finite(x: f64) -> Result<(), Error> {
    if x.is_nan() {
        Err(Error::NaN)
    } else if x.is_infinite() {
        Err(Error::Infinity)
    } else {
        Ok(())
    }
}

pub(crate) fn check_finite_path(path: &BezPath) -> Result<(), Error> {
    for el in path.elements() {
        let points = match el {
            PathEl::MoveTo(p) | PathEl::LineTo(p) => [Some(*p), None, None],
            PathEl::QuadTo(p0, p1) => [Some(*p0), Some(*p1), None],
            PathEl::CurveTo(p0, p1, p2) => [Some(*p0), Some(*p1), Some(*p2)],
            PathEl::ClosePath => [None; 3],
        };
        for p in points.into_iter().flatten() {
            check_finite(p.x)?;
            check_finite(p.y)?;
        }
    }
    Ok(())
}

/// Traces the outline of the solid parts of a raster.
///
/// The result has one closed subpath per traced contour (including the
/// boundaries of holes), in the raster's pixel coordinates, and should be
/// filled with the non-zero rule.
pub fn trace_contours(
    sampler: &impl OpacitySampler,
    options: &TraceOptions,
) -> Result<BezPath, Error> {
    trace::trace(sampler, options)
}

/// Builds a flow shape from an outline.
pub fn build_flow_shape(outline: BezPath, flow: FlowType) -> Result<FlowShape, Error> {
    FlowShape::new(outline, flow)
}

/// Lays out `text` around `shapes` on a canvas of `size`.
///
/// This is a one-off version of [`FlowLayout::layout`].
pub fn layout<B: LineBreaker + ?Sized>(
    text: &str,
    root_style: &TextStyle,
    spans: &[StyleSpan],
    shapes: &[FlowShape],
    size: Size,
    options: &LayoutOptions,
    breaker: &mut B,
) -> Result<LayoutResult, Error> {
    FlowLayout::new().layout(text, root_style, spans, shapes, size, options, breaker)
}
