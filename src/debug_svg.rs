//! Drawing layouts as SVG, for eyeballing what went wrong.

use kurbo::{Rect, Size};
use svg::{
    node::element::{Line, Path, Rectangle},
    Document,
};

use crate::{
    layout::{LayoutResult, LineFragment},
    shape::FlowShape,
};

fn rectangle(r: Rect) -> Rectangle {
    Rectangle::new()
        .set("x", r.x0)
        .set("y", r.y0)
        .set("width", r.width())
        .set("height", r.height())
}

fn fragment_rect(f: &LineFragment) -> Rect {
    Rect::new(
        f.baseline.x,
        f.baseline.y - f.ascent,
        f.baseline.x + f.width,
        f.baseline.y + f.descent,
    )
}

/// Draws the canvas and the outlines of `shapes`.
pub fn shapes(size: Size, shapes: &[FlowShape]) -> Document {
    let stroke_width = size.width.max(size.height) / 512.0;
    let mut doc = Document::new()
        .set("viewBox", (0.0, 0.0, size.width, size.height))
        .add(
            rectangle(size.to_rect())
                .set("fill", "none")
                .set("stroke", "black")
                .set("stroke-width", stroke_width),
        );

    for shape in shapes {
        doc = doc.add(
            Path::new()
                .set("d", shape.outline().to_svg())
                .set("fill", "gray")
                .set("fill-opacity", 0.3)
                .set("fill-rule", "nonzero")
                .set("stroke", "black")
                .set("stroke-width", stroke_width),
        );
    }
    doc
}

/// Draws the free slots of a row on top of `doc`.
pub fn add_slots(mut doc: Document, slots: &[Rect]) -> Document {
    for s in slots {
        doc = doc.add(rectangle(*s).set("fill", "green").set("opacity", 0.3));
    }
    doc
}

/// Draws a laid out text: the shapes, a box around every fragment and its
/// baseline.
pub fn layout(size: Size, flow_shapes: &[FlowShape], result: &LayoutResult) -> Document {
    let stroke_width = size.width.max(size.height) / 512.0;
    let mut doc = shapes(size, flow_shapes);
    for f in &result.fragments {
        let color = if f.paragraph % 2 == 0 { "blue" } else { "red" };
        doc = doc
            .add(
                rectangle(fragment_rect(f))
                    .set("fill", color)
                    .set("fill-opacity", 0.2)
                    .set("stroke", color)
                    .set("stroke-width", stroke_width),
            )
            .add(
                Line::new()
                    .set("x1", f.baseline.x)
                    .set("y1", f.baseline.y)
                    .set("x2", f.baseline.x + f.width)
                    .set("y2", f.baseline.y)
                    .set("stroke", color)
                    .set("stroke-width", stroke_width),
            );
    }
    doc
}
