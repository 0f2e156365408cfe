//! Cohen-Sutherland clipping of line segments against rectangles.

use kurbo::{Line, Point, Rect};

const INSIDE: u8 = 0;
const LEFT: u8 = 1;
const RIGHT: u8 = 2;
const BOTTOM: u8 = 4;
const TOP: u8 = 8;

// In y-down coordinates "top" is the smaller y.
fn outcode(p: Point, rect: &Rect) -> u8 {
    let mut code = INSIDE;
    if p.x < rect.x0 {
        code |= LEFT;
    } else if p.x > rect.x1 {
        code |= RIGHT;
    }
    if p.y < rect.y0 {
        code |= TOP;
    } else if p.y > rect.y1 {
        code |= BOTTOM;
    }
    code
}

/// Clips `line` to the closed rectangle `rect`.
///
/// Returns `None` if no part of the segment lies in the rectangle. The
/// rectangle's bounds may be infinite, which makes it a band: for example,
/// `Rect::new(f64::NEG_INFINITY, y0, f64::INFINITY, y1)` only clips
/// vertically.
pub fn clip_line(line: Line, rect: Rect) -> Option<Line> {
    let rect = rect.abs();
    let Line { mut p0, mut p1 } = line;
    let mut code0 = outcode(p0, &rect);
    let mut code1 = outcode(p1, &rect);

    loop {
        if code0 | code1 == INSIDE {
            return Some(Line::new(p0, p1));
        }
        if code0 & code1 != INSIDE {
            return None;
        }

        // At least one endpoint is outside; move it to the boundary it's
        // outside of. Because the codes share no bit, the segment really
        // crosses that boundary and the division below is well defined.
        let out = if code0 != INSIDE { code0 } else { code1 };
        let Point { x: x0, y: y0 } = p0;
        let Point { x: x1, y: y1 } = p1;
        let p = if out & TOP != 0 {
            Point::new(x0 + (x1 - x0) * (rect.y0 - y0) / (y1 - y0), rect.y0)
        } else if out & BOTTOM != 0 {
            Point::new(x0 + (x1 - x0) * (rect.y1 - y0) / (y1 - y0), rect.y1)
        } else if out & RIGHT != 0 {
            Point::new(rect.x1, y0 + (y1 - y0) * (rect.x1 - x0) / (x1 - x0))
        } else {
            Point::new(rect.x0, y0 + (y1 - y0) * (rect.x0 - x0) / (x1 - x0))
        };

        if out == code0 {
            p0 = p;
            code0 = outcode(p0, &rect);
        } else {
            p1 = p;
            code1 = outcode(p1, &rect);
        }
    }
}
