use kurbo::{BezPath, ParamCurve as _, Rect, Shape};
use std::path::{Path, PathBuf};

fn pt(p: usvg::tiny_skia_path::Point) -> kurbo::Point {
    kurbo::Point::new(p.x as f64, p.y as f64)
}

fn push_path(path: &usvg::Path, ret: &mut Vec<BezPath>) {
    let Some(data) = path.data().clone().transform(path.abs_transform()) else {
        return;
    };
    let mut out = BezPath::new();
    for seg in data.segments() {
        match seg {
            usvg::tiny_skia_path::PathSegment::MoveTo(p) => {
                // Flow shapes close every subpath anyway, so an unclosed
                // subpath ends here.
                if !out.is_empty() {
                    ret.push(std::mem::take(&mut out));
                }
                out.move_to(pt(p));
            }
            usvg::tiny_skia_path::PathSegment::LineTo(p) => out.line_to(pt(p)),
            usvg::tiny_skia_path::PathSegment::QuadTo(p0, p1) => out.quad_to(pt(p0), pt(p1)),
            usvg::tiny_skia_path::PathSegment::CubicTo(p0, p1, p2) => {
                out.curve_to(pt(p0), pt(p1), pt(p2))
            }
            usvg::tiny_skia_path::PathSegment::Close => {
                out.close_path();
                let start = out.segments().next().map(|s| s.start());
                if let Some(p) = start {
                    ret.push(std::mem::take(&mut out));
                    out.move_to(p);
                }
            }
        }
    }
    // A lone trailing `MoveTo` isn't worth keeping.
    if out.segments().next().is_some() {
        ret.push(out);
    }
}

/// Collects every path in an SVG tree, one `BezPath` per subpath, with all
/// transforms applied.
pub fn svg_to_bezpaths(tree: &usvg::Tree) -> Vec<BezPath> {
    fn add_group(group: &usvg::Group, ret: &mut Vec<BezPath>) {
        for child in group.children() {
            match child {
                usvg::Node::Group(group) => add_group(group, ret),
                usvg::Node::Path(path) => push_path(path, ret),
                _ => {}
            }
        }
    }

    let mut ret = Vec::new();
    add_group(tree.root(), &mut ret);
    ret
}

/// Parses an SVG document into a single outline made of all its subpaths.
pub fn svg_to_outline(data: &str) -> Result<BezPath, usvg::Error> {
    let tree = usvg::Tree::from_str(data, &usvg::Options::default())?;
    let mut ret = BezPath::new();
    for path in svg_to_bezpaths(&tree) {
        ret.extend(path.iter());
    }
    Ok(ret)
}

/// The smallest rectangle containing all of `paths`.
///
/// With no paths, this is an "inverted" rectangle that is the identity for
/// [`Rect::union`].
pub fn bezier_bounding_box<'a>(paths: impl Iterator<Item = &'a BezPath>) -> Rect {
    let mut rect = Rect::new(
        f64::INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NEG_INFINITY,
    );

    for p in paths {
        rect = rect.union(p.bounding_box());
    }
    rect
}

/// The path of a test asset, relative to the crate being tested.
pub fn asset_path(name: impl AsRef<Path>) -> PathBuf {
    let mut ws: PathBuf = std::env::var_os("CARGO_MANIFEST_DIR").unwrap().into();
    ws.push("tests/assets");
    ws.push(name);
    ws
}
