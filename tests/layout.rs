use std::fmt::Write as _;

use kurbo::{BezPath, Rect, Shape as _, Size};
use textflow::{
    slots::intrusion, FlowShape, FlowType, LayoutOptions, LayoutResult, MonospaceBreaker,
    TextStyle,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn style() -> TextStyle {
    TextStyle {
        font_size: 10.0,
        line_height: 1.0,
        ..TextStyle::default()
    }
}

fn render(text: &str, result: &LayoutResult) -> String {
    let mut out = String::new();
    for f in &result.fragments {
        writeln!(
            out,
            "{:?} col {} at ({}, {}) width {}: {:?}",
            f.range,
            f.column,
            f.baseline.x,
            f.baseline.y,
            f.width,
            &text[f.range.clone()]
        )
        .unwrap();
    }
    write!(
        out,
        "height {}, last offset {}",
        result.height, result.last_offset
    )
    .unwrap();
    out
}

#[test]
fn two_obstacles() {
    init_tracing();
    let text = "the quick brown fox jumps over the lazy dog and keeps running far away";
    let shapes = [
        FlowShape::new(Rect::new(80.0, 0.0, 120.0, 25.0).to_path(0.1), FlowType::Both).unwrap(),
        FlowShape::new(Rect::new(0.0, 35.0, 30.0, 60.0).to_path(0.1), FlowType::Right).unwrap(),
    ];
    let result = textflow::layout(
        text,
        &style(),
        &[],
        &shapes,
        Size::new(200.0, 60.0),
        &LayoutOptions::default(),
        &mut MonospaceBreaker::new(),
    )
    .unwrap();

    insta::assert_snapshot!("two_obstacles", render(text, &result));
}

#[test]
fn text_avoids_svg_ring() -> anyhow::Result<()> {
    init_tracing();
    let data = std::fs::read_to_string(textflow_util::asset_path("ring.svg"))?;
    let outline = textflow_util::svg_to_outline(&data)?;
    let bbox = textflow_util::bezier_bounding_box(std::iter::once(&outline));
    assert!((bbox.x0 - 40.0).abs() < 1e-3, "{bbox:?}");
    assert!((bbox.y1 - 160.0).abs() < 1e-3, "{bbox:?}");

    let shape = FlowShape::new(outline, FlowType::Both)?;
    let text = "Far far away, behind the word mountains, far from the countries Vokalia \
        and Consonantia, there live the blind texts. Separated they live in Bookmarksgrove \
        right at the coast of the Semantics, a large language ocean.";
    let canvas = Size::new(200.0, 200.0);
    let result = textflow::layout(
        text,
        &style(),
        &[],
        std::slice::from_ref(&shape),
        canvas,
        &LayoutOptions::default(),
        &mut MonospaceBreaker::new(),
    )?;

    assert!(!result.fragments.is_empty());
    for f in &result.fragments {
        let top = f.baseline.y - f.ascent;
        let row = Rect::new(0.0, top, canvas.width, top + 10.0);
        if let Some(i) = intrusion(&shape, row, row) {
            assert!(
                f.baseline.x + f.width <= i.min || f.baseline.x >= i.max,
                "{f:?} overlaps {i:?}"
            );
        }
    }
    Ok(())
}

#[test]
fn reusing_a_layout() {
    let text = "reuse the same scratch buffers for every pass";
    let shapes = [FlowShape::new(
        BezPath::from_svg("M0 0 L50 50 L0 100 Z").unwrap(),
        FlowType::Right,
    )
    .unwrap()];
    let mut layout = textflow::FlowLayout::new();
    let mut breaker = MonospaceBreaker::new();
    let mut run = |width: f64| {
        layout
            .layout(
                text,
                &style(),
                &[],
                &shapes,
                Size::new(width, 100.0),
                &LayoutOptions::default(),
                &mut breaker,
            )
            .unwrap()
    };

    let first = run(120.0);
    let _ = run(300.0);
    let again = run(120.0);
    assert_eq!(first, again);
}
