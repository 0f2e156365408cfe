use criterion::{black_box, criterion_group, criterion_main, Criterion};

use textflow::{generators::circle_mask, trace_contours, TraceOptions};

fn trace(c: &mut Criterion) {
    let mask = circle_mask(256);

    c.bench_function("trace a 256x256 ring", |b| {
        b.iter(|| black_box(trace_contours(&mask, &TraceOptions::default()).unwrap()))
    });

    let raw = TraceOptions {
        min_angle: None,
        ..TraceOptions::default()
    };
    c.bench_function("trace a 256x256 ring without simplifying", |b| {
        b.iter(|| black_box(trace_contours(&mask, &raw).unwrap()))
    });
}

fn margin(c: &mut Criterion) {
    let mask = circle_mask(128);
    let options = TraceOptions {
        margin: 4.0,
        ..TraceOptions::default()
    };

    c.bench_function("trace a 128x128 ring with a margin", |b| {
        b.iter(|| black_box(trace_contours(&mask, &options).unwrap()))
    });
}

criterion_group!(benches, trace, margin);
criterion_main!(benches);
