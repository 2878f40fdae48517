//! Benchmarks for the Tilemark pipeline stages.
//!
//! Run with: cargo bench -p tilemark-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgba, RgbaImage};
use std::path::Path;
use tilemark_core::config::{OutputConfig, ThumbnailConfig};
use tilemark_core::pipeline::{JpegExporter, ThumbnailSize, Thumbnailer, Watermark};

fn sample_watermark() -> Watermark {
    let logo = RgbaImage::from_fn(200, 80, |x, y| {
        let alpha = if (x / 10 + y / 10) % 2 == 0 { 255 } else { 0 };
        Rgba([255, 255, 255, alpha])
    });
    Watermark::new(logo, 0.3).expect("valid opacity")
}

fn benchmark_tile(c: &mut Criterion) {
    let watermark = sample_watermark();
    let source = RgbaImage::from_pixel(1920, 1080, Rgba([30, 60, 90, 255]));

    c.bench_function("tile_1080p", |b| {
        b.iter(|| {
            let mut canvas = source.clone();
            black_box(watermark.tile_onto(black_box(&mut canvas)));
        })
    });
}

fn benchmark_thumbnail(c: &mut Criterion) {
    let thumbnailer = Thumbnailer::new(&ThumbnailConfig::default());
    let source = RgbaImage::from_pixel(1920, 1080, Rgba([30, 60, 90, 255]));
    let target = ThumbnailSize::new(320, 320).expect("non-zero size");

    c.bench_function("thumbnail_1080p_to_320", |b| {
        b.iter(|| {
            let _ = thumbnailer.apply(black_box(&source), target);
        })
    });
}

fn benchmark_encode(c: &mut Criterion) {
    let exporter = JpegExporter::new(&OutputConfig::default());
    let source = RgbaImage::from_pixel(1920, 1080, Rgba([30, 60, 90, 255]));

    c.bench_function("encode_jpeg_1080p", |b| {
        b.iter(|| {
            let _ = exporter.encode_to_vec(black_box(&source), Path::new("bench.jpg"));
        })
    });
}

criterion_group!(
    benches,
    benchmark_tile,
    benchmark_thumbnail,
    benchmark_encode
);
criterion_main!(benches);
