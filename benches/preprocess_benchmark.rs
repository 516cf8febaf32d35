use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lungscan::imaging::{decode, to_luminance, to_tensor};
use lungscan::{preprocess, Prediction};

fn encoded_xray(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        let v = ((x ^ y) % 256) as u8;
        Rgb([v, v, v])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

fn bench_preprocess(c: &mut Criterion) {
    let mut group = c.benchmark_group("Preprocess");

    // Configure sampling
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    for (name, width, height, format) in [
        ("png_224", 224, 224, ImageFormat::Png),
        ("png_1024", 1024, 1024, ImageFormat::Png),
        ("jpeg_2048", 2048, 2048, ImageFormat::Jpeg),
    ] {
        let bytes = encoded_xray(width, height, format);
        group.bench_function(name, |b| b.iter(|| preprocess(black_box(&bytes)).unwrap()));
    }

    group.finish();
}

fn bench_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("Stages");
    group.sample_size(50);

    let bytes = encoded_xray(1024, 1024, ImageFormat::Png);
    let image = decode(&bytes).unwrap();
    let gray = to_luminance(&image);
    let probabilities: &[f32] = &[0.7, 0.2, 0.1];

    group.bench_function("decode", |b| b.iter(|| decode(black_box(&bytes)).unwrap()));
    group.bench_function("luminance", |b| b.iter(|| to_luminance(black_box(&image))));
    group.bench_function("tensor", |b| b.iter(|| to_tensor(black_box(&gray))));
    group.bench_function("label", |b| {
        b.iter(|| Prediction::from_probabilities(black_box(probabilities)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_preprocess, bench_stages);
criterion_main!(benches);
