//! Benchmarks for s3-backup
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::path::{Path, PathBuf};

fn benchmark_content_type(c: &mut Criterion) {
    use s3_backup::content::resolve_content_type;

    let text = b"The quick brown fox jumps over the lazy dog.\n".repeat(20);
    let png: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    c.bench_function("content_type_extension", |b| {
        b.iter(|| black_box(resolve_content_type(Path::new("static/app.js"), &text)))
    });

    c.bench_function("content_type_sniff_text", |b| {
        b.iter(|| black_box(resolve_content_type(Path::new("notes"), &text)))
    });

    c.bench_function("content_type_sniff_png", |b| {
        b.iter(|| black_box(resolve_content_type(Path::new("logo"), &png)))
    });
}

fn benchmark_destination_key(c: &mut Criterion) {
    use s3_backup::upload::UploadJob;

    let job = UploadJob::new("/srv/site", "release.1700000000", Vec::new());
    let path = PathBuf::from("/srv/site/assets/js/vendor/app.bundle.js");

    c.bench_function("destination_key", |b| {
        b.iter(|| black_box(job.destination_key(&path)))
    });
}

fn benchmark_window_cycle(c: &mut Criterion) {
    use s3_backup::upload::Window;

    c.bench_function("window_10k_files_limit_25", |b| {
        b.iter(|| {
            let mut window = Window::new(10_000, 25);
            let mut admitted = window.seed().len();
            while !window.is_finished() {
                if window.complete().is_some() {
                    admitted += 1;
                }
            }
            black_box(admitted)
        })
    });
}

criterion_group!(
    benches,
    benchmark_content_type,
    benchmark_destination_key,
    benchmark_window_cycle
);
criterion_main!(benches);
