//! Benchmarks for snapshot folding and report classification.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pdfhunt::stages::classify;
use pdfhunt::subpipeline::SnapshotFold;
use pdfhunt::testing::snapshot;

fn fold_benchmark(c: &mut Criterion) {
    let snapshots: Vec<_> = (0..50).map(|i| snapshot(i / 5, (i / 3) as usize)).collect();

    c.bench_function("fold_50_snapshots", |b| {
        b.iter(|| {
            let mut fold = SnapshotFold::new(50);
            for snap in &snapshots {
                black_box(fold.observe(snap.clone()));
            }
            black_box(fold.finish())
        });
    });
}

fn classify_benchmark(c: &mut Criterion) {
    let report = "Object 12 holds an /OpenAction with embedded JavaScript. ".repeat(40)
        + "The document should be treated as suspicious.";

    c.bench_function("classify_report", |b| {
        b.iter(|| classify(black_box(&report)));
    });
}

criterion_group!(benches, fold_benchmark, classify_benchmark);
criterion_main!(benches);
