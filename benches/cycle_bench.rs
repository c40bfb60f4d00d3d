//! Benchmarks for disktroyer
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn benchmark_payload_generation(c: &mut Criterion) {
    use disktroyer::payload::Payload;

    c.bench_function("payload_generate_64k", |b| {
        b.iter(|| {
            let payload = Payload::generate(black_box(65536)).unwrap();
            black_box(payload);
        })
    });
}

fn benchmark_single_cycle(c: &mut Criterion) {
    use disktroyer::payload::Payload;
    use disktroyer::stress::{run_cycle, CycleDirs};

    let tmp = tempfile::tempdir().unwrap();
    let dirs = CycleDirs::new(tmp.path().join("0"));
    let payload = Payload::generate(4096).unwrap();

    c.bench_function("cycle_100_files_4k", |b| {
        b.iter(|| {
            let report = run_cycle(&dirs, 100, &payload).unwrap();
            black_box(report);
        })
    });
}

criterion_group!(benches, benchmark_payload_generation, benchmark_single_cycle);
criterion_main!(benches);
