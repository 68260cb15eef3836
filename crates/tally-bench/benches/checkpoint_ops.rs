//! Criterion micro-benchmarks for checkpoint streams and hashing.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use tally_bench::{reference_session, stress_config};
use tally_checkpoint::stream::checksum_of;
use tally_engine::ScoringSession;
use tally_test_utils::HistoryStream;

/// A 10K-region session after 2000 histories.
fn scored_session() -> ScoringSession {
    let mut session = reference_session(&stress_config()).unwrap();
    for (_, events) in HistoryStream::new(11)
        .with_regions(10_000)
        .with_media(8)
        .take(2000)
    {
        session.next_history();
        for e in events {
            session.dispatch(e.kind, &e.ctx);
        }
    }
    session
}

/// Benchmark: store a 10K-region session.
fn bench_store_10k(c: &mut Criterion) {
    let session = scored_session();

    c.bench_function("store_session_10k_regions", |b| {
        b.iter(|| {
            let mut buf = Vec::with_capacity(256 * 1024);
            session.store(&mut buf).unwrap();
            black_box(&buf);
        });
    });
}

/// Benchmark: restore the same session.
fn bench_restore_10k(c: &mut Criterion) {
    let session = scored_session();
    let mut encoded = Vec::new();
    session.store(&mut encoded).unwrap();
    let mut target = reference_session(&stress_config()).unwrap();

    c.bench_function("restore_session_10k_regions", |b| {
        b.iter(|| {
            target.restore(&mut encoded.as_slice()).unwrap();
            black_box(target.current_case());
        });
    });
}

/// Benchmark: merge four job checkpoints.
fn bench_merge_4_jobs(c: &mut Criterion) {
    let session = scored_session();
    let mut encoded = Vec::new();
    session.store(&mut encoded).unwrap();
    let mut merged = reference_session(&stress_config()).unwrap();

    c.bench_function("combine_4_jobs_10k_regions", |b| {
        b.iter(|| {
            let total = merged
                .combine_results((0..4).map(|_| encoded.as_slice()))
                .unwrap();
            black_box(total);
        });
    });
}

/// Benchmark: FNV-1a over 1 MiB.
fn bench_checksum_1mib(c: &mut Criterion) {
    let bytes: Vec<u8> = (0..1 << 20).map(|i| (i * 31) as u8).collect();

    c.bench_function("checksum_1mib", |b| {
        b.iter(|| black_box(checksum_of(&bytes)));
    });
}

criterion_group!(
    benches,
    bench_store_10k,
    bench_restore_10k,
    bench_merge_4_jobs,
    bench_checksum_1mib
);
criterion_main!(benches);
