//! Criterion micro-benchmarks for save/load and layout hashing.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use thinkers_bench::{bench_registry, steady_table};
use thinkers_engine::{SchedulerConfig, ThinkerTable};
use thinkers_save::{layout_hash, BinaryReader, BinaryWriter};

/// Benchmark: serialize 10K thinkers to an in-memory buffer.
fn bench_serialize_10k(c: &mut Criterion) {
    let table = steady_table(10_000, 42);
    c.bench_function("serialize_10k", |b| {
        b.iter(|| {
            let mut w = BinaryWriter::new(Vec::with_capacity(1 << 18));
            table.serialize(&mut w, false).unwrap();
            black_box(w.bytes_written())
        });
    });
}

/// Benchmark: deserialize 10K thinkers into a reused table.
fn bench_deserialize_10k(c: &mut Criterion) {
    let source = steady_table(10_000, 42);
    let mut w = BinaryWriter::new(Vec::new());
    source.serialize(&mut w, false).unwrap();
    let bytes = w.into_inner();
    let mut target = ThinkerTable::new(bench_registry(), SchedulerConfig::default()).unwrap();

    c.bench_function("deserialize_10k", |b| {
        b.iter(|| {
            let mut r = BinaryReader::new(bytes.as_slice());
            black_box(target.deserialize(&mut r, false).unwrap())
        });
    });
}

/// Benchmark: FNV-1a layout hash over 10K thinkers.
fn bench_layout_hash_10k(c: &mut Criterion) {
    let table = steady_table(10_000, 42);
    c.bench_function("layout_hash_10k", |b| {
        b.iter(|| black_box(layout_hash(&table)));
    });
}

criterion_group!(
    benches,
    bench_serialize_10k,
    bench_deserialize_10k,
    bench_layout_hash_10k
);
criterion_main!(benches);
