//! Benchmarks for table index construction and chunk lookup.
//!
//! Simulates realistic table sizes:
//! - Small table:  ~1,000 chunks   (a freshly-flushed memtable)
//! - Medium table: ~50,000 chunks  (a compacted mid-tier table)
//! - Large table:  ~500,000 chunks (a compacted bottom-tier table)
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nbsidx::{Address, FixedQuota, TableIndex};

struct TableSize {
    name: &'static str,
    chunk_count: u32,
}

const TABLE_SIZES: &[TableSize] = &[
    TableSize {
        name: "small",
        chunk_count: 1_000,
    },
    TableSize {
        name: "medium",
        chunk_count: 50_000,
    },
    TableSize {
        name: "large",
        chunk_count: 500_000,
    },
];

/// Build table-index bytes (tuples + lengths + suffixes + footer) for
/// `n` chunks with distinct, evenly-spaced prefixes written in sorted
/// order (ordinal == sorted position), each 64 bytes long.
fn build_table_bytes(n: u32) -> Vec<u8> {
    let stride = u64::MAX / (n as u64 + 1);
    let mut tuples = Vec::with_capacity(n as usize * 12);
    let mut lengths = Vec::with_capacity(n as usize * 4);
    let mut suffixes = Vec::with_capacity(n as usize * 12);
    let mut total = 0u64;
    for ord in 0..n {
        let prefix = stride * (ord as u64 + 1);
        tuples.extend_from_slice(&prefix.to_be_bytes());
        tuples.extend_from_slice(&ord.to_be_bytes());
        lengths.extend_from_slice(&64u32.to_be_bytes());
        suffixes.extend_from_slice(&(ord as u128).to_be_bytes()[4..]);
        total += 64;
    }
    let mut buf = Vec::new();
    buf.extend_from_slice(&tuples);
    buf.extend_from_slice(&lengths);
    buf.extend_from_slice(&suffixes);
    buf.extend_from_slice(&n.to_be_bytes());
    buf.extend_from_slice(&total.to_be_bytes());
    buf.extend_from_slice(b"CATIDX01");
    buf
}

fn address_for_ordinal(n: u32, ord: u32) -> Address {
    let stride = u64::MAX / (n as u64 + 1);
    let prefix = stride * (ord as u64 + 1);
    let suffix_bytes = (ord as u128).to_be_bytes();
    let mut suffix = [0u8; 12];
    suffix.copy_from_slice(&suffix_bytes[4..]);
    Address::from_parts(prefix, &suffix)
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_index_construction");
    for size in TABLE_SIZES {
        let bytes = build_table_bytes(size.chunk_count);
        group.throughput(Throughput::Elements(size.chunk_count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size.name), &bytes, |b, bytes| {
            b.iter_batched(
                || bytes.clone(),
                |buf| {
                    let idx = TableIndex::parse_in_place(buf, FixedQuota::unbounded()).unwrap();
                    black_box(idx.chunk_count());
                    idx.close().unwrap();
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_index_lookup");
    for size in TABLE_SIZES {
        let bytes = build_table_bytes(size.chunk_count);
        let idx = TableIndex::parse_in_place(bytes, FixedQuota::unbounded()).unwrap();
        let probe = address_for_ordinal(size.chunk_count, size.chunk_count / 2);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(size.name), &probe, |b, probe| {
            b.iter(|| black_box(idx.lookup(probe)));
        });
        idx.close().unwrap();
    }
    group.finish();
}

fn bench_short_hash_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_index_short_hash");
    for size in TABLE_SIZES {
        let bytes = build_table_bytes(size.chunk_count);
        let idx = TableIndex::parse_in_place(bytes, FixedQuota::unbounded()).unwrap();
        let probe = address_for_ordinal(size.chunk_count, size.chunk_count / 2);
        let short = &probe.to_canonical_string()[..13];
        group.bench_with_input(BenchmarkId::from_parameter(size.name), short, |b, short| {
            b.iter(|| black_box(idx.resolve_short_hash(short).unwrap()));
        });
        idx.close().unwrap();
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_construction,
    bench_lookup,
    bench_short_hash_resolve
);
criterion_main!(benches);
