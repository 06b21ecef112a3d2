//! Property tests for the on-heap table index.
//!
//! These mirror the testable properties in the index design: sorted
//! prefixes, ordinal permutation, lookup round-trips, and refcount
//! bookkeeping across arbitrary chunk layouts.

use nbsidx::{Address, FixedQuota, TableIndex};
use proptest::prelude::*;

const MAGIC: &[u8; 8] = b"CATIDX01";

/// Build raw table-index bytes (tuples + lengths + suffixes + footer)
/// for chunks given as `(prefix, suffix_byte, length)`, already sorted
/// by prefix and written in that same order (ordinal == sorted
/// position).
fn build_table_bytes(chunks: &[(u64, u8, u32)]) -> Vec<u8> {
    let n = chunks.len() as u32;
    let mut tuples = Vec::new();
    let mut lengths = Vec::new();
    let mut suffixes = Vec::new();
    let mut total = 0u64;
    for (ord, &(prefix, suffix_byte, length)) in chunks.iter().enumerate() {
        tuples.extend_from_slice(&prefix.to_be_bytes());
        tuples.extend_from_slice(&(ord as u32).to_be_bytes());
        lengths.extend_from_slice(&length.to_be_bytes());
        suffixes.extend_from_slice(&[suffix_byte; 12]);
        total += length as u64;
    }
    let mut buf = Vec::new();
    buf.extend_from_slice(&tuples);
    buf.extend_from_slice(&lengths);
    buf.extend_from_slice(&suffixes);
    buf.extend_from_slice(&n.to_be_bytes());
    buf.extend_from_slice(&total.to_be_bytes());
    buf.extend_from_slice(MAGIC);
    buf
}

/// A sorted-by-prefix, distinct-suffix chunk layout: `(prefix,
/// suffix_byte, length)` triples with prefixes non-decreasing and
/// `suffix_byte` unique per entry (so two same-prefix chunks are still
/// distinguishable by suffix).
fn chunk_layout() -> impl Strategy<Value = Vec<(u64, u8, u32)>> {
    (1usize..40).prop_flat_map(|n| {
        let mut prefixes = proptest::collection::vec(0u64..1_000, n);
        prefixes = prefixes.prop_map(|mut p| {
            p.sort_unstable();
            p
        });
        let lengths = proptest::collection::vec(1u32..500, n);
        (prefixes, lengths).prop_map(move |(prefixes, lengths)| {
            prefixes
                .into_iter()
                .zip(lengths)
                .enumerate()
                .map(|(i, (prefix, length))| (prefix, i as u8, length))
                .collect()
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property 1: prefixes() is non-decreasing.
    #[test]
    fn prop_prefixes_sorted(chunks in chunk_layout()) {
        let bytes = build_table_bytes(&chunks);
        let idx = TableIndex::parse_in_place(bytes, FixedQuota::unbounded()).unwrap();
        let prefixes = idx.prefixes();
        prop_assert!(prefixes.windows(2).all(|w| w[0] <= w[1]));
        idx.close().unwrap();
    }

    /// Property 2: ordinals() is a permutation of [0, N).
    #[test]
    fn prop_ordinals_are_permutation(chunks in chunk_layout()) {
        let n = chunks.len();
        let bytes = build_table_bytes(&chunks);
        let idx = TableIndex::parse_in_place(bytes, FixedQuota::unbounded()).unwrap();
        let mut ords = idx.ordinals();
        ords.sort_unstable();
        prop_assert_eq!(ords, (0..n as u32).collect::<Vec<_>>());
        idx.close().unwrap();
    }

    /// Property 3: every written chunk's address looks itself back up to
    /// the same (offset, length) it was written with.
    #[test]
    fn prop_lookup_round_trips(chunks in chunk_layout()) {
        let bytes = build_table_bytes(&chunks);
        let idx = TableIndex::parse_in_place(bytes, FixedQuota::unbounded()).unwrap();
        for i in 0..idx.chunk_count() {
            let mut out = [0u8; 20];
            let (offset, length) = idx.index_entry(i, Some(&mut out));
            let addr = Address(out);
            prop_assert_eq!(idx.lookup(&addr), Some((offset, length)));
        }
        idx.close().unwrap();
    }

    /// Property 4: table_file_size() accounts for exactly the bytes written.
    #[test]
    fn prop_table_file_size_matches_written_bytes(chunks in chunk_layout()) {
        let bytes = build_table_bytes(&chunks);
        let written_len = bytes.len() as u64;
        let idx = TableIndex::parse_in_place(bytes, FixedQuota::unbounded()).unwrap();
        prop_assert_eq!(idx.table_file_size(), written_len);
        idx.close().unwrap();
    }

    /// Property 6: clone/close pairs never release the quota early, and
    /// the final close releases it exactly once.
    #[test]
    fn prop_refcount_survives_clone_close_pairs(chunks in chunk_layout(), extra_clones in 0usize..6) {
        let bytes = build_table_bytes(&chunks);
        let quota = FixedQuota::unbounded();
        let idx = TableIndex::parse_in_place(bytes, quota.clone()).unwrap();
        let charged = quota.used();

        let mut handles = vec![idx];
        for _ in 0..extra_clones {
            let h = handles[0].clone();
            handles.push(h);
        }
        prop_assert_eq!(quota.used(), charged);

        for h in &handles[..handles.len() - 1] {
            h.close().unwrap();
            prop_assert_eq!(quota.used(), charged, "quota stays charged while a handle remains open");
        }
        handles.last().unwrap().close().unwrap();
        prop_assert_eq!(quota.used(), 0);
    }

    /// chunk_count() == 0 implies table_file_size() == 20 (footer only).
    #[test]
    fn prop_empty_table_is_footer_only(_unused in 0u8..1) {
        let bytes = build_table_bytes(&[]);
        let idx = TableIndex::parse_in_place(bytes, FixedQuota::unbounded()).unwrap();
        prop_assert_eq!(idx.chunk_count(), 0);
        prop_assert_eq!(idx.table_file_size(), 20);
        let miss = Address::from_parts(42, &[0u8; 12]);
        prop_assert_eq!(idx.lookup(&miss), None);
        idx.close().unwrap();
    }
}

#[test]
#[should_panic(expected = "already-closed")]
fn double_close_traps() {
    let bytes = build_table_bytes(&[(1, 1, 1)]);
    let idx = TableIndex::parse_in_place(bytes, FixedQuota::unbounded()).unwrap();
    idx.close().unwrap();
    idx.close().unwrap();
}

#[test]
#[should_panic(expected = "closed")]
fn clone_after_close_traps() {
    let bytes = build_table_bytes(&[(1, 1, 1)]);
    let idx = TableIndex::parse_in_place(bytes, FixedQuota::unbounded()).unwrap();
    idx.close().unwrap();
    let _ = idx.clone();
}
