// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Turn a [`KeySet`] into the list of contiguous ranges a table scan
//! needs to visit, plus a per-row check function for rows that fall
//! inside a range's bounds but might still not satisfy the original
//! predicate exactly (e.g. a multi-column primary key where only the
//! leading column was range-restricted).
//!
//! Mirrors the original query planner's two-shaped key handling: a
//! single-column primary key needs only bound comparisons, while a
//! multi-column key needs a sentinel tuple appended to the bound so an
//! exclusive start or a reverse scan from the end lands on the right
//! row.

use std::sync::Arc;

use crate::keyset::{KeySet, KeyTuple};

/// A per-row predicate evaluated against a candidate key after range
/// bounds have already narrowed the scan.
pub type CheckFn = Arc<dyn Fn(&[u64]) -> bool + Send + Sync>;

/// One contiguous span of the key space to scan, plus the row-level
/// check to apply to candidates the range produces.
#[derive(Clone)]
pub struct RangeDescriptor {
    /// Inclusive lower bound, or `None` to start from the beginning.
    pub start: Option<KeyTuple>,
    /// Exclusive upper bound, or `None` to run to the end.
    pub end: Option<KeyTuple>,
    pub check: CheckFn,
}

impl std::fmt::Debug for RangeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeDescriptor")
            .field("start", &self.start)
            .field("end", &self.end)
            .finish_non_exhaustive()
    }
}

/// A factory that, given an open table, produces a reader scoped to one
/// range. Boxed so the cache in `cache.rs` can store factories for
/// different fingerprints behind one type.
pub type ReaderFactory = Arc<dyn Fn() -> Vec<RangeDescriptor> + Send + Sync>;

pub fn always_true() -> CheckFn {
    Arc::new(|_| true)
}

pub fn equals(key: KeyTuple) -> CheckFn {
    Arc::new(move |candidate| candidate == key.as_slice())
}

pub fn less_than(bound: KeyTuple) -> CheckFn {
    Arc::new(move |candidate| candidate < bound.as_slice())
}

pub fn less_than_or_equal(bound: KeyTuple) -> CheckFn {
    Arc::new(move |candidate| candidate <= bound.as_slice())
}

/// Builds the range descriptors a scan over a primary key needs to
/// cover a `KeySet`, for either a single-column or a composite key.
pub struct RangeBuilder;

impl RangeBuilder {
    /// A single-column primary key: every bound from the key set maps
    /// directly onto the scan's bounds, so the check function is a
    /// formality (the range already can't produce a non-matching row).
    pub fn for_single_pk(ks: &KeySet) -> Vec<RangeDescriptor> {
        Self::ranges(ks, always_true())
    }

    /// A multi-column primary key where `ks` only restricts the leading
    /// column. Row candidates inside a finite range can still differ in
    /// trailing columns, so equality ranges carry an `equals` check and
    /// interval ranges fall back to bound comparisons on the leading
    /// column alone (any trailing-column filtering is the caller's job,
    /// same as the original planner's per-row predicate).
    pub fn for_multi_pk(ks: &KeySet, check_for_finite: impl Fn(&KeyTuple) -> CheckFn) -> Vec<RangeDescriptor> {
        Self::multi_pk_ranges(ks, &check_for_finite)
    }

    /// Recurses through a `Composite` so a nested `Finite` member still
    /// gets `check_for_finite` instead of falling back to the
    /// single-check `ranges()` path, which would silently replace it
    /// with `always_true`.
    fn multi_pk_ranges(ks: &KeySet, check_for_finite: &dyn Fn(&KeyTuple) -> CheckFn) -> Vec<RangeDescriptor> {
        match ks {
            KeySet::Finite(keys) => keys
                .iter()
                .map(|k| RangeDescriptor {
                    start: Some(k.clone()),
                    end: Some(sentinel_successor(k)),
                    check: check_for_finite(k),
                })
                .collect(),
            KeySet::Composite(parts) => parts
                .iter()
                .flat_map(|p| Self::multi_pk_ranges(p, check_for_finite))
                .collect(),
            other => Self::ranges(other, always_true()),
        }
    }

    fn ranges(ks: &KeySet, check: CheckFn) -> Vec<RangeDescriptor> {
        match ks {
            KeySet::Empty => Vec::new(),
            KeySet::Universe => vec![RangeDescriptor {
                start: None,
                end: None,
                check,
            }],
            KeySet::Finite(keys) => keys
                .iter()
                .map(|k| RangeDescriptor {
                    start: Some(k.clone()),
                    end: Some(sentinel_successor(k)),
                    check: check.clone(),
                })
                .collect(),
            KeySet::Interval(iv) => vec![RangeDescriptor {
                start: iv.start.clone(),
                end: iv.end.clone(),
                check,
            }],
            KeySet::Composite(parts) => parts.iter().flat_map(|p| Self::ranges(p, check.clone())).collect(),
        }
    }
}

/// The exclusive upper bound one past an exact key tuple: the tuple
/// itself with a sentinel column appended, so the range `[key,
/// successor)` contains exactly that one key and nothing with it as a
/// strict prefix. Matches the original planner's trick for building an
/// exclusive end bound out of an inclusive key without needing a
/// "plus one" on arbitrary-width tuples.
fn sentinel_successor(key: &[u64]) -> KeyTuple {
    let mut successor = key.to_vec();
    successor.push(u64::MAX);
    successor
}
