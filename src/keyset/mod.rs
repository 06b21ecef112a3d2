// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! A closed algebra over sets of primary-key tuples, used to translate
//! query predicates into the ranges a table scan actually has to visit.
//!
//! `KeySet` has exactly four shapes: the empty set, the universal set, a
//! finite enumeration of concrete key tuples, and a half-open interval
//! over the key ordering. `Composite` holds the union of several of
//! these when they can't be merged into one simpler shape. `union` and
//! `intersect` are defined over every pair of shapes and satisfy the
//! usual set-algebra laws (associativity, commutativity, idempotence,
//! identity, annihilation) — see the property tests in `ops`.

pub mod ops;
pub mod predicate;

use std::cmp::Ordering;

/// A single key-tuple value: one `u64` coordinate per primary-key column.
/// Comparisons and ordering use column-major (lexicographic) order.
pub type KeyTuple = Vec<u64>;

/// A half-open interval `[start, end)` over key tuples. `start: None`
/// means unbounded below; `end: None` means unbounded above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub start: Option<KeyTuple>,
    pub end: Option<KeyTuple>,
}

impl Interval {
    pub fn contains(&self, key: &[u64]) -> bool {
        if let Some(start) = &self.start {
            if compare_tuples(key, start) == Ordering::Less {
                return false;
            }
        }
        if let Some(end) = &self.end {
            if compare_tuples(key, end) != Ordering::Less {
                return false;
            }
        }
        true
    }

    fn is_empty(&self) -> bool {
        match (&self.start, &self.end) {
            (Some(s), Some(e)) => compare_tuples(s, e) != Ordering::Less,
            _ => false,
        }
    }
}

pub(crate) fn compare_tuples(a: &[u64], b: &[u64]) -> Ordering {
    a.cmp(b)
}

/// A set of primary-key tuples, closed under union and intersection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySet {
    /// No keys match.
    Empty,
    /// Every key matches; translate to a full table scan.
    Universe,
    /// An explicit, small enumeration of matching keys.
    Finite(Vec<KeyTuple>),
    /// A contiguous range of keys.
    Interval(Interval),
    /// A union of shapes that couldn't be merged into one of the above.
    Composite(Vec<KeySet>),
}

impl KeySet {
    pub fn empty() -> Self {
        KeySet::Empty
    }

    pub fn universe() -> Self {
        KeySet::Universe
    }

    /// Deduplicates `keys` (by value, standing in for the content hash a
    /// real chunk-store key would carry) while preserving first-seen
    /// order.
    pub fn finite_set(keys: Vec<KeyTuple>) -> Self {
        let mut seen = std::collections::HashSet::with_capacity(keys.len());
        let deduped: Vec<KeyTuple> = keys.into_iter().filter(|k| seen.insert(k.clone())).collect();
        if deduped.is_empty() {
            KeySet::Empty
        } else {
            KeySet::Finite(deduped)
        }
    }

    /// Unbounded on both sides collapses to [`KeySet::Universe`]; a
    /// backwards or zero-width bound collapses to [`KeySet::Empty`].
    pub fn interval(start: Option<KeyTuple>, end: Option<KeyTuple>) -> Self {
        if start.is_none() && end.is_none() {
            return KeySet::Universe;
        }
        let iv = Interval { start, end };
        if iv.is_empty() {
            KeySet::Empty
        } else {
            KeySet::Interval(iv)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, KeySet::Empty)
    }

    pub fn is_universe(&self) -> bool {
        matches!(self, KeySet::Universe)
    }
}
