// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! `union` and `intersect` over [`KeySet`], plus the normalization that
//! keeps `Composite` from growing without bound (flattening nested
//! composites, dropping `Empty` members, collapsing to `Universe` as
//! soon as one appears, merging `Finite` sets and overlapping intervals
//! where possible).

use super::{compare_tuples, Interval, KeySet, KeyTuple};
use std::cmp::Ordering;

impl KeySet {
    pub fn union(&self, other: &KeySet) -> KeySet {
        match (self, other) {
            (KeySet::Empty, x) | (x, KeySet::Empty) => x.clone(),
            (KeySet::Universe, _) | (_, KeySet::Universe) => KeySet::Universe,
            (KeySet::Finite(a), KeySet::Finite(b)) => {
                let mut merged = a.clone();
                for k in b {
                    if !merged.contains(k) {
                        merged.push(k.clone());
                    }
                }
                merged.sort();
                KeySet::finite_set(merged)
            }
            (KeySet::Interval(a), KeySet::Interval(b)) => match merge_intervals(a, b) {
                Some(iv) => KeySet::interval(iv.start, iv.end),
                None => normalize_composite(vec![self.clone(), other.clone()]),
            },
            (KeySet::Finite(a), KeySet::Interval(iv)) | (KeySet::Interval(iv), KeySet::Finite(a)) => {
                // Members already inside the interval are absorbed; only the
                // ones outside it keep the composite disjoint (invariant 11).
                let outside: Vec<KeyTuple> = a.iter().filter(|k| !iv.contains(k)).cloned().collect();
                normalize_composite(vec![KeySet::finite_set(outside), KeySet::Interval(iv.clone())])
            }
            _ => normalize_composite(vec![self.clone(), other.clone()]),
        }
    }

    pub fn intersect(&self, other: &KeySet) -> KeySet {
        match (self, other) {
            (KeySet::Empty, _) | (_, KeySet::Empty) => KeySet::Empty,
            (KeySet::Universe, x) | (x, KeySet::Universe) => x.clone(),
            (KeySet::Finite(a), KeySet::Finite(b)) => {
                let kept: Vec<KeyTuple> = a.iter().filter(|k| b.contains(k)).cloned().collect();
                KeySet::finite_set(kept)
            }
            (KeySet::Finite(a), KeySet::Interval(iv)) | (KeySet::Interval(iv), KeySet::Finite(a)) => {
                let kept: Vec<KeyTuple> = a.iter().filter(|k| iv.contains(k)).cloned().collect();
                KeySet::finite_set(kept)
            }
            (KeySet::Interval(a), KeySet::Interval(b)) => match intersect_intervals(a, b) {
                Some(iv) => KeySet::interval(iv.start, iv.end),
                None => KeySet::Empty,
            },
            (KeySet::Composite(parts), other) | (other, KeySet::Composite(parts)) => {
                let pieces: Vec<KeySet> = parts.iter().map(|p| p.intersect(other)).collect();
                normalize_composite(pieces)
            }
        }
    }
}

fn start_max(a: &Option<KeyTuple>, b: &Option<KeyTuple>) -> Option<KeyTuple> {
    match (a, b) {
        (None, x) | (x, None) => x.clone(),
        (Some(x), Some(y)) => Some(if compare_tuples(x, y) == Ordering::Less {
            y.clone()
        } else {
            x.clone()
        }),
    }
}

fn end_min(a: &Option<KeyTuple>, b: &Option<KeyTuple>) -> Option<KeyTuple> {
    match (a, b) {
        (None, x) | (x, None) => x.clone(),
        (Some(x), Some(y)) => Some(if compare_tuples(x, y) == Ordering::Less {
            x.clone()
        } else {
            y.clone()
        }),
    }
}

fn intersect_intervals(a: &Interval, b: &Interval) -> Option<Interval> {
    let start = start_max(&a.start, &b.start);
    let end = end_min(&a.end, &b.end);
    let iv = Interval { start, end };
    if iv.is_empty() {
        None
    } else {
        Some(iv)
    }
}

/// Merge two intervals into one iff they overlap or touch (no gap
/// between them). Disjoint intervals are left for the caller to keep as
/// a `Composite`.
fn merge_intervals(a: &Interval, b: &Interval) -> Option<Interval> {
    let (first, second) = if interval_start_le(a, b) { (a, b) } else { (b, a) };
    let first_end = &first.end;
    let second_start = &second.start;
    let touches = match (first_end, second_start) {
        (None, _) => true,
        (Some(_), None) => true,
        (Some(e), Some(s)) => compare_tuples(s, e) != Ordering::Greater,
    };
    if !touches {
        return None;
    }
    Some(Interval {
        start: start_min(&a.start, &b.start),
        end: end_max(&a.end, &b.end),
    })
}

fn interval_start_le(a: &Interval, b: &Interval) -> bool {
    match (&a.start, &b.start) {
        (None, _) => true,
        (_, None) => false,
        (Some(x), Some(y)) => compare_tuples(x, y) != Ordering::Greater,
    }
}

fn start_min(a: &Option<KeyTuple>, b: &Option<KeyTuple>) -> Option<KeyTuple> {
    match (a, b) {
        (None, _) | (_, None) => None,
        (Some(x), Some(y)) => Some(if compare_tuples(x, y) == Ordering::Less {
            x.clone()
        } else {
            y.clone()
        }),
    }
}

fn end_max(a: &Option<KeyTuple>, b: &Option<KeyTuple>) -> Option<KeyTuple> {
    match (a, b) {
        (None, _) | (_, None) => None,
        (Some(x), Some(y)) => Some(if compare_tuples(x, y) == Ordering::Less {
            y.clone()
        } else {
            x.clone()
        }),
    }
}

/// Flatten nested composites, drop `Empty` members, short-circuit to
/// `Universe`, and merge members pairwise where `union` can simplify
/// them (finite/finite, interval/interval), leaving anything left over
/// as a `Composite`.
fn normalize_composite(parts: Vec<KeySet>) -> KeySet {
    let mut flat = Vec::new();
    for p in parts {
        match p {
            KeySet::Empty => {}
            KeySet::Composite(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }
    if flat.iter().any(KeySet::is_universe) {
        return KeySet::Universe;
    }

    let merged = merge_to_fixed_point(flat);
    let merged = enforce_disjointness(merged);

    match merged.len() {
        0 => KeySet::Empty,
        1 => merged.into_iter().next().unwrap(),
        _ => KeySet::Composite(merged),
    }
}

/// Merge members pairwise until no pair merges any further. A single
/// forward pass isn't enough: folding `item` into `existing` can produce
/// a wider member that now also merges with one already passed over
/// (e.g. two disjoint intervals bridged by a third that overlaps both),
/// so each successful merge has to restart the scan over the updated
/// list rather than continuing forward from where it left off.
fn merge_to_fixed_point(mut items: Vec<KeySet>) -> Vec<KeySet> {
    loop {
        let mut merged_any = false;
        let mut next: Vec<KeySet> = Vec::with_capacity(items.len());
        'outer: for item in items {
            for existing in next.iter_mut() {
                let combined = existing.union(&item);
                if !matches!(combined, KeySet::Composite(_)) {
                    *existing = combined;
                    merged_any = true;
                    continue 'outer;
                }
            }
            next.push(item);
        }
        items = next;
        if !merged_any {
            return items;
        }
    }
}

/// Strip any `Finite` member's values that fall inside an `Interval`
/// member, so a returned `Composite` always satisfies invariant 11 (no
/// finite-part value lies in any of its intervals).
fn enforce_disjointness(parts: Vec<KeySet>) -> Vec<KeySet> {
    let intervals: Vec<&Interval> = parts
        .iter()
        .filter_map(|p| match p {
            KeySet::Interval(iv) => Some(iv),
            _ => None,
        })
        .collect();
    if intervals.is_empty() {
        return parts;
    }
    parts
        .into_iter()
        .filter_map(|p| match p {
            KeySet::Finite(vals) => {
                let kept: Vec<KeyTuple> = vals
                    .into_iter()
                    .filter(|v| !intervals.iter().any(|iv| iv.contains(v)))
                    .collect();
                if kept.is_empty() {
                    None
                } else {
                    Some(KeySet::Finite(kept))
                }
            }
            other => Some(other),
        })
        .collect()
}
