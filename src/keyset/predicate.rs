// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Translate a predicate tree into a [`KeySet`] over one primary-key
//! column. Multi-column keys are composed from these per-column sets by
//! `range.rs`, which mirrors how the original query planner builds a
//! partial key one column at a time and extends it.
//!
//! Translation never fails outward: if a predicate can't be mapped to a
//! key set (references a non-key column, compares two columns against
//! each other, or otherwise falls outside what this algebra can express)
//! the whole subtree is replaced with [`KeySet::Universe`]. A full table
//! scan is always a correct, if pessimistic, answer, so swallowing the
//! error here is the one place in this crate that's allowed to.

use super::KeySet;

/// One side of a comparison: either the named key column, or a literal
/// scalar value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Column(String),
    Literal(u64),
}

/// A predicate tree over columns and literals.
#[derive(Debug, Clone)]
pub enum Predicate {
    Equals(Expr, Expr),
    LessThan(Expr, Expr),
    LessThanOrEqual(Expr, Expr),
    GreaterThan(Expr, Expr),
    GreaterThanOrEqual(Expr, Expr),
    InTuple(String, Vec<u64>),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

/// Names the column this predicate tree is being evaluated against. Only
/// comparisons naming this column translate to anything narrower than
/// `Universe`.
pub fn translate(pred: &Predicate, key_column: &str) -> KeySet {
    try_translate(pred, key_column).unwrap_or(KeySet::Universe)
}

fn try_translate(pred: &Predicate, key_column: &str) -> Option<KeySet> {
    match pred {
        Predicate::Equals(a, b) => {
            let v = literal_for_column(a, b, key_column)?;
            Some(KeySet::finite_set(vec![vec![v]]))
        }
        Predicate::LessThan(a, b) => {
            let (v, column_is_lhs) = literal_and_side(a, b, key_column)?;
            Some(if column_is_lhs {
                KeySet::interval(None, Some(vec![v]))
            } else {
                // `v < id` <=> `id > v`: strict lower bound, exclusive-to-inclusive.
                exclusive_lower_bound(v)
            })
        }
        Predicate::LessThanOrEqual(a, b) => {
            let (v, column_is_lhs) = literal_and_side(a, b, key_column)?;
            Some(if column_is_lhs {
                // `id <= v`: exclusive upper bound one past v, or unbounded if
                // v is already the domain maximum.
                exclusive_upper_bound(v)
            } else {
                KeySet::interval(Some(vec![v]), None)
            })
        }
        Predicate::GreaterThan(a, b) => {
            let (v, column_is_lhs) = literal_and_side(a, b, key_column)?;
            Some(if column_is_lhs {
                exclusive_lower_bound(v)
            } else {
                KeySet::interval(None, Some(vec![v]))
            })
        }
        Predicate::GreaterThanOrEqual(a, b) => {
            let (v, column_is_lhs) = literal_and_side(a, b, key_column)?;
            Some(if column_is_lhs {
                KeySet::interval(Some(vec![v]), None)
            } else {
                exclusive_upper_bound(v)
            })
        }
        Predicate::InTuple(column, values) => {
            if column != key_column {
                return None;
            }
            Some(KeySet::finite_set(values.iter().map(|v| vec![*v]).collect()))
        }
        Predicate::And(l, r) => {
            let ls = try_translate(l, key_column).unwrap_or(KeySet::Universe);
            let rs = try_translate(r, key_column).unwrap_or(KeySet::Universe);
            Some(ls.intersect(&rs))
        }
        Predicate::Or(l, r) => {
            let ls = try_translate(l, key_column)?;
            let rs = try_translate(r, key_column)?;
            Some(ls.union(&rs))
        }
    }
}

/// A strict lower bound `id > v`, converted to the inclusive start `v +
/// 1` the interval representation uses. `v == u64::MAX` has no
/// successor, so no key can satisfy the predicate: the empty set, not a
/// wrapped-around `0` that would wrongly match everything.
fn exclusive_lower_bound(v: u64) -> KeySet {
    match v.checked_add(1) {
        Some(start) => KeySet::interval(Some(vec![start]), None),
        None => KeySet::empty(),
    }
}

/// An inclusive upper bound `id <= v`, converted to the exclusive end `v
/// + 1` the interval representation uses. `v == u64::MAX` has no
/// successor either, but here that means every value already satisfies
/// the predicate, so the bound is dropped (unbounded above) rather than
/// wrapping to an empty range.
fn exclusive_upper_bound(v: u64) -> KeySet {
    KeySet::interval(None, v.checked_add(1).map(|end| vec![end]))
}

/// Extract the literal value from a comparison where exactly one side
/// names `key_column` and the other is a literal. Returns `None` for
/// variable-vs-variable comparisons, comparisons against a different
/// column, or literal-vs-literal (nothing to narrow).
fn literal_for_column(a: &Expr, b: &Expr, key_column: &str) -> Option<u64> {
    match (a, b) {
        (Expr::Column(c), Expr::Literal(v)) if c == key_column => Some(*v),
        (Expr::Literal(v), Expr::Column(c)) if c == key_column => Some(*v),
        _ => None,
    }
}

/// Like `literal_for_column`, but also reports whether the key column
/// was the left-hand side, so directional operators (`<`, `>=`, ...)
/// can be flipped correctly when the column is on the right.
fn literal_and_side(a: &Expr, b: &Expr, key_column: &str) -> Option<(u64, bool)> {
    match (a, b) {
        (Expr::Column(c), Expr::Literal(v)) if c == key_column => Some((*v, true)),
        (Expr::Literal(v), Expr::Column(c)) if c == key_column => Some((*v, false)),
        _ => None,
    }
}
