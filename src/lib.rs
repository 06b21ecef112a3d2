//! On-heap table index and key-set algebra for a content-addressed
//! chunk store.
//!
//! A table file holds a run of compressed chunks followed by an index
//! block (sorted-by-prefix address tuples, per-chunk lengths, and
//! address suffixes) and a fixed-size footer. [`table_index`] parses
//! that index block once and keeps it resident, so chunk lookups and
//! short-hash resolution never touch the file again.
//!
//! [`keyset`] is a small closed algebra over sets of primary-key tuples
//! that a higher-level query layer uses to turn predicates (`id = 5`,
//! `id BETWEEN 10 AND 20`, ...) into the minimal set of scan ranges
//! ([`range`]) a table needs to visit. [`cache`] memoizes the
//! (fingerprint -> range-builder) work across repeated queries against
//! the same table.
//!
//! ```text
//! ┌────────────┐    ┌───────────────┐    ┌─────────────┐
//! │ footer.rs  │───▶│ table_index.rs│    │  keyset/     │
//! │ (layout,   │    │ (TableIndex:  │    │  (KeySet     │
//! │  sizing)   │    │  lookup,      │    │  algebra,    │
//! └────────────┘    │  short-hash)  │    │  predicate   │
//! ┌────────────┐    └───────────────┘    │  translation)│
//! │ address.rs │           │             └──────┬──────┘
//! │ (Address,  │           │                    │
//! │  base32)   │           ▼                    ▼
//! └────────────┘    ┌────────────────────────────────┐
//! ┌────────────┐    │           range.rs             │
//! │ quota.rs   │    │ (KeySet -> RangeDescriptor list)│
//! │ (memory    │    └────────────────┬───────────────┘
//! │  budget)   │                     ▼
//! └────────────┘              ┌────────────┐
//!                              │  cache.rs  │
//!                              │ (fingerprint
//!                              │  -> factory)│
//!                              └────────────┘
//! ```

pub mod address;
pub mod cache;
pub mod error;
pub mod footer;
pub mod keyset;
pub mod quota;
pub mod range;
pub mod table_index;

pub use address::Address;
pub use error::{Error, Result};
pub use keyset::predicate::{translate, Expr, Predicate};
pub use keyset::{KeySet, KeyTuple};
pub use quota::{FixedQuota, MemoryQuotaProvider};
pub use range::{RangeBuilder, RangeDescriptor};
pub use table_index::TableIndex;
