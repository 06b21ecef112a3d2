// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Memory quota accounting for loaded table indexes.
//!
//! The index itself never decides how much memory is "too much"; it just
//! reports how many bytes it wants to hold and asks a provider for
//! permission. This keeps the accounting policy (global budget, per-tenant
//! budget, no budget at all) out of the hot parsing path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// A quota collaborator that table indexes acquire bytes from on
/// construction and release on final `close`.
pub trait MemoryQuotaProvider: Send + Sync {
    fn acquire(&self, bytes: u64) -> Result<()>;
    fn release(&self, bytes: u64) -> Result<()>;
}

/// A fixed-budget, process-wide quota backed by a single atomic counter.
///
/// `acquire` fails with [`Error::QuotaExceeded`] once the outstanding total
/// would exceed `limit`; it never blocks.
pub struct FixedQuota {
    limit: u64,
    used: AtomicU64,
}

impl FixedQuota {
    pub fn new(limit: u64) -> Arc<Self> {
        Arc::new(Self {
            limit,
            used: AtomicU64::new(0),
        })
    }

    pub fn used(&self) -> u64 {
        self.used.load(Ordering::Acquire)
    }

    pub fn unbounded() -> Arc<Self> {
        Self::new(u64::MAX)
    }
}

impl MemoryQuotaProvider for FixedQuota {
    fn acquire(&self, bytes: u64) -> Result<()> {
        let mut current = self.used.load(Ordering::Acquire);
        loop {
            let next = current.checked_add(bytes).unwrap_or(u64::MAX);
            if next > self.limit {
                let available = self.limit.saturating_sub(current);
                tracing::warn!(
                    requested = bytes,
                    available,
                    limit = self.limit,
                    "memory quota exceeded"
                );
                return Err(Error::QuotaExceeded {
                    requested: bytes,
                    available,
                });
            }
            match self.used.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(observed) => current = observed,
            }
        }
    }

    fn release(&self, bytes: u64) -> Result<()> {
        self.used.fetch_sub(bytes, Ordering::AcqRel);
        Ok(())
    }
}
