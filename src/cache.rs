// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Process-wide cache mapping a table fingerprint to the reader factory
//! built for it, so repeated queries against the same table don't redo
//! range-building work.
//!
//! This is a "recompute and overwrite" cache, not a single-flight one:
//! two threads racing to populate the same fingerprint will both build a
//! factory and one will silently win, discarding the other's work. That
//! matches the original's `ThreadSafeCRFuncCache`, which accepts the
//! same race in exchange for never holding the lock during the
//! (potentially expensive) construction call.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::range::ReaderFactory;

/// A table fingerprint: whatever uniquely identifies one table's
/// current contents to the caller (e.g. a content hash). Opaque to this
/// cache — it's just the map key.
pub type Fingerprint = u64;

pub struct ReaderFactoryCache {
    entries: Mutex<HashMap<Fingerprint, ReaderFactory>>,
}

impl Default for ReaderFactoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ReaderFactoryCache {
    pub fn new() -> Self {
        ReaderFactoryCache {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached factory for `fingerprint`, or call `create` to
    /// build one, cache it, and return it. `create` runs outside the
    /// lock, so concurrent misses for the same fingerprint may each run
    /// `create` and the last writer wins; both callers still get a
    /// correct (if possibly short-lived-in-cache) factory either way.
    pub fn get_or_create(
        &self,
        fingerprint: Fingerprint,
        create: impl FnOnce() -> ReaderFactory,
    ) -> ReaderFactory {
        if let Some(existing) = self.entries.lock().get(&fingerprint) {
            return Arc::clone(existing);
        }
        let factory = create();
        self.entries.lock().insert(fingerprint, Arc::clone(&factory));
        factory
    }

    pub fn invalidate(&self, fingerprint: Fingerprint) {
        self.entries.lock().remove(&fingerprint);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
