// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The on-heap table index: a parsed view over a table file's tuples,
//! lengths and suffixes arrays, supporting prefix lookup and short-hash
//! resolution without touching the underlying file again.
//!
//! Layout, once parsed:
//!
//! ```text
//! block:      [ tuples: 12*N ][ suffixes: 12*N ]   (one allocation)
//! offsets_lo: [ cumulative length through ordinal k, k in 0..ceil(N/2) ]
//! offsets_hi: [ cumulative length through ordinal k, k in ceil(N/2)..N ]
//! ```
//!
//! `tuples` stays sorted by prefix; `suffixes` and the offsets arrays are
//! indexed by ordinal (physical write order), not by sorted position.
//! `index_entry` and friends bridge the two via `ordinal_at`.

use std::io::{Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::address::{decode_padded_prefix, Address, ALPHABET_MAX, ALPHABET_MIN};
use crate::error::{Error, Result};
use crate::footer::{self, index_mem_size, index_size, FOOTER_SIZE};
use crate::quota::MemoryQuotaProvider;

const PREFIX_TUPLE_SIZE: usize = 12;
const SUFFIX_SIZE: usize = 12;
const LENGTH_SIZE: usize = 4;

/// A parsed, refcounted table index.
///
/// Cloning and closing are explicit and separate from `Arc`'s own drop
/// semantics: the memory quota is released exactly once, when the logical
/// refcount (not the `Arc` strong count) reaches zero via [`TableIndex::close`].
/// Using an index after its last handle has been closed is a programmer
/// error and panics rather than silently reading stale memory.
pub struct TableIndex(Arc<Shared>);

impl std::fmt::Debug for TableIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableIndex")
            .field("chunk_count", &self.chunk_count())
            .field("total_uncompressed", &self.total_uncompressed_data())
            .finish_non_exhaustive()
    }
}

struct Shared {
    /// tuples (12*N bytes) immediately followed by suffixes (12*N bytes).
    block: Box<[u8]>,
    offsets_lo: Box<[u8]>,
    offsets_hi: Box<[u8]>,
    chunk_count: u32,
    total_uncompressed: u64,
    mem_size: u64,
    quota: Arc<dyn MemoryQuotaProvider>,
    ref_count: AtomicI64,
}

impl TableIndex {
    /// Parse a table index out of a buffer the caller already has fully
    /// in memory (e.g. read via `pread` into one allocation including the
    /// footer). `buf.len()` and `buf.capacity()` must both equal exactly
    /// `index_size(chunk_count) + FOOTER_SIZE` for the chunk count named
    /// in the trailing footer.
    pub fn parse_in_place(buf: Vec<u8>, quota: Arc<dyn MemoryQuotaProvider>) -> Result<Self> {
        if buf.len() < FOOTER_SIZE as usize {
            return Err(Error::WrongBufferSize);
        }
        let footer_bytes: [u8; FOOTER_SIZE as usize] =
            buf[buf.len() - FOOTER_SIZE as usize..].try_into().unwrap();
        let footer = footer::parse_footer_bytes(&footer_bytes)?;
        let expected = (index_size(footer.chunk_count) + FOOTER_SIZE) as usize;
        if buf.len() != expected || buf.capacity() != expected {
            return Err(Error::WrongBufferSize);
        }
        let mut buf = buf;
        buf.truncate(buf.len() - FOOTER_SIZE as usize);
        Self::build(buf, footer.chunk_count, footer.total_uncompressed, quota)
    }

    /// Read the footer and index block from `reader`, copying the index
    /// block into a freshly allocated buffer. Use this when the caller
    /// doesn't already have the bytes resident (e.g. reading a table file
    /// straight off disk).
    pub fn read_by_copy<R: Read + Seek>(
        reader: &mut R,
        quota: Arc<dyn MemoryQuotaProvider>,
    ) -> Result<Self> {
        let footer = footer::read_footer(reader)?;
        let idx_size = index_size(footer.chunk_count);
        reader.seek(SeekFrom::End(-((idx_size + FOOTER_SIZE) as i64)))?;
        let mut buf = vec![0u8; idx_size as usize];
        reader.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::WrongCopySize
            } else {
                Error::Io(e)
            }
        })?;
        Self::build(buf, footer.chunk_count, footer.total_uncompressed, quota)
    }

    fn build(
        mut buf: Vec<u8>,
        chunk_count: u32,
        total_uncompressed: u64,
        quota: Arc<dyn MemoryQuotaProvider>,
    ) -> Result<Self> {
        let n = chunk_count as usize;
        let tuples_len = n * PREFIX_TUPLE_SIZE;
        let lengths_len = n * LENGTH_SIZE;
        if buf.len() != tuples_len + lengths_len + n * SUFFIX_SIZE {
            return Err(Error::WrongBufferSize);
        }
        // Drain the lengths region out from between tuples and suffixes,
        // leaving tuples and suffixes contiguous in the original allocation.
        let lengths: Vec<u8> = buf.drain(tuples_len..tuples_len + lengths_len).collect();
        let (offsets_lo, offsets_hi) = materialize_offsets(lengths, n);

        let mem_size = index_mem_size(chunk_count);
        quota.acquire(mem_size).inspect_err(|err| {
            tracing::warn!(chunk_count, mem_size, %err, "table index quota acquisition failed");
        })?;
        tracing::debug!(chunk_count, mem_size, "table index loaded");

        Ok(TableIndex(Arc::new(Shared {
            block: buf.into_boxed_slice(),
            offsets_lo,
            offsets_hi,
            chunk_count,
            total_uncompressed,
            mem_size,
            quota,
            ref_count: AtomicI64::new(1),
        })))
    }

    pub fn chunk_count(&self) -> u32 {
        self.0.chunk_count
    }

    pub fn total_uncompressed_data(&self) -> u64 {
        self.0.total_uncompressed
    }

    /// The prefix stored at sorted position `i`.
    pub fn prefix_at(&self, i: u32) -> u64 {
        let off = i as usize * PREFIX_TUPLE_SIZE;
        u64::from_be_bytes(self.tuples()[off..off + 8].try_into().unwrap())
    }

    /// The ordinal (physical write order) stored at sorted position `i`.
    pub fn ordinal_at(&self, i: u32) -> u32 {
        let off = i as usize * PREFIX_TUPLE_SIZE + 8;
        u32::from_be_bytes(self.tuples()[off..off + 4].try_into().unwrap())
    }

    /// Whether the full address at sorted position `i` matches `addr`,
    /// beyond the prefix (which the caller is expected to have already
    /// matched via `prefix_at`).
    pub fn entry_suffix_matches(&self, i: u32, addr: &Address) -> bool {
        let ord = self.ordinal_at(i) as usize;
        let off = ord * SUFFIX_SIZE;
        &self.suffixes()[off..off + SUFFIX_SIZE] == addr.suffix()
    }

    /// The `(offset, length)` of the chunk stored at sorted position `i`,
    /// and, if `out` is given, its full reconstructed address.
    pub fn index_entry(&self, i: u32, out: Option<&mut [u8; 20]>) -> (u64, u32) {
        let ord = self.ordinal_at(i);
        let start = self.chunk_start(ord);
        let end = self.cumulative_offset(ord);
        let length = (end - start) as u32;
        if let Some(out) = out {
            out[..8].copy_from_slice(&self.prefix_at(i).to_be_bytes());
            let suffix_off = ord as usize * SUFFIX_SIZE;
            out[8..].copy_from_slice(&self.suffixes()[suffix_off..suffix_off + SUFFIX_SIZE]);
        }
        (start, length)
    }

    /// Look up a chunk's `(offset, length)` by its full address.
    pub fn lookup(&self, addr: &Address) -> Option<(u64, u32)> {
        let mut i = self.prefix_lb(addr.prefix());
        let n = self.chunk_count();
        while i < n && self.prefix_at(i) == addr.prefix() {
            if self.entry_suffix_matches(i, addr) {
                return Some(self.index_entry(i, None));
            }
            i += 1;
        }
        None
    }

    /// Ordinals in sorted-by-prefix order.
    pub fn ordinals(&self) -> Vec<u32> {
        (0..self.chunk_count()).map(|i| self.ordinal_at(i)).collect()
    }

    /// Prefixes in sorted order.
    pub fn prefixes(&self) -> Vec<u64> {
        (0..self.chunk_count()).map(|i| self.prefix_at(i)).collect()
    }

    /// Total size, in bytes, of the table file this index was built from.
    pub fn table_file_size(&self) -> u64 {
        let n = self.chunk_count();
        if n == 0 {
            return FOOTER_SIZE;
        }
        let data_bytes = self.cumulative_offset(n - 1);
        data_bytes + index_size(n) + FOOTER_SIZE
    }

    /// Resolve a (possibly truncated) canonical short-hash string to the
    /// set of full canonical address strings with that prefix. `short`
    /// must be 6 to 32 characters of the canonical alphabet.
    ///
    /// Strings of 13 or more characters resolve to an exact 64-bit prefix
    /// match; shorter strings are resolved as a range, since fewer than
    /// 13 characters don't cover a full prefix's worth of bits.
    pub fn resolve_short_hash(&self, short: &str) -> Result<Vec<String>> {
        if short.len() < 6 || short.len() > 32 {
            return Err(Error::InvalidShortHash(format!(
                "length {} out of range 6..=32",
                short.len()
            )));
        }
        let n = self.chunk_count();
        let (lo_idx, hi_idx) = if short.len() >= 13 {
            let prefix = decode_padded_prefix(short, ALPHABET_MIN)?;
            let idx = self.prefix_lb(prefix);
            if idx == n || self.prefix_at(idx) != prefix {
                tracing::debug!(short, "short hash prefix not found");
                return Err(Error::NotFound("can't find prefix".to_string()));
            }
            let mut end = idx;
            while end < n && self.prefix_at(end) == prefix {
                end += 1;
            }
            (idx, Some(end - 1))
        } else {
            let lo = decode_padded_prefix(short, ALPHABET_MIN)?;
            let hi = decode_padded_prefix(short, ALPHABET_MAX)?;
            (self.prefix_lb(lo), self.prefix_ub(hi))
        };

        let mut out = Vec::new();
        if let Some(hi_idx) = hi_idx {
            if lo_idx <= hi_idx {
                for i in lo_idx..=hi_idx {
                    let mut buf = [0u8; 20];
                    self.index_entry(i, Some(&mut buf));
                    let candidate = Address(buf).to_canonical_string();
                    if candidate.starts_with(short) {
                        out.push(candidate);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Lowest sorted index `i` with `prefix_at(i) >= p`.
    pub fn prefix_lb(&self, p: u64) -> u32 {
        let mut lo = 0u32;
        let mut hi = self.chunk_count();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.prefix_at(mid) < p {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Alias for [`Self::prefix_lb`], matching the common "find index"
    /// naming for this kind of search.
    pub fn prefix_idx(&self, p: u64) -> u32 {
        self.prefix_lb(p)
    }

    /// Highest sorted index `i` with `prefix_at(i) <= p`, or `None` if no
    /// entry satisfies that (every prefix in the table is greater than `p`).
    pub fn prefix_ub(&self, p: u64) -> Option<u32> {
        if self.chunk_count() == 0 {
            return None;
        }
        let mut lo = 0u32;
        let mut hi = self.chunk_count();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.prefix_at(mid) <= p {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        if lo == 0 {
            None
        } else {
            Some(lo - 1)
        }
    }

    /// Take out an additional logical handle on this index, bumping the
    /// refcount. Panics if called after the index has already been fully
    /// closed (refcount at or below zero) — that's a use-after-close bug
    /// in the caller, not a recoverable condition.
    pub fn clone(&self) -> TableIndex {
        let prev = self.0.ref_count.fetch_add(1, Ordering::AcqRel);
        if prev <= 0 {
            panic!("TableIndex::clone called after index was closed");
        }
        TableIndex(Arc::clone(&self.0))
    }

    /// Release this handle. When the last outstanding handle closes, the
    /// memory quota charged at construction time is released back to the
    /// provider. Panics on a double-close (refcount already at or below
    /// zero before this call).
    pub fn close(&self) -> Result<()> {
        let prev = self.0.ref_count.fetch_sub(1, Ordering::AcqRel);
        if prev == 1 {
            tracing::debug!(mem_size = self.0.mem_size, "table index released");
            self.0.quota.release(self.0.mem_size)
        } else if prev <= 0 {
            panic!("TableIndex::close called on an already-closed index");
        } else {
            Ok(())
        }
    }

    fn tuples(&self) -> &[u8] {
        let n = self.chunk_count() as usize;
        &self.0.block[..n * PREFIX_TUPLE_SIZE]
    }

    fn suffixes(&self) -> &[u8] {
        let n = self.chunk_count() as usize;
        &self.0.block[n * PREFIX_TUPLE_SIZE..]
    }

    fn half_lo(&self) -> usize {
        (self.chunk_count() as usize).div_ceil(2)
    }

    /// Cumulative length through ordinal `ord`, inclusive.
    fn cumulative_offset(&self, ord: u32) -> u64 {
        let ord = ord as usize;
        let half_lo = self.half_lo();
        if ord < half_lo {
            let off = ord * 8;
            u64::from_be_bytes(self.0.offsets_lo[off..off + 8].try_into().unwrap())
        } else {
            let off = (ord - half_lo) * 8;
            u64::from_be_bytes(self.0.offsets_hi[off..off + 8].try_into().unwrap())
        }
    }

    /// Start offset of ordinal `ord`: the cumulative length through the
    /// previous ordinal, or 0 for the first chunk written.
    fn chunk_start(&self, ord: u32) -> u64 {
        if ord == 0 {
            0
        } else {
            self.cumulative_offset(ord - 1)
        }
    }
}

/// Consume the raw 4-byte-per-ordinal `lengths` buffer and produce the two
/// cumulative-offset arrays, splitting at `ceil(n/2)`. `offsets_hi` reuses
/// `lengths`'s own allocation rather than allocating fresh: `lengths` is
/// `4*n` bytes and `offsets_hi` needs `8*floor(n/2)` bytes, and
/// `4*n >= 8*floor(n/2)` for every `n`, so the existing capacity always
/// suffices.
fn materialize_offsets(mut lengths: Vec<u8>, n: usize) -> (Box<[u8]>, Box<[u8]>) {
    let half_lo = n.div_ceil(2);
    let mut offsets_lo = Vec::with_capacity(8 * half_lo);
    let mut hi_vals: Vec<u64> = Vec::with_capacity(n - half_lo);
    let mut running: u64 = 0;
    for ord in 0..n {
        let off = ord * LENGTH_SIZE;
        let len = u32::from_be_bytes(lengths[off..off + 4].try_into().unwrap()) as u64;
        running += len;
        if ord < half_lo {
            offsets_lo.extend_from_slice(&running.to_be_bytes());
        } else {
            hi_vals.push(running);
        }
    }
    lengths.clear();
    for v in hi_vals {
        lengths.extend_from_slice(&v.to_be_bytes());
    }
    lengths.shrink_to_fit();
    (offsets_lo.into_boxed_slice(), lengths.into_boxed_slice())
}
