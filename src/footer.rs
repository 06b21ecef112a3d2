// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Table file footer layout and the index-block size arithmetic every
//! other module in this crate depends on.
//!
//! ```text
//! [ tuples   : 12*N bytes ]  (prefix u64 BE, ordinal u32 BE) each
//! [ lengths  :  4*N bytes ]  u32 BE each, indexed by ordinal
//! [ suffixes : 12*N bytes ]  12 raw bytes each, indexed by ordinal
//! [ footer   : 20 bytes   ]  chunk_count u32 BE | total_uncompressed u64 BE | magic
//! ```

use std::io::{Read, Seek, SeekFrom};

use crate::error::{Error, Result};

/// `(prefix: u64, ordinal: u32)` tuple width, in bytes.
pub const PREFIX_TUPLE_SIZE: u64 = 12;
/// Width of a single length entry, in bytes.
pub const LENGTH_SIZE: u64 = 4;
/// Width of a single address suffix, in bytes.
pub const SUFFIX_SIZE: u64 = 12;
/// Width of the trailing footer, in bytes.
pub const FOOTER_SIZE: u64 = 20;

/// Fixed 8-byte magic number that terminates every table file footer.
pub const MAGIC: [u8; 8] = *b"CATIDX01";

/// Size in bytes of the index block (tuples + lengths + suffixes) for a
/// table holding `chunk_count` chunks, not including the footer.
pub fn index_size(chunk_count: u32) -> u64 {
    let n = chunk_count as u64;
    n * (PREFIX_TUPLE_SIZE + LENGTH_SIZE) + n * SUFFIX_SIZE
}

/// Bytes charged against the memory quota for a loaded index of this
/// chunk count: the index block, the footer, and the `offsets_lo`
/// allocation (`offsets_hi` reuses the `lengths` allocation, see
/// `table_index::materialize_offsets`).
pub fn index_mem_size(chunk_count: u32) -> u64 {
    let half_lo = chunk_count.div_ceil(2) as u64;
    index_size(chunk_count) + FOOTER_SIZE + LENGTH_SIZE * half_lo
}

/// The parsed contents of a table file footer.
#[derive(Debug, Clone, Copy)]
pub struct Footer {
    pub chunk_count: u32,
    pub total_uncompressed: u64,
}

/// Seek to the last `FOOTER_SIZE` bytes of `reader`, read them, and
/// validate the magic number.
pub fn read_footer<R: Read + Seek>(reader: &mut R) -> Result<Footer> {
    reader.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
    let mut buf = [0u8; FOOTER_SIZE as usize];
    reader.read_exact(&mut buf)?;
    parse_footer_bytes(&buf)
}

pub(crate) fn parse_footer_bytes(buf: &[u8; FOOTER_SIZE as usize]) -> Result<Footer> {
    if buf[12..20] != MAGIC {
        return Err(Error::InvalidTableFile(format!(
            "bad magic number: {:?}",
            &buf[12..20]
        )));
    }
    let chunk_count = u32::from_be_bytes(buf[0..4].try_into().unwrap());
    let total_uncompressed = u64::from_be_bytes(buf[4..12].try_into().unwrap());
    Ok(Footer {
        chunk_count,
        total_uncompressed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn footer_bytes(chunk_count: u32, total_uncompressed: u64) -> [u8; FOOTER_SIZE as usize] {
        let mut buf = [0u8; FOOTER_SIZE as usize];
        buf[0..4].copy_from_slice(&chunk_count.to_be_bytes());
        buf[4..12].copy_from_slice(&total_uncompressed.to_be_bytes());
        buf[12..20].copy_from_slice(&MAGIC);
        buf
    }

    #[test]
    fn reads_trailing_footer() {
        let mut data = vec![0xAAu8; 100];
        data.extend_from_slice(&footer_bytes(3, 60));
        let mut cursor = Cursor::new(data);
        let footer = read_footer(&mut cursor).unwrap();
        assert_eq!(footer.chunk_count, 3);
        assert_eq!(footer.total_uncompressed, 60);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = footer_bytes(3, 60);
        buf[12] = b'X';
        assert!(matches!(
            parse_footer_bytes(&buf),
            Err(Error::InvalidTableFile(_))
        ));
    }

    #[test]
    fn empty_table_size_is_footer_only() {
        assert_eq!(index_size(0), 0);
    }

    #[test]
    fn mem_size_accounts_for_offsets_lo() {
        // N=3: half_lo = ceil(3/2) = 2, formula adds 4*half_lo bytes.
        let base = index_size(3) + FOOTER_SIZE;
        assert_eq!(index_mem_size(3), base + 4 * 2);
    }
}
