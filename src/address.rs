// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Chunk addresses: 20-byte digests split into an 8-byte prefix and a
//! 12-byte suffix, plus the canonical base32-style string encoding used
//! for short-hash resolution (see `table_index::resolve_short_hash`).

use crate::error::{Error, Result};

/// Total length of a chunk address, in bytes.
pub const ADDR_LEN: usize = 20;
/// Length of the prefix half of an address (interpreted as a big-endian u64).
pub const ADDR_PREFIX_LEN: usize = 8;
/// Length of the suffix half of an address.
pub const ADDR_SUFFIX_LEN: usize = 12;

/// Alphabet used by the canonical address encoding: lower-bound char is
/// `'0'`, upper-bound char is `'v'`. Order matches byte value order, which
/// is what makes zero-padding and `'v'`-padding valid range endpoints for
/// short-hash resolution.
const ALPHABET: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

/// Number of characters a short-hash string is padded to before being
/// decoded into a prefix. 16 chars * 5 bits = 80 bits = 10 bytes, so the
/// leading 8 bytes (64 bits) give an exact `u64` prefix.
pub const SHORT_HASH_PAD_LEN: usize = 16;

/// A 20-byte chunk digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; ADDR_LEN]);

impl Address {
    pub fn from_parts(prefix: u64, suffix: &[u8; ADDR_SUFFIX_LEN]) -> Self {
        let mut bytes = [0u8; ADDR_LEN];
        bytes[..ADDR_PREFIX_LEN].copy_from_slice(&prefix.to_be_bytes());
        bytes[ADDR_PREFIX_LEN..].copy_from_slice(suffix);
        Address(bytes)
    }

    pub fn prefix(&self) -> u64 {
        u64::from_be_bytes(self.0[..ADDR_PREFIX_LEN].try_into().unwrap())
    }

    pub fn suffix(&self) -> &[u8] {
        &self.0[ADDR_PREFIX_LEN..]
    }

    pub fn as_bytes(&self) -> &[u8; ADDR_LEN] {
        &self.0
    }

    /// Render this address in the canonical 32-character alphabet.
    pub fn to_canonical_string(&self) -> String {
        encode_base32(&self.0)
    }
}

/// Encode `bytes` using the canonical alphabet, 5 bits per output char.
/// `bytes.len()` must be a multiple of 5 (true for both 10-byte prefixes
/// and 20-byte full addresses), so no padding bits are introduced.
fn encode_base32(bytes: &[u8]) -> String {
    debug_assert!(bytes.len() % 5 == 0, "base32 encoding needs 5-byte groups");
    let mut out = String::with_capacity(bytes.len() * 8 / 5);
    for chunk in bytes.chunks(5) {
        let mut buf = 0u64;
        for &b in chunk {
            buf = (buf << 8) | b as u64;
        }
        // chunk is always 5 bytes here (40 bits -> 8 chars of 5 bits).
        for i in (0..8).rev() {
            let idx = (buf >> (i * 5)) & 0x1f;
            out.push(ALPHABET[idx as usize] as char);
        }
    }
    out
}

/// Decode a string of canonical-alphabet characters back to bytes.
/// `s.len()` must be a multiple of 8 (producing whole 5-byte groups).
fn decode_base32(s: &str) -> Result<Vec<u8>> {
    if s.len() % 8 != 0 {
        return Err(Error::InvalidShortHash(format!(
            "length {} is not a multiple of 8",
            s.len()
        )));
    }
    let mut out = Vec::with_capacity(s.len() * 5 / 8);
    for group in s.as_bytes().chunks(8) {
        let mut buf = 0u64;
        for &c in group {
            let v = ALPHABET
                .iter()
                .position(|&a| a == c)
                .ok_or_else(|| Error::InvalidShortHash(format!("invalid character '{}'", c as char)))?;
            buf = (buf << 5) | v as u64;
        }
        // 8 chars * 5 bits = 40 bits = 5 bytes.
        for i in (0..5).rev() {
            out.push(((buf >> (i * 8)) & 0xff) as u8);
        }
    }
    Ok(out)
}

/// Right-pad a short-hash string with `pad` up to `SHORT_HASH_PAD_LEN`
/// characters and decode the leading 64 bits as a prefix.
pub fn decode_padded_prefix(short: &str, pad: char) -> Result<u64> {
    let mut padded = String::with_capacity(SHORT_HASH_PAD_LEN);
    padded.push_str(short);
    while padded.len() < SHORT_HASH_PAD_LEN {
        padded.push(pad);
    }
    let bytes = decode_base32(&padded)?;
    Ok(u64::from_be_bytes(bytes[..ADDR_PREFIX_LEN].try_into().unwrap()))
}

/// Minimum character in the canonical alphabet (sorts first).
pub const ALPHABET_MIN: char = '0';
/// Maximum character in the canonical alphabet (sorts last).
pub const ALPHABET_MAX: char = 'v';

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_full_address() {
        let mut bytes = [0u8; ADDR_LEN];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8 * 7 + 1;
        }
        let addr = Address(bytes);
        let s = addr.to_canonical_string();
        assert_eq!(s.len(), 32);
        let decoded = decode_base32(&s).unwrap();
        assert_eq!(decoded.as_slice(), &bytes[..]);
    }

    #[test]
    fn prefix_and_suffix_split() {
        let suffix = [9u8; ADDR_SUFFIX_LEN];
        let addr = Address::from_parts(0x0102030405060708, &suffix);
        assert_eq!(addr.prefix(), 0x0102030405060708);
        assert_eq!(addr.suffix(), &suffix[..]);
    }

    #[test]
    fn padded_prefix_matches_alphabet_bounds() {
        // All-zero short hash pads to the minimum possible prefix with '0',
        // and to a much larger one with 'v'.
        let lo = decode_padded_prefix("0", ALPHABET_MIN).unwrap();
        let hi = decode_padded_prefix("0", ALPHABET_MAX).unwrap();
        assert!(hi > lo);
    }

    #[test]
    fn rejects_invalid_character() {
        assert!(decode_padded_prefix("$", ALPHABET_MIN).is_err());
    }
}
