// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Error kinds surfaced by the index and its memory quota collaborator.
//!
//! Everything here is recoverable and propagated to the caller, with one
//! exception: predicate-to-key-set translation (see `keyset::predicate`)
//! swallows these errors and falls back to the universal set, since a
//! pessimistic full scan is always a correct (if slow) answer.

use std::io;

/// Errors produced while parsing or querying a table index.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid table file: {0}")]
    InvalidTableFile(String),

    #[error("buffer length and/or capacity incorrect for chunk count specified in footer")]
    WrongBufferSize,

    #[error("could not copy enough bytes reading the index block")]
    WrongCopySize,

    #[error("memory quota exceeded: requested {requested} bytes, {available} available")]
    QuotaExceeded { requested: u64, available: u64 },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid short hash: {0}")]
    InvalidShortHash(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
