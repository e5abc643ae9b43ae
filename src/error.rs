// SPDX-License-Identifier: MIT
//! Typed failures surfaced by the codec

use thiserror::Error;

/// Errors produced by encoding, decoding, and in-place field mutation
#[derive(Debug, Error)]
pub enum GeomError {
    /// Stated length disagrees with actual size, or the payload is
    /// truncated/inconsistent with the header-declared structure
    #[error("malformed buffer: {0}")]
    MalformedBuffer(String),

    /// Header version byte not recognized by this codec
    #[error("unsupported format version: expected {expected}, got {found}")]
    UnsupportedVersion { expected: u8, found: u8 },

    /// SRID outside the accepted range
    #[error("invalid SRID {0}: valid identifiers are 1..=999999")]
    InvalidSrid(i32),

    /// A coordinate sequence disagrees in dimensionality with the
    /// geometry's declared flags
    #[error("dimension mismatch: geometry declares {declared} coordinate dimensions, sequence carries {found}")]
    DimensionMismatch { declared: usize, found: usize },
}
