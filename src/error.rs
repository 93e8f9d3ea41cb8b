//! Decode error taxonomy.
//!
//! Every failure names the stage that produced it and, where one exists, the
//! absolute byte offset in the image.  Decoding never continues past the
//! first error.

use std::fmt;
use thiserror::Error;

/// The decode stage a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SizeCheck,
    Header,
    /// Zero-based position of the record in the stream.
    Record(usize),
    Checksum,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::SizeCheck => f.write_str("size check"),
            Stage::Header    => f.write_str("header"),
            Stage::Record(n) => write!(f, "record {n}"),
            Stage::Checksum  => f.write_str("checksum"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer than 4 bytes: there is no checksum field to exclude.
    #[error("checksum: file too short ({len} bytes, need at least 4)")]
    FileTooShort { len: usize },

    #[error("size check: file size too large ({size} >= {limit})")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("header: could not read header ({available} of {needed} bytes available)")]
    TruncatedHeader { available: usize, needed: usize },

    #[error(
        "record {index} at offset 0x{offset:08x}: truncated \
         (needs {needed} bytes, {available} available)"
    )]
    TruncatedRecord {
        index:     usize,
        offset:    usize,
        needed:    u64,
        available: usize,
    },

    #[error("record {index} at offset 0x{offset:08x}: unknown record tag 0x{tag:02x}")]
    UnknownRecordTag { index: usize, offset: usize, tag: u8 },
}

impl DecodeError {
    pub fn stage(&self) -> Stage {
        match self {
            DecodeError::FileTooShort { .. }            => Stage::Checksum,
            DecodeError::FileTooLarge { .. }            => Stage::SizeCheck,
            DecodeError::TruncatedHeader { .. }         => Stage::Header,
            DecodeError::TruncatedRecord { index, .. }  => Stage::Record(*index),
            DecodeError::UnknownRecordTag { index, .. } => Stage::Record(*index),
        }
    }

    /// Absolute file offset of the failure, if it has one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            DecodeError::TruncatedHeader { .. }          => Some(0),
            DecodeError::TruncatedRecord { offset, .. }  => Some(*offset),
            DecodeError::UnknownRecordTag { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    pub fn is_truncation(&self) -> bool {
        matches!(
            self,
            DecodeError::TruncatedHeader { .. } | DecodeError::TruncatedRecord { .. }
        )
    }
}
