//! Image checksum.
//!
//! The last 4 bytes of an image hold a checksum chosen so that the byte-wise
//! sum of everything before it, plus the checksum, is zero modulo 2^32:
//!
//! ```text
//! sum        = Σ bytes[0 .. len-4]   (each byte as u8, wrapping u32 accumulator)
//! calculated = (!sum).wrapping_add(1)
//! ```
//!
//! By convention the same value is carried in the END record.

use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

use crate::error::DecodeError;

/// Width of the trailing checksum field.
pub const CHECKSUM_SIZE: usize = 4;

/// Wrapping byte sum over `bytes`.
pub fn byte_sum(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| acc.wrapping_add(u32::from(b)))
}

/// Recompute the checksum over all of `image` except its last 4 bytes.
pub fn calculate(image: &[u8]) -> Result<u32, DecodeError> {
    let end = checksum_position(image)?;
    Ok(byte_sum(&image[..end]).wrapping_neg())
}

/// The big-endian value stored in the last 4 bytes of `image`.
pub fn trailing(image: &[u8]) -> Result<u32, DecodeError> {
    let pos = checksum_position(image)?;
    Ok(BigEndian::read_u32(&image[pos..]))
}

fn checksum_position(image: &[u8]) -> Result<usize, DecodeError> {
    image
        .len()
        .checked_sub(CHECKSUM_SIZE)
        .ok_or(DecodeError::FileTooShort { len: image.len() })
}

/// Recomputed checksum set against the values stored in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChecksumReport {
    pub calculated: u32,
    /// Checksum carried by the END record.
    pub embedded:   u32,
    /// Raw value of the file's last 4 bytes.
    pub trailing:   u32,
    /// `calculated == embedded`.
    pub matches:    bool,
}

impl ChecksumReport {
    pub fn trailing_agrees(&self) -> bool {
        self.trailing == self.embedded
    }
}

/// Recompute the checksum of `image` and compare it against `embedded`.
pub fn verify(image: &[u8], embedded: u32) -> Result<ChecksumReport, DecodeError> {
    let calculated = calculate(image)?;
    Ok(ChecksumReport {
        calculated,
        embedded,
        trailing: trailing(image)?,
        matches:  calculated == embedded,
    })
}
