use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;
use crate::error::DecodeError;

/// On-disk width of the header.
pub const HEADER_SIZE: usize = 14;

/// The fixed leading region of a `.sim` image.
///
/// Layout (big-endian):
///
/// | Offset | Size | Field                |
/// |--------|------|----------------------|
/// | 0      | 4    | `magic_number`       |
/// | 4      | 4    | `program_flags`      |
/// | 8      | 4    | `program_byte_count` |
/// | 12     | 2    | `version`            |
///
/// No field is validated; the magic number in particular is reported as read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Header {
    pub magic_number:       u32,
    pub program_flags:      u32,
    pub program_byte_count: u32,
    pub version:            u16,
}

impl Header {
    pub fn parse(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < HEADER_SIZE {
            return Err(DecodeError::TruncatedHeader {
                available: buf.len(),
                needed:    HEADER_SIZE,
            });
        }
        Ok(Self {
            magic_number:       BigEndian::read_u32(&buf[0..4]),
            program_flags:      BigEndian::read_u32(&buf[4..8]),
            program_byte_count: BigEndian::read_u32(&buf[8..12]),
            version:            BigEndian::read_u16(&buf[12..14]),
        })
    }
}
