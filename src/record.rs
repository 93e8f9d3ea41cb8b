//! Record types of the `.sim` record stream.
//!
//! Every record starts with a one-byte tag that fixes its layout, so the
//! stream is self-describing.  All multi-byte fields are big-endian.
//!
//! | Tag    | Kind  | Body                                                              |
//! |--------|-------|-------------------------------------------------------------------|
//! | `0x01` | Data  | segment_type(1) flags(2) start_address(4) byte_count(4) payload  |
//! | `0x02` | Entry | entry_address(4) segment_type(1)                                  |
//! | `0x03` | End   | checksum(4)                                                       |

use serde::{Serialize, Serializer};

/// Fixed part of a DATA record including the tag; the payload follows.
pub const DATA_RECORD_FIXED_SIZE:  usize = 12;
pub const ENTRY_RECORD_SIZE:       usize = 6;
pub const END_RECORD_SIZE:         usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordTag {
    Data  = 0x01,
    Entry = 0x02,
    End   = 0x03,
}

impl RecordTag {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0x01 => Some(RecordTag::Data),
            0x02 => Some(RecordTag::Entry),
            0x03 => Some(RecordTag::End),
            _    => None,
        }
    }

    /// Bytes that must be present before any variable-length payload.
    pub fn fixed_size(self) -> usize {
        match self {
            RecordTag::Data  => DATA_RECORD_FIXED_SIZE,
            RecordTag::Entry => ENTRY_RECORD_SIZE,
            RecordTag::End   => END_RECORD_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Data {
        segment_type:  u8,
        flags:         u16,
        start_address: u32,
        byte_count:    u32,
        #[serde(serialize_with = "serialize_hex")]
        payload:       Vec<u8>,
    },
    Entry {
        entry_address: u32,
        segment_type:  u8,
    },
    End {
        checksum: u32,
    },
}

impl Record {
    pub fn tag(&self) -> RecordTag {
        match self {
            Record::Data { .. }  => RecordTag::Data,
            Record::Entry { .. } => RecordTag::Entry,
            Record::End { .. }   => RecordTag::End,
        }
    }

    /// Bytes this record occupies in the stream, tag included.
    pub fn encoded_len(&self) -> usize {
        match self {
            Record::Data { payload, .. } => DATA_RECORD_FIXED_SIZE + payload.len(),
            other                        => other.tag().fixed_size(),
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Record::End { .. })
    }
}

/// A record together with its position in the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedRecord {
    pub index:  usize,
    /// Absolute byte offset of the tag in the file.
    pub offset: usize,
    #[serde(flatten)]
    pub record: Record,
}

fn serialize_hex<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(bytes))
}
