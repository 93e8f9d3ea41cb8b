//! Lazy decoder for the record stream that follows the header.
//!
//! [`RecordStream`] is an iterator over `Result<DecodedRecord, DecodeError>`.
//! It walks the buffer with a bounds-checked cursor and is driven by an
//! explicit state machine:
//!
//! | State      | Entered when                                  | Yields  |
//! |------------|-----------------------------------------------|---------|
//! | `Scanning` | construction                                  | records |
//! | `Done`     | an END record has been yielded                | nothing |
//! | `Failed`   | truncation or an unknown tag has been yielded | nothing |
//!
//! END is the only normal way out.  Running off the end of the buffer without
//! one is a `TruncatedRecord` failure, and so is a DATA record whose declared
//! `byte_count` reaches past the buffer: the length is checked before any
//! payload byte is touched.
//!
//! The stream is not restartable.  Decode again with a fresh `RecordStream`.

mod cursor;

pub use cursor::ByteCursor;

use byteorder::{BigEndian, ByteOrder};
use tracing::debug;

use crate::error::DecodeError;
use crate::record::{DecodedRecord, Record, RecordTag, DATA_RECORD_FIXED_SIZE};

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamState {
    Scanning,
    Done,
    Failed(DecodeError),
}

// ── Stream ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RecordStream<'a> {
    cursor:       ByteCursor<'a>,
    /// Added to cursor positions so offsets are reported relative to the file.
    base_offset:  usize,
    index:        usize,
    state:        StreamState,
    end_checksum: Option<u32>,
}

impl<'a> RecordStream<'a> {
    /// Decode `buf` as a record stream starting at offset 0.
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_base_offset(buf, 0)
    }

    /// Decode `buf`, which begins `base_offset` bytes into the file.
    pub fn with_base_offset(buf: &'a [u8], base_offset: usize) -> Self {
        Self {
            cursor: ByteCursor::new(buf),
            base_offset,
            index: 0,
            state: StreamState::Scanning,
            end_checksum: None,
        }
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    /// Absolute offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.base_offset + self.cursor.position()
    }

    /// Checksum carried by the END record, once it has been decoded.
    pub fn end_checksum(&self) -> Option<u32> {
        self.end_checksum
    }

    /// Bytes not consumed by any decoded record.  After `Done` this is
    /// whatever follows the END record.
    pub fn remaining(&self) -> &'a [u8] {
        self.cursor.rest()
    }

    fn decode_next(&mut self) -> Result<DecodedRecord, DecodeError> {
        let index     = self.index;
        let offset    = self.offset();
        let available = self.cursor.remaining();
        let truncated = |needed: u64| DecodeError::TruncatedRecord {
            index,
            offset,
            needed,
            available,
        };

        let tag_byte = self.cursor.peek(1).ok_or_else(|| truncated(1))?[0];
        let tag = RecordTag::from_u8(tag_byte)
            .ok_or(DecodeError::UnknownRecordTag { index, offset, tag: tag_byte })?;

        let fixed = self
            .cursor
            .peek(tag.fixed_size())
            .ok_or_else(|| truncated(tag.fixed_size() as u64))?;

        let record = match tag {
            RecordTag::Data => {
                let byte_count = BigEndian::read_u32(&fixed[8..12]);
                let total = DATA_RECORD_FIXED_SIZE as u64 + u64::from(byte_count);
                if total > available as u64 {
                    return Err(truncated(total));
                }
                let bytes = self.cursor.take(total as usize).ok_or_else(|| truncated(total))?;
                Record::Data {
                    segment_type:  fixed[1],
                    flags:         BigEndian::read_u16(&fixed[2..4]),
                    start_address: BigEndian::read_u32(&fixed[4..8]),
                    byte_count,
                    payload:       bytes[DATA_RECORD_FIXED_SIZE..].to_vec(),
                }
            }
            RecordTag::Entry => {
                self.cursor.take(fixed.len());
                Record::Entry {
                    entry_address: BigEndian::read_u32(&fixed[1..5]),
                    segment_type:  fixed[5],
                }
            }
            RecordTag::End => {
                self.cursor.take(fixed.len());
                Record::End {
                    checksum: BigEndian::read_u32(&fixed[1..5]),
                }
            }
        };

        debug!(index, offset, kind = ?tag, len = record.encoded_len(), "decoded record");
        Ok(DecodedRecord { index, offset, record })
    }
}

impl Iterator for RecordStream<'_> {
    type Item = Result<DecodedRecord, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state != StreamState::Scanning {
            return None;
        }
        match self.decode_next() {
            Ok(rec) => {
                if let Record::End { checksum } = rec.record {
                    self.end_checksum = Some(checksum);
                    self.state = StreamState::Done;
                }
                self.index += 1;
                Some(Ok(rec))
            }
            Err(e) => {
                debug!(error = %e, "record stream failed");
                self.state = StreamState::Failed(e.clone());
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for RecordStream<'_> {}
