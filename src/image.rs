//! High-level [`SimImage`] API: load an image, then decode it.
//!
//! ```no_run
//! use simread::image::{DecodeOptions, SimImage};
//!
//! let image = SimImage::open("firmware.sim", &DecodeOptions::default())?;
//! let decoded = image.decode()?;
//! println!("{} record(s), checksum ok: {}", decoded.records.len(), decoded.checksum.matches);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The whole file is read into memory before anything is decoded.  Files at or
//! above [`DecodeOptions::max_file_size`] are rejected before they are read.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::checksum::{self, ChecksumReport};
use crate::error::DecodeError;
use crate::header::{Header, HEADER_SIZE};
use crate::record::{DecodedRecord, Record};
use crate::stream::RecordStream;

/// Default size ceiling: 1 MB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_000_000;

// ── DecodeOptions ─────────────────────────────────────────────────────────────

/// Configuration for [`SimImage::open`] and [`SimImage::from_bytes`].
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Images of this many bytes or more are rejected.
    pub max_file_size: u64,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { max_file_size: DEFAULT_MAX_FILE_SIZE }
    }
}

impl DecodeOptions {
    pub fn check_size(&self, size: u64) -> Result<(), DecodeError> {
        if size >= self.max_file_size {
            return Err(DecodeError::FileTooLarge { size, limit: self.max_file_size });
        }
        Ok(())
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

// ── DecodedImage ──────────────────────────────────────────────────────────────

/// Everything a full decode produces.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedImage {
    pub file_size:      usize,
    pub header:         Header,
    /// Every record up to and including END.
    pub records:        Vec<DecodedRecord>,
    /// Bytes that follow the END record.
    pub trailing_bytes: usize,
    pub checksum:       ChecksumReport,
}

impl DecodedImage {
    /// Address from the first ENTRY record, if any.
    pub fn entry_address(&self) -> Option<u32> {
        self.records.iter().find_map(|r| match r.record {
            Record::Entry { entry_address, .. } => Some(entry_address),
            _ => None,
        })
    }

    /// Sum of `byte_count` over all DATA records.
    pub fn data_byte_total(&self) -> u64 {
        self.records
            .iter()
            .map(|r| match r.record {
                Record::Data { byte_count, .. } => u64::from(byte_count),
                _ => 0,
            })
            .sum()
    }
}

/// Decode a complete in-memory image: header, records, then checksum.
///
/// No size limit is applied here; see [`SimImage::from_bytes`].
pub fn decode(image: &[u8]) -> Result<DecodedImage, DecodeError> {
    let header = Header::parse(image)?;

    let mut stream = RecordStream::with_base_offset(&image[HEADER_SIZE..], HEADER_SIZE);
    let records = stream.by_ref().collect::<Result<Vec<_>, _>>()?;
    let embedded = stream.end_checksum().ok_or(DecodeError::TruncatedRecord {
        index:     records.len(),
        offset:    stream.offset(),
        needed:    1,
        available: 0,
    })?;

    let trailing_bytes = stream.remaining().len();
    if trailing_bytes > 0 {
        warn!(offset = stream.offset(), trailing_bytes, "bytes after END record");
    }

    let checksum = checksum::verify(image, embedded)?;
    if !checksum.matches {
        warn!(
            calculated = %format!("{:#010x}", checksum.calculated),
            embedded   = %format!("{:#010x}", checksum.embedded),
            "checksum mismatch"
        );
    }

    let decoded = DecodedImage {
        file_size: image.len(),
        header,
        records,
        trailing_bytes,
        checksum,
    };
    info!(
        records = decoded.records.len(),
        data_bytes = decoded.data_byte_total(),
        checksum_ok = checksum.matches,
        "image decoded"
    );
    Ok(decoded)
}

// ── SimImage ──────────────────────────────────────────────────────────────────

/// A fully buffered `.sim` image.
#[derive(Debug, Clone)]
pub struct SimImage {
    path:  Option<PathBuf>,
    bytes: Vec<u8>,
}

impl SimImage {
    pub fn open<P: AsRef<Path>>(path: P, opts: &DecodeOptions) -> Result<Self, ImageError> {
        let path = path.as_ref().to_owned();
        let io_err = |source: io::Error| ImageError::Io { path: path.clone(), source };

        let size = fs::metadata(&path).map_err(io_err)?.len();
        opts.check_size(size)?;

        let bytes = fs::read(&path).map_err(io_err)?;
        info!(path = %path.display(), size = bytes.len(), "image loaded");

        let mut image = Self::from_bytes(bytes, opts)?;
        image.path = Some(path);
        Ok(image)
    }

    pub fn from_bytes(bytes: Vec<u8>, opts: &DecodeOptions) -> Result<Self, DecodeError> {
        opts.check_size(bytes.len() as u64)?;
        Ok(Self { path: None, bytes })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn header(&self) -> Result<Header, DecodeError> {
        Header::parse(&self.bytes)
    }

    /// Fresh lazy stream over the records after the header.
    pub fn records(&self) -> RecordStream<'_> {
        let body = self.bytes.get(HEADER_SIZE..).unwrap_or(&[]);
        RecordStream::with_base_offset(body, HEADER_SIZE)
    }

    pub fn calculated_checksum(&self) -> Result<u32, DecodeError> {
        checksum::calculate(&self.bytes)
    }

    pub fn decode(&self) -> Result<DecodedImage, DecodeError> {
        decode(&self.bytes)
    }
}
