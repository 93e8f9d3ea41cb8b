//! Human-readable and JSON rendering of decoded images.
//!
//! Rendering is presentation only: the decoder always returns every payload
//! byte, and [`RenderOptions::hide_program_bytes`] only controls whether the
//! text renderer prints them.

use std::io::{self, Write};

use crate::checksum::ChecksumReport;
use crate::header::Header;
use crate::image::DecodedImage;
use crate::record::{DecodedRecord, Record};

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Print `[Program bytes hidden]` instead of DATA payloads.
    pub hide_program_bytes: bool,
}

/// Writes the classic `simread` text layout, one section at a time, so a
/// caller can render records while the stream is still being decoded.
pub struct TextRenderer<W: Write> {
    out:  W,
    opts: RenderOptions,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W, opts: RenderOptions) -> Self {
        Self { out, opts }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn file_size(&mut self, size: u64) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "File size = {size}")
    }

    pub fn header(&mut self, h: &Header) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "Header")?;
        writeln!(self.out, "Magic number = 0x{:08x}", h.magic_number)?;
        writeln!(self.out, "Program flags = 0x{:08x}", h.program_flags)?;
        writeln!(self.out, "Number of Program Bytes = {}", h.program_byte_count)?;
        writeln!(self.out, "Version Information = 0x{:04x}", h.version)
    }

    pub fn record(&mut self, rec: &DecodedRecord) -> io::Result<()> {
        writeln!(self.out)?;
        match &rec.record {
            Record::Data { segment_type, flags, start_address, byte_count, payload } => {
                writeln!(self.out, "Data record")?;
                writeln!(self.out, "Segment type = 0x{segment_type:02x}")?;
                writeln!(self.out, "Record flags = 0x{flags:04x}")?;
                writeln!(self.out, "Record start address = 0x{start_address:08x}")?;
                writeln!(self.out, "Number of program bytes = {byte_count}")?;
                if self.opts.hide_program_bytes {
                    writeln!(self.out, "[Program bytes hidden]")
                } else {
                    write!(self.out, "Program bytes = ")?;
                    for b in payload {
                        write!(self.out, "0x{b:02x} ")?;
                    }
                    writeln!(self.out)
                }
            }
            Record::Entry { entry_address, segment_type } => {
                writeln!(self.out, "Entry record")?;
                writeln!(self.out, "Entry address = 0x{entry_address:08x}")?;
                writeln!(self.out, "Segment type = 0x{segment_type:02x}")
            }
            Record::End { checksum } => {
                writeln!(self.out, "End record")?;
                writeln!(self.out, "Checksum = 0x{checksum:08x}")
            }
        }
    }

    /// Notes bytes after the END record; prints nothing when there are none.
    pub fn trailing_bytes(&mut self, count: usize) -> io::Result<()> {
        if count == 0 {
            return Ok(());
        }
        writeln!(self.out)?;
        writeln!(self.out, "{count} byte(s) after end record")
    }

    pub fn checksum(&mut self, report: &ChecksumReport) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "----")?;
        writeln!(self.out, "Calculated checksum = 0x{:08x}", report.calculated)?;
        writeln!(self.out, "Embedded checksum = 0x{:08x}", report.embedded)?;
        if !report.trailing_agrees() {
            writeln!(self.out, "Trailing checksum bytes = 0x{:08x}", report.trailing)?;
        }
        let verdict = if report.matches { "OK" } else { "MISMATCH" };
        writeln!(self.out, "Checksum {verdict}")
    }

    /// Render an already decoded image in full.
    pub fn image(&mut self, image: &DecodedImage) -> io::Result<()> {
        self.file_size(image.file_size as u64)?;
        self.header(&image.header)?;
        for rec in &image.records {
            self.record(rec)?;
        }
        self.trailing_bytes(image.trailing_bytes)?;
        self.checksum(&image.checksum)
    }
}

/// Pretty-printed JSON document for `image`, newline terminated.
pub fn write_json<W: Write>(mut out: W, image: &DecodedImage) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, image)?;
    writeln!(out)
}
