//! Test-only image encoder.
#![allow(dead_code)]

use simread::Header;

pub fn encode_header(h: &Header) -> Vec<u8> {
    let mut v = Vec::with_capacity(14);
    v.extend_from_slice(&h.magic_number.to_be_bytes());
    v.extend_from_slice(&h.program_flags.to_be_bytes());
    v.extend_from_slice(&h.program_byte_count.to_be_bytes());
    v.extend_from_slice(&h.version.to_be_bytes());
    v
}

pub fn byte_sum(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |a, &b| a.wrapping_add(u32::from(b)))
}

pub struct ImageBuilder {
    buf: Vec<u8>,
}

impl ImageBuilder {
    pub fn new(header: Header) -> Self {
        Self { buf: encode_header(&header) }
    }

    pub fn data(mut self, segment_type: u8, flags: u16, start_address: u32, payload: &[u8]) -> Self {
        self.buf.push(0x01);
        self.buf.push(segment_type);
        self.buf.extend_from_slice(&flags.to_be_bytes());
        self.buf.extend_from_slice(&start_address.to_be_bytes());
        self.buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        self.buf.extend_from_slice(payload);
        self
    }

    pub fn entry(mut self, entry_address: u32, segment_type: u8) -> Self {
        self.buf.push(0x02);
        self.buf.extend_from_slice(&entry_address.to_be_bytes());
        self.buf.push(segment_type);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Terminate with an END record carrying `checksum` verbatim.
    pub fn end(mut self, checksum: u32) -> Vec<u8> {
        self.buf.push(0x03);
        self.buf.extend_from_slice(&checksum.to_be_bytes());
        self.buf
    }

    /// Terminate with an END record carrying the correct checksum.
    pub fn finish(mut self) -> Vec<u8> {
        self.buf.push(0x03);
        let checksum = byte_sum(&self.buf).wrapping_neg();
        self.buf.extend_from_slice(&checksum.to_be_bytes());
        self.buf
    }
}

pub fn header(magic_number: u32, program_byte_count: u32) -> Header {
    Header { magic_number, program_flags: 0, program_byte_count, version: 0x0100 }
}
