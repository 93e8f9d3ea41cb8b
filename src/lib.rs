pub mod error;
pub mod header;
pub mod record;
pub mod stream;
pub mod checksum;
pub mod image;
pub mod render;

pub use error::{DecodeError, Stage};
pub use header::{Header, HEADER_SIZE};
pub use record::{DecodedRecord, Record, RecordTag};
pub use stream::{RecordStream, StreamState};
pub use checksum::ChecksumReport;
pub use image::{decode, DecodeOptions, DecodedImage, SimImage};
