//! Probe seams
//!
//! The inspector never talks to an image library directly. Header probing
//! and full decoding go through these traits so the raster backend can be
//! swapped or left out entirely.

use crate::{FileError, FileResult, ImageSource};

/// Reads the intrinsic size of a raster image, typically from its header.
pub trait DimensionProbe: Send + Sync {
    /// Return `(width, height)`, or an error when the size cannot be read.
    fn probe(&self, source: &ImageSource) -> FileResult<(u32, u32)>;

    /// Probe name for logging
    fn name(&self) -> &'static str;
}

/// Outcome of a full decode of one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// All pixel data decoded
    Intact,
    /// Decoding failed; carries the decoder's reason
    Corrupted(String),
}

impl Decoded {
    /// Whether the image decoded cleanly
    pub fn is_intact(&self) -> bool {
        matches!(self, Decoded::Intact)
    }
}

/// Fully decodes image content to detect corruption.
///
/// A per-image failure is reported as `Ok(Decoded::Corrupted(_))`.
/// `Err(FileError::DecoderUnavailable)` means the decoder itself cannot run.
pub trait DecodeProbe: Send + Sync {
    /// Decode `data` and discard the pixels
    fn decode(&self, data: &[u8]) -> FileResult<Decoded>;

    /// Probe name for logging
    fn name(&self) -> &'static str;
}

/// Probe used when no raster backend is compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedProbe;

impl DimensionProbe for UnsupportedProbe {
    fn probe(&self, source: &ImageSource) -> FileResult<(u32, u32)> {
        Err(FileError::UnsupportedFormat(source.mime_type().to_string()))
    }

    fn name(&self) -> &'static str {
        "unsupported"
    }
}
