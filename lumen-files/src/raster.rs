//! Raster probes backed by the `image` crate
//!
//! [`ImageCrateProbe`] reads only the header to obtain the size;
//! [`ImageCrateDecoder`] decodes all pixel data and drops it, which is the
//! only reliable way to notice truncated or damaged files.

use crate::{DecodeProbe, Decoded, DimensionProbe, FileError, FileResult, ImageSource};
use image::ImageReader;
use std::io::Cursor;

/// Header-only size probe
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateProbe;

impl DimensionProbe for ImageCrateProbe {
    fn probe(&self, source: &ImageSource) -> FileResult<(u32, u32)> {
        let reader = ImageReader::new(Cursor::new(source.bytes().as_ref())).with_guessed_format()?;

        if reader.format().is_none() {
            return Err(FileError::UnsupportedFormat(source.mime_type().to_string()));
        }

        Ok(reader.into_dimensions()?)
    }

    fn name(&self) -> &'static str {
        "image-header"
    }
}

/// Full decoder used for corruption detection
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateDecoder;

impl DecodeProbe for ImageCrateDecoder {
    fn decode(&self, data: &[u8]) -> FileResult<Decoded> {
        let reader = match ImageReader::new(Cursor::new(data)).with_guessed_format() {
            Ok(reader) => reader,
            Err(e) => return Ok(Decoded::Corrupted(e.to_string())),
        };

        if reader.format().is_none() {
            return Ok(Decoded::Corrupted("unrecognised image format".to_string()));
        }

        // The decoded buffer is dropped before returning.
        match reader.decode() {
            Ok(_) => Ok(Decoded::Intact),
            Err(e) => Ok(Decoded::Corrupted(e.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "image-decode"
    }
}
