//! File inputs and image inspection for Lumen
//!
//! Provides the file-like input the validators work on and the
//! [`ImageInspector`], which classifies an input as SVG or raster and
//! extracts its intrinsic size:
//! - Content-based MIME sniffing with an extension fallback
//! - SVG size extraction from the root element's attributes or `viewBox`
//! - Raster header probing and full decoding through the `image` crate
//!   (feature `raster`, enabled by default)
//!
//! ## Quick Start
//!
//! ```rust
//! use lumen_files::{ImageInspector, ImageKind, ImageSource};
//!
//! let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="50" viewBox="0 0 50 80"></svg>"#;
//! let source = ImageSource::from_bytes(svg.to_vec(), "logo.svg");
//!
//! let inspector = ImageInspector::new();
//! assert_eq!(inspector.kind(&source), ImageKind::Svg);
//!
//! let size = inspector.extract(&source).unwrap();
//! assert_eq!((size.width(), size.height()), (50, 80));
//! ```

mod error;
mod inspect;
mod probe;
mod sniff;

#[cfg(feature = "raster")]
pub mod raster;

pub use error::*;
pub use inspect::*;
pub use probe::*;
pub use sniff::sniff_mime;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// MIME type of SVG documents.
pub const SVG_MIME: &str = "image/svg+xml";

/// File metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Original filename
    pub filename: String,
    /// MIME type
    pub mime_type: String,
    /// File size in bytes
    pub size: u64,
    /// File extension
    pub extension: Option<String>,
}

impl FileMetadata {
    /// Create metadata from a file path, guessing the MIME type from the extension
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        Self::from_filename(filename, 0)
    }

    /// Create metadata from bytes with a filename hint.
    ///
    /// The MIME type is sniffed from the content and only guessed from the
    /// filename when the content is not recognised.
    pub fn from_bytes(data: &[u8], filename: impl Into<String>) -> Self {
        let mut metadata = Self::from_filename(filename.into(), data.len() as u64);
        if let Some(sniffed) = sniff_mime(data) {
            metadata.mime_type = sniffed.to_string();
        }
        metadata
    }

    fn from_filename(filename: String, size: u64) -> Self {
        let extension = Path::new(&filename)
            .extension()
            .map(|s| s.to_string_lossy().to_lowercase());
        let mime_type = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .to_string();

        Self {
            filename,
            mime_type,
            size,
            extension,
        }
    }

    /// Parsed MIME type, if well-formed
    pub fn mime(&self) -> Option<mime::Mime> {
        self.mime_type.parse().ok()
    }

    /// Check if this is an image file
    pub fn is_image(&self) -> bool {
        self.mime()
            .is_some_and(|m| m.type_() == mime::IMAGE)
    }

    /// Check if this is an SVG document
    pub fn is_svg(&self) -> bool {
        self.mime()
            .is_some_and(|m| m.essence_str() == SVG_MIME)
    }
}

/// Whether an input is a vector or a raster image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    /// `image/svg+xml`; sized from markup, no intrinsic pixel grid
    Svg,
    /// Anything else; sized by a header probe
    Raster,
}

/// A file-like input: metadata, the raw bytes and, when it came from disk,
/// the path it was read from.
///
/// The content is read once on construction and owned by the source, so no
/// file handle outlives the constructor.
#[derive(Debug, Clone)]
pub struct ImageSource {
    metadata: FileMetadata,
    data: Bytes,
    path: Option<PathBuf>,
}

impl ImageSource {
    /// Read a file from disk
    pub fn open(path: impl AsRef<Path>) -> FileResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FileError::NotFound(path.display().to_string())
            } else {
                FileError::Io(e)
            }
        })?;

        let filename = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let metadata = FileMetadata::from_bytes(&data, filename);

        Ok(Self {
            metadata,
            data: Bytes::from(data),
            path: Some(path.to_path_buf()),
        })
    }

    /// Wrap in-memory content, e.g. an upload body
    pub fn from_bytes(data: impl Into<Bytes>, filename: impl Into<String>) -> Self {
        let data = data.into();
        let metadata = FileMetadata::from_bytes(&data, filename);
        Self {
            metadata,
            data,
            path: None,
        }
    }

    /// Override the detected MIME type with one reported by the caller
    /// (for instance the type recorded by an upload handler).
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.metadata.mime_type = mime_type.into();
        self
    }

    /// File metadata
    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    /// MIME type as detected or overridden
    pub fn mime_type(&self) -> &str {
        &self.metadata.mime_type
    }

    /// Raw content
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// Content as text, replacing invalid UTF-8 sequences
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Path the content was read from
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Whether the content is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Vector or raster, decided by MIME type alone
    pub fn kind(&self) -> ImageKind {
        if self.metadata.is_svg() {
            ImageKind::Svg
        } else {
            ImageKind::Raster
        }
    }
}
