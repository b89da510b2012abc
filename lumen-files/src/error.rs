//! Error types for file inspection

use thiserror::Error;

/// File inspection error types
#[derive(Error, Debug)]
pub enum FileError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {0}")]
    NotFound(String),

    /// Image header or pixel data could not be read
    #[error("Image error: {0}")]
    Image(String),

    /// Format not supported by the configured probe
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// No decoder is compiled in or configured.
    ///
    /// This is a setup problem, never a property of the inspected file.
    #[error("Corrupted image detection requires an image decoder, none is available")]
    DecoderUnavailable,
}

#[cfg(feature = "raster")]
impl From<::image::ImageError> for FileError {
    fn from(err: ::image::ImageError) -> Self {
        match err {
            ::image::ImageError::Unsupported(e) => FileError::UnsupportedFormat(e.to_string()),
            ::image::ImageError::IoError(e) => FileError::Io(e),
            other => FileError::Image(other.to_string()),
        }
    }
}

/// Result type for file operations
pub type FileResult<T> = Result<T, FileError>;
