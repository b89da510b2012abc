//! CLI command implementations.

pub mod check;
pub mod inspect;

use crate::error::{CliError, CliResult};
use lumen_files::{FileError, ImageSource};
use std::path::Path;

/// Read an input file, mapping failures to [`CliError::Input`].
pub fn open_source(path: &Path) -> CliResult<ImageSource> {
    ImageSource::open(path).map_err(|e| CliError::Input {
        path: path.display().to_string(),
        message: match e {
            FileError::NotFound(_) => "no such file".to_string(),
            other => other.to_string(),
        },
    })
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored when writing to a terminal
    Text,
    /// One JSON document on stdout
    Json,
}
