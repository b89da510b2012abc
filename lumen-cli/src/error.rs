//! Error types for the Lumen CLI.

use std::fmt;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded or is malformed
    Config(String),

    /// An input file could not be read
    Input { path: String, message: String },

    /// A rule set could not be applied
    Validation(String),

    /// Output could not be serialized
    Output(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Input { path, message } => write!(f, "Cannot read {}: {}", path, message),
            CliError::Validation(msg) => write!(f, "Invalid rule set: {}", msg),
            CliError::Output(msg) => write!(f, "Output error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<lumen_config::ConfigError> for CliError {
    fn from(e: lumen_config::ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<lumen_validation::ValidatorError> for CliError {
    fn from(e: lumen_validation::ValidatorError) -> Self {
        CliError::Validation(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e.to_string())
    }
}
