// Violations and validator errors

use lumen_files::FileError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{ ?([a-z_]+) ?\}\}").unwrap());

/// Machine-readable reason for a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    /// The file has no content
    EmptyFile,
    /// The file exceeds the size limit
    TooLarge,
    /// The MIME type is not accepted
    InvalidMimeType,
    /// Width/height could not be determined
    SizeNotDetected,
    TooWide,
    TooNarrow,
    TooHigh,
    TooLow,
    TooFewPixels,
    TooManyPixels,
    RatioTooBig,
    RatioTooSmall,
    SquareNotAllowed,
    LandscapeNotAllowed,
    PortraitNotAllowed,
    /// Full decoding failed
    CorruptedImage,
}

impl ViolationCode {
    /// Stable code string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyFile => "EMPTY_FILE",
            Self::TooLarge => "TOO_LARGE",
            Self::InvalidMimeType => "INVALID_MIME_TYPE",
            Self::SizeNotDetected => "SIZE_NOT_DETECTED",
            Self::TooWide => "TOO_WIDE",
            Self::TooNarrow => "TOO_NARROW",
            Self::TooHigh => "TOO_HIGH",
            Self::TooLow => "TOO_LOW",
            Self::TooFewPixels => "TOO_FEW_PIXELS",
            Self::TooManyPixels => "TOO_MANY_PIXELS",
            Self::RatioTooBig => "RATIO_TOO_BIG",
            Self::RatioTooSmall => "RATIO_TOO_SMALL",
            Self::SquareNotAllowed => "SQUARE_NOT_ALLOWED",
            Self::LandscapeNotAllowed => "LANDSCAPE_NOT_ALLOWED",
            Self::PortraitNotAllowed => "PORTRAIT_NOT_ALLOWED",
            Self::CorruptedImage => "CORRUPTED_IMAGE",
        }
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value substituted into a message placeholder
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Integer(u64),
    Decimal(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Integer(v) => write!(f, "{}", v),
            ParamValue::Decimal(v) => write!(f, "{}", v),
            ParamValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Integer(u64::from(value))
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Decimal(value)
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// One failed rule.
///
/// Carries the message template untouched; [`Violation::render`] fills in
/// the `{{ name }}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Rule that failed
    pub code: ViolationCode,

    /// Message template
    pub message: String,

    /// Placeholder values, keyed by name without braces
    pub parameters: BTreeMap<String, ParamValue>,
}

impl Violation {
    /// Create a violation without parameters
    pub fn new(code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Set a placeholder value
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Look up a placeholder value
    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    /// Message with placeholders substituted. Unknown placeholders are kept.
    pub fn render(&self) -> String {
        PLACEHOLDER
            .replace_all(&self.message, |caps: &Captures<'_>| match self.parameters.get(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.render())
    }
}

/// Ordered collection of violations
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ViolationList {
    violations: Vec<Violation>,
}

impl ViolationList {
    /// Create a violation list
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Check if there are any violations
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Get the number of violations
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Add a violation
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Iterate in evaluation order
    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    /// Codes in evaluation order
    pub fn codes(&self) -> Vec<ViolationCode> {
        self.violations.iter().map(|v| v.code).collect()
    }

    /// Whether a violation with `code` is present
    pub fn has_code(&self, code: ViolationCode) -> bool {
        self.violations.iter().any(|v| v.code == code)
    }

    /// Unwrap into the underlying vector
    pub fn into_vec(self) -> Vec<Violation> {
        self.violations
    }

    /// Convert to JSON representation
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "violations": self.violations.iter().map(|v| {
                serde_json::json!({
                    "code": v.code,
                    "message": v.render(),
                    "parameters": v.parameters,
                })
            }).collect::<Vec<_>>()
        })
    }
}

impl fmt::Display for ViolationList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for violation in &self.violations {
            writeln!(f, "{}", violation)?;
        }
        Ok(())
    }
}

impl From<Vec<Violation>> for ViolationList {
    fn from(violations: Vec<Violation>) -> Self {
        Self::new(violations)
    }
}

impl IntoIterator for ViolationList {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl<'a> IntoIterator for &'a ViolationList {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

/// Fatal problems with a constraint or the environment.
///
/// These are never turned into violations.
#[derive(Error, Debug)]
pub enum ValidatorError {
    /// A threshold is not a number of the expected shape
    #[error("\"{value}\" is not a valid {option}.")]
    InvalidThreshold { option: &'static str, value: String },

    /// Corruption detection was requested but no decoder can run
    #[error("Corrupted images detection requires an image decoder, none is available.")]
    DecoderUnavailable,

    /// The decoder failed for a reason unrelated to the image content
    #[error("File error: {0}")]
    File(FileError),
}

impl From<FileError> for ValidatorError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::DecoderUnavailable => ValidatorError::DecoderUnavailable,
            other => ValidatorError::File(other),
        }
    }
}

/// Result type for validator operations
pub type ValidatorResult<T> = Result<T, ValidatorError>;
