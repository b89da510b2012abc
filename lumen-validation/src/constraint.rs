// Constraint definitions: thresholds, rule sets and message templates

use crate::{ValidatorError, ValidatorResult};
use lumen_files::round_ratio;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw threshold value as written in code or configuration.
///
/// Kept unparsed so that a malformed value loaded from a file or the
/// environment is reported as a [`ValidatorError`] when the constraint is
/// used rather than silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Threshold {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl Threshold {
    /// Non-negative integer reading; `None` if the value is not one
    pub fn as_count(&self) -> Option<u64> {
        match self {
            Threshold::Integer(v) => u64::try_from(*v).ok(),
            Threshold::Decimal(v) if v.is_finite() && *v >= 0.0 && v.fract() == 0.0 => {
                Some(*v as u64)
            }
            Threshold::Decimal(_) => None,
            Threshold::Text(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                s.parse().ok()
            }
            Threshold::Text(_) => None,
        }
    }

    /// Numeric reading; `None` if the value is not a finite number
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Threshold::Integer(v) => *v as f64,
            Threshold::Decimal(v) => *v,
            Threshold::Text(s) => s.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Integer(v) => write!(f, "{}", v),
            Threshold::Decimal(v) => write!(f, "{}", v),
            Threshold::Text(v) => f.write_str(v),
        }
    }
}

macro_rules! threshold_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Threshold {
            fn from(value: $ty) -> Self {
                Threshold::Integer(i64::from(value))
            }
        })*
    };
}

threshold_from_int!(i32, i64, u32);

impl From<u64> for Threshold {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(v) => Threshold::Integer(v),
            Err(_) => Threshold::Text(value.to_string()),
        }
    }
}

impl From<f64> for Threshold {
    fn from(value: f64) -> Self {
        Threshold::Decimal(value)
    }
}

impl From<&str> for Threshold {
    fn from(value: &str) -> Self {
        Threshold::Text(value.to_string())
    }
}

impl From<String> for Threshold {
    fn from(value: String) -> Self {
        Threshold::Text(value)
    }
}

/// Message templates for the image rules.
///
/// Placeholders use the `{{ name }}` syntax and are filled from the
/// violation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageMessages {
    pub size_not_detected: String,
    pub min_width: String,
    pub max_width: String,
    pub min_height: String,
    pub max_height: String,
    pub min_pixels: String,
    pub max_pixels: String,
    pub min_ratio: String,
    pub max_ratio: String,
    pub allow_square: String,
    pub allow_landscape: String,
    pub allow_portrait: String,
    pub corrupted: String,
}

impl Default for ImageMessages {
    fn default() -> Self {
        Self {
            size_not_detected: "The size of the image could not be detected.".into(),
            min_width: "The image width is too small ({{ width }}px). Minimum width expected is {{ min_width }}px.".into(),
            max_width: "The image width is too big ({{ width }}px). Allowed maximum width is {{ max_width }}px.".into(),
            min_height: "The image height is too small ({{ height }}px). Minimum height expected is {{ min_height }}px.".into(),
            max_height: "The image height is too big ({{ height }}px). Allowed maximum height is {{ max_height }}px.".into(),
            min_pixels: "The image has too few pixels ({{ pixels }} pixels). Minimum amount expected is {{ min_pixels }} pixels.".into(),
            max_pixels: "The image has too many pixels ({{ pixels }} pixels). Maximum amount expected is {{ max_pixels }} pixels.".into(),
            min_ratio: "The image ratio is too small ({{ ratio }}). Minimum ratio expected is {{ min_ratio }}.".into(),
            max_ratio: "The image ratio is too big ({{ ratio }}). Allowed maximum ratio is {{ max_ratio }}.".into(),
            allow_square: "The image is square ({{ width }}x{{ height }}px). Square images are not allowed.".into(),
            allow_landscape: "The image is landscape oriented ({{ width }}x{{ height }}px). Landscape oriented images are not allowed.".into(),
            allow_portrait: "The image is portrait oriented ({{ width }}x{{ height }}px). Portrait oriented images are not allowed.".into(),
            corrupted: "The image file is corrupted.".into(),
        }
    }
}

/// Message templates for the generic file checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMessages {
    pub empty: String,
    pub max_size: String,
    pub mime_types: String,
}

impl Default for FileMessages {
    fn default() -> Self {
        Self {
            empty: "An empty file is not allowed.".into(),
            max_size: "The file is too large ({{ size }} bytes). Allowed maximum size is {{ limit }} bytes.".into(),
            mime_types: "The mime type of the file is invalid ({{ type }}). Allowed mime types are {{ types }}.".into(),
        }
    }
}

/// Generic file checks that run before any image rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConstraint {
    /// Maximum size in bytes
    pub max_size: Option<u64>,

    /// Accepted MIME types; `type/*` matches a whole top-level type.
    /// Empty accepts anything.
    pub mime_types: Vec<String>,

    pub messages: FileMessages,
}

impl Default for FileConstraint {
    fn default() -> Self {
        Self {
            max_size: None,
            mime_types: Vec::new(),
            messages: FileMessages::default(),
        }
    }
}

impl FileConstraint {
    /// Constraint accepting any image type
    pub fn images() -> Self {
        Self {
            mime_types: vec!["image/*".to_string()],
            ..Self::default()
        }
    }
}

/// Rule set for an image upload.
///
/// Every bound is optional. Width, height and pixel bounds apply to raster
/// images only; ratio and orientation rules apply to SVG documents too.
///
/// # Example
///
/// ```
/// use lumen_validation::ImageConstraint;
///
/// let constraint = ImageConstraint::new()
///     .min_width(100)
///     .max_ratio(2.0)
///     .allow_portrait(false);
///
/// assert!(!constraint.is_unrestricted());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConstraint {
    pub min_width: Option<Threshold>,
    pub max_width: Option<Threshold>,
    pub min_height: Option<Threshold>,
    pub max_height: Option<Threshold>,
    pub min_pixels: Option<Threshold>,
    pub max_pixels: Option<Threshold>,
    pub min_ratio: Option<Threshold>,
    pub max_ratio: Option<Threshold>,
    pub allow_square: bool,
    pub allow_landscape: bool,
    pub allow_portrait: bool,
    pub detect_corrupted: bool,
    pub file: FileConstraint,
    pub messages: ImageMessages,
}

impl Default for ImageConstraint {
    fn default() -> Self {
        Self {
            min_width: None,
            max_width: None,
            min_height: None,
            max_height: None,
            min_pixels: None,
            max_pixels: None,
            min_ratio: None,
            max_ratio: None,
            allow_square: true,
            allow_landscape: true,
            allow_portrait: true,
            detect_corrupted: false,
            file: FileConstraint::images(),
            messages: ImageMessages::default(),
        }
    }
}

macro_rules! threshold_setters {
    ($($name:ident => $doc:literal),* $(,)?) => {
        $(
            #[doc = $doc]
            pub fn $name(mut self, value: impl Into<Threshold>) -> Self {
                self.$name = Some(value.into());
                self
            }
        )*
    };
}

impl ImageConstraint {
    /// Constraint with every rule unset and images of any type accepted
    pub fn new() -> Self {
        Self::default()
    }

    threshold_setters! {
        min_width => "Minimum width in pixels (raster only)",
        max_width => "Maximum width in pixels (raster only)",
        min_height => "Minimum height in pixels (raster only)",
        max_height => "Maximum height in pixels (raster only)",
        min_pixels => "Minimum `width * height` (raster only)",
        max_pixels => "Maximum `width * height` (raster only)",
        min_ratio => "Minimum `width / height`, compared at two decimals",
        max_ratio => "Maximum `width / height`, compared at two decimals",
    }

    pub fn allow_square(mut self, allow: bool) -> Self {
        self.allow_square = allow;
        self
    }

    pub fn allow_landscape(mut self, allow: bool) -> Self {
        self.allow_landscape = allow;
        self
    }

    pub fn allow_portrait(mut self, allow: bool) -> Self {
        self.allow_portrait = allow;
        self
    }

    /// Fully decode raster images to detect corruption
    pub fn detect_corrupted(mut self, detect: bool) -> Self {
        self.detect_corrupted = detect;
        self
    }

    /// Replace the generic file checks
    pub fn file(mut self, file: FileConstraint) -> Self {
        self.file = file;
        self
    }

    /// Replace the message templates
    pub fn messages(mut self, messages: ImageMessages) -> Self {
        self.messages = messages;
        self
    }

    /// True when no image rule can fail, so there is nothing to inspect.
    pub fn is_unrestricted(&self) -> bool {
        self.min_width.is_none()
            && self.max_width.is_none()
            && self.min_height.is_none()
            && self.max_height.is_none()
            && self.min_pixels.is_none()
            && self.max_pixels.is_none()
            && self.min_ratio.is_none()
            && self.max_ratio.is_none()
            && self.allow_square
            && self.allow_landscape
            && self.allow_portrait
            && !self.detect_corrupted
    }

    /// Check every threshold and convert the rule set to typed values.
    pub fn resolve(&self) -> ValidatorResult<ResolvedRules> {
        Ok(ResolvedRules {
            min_width: side_bound(&self.min_width, "minimum width")?,
            max_width: side_bound(&self.max_width, "maximum width")?,
            min_height: side_bound(&self.min_height, "minimum height")?,
            max_height: side_bound(&self.max_height, "maximum height")?,
            min_pixels: count(&self.min_pixels, "minimum amount of pixels")?,
            max_pixels: count(&self.max_pixels, "maximum amount of pixels")?,
            min_ratio: ratio(&self.min_ratio, "minimum ratio")?,
            max_ratio: ratio(&self.max_ratio, "maximum ratio")?,
            allow_square: self.allow_square,
            allow_landscape: self.allow_landscape,
            allow_portrait: self.allow_portrait,
            detect_corrupted: self.detect_corrupted,
        })
    }
}

fn invalid(option: &'static str, threshold: &Threshold) -> ValidatorError {
    ValidatorError::InvalidThreshold {
        option,
        value: threshold.to_string(),
    }
}

fn count(threshold: &Option<Threshold>, option: &'static str) -> ValidatorResult<Option<u64>> {
    threshold
        .as_ref()
        .map(|t| t.as_count().ok_or_else(|| invalid(option, t)))
        .transpose()
}

// A zero side bound is the same as no bound.
fn side_bound(threshold: &Option<Threshold>, option: &'static str) -> ValidatorResult<Option<u64>> {
    Ok(count(threshold, option)?.filter(|v| *v > 0))
}

fn ratio(threshold: &Option<Threshold>, option: &'static str) -> ValidatorResult<Option<f64>> {
    threshold
        .as_ref()
        .map(|t| t.as_number().map(round_ratio).ok_or_else(|| invalid(option, t)))
        .transpose()
}

/// A rule set whose thresholds have all been checked.
///
/// Ratio bounds are already rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResolvedRules {
    pub min_width: Option<u64>,
    pub max_width: Option<u64>,
    pub min_height: Option<u64>,
    pub max_height: Option<u64>,
    pub min_pixels: Option<u64>,
    pub max_pixels: Option<u64>,
    pub min_ratio: Option<f64>,
    pub max_ratio: Option<f64>,
    pub allow_square: bool,
    pub allow_landscape: bool,
    pub allow_portrait: bool,
    pub detect_corrupted: bool,
}
