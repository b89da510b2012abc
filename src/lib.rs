// Lumen - image upload validation for Rust
//
// This library inspects uploaded files (SVG or raster), extracts their
// intrinsic size and checks it against width, height, pixel, ratio,
// orientation and corruption rules.

// Re-export the building blocks
pub use lumen_files;
pub use lumen_log;
pub use lumen_validation;

// Re-export optional crates
#[cfg(feature = "config")]
pub use lumen_config;

/// Validate a single source against a rule set with the default inspector.
///
/// ```
/// use lumen::prelude::*;
///
/// let markup = br#"<svg width="300" height="100"></svg>"#;
/// let upload = ImageSource::from_bytes(&markup[..], "wide.svg");
/// let violations = lumen::validate(&upload, &ImageConstraint::new().max_ratio(2)).unwrap();
/// assert!(violations.has_code(ViolationCode::RatioTooBig));
/// ```
pub fn validate(
    source: &lumen_files::ImageSource,
    constraint: &lumen_validation::ImageConstraint,
) -> lumen_validation::ValidatorResult<lumen_validation::ViolationList> {
    use lumen_validation::ConstraintValidator;

    lumen_validation::ImageValidator::new().validate(Some(source), constraint)
}

/// Load an image rule set from a configuration file, with
/// `LUMEN_IMAGE_*` environment variables taking precedence.
#[cfg(feature = "config")]
pub fn load_constraint(
    path: impl AsRef<std::path::Path>,
) -> lumen_config::Result<lumen_validation::ImageConstraint> {
    let mut manager = lumen_config::ConfigManager::new();
    manager.load_auto(path)?;
    manager.load_env_section("image", lumen_config::env::DEFAULT_PREFIX)?;
    manager.section("image")
}

// Prelude for common imports
pub mod prelude {
    pub use lumen_files::{
        DecodeProbe, Decoded, DimensionExtractor, DimensionProbe, Dimensions, ImageInspector,
        ImageKind, ImageSource, Orientation, SvgExtractor,
    };
    pub use lumen_validation::{
        ConstraintValidator, FileConstraint, FileValidator, ImageConstraint, ImageMessages,
        ImageRuleEvaluator, ImageValidator, ValidatorError, Violation, ViolationCode,
        ViolationList,
    };

    #[cfg(feature = "config")]
    pub use lumen_config::ConfigManager;
}
