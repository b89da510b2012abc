// Built-in validators

use crate::{
    ConstraintValidator, FileConstraint, ImageConstraint, ImageRuleEvaluator, ValidatorError,
    ValidatorResult, Violation, ViolationCode, ViolationList,
};
use lumen_files::{Decoded, ImageInspector, ImageKind, ImageSource};
use lumen_log::{debug, info};
use mime::Mime;

/// Generic file checks: emptiness, size limit and accepted MIME types.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileValidator;

impl FileValidator {
    pub fn new() -> Self {
        Self
    }

    /// Whether `mime_type` matches one of `accepted`.
    ///
    /// `image/*` matches any `image/...` type. Parameters such as
    /// `; charset=utf-8` are ignored on both sides.
    pub fn accepts(mime_type: &str, accepted: &[String]) -> bool {
        if accepted.is_empty() {
            return true;
        }

        let Ok(actual) = mime_type.parse::<Mime>() else {
            return false;
        };

        accepted.iter().any(|pattern| match pattern.parse::<Mime>() {
            Ok(wanted) if wanted.subtype() == mime::STAR => wanted.type_() == actual.type_(),
            Ok(wanted) => wanted.essence_str() == actual.essence_str(),
            Err(_) => false,
        })
    }

    fn list_types(types: &[String]) -> String {
        types
            .iter()
            .map(|t| format!("\"{}\"", t))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl ConstraintValidator for FileValidator {
    type Constraint = FileConstraint;

    fn validate(
        &self,
        source: Option<&ImageSource>,
        constraint: &FileConstraint,
    ) -> ValidatorResult<ViolationList> {
        let mut violations = ViolationList::default();
        let Some(source) = source else {
            return Ok(violations);
        };
        let messages = &constraint.messages;

        if source.is_empty() {
            violations.push(Violation::new(ViolationCode::EmptyFile, &messages.empty));
            return Ok(violations);
        }

        if let Some(limit) = constraint.max_size
            && source.size() > limit
        {
            violations.push(
                Violation::new(ViolationCode::TooLarge, &messages.max_size)
                    .with_parameter("size", source.size())
                    .with_parameter("limit", limit),
            );
            return Ok(violations);
        }

        if !Self::accepts(source.mime_type(), &constraint.mime_types) {
            violations.push(
                Violation::new(ViolationCode::InvalidMimeType, &messages.mime_types)
                    .with_parameter("type", format!("\"{}\"", source.mime_type()))
                    .with_parameter("types", Self::list_types(&constraint.mime_types)),
            );
        }

        Ok(violations)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Image upload validator.
///
/// Runs the [`FileValidator`] checks first, then extracts the image size and
/// evaluates the dimension rules, and finally, when requested, decodes raster
/// images to detect corruption.
///
/// # Example
///
/// ```
/// use lumen_files::ImageSource;
/// use lumen_validation::{ConstraintValidator, ImageConstraint, ImageValidator, ViolationCode};
///
/// let source = ImageSource::from_bytes(
///     &br#"<svg width="400" height="100"></svg>"#[..],
///     "banner.svg",
/// );
/// let constraint = ImageConstraint::new().max_ratio(2.5);
///
/// let violations = ImageValidator::new()
///     .validate(Some(&source), &constraint)
///     .unwrap();
/// assert_eq!(violations.codes(), vec![ViolationCode::RatioTooBig]);
/// ```
#[derive(Debug, Default)]
pub struct ImageValidator {
    inspector: ImageInspector,
    files: FileValidator,
    evaluator: ImageRuleEvaluator,
}

impl ImageValidator {
    /// Validator with the default inspector
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator using a specific inspector
    pub fn with_inspector(inspector: ImageInspector) -> Self {
        Self {
            inspector,
            files: FileValidator,
            evaluator: ImageRuleEvaluator,
        }
    }

    pub fn inspector(&self) -> &ImageInspector {
        &self.inspector
    }
}

impl ConstraintValidator for ImageValidator {
    type Constraint = ImageConstraint;

    fn validate(
        &self,
        source: Option<&ImageSource>,
        constraint: &ImageConstraint,
    ) -> ValidatorResult<ViolationList> {
        let Some(source) = source else {
            return Ok(ViolationList::default());
        };

        let file_violations = self.files.validate(Some(source), &constraint.file)?;
        if !file_violations.is_empty() {
            debug!(
                target: "lumen::validator",
                fields: { count = file_violations.len() },
                "File checks failed, skipping image rules"
            );
            return Ok(file_violations);
        }

        if constraint.is_unrestricted() {
            return Ok(ViolationList::default());
        }

        let rules = constraint.resolve()?;
        let kind = self.inspector.kind(source);

        if rules.detect_corrupted && kind == ImageKind::Raster && !self.inspector.has_decoder() {
            return Err(ValidatorError::DecoderUnavailable);
        }

        let dimensions = self.inspector.extract(source);
        let evaluation = self
            .evaluator
            .evaluate(dimensions, kind, &rules, &constraint.messages);
        let mut violations = ViolationList::from(evaluation.violations);

        if !evaluation.stopped
            && rules.detect_corrupted
            && kind == ImageKind::Raster
            && let Decoded::Corrupted(reason) = self.inspector.check_integrity(source)?
        {
            info!(
                target: "lumen::validator",
                fields: { file = source.metadata().filename },
                "Corrupted image: {}", reason
            );
            violations.push(Violation::new(
                ViolationCode::CorruptedImage,
                &constraint.messages.corrupted,
            ));
        }

        debug!(
            target: "lumen::validator",
            fields: { file = source.metadata().filename, violations = violations.len() },
            "Image validated"
        );
        Ok(violations)
    }

    fn name(&self) -> &'static str {
        "image"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_files::{DimensionProbe, FileResult};

    struct FixedProbe(u32, u32);

    impl DimensionProbe for FixedProbe {
        fn probe(&self, _source: &ImageSource) -> FileResult<(u32, u32)> {
            Ok((self.0, self.1))
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct PanicProbe;

    impl DimensionProbe for PanicProbe {
        fn probe(&self, _source: &ImageSource) -> FileResult<(u32, u32)> {
            panic!("inspector must not run");
        }

        fn name(&self) -> &'static str {
            "panic"
        }
    }

    struct Verdict(bool);

    impl lumen_files::DecodeProbe for Verdict {
        fn decode(&self, _data: &[u8]) -> FileResult<Decoded> {
            Ok(if self.0 {
                Decoded::Intact
            } else {
                Decoded::Corrupted("bad huffman table".into())
            })
        }

        fn name(&self) -> &'static str {
            "verdict"
        }
    }

    fn png_source() -> ImageSource {
        ImageSource::from_bytes(&b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"[..], "a.png")
    }

    #[test]
    fn test_mime_wildcards() {
        let images = vec!["image/*".to_string()];
        assert!(FileValidator::accepts("image/png", &images));
        assert!(FileValidator::accepts("image/svg+xml; charset=utf-8", &images));
        assert!(!FileValidator::accepts("text/plain", &images));

        let exact = vec!["image/png".to_string(), "image/gif".to_string()];
        assert!(FileValidator::accepts("image/gif", &exact));
        assert!(!FileValidator::accepts("image/jpeg", &exact));

        assert!(FileValidator::accepts("application/pdf", &[]));
    }

    #[test]
    fn test_file_checks() {
        let empty = ImageSource::from_bytes(Vec::<u8>::new(), "a.png");
        let list = FileValidator
            .validate(Some(&empty), &FileConstraint::images())
            .unwrap();
        assert_eq!(list.codes(), vec![ViolationCode::EmptyFile]);

        let constraint = FileConstraint {
            max_size: Some(4),
            ..FileConstraint::images()
        };
        let list = FileValidator.validate(Some(&png_source()), &constraint).unwrap();
        assert_eq!(list.codes(), vec![ViolationCode::TooLarge]);

        let text = ImageSource::from_bytes(&b"hello"[..], "a.txt");
        let list = FileValidator
            .validate(Some(&text), &FileConstraint::images())
            .unwrap();
        let violation = list.iter().next().unwrap();
        assert_eq!(violation.code, ViolationCode::InvalidMimeType);
        assert_eq!(
            violation.render(),
            "The mime type of the file is invalid (\"text/plain\"). Allowed mime types are \"image/*\"."
        );
    }

    #[test]
    fn test_absent_input() {
        let validator = ImageValidator::with_inspector(ImageInspector::with_probe(PanicProbe));
        let list = validator
            .validate(None, &ImageConstraint::new().min_width(10))
            .unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_unrestricted_never_inspects() {
        let validator = ImageValidator::with_inspector(ImageInspector::with_probe(PanicProbe));
        let list = validator
            .validate(Some(&png_source()), &ImageConstraint::new())
            .unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_file_failure_skips_image_rules() {
        let validator = ImageValidator::with_inspector(ImageInspector::with_probe(PanicProbe));
        let text = ImageSource::from_bytes(&b"hello"[..], "a.txt");
        let list = validator
            .validate(Some(&text), &ImageConstraint::new().min_width(10))
            .unwrap();
        assert_eq!(list.codes(), vec![ViolationCode::InvalidMimeType]);
    }

    #[test]
    fn test_corruption_appended_after_rules() {
        let inspector = ImageInspector::with_probe(FixedProbe(20, 10)).with_decoder(Verdict(false));
        let constraint = ImageConstraint::new()
            .allow_landscape(false)
            .detect_corrupted(true);
        let list = ImageValidator::with_inspector(inspector)
            .validate(Some(&png_source()), &constraint)
            .unwrap();
        assert_eq!(
            list.codes(),
            vec![ViolationCode::LandscapeNotAllowed, ViolationCode::CorruptedImage]
        );
    }

    #[test]
    fn test_corruption_skipped_after_stop() {
        let inspector = ImageInspector::with_probe(FixedProbe(20, 10)).with_decoder(Verdict(false));
        let constraint = ImageConstraint::new().min_width(100).detect_corrupted(true);
        let list = ImageValidator::with_inspector(inspector)
            .validate(Some(&png_source()), &constraint)
            .unwrap();
        assert_eq!(list.codes(), vec![ViolationCode::TooNarrow]);
    }

    #[test]
    fn test_intact_image_passes() {
        let inspector = ImageInspector::with_probe(FixedProbe(20, 10)).with_decoder(Verdict(true));
        let list = ImageValidator::with_inspector(inspector)
            .validate(Some(&png_source()), &ImageConstraint::new().detect_corrupted(true))
            .unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_missing_decoder_is_an_error() {
        let inspector = ImageInspector::with_probe(FixedProbe(20, 10));
        let result = ImageValidator::with_inspector(inspector)
            .validate(Some(&png_source()), &ImageConstraint::new().detect_corrupted(true));
        assert!(matches!(result, Err(ValidatorError::DecoderUnavailable)));
    }

    #[test]
    fn test_svg_never_decoded() {
        let svg = ImageSource::from_bytes(&br#"<svg width="10" height="10"></svg>"#[..], "a.svg");
        let validator = ImageValidator::with_inspector(ImageInspector::svg_only());
        let list = validator
            .validate(Some(&svg), &ImageConstraint::new().detect_corrupted(true))
            .unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_invalid_threshold_beats_violations() {
        let inspector = ImageInspector::with_probe(FixedProbe(1, 1));
        let constraint = ImageConstraint::new().min_width(100).max_ratio("square-ish");
        let result =
            ImageValidator::with_inspector(inspector).validate(Some(&png_source()), &constraint);
        assert!(matches!(
            result,
            Err(ValidatorError::InvalidThreshold { option: "maximum ratio", .. })
        ));
    }
}
