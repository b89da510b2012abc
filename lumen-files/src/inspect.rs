//! Image inspection
//!
//! Two extraction strategies share one contract, `extract(source) ->
//! Option<Dimensions>`:
//! - [`SvgExtractor`] pattern-matches the root `<svg>` element
//! - [`RasterExtractor`] asks a [`DimensionProbe`]
//!
//! [`ImageInspector`] picks the strategy from the source's [`ImageKind`].

use crate::{
    DecodeProbe, Decoded, DimensionProbe, FileError, FileResult, ImageKind, ImageSource,
    UnsupportedProbe,
};
use lumen_log::{debug, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use std::fmt;

static SVG_WIDTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<svg[^<>]+width="(?P<width>[0-9]+)"[^<>]*>"#).unwrap());

static SVG_HEIGHT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<svg[^<>]+height="(?P<height>[0-9]+)"[^<>]*>"#).unwrap());

static SVG_VIEW_BOX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<svg[^<>]+viewBox="-?[0-9]+ -?[0-9]+ (?P<width>-?[0-9]+) (?P<height>-?[0-9]+)"[^<>]*>"#,
    )
    .unwrap()
});

/// Round to two decimal places, half away from zero.
///
/// The scaled value is first cut to 15 significant digits so that decimal
/// halves such as `1.005` round up even though their binary form lies just
/// below the half.
pub fn round_ratio(value: f64) -> f64 {
    let scaled = value * 100.0;
    let pre_rounded = format!("{scaled:.14e}").parse::<f64>().unwrap_or(scaled);
    pre_rounded.round() / 100.0
}

/// Orientation of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Square,
    Landscape,
    Portrait,
}

/// Intrinsic size of an image. Both sides are always greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Dimensions {
    width: u32,
    height: u32,
}

impl Dimensions {
    /// Returns `None` when either side is zero
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    fn from_signed(width: i64, height: i64) -> Option<Self> {
        let width = u32::try_from(width).ok()?;
        let height = u32::try_from(height).ok()?;
        Self::new(width, height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `width * height`
    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// `width / height` rounded to two decimals, half away from zero.
    ///
    /// Computed in integer hundredths so exact halves never lose to float
    /// representation.
    pub fn ratio(&self) -> f64 {
        let (width, height) = (u64::from(self.width), u64::from(self.height));
        let hundredths = (200 * width + height) / (2 * height);
        hundredths as f64 / 100.0
    }

    pub fn orientation(&self) -> Orientation {
        match self.width.cmp(&self.height) {
            std::cmp::Ordering::Equal => Orientation::Square,
            std::cmp::Ordering::Greater => Orientation::Landscape,
            std::cmp::Ordering::Less => Orientation::Portrait,
        }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A strategy for reading the size of one kind of image.
pub trait DimensionExtractor: Send + Sync {
    /// `None` means the size could not be determined
    fn extract(&self, source: &ImageSource) -> Option<Dimensions>;
}

/// Reads the size of an SVG document from its markup.
///
/// Explicit `width`/`height` attributes on the root element win; a `viewBox`
/// fills in whichever of the two is missing. Units and percentages are not
/// understood, only plain integers.
#[derive(Debug, Default, Clone, Copy)]
pub struct SvgExtractor;

impl SvgExtractor {
    /// Extract dimensions from SVG text
    pub fn parse(markup: &str) -> Option<Dimensions> {
        let mut width = capture_number(SVG_WIDTH.captures(markup).as_ref(), "width");
        let mut height = capture_number(SVG_HEIGHT.captures(markup).as_ref(), "height");

        if width.is_none() || height.is_none() {
            let view_box = SVG_VIEW_BOX.captures(markup);
            width = width.or_else(|| capture_number(view_box.as_ref(), "width"));
            height = height.or_else(|| capture_number(view_box.as_ref(), "height"));
        }

        Dimensions::from_signed(width?, height?)
    }
}

fn capture_number(captures: Option<&Captures<'_>>, group: &str) -> Option<i64> {
    captures?
        .name(group)
        .and_then(|m| m.as_str().parse().ok())
}

impl DimensionExtractor for SvgExtractor {
    fn extract(&self, source: &ImageSource) -> Option<Dimensions> {
        Self::parse(&source.text())
    }
}

/// Reads the size of a raster image through a [`DimensionProbe`].
pub struct RasterExtractor {
    probe: Box<dyn DimensionProbe>,
}

impl RasterExtractor {
    pub fn new(probe: impl DimensionProbe + 'static) -> Self {
        Self {
            probe: Box::new(probe),
        }
    }
}

impl fmt::Debug for RasterExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterExtractor")
            .field("probe", &self.probe.name())
            .finish()
    }
}

impl DimensionExtractor for RasterExtractor {
    fn extract(&self, source: &ImageSource) -> Option<Dimensions> {
        match self.probe.probe(source) {
            Ok((width, height)) => Dimensions::new(width, height),
            Err(e) => {
                debug!(
                    target: "lumen::inspect",
                    fields: { probe = self.probe.name(), mime = source.mime_type() },
                    "Raster probe failed: {}", e
                );
                None
            }
        }
    }
}

/// Result of [`ImageInspector::inspect`]
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub mime_type: String,
    pub kind: ImageKind,
    pub dimensions: Option<Dimensions>,
}

/// Classifies inputs and extracts their size.
///
/// Holds configuration only, so a single inspector can be shared between
/// threads.
///
/// # Example
///
/// ```rust
/// use lumen_files::{ImageInspector, ImageSource};
///
/// let inspector = ImageInspector::new();
/// let source = ImageSource::from_bytes(&b"<svg viewBox=\"0 0 300 100\"></svg>"[..], "wide.svg");
/// let size = inspector.extract(&source).unwrap();
/// assert_eq!(size.ratio(), 3.0);
/// ```
pub struct ImageInspector {
    svg: SvgExtractor,
    raster: RasterExtractor,
    decoder: Option<Box<dyn DecodeProbe>>,
}

impl ImageInspector {
    /// Inspector with the default probes for the enabled features
    pub fn new() -> Self {
        #[cfg(feature = "raster")]
        {
            Self::with_probe(crate::raster::ImageCrateProbe)
                .with_decoder(crate::raster::ImageCrateDecoder)
        }
        #[cfg(not(feature = "raster"))]
        {
            Self::with_probe(UnsupportedProbe)
        }
    }

    /// Inspector using a custom raster size probe and no decoder
    pub fn with_probe(probe: impl DimensionProbe + 'static) -> Self {
        Self {
            svg: SvgExtractor,
            raster: RasterExtractor::new(probe),
            decoder: None,
        }
    }

    /// Inspector that cannot read raster images at all
    pub fn svg_only() -> Self {
        Self::with_probe(UnsupportedProbe)
    }

    /// Set the decoder used for corruption detection
    pub fn with_decoder(mut self, decoder: impl DecodeProbe + 'static) -> Self {
        self.decoder = Some(Box::new(decoder));
        self
    }

    /// Remove the decoder; corruption checks then fail with
    /// [`FileError::DecoderUnavailable`]
    pub fn without_decoder(mut self) -> Self {
        self.decoder = None;
        self
    }

    /// Whether a decoder is configured
    pub fn has_decoder(&self) -> bool {
        self.decoder.is_some()
    }

    /// Vector or raster
    pub fn kind(&self, source: &ImageSource) -> ImageKind {
        source.kind()
    }

    /// Extract the size, dispatching on the kind of image
    pub fn extract(&self, source: &ImageSource) -> Option<Dimensions> {
        let kind = self.kind(source);
        let extractor: &dyn DimensionExtractor = match kind {
            ImageKind::Svg => &self.svg,
            ImageKind::Raster => &self.raster,
        };

        let dimensions = extractor.extract(source);
        match dimensions {
            Some(size) => debug!(
                target: "lumen::inspect",
                fields: { kind = format!("{:?}", kind), size = size },
                "Dimensions extracted"
            ),
            None => warn!(
                target: "lumen::inspect",
                fields: { kind = format!("{:?}", kind), mime = source.mime_type() },
                "Image size could not be detected"
            ),
        }
        dimensions
    }

    /// Kind, MIME type and size in one pass
    pub fn inspect(&self, source: &ImageSource) -> Inspection {
        Inspection {
            mime_type: source.mime_type().to_string(),
            kind: self.kind(source),
            dimensions: self.extract(source),
        }
    }

    /// Fully decode the content to find corruption.
    pub fn check_integrity(&self, source: &ImageSource) -> FileResult<Decoded> {
        let decoder = self.decoder.as_ref().ok_or(FileError::DecoderUnavailable)?;
        let outcome = decoder.decode(source.bytes())?;
        if let Decoded::Corrupted(reason) = &outcome {
            debug!(
                target: "lumen::inspect",
                fields: { decoder = decoder.name() },
                "Decode failed: {}", reason
            );
        }
        Ok(outcome)
    }
}

impl Default for ImageInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ImageInspector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageInspector")
            .field("raster", &self.raster)
            .field("decoder", &self.decoder.as_ref().map(|d| d.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(markup: &str) -> Option<(u32, u32)> {
        SvgExtractor::parse(markup).map(|d| (d.width(), d.height()))
    }

    struct FixedProbe(u32, u32);

    impl DimensionProbe for FixedProbe {
        fn probe(&self, _source: &ImageSource) -> FileResult<(u32, u32)> {
            Ok((self.0, self.1))
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn test_svg_explicit_attributes() {
        assert_eq!(dims(r#"<svg width="120" height="40"></svg>"#), Some((120, 40)));
    }

    #[test]
    fn test_svg_view_box_fills_missing_height() {
        assert_eq!(
            dims(r#"<svg width="50" viewBox="0 0 50 80"></svg>"#),
            Some((50, 80))
        );
    }

    #[test]
    fn test_svg_attribute_wins_over_view_box() {
        assert_eq!(
            dims(r#"<svg width="10" height="20" viewBox="0 0 500 800"></svg>"#),
            Some((10, 20))
        );
        assert_eq!(
            dims(r#"<svg height="20" viewBox="-5 -5 500 800"></svg>"#),
            Some((500, 20))
        );
    }

    #[test]
    fn test_svg_without_size_fails() {
        assert_eq!(dims(r#"<svg xmlns="http://www.w3.org/2000/svg"></svg>"#), None);
        assert_eq!(dims(r#"<svg width="100%" height="50%"></svg>"#), None);
        assert_eq!(dims(r#"<svg width="30"></svg>"#), None);
    }

    #[test]
    fn test_svg_non_positive_view_box_fails() {
        assert_eq!(dims(r#"<svg viewBox="0 0 0 10"></svg>"#), None);
        assert_eq!(dims(r#"<svg viewBox="0 0 -10 10"></svg>"#), None);
    }

    #[test]
    fn test_dimensions_reject_zero() {
        assert!(Dimensions::new(0, 10).is_none());
        assert!(Dimensions::new(10, 0).is_none());
        assert!(Dimensions::new(1, 1).is_some());
    }

    #[test]
    fn test_derived_values() {
        let size = Dimensions::new(300, 100).unwrap();
        assert_eq!(size.pixels(), 30_000);
        assert_eq!(size.ratio(), 3.0);
        assert_eq!(size.orientation(), Orientation::Landscape);

        let size = Dimensions::new(2, 3).unwrap();
        assert_eq!(size.ratio(), 0.67);
        assert_eq!(size.orientation(), Orientation::Portrait);

        let big = Dimensions::new(u32::MAX, u32::MAX).unwrap();
        assert_eq!(big.pixels(), u64::from(u32::MAX) * u64::from(u32::MAX));
        assert_eq!(big.ratio(), 1.0);

        let tall = Dimensions::new(1, u32::MAX).unwrap();
        assert_eq!(tall.ratio(), 0.0);
    }

    #[test]
    fn test_ratio_rounds_exact_halves_up() {
        assert_eq!(Dimensions::new(201, 200).unwrap().ratio(), 1.01);
        assert_eq!(Dimensions::new(1, 8).unwrap().ratio(), 0.13);
        assert_eq!(Dimensions::new(199, 200).unwrap().ratio(), 1.0);
        assert_eq!(Dimensions::new(1999, 2000).unwrap().ratio(), 1.0);
    }

    #[test]
    fn test_round_ratio() {
        assert_eq!(round_ratio(1.333_333), 1.33);
        assert_eq!(round_ratio(1.666_666), 1.67);
        assert_eq!(round_ratio(2.0), 2.0);
        assert_eq!(round_ratio(1.005), 1.01);
        assert_eq!(round_ratio(1.004_999), 1.0);
        assert_eq!(round_ratio(0.125), 0.13);
    }

    #[test]
    fn test_inspector_dispatches_on_kind() {
        let inspector = ImageInspector::with_probe(FixedProbe(640, 480));

        let raster = ImageSource::from_bytes(&b"\x89PNG\r\n\x1a\n"[..], "a.png");
        assert_eq!(inspector.extract(&raster), Dimensions::new(640, 480));

        let svg = ImageSource::from_bytes(&br#"<svg width="5" height="6"/>"#[..], "b.svg");
        assert_eq!(inspector.extract(&svg), Dimensions::new(5, 6));
    }

    #[test]
    fn test_zero_from_probe_is_failure() {
        let inspector = ImageInspector::with_probe(FixedProbe(0, 480));
        let raster = ImageSource::from_bytes(&b"\x89PNG\r\n\x1a\n"[..], "a.png");
        assert_eq!(inspector.extract(&raster), None);
    }

    #[test]
    fn test_integrity_without_decoder() {
        let inspector = ImageInspector::svg_only();
        let source = ImageSource::from_bytes(&b"\x89PNG\r\n\x1a\n"[..], "a.png");
        assert!(matches!(
            inspector.check_integrity(&source),
            Err(FileError::DecoderUnavailable)
        ));
    }

    #[test]
    fn test_inspect_reports_kind() {
        let inspector = ImageInspector::svg_only();
        let svg = ImageSource::from_bytes(&br#"<svg width="5" height="6"/>"#[..], "b.svg");
        let inspection = inspector.inspect(&svg);
        assert_eq!(inspection.kind, ImageKind::Svg);
        assert_eq!(inspection.mime_type, "image/svg+xml");
        assert_eq!(inspection.dimensions, Dimensions::new(5, 6));
    }
}
