//! Integration tests for lumen-validation

use image::{ImageBuffer, ImageFormat, Rgb};
use lumen_files::{ImageInspector, ImageSource};
use lumen_validation::*;
use std::io::Cursor;

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    // Noisy pixels so that truncation lands inside the image data
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 7) as u8, (y * 13) as u8, ((x * y) % 251) as u8])
    });
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
    buffer
}

fn png(width: u32, height: u32) -> ImageSource {
    ImageSource::from_bytes(encode(width, height, ImageFormat::Png), "upload.png")
}

fn svg(markup: &str) -> ImageSource {
    ImageSource::from_bytes(markup.as_bytes().to_vec(), "upload.svg")
}

fn validate(source: &ImageSource, constraint: &ImageConstraint) -> ViolationList {
    ImageValidator::new()
        .validate(Some(source), constraint)
        .unwrap()
}

#[test]
fn test_unrestricted_constraint_passes_anything() {
    let list = validate(&png(3, 3), &ImageConstraint::new());
    assert!(list.is_empty());

    // Not decodable, but nothing asks for its size
    let garbage = ImageSource::from_bytes(&b"GIF89a...."[..], "broken.gif");
    assert!(validate(&garbage, &ImageConstraint::new()).is_empty());
}

#[test]
fn test_unreadable_raster_is_size_not_detected() {
    let garbage = ImageSource::from_bytes(&b"GIF89a...."[..], "broken.gif");
    let constraint = ImageConstraint::new().min_width(10).max_ratio(2);

    let list = validate(&garbage, &constraint);
    assert_eq!(list.codes(), vec![ViolationCode::SizeNotDetected]);
    assert_eq!(
        list.iter().next().unwrap().render(),
        "The size of the image could not be detected."
    );
}

#[test]
fn test_too_narrow_stops_evaluation() {
    let constraint = ImageConstraint::new().min_width(100).max_height(10);
    let list = validate(&png(50, 40), &constraint);

    assert_eq!(list.codes(), vec![ViolationCode::TooNarrow]);
    let violation = list.iter().next().unwrap();
    assert_eq!(violation.parameter("width"), Some(&ParamValue::Integer(50)));
    assert_eq!(violation.parameter("min_width"), Some(&ParamValue::Integer(100)));
    assert_eq!(violation.parameters.len(), 2);
}

#[test]
fn test_too_high_then_too_few_pixels() {
    let constraint = ImageConstraint::new().max_height(100).min_pixels(100_000);
    let list = validate(&png(200, 150), &constraint);
    assert_eq!(
        list.codes(),
        vec![ViolationCode::TooHigh, ViolationCode::TooFewPixels]
    );
}

#[test]
fn test_ratio_too_big_for_raster_and_svg() {
    let constraint = ImageConstraint::new().max_ratio(2.0);

    for source in [png(300, 100), svg(r#"<svg width="300" height="100"></svg>"#)] {
        let list = validate(&source, &constraint);
        assert_eq!(list.codes(), vec![ViolationCode::RatioTooBig]);

        let violation = list.iter().next().unwrap();
        assert_eq!(violation.parameter("ratio"), Some(&ParamValue::Decimal(3.0)));
        assert_eq!(violation.parameter("max_ratio"), Some(&ParamValue::Decimal(2.0)));
        assert_eq!(
            violation.render(),
            "The image ratio is too big (3). Allowed maximum ratio is 2."
        );
    }
}

#[test]
fn test_square_not_allowed_with_passing_bounds() {
    let constraint = ImageConstraint::new()
        .min_width(50)
        .max_width(200)
        .min_pixels(100)
        .max_ratio(1.5)
        .allow_square(false);

    let list = validate(&png(100, 100), &constraint);
    assert_eq!(list.codes(), vec![ViolationCode::SquareNotAllowed]);
    assert_eq!(
        list.iter().next().unwrap().render(),
        "The image is square (100x100px). Square images are not allowed."
    );
}

#[test]
fn test_svg_view_box_fills_height() {
    let source =
        svg(r#"<svg xmlns="http://www.w3.org/2000/svg" width="50" viewBox="0 0 50 80"></svg>"#);
    let constraint = ImageConstraint::new().allow_portrait(false);

    let list = validate(&source, &constraint);
    assert_eq!(list.codes(), vec![ViolationCode::PortraitNotAllowed]);
    let violation = list.iter().next().unwrap();
    assert_eq!(violation.parameter("width"), Some(&ParamValue::Integer(50)));
    assert_eq!(violation.parameter("height"), Some(&ParamValue::Integer(80)));
}

#[test]
fn test_svg_without_size() {
    let source = svg(r#"<svg xmlns="http://www.w3.org/2000/svg"><rect/></svg>"#);
    let list = validate(&source, &ImageConstraint::new().allow_square(false));
    assert_eq!(list.codes(), vec![ViolationCode::SizeNotDetected]);
}

#[test]
fn test_corrupted_png_detected() {
    let mut data = encode(64, 64, ImageFormat::Png);
    data.truncate(data.len() / 2);
    let source = ImageSource::from_bytes(data, "half.png");

    let list = validate(&source, &ImageConstraint::new().detect_corrupted(true));
    assert_eq!(list.codes(), vec![ViolationCode::CorruptedImage]);
}

#[test]
fn test_intact_gif_passes_corruption_check() {
    let source = ImageSource::from_bytes(encode(8, 6, ImageFormat::Gif), "small.gif");
    let constraint = ImageConstraint::new()
        .detect_corrupted(true)
        .allow_portrait(false);
    assert!(validate(&source, &constraint).is_empty());
}

#[test]
fn test_missing_decoder_is_fatal() {
    let validator = ImageValidator::with_inspector(ImageInspector::new().without_decoder());
    let constraint = ImageConstraint::new().detect_corrupted(true);
    let result = validator.validate(Some(&png(4, 4)), &constraint);
    assert!(matches!(result, Err(ValidatorError::DecoderUnavailable)));
}

#[test]
fn test_file_checks_run_first() {
    let constraint = ImageConstraint::new().min_width(1).file(FileConstraint {
        max_size: Some(10),
        ..FileConstraint::images()
    });

    let list = validate(&png(20, 20), &constraint);
    assert_eq!(list.codes(), vec![ViolationCode::TooLarge]);

    let empty = ImageSource::from_bytes(Vec::<u8>::new(), "empty.png");
    assert_eq!(
        validate(&empty, &constraint).codes(),
        vec![ViolationCode::EmptyFile]
    );
}

#[test]
fn test_html_page_with_inline_svg_is_rejected() {
    let page = ImageSource::from_bytes(
        br#"<!DOCTYPE html><html><body><svg width="10" height="20"></svg></body></html>"#
            .to_vec(),
        "page.html",
    );
    assert_eq!(page.mime_type(), "text/html");

    let list = validate(&page, &ImageConstraint::new().min_width(1));
    assert_eq!(list.codes(), vec![ViolationCode::InvalidMimeType]);

    // The extension does not rescue it
    let renamed = ImageSource::from_bytes(page.bytes().to_vec(), "page.svg");
    assert_eq!(
        validate(&renamed, &ImageConstraint::new().min_width(1)).codes(),
        vec![ViolationCode::InvalidMimeType]
    );
}

#[test]
fn test_custom_messages() {
    let messages = ImageMessages {
        min_width: "Need {{ min_width }}px, got {{ width }}px".to_string(),
        ..ImageMessages::default()
    };
    let constraint = ImageConstraint::new().min_width(64).messages(messages);

    let list = validate(&png(32, 32), &constraint);
    assert_eq!(list.to_string(), "[TOO_NARROW] Need 64px, got 32px\n");
}

#[test]
fn test_constraint_from_toml() {
    let constraint: ImageConstraint = toml::from_str(
        r#"
        min_width = 10
        max_ratio = "1.0"
        allow_landscape = false

        [file]
        mime_types = ["image/png"]
        "#,
    )
    .unwrap();

    let list = validate(&png(30, 10), &constraint);
    assert_eq!(
        list.codes(),
        vec![ViolationCode::RatioTooBig, ViolationCode::LandscapeNotAllowed]
    );

    let gif = ImageSource::from_bytes(encode(30, 10, ImageFormat::Gif), "a.gif");
    assert_eq!(
        validate(&gif, &constraint).codes(),
        vec![ViolationCode::InvalidMimeType]
    );
}

#[test]
fn test_json_report() {
    let list = validate(&png(10, 20), &ImageConstraint::new().allow_portrait(false));
    let json = list.to_json();
    assert_eq!(json["violations"][0]["code"], "PORTRAIT_NOT_ALLOWED");
    assert_eq!(
        json["violations"][0]["message"],
        "The image is portrait oriented (10x20px). Portrait oriented images are not allowed."
    );
}
