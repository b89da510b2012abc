//! Image upload validation for Lumen
//!
//! Checks a file-like input against an [`ImageConstraint`] and reports one
//! [`Violation`] per failed rule, in a fixed order:
//!
//! 1. Generic file checks ([`FileValidator`]): empty file, size limit, MIME type
//! 2. Size extraction through [`lumen_files::ImageInspector`]
//! 3. The dimension rule table ([`RULES`], walked by [`ImageRuleEvaluator`])
//! 4. Corruption detection for raster images, when enabled
//!
//! Some rules stop the evaluation when they fail (minimum/maximum width,
//! minimum height, unknown size, corruption); the others let it continue.
//! Malformed thresholds and a missing decoder are reported as
//! [`ValidatorError`]s, never as violations.
//!
//! # Examples
//!
//! ## Validating an upload
//!
//! ```
//! use lumen_files::ImageSource;
//! use lumen_validation::{ConstraintValidator, ImageConstraint, ImageValidator, ViolationCode};
//!
//! let upload = ImageSource::from_bytes(
//!     &br#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100"></svg>"#[..],
//!     "avatar.svg",
//! );
//!
//! let constraint = ImageConstraint::new()
//!     .min_width(500) // raster only, ignored for SVG
//!     .allow_square(false);
//!
//! let violations = ImageValidator::new().validate(Some(&upload), &constraint).unwrap();
//! assert_eq!(violations.codes(), vec![ViolationCode::SquareNotAllowed]);
//!
//! for violation in &violations {
//!     println!("{}", violation.render());
//! }
//! ```
//!
//! ## Evaluating known dimensions
//!
//! ```
//! use lumen_files::{Dimensions, ImageKind};
//! use lumen_validation::{ImageConstraint, ImageRuleEvaluator, ViolationCode};
//!
//! let constraint = ImageConstraint::new().max_height(600).min_ratio(1.5);
//! let violations = ImageRuleEvaluator::new()
//!     .evaluate_constraint(Dimensions::new(800, 800), ImageKind::Raster, &constraint)
//!     .unwrap();
//!
//! let codes: Vec<_> = violations.iter().map(|v| v.code).collect();
//! assert_eq!(codes, vec![ViolationCode::TooHigh, ViolationCode::RatioTooSmall]);
//! ```

mod constraint;
mod errors;
mod rules;
mod traits;
mod validators;

pub use constraint::*;
pub use errors::*;
pub use rules::*;
pub use traits::*;
pub use validators::*;
