// Validation traits

use crate::{ValidatorResult, ViolationList};
use lumen_files::ImageSource;

/// Trait for validators that check a file-like input against a constraint.
///
/// An absent input (`None`) is never a violation; requiring a file is the
/// caller's concern.
pub trait ConstraintValidator: Send + Sync {
    /// Rule set understood by this validator
    type Constraint;

    /// Validate the input, returning violations in evaluation order
    fn validate(
        &self,
        source: Option<&ImageSource>,
        constraint: &Self::Constraint,
    ) -> ValidatorResult<ViolationList>;

    /// Get validator name
    fn name(&self) -> &'static str;
}
