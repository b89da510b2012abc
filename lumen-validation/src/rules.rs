// Image rule table and evaluator

use crate::{
    ImageConstraint, ImageMessages, ResolvedRules, ValidatorResult, Violation, ViolationCode,
};
use lumen_files::{Dimensions, ImageKind, Orientation};
use lumen_log::debug;

/// What happens after a rule fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep evaluating the following rules
    Continue,
    /// Return the violations collected so far
    Stop,
}

/// Kinds of image a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    RasterOnly,
    Any,
}

impl Scope {
    fn includes(self, kind: ImageKind) -> bool {
        match self {
            Scope::RasterOnly => kind == ImageKind::Raster,
            Scope::Any => true,
        }
    }
}

type Check = fn(&ResolvedRules, &Dimensions, &ImageMessages) -> Option<Violation>;

/// One row of the rule table
#[derive(Clone, Copy)]
pub struct Rule {
    pub code: ViolationCode,
    pub scope: Scope,
    pub flow: Flow,
    check: Check,
}

impl Rule {
    /// Run the check; `None` when the rule passes or is not configured
    pub fn check(
        &self,
        rules: &ResolvedRules,
        size: &Dimensions,
        messages: &ImageMessages,
    ) -> Option<Violation> {
        (self.check)(rules, size, messages)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("code", &self.code)
            .field("scope", &self.scope)
            .field("flow", &self.flow)
            .finish()
    }
}

/// Dimension rules in evaluation order.
///
/// Corruption detection needs the raw content and is run by
/// [`ImageValidator`](crate::ImageValidator) after this table.
#[rustfmt::skip]
pub static RULES: [Rule; 11] = [
    Rule { code: ViolationCode::TooNarrow, scope: Scope::RasterOnly, flow: Flow::Stop, check: too_narrow },
    Rule { code: ViolationCode::TooWide, scope: Scope::RasterOnly, flow: Flow::Stop, check: too_wide },
    Rule { code: ViolationCode::TooLow, scope: Scope::RasterOnly, flow: Flow::Stop, check: too_low },
    Rule { code: ViolationCode::TooHigh, scope: Scope::RasterOnly, flow: Flow::Continue, check: too_high },
    Rule { code: ViolationCode::TooFewPixels, scope: Scope::RasterOnly, flow: Flow::Continue, check: too_few_pixels },
    Rule { code: ViolationCode::TooManyPixels, scope: Scope::RasterOnly, flow: Flow::Continue, check: too_many_pixels },
    Rule { code: ViolationCode::RatioTooSmall, scope: Scope::Any, flow: Flow::Continue, check: ratio_too_small },
    Rule { code: ViolationCode::RatioTooBig, scope: Scope::Any, flow: Flow::Continue, check: ratio_too_big },
    Rule { code: ViolationCode::SquareNotAllowed, scope: Scope::Any, flow: Flow::Continue, check: square },
    Rule { code: ViolationCode::LandscapeNotAllowed, scope: Scope::Any, flow: Flow::Continue, check: landscape },
    Rule { code: ViolationCode::PortraitNotAllowed, scope: Scope::Any, flow: Flow::Continue, check: portrait },
];

fn too_narrow(r: &ResolvedRules, d: &Dimensions, m: &ImageMessages) -> Option<Violation> {
    let min = r.min_width?;
    (u64::from(d.width()) < min).then(|| {
        Violation::new(ViolationCode::TooNarrow, &m.min_width)
            .with_parameter("width", d.width())
            .with_parameter("min_width", min)
    })
}

fn too_wide(r: &ResolvedRules, d: &Dimensions, m: &ImageMessages) -> Option<Violation> {
    let max = r.max_width?;
    (u64::from(d.width()) > max).then(|| {
        Violation::new(ViolationCode::TooWide, &m.max_width)
            .with_parameter("width", d.width())
            .with_parameter("max_width", max)
    })
}

fn too_low(r: &ResolvedRules, d: &Dimensions, m: &ImageMessages) -> Option<Violation> {
    let min = r.min_height?;
    (u64::from(d.height()) < min).then(|| {
        Violation::new(ViolationCode::TooLow, &m.min_height)
            .with_parameter("height", d.height())
            .with_parameter("min_height", min)
    })
}

fn too_high(r: &ResolvedRules, d: &Dimensions, m: &ImageMessages) -> Option<Violation> {
    let max = r.max_height?;
    (u64::from(d.height()) > max).then(|| {
        Violation::new(ViolationCode::TooHigh, &m.max_height)
            .with_parameter("height", d.height())
            .with_parameter("max_height", max)
    })
}

fn pixel_violation(code: ViolationCode, template: &str, d: &Dimensions) -> Violation {
    Violation::new(code, template)
        .with_parameter("pixels", d.pixels())
        .with_parameter("width", d.width())
        .with_parameter("height", d.height())
}

fn too_few_pixels(r: &ResolvedRules, d: &Dimensions, m: &ImageMessages) -> Option<Violation> {
    let min = r.min_pixels?;
    (d.pixels() < min).then(|| {
        pixel_violation(ViolationCode::TooFewPixels, &m.min_pixels, d)
            .with_parameter("min_pixels", min)
    })
}

fn too_many_pixels(r: &ResolvedRules, d: &Dimensions, m: &ImageMessages) -> Option<Violation> {
    let max = r.max_pixels?;
    (d.pixels() > max).then(|| {
        pixel_violation(ViolationCode::TooManyPixels, &m.max_pixels, d)
            .with_parameter("max_pixels", max)
    })
}

fn ratio_too_small(r: &ResolvedRules, d: &Dimensions, m: &ImageMessages) -> Option<Violation> {
    let min = r.min_ratio?;
    (d.ratio() < min).then(|| {
        Violation::new(ViolationCode::RatioTooSmall, &m.min_ratio)
            .with_parameter("ratio", d.ratio())
            .with_parameter("min_ratio", min)
    })
}

fn ratio_too_big(r: &ResolvedRules, d: &Dimensions, m: &ImageMessages) -> Option<Violation> {
    let max = r.max_ratio?;
    (d.ratio() > max).then(|| {
        Violation::new(ViolationCode::RatioTooBig, &m.max_ratio)
            .with_parameter("ratio", d.ratio())
            .with_parameter("max_ratio", max)
    })
}

fn orientation_violation(
    allowed: bool,
    wanted: Orientation,
    code: ViolationCode,
    template: &str,
    d: &Dimensions,
) -> Option<Violation> {
    (!allowed && d.orientation() == wanted).then(|| {
        Violation::new(code, template)
            .with_parameter("width", d.width())
            .with_parameter("height", d.height())
    })
}

fn square(r: &ResolvedRules, d: &Dimensions, m: &ImageMessages) -> Option<Violation> {
    orientation_violation(
        r.allow_square,
        Orientation::Square,
        ViolationCode::SquareNotAllowed,
        &m.allow_square,
        d,
    )
}

fn landscape(r: &ResolvedRules, d: &Dimensions, m: &ImageMessages) -> Option<Violation> {
    orientation_violation(
        r.allow_landscape,
        Orientation::Landscape,
        ViolationCode::LandscapeNotAllowed,
        &m.allow_landscape,
        d,
    )
}

fn portrait(r: &ResolvedRules, d: &Dimensions, m: &ImageMessages) -> Option<Violation> {
    orientation_violation(
        r.allow_portrait,
        Orientation::Portrait,
        ViolationCode::PortraitNotAllowed,
        &m.allow_portrait,
        d,
    )
}

/// Outcome of a rule pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Violations in rule order
    pub violations: Vec<Violation>,

    /// True when a stopping rule failed, or the size was unknown
    pub stopped: bool,
}

/// Walks [`RULES`] over extracted dimensions.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageRuleEvaluator;

impl ImageRuleEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate the dimension rules.
    ///
    /// `None` dimensions produce a single `SIZE_NOT_DETECTED` violation and a
    /// stopped evaluation.
    pub fn evaluate(
        &self,
        dimensions: Option<Dimensions>,
        kind: ImageKind,
        rules: &ResolvedRules,
        messages: &ImageMessages,
    ) -> Evaluation {
        let Some(size) = dimensions else {
            return Evaluation {
                violations: vec![Violation::new(
                    ViolationCode::SizeNotDetected,
                    &messages.size_not_detected,
                )],
                stopped: true,
            };
        };

        let mut violations = Vec::new();
        for rule in RULES.iter().filter(|rule| rule.scope.includes(kind)) {
            let Some(violation) = rule.check(rules, &size, messages) else {
                continue;
            };

            debug!(
                target: "lumen::rules",
                fields: { code = rule.code, size = size },
                "Rule failed"
            );
            violations.push(violation);

            if rule.flow == Flow::Stop {
                return Evaluation {
                    violations,
                    stopped: true,
                };
            }
        }

        Evaluation {
            violations,
            stopped: false,
        }
    }

    /// Resolve `constraint` and evaluate it in one step
    pub fn evaluate_constraint(
        &self,
        dimensions: Option<Dimensions>,
        kind: ImageKind,
        constraint: &ImageConstraint,
    ) -> ValidatorResult<Vec<Violation>> {
        let rules = constraint.resolve()?;
        Ok(self
            .evaluate(dimensions, kind, &rules, &constraint.messages)
            .violations)
    }
}
