//! Check command - validate image files against a rule set.

use colored::Colorize;
use lumen_config::{ConfigManager, env::DEFAULT_PREFIX};
use lumen_log::debug;
use lumen_validation::{ConstraintValidator, ImageConstraint, ImageValidator, ViolationList};
use std::path::{Path, PathBuf};

use super::{OutputFormat, open_source};
use crate::error::CliResult;

/// Where the rule set comes from, lowest precedence first.
#[derive(Debug, Default)]
pub struct RuleSources {
    /// Configuration file (TOML, JSON or .env)
    pub config: Option<PathBuf>,
    /// Read `LUMEN_IMAGE_*` variables
    pub env: bool,
    /// Section holding the image rules
    pub section: String,
    /// Rules given on the command line
    pub overrides: RuleOverrides,
}

/// Rules given as command-line flags
#[derive(Debug, Default)]
pub struct RuleOverrides {
    pub min_width: Option<u64>,
    pub max_width: Option<u64>,
    pub min_height: Option<u64>,
    pub max_height: Option<u64>,
    pub min_pixels: Option<u64>,
    pub max_pixels: Option<u64>,
    pub min_ratio: Option<f64>,
    pub max_ratio: Option<f64>,
    pub deny_square: bool,
    pub deny_landscape: bool,
    pub deny_portrait: bool,
    pub detect_corrupted: bool,
    pub max_size: Option<u64>,
    pub mime_types: Vec<String>,
}

impl RuleOverrides {
    fn apply(&self, mut constraint: ImageConstraint) -> ImageConstraint {
        macro_rules! set {
            ($($field:ident),*) => {
                $(if let Some(value) = self.$field {
                    constraint.$field = Some(value.into());
                })*
            };
        }
        set!(
            min_width, max_width, min_height, max_height, min_pixels, max_pixels, min_ratio,
            max_ratio
        );

        if self.deny_square {
            constraint.allow_square = false;
        }
        if self.deny_landscape {
            constraint.allow_landscape = false;
        }
        if self.deny_portrait {
            constraint.allow_portrait = false;
        }
        if self.detect_corrupted {
            constraint.detect_corrupted = true;
        }
        if self.max_size.is_some() {
            constraint.file.max_size = self.max_size;
        }
        if !self.mime_types.is_empty() {
            constraint.file.mime_types = self.mime_types.clone();
        }
        constraint
    }
}

/// Build the rule set from configuration, environment and flags.
pub fn load_constraint(sources: &RuleSources) -> CliResult<ImageConstraint> {
    let mut manager = ConfigManager::new();

    if let Some(path) = &sources.config {
        manager.load_auto(path)?;
    }
    if sources.env {
        manager.load_env_section(&sources.section, DEFAULT_PREFIX)?;
    }

    let constraint: ImageConstraint = manager.section(&sources.section)?;
    let constraint = sources.overrides.apply(constraint);

    // Surface malformed thresholds before touching any file
    constraint.resolve()?;
    debug!(target: "lumen::cli", "Rule set: {:?}", constraint);
    Ok(constraint)
}

/// Validate every file. Returns `true` when all of them pass.
pub fn run(files: &[PathBuf], sources: &RuleSources, format: OutputFormat) -> CliResult<bool> {
    let constraint = load_constraint(sources)?;
    let validator = ImageValidator::new();

    let mut reports = Vec::with_capacity(files.len());
    for path in files {
        let source = open_source(path)?;
        let violations = validator.validate(Some(&source), &constraint)?;
        reports.push((path.as_path(), violations));
    }

    let passed = reports.iter().all(|(_, violations)| violations.is_empty());

    match format {
        OutputFormat::Text => print_text(&reports),
        OutputFormat::Json => print_json(&reports)?,
    }

    Ok(passed)
}

fn print_text(reports: &[(&Path, ViolationList)]) {
    for (path, violations) in reports {
        if violations.is_empty() {
            println!("{} {}", "PASS".green().bold(), path.display());
            continue;
        }

        println!("{} {}", "FAIL".red().bold(), path.display());
        for violation in violations {
            println!(
                "  {} {}",
                format!("[{}]", violation.code).yellow(),
                violation.render()
            );
        }
    }

    let failed = reports.iter().filter(|(_, v)| !v.is_empty()).count();
    println!();
    if failed == 0 {
        println!("{} {} file(s) checked", "✔".green(), reports.len());
    } else {
        println!(
            "{} {} of {} file(s) failed",
            "✘".red(),
            failed,
            reports.len()
        );
    }
}

fn print_json(reports: &[(&Path, ViolationList)]) -> CliResult<()> {
    let files: Vec<_> = reports
        .iter()
        .map(|(path, violations)| {
            serde_json::json!({
                "file": path.display().to_string(),
                "valid": violations.is_empty(),
                "violations": violations.to_json()["violations"],
            })
        })
        .collect();

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({ "files": files }))?
    );
    Ok(())
}
