//! Lumen CLI - check image files against upload rules.
//!
//! # Commands
//!
//! - `lumen check <FILES>...` - Validate files against a rule set
//! - `lumen inspect <FILES>...` - Show type, size and ratio of files
//! - `lumen completions <SHELL>` - Generate shell completions
//!
//! # Exit status
//!
//! - `0` - every file passed
//! - `1` - at least one file has violations (or, for `inspect`, an unknown size)
//! - `2` - the rule set, configuration or an input file could not be used

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::Colorize;
use std::io;
use std::path::PathBuf;

mod commands;
mod error;

use commands::{
    OutputFormat, check,
    check::{RuleOverrides, RuleSources},
    inspect,
};
use error::CliResult;

const EXIT_FAILED: i32 = 1;
const EXIT_ERROR: i32 = 2;

/// Lumen - image upload constraint checker
#[derive(Parser)]
#[command(name = "lumen")]
#[command(author = "Pegasus Heavy Industries LLC")]
#[command(version)]
#[command(about = "Check image files against dimension, ratio, orientation and corruption rules")]
#[command(long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = format!(
    "{}\n  {} lumen check --min-width 640 --max-ratio 1.78 photo.jpg\n  {} lumen check --config rules.toml --format json uploads/*.png\n  {} lumen inspect logo.svg",
    "Examples:".bright_cyan().bold(),
    "$".dimmed(),
    "$".dimmed(),
    "$".dimmed(),
))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate image files against a rule set
    #[command(alias = "c")]
    Check(CheckArgs),

    /// Show MIME type, kind and dimensions of image files
    #[command(alias = "i")]
    Inspect(InspectArgs),

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
struct CheckArgs {
    /// Files to validate
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Rule file (TOML, JSON or .env)
    #[arg(short, long, env = "LUMEN_CONFIG")]
    config: Option<PathBuf>,

    /// Read rules from LUMEN_IMAGE_* environment variables
    #[arg(long)]
    env: bool,

    /// Configuration section holding the image rules
    #[arg(long, default_value = "image")]
    section: String,

    /// Minimum width in pixels (raster only)
    #[arg(long)]
    min_width: Option<u64>,

    /// Maximum width in pixels (raster only)
    #[arg(long)]
    max_width: Option<u64>,

    /// Minimum height in pixels (raster only)
    #[arg(long)]
    min_height: Option<u64>,

    /// Maximum height in pixels (raster only)
    #[arg(long)]
    max_height: Option<u64>,

    /// Minimum width x height (raster only)
    #[arg(long)]
    min_pixels: Option<u64>,

    /// Maximum width x height (raster only)
    #[arg(long)]
    max_pixels: Option<u64>,

    /// Minimum width / height ratio
    #[arg(long)]
    min_ratio: Option<f64>,

    /// Maximum width / height ratio
    #[arg(long)]
    max_ratio: Option<f64>,

    /// Reject square images
    #[arg(long)]
    deny_square: bool,

    /// Reject landscape images
    #[arg(long)]
    deny_landscape: bool,

    /// Reject portrait images
    #[arg(long)]
    deny_portrait: bool,

    /// Fully decode raster images to detect corruption
    #[arg(long)]
    detect_corrupted: bool,

    /// Maximum file size in bytes
    #[arg(long)]
    max_size: Option<u64>,

    /// Accepted MIME types, e.g. image/png,image/*
    #[arg(long, value_delimiter = ',')]
    mime_types: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl CheckArgs {
    fn sources(&self) -> RuleSources {
        RuleSources {
            config: self.config.clone(),
            env: self.env,
            section: self.section.clone(),
            overrides: RuleOverrides {
                min_width: self.min_width,
                max_width: self.max_width,
                min_height: self.min_height,
                max_height: self.max_height,
                min_pixels: self.min_pixels,
                max_pixels: self.max_pixels,
                min_ratio: self.min_ratio,
                max_ratio: self.max_ratio,
                deny_square: self.deny_square,
                deny_landscape: self.deny_landscape,
                deny_portrait: self.deny_portrait,
                detect_corrupted: self.detect_corrupted,
                max_size: self.max_size,
                mime_types: self.mime_types.clone(),
            },
        }
    }
}

#[derive(Args)]
struct InspectArgs {
    /// Files to inspect
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

fn main() {
    let cli = Cli::parse();

    // Handle color preferences
    if cli.no_color {
        colored::control::set_override(false);
    }
    if cli.verbose {
        lumen_log::set_level(lumen_log::Level::Debug);
    }

    let result: CliResult<bool> = match cli.command {
        Commands::Check(args) => check::run(&args.files, &args.sources(), args.format),
        Commands::Inspect(args) => inspect::run(&args.files, args.format),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "lumen", &mut io::stdout());
            Ok(true)
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(EXIT_FAILED),
        Err(e) => {
            eprintln!("\n  {} {}\n", "Error:".red().bold(), e);
            std::process::exit(EXIT_ERROR);
        }
    }
}
