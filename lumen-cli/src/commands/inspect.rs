//! Inspect command - print type and size of image files.

use colored::Colorize;
use lumen_files::{ImageInspector, Inspection};
use std::path::PathBuf;

use super::{OutputFormat, open_source};
use crate::error::CliResult;

/// Inspect every file. Returns `true` when every size was detected.
pub fn run(files: &[PathBuf], format: OutputFormat) -> CliResult<bool> {
    let inspector = ImageInspector::new();

    let mut inspections = Vec::with_capacity(files.len());
    for path in files {
        let source = open_source(path)?;
        inspections.push((path, source.size(), inspector.inspect(&source)));
    }

    match format {
        OutputFormat::Text => {
            for (path, size, inspection) in &inspections {
                println!("{}", path.display().to_string().bold());
                print_inspection(*size, inspection);
            }
        }
        OutputFormat::Json => {
            let files: Vec<_> = inspections
                .iter()
                .map(|(path, size, inspection)| {
                    serde_json::json!({
                        "file": path.display().to_string(),
                        "size": size,
                        "mime_type": inspection.mime_type,
                        "kind": inspection.kind,
                        "dimensions": inspection.dimensions,
                        "pixels": inspection.dimensions.map(|d| d.pixels()),
                        "ratio": inspection.dimensions.map(|d| d.ratio()),
                        "orientation": inspection.dimensions.map(|d| d.orientation()),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&files)?);
        }
    }

    Ok(inspections.iter().all(|(_, _, i)| i.dimensions.is_some()))
}

fn print_inspection(size: u64, inspection: &Inspection) {
    println!("  {} {}", "Type:".bright_white(), inspection.mime_type);
    println!("  {} {:?}", "Kind:".bright_white(), inspection.kind);
    println!("  {} {} bytes", "Size:".bright_white(), size);

    match inspection.dimensions {
        Some(d) => {
            println!("  {} {}px", "Dimensions:".bright_white(), d);
            println!("  {} {}", "Pixels:".bright_white(), d.pixels());
            println!(
                "  {} {} ({:?})",
                "Ratio:".bright_white(),
                d.ratio(),
                d.orientation()
            );
        }
        None => println!("  {} {}", "Dimensions:".bright_white(), "not detected".yellow()),
    }
}
