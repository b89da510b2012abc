//! End-to-end tests for the `lumen` binary

use assert_cmd::Command;
use image::{ImageBuffer, ImageFormat, Rgb};
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn lumen() -> Command {
    let mut cmd = Command::cargo_bin("lumen").unwrap();
    cmd.env_remove("LUMEN_CONFIG").arg("--no-color");
    cmd
}

fn png(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.path().join(name);
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(width, height);
    img.save_with_format(&path, ImageFormat::Png).unwrap();
    path
}

#[test]
fn test_check_passes() {
    let dir = TempDir::new().unwrap();
    let file = png(&dir, "ok.png", 800, 600);

    lumen()
        .args(["check", "--min-width", "640"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("PASS"));
}

#[test]
fn test_check_reports_violations() {
    let dir = TempDir::new().unwrap();
    let file = png(&dir, "narrow.png", 50, 40);

    lumen()
        .args(["check", "--min-width", "100", "--max-height", "10"])
        .arg(&file)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAIL"))
        .stdout(predicate::str::contains("[TOO_NARROW]"))
        .stdout(predicate::str::contains("Minimum width expected is 100px."))
        .stdout(predicate::str::contains("TOO_HIGH").not());
}

#[test]
fn test_check_json_output() {
    let dir = TempDir::new().unwrap();
    let file = png(&dir, "square.png", 32, 32);

    let output = lumen()
        .args(["check", "--deny-square", "--format", "json"])
        .arg(&file)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["files"][0]["valid"], false);
    assert_eq!(
        report["files"][0]["violations"][0]["code"],
        "SQUARE_NOT_ALLOWED"
    );
}

#[test]
fn test_check_with_config_file() {
    let dir = TempDir::new().unwrap();
    let file = png(&dir, "wide.png", 300, 100);
    let config = dir.path().join("rules.toml");
    std::fs::write(&config, "[image]\nmax_ratio = 2.0\n").unwrap();

    lumen()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .arg(&file)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("RATIO_TOO_BIG"));
}

#[test]
fn test_malformed_config_threshold_exits_2() {
    let dir = TempDir::new().unwrap();
    let file = png(&dir, "a.png", 10, 10);
    let config = dir.path().join("rules.json");
    std::fs::write(&config, r#"{"image": {"min_width": "wide"}}"#).unwrap();

    lumen()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .arg(&file)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("is not a valid minimum width"));
}

#[test]
fn test_env_rules() {
    let dir = TempDir::new().unwrap();
    let file = png(&dir, "tall.png", 10, 40);

    lumen()
        .env("LUMEN_IMAGE_ALLOW_PORTRAIT", "false")
        .args(["check", "--env"])
        .arg(&file)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("PORTRAIT_NOT_ALLOWED"));
}

#[test]
fn test_missing_file_exits_2() {
    lumen()
        .args(["check", "--min-width", "1", "/definitely/not/here.png"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no such file"));
}

#[test]
fn test_inspect_svg() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("logo.svg");
    std::fs::write(&file, r#"<svg width="50" viewBox="0 0 50 80"></svg>"#).unwrap();

    lumen()
        .arg("inspect")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("image/svg+xml"))
        .stdout(predicate::str::contains("50x80px"));
}

#[test]
fn test_inspect_json() {
    let dir = TempDir::new().unwrap();
    let file = png(&dir, "photo.png", 640, 480);

    let output = lumen()
        .args(["inspect", "--format", "json"])
        .arg(&file)
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report[0]["kind"], "raster");
    assert_eq!(report[0]["dimensions"]["width"], 640);
    assert_eq!(report[0]["pixels"], 307_200);
    assert_eq!(report[0]["ratio"], 1.33);
    assert_eq!(report[0]["orientation"], "landscape");
}
