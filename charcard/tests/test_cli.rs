// Allow deprecated APIs (assert_cmd::cargo_bin is deprecated but still works)
#![allow(deprecated)]

use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*; // Used for writing assertions
use rstest::rstest;
use std::io::Cursor;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const BADGE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="#ffffff"/></svg>"##;

fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Portrait, namecard and elemental backgrounds in a temporary asset tree.
fn assets() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("art.png"), png(400, 200, [220, 30, 30, 255])).unwrap();
    std::fs::write(dir.path().join("namecard.png"), png(20, 24, [20, 40, 90, 255])).unwrap();
    let backgrounds = dir.path().join("elementalBackgrounds");
    std::fs::create_dir_all(&backgrounds).unwrap();
    for element in ["pyro", "hydro", "geo"] {
        std::fs::write(
            backgrounds.join(format!("{element}-bg.jpg")),
            png(8, 8, [128, 128, 128, 255]),
        )
        .unwrap();
    }
    dir
}

fn small_config(dir: &Path) -> String {
    let path = dir.join("config.json");
    std::fs::write(
        &path,
        r#"{
            "viewport": {
                "character": {"width": 200, "height": 100},
                "background": {"width": 480, "height": 100},
                "layout_scale": 1,
                "pixel_density": 1
            },
            "retry": {"max_retries": 2, "delay_ms": 1}
        }"#,
    )
    .unwrap();
    path.display().to_string()
}

fn charcard(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("charcard").unwrap();
    cmd.arg("--asset-base").arg(dir).arg("--character").arg("Furina");
    cmd
}

fn dimensions(path: &Path) -> (u32, u32) {
    image::open(path).unwrap().to_rgba8().dimensions()
}

#[test]
fn test_renders_with_default_viewport() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assets();
    let output = dir.path().join("card.png");

    let mut cmd = charcard(dir.path());
    cmd.arg("--portrait")
        .arg(dir.path().join("art.png"))
        .arg("--element")
        .arg("pyro")
        .arg("--output")
        .arg(&output);
    cmd.assert().success();

    assert_eq!(dimensions(&output), (2400, 970));
    Ok(())
}

#[rstest]
fn test_portrait_kinds(
    #[values("game", "custom", "upload")] kind: &str,
    #[values("hydro", "geo")] element: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = assets();
    let output = dir.path().join(format!("{kind}-{element}.png"));

    let mut cmd = charcard(dir.path());
    cmd.arg("--config")
        .arg(small_config(dir.path()))
        .arg("--portrait")
        .arg(dir.path().join("art.png"))
        .arg("--portrait-kind")
        .arg(kind)
        .arg("--element")
        .arg(element)
        .arg("--output")
        .arg(&output);
    cmd.assert().success();

    assert_eq!(dimensions(&output), (480, 100));
    Ok(())
}

#[test]
fn test_namecard_with_adaptive_colors() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assets();

    let mut cmd = charcard(dir.path());
    cmd.arg("--config")
        .arg(small_config(dir.path()))
        .arg("--portrait")
        .arg(dir.path().join("art.png"))
        .arg("--namecard")
        .arg(dir.path().join("namecard.png"))
        .arg("--adaptive")
        .arg("--print-colors")
        .arg("--download-dir")
        .arg(dir.path())
        .arg("--id")
        .arg("9");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Furina-9.png"))
        .stdout(predicate::str::contains("\"solid\""))
        .stdout(predicate::str::is_match(r"#[0-9a-f]{6}ff").unwrap())
        .stdout(predicate::str::is_match(r"#[0-9a-f]{6}55").unwrap());

    assert_eq!(dimensions(&dir.path().join("Furina-9.png")), (480, 100));
    Ok(())
}

#[test]
fn test_overlay_and_pan() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assets();
    let svg = dir.path().join("badge.svg");
    std::fs::write(&svg, BADGE_SVG)?;
    let output = dir.path().join("card.png");

    let mut cmd = charcard(dir.path());
    cmd.arg("--config")
        .arg(small_config(dir.path()))
        .arg("--portrait")
        .arg(dir.path().join("art.png"))
        .arg("--element")
        .arg("pyro")
        .arg("--zoom")
        .arg("1.2")
        .arg("--pan-x")
        .arg("-10")
        .arg("--pan-y")
        .arg("5")
        .arg("--overlay-svg")
        .arg(&svg)
        .arg("--overlay-class")
        .arg("lb-badge")
        .arg("--overlay-at")
        .arg("300,20")
        .arg("--output")
        .arg(&output);
    cmd.assert().success();

    let decoded = image::open(&output)?.to_rgba8();
    // lb-badge is nudged up one pixel in snapshots
    assert_eq!(decoded.get_pixel(305, 19).0, [255, 255, 255, 255]);
    Ok(())
}

#[test]
fn test_requires_background() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assets();
    let mut cmd = charcard(dir.path());
    cmd.arg("--portrait")
        .arg(dir.path().join("art.png"))
        .arg("--output")
        .arg(dir.path().join("card.png"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("required"));
    Ok(())
}

#[test]
fn test_missing_portrait_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assets();
    let output = dir.path().join("card.png");
    let mut cmd = charcard(dir.path());
    cmd.arg("--config")
        .arg(small_config(dir.path()))
        .arg("--portrait")
        .arg(dir.path().join("missing.png"))
        .arg("--element")
        .arg("pyro")
        .arg("--output")
        .arg(&output);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("failed to load card images"));
    assert!(!output.exists());
    Ok(())
}

#[test]
fn test_rejects_unknown_element() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assets();
    let mut cmd = charcard(dir.path());
    cmd.arg("--portrait")
        .arg(dir.path().join("art.png"))
        .arg("--element")
        .arg("plasma")
        .arg("--output")
        .arg(dir.path().join("card.png"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown element"));
    Ok(())
}
