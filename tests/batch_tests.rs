//! End-to-end tests for the batch driver and the `isosprite` binary.
//!
//! Each test builds a scratch input directory of OBJ files, runs a batch and
//! inspects the PNGs that come out.

use std::fs;
use std::path::Path;
use std::process::Command;

use image::RgbaImage;
use isosprite::batch::{self, BatchConfig, BatchError};
use isosprite::palette::{Palette, Tint};
use isosprite::sprite::SpriteOptions;
use tempfile::tempdir;

const CUBE: &str = "\
o Cube
v -1 -1 -1
v 1 -1 -1
v 1 1 -1
v -1 1 -1
v -1 -1 1
v 1 -1 1
v 1 1 1
v -1 1 1
f 1 4 3 2
f 5 6 7 8
f 1 2 6 5
f 2 3 7 6
f 3 4 8 7
f 4 1 5 8
";

fn write_obj(dir: &Path, name: &str) {
    fs::write(dir.join(name), CUBE).unwrap();
}

fn open_png(path: &Path) -> RgbaImage {
    image::open(path)
        .unwrap_or_else(|e| panic!("failed to open {}: {}", path.display(), e))
        .to_rgba8()
}

/// Share of fully opaque pixels whose color is within 2 of `tint`.
fn tint_share(img: &RgbaImage, tint: Tint) -> f64 {
    let opaque: Vec<_> = img.pixels().filter(|p| p.0[3] == 255).collect();
    assert!(!opaque.is_empty(), "sprite has no opaque pixels");
    let matching = opaque
        .iter()
        .filter(|p| p.0.iter().zip(tint.0).all(|(&a, b)| a.abs_diff(b) <= 2))
        .count();
    matching as f64 / opaque.len() as f64
}

fn run_binary(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_isosprite"))
        .args(args)
        .output()
        .expect("failed to launch isosprite")
}

#[test]
fn test_palette_assets_get_their_tints() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_obj(input.path(), "House.obj");
    write_obj(input.path(), "Tree1.obj");

    let config = BatchConfig::new(input.path(), output.path().join("sprites"));
    let report = batch::run(&config).unwrap();
    assert!(report.is_success());
    assert_eq!(report.rendered.len(), 2);

    let house = open_png(&output.path().join("sprites/House.png"));
    let tree = open_png(&output.path().join("sprites/Tree1.png"));
    assert_eq!(house.dimensions(), (256, 256));
    assert_eq!(tree.dimensions(), (256, 256));

    assert!(tint_share(&house, Tint::new(157, 183, 255, 255)) > 0.25);
    assert!(tint_share(&tree, Tint::new(120, 200, 120, 255)) > 0.25);
    assert!(tint_share(&house, Tint::new(120, 200, 120, 255)) < 0.01);
}

#[test]
fn test_unknown_asset_uses_default_gray() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_obj(input.path(), "Widget.obj");

    let mut config = BatchConfig::new(input.path(), output.path());
    config.options = SpriteOptions::new(96);
    batch::run(&config).unwrap();

    let widget = open_png(&output.path().join("Widget.png"));
    assert_eq!(widget.dimensions(), (96, 96));
    assert!(tint_share(&widget, Tint::DEFAULT) > 0.25);
}

#[test]
fn test_empty_input_is_fatal() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    fs::write(input.path().join("notes.txt"), "not a mesh").unwrap();

    let config = BatchConfig::new(input.path(), output.path().join("out"));
    let err = batch::run(&config).unwrap_err();
    assert!(matches!(err, BatchError::NoMeshes { .. }));
    assert!(!output.path().join("out").exists());
}

#[test]
fn test_discovery_is_sorted_and_filtered() {
    let input = tempdir().unwrap();
    write_obj(input.path(), "b.obj");
    write_obj(input.path(), "A.OBJ");
    write_obj(input.path(), "c.obj");
    fs::write(input.path().join("c.mtl"), "newmtl x").unwrap();
    fs::create_dir(input.path().join("nested.obj")).unwrap();

    let found = batch::discover_meshes(input.path()).unwrap();
    let names: Vec<_> = found
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["A.OBJ", "b.obj", "c.obj"]);
}

#[test]
fn test_progress_reports_each_file_in_order() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_obj(input.path(), "Mall.obj");
    write_obj(input.path(), "Factory.obj");

    let mut config = BatchConfig::new(input.path(), output.path());
    config.options = SpriteOptions::new(32);

    let mut seen = Vec::new();
    batch::run_with_progress(&config, |inp, out| {
        seen.push((
            inp.file_name().unwrap().to_owned(),
            out.file_name().unwrap().to_owned(),
        ));
    })
    .unwrap();

    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, "Factory.obj");
    assert_eq!(seen[0].1, "Factory.png");
    assert_eq!(seen[1].1, "Mall.png");
}

#[test]
fn test_bad_asset_stops_batch_by_default() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    fs::write(input.path().join("Broken.obj"), "v 0 0 0\n").unwrap();
    write_obj(input.path(), "Office.obj");

    let mut config = BatchConfig::new(input.path(), output.path());
    config.options = SpriteOptions::new(32);
    let err = batch::run(&config).unwrap_err();
    assert!(matches!(err, BatchError::Asset { .. }));
    // Broken.obj sorts first, so nothing was written.
    assert!(!output.path().join("Office.png").exists());
}

#[test]
fn test_keep_going_skips_bad_asset() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    fs::write(input.path().join("Broken.obj"), "v 0 0 0\n").unwrap();
    write_obj(input.path(), "Office.obj");

    let mut config = BatchConfig::new(input.path(), output.path());
    config.options = SpriteOptions::new(32);
    config.keep_going = true;
    let report = batch::run(&config).unwrap();

    assert_eq!(report.rendered, vec![output.path().join("Office.png")]);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].path.ends_with("Broken.obj"));
    assert!(!output.path().join("Broken.png").exists());
}

#[test]
fn test_palette_file_overrides_builtin() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_obj(input.path(), "House.obj");
    let palette_path = input.path().join("palette.json5");
    fs::write(&palette_path, "{\n  // repaint\n  House: [200, 40, 40, 255],\n}\n").unwrap();

    let mut config = BatchConfig::new(input.path(), output.path());
    config.options = SpriteOptions::new(64);
    config.palette = Palette::with_overrides(&palette_path).unwrap();
    batch::run(&config).unwrap();

    let house = open_png(&output.path().join("House.png"));
    assert!(tint_share(&house, Tint::new(200, 40, 40, 255)) > 0.25);
}

// ===========================================================================
// Binary tests
// ===========================================================================

#[test]
fn test_binary_renders_directory() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_obj(input.path(), "House.obj");
    write_obj(input.path(), "Tree1.obj");
    let out_dir = output.path().join("nested/sprites");

    let result = run_binary(&[
        "--input",
        input.path().to_str().unwrap(),
        "--output",
        out_dir.to_str().unwrap(),
    ]);
    assert!(result.status.success(), "{:?}", result);

    let stdout = String::from_utf8_lossy(&result.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("House.obj") && lines[0].contains("House.png"));
    assert!(lines[1].contains("Tree1.obj") && lines[1].contains("Tree1.png"));

    for name in ["House.png", "Tree1.png"] {
        assert_eq!(open_png(&out_dir.join(name)).dimensions(), (256, 256));
    }
}

#[test]
fn test_binary_empty_input_exits_nonzero() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let out_dir = output.path().join("sprites");

    let result = run_binary(&[
        "--input",
        input.path().to_str().unwrap(),
        "--output",
        out_dir.to_str().unwrap(),
        "--size",
        "64",
    ]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("No .obj files found"));
    assert!(!out_dir.exists() || fs::read_dir(&out_dir).unwrap().next().is_none());
}

#[test]
fn test_binary_keep_going_still_fails_overall() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    fs::write(input.path().join("Broken.obj"), "v 0 0 0\n").unwrap();
    write_obj(input.path(), "Mall.obj");

    let result = run_binary(&[
        "--input",
        input.path().to_str().unwrap(),
        "--output",
        output.path().to_str().unwrap(),
        "--size",
        "32",
        "--keep-going",
    ]);
    assert!(!result.status.success());
    assert!(output.path().join("Mall.png").exists());
}
