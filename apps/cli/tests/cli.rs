use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::{TempDir, tempdir};

const CONFIG: &str = r#"
standard_namespaces = ["generic", "image"]

[[formats]]
namespace = "image"
name = "Png"
ext = ".png"
magic = "89504e470d0a1a0a"

[[formats]]
namespace = "image"
name = "Thumbnail"
parent = "image/png"

[[formats]]
namespace = "medimage"
name = "Nifti"
ext = ".nii"
"#;

fn workspace() -> Result<TempDir, Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("fileformats.toml"), CONFIG)?;
    fs::write(dir.path().join("scan.png"), b"\x89PNG\r\n\x1a\npixels")?;
    fs::write(dir.path().join("brain.nii"), b"header")?;
    Ok(dir)
}

#[test]
fn no_arguments_prints_help() {
    cargo_bin_cmd!("fileformats").assert().failure().stderr(predicate::str::contains("Usage"));
}

#[test]
fn detect_lists_matching_formats() -> Result<(), Box<dyn std::error::Error>> {
    let dir = workspace()?;
    cargo_bin_cmd!("fileformats")
        .current_dir(dir.path())
        .args(["detect", "scan.png"])
        .assert()
        .success()
        .stdout(predicate::str::contains("image/png"));
    Ok(())
}

#[test]
fn detect_searches_other_namespaces_on_request() -> Result<(), Box<dyn std::error::Error>> {
    let dir = workspace()?;
    cargo_bin_cmd!("fileformats")
        .current_dir(dir.path())
        .args(["detect", "brain.nii"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matching formats found"));

    cargo_bin_cmd!("fileformats")
        .current_dir(dir.path())
        .args(["detect", "--any-namespace", "brain.nii"])
        .assert()
        .success()
        .stdout(predicate::str::contains("medimage/nifti"));
    Ok(())
}

#[test]
fn mime_prints_display_name_and_canonical_form() -> Result<(), Box<dyn std::error::Error>> {
    let dir = workspace()?;
    cargo_bin_cmd!("fileformats")
        .current_dir(dir.path())
        .args(["mime", "image/thumbnail.png+directory"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Directory[Png, Thumbnail]\timage/png.thumbnail+directory"));
    Ok(())
}

#[test]
fn subtype_compares_qualified_types() -> Result<(), Box<dyn std::error::Error>> {
    let dir = workspace()?;
    cargo_bin_cmd!("fileformats")
        .current_dir(dir.path())
        .args(["subtype", "image/png.thumbnail+directory", "image/png+directory"])
        .assert()
        .success()
        .stdout("true\n");

    cargo_bin_cmd!("fileformats")
        .current_dir(dir.path())
        .args(["subtype", "image/png", "image/thumbnail"])
        .assert()
        .success()
        .stdout("false\n");
    Ok(())
}

#[test]
fn formats_filters_by_namespace() -> Result<(), Box<dyn std::error::Error>> {
    let dir = workspace()?;
    cargo_bin_cmd!("fileformats")
        .current_dir(dir.path())
        .args(["formats", "--namespace", "image"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"image/png\s+\.png")?)
        .stdout(predicate::str::contains("generic/").not());
    Ok(())
}

#[test]
fn unknown_identifiers_fail_with_context() -> Result<(), Box<dyn std::error::Error>> {
    let dir = workspace()?;
    cargo_bin_cmd!("fileformats")
        .current_dir(dir.path())
        .args(["mime", "image/unknown"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("resolving `image/unknown`"));
    Ok(())
}

#[test]
fn explicit_config_files_must_exist() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    cargo_bin_cmd!("fileformats")
        .current_dir(dir.path())
        .args(["--config", "missing.toml", "formats"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration is malformed"));
    Ok(())
}

#[test]
fn environment_overrides_the_log_level() -> Result<(), Box<dyn std::error::Error>> {
    let dir = workspace()?;
    cargo_bin_cmd!("fileformats")
        .current_dir(dir.path())
        .env("FILEFORMATS__LOGGING__LEVEL", "loud")
        .args(["formats"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown log level"));
    Ok(())
}
