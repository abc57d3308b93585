use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn bin() -> Command {
    Command::cargo_bin("frame-manager").unwrap()
}

fn write_images(dir: &Path, names: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    for name in names {
        fs::write(dir.join(name), b"x").unwrap();
    }
}

#[test]
fn ingest_copies_frames_and_reports_totals() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let input = raw.path().join("flight_20240501");
    write_images(&input, &["a.jpg", "b.jpg", "c.jpg"]);

    bin()
        .arg("ingest")
        .arg(&input)
        .args(["--region", "Nyon", "--sensor", "Cam", "--max-per-seq", "2"])
        .arg("--output-dir")
        .arg(out.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Sequence S002 done (1 images)."))
        .stderr(predicate::str::contains(
            "Done. 3 files copied into 1 acquisition folder(s).",
        ));

    let images = out.path().join("20240501-Nyon/01_images");
    assert!(images.join("S001/20240501-Nyon_S001_Cam_000002.jpg").is_file());
    assert!(images.join("S002/20240501-Nyon_S002_Cam_000001.jpg").is_file());
}

#[test]
fn empty_input_is_not_an_error() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    bin()
        .arg("ingest")
        .arg(raw.path())
        .args(["--region", "Nyon", "--sensor", "Cam"])
        .arg("--output-dir")
        .arg(out.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("No JPEG images found"));
}

#[test]
fn invalid_arguments_fail() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_images(raw.path(), &["a.jpg"]);

    bin()
        .arg("ingest")
        .arg(raw.path())
        .args(["--region", "Nyon", "--sensor", "Cam", "--max-per-seq", "0"])
        .arg("--output-dir")
        .arg(out.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("greater than zero"));

    bin()
        .arg("ingest")
        .arg(raw.path().join("missing"))
        .args(["--region", "Nyon", "--sensor", "Cam"])
        .arg("--output-dir")
        .arg(out.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("input folder not found"));

    bin()
        .arg("ingest")
        .arg(raw.path())
        .args(["--region", "Nyon", "--pose-epoch", "tai"])
        .assert()
        .failure();

    assert!(fs::read_dir(out.path()).unwrap().next().is_none());
}

#[test]
fn plan_writes_an_editable_manifest() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_images(&raw.path().join("north_20240501"), &["n.jpg"]);
    write_images(&raw.path().join("empty"), &[]);
    let manifest = out.path().join("plan.json");

    bin()
        .arg("plan")
        .arg(raw.path())
        .arg("--manifest")
        .arg(&manifest)
        .assert()
        .success()
        .stderr(predicate::str::contains("1 acquisition(s)"));

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&manifest).unwrap()).unwrap();
    let entries = value["acquisitions"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["name"], "north_20240501");
    assert_eq!(entries[0]["region"], "");
    assert_eq!(entries[0]["folder_date"], "20240501");

    // Regions are still blank.
    bin().arg("batch").arg(&manifest).assert().failure();
}
