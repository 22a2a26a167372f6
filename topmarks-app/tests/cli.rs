use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const PASTE: &str = "\
Reef Marker - S38.06.123 | E144.48.456
Garbage text with no coordinates
Channel Buoy – S38 17 500 | E144 38 250
";

fn topmarks(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("topmarks").expect("binary built");
    cmd.current_dir(workdir)
        .env_remove("TOPMARKS_CONFIG")
        .arg("--data-dir")
        .arg(workdir.join("data"));
    cmd
}

#[test]
fn parse_reports_rejected_lines_from_stdin() {
    let dir = tempfile::tempdir().unwrap();
    topmarks(dir.path())
        .args(["parse", "-"])
        .write_stdin(PASTE)
        .assert()
        .success()
        .stdout(predicate::str::contains("Reef Marker\t-38.102050\t144.807600"))
        .stdout(predicate::str::contains("第 2 行"))
        .stdout(predicate::str::contains("解析 2 / 3 行"));
}

#[test]
fn import_persists_layer_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("marks.txt");
    fs::write(&input, PASTE).unwrap();

    topmarks(dir.path())
        .args(["import"])
        .arg(&input)
        .args(["--layer", "Bay"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 / 3"));

    assert!(dir.path().join("data").join("topmarks-folders.json").exists());

    topmarks(dir.path())
        .arg("folders")
        .assert()
        .success()
        .stdout(predicate::str::contains("Default Folder"))
        .stdout(predicate::str::contains("Bay\t2 个标记"));

    topmarks(dir.path())
        .arg("render")
        .assert()
        .success()
        .stdout(predicate::str::contains("#1976d2\tReef Marker"))
        .stdout(predicate::str::contains("Channel Buoy"));

    topmarks(dir.path())
        .args(["render", "--hide-folder", "default"])
        .assert()
        .success()
        .stdout(predicate::str::contains("中心 -38.100000, 144.800000"))
        .stdout(predicate::str::contains("Reef Marker").not());
}

#[test]
fn import_of_unparseable_text_fails() {
    let dir = tempfile::tempdir().unwrap();
    topmarks(dir.path())
        .args(["import", "-", "--layer", "Empty"])
        .write_stdin("nothing to see here\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Empty"));
}

#[test]
fn folder_commands_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    topmarks(dir.path())
        .args(["rename-folder", "default", "Home Waters"])
        .assert()
        .success();

    topmarks(dir.path())
        .arg("folders")
        .assert()
        .success()
        .stdout(predicate::str::contains("default\tHome Waters"));

    topmarks(dir.path())
        .args(["remove-folder", "ghost"])
        .assert()
        .success();
}

#[test]
fn corrupted_storage_falls_back_to_default_folder() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("topmarks-folders.json"), "{not json").unwrap();

    topmarks(dir.path())
        .arg("folders")
        .assert()
        .success()
        .stdout(predicate::str::contains("default\tDefault Folder"));
}

#[test]
fn export_unknown_layer_fails() {
    let dir = tempfile::tempdir().unwrap();
    topmarks(dir.path())
        .args(["export", "default", "ghost"])
        .assert()
        .failure();
}
