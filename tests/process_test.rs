use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_config(home: &Path, upload: &Path, archive: &Path, ledger: &Path) {
    fs::create_dir_all(home).expect("mkdir home");
    let config = format!(
        r#"
timezone = "Asia/Tokyo"

[locations]
upload_dir = "{}"
category_root = "{}"
ledger_dir = "{}"
ledger_sheet = "recordings"

[[schedule]]
weekday = 1
period = "朝"
start = "09:00"
end = "10:00"
subject = "定例会議"
"#,
        upload.display(),
        archive.display(),
        ledger.display()
    );
    fs::write(home.join("intake.toml"), config).expect("write config");
}

fn intake_cmd(root: &Path, home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("intake").expect("intake binary");
    cmd.current_dir(root).env("INTAKE_HOME", home);
    cmd
}

#[test]
fn process_once_renames_moves_and_appends_ledger() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("home");
    let upload = tmp.path().join("upload");
    let archive = tmp.path().join("archive");
    let ledger = tmp.path().join("ledger");
    fs::create_dir_all(&upload).expect("mkdir upload");
    write_config(&home, &upload, &archive, &ledger);

    // Monday 2024-05-20 09:30, inside the configured slot.
    fs::write(upload.join("20240520_093000_meeting.wav"), b"audio").expect("write upload");

    intake_cmd(tmp.path(), &home)
        .arg("process")
        .arg("--once")
        .assert()
        .success()
        .stdout(predicate::str::contains("processed=1"));

    let moved = archive.join("定例会議/2024-05-20_定例会議.wav");
    assert!(moved.exists());
    assert!(!upload.join("20240520_093000_meeting.wav").exists());

    let ledger_file = ledger.join("recordings.jsonl");
    let raw = fs::read_to_string(&ledger_file).expect("read ledger");
    assert_eq!(raw.lines().count(), 1);
    assert!(raw.contains("定例会議"));
    assert!(raw.contains("\"weekday\":\"Mon\""));

    let audit = home.join("logs/audit.log");
    assert!(audit.exists());
}

#[test]
fn already_categorized_files_are_skipped() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("home");
    let upload = tmp.path().join("upload");
    let archive = tmp.path().join("archive");
    let ledger = tmp.path().join("ledger");
    fs::create_dir_all(&upload).expect("mkdir upload");
    write_config(&home, &upload, &archive, &ledger);

    // Already carries a processed-style name and no embedded timestamp.
    fs::write(upload.join("2024-05-20_定例会議.wav"), b"audio").expect("write upload");

    intake_cmd(tmp.path(), &home)
        .arg("process")
        .arg("--once")
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped=1"));

    assert!(upload.join("2024-05-20_定例会議.wav").exists());
    assert!(!ledger.join("recordings.jsonl").exists());
}

#[test]
fn unmatched_files_land_in_the_unclassified_folder() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("home");
    let upload = tmp.path().join("upload");
    let archive = tmp.path().join("archive");
    let ledger = tmp.path().join("ledger");
    fs::create_dir_all(&upload).expect("mkdir upload");
    write_config(&home, &upload, &archive, &ledger);

    // Monday 11:00 is not covered by any slot.
    fs::write(upload.join("2024-05-20_11-00-00.wav"), b"audio").expect("write upload");

    intake_cmd(tmp.path(), &home)
        .arg("process")
        .arg("--once")
        .assert()
        .success();

    assert!(archive.join("未分類/2024-05-20_未分類_1100.wav").exists());
}

#[test]
fn two_recordings_in_one_slot_both_survive() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("home");
    let upload = tmp.path().join("upload");
    let archive = tmp.path().join("archive");
    let ledger = tmp.path().join("ledger");
    fs::create_dir_all(&upload).expect("mkdir upload");
    write_config(&home, &upload, &archive, &ledger);

    // Both fall inside Monday 09:00-10:00 and resolve to the same name.
    fs::write(upload.join("20240520_091000_first.wav"), b"first-take").expect("write upload");
    fs::write(upload.join("20240520_093000_second.wav"), b"second-take").expect("write upload");

    intake_cmd(tmp.path(), &home)
        .arg("process")
        .arg("--once")
        .assert()
        .success()
        .stdout(predicate::str::contains("processed=2"));

    let dir = archive.join("定例会議");
    assert_eq!(
        fs::read(dir.join("2024-05-20_定例会議.wav")).expect("first take"),
        b"first-take"
    );
    assert_eq!(
        fs::read(dir.join("2024-05-20_定例会議_2.wav")).expect("second take"),
        b"second-take"
    );

    let raw = fs::read_to_string(ledger.join("recordings.jsonl")).expect("read ledger");
    assert_eq!(raw.lines().count(), 2);
    assert!(raw.contains("2024-05-20_定例会議_2.wav"));
}

#[test]
fn missing_upload_dir_configuration_fails_loudly() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("home");
    fs::create_dir_all(&home).expect("mkdir home");

    intake_cmd(tmp.path(), &home)
        .arg("process")
        .arg("--once")
        .assert()
        .failure()
        .stderr(predicate::str::contains("upload dir is unset"));
}

#[test]
fn ledger_command_shows_the_appended_row() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("home");
    let upload = tmp.path().join("upload");
    let archive = tmp.path().join("archive");
    let ledger = tmp.path().join("ledger");
    fs::create_dir_all(&upload).expect("mkdir upload");
    write_config(&home, &upload, &archive, &ledger);

    fs::write(upload.join("20240520_093000.wav"), b"audio").expect("write upload");
    intake_cmd(tmp.path(), &home)
        .arg("process")
        .arg("--once")
        .assert()
        .success();

    intake_cmd(tmp.path(), &home)
        .arg("ledger")
        .assert()
        .success()
        .stdout(predicate::str::contains("rows=1"))
        .stdout(predicate::str::contains("category=定例会議"));
}

#[test]
fn status_reports_configuration_and_counters() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("home");
    let upload = tmp.path().join("upload");
    let archive = tmp.path().join("archive");
    let ledger = tmp.path().join("ledger");
    fs::create_dir_all(&upload).expect("mkdir upload");
    write_config(&home, &upload, &archive, &ledger);

    intake_cmd(tmp.path(), &home)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("timezone=Asia/Tokyo"))
        .stdout(predicate::str::contains("schedule_slots=1"))
        .stdout(predicate::str::contains("INTAKE_UPLOAD_DIR"));
}
