use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn init_append_read_round_trip() {
    let dir = tempdir().unwrap();
    let img = dir.path().join("log.img");
    let input = dir.path().join("payload.bin");
    std::fs::write(&input, vec![0x42u8; 507]).unwrap();

    Command::cargo_bin("mirrorlog")
        .unwrap()
        .args(["init", img.to_str().unwrap(), "--sectors", "90"])
        .assert()
        .success()
        .stdout(predicate::str::contains("initialized"));

    Command::cargo_bin("mirrorlog")
        .unwrap()
        .args([
            "append",
            img.to_str().unwrap(),
            "--header",
            "171",
            "--input",
            input.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("head now 2"));

    let out_dir = dir.path().join("out");
    Command::cargo_bin("mirrorlog")
        .unwrap()
        .args(["read", img.to_str().unwrap(), "--out-dir", out_dir.to_str().unwrap()])
        .assert()
        .success();

    let payload_csv = std::fs::read_to_string(out_dir.join("payload.csv")).unwrap();
    assert!(payload_csv.contains("CRC_OK"));
    assert!(payload_csv.contains("171"));

    let meta_csv = std::fs::read_to_string(out_dir.join("meta.csv")).unwrap();
    assert!(meta_csv.contains("mirror0"));
}

#[test]
fn append_rejects_misaligned_input() {
    let dir = tempdir().unwrap();
    let img = dir.path().join("log.img");
    let input = dir.path().join("bad.bin");
    std::fs::write(&input, vec![0u8; 10]).unwrap();

    Command::cargo_bin("mirrorlog")
        .unwrap()
        .args(["init", img.to_str().unwrap(), "--sectors", "90"])
        .assert()
        .success();

    Command::cargo_bin("mirrorlog")
        .unwrap()
        .args([
            "append",
            img.to_str().unwrap(),
            "--header",
            "1",
            "--input",
            input.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a multiple"));
}

#[test]
fn init_on_undersized_device_fails() {
    let dir = tempdir().unwrap();
    let img = dir.path().join("tiny.img");

    Command::cargo_bin("mirrorlog")
        .unwrap()
        .args(["init", img.to_str().unwrap(), "--sectors", "2"])
        .assert()
        .failure();
}
