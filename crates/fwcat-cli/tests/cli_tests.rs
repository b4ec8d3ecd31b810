//! End-to-end tests driving the fwcat binary.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn fwcat() -> Command {
    Command::new(env!("CARGO_BIN_EXE_fwcat"))
}

/// Lay out an unpacked package directory with one valid entry.
fn write_unpacked(dir: &Path, device_type: &str, version: &str, payload: &[u8]) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(
        dir.join("manifest.toml"),
        format!(
            "[[firmware]]\ndeviceType = \"{device_type}\"\nversion = \"{version}\"\nfile = \"image.bin\"\n"
        ),
    )
    .unwrap();
    std::fs::write(dir.join("image.bin"), payload).unwrap();
}

#[test]
fn help_runs() {
    let output = fwcat().arg("--help").output().expect("failed to run fwcat");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
}

#[test]
fn pack_list_get_round_trip() {
    let tmp = TempDir::new().unwrap();
    let unpacked = tmp.path().join("lamps");
    write_unpacked(&unpacked, "zigbee:lamp", "1.4.2", &[0xFE; 321]);

    let folder = tmp.path().join("packages");
    std::fs::create_dir(&folder).unwrap();
    let package = folder.join("lamps.fwp");

    // pack
    let output = fwcat()
        .args(["pack", unpacked.to_str().unwrap(), "-o", package.to_str().unwrap()])
        .output()
        .expect("failed to run fwcat pack");
    assert!(output.status.success(), "pack failed: {output:?}");
    assert!(package.is_file());

    // list
    let output = fwcat()
        .args(["list", folder.to_str().unwrap()])
        .output()
        .expect("failed to run fwcat list");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("zigbee:lamp"));
    assert!(stdout.contains("1.4.2"));
    assert!(stdout.contains("321"));

    // get
    let extracted = tmp.path().join("image.out");
    let output = fwcat()
        .args([
            "get",
            folder.to_str().unwrap(),
            "zigbee:lamp",
            "1.4.2",
            "-o",
            extracted.to_str().unwrap(),
        ])
        .output()
        .expect("failed to run fwcat get");
    assert!(output.status.success(), "get failed: {output:?}");
    assert_eq!(std::fs::read(&extracted).unwrap(), vec![0xFE; 321]);
}

#[test]
fn inspect_reports_skipped_entries() {
    let tmp = TempDir::new().unwrap();
    let unpacked = tmp.path().join("mixed");
    std::fs::create_dir_all(&unpacked).unwrap();
    std::fs::write(
        unpacked.join("manifest.toml"),
        r#"
        [[firmware]]
        deviceType = "zigbee:lamp"
        version = "1.0"
        file = "image.bin"

        [[firmware]]
        deviceType = "zigbee:lamp"
        file = "image.bin"
        "#,
    )
    .unwrap();
    std::fs::write(unpacked.join("image.bin"), [0u8; 8]).unwrap();

    let output = fwcat()
        .args(["inspect", unpacked.to_str().unwrap()])
        .output()
        .expect("failed to run fwcat inspect");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("zigbee:lamp 1.0"));
    assert!(stdout.contains("skipped entry 1"));
}

#[test]
fn get_unknown_identity_fails_cleanly() {
    let tmp = TempDir::new().unwrap();
    let folder = tmp.path().join("packages");
    std::fs::create_dir(&folder).unwrap();

    let output = fwcat()
        .args(["get", folder.to_str().unwrap(), "zigbee:lamp", "9.9"])
        .output()
        .expect("failed to run fwcat get");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no firmware catalogued"));
}
