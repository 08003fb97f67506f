//! Shell script standing in for the reader client, shared by the
//! integration tests.
#![allow(dead_code)]

use std::{fs, os::unix::fs::PermissionsExt, path::PathBuf};

use tempfile::TempDir;

// Arguments arrive as: -c <command> <device>
const FAKE_READER: &str = r#"#!/bin/sh
command="$2"
device="$3"
case "$command" in
    help)
        if [ "$device" = "/dev/missing" ]; then
            echo "[!] ERROR: invalid serial port $device"
        else
            echo "help             This help"
        fi
        ;;
    "lf search")
        echo "[=] Checking for known tags..."
        echo "[+] EM 410x ID 0F0368568B"
        ;;
    "hf search")
        echo "[-] No known/supported 13.56 MHz tags found"
        ;;
    *)
        echo "[-] No known 125/134 kHz tags found!"
        ;;
esac
"#;

pub fn install_fake_reader(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("proxmark3");
    fs::write(&path, FAKE_READER).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Settings JSON pointing every path into `dir`.
pub fn settings_json(dir: &TempDir, binary: &str, device: &str, freq: &str) -> String {
    format!(
        r#"{{
            "device": "{device}",
            "freq": "{freq}",
            "sample_rate": 1,
            "binary": "{binary}",
            "cards_dir": "{}",
            "logs_dir": "{}"
        }}"#,
        dir.path().join("cards").display(),
        dir.path().join("logs").display(),
    )
}

pub fn captures(dir: &TempDir) -> Vec<PathBuf> {
    match fs::read_dir(dir.path().join("cards")) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}
