//! Runs the built binary and checks the exit code of each outcome.
#![cfg(unix)]

mod common;

use std::{
    fs,
    path::PathBuf,
    process::{Child, Command, ExitStatus, Output, Stdio},
    thread,
    time::{Duration, Instant},
};

use common::{captures, install_fake_reader, settings_json};
use pretty_assertions::assert_eq;
use serial_test::serial;
use tempfile::TempDir;

fn emcatcher(dir: &TempDir) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_emcatcher"));
    command
        .current_dir(dir.path())
        .env_remove("EMCATCHER_SETTINGS")
        .stdin(Stdio::null());
    command
}

fn write_settings(dir: &TempDir, device: &str, freq: &str) -> PathBuf {
    let binary = install_fake_reader(dir);
    write_settings_for(dir, &binary.to_string_lossy(), device, freq)
}

fn write_settings_for(dir: &TempDir, binary: &str, device: &str, freq: &str) -> PathBuf {
    let path = dir.path().join("settings.conf");
    fs::write(&path, settings_json(dir, binary, device, freq)).unwrap();
    path
}

fn run(dir: &TempDir, args: &[&str]) -> Output {
    emcatcher(dir).args(args).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn run_log(dir: &TempDir) -> String {
    match fs::read_dir(dir.path().join("logs")) {
        Ok(mut entries) => match entries.next() {
            Some(entry) => fs::read_to_string(entry.unwrap().path()).unwrap_or_default(),
            None => String::new(),
        },
        Err(_) => String::new(),
    }
}

fn wait_with_deadline(child: &mut Child, deadline: Duration) -> Option<ExitStatus> {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if let Some(status) = child.try_wait().unwrap() {
            return Some(status);
        }
        thread::sleep(Duration::from_millis(50));
    }
    None
}

#[test]
#[serial]
fn help_exits_zero() {
    let dir = TempDir::new().unwrap();
    let output = run(&dir, &["--help"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("--verify-settings"));
}

#[test]
#[serial]
fn verify_success_exits_zero() {
    let dir = TempDir::new().unwrap();
    let settings = write_settings(&dir, "/dev/ttyACM0", "lf");

    let output = run(&dir, &["-v", "-s", &settings.to_string_lossy()]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "[+] Settings file verified.\n");
    assert!(!dir.path().join("logs").exists());
}

#[test]
#[serial]
fn verify_failure_exits_one() {
    let dir = TempDir::new().unwrap();
    let settings = write_settings(&dir, "/dev/ttyACM0", "uhf");

    let output = run(&dir, &["--verify_settings", "-s", &settings.to_string_lossy()]);

    assert_eq!(output.status.code(), Some(1));
    let text = stdout(&output);
    assert!(text.contains("Valid frequencies: lf, hf."));
    assert!(text.ends_with("[!] Settings file failed verification.\n"));
}

#[test]
#[serial]
fn verify_unreachable_device_exits_one() {
    let dir = TempDir::new().unwrap();
    let settings = write_settings(&dir, "/dev/missing", "lf");

    let output = run(&dir, &["-v", "-s", &settings.to_string_lossy()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Could not activate Proxmark on /dev/missing."));
}

#[test]
#[serial]
fn load_failure_exits_one() {
    let dir = TempDir::new().unwrap();

    let output = run(&dir, &["-s", "does-not-exist.conf"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(run_log(&dir).contains("Error loading settings file"));
}

#[test]
#[serial]
fn missing_binary_exits_one() {
    let dir = TempDir::new().unwrap();
    let binary = dir.path().join("no-such-reader");
    let settings = write_settings_for(&dir, &binary.to_string_lossy(), "/dev/ttyACM0", "lf");

    let output = run(&dir, &["-s", &settings.to_string_lossy()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(run_log(&dir).contains("Error: reader binary not found"));
}

#[test]
#[serial]
fn missing_device_exits_one() {
    let dir = TempDir::new().unwrap();
    let settings = write_settings(&dir, "/dev/missing", "lf");

    let output = run(&dir, &["-s", &settings.to_string_lossy()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(run_log(&dir).contains("Error: Device '/dev/missing' not found."));
}

#[test]
#[serial]
fn interrupt_exits_zero() {
    let dir = TempDir::new().unwrap();
    let settings = write_settings(&dir, "/dev/ttyACM0", "hf");

    let mut child = emcatcher(&dir)
        .args(["-s", &settings.to_string_lossy()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let start = Instant::now();
    while !run_log(&dir).contains("Starting active collection.") {
        assert!(start.elapsed() < Duration::from_secs(10), "collection never started");
        thread::sleep(Duration::from_millis(50));
    }
    thread::sleep(Duration::from_millis(200));

    let kill = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(kill.success());

    let status = match wait_with_deadline(&mut child, Duration::from_secs(10)) {
        Some(status) => status,
        None => {
            child.kill().unwrap();
            panic!("emcatcher ignored the interrupt");
        }
    };

    assert_eq!(status.code(), Some(0));
    assert!(
        run_log(&dir)
            .trim_end()
            .ends_with(" - Interrupt caught, stopping collection.")
    );
    assert!(captures(&dir).is_empty());
}
