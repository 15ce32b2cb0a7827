#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use assert_cmd::Command;
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A fresh `CUENTAS_HOME` that outlives the test.
pub fn temp_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// The CLI in script mode against `home`, fed `script` on stdin.
pub fn script_cmd(home: &std::path::Path, script: &str) -> Command {
    let mut cmd = Command::cargo_bin("cuentas_cli").expect("binary built");
    cmd.env("CUENTAS_CLI_SCRIPT", "1")
        .env("CUENTAS_HOME", home)
        .env_remove("RUST_LOG")
        .write_stdin(script.to_string());
    cmd
}
