use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");

    let git_hash = capture("git", &["rev-parse", "--short", "HEAD"]).unwrap_or_else(unknown);
    println!("cargo:rustc-env=CUENTAS_BUILD_HASH={git_hash}");

    let git_status = match capture("git", &["status", "--porcelain"]) {
        Some(status) if status.is_empty() => "clean".to_string(),
        Some(_) => "dirty".to_string(),
        None => unknown(),
    };
    println!("cargo:rustc-env=CUENTAS_BUILD_STATUS={git_status}");

    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    println!("cargo:rustc-env=CUENTAS_BUILD_TIMESTAMP={timestamp}");

    let profile = env::var("PROFILE").unwrap_or_else(|_| unknown());
    println!("cargo:rustc-env=CUENTAS_BUILD_PROFILE={profile}");

    let rustc = capture("rustc", &["--version"]).unwrap_or_else(unknown);
    println!("cargo:rustc-env=CUENTAS_BUILD_RUSTC={rustc}");
}

/// Trimmed stdout of a successful command.
fn capture(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|text| text.trim().to_string())
}

fn unknown() -> String {
    "unknown".to_string()
}
