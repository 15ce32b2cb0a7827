mod common;

use assert_fs::prelude::*;
use predicates::{prelude::PredicateBooleanExt, str::contains};
use regex::Regex;

use common::{script_cmd, temp_home};

#[test]
fn script_mode_records_and_lists_transactions() {
    let home = temp_home();
    let script = "\
register ana
category add Comida expense
tx add Super 500 Comida expense Efectivo
tx list
exit
";
    script_cmd(&home, script)
        .assert()
        .success()
        .stdout(contains("Profile `ana` created"))
        .stdout(contains("Category `Comida` added"))
        .stdout(contains("Recorded expense"))
        .stdout(contains("Super").and(contains("500")));

    assert!(home.join("config").join("config.json").exists());
    assert!(home.join("data").exists());
}

#[test]
fn sessions_persist_between_runs() {
    let home = temp_home();
    script_cmd(&home, "register ana\ntx add Sueldo 1000 Sueldo income\nexit\n")
        .assert()
        .success();

    script_cmd(&home, "whoami\ntx list --kind income\nexit\n")
        .assert()
        .success()
        .stdout(contains("ana"))
        .stdout(contains("Sueldo"));
}

#[test]
fn chat_records_slang_transfers_as_income() {
    let home = temp_home();
    script_cmd(&home, "register ana\nchat me mandó 5 lucas\nexit\n")
        .assert()
        .success()
        .stdout(contains("ingreso"))
        .stdout(contains("5.000"));
}

#[test]
fn commands_require_a_signed_in_profile() {
    let home = temp_home();
    script_cmd(&home, "tx list\nexit\n")
        .assert()
        .success()
        .stdout(contains("No profile signed in"))
        .stdout(contains("register ana"));
}

#[test]
fn unknown_commands_get_a_suggestion() {
    let home = temp_home();
    script_cmd(&home, "budgte\nexit\n")
        .assert()
        .success()
        .stdout(contains("Unknown command `budgte`"))
        .stdout(contains("Suggestion: `budget`?"));
}

#[test]
fn budgets_report_overspending() {
    let home = temp_home();
    let script = "\
register ana
budget set Transporte 1000
tx add Taxi 1500 Transporte expense
budget list
exit
";
    script_cmd(&home, script)
        .assert()
        .success()
        .stdout(contains("Budget for `Transporte` set"))
        .stdout(contains("Transporte").and(contains("150")));
}

#[test]
fn receipts_upload_into_folders() {
    let home = temp_home();
    let files = assert_fs::TempDir::new().expect("temp dir");
    let receipt = files.child("ticket.png");
    receipt
        .write_binary(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a])
        .expect("write receipt");
    let script = format!(
        "register ana\nfolder add Impuestos\nreceipt upload \"{}\" --folder Impuestos\nreceipt list --folder Impuestos\nexit\n",
        receipt.path().display()
    );

    let assert = script_cmd(&home, &script).assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(stdout.contains("Folder `Impuestos` created."));
    let uploaded = Regex::new(r"Receipt `ticket\.png` uploaded \(([0-9a-f-]{8})\)").expect("regex");
    assert!(uploaded.is_match(&stdout), "unexpected output:\n{stdout}");
    assert!(stdout.matches("ticket.png").count() >= 2);
}

#[test]
fn unsupported_receipt_types_are_rejected() {
    let home = temp_home();
    let files = assert_fs::TempDir::new().expect("temp dir");
    let notes = files.child("notas.txt");
    notes.write_str("hola").expect("write");
    let script = format!(
        "register ana\nreceipt upload \"{}\"\nexit\n",
        notes.path().display()
    );
    script_cmd(&home, &script)
        .assert()
        .success()
        .stdout(contains("is not a PDF, JPEG, or PNG file"));
}

#[test]
fn backups_can_be_created_and_listed() {
    let home = temp_home();
    script_cmd(
        &home,
        "register ana\nbackup create antes de limpiar\nbackup list\nexit\n",
    )
    .assert()
    .success()
    .stdout(contains("Backup `store_"))
    .stdout(contains("antes-de-limpiar"));
}

#[test]
fn memory_sessions_have_no_backups() {
    let home = temp_home();
    script_cmd(&home, "register ana\nbackup list\nexit\n")
        .arg("--memory")
        .assert()
        .success()
        .stdout(contains("unavailable in a `--memory` session"));
    assert!(!home.join("data").join("store").exists());
}

#[test]
fn unknown_flags_fail_fast() {
    let home = temp_home();
    script_cmd(&home, "exit\n")
        .arg("--bogus")
        .assert()
        .failure()
        .stderr(contains("unknown flag `--bogus`"));
}

#[test]
fn comments_and_blank_lines_are_ignored() {
    let home = temp_home();
    script_cmd(&home, "# setup\n\nregister ana\nwhoami\nexit\n")
        .assert()
        .success()
        .stdout(contains("Unknown command").not());
}
