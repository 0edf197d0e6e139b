//! Integration tests for the lilerp CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd. Every
//! test gets its own database file and config directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

struct Workspace {
    tmp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            tmp: TempDir::new().unwrap(),
        }
    }

    fn db(&self) -> PathBuf {
        self.tmp.path().join("data/inventory.db")
    }

    /// A lilerp command isolated from the user's config and environment
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("lilerp").unwrap();
        cmd.env("XDG_CONFIG_HOME", self.tmp.path().join("config"))
            .env("XDG_DATA_HOME", self.tmp.path().join("share"))
            .env("HOME", self.tmp.path())
            .env_remove("LILERP_DB")
            .env_remove("LILERP_FORMAT")
            .env_remove("LILERP_INSERT_RETRIES")
            .env_remove("RUST_LOG")
            .arg("--db")
            .arg(self.db());
        cmd
    }

    fn stdout(&self, args: &[&str]) -> String {
        let output = self.cmd().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "lilerp {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let mut full = args.to_vec();
        full.extend(["-f", "json"]);
        serde_json::from_str(&self.stdout(&full)).unwrap()
    }

    /// Receive a raw material dated 2025-06-01; returns its test number
    fn new_raw(&self, name: &str) -> String {
        self.stdout(&[
            "raw",
            "new",
            "--date",
            "2025-06-01",
            "--name",
            name,
            "--net-weight",
            "25",
            "--quantity",
            "4",
            "--manufacturing-date",
            "2025-05-20",
            "--expire-date",
            "2026-05-20",
            "--vendor",
            "Daehan Sugar",
            "--country",
            "KR",
            "-f",
            "id",
        ])
        .trim()
        .to_string()
    }

    fn new_master(&self, name: &str, shelf_life_days: &str) {
        self.cmd()
            .args([
                "master",
                "new",
                "--name",
                name,
                "--shelf-life-days",
                shelf_life_days,
                "--net-weight",
                "20",
                "--vendor",
                "Seoul Dairy",
                "--country",
                "KR",
                "--storage",
                "refrigerating",
                "--memo",
                "keep sealed",
            ])
            .assert()
            .success();
    }
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    Command::cargo_bin("lilerp")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("raw"))
        .stdout(predicate::str::contains("master"))
        .stdout(predicate::str::contains("bridge"));
}

#[test]
fn test_version_displays() {
    Command::cargo_bin("lilerp")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lilerp"));
}

#[test]
fn test_completions_bash() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lilerp"));
}

// ============================================================================
// Database Tests
// ============================================================================

#[test]
fn test_db_init_creates_file() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["db", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created database"));
    assert!(ws.db().exists());

    ws.cmd()
        .args(["db", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Opened database"));
}

#[test]
fn test_db_status_counts() {
    let ws = Workspace::new();
    ws.new_raw("Sugar");
    ws.new_master("Milk powder", "730");

    let stats = ws.json(&["db", "status"]);
    assert_eq!(stats["raw_materials"], 1);
    assert_eq!(stats["packing_materials"], 0);
    assert_eq!(stats["masters"], 1);
    assert_eq!(stats["schema_version"], 1);
}

#[test]
fn test_database_from_env() {
    let ws = Workspace::new();
    let env_db = ws.tmp.path().join("from-env.db");

    let mut cmd = Command::cargo_bin("lilerp").unwrap();
    cmd.env("XDG_CONFIG_HOME", ws.tmp.path().join("config"))
        .env("HOME", ws.tmp.path())
        .env("LILERP_DB", &env_db)
        .args(["db", "init"])
        .assert()
        .success();
    assert!(env_db.exists());
}

// ============================================================================
// Raw Material Tests
// ============================================================================

#[test]
fn test_raw_test_numbers_increment() {
    let ws = Workspace::new();
    assert_eq!(ws.new_raw("Sugar"), "AR25060101");
    assert_eq!(ws.new_raw("Salt"), "AR25060102");

    ws.cmd()
        .args(["raw", "next-number", "--date", "2025-06-01"])
        .assert()
        .success()
        .stdout("AR25060103\n");

    // Packing materials keep their own counter
    ws.cmd()
        .args(["pack", "next-number", "--date", "2025-06-01"])
        .assert()
        .success()
        .stdout("AP25060101\n");
}

#[test]
fn test_raw_new_reports_creation() {
    let ws = Workspace::new();
    ws.cmd()
        .args([
            "raw",
            "new",
            "--date",
            "2025-06-01",
            "--name",
            "Flour",
            "--net-weight",
            "10",
            "--weight-unit",
            "kg",
            "--quantity",
            "3",
            "--manufacturing-date",
            "2025-05-01",
            "--expire-date",
            "2025-11-01",
            "--vendor",
            "Mill Co",
            "--country",
            "US",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created raw material AR25060101"));

    let record = ws.json(&["raw", "show", "AR25060101"]);
    assert_eq!(record["name"], "Flour");
    assert_eq!(record["receivingQuantity"], 30.0);
    assert_eq!(record["storageConditions"], "Room Temperature");
}

#[test]
fn test_raw_new_missing_field_fails() {
    let ws = Workspace::new();
    ws.cmd()
        .args([
            "raw",
            "new",
            "--name",
            "Sugar",
            "--quantity",
            "1",
            "--manufacturing-date",
            "2025-05-20",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--net-weight is required"));
}

#[test]
fn test_raw_duplicate_explicit_number_fails() {
    let ws = Workspace::new();
    ws.new_raw("Sugar");

    ws.cmd()
        .args([
            "raw",
            "new",
            "-t",
            "AR25060101",
            "--name",
            "Salt",
            "--net-weight",
            "1",
            "--quantity",
            "1",
            "--manufacturing-date",
            "2025-05-20",
            "--expire-date",
            "2026-05-20",
            "--vendor",
            "Sea Salt Co",
            "--country",
            "KR",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already in use"));
}

#[test]
fn test_raw_rejects_packing_number() {
    let ws = Workspace::new();
    ws.cmd()
        .args([
            "raw",
            "new",
            "-t",
            "AP25060101",
            "--name",
            "Salt",
            "--net-weight",
            "1",
            "--quantity",
            "1",
            "--manufacturing-date",
            "2025-05-20",
            "--expire-date",
            "2026-05-20",
            "--vendor",
            "Sea Salt Co",
            "--country",
            "KR",
        ])
        .assert()
        .failure();
}

#[test]
fn test_raw_capacity_exceeded() {
    let ws = Workspace::new();
    ws.cmd()
        .args([
            "raw",
            "new",
            "-t",
            "AR25060199",
            "--name",
            "Salt",
            "--net-weight",
            "1",
            "--quantity",
            "1",
            "--manufacturing-date",
            "2025-05-20",
            "--expire-date",
            "2026-05-20",
            "--vendor",
            "Sea Salt Co",
            "--country",
            "KR",
        ])
        .assert()
        .success();

    ws.cmd()
        .args(["raw", "next-number", "--date", "2025-06-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no test numbers left"));
}

#[test]
fn test_raw_list_formats() {
    let ws = Workspace::new();
    ws.new_raw("Sugar");
    ws.new_raw("Salt");

    let list = ws.json(&["raw", "list"]);
    assert_eq!(list.as_array().unwrap().len(), 2);

    ws.cmd()
        .args(["raw", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TEST NO"))
        .stdout(predicate::str::contains("2 raw material(s) found."));

    ws.cmd()
        .args(["raw", "list", "--search", "salt", "-f", "id"])
        .assert()
        .success()
        .stdout("AR25060102\n");

    ws.cmd()
        .args(["raw", "list", "--count"])
        .assert()
        .success()
        .stdout("2\n");

    ws.cmd()
        .args(["raw", "list", "-f", "csv", "--columns", "test-number,name"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("test_number,name\n"));
}

#[test]
fn test_raw_list_empty() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["raw", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No raw materials found."));
}

#[test]
fn test_raw_check_with_exclusion() {
    let ws = Workspace::new();
    ws.new_raw("Sugar");
    let id = ws.json(&["raw", "show", "AR25060101"])["id"].as_i64().unwrap();

    let taken = ws.json(&["raw", "check", "AR25060101"]);
    assert_eq!(taken["exists"], true);

    let own = ws.json(&["raw", "check", "AR25060101", "--exclude", &id.to_string()]);
    assert_eq!(own["exists"], false);

    ws.cmd()
        .args(["raw", "check", "AR25060102"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is available"));
}

#[test]
fn test_raw_edit_and_clear() {
    let ws = Workspace::new();
    ws.new_raw("Sugar");

    ws.cmd()
        .args([
            "raw",
            "edit",
            "AR25060101",
            "--quantity",
            "9",
            "--memo",
            "checked",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated raw material AR25060101"));

    let record = ws.json(&["raw", "show", "AR25060101"]);
    assert_eq!(record["quantity"], 9);
    assert_eq!(record["memo"], "checked");
    assert_eq!(record["name"], "Sugar");

    ws.stdout(&["raw", "edit", "AR25060101", "--clear-memo"]);
    let record = ws.json(&["raw", "show", "AR25060101"]);
    assert!(record["memo"].is_null());

    ws.stdout(&["raw", "edit", "AR25060101", "--memo", "recount"]);
    ws.stdout(&["raw", "edit", "AR25060101", "--memo", "  "]);
    let record = ws.json(&["raw", "show", "AR25060101"]);
    assert!(record["memo"].is_null());
}

#[test]
fn test_raw_edit_negative_quantity_rejected() {
    let ws = Workspace::new();
    ws.new_raw("Sugar");
    ws.cmd()
        .args(["raw", "edit", "AR25060101", "--quantity=-3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("quantity"));
}

#[test]
fn test_raw_delete_requires_confirmation() {
    let ws = Workspace::new();
    ws.new_raw("Sugar");

    ws.cmd()
        .args(["raw", "delete", "AR25060101"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    ws.cmd()
        .args(["raw", "delete", "AR25060101", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted raw material AR25060101"));

    ws.cmd()
        .args(["raw", "show", "AR25060101"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_raw_latest_by_name() {
    let ws = Workspace::new();
    ws.new_raw("Sugar");
    ws.new_raw("Sugar");
    ws.new_raw("Salt");

    ws.cmd()
        .args(["raw", "latest", "Sugar", "-f", "id"])
        .assert()
        .success()
        .stdout("AR25060102\n");

    ws.cmd()
        .args(["raw", "latest", "Pepper"])
        .assert()
        .failure();
}

// ============================================================================
// Master Tests
// ============================================================================

#[test]
fn test_master_receive_derives_expire_date() {
    let ws = Workspace::new();
    ws.new_master("Milk powder", "730");

    let number = ws
        .stdout(&[
            "raw",
            "new",
            "--master",
            "Milk powder",
            "--date",
            "2025-06-01",
            "--manufacturing-date",
            "2025-01-01",
            "--quantity",
            "2",
            "-f",
            "id",
        ])
        .trim()
        .to_string();
    assert_eq!(number, "AR25060101");

    let record = ws.json(&["raw", "show", &number]);
    assert_eq!(record["expireDate"], "2027-01-01");
    assert_eq!(record["receivingQuantity"], 40.0);
    assert_eq!(record["storageConditions"], "Refrigerating Temperature");
    assert_eq!(record["memo"], "keep sealed");
}

#[test]
fn test_master_delete_keeps_received_records() {
    let ws = Workspace::new();
    ws.new_master("Milk powder", "365");
    ws.stdout(&[
        "raw",
        "new",
        "--master",
        "Milk powder",
        "--manufacturing-date",
        "2025-01-01",
        "--quantity",
        "1",
    ]);

    ws.cmd()
        .args(["master", "delete", "Milk powder", "--yes"])
        .assert()
        .success();

    assert_eq!(ws.json(&["master", "list"]).as_array().unwrap().len(), 0);
    let records = ws.json(&["raw", "list"]);
    assert_eq!(records.as_array().unwrap().len(), 1);
    assert_eq!(records[0]["name"], "Milk powder");
}

#[test]
fn test_master_duplicate_name_fails() {
    let ws = Workspace::new();
    ws.new_master("Milk powder", "365");
    ws.cmd()
        .args([
            "master",
            "new",
            "--name",
            "Milk powder",
            "--shelf-life-days",
            "10",
            "--net-weight",
            "1",
            "--vendor",
            "Other",
            "--country",
            "KR",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_master_search_sorted_by_name() {
    let ws = Workspace::new();
    ws.new_master("Skim milk powder", "365");
    ws.new_master("Cocoa powder", "540");
    ws.new_master("Whole milk powder", "365");

    ws.cmd()
        .args(["master", "search", "milk", "-f", "id"])
        .assert()
        .success()
        .stdout("Skim milk powder\nWhole milk powder\n");

    ws.cmd()
        .args(["master", "list", "-f", "id"])
        .assert()
        .success()
        .stdout("Cocoa powder\nSkim milk powder\nWhole milk powder\n");
}

#[test]
fn test_master_expand_preview() {
    let ws = Workspace::new();
    ws.new_master("Milk powder", "730");

    let draft = ws.json(&[
        "master",
        "expand",
        "Milk powder",
        "--manufacturing-date",
        "2025-01-01",
        "--quantity",
        "2",
    ]);
    assert_eq!(draft["expireDate"], "2027-01-01");
    assert_eq!(draft["receivingQuantity"], 40.0);
    assert!(draft.get("testNumber").is_none());

    // Nothing was saved
    assert_eq!(ws.json(&["raw", "list"]).as_array().unwrap().len(), 0);
}

// ============================================================================
// Packing Material Tests
// ============================================================================

fn new_pack(ws: &Workspace, extra: &[&str]) -> String {
    let mut args = vec![
        "pack",
        "new",
        "--date",
        "2025-06-01",
        "--product",
        "Choco Bar",
        "--material",
        "Outer film",
        "--quantity",
        "5000",
        "--lot",
        "L-2291",
        "--expire-date",
        "2027-01-31",
        "--category",
        "film",
        "--vendor",
        "PackCo",
        "-f",
        "id",
    ];
    args.extend_from_slice(extra);
    ws.stdout(&args).trim().to_string()
}

#[test]
fn test_pack_new_defaults_to_pass() {
    let ws = Workspace::new();
    assert_eq!(new_pack(&ws, &[]), "AP25060101");
    assert_eq!(new_pack(&ws, &["--result", "fail"]), "AP25060102");

    let first = ws.json(&["pack", "show", "AP25060101"]);
    assert_eq!(first["result"], true);
    assert_eq!(first["lotNumber"], "L-2291");

    ws.cmd()
        .args(["pack", "list", "--result", "fail", "-f", "id"])
        .assert()
        .success()
        .stdout("AP25060102\n");
}

#[test]
fn test_pack_edit_and_delete() {
    let ws = Workspace::new();
    new_pack(&ws, &[]);

    ws.stdout(&["pack", "edit", "AP25060101", "--result", "fail", "--lot", "L-3000"]);
    let record = ws.json(&["pack", "show", "AP25060101"]);
    assert_eq!(record["result"], false);
    assert_eq!(record["lotNumber"], "L-3000");

    ws.cmd()
        .args(["pack", "delete", "AP25060101", "-y"])
        .assert()
        .success();
    assert_eq!(ws.json(&["pack", "list"]).as_array().unwrap().len(), 0);
}

// ============================================================================
// Bridge Tests
// ============================================================================

#[test]
fn test_bridge_round_trip() {
    let ws = Workspace::new();
    let input = [
        r#"{"channel":"raw-materials:generateTestNumber","date":"2025-06-01"}"#,
        r#"{"channel":"raw-material-masters:create","master":{"name":"Sugar","shelfLifeDays":365,"netWeight":25,"weightUnit":"kg","vendor":"Daehan","country":"KR","storageConditions":"Room Temperature"}}"#,
        r#"{"channel":"raw-material-masters:search","query":"sug"}"#,
        r#"{"channel":"raw-materials:getById","id":99}"#,
        r#"not json"#,
    ]
    .join("\n");

    let output = ws.cmd().arg("bridge").write_stdin(input).output().unwrap();
    assert!(output.status.success());

    let lines: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0]["data"], "AR25060101");
    assert_eq!(lines[1]["ok"], true);
    assert_eq!(lines[1]["data"]["shelfLifeDays"], 365);
    assert_eq!(lines[2]["data"].as_array().unwrap().len(), 1);
    assert!(lines[3]["data"].is_null());
    assert_eq!(lines[4]["ok"], false);
    assert_eq!(lines[4]["error"]["kind"], "ValidationFailure");
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_config_show_database_key() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["config", "show", "database"])
        .assert()
        .success()
        .stdout(predicate::str::contains("inventory.db"));

    ws.cmd()
        .args(["config", "show", "editor"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown key"));
}

#[test]
fn test_config_default_format_from_env() {
    let ws = Workspace::new();
    ws.new_raw("Sugar");

    let output = ws
        .cmd()
        .env("LILERP_FORMAT", "json")
        .args(["raw", "list"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);
}
