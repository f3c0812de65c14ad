//! JSON output contract tests.
//!
//! Every `--json` command must print exactly one JSON value on stdout and
//! report failures through its exit code. Scripts depend on both.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::TempDir;

fn gpaste() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gpaste"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Assert stdout is a single, parseable JSON value with no extra lines.
fn assert_single_json(stdout: &str) -> serde_json::Value {
    let trimmed = stdout.trim();
    assert!(!trimmed.is_empty(), "stdout should not be empty");

    let val: serde_json::Value = serde_json::from_str(trimmed)
        .unwrap_or_else(|e| panic!("stdout must be valid JSON.\nParse error: {}\nstdout:\n{}", e, trimmed));

    let re_serialized = serde_json::to_string(&val).unwrap();
    let re_parsed: serde_json::Value = serde_json::from_str(&re_serialized).unwrap();
    assert_eq!(val, re_parsed, "JSON round-trip should be stable");

    val
}

const ITEMS_TABLE: &str = r#"
name = "Items"
mode = "edit"
id_column = "id"

[[columns]]
id = "id"
kind = "integer"
required = true

[[columns]]
id = "name"
required = true

[[columns]]
id = "value"
kind = "integer"
rule = { type = "whole_number", operator = "between", value1 = 0, value2 = 1000 }
"#;

const ITEMS_DATA: &str = r#"[
  {"id": 1, "name": "Alpha", "value": 10},
  {"id": 2, "name": "Beta", "value": 20}
]"#;

/// Temp dir holding `items.toml`, `items.json` and `clip.tsv`.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(table: &str, clipboard: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("items.toml"), table).unwrap();
        std::fs::write(dir.path().join("items.json"), ITEMS_DATA).unwrap();
        std::fs::write(dir.path().join("clip.tsv"), clipboard).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn paste(&self) -> Command {
        let mut cmd = gpaste();
        cmd.arg("paste")
            .arg("--table")
            .arg(self.path("items.toml"))
            .arg("--data")
            .arg(self.path("items.json"))
            .arg("--clipboard")
            .arg(self.path("clip.tsv"));
        cmd
    }
}

fn create_table() -> String {
    ITEMS_TABLE.replace("mode = \"edit\"", "mode = \"create\"")
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

// ===========================================================================
// gpaste paste --json
// ===========================================================================

#[test]
fn paste_json_reports_edit_state() {
    let fx = Fixture::new(ITEMS_TABLE, "1\tUpdated\t100");
    let output = fx.paste().arg("--json").output().unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json = assert_single_json(&String::from_utf8_lossy(&output.stdout));

    assert_eq!(json["table"], "Items");
    assert_eq!(json["outcome"]["kind"], "table");
    assert_eq!(json["outcome"]["unmatched"], 0);
    assert_eq!(json["has_unsaved_changes"], true);
    assert_eq!(json["dirty"].as_array().unwrap().len(), 1);
    assert_eq!(json["validation"]["is_valid"], true);

    let rows = json["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2, "edit tables carry no ghost row");
    assert_eq!(rows[0]["cells"]["name"], "Updated");
    assert_eq!(rows[0]["cells"]["value"], "100");
    assert_eq!(rows[1]["cells"]["name"], "Beta");
}

#[test]
fn paste_apply_writes_dirty_rows() {
    let fx = Fixture::new(ITEMS_TABLE, "id\tname\tvalue\n1\tUpdated\t100\n");
    let out = fx.path("changed.json");
    let output = fx
        .paste()
        .args(["--apply", "--json", "--output"])
        .arg(&out)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json = assert_single_json(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(json["persisted"].as_array().unwrap().len(), 1);
    assert_eq!(json["has_unsaved_changes"], false);
    assert!(json.get("persisted_rows").is_none());

    assert_eq!(
        read_json(&out),
        serde_json::json!([{ "id": 1, "name": "Updated", "value": 100 }])
    );
}

#[test]
fn paste_apply_without_output_prints_rows() {
    let fx = Fixture::new(ITEMS_TABLE, "2\tChanged\t20");
    let output = fx.paste().arg("--apply").output().unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json = assert_single_json(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(json, serde_json::json!([{ "id": 2, "name": "Changed", "value": 20 }]));
    assert!(String::from_utf8_lossy(&output.stderr).contains("table paste: 1 updated"));
}

#[test]
fn paste_apply_blocked_by_validation() {
    let fx = Fixture::new(ITEMS_TABLE, "1\tUpdated\t5000");
    let out = fx.path("changed.json");
    let output = fx
        .paste()
        .args(["--apply", "--json", "--output"])
        .arg(&out)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(6));
    let json = assert_single_json(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(json["validation"]["is_valid"], false);
    let errors = json["validation"]["errors"].as_object().unwrap();
    let fields = errors.values().next().unwrap();
    assert_eq!(fields["value"], "must be between 0 and 1000");
    assert!(json.get("persisted").is_none());
    assert!(!out.exists(), "nothing is written when validation fails");
}

#[test]
fn paste_at_ghost_creates_row() {
    let fx = Fixture::new(&create_table(), "3\tGamma\t30");
    let output = fx.paste().args(["--at", "ghost:id", "--json"]).output().unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json = assert_single_json(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(json["outcome"]["kind"], "anchored");
    assert_eq!(json["outcome"]["created"].as_array().unwrap().len(), 1);

    let rows = json["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[2]["cells"]["name"], "Gamma");
    assert_eq!(rows[3]["id"], "__ghost__");
}

#[test]
fn paste_single_cell_at_row_key() {
    let fx = Fixture::new(ITEMS_TABLE, "Renamed\n");
    let output = fx.paste().args(["--at", "2:name", "--json"]).output().unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json = assert_single_json(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(json["outcome"]["kind"], "cell");
    assert_eq!(json["outcome"]["changed"], true);
    assert_eq!(json["rows"][1]["cells"]["name"], "Renamed");
}

#[test]
fn paste_reads_clipboard_from_stdin() {
    let fx = Fixture::new(ITEMS_TABLE, "");
    let mut child = gpaste()
        .arg("paste")
        .arg("--table")
        .arg(fx.path("items.toml"))
        .arg("--data")
        .arg(fx.path("items.json"))
        .arg("--json")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"1,\"Smith, J\",7\r\n").unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json = assert_single_json(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(json["rows"][0]["cells"]["name"], "Smith, J");
}

#[test]
fn paste_unknown_anchor_is_usage_error() {
    let fx = Fixture::new(ITEMS_TABLE, "x");

    let output = fx.paste().args(["--at", "9:name"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no row with id '9'"));

    let output = fx.paste().args(["--at", "ghost:name"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "edit tables have no ghost row");

    let output = fx.paste().args(["--at", "1:price"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("available columns: id, name, value"));
}

// ===========================================================================
// gpaste check --json
// ===========================================================================

#[test]
fn check_json_lists_issues() {
    let fx = Fixture::new(ITEMS_TABLE, "");
    let data = fx.path("items.csv");
    std::fs::write(&data, "id,name,value\n1,Alpha,10\n2,,2000\n").unwrap();

    let output = gpaste()
        .arg("check")
        .arg("--table")
        .arg(fx.path("items.toml"))
        .arg("--data")
        .arg(&data)
        .arg("--json")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(6));
    let json = assert_single_json(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(json["valid"], false);
    assert_eq!(json["rows"], 2);
    assert_eq!(json["invalid_rows"], 1);

    let errors = json["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e["key"] == "2"));
    assert!(errors.iter().any(|e| e["field"] == "name" && e["message"] == "is required"));
    assert!(errors.iter().any(|e| e["field"] == "value" && e["message"] == "must be between 0 and 1000"));
}

#[test]
fn check_valid_dataset_succeeds() {
    let fx = Fixture::new(ITEMS_TABLE, "");
    let output = gpaste()
        .arg("check")
        .arg("-t")
        .arg(fx.path("items.toml"))
        .arg("-d")
        .arg(fx.path("items.json"))
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "ok: 2 row(s) valid");
}

#[test]
fn check_malformed_dataset_is_parse_error() {
    let fx = Fixture::new(ITEMS_TABLE, "");
    let data = fx.path("broken.json");
    std::fs::write(&data, r#"{"id": 1}"#).unwrap();

    let output = gpaste()
        .arg("check")
        .arg("-t")
        .arg(fx.path("items.toml"))
        .arg("-d")
        .arg(&data)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5));
}

// ===========================================================================
// gpaste table validate --json
// ===========================================================================

#[test]
fn table_validate_json() {
    let fx = Fixture::new(ITEMS_TABLE, "");
    let output = gpaste()
        .args(["table", "validate", "--json"])
        .arg(fx.path("items.toml"))
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json = assert_single_json(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(json["valid"], true);
    assert_eq!(json["name"], "Items");
    assert_eq!(json["mode"], "edit");
    assert_eq!(json["columns"][2]["kind"], "integer");
}

#[test]
fn table_validate_rejects_unknown_id_column() {
    let fx = Fixture::new(&ITEMS_TABLE.replace("id_column = \"id\"", "id_column = \"sku\""), "");
    let output = gpaste()
        .args(["table", "validate"])
        .arg(fx.path("items.toml"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(4));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("id_column 'sku'"));
}

#[test]
fn missing_table_file_is_io_error() {
    let output = gpaste()
        .args(["table", "validate", "does-not-exist.toml"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn long_version_reports_build_details() {
    let out = gpaste().arg("--version").output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "{}", stdout);
    assert!(stdout.contains("\ntarget:  "), "{}", stdout);
    assert!(stdout.contains("\nprofile: "), "{}", stdout);
}
