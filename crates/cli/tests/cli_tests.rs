// Integration tests for the `gmerge` binary.
// Run with: cargo test -p gridmerge-cli --test cli_tests -- --nocapture

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

/// Every run points at a settings file inside the temp dir so the user's
/// config directory is never touched.
fn gmerge(dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gmerge"));
    cmd.current_dir(dir.path());
    cmd.env("GMERGE_SETTINGS", dir.path().join("settings.json"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn run_with_stdin(mut cmd: Command, input: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn gmerge");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().expect("wait for gmerge")
}

fn sales_and_returns(dir: &TempDir) -> (PathBuf, PathBuf) {
    let sales = write(dir, "Sales.csv", "Region,Qty\nNorth,10\nSouth,7\nEast,3\n");
    let returns = write(dir, "Returns.csv", "Qty\n2\n");
    (sales, returns)
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

#[test]
fn merge_two_files_to_stdout() {
    let dir = TempDir::new().unwrap();
    let (sales, returns) = sales_and_returns(&dir);

    let output = gmerge(&dir)
        .args(["merge", path_arg(&sales), path_arg(&returns), "--name", "Combined"])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout,
        "Sales_Region,Sales_Qty,Returns_Qty\nNorth,10,2\nSouth,7,\nEast,3,\n"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("created table 'Combined' (3 rows, 3 columns)"));
}

#[test]
fn merge_same_table_name_twice_gets_unique_columns() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "Sales.csv", "Qty\n1\n2\n3\n");
    fs::create_dir(dir.path().join("b")).unwrap();
    let b = dir.path().join("b").join("Sales.csv");
    fs::write(&b, "Qty\n9\n8\n").unwrap();

    let output = gmerge(&dir)
        .args(["merge", path_arg(&a), path_arg(&b), "-y", "-t", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["table"], "Merged_Selections");
    assert_eq!(json["columns"], serde_json::json!(["Sales_Qty", "Sales_Qty_1"]));
    assert_eq!(json["rows"][2], serde_json::json!(["3", ""]));
}

#[test]
fn merge_writes_output_file_by_extension() {
    let dir = TempDir::new().unwrap();
    let (sales, returns) = sales_and_returns(&dir);
    let out = dir.path().join("merged.tsv");

    let output = gmerge(&dir)
        .args(["merge", path_arg(&sales), path_arg(&returns), "-y", "-q", "-o", path_arg(&out)])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.stderr.is_empty(), "quiet run wrote: {}", stderr);
    let content = fs::read_to_string(&out).unwrap();
    assert!(content.starts_with("Sales_Region\tSales_Qty\tReturns_Qty\n"));
}

#[test]
fn merge_reads_name_from_stdin() {
    let dir = TempDir::new().unwrap();
    let (sales, returns) = sales_and_returns(&dir);

    let mut cmd = gmerge(&dir);
    cmd.args(["merge", path_arg(&sales), path_arg(&returns), "-t", "json"]);
    let output = run_with_stdin(cmd, "  \nFromPrompt\n");

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["table"], "FromPrompt");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Please enter a table name"));
}

#[test]
fn merge_uses_default_name_from_settings() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "settings.json",
        "{\n  // custom\n  \"merge.defaultTableName\": \"Quarterly\"\n}\n",
    );
    let (sales, returns) = sales_and_returns(&dir);

    let mut cmd = gmerge(&dir);
    cmd.args(["merge", path_arg(&sales), path_arg(&returns), "-t", "json"]);
    // Empty line keeps the suggestion
    let output = run_with_stdin(cmd, "\n");

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["table"], "Quarterly");
}

#[test]
fn merge_cancelled_at_eof() {
    let dir = TempDir::new().unwrap();
    let (sales, returns) = sales_and_returns(&dir);

    let mut cmd = gmerge(&dir);
    cmd.args(["merge", path_arg(&sales), path_arg(&returns)]);
    let output = run_with_stdin(cmd, "");

    assert_eq!(output.status.code(), Some(6));
    assert!(output.stdout.is_empty());
}

#[test]
fn merge_blank_name_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let (sales, _) = sales_and_returns(&dir);

    let output = gmerge(&dir)
        .args(["merge", path_arg(&sales), "--name", "   "])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn merge_missing_file_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let output = gmerge(&dir)
        .args(["merge", "does-not-exist.csv", "-y"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot read"));
}

#[test]
fn merge_empty_file_fails_validation() {
    let dir = TempDir::new().unwrap();
    let empty = write(&dir, "empty.csv", "");

    let output = gmerge(&dir).args(["merge", path_arg(&empty), "-y"]).output().unwrap();
    assert_eq!(output.status.code(), Some(7));
    assert!(String::from_utf8_lossy(&output.stderr).contains("empty.csv: file is empty"));
}

#[test]
fn merge_corrupt_workbook_fails_validation() {
    let dir = TempDir::new().unwrap();
    let book = write(&dir, "book.xlsx", "definitely not a zip");

    let output = gmerge(&dir).args(["merge", path_arg(&book), "-y"]).output().unwrap();
    assert_eq!(output.status.code(), Some(7));
    assert!(String::from_utf8_lossy(&output.stderr).contains("book.xlsx:"));
}

#[test]
fn merge_rejects_non_delimited_files() {
    let dir = TempDir::new().unwrap();
    // Passes validation with a warning, but cannot be captured
    let ods = write(&dir, "calc.ods", "PK");

    let output = gmerge(&dir).args(["merge", path_arg(&ods), "-y"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("only delimited text files"));
}

#[test]
fn merge_txt_with_pipes() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "log.txt", "Level|Message\nwarn|disk\n");

    let output = gmerge(&dir)
        .args(["merge", path_arg(&file), "--name", "Logs"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "log_Level,log_Message\nwarn,disk\n");
}

#[test]
fn merge_warns_when_delimiter_is_a_guess() {
    let dir = TempDir::new().unwrap();
    let ragged = write(&dir, "ragged.csv", "A,B,C\n1,2\n3,4,5\n");

    let output = gmerge(&dir)
        .args(["merge", path_arg(&ragged), "--name", "Ragged"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("delimiter is a guess"), "stderr: {}", stderr);
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "ragged_A,ragged_B,ragged_C\n1,2,\n3,4,5\n"
    );
}

#[test]
fn merge_output_write_failure_is_logged() {
    let dir = TempDir::new().unwrap();
    let (sales, _) = sales_and_returns(&dir);
    let out = dir.path().join("missing-dir").join("merged.csv");

    let output = gmerge(&dir)
        .args(["merge", path_arg(&sales), "-y", "-o", path_arg(&out)])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("could not write merged table"), "stderr: {}", stderr);
    assert!(stderr.contains("error: "));
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_ok() {
    let dir = TempDir::new().unwrap();
    let (sales, returns) = sales_and_returns(&dir);

    let output = gmerge(&dir)
        .args(["validate", path_arg(&sales), path_arg(&returns)])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("ok: 2 file(s)"));
}

#[test]
fn validate_json_reports_every_problem() {
    let dir = TempDir::new().unwrap();
    let doc = write(&dir, "notes.docx", "hello");
    let big = write(&dir, "big.csv", "A\n0123456789\n");

    let output = gmerge(&dir)
        .args(["validate", path_arg(&doc), path_arg(&big), "--json", "--max-size", "5"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(7));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["isValid"], false);
    let errors = report["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].as_str().unwrap().contains(".docx"));
    assert!(errors[1].as_str().unwrap().starts_with("big.csv"));
}

#[test]
fn validate_respects_settings_extensions() {
    let dir = TempDir::new().unwrap();
    write(&dir, "settings.json", r#"{ "import.allowedExtensions": ["csv"] }"#);
    let tsv = write(&dir, "data.tsv", "A\tB\n1\t2\n");

    let output = gmerge(&dir).args(["validate", path_arg(&tsv)]).output().unwrap();
    assert_eq!(output.status.code(), Some(7));
}

// ---------------------------------------------------------------------------
// settings
// ---------------------------------------------------------------------------

#[test]
fn settings_init_then_show() {
    let dir = TempDir::new().unwrap();

    let init = gmerge(&dir).args(["settings", "init"]).output().unwrap();
    assert!(init.status.success());
    assert!(dir.path().join("settings.json").exists());

    // Second init without --force refuses
    let again = gmerge(&dir).args(["settings", "init"]).output().unwrap();
    assert_eq!(again.status.code(), Some(2));

    let show = gmerge(&dir).args(["settings", "show"]).output().unwrap();
    assert!(show.status.success());
    let settings: serde_json::Value = serde_json::from_slice(&show.stdout).unwrap();
    assert_eq!(settings["merge.defaultTableName"], "Merged_Selections");
    assert_eq!(settings["merge.maxNameRetries"], 10);
}
