//! End-to-end tests for the `handc` binary.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn handc() -> Command {
    Command::cargo_bin("handc").expect("handc binary builds")
}

fn write_source(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn read_report(out: &Path) -> serde_json::Value {
    let text = std::fs::read_to_string(out.join("build_report.json"))
        .expect("build_report.json exists");
    serde_json::from_str(&text).unwrap()
}

#[test]
fn python_target_builds_with_report() {
    let tmp = TempDir::new().unwrap();
    let src = write_source(tmp.path(), "p.hand", "x: Int = 1\nshow x\n");
    let out = tmp.path().join("dist");

    handc()
        .arg(&src)
        .args(["--target", "python"])
        .arg("--out")
        .arg(&out)
        .args(["--level", "2"])
        .args(["--emit-ir", "--emit-ast"])
        .assert()
        .success();

    assert!(out.join("main.py").exists());
    assert!(out.join("ir.json").exists());
    assert!(out.join("ast.json").exists());

    let report = read_report(&out);
    assert_eq!(report["schema_version"], "0.1");
    assert_eq!(report["status"], "ok");
    assert_eq!(report["artifacts"]["target"], "python");
    assert_eq!(report["artifacts"]["outputs"][0], "main.py");
    assert_eq!(report["artifacts"]["emitted_ir"], "ir.json");
    assert_eq!(report["capabilities"]["supervision_level"], 2);
    assert_eq!(report["capabilities"]["declared"][0], "compute");
    assert_eq!(report["capabilities"]["declared"][1], "io.write");
    assert!(report["capabilities"]["missing"].as_array().unwrap().is_empty());
}

#[test]
fn show_at_level_1_is_denied_with_exit_2() {
    let tmp = TempDir::new().unwrap();
    let src = write_source(tmp.path(), "p.hand", "show 1\n");
    let out = tmp.path().join("dist");

    handc()
        .arg(&src)
        .args(["--target", "python", "--level", "1"])
        .arg("--out")
        .arg(&out)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("HND-CAP-0101"));

    let report = read_report(&out);
    assert_eq!(report["status"], "error");
    assert_eq!(report["diagnostics"][0]["code"], "HND-CAP-0101");
    assert_eq!(report["diagnostics"][0]["severity"], "fatal");
}

#[test]
fn ask_at_level_2_needs_approval() {
    let tmp = TempDir::new().unwrap();
    let src = write_source(tmp.path(), "p.hand", "x: Text = ask(\"p\")\n");
    let out = tmp.path().join("dist");

    handc()
        .arg(&src)
        .args(["--target", "python", "--level", "2"])
        .arg("--out")
        .arg(&out)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("HND-CAP-0102"));

    let report = read_report(&out);
    assert!(report["capabilities"]["approvals_needed"]
        .as_array()
        .unwrap()
        .iter()
        .any(|v| v == "io.read"));
}

#[test]
fn approval_flag_unlocks_gated_capability() {
    let tmp = TempDir::new().unwrap();
    let src = write_source(tmp.path(), "p.hand", "x: Text = ask(\"p\")\n");
    let out = tmp.path().join("dist");

    handc()
        .arg(&src)
        .args(["--target", "python", "--level", "2", "--approve", "io.read"])
        .arg("--out")
        .arg(&out)
        .assert()
        .success();
}

#[test]
fn wasm_pure_function_module_builds() {
    let tmp = TempDir::new().unwrap();
    let src = write_source(
        tmp.path(),
        "add.hand",
        "🔧 add(a: Int, b: Int) -> Int:\n    return a + b\n",
    );
    let out = tmp.path().join("dist");

    handc()
        .arg(&src)
        .args(["--target", "wasm", "--level", "1"])
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let wat = std::fs::read_to_string(out.join("main.wat")).unwrap();
    assert!(wat.starts_with("(module"));
    assert!(wat.contains("(export \"add\""));
}

#[test]
fn wasm_rejects_io_with_exit_3_and_degradation() {
    let tmp = TempDir::new().unwrap();
    let src = write_source(tmp.path(), "p.hand", "show 1\n");
    let out = tmp.path().join("dist");

    handc()
        .arg(&src)
        .args(["--target", "wasm", "--level", "2"])
        .arg("--out")
        .arg(&out)
        .assert()
        .code(3);

    let report = read_report(&out);
    assert_eq!(report["status"], "error");
    assert!(report["diagnostics"][0]["code"]
        .as_str()
        .unwrap()
        .starts_with("WASM-"));
    assert_eq!(
        report["degradations"][0]["code"],
        report["diagnostics"][0]["code"]
    );
    assert!(!out.join("main.wat").exists());
}

#[test]
fn sql_empty_program_builds() {
    let tmp = TempDir::new().unwrap();
    let src = write_source(tmp.path(), "empty.hand", "");
    let out = tmp.path().join("dist");

    handc()
        .arg(&src)
        .args(["--target", "sql", "--level", "1"])
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    assert!(out.join("main.sql").exists());
}

#[test]
fn html_show_program_builds() {
    let tmp = TempDir::new().unwrap();
    let src = write_source(tmp.path(), "show.hand", "show \"hi\"\n");
    let out = tmp.path().join("dist");

    handc()
        .arg(&src)
        .args(["--target", "html", "--level", "2"])
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let html = std::fs::read_to_string(out.join("index.html")).unwrap();
    assert!(html.starts_with("<!doctype html>"));
}

#[test]
fn syntax_errors_stop_with_exit_2_and_report() {
    let tmp = TempDir::new().unwrap();
    let src = write_source(tmp.path(), "bad.hand", "a\t= 1\n");
    let out = tmp.path().join("dist");

    handc()
        .arg(&src)
        .args(["--target", "python"])
        .arg("--out")
        .arg(&out)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("HND-LEX-0002"));

    let report = read_report(&out);
    assert_eq!(report["status"], "error");
    // No artifact was produced.
    assert!(report["artifacts"]["outputs"].as_array().unwrap().is_empty());
    assert!(!out.join("main.py").exists());
}

#[test]
fn type_errors_stop_before_lowering() {
    let tmp = TempDir::new().unwrap();
    let src = write_source(tmp.path(), "bad.hand", "x: Int = null\n");
    let out = tmp.path().join("dist");

    handc()
        .arg(&src)
        .args(["--target", "python"])
        .arg("--out")
        .arg(&out)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("HND-TC-0204"));
}

#[test]
fn json_diagnostics_prints_machine_readable_output() {
    let tmp = TempDir::new().unwrap();
    let src = write_source(tmp.path(), "bad.hand", "show y\n");
    let out = tmp.path().join("dist");

    let assert = handc()
        .arg(&src)
        .args(["--target", "python", "--json-diagnostics"])
        .arg("--out")
        .arg(&out)
        .assert()
        .code(2);

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let diags: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(diags[0]["code"], "HND-TC-0101");
    assert_eq!(diags[0]["span"]["line"], 1);
}

#[test]
fn missing_input_file_is_internal_error_with_report() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("dist");

    handc()
        .arg(tmp.path().join("nope.hand"))
        .args(["--target", "python"])
        .arg("--out")
        .arg(&out)
        .assert()
        .code(4);

    let report = read_report(&out);
    assert_eq!(report["status"], "error");
    assert_eq!(report["diagnostics"][0]["code"], "HND-INT-0001");
}

#[test]
fn emitted_ir_is_canonical_and_versioned() {
    let tmp = TempDir::new().unwrap();
    let src = write_source(tmp.path(), "p.hand", "show 1\n");
    let out = tmp.path().join("dist");

    handc()
        .arg(&src)
        .args(["--target", "python", "--emit-ir"])
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let text = std::fs::read_to_string(out.join("ir.json")).unwrap();
    let ir: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(ir["ir_version"], "0.1.0");
    assert_eq!(ir["module"]["toplevel"][0]["kind"], "show");
    assert_eq!(ir["module"]["toplevel"][0]["effects"][0], "io.show");
}

#[test]
fn builds_are_byte_deterministic() {
    let tmp = TempDir::new().unwrap();
    let src = write_source(
        tmp.path(),
        "p.hand",
        "i: Int = 0\nwhile i < 3:\n    i = i + 1\nshow i\n",
    );

    let mut artifacts = Vec::new();
    for run in ["a", "b"] {
        let out = tmp.path().join(run);
        handc()
            .arg(&src)
            .args(["--target", "python", "--emit-ir"])
            .arg("--out")
            .arg(&out)
            .assert()
            .success();
        artifacts.push((
            std::fs::read(out.join("main.py")).unwrap(),
            std::fs::read(out.join("ir.json")).unwrap(),
        ));
    }
    assert_eq!(artifacts[0], artifacts[1]);
}
