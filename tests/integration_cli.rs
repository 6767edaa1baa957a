use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("write fixture");
    path
}

#[test]
fn analyze_prints_transformations() {
    let dir = tempdir().expect("tempdir");
    let file = write(dir.path(), "chain.lp", "a. b :- a. c :- b.\n");

    let mut cmd = cargo_bin_cmd!("asprov");
    cmd.arg("analyze").arg(&file);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("transformation 1"))
        .stdout(predicate::str::contains("  b :- a."))
        .stdout(predicate::str::contains("transformation 2"))
        .stdout(predicate::str::contains("sequence "));
}

#[test]
fn analyze_json_report_has_schema_version() {
    let dir = tempdir().expect("tempdir");
    let file = write(dir.path(), "p.lp", "a. b :- not c, a. c :- not b, a.\n");

    let mut cmd = cargo_bin_cmd!("asprov");
    cmd.arg("analyze").arg(&file).arg("--format").arg("json");
    let output = cmd.assert().success().get_output().stdout.clone();
    let json: Value = serde_json::from_slice(&output).expect("json report");
    assert_eq!(json["schema_version"], "1.0.0");
    assert_eq!(json["transformations"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["transformations"][0]["recursive"], true);
}

#[test]
fn analyze_fails_on_rejected_statement() {
    let dir = tempdir().expect("tempdir");
    let file = write(dir.path(), "p.lp", "a; b.\nc :- d.\n");

    let mut cmd = cargo_bin_cmd!("asprov");
    cmd.arg("analyze").arg(&file);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("E-UNSUPPORTED"))
        .stderr(predicate::str::contains("at 1:1"));
}

#[test]
fn diagnostics_name_the_input_file() {
    let dir = tempdir().expect("tempdir");
    let file = write(dir.path(), "rejected.lp", "a; b.\nc :- d.\n");

    let mut cmd = cargo_bin_cmd!("asprov");
    cmd.arg("analyze").arg(&file);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains(format!(
            "{}: E-UNSUPPORTED",
            file.display()
        )));
}

#[test]
fn config_errors_name_the_config_file() {
    let dir = tempdir().expect("tempdir");
    let file = write(dir.path(), "p.lp", "b :- a.\n");
    let config = write(dir.path(), "bad.toml", "model_name = \"Model\"\n");

    let mut cmd = cargo_bin_cmd!("asprov");
    cmd.arg("analyze").arg(&file).arg("--config").arg(&config);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains(format!(
            "{}: E-CONFIG",
            config.display()
        )));
}

#[test]
fn analyze_warns_but_succeeds_on_minimize() {
    let dir = tempdir().expect("tempdir");
    let file = write(dir.path(), "p.lp", "a :- b.\n#minimize { 1, X : p(X) }.\n");

    let mut cmd = cargo_bin_cmd!("asprov");
    cmd.arg("analyze").arg(&file);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("pass-through"))
        .stderr(predicate::str::contains("W-UNSUPPORTED"));
}

#[test]
fn reify_prints_instrumented_program() {
    let dir = tempdir().expect("tempdir");
    let file = write(dir.path(), "p.lp", "c(1).\nb(X) :- c(X), not a(X).\n");

    let mut cmd = cargo_bin_cmd!("asprov");
    cmd.arg("reify").arg(&file);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("c(1)."))
        .stdout(predicate::str::contains(
            "h(1,b(X),(c(X),)) :- b(X); c(X); not a(X).",
        ));
}

#[test]
fn reify_uses_configured_name() {
    let dir = tempdir().expect("tempdir");
    let file = write(dir.path(), "p.lp", "b :- a.\n");
    let config = write(dir.path(), "asprov.toml", "provenance_name = \"why\"\n");

    let mut cmd = cargo_bin_cmd!("asprov");
    cmd.arg("reify").arg(&file).arg("--config").arg(&config);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("why(1,b,(a,))"));
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempdir().expect("tempdir");
    let file = write(dir.path(), "p.lp", "b :- a.\n");
    let config = write(dir.path(), "asprov.toml", "model_name = \"Model\"\n");

    let mut cmd = cargo_bin_cmd!("asprov");
    cmd.arg("analyze").arg(&file).arg("--config").arg(&config);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("E-CONFIG"));
}

#[test]
fn fmt_prints_canonical_program() {
    let dir = tempdir().expect("tempdir");
    let file = write(dir.path(), "p.lp", "b(X):-c(X),not a(X).   a.\n");

    let mut cmd = cargo_bin_cmd!("asprov");
    cmd.arg("fmt").arg(&file);
    cmd.assert()
        .success()
        .stdout(predicate::eq("b(X) :- c(X); not a(X).\na.\n"));
}

#[test]
fn hash_is_stable_across_formatting() {
    let dir = tempdir().expect("tempdir");
    let a = write(dir.path(), "a.lp", "c :- b. b :- a.\n");
    let b = write(dir.path(), "b.lp", "b:-a.\n\nc :-\n  b.\n");

    let run = |file: &Path| {
        let mut cmd = cargo_bin_cmd!("asprov");
        cmd.arg("hash").arg(file);
        cmd.assert().success().get_output().stdout.clone()
    };
    assert_eq!(run(&a), run(&b));
}

#[test]
fn explain_decodes_model() {
    let dir = tempdir().expect("tempdir");
    let program = write(dir.path(), "p.lp", "a. b :- a.\n");
    let model = write(dir.path(), "model.txt", "a b h(1,b,(a,))\n");

    let mut cmd = cargo_bin_cmd!("asprov");
    cmd.arg("explain").arg(&program).arg(&model);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("b <- [1] a"));
}

#[test]
fn missing_file_is_io_error() {
    let mut cmd = cargo_bin_cmd!("asprov");
    cmd.arg("analyze").arg("does-not-exist.lp");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("E-IO"));
}

#[test]
fn parse_error_is_reported_with_position() {
    let dir = tempdir().expect("tempdir");
    let file = write(dir.path(), "p.lp", "a.\nb :- .\n");

    let mut cmd = cargo_bin_cmd!("asprov");
    cmd.arg("analyze").arg(&file);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("E-PARSE"))
        .stderr(predicate::str::contains("2:"));
}
