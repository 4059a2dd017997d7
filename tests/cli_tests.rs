//! End-to-end runs of the formcheck binary.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn write_fixture(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("formcheck-cli-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

const FORM: &str = r#"{
  "fields": [
    {"id": "name", "label": "Full name", "required": true},
    {"id": "doc", "label": "Supporting document", "type": "file", "required": true},
    {"id": "amount", "label": "Amount", "min": 1, "max": 10000}
  ]
}"#;

#[test]
fn check_reports_errors_and_exits_nonzero() {
    let form = write_fixture("form.json", FORM);
    Command::cargo_bin("formcheck")
        .unwrap()
        .arg("check")
        .arg(&form)
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "The form could not be submitted because 2 errors were found.",
        ))
        .stdout(predicate::str::contains("Error 1: Full name is a required field."))
        .stdout(predicate::str::contains("Error 2: This file is required."));
}

#[test]
fn check_passes_with_complete_values() {
    let form = write_fixture("form-ok.json", FORM);
    let values = write_fixture(
        "values-ok.json",
        r#"{
          "name": "Ada Lovelace",
          "doc": {"name": "report.pdf", "size": 2048},
          "amount": "99999"
        }"#,
    );
    Command::cargo_bin("formcheck")
        .unwrap()
        .arg("check")
        .arg(&form)
        .arg("--values")
        .arg(&values)
        .assert()
        .success()
        .stdout(predicate::str::contains("All fields are valid."));
}

#[test]
fn check_emits_json_reports() {
    let form = write_fixture("form-json.json", FORM);
    Command::cargo_bin("formcheck")
        .unwrap()
        .arg("check")
        .arg(&form)
        .arg("--json")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"valid\": false"))
        .stdout(predicate::str::contains("\"field\": \"doc\""));
}

#[test]
fn french_lang_flag_localizes_the_report() {
    let form = write_fixture("form-fr.json", FORM);
    Command::cargo_bin("formcheck")
        .unwrap()
        .arg("check")
        .arg(&form)
        .arg("--lang")
        .arg("fr")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("2 erreurs ont été trouvées."));
}

#[test]
fn unknown_value_key_is_a_hard_error() {
    let form = write_fixture("form-unknown.json", FORM);
    let values = write_fixture("values-unknown.json", r#"{"nope": "x"}"#);
    Command::cargo_bin("formcheck")
        .unwrap()
        .arg("check")
        .arg(&form)
        .arg("--values")
        .arg(&values)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown field"));
}

#[test]
fn fields_lists_the_declared_fields() {
    let form = write_fixture("form-fields.json", FORM);
    Command::cargo_bin("formcheck")
        .unwrap()
        .arg("fields")
        .arg(&form)
        .assert()
        .success()
        .stdout(predicate::str::contains("name\tText\trequired"))
        .stdout(predicate::str::contains("doc\tFile\trequired"))
        .stdout(predicate::str::contains("amount\tText\toptional"));
}
