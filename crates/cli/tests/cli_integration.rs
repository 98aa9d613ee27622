//! End-to-end CLI tests over real YAML files.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

const PRICING_YAML: &str = r#"
saasName: petclinic
currency: EUR
version: "2.0"
createdAt: "2024-08-30"
features:
  haveCalendar:
    type: CAPABILITY
    valueType: BOOLEAN
    defaultValue: false
  maxPets:
    type: INFORMATION
    valueType: NUMERIC
    defaultValue: 2
plans:
  BASIC:
    price: 0
  PRO:
    price: 15.99
    features:
      haveCalendar:
        value: true
      maxPets:
        value: 6
addOns:
  petsPack:
    price: 3.5
    features:
      maxPets:
        value: 10
"#;

fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn tierkit() -> Command {
    Command::cargo_bin("tierkit").unwrap()
}

#[test]
fn validate_accepts_a_well_formed_file() {
    let file = write_yaml(PRICING_YAML);
    tierkit()
        .args(["validate"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("valid (2 features"))
        .stdout(predicate::str::contains("version 2.0"));
}

#[test]
fn validate_reports_parse_errors_and_fails() {
    let broken = PRICING_YAML.replace("type: CAPABILITY", "type: DOMAIN");
    let file = write_yaml(&broken);
    tierkit()
        .args(["validate"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "unknown value 'DOMAIN' for 'features.haveCalendar.type'",
        ));
}

#[test]
fn eval_prints_the_effective_entitlements() {
    let file = write_yaml(PRICING_YAML);
    tierkit()
        .args(["eval"])
        .arg(file.path())
        .args(["--plan", "PRO"])
        .assert()
        .success()
        .stdout(predicate::str::contains("haveCalendar = true"))
        .stdout(predicate::str::contains("maxPets = 6"));
}

#[test]
fn eval_json_emits_the_compact_snapshot() {
    let file = write_yaml(PRICING_YAML);
    tierkit()
        .args(["eval"])
        .arg(file.path())
        .args(["--plan", "PRO", "--add-on", "petsPack", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"haveCalendar":true,"maxPets":"10"}"#));
}

#[test]
fn eval_unknown_plan_fails_closed() {
    let file = write_yaml(PRICING_YAML);
    tierkit()
        .args(["eval"])
        .arg(file.path())
        .args(["--plan", "ENTERPRISE"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown plan 'ENTERPRISE'"));
}

#[test]
fn diff_detects_plan_differences() {
    let file = write_yaml(PRICING_YAML);
    tierkit()
        .args(["diff"])
        .arg(file.path())
        .args(["--plan", "BASIC", "--against-plan", "PRO"])
        .assert()
        .success()
        .stdout(predicate::str::contains("changed"));

    tierkit()
        .args(["diff"])
        .arg(file.path())
        .args(["--plan", "BASIC", "--against-plan", "BASIC"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unchanged"));
}

#[test]
fn legacy_v1_0_yaml_is_migrated() {
    let legacy = r#"
saasName: petclinic
currency: EUR
day: 31
month: 8
year: 2024
features:
  haveCalendar:
    type: CAPABILITY
    valueType: BOOLEAN
    defaultValue: false
plans:
  BASIC:
    price: 0
"#;
    let file = write_yaml(legacy);
    tierkit()
        .args(["validate"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("version 2.0"));
}
