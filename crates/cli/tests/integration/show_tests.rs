use predicates::prelude::*;

use super::common::TestEnv;

const MODULE: &str = r#"{
  "builder": "/bin/sh",
  "system": "x86-generic",
  "name": "tool",
  "args": ["-c", "make"],
  "patch": { "$path": "fix.patch" }
}"#;

#[test]
fn show_derivation_text() {
  let env = TestEnv::new();
  env.write_file("fix.patch", "--- a\n+++ b\n");
  let result = env.instantiate_json(&env.write_file("tool.json", MODULE));
  let drv_path = result["drvPath"].as_str().unwrap();

  env
    .storix_cmd()
    .args(["show", drv_path])
    .assert()
    .success()
    .stdout(predicate::str::contains("derivation"))
    .stdout(predicate::str::contains("/bin/sh"))
    .stdout(predicate::str::contains("x86-generic"));
}

#[test]
fn show_derivation_json_round_trips() {
  let env = TestEnv::new();
  env.write_file("fix.patch", "--- a\n+++ b\n");
  let result = env.instantiate_json(&env.write_file("tool.json", MODULE));
  let drv_path = result["drvPath"].as_str().unwrap();

  let output = env.storix_cmd().args(["show", drv_path, "-o", "json"]).output().unwrap();
  assert!(output.status.success());
  let shown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

  assert_eq!(shown["type"], "derivation");
  assert_eq!(shown["args"], serde_json::json!(["-c", "make"]));
  assert_eq!(shown["env"]["out"], result["outPath"]);
  assert_eq!(shown["inputs"].as_array().unwrap().len(), 1);
}

#[test]
fn roots_of_derivation_is_its_output() {
  let env = TestEnv::new();
  env.write_file("fix.patch", "--- a\n+++ b\n");
  let result = env.instantiate_json(&env.write_file("tool.json", MODULE));
  let drv_path = result["drvPath"].as_str().unwrap();
  let out_path = result["outPath"].as_str().unwrap();

  env
    .storix_cmd()
    .args(["roots", drv_path])
    .assert()
    .success()
    .stdout(predicate::str::diff(format!("{}\n", out_path)));
}

#[test]
fn roots_of_source_closure_is_the_copied_file() {
  let env = TestEnv::new();
  env.write_file("fix.patch", "--- a\n+++ b\n");
  let result = env.instantiate_json(&env.write_file("tool.json", MODULE));

  let output = env
    .storix_cmd()
    .args(["show", result["drvPath"].as_str().unwrap(), "-o", "json"])
    .output()
    .unwrap();
  let shown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let closure = shown["inputs"][0].as_str().unwrap();

  env
    .storix_cmd()
    .args(["roots", closure])
    .assert()
    .success()
    .stdout(predicate::str::contains("-fix.patch"));
}
