use predicates::prelude::*;

use super::common::TestEnv;

const HELLO: &str = r#"{
  "builder": "/bin/sh",
  "system": "x86-generic",
  "name": "hello",
  "args": ["-c", "cp $src $out"],
  "src": { "$path": "hello.txt" }
}"#;

#[test]
fn instantiate_json_output_is_valid() {
  let env = TestEnv::new();
  env.write_file("hello.txt", "hello");
  let module = env.write_file("hello.json", HELLO);

  let result = env.instantiate_json(&module);
  let store = env.store_path().to_string_lossy().into_owned();

  assert_eq!(result["name"], "hello");
  let drv_path = result["drvPath"].as_str().unwrap();
  assert!(drv_path.starts_with(&store));
  assert!(std::path::Path::new(drv_path).is_file());
  assert!(result["outPath"].as_str().unwrap().ends_with("-hello"));
  assert_eq!(result["drvHash"].as_str().unwrap().len(), 64);
  assert!(!env.temp.path().join("unused-store").exists());
}

#[test]
fn instantiate_is_deterministic() {
  let env = TestEnv::new();
  env.write_file("hello.txt", "hello");
  let module = env.write_file("hello.json", HELLO);

  let first = env.instantiate_json(&module);
  let second = env.instantiate_json(&module);
  assert_eq!(first, second);
}

#[test]
fn source_change_changes_hash() {
  let env = TestEnv::new();
  env.write_file("hello.txt", "hello");
  let module = env.write_file("hello.json", HELLO);
  let before = env.instantiate_json(&module);

  env.write_file("hello.txt", "goodbye");
  let after = env.instantiate_json(&module);

  assert_ne!(before["drvHash"], after["drvHash"]);
  assert_ne!(before["outPath"], after["outPath"]);
}

#[test]
fn attribute_errors_name_the_attribute() {
  let env = TestEnv::new();
  let module = env.write_file(
    "bad.json",
    r#"{ "builder": "/bin/sh", "system": "x86-generic", "name": "bad", "opts": { "x": 1 } }"#,
  );

  env
    .storix_cmd()
    .arg("instantiate")
    .arg(&module)
    .assert()
    .failure()
    .stderr(predicate::str::contains("while processing derivation attribute `opts'"));
}

#[test]
fn verbose_logs_go_to_stderr() {
  let env = TestEnv::new();
  let module = env.write_file(
    "plain.json",
    r#"{ "builder": "/bin/sh", "system": "x86-generic", "name": "plain" }"#,
  );

  env
    .storix_cmd()
    .arg("--verbose")
    .arg("instantiate")
    .arg(&module)
    .args(["-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::starts_with("{"))
    .stderr(predicate::str::contains("instantiated derivation"));
}
