use storix_lib::derivation::DrvError;
use storix_lib::eval::{LiteralEvaluator, Term, Value};
use storix_lib::expr::StoreExpr;
use storix_lib::store::Store;

use super::common::{TestEnv, instantiate, text_of};

const HELLO: &str = r#"{
  "builder": "/bin/sh",
  "system": "x86-generic",
  "name": "hello",
  "args": ["-c", "cc -o $out $src"],
  "src": { "$path": "hello.c" },
  "flags": ["-O2", 2, true]
}"#;

#[test]
fn module_instantiates_with_source_input() {
  let env = TestEnv::new();
  env.write_file("hello.c", "int main() { return 0; }");
  let module = env.write_file("hello.json", HELLO);

  let mut session = env.session();
  let result = instantiate(&mut session, &module).unwrap();

  let StoreExpr::Derivation(drv) = session.store().read_expr(&text_of(&result, "drvPath")).unwrap() else {
    panic!("expected a derivation");
  };
  assert_eq!(drv.args, vec!["-c", "cc -o $out $src"]);
  assert_eq!(drv.env["flags"], "-O2 2 1");
  assert!(drv.env["src"].ends_with("-hello.c"));
  assert_eq!(drv.inputs.len(), 1);
  assert_eq!(drv.env["out"], text_of(&result, "outPath"));
}

#[test]
fn fresh_sessions_agree() {
  let env = TestEnv::new();
  env.write_file("hello.c", "int main() { return 0; }");
  let module = env.write_file("hello.json", HELLO);

  let first = instantiate(&mut env.session(), &module).unwrap();
  let second = instantiate(&mut env.session(), &module).unwrap();
  for key in ["drvHash", "drvPath", "outPath"] {
    assert_eq!(text_of(&first, key), text_of(&second, key));
  }
}

#[test]
fn source_changes_propagate_through_dependents() {
  let env = TestEnv::new();
  env.write_file("hello.c", "int main() { return 0; }");
  let module = env.write_file("hello.json", HELLO);

  // Instantiate `hello`, then an `app` that references its result.
  let hashes = |env: &TestEnv| {
    let mut session = env.session();
    let hello = instantiate(&mut session, &module).unwrap();

    let app = Term::attrs([
      ("builder", Term::str("/bin/sh")),
      ("system", Term::str("x86-generic")),
      ("name", Term::str("app")),
      ("hello", Term::Lit(Value::Attrs(hello.clone()))),
    ]);
    let Term::Lit(Value::Attrs(app)) = session.derivation(&mut LiteralEvaluator::new(), &app).unwrap() else {
      panic!("expected attrs");
    };
    (text_of(&hello, "drvHash"), text_of(&app, "drvHash"))
  };

  let (hello_before, app_before) = hashes(&env);
  env.write_file("hello.c", "int main() { return 1; }");
  let (hello_after, app_after) = hashes(&env);

  assert_ne!(hello_before, hello_after);
  assert_ne!(app_before, app_after);
}

#[test]
fn missing_builder_is_reported_by_name() {
  let env = TestEnv::new();
  let module = env.write_file("broken.json", r#"{ "system": "x86-generic", "name": "broken" }"#);

  let err = instantiate(&mut env.session(), &module).unwrap_err();
  assert!(matches!(err, DrvError::MissingAttribute(ref name) if name == "builder"));
}

#[test]
fn attribute_errors_carry_module_position() {
  let env = TestEnv::new();
  let module = env.write_file(
    "bad.json",
    r#"{ "builder": "/bin/sh", "system": "x86-generic", "name": "bad", "cfg": { "x": 1 } }"#,
  );

  let err = instantiate(&mut env.session(), &module).unwrap_err();
  let message = err.to_string();
  assert!(message.starts_with("while processing derivation attribute `cfg' at "));
  assert!(message.contains("bad.json"));
}
