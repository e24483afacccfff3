use storix_lib::derivation::{DrvError, import};
use storix_lib::eval::{LiteralEvaluator, Term, Value};
use storix_lib::primops::{self, PrimOp};

use super::common::{TestEnv, WriteContentRealizer, text_of};

#[test]
fn plain_path_skips_the_build_service() {
  let env = TestEnv::new();
  let module = env.write_file("lib.json", r#"{ "version": 3 }"#);

  let mut realizer = WriteContentRealizer::default();
  let loaded = import(
    &mut LiteralEvaluator::new(),
    &mut realizer,
    &Term::path(module.to_string_lossy()),
  )
  .unwrap();

  let Term::Lit(Value::Attrs(attrs)) = loaded else {
    panic!("expected attrs");
  };
  assert_eq!(attrs["version"].value, Term::int(3));
  assert!(realizer.realized.is_empty());
}

#[test]
fn generated_module_is_built_then_loaded() {
  let env = TestEnv::new();
  let mut session = env.session();
  let mut ev = LiteralEvaluator::new();
  let mut realizer = WriteContentRealizer::default();

  let generator = Term::attrs([
    ("builder", Term::str("/bin/sh")),
    ("system", Term::str("x86-generic")),
    ("name", Term::str("generated.json")),
    ("content", Term::str(r#"{ "greeting": "hi" }"#)),
  ]);
  let generated = primops::call(PrimOp::Derivation, &mut session, &mut ev, &mut realizer, &[generator]).unwrap();
  let Term::Lit(Value::Attrs(drv_attrs)) = &generated else {
    panic!("expected attrs");
  };
  let drv_path = text_of(drv_attrs, "drvPath");

  let loaded = primops::call(PrimOp::Import, &mut session, &mut ev, &mut realizer, &[generated.clone()]).unwrap();
  let Term::Lit(Value::Attrs(module)) = loaded else {
    panic!("expected attrs");
  };
  assert_eq!(module["greeting"].value, Term::str("hi"));
  assert_eq!(realizer.realized, vec![drv_path]);
}

#[test]
fn strings_are_not_import_targets() {
  let mut realizer = WriteContentRealizer::default();
  let err = import(&mut LiteralEvaluator::new(), &mut realizer, &Term::str("lib.json")).unwrap_err();
  assert!(matches!(err, DrvError::ImportTargetMissing));
}
