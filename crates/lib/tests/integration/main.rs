mod common;
mod derivation_tests;
mod import_tests;
