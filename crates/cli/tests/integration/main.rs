mod common;
mod instantiate_tests;
mod show_tests;
