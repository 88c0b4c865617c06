//! Code execution and grading service
//!
//! Accepts a submission (language tag + source text) plus a list of test
//! cases, runs the program once per test case inside an isolated workspace,
//! and reports pass/fail with captured diagnostics per test. The HTTP layer
//! in [`server`] is thin transport glue over [`judge::Judge::execute`].

pub mod config;
pub mod error;
pub mod harness;
pub mod judge;
pub mod languages;
pub mod runner;
pub mod server;
pub mod workspace;
