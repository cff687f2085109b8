#![forbid(unsafe_code)]
//! coursecheck
//!
//! Validates the example code and unittest scripts embedded in auto-generated course plans. The core is the
//! [`validator`] pipeline (syntax, executability, symbol contract, isolated test run); [`course`] loads and outlines
//! plan documents, and [`cli`] wires both into the `coursecheck` binary.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `validator` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Checks never panic on bad input**: a snippet that fails to parse, raises, hangs or crashes the interpreter is
//!   a reported failure, not an error of this crate.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod course;
pub mod diagnostics;
pub mod validator;
pub mod version;

pub use course::CoursePlan;
pub use validator::{CollectingReporter, ConsoleReporter, ProgressReporter, Validator, ValidatorConfig, Verdict};
