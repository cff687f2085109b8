//! Provide the shared, pure vocabulary of the coursecheck validation pipeline.
//!
//! This crate is intentionally small and dependency-free. It holds the things that both the validator and its
//! callers (CLI, tests, host UIs) must agree on:
//! - the ordered set of pipeline stages and how each one is announced,
//! - the progress message wording and success/failure glyphs,
//! - the file-name and namespace conventions used when running snippets,
//! - the `clean` normalization step.
//!
//! ## Notes
//!
//! - This is a “semantic core” crate: **no IO**, no global state, no process handling.
//! - Everything that talks to an interpreter lives in the `coursecheck` crate.

pub mod conventions;
pub mod messages;
pub mod normalize;
pub mod stages;

pub use normalize::clean;
pub use stages::{FailureKind, Stage};
