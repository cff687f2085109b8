//! Course plan loading and rendering
//!
//! The course plan is the document the validator's snippets come from. This module only reads and displays it;
//! validation of a stage's `code` and `test_script` goes through [`crate::validator`].

pub mod outline;
pub mod plan;

pub use outline::{DocumentVisitor, OutlineWriter, render_document, render_outline, title_case, walk};
pub use plan::{CourseError, CoursePlan, CourseResult, StagePlan, WorkOnProject};
