//! Pipeline stage registry.
//!
//! Every gated step of the validation pipeline has a stable [`Stage`] id. Callers look up its display name and the
//! progress announcement via [`info`] instead of hard-coding strings.
//!
//! ## Notes
//! - The two orchestrations run fixed, linear stage lists: [`SINGLE_CODE_STAGES`] and [`CODE_WITH_TESTS_STAGES`].
//! - The clean step is announced but is not a [`Stage`]: it cannot fail.
//!
//! ## Examples
//! ```rust
//! use coursecheck_core::stages::{self, Stage};
//!
//! assert_eq!(stages::from_str("test-run"), Some(Stage::TestRun));
//! assert_eq!(stages::info(Stage::TestRun).announcement, "Running test script...");
//! ```

use std::fmt;

/// A gated step in one of the validation chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Syntax check of a standalone snippet.
    Syntax,
    /// Executability check of a standalone snippet.
    Execution,
    CodeSyntax,
    CodeExecution,
    TestSyntax,
    TestExecution,
    /// Names the test script expects must be defined by the code under test.
    SymbolCheck,
    TestRun,
}

/// Category a failed stage is reported under.
///
/// Kept disjoint so a reader can tell "my code is wrong" apart from "the grader broke".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Syntax,
    Execution,
    MissingSymbols,
    TestsFailed,
    /// The interpreter or the test harness itself could not run.
    Infrastructure,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Syntax => write!(f, "syntax error"),
            FailureKind::Execution => write!(f, "execution error"),
            FailureKind::MissingSymbols => write!(f, "missing symbols"),
            FailureKind::TestsFailed => write!(f, "tests failed"),
            FailureKind::Infrastructure => write!(f, "infrastructure failure"),
        }
    }
}

/// Metadata for a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageInfo {
    pub id: Stage,
    /// Stable kebab-case name (used in logs and run summaries).
    pub name: &'static str,
    /// Progress message emitted right before the stage runs.
    pub announcement: &'static str,
    /// Category reported when the stage's check fails on its own terms.
    pub failure_kind: FailureKind,
}

/// Registry of all stages.
pub const STAGES: &[StageInfo] = &[
    StageInfo {
        id: Stage::Syntax,
        name: "syntax",
        announcement: "Checking syntax...",
        failure_kind: FailureKind::Syntax,
    },
    StageInfo {
        id: Stage::Execution,
        name: "execution",
        announcement: "Checking executability...",
        failure_kind: FailureKind::Execution,
    },
    StageInfo {
        id: Stage::CodeSyntax,
        name: "code-syntax",
        announcement: "Checking syntax of the code script...",
        failure_kind: FailureKind::Syntax,
    },
    StageInfo {
        id: Stage::CodeExecution,
        name: "code-execution",
        announcement: "Checking executability of the code script...",
        failure_kind: FailureKind::Execution,
    },
    StageInfo {
        id: Stage::TestSyntax,
        name: "test-syntax",
        announcement: "Checking syntax of the test script...",
        failure_kind: FailureKind::Syntax,
    },
    StageInfo {
        id: Stage::TestExecution,
        name: "test-execution",
        announcement: "Checking executability of the test script...",
        failure_kind: FailureKind::Execution,
    },
    StageInfo {
        id: Stage::SymbolCheck,
        name: "symbol-check",
        announcement: "Checking symbols expected by the test script...",
        failure_kind: FailureKind::MissingSymbols,
    },
    StageInfo {
        id: Stage::TestRun,
        name: "test-run",
        announcement: "Running test script...",
        failure_kind: FailureKind::TestsFailed,
    },
];

/// Stages run by the standalone snippet chain, in order.
pub const SINGLE_CODE_STAGES: &[Stage] = &[Stage::Syntax, Stage::Execution];

/// Stages run by the code-with-tests chain, in order.
///
/// The symbol check precedes test execution, so a name the code lacks is reported as missing rather than as an
/// `ImportError`.
pub const CODE_WITH_TESTS_STAGES: &[Stage] = &[
    Stage::CodeSyntax,
    Stage::CodeExecution,
    Stage::TestSyntax,
    Stage::SymbolCheck,
    Stage::TestExecution,
    Stage::TestRun,
];

/// Look up a stage's metadata.
pub fn info(id: Stage) -> &'static StageInfo {
    // STAGES is indexed in declaration order of `Stage`.
    &STAGES[id as usize]
}

/// Resolve a stage from its stable name.
pub fn from_str(name: &str) -> Option<Stage> {
    STAGES.iter().find(|s| s.name == name).map(|s| s.id)
}

/// Return the stable name of a stage.
pub fn as_str(id: Stage) -> &'static str {
    info(id).name
}

impl Stage {
    /// Progress announcement for this stage.
    pub fn announcement(self) -> &'static str {
        info(self).announcement
    }

    /// Failure category used when this stage's check fails.
    pub fn failure_kind(self) -> FailureKind {
        info(self).failure_kind
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", as_str(*self))
    }
}
