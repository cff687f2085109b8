//! Code validation pipeline
//!
//! The [`Validator`] runs escalating checks over Python snippets and reports each stage transition through a
//! [`ProgressReporter`]:
//!
//! - syntax: parse with the interpreter's grammar, no execution
//! - executability: run top-level statements with `input` stubbed to a constant sentinel
//! - symbols: the names a test script expects must be defined by the code under test
//! - test run: `unittest` discovery in an isolated scratch directory
//!
//! Two orchestrations chain them with short-circuit semantics: [`Validator::check_single_code`] and
//! [`Validator::check_code_with_tests`]. No check raises past its boundary; failures are reported as messages and
//! surface to the caller as `false` (or as a [`Verdict`] naming the first failing stage).
//!
//! All interpreter work happens in subprocesses bounded by a wall-clock timeout, CPU and memory rlimits, and a
//! socket stub. See [`sandbox`].
//!
//! ## Examples
//!
//! ```no_run
//! use coursecheck::validator::{CollectingReporter, Validator};
//!
//! let mut validator = Validator::with_reporter(CollectingReporter::new());
//! let ok = validator.check_single_code("name = input('Your name? ')\nprint(name)");
//! assert!(ok);
//! assert_eq!(validator.reporter().messages[0], "Cleaning code...");
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod backend;
pub mod config;
pub mod error;
pub mod execution;
pub mod reporter;
pub mod sandbox;
pub mod symbols;
pub mod syntax;
pub mod test_runner;

use coursecheck_core::stages::{self, Stage};
use coursecheck_core::{FailureKind, messages};

pub use backend::{CheckBackend, PythonBackend};
pub use config::{SandboxLimits, ValidatorConfig};
pub use error::{ValidatorError, ValidatorResult};
pub use execution::{Companion, ExecutionReport};
pub use reporter::{CollectingReporter, ConsoleReporter, ProgressReporter};
pub use symbols::SymbolCheck;
pub use test_runner::TestRunReport;

/// Overall outcome of an orchestrated validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    /// The chain stopped at `stage`; later stages were not attempted.
    Fail { stage: Stage, kind: FailureKind },
}

impl Verdict {
    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            Verdict::Pass => None,
            Verdict::Fail { stage, .. } => Some(*stage),
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Verdict::Pass => None,
            Verdict::Fail { kind, .. } => Some(*kind),
        }
    }
}

/// Why a gated check did not pass. The stage registry turns this into a [`FailureKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckFailure {
    /// The snippet failed the check on its own terms.
    Rejected,
    /// The interpreter or harness could not run the check.
    Unavailable,
}

type CheckOutcome = Result<(), CheckFailure>;

/// Snippets a chain checks. Standalone snippets go in `code`.
struct Sources<'a> {
    code: &'a str,
    test_script: &'a str,
}

/// Runs checks against snippets and reports progress.
pub struct Validator<R: ProgressReporter = ConsoleReporter> {
    config: ValidatorConfig,
    backend: Box<dyn CheckBackend>,
    reporter: R,
}

impl Validator<ConsoleReporter> {
    /// Validator with the default configuration, printing to standard output.
    pub fn new() -> Self {
        Self::with_config(ValidatorConfig::default())
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self::with_config_and_reporter(config, ConsoleReporter)
    }
}

impl Default for Validator<ConsoleReporter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ProgressReporter> Validator<R> {
    /// Validator with the default configuration and a caller-supplied sink.
    pub fn with_reporter(reporter: R) -> Self {
        Self::with_config_and_reporter(ValidatorConfig::default(), reporter)
    }

    pub fn with_config_and_reporter(config: ValidatorConfig, reporter: R) -> Self {
        let backend = Box::new(PythonBackend::new(config.clone()));
        Self {
            config,
            backend,
            reporter,
        }
    }

    /// Validator driving a custom backend.
    pub fn with_backend(config: ValidatorConfig, backend: Box<dyn CheckBackend>, reporter: R) -> Self {
        Self {
            config,
            backend,
            reporter,
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// Forward a message to the reporter.
    pub fn send_message(&mut self, message: &str) {
        tracing::debug!(%message, "progress");
        self.reporter.send_message(message);
    }

    /// Normalize a snippet before checking it.
    pub fn clean_code<'a>(&self, snippet: &'a str) -> &'a str {
        coursecheck_core::clean(snippet)
    }

    /// Parse `snippet` without executing it.
    pub fn check_syntax(&mut self, snippet: &str) -> bool {
        self.syntax_stage(snippet).is_ok()
    }

    /// Run `snippet`'s top-level statements with `input` stubbed.
    pub fn check_executability(&mut self, snippet: &str) -> bool {
        self.execution_stage(snippet, &[]).is_ok()
    }

    /// Check that `code` defines every name `test_script` expects from it.
    pub fn check_symbols(&mut self, test_script: &str, code: &str) -> bool {
        self.symbol_stage(test_script, code).is_ok()
    }

    /// Run `test_script` against `code` in an isolated scratch directory.
    pub fn run_tests(&mut self, test_script: &str, code: &str) -> bool {
        self.test_stage(test_script, code).is_ok()
    }

    /// Clean, then syntax and executability checks. True only if both pass.
    pub fn check_single_code(&mut self, snippet: &str) -> bool {
        self.validate_single_code(snippet).passed()
    }

    /// Clean both, check the code, then the test script's syntax, the symbols it expects, its executability, and
    /// finally run the tests.
    pub fn check_code_with_tests(&mut self, test_script: &str, code: &str) -> bool {
        self.validate_code_with_tests(test_script, code).passed()
    }

    /// Like [`check_single_code`](Self::check_single_code), returning where the chain stopped.
    pub fn validate_single_code(&mut self, snippet: &str) -> Verdict {
        self.send_message(messages::CLEANING_SINGLE);
        let snippet = self.clean_code(snippet);

        let verdict = self.single_code_chain(snippet).err().unwrap_or(Verdict::Pass);
        tracing::debug!(?verdict, "single code validation finished");
        verdict
    }

    /// Like [`check_code_with_tests`](Self::check_code_with_tests), returning where the chain stopped.
    pub fn validate_code_with_tests(&mut self, test_script: &str, code: &str) -> Verdict {
        self.send_message(messages::CLEANING_PAIR);
        let test_script = self.clean_code(test_script);
        let code = self.clean_code(code);

        let verdict = self.code_with_tests_chain(test_script, code).err().unwrap_or(Verdict::Pass);
        tracing::debug!(?verdict, "code with tests validation finished");
        verdict
    }

    fn single_code_chain(&mut self, snippet: &str) -> Result<(), Verdict> {
        let sources = Sources {
            code: snippet,
            test_script: "",
        };
        self.run_chain(stages::SINGLE_CODE_STAGES, &sources)
    }

    fn code_with_tests_chain(&mut self, test_script: &str, code: &str) -> Result<(), Verdict> {
        let sources = Sources { code, test_script };
        self.run_chain(stages::CODE_WITH_TESTS_STAGES, &sources)
    }

    fn run_chain(&mut self, chain: &[Stage], sources: &Sources<'_>) -> Result<(), Verdict> {
        for &stage in chain {
            self.gate(stage, |v| v.run_stage(stage, sources))?;
        }
        Ok(())
    }

    /// Announce `stage`, run its check, and stop the chain on failure.
    fn gate(&mut self, stage: Stage, check: impl FnOnce(&mut Self) -> CheckOutcome) -> Result<(), Verdict> {
        self.send_message(stage.announcement());
        check(self).map_err(|failure| {
            let kind = match failure {
                CheckFailure::Rejected => stage.failure_kind(),
                CheckFailure::Unavailable => FailureKind::Infrastructure,
            };
            tracing::debug!(stage = %stage, %kind, "stage failed");
            Verdict::Fail { stage, kind }
        })
    }

    fn run_stage(&mut self, stage: Stage, sources: &Sources<'_>) -> CheckOutcome {
        match stage {
            Stage::Syntax | Stage::CodeSyntax => self.syntax_stage(sources.code),
            Stage::Execution | Stage::CodeExecution => self.execution_stage(sources.code, &[]),
            Stage::TestSyntax => self.syntax_stage(sources.test_script),
            Stage::SymbolCheck => self.symbol_stage(sources.test_script, sources.code),
            Stage::TestExecution => {
                let code_file = self.config.code_file_name.clone();
                let companions = [Companion {
                    file_name: &code_file,
                    source: sources.code,
                }];
                self.execution_stage(sources.test_script, &companions)
            }
            Stage::TestRun => self.test_stage(sources.test_script, sources.code),
        }
    }

    fn syntax_stage(&mut self, snippet: &str) -> CheckOutcome {
        match self.backend.parse(snippet) {
            Ok(report) if report.ok => {
                self.send_message(messages::SYNTAX_OK);
                Ok(())
            }
            Ok(report) => {
                self.send_message(&messages::syntax_error(&report.describe(snippet)));
                Err(CheckFailure::Rejected)
            }
            Err(err) => {
                tracing::warn!(error = %err, "syntax probe failed");
                self.send_message(&messages::syntax_unavailable(&err.to_string()));
                Err(CheckFailure::Unavailable)
            }
        }
    }

    fn execution_stage(&mut self, snippet: &str, companions: &[Companion<'_>]) -> CheckOutcome {
        match self.backend.execute(snippet, companions) {
            Ok(report) if report.completed() => {
                self.send_message(messages::EXECUTION_OK);
                Ok(())
            }
            Ok(report) => {
                self.send_message(&messages::execution_error(&report.describe()));
                Err(CheckFailure::Rejected)
            }
            Err(err) => {
                tracing::warn!(error = %err, "execution harness failed");
                self.send_message(&messages::execution_unavailable(&err.to_string()));
                Err(CheckFailure::Unavailable)
            }
        }
    }

    fn symbol_stage(&mut self, test_script: &str, code: &str) -> CheckOutcome {
        let reports = self
            .backend
            .expected_symbols(test_script)
            .and_then(|test| self.backend.defined_symbols(code).map(|code| (test, code)));

        let (test, code) = match reports {
            Ok(reports) => reports,
            Err(err) => {
                tracing::warn!(error = %err, "symbol probe failed");
                self.send_message(&messages::symbol_check_unavailable(&err.to_string()));
                return Err(CheckFailure::Unavailable);
            }
        };

        match symbols::compare(&test, &code, &self.config.code_module_name) {
            SymbolCheck::Satisfied => {
                self.send_message(messages::SYMBOLS_OK);
                Ok(())
            }
            SymbolCheck::Partial { module } => {
                self.send_message(&messages::symbols_partially_checked(&module));
                Ok(())
            }
            SymbolCheck::Missing(names) => {
                self.send_message(&messages::missing_symbols(&names));
                Err(CheckFailure::Rejected)
            }
        }
    }

    fn test_stage(&mut self, test_script: &str, code: &str) -> CheckOutcome {
        let report = match self.backend.unittest(test_script, code) {
            Ok(report) => report,
            Err(err) => {
                tracing::warn!(error = %err, "test run could not be started");
                self.send_message(&messages::test_infrastructure_failed(&err.to_string()));
                return Err(CheckFailure::Unavailable);
            }
        };
        tracing::debug!(
            success = report.success,
            elapsed_ms = report.elapsed.as_millis() as u64,
            summary = ?report.summary(),
            "unittest finished"
        );

        if report.success {
            self.send_message(&messages::tests_passed(&combined_output(&report)));
            return Ok(());
        }

        let mut stderr = report.stderr.clone();
        if report.timed_out {
            if !stderr.is_empty() && !stderr.ends_with('\n') {
                stderr.push('\n');
            }
            stderr.push_str(&messages::timed_out(self.config.test_timeout.as_secs_f64()));
        }
        self.send_message(&messages::tests_failed(&report.stdout, &stderr));
        Err(CheckFailure::Rejected)
    }
}

/// stdout then stderr, skipping empty streams. unittest writes its report to stderr.
fn combined_output(report: &TestRunReport) -> String {
    [report.stdout.trim_end(), report.stderr.trim_end()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;
    use std::io;
    use std::path::PathBuf;
    use std::rc::Rc;
    use std::time::Duration;

    use super::symbols::SymbolReport;
    use super::syntax::SyntaxReport;
    use super::*;

    /// Backend whose answers are decided by markers in the source text.
    #[derive(Default)]
    struct ScriptedBackend {
        calls: Rc<RefCell<Vec<String>>>,
        tests_fail: bool,
        tests_unavailable: bool,
        expected: Vec<String>,
        defined: Vec<String>,
    }

    impl ScriptedBackend {
        fn record(&self, call: &str) {
            self.calls.borrow_mut().push(call.to_string());
        }
    }

    impl CheckBackend for ScriptedBackend {
        fn parse(&self, source: &str) -> ValidatorResult<SyntaxReport> {
            self.record(&format!("parse:{source}"));
            if source.contains("def (") {
                Ok(SyntaxReport::invalid("invalid syntax", Some(1), Some(5)))
            } else {
                Ok(SyntaxReport::valid())
            }
        }

        fn execute(&self, source: &str, companions: &[Companion<'_>]) -> ValidatorResult<ExecutionReport> {
            let names: Vec<&str> = companions.iter().map(|c| c.file_name).collect();
            self.record(&format!("execute:{source}:{}", names.join(",")));
            if source.contains("raise") {
                Ok(ExecutionReport::Raised {
                    error_type: "ValueError".to_string(),
                    message: "boom".to_string(),
                })
            } else {
                Ok(ExecutionReport::Completed)
            }
        }

        fn expected_symbols(&self, _test_script: &str) -> ValidatorResult<SymbolReport> {
            self.record("expected_symbols");
            Ok(SymbolReport {
                imported_from_code: self.expected.clone(),
                ..Default::default()
            })
        }

        fn defined_symbols(&self, _code: &str) -> ValidatorResult<SymbolReport> {
            self.record("defined_symbols");
            Ok(SymbolReport {
                defined: self.defined.clone(),
                ..Default::default()
            })
        }

        fn unittest(&self, _test_script: &str, _code: &str) -> ValidatorResult<TestRunReport> {
            self.record("unittest");
            if self.tests_unavailable {
                return Err(ValidatorError::Spawn {
                    program: "python3".to_string(),
                    source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
                });
            }
            let stderr = if self.tests_fail {
                "FAIL: test_greet (test_script.TestGreeter.test_greet)\nRan 1 test in 0.001s\n\nFAILED (failures=1)\n"
            } else {
                "test_greet (test_script.TestGreeter.test_greet) ... ok\nRan 1 test in 0.001s\n\nOK\n"
            };
            Ok(TestRunReport {
                success: !self.tests_fail,
                stdout: String::new(),
                stderr: stderr.to_string(),
                timed_out: false,
                elapsed: Duration::from_millis(3),
                workdir: PathBuf::from("/tmp/gone"),
            })
        }
    }

    const CODE: &str = "class Greeter:\n    def greet(self):\n        return 'Hello'";
    const TEST: &str = "import unittest\nfrom code_to_test import Greeter";

    fn validator(backend: ScriptedBackend) -> Validator<CollectingReporter> {
        Validator::with_backend(ValidatorConfig::default(), Box::new(backend), CollectingReporter::new())
    }

    #[test]
    fn single_code_reports_each_stage_in_order() {
        let mut v = validator(ScriptedBackend::default());
        assert!(v.check_single_code("  print('hi')\n\n"));
        assert_eq!(
            v.into_reporter().take(),
            vec![
                "Cleaning code...",
                "Checking syntax...",
                "✓ Syntax is correct.",
                "Checking executability...",
                "✓ Code executed successfully.",
            ]
        );
    }

    #[test]
    fn snippets_are_cleaned_before_checks() {
        let backend = ScriptedBackend::default();
        let calls = backend.calls.clone();
        let mut v = validator(backend);
        v.check_single_code("\n\tx = 1  \n");
        assert_eq!(calls.borrow()[0], "parse:x = 1");
    }

    #[test]
    fn syntax_failure_short_circuits() {
        let backend = ScriptedBackend::default();
        let calls = backend.calls.clone();
        let mut v = validator(backend);

        let verdict = v.validate_single_code("def (");
        assert_eq!(
            verdict,
            Verdict::Fail {
                stage: Stage::Syntax,
                kind: FailureKind::Syntax
            }
        );
        assert_eq!(calls.borrow().len(), 1, "execution must not be attempted");
        let last = v.reporter().messages.last().unwrap();
        assert!(last.starts_with("✗ Syntax error: invalid syntax (line 1, column 5)"));
    }

    #[test]
    fn execution_failure_carries_exception_description() {
        let mut v = validator(ScriptedBackend::default());
        let verdict = v.validate_single_code("raise ValueError('boom')");
        assert_eq!(verdict.failed_stage(), Some(Stage::Execution));
        assert_eq!(
            v.reporter().messages.last().unwrap(),
            "✗ Execution error: ValueError: boom"
        );
    }

    #[test]
    fn code_with_tests_runs_six_gated_stages() {
        let backend = ScriptedBackend {
            expected: vec!["Greeter".to_string()],
            defined: vec!["Greeter".to_string()],
            ..Default::default()
        };
        let calls = backend.calls.clone();
        let mut v = validator(backend);

        assert!(v.check_code_with_tests(TEST, CODE));

        let announcements: Vec<&str> = v
            .reporter()
            .messages
            .iter()
            .map(String::as_str)
            .filter(|m| m.ends_with("..."))
            .collect();
        assert_eq!(
            announcements,
            vec![
                "Cleaning test script and code script...",
                "Checking syntax of the code script...",
                "Checking executability of the code script...",
                "Checking syntax of the test script...",
                "Checking symbols expected by the test script...",
                "Checking executability of the test script...",
                "Running test script...",
            ]
        );
        assert!(v.reporter().messages.last().unwrap().starts_with("✓ All tests passed:\n"));
        assert!(
            calls
                .borrow()
                .iter()
                .any(|c| c.starts_with("execute:import unittest") && c.ends_with(":code_to_test.py")),
            "test script must execute with the code importable"
        );
    }

    #[test]
    fn test_script_failure_stops_before_run() {
        let backend = ScriptedBackend::default();
        let calls = backend.calls.clone();
        let mut v = validator(backend);

        let verdict = v.validate_code_with_tests("import unittest\nraise SystemExit(2)", CODE);
        assert_eq!(verdict.failed_stage(), Some(Stage::TestExecution));
        assert!(!calls.borrow().iter().any(|c| c == "unittest"));
    }

    #[test]
    fn missing_symbols_fail_before_tests_run() {
        let backend = ScriptedBackend {
            expected: vec!["Greeter".to_string(), "farewell".to_string()],
            defined: vec!["Greeter".to_string()],
            ..Default::default()
        };
        let calls = backend.calls.clone();
        let mut v = validator(backend);

        let verdict = v.validate_code_with_tests(TEST, CODE);
        assert_eq!(
            verdict,
            Verdict::Fail {
                stage: Stage::SymbolCheck,
                kind: FailureKind::MissingSymbols
            }
        );
        assert_eq!(v.reporter().messages.last().unwrap(), "✗ Missing symbols: farewell");
        assert!(!calls.borrow().iter().any(|c| c == "unittest"));
        assert!(
            !calls.borrow().iter().any(|c| c.starts_with("execute:import unittest")),
            "test script must not execute before its imports are known to resolve"
        );
    }

    fn announcements_after_cleaning(v: Validator<CollectingReporter>) -> Vec<String> {
        let mut messages = v.into_reporter().take();
        messages.remove(0);
        messages.retain(|m| m.ends_with("..."));
        messages
    }

    #[test]
    fn announcements_follow_the_stage_registry() {
        let backend = ScriptedBackend {
            expected: vec!["Greeter".to_string()],
            defined: vec!["Greeter".to_string()],
            ..Default::default()
        };
        let mut v = validator(backend);
        assert!(v.check_code_with_tests(TEST, CODE));
        let announced = announcements_after_cleaning(v);
        let registry: Vec<&str> = stages::CODE_WITH_TESTS_STAGES.iter().map(|s| s.announcement()).collect();
        assert_eq!(announced, registry);

        let mut v = validator(ScriptedBackend::default());
        assert!(v.check_single_code("x = 1"));
        let announced = announcements_after_cleaning(v);
        let registry: Vec<&str> = stages::SINGLE_CODE_STAGES.iter().map(|s| s.announcement()).collect();
        assert_eq!(announced, registry);
    }

    #[test]
    fn rejected_checks_report_the_registry_failure_kind() {
        let cases = [
            ("def (", CODE, ScriptedBackend::default(), Stage::CodeSyntax),
            ("raise", CODE, ScriptedBackend::default(), Stage::CodeExecution),
            (CODE, "def (", ScriptedBackend::default(), Stage::TestSyntax),
            (
                CODE,
                TEST,
                ScriptedBackend {
                    expected: vec!["farewell".to_string()],
                    ..Default::default()
                },
                Stage::SymbolCheck,
            ),
            (CODE, "import unittest\nraise SystemExit(2)", ScriptedBackend::default(), Stage::TestExecution),
            (
                CODE,
                TEST,
                ScriptedBackend {
                    tests_fail: true,
                    ..Default::default()
                },
                Stage::TestRun,
            ),
        ];
        for (code, test_script, backend, stage) in cases {
            let verdict = validator(backend).validate_code_with_tests(test_script, code);
            assert_eq!(
                verdict,
                Verdict::Fail {
                    stage,
                    kind: stage.failure_kind()
                },
                "{stage}"
            );
        }
    }

    #[test]
    fn failing_tests_and_broken_harness_are_told_apart() {
        let mut failing = validator(ScriptedBackend {
            tests_fail: true,
            ..Default::default()
        });
        let verdict = failing.validate_code_with_tests(TEST, CODE);
        assert_eq!(verdict.failure_kind(), Some(FailureKind::TestsFailed));
        let msg = failing.reporter().messages.last().unwrap();
        assert!(msg.starts_with("✗ Some tests failed:"));
        assert!(msg.contains("FAIL: test_greet"));

        let mut broken = validator(ScriptedBackend {
            tests_unavailable: true,
            ..Default::default()
        });
        let verdict = broken.validate_code_with_tests(TEST, CODE);
        assert_eq!(verdict.failure_kind(), Some(FailureKind::Infrastructure));
        assert_eq!(verdict.failed_stage(), Some(Stage::TestRun));
        assert!(
            broken
                .reporter()
                .messages
                .last()
                .unwrap()
                .starts_with("✗ Test execution failed: failed to launch interpreter 'python3'")
        );
    }

    #[test]
    fn closure_sink_receives_messages() {
        let mut seen = Vec::new();
        {
            let mut v = Validator::with_backend(
                ValidatorConfig::default(),
                Box::new(ScriptedBackend::default()),
                |m: &str| seen.push(m.to_string()),
            );
            assert!(v.check_syntax("x = 1"));
        }
        assert_eq!(seen, vec!["✓ Syntax is correct."]);
    }
}
