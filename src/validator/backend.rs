//! Interpreter backend seam
//!
//! The orchestrator talks to the interpreter only through [`CheckBackend`]. [`PythonBackend`] is the real
//! implementation (out-of-process probes); tests plug in scripted backends to exercise the stage chain without an
//! interpreter.

use super::config::ValidatorConfig;
use super::error::ValidatorResult;
use super::execution::{self, Companion, ExecutionReport};
use super::sandbox::Interpreter;
use super::symbols::{self, SymbolReport};
use super::syntax::{self, SyntaxReport};
use super::test_runner::{self, TestRunReport};

/// Operations the validator needs from an interpreter.
pub trait CheckBackend {
    /// Parse without executing.
    fn parse(&self, source: &str) -> ValidatorResult<SyntaxReport>;

    /// Run top-level statements with `companions` importable.
    fn execute(&self, source: &str, companions: &[Companion<'_>]) -> ValidatorResult<ExecutionReport>;

    /// Names `test_script` expects from the code module, read without executing it.
    fn expected_symbols(&self, test_script: &str) -> ValidatorResult<SymbolReport>;

    /// Names `code` defines once run.
    fn defined_symbols(&self, code: &str) -> ValidatorResult<SymbolReport>;

    /// Run `test_script` against `code` with unittest discovery.
    fn unittest(&self, test_script: &str, code: &str) -> ValidatorResult<TestRunReport>;
}

/// Backend that shells out to a Python interpreter.
#[derive(Debug, Clone)]
pub struct PythonBackend {
    interpreter: Interpreter,
    config: ValidatorConfig,
}

impl PythonBackend {
    pub fn new(config: ValidatorConfig) -> Self {
        tracing::debug!(interpreter = %config.interpreter_display(), limits = ?config.limits, "python backend");
        let interpreter = Interpreter::new(config.interpreter.clone(), config.limits.clone());
        Self { interpreter, config }
    }
}

impl CheckBackend for PythonBackend {
    fn parse(&self, source: &str) -> ValidatorResult<SyntaxReport> {
        syntax::probe(&self.interpreter, &self.config, source)
    }

    fn execute(&self, source: &str, companions: &[Companion<'_>]) -> ValidatorResult<ExecutionReport> {
        execution::execute(&self.interpreter, &self.config, source, companions)
    }

    fn expected_symbols(&self, test_script: &str) -> ValidatorResult<SymbolReport> {
        symbols::probe_expectations(&self.interpreter, &self.config, test_script)
    }

    fn defined_symbols(&self, code: &str) -> ValidatorResult<SymbolReport> {
        symbols::probe_definitions(&self.interpreter, &self.config, code)
    }

    fn unittest(&self, test_script: &str, code: &str) -> ValidatorResult<TestRunReport> {
        test_runner::run_unittest(&self.interpreter, &self.config, test_script, code)
    }
}
