//! Isolated unittest runner
//!
//! Materializes the code under test and the test script side by side in a fresh scratch directory and runs the
//! interpreter's standard discovery (`-m unittest discover`) scoped to that directory and the test file's name.
//! Output is captured in full, not streamed. The scratch directory is removed when this function returns, whatever
//! the outcome.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::Duration;

use super::config::ValidatorConfig;
use super::error::ValidatorResult;
use super::sandbox::{Interpreter, Workspace};

/// Captured result of a unittest run.
#[derive(Debug, Clone)]
pub struct TestRunReport {
    /// Zero exit status (and not timed out)
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub elapsed: Duration,
    /// Scratch directory the run used. Already removed by the time the report is returned.
    pub workdir: PathBuf,
}

impl TestRunReport {
    /// Parse unittest's trailing summary, if present.
    pub fn summary(&self) -> Option<TestSummary> {
        TestSummary::parse(&self.stderr).or_else(|| TestSummary::parse(&self.stdout))
    }

    /// Names of failing or erroring tests, in report order.
    pub fn failing_tests(&self) -> Vec<String> {
        failing_tests(&self.stderr)
            .into_iter()
            .chain(failing_tests(&self.stdout))
            .collect()
    }
}

/// Counts from unittest's closing lines (`Ran 3 tests in 0.001s` / `FAILED (failures=1, errors=1)`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestSummary {
    pub ran: usize,
    pub failures: usize,
    pub errors: usize,
    pub skipped: usize,
}

impl TestSummary {
    pub fn parse(output: &str) -> Option<TestSummary> {
        let ran_line = output.lines().find(|l| l.starts_with("Ran "))?;
        let ran = ran_line.split_whitespace().nth(1)?.parse().ok()?;

        let mut summary = TestSummary {
            ran,
            ..Default::default()
        };

        let Some(status) = output
            .lines()
            .rev()
            .find(|l| l.starts_with("OK") || l.starts_with("FAILED"))
        else {
            return Some(summary);
        };

        if let (Some(open), Some(close)) = (status.find('('), status.rfind(')')) {
            for part in status[open + 1..close].split(',') {
                let Some((key, value)) = part.trim().split_once('=') else {
                    continue;
                };
                let Ok(value) = value.parse::<usize>() else {
                    continue;
                };
                match key {
                    "failures" => summary.failures = value,
                    "errors" => summary.errors = value,
                    "skipped" => summary.skipped = value,
                    _ => {}
                }
            }
        }
        Some(summary)
    }
}

/// Extract the names of failing tests from unittest output.
///
/// unittest prints a `FAIL: test_name (module.Class.test_name)` or `ERROR: ...` header per problem.
pub fn failing_tests(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.strip_prefix("FAIL: ").or_else(|| line.strip_prefix("ERROR: ")))
        .map(|rest| rest.split_whitespace().next().unwrap_or(rest).to_string())
        .collect()
}

/// Run `test_script` against `code` with unittest discovery.
///
/// ## Errors
///
/// Returns an error when the scratch directory, the files, or the interpreter process cannot be set up. Failing
/// tests and timeouts are not errors: they come back as `success = false`.
pub fn run_unittest(
    interpreter: &Interpreter,
    config: &ValidatorConfig,
    test_script: &str,
    code: &str,
) -> ValidatorResult<TestRunReport> {
    let workspace = Workspace::new()?;
    let workdir = workspace.path().to_path_buf();
    workspace.write(&config.code_file_name, code)?;
    workspace.write(&config.test_file_name, test_script)?;

    let output = interpreter.run(
        &workspace,
        [
            OsStr::new("-m"),
            OsStr::new("unittest"),
            OsStr::new("discover"),
            OsStr::new("-v"),
            OsStr::new("-s"),
            workspace.path().as_os_str(),
            OsStr::new("-p"),
            OsStr::new(&config.test_file_name),
        ],
        config.test_timeout,
    )?;

    Ok(TestRunReport {
        success: output.success(),
        stdout: output.stdout,
        stderr: output.stderr,
        timed_out: output.timed_out,
        elapsed: output.elapsed,
        workdir,
    })
}
