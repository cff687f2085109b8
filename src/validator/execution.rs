//! Executability probe
//!
//! Runs a snippet's top-level statements in a fresh namespace whose `input` is stubbed to return a constant
//! sentinel. `__name__` is not `"__main__"`, so guarded entry-point blocks are skipped. Imports and definitions do
//! execute for real; the sandbox limits are the only isolation.

use std::ffi::OsStr;
use std::time::Duration;

use serde::Deserialize;

use coursecheck_core::{conventions, messages};

use super::config::ValidatorConfig;
use super::error::ValidatorResult;
use super::sandbox::{Interpreter, Workspace};

const EXEC_HARNESS: &str = include_str!("scripts/exec_harness.py");
const SOURCE_FILE_NAME: &str = "snippet.py";

/// A file placed next to the snippet so it can be imported (e.g. the code under test for a test script).
#[derive(Debug, Clone, Copy)]
pub struct Companion<'a> {
    pub file_name: &'a str,
    pub source: &'a str,
}

/// Outcome of executing a snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionReport {
    Completed,
    /// The snippet raised (or exited with a failing status).
    Raised { error_type: String, message: String },
    TimedOut { after: Duration },
    /// The interpreter died before the harness could report (signal, rlimit, `os._exit`).
    Died { exit: String, stderr: String },
}

impl ExecutionReport {
    pub fn completed(&self) -> bool {
        matches!(self, ExecutionReport::Completed)
    }

    /// One-line description used in the failure message.
    pub fn describe(&self) -> String {
        match self {
            ExecutionReport::Completed => "completed".to_string(),
            ExecutionReport::Raised { error_type, message } if message.is_empty() => error_type.clone(),
            ExecutionReport::Raised { error_type, message } => format!("{}: {}", error_type, message),
            ExecutionReport::TimedOut { after } => messages::timed_out(after.as_secs_f64()),
            ExecutionReport::Died { exit, stderr } => match stderr.lines().rev().find(|l| !l.trim().is_empty()) {
                Some(last) => format!("interpreter {} ({})", exit, last.trim()),
                None => format!("interpreter {}", exit),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct HarnessReport {
    ok: bool,
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    traceback: Option<String>,
}

/// Execute `source` in a sandboxed interpreter, with `companions` importable from its directory.
pub fn execute(
    interpreter: &Interpreter,
    config: &ValidatorConfig,
    source: &str,
    companions: &[Companion<'_>],
) -> ValidatorResult<ExecutionReport> {
    let workspace = Workspace::new()?;
    for companion in companions {
        workspace.write(companion.file_name, companion.source)?;
    }
    let source_path = workspace.write(SOURCE_FILE_NAME, source)?;
    let harness = workspace.write_helper("exec_harness.py", EXEC_HARNESS)?;
    let report_path = workspace.report_path();

    let output = interpreter.run(
        &workspace,
        [
            harness.as_os_str(),
            source_path.as_os_str(),
            report_path.as_os_str(),
            OsStr::new(&config.input_sentinel),
            OsStr::new(conventions::SNIPPET_MODULE_NAME),
        ],
        config.execution_timeout,
    )?;

    if output.timed_out {
        return Ok(ExecutionReport::TimedOut {
            after: config.execution_timeout,
        });
    }

    let Some(report) = workspace.read_report::<HarnessReport>()? else {
        return Ok(ExecutionReport::Died {
            exit: output.describe_exit(),
            stderr: output.stderr,
        });
    };

    if report.ok {
        return Ok(ExecutionReport::Completed);
    }
    if let Some(traceback) = &report.traceback {
        tracing::debug!(%traceback, "snippet raised");
    }
    Ok(ExecutionReport::Raised {
        error_type: report.error_type.unwrap_or_else(|| "Exception".to_string()),
        message: report.message.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_variants() {
        let raised = ExecutionReport::Raised {
            error_type: "NameError".to_string(),
            message: "name 'undefined_thing' is not defined".to_string(),
        };
        assert_eq!(raised.describe(), "NameError: name 'undefined_thing' is not defined");

        let bare = ExecutionReport::Raised {
            error_type: "KeyboardInterrupt".to_string(),
            message: String::new(),
        };
        assert_eq!(bare.describe(), "KeyboardInterrupt");

        let timed_out = ExecutionReport::TimedOut {
            after: Duration::from_secs(2),
        };
        assert_eq!(timed_out.describe(), "timed out after 2.0s");
    }

    #[test]
    fn died_uses_last_stderr_line() {
        let died = ExecutionReport::Died {
            exit: "terminated by a signal (resource limit?)".to_string(),
            stderr: "Traceback...\nMemoryError\n\n".to_string(),
        };
        assert_eq!(
            died.describe(),
            "interpreter terminated by a signal (resource limit?) (MemoryError)"
        );
    }
}
