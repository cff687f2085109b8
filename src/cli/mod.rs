//! CLI module for coursecheck
//!
//! ## Commands
//!
//! - `check <file>` / `check -c CODE` - Syntax and executability check of one snippet
//! - `test <code> <test>` - Full code-with-tests pipeline
//! - `plan <plan.json>` - Outline a course plan and validate every stage's snippets
//! - `outline <plan.json>` - Print a course plan outline
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::validator::{SandboxLimits, ValidatorConfig};
use crate::version::COURSECHECK_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);

    /// Map a pass/fail outcome onto an exit code.
    pub fn from_passed(passed: bool) -> Self {
        if passed { Self::SUCCESS } else { Self::FAILURE }
    }
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Validate the code snippets and test scripts embedded in course plans
#[derive(Parser, Debug)]
#[command(name = "coursecheck")]
#[command(version = COURSECHECK_VERSION)]
#[command(about = "Validate Python snippets and unittest scripts from course plans", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub sandbox: SandboxArgs,
}

/// Interpreter and sandbox settings shared by every command.
#[derive(Args, Debug, Clone)]
pub struct SandboxArgs {
    /// Python interpreter to run snippets with
    #[arg(long = "python", value_name = "PATH", default_value = "python3", global = true)]
    pub python: PathBuf,

    /// Wall-clock limit for syntax, executability and symbol checks (seconds)
    #[arg(long, value_name = "SECS", default_value_t = 10.0, global = true)]
    pub timeout: f64,

    /// Wall-clock limit for the unittest run (seconds)
    #[arg(long = "test-timeout", value_name = "SECS", default_value_t = 60.0, global = true)]
    pub test_timeout: f64,

    /// CPU time limit per interpreter process (seconds, 0 = unlimited)
    #[arg(long = "cpu-seconds", value_name = "SECS", default_value_t = 10, global = true)]
    pub cpu_seconds: u64,

    /// Address-space limit per interpreter process (MiB, 0 = unlimited)
    #[arg(long = "memory-mb", value_name = "MB", default_value_t = 512, global = true)]
    pub memory_mb: u64,

    /// Let snippets open network sockets
    #[arg(long = "allow-network", global = true)]
    pub allow_network: bool,

    /// Value returned by the stubbed input()
    #[arg(long = "input", value_name = "TEXT", global = true)]
    pub input: Option<String>,
}

impl SandboxArgs {
    /// Build the validator configuration these flags describe.
    pub fn to_config(&self) -> CliResult<ValidatorConfig> {
        let timeout = seconds("--timeout", self.timeout)?;
        let test_timeout = seconds("--test-timeout", self.test_timeout)?;

        let limits = SandboxLimits {
            cpu_seconds: (self.cpu_seconds > 0).then_some(self.cpu_seconds),
            memory_bytes: (self.memory_mb > 0).then(|| self.memory_mb.saturating_mul(1024 * 1024)),
            allow_network: self.allow_network,
        };

        let mut config = ValidatorConfig::new()
            .with_interpreter(&self.python)
            .with_probe_timeout(timeout)
            .with_execution_timeout(timeout)
            .with_test_timeout(test_timeout)
            .with_limits(limits);
        if let Some(input) = &self.input {
            config = config.with_input_sentinel(input);
        }
        Ok(config)
    }
}

fn seconds(flag: &str, value: f64) -> CliResult<Duration> {
    match Duration::try_from_secs_f64(value) {
        Ok(duration) if !duration.is_zero() => Ok(duration),
        _ => Err(CliError::failure(format!(
            "Error: {} must be a positive number of seconds, got {}",
            flag, value
        ))),
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that a snippet parses and runs
    Check {
        /// Python file to check
        #[arg(value_name = "FILE", conflicts_with = "code", required_unless_present = "code")]
        file: Option<PathBuf>,
        /// Check inline source code
        #[arg(short = 'c', long = "code", value_name = "CODE")]
        code: Option<String>,
    },

    /// Check code and its unittest script, then run the tests
    Test {
        /// Code under test (imported by the tests as `code_to_test`)
        #[arg(value_name = "CODE_FILE")]
        code_file: PathBuf,
        /// unittest script
        #[arg(value_name = "TEST_FILE")]
        test_file: PathBuf,
    },

    /// Outline a course plan and validate its snippets
    Plan {
        /// Course plan JSON file
        #[arg(value_name = "PLAN")]
        plan: PathBuf,
        /// Run each stage's test script against its code instead of checking them separately
        #[arg(long = "with-tests")]
        with_tests: bool,
        /// Only validate this stage (1-based)
        #[arg(long, value_name = "N")]
        stage: Option<usize>,
        /// Skip the outline
        #[arg(long = "no-outline")]
        no_outline: bool,
    },

    /// Print a course plan outline
    Outline {
        /// Course plan JSON file
        #[arg(value_name = "PLAN")]
        plan: PathBuf,
        /// Dump the whole document tree instead of the curated outline
        #[arg(long)]
        tree: bool,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
pub fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Check { file, code } => {
            let config = cli.sandbox.to_config()?;
            let source = match (code, file) {
                (Some(code), _) => code,
                (None, Some(file)) => commands::read_source(&file)?,
                (None, None) => return Err(CliError::failure("Error: check requires a file path or -c \"code\"")),
            };
            commands::check_snippet(&source, config)
        }
        Command::Test { code_file, test_file } => {
            let config = cli.sandbox.to_config()?;
            commands::check_pair(&code_file, &test_file, config)
        }
        Command::Plan {
            plan,
            with_tests,
            stage,
            no_outline,
        } => {
            let options = commands::PlanOptions {
                with_tests,
                stage,
                outline: !no_outline,
            };
            commands::validate_plan(&plan, &options, cli.sandbox.to_config()?)
        }
        Command::Outline { plan, tree } => commands::print_outline(&plan, tree),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_check_file() {
        let cli = Cli::try_parse_from(["coursecheck", "check", "snippet.py"]).unwrap();
        if let Command::Check { file, code } = cli.command {
            assert_eq!(file, Some(PathBuf::from("snippet.py")));
            assert!(code.is_none());
        } else {
            panic!("Expected Check command");
        }
    }

    #[test]
    fn test_cli_parse_check_inline_code() {
        let cli = Cli::try_parse_from(["coursecheck", "check", "-c", "print(1)"]).unwrap();
        if let Command::Check { code, .. } = cli.command {
            assert_eq!(code.as_deref(), Some("print(1)"));
        } else {
            panic!("Expected Check command");
        }
    }

    #[test]
    fn test_cli_check_requires_input() {
        assert!(Cli::try_parse_from(["coursecheck", "check"]).is_err());
        assert!(Cli::try_parse_from(["coursecheck", "check", "a.py", "-c", "x = 1"]).is_err());
    }

    #[test]
    fn test_cli_parse_plan_flags() {
        let cli = Cli::try_parse_from(["coursecheck", "plan", "course.json", "--with-tests", "--stage", "2"]).unwrap();
        if let Command::Plan {
            with_tests,
            stage,
            no_outline,
            ..
        } = cli.command
        {
            assert!(with_tests);
            assert_eq!(stage, Some(2));
            assert!(!no_outline);
        } else {
            panic!("Expected Plan command");
        }
    }

    #[test]
    fn test_sandbox_flags_map_to_config() {
        let cli = Cli::try_parse_from([
            "coursecheck",
            "test",
            "code.py",
            "test.py",
            "--python",
            "/opt/python3.12",
            "--test-timeout",
            "5",
            "--memory-mb",
            "0",
            "--allow-network",
            "--input",
            "Ada",
        ])
        .unwrap();
        let config = cli.sandbox.to_config().unwrap();
        assert_eq!(config.interpreter, PathBuf::from("/opt/python3.12"));
        assert_eq!(config.test_timeout, Duration::from_secs(5));
        assert_eq!(config.execution_timeout, Duration::from_secs(10));
        assert_eq!(config.limits.memory_bytes, None);
        assert_eq!(config.limits.cpu_seconds, Some(10));
        assert!(config.limits.allow_network);
        assert_eq!(config.input_sentinel, "Ada");
    }

    #[test]
    fn test_default_sandbox_matches_validator_defaults() {
        let cli = Cli::try_parse_from(["coursecheck", "outline", "course.json"]).unwrap();
        let config = cli.sandbox.to_config().unwrap();
        assert_eq!(config.limits, SandboxLimits::default());
        assert_eq!(config.input_sentinel, "mocked_input");
    }

    #[test]
    fn test_non_positive_timeout_rejected() {
        let cli = Cli::try_parse_from(["coursecheck", "check", "-c", "x = 1", "--timeout", "0"]).unwrap();
        let err = cli.sandbox.to_config().unwrap_err();
        assert!(err.message.contains("--timeout"));
        assert_eq!(err.exit_code, ExitCode::FAILURE);
    }
}
