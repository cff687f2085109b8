//! Symbol contract between a test script and its code under test
//!
//! A test script expects certain names to exist in the code under test: the names it imports from the code module,
//! plus any free names it uses without binding them (scripts written to be `exec`'d alongside the code).
//! Expectations are read statically from the test script's syntax tree. Definitions are whatever the code's module
//! namespace holds after running it in the sandbox, so every binding form counts. [`compare`] decides whether the
//! contract holds before the test script is executed.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::time::Duration;

use serde::Deserialize;

use coursecheck_core::conventions;

use super::config::ValidatorConfig;
use super::error::{ValidatorError, ValidatorResult};
use super::sandbox::{Interpreter, Workspace};

const SYMBOL_PROBE: &str = include_str!("scripts/symbol_probe.py");
const SOURCE_FILE_NAME: &str = "snippet.py";

/// Names a snippet defines and expects, as reported by the probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SymbolReport {
    /// Names in the module namespace after execution
    #[serde(default)]
    pub defined: Vec<String>,
    /// Names imported with `from <code module> import ...`
    #[serde(default)]
    pub imported_from_code: Vec<String>,
    /// Names loaded but never bound anywhere (builtins excluded)
    #[serde(default)]
    pub free: Vec<String>,
    /// Modules star-imported (`from m import *`)
    #[serde(default)]
    pub star_imports: Vec<String>,
}

/// Result of checking the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolCheck {
    Satisfied,
    /// Some expectations could not be resolved because of a star import from `module`.
    Partial { module: String },
    Missing(Vec<String>),
}

/// Check that the code defines everything the test script expects.
pub fn compare(test: &SymbolReport, code: &SymbolReport, code_module: &str) -> SymbolCheck {
    let foreign_star = test.star_imports.iter().find(|m| m.as_str() != code_module);

    let mut expected: BTreeSet<&str> = test.imported_from_code.iter().map(String::as_str).collect();
    if foreign_star.is_none() {
        expected.extend(test.free.iter().map(String::as_str));
    }

    let defined: BTreeSet<&str> = code.defined.iter().map(String::as_str).collect();
    let missing: Vec<String> = expected
        .difference(&defined)
        .map(|name| name.to_string())
        .collect();

    if !missing.is_empty() {
        SymbolCheck::Missing(missing)
    } else if let Some(module) = foreign_star {
        SymbolCheck::Partial { module: module.clone() }
    } else {
        SymbolCheck::Satisfied
    }
}

/// Read the names `test_script` expects from the code module, without executing it.
pub fn probe_expectations(
    interpreter: &Interpreter,
    config: &ValidatorConfig,
    test_script: &str,
) -> ValidatorResult<SymbolReport> {
    run_probe(
        interpreter,
        "expectations",
        test_script,
        &[config.code_module_name.as_str()],
        config.probe_timeout,
    )
}

/// Run `code` with `input` stubbed and report the names its module namespace ends up with.
pub fn probe_definitions(interpreter: &Interpreter, config: &ValidatorConfig, code: &str) -> ValidatorResult<SymbolReport> {
    run_probe(
        interpreter,
        "definitions",
        code,
        &[config.input_sentinel.as_str(), conventions::SNIPPET_MODULE_NAME],
        config.execution_timeout,
    )
}

fn run_probe(
    interpreter: &Interpreter,
    mode: &str,
    source: &str,
    extra_args: &[&str],
    timeout: Duration,
) -> ValidatorResult<SymbolReport> {
    let workspace = Workspace::new()?;
    let source_path = workspace.write(SOURCE_FILE_NAME, source)?;
    let script = workspace.write_helper("symbol_probe.py", SYMBOL_PROBE)?;
    let report_path = workspace.report_path();

    let mut argv: Vec<&OsStr> = vec![
        script.as_os_str(),
        OsStr::new(mode),
        source_path.as_os_str(),
        report_path.as_os_str(),
    ];
    argv.extend(extra_args.iter().map(OsStr::new));

    let output = interpreter.run(&workspace, argv, timeout)?;

    workspace
        .read_report()?
        .ok_or_else(|| ValidatorError::MissingReport(format!("{}: {}", output.describe_exit(), output.stderr.trim())))
}
