//! Syntax probe
//!
//! Parses a snippet with the interpreter's own grammar (`ast.parse`) without executing it.

use serde::Deserialize;

use crate::diagnostics::{SourceLocation, format_excerpt};

use super::config::ValidatorConfig;
use super::error::{ValidatorError, ValidatorResult};
use super::sandbox::{Interpreter, Workspace};

const SYNTAX_PROBE: &str = include_str!("scripts/syntax_probe.py");
const SOURCE_FILE_NAME: &str = "snippet.py";

/// Outcome of parsing a snippet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyntaxReport {
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub line: Option<usize>,
    #[serde(default)]
    pub column: Option<usize>,
}

impl SyntaxReport {
    pub fn valid() -> Self {
        Self {
            ok: true,
            message: None,
            line: None,
            column: None,
        }
    }

    pub fn invalid(message: impl Into<String>, line: Option<usize>, column: Option<usize>) -> Self {
        Self {
            ok: false,
            message: Some(message.into()),
            line,
            column,
        }
    }

    /// Describe the error with its position and, when available, the offending line.
    pub fn describe(&self, source: &str) -> String {
        let message = self.message.as_deref().unwrap_or("invalid syntax");
        let Some(line) = self.line else {
            return message.to_string();
        };
        let column = self.column.unwrap_or(1);
        let mut out = format!("{} (line {}, column {})", message, line, column);
        if let Some(excerpt) = format_excerpt(source, SourceLocation { line, column }) {
            out.push('\n');
            out.push_str(&excerpt);
        }
        out
    }
}

/// Parse `source` in a sandboxed interpreter.
pub fn probe(interpreter: &Interpreter, config: &ValidatorConfig, source: &str) -> ValidatorResult<SyntaxReport> {
    let workspace = Workspace::new()?;
    let source_path = workspace.write(SOURCE_FILE_NAME, source)?;
    let script = workspace.write_helper("syntax_probe.py", SYNTAX_PROBE)?;
    let report_path = workspace.report_path();

    let output = interpreter.run(
        &workspace,
        [script.as_os_str(), source_path.as_os_str(), report_path.as_os_str()],
        config.probe_timeout,
    )?;

    workspace
        .read_report()?
        .ok_or_else(|| ValidatorError::MissingReport(format!("{}: {}", output.describe_exit(), output.stderr.trim())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn describe_with_location_includes_excerpt() {
        let report = SyntaxReport::invalid("'(' was never closed", Some(1), Some(6));
        let text = report.describe("print(\"hi\"");
        assert!(text.starts_with("'(' was never closed (line 1, column 6)"));
        assert!(text.contains("1 | print(\"hi\""));
        assert!(text.ends_with('^'));
    }

    #[test]
    fn describe_without_location() {
        let report = SyntaxReport::invalid("source code string cannot contain null bytes", None, None);
        assert_eq!(report.describe("x\0"), "source code string cannot contain null bytes");
    }

    #[test]
    fn report_deserializes_from_probe_json() {
        let report: SyntaxReport =
            serde_json::from_str(r#"{"ok": false, "message": "invalid syntax", "line": 2, "column": 3}"#).unwrap();
        assert_eq!(report, SyntaxReport::invalid("invalid syntax", Some(2), Some(3)));

        let ok: SyntaxReport = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert_eq!(ok, SyntaxReport::valid());
    }
}
