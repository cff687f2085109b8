//! Progress message wording.
//!
//! Messages are plain strings. Whether a message reports success or failure is carried by its leading glyph only;
//! there is no structured severity. [`is_success`] / [`is_failure`] recover it for consumers that need to.

/// Prefix of messages reporting a passed check.
pub const SUCCESS_GLYPH: &str = "✓";
/// Prefix of messages reporting a failed check.
pub const FAILURE_GLYPH: &str = "✗";

pub const CLEANING_SINGLE: &str = "Cleaning code...";
pub const CLEANING_PAIR: &str = "Cleaning test script and code script...";

pub const SYNTAX_OK: &str = "✓ Syntax is correct.";
pub const EXECUTION_OK: &str = "✓ Code executed successfully.";
pub const SYMBOLS_OK: &str = "✓ All symbols expected by the test script are defined.";

/// Prefix a message with the success glyph.
pub fn success(text: &str) -> String {
    format!("{SUCCESS_GLYPH} {text}")
}

/// Prefix a message with the failure glyph.
pub fn failure(text: &str) -> String {
    format!("{FAILURE_GLYPH} {text}")
}

pub fn syntax_error(description: &str) -> String {
    failure(&format!("Syntax error: {description}"))
}

pub fn syntax_unavailable(error: &str) -> String {
    failure(&format!("Syntax check could not run: {error}"))
}

pub fn execution_error(description: &str) -> String {
    failure(&format!("Execution error: {description}"))
}

pub fn execution_unavailable(error: &str) -> String {
    failure(&format!("Executability check could not run: {error}"))
}

pub fn missing_symbols(names: &[String]) -> String {
    failure(&format!("Missing symbols: {}", names.join(", ")))
}

pub fn symbol_check_unavailable(error: &str) -> String {
    failure(&format!("Symbol check could not run: {error}"))
}

/// Symbol check that could not resolve free names (unknown star import).
pub fn symbols_partially_checked(module: &str) -> String {
    success(&format!(
        "Imported symbols are defined; free names not checked because of `from {module} import *`."
    ))
}

pub fn tests_passed(output: &str) -> String {
    success(&format!("All tests passed:\n{output}"))
}

pub fn tests_failed(stdout: &str, stderr: &str) -> String {
    failure(&format!("Some tests failed:\n{stdout}\n{stderr}"))
}

pub fn test_infrastructure_failed(error: &str) -> String {
    failure(&format!("Test execution failed: {error}"))
}

pub fn timed_out(seconds: f64) -> String {
    format!("timed out after {seconds:.1}s")
}

/// Whether a message reports a passed check.
pub fn is_success(message: &str) -> bool {
    message.starts_with(SUCCESS_GLYPH)
}

/// Whether a message reports a failed check.
pub fn is_failure(message: &str) -> bool {
    message.starts_with(FAILURE_GLYPH)
}
