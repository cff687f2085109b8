//! Well-known names shared by the validator and the snippets it runs.

/// File name the code under test is written to.
pub const CODE_FILE_NAME: &str = "code_to_test.py";

/// Module name a test script imports the code under test by.
pub const CODE_MODULE_NAME: &str = "code_to_test";

/// File name the test script is written to.
pub const TEST_FILE_NAME: &str = "test_script.py";

/// Interpreter launched when none is configured.
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Value the stubbed `input()` returns, whatever the prompt.
pub const INPUT_SENTINEL: &str = "mocked_input";

/// `__name__` given to executed snippets.
///
/// Anything other than `"__main__"` keeps `if __name__ == "__main__":` blocks from running during the
/// executability check.
pub const SNIPPET_MODULE_NAME: &str = "__snippet__";
