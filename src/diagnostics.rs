//! Source-context rendering for syntax errors
//!
//! Turns an interpreter-reported (line, column) into the offending source line with a caret underneath, so the
//! syntax failure message points at the problem without the reader opening the snippet.

/// A location reported by the parser (1-based line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

/// Render a compact excerpt for `location`:
///
/// ```text
///   2 | def f(:
///     |       ^
/// ```
///
/// Returns `None` when the line does not exist in `source` (e.g. errors reported past EOF).
pub fn format_excerpt(source: &str, location: SourceLocation) -> Option<String> {
    let line_text = line_text(source, location.line)?;

    let line_num_width = location.line.to_string().len();
    // Columns are counted in characters; clamp to just past the end of the line.
    let col = location.column.max(1).min(line_text.chars().count() + 1);

    let mut out = String::new();
    out.push_str(&format!("  {:>width$} | {}\n", location.line, line_text, width = line_num_width));
    out.push_str(&format!(
        "  {:>width$} | {}^",
        "",
        " ".repeat(col - 1),
        width = line_num_width
    ));
    Some(out)
}

/// Get the text of a 1-based line, without its terminator.
///
/// A trailing newline opens one more (empty) line; the parser reports end-of-input errors there.
fn line_text(source: &str, line: usize) -> Option<&str> {
    if line == 0 {
        return None;
    }
    source.split('\n').nth(line - 1).map(|l| l.trim_end_matches('\r'))
}
