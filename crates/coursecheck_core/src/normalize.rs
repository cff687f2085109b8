//! Snippet normalization applied before any check runs.

/// Normalize a snippet before validation.
///
/// Strips leading and trailing whitespace. Interior content, including indentation of the first line after any
/// leading blank lines, is left untouched.
///
/// ## Notes
/// - Idempotent: `clean(clean(x)) == clean(x)` for every input.
/// - This is the single place further normalization would go. Nothing else (e.g. markdown fence stripping) is done
///   today.
///
/// ## Examples
/// ```rust
/// use coursecheck_core::clean;
///
/// assert_eq!(clean("\n  print(1)\n\n"), "print(1)");
/// assert_eq!(clean("   "), "");
/// ```
pub fn clean(snippet: &str) -> &str {
    snippet.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_surrounding_whitespace() {
        assert_eq!(clean("\t x = 1 \r\n"), "x = 1");
    }

    #[test]
    fn keeps_interior_indentation() {
        let src = "\n\ndef f():\n    return 1\n";
        assert_eq!(clean(src), "def f():\n    return 1");
    }

    #[test]
    fn empty_and_blank_inputs() {
        assert_eq!(clean(""), "");
        assert_eq!(clean(" \n\t "), "");
    }

    #[test]
    fn idempotent_on_samples() {
        for s in ["", " ", "a", " a ", "\n\nclass A:\n    pass\n\n"] {
            assert_eq!(clean(clean(s)), clean(s));
        }
    }
}
