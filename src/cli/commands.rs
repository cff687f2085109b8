//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::path::Path;

use coursecheck_core::messages;

use crate::course::{self, CoursePlan, StagePlan};
use crate::validator::{ConsoleReporter, Validator, ValidatorConfig, Verdict};

use super::{CliError, CliResult, ExitCode};

/// Maximum snippet file size (10 MB)
const MAX_SOURCE_SIZE: u64 = 10 * 1024 * 1024;

/// Read a source file into a string.
///
/// Returns an error if:
/// - The file cannot be read (I/O error)
/// - The file exceeds `MAX_SOURCE_SIZE`
pub fn read_source(path: &Path) -> CliResult<String> {
    let metadata = fs::metadata(path)
        .map_err(|e| CliError::failure(format!("Cannot access file '{}': {}", path.display(), e)))?;

    if metadata.len() > MAX_SOURCE_SIZE {
        return Err(CliError::failure(format!(
            "File '{}' is too large ({} bytes, max {} bytes)",
            path.display(),
            metadata.len(),
            MAX_SOURCE_SIZE
        )));
    }

    fs::read_to_string(path).map_err(|e| CliError::failure(format!("Error reading file '{}': {}", path.display(), e)))
}

fn load_plan(path: &Path) -> CliResult<CoursePlan> {
    CoursePlan::load(path).map_err(|e| CliError::failure(format!("Error in '{}': {}", path.display(), e)))
}

/// Syntax and executability check of one snippet.
pub fn check_snippet(source: &str, config: ValidatorConfig) -> CliResult<ExitCode> {
    let mut validator = Validator::with_config(config);
    Ok(ExitCode::from_passed(validator.check_single_code(source)))
}

/// Full pipeline for a code file and its test script.
pub fn check_pair(code_file: &Path, test_file: &Path, config: ValidatorConfig) -> CliResult<ExitCode> {
    let code = read_source(code_file)?;
    let test_script = read_source(test_file)?;
    let mut validator = Validator::with_config(config);
    Ok(ExitCode::from_passed(validator.check_code_with_tests(&test_script, &code)))
}

/// Options for `plan`.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Pair each stage's test script with its code
    pub with_tests: bool,
    /// Restrict validation to one stage
    pub stage: Option<usize>,
    /// Print the outline first
    pub outline: bool,
}

/// One validated snippet, for the closing summary.
struct SnippetOutcome {
    label: String,
    verdict: Verdict,
}

/// Outline a course plan and validate every stage's snippets.
pub fn validate_plan(path: &Path, options: &PlanOptions, config: ValidatorConfig) -> CliResult<ExitCode> {
    let plan = load_plan(path)?;

    let stages: Vec<&StagePlan> = match options.stage {
        Some(number) => {
            let stage = plan.stage(number).ok_or_else(|| {
                CliError::failure(format!(
                    "Error: stage {} not found in '{}' (plan has {} stages)",
                    number,
                    path.display(),
                    plan.stages.len()
                ))
            })?;
            vec![stage]
        }
        None => plan.stages.iter().collect(),
    };

    if options.outline {
        println!("{}", course::render_outline(&plan));
    }

    let mut validator = Validator::with_config(config);
    let mut outcomes = Vec::new();
    for stage in stages {
        if !stage.has_snippets() {
            tracing::debug!(stage = stage.number, "no snippets to validate");
            continue;
        }
        println!("\n== Stage {}: {} ==", stage.number, stage.title);
        validate_stage(&mut validator, stage, options.with_tests, &mut outcomes);
    }

    Ok(print_summary(&outcomes))
}

fn validate_stage(
    validator: &mut Validator<ConsoleReporter>,
    stage: &StagePlan,
    with_tests: bool,
    outcomes: &mut Vec<SnippetOutcome>,
) {
    if let (true, Some(test_script), Some(code)) = (with_tests, &stage.test_script, &stage.code) {
        outcomes.push(SnippetOutcome {
            label: format!("stage {} code with tests", stage.number),
            verdict: validator.validate_code_with_tests(test_script, code),
        });
        return;
    }

    // Checked one by one, test script first.
    if let Some(test_script) = &stage.test_script {
        outcomes.push(SnippetOutcome {
            label: format!("stage {} test script", stage.number),
            verdict: validator.validate_single_code(test_script),
        });
    }
    if let Some(code) = &stage.code {
        outcomes.push(SnippetOutcome {
            label: format!("stage {} code", stage.number),
            verdict: validator.validate_single_code(code),
        });
    }
}

fn print_summary(outcomes: &[SnippetOutcome]) -> ExitCode {
    if outcomes.is_empty() {
        println!("\nNo snippets to validate.");
        return ExitCode::SUCCESS;
    }

    println!("\nSummary:");
    let mut passed = 0;
    for outcome in outcomes {
        match outcome.verdict {
            Verdict::Pass => {
                passed += 1;
                println!("{}", messages::success(&outcome.label));
            }
            Verdict::Fail { stage, kind } => {
                println!("{}", messages::failure(&format!("{} ({} at {})", outcome.label, kind, stage)));
            }
        }
    }
    println!("{}/{} snippets passed", passed, outcomes.len());
    ExitCode::from_passed(passed == outcomes.len())
}

/// Print a course plan outline.
pub fn print_outline(path: &Path, tree: bool) -> CliResult<ExitCode> {
    let plan = load_plan(path)?;
    if tree {
        print!("{}", course::render_document(plan.document()));
    } else {
        print!("{}", course::render_outline(&plan));
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn read_source_reports_missing_file() {
        let err = read_source(Path::new("/no/such/snippet.py")).unwrap_err();
        assert!(err.message.starts_with("Cannot access file '/no/such/snippet.py'"));
    }

    #[test]
    fn invalid_plan_names_the_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[1, 2").unwrap();
        let err = load_plan(file.path()).unwrap_err();
        assert!(err.message.contains("invalid course plan"));
        assert!(err.message.contains(&file.path().display().to_string()));
    }

    #[test]
    fn unknown_stage_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"project_title": "t", "project_description": "d", "language": "Python",
                "target_audience": "all", "difficulty": "easy", "time_to_complete_in_hours": 1,
                "num_of_stages": 0, "list_of_stages_titles": []}}"#
        )
        .unwrap();
        let options = PlanOptions {
            stage: Some(4),
            ..Default::default()
        };
        let err = validate_plan(file.path(), &options, ValidatorConfig::default()).unwrap_err();
        assert!(err.message.contains("stage 4 not found"));
    }

    #[test]
    fn summary_exit_code() {
        let pass = SnippetOutcome {
            label: "stage 1 code".to_string(),
            verdict: Verdict::Pass,
        };
        assert_eq!(print_summary(&[]), ExitCode::SUCCESS);
        assert_eq!(print_summary(&[pass]), ExitCode::SUCCESS);

        let fail = SnippetOutcome {
            label: "stage 2 code".to_string(),
            verdict: Verdict::Fail {
                stage: coursecheck_core::Stage::Execution,
                kind: coursecheck_core::FailureKind::Execution,
            },
        };
        assert_eq!(print_summary(&[fail]), ExitCode::FAILURE);
    }
}
