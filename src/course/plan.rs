//! Course plan document
//!
//! A course plan is an auto-generated JSON document: headline fields, an ordered list of stage titles, and one
//! `stage_{i}` object per stage. Stages may carry a `code` snippet and a `test_script`, which are what the validator
//! checks. The full document is kept alongside the typed view so it can be walked generically.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CourseError {
    #[error("failed to read course plan {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("course plan {path} is too large ({size} bytes, max {max} bytes)")]
    TooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("invalid course plan: {0}")]
    Json(#[from] serde_json::Error),
}

/// Largest course plan file [`CoursePlan::load`] accepts (10 MB)
pub const MAX_PLAN_SIZE: u64 = 10 * 1024 * 1024;

pub type CourseResult<T> = Result<T, CourseError>;

#[derive(Debug, Clone, Deserialize)]
struct Headline {
    project_title: String,
    project_description: String,
    language: String,
    target_audience: String,
    difficulty: String,
    time_to_complete_in_hours: f64,
    num_of_stages: usize,
    list_of_stages_titles: Vec<String>,
}

/// The project work attached to a stage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkOnProject {
    pub description: String,
    /// Free-form: generators emit either prose or a list of requirements.
    pub requirements_functionality: Value,
    pub output_example: Value,
}

#[derive(Debug, Clone, Deserialize)]
struct StageBody {
    list_of_topics_covered: Vec<String>,
    work_on_project: WorkOnProject,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    test_script: Option<String>,
}

/// One stage of the plan.
#[derive(Debug, Clone, PartialEq)]
pub struct StagePlan {
    /// 1-based stage number
    pub number: usize,
    pub title: String,
    pub topics: Vec<String>,
    pub work_on_project: WorkOnProject,
    pub code: Option<String>,
    pub test_script: Option<String>,
}

impl StagePlan {
    /// Whether the stage carries anything the validator can check.
    pub fn has_snippets(&self) -> bool {
        self.code.is_some() || self.test_script.is_some()
    }
}

/// A parsed course plan.
#[derive(Debug, Clone)]
pub struct CoursePlan {
    pub project_title: String,
    pub project_description: String,
    pub language: String,
    pub target_audience: String,
    pub difficulty: String,
    pub time_to_complete_in_hours: f64,
    pub num_of_stages: usize,
    pub list_of_stages_titles: Vec<String>,
    /// Stages present in the document, in order. Keys declared by `num_of_stages` but absent are skipped.
    pub stages: Vec<StagePlan>,
    document: Value,
}

impl CoursePlan {
    /// Parse a course plan from JSON text.
    pub fn from_json(text: &str) -> CourseResult<Self> {
        let document: Value = serde_json::from_str(text)?;
        Self::from_value(document)
    }

    /// Read and parse a course plan file no larger than [`MAX_PLAN_SIZE`].
    pub fn load(path: &Path) -> CourseResult<Self> {
        let io_error = |source: std::io::Error| CourseError::Io {
            path: path.to_path_buf(),
            source,
        };
        let size = fs::metadata(path).map_err(io_error)?.len();
        if size > MAX_PLAN_SIZE {
            return Err(CourseError::TooLarge {
                path: path.to_path_buf(),
                size,
                max: MAX_PLAN_SIZE,
            });
        }
        let text = fs::read_to_string(path).map_err(io_error)?;
        Self::from_json(&text)
    }

    pub fn from_value(document: Value) -> CourseResult<Self> {
        let headline = Headline::deserialize(&document)?;

        let mut stages = Vec::new();
        for number in 1..=headline.num_of_stages {
            let Some(raw) = document.get(format!("stage_{}", number)) else {
                tracing::debug!(number, "stage declared but absent, skipping");
                continue;
            };
            let body = StageBody::deserialize(raw)?;
            let title = headline
                .list_of_stages_titles
                .get(number - 1)
                .cloned()
                .unwrap_or_default();
            stages.push(StagePlan {
                number,
                title,
                topics: body.list_of_topics_covered,
                work_on_project: body.work_on_project,
                code: body.code,
                test_script: body.test_script,
            });
        }

        Ok(Self {
            project_title: headline.project_title,
            project_description: headline.project_description,
            language: headline.language,
            target_audience: headline.target_audience,
            difficulty: headline.difficulty,
            time_to_complete_in_hours: headline.time_to_complete_in_hours,
            num_of_stages: headline.num_of_stages,
            list_of_stages_titles: headline.list_of_stages_titles,
            stages,
            document,
        })
    }

    /// The whole document as parsed.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Look up a stage by its 1-based number.
    pub fn stage(&self, number: usize) -> Option<&StagePlan> {
        self.stages.iter().find(|s| s.number == number)
    }
}
