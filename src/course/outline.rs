//! Text outlines of a course plan
//!
//! Two renderings:
//! - [`render_outline`]: the curated view (headline fields, then each stage's topics, project work and snippets).
//! - [`render_document`]: a generic dump of any JSON tree, produced by [`walk`]ing it with an [`OutlineWriter`].
//!   Objects and arrays become headings with title-cased keys; scalars become `Key: value` lines.

use std::fmt::Write;

use serde_json::Value;

use super::plan::CoursePlan;

/// Callbacks for a depth-first walk over a JSON tree.
pub trait DocumentVisitor {
    /// An object or array named `key` starts. Array items have an empty key.
    fn enter_section(&mut self, key: &str, depth: usize);

    /// A scalar leaf (string, number, bool or null).
    fn scalar(&mut self, key: &str, value: &Value, depth: usize);

    fn exit_section(&mut self, _key: &str, _depth: usize) {}
}

/// Walk `value` depth-first, starting at depth 0.
pub fn walk(key: &str, value: &Value, visitor: &mut impl DocumentVisitor) {
    walk_at(key, value, visitor, 0);
}

fn walk_at(key: &str, value: &Value, visitor: &mut impl DocumentVisitor, depth: usize) {
    match value {
        Value::Object(map) => {
            visitor.enter_section(key, depth);
            for (sub_key, sub_value) in map {
                walk_at(sub_key, sub_value, visitor, depth + 1);
            }
            visitor.exit_section(key, depth);
        }
        Value::Array(items) => {
            visitor.enter_section(key, depth);
            for item in items {
                walk_at("", item, visitor, depth + 1);
            }
            visitor.exit_section(key, depth);
        }
        _ => visitor.scalar(key, value, depth),
    }
}

/// Title-case a snake_case key: `work_on_project` becomes `Work On Project`.
///
/// Every run of letters starts upper-case and continues lower-case, so `stage_2nd` becomes `Stage 2Nd`.
pub fn title_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut in_word = false;
    for c in key.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Display form of a scalar: strings unquoted, everything else as JSON.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders a walked document as indented text.
#[derive(Debug, Default)]
pub struct OutlineWriter {
    out: String,
}

impl OutlineWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
    }
}

impl DocumentVisitor for OutlineWriter {
    fn enter_section(&mut self, key: &str, depth: usize) {
        if key.is_empty() {
            return;
        }
        self.indent(depth);
        let _ = writeln!(self.out, "{}", title_case(key));
    }

    fn scalar(&mut self, key: &str, value: &Value, depth: usize) {
        let text = scalar_text(value);
        self.indent(depth);
        if key.is_empty() {
            let _ = write!(self.out, "- ");
        } else {
            let _ = write!(self.out, "{}: ", title_case(key));
        }

        let mut lines = text.lines();
        let _ = writeln!(self.out, "{}", lines.next().unwrap_or(""));
        for line in lines {
            self.indent(depth + 2);
            let _ = writeln!(self.out, "{}", line);
        }
    }
}

/// Generic dump of a whole document.
pub fn render_document(document: &Value) -> String {
    let mut writer = OutlineWriter::new();
    match document {
        Value::Object(map) => {
            for (key, value) in map {
                walk(key, value, &mut writer);
            }
        }
        other => walk("", other, &mut writer),
    }
    writer.finish()
}

/// Curated outline of a course plan.
pub fn render_outline(plan: &CoursePlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", plan.project_title);
    section(&mut out, "Project Description", &plan.project_description);
    section(&mut out, "Language", &plan.language);
    section(&mut out, "Target Audience", &plan.target_audience);
    section(&mut out, "Difficulty", &plan.difficulty);
    section(
        &mut out,
        "Time to Complete (in hours)",
        &plan.time_to_complete_in_hours.to_string(),
    );
    section(&mut out, "Number of Stages", &plan.num_of_stages.to_string());
    let _ = writeln!(out, "\n## List of Stage Titles");
    for title in &plan.list_of_stages_titles {
        let _ = writeln!(out, "- {}", title);
    }

    for stage in &plan.stages {
        let _ = writeln!(out, "\n## Stage {}: {}", stage.number, stage.title);
        let _ = writeln!(out, "\n#### List of Topics");
        for topic in &stage.topics {
            let _ = writeln!(out, "- {}", topic);
        }

        let work = &stage.work_on_project;
        let _ = writeln!(out, "\n#### Work on Project");
        let _ = writeln!(out, "Description: {}", work.description);
        let _ = writeln!(out, "Requirements Functionality: {}", inline(&work.requirements_functionality));
        let _ = writeln!(out, "Output Example: {}", inline(&work.output_example));

        if let Some(test_script) = &stage.test_script {
            code_block(&mut out, "Test Script", test_script);
        }
        if let Some(code) = &stage.code {
            code_block(&mut out, "Code", code);
        }
    }
    out
}

fn section(out: &mut String, heading: &str, body: &str) {
    let _ = writeln!(out, "\n## {}\n{}", heading, body);
}

fn code_block(out: &mut String, heading: &str, source: &str) {
    let _ = writeln!(out, "\n### {}\n```python\n{}\n```", heading, source.trim_end());
}

/// Lists are joined with `; `, other values use their scalar text.
fn inline(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(scalar_text).collect::<Vec<_>>().join("; "),
        other => scalar_text(other),
    }
}
