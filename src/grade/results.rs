#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use tabled::Tabled;
use typed_builder::TypedBuilder;

use crate::catalog::{Question, QuestionId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
/// A struct representing a grade
pub struct Grade {
    /// The actual grade received
    pub grade:  f64,
    /// The maximum grade possible
    pub out_of: f64,
}

impl Grade {
    /// Creates a new grade -
    /// * `grade` - The actual grade received
    /// * `out_of` - The maximum grade possible
    pub fn new(grade: f64, out_of: f64) -> Self {
        Self { grade, out_of }
    }
}

impl Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}/{:.2}", self.grade, self.out_of)
    }
}

/// What kind of degraded outcome a diagnostic records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// No catalog question matched the answer.
    Match,
    /// The same label was answered more than once; the repeat was not scored.
    Duplicate,
    /// A check identifier could not be resolved to a check.
    PluginResolution,
    /// A resolved check failed while running.
    CheckFailed,
    /// A session could not be opened or closed.
    Connection,
    /// Report output could not be written.
    Io,
}

impl DiagnosticKind {
    /// Short lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::Match => "match",
            DiagnosticKind::Duplicate => "duplicate",
            DiagnosticKind::PluginResolution => "plugin-resolution",
            DiagnosticKind::CheckFailed => "check-failed",
            DiagnosticKind::Connection => "connection",
            DiagnosticKind::Io => "io",
        }
    }
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Tabled, Serialize, Deserialize, TypedBuilder, Clone, Debug, PartialEq)]
#[builder(field_defaults(setter(into)))]
#[builder(doc)]
/// A non-fatal record of why something earned zero credit. Empty ids mean the
/// diagnostic is not about a particular student, question or check.
pub struct Diagnostic {
    /// * `kind`: category of the problem
    #[tabled(rename = "Kind")]
    pub kind:        DiagnosticKind,
    /// * `student_id`: submission the problem belongs to
    #[tabled(rename = "Student")]
    #[builder(default)]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub student_id:  String,
    /// * `question_id`: question the problem belongs to
    #[tabled(rename = "Question")]
    #[builder(default)]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub question_id: String,
    /// * `check_id`: check the problem belongs to
    #[tabled(rename = "Check")]
    #[builder(default)]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub check_id:    String,
    /// * `message`: what went wrong
    #[tabled(rename = "Message")]
    pub message:     String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if !self.student_id.is_empty() {
            write!(f, " student {}", self.student_id)?;
        }
        if !self.question_id.is_empty() {
            write!(f, " question {}", self.question_id)?;
        }
        if !self.check_id.is_empty() {
            write!(f, " check {}", self.check_id)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// How one check of the chosen question contributed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CheckOutcome {
    /// Check identifier.
    pub check_id:       String,
    /// Configured weight in percent.
    pub weight_percent: f64,
    /// Outcome in `[0, 1]`; 0 when the check could not run.
    pub outcome:        f64,
    /// Whether the check's condition held.
    pub applied:        bool,
    /// Points contributed before the question total was clamped.
    pub points:         f64,
}

/// Result of scoring one answer.
#[derive(Clone, Debug)]
pub struct ScoreResult {
    /// Identifier the student labelled the answer with.
    pub question_id: QuestionId,
    /// Best-scoring candidate question; `None` when nothing matched.
    pub chosen:      Option<Question>,
    /// Score earned, out of the chosen question's points.
    pub grade:       Grade,
    /// Per-check contributions of the chosen question.
    pub checks:      Vec<CheckOutcome>,
    /// Diagnostics explaining lost credit.
    pub diagnostics: Vec<Diagnostic>,
}

impl ScoreResult {
    /// A zero-credit result for an answer that matched no question.
    pub fn unmatched(question_id: QuestionId, diagnostic: Diagnostic) -> Self {
        Self {
            question_id,
            chosen: None,
            grade: Grade::default(),
            checks: Vec::new(),
            diagnostics: vec![diagnostic],
        }
    }

    /// Points earned.
    pub fn raw_score(&self) -> f64 {
        self.grade.grade
    }

    /// Points available on the chosen question.
    pub fn max_points(&self) -> f64 {
        self.grade.out_of
    }

    /// Identifier of the chosen question, if any.
    pub fn chosen_id(&self) -> Option<&QuestionId> {
        self.chosen.as_ref().map(|q| &q.id)
    }
}

#[derive(Tabled, Clone, Debug)]
/// A row of the per-submission evaluation table.
pub struct QuestionRow {
    #[tabled(rename = "Answer")]
    /// * `answer`: identifier the student used
    pub answer:  String,
    #[tabled(rename = "Scored as")]
    /// * `matched`: identifier of the chosen question
    pub matched: String,
    #[tabled(rename = "Grade")]
    /// * `grade`: points earned over points available
    pub grade:   Grade,
    #[tabled(rename = "Checks")]
    /// * `checks`: per-check outcomes
    pub checks:  String,
}

impl From<&ScoreResult> for QuestionRow {
    fn from(result: &ScoreResult) -> Self {
        let checks = result
            .checks
            .iter()
            .map(|c| {
                let gate = if c.applied { "" } else { " (skipped)" };
                format!("{} {:.2}x{}%{}", c.check_id, c.outcome, c.weight_percent, gate)
            })
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            answer: result.question_id.to_string(),
            matched: result
                .chosen_id()
                .map(ToString::to_string)
                .unwrap_or_else(|| "-".to_string()),
            grade: result.grade,
            checks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_displays_two_decimals() {
        assert_eq!(Grade::new(9.5, 10.0).to_string(), "9.50/10.00");
    }

    #[test]
    fn diagnostic_display_names_its_context() {
        let diag = Diagnostic::builder()
            .kind(DiagnosticKind::PluginResolution)
            .student_id("alice")
            .question_id("2a")
            .check_id("Nope")
            .message("No check is registered under `Nope`")
            .build();
        let shown = diag.to_string();
        assert!(shown.starts_with("[plugin-resolution] student alice question 2a check Nope"));
    }
}
