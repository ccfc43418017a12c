#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Scores answers against candidate questions.
pub mod engine;
/// Runs a whole grading pass over a folder of submissions.
pub mod orchestrator;
/// Grade summary and per-submission evaluation files.
pub mod report;
/// Scores, per-check outcomes and diagnostics.
pub mod results;
/// Submission discovery and parsing.
pub mod submission;

pub use engine::{best_of, evaluate, match_answer, score_answer};
pub use orchestrator::{
    CancelFlag, RunHandle, RunSummary, StudentTotal, run, run_with_connector, spawn,
    spawn_with_connector,
};
pub use report::{ReportFormat, ReportSink, clear_evaluations, summary_line, write_evaluation};
pub use results::{CheckOutcome, Diagnostic, DiagnosticKind, Grade, QuestionRow, ScoreResult};
pub use submission::{Answer, Submission, discover, parse_submission, read_submission};
