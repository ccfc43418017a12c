#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use serde::Serialize;
use tabled::Tabled;
use tokio::task::JoinHandle;

use crate::{
    catalog::{self, AssignmentCatalog},
    checks::CheckRegistry,
    config::RunConfig,
    connector::{self, Connector, SessionGuard},
    error::GradeError,
    grade::{
        engine::score_answer,
        report::{ReportSink, clear_evaluations, write_evaluation},
        results::{Diagnostic, DiagnosticKind},
        submission::{Submission, discover, read_submission},
    },
};

/// Cooperative cancellation shared between a run and whoever started it. Only
/// consulted between submissions.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A flag that is not set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Tabled, Serialize, Clone, Debug, PartialEq)]
/// A student's total for the run.
pub struct StudentTotal {
    #[tabled(rename = "Student")]
    /// * `student_id`: who the submission belongs to
    pub student_id: String,
    #[tabled(rename = "File")]
    /// * `file_name`: submission file
    pub file_name:  String,
    #[tabled(rename = "Total")]
    /// * `total`: sum of per-answer scores
    pub total:      f64,
}

/// What a run did.
#[derive(Serialize, Clone, Debug, Default)]
pub struct RunSummary {
    /// Assignment name from the catalog.
    pub assignment:  String,
    /// Submissions scored and reported.
    pub processed:   usize,
    /// Submissions that could not be scored.
    pub skipped:     usize,
    /// Whether the run stopped early on request.
    pub cancelled:   bool,
    /// Totals in processing order.
    pub totals:      Vec<StudentTotal>,
    /// Everything that cost credit or output.
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds the configured connector and grades every submission.
pub fn run(
    config: &RunConfig,
    registry: &CheckRegistry,
    cancel: &CancelFlag,
) -> Result<RunSummary, GradeError> {
    let connector = connector::open(&config.connection);
    run_with_connector(config, connector.as_ref(), registry, cancel)
}

/// Grades every submission using `connector` for sessions.
///
/// Catalog and submission-folder problems abort the run; anything that goes
/// wrong with a single submission is recorded and the run moves on.
pub fn run_with_connector(
    config: &RunConfig,
    connector: &dyn Connector,
    registry: &CheckRegistry,
    cancel: &CancelFlag,
) -> Result<RunSummary, GradeError> {
    let catalog = catalog::load(&config.catalog_path)?;
    for id in catalog.check_ids() {
        if !registry.contains(id) {
            tracing::warn!("Check `{id}` is used in the catalog but not registered");
        }
    }

    if let Some(dir) = &config.evaluations_dir {
        let cleared = clear_evaluations(dir)?;
        if cleared > 0 {
            tracing::info!("Removed {cleared} evaluation files left by an earlier run");
        }
    }

    let mut sink = ReportSink::create(&config.report_path, catalog.name(), config.format)?;
    let mut summary = RunSummary {
        assignment: catalog.name().to_string(),
        ..RunSummary::default()
    };

    let files = match discover(&config.submissions_dir, &config.submission_extension) {
        Ok(files) => files,
        Err(e) => {
            if let Err(close) = sink.close() {
                tracing::warn!("{close}");
            }
            return Err(e.into());
        }
    };
    tracing::info!(
        "Grading {} submissions for {} against {} backend",
        files.len(),
        catalog.name(),
        connector.kind()
    );

    for path in &files {
        if cancel.is_cancelled() {
            tracing::warn!(
                "Run cancelled; {} submissions left ungraded",
                files.len() - summary.processed - summary.skipped
            );
            summary.cancelled = true;
            break;
        }
        grade_one(path, &catalog, connector, registry, config, &mut sink, &mut summary);
    }

    if let Err(e) = sink.close() {
        tracing::warn!("{e}");
        summary.diagnostics.push(
            Diagnostic::builder()
                .kind(DiagnosticKind::Io)
                .message(e.to_string())
                .build(),
        );
    }
    Ok(summary)
}

/// Scores, reports and records one submission file.
fn grade_one(
    path: &Path,
    catalog: &AssignmentCatalog,
    connector: &dyn Connector,
    registry: &CheckRegistry,
    config: &RunConfig,
    sink: &mut ReportSink,
    summary: &mut RunSummary,
) {
    let mut submission = match read_submission(path) {
        Ok(submission) => submission,
        Err(e) => {
            tracing::warn!("{e}");
            summary.skipped += 1;
            summary.diagnostics.push(
                Diagnostic::builder()
                    .kind(DiagnosticKind::Io)
                    .message(e.to_string())
                    .build(),
            );
            return;
        }
    };

    for id in &submission.repeated {
        tracing::warn!("{}: answer {id} repeated; only the first is scored", submission.student_id);
        summary.diagnostics.push(
            Diagnostic::builder()
                .kind(DiagnosticKind::Duplicate)
                .student_id(submission.student_id.as_str())
                .question_id(id.as_str())
                .message("answer repeated; only the first one is scored")
                .build(),
        );
    }

    let mut guard = match SessionGuard::acquire(connector) {
        Ok(guard) => guard,
        Err(e) => {
            tracing::warn!("{}: {e}", submission.student_id);
            summary.skipped += 1;
            summary.diagnostics.push(
                Diagnostic::builder()
                    .kind(DiagnosticKind::Connection)
                    .student_id(submission.student_id.as_str())
                    .message(e.to_string())
                    .build(),
            );
            return;
        }
    };

    let results: Vec<_> = match guard.session() {
        Ok(session) => submission
            .answers
            .iter()
            .map(|answer| {
                score_answer(catalog, answer, &submission.student_id, registry, &mut *session)
            })
            .collect(),
        Err(e) => {
            summary.skipped += 1;
            summary.diagnostics.push(
                Diagnostic::builder()
                    .kind(DiagnosticKind::Connection)
                    .student_id(submission.student_id.as_str())
                    .message(e.to_string())
                    .build(),
            );
            return;
        }
    };
    submission.attach_results(results);

    if let Err(e) = guard.release() {
        tracing::warn!("{}: {e}", submission.student_id);
        summary.diagnostics.push(
            Diagnostic::builder()
                .kind(DiagnosticKind::Connection)
                .student_id(submission.student_id.as_str())
                .message(e.to_string())
                .build(),
        );
    }

    report(&submission, config, sink, summary);
    tracing::info!(
        "{}: {}",
        submission.student_id,
        config.format.score(submission.total_score)
    );

    summary.processed += 1;
    summary
        .diagnostics
        .extend(submission.results.iter().flat_map(|r| r.diagnostics.iter().cloned()));
    summary.totals.push(StudentTotal {
        student_id: submission.student_id,
        file_name:  submission.file_name,
        total:      submission.total_score,
    });
}

/// Writes the summary line and, when configured, the evaluation file.
fn report(
    submission: &Submission,
    config: &RunConfig,
    sink: &mut ReportSink,
    summary: &mut RunSummary,
) {
    let io_failure = |message: String| {
        Diagnostic::builder()
            .kind(DiagnosticKind::Io)
            .student_id(submission.student_id.as_str())
            .message(message)
            .build()
    };

    if let Err(e) = sink.append_submission(submission) {
        tracing::warn!("{e}");
        summary.diagnostics.push(io_failure(e.to_string()));
    }

    if let Some(dir) = &config.evaluations_dir {
        match write_evaluation(dir, submission, config.format) {
            Ok(path) => tracing::debug!("Wrote {}", path.display()),
            Err(e) => {
                tracing::warn!("{e}");
                summary.diagnostics.push(io_failure(e.to_string()));
            }
        }
    }
}

/// A run on a background task.
#[derive(Debug)]
pub struct RunHandle {
    /// Shared with the running task.
    cancel: CancelFlag,
    /// The task itself.
    task:   JoinHandle<Result<RunSummary, GradeError>>,
}

impl RunHandle {
    /// Asks the run to stop before the next submission.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The flag the run checks, for wiring to other cancellation sources.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Waits for the run to finish.
    pub async fn join(self) -> Result<RunSummary, GradeError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(GradeError::Join(e.to_string())),
        }
    }
}

/// Starts [`run`] on a blocking task. Must be called inside a Tokio runtime.
pub fn spawn(config: RunConfig, registry: Arc<CheckRegistry>) -> RunHandle {
    let connector = connector::open(&config.connection);
    spawn_with_connector(config, connector, registry)
}

/// Starts [`run_with_connector`] on a blocking task. Must be called inside a
/// Tokio runtime.
pub fn spawn_with_connector(
    config: RunConfig,
    connector: Box<dyn Connector>,
    registry: Arc<CheckRegistry>,
) -> RunHandle {
    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    let task = tokio::task::spawn_blocking(move || {
        run_with_connector(&config, connector.as_ref(), &registry, &flag)
    });
    RunHandle { cancel, task }
}
