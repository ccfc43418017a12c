#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tabled::{
    Table,
    settings::{Alignment, Modify, Panel, Style, Width, object::Rows},
};

use crate::{
    constants::{DEFAULT_DECIMALS, EVALUATION_EXTENSION},
    error::ReportError,
    grade::{results::QuestionRow, submission::Submission},
    util::{file_stem, find_files},
};

/// How numbers are printed in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFormat {
    /// Digits after the decimal point.
    pub decimals: usize,
}

impl ReportFormat {
    /// A format printing `decimals` digits after the decimal point.
    pub fn new(decimals: usize) -> Self {
        Self { decimals }
    }

    /// Formats one score.
    pub fn score(&self, value: f64) -> String {
        format!("{:.*}", self.decimals, value)
    }
}

impl Default for ReportFormat {
    fn default() -> Self {
        Self::new(DEFAULT_DECIMALS)
    }
}

/// The grade summary line for a scored submission:
/// `<student>: <total>: <score>, <score>, ...`.
pub fn summary_line(submission: &Submission, format: ReportFormat) -> String {
    let scores = submission
        .results
        .iter()
        .map(|r| format.score(r.raw_score()))
        .join(", ");
    format!(
        "{}: {}: {}",
        submission.student_id,
        format.score(submission.total_score),
        scores
    )
}

/// Grade summary file. Truncated and given a header when created; one line per
/// submission after that.
#[derive(Debug)]
pub struct ReportSink {
    /// Destination.
    path:   PathBuf,
    /// Open writer; `None` once closed.
    writer: Option<BufWriter<File>>,
    /// Number formatting.
    format: ReportFormat,
}

impl ReportSink {
    /// Creates (or truncates) the summary at `path` and writes the header.
    pub fn create(
        path: impl Into<PathBuf>,
        assignment: &str,
        format: ReportFormat,
    ) -> Result<Self, ReportError> {
        let path = path.into();
        let create_failed = |source| ReportError::Create {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(create_failed)?;
        }
        let file = File::create(&path).map_err(create_failed)?;

        let mut sink = Self {
            path,
            writer: Some(BufWriter::new(file)),
            format,
        };
        sink.append(&format!("Assignment  : {assignment}"))?;
        sink.append("")?;
        Ok(sink)
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number formatting used for lines written through this sink.
    pub fn format(&self) -> ReportFormat {
        self.format
    }

    /// Writes one line.
    pub fn append(&mut self, line: &str) -> Result<(), ReportError> {
        let write_failed = |source| ReportError::Write {
            path: self.path.clone(),
            source,
        };
        match self.writer.as_mut() {
            Some(writer) => writeln!(writer, "{line}").map_err(write_failed),
            None => Err(write_failed(std::io::Error::other("report is already closed"))),
        }
    }

    /// Writes the summary line for `submission`.
    pub fn append_submission(&mut self, submission: &Submission) -> Result<(), ReportError> {
        let line = summary_line(submission, self.format);
        self.append(&line)
    }

    /// Flushes and closes the summary. Only the first call does anything.
    pub fn close(&mut self) -> Result<(), ReportError> {
        match self.writer.take() {
            Some(mut writer) => writer.flush().map_err(|source| ReportError::Close {
                path: self.path.clone(),
                source,
            }),
            None => Ok(()),
        }
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }
}

impl Drop for ReportSink {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("{e}");
        }
    }
}

/// Renders the per-question table and diagnostics for one submission.
pub fn render_evaluation(submission: &Submission, format: ReportFormat) -> String {
    let rows: Vec<QuestionRow> = submission.results.iter().map(QuestionRow::from).collect();
    let out_of: f64 = submission.results.iter().map(|r| r.max_points()).sum();

    let mut out = format!(
        "Student     : {}\nSubmission  : {}\n\n",
        submission.student_id, submission.file_name
    );
    out.push_str(
        &Table::new(&rows)
            .with(Panel::header("Evaluation"))
            .with(Panel::footer(format!(
                "Total: {}/{}",
                format.score(submission.total_score),
                format.score(out_of)
            )))
            .with(Modify::new(Rows::new(1..)).with(Width::wrap(48).keep_words(true)))
            .with(
                Modify::new(Rows::first())
                    .with(Alignment::center())
                    .with(Alignment::center_vertical()),
            )
            .with(
                Modify::new(Rows::last())
                    .with(Alignment::center())
                    .with(Alignment::center_vertical()),
            )
            .with(Style::modern())
            .to_string(),
    );
    out.push('\n');

    let diagnostics = submission
        .results
        .iter()
        .flat_map(|r| r.diagnostics.iter())
        .collect::<Vec<_>>();
    if !diagnostics.is_empty() {
        out.push_str("\nDiagnostics:\n");
        for diagnostic in diagnostics {
            out.push_str(&format!("  - {diagnostic}\n"));
        }
    }
    out
}

/// Removes the evaluation files earlier runs left in `dir` and returns how many
/// went. A missing folder has nothing to clear.
pub fn clear_evaluations(dir: &Path) -> Result<usize, ReportError> {
    if !dir.is_dir() {
        return Ok(0);
    }

    let stale = find_files(EVALUATION_EXTENSION, 0, dir).map_err(|e| ReportError::Clear {
        path:   dir.to_path_buf(),
        source: std::io::Error::other(format!("{e:#}")),
    })?;
    for path in &stale {
        std::fs::remove_file(path).map_err(|source| ReportError::Clear {
            path: path.clone(),
            source,
        })?;
    }
    Ok(stale.len())
}

/// Writes `<dir>/<submission stem>.out` and returns its path.
pub fn write_evaluation(
    dir: &Path,
    submission: &Submission,
    format: ReportFormat,
) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(dir).map_err(|source| ReportError::Create {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(format!(
        "{}.{EVALUATION_EXTENSION}",
        file_stem(Path::new(&submission.file_name))
    ));
    std::fs::write(&path, render_evaluation(submission, format)).map_err(|source| {
        ReportError::Write {
            path: path.clone(),
            source,
        }
    })?;
    Ok(path)
}
