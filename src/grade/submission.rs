#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use crate::{
    catalog::QuestionId,
    constants::SUBMISSION_SEARCH_DEPTH,
    error::ConfigError,
    grade::results::ScoreResult,
    parsers::parser,
    util::{file_stem, find_files},
};

/// One labelled query in a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Identifier the student labelled the answer with.
    pub question_id:     QuestionId,
    /// The query as submitted, trimmed and without its trailing `;`.
    pub submitted_query: String,
}

impl Answer {
    /// Creates an answer.
    pub fn new(question_id: impl Into<QuestionId>, submitted_query: impl Into<String>) -> Self {
        Self {
            question_id:     question_id.into(),
            submitted_query: submitted_query.into(),
        }
    }
}

/// One student's file of answers.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Student the submission belongs to.
    pub student_id:  String,
    /// File the submission was read from.
    pub file_name:   String,
    /// Answers in file order, at most one per label.
    pub answers:     Vec<Answer>,
    /// Labels answered more than once; only the first answer was kept.
    pub repeated:    Vec<QuestionId>,
    /// Sum of the per-answer scores; 0 until results are attached.
    pub total_score: f64,
    /// One result per answer, in answer order; empty until scored.
    pub results:     Vec<ScoreResult>,
}

impl Submission {
    /// Creates an unscored submission.
    pub fn new(
        student_id: impl Into<String>,
        file_name: impl Into<String>,
        answers: Vec<Answer>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            file_name: file_name.into(),
            answers,
            repeated: Vec::new(),
            total_score: 0.0,
            results: Vec::new(),
        }
    }

    /// Stores the per-answer results and their total.
    pub fn attach_results(&mut self, results: Vec<ScoreResult>) {
        if !self.results.is_empty() {
            tracing::warn!("Results for {} were attached twice", self.file_name);
        }
        self.total_score = results.iter().map(ScoreResult::raw_score).sum();
        self.results = results;
    }
}

/// Student id encoded in a submission file name: the stem up to the first `_`.
pub fn student_id_from(file_name: &str) -> String {
    let stem = file_stem(Path::new(file_name));
    match stem.split_once('_') {
        Some((student, _)) if !student.is_empty() => student.to_string(),
        _ => stem,
    }
}

/// Appends the buffered lines as an answer, if an answer is open. A label that
/// already has an answer goes to `repeated` instead.
fn flush(
    answers: &mut Vec<Answer>,
    repeated: &mut Vec<QuestionId>,
    open: &mut Option<String>,
    lines: &mut Vec<&str>,
) {
    if let Some(id) = open.take() {
        let id = QuestionId::new(id);
        if answers.iter().any(|a| a.question_id == id) {
            repeated.push(id);
        } else {
            let text = lines.join("\n");
            let text = text.trim().trim_end_matches(';').trim_end();
            answers.push(Answer::new(id, text));
        }
    }
    lines.clear();
}

/// Splits a submission file into answers.
///
/// A line such as `-- 2a)` opens the answer to question `2a`; every following
/// line up to the next such marker belongs to it, except other `--` comment
/// lines. Text before the first marker is ignored. A label used twice keeps
/// its first answer; later ones are listed in [`Submission::repeated`].
pub fn parse_submission(file_name: &str, text: &str) -> Submission {
    let mut answers = Vec::new();
    let mut repeated = Vec::new();
    let mut open: Option<String> = None;
    let mut lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if let Ok(id) = parser::answer_marker(trimmed) {
            flush(&mut answers, &mut repeated, &mut open, &mut lines);
            open = Some(id);
        } else if trimmed.starts_with("--") {
            continue;
        } else if open.is_some() {
            lines.push(line);
        }
    }
    flush(&mut answers, &mut repeated, &mut open, &mut lines);

    let mut submission = Submission::new(student_id_from(file_name), file_name, answers);
    submission.repeated = repeated;
    submission
}

/// Lists submission files with `extension` in `dir`, sorted by file name.
pub fn discover(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, ConfigError> {
    if !dir.is_dir() {
        return Err(ConfigError::Submissions {
            path:   dir.to_path_buf(),
            reason: "not a directory".into(),
        });
    }

    find_files(extension, SUBMISSION_SEARCH_DEPTH, dir).map_err(|e| ConfigError::Submissions {
        path:   dir.to_path_buf(),
        reason: format!("{e:#}"),
    })
}

/// Reads and parses one submission file.
pub fn read_submission(path: &Path) -> Result<Submission, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Submissions {
        path:   path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    Ok(parse_submission(&file_name, &text))
}
