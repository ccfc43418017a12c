#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::PathBuf;

/// Problems with the assignment catalog or the submission folder. These abort
/// the whole run.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The catalog file could not be read.
    #[error("Could not read assignment catalog `{path}`: {source}")]
    ReadCatalog {
        /// Location of the catalog.
        path:   PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The catalog file is not valid TOML or does not have the expected shape.
    #[error("Could not parse assignment catalog `{path}`: {source}")]
    ParseCatalog {
        /// Location of the catalog.
        path:   PathBuf,
        /// Underlying parse failure.
        source: toml::de::Error,
    },
    /// The catalog parsed but violates a structural rule.
    #[error("Invalid assignment catalog: {0}")]
    InvalidCatalog(String),
    /// A check condition could not be parsed.
    #[error("Invalid condition `{condition}` on question {question}: {reason}")]
    InvalidCondition {
        /// Question the condition belongs to.
        question:  String,
        /// Raw condition text.
        condition: String,
        /// Why it was rejected.
        reason:    String,
    },
    /// The submission folder could not be listed or a submission file could
    /// not be read.
    #[error("Could not read submissions from `{path}`: {reason}")]
    Submissions {
        /// Folder or file that failed.
        path:   PathBuf,
        /// Why it failed.
        reason: String,
    },
}

/// Failure to open or close a database session.
#[derive(thiserror::Error, Debug)]
pub enum ConnectionError {
    /// The backend refused or could not establish a session.
    #[error("Could not connect to {backend}: {reason}")]
    Connect {
        /// Backend name.
        backend: String,
        /// Backend message.
        reason:  String,
    },
    /// The per-session initialisation script failed.
    #[error("Initialisation script `{script}` failed: {reason}")]
    InitScript {
        /// Path to the script.
        script: PathBuf,
        /// Backend message.
        reason: String,
    },
    /// The session could not be closed cleanly.
    #[error("Could not close {backend} session: {reason}")]
    Close {
        /// Backend name.
        backend: String,
        /// Backend message.
        reason:  String,
    },
}

/// A statement failed on an open session.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Query failed: {reason}\nQuery:\n```\n{sql}\n```")]
pub struct QueryError {
    /// The SQL text that was executed.
    pub sql:    String,
    /// Backend message.
    pub reason: String,
}

/// A check identifier could not be turned into an executable check.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginResolutionError {
    /// Nothing is registered under this identifier.
    #[error("No check is registered under `{0}`")]
    Unknown(String),
    /// The registered constructor failed.
    #[error("Check `{check}` could not be constructed: {reason}")]
    Construction {
        /// Identifier that was resolved.
        check:  String,
        /// Why construction failed.
        reason: String,
    },
}

/// A resolved check failed while running.
#[derive(thiserror::Error, Debug)]
pub enum CheckError {
    /// One of the queries did not execute.
    #[error("{which} query did not execute: {source}")]
    Query {
        /// `Submitted` or `Reference`.
        which:  &'static str,
        /// Underlying statement failure.
        source: QueryError,
    },
    /// The check cannot make sense of its inputs.
    #[error("{0}")]
    Other(String),
}

/// Failures writing the grade summary or per-submission evaluation files.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    /// The report destination could not be created or truncated.
    #[error("Could not create report `{path}`: {source}")]
    Create {
        /// Destination path.
        path:   PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// A line could not be written.
    #[error("Could not write to report `{path}`: {source}")]
    Write {
        /// Destination path.
        path:   PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// An evaluation file from an earlier run could not be removed.
    #[error("Could not remove stale evaluation `{path}`: {source}")]
    Clear {
        /// File or folder being cleared.
        path:   PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// Buffered content could not be flushed on close.
    #[error("Could not close report `{path}`: {source}")]
    Close {
        /// Destination path.
        path:   PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
}

/// Errors that abort a grading run.
#[derive(thiserror::Error, Debug)]
pub enum GradeError {
    /// Catalog or submission source problem.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The grade summary could not be opened.
    #[error(transparent)]
    Report(#[from] ReportError),
    /// The background grading task did not complete.
    #[error("Grading task did not complete: {0}")]
    Join(String),
}
