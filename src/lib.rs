//! # sqlfe
//!
//! Grades folders of SQL submissions against an assignment catalog of
//! reference queries, scoring each answer with weighted, conditionally gated
//! checks run on a live database session.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Assignment catalogs: questions, checks and their conditions
pub mod catalog;
/// The checks a question can be scored with
pub mod checks;
/// Run and connection configuration
pub mod config;
/// Database backends and sessions
pub mod connector;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// Error types
pub mod error;
/// For all things related to grading
pub mod grade;
/// For all parsers used
pub mod parsers;
/// Utility functions for convenience
pub mod util;

pub use catalog::{AssignmentCatalog, CheckSpec, Condition, Question, QuestionId};
pub use checks::{Check, CheckRegistry};
pub use config::{ConnectionParams, DbmsKind, RunConfig};
pub use connector::{Connector, MockConnector, ResultSet, Session, SessionGuard, SqliteConnector};
pub use error::{
    CheckError, ConfigError, ConnectionError, GradeError, PluginResolutionError, QueryError,
    ReportError,
};
pub use grade::{
    Answer, CancelFlag, Diagnostic, DiagnosticKind, ReportFormat, RunHandle, RunSummary,
    ScoreResult, Submission, run, run_with_connector, spawn, spawn_with_connector,
};
