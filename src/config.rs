#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{
    constants::{DEFAULT_DECIMALS, SQLITE_IN_MEMORY, SUBMISSION_EXTENSION},
    grade::report::ReportFormat,
};

/// The closed set of database backends a run can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DbmsKind {
    /// Embedded SQLite database, file-backed or in memory.
    #[default]
    Sqlite,
    /// Deterministic in-process backend used for testing and dry runs.
    Mock,
}

impl DbmsKind {
    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            DbmsKind::Sqlite => "sqlite",
            DbmsKind::Mock => "mock",
        }
    }
}

impl fmt::Display for DbmsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DbmsKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(DbmsKind::Sqlite),
            "mock" => Ok(DbmsKind::Mock),
            other => Err(format!("Unknown DBMS `{other}`, expected one of: sqlite, mock")),
        }
    }
}

/// Connection parameters handed to the connector for every session.
///
/// `schema` carries the schema or system id; for SQLite it is the database
/// path, and `:memory:` opens a fresh in-memory database per session.
#[derive(Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
#[builder(doc)]
pub struct ConnectionParams {
    /// Backend kind.
    #[builder(default)]
    pub kind:        DbmsKind,
    /// Host name or address.
    #[builder(default, setter(strip_option))]
    pub host:        Option<String>,
    /// Port on the host.
    #[builder(default, setter(strip_option))]
    pub port:        Option<u16>,
    /// Schema, system id, or SQLite database path.
    #[builder(default = SQLITE_IN_MEMORY.to_string())]
    pub schema:      String,
    /// Database user.
    #[builder(default, setter(strip_option))]
    pub username:    Option<String>,
    /// Database password.
    #[builder(default, setter(strip_option))]
    pub password:    Option<String>,
    /// SQL script executed on every new session, e.g. to create and fill the
    /// tables the assignment queries run against.
    #[builder(default, setter(strip_option))]
    pub init_script: Option<PathBuf>,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("kind", &self.kind)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("schema", &self.schema)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("init_script", &self.init_script)
            .finish()
    }
}

/// Everything a grading run needs.
#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
#[builder(doc)]
pub struct RunConfig {
    /// How to reach the database.
    #[builder(default)]
    pub connection:           ConnectionParams,
    /// TOML file describing the assignment.
    pub catalog_path:         PathBuf,
    /// Folder holding one file per submission.
    pub submissions_dir:      PathBuf,
    /// Extension of submission files, without the dot.
    #[builder(default = SUBMISSION_EXTENSION.to_string())]
    pub submission_extension: String,
    /// Grade summary destination; truncated at the start of the run.
    pub report_path:          PathBuf,
    /// Folder for per-submission evaluation files, if they should be written.
    #[builder(default, setter(strip_option))]
    pub evaluations_dir:      Option<PathBuf>,
    /// Number formatting for report output.
    #[builder(default = ReportFormat::new(DEFAULT_DECIMALS))]
    pub format:               ReportFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dbms_kind_parses_case_insensitively() {
        assert_eq!("SQLite".parse::<DbmsKind>(), Ok(DbmsKind::Sqlite));
        assert_eq!(" mock ".parse::<DbmsKind>(), Ok(DbmsKind::Mock));
        assert!("oracle".parse::<DbmsKind>().is_err());
    }

    #[test]
    fn optional_fields_take_plain_values() {
        let defaults = ConnectionParams::default();
        assert_eq!(defaults.schema, SQLITE_IN_MEMORY);
        assert!(defaults.host.is_none() && defaults.init_script.is_none());

        let params = ConnectionParams::builder()
            .host("db.local")
            .port(5432u16)
            .init_script(PathBuf::from("schema.sql"))
            .build();
        assert_eq!(params.host.as_deref(), Some("db.local"));
        assert_eq!(params.port, Some(5432));
        assert_eq!(params.init_script, Some(PathBuf::from("schema.sql")));
    }

    #[test]
    fn debug_output_hides_password() {
        let params = ConnectionParams::builder()
            .username("grader")
            .password("hunter2")
            .build();
        let shown = format!("{params:?}");
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("grader"));
    }
}
