#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Name of the grade summary written into the evaluations folder.
pub const GRADE_SUMMARY_FILE: &str = "AAA_grade_summary.out";

/// Default folder for the grade summary and per-submission evaluation files.
pub const EVALUATIONS_DIR: &str = "evaluations";

/// Extension of submission files.
pub const SUBMISSION_EXTENSION: &str = "sql";

/// Extension of per-submission evaluation files.
pub const EVALUATION_EXTENSION: &str = "out";

/// How many folders below the submission folder are searched.
pub const SUBMISSION_SEARCH_DEPTH: u8 = 0;

/// Number of decimals used when formatting scores.
pub const DEFAULT_DECIMALS: usize = 2;

/// SQLite database used when no schema/path is configured.
pub const SQLITE_IN_MEMORY: &str = ":memory:";

/// Environment variable selecting the backend kind.
pub const ENV_DBMS: &str = "SQLFE_DBMS";
/// Environment variable with the database host.
pub const ENV_HOST: &str = "SQLFE_HOST";
/// Environment variable with the database port.
pub const ENV_PORT: &str = "SQLFE_PORT";
/// Environment variable with the schema, system id, or SQLite database path.
pub const ENV_SCHEMA: &str = "SQLFE_SCHEMA";
/// Environment variable with the database user.
pub const ENV_USER: &str = "SQLFE_USER";
/// Environment variable with the database password.
pub const ENV_PASSWORD: &str = "SQLFE_PASSWORD";
/// Environment variable pointing at a SQL script run on every new session.
pub const ENV_INIT_SCRIPT: &str = "SQLFE_INIT_SCRIPT";
/// Environment variable pointing at the assignment catalog.
pub const ENV_CATALOG: &str = "SQLFE_CATALOG";
