#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::PathBuf;

use rusqlite::{Connection, types::ValueRef};

use super::{Connector, DbmsKind, ResultSet, Session};
use crate::{
    constants::SQLITE_IN_MEMORY,
    error::{ConnectionError, QueryError},
};

/// Opens SQLite sessions on a database file, or on a fresh in-memory database.
///
/// Every session works inside a transaction opened after the init script and
/// rolled back when the session ends, so the file is never changed by what a
/// submission runs.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    /// Database file, or `:memory:`.
    database:    String,
    /// Script run on every new session.
    init_script: Option<PathBuf>,
}

impl SqliteConnector {
    /// Creates a connector; an empty `database` means in-memory.
    pub fn new(database: impl Into<String>, init_script: Option<PathBuf>) -> Self {
        let database: String = database.into();
        let database = if database.trim().is_empty() {
            SQLITE_IN_MEMORY.to_string()
        } else {
            database
        };
        Self {
            database,
            init_script,
        }
    }

    /// Opens the underlying connection.
    fn open_connection(&self) -> Result<Connection, ConnectionError> {
        let opened = if self.database == SQLITE_IN_MEMORY {
            Connection::open_in_memory()
        } else {
            Connection::open(&self.database)
        };
        opened.map_err(|e| ConnectionError::Connect {
            backend: format!("sqlite database `{}`", self.database),
            reason:  e.to_string(),
        })
    }
}

impl Connector for SqliteConnector {
    fn kind(&self) -> DbmsKind {
        DbmsKind::Sqlite
    }

    fn connect(&self) -> Result<Box<dyn Session>, ConnectionError> {
        let conn = self.open_connection()?;

        if let Some(script) = &self.init_script {
            let init_failed = |reason: String| ConnectionError::InitScript {
                script: script.clone(),
                reason,
            };
            let sql = std::fs::read_to_string(script).map_err(|e| init_failed(e.to_string()))?;
            conn.execute_batch(&sql)
                .map_err(|e| init_failed(e.to_string()))?;
        }

        conn.execute_batch("BEGIN")
            .map_err(|e| ConnectionError::Connect {
                backend: format!("sqlite database `{}`", self.database),
                reason:  format!("could not open a transaction: {e}"),
            })?;
        Ok(Box::new(SqliteSession { conn }))
    }
}

/// One open SQLite connection with an open transaction. Dropping it without
/// `close` closes the connection, which rolls the transaction back.
struct SqliteSession {
    /// The connection.
    conn: Connection,
}

/// Renders a SQLite value as text; `NULL` becomes `None`.
fn render(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Some(b.iter().map(|byte| format!("{byte:02x}")).collect()),
    }
}

/// Statements that would end or nest the session's transaction.
const TRANSACTION_CONTROL: [&str; 6] = ["begin", "commit", "end", "rollback", "savepoint", "release"];

/// Whether `sql` starts with a transaction-control keyword.
fn controls_transaction(sql: &str) -> bool {
    let keyword = sql
        .trim_start()
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    TRANSACTION_CONTROL.contains(&keyword.as_str())
}

impl Session for SqliteSession {
    fn execute(&mut self, sql: &str) -> Result<ResultSet, QueryError> {
        let fail = |e: rusqlite::Error| QueryError {
            sql:    sql.to_string(),
            reason: e.to_string(),
        };
        if controls_transaction(sql) {
            return Err(QueryError {
                sql:    sql.to_string(),
                reason: "transaction control is not allowed in a grading session".into(),
            });
        }

        let mut stmt = self.conn.prepare(sql).map_err(fail)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let width = columns.len();

        let mut rows = stmt.query([]).map_err(fail)?;
        let mut collected = Vec::new();
        while let Some(row) = rows.next().map_err(fail)? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(render(row.get_ref(i).map_err(fail)?));
            }
            collected.push(cells);
        }

        Ok(ResultSet::new(columns, collected))
    }

    fn close(self: Box<Self>) -> Result<(), ConnectionError> {
        let failed = |e: rusqlite::Error| ConnectionError::Close {
            backend: DbmsKind::Sqlite.to_string(),
            reason:  e.to_string(),
        };
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK").map_err(failed)?;
        }
        self.conn.close().map_err(|(_, e)| failed(e))
    }
}
