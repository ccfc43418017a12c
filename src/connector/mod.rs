#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Deterministic in-process backend.
pub mod mock;
/// Embedded SQLite backend.
pub mod sqlite;

use serde::Serialize;

pub use self::{mock::MockConnector, sqlite::SqliteConnector};
pub use crate::config::DbmsKind;
use crate::{
    config::ConnectionParams,
    error::{ConnectionError, QueryError},
};

/// Rows returned by a statement. `None` cells are SQL `NULL`; everything else
/// is rendered to text so results from any backend compare the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    /// Column labels in select-list order.
    columns: Vec<String>,
    /// Rows in the order the backend produced them.
    rows:    Vec<Vec<Option<String>>>,
}

impl ResultSet {
    /// Builds a result set from column labels and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    /// Column labels.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in backend order.
    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Rows sorted, for order-insensitive comparison.
    pub fn sorted_rows(&self) -> Vec<Vec<Option<String>>> {
        let mut rows = self.rows.clone();
        rows.sort();
        rows
    }
}

/// A live database session. Owned by exactly one submission's scoring pass.
pub trait Session {
    /// Runs one SQL statement and collects whatever rows it returns.
    fn execute(&mut self, sql: &str) -> Result<ResultSet, QueryError>;

    /// Ends the session.
    fn close(self: Box<Self>) -> Result<(), ConnectionError>;
}

/// Opens sessions against one configured backend.
pub trait Connector: Send + Sync {
    /// Backend kind.
    fn kind(&self) -> DbmsKind;

    /// Opens a fresh session.
    fn connect(&self) -> Result<Box<dyn Session>, ConnectionError>;
}

/// Builds the connector selected by `params.kind`.
pub fn open(params: &ConnectionParams) -> Box<dyn Connector> {
    match params.kind {
        DbmsKind::Sqlite => Box::new(SqliteConnector::new(
            params.schema.clone(),
            params.init_script.clone(),
        )),
        DbmsKind::Mock => Box::new(MockConnector::new()),
    }
}

/// Scoped session: closes the session when dropped unless [`release`] already
/// did, so every exit path of a submission gives the session back.
///
/// [`release`]: SessionGuard::release
pub struct SessionGuard {
    /// The open session; `None` once released.
    session: Option<Box<dyn Session>>,
    /// Backend the session belongs to, for log messages.
    kind:    DbmsKind,
}

impl SessionGuard {
    /// Opens a session on `connector`.
    pub fn acquire(connector: &dyn Connector) -> Result<Self, ConnectionError> {
        let session = connector.connect()?;
        tracing::debug!("Opened {} session", connector.kind());
        Ok(Self {
            session: Some(session),
            kind:    connector.kind(),
        })
    }

    /// The open session.
    pub fn session(&mut self) -> Result<&mut (dyn Session + 'static), ConnectionError> {
        match self.session.as_deref_mut() {
            Some(session) => Ok(session),
            None => Err(ConnectionError::Close {
                backend: self.kind.to_string(),
                reason:  "session was already released".into(),
            }),
        }
    }

    /// Closes the session and reports whether that worked.
    pub fn release(mut self) -> Result<(), ConnectionError> {
        match self.session.take() {
            Some(session) => {
                tracing::debug!("Closing {} session", self.kind);
                session.close()
            }
            None => Ok(()),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(session) = self.session.take()
            && let Err(e) = session.close()
        {
            tracing::warn!("{e}");
        }
    }
}
