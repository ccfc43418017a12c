#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use super::{Connector, DbmsKind, ResultSet, Session};
use crate::{
    error::{ConnectionError, QueryError},
    util::normalize_sql,
};

/// Scripted behaviour shared by a mock connector and its sessions.
#[derive(Debug, Default)]
struct MockState {
    /// Canned results keyed by normalised SQL.
    results:    HashMap<String, ResultSet>,
    /// Normalised statements that fail when executed.
    failing:    HashSet<String>,
    /// Refuse every connection attempt.
    refuse_all: bool,
    /// 0-based connection attempts that are refused.
    refused:    HashSet<usize>,
    /// Connection attempts so far.
    attempts:   AtomicUsize,
    /// Sessions currently open.
    open:       AtomicUsize,
    /// Statements executed over the connector's lifetime.
    executed:   AtomicUsize,
}

/// Deterministic backend. Statements with a canned result return it; any other
/// statement returns a single `query` column holding its normalised text, so
/// two statements produce equal results exactly when their normalised text is
/// equal.
///
/// Clones share state, which lets tests inspect counters after handing a clone
/// to a run.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    /// Shared script and counters.
    state: Arc<MockState>,
}

impl MockConnector {
    /// A mock with no canned results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `edit` to the script; only valid before the mock is shared.
    fn edit(mut self, edit: impl FnOnce(&mut MockState)) -> Self {
        match Arc::get_mut(&mut self.state) {
            Some(state) => edit(state),
            None => tracing::warn!("Mock connector is already shared; script change ignored"),
        }
        self
    }

    /// Returns `result` whenever `sql` is executed.
    pub fn with_result(self, sql: &str, result: ResultSet) -> Self {
        let key = normalize_sql(sql);
        self.edit(move |s| {
            s.results.insert(key, result);
        })
    }

    /// Makes `sql` fail whenever it is executed.
    pub fn with_failure(self, sql: &str) -> Self {
        let key = normalize_sql(sql);
        self.edit(move |s| {
            s.failing.insert(key);
        })
    }

    /// Refuses every connection.
    pub fn refusing(self) -> Self {
        self.edit(|s| s.refuse_all = true)
    }

    /// Refuses the given 0-based connection attempts.
    pub fn refusing_attempts(self, attempts: impl IntoIterator<Item = usize>) -> Self {
        self.edit(move |s| s.refused.extend(attempts))
    }

    /// Connection attempts so far.
    pub fn attempts(&self) -> usize {
        self.state.attempts.load(Ordering::SeqCst)
    }

    /// Sessions opened and not yet closed.
    pub fn open_sessions(&self) -> usize {
        self.state.open.load(Ordering::SeqCst)
    }

    /// Statements executed so far.
    pub fn executed(&self) -> usize {
        self.state.executed.load(Ordering::SeqCst)
    }
}

impl Connector for MockConnector {
    fn kind(&self) -> DbmsKind {
        DbmsKind::Mock
    }

    fn connect(&self) -> Result<Box<dyn Session>, ConnectionError> {
        let attempt = self.state.attempts.fetch_add(1, Ordering::SeqCst);
        if self.state.refuse_all || self.state.refused.contains(&attempt) {
            return Err(ConnectionError::Connect {
                backend: DbmsKind::Mock.to_string(),
                reason:  format!("connection attempt {attempt} refused"),
            });
        }

        self.state.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
        }))
    }
}

/// Session handed out by [`MockConnector`].
struct MockSession {
    /// Shared script and counters.
    state: Arc<MockState>,
}

impl Session for MockSession {
    fn execute(&mut self, sql: &str) -> Result<ResultSet, QueryError> {
        self.state.executed.fetch_add(1, Ordering::SeqCst);
        let key = normalize_sql(sql);

        if key.is_empty() || self.state.failing.contains(&key) {
            return Err(QueryError {
                sql:    sql.to_string(),
                reason: "statement rejected by mock backend".into(),
            });
        }

        Ok(self
            .state
            .results
            .get(&key)
            .cloned()
            .unwrap_or_else(|| ResultSet::new(vec!["query".into()], vec![vec![Some(key)]])))
    }

    fn close(self: Box<Self>) -> Result<(), ConnectionError> {
        self.state.open.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}
