#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::collections::HashMap;

use super::{Check, CheckRegistry};
use crate::{
    connector::{ResultSet, Session},
    error::CheckError,
    util::normalize_sql,
};

/// Registers every built-in check.
pub fn register_all(registry: &mut CheckRegistry) {
    registry
        .register(ExactMatch::ID, || Ok(Box::new(ExactMatch)))
        .register(Executes::ID, || Ok(Box::new(Executes)))
        .register(ResultSetEqual::ID, || Ok(Box::new(ResultSetEqual)))
        .register(ResultSetEqualOrder::ID, || Ok(Box::new(ResultSetEqualOrder)))
        .register(RowCount::ID, || Ok(Box::new(RowCount)))
        .register(ColumnCount::ID, || Ok(Box::new(ColumnCount)))
        .register(ColumnNames::ID, || Ok(Box::new(ColumnNames)))
        .register(RowOverlap::ID, || Ok(Box::new(RowOverlap)));
}

/// Runs both queries, reference first so a broken reference is reported as
/// such even when the submission is broken too.
fn run_both(
    session: &mut dyn Session,
    submitted: &str,
    reference: &str,
) -> Result<(ResultSet, ResultSet), CheckError> {
    let expected = session
        .execute(reference)
        .map_err(|source| CheckError::Query {
            which: "Reference",
            source,
        })?;
    let actual = session
        .execute(submitted)
        .map_err(|source| CheckError::Query {
            which: "Submitted",
            source,
        })?;
    Ok((actual, expected))
}

/// Maps a boolean verdict to an outcome.
fn all_or_nothing(ok: bool) -> f64 {
    if ok { 1.0 } else { 0.0 }
}

/// Texts of both queries are the same once layout, case and trailing
/// semicolons are ignored. Does not touch the database.
#[derive(Debug, Clone, Copy)]
pub struct ExactMatch;

impl ExactMatch {
    /// Registry identifier.
    pub const ID: &'static str = "ExactMatch";
}

impl Check for ExactMatch {
    fn id(&self) -> &str {
        Self::ID
    }

    fn evaluate(&self, submitted: &str, reference: &str, _: &mut dyn Session) -> Result<f64, CheckError> {
        Ok(all_or_nothing(normalize_sql(submitted) == normalize_sql(reference)))
    }
}

/// The submitted query runs without error.
#[derive(Debug, Clone, Copy)]
pub struct Executes;

impl Executes {
    /// Registry identifier.
    pub const ID: &'static str = "Executes";
}

impl Check for Executes {
    fn id(&self) -> &str {
        Self::ID
    }

    fn evaluate(&self, submitted: &str, _: &str, session: &mut dyn Session) -> Result<f64, CheckError> {
        match session.execute(submitted) {
            Ok(_) => Ok(1.0),
            Err(e) => {
                tracing::debug!("{e}");
                Ok(0.0)
            }
        }
    }
}

/// Same rows in any order, duplicates counted. Column labels are ignored.
#[derive(Debug, Clone, Copy)]
pub struct ResultSetEqual;

impl ResultSetEqual {
    /// Registry identifier.
    pub const ID: &'static str = "ResultSetEqual";
}

impl Check for ResultSetEqual {
    fn id(&self) -> &str {
        Self::ID
    }

    fn evaluate(
        &self,
        submitted: &str,
        reference: &str,
        session: &mut dyn Session,
    ) -> Result<f64, CheckError> {
        let (actual, expected) = run_both(session, submitted, reference)?;
        Ok(all_or_nothing(
            actual.column_count() == expected.column_count()
                && actual.sorted_rows() == expected.sorted_rows(),
        ))
    }
}

/// Same rows in the same order.
#[derive(Debug, Clone, Copy)]
pub struct ResultSetEqualOrder;

impl ResultSetEqualOrder {
    /// Registry identifier.
    pub const ID: &'static str = "ResultSetEqualOrder";
}

impl Check for ResultSetEqualOrder {
    fn id(&self) -> &str {
        Self::ID
    }

    fn evaluate(
        &self,
        submitted: &str,
        reference: &str,
        session: &mut dyn Session,
    ) -> Result<f64, CheckError> {
        let (actual, expected) = run_both(session, submitted, reference)?;
        Ok(all_or_nothing(
            actual.column_count() == expected.column_count() && actual.rows() == expected.rows(),
        ))
    }
}

/// Same number of rows.
#[derive(Debug, Clone, Copy)]
pub struct RowCount;

impl RowCount {
    /// Registry identifier.
    pub const ID: &'static str = "RowCount";
}

impl Check for RowCount {
    fn id(&self) -> &str {
        Self::ID
    }

    fn evaluate(
        &self,
        submitted: &str,
        reference: &str,
        session: &mut dyn Session,
    ) -> Result<f64, CheckError> {
        let (actual, expected) = run_both(session, submitted, reference)?;
        Ok(all_or_nothing(actual.row_count() == expected.row_count()))
    }
}

/// Same number of columns.
#[derive(Debug, Clone, Copy)]
pub struct ColumnCount;

impl ColumnCount {
    /// Registry identifier.
    pub const ID: &'static str = "ColumnCount";
}

impl Check for ColumnCount {
    fn id(&self) -> &str {
        Self::ID
    }

    fn evaluate(
        &self,
        submitted: &str,
        reference: &str,
        session: &mut dyn Session,
    ) -> Result<f64, CheckError> {
        let (actual, expected) = run_both(session, submitted, reference)?;
        Ok(all_or_nothing(actual.column_count() == expected.column_count()))
    }
}

/// Share of the reference column labels that the submission also returns,
/// compared case-insensitively.
#[derive(Debug, Clone, Copy)]
pub struct ColumnNames;

impl ColumnNames {
    /// Registry identifier.
    pub const ID: &'static str = "ColumnNames";
}

impl Check for ColumnNames {
    fn id(&self) -> &str {
        Self::ID
    }

    fn evaluate(
        &self,
        submitted: &str,
        reference: &str,
        session: &mut dyn Session,
    ) -> Result<f64, CheckError> {
        let (actual, expected) = run_both(session, submitted, reference)?;
        if expected.column_count() == 0 {
            return Ok(all_or_nothing(actual.column_count() == 0));
        }

        let present: Vec<String> = actual
            .columns()
            .iter()
            .map(|c| c.to_lowercase())
            .collect();
        let found = expected
            .columns()
            .iter()
            .filter(|c| present.contains(&c.to_lowercase()))
            .count();
        Ok(found as f64 / expected.column_count() as f64)
    }
}

/// Share of rows the two results have in common (as multisets), relative to
/// the larger of the two, so both missing and extra rows cost credit.
#[derive(Debug, Clone, Copy)]
pub struct RowOverlap;

impl RowOverlap {
    /// Registry identifier.
    pub const ID: &'static str = "RowOverlap";
}

impl Check for RowOverlap {
    fn id(&self) -> &str {
        Self::ID
    }

    fn evaluate(
        &self,
        submitted: &str,
        reference: &str,
        session: &mut dyn Session,
    ) -> Result<f64, CheckError> {
        let (actual, expected) = run_both(session, submitted, reference)?;
        let larger = actual.row_count().max(expected.row_count());
        if larger == 0 {
            return Ok(all_or_nothing(actual.column_count() == expected.column_count()));
        }

        let mut remaining: HashMap<&Vec<Option<String>>, usize> = HashMap::new();
        for row in expected.rows() {
            *remaining.entry(row).or_default() += 1;
        }
        let mut shared = 0usize;
        for row in actual.rows() {
            if let Some(count) = remaining.get_mut(row)
                && *count > 0
            {
                *count -= 1;
                shared += 1;
            }
        }
        Ok(shared as f64 / larger as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{Connector, MockConnector, SqliteConnector};

    fn sqlite_session() -> Box<dyn Session> {
        let mut session = SqliteConnector::new("", None).connect().expect("connect");
        session
            .execute("CREATE TABLE emp (id INTEGER, name TEXT, dept TEXT)")
            .expect("create");
        session
            .execute(
                "INSERT INTO emp VALUES (1, 'ann', 'ops'), (2, 'bob', 'dev'), (3, 'cy', 'dev')",
            )
            .expect("insert");
        session
    }

    #[test]
    fn exact_match_ignores_layout() {
        let mut session = MockConnector::new().connect().expect("connect");
        let outcome = ExactMatch
            .evaluate("select *\nFROM emp;", "SELECT * FROM emp", session.as_mut())
            .expect("evaluate");
        assert_eq!(outcome, 1.0);
    }

    #[test]
    fn result_set_equal_ignores_row_order_but_not_content() {
        let mut session = sqlite_session();
        let reference = "SELECT name FROM emp ORDER BY name";

        let reordered = ResultSetEqual
            .evaluate("SELECT name FROM emp ORDER BY id DESC", reference, session.as_mut())
            .expect("evaluate");
        assert_eq!(reordered, 1.0);

        let ordered = ResultSetEqualOrder
            .evaluate("SELECT name FROM emp ORDER BY id DESC", reference, session.as_mut())
            .expect("evaluate");
        assert_eq!(ordered, 0.0);

        let filtered = ResultSetEqual
            .evaluate("SELECT name FROM emp WHERE dept = 'dev'", reference, session.as_mut())
            .expect("evaluate");
        assert_eq!(filtered, 0.0);
    }

    #[test]
    fn partial_credit_checks() {
        let mut session = sqlite_session();

        let overlap = RowOverlap
            .evaluate(
                "SELECT name FROM emp WHERE dept = 'dev'",
                "SELECT name FROM emp",
                session.as_mut(),
            )
            .expect("evaluate");
        assert!((overlap - 2.0 / 3.0).abs() < 1e-9);

        let superset = RowOverlap
            .evaluate(
                "SELECT name FROM emp",
                "SELECT name FROM emp WHERE dept = 'dev'",
                session.as_mut(),
            )
            .expect("evaluate");
        assert!((superset - 2.0 / 3.0).abs() < 1e-9);

        let names = ColumnNames
            .evaluate("SELECT id, NAME FROM emp", "SELECT name, dept FROM emp", session.as_mut())
            .expect("evaluate");
        assert_eq!(names, 0.5);
    }

    #[test]
    fn broken_submission_fails_result_checks_but_not_executes() {
        let mut session = sqlite_session();

        assert!(matches!(
            RowCount.evaluate("SELEKT 1", "SELECT 1", session.as_mut()),
            Err(CheckError::Query { which: "Submitted", .. })
        ));
        assert_eq!(
            Executes
                .evaluate("SELEKT 1", "SELECT 1", session.as_mut())
                .expect("evaluate"),
            0.0
        );
    }
}
