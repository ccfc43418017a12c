#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt;

use crate::{error::ConfigError, parsers::parser};

/// Points at a check evaluated earlier for the same question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckRef {
    /// 1-based position in the question's check list.
    Index(usize),
    /// Check identifier; the most recent earlier check with this id is used.
    Id(String),
}

impl fmt::Display for CheckRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckRef::Index(n) => write!(f, "{n}"),
            CheckRef::Id(id) => f.write_str(id),
        }
    }
}

/// Predicate deciding whether a check's weighted outcome counts towards the
/// question's score.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Condition {
    /// Always counts.
    #[default]
    Always,
    /// Never counts; the check still runs and can be referenced.
    Never,
    /// Counts when the referenced check fully passed.
    Passed(CheckRef),
    /// Counts when the referenced check did not fully pass.
    Failed(CheckRef),
    /// Negation.
    Not(Box<Condition>),
    /// Both must hold.
    And(Box<Condition>, Box<Condition>),
    /// Either must hold.
    Or(Box<Condition>, Box<Condition>),
}

/// Outcome of a check that already ran for the current candidate question.
pub type PriorOutcome<'a> = (&'a str, f64);

impl Condition {
    /// Parses condition text as found in an assignment catalog.
    pub fn parse(text: &str) -> Result<Self, String> {
        parser::condition(text).map_err(|e| e.to_string())
    }

    /// Parses and validates the condition of the check at `position`
    /// (0-based) among `check_ids`, so it may only reference earlier checks.
    pub fn parse_for(
        question: &str,
        text: &str,
        position: usize,
        check_ids: &[&str],
    ) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidCondition {
            question: question.to_string(),
            condition: text.to_string(),
            reason,
        };

        let condition = Self::parse(text).map_err(invalid)?;
        let earlier = &check_ids[..position.min(check_ids.len())];
        for reference in condition.references() {
            let known = match reference {
                CheckRef::Index(n) => *n >= 1 && *n <= earlier.len(),
                CheckRef::Id(id) => earlier.iter().any(|c| *c == id.as_str()),
            };
            if !known {
                return Err(invalid(format!(
                    "`{reference}` does not name a check listed before this one"
                )));
            }
        }
        Ok(condition)
    }

    /// All check references mentioned anywhere in the condition.
    pub fn references(&self) -> Vec<&CheckRef> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    /// Depth-first walk used by [`Condition::references`].
    fn collect_references<'a>(&'a self, out: &mut Vec<&'a CheckRef>) {
        match self {
            Condition::Always | Condition::Never => {}
            Condition::Passed(r) | Condition::Failed(r) => out.push(r),
            Condition::Not(inner) => inner.collect_references(out),
            Condition::And(a, b) | Condition::Or(a, b) => {
                a.collect_references(out);
                b.collect_references(out);
            }
        }
    }

    /// Evaluates the condition against outcomes of the checks that ran before
    /// this one. Unresolvable references count as not passed.
    pub fn evaluate(&self, prior: &[PriorOutcome<'_>]) -> bool {
        match self {
            Condition::Always => true,
            Condition::Never => false,
            Condition::Passed(r) => passed(prior, r),
            Condition::Failed(r) => !passed(prior, r),
            Condition::Not(inner) => !inner.evaluate(prior),
            Condition::And(a, b) => a.evaluate(prior) && b.evaluate(prior),
            Condition::Or(a, b) => a.evaluate(prior) || b.evaluate(prior),
        }
    }
}

/// Whether the referenced check earned its full outcome.
fn passed(prior: &[PriorOutcome<'_>], reference: &CheckRef) -> bool {
    let outcome = match reference {
        CheckRef::Index(n) => n.checked_sub(1).and_then(|i| prior.get(i)),
        CheckRef::Id(id) => prior.iter().rev().find(|(check, _)| *check == id.as_str()),
    };
    outcome.is_some_and(|(_, value)| *value >= 1.0)
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Always => f.write_str("always"),
            Condition::Never => f.write_str("never"),
            Condition::Passed(r) => write!(f, "passed({r})"),
            Condition::Failed(r) => write!(f, "failed({r})"),
            Condition::Not(inner) => write!(f, "!{inner}"),
            Condition::And(a, b) => write!(f, "({a} && {b})"),
            Condition::Or(a, b) => write!(f, "({a} || {b})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_na_mean_always() {
        assert_eq!(Condition::parse(""), Ok(Condition::Always));
        assert_eq!(Condition::parse("  N/A "), Ok(Condition::Always));
        assert_eq!(Condition::parse("always"), Ok(Condition::Always));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let parsed = Condition::parse("passed(1) || failed(2) && !passed(Executes)").unwrap();
        assert_eq!(
            parsed,
            Condition::Or(
                Box::new(Condition::Passed(CheckRef::Index(1))),
                Box::new(Condition::And(
                    Box::new(Condition::Failed(CheckRef::Index(2))),
                    Box::new(Condition::Not(Box::new(Condition::Passed(CheckRef::Id(
                        "Executes".into()
                    ))))),
                )),
            )
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(Condition::parse("passed(").is_err());
        assert!(Condition::parse("sometimes").is_err());
    }

    #[test]
    fn evaluates_against_prior_outcomes() {
        let prior = [("Executes", 1.0), ("RowCount", 0.0)];
        assert!(Condition::parse("passed(1)").unwrap().evaluate(&prior));
        assert!(Condition::parse("failed(RowCount)").unwrap().evaluate(&prior));
        assert!(!Condition::parse("passed(1) && passed(2)").unwrap().evaluate(&prior));
        assert!(!Condition::Never.evaluate(&prior));
    }

    #[test]
    fn forward_references_are_rejected() {
        let ids = ["Executes", "ResultSetEqual"];
        assert!(Condition::parse_for("1a", "passed(1)", 1, &ids).is_ok());
        assert!(Condition::parse_for("1a", "passed(2)", 1, &ids).is_err());
        assert!(Condition::parse_for("1a", "passed(Executes)", 0, &ids).is_err());
    }
}
