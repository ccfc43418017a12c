#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

use super::condition::Condition;

/// Identifier of a question plus an optional variant suffix, e.g. `3` or `3b`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    /// Wraps an identifier, trimming surrounding whitespace.
    pub fn new(id: impl Into<String>) -> Self {
        let id: String = id.into();
        Self(id.trim().to_string())
    }

    /// The identifier as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier without its trailing alphabetic variant suffix: `12bc`
    /// becomes `12`. An identifier that is entirely alphabetic is its own
    /// primary id.
    pub fn primary(&self) -> &str {
        let stripped = self.0.trim_end_matches(|c: char| c.is_ascii_alphabetic());
        if stripped.is_empty() { &self.0 } else { stripped }
    }

    /// Whether `self` is a literal prefix of `other`, starting at position 0.
    pub fn is_prefix_of(&self, other: &QuestionId) -> bool {
        other.0.starts_with(self.0.as_str())
    }

    /// Whether the identifier is blank.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for QuestionId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl Borrow<str> for QuestionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One weighted, conditionally applied check on a question.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckSpec {
    /// Identifier the check registry resolves.
    pub check_id:       String,
    /// Share of the question's points this check is worth, in percent.
    pub weight_percent: f64,
    /// Gate on whether the weighted outcome is counted.
    pub condition:      Condition,
}

impl CheckSpec {
    /// A check that always counts.
    pub fn new(check_id: impl Into<String>, weight_percent: f64) -> Self {
        Self {
            check_id: check_id.into(),
            weight_percent,
            condition: Condition::Always,
        }
    }

    /// Replaces the gating condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }
}

/// A question of the assignment, or one acceptable variant of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    /// Question identifier.
    pub id:              QuestionId,
    /// Instructor's query the submission is compared against.
    pub reference_query: String,
    /// Points available for this question.
    pub max_points:      f64,
    /// Checks in evaluation order.
    pub checks:          Vec<CheckSpec>,
}

impl Question {
    /// Creates a question with no checks.
    pub fn new(id: impl Into<QuestionId>, reference_query: impl Into<String>, max_points: f64) -> Self {
        Self {
            id: id.into(),
            reference_query: reference_query.into(),
            max_points,
            checks: Vec::new(),
        }
    }

    /// Appends a check.
    pub fn with_check(mut self, check: CheckSpec) -> Self {
        self.checks.push(check);
        self
    }
}
