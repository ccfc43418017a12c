#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::Path;

use serde::Deserialize;

use super::{
    AssignmentCatalog,
    condition::Condition,
    question::{CheckSpec, Question, QuestionId},
};
use crate::error::ConfigError;

/// On-disk shape of an assignment catalog.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    /// Assignment name, echoed into the grade summary.
    name:      String,
    /// Questions in catalog order.
    #[serde(default)]
    questions: Vec<QuestionEntry>,
}

/// On-disk shape of a question.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QuestionEntry {
    /// Question id, e.g. `3b`.
    id:     String,
    /// Points available.
    points: f64,
    /// Reference query.
    query:  String,
    /// Weighted checks.
    #[serde(default)]
    checks: Vec<CheckEntry>,
}

/// On-disk shape of a check.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CheckEntry {
    /// Check identifier.
    check:     String,
    /// Weight in percent.
    weight:    f64,
    /// Optional gating condition; blank means always.
    #[serde(default)]
    condition: String,
}

/// Reads and validates an assignment catalog from a TOML file.
pub fn load(path: &Path) -> Result<AssignmentCatalog, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadCatalog {
        path: path.to_path_buf(),
        source,
    })?;
    let catalog = parse(&text).map_err(|e| match e {
        ConfigError::ParseCatalog { source, .. } => ConfigError::ParseCatalog {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;

    tracing::info!(
        "Loaded assignment `{}` with {} question(s) from {}",
        catalog.name(),
        catalog.questions().len(),
        path.display()
    );
    Ok(catalog)
}

/// Parses and validates catalog text.
pub fn parse(text: &str) -> Result<AssignmentCatalog, ConfigError> {
    let file: CatalogFile = toml::from_str(text).map_err(|source| ConfigError::ParseCatalog {
        path: Default::default(),
        source,
    })?;

    let questions = file
        .questions
        .into_iter()
        .map(into_question)
        .collect::<Result<Vec<_>, _>>()?;

    AssignmentCatalog::new(file.name, questions)
}

/// Converts and validates one question entry.
fn into_question(entry: QuestionEntry) -> Result<Question, ConfigError> {
    let id = QuestionId::new(entry.id);
    if id.is_empty() {
        return Err(ConfigError::InvalidCatalog("a question has an empty id".into()));
    }
    if !entry.points.is_finite() || entry.points < 0.0 {
        return Err(ConfigError::InvalidCatalog(format!(
            "question {id} has invalid points {}",
            entry.points
        )));
    }

    let check_ids: Vec<&str> = entry.checks.iter().map(|c| c.check.as_str()).collect();
    let mut checks = Vec::with_capacity(entry.checks.len());
    for (position, check) in entry.checks.iter().enumerate() {
        if check.check.trim().is_empty() {
            return Err(ConfigError::InvalidCatalog(format!(
                "check #{} of question {id} has no identifier",
                position + 1
            )));
        }
        if !check.weight.is_finite() {
            return Err(ConfigError::InvalidCatalog(format!(
                "check `{}` of question {id} has invalid weight {}",
                check.check, check.weight
            )));
        }
        let condition = Condition::parse_for(id.as_str(), &check.condition, position, &check_ids)?;
        checks.push(CheckSpec::new(check.check.trim(), check.weight).with_condition(condition));
    }

    Ok(Question {
        id,
        reference_query: entry.query.trim().to_string(),
        max_points: entry.points,
        checks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAB: &str = r#"
name = "Lab 3"

[[questions]]
id = "1a"
points = 10
query = "SELECT name FROM emp"

  [[questions.checks]]
  check = "Executes"
  weight = 20

  [[questions.checks]]
  check = "ResultSetEqual"
  weight = 80
  condition = "passed(Executes)"

[[questions]]
id = "1b"
points = 10
query = "SELECT e.name FROM emp e"
"#;

    #[test]
    fn parses_questions_and_conditions() {
        let catalog = parse(LAB).expect("parse catalog");
        assert_eq!(catalog.name(), "Lab 3");
        assert_eq!(catalog.questions().len(), 2);

        let first = &catalog.questions()[0];
        assert_eq!(first.max_points, 10.0);
        assert_eq!(first.checks.len(), 2);
        assert_eq!(first.checks[1].condition.to_string(), "passed(Executes)");
    }

    #[test]
    fn rejects_negative_points() {
        let text = r#"
name = "x"
[[questions]]
id = "1"
points = -1
query = "select 1"
"#;
        assert!(matches!(parse(text), Err(ConfigError::InvalidCatalog(_))));
    }

    #[test]
    fn rejects_forward_condition_reference() {
        let text = r#"
name = "x"
[[questions]]
id = "1"
points = 1
query = "select 1"
  [[questions.checks]]
  check = "Executes"
  weight = 100
  condition = "passed(2)"
"#;
        assert!(matches!(parse(text), Err(ConfigError::InvalidCondition { .. })));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(parse("name = "), Err(ConfigError::ParseCatalog { .. })));
    }
}
