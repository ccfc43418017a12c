#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Gating conditions on checks.
pub mod condition;
/// Primary-id index used to match answers to questions.
pub mod index;
/// TOML catalog loading and validation.
pub mod loader;
/// Questions, question ids and check specs.
pub mod question;

pub use condition::{CheckRef, Condition};
pub use index::{QuestionIndex, contiguous_scan};
pub use loader::{load, parse};
pub use question::{CheckSpec, Question, QuestionId};

use crate::error::ConfigError;

/// The questions of one assignment, read once per run and never modified.
#[derive(Debug, Clone)]
pub struct AssignmentCatalog {
    /// Assignment name.
    name:      String,
    /// Questions in catalog order.
    questions: Vec<Question>,
    /// Primary-id lookup over `questions`.
    index:     QuestionIndex,
}

impl AssignmentCatalog {
    /// Validates the catalog and builds the lookup index. Repeated ids are
    /// allowed: each entry is another acceptable reference for that question.
    pub fn new(name: impl Into<String>, questions: Vec<Question>) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigError::InvalidCatalog("the assignment has no name".into()));
        }

        let index = QuestionIndex::build(&questions);
        for primary in index.scattered_groups() {
            tracing::warn!(
                "Variants of question {primary} are not listed next to each other in `{name}`"
            );
        }

        Ok(Self {
            name,
            questions,
            index,
        })
    }

    /// Assignment name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Questions in catalog order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Candidate questions an answer labelled `id` can be scored against, in
    /// catalog order. Empty when nothing matches.
    pub fn candidates(&self, id: &QuestionId) -> Vec<&Question> {
        self.index.candidates(&self.questions, id)
    }

    /// Every check identifier used anywhere in the catalog, deduplicated.
    pub fn check_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .questions
            .iter()
            .flat_map(|q| q.checks.iter().map(|c| c.check_id.as_str()))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
