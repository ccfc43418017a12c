#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::collections::HashMap;

use super::question::{Question, QuestionId};

/// Lookup from primary question id to the positions of its variants in the
/// catalog, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct QuestionIndex {
    /// Primary id -> positions into the catalog's question list.
    buckets: HashMap<String, Vec<usize>>,
}

impl QuestionIndex {
    /// Indexes `questions` by primary id.
    pub fn build(questions: &[Question]) -> Self {
        let mut buckets: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, question) in questions.iter().enumerate() {
            buckets
                .entry(question.id.primary().to_string())
                .or_default()
                .push(position);
        }
        Self { buckets }
    }

    /// Candidate questions for an answer labelled `id`: the variants sharing
    /// its primary id whose identifier starts with `id`, in catalog order.
    pub fn candidates<'a>(&self, questions: &'a [Question], id: &QuestionId) -> Vec<&'a Question> {
        self.buckets
            .get(id.primary())
            .into_iter()
            .flatten()
            .filter_map(|&position| questions.get(position))
            .filter(|question| id.is_prefix_of(&question.id))
            .collect()
    }

    /// Primary ids whose variants are not stored next to each other.
    pub fn scattered_groups(&self) -> Vec<&str> {
        let mut scattered: Vec<&str> = self
            .buckets
            .iter()
            .filter(|(_, positions)| positions.windows(2).any(|w| w[1] != w[0] + 1))
            .map(|(primary, _)| primary.as_str())
            .collect();
        scattered.sort_unstable();
        scattered
    }

    /// Number of distinct primary ids.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether the index holds no questions.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Run-based scan over the catalog: collects questions whose id starts with
/// `id`, stopping at the first non-match after a match. Only correct when
/// variants are stored contiguously; [`QuestionIndex::candidates`] does not
/// depend on that.
pub fn contiguous_scan<'a>(questions: &'a [Question], id: &QuestionId) -> Vec<&'a Question> {
    questions
        .iter()
        .skip_while(|question| !id.is_prefix_of(&question.id))
        .take_while(|question| id.is_prefix_of(&question.id))
        .collect()
}
