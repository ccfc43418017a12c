#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::{
    catalog::{AssignmentCatalog, Question},
    checks::CheckRegistry,
    connector::Session,
    grade::{
        results::{CheckOutcome, Diagnostic, DiagnosticKind, Grade, ScoreResult},
        submission::Answer,
    },
};

/// Questions `answer` may be scored against, in catalog order. An answer
/// labelled `2` can be scored as `2a` or `2b`; one labelled `2a` only as `2a`
/// (or a longer id starting with it).
pub fn match_answer<'a>(catalog: &'a AssignmentCatalog, answer: &Answer) -> Vec<&'a Question> {
    catalog.candidates(&answer.question_id)
}

/// Scores `answer` against one candidate question.
///
/// Checks run in catalog order. A check that cannot be resolved or fails to run
/// contributes nothing and leaves a diagnostic; either way its outcome is
/// recorded before its condition is evaluated, so later conditions can refer
/// to it. The total is clamped to the question's points.
pub fn evaluate(
    candidate: &Question,
    answer: &Answer,
    registry: &CheckRegistry,
    session: &mut dyn Session,
) -> ScoreResult {
    let mut outcomes: Vec<CheckOutcome> = Vec::with_capacity(candidate.checks.len());
    let mut diagnostics = Vec::new();
    let mut sum = 0.0;

    for spec in &candidate.checks {
        let diagnostic = |kind: DiagnosticKind, message: String| {
            Diagnostic::builder()
                .kind(kind)
                .question_id(candidate.id.as_str())
                .check_id(spec.check_id.as_str())
                .message(message)
                .build()
        };

        let outcome = match registry.resolve(&spec.check_id) {
            Ok(check) => {
                match check.evaluate(&answer.submitted_query, &candidate.reference_query, session) {
                    Ok(v) if v.is_nan() => {
                        diagnostics.push(diagnostic(
                            DiagnosticKind::CheckFailed,
                            "check produced no usable outcome".into(),
                        ));
                        0.0
                    }
                    Ok(v) => v.clamp(0.0, 1.0),
                    Err(e) => {
                        diagnostics.push(diagnostic(DiagnosticKind::CheckFailed, e.to_string()));
                        0.0
                    }
                }
            }
            Err(e) => {
                diagnostics.push(diagnostic(DiagnosticKind::PluginResolution, e.to_string()));
                0.0
            }
        };

        let prior: Vec<(&str, f64)> = outcomes
            .iter()
            .map(|o| (o.check_id.as_str(), o.outcome))
            .collect();
        let applied = spec.condition.evaluate(&prior);
        let points = if applied {
            outcome * spec.weight_percent / 100.0 * candidate.max_points
        } else {
            0.0
        };
        tracing::debug!(
            "{} on {}: outcome {outcome:.3}, applied {applied}, points {points:.3}",
            spec.check_id,
            candidate.id
        );

        sum += points;
        outcomes.push(CheckOutcome {
            check_id: spec.check_id.clone(),
            weight_percent: spec.weight_percent,
            outcome,
            applied,
            points,
        });
    }

    ScoreResult {
        question_id: answer.question_id.clone(),
        chosen:      Some(candidate.clone()),
        grade:       Grade::new(sum.clamp(0.0, candidate.max_points), candidate.max_points),
        checks:      outcomes,
        diagnostics,
    }
}

/// Highest-scoring result; the earliest wins ties.
pub fn best_of(results: impl IntoIterator<Item = ScoreResult>) -> Option<ScoreResult> {
    let mut best: Option<ScoreResult> = None;
    for result in results {
        if best
            .as_ref()
            .is_none_or(|current| result.raw_score() > current.raw_score())
        {
            best = Some(result);
        }
    }
    best
}

/// Scores one answer: every candidate is evaluated and the best is kept. An
/// answer that matches no question scores 0 with a [`DiagnosticKind::Match`]
/// diagnostic. Diagnostics are stamped with `student_id`.
pub fn score_answer(
    catalog: &AssignmentCatalog,
    answer: &Answer,
    student_id: &str,
    registry: &CheckRegistry,
    session: &mut dyn Session,
) -> ScoreResult {
    let candidates = match_answer(catalog, answer);

    let mut result = if candidates.is_empty() {
        tracing::warn!(
            "{student_id}: answer {} does not match any question",
            answer.question_id
        );
        ScoreResult::unmatched(
            answer.question_id.clone(),
            Diagnostic::builder()
                .kind(DiagnosticKind::Match)
                .question_id(answer.question_id.as_str())
                .message("no question in the catalog matches this answer")
                .build(),
        )
    } else {
        let mut results = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            results.push(evaluate(candidate, answer, registry, &mut *session));
        }
        match best_of(results) {
            Some(best) => best,
            None => ScoreResult::unmatched(
                answer.question_id.clone(),
                Diagnostic::builder()
                    .kind(DiagnosticKind::Match)
                    .question_id(answer.question_id.as_str())
                    .message("no candidate could be scored")
                    .build(),
            ),
        }
    };

    for diagnostic in &mut result.diagnostics {
        diagnostic.student_id = student_id.to_string();
    }
    result
}
