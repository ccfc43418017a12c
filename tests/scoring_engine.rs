use sqlfe::{
    Answer, AssignmentCatalog, Check, CheckError, CheckRegistry, CheckSpec, Condition, Connector,
    DiagnosticKind, MockConnector, Question, Session,
    grade::{evaluate, score_answer},
};

/// Check returning a fixed outcome regardless of its inputs.
struct Fixed(&'static str, f64);

impl Check for Fixed {
    fn id(&self) -> &str {
        self.0
    }

    fn evaluate(&self, _: &str, _: &str, _: &mut dyn Session) -> Result<f64, CheckError> {
        Ok(self.1)
    }
}

/// Check that always fails to run.
struct Broken;

impl Check for Broken {
    fn id(&self) -> &str {
        "Broken"
    }

    fn evaluate(&self, _: &str, _: &str, _: &mut dyn Session) -> Result<f64, CheckError> {
        Err(CheckError::Other("cannot compare".into()))
    }
}

fn registry() -> CheckRegistry {
    let mut registry = CheckRegistry::builtin();
    registry
        .register("Six", || Ok(Box::new(Fixed("Six", 0.6))))
        .register("Eight", || Ok(Box::new(Fixed("Eight", 0.8))))
        .register("Half", || Ok(Box::new(Fixed("Half", 0.5))))
        .register("TooMuch", || Ok(Box::new(Fixed("TooMuch", 3.0))))
        .register("Broken", || Ok(Box::new(Broken)));
    registry
}

fn session() -> Box<dyn Session> {
    MockConnector::new().connect().expect("mock connects")
}

#[test]
fn identical_query_earns_full_points() {
    let question = Question::new("1a", "SELECT name FROM emp", 10.0)
        .with_check(CheckSpec::new("ExactMatch", 100.0));
    let answer = Answer::new("1a", "SELECT name FROM emp");

    let result = evaluate(&question, &answer, &registry(), session().as_mut());

    assert_eq!(format!("{:.2}", result.raw_score()), "10.00");
    assert!(result.diagnostics.is_empty());
}

#[test]
fn best_candidate_is_chosen() {
    let catalog = AssignmentCatalog::new(
        "Variants",
        vec![
            Question::new("2a", "SELECT 1", 10.0).with_check(CheckSpec::new("Six", 100.0)),
            Question::new("2b", "SELECT 2", 10.0).with_check(CheckSpec::new("Eight", 100.0)),
        ],
    )
    .expect("catalog");

    let result = score_answer(
        &catalog,
        &Answer::new("2", "SELECT 3"),
        "alice",
        &registry(),
        session().as_mut(),
    );

    assert_eq!(format!("{:.2}", result.raw_score()), "8.00");
    assert_eq!(result.chosen_id().map(|id| id.as_str()), Some("2b"));
    assert!(result.diagnostics.is_empty());
}

#[test]
fn first_candidate_wins_ties() {
    let catalog = AssignmentCatalog::new(
        "Ties",
        vec![
            Question::new("5x", "SELECT 1", 10.0).with_check(CheckSpec::new("Half", 100.0)),
            Question::new("5y", "SELECT 2", 10.0).with_check(CheckSpec::new("Half", 100.0)),
        ],
    )
    .expect("catalog");

    let result = score_answer(&catalog, &Answer::new("5", ""), "bob", &registry(), session().as_mut());
    assert_eq!(result.chosen_id().map(|id| id.as_str()), Some("5x"));
}

#[test]
fn unmatched_answer_scores_zero_with_match_diagnostic() {
    let catalog = AssignmentCatalog::new(
        "Lab",
        vec![Question::new("1", "SELECT 1", 10.0).with_check(CheckSpec::new("ExactMatch", 100.0))],
    )
    .expect("catalog");

    let result = score_answer(
        &catalog,
        &Answer::new("9", "SELECT 1"),
        "carol",
        &registry(),
        session().as_mut(),
    );

    assert_eq!(result.raw_score(), 0.0);
    assert!(result.chosen.is_none());
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].kind, DiagnosticKind::Match);
    assert_eq!(result.diagnostics[0].student_id, "carol");
    assert_eq!(result.diagnostics[0].question_id, "9");
}

#[test]
fn unknown_and_failing_checks_contribute_nothing() {
    let question = Question::new("1", "SELECT 1", 10.0)
        .with_check(CheckSpec::new("Nope", 50.0))
        .with_check(CheckSpec::new("Broken", 25.0))
        .with_check(CheckSpec::new("Half", 50.0));

    let result = evaluate(&question, &Answer::new("1", "SELECT 1"), &registry(), session().as_mut());

    assert_eq!(result.raw_score(), 2.5);
    let kinds: Vec<DiagnosticKind> = result.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, [DiagnosticKind::PluginResolution, DiagnosticKind::CheckFailed]);
    assert_eq!(result.diagnostics[0].check_id, "Nope");
    assert_eq!(result.checks.len(), 3);
}

#[test]
fn conditions_gate_contributions() {
    let question = Question::new("1", "SELECT 1", 10.0)
        .with_check(CheckSpec::new("ExactMatch", 50.0))
        .with_check(
            CheckSpec::new("Half", 40.0)
                .with_condition(Condition::parse("failed(ExactMatch)").expect("parses")),
        )
        .with_check(
            CheckSpec::new("Eight", 50.0)
                .with_condition(Condition::parse("passed(1)").expect("parses")),
        );
    let registry = registry();

    let wrong = evaluate(&question, &Answer::new("1", "SELECT 2"), &registry, session().as_mut());
    assert!((wrong.raw_score() - 2.0).abs() < 1e-9);
    assert_eq!(
        wrong.checks.iter().map(|c| c.applied).collect::<Vec<_>>(),
        [true, true, false]
    );

    let right = evaluate(&question, &Answer::new("1", "select 1;"), &registry, session().as_mut());
    assert!((right.raw_score() - 9.0).abs() < 1e-9);
}

#[test]
fn score_stays_within_bounds() {
    let question = Question::new("1", "SELECT 1", 4.0)
        .with_check(CheckSpec::new("TooMuch", 100.0))
        .with_check(CheckSpec::new("Half", -30.0));

    let result = evaluate(&question, &Answer::new("1", ""), &registry(), session().as_mut());
    assert_eq!(result.checks[0].outcome, 1.0);
    assert!(result.raw_score() >= 0.0 && result.raw_score() <= 4.0);

    let negative = Question::new("1", "SELECT 1", 4.0).with_check(CheckSpec::new("Half", -30.0));
    let result = evaluate(&negative, &Answer::new("1", ""), &registry(), session().as_mut());
    assert_eq!(result.raw_score(), 0.0);
}

#[test]
fn more_passing_checks_never_lower_the_score() {
    let registry = registry();
    let weights = [30.0, 30.0, 40.0];
    let mut previous = -1.0;

    for passing in 0..=weights.len() {
        let mut question = Question::new("1", "SELECT 1", 10.0);
        for (i, weight) in weights.iter().enumerate() {
            let id = if i < passing { "Eight" } else { "Half" };
            question = question.with_check(CheckSpec::new(id, *weight));
        }
        let score = evaluate(&question, &Answer::new("1", ""), &registry, session().as_mut()).raw_score();
        assert!(score >= previous, "{score} < {previous} with {passing} passing");
        previous = score;
    }
}

#[test]
fn scoring_is_deterministic() {
    let catalog = AssignmentCatalog::new(
        "Lab",
        vec![
            Question::new("2a", "SELECT a FROM t", 10.0)
                .with_check(CheckSpec::new("ResultSetEqual", 60.0))
                .with_check(CheckSpec::new("ExactMatch", 40.0)),
            Question::new("2b", "SELECT b FROM t", 10.0)
                .with_check(CheckSpec::new("RowCount", 100.0)),
        ],
    )
    .expect("catalog");
    let registry = registry();
    let answer = Answer::new("2", "select a from t");

    let first = score_answer(&catalog, &answer, "dana", &registry, session().as_mut());
    let second = score_answer(&catalog, &answer, "dana", &registry, session().as_mut());

    assert_eq!(first.raw_score(), second.raw_score());
    assert_eq!(first.chosen_id(), second.chosen_id());
    assert_eq!(first.checks, second.checks);
}
