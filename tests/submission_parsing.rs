use std::{fs, path::PathBuf};

use sqlfe::{
    ConfigError,
    grade::{discover, parse_submission, read_submission},
};
use uuid::Uuid;

fn temp_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("sqlfe-submissions-{}", Uuid::new_v4()));
    fs::create_dir_all(&root).expect("create temp root");
    root
}

const FILE: &str = "\
-- Lab 3, Alice Smith
-- 1a) names of all employees
SELECT name
  FROM emp;

-- 2.
-- this one took a while
SELECT dept, COUNT(*)
FROM emp
GROUP BY dept ;
--3: skipped
";

#[test]
fn answers_are_split_on_markers() {
    let submission = parse_submission("alice_lab3.sql", FILE);

    assert_eq!(submission.student_id, "alice");
    assert_eq!(submission.file_name, "alice_lab3.sql");
    let ids: Vec<&str> = submission.answers.iter().map(|a| a.question_id.as_str()).collect();
    assert_eq!(ids, ["1a", "2", "3"]);

    assert_eq!(submission.answers[0].submitted_query, "SELECT name\n  FROM emp");
    assert_eq!(
        submission.answers[1].submitted_query,
        "SELECT dept, COUNT(*)\nFROM emp\nGROUP BY dept"
    );
    assert_eq!(submission.answers[2].submitted_query, "");
}

#[test]
fn text_before_first_marker_is_ignored() {
    let submission = parse_submission("bob.sql", "SELECT 1;\n-- 1\nSELECT 2;\n");
    assert_eq!(submission.student_id, "bob");
    assert_eq!(submission.answers.len(), 1);
    assert_eq!(submission.answers[0].submitted_query, "SELECT 2");
}

#[test]
fn repeated_label_keeps_first_answer() {
    let submission = parse_submission(
        "cy.sql",
        "-- 1\nSELECT 1;\n-- 2\nSELECT 2;\n-- 1\nSELECT 3;\n-- 1)\nSELECT 4;\n",
    );

    let answers: Vec<(&str, &str)> = submission
        .answers
        .iter()
        .map(|a| (a.question_id.as_str(), a.submitted_query.as_str()))
        .collect();
    assert_eq!(answers, [("1", "SELECT 1"), ("2", "SELECT 2")]);
    let repeated: Vec<&str> = submission.repeated.iter().map(|id| id.as_str()).collect();
    assert_eq!(repeated, ["1", "1"]);
}

#[test]
fn discovery_is_sorted_and_filtered_by_extension() {
    let root = temp_root();
    for name in ["zed_lab.sql", "amy_lab.sql", "notes.txt", "kim_lab.sql"] {
        fs::write(root.join(name), "-- 1\nSELECT 1;\n").expect("write");
    }

    let found: Vec<String> = discover(&root, "sql")
        .expect("discover")
        .iter()
        .map(|p| p.file_name().expect("name").to_string_lossy().to_string())
        .collect();
    assert_eq!(found, ["amy_lab.sql", "kim_lab.sql", "zed_lab.sql"]);

    let submission = read_submission(&root.join("kim_lab.sql")).expect("read");
    assert_eq!(submission.student_id, "kim");
    assert_eq!(submission.answers.len(), 1);

    let _ = fs::remove_dir_all(root);
}

#[test]
fn missing_folder_is_a_config_error() {
    let missing = std::env::temp_dir().join(format!("sqlfe-missing-{}", Uuid::new_v4()));
    assert!(matches!(
        discover(&missing, "sql"),
        Err(ConfigError::Submissions { .. })
    ));
}
