//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use aieval_core::model::{ScoreRecord, StudentEvaluation, Verdict};
use aieval_core::table::ResultTable;

fn aieval(home: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("aieval").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env_remove("AIEVAL_GEMINI_KEY")
        .env_remove("AIEVAL_OPENAI_KEY");
    cmd
}

fn record(id: &str, adjusted: f64, verdict: Verdict) -> ScoreRecord {
    ScoreRecord {
        question_id: id.into(),
        raw_score: adjusted,
        adjusted_score: adjusted,
        verdict,
        feedback: "ok".into(),
        ai_reason: String::new(),
        penalty_applied: false,
        failures: vec![],
    }
}

/// Write a two-student session file and return its path.
fn write_session(dir: &Path) -> std::path::PathBuf {
    let mut table = ResultTable::new();
    table.push(StudentEvaluation::accumulate(
        "Asha Rao",
        vec![
            record("1", 9.0, Verdict::LikelyHuman),
            record("2", 0.0, Verdict::LikelyAi),
        ],
    ));
    table.push(StudentEvaluation::accumulate(
        "Ben",
        vec![record("2", 6.5, Verdict::Uncertain)],
    ));
    let path = dir.join("session.json");
    table.save_json(&path).unwrap();
    path
}

#[test]
fn help_output() {
    let dir = TempDir::new().unwrap();
    aieval(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("assignment evaluator"));
}

#[test]
fn version_output() {
    let dir = TempDir::new().unwrap();
    aieval(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("aieval"));
}

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();

    aieval(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created aieval.toml"));

    let content = std::fs::read_to_string(dir.path().join("aieval.toml")).unwrap();
    assert!(content.contains("default_provider = \"gemini\""));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    aieval(dir.path()).arg("init").assert().success();

    aieval(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn export_csv_to_stdout() {
    let dir = TempDir::new().unwrap();
    let session = write_session(dir.path());

    aieval(dir.path())
        .arg("--session")
        .arg(&session)
        .args(["export", "--format", "csv", "--output", "-"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Student,Q1,Q2,Total,Remarks\n"))
        .stdout(predicate::str::contains(
            "Ben,N/A,6.5 (Uncertain),6.5,Q2: Uncertain",
        ));
}

#[test]
fn export_default_file_name() {
    let dir = TempDir::new().unwrap();
    let session = write_session(dir.path());

    aieval(dir.path())
        .arg("--session")
        .arg(&session)
        .arg("export")
        .assert()
        .success();

    let csv = std::fs::read_to_string(dir.path().join("student_evaluations.csv")).unwrap();
    assert_eq!(csv.lines().count(), 3);
}

#[test]
fn export_html() {
    let dir = TempDir::new().unwrap();
    let session = write_session(dir.path());
    let out = dir.path().join("reports/dashboard.html");

    aieval(dir.path())
        .arg("--session")
        .arg(&session)
        .args(["export", "--format", "html", "--output"])
        .arg(&out)
        .assert()
        .success();

    let html = std::fs::read_to_string(out).unwrap();
    assert!(html.contains("Asha Rao"));
}

#[test]
fn dashboard_empty_session() {
    let dir = TempDir::new().unwrap();
    aieval(dir.path())
        .arg("dashboard")
        .assert()
        .success()
        .stdout(predicate::str::contains("No submissions evaluated yet."));
}

#[test]
fn dashboard_shows_students() {
    let dir = TempDir::new().unwrap();
    let session = write_session(dir.path());

    aieval(dir.path())
        .arg("--session")
        .arg(&session)
        .arg("dashboard")
        .assert()
        .success()
        .stdout(predicate::str::contains("Asha Rao"))
        .stdout(predicate::str::contains("2 student(s)"))
        .stdout(predicate::str::contains("1 answer(s) flagged"));
}

#[test]
fn reset_clears_session() {
    let dir = TempDir::new().unwrap();
    let session = write_session(dir.path());

    aieval(dir.path())
        .arg("--session")
        .arg(&session)
        .arg("reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 evaluation(s) removed"));

    assert!(ResultTable::load_json(&session).unwrap().is_empty());
}

#[test]
fn reset_replaces_corrupt_session() {
    let dir = TempDir::new().unwrap();
    let session = dir.path().join("s.json");
    std::fs::write(&session, "{not json").unwrap();

    aieval(dir.path())
        .arg("--session")
        .arg(&session)
        .arg("reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 evaluation(s) removed"));

    assert!(ResultTable::load_json(&session).unwrap().is_empty());
}

#[test]
fn segment_plain_text() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("answers.txt");
    std::fs::write(&file, "Name: Asha\nQ1) light scatters\n2. blue wins\n3: done").unwrap();

    aieval(dir.path())
        .args(["segment", "--plain"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 answer(s) found"))
        .stdout(predicate::str::contains("Q1 (2 words): light scatters"));
}

#[test]
fn segment_json() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("answers.txt");
    std::fs::write(&file, "Q1) first\nQ2) second").unwrap();

    let output = aieval(dir.path())
        .args(["segment", "--plain", "--json"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success());

    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entries[0]["id"], "1");
    assert_eq!(entries[1]["answer"], "second");
}

#[test]
fn evaluate_rejects_unsupported_format() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("key.txt"), "Q1) key").unwrap();

    aieval(dir.path())
        .args(["evaluate", "--provider", "mock", "--key", "key.txt", "answers.docx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("please upload a .docx or .pdf"));
}

#[test]
fn evaluate_unknown_provider() {
    let dir = TempDir::new().unwrap();

    aieval(dir.path())
        .args(["evaluate", "--provider", "nope", "--key", "key.pdf", "a.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("provider 'nope' not configured"));
}

#[test]
fn list_models_includes_mock() {
    let dir = TempDir::new().unwrap();

    aieval(dir.path())
        .arg("list-models")
        .assert()
        .success()
        .stdout(predicate::str::contains("Provider: mock"))
        .stdout(predicate::str::contains("mock-model"));
}

#[test]
fn missing_config_file() {
    let dir = TempDir::new().unwrap();

    aieval(dir.path())
        .args(["--config", "nope.toml", "dashboard"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}
