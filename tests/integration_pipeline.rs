//! Integration tests for the full validate, clean and report workflow
//!
//! These tests run the pipeline on the fixture files in `testdata/` and
//! check the files written to a temporary output directory.

use std::path::{Path, PathBuf};
use std::process::Command;
use tidycsv::analyser::logic::{
    CleanOptions, ColumnType, InputEncoding, IssueKind, MissingStrategy, clean, load_df, validate,
};
use tidycsv::pipeline::{RunConfig, process_file, run_batch};
use tidycsv::rules::RuleSet;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name)
}

fn rules() -> anyhow::Result<RuleSet> {
    Ok(RuleSet::from_file(fixture("rules.json"))?)
}

#[test]
fn test_clean_file_passes_validation() -> anyhow::Result<()> {
    let df = load_df(&fixture("clean.csv"), InputEncoding::UTF8)?;
    assert_eq!(df.height(), 10, "Should have 10 rows");
    assert_eq!(df.width(), 6, "Should have 6 columns");

    let rules = RuleSet::new()
        .with_required_columns(["id", "name", "email"])
        .with_type("age", ColumnType::Integer)
        .with_type("salary", ColumnType::Float)
        .with_range("age", Some(18.0), Some(70.0))
        .with_pattern("email", r"^[^@\s]+@[^@\s]+\.[a-zA-Z]{2,}$")?;
    let report = validate(&df, &rules)?;

    assert!(report.is_valid);
    assert!(
        report.issues.is_empty(),
        "Clean file should have no issues: {:?}",
        report.issues
    );

    let outcome = clean(&df, &CleanOptions::default(), &rules)?;
    assert!(
        outcome.log.is_empty(),
        "Nothing to clean: {:?}",
        outcome.log.actions
    );
    Ok(())
}

#[test]
fn test_messy_file_validation_issues() -> anyhow::Result<()> {
    let df = load_df(&fixture("messy.csv"), InputEncoding::UTF8)?;
    let report = validate(&df, &rules()?)?;

    // Only missing required columns are errors.
    assert!(report.is_valid);
    assert_eq!(report.rows, 6);

    let has = |column: &str, pred: fn(&IssueKind) -> bool| {
        report.issues_for(column).any(|i| pred(&i.kind))
    };
    assert!(has("Age", |k| matches!(k, IssueKind::TypeMismatch { .. })));
    assert!(has("Signup Date", |k| matches!(k, IssueKind::TypeMismatch { .. })));
    assert!(has("Notes", |k| matches!(k, IssueKind::EmptyColumn)));
    assert!(has("Full Name", |k| matches!(k, IssueKind::Whitespace)));
    assert!(has("Email", |k| matches!(k, IssueKind::PatternMismatch { .. })));

    let duplicates: Vec<_> = report
        .issues
        .iter()
        .filter(|i| matches!(i.kind, IssueKind::DuplicateRows { .. }))
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].count, 1);

    let age_missing = report
        .issues_for("Age")
        .find(|i| matches!(i.kind, IssueKind::MissingValues { .. }))
        .map(|i| i.count);
    assert_eq!(age_missing, Some(1));
    Ok(())
}

#[test]
fn test_missing_required_column_fails_validation() -> anyhow::Result<()> {
    let df = load_df(&fixture("clean.csv"), InputEncoding::UTF8)?;
    let rules = RuleSet::new().with_required_columns(["id", "phone", "email"]);
    let report = validate(&df, &rules)?;

    assert!(!report.is_valid);
    assert_eq!(report.error_count(), 1);
    assert_eq!(report.issues_for("phone").count(), 1);
    Ok(())
}

#[test]
fn test_process_messy_file_end_to_end() -> anyhow::Result<()> {
    let out = tempfile::tempdir()?;
    let mut config = RunConfig::new(fixture("messy.csv"), out.path().to_path_buf());
    config.rules = rules()?;
    config.html = true;

    let outcome = process_file(&config.input, &config)?;
    assert_eq!(outcome.rows_before, 6);
    assert_eq!(outcome.rows_after, 5);
    assert_eq!(outcome.columns_after, 5, "Notes should be dropped");

    let cleaned = std::fs::read_to_string(out.path().join("cleaned_messy.csv"))?;
    let lines: Vec<&str> = cleaned.lines().collect();
    assert_eq!(lines[0], "customer_id,full_name,age,email,signup_date");
    assert_eq!(lines.len(), 6);
    assert!(lines.contains(&"3,Bob Wilson,45,bob@example,2024-03-10"));
    assert!(lines.contains(&"4,Alice Brown,,alice@example.com,"));

    let log = std::fs::read_to_string(out.path().join("cleaning_log_messy.txt"))?;
    assert!(log.contains("removed 1 duplicate row"));
    assert!(log.contains("trimmed whitespace in 1 value of Full Name"));
    assert!(log.contains("converted Age to integer, 1 unconvertible value set to missing"));
    assert!(log.contains("dropped empty column Notes"));
    assert!(log.contains("renamed column Customer ID to customer_id"));

    let report = std::fs::read_to_string(out.path().join("report_messy.txt"))?;
    assert!(report.contains("DATA QUALITY VALIDATION REPORT"));
    assert!(report.contains("File: messy.csv"));
    assert!(report.contains("CLEANING RESULTS"));
    assert!(report.contains("RECOMMENDATIONS"));

    let stats = std::fs::read_to_string(out.path().join("stats_messy.txt"))?;
    assert!(stats.contains("customer_id"));

    let html = std::fs::read_to_string(out.path().join("report_messy.html"))?;
    assert!(html.contains("<h2>Cleaning Results</h2>"));
    Ok(())
}

#[test]
fn test_cleaning_is_idempotent() -> anyhow::Result<()> {
    let df = load_df(&fixture("messy.csv"), InputEncoding::UTF8)?;
    let rules = rules()?;
    let options = CleanOptions {
        missing: Some(MissingStrategy::Median),
        fill_text: Some("unknown".to_owned()),
        ..CleanOptions::default()
    };

    let first = clean(&df, &options, &rules)?;
    assert!(!first.log.is_empty());

    let second = clean(&first.data, &options, &rules)?;
    assert!(
        second.log.is_empty(),
        "Second pass should change nothing: {:?}",
        second.log.actions
    );
    assert!(second.data.equals_missing(&first.data));
    Ok(())
}

#[test]
fn test_directory_batch() -> anyhow::Result<()> {
    let out = tempfile::tempdir()?;
    let mut config = RunConfig::new(fixture(""), out.path().to_path_buf());
    config.validate_only = true;

    let mut seen = 0;
    let summary = run_batch(&config, |event| {
        if let tidycsv::pipeline::BatchEvent::Finished { .. } = event {
            seen += 1;
        }
    })?;

    assert_eq!(summary.total, 2, "clean.csv and messy.csv");
    assert_eq!(seen, 2);
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.exit_code(true), 0);
    assert!(out.path().join("validation_clean.txt").exists());
    assert!(out.path().join("validation_messy.txt").exists());
    assert!(!out.path().join("cleaned_messy.csv").exists());
    Ok(())
}

#[test]
fn test_binary_exit_codes() -> anyhow::Result<()> {
    let out = tempfile::tempdir()?;
    let bin = env!("CARGO_BIN_EXE_tidycsv");

    let ok = Command::new(bin)
        .arg("--input")
        .arg(fixture("clean.csv"))
        .arg("--output")
        .arg(out.path())
        .output()?;
    assert!(ok.status.success(), "{}", String::from_utf8_lossy(&ok.stderr));
    let stdout = String::from_utf8_lossy(&ok.stdout);
    assert!(stdout.contains("PROCESSING SUMMARY"));
    assert!(out.path().join("logs/tidycsv.log").exists());

    let invalid = Command::new(bin)
        .arg("-i")
        .arg(fixture("clean.csv"))
        .arg("-o")
        .arg(out.path())
        .args(["--required-columns", "phone", "--fail-on-invalid"])
        .output()?;
    assert_eq!(invalid.status.code(), Some(1));

    let missing = Command::new(bin)
        .arg("-i")
        .arg(fixture("absent.csv"))
        .arg("-o")
        .arg(out.path())
        .output()?;
    assert_eq!(missing.status.code(), Some(1));
    Ok(())
}

#[test]
fn test_binary_reads_latin1_with_encoding_flag() -> anyhow::Result<()> {
    let out = tempfile::tempdir()?;
    let bin = env!("CARGO_BIN_EXE_tidycsv");
    let input = fixture("formats/latin1.csv");

    let default = Command::new(bin)
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(out.path())
        .output()?;
    assert_eq!(default.status.code(), Some(1), "latin-1 bytes are not valid utf-8");

    let latin1 = Command::new(bin)
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(out.path())
        .args(["--encoding", "latin1"])
        .output()?;
    assert!(latin1.status.success(), "{}", String::from_utf8_lossy(&latin1.stderr));

    let cleaned = std::fs::read_to_string(out.path().join("cleaned_latin1.csv"))?;
    assert!(cleaned.contains("José,München"));
    assert!(cleaned.contains("François,Montréal"));

    let unknown = Command::new(bin)
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(out.path())
        .args(["--encoding", "not-a-charset"])
        .output()?;
    assert_eq!(unknown.status.code(), Some(1));
    Ok(())
}
