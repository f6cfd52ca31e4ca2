//! Per-file execution: load, validate, clean, write outputs.

use crate::analyser::logic::{
    CleanOptions, CleaningLog, InputEncoding, ValidationReport, clean, load_df, save_df, validate,
};
use crate::report::{
    ReportInput, render_cleaning_log, render_html_report, render_summary_statistics,
    render_validation_report,
};
use crate::rules::RuleSet;
use crate::utils::plural;
use anyhow::{Context as _, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Settings shared by every file of a run.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Input file or directory
    pub input: PathBuf,

    /// Directory receiving cleaned files, reports and logs
    pub output_dir: PathBuf,

    pub rules: RuleSet,
    pub clean: CleanOptions,
    pub encoding: InputEncoding,

    /// Skip cleaning and write only the validation report
    pub validate_only: bool,

    /// Also write `report_<stem>.html`
    pub html: bool,

    /// Treat a file that fails validation as a failed run
    pub fail_on_invalid: bool,
}

impl RunConfig {
    pub fn new(input: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            input,
            output_dir,
            rules: RuleSet::new(),
            clean: CleanOptions::default(),
            encoding: InputEncoding::default(),
            validate_only: false,
            html: false,
            fail_on_invalid: false,
        }
    }
}

/// Result of processing one file.
#[derive(Clone, Debug)]
pub struct FileOutcome {
    pub file_name: String,

    pub rows_before: usize,
    pub columns_before: usize,

    /// Equal to the `_before` counts when cleaning was skipped
    pub rows_after: usize,
    pub columns_after: usize,

    pub validation: ValidationReport,

    /// `None` in validate-only mode
    pub log: Option<CleaningLog>,

    /// Files written, in write order
    pub outputs: Vec<PathBuf>,

    pub duration: Duration,
}

impl FileOutcome {
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }

    pub fn was_cleaned(&self) -> bool {
        self.log.is_some()
    }

    /// One-line summary of the file's run.
    pub fn summary(&self) -> String {
        match &self.log {
            Some(log) => format!(
                "{}: {} rows ({} → {}), {} columns ({} → {}), {} cleaning {}, {:.2}s",
                self.file_name,
                change_word(self.rows_before, self.rows_after),
                self.rows_before,
                self.rows_after,
                change_word(self.columns_before, self.columns_after),
                self.columns_before,
                self.columns_after,
                log.len(),
                plural(log.len(), "action", "actions"),
                self.duration.as_secs_f64()
            ),
            None => format!(
                "{}: validated {} rows, {} columns, {} errors, {} warnings, {:.2}s",
                self.file_name,
                self.rows_before,
                self.columns_before,
                self.validation.error_count(),
                self.validation.warning_count(),
                self.duration.as_secs_f64()
            ),
        }
    }

    /// The first `limit` issue messages, then a "... and N more issues" line.
    pub fn issue_preview(&self, limit: usize) -> Vec<String> {
        let issues = &self.validation.issues;
        let mut lines: Vec<String> = issues.iter().take(limit).map(ToString::to_string).collect();
        if issues.len() > limit {
            lines.push(format!("... and {} more issues", issues.len() - limit));
        }
        lines
    }
}

fn change_word(before: usize, after: usize) -> &'static str {
    if after > before {
        "added"
    } else if after < before {
        "removed"
    } else {
        "unchanged"
    }
}

/// Validates, cleans and reports on the file at `path`.
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed, or if an output file
/// cannot be written. A file that fails validation is not an error.
pub fn process_file(path: &Path, config: &RunConfig) -> Result<FileOutcome> {
    let start = Instant::now();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.clone());

    tracing::info!("Processing {}", path.display());

    let df = load_df(path, config.encoding)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    tracing::debug!("Loaded {} rows x {} columns", df.height(), df.width());

    let validation = validate(&df, &config.rules)?;
    if !validation.is_valid {
        tracing::warn!(
            "{file_name} failed validation with {} errors",
            validation.error_count()
        );
    }

    let cleaned = if config.validate_only {
        None
    } else {
        Some(clean(&df, &config.clean, &config.rules)?)
    };

    let out = &config.output_dir;
    std::fs::create_dir_all(out)
        .with_context(|| format!("Failed to create output directory: {}", out.display()))?;

    let report_input = ReportInput {
        file_name: &file_name,
        original: &df,
        validation: &validation,
        cleaned: cleaned.as_ref(),
        generated_at: Local::now().naive_local(),
    };

    let mut outputs = Vec::new();

    if let Some(outcome) = &cleaned {
        let cleaned_path = out.join(format!("cleaned_{stem}.csv"));
        let mut data = outcome.data.clone();
        save_df(&mut data, &cleaned_path, &config.clean.date_format)
            .with_context(|| format!("Failed to write {}", cleaned_path.display()))?;
        outputs.push(cleaned_path);
    }

    let report_name = if cleaned.is_some() {
        format!("report_{stem}.txt")
    } else {
        format!("validation_{stem}.txt")
    };
    outputs.push(write_text(
        &out.join(report_name),
        &render_validation_report(&report_input)?,
    )?);

    if let Some(outcome) = &cleaned {
        outputs.push(write_text(
            &out.join(format!("stats_{stem}.txt")),
            &render_summary_statistics(&outcome.data)?,
        )?);
        outputs.push(write_text(
            &out.join(format!("cleaning_log_{stem}.txt")),
            &render_cleaning_log(&outcome.log),
        )?);
    }

    if config.html {
        outputs.push(write_text(
            &out.join(format!("report_{stem}.html")),
            &render_html_report(&report_input)?,
        )?);
    }

    let (rows_after, columns_after) = match &cleaned {
        Some(outcome) => (outcome.data.height(), outcome.data.width()),
        None => (df.height(), df.width()),
    };

    let outcome = FileOutcome {
        file_name,
        rows_before: df.height(),
        columns_before: df.width(),
        rows_after,
        columns_after,
        validation,
        log: cleaned.map(|c| c.log),
        outputs,
        duration: start.elapsed(),
    };
    tracing::info!("{}", outcome.summary());
    Ok(outcome)
}

fn write_text(path: &Path, contents: &str) -> Result<PathBuf> {
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyser::logic::MissingStrategy;

    const PEOPLE: &str = "Name,Age,Email\n\
                          John,30,john@example.com\n\
                          John,30,john@example.com\n\
                          Jane,,jane@example.com\n\
                          Bob ,25,not-an-email\n";

    fn setup() -> anyhow::Result<(tempfile::TempDir, PathBuf)> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("people.csv");
        std::fs::write(&input, PEOPLE)?;
        Ok((dir, input))
    }

    fn names(outcome: &FileOutcome) -> Vec<String> {
        outcome
            .outputs
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_process_file_writes_all_outputs() -> anyhow::Result<()> {
        let (dir, input) = setup()?;
        let mut config = RunConfig::new(input.clone(), dir.path().join("out"));
        config.html = true;
        config.clean.missing = Some(MissingStrategy::Mean);

        let outcome = process_file(&input, &config)?;

        assert_eq!(
            names(&outcome),
            vec![
                "cleaned_people.csv",
                "report_people.txt",
                "stats_people.txt",
                "cleaning_log_people.txt",
                "report_people.html",
            ]
        );
        assert!(outcome.outputs.iter().all(|p| p.exists()));
        assert_eq!(outcome.rows_before, 4);
        assert_eq!(outcome.rows_after, 3);
        assert_eq!(outcome.rows_removed(), 1);
        assert!(outcome.was_cleaned());

        let cleaned = std::fs::read_to_string(dir.path().join("out/cleaned_people.csv"))?;
        let mut lines = cleaned.lines();
        assert_eq!(lines.next(), Some("name,age,email"));
        assert!(cleaned.contains("Bob,25,not-an-email"));
        assert!(cleaned.contains("Jane,28,jane@example.com"));
        Ok(())
    }

    #[test]
    fn test_validate_only_writes_validation_report() -> anyhow::Result<()> {
        let (dir, input) = setup()?;
        let mut config = RunConfig::new(input.clone(), dir.path().join("out"));
        config.validate_only = true;
        config.rules = RuleSet::new().with_required_columns(["Name", "Phone"]);

        let outcome = process_file(&input, &config)?;

        assert_eq!(names(&outcome), vec!["validation_people.txt"]);
        assert!(!outcome.was_cleaned());
        assert!(!outcome.validation.is_valid);
        assert_eq!(outcome.rows_after, outcome.rows_before);

        let report = std::fs::read_to_string(dir.path().join("out/validation_people.txt"))?;
        assert!(report.contains("Missing required column: Phone"));
        assert!(!report.contains("CLEANING RESULTS"));
        assert!(outcome.summary().starts_with("people.csv: validated 4 rows"));
        Ok(())
    }

    #[test]
    fn test_missing_file_is_an_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = RunConfig::new(dir.path().to_path_buf(), dir.path().join("out"));
        let err = process_file(&dir.path().join("absent.csv"), &config);
        assert!(err.is_err());
        assert!(!dir.path().join("out").exists());
        Ok(())
    }

    #[test]
    fn test_issue_preview_truncates() -> anyhow::Result<()> {
        let (dir, input) = setup()?;
        let mut config = RunConfig::new(input.clone(), dir.path().join("out"));
        config.validate_only = true;
        config.rules = RuleSet::new().with_required_columns(["a", "b", "c", "d", "e"]);

        let outcome = process_file(&input, &config)?;
        let preview = outcome.issue_preview(3);

        assert_eq!(preview.len(), 4);
        assert_eq!(preview[0], "Missing required column: a");
        assert_eq!(
            preview[3],
            format!("... and {} more issues", outcome.validation.issues.len() - 3)
        );
        Ok(())
    }

    #[test]
    fn test_summary_wording() {
        let outcome = FileOutcome {
            file_name: "a.csv".to_owned(),
            rows_before: 10,
            columns_before: 3,
            rows_after: 8,
            columns_after: 3,
            validation: ValidationReport {
                is_valid: true,
                issues: Vec::new(),
                rows: 10,
                columns: 3,
            },
            log: Some(CleaningLog::new()),
            outputs: Vec::new(),
            duration: Duration::from_millis(250),
        };
        assert_eq!(
            outcome.summary(),
            "a.csv: removed rows (10 → 8), unchanged columns (3 → 3), 0 cleaning actions, 0.25s"
        );
    }
}
