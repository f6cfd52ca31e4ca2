use anyhow::{Context as _, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tidycsv::analyser::logic::{CleanOptions, InputEncoding, MissingStrategy};
use tidycsv::pipeline::{BatchEvent, BatchSummary, RunConfig, run_batch};
use tidycsv::rules::RuleSet;

/// Issues printed per file; the rest are summarised in one line.
const ISSUE_PREVIEW: usize = 3;

#[derive(Parser, Debug)]
#[command(
    name = "tidycsv",
    version,
    about = "Validate and clean CSV/Excel files",
    after_help = "Examples:\n  \
        tidycsv -i data.csv -o output/\n  \
        tidycsv -i input/ -o output/\n  \
        tidycsv -i data.csv -o output/ --required-columns name,email,phone\n  \
        tidycsv -i data.csv -o output/ --validate-only\n  \
        tidycsv -i data.csv -o output/ --fill-missing median"
)]
pub struct Cli {
    /// Input CSV/Excel file or directory
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory for cleaned files, reports and logs
    #[arg(short, long)]
    pub output: PathBuf,

    /// Comma-separated list of required columns
    #[arg(long, value_delimiter = ',')]
    pub required_columns: Vec<String>,

    /// Path to a JSON rule set
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// How to handle missing values
    #[arg(long, value_enum)]
    pub fill_missing: Option<FillMissing>,

    /// Literal value for missing cells in text columns
    #[arg(long)]
    pub fill_text: Option<String>,

    /// chrono format used to parse and write dates
    #[arg(long, default_value = "%Y-%m-%d")]
    pub date_format: String,

    /// Encoding of CSV input: any WHATWG label (utf-8, latin1, cp1252, ...)
    #[arg(long, value_name = "LABEL", default_value = "utf-8")]
    pub encoding: String,

    /// Only validate, do not clean data
    #[arg(long)]
    pub validate_only: bool,

    /// Keep duplicate rows
    #[arg(long)]
    pub keep_duplicates: bool,

    /// Do not trim whitespace from text values
    #[arg(long)]
    pub no_trim: bool,

    /// Keep the original column names
    #[arg(long)]
    pub keep_column_names: bool,

    /// Drop rows more than N standard deviations from a numeric column's mean
    #[arg(long, value_name = "N")]
    pub outlier_std: Option<f64>,

    /// Also write an HTML quality report
    #[arg(long)]
    pub html: bool,

    /// Exit with status 1 when any file fails validation
    #[arg(long)]
    pub fail_on_invalid: bool,

    /// Show detailed progress
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FillMissing {
    Mean,
    Median,
    Mode,
    Drop,
    ForwardFill,
    BackwardFill,
}

impl From<FillMissing> for MissingStrategy {
    fn from(value: FillMissing) -> Self {
        match value {
            FillMissing::Mean => Self::Mean,
            FillMissing::Median => Self::Median,
            FillMissing::Mode => Self::Mode,
            FillMissing::Drop => Self::Drop,
            FillMissing::ForwardFill => Self::ForwardFill,
            FillMissing::BackwardFill => Self::BackwardFill,
        }
    }
}

impl Cli {
    /// Builds the run configuration, loading the rule set file if given.
    pub fn into_config(self) -> Result<RunConfig> {
        let encoding = InputEncoding::for_label(&self.encoding)
            .with_context(|| format!("Invalid --encoding '{}'", self.encoding))?;

        let rules = match &self.rules {
            Some(path) => RuleSet::from_file(path)
                .with_context(|| format!("Failed to load rule set {}", path.display()))?,
            None => RuleSet::new(),
        }
        .with_required_columns(self.required_columns.iter().map(|c| c.trim()));

        let clean = CleanOptions {
            trim_whitespace: !self.no_trim,
            drop_duplicates: !self.keep_duplicates,
            missing: self.fill_missing.map(Into::into),
            fill_text: self.fill_text,
            outlier_std: self.outlier_std,
            standardise_names: !self.keep_column_names,
            date_format: self.date_format,
            ..CleanOptions::default()
        };

        Ok(RunConfig {
            input: self.input,
            output_dir: self.output,
            rules,
            clean,
            encoding,
            validate_only: self.validate_only,
            html: self.html,
            fail_on_invalid: self.fail_on_invalid,
        })
    }
}

/// Runs every input file and prints progress; returns the process exit status.
pub fn run(config: &RunConfig) -> Result<u8> {
    println!("{}", "=".repeat(80));
    println!("CSV/Excel Validation & Cleaning Tool");
    println!("{}", "=".repeat(80));
    println!();

    let summary = run_batch(config, print_event)?;

    println!();
    print!("{}", summary.render());
    print_footer(config, &summary);
    Ok(summary.exit_code(config.fail_on_invalid))
}

fn print_event(event: BatchEvent<'_>) {
    match event {
        BatchEvent::Found { count } => println!("Found {count} file(s) to process\n"),
        BatchEvent::Started { index, total, path } => {
            let name = path.file_name().unwrap_or(path.as_os_str()).to_string_lossy();
            println!("[{index}/{total}] Processing: {name}");
        }
        BatchEvent::Finished { result, .. } => {
            match result {
                Ok(outcome) => {
                    if outcome.validation.is_valid {
                        println!("  ✓ Validation passed");
                    } else {
                        println!("  ⚠ Validation failed");
                    }
                    for line in outcome.issue_preview(ISSUE_PREVIEW) {
                        println!("    - {line}");
                    }
                    if outcome.rows_removed() > 0 {
                        println!("  Removed {} rows during cleaning", outcome.rows_removed());
                    }
                    for path in &outcome.outputs {
                        let name = path.file_name().unwrap_or(path.as_os_str()).to_string_lossy();
                        println!("  ✓ Saved {name}");
                    }
                }
                Err(err) => println!("  ✗ Error processing file: {err:#}"),
            }
            println!();
        }
    }
}

fn print_footer(config: &RunConfig, summary: &BatchSummary) {
    if summary.failed() == 0 {
        println!("\n✓ Processing complete!");
    } else {
        println!("\n✗ Processing finished with {} failed file(s)", summary.failed());
    }
    println!("Reports saved to: {}", config.output_dir.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_map_to_config() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "tidycsv",
            "-i",
            "data.csv",
            "-o",
            "out",
            "--required-columns",
            "name, email,phone",
            "--fill-missing",
            "forward-fill",
            "--keep-duplicates",
            "--outlier-std",
            "3",
            "--encoding",
            "latin1",
            "--html",
        ])?;
        let config = cli.into_config()?;

        assert_eq!(config.rules.required_columns, vec!["name", "email", "phone"]);
        assert_eq!(config.clean.missing, Some(MissingStrategy::ForwardFill));
        assert!(!config.clean.drop_duplicates);
        assert!(config.clean.trim_whitespace);
        assert_eq!(config.clean.outlier_std, Some(3.0));
        assert_eq!(config.encoding, InputEncoding::for_label("iso-8859-1")?);
        assert!(config.html);
        assert!(!config.validate_only);
        Ok(())
    }

    #[test]
    fn test_defaults() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["tidycsv", "--input", "in", "--output", "out"])?;
        assert_eq!(cli.encoding, "utf-8");
        assert_eq!(cli.date_format, "%Y-%m-%d");
        let config = cli.into_config()?;
        assert_eq!(config.encoding, InputEncoding::UTF8);
        assert!(config.rules.is_empty());
        assert_eq!(config.clean.missing, None);
        assert!(config.clean.standardise_names);
        Ok(())
    }

    #[test]
    fn test_rules_file_merges_required_columns() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let rules = dir.path().join("rules.json");
        std::fs::write(
            &rules,
            r#"{"required_columns": ["id"], "column_types": {"age": "int"}}"#,
        )?;
        let rules = rules.display().to_string();
        let cli = Cli::try_parse_from([
            "tidycsv",
            "-i",
            "in",
            "-o",
            "out",
            "--rules",
            &rules,
            "--required-columns",
            "id,name",
        ])?;
        let config = cli.into_config()?;
        assert_eq!(config.rules.required_columns, vec!["id", "name"]);
        assert!(config.rules.declared_type("age").is_some());
        Ok(())
    }

    #[test]
    fn test_unknown_encoding_is_an_error() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["tidycsv", "-i", "in", "-o", "out", "--encoding", "ebcdic-9"])?;
        let err = cli.into_config().err().map(|e| format!("{e:#}"));
        assert!(
            err.as_deref().is_some_and(|e| e.contains("unknown encoding label 'ebcdic-9'")),
            "{err:?}"
        );
        Ok(())
    }

    #[test]
    fn test_missing_rules_file_is_an_error() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "tidycsv",
            "-i",
            "in",
            "-o",
            "out",
            "--rules",
            "/definitely/not/here.json",
        ])?;
        assert!(cli.into_config().is_err());
        Ok(())
    }
}
