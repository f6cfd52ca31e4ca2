//! Multi-file runs over a file or a directory of files.

use super::executor::{FileOutcome, RunConfig, process_file};
use crate::analyser::logic::io::is_supported;
use crate::error::TidyError;
use crate::utils::fmt_thousands;
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

/// Progress notifications emitted by [`run_batch`].
#[derive(Debug)]
pub enum BatchEvent<'a> {
    Found {
        count: usize,
    },
    Started {
        index: usize,
        total: usize,
        path: &'a Path,
    },
    Finished {
        path: &'a Path,
        result: &'a Result<FileOutcome>,
    },
}

/// Lists the files a run should process.
///
/// A file path is returned as is. A directory yields its `*.csv`, `*.xlsx`
/// and `*.xls` files (not recursive), sorted by path.
///
/// # Errors
///
/// Returns error if `input` does not exist or the directory cannot be read.
pub fn collect_input_files(input: &Path) -> Result<Vec<PathBuf>> {
    if !input.exists() {
        return Err(TidyError::FileNotFound(input.display().to_string()).into());
    }
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files = Vec::new();
    let entries = std::fs::read_dir(input)
        .with_context(|| format!("Failed to read directory: {}", input.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_supported(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Totals over every file of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub validation_passed: usize,
    pub rows_processed: usize,
    pub rows_after_clean: usize,
    pub rows_removed: usize,
    pub validate_only: bool,
}

impl BatchSummary {
    /// Row totals cover successfully processed files only.
    pub fn from_results(results: &[Result<FileOutcome>], validate_only: bool) -> Self {
        let mut summary = Self {
            total: results.len(),
            validate_only,
            ..Self::default()
        };
        for outcome in results.iter().flatten() {
            summary.successful += 1;
            if outcome.validation.is_valid {
                summary.validation_passed += 1;
            }
            summary.rows_processed += outcome.rows_before;
            summary.rows_after_clean += outcome.rows_after;
            summary.rows_removed += outcome.rows_removed();
        }
        summary
    }

    pub fn failed(&self) -> usize {
        self.total - self.successful
    }

    /// Process exit status: `1` when any file failed, or when any file was
    /// invalid and `fail_on_invalid` is set.
    pub fn exit_code(&self, fail_on_invalid: bool) -> u8 {
        let invalid = self.validation_passed < self.successful;
        if self.failed() > 0 || (fail_on_invalid && invalid) {
            1
        } else {
            0
        }
    }

    pub fn render(&self) -> String {
        let rule = "=".repeat(80);
        let mut out = format!("{rule}\nPROCESSING SUMMARY\n{rule}\n");
        out.push_str(&format!("Total files:        {}\n", self.total));
        out.push_str(&format!("Successful:         {}\n", self.successful));
        out.push_str(&format!("Validation passed:  {}\n", self.validation_passed));
        if !self.validate_only {
            out.push_str(&format!(
                "\nRows processed:     {}\n",
                fmt_thousands(self.rows_processed)
            ));
            out.push_str(&format!(
                "Rows after clean:   {}\n",
                fmt_thousands(self.rows_after_clean)
            ));
            out.push_str(&format!(
                "Rows removed:       {}\n",
                fmt_thousands(self.rows_removed)
            ));
        }
        out.push_str(&rule);
        out.push('\n');
        out
    }
}

/// Processes every input file of `config`, reporting progress to `on_event`.
///
/// A failing file is logged and counted; the remaining files are still
/// processed.
///
/// # Errors
///
/// Returns error if the input path is missing or holds no supported files.
pub fn run_batch<F>(config: &RunConfig, mut on_event: F) -> Result<BatchSummary>
where
    F: FnMut(BatchEvent<'_>),
{
    let files = collect_input_files(&config.input)?;
    if files.is_empty() {
        anyhow::bail!(
            "No valid CSV/Excel files found in {}",
            config.input.display()
        );
    }
    tracing::info!("Found {} file(s) to process", files.len());
    on_event(BatchEvent::Found { count: files.len() });

    let mut results = Vec::with_capacity(files.len());
    for (index, path) in files.iter().enumerate() {
        on_event(BatchEvent::Started {
            index: index + 1,
            total: files.len(),
            path,
        });
        let result = process_file(path, config);
        if let Err(err) = &result {
            tracing::error!("Error processing {}: {err:#}", path.display());
        }
        on_event(BatchEvent::Finished {
            path,
            result: &result,
        });
        results.push(result);
    }

    let summary = BatchSummary::from_results(&results, config.validate_only);
    tracing::info!(
        "Batch finished: {} of {} files successful, {} passed validation",
        summary.successful,
        summary.total,
        summary.validation_passed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) -> anyhow::Result<PathBuf> {
        let path = dir.join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    #[test]
    fn test_collect_input_files_filters_and_sorts() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        write(dir.path(), "b.csv", "x\n1\n")?;
        write(dir.path(), "a.CSV", "x\n1\n")?;
        write(dir.path(), "notes.txt", "hello")?;
        std::fs::create_dir(dir.path().join("nested.csv"))?;

        let files = collect_input_files(dir.path())?;
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.CSV", "b.csv"]);
        Ok(())
    }

    #[test]
    fn test_collect_single_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let file = write(dir.path(), "data.csv", "x\n1\n")?;
        assert_eq!(collect_input_files(&file)?, vec![file]);
        Ok(())
    }

    #[test]
    fn test_missing_input_path() {
        let err = collect_input_files(Path::new("/definitely/not/here"));
        let err = err.expect_err("missing path must fail");
        assert!(matches!(
            err.downcast_ref::<TidyError>(),
            Some(TidyError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_failing_file_does_not_block_others() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("in");
        std::fs::create_dir(&input)?;
        write(&input, "a_good.csv", "id,name\n1,x\n1,x\n2,y\n")?;
        write(&input, "b_empty.csv", "")?;
        write(&input, "c_good.csv", "id\n5\n")?;

        let config = RunConfig::new(input, dir.path().join("out"));
        let mut started = Vec::new();
        let mut failures = 0;
        let summary = run_batch(&config, |event| match event {
            BatchEvent::Started { index, total, .. } => started.push((index, total)),
            BatchEvent::Finished { result, .. } => {
                if result.is_err() {
                    failures += 1;
                }
            }
            BatchEvent::Found { .. } => {}
        })?;

        assert_eq!(started, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(failures, 1);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.rows_processed, 4);
        assert_eq!(summary.rows_after_clean, 3);
        assert_eq!(summary.rows_removed, 1);
        assert_eq!(summary.exit_code(false), 1);
        assert!(dir.path().join("out/cleaned_c_good.csv").exists());
        Ok(())
    }

    #[test]
    fn test_empty_directory_is_an_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = RunConfig::new(dir.path().to_path_buf(), dir.path().join("out"));
        assert!(run_batch(&config, |_| {}).is_err());
        Ok(())
    }

    #[test]
    fn test_exit_code_and_render() {
        let summary = BatchSummary {
            total: 2,
            successful: 2,
            validation_passed: 1,
            rows_processed: 1500,
            rows_after_clean: 1490,
            rows_removed: 10,
            validate_only: false,
        };
        assert_eq!(summary.exit_code(false), 0);
        assert_eq!(summary.exit_code(true), 1);

        let text = summary.render();
        assert!(text.contains("PROCESSING SUMMARY"));
        assert!(text.contains("Validation passed:  1"));
        assert!(text.contains("Rows processed:     1,500"));

        let validate_only = BatchSummary {
            validate_only: true,
            ..summary
        };
        assert!(!validate_only.render().contains("Rows processed"));
    }
}
