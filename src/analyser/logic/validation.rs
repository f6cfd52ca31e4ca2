//! Dataset validation against a [`RuleSet`].
//!
//! Every check runs independently and contributes zero or more
//! [`ValidationIssue`]s. Only a missing required column (or an empty
//! dataset) is an error; everything else is a warning the cleaner may fix.

use super::profiling::{
    duplicate_row_count, is_empty_column, missing_count, whitespace_count,
};
use super::types::{IssueKind, Severity, ValidationIssue, ValidationReport, dtype_label};
use crate::error::Result;
use crate::rules::{NumericRange, RuleSet};
use crate::utils::percent;
use polars::prelude::*;
use regex::Regex;

/// Runs every check and collects the issues in a stable order.
pub fn validate(df: &DataFrame, rules: &RuleSet) -> Result<ValidationReport> {
    let mut issues = Vec::new();

    if df.height() == 0 || df.width() == 0 {
        issues.push(ValidationIssue::dataset(
            IssueKind::EmptyDataset,
            0,
            Severity::Error,
        ));
        return Ok(finish(df, issues));
    }

    check_required_columns(df, rules, &mut issues);
    check_column_types(df, rules, &mut issues);
    check_duplicates(df, &mut issues)?;
    check_missing_values(df, &mut issues)?;
    check_empty_columns(df, &mut issues)?;
    check_whitespace(df, &mut issues)?;
    check_ranges(df, rules, &mut issues)?;
    check_patterns(df, rules, &mut issues)?;

    Ok(finish(df, issues))
}

fn finish(df: &DataFrame, issues: Vec<ValidationIssue>) -> ValidationReport {
    let is_valid = !issues.iter().any(ValidationIssue::is_error);
    if is_valid {
        tracing::info!("Validation passed with {} warnings", issues.len());
    } else {
        for issue in issues.iter().filter(|i| i.is_error()) {
            tracing::error!("Validation error: {issue}");
        }
    }
    ValidationReport {
        is_valid,
        issues,
        rows: df.height(),
        columns: df.width(),
    }
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

fn check_required_columns(df: &DataFrame, rules: &RuleSet, issues: &mut Vec<ValidationIssue>) {
    for required in &rules.required_columns {
        if !has_column(df, required) {
            issues.push(ValidationIssue::column(
                required,
                IssueKind::MissingColumn,
                0,
                Severity::Error,
            ));
        }
    }
}

fn check_column_types(df: &DataFrame, rules: &RuleSet, issues: &mut Vec<ValidationIssue>) {
    for (name, expected) in &rules.column_types {
        let Ok(col) = df.column(name) else {
            continue;
        };
        if !expected.matches_dtype(col.dtype()) {
            issues.push(ValidationIssue::column(
                name,
                IssueKind::TypeMismatch {
                    expected: *expected,
                    actual: dtype_label(col.dtype()),
                },
                0,
                Severity::Warning,
            ));
        }
    }
}

fn check_duplicates(df: &DataFrame, issues: &mut Vec<ValidationIssue>) -> Result<()> {
    let duplicates = duplicate_row_count(df)?;
    if duplicates > 0 {
        issues.push(ValidationIssue::dataset(
            IssueKind::DuplicateRows {
                percent: percent(duplicates, df.height()),
            },
            duplicates,
            Severity::Warning,
        ));
    }
    Ok(())
}

fn check_missing_values(df: &DataFrame, issues: &mut Vec<ValidationIssue>) -> Result<()> {
    for col in df.get_columns() {
        let missing = missing_count(col)?;
        if missing > 0 {
            issues.push(ValidationIssue::column(
                col.name(),
                IssueKind::MissingValues {
                    percent: percent(missing, df.height()),
                },
                missing,
                Severity::Warning,
            ));
        }
    }
    Ok(())
}

fn check_empty_columns(df: &DataFrame, issues: &mut Vec<ValidationIssue>) -> Result<()> {
    for col in df.get_columns() {
        if is_empty_column(col)? {
            issues.push(ValidationIssue::column(
                col.name(),
                IssueKind::EmptyColumn,
                col.len(),
                Severity::Warning,
            ));
        }
    }
    Ok(())
}

fn check_whitespace(df: &DataFrame, issues: &mut Vec<ValidationIssue>) -> Result<()> {
    for col in df.get_columns() {
        let count = whitespace_count(col)?;
        if count > 0 {
            issues.push(ValidationIssue::column(
                col.name(),
                IssueKind::Whitespace,
                count,
                Severity::Warning,
            ));
        }
    }
    Ok(())
}

/// Values outside the range; values that are not numbers are skipped.
pub fn count_out_of_range(col: &Column, range: &NumericRange) -> Result<usize> {
    let values = col.as_materialized_series().cast(&DataType::Float64)?;
    let ca = values.f64()?;
    Ok(ca
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan() && !range.contains(*v))
        .count())
}

fn check_ranges(df: &DataFrame, rules: &RuleSet, issues: &mut Vec<ValidationIssue>) -> Result<()> {
    for (name, range) in &rules.numeric_ranges {
        let Ok(col) = df.column(name) else {
            continue;
        };
        let count = count_out_of_range(col, range)?;
        if count > 0 {
            issues.push(ValidationIssue::column(
                name,
                IssueKind::OutOfRange {
                    min: range.min,
                    max: range.max,
                },
                count,
                Severity::Warning,
            ));
        }
    }
    Ok(())
}

/// Non-missing values the pattern does not match anywhere in the value.
pub fn count_pattern_mismatches(col: &Column, pattern: &Regex) -> Result<usize> {
    let text = col.as_materialized_series().cast(&DataType::String)?;
    let ca = text.str()?;
    Ok(ca
        .into_iter()
        .flatten()
        .filter(|v| !v.is_empty() && !pattern.is_match(v))
        .count())
}

fn check_patterns(df: &DataFrame, rules: &RuleSet, issues: &mut Vec<ValidationIssue>) -> Result<()> {
    for (name, pattern) in rules.patterns() {
        let Ok(col) = df.column(name) else {
            continue;
        };
        let count = count_pattern_mismatches(col, pattern)?;
        if count > 0 {
            issues.push(ValidationIssue::column(
                name,
                IssueKind::PatternMismatch {
                    pattern: pattern.as_str().to_owned(),
                },
                count,
                Severity::Warning,
            ));
        }
    }
    Ok(())
}
