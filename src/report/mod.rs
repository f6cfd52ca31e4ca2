//! Human-readable reports.
//!
//! [`ReportFacts::gather`] computes everything a report shows once; the
//! [`text`] and [`html`] renderers only format those facts, so both outputs
//! always agree.

pub mod html;
pub mod text;

pub use html::render_html_report;
pub use text::{render_cleaning_log, render_summary_statistics, render_validation_report};

use crate::analyser::logic::health::quality_score;
use crate::analyser::logic::profiling::{
    ColumnProfile, NumericSummary, column_as_text, duplicate_examples, duplicate_row_count,
    profile_columns, summarise_numeric, total_missing, whitespace_count,
};
use crate::analyser::logic::types::{
    CleanOutcome, CleaningAction, IssueKind, QualityScore, ValidationIssue, ValidationReport,
};
use crate::error::Result;
use crate::utils::{percent, plural};
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::Serialize;

/// Number of duplicate rows shown as examples.
pub const DUPLICATE_EXAMPLES: usize = 5;

/// Everything a validation report is rendered from.
#[derive(Clone, Copy)]
pub struct ReportInput<'a> {
    pub file_name: &'a str,
    pub original: &'a DataFrame,
    pub validation: &'a ValidationReport,
    /// `None` in validate-only mode
    pub cleaned: Option<&'a CleanOutcome>,
    pub generated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize)]
pub struct ColumnFacts {
    pub profile: ColumnProfile,
    /// Present for numeric columns
    pub numeric: Option<NumericSummary>,
}

/// One row of the before/after comparison.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub metric: &'static str,
    pub before: usize,
    pub after: usize,
}

impl Comparison {
    pub fn change(&self) -> i64 {
        self.after as i64 - self.before as i64
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MissingColumn {
    pub column: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReportFacts {
    pub file_name: String,
    pub generated_at: String,
    pub rows: usize,
    pub columns: usize,
    pub memory_mb: f64,
    pub quality: QualityScore,
    pub column_facts: Vec<ColumnFacts>,
    /// Most missing first
    pub missing: Vec<MissingColumn>,
    pub duplicate_count: usize,
    pub duplicate_percent: f64,
    pub duplicate_headers: Vec<String>,
    pub duplicate_examples: Vec<Vec<String>>,
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub comparison: Option<Vec<Comparison>>,
    pub actions: Vec<CleaningAction>,
    pub recommendations: Vec<String>,
}

impl ReportFacts {
    pub fn gather(input: &ReportInput<'_>) -> Result<Self> {
        let df = input.original;
        let quality = quality_score(df, &input.validation.issues)?;

        let mut column_facts = Vec::with_capacity(df.width());
        for (profile, col) in profile_columns(df)?.into_iter().zip(df.get_columns()) {
            let numeric = if col.dtype().is_primitive_numeric() {
                Some(summarise_numeric(col)?)
            } else {
                None
            };
            column_facts.push(ColumnFacts { profile, numeric });
        }

        let mut missing: Vec<MissingColumn> = column_facts
            .iter()
            .filter(|c| c.profile.missing > 0)
            .map(|c| MissingColumn {
                column: c.profile.name.clone(),
                count: c.profile.missing,
                percent: percent(c.profile.missing, df.height()),
            })
            .collect();
        missing.sort_by(|a, b| b.count.cmp(&a.count));

        let duplicate_count = duplicate_row_count(df)?;

        let comparison = match input.cleaned {
            Some(outcome) => Some(compare(df, &outcome.data)?),
            None => None,
        };

        Ok(Self {
            file_name: input.file_name.to_owned(),
            generated_at: input.generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            rows: df.height(),
            columns: df.width(),
            memory_mb: df.estimated_size() as f64 / (1024.0 * 1024.0),
            quality,
            column_facts,
            missing,
            duplicate_count,
            duplicate_percent: percent(duplicate_count, df.height()),
            duplicate_headers: df
                .get_column_names()
                .iter()
                .map(|n| n.to_string())
                .collect(),
            duplicate_examples: duplicate_examples(df, DUPLICATE_EXAMPLES)?,
            is_valid: input.validation.is_valid,
            issues: input.validation.issues.clone(),
            comparison,
            actions: input
                .cleaned
                .map(|c| c.log.actions.clone())
                .unwrap_or_default(),
            recommendations: recommendations(df, &input.validation.issues)?,
        })
    }

    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_error()).count()
    }
}

fn compare(before: &DataFrame, after: &DataFrame) -> Result<Vec<Comparison>> {
    Ok(vec![
        Comparison {
            metric: "Rows",
            before: before.height(),
            after: after.height(),
        },
        Comparison {
            metric: "Columns",
            before: before.width(),
            after: after.width(),
        },
        Comparison {
            metric: "Missing Values",
            before: total_missing(before)?,
            after: total_missing(after)?,
        },
        Comparison {
            metric: "Duplicates",
            before: duplicate_row_count(before)?,
            after: duplicate_row_count(after)?,
        },
    ])
}

/// Suggested follow-ups, most severe first.
pub fn recommendations(df: &DataFrame, issues: &[ValidationIssue]) -> Result<Vec<String>> {
    let mut recs = Vec::new();
    let columns_with = |pred: fn(&IssueKind) -> bool| -> Vec<&str> {
        issues
            .iter()
            .filter(|i| pred(&i.kind))
            .filter_map(|i| i.column.as_deref())
            .collect()
    };

    let missing_required = columns_with(|k| matches!(k, IssueKind::MissingColumn));
    if !missing_required.is_empty() {
        recs.push(format!(
            "Add the missing required {}: {}",
            plural(missing_required.len(), "column", "columns"),
            missing_required.join(", ")
        ));
    }

    if duplicate_row_count(df)? > 0 {
        recs.push("Remove duplicate rows to ensure data uniqueness".to_owned());
    }

    let missing = columns_with(|k| matches!(k, IssueKind::MissingValues { .. }));
    if !missing.is_empty() {
        recs.push(format!(
            "Handle missing values in {} {}",
            missing.len(),
            plural(missing.len(), "column", "columns")
        ));
    }

    let empty = columns_with(|k| matches!(k, IssueKind::EmptyColumn));
    if !empty.is_empty() {
        recs.push(format!(
            "Remove {} completely empty {}",
            empty.len(),
            plural(empty.len(), "column", "columns")
        ));
    }

    let mut whitespace = false;
    for col in df.get_columns() {
        if whitespace_count(col)? > 0 {
            whitespace = true;
            break;
        }
    }
    if whitespace {
        recs.push("Trim whitespace from text columns".to_owned());
    }

    let mismatched = columns_with(|k| matches!(k, IssueKind::TypeMismatch { .. }));
    if !mismatched.is_empty() {
        recs.push(format!(
            "Convert {} to the declared {}",
            mismatched.join(", "),
            plural(mismatched.len(), "type", "types")
        ));
    }

    for col in df.get_columns() {
        if col.dtype().is_string() && looks_numeric(col)? {
            recs.push(format!("Consider converting '{}' to numeric type", col.name()));
            break;
        }
    }

    for column in columns_with(|k| matches!(k, IssueKind::OutOfRange { .. })) {
        recs.push(format!("Check out-of-range values in '{column}'"));
    }
    for column in columns_with(|k| matches!(k, IssueKind::PatternMismatch { .. })) {
        recs.push(format!("Review values in '{column}' that do not match the expected format"));
    }

    Ok(recs)
}

/// Every non-empty value parses as a number, and there is at least one.
fn looks_numeric(col: &Column) -> Result<bool> {
    let mut seen = false;
    for value in column_as_text(col)?.into_iter().flatten() {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if value.parse::<f64>().is_err() {
            return Ok(false);
        }
        seen = true;
    }
    Ok(seen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyser::logic::{CleanOptions, clean, validate};
    use crate::rules::RuleSet;

    pub(crate) fn sample() -> PolarsResult<DataFrame> {
        df!(
            "name" => &[Some("John Doe"), Some("Jane Smith"), Some("John Doe"), Some("Bob Wilson "), None],
            "age" => &[Some(30i64), Some(25), Some(30), Some(35), None],
            "zip" => &[Some("0101"), Some("2000"), Some("0101"), Some("3000"), Some("4000")]
        )
    }

    #[test]
    fn test_gather_facts() -> anyhow::Result<()> {
        let df = sample()?;
        let rules = RuleSet::new().with_required_columns(["email"]);
        let validation = validate(&df, &rules)?;
        let outcome = clean(&df, &CleanOptions::default(), &rules)?;
        let input = ReportInput {
            file_name: "people.csv",
            original: &df,
            validation: &validation,
            cleaned: Some(&outcome),
            generated_at: NaiveDateTime::default(),
        };
        let facts = ReportFacts::gather(&input)?;

        assert_eq!(facts.rows, 5);
        assert_eq!(facts.duplicate_count, 1);
        assert_eq!(facts.duplicate_examples.len(), 1);
        assert_eq!(facts.missing.len(), 2);
        assert!(!facts.is_valid);
        assert_eq!(facts.error_count(), 1);

        let comparison = facts.comparison.expect("cleaned frame present");
        assert_eq!(comparison[0].before, 5);
        assert_eq!(comparison[0].after, 4);
        assert_eq!(comparison[0].change(), -1);
        Ok(())
    }

    #[test]
    fn test_recommendations() -> anyhow::Result<()> {
        let df = sample()?;
        let rules = RuleSet::new().with_required_columns(["email"]);
        let validation = validate(&df, &rules)?;
        let recs = recommendations(&df, &validation.issues)?;

        assert_eq!(recs[0], "Add the missing required column: email");
        assert!(recs.contains(&"Remove duplicate rows to ensure data uniqueness".to_owned()));
        assert!(recs.contains(&"Handle missing values in 2 columns".to_owned()));
        assert!(recs.contains(&"Trim whitespace from text columns".to_owned()));
        assert!(recs.contains(&"Consider converting 'zip' to numeric type".to_owned()));
        Ok(())
    }

    #[test]
    fn test_clean_dataset_has_no_recommendations() -> anyhow::Result<()> {
        let df = df!("id" => &[1i64, 2], "name" => &["a", "b"])?;
        let validation = validate(&df, &RuleSet::new())?;
        assert!(recommendations(&df, &validation.issues)?.is_empty());
        Ok(())
    }
}
