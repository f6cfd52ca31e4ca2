use polars::prelude::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::{fmt_number, plural};

/// Declared type of a column in a rule set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[serde(alias = "int")]
    Integer,
    #[serde(alias = "double")]
    Float,
    #[serde(alias = "text")]
    String,
    #[serde(alias = "bool")]
    Boolean,
    #[serde(alias = "date")]
    Datetime,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Datetime => "datetime",
        }
    }

    /// Whether an inferred dtype satisfies this declaration.
    pub fn matches_dtype(self, dtype: &DataType) -> bool {
        match self {
            Self::Integer => dtype.is_integer(),
            Self::Float => dtype.is_float(),
            Self::String => dtype.is_string(),
            Self::Boolean => dtype.is_bool(),
            Self::Datetime => matches!(dtype, DataType::Date | DataType::Datetime(_, _)),
        }
    }

    /// Polars dtype a column is coerced into.
    pub fn target_dtype(self) -> DataType {
        match self {
            Self::Integer => DataType::Int64,
            Self::Float => DataType::Float64,
            Self::String => DataType::String,
            Self::Boolean => DataType::Boolean,
            Self::Datetime => {
                DataType::Datetime(polars::prelude::TimeUnit::Milliseconds, None)
            }
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Friendly name of an inferred dtype, used in type-mismatch messages.
pub fn dtype_label(dtype: &DataType) -> String {
    if dtype.is_integer() {
        "integer".to_owned()
    } else if dtype.is_float() {
        "float".to_owned()
    } else if dtype.is_string() {
        "string".to_owned()
    } else if dtype.is_bool() {
        "boolean".to_owned()
    } else if matches!(dtype, DataType::Date | DataType::Datetime(_, _)) {
        "datetime".to_owned()
    } else {
        dtype.to_string()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("ERROR"),
            Self::Warning => f.write_str("WARNING"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum IssueKind {
    EmptyDataset,
    MissingColumn,
    TypeMismatch {
        expected: ColumnType,
        actual: String,
    },
    DuplicateRows {
        percent: f64,
    },
    MissingValues {
        percent: f64,
    },
    EmptyColumn,
    Whitespace,
    OutOfRange {
        min: Option<f64>,
        max: Option<f64>,
    },
    PatternMismatch {
        pattern: String,
    },
}

impl IssueKind {
    /// Cells counted against the quality score as invalid values.
    pub fn is_invalid_value(&self) -> bool {
        matches!(self, Self::OutOfRange { .. } | Self::PatternMismatch { .. })
    }
}

/// One finding of the validator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub column: Option<String>,
    pub kind: IssueKind,
    pub count: usize,
    pub severity: Severity,
}

impl ValidationIssue {
    pub fn dataset(kind: IssueKind, count: usize, severity: Severity) -> Self {
        Self {
            column: None,
            kind,
            count,
            severity,
        }
    }

    pub fn column(column: &str, kind: IssueKind, count: usize, severity: Severity) -> Self {
        Self {
            column: Some(column.to_owned()),
            kind,
            count,
            severity,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let column = self.column.as_deref().unwrap_or("");
        let n = self.count;
        match &self.kind {
            IssueKind::EmptyDataset => write!(f, "Dataset is empty"),
            IssueKind::MissingColumn => write!(f, "Missing required column: {column}"),
            IssueKind::TypeMismatch { expected, actual } => write!(
                f,
                "Column '{column}' type mismatch: expected {expected}, got {actual}"
            ),
            IssueKind::DuplicateRows { percent } => write!(
                f,
                "Found {n} duplicate {} ({percent:.2}%)",
                plural(n, "row", "rows")
            ),
            IssueKind::MissingValues { percent } => write!(
                f,
                "Column '{column}' has {n} missing {} ({percent:.2}%)",
                plural(n, "value", "values")
            ),
            IssueKind::EmptyColumn => write!(f, "Column '{column}' is completely empty"),
            IssueKind::Whitespace => write!(
                f,
                "Column '{column}' has {n} {} with leading/trailing whitespace",
                plural(n, "value", "values")
            ),
            IssueKind::OutOfRange { min, max } => {
                let bounds = match (min, max) {
                    (Some(lo), Some(hi)) => {
                        format!("[{}, {}]", fmt_number(*lo), fmt_number(*hi))
                    }
                    (Some(lo), None) => format!(">= {}", fmt_number(*lo)),
                    (None, Some(hi)) => format!("<= {}", fmt_number(*hi)),
                    (None, None) => "any".to_owned(),
                };
                write!(
                    f,
                    "Column '{column}' has {n} {} outside {bounds}",
                    plural(n, "value", "values")
                )
            }
            IssueKind::PatternMismatch { pattern } => write!(
                f,
                "Column '{column}' has {n} {} not matching pattern {pattern}",
                plural(n, "value", "values")
            ),
        }
    }
}

/// Outcome of validating one dataset.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub rows: usize,
    pub columns: usize,
}

impl ValidationReport {
    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count()
    }

    pub fn issues_for(&self, column: &str) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(move |i| i.column.as_deref() == Some(column))
    }
}

/// How missing cells are handled by the cleaner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingStrategy {
    Drop,
    Mean,
    Median,
    Mode,
    ForwardFill,
    BackwardFill,
}

impl MissingStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Drop => "drop",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Mode => "mode",
            Self::ForwardFill => "forward-fill",
            Self::BackwardFill => "backward-fill",
        }
    }
}

impl fmt::Display for MissingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Switches for the cleaning pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CleanOptions {
    pub trim_whitespace: bool,
    pub drop_duplicates: bool,
    pub missing: Option<MissingStrategy>,
    /// Literal default for text columns
    pub fill_text: Option<String>,
    pub coerce_types: bool,
    /// Drop rows more than this many standard deviations from the mean
    pub outlier_std: Option<f64>,
    pub drop_empty_columns: bool,
    pub standardise_names: bool,
    pub date_format: String,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            trim_whitespace: true,
            drop_duplicates: true,
            missing: None,
            fill_text: None,
            coerce_types: true,
            outlier_std: None,
            drop_empty_columns: true,
            standardise_names: true,
            date_format: "%Y-%m-%d".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ActionKind {
    TrimmedWhitespace,
    RemovedDuplicates,
    DroppedMissingRows,
    FilledMissing {
        strategy: String,
        value: Option<String>,
    },
    CoercedType {
        target: ColumnType,
        nulled: usize,
    },
    RemovedOutliers {
        threshold: f64,
    },
    DroppedEmptyColumn,
    RenamedColumn {
        to: String,
    },
}

/// One change made by the cleaner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CleaningAction {
    pub kind: ActionKind,
    pub column: Option<String>,
    pub count: usize,
}

impl fmt::Display for CleaningAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let column = self.column.as_deref().unwrap_or("");
        let n = self.count;
        match &self.kind {
            ActionKind::TrimmedWhitespace => write!(
                f,
                "trimmed whitespace in {n} {} of {column}",
                plural(n, "value", "values")
            ),
            ActionKind::RemovedDuplicates => {
                write!(f, "removed {n} duplicate {}", plural(n, "row", "rows"))
            }
            ActionKind::DroppedMissingRows => write!(
                f,
                "dropped {n} {} with missing values",
                plural(n, "row", "rows")
            ),
            ActionKind::FilledMissing { strategy, value } => {
                write!(
                    f,
                    "filled {n} missing {} in {column} with {strategy}",
                    plural(n, "value", "values")
                )?;
                if let Some(v) = value {
                    write!(f, " ({v})")?;
                }
                Ok(())
            }
            ActionKind::CoercedType { target, nulled } => {
                write!(f, "converted {column} to {target}")?;
                if *nulled > 0 {
                    write!(
                        f,
                        ", {nulled} unconvertible {} set to missing",
                        plural(*nulled, "value", "values")
                    )?;
                }
                Ok(())
            }
            ActionKind::RemovedOutliers { threshold } => write!(
                f,
                "removed {n} outlier {} in {column} (more than {} std from mean)",
                plural(n, "row", "rows"),
                fmt_number(*threshold)
            ),
            ActionKind::DroppedEmptyColumn => write!(f, "dropped empty column {column}"),
            ActionKind::RenamedColumn { to } => write!(f, "renamed column {column} to {to}"),
        }
    }
}

/// Ordered record of everything the cleaner changed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CleaningLog {
    pub actions: Vec<CleaningAction>,
}

impl CleaningLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an action; zero-count row/value actions are skipped.
    pub fn record(&mut self, kind: ActionKind, column: Option<&str>, count: usize) {
        let structural = matches!(
            kind,
            ActionKind::CoercedType { .. }
                | ActionKind::DroppedEmptyColumn
                | ActionKind::RenamedColumn { .. }
        );
        if count == 0 && !structural {
            return;
        }
        tracing::debug!(?kind, column, count, "cleaning action");
        self.actions.push(CleaningAction {
            kind,
            column: column.map(str::to_owned),
            count,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CleaningAction> {
        self.actions.iter()
    }

    /// Total rows removed by dedup, drop-missing and outlier steps.
    pub fn rows_removed(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| {
                matches!(
                    a.kind,
                    ActionKind::RemovedDuplicates
                        | ActionKind::DroppedMissingRows
                        | ActionKind::RemovedOutliers { .. }
                )
            })
            .map(|a| a.count)
            .sum()
    }
}

/// Cleaned data plus the log of changes.
#[derive(Clone, Debug)]
pub struct CleanOutcome {
    pub data: polars::prelude::DataFrame,
    pub log: CleaningLog,
}

/// 0-100 data quality score with its components.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub score: f64,
    pub completeness: f64,
    pub uniqueness: f64,
}

impl QualityScore {
    pub fn assessment(&self) -> &'static str {
        if self.score >= 90.0 {
            "EXCELLENT"
        } else if self.score >= 75.0 {
            "GOOD"
        } else if self.score >= 60.0 {
            "FAIR"
        } else {
            "NEEDS IMPROVEMENT"
        }
    }
}
