use super::profiling::{duplicate_row_count, total_missing};
use super::types::{IssueKind, QualityScore, ValidationIssue};
use crate::error::Result;
use crate::utils::percent;
use polars::prelude::DataFrame;

const MISSING_PENALTY_CAP: f64 = 30.0;
const DUPLICATE_PENALTY_CAP: f64 = 20.0;
const INVALID_PENALTY_CAP: f64 = 20.0;
const EMPTY_COLUMN_PENALTY: f64 = 5.0;
const WHITESPACE_COLUMN_PENALTY: f64 = 2.0;

/// Scores a dataset from 0 to 100.
///
/// Missing cells and duplicate rows are measured on `df`; empty-column,
/// whitespace and invalid-value penalties come from `issues`.
pub fn quality_score(df: &DataFrame, issues: &[ValidationIssue]) -> Result<QualityScore> {
    let cells = df.height() * df.width();
    let missing_pct = percent(total_missing(df)?, cells);
    let duplicate_pct = percent(duplicate_row_count(df)?, df.height());

    let empty_columns = issues
        .iter()
        .filter(|i| i.kind == IssueKind::EmptyColumn)
        .count();
    let whitespace_columns = issues
        .iter()
        .filter(|i| i.kind == IssueKind::Whitespace)
        .count();
    let invalid_cells: usize = issues
        .iter()
        .filter(|i| i.kind.is_invalid_value())
        .map(|i| i.count)
        .sum();

    let mut score = 100.0;
    score -= missing_pct.min(MISSING_PENALTY_CAP);
    score -= duplicate_pct.min(DUPLICATE_PENALTY_CAP);
    score -= EMPTY_COLUMN_PENALTY * empty_columns as f64;
    score -= WHITESPACE_COLUMN_PENALTY * whitespace_columns as f64;
    score -= percent(invalid_cells, cells).min(INVALID_PENALTY_CAP);

    let (completeness, uniqueness) = if cells == 0 {
        (0.0, 0.0)
    } else {
        (100.0 - missing_pct, 100.0 - duplicate_pct)
    };

    Ok(QualityScore {
        score: score.clamp(0.0, 100.0),
        completeness,
        uniqueness,
    })
}
