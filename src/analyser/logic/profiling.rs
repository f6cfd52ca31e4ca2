//! Column and row statistics shared by the validator, cleaner and reports.
//!
//! A cell is *missing* when it is null, or an empty string in a text
//! column. Row identity for duplicate detection compares every column.

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

const NULL_KEY: &str = "\u{0}";
const FIELD_SEP: char = '\u{1f}';

/// Null cells plus empty strings.
pub fn missing_count(col: &Column) -> Result<usize> {
    let nulls = col.null_count();
    if !col.dtype().is_string() {
        return Ok(nulls);
    }
    let ca = col.as_materialized_series().str()?;
    let empty = ca.into_iter().flatten().filter(|v| v.is_empty()).count();
    Ok(nulls + empty)
}

pub fn total_missing(df: &DataFrame) -> Result<usize> {
    let mut total = 0;
    for col in df.get_columns() {
        total += missing_count(col)?;
    }
    Ok(total)
}

/// Whether every cell of the column is missing. Zero-row columns are not
/// considered empty.
pub fn is_empty_column(col: &Column) -> Result<bool> {
    Ok(!col.is_empty() && missing_count(col)? == col.len())
}

/// Text values with leading or trailing whitespace.
pub fn whitespace_count(col: &Column) -> Result<usize> {
    if !col.dtype().is_string() {
        return Ok(0);
    }
    let ca = col.as_materialized_series().str()?;
    Ok(ca
        .into_iter()
        .flatten()
        .filter(|v| v.trim() != *v)
        .count())
}

/// Rows identical to an earlier row, excluding the first occurrence.
pub fn duplicate_row_count(df: &DataFrame) -> Result<usize> {
    if df.width() == 0 || df.height() < 2 {
        return Ok(0);
    }
    let unique = dedup_rows(df)?;
    Ok(df.height() - unique.height())
}

/// Keeps the first occurrence of every full-row duplicate, preserving order.
pub fn dedup_rows(df: &DataFrame) -> Result<DataFrame> {
    let unique = df
        .clone()
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;
    Ok(unique)
}

/// Renders every column as text; nulls stay `None`.
pub fn column_as_text(col: &Column) -> Result<Vec<Option<String>>> {
    let series = col.as_materialized_series().cast(&DataType::String)?;
    let ca = series.str()?;
    Ok(ca.into_iter().map(|v| v.map(str::to_owned)).collect())
}

/// Up to `limit` rows that repeat an earlier row, as text cells.
pub fn duplicate_examples(df: &DataFrame, limit: usize) -> Result<Vec<Vec<String>>> {
    if limit == 0 || df.width() == 0 {
        return Ok(Vec::new());
    }

    let columns: Vec<Vec<Option<String>>> = df
        .get_columns()
        .iter()
        .map(column_as_text)
        .collect::<Result<_>>()?;

    let mut seen = HashSet::new();
    let mut examples = Vec::new();
    for row in 0..df.height() {
        let cells: Vec<Option<&str>> = columns.iter().map(|c| c[row].as_deref()).collect();
        let key = cells
            .iter()
            .map(|c| c.unwrap_or(NULL_KEY))
            .collect::<Vec<_>>()
            .join(&FIELD_SEP.to_string());
        if !seen.insert(key) {
            examples.push(cells.iter().map(|c| c.unwrap_or("").to_owned()).collect());
            if examples.len() == limit {
                break;
            }
        }
    }
    Ok(examples)
}

/// Per-column overview used by the report's column analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: String,
    pub non_missing: usize,
    pub missing: usize,
    pub unique: usize,
}

pub fn profile_columns(df: &DataFrame) -> Result<Vec<ColumnProfile>> {
    df.get_columns()
        .iter()
        .map(|col| {
            let missing = missing_count(col)?;
            Ok(ColumnProfile {
                name: col.name().to_string(),
                dtype: col.dtype().to_string(),
                non_missing: col.len() - missing,
                missing,
                unique: col.as_materialized_series().n_unique()?,
            })
        })
        .collect()
}

/// Describe-style statistics for one numeric column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub name: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

pub fn summarise_numeric(col: &Column) -> Result<NumericSummary> {
    let series = col.as_materialized_series().cast(&DataType::Float64)?;
    let ca = series.f64()?;

    Ok(NumericSummary {
        name: col.name().to_string(),
        count: ca.len() - ca.null_count(),
        mean: ca.mean(),
        std: ca.std(1),
        min: ca.min(),
        q25: ca.quantile(0.25, QuantileMethod::Linear)?,
        median: ca.median(),
        q75: ca.quantile(0.75, QuantileMethod::Linear)?,
        max: ca.max(),
    })
}

/// Most frequent non-missing values, ties broken by value.
pub fn top_values(col: &Column, n: usize) -> Result<Vec<(String, usize)>> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in column_as_text(col)?.into_iter().flatten() {
        if !value.is_empty() {
            *counts.entry(value).or_default() += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> PolarsResult<DataFrame> {
        df!(
            "name" => &[Some("John"), Some("John"), Some("Jane"), Some(""), None],
            "age" => &[Some(30i64), Some(30), Some(25), None, None]
        )
    }

    #[test]
    fn test_missing_counts_null_and_empty() -> anyhow::Result<()> {
        let df = people()?;
        assert_eq!(missing_count(df.column("name")?)?, 2);
        assert_eq!(missing_count(df.column("age")?)?, 2);
        assert_eq!(total_missing(&df)?, 4);
        Ok(())
    }

    #[test]
    fn test_duplicate_count_excludes_first() -> anyhow::Result<()> {
        let df = df!(
            "name" => &["John", "John", "Jane", "John"],
            "age" => &[30i64, 30, 25, 30]
        )?;
        assert_eq!(duplicate_row_count(&df)?, 2);

        let examples = duplicate_examples(&df, 5)?;
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0], vec!["John".to_owned(), "30".to_owned()]);
        Ok(())
    }

    #[test]
    fn test_null_rows_compare_equal() -> anyhow::Result<()> {
        let df = df!("a" => &[None::<i64>, None], "b" => &[Some("x"), Some("x")])?;
        assert_eq!(duplicate_row_count(&df)?, 1);
        Ok(())
    }

    #[test]
    fn test_whitespace_and_empty_column() -> anyhow::Result<()> {
        let df = df!(
            "city" => &[" Paris", "Rome", "Oslo "],
            "blank" => &[None::<&str>, Some(""), None]
        )?;
        assert_eq!(whitespace_count(df.column("city")?)?, 2);
        assert!(is_empty_column(df.column("blank")?)?);
        assert!(!is_empty_column(df.column("city")?)?);
        Ok(())
    }

    #[test]
    fn test_numeric_summary() -> anyhow::Result<()> {
        let df = df!("x" => &[1.0f64, 2.0, 3.0, 4.0, 5.0])?;
        let s = summarise_numeric(df.column("x")?)?;
        assert_eq!(s.count, 5);
        assert_eq!(s.mean, Some(3.0));
        assert_eq!(s.median, Some(3.0));
        assert_eq!(s.q25, Some(2.0));
        assert_eq!(s.max, Some(5.0));
        Ok(())
    }

    #[test]
    fn test_top_values_ranking() -> anyhow::Result<()> {
        let df = df!("c" => &["b", "a", "b", "c", "a", "b"])?;
        let top = top_values(df.column("c")?, 2)?;
        assert_eq!(top, vec![("b".to_owned(), 3), ("a".to_owned(), 2)]);
        Ok(())
    }

    #[test]
    fn test_profile_columns() -> anyhow::Result<()> {
        let profiles = profile_columns(&people()?)?;
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[1].name, "age");
        assert_eq!(profiles[1].missing, 2);
        assert_eq!(profiles[1].non_missing, 3);
        Ok(())
    }
}
