//! The cleaning pipeline.
//!
//! Steps run in a fixed order: trim, dedup, missing values, type
//! coercion, outliers, empty columns, column names. Each step returns a new
//! frame and records what it changed in the [`CleaningLog`]; a step that
//! changes nothing records nothing, so cleaning an already cleaned frame
//! with the same options yields an empty log. Outlier removal is the
//! exception: dropping rows moves the mean and deviation, so a second pass
//! may find new outliers.

use super::naming::standardise_column_names;
use super::profiling::{dedup_rows, is_empty_column, missing_count};
use super::types::{
    ActionKind, CleanOptions, CleanOutcome, CleaningLog, ColumnType, MissingStrategy,
};
use crate::error::Result;
use crate::rules::RuleSet;
use crate::utils::fmt_number;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use std::cmp::Ordering;

/// Formats tried after the configured one when parsing datetimes.
pub const FALLBACK_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Applies the cleaning pipeline and returns the new frame with its log.
///
/// Duplicates are removed once before filling and again whenever filling
/// or coercion changed values, because those steps can make distinct rows
/// identical. The output can therefore have fewer rows than the input minus
/// its initial duplicate count.
pub fn clean(df: &DataFrame, options: &CleanOptions, rules: &RuleSet) -> Result<CleanOutcome> {
    let mut log = CleaningLog::new();
    let mut data = df.clone();
    let fills = options.missing.is_some() || options.fill_text.is_some();

    if options.trim_whitespace {
        data = trim_whitespace(data, &mut log)?;
    }
    if options.drop_duplicates {
        data = drop_duplicates(data, &mut log)?;
    }

    // Filling and coercion can turn distinct rows into duplicates.
    let mut values_changed = false;
    if fills {
        let before = log.len();
        data = handle_missing(data, options, rules, &mut log)?;
        values_changed |= log.len() > before;
    }
    if options.coerce_types {
        let before = log.len();
        data = coerce_types(data, rules, &options.date_format, &mut log)?;
        if log.len() > before {
            values_changed = true;
            if fills {
                data = handle_missing(data, options, rules, &mut log)?;
            }
        }
    }
    if values_changed && options.drop_duplicates {
        data = drop_duplicates(data, &mut log)?;
    }

    if let Some(threshold) = options.outlier_std {
        data = remove_outliers(data, threshold, &mut log)?;
    }
    if options.drop_empty_columns {
        data = drop_empty_columns(data, &mut log)?;
    }
    if options.standardise_names {
        data = standardise_names(data, &mut log)?;
    }

    tracing::info!(
        "Cleaning finished: {} -> {} rows, {} actions",
        df.height(),
        data.height(),
        log.len()
    );
    Ok(CleanOutcome { data, log })
}

/// Strips leading/trailing whitespace from text cells; blank cells become null.
pub fn trim_whitespace(mut df: DataFrame, log: &mut CleaningLog) -> Result<DataFrame> {
    let text_columns: Vec<Column> = df
        .get_columns()
        .iter()
        .filter(|c| c.dtype().is_string())
        .cloned()
        .collect();

    for col in text_columns {
        let ca = col.as_materialized_series().str()?;
        let mut changed = 0;
        let trimmed: StringChunked = ca
            .into_iter()
            .map(|v| {
                let s = v?;
                let t = s.trim();
                if t.len() != s.len() || t.is_empty() {
                    changed += 1;
                }
                (!t.is_empty()).then_some(t)
            })
            .collect();

        if changed > 0 {
            df.with_column(trimmed.with_name(col.name().clone()).into_series())?;
            log.record(ActionKind::TrimmedWhitespace, Some(col.name().as_str()), changed);
        }
    }
    Ok(df)
}

/// Removes full-row duplicates, keeping the first occurrence.
pub fn drop_duplicates(df: DataFrame, log: &mut CleaningLog) -> Result<DataFrame> {
    if df.width() == 0 {
        return Ok(df);
    }
    let unique = dedup_rows(&df)?;
    log.record(
        ActionKind::RemovedDuplicates,
        None,
        df.height() - unique.height(),
    );
    Ok(unique)
}

/// Applies the configured missing-value strategy to every column.
///
/// Empty text cells count as missing. A blank that no fill replaces is
/// left as it was.
pub fn handle_missing(
    mut df: DataFrame,
    options: &CleanOptions,
    rules: &RuleSet,
    log: &mut CleaningLog,
) -> Result<DataFrame> {
    if options.missing == Some(MissingStrategy::Drop) {
        return drop_missing_rows(blanks_to_null(df)?, log);
    }

    let columns: Vec<Column> = df.get_columns().to_vec();
    for col in columns {
        if missing_count(&col)? == 0 {
            continue;
        }
        let original = col.as_materialized_series();
        let series = blanks_as_null(original)?;
        let declared = rules.declared_type(col.name());
        let Some(fill) = fill_column(&series, options, declared)? else {
            continue;
        };
        let filled = series.null_count() - fill.series.null_count();
        if filled == 0 {
            continue;
        }
        df.with_column(restore_blanks(original, fill.series)?)?;
        log.record(
            ActionKind::FilledMissing {
                strategy: fill.strategy,
                value: fill.value,
            },
            Some(col.name().as_str()),
            filled,
        );
    }
    Ok(df)
}

/// Empty text cells as nulls, so fills see them as missing.
fn blanks_as_null(series: &Series) -> Result<Series> {
    if !series.dtype().is_string() {
        return Ok(series.clone());
    }
    let out: StringChunked = series
        .str()?
        .into_iter()
        .map(|v| v.filter(|s| !s.is_empty()))
        .collect();
    Ok(out.with_name(series.name().clone()).into_series())
}

/// Puts back the empty strings that a fill left unfilled.
fn restore_blanks(original: &Series, filled: Series) -> Result<Series> {
    if !original.dtype().is_string() || !filled.dtype().is_string() {
        return Ok(filled);
    }
    let out: StringChunked = filled
        .str()?
        .into_iter()
        .zip(original.str()?)
        .map(|(f, o)| f.or(o))
        .collect();
    Ok(out.with_name(filled.name().clone()).into_series())
}

fn blanks_to_null(mut df: DataFrame) -> Result<DataFrame> {
    let text_columns: Vec<Column> = df
        .get_columns()
        .iter()
        .filter(|c| c.dtype().is_string())
        .cloned()
        .collect();

    for col in text_columns {
        if missing_count(&col)? == col.null_count() {
            continue;
        }
        let ca = col.as_materialized_series().str()?;
        let out: StringChunked = ca
            .into_iter()
            .map(|v| v.filter(|s| !s.is_empty()))
            .collect();
        df.with_column(out.with_name(col.name().clone()).into_series())?;
    }
    Ok(df)
}

fn drop_missing_rows(df: DataFrame, log: &mut CleaningLog) -> Result<DataFrame> {
    let mut keep = vec![true; df.height()];
    for col in df.get_columns() {
        let valid = col.as_materialized_series().is_not_null();
        for (k, v) in keep.iter_mut().zip(valid.into_iter()) {
            *k &= v.unwrap_or(false);
        }
    }
    let dropped = keep.iter().filter(|k| !**k).count();
    if dropped == 0 {
        return Ok(df);
    }
    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let out = df.filter(&mask)?;
    log.record(ActionKind::DroppedMissingRows, None, dropped);
    Ok(out)
}

struct Fill {
    series: Series,
    strategy: String,
    value: Option<String>,
}

impl Fill {
    fn new(series: Series, strategy: impl Into<String>, value: Option<String>) -> Self {
        Self {
            series,
            strategy: strategy.into(),
            value,
        }
    }
}

fn fill_column(
    series: &Series,
    options: &CleanOptions,
    declared: Option<ColumnType>,
) -> Result<Option<Fill>> {
    let dtype = series.dtype();

    match options.missing {
        Some(MissingStrategy::ForwardFill) => Ok(Some(Fill::new(
            series.fill_null(FillNullStrategy::Forward(None))?,
            "forward-fill",
            None,
        ))),
        Some(MissingStrategy::BackwardFill) => Ok(Some(Fill::new(
            series.fill_null(FillNullStrategy::Backward(None))?,
            "backward-fill",
            None,
        ))),
        Some(strategy @ (MissingStrategy::Mean | MissingStrategy::Median))
            if dtype.is_primitive_numeric() =>
        {
            let values = series.cast(&DataType::Float64)?;
            let ca = values.f64()?;
            let stat = if strategy == MissingStrategy::Mean {
                ca.mean()
            } else {
                ca.median()
            };
            let Some(stat) = stat else {
                return Ok(None);
            };
            let integer_target = match declared {
                Some(ty) => ty == ColumnType::Integer,
                None => dtype.is_integer(),
            };
            // Float columns declared integer keep their dtype until coercion.
            let (series, shown) = if integer_target && dtype.is_integer() {
                fill_numeric(series, stat, true)?
            } else if integer_target {
                fill_numeric(series, stat.round(), false)?
            } else {
                fill_numeric(series, stat, false)?
            };
            Ok(Some(Fill::new(series, strategy.as_str(), Some(shown))))
        }
        Some(MissingStrategy::Mode) => match fill_mode(series)? {
            Some((series, shown)) => Ok(Some(Fill::new(series, "mode", Some(shown)))),
            None => fill_text_default(series, options),
        },
        _ => fill_text_default(series, options),
    }
}

fn fill_text_default(series: &Series, options: &CleanOptions) -> Result<Option<Fill>> {
    let Some(text) = options.fill_text.as_deref() else {
        return Ok(None);
    };
    if !series.dtype().is_string() {
        return Ok(None);
    }
    let ca = series.str()?;
    let out: StringChunked = ca
        .into_iter()
        .map(|v| Some(v.unwrap_or(text)))
        .collect();
    Ok(Some(Fill::new(
        out.with_name(series.name().clone()).into_series(),
        "default",
        Some(format!("'{text}'")),
    )))
}

fn fill_numeric(series: &Series, stat: f64, as_integer: bool) -> Result<(Series, String)> {
    let name = series.name().clone();
    if as_integer {
        let fill = stat.round() as i64;
        let ints = series.cast(&DataType::Int64)?;
        let out: Int64Chunked = ints
            .i64()?
            .into_iter()
            .map(|v| Some(v.unwrap_or(fill)))
            .collect();
        Ok((out.with_name(name).into_series(), fill.to_string()))
    } else {
        let floats = series.cast(&DataType::Float64)?;
        let out: Float64Chunked = floats
            .f64()?
            .into_iter()
            .map(|v| Some(v.unwrap_or(stat)))
            .collect();
        Ok((out.with_name(name).into_series(), fmt_number(stat)))
    }
}

/// Most frequent value; among equally frequent values the smallest wins.
fn mode_of<T: Copy>(mut values: Vec<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Option<T> {
    values.sort_by(&cmp);
    let mut best: Option<(T, usize)> = None;
    for run in values.chunk_by(|a, b| cmp(a, b).is_eq()) {
        if let Some(&first) = run.first()
            && best.is_none_or(|(_, n)| run.len() > n)
        {
            best = Some((first, run.len()));
        }
    }
    best.map(|(v, _)| v)
}

fn fill_mode(series: &Series) -> Result<Option<(Series, String)>> {
    let name = series.name().clone();
    let dtype = series.dtype();

    if dtype.is_string() {
        let ca = series.str()?;
        let Some(mode) = mode_of(ca.into_iter().flatten().collect(), |a: &&str, b| a.cmp(b))
        else {
            return Ok(None);
        };
        let out: StringChunked = ca.into_iter().map(|v| Some(v.unwrap_or(mode))).collect();
        let shown = format!("'{mode}'");
        return Ok(Some((out.with_name(name).into_series(), shown)));
    }

    if dtype.is_bool() {
        let ca = series.bool()?;
        let Some(mode) = mode_of(ca.into_iter().flatten().collect(), bool::cmp) else {
            return Ok(None);
        };
        let out: BooleanChunked = ca.into_iter().map(|v| Some(v.unwrap_or(mode))).collect();
        return Ok(Some((out.with_name(name).into_series(), mode.to_string())));
    }

    if dtype.is_float() {
        let floats = series.cast(&DataType::Float64)?;
        let ca = floats.f64()?;
        let Some(mode) = mode_of(ca.into_iter().flatten().collect(), f64::total_cmp) else {
            return Ok(None);
        };
        let out: Float64Chunked = ca.into_iter().map(|v| Some(v.unwrap_or(mode))).collect();
        return Ok(Some((out.with_name(name).into_series(), fmt_number(mode))));
    }

    if dtype.is_integer() || dtype.is_temporal() {
        // Temporal columns take the mode of their physical integers.
        let physical = series.to_physical_repr();
        let ints = physical.cast(&DataType::Int64)?;
        let ca = ints.i64()?;
        let Some(mode) = mode_of(ca.into_iter().flatten().collect(), i64::cmp) else {
            return Ok(None);
        };
        let out: Int64Chunked = ca.into_iter().map(|v| Some(v.unwrap_or(mode))).collect();
        let mut out = out.with_name(name).into_series();
        let mut shown = mode.to_string();
        if dtype.is_temporal() {
            out = out.cast(physical.dtype())?.cast(dtype)?;
            let value = Int64Chunked::from_slice(PlSmallStr::EMPTY, &[mode])
                .into_series()
                .cast(physical.dtype())?
                .cast(dtype)?;
            shown = value.get(0)?.to_string();
        }
        return Ok(Some((out, shown)));
    }

    Ok(None)
}

/// Converts columns to their declared types. Cells that cannot be
/// converted become null and are counted on the action.
pub fn coerce_types(
    mut df: DataFrame,
    rules: &RuleSet,
    date_format: &str,
    log: &mut CleaningLog,
) -> Result<DataFrame> {
    for (name, target) in &rules.column_types {
        let Ok(col) = df.column(name) else {
            continue;
        };
        if target.matches_dtype(col.dtype()) {
            continue;
        }
        let before_missing = missing_count(col)?;
        let coerced = coerce_series(col.as_materialized_series(), *target, date_format)?;
        let nulled = coerced.null_count().saturating_sub(before_missing);
        if nulled > 0 {
            tracing::warn!("{nulled} values in '{name}' could not be converted to {target}");
        }
        df.with_column(coerced)?;
        log.record(
            ActionKind::CoercedType {
                target: *target,
                nulled,
            },
            Some(name.as_str()),
            nulled,
        );
    }
    Ok(df)
}

pub fn coerce_series(series: &Series, target: ColumnType, date_format: &str) -> Result<Series> {
    let name = series.name().clone();
    let dtype = series.dtype();

    let out = match target {
        ColumnType::String => series.cast(&DataType::String)?,
        ColumnType::Float if dtype.is_string() => {
            let out: Float64Chunked = series
                .str()?
                .into_iter()
                .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()))
                .collect();
            out.into_series()
        }
        ColumnType::Float => series.cast(&DataType::Float64)?,
        ColumnType::Integer if dtype.is_string() => {
            let out: Int64Chunked = series
                .str()?
                .into_iter()
                .map(|v| v.and_then(parse_integer))
                .collect();
            out.into_series()
        }
        ColumnType::Integer if dtype.is_float() => {
            let floats = series.cast(&DataType::Float64)?;
            let out: Int64Chunked = floats
                .f64()?
                .into_iter()
                .map(|v| v.and_then(whole_number))
                .collect();
            out.into_series()
        }
        ColumnType::Integer => series.cast(&DataType::Int64)?,
        ColumnType::Boolean if dtype.is_string() => {
            let out: BooleanChunked = series
                .str()?
                .into_iter()
                .map(|v| v.and_then(parse_bool))
                .collect();
            out.into_series()
        }
        ColumnType::Boolean if dtype.is_primitive_numeric() => {
            let floats = series.cast(&DataType::Float64)?;
            let out: BooleanChunked = floats
                .f64()?
                .into_iter()
                .map(|v| match v {
                    Some(x) if x == 1.0 => Some(true),
                    Some(x) if x == 0.0 => Some(false),
                    _ => None,
                })
                .collect();
            out.into_series()
        }
        ColumnType::Boolean => {
            BooleanChunked::full_null(name.clone(), series.len()).into_series()
        }
        ColumnType::Datetime if dtype.is_string() => {
            let millis: Int64Chunked = series
                .str()?
                .into_iter()
                .map(|v| v.and_then(|s| parse_datetime_millis(s, date_format)))
                .collect();
            millis
                .into_datetime(TimeUnit::Milliseconds, None)
                .into_series()
        }
        ColumnType::Datetime if dtype.is_temporal() => {
            series.cast(&ColumnType::Datetime.target_dtype())?
        }
        ColumnType::Datetime => Int64Chunked::full_null(name.clone(), series.len())
            .into_datetime(TimeUnit::Milliseconds, None)
            .into_series(),
    };

    Ok(out.with_name(name))
}

fn parse_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(whole_number))
}

fn whole_number(v: f64) -> Option<i64> {
    (v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15).then(|| v as i64)
}

/// Accepts `true/false/1/0/yes/no`, case-insensitive.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Milliseconds since the epoch, trying `date_format` first.
pub fn parse_datetime_millis(s: &str, date_format: &str) -> Option<i64> {
    let s = s.trim();
    std::iter::once(date_format)
        .chain(FALLBACK_DATE_FORMATS.iter().copied())
        .find_map(|fmt| {
            NaiveDateTime::parse_from_str(s, fmt)
                .or_else(|_| NaiveDate::parse_from_str(s, fmt).map(|d| d.and_time(NaiveTime::MIN)))
                .ok()
        })
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Drops rows whose numeric values lie more than `threshold` sample
/// standard deviations from their column mean. Columns are checked in order.
pub fn remove_outliers(mut df: DataFrame, threshold: f64, log: &mut CleaningLog) -> Result<DataFrame> {
    let numeric: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| c.dtype().is_primitive_numeric())
        .map(|c| c.name().to_string())
        .collect();

    for name in numeric {
        let values = df.column(&name)?.as_materialized_series().cast(&DataType::Float64)?;
        let ca = values.f64()?;
        let (Some(mean), Some(std)) = (ca.mean(), ca.std(1)) else {
            continue;
        };
        if std <= 0.0 || !std.is_finite() {
            continue;
        }
        let limit = threshold * std;
        let keep: Vec<bool> = ca
            .into_iter()
            .map(|v| v.is_none_or(|x| (x - mean).abs() <= limit))
            .collect();
        let removed = keep.iter().filter(|k| !**k).count();
        if removed == 0 {
            continue;
        }
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        df = df.filter(&mask)?;
        log.record(
            ActionKind::RemovedOutliers { threshold },
            Some(name.as_str()),
            removed,
        );
    }
    Ok(df)
}

pub fn drop_empty_columns(mut df: DataFrame, log: &mut CleaningLog) -> Result<DataFrame> {
    let mut empty = Vec::new();
    for col in df.get_columns() {
        if is_empty_column(col)? {
            empty.push(col.name().to_string());
        }
    }
    for name in empty {
        df = df.drop(&name)?;
        log.record(ActionKind::DroppedEmptyColumn, Some(name.as_str()), 0);
    }
    Ok(df)
}

pub fn standardise_names(mut df: DataFrame, log: &mut CleaningLog) -> Result<DataFrame> {
    let current: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    let renamed = standardise_column_names(&current);
    if renamed == current {
        return Ok(df);
    }

    for (from, to) in current.iter().zip(&renamed) {
        if from != to {
            log.record(
                ActionKind::RenamedColumn { to: to.clone() },
                Some(from.as_str()),
                0,
            );
        }
    }
    df.set_column_names(renamed.iter().map(String::as_str))?;
    Ok(df)
}
