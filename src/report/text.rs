//! Plain-text report rendering.

use super::{ReportFacts, ReportInput};
use crate::analyser::logic::profiling::{NumericSummary, summarise_numeric, top_values};
use crate::analyser::logic::types::CleaningLog;
use crate::error::Result;
use crate::utils::{fmt_opt, fmt_thousands};
use polars::prelude::*;

const WIDTH: usize = 80;
const TOP_VALUES: usize = 10;
const TEXT_COLUMNS: usize = 5;

fn rule(c: char) -> String {
    std::iter::repeat_n(c, WIDTH).collect()
}

fn section(out: &mut String, title: &str) {
    out.push_str(title);
    out.push('\n');
    out.push_str(&rule('-'));
    out.push('\n');
}

fn signed(n: i64) -> String {
    if n > 0 {
        format!("+{}", fmt_thousands(n.unsigned_abs() as usize))
    } else if n < 0 {
        format!("-{}", fmt_thousands(n.unsigned_abs() as usize))
    } else {
        "0".to_owned()
    }
}

/// Left-aligned table with column widths fitted to the content.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:<w$}"))
            .collect();
        padded.join("  ").trim_end().to_owned()
    };

    let mut out = line(headers);
    out.push('\n');
    for row in rows {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}

/// Full validation (and cleaning) report.
pub fn render_validation_report(input: &ReportInput<'_>) -> Result<String> {
    let facts = ReportFacts::gather(input)?;
    Ok(render_facts(&facts))
}

pub fn render_facts(facts: &ReportFacts) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\nDATA QUALITY VALIDATION REPORT\n{}\n\n", rule('='), rule('=')));
    out.push_str(&format!("File: {}\n", facts.file_name));
    out.push_str(&format!("Generated: {}\n\n", facts.generated_at));

    section(&mut out, "FILE STATISTICS");
    out.push_str(&format!("Total Rows:          {}\n", fmt_thousands(facts.rows)));
    out.push_str(&format!("Total Columns:       {}\n", facts.columns));
    out.push_str(&format!("Memory Usage:        {:.2} MB\n\n", facts.memory_mb));

    section(&mut out, "DATA QUALITY SUMMARY");
    out.push_str(&format!("Completeness:        {:.2}%\n", facts.quality.completeness));
    out.push_str(&format!("Uniqueness:          {:.2}%\n", facts.quality.uniqueness));
    out.push_str(&format!("Overall Score:       {:.1}/100\n", facts.quality.score));
    out.push_str(&format!("Assessment:          {}\n\n", facts.quality.assessment()));

    section(&mut out, "COLUMN ANALYSIS");
    for col in &facts.column_facts {
        let p = &col.profile;
        out.push_str(&format!("\n{}:\n", p.name));
        out.push_str(&format!("  Type:        {}\n", p.dtype));
        out.push_str(&format!("  Non-null:    {}\n", fmt_thousands(p.non_missing)));
        out.push_str(&format!("  Null:        {}\n", fmt_thousands(p.missing)));
        out.push_str(&format!("  Unique:      {}\n", fmt_thousands(p.unique)));
        if let Some(n) = &col.numeric {
            out.push_str(&format!("  Range:       {} to {}\n", fmt_opt(n.min), fmt_opt(n.max)));
            out.push_str(&format!("  Mean:        {}\n", fmt_opt(n.mean)));
        }
    }
    out.push('\n');

    section(&mut out, "MISSING VALUES ANALYSIS");
    if facts.missing.is_empty() {
        out.push_str("No missing values found\n\n");
    } else {
        out.push_str(&format!("Columns with missing values: {}\n\n", facts.missing.len()));
        out.push_str(&format!("{:<30} {:<15} {}\n", "Column", "Missing", "Percentage"));
        out.push_str(&rule('-'));
        out.push('\n');
        for m in &facts.missing {
            out.push_str(&format!(
                "{:<30} {:<15} {:.2}%\n",
                m.column,
                fmt_thousands(m.count),
                m.percent
            ));
        }
        out.push('\n');
    }

    section(&mut out, "DUPLICATE ANALYSIS");
    if facts.duplicate_count == 0 {
        out.push_str("No duplicate rows found\n\n");
    } else {
        out.push_str(&format!(
            "Found {} duplicate rows ({:.2}%)\n",
            fmt_thousands(facts.duplicate_count),
            facts.duplicate_percent
        ));
        if !facts.duplicate_examples.is_empty() {
            out.push_str("\nExample duplicate rows:\n");
            out.push_str(&render_table(&facts.duplicate_headers, &facts.duplicate_examples));
        }
        out.push('\n');
    }

    section(&mut out, "VALIDATION ISSUES");
    let errors = facts.error_count();
    let warnings = facts.issues.len() - errors;
    out.push_str(&format!(
        "Status: {} ({errors} errors, {warnings} warnings)\n",
        if facts.is_valid { "PASSED" } else { "FAILED" }
    ));
    for issue in &facts.issues {
        out.push_str(&format!("[{}] {issue}\n", issue.severity));
    }
    out.push('\n');

    if let Some(comparison) = &facts.comparison {
        section(&mut out, "CLEANING RESULTS");
        out.push_str(&format!("{:<30} {:<15} {:<15} {}\n", "Metric", "Before", "After", "Change"));
        out.push_str(&rule('-'));
        out.push('\n');
        for c in comparison {
            out.push_str(&format!(
                "{:<30} {:<15} {:<15} {}\n",
                c.metric,
                fmt_thousands(c.before),
                fmt_thousands(c.after),
                signed(c.change())
            ));
        }
        out.push('\n');

        if facts.actions.is_empty() {
            out.push_str("Actions: none\n\n");
        } else {
            out.push_str("Actions:\n");
            for (i, action) in facts.actions.iter().enumerate() {
                out.push_str(&format!("  {}. {action}\n", i + 1));
            }
            out.push('\n');
        }
    }

    section(&mut out, "RECOMMENDATIONS");
    if facts.recommendations.is_empty() {
        out.push_str("No major data quality issues detected\n");
    } else {
        for rec in &facts.recommendations {
            out.push_str(&format!("- {rec}\n"));
        }
    }
    out.push('\n');

    out.push_str(&format!("{}\nEND OF REPORT\n{}\n", rule('='), rule('=')));
    out
}

/// Describe table for numeric columns plus top values of text columns.
pub fn render_summary_statistics(df: &DataFrame) -> Result<String> {
    let mut out = format!("{}\nSUMMARY STATISTICS\n{}\n\n", rule('='), rule('='));

    let numeric: Vec<&Column> = df
        .get_columns()
        .iter()
        .filter(|c| c.dtype().is_primitive_numeric())
        .collect();
    if !numeric.is_empty() {
        out.push_str("Numeric Columns:\n");
        out.push_str(&rule('-'));
        out.push('\n');

        let summaries = numeric
            .iter()
            .map(|c| summarise_numeric(c))
            .collect::<Result<Vec<_>>>()?;

        let mut headers = vec![String::new()];
        headers.extend(summaries.iter().map(|s| s.name.clone()));

        let stat_rows: [(&str, fn(&NumericSummary) -> String); 8] = [
            ("count", |s| s.count.to_string()),
            ("mean", |s| fmt_opt(s.mean)),
            ("std", |s| fmt_opt(s.std)),
            ("min", |s| fmt_opt(s.min)),
            ("25%", |s| fmt_opt(s.q25)),
            ("50%", |s| fmt_opt(s.median)),
            ("75%", |s| fmt_opt(s.q75)),
            ("max", |s| fmt_opt(s.max)),
        ];
        let rows: Vec<Vec<String>> = stat_rows
            .iter()
            .map(|(label, get)| {
                let mut row = vec![(*label).to_owned()];
                row.extend(summaries.iter().map(get));
                row
            })
            .collect();
        out.push_str(&render_table(&headers, &rows));
        out.push('\n');
    }

    let text: Vec<&Column> = df
        .get_columns()
        .iter()
        .filter(|c| c.dtype().is_string())
        .take(TEXT_COLUMNS)
        .collect();
    if !text.is_empty() {
        out.push_str("Categorical Columns:\n");
        out.push_str(&rule('-'));
        out.push('\n');
        for col in text {
            out.push_str(&format!("\n{}:\n", col.name()));
            let top = top_values(col, TOP_VALUES)?;
            if top.is_empty() {
                out.push_str("  (no values)\n");
            }
            let width = top.iter().map(|(v, _)| v.chars().count()).max().unwrap_or(0);
            for (value, count) in top {
                out.push_str(&format!("  {value:<width$}  {count}\n"));
            }
        }
        out.push('\n');
    }

    if df.width() == 0 {
        out.push_str("No columns\n");
    }
    Ok(out)
}

/// Numbered list of the cleaner's actions.
pub fn render_cleaning_log(log: &CleaningLog) -> String {
    let mut out = format!("{}\nCLEANING LOG\n{}\n\n", rule('='), rule('='));
    if log.is_empty() {
        out.push_str("No changes were needed.\n");
        return out;
    }
    for (i, action) in log.iter().enumerate() {
        out.push_str(&format!("{}. {action}\n", i + 1));
    }
    out.push_str(&format!(
        "\nRows removed: {}\n",
        fmt_thousands(log.rows_removed())
    ));
    out
}
