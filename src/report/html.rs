//! Self-contained HTML quality report.
//!
//! The page is a handlebars template rendered from the serialised
//! [`ReportFacts`]; handlebars escapes every `{{value}}`, so file names,
//! column names and cell values cannot inject markup.

use super::{ReportFacts, ReportInput};
use crate::error::Result;
use crate::utils::{fmt_opt, fmt_thousands};
use handlebars::{Handlebars, handlebars_helper};
use serde::Serialize;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Data Quality Report: {{file_name}}</title>
<style>
body{font-family:system-ui,sans-serif;margin:2rem auto;max-width:960px;color:#222}
h1{border-bottom:3px solid #333;padding-bottom:.3rem}
h2{margin-top:2rem;border-bottom:1px solid #ccc}
table{border-collapse:collapse;margin:.5rem 0}
th,td{border:1px solid #ddd;padding:.3rem .6rem;text-align:left}
th{background:#f3f3f3}
.score{font-size:2rem;font-weight:bold}
.error{color:#b00020}.warning{color:#a15c00}.ok{color:#1b7f3a}
</style>
</head>
<body>
<h1>Data Quality Report: {{file_name}}</h1>
<p>Generated: {{generated_at}}</p>

<h2>File Statistics</h2>
<table>
<tr><th>Metric</th><th>Value</th></tr>
<tr><td>Total Rows</td><td>{{thousands rows}}</td></tr>
<tr><td>Total Columns</td><td>{{columns}}</td></tr>
<tr><td>Memory Usage</td><td>{{fixed memory_mb 2}} MB</td></tr>
</table>

<h2>Data Quality Summary</h2>
<p class="score">{{fixed quality.score 1}}/100 &mdash; {{assessment}}</p>
<table>
<tr><th>Metric</th><th>Value</th></tr>
<tr><td>Completeness</td><td>{{fixed quality.completeness 2}}%</td></tr>
<tr><td>Uniqueness</td><td>{{fixed quality.uniqueness 2}}%</td></tr>
</table>

<h2>Column Analysis</h2>
<table>
<tr><th>Column</th><th>Type</th><th>Non-null</th><th>Null</th><th>Unique</th><th>Range</th><th>Mean</th></tr>
{{#each column_facts}}
<tr><td>{{profile.name}}</td><td>{{profile.dtype}}</td><td>{{thousands profile.non_missing}}</td><td>{{thousands profile.missing}}</td><td>{{thousands profile.unique}}</td><td>{{#if numeric}}{{opt numeric.min}} to {{opt numeric.max}}{{/if}}</td><td>{{#if numeric}}{{opt numeric.mean}}{{/if}}</td></tr>
{{/each}}
</table>

<h2>Missing Values</h2>
{{#if missing}}
<table>
<tr><th>Column</th><th>Missing</th><th>Percentage</th></tr>
{{#each missing}}
<tr><td>{{column}}</td><td>{{thousands count}}</td><td>{{fixed percent 2}}%</td></tr>
{{/each}}
</table>
{{else}}
<p class="ok">No missing values found</p>
{{/if}}

<h2>Duplicates</h2>
{{#if duplicate_count}}
<p class="warning">Found {{thousands duplicate_count}} duplicate rows ({{fixed duplicate_percent 2}}%)</p>
<table>
<tr>{{#each duplicate_headers}}<th>{{this}}</th>{{/each}}</tr>
{{#each duplicate_examples}}
<tr>{{#each this}}<td>{{this}}</td>{{/each}}</tr>
{{/each}}
</table>
{{else}}
<p class="ok">No duplicate rows found</p>
{{/if}}

<h2>Validation Issues</h2>
{{#if is_valid}}
<p class="ok">PASSED</p>
{{else}}
<p class="error">FAILED ({{error_count}} errors)</p>
{{/if}}
{{#if issue_lines}}
<ul>
{{#each issue_lines}}
<li class="{{class}}">[{{severity}}] {{text}}</li>
{{/each}}
</ul>
{{/if}}
{{#if comparison}}

<h2>Cleaning Results</h2>
<table>
<tr><th>Metric</th><th>Before</th><th>After</th><th>Change</th></tr>
{{#each comparison}}
<tr><td>{{metric}}</td><td>{{thousands before}}</td><td>{{thousands after}}</td><td>{{change before after}}</td></tr>
{{/each}}
</table>
{{#if action_lines}}
<ol>
{{#each action_lines}}
<li>{{this}}</li>
{{/each}}
</ol>
{{/if}}
{{/if}}

<h2>Recommendations</h2>
{{#if recommendations}}
<ul>
{{#each recommendations}}
<li>{{this}}</li>
{{/each}}
</ul>
{{else}}
<p class="ok">No major data quality issues detected</p>
{{/if}}
</body>
</html>
"#;

handlebars_helper!(thousands: |n: u64| fmt_thousands(n as usize));
handlebars_helper!(fixed: |v: f64, digits: u64| format!("{v:.prec$}", prec = digits as usize));
handlebars_helper!(opt: |v: Json| fmt_opt(v.as_f64()));
handlebars_helper!(change: |before: i64, after: i64| format!("{:+}", after - before));

#[derive(Serialize)]
struct IssueLine {
    class: &'static str,
    severity: String,
    text: String,
}

/// Template context: the facts plus the values that are methods or
/// `Display` output on the Rust side.
#[derive(Serialize)]
struct Context<'a> {
    #[serde(flatten)]
    facts: &'a ReportFacts,
    assessment: &'static str,
    error_count: usize,
    issue_lines: Vec<IssueLine>,
    action_lines: Vec<String>,
}

pub fn render_html_report(input: &ReportInput<'_>) -> Result<String> {
    let facts = ReportFacts::gather(input)?;
    render_facts(&facts)
}

pub fn render_facts(facts: &ReportFacts) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_helper("thousands", Box::new(thousands));
    handlebars.register_helper("fixed", Box::new(fixed));
    handlebars.register_helper("opt", Box::new(opt));
    handlebars.register_helper("change", Box::new(change));

    let context = Context {
        facts,
        assessment: facts.quality.assessment(),
        error_count: facts.error_count(),
        issue_lines: facts
            .issues
            .iter()
            .map(|issue| IssueLine {
                class: if issue.is_error() { "error" } else { "warning" },
                severity: issue.severity.to_string(),
                text: issue.to_string(),
            })
            .collect(),
        action_lines: facts.actions.iter().map(ToString::to_string).collect(),
    };
    Ok(handlebars.render_template(TEMPLATE, &context)?)
}
