//! Rule sets describing what a valid dataset looks like.
//!
//! A rule set is a JSON document; every key is optional:
//!
//! ```json
//! {
//!   "required_columns": ["name", "email"],
//!   "column_types": {"age": "integer", "joined": "datetime"},
//!   "numeric_ranges": {"age": {"min": 0, "max": 120}},
//!   "regex_patterns": {"email": "^[^@\\s]+@[^@\\s]+\\.[a-zA-Z]{2,}$"}
//! }
//! ```
//!
//! Patterns are compiled when the rule set is loaded, so an invalid pattern
//! is reported before any file is read.

use crate::analyser::logic::types::ColumnType;
use crate::error::{Result, TidyError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Inclusive bounds for a numeric column. Either side may be omitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl NumericRange {
    pub fn contains(&self, v: f64) -> bool {
        self.min.is_none_or(|lo| v >= lo) && self.max.is_none_or(|hi| v <= hi)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSet {
    #[serde(default)]
    pub required_columns: Vec<String>,

    #[serde(default)]
    pub column_types: BTreeMap<String, ColumnType>,

    #[serde(default)]
    pub numeric_ranges: BTreeMap<String, NumericRange>,

    #[serde(default)]
    pub regex_patterns: BTreeMap<String, String>,

    #[serde(skip)]
    compiled: BTreeMap<String, Regex>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a rule set from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TidyError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a rule set from a JSON string and compile its patterns
    pub fn from_json(json: &str) -> Result<Self> {
        let mut rules: Self = serde_json::from_str(json)?;
        rules.compile()?;
        Ok(rules)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Adds required columns, skipping ones already listed.
    pub fn with_required_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for column in columns {
            let column = column.into();
            if !column.is_empty() && !self.required_columns.contains(&column) {
                self.required_columns.push(column);
            }
        }
        self
    }

    pub fn with_type(mut self, column: &str, ty: ColumnType) -> Self {
        self.column_types.insert(column.to_owned(), ty);
        self
    }

    pub fn with_range(mut self, column: &str, min: Option<f64>, max: Option<f64>) -> Self {
        self.numeric_ranges
            .insert(column.to_owned(), NumericRange { min, max });
        self
    }

    pub fn with_pattern(mut self, column: &str, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)?;
        self.regex_patterns
            .insert(column.to_owned(), pattern.to_owned());
        self.compiled.insert(column.to_owned(), regex);
        Ok(self)
    }

    /// Compiled patterns in column-name order.
    pub fn patterns(&self) -> impl Iterator<Item = (&str, &Regex)> {
        self.compiled.iter().map(|(c, r)| (c.as_str(), r))
    }

    pub fn declared_type(&self, column: &str) -> Option<ColumnType> {
        self.column_types.get(column).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.required_columns.is_empty()
            && self.column_types.is_empty()
            && self.numeric_ranges.is_empty()
            && self.regex_patterns.is_empty()
    }

    fn compile(&mut self) -> Result<()> {
        self.compiled.clear();
        for (column, pattern) in &self.regex_patterns {
            let regex = Regex::new(pattern).map_err(|e| {
                TidyError::RuleSet(format!("pattern for column '{column}': {e}"))
            })?;
            self.compiled.insert(column.clone(), regex);
        }
        Ok(())
    }
}
