//! # tidycsv - validation and cleaning for tabular data files
//!
//! tidycsv checks CSV and Excel files against a rule set, cleans them and
//! writes plain-text (and optionally HTML) data-quality reports.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use tidycsv::analyser::logic::{CleanOptions, InputEncoding, clean, load_df, validate};
//! use tidycsv::rules::RuleSet;
//!
//! let df = load_df(Path::new("data.csv"), InputEncoding::UTF8)?;
//! let rules = RuleSet::new().with_required_columns(["name", "email"]);
//!
//! let report = validate(&df, &rules)?;
//! println!("valid: {} ({} issues)", report.is_valid, report.issues.len());
//!
//! let outcome = clean(&df, &CleanOptions::default(), &rules)?;
//! for action in outcome.log.iter() {
//!     println!("{action}");
//! }
//! # Ok::<(), tidycsv::error::TidyError>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`analyser`]: loading, profiling, validation, cleaning and scoring
//!   - [`analyser::logic`]: the algorithms, all over polars `DataFrame`s
//! - [`rules`]: the JSON rule set a dataset is validated against
//! - [`report`]: text and HTML reports, summary statistics
//! - [`pipeline`]: per-file and multi-file runs that write the outputs
//! - [`logging`]: tracing setup for the run log
//! - [`error`]: the crate error type
//! - [`utils`]: number formatting helpers
//!
//! Every cleaning step returns a new frame; the input frame is never
//! modified, so reports can always compare before and after.

#![warn(clippy::all, rust_2018_idioms)]

pub mod analyser;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod utils;
