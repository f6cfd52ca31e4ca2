//! Orchestration of a validation and cleaning run.
//!
//! A run loads each input file, validates it against a [`RuleSet`],
//! cleans it (unless the run is validate-only) and writes the cleaned data
//! and reports to the output directory:
//!
//! | File | Written when |
//! |---|---|
//! | `cleaned_<stem>.csv` | cleaning ran |
//! | `report_<stem>.txt` | cleaning ran |
//! | `validation_<stem>.txt` | validate-only |
//! | `stats_<stem>.txt` | cleaning ran |
//! | `cleaning_log_<stem>.txt` | cleaning ran |
//! | `report_<stem>.html` | `html` is set |
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use tidycsv::pipeline::{RunConfig, process_file};
//!
//! let config = RunConfig::new(PathBuf::from("data.csv"), PathBuf::from("output"));
//! let outcome = process_file(&config.input, &config)?;
//! println!("{}", outcome.summary());
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! A directory input is handled by [`run_batch`], which processes every
//! supported file in sorted order and keeps going when one of them fails.
//!
//! [`RuleSet`]: crate::rules::RuleSet

pub mod batch;
pub mod executor;

pub use batch::{BatchEvent, BatchSummary, collect_input_files, run_batch};
pub use executor::{FileOutcome, RunConfig, process_file};
