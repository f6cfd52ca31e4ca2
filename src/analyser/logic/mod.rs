pub mod cleaning;
pub mod health;
pub mod io;
pub mod naming;
pub mod profiling;
pub mod types;
pub mod validation;

pub use cleaning::clean;
pub use health::quality_score;
pub use io::{InputEncoding, load_df, save_df};
pub use types::{
    ActionKind, CleanOptions, CleanOutcome, CleaningAction, CleaningLog, ColumnType, IssueKind,
    MissingStrategy, QualityScore, Severity, ValidationIssue, ValidationReport,
};
pub use validation::validate;
