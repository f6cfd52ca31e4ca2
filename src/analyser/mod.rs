//! Validation, cleaning and profiling of in-memory datasets.

pub mod logic;
