//! Error type shared by the ctg crates.
//!
//! Parsing and comparison do not fail on bad data: malformed blocks fall back,
//! unparsable numbers become missing values and unknown case types yield empty
//! results. [`CtgError`] covers the names and raw exports that can still be
//! rejected: unknown case types or report formats, and unreadable export headers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CtgError {
    /// Input text that could not be read as the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unknown names in flags, configuration or plans
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type CtgResult<T> = Result<T, CtgError>;
