//! Output formatter trait for CLI results.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use sz_core::Outcome;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format the result of one successfully processed input
    fn format_outcome(&self, input: &Path, outcome: &Outcome) -> Result<()>;

    /// Format the error of one failed input
    fn format_error(&self, input: &Path, error: &anyhow::Error);
}

/// JSON record printed for every input
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub input: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(input: &Path, outcome: &Outcome, data: Option<T>) -> Self {
        Self {
            input: input.display().to_string(),
            status: Status::Success,
            operation: Some(outcome.operation()),
            output: Some(outcome.output().display().to_string()),
            data,
            error: None,
        }
    }
}

impl JsonOutput<()> {
    pub fn error(input: &Path, error: impl Into<String>) -> Self {
        Self {
            input: input.display().to_string(),
            status: Status::Error,
            operation: None,
            output: None,
            data: None,
            error: Some(error.into()),
        }
    }
}
