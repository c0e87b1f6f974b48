//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::path::Path;
use sz_core::Outcome;

pub struct JsonFormatter;

/// Counters attached to archive and extract records.
#[derive(Debug, Serialize)]
struct EntryCounts {
    files: usize,
    directories: usize,
    symlinks: usize,
    hardlinks: usize,
    bytes: u64,
    duration_ms: u128,
}

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }

    fn counts(outcome: &Outcome) -> Option<EntryCounts> {
        match outcome {
            Outcome::Archived { build, .. } => Some(EntryCounts {
                files: build.files_added,
                directories: build.directories_added,
                symlinks: build.symlinks_added,
                hardlinks: build.hardlinks_added,
                bytes: build.bytes_written,
                duration_ms: build.duration.as_millis(),
            }),
            Outcome::Extracted { report, .. } => Some(EntryCounts {
                files: report.files_extracted,
                directories: report.directories_created,
                symlinks: report.symlinks_created,
                hardlinks: report.hardlinks_created,
                bytes: report.bytes_written,
                duration_ms: report.duration.as_millis(),
            }),
            Outcome::Compressed { .. } | Outcome::Decompressed { .. } => None,
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_outcome(&self, input: &Path, outcome: &Outcome) -> Result<()> {
        let output = JsonOutput::success(input, outcome, Self::counts(outcome));
        Self::output(&output)
    }

    fn format_error(&self, input: &Path, error: &anyhow::Error) {
        let output = JsonOutput::<()>::error(input, format!("{error:#}"));
        let _ = Self::output(&output);
    }
}
