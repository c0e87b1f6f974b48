//! Error conversion utilities for CLI.
//!
//! Converts sz-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) that name the offending input.

use anyhow::anyhow;
use std::path::Path;
use sz_core::SzError;

/// Converts `SzError` to a user-friendly anyhow error with context.
pub fn convert_error(err: SzError, input: &Path) -> anyhow::Error {
    match err {
        SzError::CorruptStream { reason } => {
            anyhow!(
                "Corrupt stream in '{}': {reason}\n\
                 HINT: The file may be truncated or was not written by sz.",
                input.display()
            )
        }
        SzError::NameExhausted { path } => {
            anyhow!(
                "No unused output name left for '{}' (from '{}')\n\
                 HINT: Remove old numbered copies next to the input.",
                path.display(),
                input.display()
            )
        }
        SzError::UnsupportedMetadata { path, reason } => {
            anyhow!(
                "Cannot archive '{}' from '{}': {reason}",
                path.display(),
                input.display()
            )
        }
        SzError::DestinationExists { path } => {
            anyhow!(
                "Refusing to overwrite '{}' while processing '{}'",
                path.display(),
                input.display()
            )
        }
        SzError::Io(io_err) => {
            anyhow!("I/O error while processing '{}': {io_err}", input.display())
        }
        err @ SzError::Extraction { .. } => {
            anyhow::Error::from(err).context(format!("Error processing '{}'", input.display()))
        }
    }
}
