//! Error types for transcoding operations.

use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `SzError`.
pub type Result<T> = std::result::Result<T, SzError>;

/// Errors that can occur while compressing, decompressing, archiving or
/// extracting.
#[derive(Error, Debug)]
pub enum SzError {
    /// I/O operation failed (open, read, write, stat).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A recognized stream whose payload is malformed, or a tar header that
    /// cannot be parsed.
    #[error("corrupt stream: {reason}")]
    CorruptStream {
        /// What was wrong with the stream.
        reason: String,
    },

    /// Every numbered variant of a destination name is already taken.
    #[error("no unused destination name left for {path}")]
    NameExhausted {
        /// The candidate path that could not be disambiguated.
        path: PathBuf,
    },

    /// File metadata needed to archive an entry is not available.
    #[error("unsupported metadata for {path}: {reason}")]
    UnsupportedMetadata {
        /// The entry being archived.
        path: PathBuf,
        /// Which piece of metadata is missing or unrepresentable.
        reason: String,
    },

    /// An archive member would land on a path that already exists.
    #[error("refusing to overwrite existing path: {path}")]
    DestinationExists {
        /// The colliding destination.
        path: PathBuf,
    },

    /// Extracting a tar archive failed.
    #[error("{source}\nFailed to extract {}", .archive.display())]
    Extraction {
        /// Name of the archive being extracted.
        archive: PathBuf,
        /// The error that aborted extraction.
        #[source]
        source: Box<SzError>,
    },
}

impl SzError {
    /// Creates a `CorruptStream` error from anything displayable.
    pub fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptStream {
            reason: reason.into(),
        }
    }

    /// Wraps this error with the name of the archive being extracted.
    ///
    /// Already wrapped errors are returned unchanged.
    #[must_use]
    pub fn in_archive(self, archive: &Path) -> Self {
        match self {
            wrapped @ Self::Extraction { .. } => wrapped,
            other => Self::Extraction {
                archive: archive.to_path_buf(),
                source: Box::new(other),
            },
        }
    }

    /// Returns `true` if the stream or archive content itself is malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use sz_core::SzError;
    ///
    /// assert!(SzError::corrupt("bad frame").is_corrupt());
    /// assert!(!SzError::Io(std::io::Error::other("disk")).is_corrupt());
    /// ```
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        match self {
            Self::CorruptStream { .. } => true,
            Self::Extraction { source, .. } => source.is_corrupt(),
            _ => false,
        }
    }

    /// Returns `true` for errors that indicate a broken environment rather
    /// than a bad input.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::NameExhausted { .. } => true,
            Self::Extraction { source, .. } => source.is_fatal(),
            _ => false,
        }
    }

    /// Returns the offending path, if the error carries one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NameExhausted { path }
            | Self::UnsupportedMetadata { path, .. }
            | Self::DestinationExists { path } => Some(path),
            Self::Extraction { archive, .. } => Some(archive),
            Self::Io(_) | Self::CorruptStream { .. } => None,
        }
    }
}
