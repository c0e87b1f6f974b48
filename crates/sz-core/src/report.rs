//! Extraction operation reporting.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

/// Report of a tar extraction.
///
/// Contains the paths that were created, in archive order, plus counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Directory the archive root was extracted to (after collision
    /// avoidance).
    pub root: PathBuf,

    /// Every path created on disk, in archive order.
    pub created: Vec<PathBuf>,

    /// Number of regular files extracted.
    pub files_extracted: usize,

    /// Number of directory members processed.
    pub directories_created: usize,

    /// Number of hard links created.
    pub hardlinks_created: usize,

    /// Number of symlinks created.
    pub symlinks_created: usize,

    /// Number of members of other types that were skipped.
    pub entries_skipped: usize,

    /// Total body bytes written to disk.
    pub bytes_written: u64,

    /// Duration of the extraction.
    pub duration: Duration,
}

impl ExtractionReport {
    /// Creates a new empty extraction report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a created path.
    pub fn record(&mut self, path: &Path) {
        self.created.push(path.to_path_buf());
    }

    /// Returns total number of items created.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.files_extracted
            + self.directories_created
            + self.hardlinks_created
            + self.symlinks_created
    }
}
