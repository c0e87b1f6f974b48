//! Archive build reporting.

use std::time::Duration;

/// Report of a directory archiving operation.
///
/// # Examples
///
/// ```
/// use sz_core::creation::BuildReport;
///
/// let mut report = BuildReport::default();
/// report.files_added = 2;
/// report.directories_added = 1;
/// report.hardlinks_added = 1;
///
/// assert_eq!(report.total_entries(), 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Regular files written with a body.
    pub files_added: usize,

    /// Directories added.
    pub directories_added: usize,

    /// Symlinks added.
    pub symlinks_added: usize,

    /// Hardlink members referencing an earlier file.
    pub hardlinks_added: usize,

    /// Character and block devices added.
    pub devices_added: usize,

    /// Named pipes added.
    pub fifos_added: usize,

    /// Members carrying the capability extended attribute.
    pub xattrs_added: usize,

    /// Total body bytes of regular files.
    pub bytes_written: u64,

    /// Size of the finished tar stream.
    pub archive_size: u64,

    /// Duration of the build.
    pub duration: Duration,
}

impl BuildReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of members written.
    #[must_use]
    pub fn total_entries(&self) -> usize {
        self.files_added
            + self.directories_added
            + self.symlinks_added
            + self.hardlinks_added
            + self.devices_added
            + self.fifos_added
    }
}
