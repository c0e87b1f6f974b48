//! Output files produced by the pipeline.

use crate::Result;
use crate::SzError;
use std::fs::File;
use std::fs::OpenOptions;
use std::path::Path;
use std::path::PathBuf;

/// A finalized output, reopened read-only.
#[derive(Debug)]
pub struct Artifact {
    /// Where the output was written.
    pub path: PathBuf,
    /// Read-only handle positioned at the start of the output.
    pub file: File,
}

impl Artifact {
    /// Reopens a completed output for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn reopen(path: PathBuf) -> Result<Self> {
        let file = File::open(&path)?;
        Ok(Self { path, file })
    }

    /// Returns the output path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consumes the artifact, closing the handle and returning the path.
    #[must_use]
    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// Creates `path` for writing, failing if anything already exists there.
///
/// On Unix the new file gets exactly `mode`, whatever the process umask.
///
/// # Errors
///
/// Returns [`SzError::DestinationExists`] if the path is taken, or an I/O
/// error if creation fails for another reason.
pub fn create_exclusive(path: &Path, mode: Option<u32>) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    if let Some(mode) = mode {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode & 0o7777);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let file = options.open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::AlreadyExists {
            SzError::DestinationExists {
                path: path.to_path_buf(),
            }
        } else {
            SzError::Io(e)
        }
    })?;

    #[cfg(unix)]
    if let Some(mode) = mode {
        set_mode(path, mode)?;
    }

    Ok(file)
}

/// Sets the permission bits of `path` to exactly `mode`.
///
/// # Errors
///
/// Returns an I/O error if the permissions cannot be changed.
#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & 0o7777))?;
    Ok(())
}

/// Returns the permission bits of `meta`, if the platform has them.
#[must_use]
pub fn permission_bits(meta: &std::fs::Metadata) -> Option<u32> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Some(meta.permissions().mode() & 0o7777)
    }
    #[cfg(not(unix))]
    {
        let _ = meta;
        None
    }
}
