//! Deterministic directory traversal.
//!
//! Entries are visited depth-first in file-name order without following
//! symlinks, so the same tree always produces the same member order. A
//! hardlink's first occurrence therefore always precedes its later ones.

use crate::Result;
use crate::SzError;
use std::fs::Metadata;
use std::path::Path;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Kind of a visited filesystem entry, resolved without following symlinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    File,

    /// Directory.
    Directory,

    /// Symbolic link with its target text.
    Symlink {
        /// Target of the symlink, stored verbatim.
        target: PathBuf,
    },

    /// Character device.
    CharDevice,

    /// Block device.
    BlockDevice,

    /// Named pipe.
    Fifo,

    /// Anything that cannot be represented in a tar stream (sockets).
    Other,
}

/// A visited entry with its archive member name.
#[derive(Debug, Clone)]
pub struct WalkEntry {
    /// Full filesystem path to the entry.
    pub path: PathBuf,

    /// Member name: the walked directory's own name joined with the path
    /// relative to it.
    pub archive_path: PathBuf,

    /// Resolved kind.
    pub kind: EntryKind,

    /// Metadata from `lstat`.
    pub metadata: Metadata,
}

/// Walks a directory tree in deterministic order.
///
/// # Examples
///
/// ```no_run
/// use sz_core::creation::walker::ArchiveWalker;
/// use std::path::Path;
///
/// let walker = ArchiveWalker::new(Path::new("./project"), Path::new("project"));
/// for entry in walker.walk() {
///     let entry = entry?;
///     println!("{}", entry.archive_path.display());
/// }
/// # Ok::<(), sz_core::SzError>(())
/// ```
pub struct ArchiveWalker<'a> {
    root: &'a Path,
    root_name: &'a Path,
}

impl<'a> ArchiveWalker<'a> {
    /// Creates a walker over `root` whose members are named under
    /// `root_name`.
    #[must_use]
    pub fn new(root: &'a Path, root_name: &'a Path) -> Self {
        Self { root, root_name }
    }

    fn walkdir(&self) -> WalkDir {
        WalkDir::new(self.root)
            .follow_links(false)
            .sort_by_file_name()
    }

    /// Counts every entry the walk will visit, including the root.
    ///
    /// # Errors
    ///
    /// Returns an error if any directory cannot be read.
    pub fn count(&self) -> Result<u64> {
        let mut total = 0;
        for entry in self.walkdir() {
            entry.map_err(std::io::Error::from)?;
            total += 1;
        }
        Ok(total)
    }

    /// Returns an iterator over the entries, the root directory first.
    ///
    /// # Errors
    ///
    /// Entries may error if a directory cannot be read, metadata cannot be
    /// read, or a symlink target cannot be read.
    pub fn walk(&self) -> impl Iterator<Item = Result<WalkEntry>> + '_ {
        self.walkdir()
            .into_iter()
            .map(move |entry| self.build_entry(&entry.map_err(std::io::Error::from)?))
    }

    fn build_entry(&self, entry: &walkdir::DirEntry) -> Result<WalkEntry> {
        let path = entry.path().to_path_buf();
        let metadata = entry.metadata().map_err(std::io::Error::from)?;
        let kind = classify(&path, &metadata)?;

        let relative = path.strip_prefix(self.root).map_err(|_| {
            SzError::Io(std::io::Error::other(format!(
                "{} is outside of {}",
                path.display(),
                self.root.display()
            )))
        })?;
        let archive_path = if relative.as_os_str().is_empty() {
            self.root_name.to_path_buf()
        } else {
            self.root_name.join(relative)
        };

        Ok(WalkEntry {
            path,
            archive_path,
            kind,
            metadata,
        })
    }
}

/// Determines the entry kind from `lstat` metadata.
fn classify(path: &Path, metadata: &Metadata) -> Result<EntryKind> {
    let file_type = metadata.file_type();

    if file_type.is_symlink() {
        let target = std::fs::read_link(path)?;
        return Ok(EntryKind::Symlink { target });
    }
    if file_type.is_dir() {
        return Ok(EntryKind::Directory);
    }
    if file_type.is_file() {
        return Ok(EntryKind::File);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::FileTypeExt;

        if file_type.is_char_device() {
            return Ok(EntryKind::CharDevice);
        }
        if file_type.is_block_device() {
            return Ok(EntryKind::BlockDevice);
        }
        if file_type.is_fifo() {
            return Ok(EntryKind::Fifo);
        }
    }

    Ok(EntryKind::Other)
}
