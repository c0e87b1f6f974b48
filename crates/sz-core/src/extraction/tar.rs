//! Tar extraction next to the archive.
//!
//! The archive root name (`d` for `d.tar`) is allocated once through the
//! collision-safe namer. If it had to be renamed, every member under the
//! original root is rewritten onto the new one, including hardlink
//! targets. Member paths themselves are never renamed: a regular file that
//! would land on an existing path fails with
//! [`SzError::DestinationExists`].

use crate::Result;
use crate::Session;
use crate::SzError;
use crate::artifact::create_exclusive;
#[cfg(unix)]
use crate::artifact::set_mode;
use crate::copy::CopyBuffer;
use crate::copy::copy_with_buffer;
use crate::naming::allocate;
use crate::progress::ProgressUnit;
use crate::report::ExtractionReport;
use std::ffi::OsStr;
use std::ffi::OsString;
use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use tar::Archive;
use tar::Entry;
use tar::EntryType;
use tracing::debug;

/// Suffix stripped from the archive name to get its root directory name.
const TAR_SUFFIX: &str = ".tar";

/// Extracts the tar archive at `tar_path` into the directory containing it.
///
/// # Errors
///
/// Returns [`SzError::Extraction`] wrapping the first failure; paths created
/// before the failure are left in place.
///
/// # Examples
///
/// ```no_run
/// use sz_core::NoopProgress;
/// use sz_core::Session;
/// use sz_core::SzConfig;
/// use sz_core::extraction::extract;
/// use std::path::Path;
///
/// let config = SzConfig::default();
/// let mut progress = NoopProgress;
/// let mut session = Session::new(&config, &mut progress);
/// let report = extract(Path::new("backup.tar"), &mut session)?;
/// println!("{} files under {}", report.files_extracted, report.root.display());
/// # Ok::<(), sz_core::SzError>(())
/// ```
pub fn extract(tar_path: &Path, session: &mut Session<'_>) -> Result<ExtractionReport> {
    TarExtractor::new(tar_path)
        .and_then(|extractor| extractor.run(session))
        .map_err(|e| e.in_archive(tar_path))
}

/// State of one extraction pass.
pub struct TarExtractor {
    tar_path: PathBuf,
    dest_dir: PathBuf,
    origin: OsString,
    root: OsString,
}

impl TarExtractor {
    /// Prepares extraction of `tar_path`, allocating the root directory name.
    ///
    /// # Errors
    ///
    /// Returns an error if no root name can be allocated.
    pub fn new(tar_path: &Path) -> Result<Self> {
        let dest_dir = match tar_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let origin = root_name(tar_path);
        let allocated = allocate(&dest_dir.join(&origin))?;
        let root = allocated
            .file_name()
            .map_or_else(|| origin.clone(), OsStr::to_os_string);

        if root != origin {
            debug!(
                from = %origin.to_string_lossy(),
                to = %root.to_string_lossy(),
                "archive root renamed"
            );
        }

        Ok(Self {
            tar_path: tar_path.to_path_buf(),
            dest_dir,
            origin,
            root,
        })
    }

    /// Directory the archive root is extracted to.
    #[must_use]
    pub fn root(&self) -> PathBuf {
        self.dest_dir.join(&self.root)
    }

    /// Maps a member path onto the destination.
    ///
    /// # Errors
    ///
    /// Returns [`SzError::CorruptStream`] for absolute paths or paths with
    /// `..` components.
    pub fn destination(&self, member: &Path) -> Result<PathBuf> {
        let mut relative = PathBuf::new();
        for (index, component) in member.components().enumerate() {
            match component {
                Component::Normal(part) if index == 0 && part == self.origin => {
                    relative.push(&self.root);
                }
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(SzError::corrupt(format!(
                        "member path escapes the extraction directory: {}",
                        member.display()
                    )));
                }
            }
        }
        Ok(self.dest_dir.join(relative))
    }

    /// Reads every member and materializes it.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered, unwrapped.
    pub fn run(self, session: &mut Session<'_>) -> Result<ExtractionReport> {
        let start = std::time::Instant::now();
        let config = session.config();
        let file = File::open(&self.tar_path)?;
        let total = file.metadata()?.len();
        let mut archive = Archive::new(BufReader::with_capacity(config.buffer_size, file));
        let mut buffer = CopyBuffer::with_capacity(config.buffer_size);
        let mut report = ExtractionReport::new();
        report.root = self.root();

        let progress = session.progress();
        progress.on_start(&report.root, total, ProgressUnit::Bytes);
        let mut extracted: u64 = 0;
        let mut directory_modes = Vec::new();

        let entries = archive
            .entries()
            .map_err(|e| SzError::corrupt(format!("failed to read tar entries: {e}")))?;

        for entry in entries {
            let mut entry =
                entry.map_err(|e| SzError::corrupt(format!("failed to read tar entry: {e}")))?;
            let size = entry.header().size().unwrap_or(0);

            let materialized =
                self.extract_entry(&mut entry, &mut buffer, &mut report, &mut directory_modes)?;
            if !materialized {
                continue;
            }

            if size > 0 {
                extracted += size;
                progress.on_progress(extracted, total);
            }
        }

        apply_directory_modes(&directory_modes)?;
        progress.on_finish();
        report.duration = start.elapsed();
        debug!(
            archive = %self.tar_path.display(),
            items = report.total_items(),
            "extracted tar archive"
        );
        Ok(report)
    }

    /// Extracts one member. Returns `false` if its type was skipped.
    ///
    /// Directory modes are queued in `directory_modes` rather than applied,
    /// so read-only directories can still receive their children.
    fn extract_entry<R: Read>(
        &self,
        entry: &mut Entry<'_, R>,
        buffer: &mut CopyBuffer,
        report: &mut ExtractionReport,
        directory_modes: &mut Vec<(PathBuf, u32)>,
    ) -> Result<bool> {
        let member = entry
            .path()
            .map_err(|e| SzError::corrupt(format!("invalid member path: {e}")))?
            .into_owned();
        let mode = entry.header().mode().ok().map(|m| m & 0o7777);
        let entry_type = entry.header().entry_type();

        match entry_type {
            EntryType::Directory => {
                let path = self.destination(&member)?;
                std::fs::create_dir_all(&path)?;
                if let Some(mode) = mode {
                    directory_modes.push((path.clone(), mode));
                }
                report.directories_created += 1;
                report.record(&path);
            }
            EntryType::Regular | EntryType::Continuous => {
                let path = self.destination(&member)?;
                create_parent(&path)?;
                let output = create_exclusive(&path, mode)?;
                let mut writer = BufWriter::with_capacity(buffer.size(), output);
                let written = copy_with_buffer(entry, &mut writer, buffer)?;
                writer.flush()?;
                report.files_extracted += 1;
                report.bytes_written += written;
                report.record(&path);
            }
            EntryType::Link => {
                let path = self.destination(&member)?;
                let target = link_name(entry)?;
                let original = self.destination(&target)?;
                create_parent(&path)?;
                std::fs::hard_link(&original, &path).map_err(|e| exists_or_io(e, &path))?;
                report.hardlinks_created += 1;
                report.record(&path);
            }
            EntryType::Symlink => {
                let path = self.destination(&member)?;
                let target = link_name(entry)?;
                create_parent(&path)?;
                create_symlink(&target, &path)?;
                report.symlinks_created += 1;
                report.record(&path);
            }
            other => {
                debug!(member = %member.display(), kind = ?other, "skipping member");
                report.entries_skipped += 1;
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// Archive root name: the file name with a trailing `.tar` stripped.
fn root_name(tar_path: &Path) -> OsString {
    let name = tar_path.file_name().unwrap_or_default();
    match name.to_str().and_then(|n| n.strip_suffix(TAR_SUFFIX)) {
        Some(stem) if !stem.is_empty() => OsString::from(stem),
        _ => name.to_os_string(),
    }
}

fn link_name<R: Read>(entry: &Entry<'_, R>) -> Result<PathBuf> {
    entry
        .link_name()
        .map_err(|e| SzError::corrupt(format!("invalid link target: {e}")))?
        .map(std::borrow::Cow::into_owned)
        .ok_or_else(|| SzError::corrupt("link member without a target"))
}

fn exists_or_io(err: std::io::Error, path: &Path) -> SzError {
    if err.kind() == std::io::ErrorKind::AlreadyExists {
        SzError::DestinationExists {
            path: path.to_path_buf(),
        }
    } else {
        SzError::Io(err)
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Applies queued directory modes, deepest first.
#[cfg(unix)]
fn apply_directory_modes(modes: &[(PathBuf, u32)]) -> Result<()> {
    for (path, mode) in modes.iter().rev() {
        set_mode(path, *mode)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn apply_directory_modes(_modes: &[(PathBuf, u32)]) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn create_symlink(target: &Path, path: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, path).map_err(|e| exists_or_io(e, path))
}

#[cfg(not(unix))]
fn create_symlink(_target: &Path, path: &Path) -> Result<()> {
    Err(SzError::UnsupportedMetadata {
        path: path.to_path_buf(),
        reason: "symlinks are not supported on this platform".into(),
    })
}
