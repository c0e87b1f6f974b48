//! Tar archive creation from a directory tree.
//!
//! Members are written with ustar headers in walk order. Regular files that
//! share an inode are stored once; later occurrences become zero-size
//! hardlink members pointing at the first one.

use crate::Result;
use crate::Session;
use crate::SzError;
use crate::artifact::Artifact;
use crate::artifact::create_exclusive;
use crate::artifact::permission_bits;
use crate::creation::report::BuildReport;
use crate::creation::walker::ArchiveWalker;
use crate::creation::walker::EntryKind;
use crate::creation::walker::WalkEntry;
use crate::metadata::CAPABILITY_XATTR;
use crate::metadata::MetadataProvider;
use crate::metadata::default_provider;
use crate::naming::allocate;
use crate::naming::with_suffix;
use crate::progress::ItemTracker;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use tar::Builder;
use tar::EntryType;
use tar::Header;
use tracing::debug;

/// Suffix appended to built archives.
pub const TAR_SUFFIX: &str = ".tar";

/// PAX record key carrying the capability attribute.
pub const CAPABILITY_PAX_KEY: &str = "SCHILY.xattr.security.capability";

/// Maps `(device, inode)` to the member name that first stored its body.
///
/// Lives for exactly one build.
#[derive(Debug, Default)]
pub struct HardlinkTable {
    first_seen: HashMap<(u64, u64), PathBuf>,
}

impl HardlinkTable {
    /// Returns the earlier member for `key`, or records `name` as the first
    /// one and returns `None`.
    pub fn link_or_insert(&mut self, key: (u64, u64), name: &Path) -> Option<&Path> {
        use std::collections::hash_map::Entry;

        match self.first_seen.entry(key) {
            Entry::Occupied(entry) => Some(entry.into_mut().as_path()),
            Entry::Vacant(entry) => {
                entry.insert(name.to_path_buf());
                None
            }
        }
    }

    /// Number of distinct multiply-linked inodes seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.first_seen.len()
    }

    /// Returns `true` if no multiply-linked inode has been seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_seen.is_empty()
    }
}

/// Builds tar archives from directories.
///
/// # Examples
///
/// ```no_run
/// use sz_core::NoopProgress;
/// use sz_core::Session;
/// use sz_core::SzConfig;
/// use sz_core::creation::TarBuilder;
/// use std::path::Path;
///
/// let config = SzConfig::default();
/// let mut progress = NoopProgress;
/// let mut session = Session::new(&config, &mut progress);
/// let (artifact, report) = TarBuilder::new().build(Path::new("photos"), &mut session)?;
/// println!("{}: {} files", artifact.path.display(), report.files_added);
/// # Ok::<(), sz_core::SzError>(())
/// ```
pub struct TarBuilder<'p> {
    provider: &'p dyn MetadataProvider,
}

impl TarBuilder<'static> {
    /// Creates a builder using the platform's metadata provider.
    #[must_use]
    pub fn new() -> Self {
        Self {
            provider: default_provider(),
        }
    }
}

impl Default for TarBuilder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'p> TarBuilder<'p> {
    /// Creates a builder using a specific metadata provider.
    #[must_use]
    pub fn with_provider(provider: &'p dyn MetadataProvider) -> Self {
        Self { provider }
    }

    /// Archives `dir` into `<dir>.tar` (or a numbered variant) next to it.
    ///
    /// Progress is one item per member against a pre-walk count.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be walked, an entry cannot be
    /// represented (sockets, or devices without device numbers), or writing
    /// fails. The partial archive is left in place.
    pub fn build(&self, dir: &Path, session: &mut Session<'_>) -> Result<(Artifact, BuildReport)> {
        let start = std::time::Instant::now();
        let config = session.config();
        let dir = named_root(dir)?;
        let root_name = PathBuf::from(dir.file_name().unwrap_or_default());

        let dir_meta = std::fs::metadata(&dir)?;
        let dest = allocate(&with_suffix(&dir, TAR_SUFFIX))?;
        let mode = permission_bits(&dir_meta).map(|m| m & 0o666);

        let walker = ArchiveWalker::new(&dir, &root_name);
        let total = walker.count()?;

        let output = create_exclusive(&dest, mode)?;
        let writer = BufWriter::with_capacity(config.buffer_size, output);
        let mut builder = Builder::new(writer);
        let mut tracker = ItemTracker::start(session.progress(), &dest, total);
        let mut links = HardlinkTable::default();
        let mut report = BuildReport::new();

        for entry in walker.walk() {
            let entry = entry?;
            self.append_entry(&mut builder, &entry, &mut links, &mut report)?;
            builder.get_mut().flush()?;
            tracker.complete_one();
        }

        builder.finish()?;
        let mut writer = builder.into_inner()?;
        writer.flush()?;
        let file = writer.into_inner().map_err(|e| SzError::Io(e.into_error()))?;
        report.archive_size = file.metadata()?.len();
        drop(file);
        tracker.finish();

        report.duration = start.elapsed();
        debug!(
            archive = %dest.display(),
            members = report.total_entries(),
            "built tar archive"
        );
        Ok((Artifact::reopen(dest)?, report))
    }

    fn append_entry<W: Write>(
        &self,
        builder: &mut Builder<W>,
        entry: &WalkEntry,
        links: &mut HardlinkTable,
        report: &mut BuildReport,
    ) -> Result<()> {
        let mut header = Header::new_ustar();
        set_permissions(&mut header, &entry.metadata);

        if let Some(capability) = self.provider.capability(&entry.path) {
            builder.append_pax_extensions([(CAPABILITY_PAX_KEY, capability.as_slice())])?;
            report.xattrs_added += 1;
            debug!(path = %entry.path.display(), xattr = CAPABILITY_XATTR, "captured");
        }

        match &entry.kind {
            EntryKind::Directory => {
                header.set_entry_type(EntryType::Directory);
                header.set_size(0);
                let name = directory_name(&entry.archive_path);
                builder.append_data(&mut header, name, std::io::empty())?;
                report.directories_added += 1;
            }
            EntryKind::File => {
                let earlier = self
                    .provider
                    .link_identity(&entry.metadata)
                    .filter(|identity| identity.links > 1)
                    .and_then(|identity| links.link_or_insert(identity.key(), &entry.archive_path));

                if let Some(target) = earlier {
                    header.set_entry_type(EntryType::Link);
                    header.set_size(0);
                    builder.append_link(&mut header, &entry.archive_path, target)?;
                    report.hardlinks_added += 1;
                } else {
                    let file = File::open(&entry.path)?;
                    let size = entry.metadata.len();
                    header.set_entry_type(EntryType::Regular);
                    header.set_size(size);
                    builder.append_data(&mut header, &entry.archive_path, file)?;
                    report.files_added += 1;
                    report.bytes_written += size;
                }
            }
            EntryKind::Symlink { target } => {
                header.set_entry_type(EntryType::Symlink);
                header.set_size(0);
                builder.append_link(&mut header, &entry.archive_path, target)?;
                report.symlinks_added += 1;
            }
            EntryKind::CharDevice | EntryKind::BlockDevice => {
                let numbers = self.provider.device_numbers(&entry.metadata).ok_or_else(|| {
                    SzError::UnsupportedMetadata {
                        path: entry.path.clone(),
                        reason: "device numbers are not available on this platform".into(),
                    }
                })?;
                let kind = if entry.kind == EntryKind::CharDevice {
                    EntryType::Char
                } else {
                    EntryType::Block
                };
                header.set_entry_type(kind);
                header.set_size(0);
                header.set_device_major(numbers.major)?;
                header.set_device_minor(numbers.minor)?;
                builder.append_data(&mut header, &entry.archive_path, std::io::empty())?;
                report.devices_added += 1;
            }
            EntryKind::Fifo => {
                header.set_entry_type(EntryType::Fifo);
                header.set_size(0);
                builder.append_data(&mut header, &entry.archive_path, std::io::empty())?;
                report.fifos_added += 1;
            }
            EntryKind::Other => {
                return Err(SzError::UnsupportedMetadata {
                    path: entry.path.clone(),
                    reason: "sockets cannot be stored in a tar archive".into(),
                });
            }
        }

        Ok(())
    }
}

/// Archives `dir` with the platform's metadata provider.
///
/// # Errors
///
/// See [`TarBuilder::build`].
pub fn build(dir: &Path, session: &mut Session<'_>) -> Result<(Artifact, BuildReport)> {
    TarBuilder::new().build(dir, session)
}

/// Returns `dir` in a form that has a final name component, resolving `.`
/// and `..` when needed.
fn named_root(dir: &Path) -> Result<PathBuf> {
    if let Some(name) = dir.file_name() {
        return Ok(dir.parent().map_or_else(|| PathBuf::from(name), |p| p.join(name)));
    }
    let resolved = dir.canonicalize()?;
    if resolved.file_name().is_none() {
        return Err(SzError::UnsupportedMetadata {
            path: dir.to_path_buf(),
            reason: "the filesystem root has no name to archive under".into(),
        });
    }
    Ok(resolved)
}

/// Appends the trailing separator directory members carry.
fn directory_name(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push("/");
    PathBuf::from(name)
}

/// Sets permissions, ownership and mtime in a tar header from metadata.
#[cfg(unix)]
fn set_permissions(header: &mut Header, metadata: &std::fs::Metadata) {
    use std::os::unix::fs::MetadataExt;
    header.set_mode(metadata.mode() & 0o7777);
    header.set_uid(u64::from(metadata.uid()));
    header.set_gid(u64::from(metadata.gid()));
    // mtime can be negative for dates before epoch, clamp to 0
    #[allow(clippy::cast_sign_loss)]
    let mtime = metadata.mtime().max(0) as u64;
    header.set_mtime(mtime);
}

#[cfg(not(unix))]
fn set_permissions(header: &mut Header, metadata: &std::fs::Metadata) {
    let mode = if metadata.is_dir() {
        0o755
    } else if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    };
    header.set_mode(mode);

    if let Ok(modified) = metadata.modified()
        && let Ok(duration) = modified.duration_since(std::time::UNIX_EPOCH)
    {
        header.set_mtime(duration.as_secs());
    }
}
