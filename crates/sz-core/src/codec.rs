//! Snappy stream compression and decompression.
//!
//! Compression has two tiers:
//!
//! - **fast**: reads the whole source into memory and encodes it in one
//!   write. Refused for sources larger than
//!   [`SzConfig::max_buffered_size`](crate::SzConfig::max_buffered_size).
//! - **safe**: streams the source through a fixed-size buffer.
//!
//! [`compress`] tries the fast tier and falls back to the safe tier on any
//! failure. Only the safe tier's error reaches the caller.

use crate::Result;
use crate::Session;
use crate::SzError;
use crate::artifact::Artifact;
use crate::artifact::create_exclusive;
use crate::artifact::permission_bits;
use crate::io::ProgressReader;
use crate::io::ProgressWriter;
use crate::naming::allocate;
use crate::naming::with_suffix;
use crate::progress::ProgressUnit;
use snap::read::FrameDecoder;
use snap::write::FrameEncoder;
use std::ffi::OsString;
use std::fs::File;
use std::io::BufWriter;
use std::io::Read;
use std::io::Seek;
use std::io::Write;
use std::io::{self};
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;

/// Suffix appended to compressed outputs.
pub const COMPRESSED_SUFFIX: &str = ".sz";

/// Suffix appended to decompressed outputs whose source lacks `.sz`.
pub const UNCOMPRESSED_SUFFIX: &str = "-uncompressed";

/// An opened compression source.
#[derive(Debug)]
pub struct Source {
    path: PathBuf,
    file: File,
    size: u64,
    mode: Option<u32>,
}

impl Source {
    /// Opens `path` and records its size and permission bits.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or stat'd.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_file(path.to_path_buf(), file)
    }

    /// Wraps an already opened file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be stat'd.
    pub fn from_file(path: PathBuf, file: File) -> Result<Self> {
        let meta = file.metadata()?;
        Ok(Self {
            path,
            size: meta.len(),
            mode: permission_bits(&meta),
            file,
        })
    }

    /// Returns the source path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stat'd size.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Moves the read position back to the start.
    ///
    /// # Errors
    ///
    /// Returns an error if seeking fails.
    pub fn rewind(&mut self) -> Result<()> {
        self.file.rewind()?;
        Ok(())
    }

    /// Allocates and creates the destination for compressing this source.
    fn create_compressed_output(&self) -> Result<(PathBuf, File)> {
        let dest = allocate(&with_suffix(&self.path, COMPRESSED_SUFFIX))?;
        let file = create_exclusive(&dest, self.mode)?;
        Ok((dest, file))
    }
}

/// Compresses the file at `path` into `<path>.sz` (or a numbered variant).
///
/// # Errors
///
/// Returns an error if the source cannot be read or both tiers fail.
///
/// # Examples
///
/// ```no_run
/// use sz_core::NoopProgress;
/// use sz_core::Session;
/// use sz_core::SzConfig;
/// use sz_core::codec::compress;
/// use std::path::Path;
///
/// let config = SzConfig::default();
/// let mut progress = NoopProgress;
/// let mut session = Session::new(&config, &mut progress);
/// let artifact = compress(Path::new("notes.txt"), &mut session)?;
/// println!("wrote {}", artifact.path.display());
/// # Ok::<(), sz_core::SzError>(())
/// ```
pub fn compress(path: &Path, session: &mut Session<'_>) -> Result<Artifact> {
    let mut source = Source::open(path)?;
    compress_with_fallback(&mut source, session, compress_fast, compress_safe)
}

/// Runs `fast`, and if it fails rewinds the source and runs `safe`.
///
/// `fast` is responsible for removing its own partial output.
///
/// # Errors
///
/// Returns the error of `safe` if both tiers fail.
pub fn compress_with_fallback<F, S>(
    source: &mut Source,
    session: &mut Session<'_>,
    fast: F,
    safe: S,
) -> Result<Artifact>
where
    F: FnOnce(&mut Source, &mut Session<'_>) -> Result<Artifact>,
    S: FnOnce(&mut Source, &mut Session<'_>) -> Result<Artifact>,
{
    match fast(source, session) {
        Ok(artifact) => {
            debug!(output = %artifact.path.display(), tier = "fast", "compressed");
            Ok(artifact)
        }
        Err(e) => {
            debug!(
                source = %source.path.display(),
                error = %e,
                "fast compression failed, streaming instead"
            );
            source.rewind()?;
            let artifact = safe(source, session)?;
            debug!(output = %artifact.path.display(), tier = "safe", "compressed");
            Ok(artifact)
        }
    }
}

/// Fast tier: buffer the whole source, then encode it in one write.
///
/// On failure the partially written output is removed.
///
/// # Errors
///
/// Returns an error if the source exceeds the buffering limit, memory for it
/// cannot be reserved, or any read, write or encode step fails.
pub fn compress_fast(source: &mut Source, session: &mut Session<'_>) -> Result<Artifact> {
    let config = session.config();
    if source.size > config.max_buffered_size {
        return Err(SzError::Io(io::Error::new(
            io::ErrorKind::OutOfMemory,
            format!(
                "{} bytes exceeds the in-memory limit of {} bytes",
                source.size, config.max_buffered_size
            ),
        )));
    }

    let capacity = usize::try_from(source.size)
        .map_err(|e| SzError::Io(io::Error::new(io::ErrorKind::OutOfMemory, e)))?;
    let mut contents = Vec::new();
    contents
        .try_reserve_exact(capacity)
        .map_err(|e| SzError::Io(io::Error::new(io::ErrorKind::OutOfMemory, e)))?;
    source.file.read_to_end(&mut contents)?;

    let (dest, output) = source.create_compressed_output()?;
    let progress = session.progress();
    progress.on_start(&dest, source.size, ProgressUnit::Bytes);

    let written = {
        let encoder = FrameEncoder::new(output);
        let mut writer =
            ProgressWriter::new(encoder, &mut *progress, source.size, config.progress_batch);
        writer.write_all(&contents).and_then(|()| writer.flush())
    };

    if let Err(e) = written {
        discard_partial(&dest);
        return Err(e.into());
    }
    progress.on_finish();
    Artifact::reopen(dest)
}

/// Safe tier: stream the source through a buffer of
/// [`SzConfig::buffer_size`](crate::SzConfig::buffer_size) bytes.
///
/// # Errors
///
/// Returns an error if any read, write or encode step fails. The partial
/// output is left in place.
pub fn compress_safe(source: &mut Source, session: &mut Session<'_>) -> Result<Artifact> {
    let config = session.config();
    let (dest, output) = source.create_compressed_output()?;
    let progress = session.progress();
    progress.on_start(&dest, source.size, ProgressUnit::Bytes);

    {
        let encoder = FrameEncoder::new(output);
        let counted =
            ProgressWriter::new(encoder, &mut *progress, source.size, config.progress_batch);
        let mut buffered = BufWriter::with_capacity(config.buffer_size, counted);
        io::copy(&mut source.file, &mut buffered)?;
        buffered.flush()?;
    }

    progress.on_finish();
    Artifact::reopen(dest)
}

/// Removes a partial fast-tier output.
fn discard_partial(dest: &Path) {
    if let Err(e) = std::fs::remove_file(dest) {
        tracing::warn!(path = %dest.display(), error = %e, "could not remove partial output");
    }
}

/// Returns the name a decompressed copy of `path` gets before allocation.
///
/// A trailing `.sz` is stripped; otherwise `-uncompressed` is appended.
///
/// # Examples
///
/// ```
/// use sz_core::codec::decompressed_name;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(decompressed_name(Path::new("d/a.tar.sz")), PathBuf::from("d/a.tar"));
/// assert_eq!(decompressed_name(Path::new("blob")), PathBuf::from("blob-uncompressed"));
/// ```
#[must_use]
pub fn decompressed_name(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
    match name.as_deref().and_then(|n| n.strip_suffix(COMPRESSED_SUFFIX)) {
        Some(stem) if !stem.is_empty() => path.with_file_name(stem),
        _ => {
            let mut name = path
                .file_name()
                .map_or_else(OsString::new, std::ffi::OsStr::to_os_string);
            name.push(UNCOMPRESSED_SUFFIX);
            path.with_file_name(name)
        }
    }
}

/// Decompresses a Snappy-framed file next to its source.
///
/// Progress is reported as compressed bytes consumed against the source's
/// stat'd size.
///
/// # Errors
///
/// Returns [`SzError::CorruptStream`] if the stream is malformed, or an I/O
/// error if reading or writing fails. The partial output is left in place.
pub fn decompress(path: &Path, session: &mut Session<'_>) -> Result<Artifact> {
    let source = Source::open(path)?;
    let config = session.config();
    let dest = allocate(&decompressed_name(path))?;
    let output = create_exclusive(&dest, source.mode)?;
    let progress = session.progress();
    progress.on_start(&dest, source.size, ProgressUnit::Bytes);

    {
        let counted =
            ProgressReader::new(&source.file, &mut *progress, source.size, config.progress_batch);
        let mut decoder = FrameDecoder::new(counted);
        let mut writer = BufWriter::with_capacity(config.buffer_size, output);
        io::copy(&mut decoder, &mut writer).map_err(classify_decode_error)?;
        writer.flush()?;
    }

    progress.on_finish();
    debug!(source = %path.display(), output = %dest.display(), "decompressed");
    Artifact::reopen(dest)
}

/// Maps a decoder error to [`SzError`], recognizing malformed frames.
fn classify_decode_error(err: io::Error) -> SzError {
    let is_frame_error = err
        .get_ref()
        .is_some_and(|inner| inner.downcast_ref::<snap::Error>().is_some());
    if is_frame_error {
        return SzError::corrupt(err.to_string());
    }
    crate::copy::classify_read_error(err)
}
