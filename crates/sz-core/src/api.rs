//! High-level entry points: decide what to do with an input path and do it.

use std::fs;
use std::fs::File;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::warn;

use crate::ExtractionReport;
use crate::Result;
use crate::Session;
use crate::SzConfig;
use crate::codec;
use crate::creation;
use crate::creation::BuildReport;
use crate::extraction;
use crate::formats::Format;
use crate::formats::is_tar_stream;
use crate::formats::sniff;
use crate::progress::ProgressSink;

/// What [`analyze`] did with one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A compressed stream was decompressed into a plain file.
    Decompressed {
        /// The decompressed file.
        output: PathBuf,
    },

    /// A compressed tar was decompressed and extracted. The intermediate tar
    /// has been removed.
    Extracted {
        /// The intermediate tar the members were read from.
        archive: PathBuf,
        /// What was created.
        report: ExtractionReport,
    },

    /// A directory was archived and compressed. The intermediate tar has
    /// been removed.
    Archived {
        /// The compressed archive.
        output: PathBuf,
        /// Members written to the intermediate tar.
        build: BuildReport,
    },

    /// A plain file was compressed.
    Compressed {
        /// The compressed file.
        output: PathBuf,
    },
}

impl Outcome {
    /// Returns the final path produced for the input.
    #[must_use]
    pub fn output(&self) -> &Path {
        match self {
            Self::Decompressed { output }
            | Self::Archived { output, .. }
            | Self::Compressed { output } => output,
            Self::Extracted { report, .. } => &report.root,
        }
    }

    /// Returns a short name of the operation performed.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Decompressed { .. } => "decompress",
            Self::Extracted { .. } => "extract",
            Self::Archived { .. } => "archive",
            Self::Compressed { .. } => "compress",
        }
    }
}

/// Result of one input of a batch.
#[derive(Debug)]
pub struct InputResult {
    /// The input path as given.
    pub input: PathBuf,
    /// What happened to it.
    pub result: Result<Outcome>,
}

/// Transcodes one input path.
///
/// - A compressed stream is decompressed. If the result is a tar stream it
///   is extracted next to it and the decompressed tar is removed.
/// - A directory is archived into a tar, the tar is compressed, and the tar
///   is removed.
/// - Anything else is compressed.
///
/// Intermediate files are removed only once the step that consumes them
/// succeeded.
///
/// # Errors
///
/// Returns the first error of the pipeline. Outputs and intermediates
/// created before the failure are left in place.
///
/// # Examples
///
/// ```no_run
/// use sz_core::NoopProgress;
/// use sz_core::Session;
/// use sz_core::SzConfig;
/// use sz_core::analyze;
/// use std::path::Path;
///
/// let config = SzConfig::default();
/// let mut progress = NoopProgress;
/// let mut session = Session::new(&config, &mut progress);
/// let outcome = analyze(Path::new("photos"), &mut session)?;
/// println!("{} -> {}", outcome.operation(), outcome.output().display());
/// # Ok::<(), sz_core::SzError>(())
/// ```
pub fn analyze(path: &Path, session: &mut Session<'_>) -> Result<Outcome> {
    if fs::metadata(path)?.is_dir() {
        debug!(path = %path.display(), "archiving directory");
        return archive_directory(path, session);
    }

    let format = sniff(&File::open(path)?);
    debug!(path = %path.display(), ?format, "sniffed input");
    match format {
        Format::Compressed => decompress_input(path, session),
        Format::Tar | Format::Unknown => {
            let artifact = codec::compress(path, session)?;
            Ok(Outcome::Compressed {
                output: artifact.into_path(),
            })
        }
    }
}

fn decompress_input(path: &Path, session: &mut Session<'_>) -> Result<Outcome> {
    let artifact = codec::decompress(path, session)?;
    if !is_tar_stream(&artifact.file) {
        return Ok(Outcome::Decompressed {
            output: artifact.into_path(),
        });
    }

    let archive = artifact.into_path();
    debug!(archive = %archive.display(), "decompressed stream is a tar, extracting");
    let report = extraction::extract(&archive, session)?;
    remove_intermediate(&archive);
    Ok(Outcome::Extracted { archive, report })
}

fn archive_directory(path: &Path, session: &mut Session<'_>) -> Result<Outcome> {
    let (tar, build) = creation::build(path, session)?;
    let tar = tar.into_path();
    let compressed = codec::compress(&tar, session)?;
    remove_intermediate(&tar);
    Ok(Outcome::Archived {
        output: compressed.into_path(),
        build,
    })
}

fn remove_intermediate(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed intermediate"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove intermediate"),
    }
}

/// Processes `paths` one after another, handing each result to `on_result`
/// as soon as its input is done.
///
/// `sink_for` is asked for a fresh progress sink per input. A failing input
/// never stops the batch.
pub fn analyze_each<P, F, R>(paths: &[P], config: &SzConfig, mut sink_for: F, mut on_result: R)
where
    P: AsRef<Path>,
    F: FnMut(&Path) -> Box<dyn ProgressSink>,
    R: FnMut(InputResult),
{
    for input in paths {
        let input = input.as_ref();
        let result = {
            let mut sink = sink_for(input);
            let mut session = Session::new(config, sink.as_mut());
            analyze(input, &mut session)
        };
        if let Err(e) = &result {
            debug!(input = %input.display(), error = %e, "input failed");
        }
        on_result(InputResult {
            input: input.to_path_buf(),
            result,
        });
    }
}

/// Processes `paths` one after another and collects one result per input.
pub fn analyze_all<P, F>(paths: &[P], config: &SzConfig, sink_for: F) -> Vec<InputResult>
where
    P: AsRef<Path>,
    F: FnMut(&Path) -> Box<dyn ProgressSink>,
{
    let mut results = Vec::with_capacity(paths.len());
    analyze_each(paths, config, sink_for, |result| results.push(result));
    results
}
