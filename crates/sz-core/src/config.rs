//! Configuration and per-operation context.

use crate::Result;
use crate::SzError;
use crate::progress::NoopProgress;
use crate::progress::ProgressSink;

/// Default ceiling for the in-memory compression path (1 GiB).
pub const DEFAULT_MAX_BUFFERED_SIZE: u64 = 1024 * 1024 * 1024;

/// Default capacity of streaming buffers (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Default number of bytes accumulated before a progress report (1 MiB).
pub const DEFAULT_PROGRESS_BATCH: u64 = 1024 * 1024;

/// Options shared by every transcoding operation.
///
/// # Examples
///
/// ```
/// use sz_core::SzConfig;
///
/// let config = SzConfig::default()
///     .with_quiet(true)
///     .with_max_buffered_size(16 * 1024 * 1024);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SzConfig {
    /// Suppress all progress reporting.
    ///
    /// Default: `false`.
    pub quiet: bool,

    /// Largest input the fast compression path will load into memory.
    ///
    /// Larger inputs go straight to the streaming path.
    ///
    /// Default: 1 GiB.
    pub max_buffered_size: u64,

    /// Capacity of the streaming compression writer and the extraction copy
    /// buffer.
    ///
    /// Default: 64 KiB.
    pub buffer_size: usize,

    /// Bytes a counting reader or writer accumulates before reporting.
    ///
    /// Default: 1 MiB.
    pub progress_batch: u64,
}

impl Default for SzConfig {
    fn default() -> Self {
        Self {
            quiet: false,
            max_buffered_size: DEFAULT_MAX_BUFFERED_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            progress_batch: DEFAULT_PROGRESS_BATCH,
        }
    }
}

impl SzConfig {
    /// Creates a new `SzConfig` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets quiet mode.
    #[must_use]
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Sets the fast-path memory ceiling.
    #[must_use]
    pub fn with_max_buffered_size(mut self, size: u64) -> Self {
        self.max_buffered_size = size;
        self
    }

    /// Sets the streaming buffer capacity.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Sets the progress batching threshold.
    #[must_use]
    pub fn with_progress_batch(mut self, bytes: u64) -> Self {
        self.progress_batch = bytes;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `buffer_size` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(SzError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "buffer size must be greater than zero",
            )));
        }
        Ok(())
    }
}

/// Explicit context handed to every operation: the configuration plus the
/// progress sink that receives transfer counts.
pub struct Session<'a> {
    config: &'a SzConfig,
    progress: &'a mut dyn ProgressSink,
    muted: NoopProgress,
}

impl<'a> Session<'a> {
    /// Creates a session reporting to `progress`.
    pub fn new(config: &'a SzConfig, progress: &'a mut dyn ProgressSink) -> Self {
        Self {
            config,
            progress,
            muted: NoopProgress,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &'a SzConfig {
        self.config
    }

    /// Returns the sink progress should go to; a no-op sink in quiet mode.
    pub fn progress(&mut self) -> &mut dyn ProgressSink {
        if self.config.quiet {
            &mut self.muted
        } else {
            &mut *self.progress
        }
    }
}
