//! Buffered copy with a reusable buffer.
//!
//! Extraction copies many member bodies in a row; a single [`CopyBuffer`] is
//! allocated per archive and reused for every member.

use std::io::Read;
use std::io::Write;
use std::io::{self};

use crate::Result;
use crate::SzError;

/// Heap buffer reused across copy operations.
///
/// # Examples
///
/// ```no_run
/// # use sz_core::copy::{CopyBuffer, copy_with_buffer};
/// # fn example() -> sz_core::Result<()> {
/// let mut buffer = CopyBuffer::with_capacity(64 * 1024);
/// let mut input = std::fs::File::open("input.txt")?;
/// let mut output = std::fs::File::create("output.txt")?;
///
/// let bytes_copied = copy_with_buffer(&mut input, &mut output, &mut buffer)?;
/// println!("Copied {bytes_copied} bytes");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CopyBuffer {
    buf: Vec<u8>,
}

impl CopyBuffer {
    /// Creates a zeroed buffer of `capacity` bytes (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity.max(1)],
        }
    }

    /// Returns the buffer size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.buf.len()
    }
}

impl Default for CopyBuffer {
    fn default() -> Self {
        Self::with_capacity(crate::config::DEFAULT_BUFFER_SIZE)
    }
}

/// Copies `reader` into `writer` through `buffer`, returning the byte count.
///
/// `Interrupted` reads are retried. A read failing with `InvalidData` or
/// `UnexpectedEof` means the source stream is malformed and is reported as
/// [`SzError::CorruptStream`].
///
/// # Errors
///
/// Returns an error if reading or writing fails.
#[inline]
pub fn copy_with_buffer<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    buffer: &mut CopyBuffer,
) -> Result<u64> {
    let mut total: u64 = 0;

    loop {
        let bytes_read = match reader.read(&mut buffer.buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(classify_read_error(e)),
        };

        writer.write_all(&buffer.buf[..bytes_read])?;
        total += bytes_read as u64;
    }

    Ok(total)
}

/// Maps a read error on an archive or compressed stream to [`SzError`].
pub(crate) fn classify_read_error(err: io::Error) -> SzError {
    match err.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
            SzError::corrupt(err.to_string())
        }
        _ => SzError::Io(err),
    }
}
