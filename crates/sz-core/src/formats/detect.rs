//! Content-based format detection.
//!
//! Formats are recognized by magic bytes at fixed offsets, never by file
//! extension. Probes use positional reads so the source's cursor is left
//! where it was and the file can be streamed from the start afterwards.

use std::fs::File;

/// Snappy framing format stream identifier (10 bytes at offset 0).
pub const SNAPPY_SIGNATURE: [u8; 10] = [0xFF, 0x06, 0x00, 0x00, b's', b'N', b'a', b'P', b'p', b'Y'];

/// Ustar magic (5 bytes at offset 257).
pub const TAR_SIGNATURE: [u8; 5] = *b"ustar";

/// Offset of the ustar magic inside the first tar header block.
pub const TAR_SIGNATURE_OFFSET: u64 = 257;

/// Classification of a byte source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Snappy-framed compressed stream.
    Compressed,
    /// Uncompressed tar stream.
    Tar,
    /// Anything else.
    Unknown,
}

/// A byte source that can be read at an arbitrary offset without moving a
/// cursor.
pub trait PositionalRead {
    /// Reads up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns the number of bytes read; `0` means end of source.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> std::io::Result<usize>;
}

#[cfg(unix)]
impl PositionalRead for File {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
        std::os::unix::fs::FileExt::read_at(self, buf, offset)
    }
}

#[cfg(windows)]
impl PositionalRead for File {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
        std::os::windows::fs::FileExt::seek_read(self, buf, offset)
    }
}

impl PositionalRead for [u8] {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= self.len() {
            return Ok(0);
        }
        let available = &self[start..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        Ok(n)
    }
}

impl PositionalRead for Vec<u8> {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
        self.as_slice().read_at(buf, offset)
    }
}

/// Returns `true` if exactly `expected` is found at `offset`.
///
/// Short sources and read errors count as a mismatch.
fn matches_at<S: PositionalRead + ?Sized>(source: &S, offset: u64, expected: &[u8]) -> bool {
    let mut buf = [0u8; 16];
    let buf = &mut buf[..expected.len()];
    let mut filled = 0;

    while filled < buf.len() {
        match source.read_at(&mut buf[filled..], offset + filled as u64) {
            Ok(0) | Err(_) => return false,
            Ok(n) => filled += n,
        }
    }

    buf == expected
}

/// Returns `true` if the source starts with the Snappy framing signature.
///
/// # Examples
///
/// ```
/// use sz_core::formats::is_compressed_archive;
///
/// let stream = b"\xff\x06\x00\x00sNaPpY\x01\x02".to_vec();
/// assert!(is_compressed_archive(&stream));
/// assert!(!is_compressed_archive(&b"sNaPpY".to_vec()));
/// ```
pub fn is_compressed_archive<S: PositionalRead + ?Sized>(source: &S) -> bool {
    matches_at(source, 0, &SNAPPY_SIGNATURE)
}

/// Returns `true` if the source carries the ustar magic at offset 257.
pub fn is_tar_stream<S: PositionalRead + ?Sized>(source: &S) -> bool {
    matches_at(source, TAR_SIGNATURE_OFFSET, &TAR_SIGNATURE)
}

/// Classifies a source, checking the compressed signature first.
pub fn sniff<S: PositionalRead + ?Sized>(source: &S) -> Format {
    if is_compressed_archive(source) {
        Format::Compressed
    } else if is_tar_stream(source) {
        Format::Tar
    } else {
        Format::Unknown
    }
}
