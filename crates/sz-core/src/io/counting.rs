//! Counting adapters that report transferred bytes to a progress sink.
//!
//! Any byte source or sink can be wrapped by [`ProgressReader`] or
//! [`ProgressWriter`]; the wrapper implements the same `Read`/`Write`
//! interface and forwards every call.
//!
//! # Batching Behavior
//!
//! Both adapters accumulate transferred bytes and only invoke the sink when:
//!
//! 1. The bytes since the last report reach the batch threshold
//! 2. `flush_progress` is called or the adapter is dropped (flushes the remainder)

use crate::progress::ProgressSink;
use std::io::Read;
use std::io::Write;

/// Shared counting state for both adapters.
struct Counter<'a> {
    progress: &'a mut dyn ProgressSink,
    total: u64,
    transferred: u64,
    unreported: u64,
    batch_threshold: u64,
}

impl<'a> Counter<'a> {
    fn new(progress: &'a mut dyn ProgressSink, total: u64, batch_threshold: u64) -> Self {
        Self {
            progress,
            total,
            transferred: 0,
            unreported: 0,
            batch_threshold,
        }
    }

    fn add(&mut self, bytes: usize) {
        if bytes == 0 {
            return;
        }
        self.transferred += bytes as u64;
        self.unreported += bytes as u64;
        if self.unreported >= self.batch_threshold {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if self.unreported > 0 {
            self.progress.on_progress(self.transferred, self.total);
            self.unreported = 0;
        }
    }
}

/// Reader that counts bytes read and reports them against a declared total.
///
/// # Examples
///
/// ```
/// use sz_core::NoopProgress;
/// use sz_core::io::ProgressReader;
/// use std::io::Read;
///
/// let mut sink = NoopProgress;
/// let mut reader = ProgressReader::new(&b"hello"[..], &mut sink, 5, 1024);
/// let mut out = String::new();
/// reader.read_to_string(&mut out)?;
/// assert_eq!(reader.transferred(), 5);
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct ProgressReader<'a, R> {
    inner: R,
    counter: Counter<'a>,
}

impl<'a, R> ProgressReader<'a, R> {
    /// Wraps `inner`, reporting to `progress` every `batch_threshold` bytes.
    pub fn new(
        inner: R,
        progress: &'a mut dyn ProgressSink,
        total: u64,
        batch_threshold: u64,
    ) -> Self {
        Self {
            inner,
            counter: Counter::new(progress, total, batch_threshold),
        }
    }

    /// Returns the number of bytes read so far.
    #[must_use]
    pub fn transferred(&self) -> u64 {
        self.counter.transferred
    }

    /// Returns a reference to the inner reader.
    #[must_use]
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Reports any bytes not yet reported.
    pub fn flush_progress(&mut self) {
        self.counter.flush();
    }
}

impl<R: Read> Read for ProgressReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let bytes_read = self.inner.read(buf)?;
        self.counter.add(bytes_read);
        Ok(bytes_read)
    }
}

impl<R> Drop for ProgressReader<'_, R> {
    fn drop(&mut self) {
        self.counter.flush();
    }
}

/// Writer that counts bytes written and reports them against a declared
/// total.
///
/// The counter only increments on successful writes. If a write fails
/// partway through, only the bytes the inner writer accepted are counted.
pub struct ProgressWriter<'a, W> {
    inner: W,
    counter: Counter<'a>,
}

impl<'a, W> ProgressWriter<'a, W> {
    /// Wraps `inner`, reporting to `progress` every `batch_threshold` bytes.
    pub fn new(
        inner: W,
        progress: &'a mut dyn ProgressSink,
        total: u64,
        batch_threshold: u64,
    ) -> Self {
        Self {
            inner,
            counter: Counter::new(progress, total, batch_threshold),
        }
    }

    /// Returns the number of bytes written so far.
    #[must_use]
    pub fn transferred(&self) -> u64 {
        self.counter.transferred
    }

    /// Returns a mutable reference to the inner writer.
    ///
    /// Bytes written directly to the inner writer are not counted.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Reports any bytes not yet reported.
    pub fn flush_progress(&mut self) {
        self.counter.flush();
    }
}

impl<W: Write> Write for ProgressWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let bytes = self.inner.write(buf)?;
        self.counter.add(bytes);
        Ok(bytes)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl<W> Drop for ProgressWriter<'_, W> {
    fn drop(&mut self) {
        self.counter.flush();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::unused_io_amount)]
mod tests {
    use super::*;
    use crate::progress::testing::RecordingSink;
    use std::io::Cursor;

    #[test]
    fn test_reader_reports_on_drop() {
        let mut sink = RecordingSink::default();
        let mut reader = ProgressReader::new(Cursor::new(b"Hello, World!"), &mut sink, 13, 1024);
        let mut buffer = vec![0u8; 5];
        let n = reader.read(&mut buffer).unwrap();
        assert_eq!(n, 5);
        drop(reader);

        assert_eq!(sink.updates, vec![(5, 13)]);
        assert_eq!(&buffer[..n], b"Hello");
    }

    #[test]
    fn test_reader_batching() {
        let data = vec![0u8; 256 * 1024];
        let mut sink = RecordingSink::default();
        {
            let mut reader =
                ProgressReader::new(Cursor::new(&data), &mut sink, data.len() as u64, 64 * 1024);
            let mut buffer = vec![0u8; 32 * 1024];
            while reader.read(&mut buffer).unwrap() > 0 {}
        }

        assert_eq!(sink.updates.len(), 4);
        assert_eq!(sink.last(), Some((256 * 1024, 256 * 1024)));
    }

    #[test]
    fn test_reader_eof_reports_nothing() {
        let mut sink = RecordingSink::default();
        {
            let mut reader = ProgressReader::new(Cursor::new(b""), &mut sink, 0, 1);
            let mut buffer = vec![0u8; 10];
            assert_eq!(reader.read(&mut buffer).unwrap(), 0);
        }
        assert!(sink.updates.is_empty());
    }

    #[test]
    fn test_writer_counts_bytes() {
        let mut sink = RecordingSink::default();
        let mut buffer = Vec::new();
        {
            let mut writer = ProgressWriter::new(&mut buffer, &mut sink, 13, 1);
            writer.write_all(b"Hello, ").unwrap();
            writer.write_all(b"World!").unwrap();
            assert_eq!(writer.transferred(), 13);
        }
        assert_eq!(buffer, b"Hello, World!");
        assert_eq!(sink.last(), Some((13, 13)));
    }

    #[test]
    fn test_writer_partial_write() {
        struct LimitedWriter {
            inner: Vec<u8>,
            max_write: usize,
        }

        impl Write for LimitedWriter {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                let to_write = buf.len().min(self.max_write);
                self.inner.extend_from_slice(&buf[..to_write]);
                Ok(to_write)
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut sink = RecordingSink::default();
        let limited = LimitedWriter {
            inner: Vec::new(),
            max_write: 3,
        };
        let mut writer = ProgressWriter::new(limited, &mut sink, 5, 1024);
        let written = writer.write(b"hello").unwrap();
        assert_eq!(written, 3);
        assert_eq!(writer.transferred(), 3);
        assert_eq!(writer.get_mut().inner, b"hel");
    }
}
