//! Progress reporting.
//!
//! The core never renders progress itself. It reports `(transferred, total)`
//! pairs to a [`ProgressSink`], and the caller decides how to show them.
//!
//! # Components
//!
//! - **`ProgressSink`**: receiver of progress events
//! - **`NoopProgress`**: sink that discards everything
//! - **`ItemTracker`**: counts completed items against a known total

use std::path::Path;

/// What a progress total is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUnit {
    /// Byte counts (compression, decompression, extraction).
    Bytes,
    /// Item counts (archive members while building a tar).
    Items,
}

/// Callback trait for progress reporting during transcoding.
///
/// # Examples
///
/// ```
/// use sz_core::ProgressSink;
/// use sz_core::ProgressUnit;
/// use std::path::Path;
///
/// struct Percent;
///
/// impl ProgressSink for Percent {
///     fn on_start(&mut self, label: &Path, total: u64, unit: ProgressUnit) {
///         println!("{} ({total} {unit:?})", label.display());
///     }
///
///     fn on_progress(&mut self, transferred: u64, total: u64) {
///         if total > 0 {
///             println!("{}%", transferred * 100 / total);
///         }
///     }
///
///     fn on_finish(&mut self) {}
/// }
/// ```
pub trait ProgressSink {
    /// Called once before any transfer, with the output being produced.
    fn on_start(&mut self, label: &Path, total: u64, unit: ProgressUnit);

    /// Called with the cumulative amount transferred so far.
    ///
    /// `transferred` may exceed `total` when the declared total was only an
    /// estimate (for example, a compressed stream growing while read).
    fn on_progress(&mut self, transferred: u64, total: u64);

    /// Called once when the operation completes.
    fn on_finish(&mut self);
}

/// No-op implementation of `ProgressSink`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn on_start(&mut self, _label: &Path, _total: u64, _unit: ProgressUnit) {}

    fn on_progress(&mut self, _transferred: u64, _total: u64) {}

    fn on_finish(&mut self) {}
}

/// Counts completed items against a precomputed total.
///
/// Used by the tar builder, whose progress is "members written" rather than
/// bytes.
pub struct ItemTracker<'a> {
    progress: &'a mut dyn ProgressSink,
    completed: u64,
    total: u64,
}

impl<'a> ItemTracker<'a> {
    /// Starts tracking `total` items for the output `label`.
    pub fn start(progress: &'a mut dyn ProgressSink, label: &Path, total: u64) -> Self {
        progress.on_start(label, total, ProgressUnit::Items);
        Self {
            progress,
            completed: 0,
            total,
        }
    }

    /// Records one more completed item.
    pub fn complete_one(&mut self) {
        self.completed += 1;
        self.progress.on_progress(self.completed, self.total);
    }

    /// Returns the number of items completed so far.
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Reports completion of the whole operation.
    pub fn finish(self) {
        self.progress.on_finish();
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;

    #[test]
    fn test_item_tracker_counts() {
        let mut sink = RecordingSink::default();
        let mut tracker = ItemTracker::start(&mut sink, Path::new("d.tar"), 3);
        tracker.complete_one();
        tracker.complete_one();
        assert_eq!(tracker.completed(), 2);
        tracker.finish();

        assert_eq!(sink.started.len(), 1);
        assert_eq!(sink.started[0].1, 3);
        assert_eq!(sink.started[0].2, Some(ProgressUnit::Items));
        assert_eq!(sink.updates, vec![(1, 3), (2, 3)]);
        assert_eq!(sink.finished, 1);
    }

    #[test]
    fn test_noop_progress() {
        let mut sink = NoopProgress;
        sink.on_start(Path::new("x"), 10, ProgressUnit::Bytes);
        sink.on_progress(5, 10);
        sink.on_finish();
    }
}
