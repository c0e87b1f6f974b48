//! Progress bar implementation for CLI operations.

use console::Term;
use indicatif::ProgressBar;
use indicatif::ProgressDrawTarget;
use indicatif::ProgressState;
use indicatif::ProgressStyle;
use std::fmt::Write;
use std::path::Path;
use sz_core::ProgressSink;
use sz_core::ProgressUnit;

/// CLI progress bar implementing `ProgressSink`.
///
/// Shows `NN%  done / total` for the output being written. A fresh bar is
/// drawn for every operation started on the sink, so a directory shows one
/// bar for archiving and one for compressing.
pub struct CliProgress {
    bar: Option<ProgressBar>,
}

impl CliProgress {
    /// Creates an idle progress sink; bars appear on `on_start`.
    #[must_use]
    pub fn new() -> Self {
        Self { bar: None }
    }

    /// Checks if we should show progress (TTY detection).
    #[must_use]
    pub fn should_show() -> bool {
        Term::stderr().is_term()
    }

    fn style(unit: ProgressUnit) -> ProgressStyle {
        let template = match unit {
            ProgressUnit::Bytes => "{percent:>3}%  {bytes} / {total} {wide_msg}",
            ProgressUnit::Items => "{percent:>3}%  {pos} / {len} entries {wide_msg}",
        };
        ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .with_key("bytes", |state: &ProgressState, w: &mut dyn Write| {
                write!(w, "{}", humanize_bytes(state.pos())).unwrap_or(());
            })
            .with_key("total", |state: &ProgressState, w: &mut dyn Write| {
                write!(w, "{}", humanize_bytes(state.len().unwrap_or(0))).unwrap_or(());
            })
    }
}

impl Default for CliProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl ProgressSink for CliProgress {
    fn on_start(&mut self, label: &Path, total: u64, unit: ProgressUnit) {
        if let Some(previous) = self.bar.take() {
            previous.finish_and_clear();
        }
        let bar = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
        bar.set_style(Self::style(unit));
        bar.set_message(label.display().to_string());
        self.bar = Some(bar);
    }

    fn on_progress(&mut self, transferred: u64, total: u64) {
        if let Some(bar) = &self.bar {
            // Compressed sources may yield more bytes than their stat'd size.
            if transferred > total {
                bar.set_length(transferred);
            }
            bar.set_position(transferred);
        }
    }

    fn on_finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Converts bytes to human-readable format (KB, MB, GB, TB).
pub fn humanize_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.1} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
