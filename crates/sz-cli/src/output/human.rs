//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use crate::progress::humanize_bytes;
use anyhow::Result;
use console::Term;
use console::style;
use std::path::Path;
use sz_core::Outcome;

pub struct HumanFormatter {
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn verb(outcome: &Outcome) -> &'static str {
        match outcome {
            Outcome::Decompressed { .. } => "Decompressed",
            Outcome::Extracted { .. } => "Extracted",
            Outcome::Archived { .. } => "Archived",
            Outcome::Compressed { .. } => "Compressed",
        }
    }

    /// Second line summarizing archive members, if the outcome has any.
    fn summary(outcome: &Outcome) -> Option<String> {
        match outcome {
            Outcome::Archived { build, .. } => Some(format!(
                "  {} files, {} directories, {} links, {}",
                build.files_added,
                build.directories_added,
                build.symlinks_added + build.hardlinks_added,
                humanize_bytes(build.bytes_written)
            )),
            Outcome::Extracted { report, .. } => Some(format!(
                "  {} files, {} directories, {} links, {}",
                report.files_extracted,
                report.directories_created,
                report.symlinks_created + report.hardlinks_created,
                humanize_bytes(report.bytes_written)
            )),
            Outcome::Compressed { .. } | Outcome::Decompressed { .. } => None,
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_outcome(&self, input: &Path, outcome: &Outcome) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let line = format!(
            "{} {} -> {}",
            Self::verb(outcome),
            input.display(),
            outcome.output().display()
        );
        if self.use_colors {
            self.term
                .write_line(&format!("{} {line}", style("✓").green().bold()))?;
        } else {
            self.term.write_line(&line)?;
        }

        if let Some(summary) = Self::summary(outcome) {
            self.term.write_line(&summary)?;
        }
        Ok(())
    }

    fn format_error(&self, _input: &Path, error: &anyhow::Error) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {error:?}", style("ERROR:").red().bold()));
        } else {
            let _ = self.term.write_line(&format!("ERROR: {error:?}"));
        }
    }
}
