//! Per-input transcoding loop.

use crate::error::convert_error;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use std::path::Path;
use std::path::PathBuf;
use sz_core::InputResult;
use sz_core::NoopProgress;
use sz_core::Outcome;
use sz_core::ProgressSink;
use sz_core::SzConfig;
use sz_core::analyze_each;

/// Processes every path in order and reports each result as soon as its
/// input is done.
///
/// Failures are reported and never stop the batch.
pub fn execute(paths: &[PathBuf], quiet: bool, formatter: &dyn OutputFormatter) {
    let config = SzConfig::default().with_quiet(quiet);
    let show_progress = !quiet && CliProgress::should_show();

    analyze_each(
        paths,
        &config,
        |_| -> Box<dyn ProgressSink> {
            if show_progress {
                Box::new(CliProgress::new())
            } else {
                Box::new(NoopProgress)
            }
        },
        |InputResult { input, result }| report(formatter, &input, result),
    );
}

fn report(formatter: &dyn OutputFormatter, input: &Path, result: sz_core::Result<Outcome>) {
    match result {
        Ok(outcome) => {
            if let Err(e) = formatter.format_outcome(input, &outcome) {
                formatter.format_error(input, &e);
            }
        }
        Err(err) => formatter.format_error(input, &convert_error(err, input)),
    }
}
