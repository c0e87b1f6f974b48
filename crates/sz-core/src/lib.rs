//! Snappy transcoding of files and directories.
//!
//! `sz-core` looks at an input path and does the obvious thing with it:
//!
//! - a Snappy framed stream is decompressed, and if the result is a tar
//!   archive it is extracted next to it;
//! - a directory is archived into a tar (hardlinks, symlinks, devices and the
//!   capability extended attribute included) and compressed;
//! - any other file is compressed.
//!
//! No output ever overwrites an existing path: destinations are picked by
//! [`naming::allocate`], which inserts a `(N)` disambiguator on collision.
//!
//! # Examples
//!
//! ```no_run
//! use sz_core::NoopProgress;
//! use sz_core::Session;
//! use sz_core::SzConfig;
//! use sz_core::analyze;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SzConfig::default();
//! let mut progress = NoopProgress;
//! let mut session = Session::new(&config, &mut progress);
//! let outcome = analyze(Path::new("project"), &mut session)?;
//! println!("wrote {}", outcome.output().display());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod artifact;
pub mod codec;
pub mod config;
pub mod copy;
pub mod creation;
pub mod error;
pub mod extraction;
pub mod formats;
pub mod io;
pub mod metadata;
pub mod naming;
pub mod progress;
pub mod report;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export main API types
pub use api::InputResult;
pub use api::Outcome;
pub use api::analyze;
pub use api::analyze_all;
pub use api::analyze_each;
pub use artifact::Artifact;
pub use codec::compress;
pub use codec::decompress;
pub use config::Session;
pub use config::SzConfig;
pub use creation::BuildReport;
pub use creation::TarBuilder;
pub use error::Result;
pub use error::SzError;
pub use extraction::TarExtractor;
pub use formats::Format;
pub use progress::ItemTracker;
pub use progress::NoopProgress;
pub use progress::ProgressSink;
pub use progress::ProgressUnit;
pub use report::ExtractionReport;
