//! I/O utilities shared by the codec, builder and extractor.
//!
//! This module provides the counting decorators that feed progress sinks.

pub mod counting;

// Re-export main types for convenience
pub use counting::ProgressReader;
pub use counting::ProgressWriter;
