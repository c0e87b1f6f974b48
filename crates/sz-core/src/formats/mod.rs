//! Stream format detection.

pub mod detect;

pub use detect::Format;
pub use detect::PositionalRead;
pub use detect::is_compressed_archive;
pub use detect::is_tar_stream;
pub use detect::sniff;
