//! Tar archive extraction.

pub mod tar;

pub use self::tar::TarExtractor;
pub use self::tar::extract;
