//! Directory archiving.
//!
//! A directory is walked once to count its entries and once more to write
//! them as tar members.

pub mod report;
pub mod tar;
pub mod walker;

pub use self::tar::HardlinkTable;
pub use self::tar::TarBuilder;
pub use self::tar::build;
pub use report::BuildReport;
pub use walker::ArchiveWalker;
pub use walker::EntryKind;
