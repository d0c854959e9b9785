//! The archive ingestor: walks one or more class archives (recursing
//! into nested archives), applies the internal-package and user-supplied
//! filters, and batches the surviving class files into chunks a
//! disassembler can be invoked on.

mod filter;
mod scratch;
mod source;

pub mod ingest;

pub use filter::FilterRules;
pub use scratch::ScratchDir;
pub use source::{ArchiveSource, ClassEntry, Container, DirectoryArchiveSource, ZipArchiveSource};
pub(crate) use source::read_entry;

pub use ingest::{ingest, ChunkPlan};
