//! voctree-retrieval
//!
//! Builds a vocabulary-tree index over a corpus, answers ranked queries
//! (self-query sanity check or an external query set) and materializes the
//! results as a report file and as a directory tree of symbolic links.
pub mod orchestrator;
pub mod pipeline;
pub mod report;
pub mod sanity;
pub mod symlinks;

pub use orchestrator::{IndexSummary, Orchestrator};
pub use pipeline::{run, run_with, RunSummary};
pub use sanity::SanityReport;
pub use symlinks::QueryScene;
