//! voctree-io
//!
//! Readers for the on-disk inputs of a retrieval run: descriptor files,
//! image lists and scene descriptions (`sfm_data.json`).
pub mod descriptors;
pub mod scene;

pub use descriptors::{DocumentSource, SourceKind};
pub use scene::{SceneDescription, View};
