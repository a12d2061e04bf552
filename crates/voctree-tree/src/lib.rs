//! voctree-tree
//!
//! Hierarchical k-means vocabulary tree used to quantize descriptors into
//! visual words. Training is out of scope; trees are loaded from disk.
pub mod tree;

pub use tree::VocabularyTree;
