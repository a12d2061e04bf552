use crate::types::{Descriptor, Word};

/// Maps a descriptor onto a visual word.
pub trait Quantizer: Send + Sync {
    fn quantize(&self, descriptor: &Descriptor) -> Word;
    /// Depth of the hierarchy.
    fn levels(&self) -> u32;
    /// Branching factor at every level.
    fn splits(&self) -> u32;
    /// Vocabulary size.
    fn words(&self) -> usize;
}
