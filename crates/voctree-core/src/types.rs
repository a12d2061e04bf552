//! Domain types shared by the quantizer, the database and the retrieval pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Length of every local feature descriptor.
pub const DESCRIPTOR_DIM: usize = 128;

/// One local feature's numeric signature.
pub type Descriptor = [f32; DESCRIPTOR_DIM];

/// A visual word: the leaf of the vocabulary tree a descriptor falls into.
pub type Word = u32;

/// Dense, zero-based document identifier assigned in read order.
pub type DocId = usize;

/// Bag of visual words for one image.
///
/// One word per descriptor, duplicates kept, in descriptor read order.
pub type Document = Vec<Word>;

/// Corpus index: document id to its bag of words.
pub type DocumentMap = BTreeMap<DocId, Document>;

/// One scored retrieval result. `score` is never negative and higher is
/// always better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: DocId,
    pub score: f32,
}

/// Ranked results for one query document, best match first.
pub type Matches = Vec<Match>;

/// Every query's match list, index-aligned with the queried documents.
pub type QueryBatch = Vec<Matches>;
