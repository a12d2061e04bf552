use std::collections::BTreeMap;
use std::path::Path;

use voctree_core::error::{Error, Result};
use voctree_core::types::{DocId, Document, Match, Matches, QueryBatch, Word};

use crate::weights::{read_weights, write_weights};

/// Weight given to words that no indexed document contains.
const DEFAULT_WEIGHT: f32 = 1.0;

/// Sparse, L1-normalised, weighted word histogram sorted by word.
type DocumentVector = Vec<(Word, f32)>;

/// A posting: one document's normalised weight for a word.
#[derive(Debug, Clone, Copy)]
struct Posting {
    doc: DocId,
    value: f32,
}

/// Bag-of-words database scored with weighted L1 distance.
///
/// Raw word counts are kept per document so that vectors can be rebuilt
/// whenever the word weights change. Scores are `2 - |q - d|_1`, so they
/// live in `[0, 2]` and higher is better.
#[derive(Debug, Clone)]
pub struct Database {
    word_weights: Vec<f32>,
    histograms: Vec<BTreeMap<Word, u32>>,
    vectors: Vec<DocumentVector>,
    norms: Vec<f32>,
    inverted: Vec<Vec<Posting>>,
}

impl Database {
    pub fn new(num_words: usize) -> Self {
        Self {
            word_weights: vec![DEFAULT_WEIGHT; num_words],
            histograms: Vec::new(),
            vectors: Vec::new(),
            norms: Vec::new(),
            inverted: vec![Vec::new(); num_words],
        }
    }

    /// Number of indexed documents.
    pub fn size(&self) -> usize {
        self.histograms.len()
    }

    /// Vocabulary size.
    pub fn words(&self) -> usize {
        self.word_weights.len()
    }

    pub fn weights(&self) -> &[f32] {
        &self.word_weights
    }

    /// Index a document under the next dense id.
    pub fn insert(&mut self, document: &Document) -> Result<DocId> {
        let histogram = self.histogram(document)?;
        let id = self.histograms.len();
        let (vector, norm) = self.weighted_vector(&histogram);
        for &(word, value) in &vector {
            self.inverted[word as usize].push(Posting { doc: id, value });
        }
        self.histograms.push(histogram);
        self.vectors.push(vector);
        self.norms.push(norm);
        Ok(id)
    }

    /// Inverse document frequency over the indexed documents.
    ///
    /// Depends only on the stored word counts, so calling it again on an
    /// unchanged index yields the same weights.
    pub fn compute_tfidf_weights(&mut self) {
        let n = self.histograms.len() as f32;
        let mut doc_freq = vec![0usize; self.words()];
        for histogram in &self.histograms {
            for &word in histogram.keys() {
                doc_freq[word as usize] += 1;
            }
        }
        self.word_weights = doc_freq
            .into_iter()
            .map(|df| if df == 0 { DEFAULT_WEIGHT } else { (n / df as f32).ln() })
            .collect();
        self.rebuild_vectors();
    }

    pub fn load_weights(&mut self, path: &Path) -> Result<()> {
        let weights = read_weights(path)?;
        if weights.len() != self.words() {
            return Err(Error::parse(
                path,
                format!("{} weights for a vocabulary of {} words", weights.len(), self.words()),
            ));
        }
        self.word_weights = weights;
        self.rebuild_vectors();
        Ok(())
    }

    pub fn save_weights(&self, path: &Path) -> Result<()> {
        write_weights(path, &self.word_weights)
    }

    /// Best `n` matches for `document`, by descending score, ties broken by
    /// ascending document id.
    pub fn find(&self, document: &Document, n: usize) -> Result<Matches> {
        let histogram = self.histogram(document)?;
        let (vector, norm) = self.weighted_vector(&histogram);
        Ok(self.rank(&vector, norm, n))
    }

    /// Query the database with each of its own documents.
    pub fn sanity_check(&self, n: usize) -> QueryBatch {
        self.vectors
            .iter()
            .zip(&self.norms)
            .map(|(vector, &norm)| self.rank(vector, norm, n))
            .collect()
    }

    fn histogram(&self, document: &Document) -> Result<BTreeMap<Word, u32>> {
        let mut histogram = BTreeMap::new();
        for &word in document {
            if word as usize >= self.words() {
                return Err(Error::Operation(format!(
                    "word {} outside a vocabulary of {} words",
                    word,
                    self.words()
                )));
            }
            *histogram.entry(word).or_insert(0) += 1;
        }
        Ok(histogram)
    }

    fn weighted_vector(&self, histogram: &BTreeMap<Word, u32>) -> (DocumentVector, f32) {
        let mut vector: DocumentVector = histogram
            .iter()
            .map(|(&word, &count)| (word, count as f32 * self.word_weights[word as usize]))
            .filter(|&(_, value)| value != 0.0)
            .collect();
        let norm: f32 = vector.iter().map(|(_, v)| v.abs()).sum();
        if norm > 0.0 {
            for (_, value) in &mut vector {
                *value /= norm;
            }
            (vector, 1.0)
        } else {
            (Vec::new(), 0.0)
        }
    }

    fn rebuild_vectors(&mut self) {
        let (vectors, norms): (Vec<_>, Vec<_>) =
            self.histograms.iter().map(|h| self.weighted_vector(h)).unzip();
        self.inverted = vec![Vec::new(); self.words()];
        for (doc, vector) in vectors.iter().enumerate() {
            for &(word, value) in vector {
                self.inverted[word as usize].push(Posting { doc, value });
            }
        }
        self.vectors = vectors;
        self.norms = norms;
        tracing::debug!(documents = self.vectors.len(), "document vectors reweighted");
    }

    // |q - d|_1 = |q|_1 + |d|_1 - 2 * sum(min(q_w, d_w)) over shared words,
    // valid because every stored value is non-negative after weighting.
    fn rank(&self, query: &DocumentVector, query_norm: f32, n: usize) -> Matches {
        let mut scores: Vec<f32> = self.norms.iter().map(|&norm| 2.0 - query_norm - norm).collect();
        for &(word, q) in query {
            for posting in &self.inverted[word as usize] {
                scores[posting.doc] += 2.0 * q.abs().min(posting.value.abs());
            }
        }
        let mut matches: Matches = scores
            .into_iter()
            .enumerate()
            .map(|(id, score)| Match { id, score: score.max(0.0) })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
        matches.truncate(n);
        matches
    }
}
