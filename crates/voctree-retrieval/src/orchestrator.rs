use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;
use tracing::info;

use voctree_core::config::WeightSource;
use voctree_core::error::{Error, Result};
use voctree_core::traits::Quantizer;
use voctree_core::types::{Descriptor, Document, DocumentMap, QueryBatch};
use voctree_db::Database;
use voctree_io::DocumentSource;

/// What `build_index` read from the corpus.
#[derive(Debug, Clone, Default)]
pub struct IndexSummary {
    pub documents: DocumentMap,
    /// Descriptors read per document, in document order.
    pub features_per_document: Vec<usize>,
    pub total_descriptors: usize,
}

/// Owns the quantizer and the database for one retrieval run.
///
/// The database is only borrowed mutably while building and weighting, so
/// every query runs against a finished index.
pub struct Orchestrator<Q: Quantizer> {
    quantizer: Q,
    database: Database,
}

impl<Q: Quantizer> Orchestrator<Q> {
    pub fn new(quantizer: Q) -> Self {
        let database = Database::new(quantizer.words());
        Self { quantizer, database }
    }

    pub fn quantizer(&self) -> &Q {
        &self.quantizer
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Quantize every corpus document and index it under the next dense id.
    pub fn build_index(&mut self, source: &DocumentSource) -> Result<IndexSummary> {
        info!("Reading descriptors from {}", source.path.display());
        let start = Instant::now();
        let pb = progress_bar(source.len(), "documents");
        let mut summary = IndexSummary::default();
        for descriptors in source.documents() {
            let descriptors = descriptors?;
            let document = self.quantize(&descriptors);
            let id = self.database.insert(&document)?;
            summary.features_per_document.push(descriptors.len());
            summary.total_descriptors += descriptors.len();
            summary.documents.insert(id, document);
            pb.inc(1);
        }
        pb.finish_and_clear();

        if summary.total_descriptors == 0 {
            return Err(Error::EmptyCorpus);
        }
        info!(
            "Done! {} sets of descriptors read for a total of {} features",
            summary.documents.len(),
            summary.total_descriptors
        );
        info!("Reading took {} ms", start.elapsed().as_millis());
        Ok(summary)
    }

    /// Load precomputed weights or compute TF-IDF weights, never both.
    pub fn resolve_weights(&mut self, weights: &WeightSource) -> Result<()> {
        match weights {
            WeightSource::File(path) => {
                info!("Loading weights from {}", path.display());
                self.database.load_weights(path)
            }
            WeightSource::Compute => {
                info!("No weights specified, computing weights...");
                self.database.compute_tfidf_weights();
                Ok(())
            }
        }
    }

    /// Query the index with its own documents.
    pub fn run_sanity_check(&self, results: usize) -> QueryBatch {
        info!("Sanity check: querying the database with the same documents");
        self.database.sanity_check(self.resolve_results(results))
    }

    /// Query the index with a separate document set.
    ///
    /// Query ids restart at 0 in read order and are unrelated to index ids.
    pub fn run_external_query(&self, source: &DocumentSource, results: usize) -> Result<QueryBatch> {
        info!("Querying the database with the documents in {}", source.path.display());
        let pb = progress_bar(source.len(), "queries");
        let mut queries = Vec::with_capacity(source.len());
        let mut total = 0usize;
        for descriptors in source.documents() {
            let descriptors = descriptors?;
            total += descriptors.len();
            queries.push(self.quantize(&descriptors));
            pb.inc(1);
        }
        pb.finish_and_clear();
        if total == 0 {
            return Err(Error::EmptyQuerySet);
        }

        let n = self.resolve_results(results);
        queries.iter().map(|q| self.database.find(q, n)).collect()
    }

    fn resolve_results(&self, results: usize) -> usize {
        if results == 0 {
            self.database.size()
        } else {
            results
        }
    }

    fn quantize(&self, descriptors: &[Descriptor]) -> Document {
        descriptors.iter().map(|d| self.quantizer.quantize(d)).collect()
    }
}

fn progress_bar(len: usize, unit: &str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let template = format!("{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {}", unit);
    let style = ProgressStyle::default_bar()
        .template(&template)
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}
