use std::path::PathBuf;

use tracing::{debug, info};

use voctree_core::config::RetrievalConfig;
use voctree_core::error::Result;
use voctree_core::traits::Quantizer;
use voctree_core::types::QueryBatch;
use voctree_io::{DocumentSource, SceneDescription, SourceKind};
use voctree_tree::VocabularyTree;

use crate::orchestrator::Orchestrator;
use crate::report::{save_document_map, write_report};
use crate::sanity::{self, SanityReport};
use crate::symlinks::{self, QueryScene};

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub documents: usize,
    pub total_descriptors: usize,
    pub batch: QueryBatch,
    /// Present in self-query mode only.
    pub sanity: Option<SanityReport>,
    /// Bucket directories of the symlink tree, empty when it was not written.
    pub buckets: Vec<PathBuf>,
}

/// Load the vocabulary tree named by `config` and run the whole pipeline.
pub fn run(config: &RetrievalConfig) -> Result<RunSummary> {
    info!("Loading vocabulary tree");
    let tree = VocabularyTree::load(&config.tree)?;
    info!(
        "tree loaded with {} levels and {} branching factor",
        tree.levels(),
        tree.splits()
    );
    run_with(tree, config)
}

/// Run the pipeline with an already loaded quantizer.
///
/// Every input is loaded before the first output file is written, so a
/// load failure leaves nothing behind.
pub fn run_with<Q: Quantizer>(quantizer: Q, config: &RetrievalConfig) -> Result<RunSummary> {
    let mut orchestrator = Orchestrator::new(quantizer);

    info!("Creating the database...");
    let corpus = DocumentSource::open(&config.keylist)?;
    let index = orchestrator.build_index(&corpus)?;
    orchestrator.resolve_weights(&config.weights)?;

    let (batch, query_source) = match &config.querylist {
        None => (orchestrator.run_sanity_check(config.results), None),
        Some(path) => {
            let source = DocumentSource::open(path)?;
            (orchestrator.run_external_query(&source, config.results)?, Some(source))
        }
    };
    log_batch(&batch);

    let scenes = match &config.outdir {
        Some(outdir) => {
            let scenes_only = corpus.kind == SourceKind::SceneDescription
                && query_source.as_ref().map_or(true, |q| q.kind == SourceKind::SceneDescription);
            if scenes_only {
                let corpus_scene = load_scene(&config.keylist)?;
                let query_scene = match &config.querylist {
                    Some(path) => QueryScene::Owned(load_scene(path)?),
                    None => QueryScene::Corpus,
                };
                Some((outdir, corpus_scene, query_scene))
            } else {
                debug!("symlink tree needs scene descriptions, skipping {}", outdir.display());
                None
            }
        }
        None => None,
    };

    if let Some(path) = &config.document_map {
        info!("Saving the document map to {}", path.display());
        save_document_map(path, &index.documents)?;
    }
    if let Some(target) = &config.report {
        info!("Writing results to {}", target.path.display());
        write_report(target, &batch)?;
    }
    let buckets = match &scenes {
        Some((outdir, corpus_scene, query_scene)) => {
            symlinks::materialize(outdir, corpus_scene, query_scene.resolve(corpus_scene), &batch)?
        }
        None => Vec::new(),
    };

    let sanity = config.querylist.is_none().then(|| sanity::evaluate(&batch));

    Ok(RunSummary {
        documents: index.documents.len(),
        total_descriptors: index.total_descriptors,
        batch,
        sanity,
        buckets,
    })
}

fn load_scene(path: &std::path::Path) -> Result<SceneDescription> {
    let scene = SceneDescription::load(path)?;
    info!("SfM data loaded from {} containing {} views", path.display(), scene.len());
    Ok(scene)
}

fn log_batch(batch: &QueryBatch) {
    for (i, matches) in batch.iter().enumerate() {
        match matches.first() {
            Some(best) => info!(
                "query document {} has {} matches\tBest {} with score {}",
                i,
                matches.len(),
                best.id,
                best.score
            ),
            None => info!("query document {} has no matches", i),
        }
        for m in matches {
            debug!("\t match {} with score {}", m.id, m.score);
        }
    }
}
