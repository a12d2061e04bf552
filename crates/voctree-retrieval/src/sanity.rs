use tracing::{info, warn};

use voctree_core::types::{DocId, QueryBatch};

/// Outcome of a self-query run: the queries whose best match was not themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanityReport {
    pub mismatches: Vec<DocId>,
}

impl SanityReport {
    pub fn wrong(&self) -> usize {
        self.mismatches.len()
    }

    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Count the documents that do not retrieve themselves first.
///
/// An empty match list counts as a mismatch. The batch is left untouched.
pub fn evaluate(batch: &QueryBatch) -> SanityReport {
    let mismatches: Vec<DocId> = batch
        .iter()
        .enumerate()
        .filter(|(i, matches)| matches.first().map_or(true, |best| best.id != *i))
        .map(|(i, _)| i)
        .collect();
    for id in &mismatches {
        warn!("##### wrong match for document {}", id);
    }
    let report = SanityReport { mismatches };
    if report.is_clean() {
        info!("no wrong matches!");
    } else {
        info!("there are {} wrong matches", report.wrong());
    }
    report
}
