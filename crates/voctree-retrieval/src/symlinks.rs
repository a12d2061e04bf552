//! Ranked results as a directory tree of symbolic links.
//!
//! ```text
//! <outdir>/
//!   IMG_0001.jpg/            one bucket per query image
//!     IMG_0001.jpg -> /root/IMG_0001.jpg
//!     0000.IMG_0001.jpg -> /root/IMG_0001.jpg
//!     0001.IMG_0042.jpg -> /root/IMG_0042.jpg
//! ```
//!
//! Sorting a bucket's listing reproduces the rank order.
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use voctree_core::error::{Error, Result};
use voctree_core::types::{DocId, QueryBatch};
use voctree_io::{SceneDescription, View};

/// Width of the rank prefix of each link name.
pub const RANK_WIDTH: usize = 4;

/// Scene the query ids resolve against.
#[derive(Debug, Clone)]
pub enum QueryScene {
    /// Self-query: queries are the corpus documents.
    Corpus,
    /// A separately loaded query set.
    Owned(SceneDescription),
}

impl QueryScene {
    pub fn resolve<'a>(&'a self, corpus: &'a SceneDescription) -> &'a SceneDescription {
        match self {
            Self::Corpus => corpus,
            Self::Owned(scene) => scene,
        }
    }
}

/// Link name of the match at rank `rank`.
pub fn rank_link_name(rank: usize, file_name: &str) -> String {
    format!("{:0width$}.{}", rank, file_name, width = RANK_WIDTH)
}

/// Absolute image path and file name of a view.
fn lookup(scene: &SceneDescription, id: DocId) -> Result<(PathBuf, &str)> {
    let file_name = scene.view(id).and_then(View::file_name).ok_or(Error::Consistency { id })?;
    let image = scene.image_path(id).ok_or(Error::Consistency { id })?;
    Ok((image, file_name))
}

/// Create or replace a symbolic link at `link` pointing to `target`.
fn replace_symlink(target: &Path, link: &Path) -> Result<()> {
    if fs::symlink_metadata(link).is_ok() {
        fs::remove_file(link).map_err(|e| Error::io(link, e))?;
    }
    symlink(target, link).map_err(|e| Error::io(link, e))
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// Write one bucket per query under `outdir`.
///
/// Aborts on the first id missing from its scene; buckets already written
/// stay on disk, later queries are not touched. Returns the bucket paths in
/// query order.
pub fn materialize(
    outdir: &Path,
    corpus: &SceneDescription,
    queries: &SceneDescription,
    batch: &QueryBatch,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(outdir).map_err(|e| Error::io(outdir, e))?;
    let mut used = HashSet::new();
    let mut buckets = Vec::with_capacity(batch.len());

    for (i, matches) in batch.iter().enumerate() {
        let (query_image, file_name) = lookup(queries, i)?;
        let bucket_name = if used.insert(file_name.to_string()) {
            file_name.to_string()
        } else {
            let name = format!("{}.{}", i, file_name);
            warn!("query image name {} already has a bucket, using {}", file_name, name);
            used.insert(name.clone());
            name
        };
        let bucket = outdir.join(&bucket_name);
        fs::create_dir_all(&bucket).map_err(|e| Error::io(&bucket, e))?;
        replace_symlink(&query_image, &bucket.join(file_name))?;

        if matches.len() > 10usize.pow(RANK_WIDTH as u32) {
            warn!(
                "{} matches for query {} exceed the {}-digit rank prefix, listing order will not follow rank",
                matches.len(),
                i,
                RANK_WIDTH
            );
        }
        for (rank, m) in matches.iter().enumerate() {
            let (target, matched_name) = lookup(corpus, m.id)?;
            let link = bucket.join(rank_link_name(rank, matched_name));
            debug!("{} -> {}", link.display(), target.display());
            replace_symlink(&target, &link)?;
        }
        buckets.push(bucket);
    }
    Ok(buckets)
}
