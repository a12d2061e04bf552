//! voctree-query: index a corpus with a vocabulary tree and query it.
//!
//! Without `--querylist` every corpus document is used as a query against
//! the corpus itself, and the documents that do not retrieve themselves
//! first are reported.

use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use figment::providers::Serialized;
use tracing::info;
use tracing_subscriber::EnvFilter;

use voctree_core::config::{Config, RunOptions};
use voctree_core::Error;

#[derive(Parser, Debug)]
#[command(name = "voctree-query")]
#[command(about = "Build a vocabulary tree database from a set of images and query it")]
struct Args {
    /// Vocabulary tree file
    #[arg(short, long, value_name = "PATH")]
    tree: Option<PathBuf>,

    /// Image list (.txt) or scene description (.json) of the documents to index
    #[arg(short = 'l', long, value_name = "PATH")]
    keylist: Option<PathBuf>,

    /// Precomputed word weights; weights are computed from the index otherwise
    #[arg(short, long, value_name = "PATH")]
    weights: Option<PathBuf>,

    /// Image list or scene description of the query documents
    #[arg(short, long, value_name = "PATH")]
    querylist: Option<PathBuf>,

    /// File to write the query results to
    #[arg(short, long, value_name = "PATH")]
    outfile: Option<PathBuf>,

    /// Write the results as matlab cell assignments
    #[arg(long)]
    matlab: bool,

    /// Directory receiving one folder of symbolic links per query.
    /// Needs scene descriptions (.json) as inputs
    #[arg(long, value_name = "DIR")]
    outdir: Option<PathBuf>,

    /// Matches to retrieve per query, 0 for all [default: 10]
    #[arg(short, long, value_name = "N")]
    results: Option<usize>,

    /// Write the quantized documents to this file
    #[arg(long, value_name = "PATH")]
    save_document_map: Option<PathBuf>,

    /// Verbosity: 0 warnings only, 1 progress, 2 every match [default: 1]
    #[arg(short, long, value_name = "LEVEL")]
    verbose: Option<u8>,
}

impl Args {
    /// Only flags given on the command line override lower layers.
    fn options(&self) -> RunOptions {
        let path = |p: &Option<PathBuf>| p.as_ref().map(|p| p.to_string_lossy().into_owned());
        RunOptions {
            tree: path(&self.tree),
            keylist: path(&self.keylist),
            weights: path(&self.weights),
            querylist: path(&self.querylist),
            outfile: path(&self.outfile),
            matlab: self.matlab.then_some(true),
            outdir: path(&self.outdir),
            results: self.results,
            save_document_map: path(&self.save_document_map),
            verbose: self.verbose,
        }
    }
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match Config::load(Serialized::defaults(args.options())).and_then(|c| c.retrieval()) {
        Ok(config) => config,
        Err(Error::InvalidConfig(message)) => {
            eprintln!("error: {}\n", message);
            eprintln!("{}", Args::command().render_usage());
            std::process::exit(2);
        }
        Err(e) => return Err(e).context("failed to load configuration"),
    };
    init_tracing(config.verbosity);

    let summary = voctree_retrieval::run(&config)
        .with_context(|| format!("retrieval over {} failed", config.keylist.display()))?;

    info!(
        "{} queries answered against {} documents ({} descriptors)",
        summary.batch.len(),
        summary.documents,
        summary.total_descriptors
    );
    if !summary.buckets.is_empty() {
        info!("{} result folders written", summary.buckets.len());
    }
    Ok(())
}
