use figment::{
    providers::{Env, Format, Toml},
    Figment, Provider,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Matches retrieved per query when nothing else is configured.
pub const DEFAULT_RESULTS: usize = 10;

pub struct Config {
    figment: Figment,
}

impl Config {
    /// Layer `voctree.toml`, `voctree.<RUST_ENV>.toml`, `VOCTREE_*` env vars
    /// and finally `overrides` (usually the parsed command line).
    pub fn load<P: Provider>(overrides: P) -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("voctree.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("voctree.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("voctree.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("voctree.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("VOCTREE_")).merge(overrides);

        Ok(Self { figment })
    }

    /// Build directly from a provider, skipping files and environment.
    pub fn from_provider<P: Provider>(provider: P) -> Self {
        Self { figment: Figment::from(provider) }
    }

    /// Extract and validate the full set of run options.
    pub fn retrieval(&self) -> Result<RetrievalConfig> {
        let options: RunOptions = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        RetrievalConfig::try_from(options)
    }
}

/// Flat, serializable view of every option, as read from files, env and CLI.
///
/// Every field is optional so that each layer only contributes what it sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keylist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub querylist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outfile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matlab: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outdir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_document_map: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<u8>,
}

/// Where term weights come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeightSource {
    /// TF-IDF over the freshly built index.
    Compute,
    /// Precomputed weights; computation is skipped entirely.
    File(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Plain,
    Matlab,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTarget {
    pub path: PathBuf,
    pub format: ReportFormat,
}

/// Immutable configuration of one retrieval run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalConfig {
    pub tree: PathBuf,
    pub keylist: PathBuf,
    pub weights: WeightSource,
    /// External query set; `None` runs the sanity check.
    pub querylist: Option<PathBuf>,
    pub report: Option<ReportTarget>,
    /// Root of the symlink tree.
    pub outdir: Option<PathBuf>,
    pub document_map: Option<PathBuf>,
    /// Matches per query, `0` for every indexed document.
    pub results: usize,
    pub verbosity: u8,
}

impl TryFrom<RunOptions> for RetrievalConfig {
    type Error = Error;

    fn try_from(options: RunOptions) -> Result<Self> {
        let tree = options
            .tree
            .map(expand_path)
            .ok_or_else(|| Error::InvalidConfig("the option '--tree' is required but missing".into()))?;
        let keylist = options
            .keylist
            .map(expand_path)
            .ok_or_else(|| Error::InvalidConfig("the option '--keylist' is required but missing".into()))?;
        let weights = match options.weights {
            Some(path) => WeightSource::File(expand_path(path)),
            None => WeightSource::Compute,
        };
        let format = if options.matlab.unwrap_or(false) { ReportFormat::Matlab } else { ReportFormat::Plain };
        let report = options.outfile.map(|path| ReportTarget { path: expand_path(path), format });

        Ok(Self {
            tree,
            keylist,
            weights,
            querylist: options.querylist.map(expand_path),
            report,
            outdir: options.outdir.map(expand_path),
            document_map: options.save_document_map.map(expand_path),
            results: options.results.unwrap_or(DEFAULT_RESULTS),
            verbosity: options.verbose.unwrap_or(1),
        })
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
