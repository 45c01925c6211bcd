use super::{Language, RepositoryNwo};
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Resolved query files per language, in merge order.
pub type QueryMap = IndexMap<Language, Vec<String>>;

/// The resolved configuration for one run.
///
/// Built once by [`ConfigLoader`](crate::config::ConfigLoader), persisted under
/// the run's temp directory and read back by later stages with
/// [`get_config`](crate::config::get_config). Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Languages to analyse. Never empty.
    pub languages: Vec<Language>,

    /// Query files to run, grouped by language.
    pub queries: QueryMap,

    /// Glob patterns excluded from analysis.
    pub paths_ignore: Vec<String>,

    /// Glob patterns included in analysis.
    pub paths: Vec<String>,

    /// The user configuration file as it was parsed, kept for diagnostics.
    pub original_user_input: serde_json::Value,

    pub temp_dir: Utf8PathBuf,
    pub tool_cache_dir: Utf8PathBuf,

    /// Path to the analysis tool binary.
    pub tool_path: Utf8PathBuf,
}

impl Config {
    /// Queries resolved for `language`, or an empty slice.
    pub fn queries_for(&self, language: Language) -> &[String] {
        self.queries
            .get(&language)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Everything the loader needs from the workflow for one run.
#[derive(Debug, Clone)]
pub struct InitInputs {
    /// Comma-separated languages; empty means auto-detect.
    pub languages: String,

    /// Comma-separated extra `uses` values from the workflow.
    pub queries: Option<String>,

    /// Local path or `owner/repo/path@ref` of the user configuration file.
    pub config_file: Option<String>,

    /// Repository being analysed, used for language auto-detection.
    pub repository: RepositoryNwo,

    pub temp_dir: Utf8PathBuf,
    pub tool_cache_dir: Utf8PathBuf,

    /// Root of the checked-out repository.
    pub checkout_path: Utf8PathBuf,
}
