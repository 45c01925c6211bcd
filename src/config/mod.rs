//! Configuration resolution.
//!
//! [`ConfigLoader`] turns the workflow inputs and an optional user
//! configuration file (local or in another repository) into a [`Config`],
//! resolving every query through the analysis tool, and persists it under the
//! run's temp directory. Later stages read it back with [`get_config`].

pub mod error;
pub mod paths;
pub mod queries;
pub mod user_file;

pub use error::{ConfigError, ConfigField, PathPatternProblem};
pub use paths::validate_and_sanitise_path;
pub use queries::{BUILTIN_SUITES, QueryOrigin, parse_query_uses, query_is_disabled};
pub use user_file::{QueryEntry, UserConfigFile};

use crate::models::{Config, InitInputs, Language, QueryMap, QueryReference, RemoteConfigReference};
use crate::services::{AnalysisTool, SourceHost, get_file_contents_using_api, get_languages};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::fs;

/// File name of the persisted configuration inside the temp directory.
const PARSED_CONFIG_FILE_NAME: &str = "config";

/// Builds the run configuration.
///
/// Holds the two external capabilities configuration loading needs. Each call
/// is independent; the loader keeps no state between runs.
pub struct ConfigLoader<'a, T: ?Sized, H: ?Sized> {
    tool: &'a T,
    host: &'a H,
}

impl<'a, T, H> ConfigLoader<'a, T, H>
where
    T: AnalysisTool + ?Sized,
    H: SourceHost + ?Sized,
{
    /// Create a new loader.
    ///
    /// # Arguments
    /// * `tool` - Resolves suites, paths and references to query files
    /// * `host` - Source-hosting client for remote files and language detection
    pub fn new(tool: &'a T, host: &'a H) -> Self {
        Self { tool, host }
    }

    /// Load the configuration for this run and persist it.
    ///
    /// Uses the configuration file named by `inputs.config_file` when one is
    /// given, otherwise the defaults. The result is written to
    /// [`get_path_to_parsed_config_file`], replacing any earlier file.
    ///
    /// # Arguments
    /// * `inputs` - Workflow inputs and working directories
    ///
    /// # Returns
    /// The configuration exactly as persisted
    pub async fn init_config(&self, inputs: &InitInputs) -> Result<Config, ConfigError> {
        let config_file = inputs
            .config_file
            .as_deref()
            .map(str::trim)
            .filter(|file| !file.is_empty());

        let config = match config_file {
            Some(config_file) => self.load_config(config_file, inputs).await?,
            None => {
                tracing::debug!("No configuration file was provided");
                self.get_default_config(inputs).await?
            }
        };

        save_config(&config)?;
        Ok(config)
    }

    /// Build the configuration used when there is no configuration file.
    ///
    /// Every language gets its default suite, followed by any queries from
    /// the workflow `queries` input. Nothing is persisted.
    pub async fn get_default_config(&self, inputs: &InitInputs) -> Result<Config, ConfigError> {
        let languages = get_languages(&inputs.languages, &inputs.repository, self.host).await?;

        let mut queries = QueryMap::new();
        self.add_default_queries(&languages, &mut queries).await?;
        self.add_queries_from_workflow(inputs, &languages, &mut queries)
            .await?;

        Ok(Config {
            languages,
            queries,
            paths_ignore: Vec::new(),
            paths: Vec::new(),
            original_user_input: serde_json::Value::Object(serde_json::Map::new()),
            temp_dir: inputs.temp_dir.clone(),
            tool_cache_dir: inputs.tool_cache_dir.clone(),
            tool_path: self.tool.path().to_path_buf(),
        })
    }

    /// Build the configuration from a user configuration file.
    ///
    /// Queries are merged in order: default suites (unless disabled), the
    /// file's `queries`, then the workflow `queries` input.
    async fn load_config(
        &self,
        config_file: &str,
        inputs: &InitInputs,
    ) -> Result<Config, ConfigError> {
        let languages = get_languages(&inputs.languages, &inputs.repository, self.host).await?;

        let (contents, display_name, base_dir) = if is_local(config_file) {
            let path = resolve_local_config_file(config_file, &inputs.checkout_path)?;
            let contents = fs::read_to_string(&path).map_err(|_| {
                ConfigError::ConfigFileFormatInvalid {
                    config_file: path.to_string(),
                }
            })?;
            let base_dir = path
                .parent()
                .map(Utf8Path::to_path_buf)
                .unwrap_or_else(|| inputs.checkout_path.clone());
            (contents, path.to_string(), base_dir)
        } else {
            let contents = self.get_remote_config(config_file).await?;
            (contents, config_file.to_string(), inputs.checkout_path.clone())
        };
        tracing::info!("Using configuration file {}", display_name);

        let parsed = UserConfigFile::parse(&contents, &display_name)?;
        if let Some(name) = &parsed.name {
            tracing::debug!("Configuration name: {}", name);
        }

        let mut queries = QueryMap::new();
        if parsed.disable_default_queries {
            tracing::info!("Default queries are disabled by {}", display_name);
        } else {
            self.add_default_queries(&languages, &mut queries).await?;
        }

        let origin = QueryOrigin {
            config_file: Some(display_name.as_str()),
            base_dir: &base_dir,
            checkout_path: &inputs.checkout_path,
        };
        for entry in &parsed.queries {
            self.resolve_query_uses(entry.uses.as_deref(), &origin, &languages, &mut queries)
                .await?;
        }

        self.add_queries_from_workflow(inputs, &languages, &mut queries)
            .await?;

        let paths_ignore = parsed
            .paths_ignore
            .iter()
            .map(|pattern| {
                validate_and_sanitise_path(pattern, ConfigField::PathsIgnore, &display_name)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let paths = parsed
            .paths
            .iter()
            .map(|pattern| validate_and_sanitise_path(pattern, ConfigField::Paths, &display_name))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(language) = languages
            .iter()
            .find(|language| queries.get(*language).is_none_or(Vec::is_empty))
        {
            return Err(ConfigError::NoQueriesForLanguage {
                language: *language,
            });
        }

        Ok(Config {
            languages,
            queries,
            paths_ignore,
            paths,
            original_user_input: parsed.raw,
            temp_dir: inputs.temp_dir.clone(),
            tool_cache_dir: inputs.tool_cache_dir.clone(),
            tool_path: self.tool.path().to_path_buf(),
        })
    }

    async fn get_remote_config(&self, config_file: &str) -> Result<String, ConfigError> {
        let reference = RemoteConfigReference::parse(config_file).ok_or_else(|| {
            ConfigError::ConfigFileRepoFormatInvalid {
                config_file: config_file.to_string(),
            }
        })?;

        get_file_contents_using_api(self.host, &reference)
            .await
            .map_err(|err| match err {
                ConfigError::FileIsADirectory { .. } => ConfigError::ConfigFileDirectoryGiven {
                    config_file: config_file.to_string(),
                },
                ConfigError::FileContentUnreadable { .. } => {
                    ConfigError::ConfigFileFormatInvalid {
                        config_file: config_file.to_string(),
                    }
                }
                other => other,
            })
    }

    async fn add_default_queries(
        &self,
        languages: &[Language],
        queries: &mut QueryMap,
    ) -> Result<(), ConfigError> {
        let suites: Vec<String> = languages.iter().map(Language::default_suite).collect();
        self.run_resolve_queries(queries, &suites, None, false)
            .await
    }

    /// Resolve the comma-separated workflow `queries` input, one entry at a time.
    async fn add_queries_from_workflow(
        &self,
        inputs: &InitInputs,
        languages: &[Language],
        queries: &mut QueryMap,
    ) -> Result<(), ConfigError> {
        let Some(workflow_queries) = inputs
            .queries
            .as_deref()
            .filter(|input| !input.trim().is_empty())
        else {
            return Ok(());
        };

        let origin = QueryOrigin {
            config_file: None,
            base_dir: &inputs.checkout_path,
            checkout_path: &inputs.checkout_path,
        };
        for uses in workflow_queries.split(',') {
            self.resolve_query_uses(Some(uses), &origin, languages, queries)
                .await?;
        }
        Ok(())
    }

    async fn resolve_query_uses(
        &self,
        uses: Option<&str>,
        origin: &QueryOrigin<'_>,
        languages: &[Language],
        queries: &mut QueryMap,
    ) -> Result<(), ConfigError> {
        match parse_query_uses(uses, origin)? {
            QueryReference::Local(path) => {
                self.run_resolve_queries(
                    queries,
                    &[path.to_string()],
                    Some(origin.checkout_path),
                    true,
                )
                .await
            }
            QueryReference::BuiltinSuite(suite) => {
                let suites: Vec<String> = languages
                    .iter()
                    .map(|language| format!("{}-{}.qls", language, suite))
                    .collect();
                self.run_resolve_queries(queries, &suites, None, false)
                    .await
            }
            QueryReference::Remote(remote) => {
                self.run_resolve_queries(queries, &[remote.to_string()], None, true)
                    .await
            }
        }
    }

    /// Run the tool's resolver and append its results to `queries`.
    ///
    /// Disabled built-in queries are dropped. With `error_on_invalid`, queries
    /// whose pack declares no language or several languages fail the load.
    async fn run_resolve_queries(
        &self,
        queries: &mut QueryMap,
        to_resolve: &[String],
        extra_search_path: Option<&Utf8Path>,
        error_on_invalid: bool,
    ) -> Result<(), ConfigError> {
        tracing::debug!("Resolving queries: {}", to_resolve.join(", "));
        let output = self
            .tool
            .resolve_queries(to_resolve, extra_search_path)
            .await?;

        for (name, resolved) in output.by_language {
            let Some(language) = Language::parse_language(&name) else {
                tracing::warn!(
                    "Ignoring {} queries resolved for unsupported language {}",
                    resolved.len(),
                    name
                );
                continue;
            };
            queries.entry(language).or_default().extend(
                resolved
                    .into_keys()
                    .filter(|query| !query_is_disabled(language, query)),
            );
        }

        if error_on_invalid && !output.no_declared_language.is_empty() {
            return Err(ConfigError::QueriesWithoutLanguage {
                queries: output.no_declared_language.into_keys().collect(),
            });
        }
        if error_on_invalid && !output.multiple_declared_languages.is_empty() {
            return Err(ConfigError::QueriesWithMultipleLanguages {
                queries: output.multiple_declared_languages.into_keys().collect(),
            });
        }

        Ok(())
    }
}

/// Whether a configuration file reference names a file in the checkout
/// rather than `owner/repo/path@ref`.
pub fn is_local(config_file: &str) -> bool {
    config_file.starts_with("./") || !config_file.contains('@')
}

fn resolve_local_config_file(
    config_file: &str,
    checkout_path: &Utf8Path,
) -> Result<Utf8PathBuf, ConfigError> {
    let checkout = normalize_lexically(checkout_path);
    let path = normalize_lexically(&checkout.join(config_file));

    if !path.starts_with(&checkout) {
        return Err(ConfigError::ConfigFileOutsideWorkspace {
            config_file: path.to_string(),
        });
    }
    if !path.exists() {
        return Err(ConfigError::ConfigFileDoesNotExist {
            config_file: path.to_string(),
        });
    }
    if path.is_dir() {
        return Err(ConfigError::ConfigFileDirectoryGiven {
            config_file: path.to_string(),
        });
    }

    // A symlink inside the checkout may still point outside it
    let canonical = path
        .canonicalize_utf8()
        .map_err(|e| ConfigError::io(&path, e))?;
    let canonical_checkout = checkout
        .canonicalize_utf8()
        .map_err(|e| ConfigError::io(&checkout, e))?;
    if !canonical.starts_with(&canonical_checkout) {
        return Err(ConfigError::ConfigFileOutsideWorkspace {
            config_file: path.to_string(),
        });
    }

    Ok(path)
}

/// Resolve `.` and `..` components without touching the filesystem.
pub(crate) fn normalize_lexically(path: &Utf8Path) -> Utf8PathBuf {
    let mut normalized = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_str()),
        }
    }
    normalized
}

/// Path of the persisted configuration for a run.
pub fn get_path_to_parsed_config_file(temp_dir: &Utf8Path) -> Utf8PathBuf {
    temp_dir.join(PARSED_CONFIG_FILE_NAME)
}

/// Persist `config` under its temp directory, replacing any earlier file.
pub fn save_config(config: &Config) -> Result<(), ConfigError> {
    let path = get_path_to_parsed_config_file(&config.temp_dir);

    if !config.temp_dir.exists() {
        fs::create_dir_all(&config.temp_dir).map_err(|e| ConfigError::io(&config.temp_dir, e))?;
    }

    let json = serde_json::to_string(config)?;
    fs::write(&path, &json).map_err(|e| ConfigError::io(&path, e))?;

    tracing::info!("Saved config to {}", path);
    tracing::debug!("Saved config:\n{}", json);
    Ok(())
}

/// Read back the configuration persisted for a run.
///
/// # Returns
/// `None` when no configuration has been saved in `temp_dir` yet
pub fn get_config(temp_dir: &Utf8Path) -> Result<Option<Config>, ConfigError> {
    let path = get_path_to_parsed_config_file(temp_dir);
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&path).map_err(|e| ConfigError::io(&path, e))?;
    let config = serde_json::from_str(&contents)
        .map_err(|source| ConfigError::PersistedConfigCorrupt {
            path: path.clone(),
            source,
        })?;

    tracing::debug!("Loaded config:\n{}", contents);
    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_temp_dir() -> (TempDir, Utf8PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        (temp_dir, path)
    }

    fn sample_config(temp_dir: &Utf8Path) -> Config {
        let mut queries = QueryMap::new();
        queries.insert(
            Language::Python,
            vec!["/tools/python/a.ql".to_string(), "/tools/python/b.ql".to_string()],
        );
        Config {
            languages: vec![Language::Python],
            queries,
            paths_ignore: vec!["vendor/".to_string()],
            paths: vec!["src".to_string()],
            original_user_input: serde_json::json!({ "paths": ["src"] }),
            temp_dir: temp_dir.to_path_buf(),
            tool_cache_dir: temp_dir.join("cache"),
            tool_path: Utf8PathBuf::from("/opt/tool/codeql"),
        }
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Utf8Path::new("/work/repo/./a/../b")),
            Utf8PathBuf::from("/work/repo/b")
        );
        assert_eq!(
            normalize_lexically(Utf8Path::new("/work/repo/../../..")),
            Utf8PathBuf::from("/")
        );
    }

    #[test]
    fn test_is_local() {
        assert!(is_local("./config.yml"));
        assert!(is_local(".github/scan.yml"));
        assert!(is_local("./weird@name.yml"));
        assert!(!is_local("octo/widgets/scan.yml@main"));
    }

    #[test]
    fn test_get_config_missing() {
        let (_temp_dir, path) = create_temp_dir();
        assert!(get_config(&path).unwrap().is_none());
    }

    #[test]
    fn test_save_and_get_config() {
        let (_temp_dir, path) = create_temp_dir();
        let config = sample_config(&path);

        save_config(&config).unwrap();
        assert!(get_path_to_parsed_config_file(&path).exists());

        let loaded = get_config(&path).unwrap().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_config_overwrites() {
        let (_temp_dir, path) = create_temp_dir();
        let mut config = sample_config(&path);
        save_config(&config).unwrap();

        config.paths.clear();
        save_config(&config).unwrap();

        assert!(get_config(&path).unwrap().unwrap().paths.is_empty());
    }

    #[test]
    fn test_save_config_creates_temp_dir() {
        let (_temp_dir, path) = create_temp_dir();
        let nested = path.join("runner/temp");
        save_config(&sample_config(&nested)).unwrap();
        assert!(get_config(&nested).unwrap().is_some());
    }

    #[test]
    fn test_get_config_corrupt() {
        let (_temp_dir, path) = create_temp_dir();
        fs::write(get_path_to_parsed_config_file(&path), "{ not json").unwrap();

        assert!(matches!(
            get_config(&path),
            Err(ConfigError::PersistedConfigCorrupt { .. })
        ));
    }

    #[test]
    fn test_local_config_file_checks() {
        let (_temp_dir, path) = create_temp_dir();
        fs::create_dir_all(path.join(".github")).unwrap();
        fs::write(path.join(".github/scan.yml"), "name: x\n").unwrap();

        assert_eq!(
            resolve_local_config_file("./.github/scan.yml", &path).unwrap(),
            path.join(".github/scan.yml")
        );
        assert!(matches!(
            resolve_local_config_file("../outside.yml", &path),
            Err(ConfigError::ConfigFileOutsideWorkspace { .. })
        ));
        assert!(matches!(
            resolve_local_config_file("missing.yml", &path),
            Err(ConfigError::ConfigFileDoesNotExist { .. })
        ));
        assert!(matches!(
            resolve_local_config_file(".github", &path),
            Err(ConfigError::ConfigFileDirectoryGiven { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_local_config_file_symlink_escaping_workspace() {
        let (_outside_dir, outside) = create_temp_dir();
        let (_temp_dir, path) = create_temp_dir();
        fs::write(outside.join("shared.yml"), "name: x\n").unwrap();
        std::os::unix::fs::symlink(outside.join("shared.yml"), path.join("scan.yml")).unwrap();
        fs::write(path.join("own.yml"), "name: y\n").unwrap();
        std::os::unix::fs::symlink(path.join("own.yml"), path.join("alias.yml")).unwrap();

        match resolve_local_config_file("scan.yml", &path) {
            Err(ConfigError::ConfigFileOutsideWorkspace { config_file }) => {
                assert_eq!(config_file, path.join("scan.yml").as_str());
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(
            resolve_local_config_file("alias.yml", &path).unwrap(),
            path.join("alias.yml")
        );
    }
}
