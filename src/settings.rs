//! Process settings read once from the environment at start-up.

use crate::models::{InitInputs, RepositoryNwo};
use crate::services::{DEFAULT_API_URL, parse_extra_options};
use camino::Utf8PathBuf;
use config::{Config, Environment};
use serde::Deserialize;
use thiserror::Error;

/// Job name used in local-run mode when the runner provides none.
pub const UNKNOWN_JOB: &str = "UNKNOWN-JOB";

/// Environment variables read at start-up and the setting each one feeds.
const VARIABLES: &[(&str, &str)] = &[
    ("INPUT_LANGUAGES", "languages"),
    ("INPUT_QUERIES", "queries"),
    ("INPUT_CONFIG-FILE", "config_file"),
    ("INPUT_RAM", "ram"),
    ("INPUT_THREADS", "threads"),
    ("INPUT_TOKEN", "token"),
    ("INPUT_TOOLS", "tools"),
    ("RUNNER_TEMP", "runner_temp"),
    ("RUNNER_TOOL_CACHE", "runner_tool_cache"),
    ("RUNNER_DEBUG", "runner_debug"),
    ("GITHUB_WORKSPACE", "github_workspace"),
    ("GITHUB_REPOSITORY", "github_repository"),
    ("GITHUB_API_URL", "github_api_url"),
    ("GITHUB_JOB", "github_job"),
    ("CODESCAN_LOCAL_RUN", "local_run"),
    ("CODESCAN_ACTION_EXTRA_OPTIONS", "extra_options"),
];

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Required environment variable {0} is not set")]
    MissingVariable(&'static str),

    #[error("Invalid repository \"{0}\", expected owner/repo")]
    InvalidRepository(String),

    #[error("CODESCAN_ACTION_EXTRA_OPTIONS is not valid JSON: {0}")]
    InvalidExtraOptions(#[source] serde_json::Error),

    #[error("Failed to read settings: {0}")]
    Config(#[from] config::ConfigError),
}

/// Raw values as collected from the environment.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    languages: String,
    queries: String,
    config_file: String,
    ram: String,
    threads: String,
    token: String,
    tools: String,
    runner_temp: String,
    runner_tool_cache: String,
    runner_debug: String,
    github_workspace: String,
    github_repository: String,
    github_api_url: String,
    github_job: String,
    local_run: String,
    extra_options: String,
}

/// Everything the action reads from its environment.
#[derive(Debug, Clone)]
pub struct ActionSettings {
    /// Comma-separated languages; empty means auto-detect.
    pub languages: String,
    pub queries: Option<String>,
    pub config_file: Option<String>,

    /// RAM limit in megabytes; empty means all but a reservation.
    pub ram: String,

    /// Thread count; empty means every core.
    pub threads: String,

    pub token: String,

    /// The analysis tool binary.
    pub tool_path: Utf8PathBuf,

    pub temp_dir: Utf8PathBuf,
    pub tool_cache_dir: Utf8PathBuf,
    pub workspace: Utf8PathBuf,
    pub repository: RepositoryNwo,
    pub api_url: String,
    pub job: String,
    pub debug: bool,

    /// Running outside the CI platform; some runner variables get defaults.
    pub local_run: bool,

    /// Extra tool options, `null` when none were given.
    pub extra_options: serde_json::Value,
}

impl ActionSettings {
    /// Read the settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_vars(std::env::vars())
    }

    /// Read the settings from the given variables. Unknown variables are ignored.
    pub fn from_vars<I>(vars: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let known: config::Map<String, String> = vars
            .into_iter()
            .filter_map(|(name, value)| {
                VARIABLES
                    .iter()
                    .find(|(variable, _)| *variable == name)
                    .map(|(_, key)| (key.to_string(), value))
            })
            .collect();

        let raw: RawSettings = Config::builder()
            .set_default("tools", "codeql")?
            .set_default("github_api_url", DEFAULT_API_URL)?
            .add_source(Environment::default().source(Some(known)))
            .build()?
            .try_deserialize()?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self, SettingsError> {
        let local_run = is_enabled(&raw.local_run);

        let job = match non_empty(raw.github_job) {
            Some(job) => job,
            None if local_run => UNKNOWN_JOB.to_string(),
            None => return Err(SettingsError::MissingVariable("GITHUB_JOB")),
        };

        let repository_name = required(raw.github_repository, "GITHUB_REPOSITORY")?;
        let repository = RepositoryNwo::parse(&repository_name)
            .ok_or(SettingsError::InvalidRepository(repository_name))?;

        let extra_options = parse_extra_options(Some(raw.extra_options.as_str()))
            .map_err(SettingsError::InvalidExtraOptions)?;

        Ok(Self {
            languages: raw.languages,
            queries: non_empty(raw.queries),
            config_file: non_empty(raw.config_file),
            ram: raw.ram,
            threads: raw.threads,
            token: raw.token,
            tool_path: Utf8PathBuf::from(raw.tools),
            temp_dir: required(raw.runner_temp, "RUNNER_TEMP")?.into(),
            tool_cache_dir: required(raw.runner_tool_cache, "RUNNER_TOOL_CACHE")?.into(),
            workspace: required(raw.github_workspace, "GITHUB_WORKSPACE")?.into(),
            repository,
            api_url: raw.github_api_url,
            job,
            debug: raw.runner_debug.trim() == "1",
            local_run,
            extra_options,
        })
    }

    /// The loader inputs for this run.
    pub fn init_inputs(&self) -> InitInputs {
        InitInputs {
            languages: self.languages.clone(),
            queries: self.queries.clone(),
            config_file: self.config_file.clone(),
            repository: self.repository.clone(),
            temp_dir: self.temp_dir.clone(),
            tool_cache_dir: self.tool_cache_dir.clone(),
            checkout_path: self.workspace.clone(),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

fn required(value: String, variable: &'static str) -> Result<String, SettingsError> {
    non_empty(value).ok_or(SettingsError::MissingVariable(variable))
}

fn is_enabled(flag: &str) -> bool {
    !matches!(flag.trim(), "" | "false" | "0")
}
