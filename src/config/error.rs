use crate::config::queries::BUILTIN_SUITES;
use crate::models::Language;
use crate::services::{ApiError, ToolError};
use camino::Utf8PathBuf;
use std::fmt;
use thiserror::Error;

/// Top-level keys of the user configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    Name,
    DisableDefaultQueries,
    Queries,
    PathsIgnore,
    Paths,
}

impl ConfigField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigField::Name => "name",
            ConfigField::DisableDefaultQueries => "disable-default-queries",
            ConfigField::Queries => "queries",
            ConfigField::PathsIgnore => "paths-ignore",
            ConfigField::Paths => "paths",
        }
    }

    fn requirement(&self) -> &'static str {
        match self {
            ConfigField::Name => "must be a non-empty string",
            ConfigField::DisableDefaultQueries => "must be a boolean",
            ConfigField::Queries => "must be an array",
            ConfigField::PathsIgnore | ConfigField::Paths => {
                "must be an array of non-empty strings"
            }
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a `paths` / `paths-ignore` pattern was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPatternProblem {
    /// Empty after sanitisation, e.g. `**` or `/`.
    Meaningless,
    /// `**` shares a path segment with other characters.
    InvalidDoubleStar,
    /// Contains a `\`.
    Backslash,
}

impl PathPatternProblem {
    fn describe(&self, pattern: &str) -> String {
        match self {
            PathPatternProblem::Meaningless => format!(
                "\"{}\" is not a valid path. It is not necessary to include it, and it is not allowed to exclude it.",
                pattern
            ),
            PathPatternProblem::InvalidDoubleStar => format!(
                "\"{}\" contains an invalid \"**\" wildcard. They must be immediately preceded and followed by a slash as in \"/**/\", or come at the start or end.",
                pattern
            ),
            PathPatternProblem::Backslash => format!(
                "\"{}\" contains an \"\\\" character. These are not allowed in filters. If running on windows we recommend using \"/\" instead for path filters.",
                pattern
            ),
        }
    }
}

/// Errors that can occur while resolving or persisting the configuration.
///
/// Every variant carries the structured context needed to render a message
/// naming the offending file, field, and value.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Did not recognise the following languages: {}", .languages.join(", "))]
    UnknownLanguages { languages: Vec<String> },

    #[error(
        "Did not detect any languages to analyze. Please update input in workflow or check that the source host detects the correct languages in your repo."
    )]
    NoLanguages,

    #[error("The configuration file \"{config_file}\" is outside of the workspace")]
    ConfigFileOutsideWorkspace { config_file: String },

    #[error(
        "The configuration file \"{config_file}\" is not a supported remote file reference. Expected format <owner>/<repository>/<file-path>@<ref>"
    )]
    ConfigFileRepoFormatInvalid { config_file: String },

    #[error("The configuration file \"{config_file}\" does not exist")]
    ConfigFileDoesNotExist { config_file: String },

    #[error("The configuration file \"{config_file}\" looks like a directory, not a file")]
    ConfigFileDirectoryGiven { config_file: String },

    #[error("The configuration file \"{config_file}\" could not be read")]
    ConfigFileFormatInvalid { config_file: String },

    #[error("The configuration file \"{config_file}\" is not valid YAML: {source}")]
    ConfigFileParse {
        config_file: String,
        source: serde_yaml_ng::Error,
    },

    #[error("{}", property_error(Some(.config_file.as_str()), .field.as_str(), .field.requirement()))]
    FieldInvalid {
        config_file: String,
        field: ConfigField,
    },

    #[error("{}", query_uses_message(.config_file.as_deref(), .uses.as_deref()))]
    QueryUsesInvalid {
        config_file: Option<String>,
        uses: Option<String>,
    },

    #[error("{}", property_error(
        .config_file.as_deref(),
        "queries.uses",
        &format!("is invalid as the local path \"{}\" does not exist in the repository", .local_path),
    ))]
    LocalPathDoesNotExist {
        config_file: Option<String>,
        local_path: String,
    },

    #[error("{}", property_error(
        .config_file.as_deref(),
        "queries.uses",
        &format!("is invalid as the local path \"{}\" is outside of the repository", .local_path),
    ))]
    LocalPathOutsideOfRepository {
        config_file: Option<String>,
        local_path: String,
    },

    #[error("{}", property_error(Some(.config_file.as_str()), .field.as_str(), &.problem.describe(.pattern)))]
    InvalidPathPattern {
        config_file: String,
        field: ConfigField,
        pattern: String,
        problem: PathPatternProblem,
    },

    #[error("Failed to download \"{reference}\": the source host responded with status {status}")]
    FileDownload { reference: String, status: u16 },

    #[error("\"{reference}\" is a directory, not a file")]
    FileIsADirectory { reference: String },

    #[error("\"{reference}\" has no readable file content")]
    FileContentUnreadable { reference: String },

    #[error(
        "The following queries do not declare a language. Their qlpack.yml files are either missing or is invalid.\n{}",
        .queries.join("\n")
    )]
    QueriesWithoutLanguage { queries: Vec<String> },

    #[error(
        "The following queries declare multiple languages. Their qlpack.yml files are either missing or is invalid.\n{}",
        .queries.join("\n")
    )]
    QueriesWithMultipleLanguages { queries: Vec<String> },

    #[error(
        "Did not detect any queries to run for {language}. Please make sure that the default queries are enabled, or you are specifying queries to run."
    )]
    NoQueriesForLanguage { language: Language },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Persisted configuration at {path} is corrupt: {source}")]
    PersistedConfigCorrupt {
        path: Utf8PathBuf,
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}

fn property_error(config_file: Option<&str>, property: &str, detail: &str) -> String {
    match config_file {
        Some(file) => format!(
            "The configuration file \"{}\" is invalid: property \"{}\" {}",
            file, property, detail
        ),
        None => format!("The workflow input \"queries\" is invalid: {}", detail),
    }
}

fn query_uses_message(config_file: Option<&str>, uses: Option<&str>) -> String {
    let mut detail = format!(
        "must be a built-in suite ({}), a relative path, or be of the form \"owner/repo[/path]@ref\"",
        BUILTIN_SUITES.join(" or ")
    );
    if let Some(uses) = uses {
        detail.push_str("\n Found: ");
        detail.push_str(uses);
    }
    property_error(config_file, "queries.uses", &detail)
}
