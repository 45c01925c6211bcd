use super::extra_options::{ExtraOptionsError, get_extra_options};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::Deserialize;
use std::time::Instant;
use thiserror::Error;
use tokio::process::Command;

/// Query files mapped to the tool's per-query metadata.
pub type ResolvedQueries = IndexMap<String, serde_json::Value>;

/// Output of `resolve queries --format=bylanguage`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveQueriesOutput {
    /// Tool language name to resolved query files.
    #[serde(default)]
    pub by_language: IndexMap<String, ResolvedQueries>,

    /// Queries whose pack declares no language.
    #[serde(default)]
    pub no_declared_language: ResolvedQueries,

    /// Queries whose pack declares more than one language.
    #[serde(default)]
    pub multiple_declared_languages: ResolvedQueries,
}

/// Errors that can occur while running the analysis tool
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("{tool} exited with code {code}: {stderr}")]
    Failed {
        tool: Utf8PathBuf,
        code: i32,
        stderr: String,
    },

    #[error("Failed to parse output of {tool}: {source}")]
    InvalidOutput {
        tool: Utf8PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    ExtraOptions(#[from] ExtraOptionsError),
}

/// The external analysis tool, as far as configuration loading needs it.
///
/// The loader takes this as an explicit capability so tests can substitute a
/// double for the real binary.
#[async_trait]
pub trait AnalysisTool: Send + Sync {
    /// Resolve query suites, directories, files or remote references to
    /// concrete query files grouped by language.
    ///
    /// # Arguments
    /// * `queries` - Suites, paths or references, passed to the tool in order
    /// * `extra_search_path` - Additional pack search path, if any
    async fn resolve_queries(
        &self,
        queries: &[String],
        extra_search_path: Option<&Utf8Path>,
    ) -> Result<ResolveQueriesOutput, ToolError>;

    /// Path to the tool binary.
    fn path(&self) -> &Utf8Path;
}

/// [`AnalysisTool`] backed by the CodeQL command-line binary.
pub struct CodeQlCli {
    cmd: Utf8PathBuf,
    extra_options: serde_json::Value,
}

impl CodeQlCli {
    /// # Arguments
    /// * `cmd` - Path to the binary
    /// * `extra_options` - Free-form options blob; see [`get_extra_options`]
    pub fn new(cmd: impl Into<Utf8PathBuf>, extra_options: serde_json::Value) -> Self {
        Self {
            cmd: cmd.into(),
            extra_options,
        }
    }

    /// Arguments for `resolve queries`.
    pub fn resolve_queries_args(
        &self,
        queries: &[String],
        extra_search_path: Option<&Utf8Path>,
    ) -> Result<Vec<String>, ToolError> {
        let mut args = vec!["resolve".to_string(), "queries".to_string()];
        args.extend(queries.iter().cloned());
        args.push("--format=bylanguage".to_string());
        args.extend(get_extra_options(
            &self.extra_options,
            &["resolve", "queries"],
        )?);
        if let Some(search_path) = extra_search_path {
            args.push("--search-path".to_string());
            args.push(search_path.to_string());
        }
        Ok(args)
    }

    async fn run(&self, args: &[String]) -> Result<String, ToolError> {
        tracing::debug!("Executing: {} {}", self.cmd, args.join(" "));
        let start = Instant::now();

        let output = Command::new(&self.cmd)
            .args(args)
            .output()
            .await
            .map_err(|source| ToolError::Spawn {
                tool: self.cmd.clone(),
                source,
            })?;

        let exit_code = output.status.code().unwrap_or(-1);
        tracing::debug!(
            "{} completed in {:.2}s with exit code {}",
            self.cmd,
            start.elapsed().as_secs_f32(),
            exit_code
        );

        if !output.status.success() {
            return Err(ToolError::Failed {
                tool: self.cmd.clone(),
                code: exit_code,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl AnalysisTool for CodeQlCli {
    async fn resolve_queries(
        &self,
        queries: &[String],
        extra_search_path: Option<&Utf8Path>,
    ) -> Result<ResolveQueriesOutput, ToolError> {
        let args = self.resolve_queries_args(queries, extra_search_path)?;
        let stdout = self.run(&args).await?;

        serde_json::from_str(&stdout).map_err(|source| ToolError::InvalidOutput {
            tool: self.cmd.clone(),
            source,
        })
    }

    fn path(&self) -> &Utf8Path {
        &self.cmd
    }
}
