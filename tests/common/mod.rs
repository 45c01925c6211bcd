//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use camino::{Utf8Path, Utf8PathBuf};
use codescan_action::services::{
    AnalysisTool, ApiError, ApiResponse, ResolveQueriesOutput, SourceHost, ToolError,
};
use codescan_action::{InitInputs, Language, RepositoryNwo};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Mutex;
use tempfile::TempDir;

/// One call to [`EchoTool::resolve_queries`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveCall {
    pub queries: Vec<String>,
    pub extra_search_path: Option<Utf8PathBuf>,
}

/// Resolves every query to itself.
///
/// A query whose file name starts with `<language>-` is reported under that
/// language, anything else under `default_language`. Queries listed in
/// `without_language` are reported as declaring no language, those in
/// `multiple_languages` as declaring several. Every call also reports the
/// `(language, path)` pairs in `also_resolved`.
pub struct EchoTool {
    pub default_language: String,
    pub without_language: Vec<String>,
    pub multiple_languages: Vec<String>,
    pub also_resolved: Vec<(String, String)>,
    calls: Mutex<Vec<ResolveCall>>,
}

impl EchoTool {
    pub fn new() -> Self {
        Self {
            default_language: "javascript".to_string(),
            without_language: Vec::new(),
            multiple_languages: Vec::new(),
            also_resolved: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ResolveCall> {
        self.calls.lock().unwrap().clone()
    }

    fn language_of(&self, query: &str) -> String {
        let file_name = query.rsplit('/').next().unwrap_or(query);
        Language::ALL
            .iter()
            .find(|language| file_name.starts_with(&format!("{}-", language)))
            .map(|language| language.to_string())
            .unwrap_or_else(|| self.default_language.clone())
    }
}

#[async_trait]
impl AnalysisTool for EchoTool {
    async fn resolve_queries(
        &self,
        queries: &[String],
        extra_search_path: Option<&Utf8Path>,
    ) -> Result<ResolveQueriesOutput, ToolError> {
        self.calls.lock().unwrap().push(ResolveCall {
            queries: queries.to_vec(),
            extra_search_path: extra_search_path.map(Utf8Path::to_path_buf),
        });

        let mut output = ResolveQueriesOutput::default();
        for query in queries {
            if self.without_language.contains(query) {
                output
                    .no_declared_language
                    .insert(query.clone(), serde_json::json!({}));
                continue;
            }
            if self.multiple_languages.contains(query) {
                output
                    .multiple_declared_languages
                    .insert(query.clone(), serde_json::json!({}));
                continue;
            }
            output
                .by_language
                .entry(self.language_of(query))
                .or_default()
                .insert(query.clone(), serde_json::json!({}));
        }
        for (language, path) in &self.also_resolved {
            output
                .by_language
                .entry(language.clone())
                .or_default()
                .insert(path.clone(), serde_json::json!({}));
        }
        Ok(output)
    }

    fn path(&self) -> &Utf8Path {
        Utf8Path::new("/opt/tool/codeql")
    }
}

/// In-memory source host.
#[derive(Default)]
pub struct FakeHost {
    contents: HashMap<String, ApiResponse>,
    pub languages: IndexMap<String, u64>,
    requests: Mutex<Vec<String>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `text` as a file at `owner/repo/path@ref`.
    pub fn with_file(mut self, reference: &str, text: &str) -> Self {
        self.contents.insert(
            reference.to_string(),
            ApiResponse {
                status: 200,
                data: serde_json::json!({ "type": "file", "content": STANDARD.encode(text) }),
            },
        );
        self
    }

    /// Serve a raw response at `owner/repo/path@ref`.
    pub fn with_response(mut self, reference: &str, status: u16, data: serde_json::Value) -> Self {
        self.contents
            .insert(reference.to_string(), ApiResponse { status, data });
        self
    }

    pub fn with_language(mut self, name: &str, bytes: u64) -> Self {
        self.languages.insert(name.to_string(), bytes);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceHost for FakeHost {
    async fn get_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<ApiResponse, ApiError> {
        let reference = format!("{}/{}/{}@{}", owner, repo, path, git_ref);
        self.requests.lock().unwrap().push(reference.clone());

        Ok(self.contents.get(&reference).cloned().unwrap_or(ApiResponse {
            status: 404,
            data: serde_json::json!({ "message": "Not Found" }),
        }))
    }

    async fn list_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<IndexMap<String, u64>, ApiError> {
        self.requests
            .lock()
            .unwrap()
            .push(format!("{}/{}/languages", owner, repo));
        Ok(self.languages.clone())
    }
}

/// A checkout and a runner temp directory, removed on drop.
pub struct Workspace {
    _checkout_dir: TempDir,
    _runner_dir: TempDir,
    pub checkout: Utf8PathBuf,
    pub temp_dir: Utf8PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let checkout_dir = TempDir::new().unwrap();
        let runner_dir = TempDir::new().unwrap();
        let checkout = Utf8PathBuf::try_from(checkout_dir.path().to_path_buf())
            .unwrap()
            .canonicalize_utf8()
            .unwrap();
        let temp_dir = Utf8PathBuf::try_from(runner_dir.path().join("temp")).unwrap();
        Self {
            _checkout_dir: checkout_dir,
            _runner_dir: runner_dir,
            checkout,
            temp_dir,
        }
    }

    /// Write a file into the checkout, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> Utf8PathBuf {
        let path = self.checkout.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Create a directory in the checkout and return its canonical path.
    pub fn mkdir(&self, relative: &str) -> Utf8PathBuf {
        let path = self.checkout.join(relative);
        std::fs::create_dir_all(&path).unwrap();
        path.canonicalize_utf8().unwrap()
    }

    pub fn inputs(&self, languages: &str) -> InitInputs {
        InitInputs {
            languages: languages.to_string(),
            queries: None,
            config_file: None,
            repository: RepositoryNwo::parse("octo/widgets").unwrap(),
            temp_dir: self.temp_dir.clone(),
            tool_cache_dir: self.temp_dir.join("cache"),
            checkout_path: self.checkout.clone(),
        }
    }
}
