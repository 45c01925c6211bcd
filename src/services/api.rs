use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Url};
use thiserror::Error;

/// Public API endpoint used when the runner does not provide one.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Raw response of a contents request.
///
/// `data` is an object (optionally carrying base64 `content`) for a file, or
/// an array for a directory listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub data: serde_json::Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Errors raised by a [`SourceHost`] client.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid API token")]
    InvalidToken,

    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("Response from {url} is not valid JSON: {source}")]
    InvalidBody {
        url: String,
        source: serde_json::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// The source-hosting REST API, as far as configuration loading needs it.
#[async_trait]
pub trait SourceHost: Send + Sync {
    /// Fetch a file or directory listing at `git_ref`.
    ///
    /// Non-success statuses are returned, not raised, so callers can name the
    /// resource in their own error.
    async fn get_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<ApiResponse, ApiError>;

    /// Languages detected in a repository with their byte counts, largest first.
    async fn list_languages(&self, owner: &str, repo: &str)
    -> Result<IndexMap<String, u64>, ApiError>;
}

/// [`SourceHost`] backed by the GitHub REST API.
pub struct GitHubClient {
    http: Client,
    api_url: Url,
}

impl GitHubClient {
    /// Create a client for `api_url`, authenticating with `token` when it is non-empty.
    pub fn new(api_url: &str, token: &str) -> Result<Self, ApiError> {
        let api_url = Url::parse(api_url).map_err(|_| ApiError::InvalidUrl(api_url.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("codescan-action/", env!("CARGO_PKG_VERSION"))),
        );
        if !token.is_empty() {
            let mut value = HeaderValue::from_str(&format!("token {}", token))
                .map_err(|_| ApiError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder().default_headers(headers).build()?;
        Ok(Self { http, api_url })
    }

    /// Build `{api}/repos/{owner}/{repo}/{rest...}`.
    fn repo_url(&self, owner: &str, repo: &str, rest: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.api_url.to_string()))?
            .pop_if_empty()
            .extend(["repos", owner, repo])
            .extend(rest.iter().copied());
        Ok(url)
    }

    fn contents_url(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Url, ApiError> {
        let mut rest = vec!["contents"];
        rest.extend(path.split('/').filter(|s| !s.is_empty()));
        let mut url = self.repo_url(owner, repo, &rest)?;
        url.query_pairs_mut().append_pair("ref", git_ref);
        Ok(url)
    }
}

#[async_trait]
impl SourceHost for GitHubClient {
    async fn get_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.contents_url(owner, repo, path, git_ref)?;
        tracing::debug!("GET {}", url);

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(ApiResponse {
            status,
            data: decode_body(url.as_str(), status, &body)?,
        })
    }

    async fn list_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<IndexMap<String, u64>, ApiError> {
        let url = self.repo_url(owner, repo, &["languages"])?;
        tracing::debug!("GET {}", url);

        let response = self.http.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.json::<IndexMap<String, u64>>().await?)
    }
}

/// Parse a contents response body.
///
/// A successful response must carry JSON. Error responses may not (proxies
/// answer with HTML), so their body is logged and replaced with `null`.
fn decode_body(url: &str, status: u16, body: &str) -> Result<serde_json::Value, ApiError> {
    match serde_json::from_str(body) {
        Ok(data) => Ok(data),
        Err(source) if (200..300).contains(&status) => Err(ApiError::InvalidBody {
            url: url.to_string(),
            source,
        }),
        Err(e) => {
            tracing::warn!("Ignoring non-JSON body of {} response from {}: {}", status, url, e);
            Ok(serde_json::Value::Null)
        }
    }
}

#[cfg(test)]
mockall::mock! {
    pub Host {}

    #[async_trait]
    impl SourceHost for Host {
        async fn get_contents(
            &self,
            owner: &str,
            repo: &str,
            path: &str,
            git_ref: &str,
        ) -> Result<ApiResponse, ApiError>;

        async fn list_languages(
            &self,
            owner: &str,
            repo: &str,
        ) -> Result<IndexMap<String, u64>, ApiError>;
    }
}
