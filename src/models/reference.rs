use camino::Utf8PathBuf;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static REMOTE_CONFIG_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<owner>[^/]+)/(?P<repo>[^/]+)/(?P<path>[^@]+)@(?P<ref>.+)$")
        .expect("Invalid remote config regex")
});

/// A repository identified by `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryNwo {
    pub owner: String,
    pub repo: String,
}

impl RepositoryNwo {
    /// Parse an `owner/repo` string. Anything other than exactly two
    /// non-empty components is rejected.
    pub fn parse(nwo: &str) -> Option<Self> {
        let mut parts = nwo.trim().split('/');
        let owner = parts.next()?;
        let repo = parts.next()?;
        if parts.next().is_some() || owner.is_empty() || repo.is_empty() {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

impl fmt::Display for RepositoryNwo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// A configuration file living in another repository, written as
/// `owner/repo/path@ref`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfigReference {
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub git_ref: String,
}

impl RemoteConfigReference {
    /// Parse `owner/repo/path@ref`. The path segment is mandatory.
    pub fn parse(reference: &str) -> Option<Self> {
        let captures = REMOTE_CONFIG_FORMAT.captures(reference.trim())?;
        Some(Self {
            owner: captures["owner"].to_string(),
            repo: captures["repo"].to_string(),
            path: captures["path"].to_string(),
            git_ref: captures["ref"].to_string(),
        })
    }
}

impl fmt::Display for RemoteConfigReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}@{}", self.owner, self.repo, self.path, self.git_ref)
    }
}

/// Queries living in another repository: `owner/repo[/path]@ref`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteQueryReference {
    pub owner: String,
    pub repo: String,
    pub path: Option<String>,
    pub git_ref: String,
}

impl fmt::Display for RemoteQueryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)?;
        if let Some(path) = &self.path {
            write!(f, "/{}", path)?;
        }
        write!(f, "@{}", self.git_ref)
    }
}

/// Parsed form of a `queries[].uses` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryReference {
    /// Absolute, canonical path inside the checkout.
    Local(Utf8PathBuf),
    /// Name of a built-in suite such as `security-extended`.
    BuiltinSuite(String),
    /// Queries to be fetched by the analysis tool.
    Remote(RemoteQueryReference),
}
