//! Parsing of `queries[].uses` values.
//!
//! A `uses` value takes one of three shapes:
//! - `./relative/path` into the checkout
//! - a built-in suite keyword such as `security-extended`
//! - `owner/repo[/path]@ref` for queries living in another repository

use super::error::ConfigError;
use super::normalize_lexically;
use crate::models::{Language, QueryReference, RemoteQueryReference};
use camino::Utf8Path;

/// Suites that may be referenced by bare name.
pub const BUILTIN_SUITES: [&str; 2] = ["security-extended", "security-and-quality"];

/// Built-in queries that are never run, keyed by language and matched as path suffixes.
const DISABLED_BUILTIN_QUERIES: &[(Language, &str)] = &[
    (
        Language::Csharp,
        "ql/src/Security Features/CWE-937/VulnerablePackage.ql",
    ),
    (
        Language::Csharp,
        "ql/src/Security Features/CWE-451/MissingXFrameOptions.ql",
    ),
];

/// Where a `uses` value was declared.
#[derive(Debug, Clone, Copy)]
pub struct QueryOrigin<'a> {
    /// The configuration file, or `None` for the workflow `queries` input.
    pub config_file: Option<&'a str>,
    /// Directory that `./` paths are resolved against.
    pub base_dir: &'a Utf8Path,
    /// Root of the checkout; local paths may not escape it.
    pub checkout_path: &'a Utf8Path,
}

impl QueryOrigin<'_> {
    fn uses_invalid(&self, uses: Option<&str>) -> ConfigError {
        ConfigError::QueryUsesInvalid {
            config_file: self.config_file.map(str::to_string),
            uses: uses.map(str::to_string),
        }
    }
}

/// Parse a `uses` value into a [`QueryReference`].
///
/// Local paths are checked against the filesystem: they must stay inside the
/// checkout (also after following symlinks) and must exist. The returned
/// local path is canonical.
pub fn parse_query_uses(
    uses: Option<&str>,
    origin: &QueryOrigin<'_>,
) -> Result<QueryReference, ConfigError> {
    let uses = match uses.map(str::trim) {
        Some(uses) if !uses.is_empty() => uses,
        _ => return Err(origin.uses_invalid(None)),
    };

    if let Some(local_path) = uses.strip_prefix("./") {
        return resolve_local_path(local_path, origin).map(QueryReference::Local);
    }

    if !uses.contains('/') && !uses.contains('@') {
        if BUILTIN_SUITES.contains(&uses) {
            return Ok(QueryReference::BuiltinSuite(uses.to_string()));
        }
        return Err(origin.uses_invalid(Some(uses)));
    }

    parse_remote(uses)
        .map(QueryReference::Remote)
        .ok_or_else(|| origin.uses_invalid(Some(uses)))
}

fn resolve_local_path(
    local_path: &str,
    origin: &QueryOrigin<'_>,
) -> Result<camino::Utf8PathBuf, ConfigError> {
    let outside = || ConfigError::LocalPathOutsideOfRepository {
        config_file: origin.config_file.map(str::to_string),
        local_path: local_path.to_string(),
    };

    let checkout = normalize_lexically(origin.checkout_path);
    let absolute = normalize_lexically(&origin.base_dir.join(local_path));

    if !absolute.starts_with(&checkout) {
        return Err(outside());
    }

    if !absolute.exists() {
        return Err(ConfigError::LocalPathDoesNotExist {
            config_file: origin.config_file.map(str::to_string),
            local_path: local_path.to_string(),
        });
    }

    // Symlinks may still point outside the checkout
    let canonical = absolute
        .canonicalize_utf8()
        .map_err(|e| ConfigError::io(&absolute, e))?;
    let canonical_checkout = checkout
        .canonicalize_utf8()
        .map_err(|e| ConfigError::io(&checkout, e))?;
    if !canonical.starts_with(&canonical_checkout) {
        return Err(outside());
    }

    Ok(canonical)
}

fn parse_remote(uses: &str) -> Option<RemoteQueryReference> {
    let (nwo_and_path, git_ref) = uses.split_once('@')?;
    if git_ref.is_empty() || git_ref.contains('@') || nwo_and_path.contains("://") {
        return None;
    }

    let mut segments = nwo_and_path.split('/');
    let owner = segments.next().filter(|s| !s.is_empty())?;
    let repo = segments.next().filter(|s| !s.is_empty())?;

    let path: Vec<&str> = segments.filter(|s| !s.is_empty()).collect();
    if path.iter().any(|s| *s == "..") {
        return None;
    }

    Some(RemoteQueryReference {
        owner: owner.to_string(),
        repo: repo.to_string(),
        path: (!path.is_empty()).then(|| path.join("/")),
        git_ref: git_ref.to_string(),
    })
}

/// Whether a resolved query is on the disabled list for `language`.
pub fn query_is_disabled(language: Language, query_path: &str) -> bool {
    DISABLED_BUILTIN_QUERIES
        .iter()
        .any(|(disabled_language, suffix)| {
            *disabled_language == language && query_path.ends_with(suffix)
        })
}
