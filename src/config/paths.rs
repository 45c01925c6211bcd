//! Validation of `paths` and `paths-ignore` glob patterns.
//!
//! Downstream filtering treats every pattern as a prefix, so a trailing `**`
//! adds nothing and is stripped here. A `**` is only meaningful as a whole
//! path segment.

use super::error::{ConfigError, ConfigField, PathPatternProblem};

/// Characters the downstream matcher does not interpret; they match literally.
const UNSUPPORTED_GLOB_CHARS: [char; 5] = ['?', '+', '[', ']', '!'];

/// Validate a path filter pattern and return its sanitised form.
///
/// # Arguments
/// * `pattern` - The pattern as written in the configuration file
/// * `field` - Which property the pattern came from, for error messages
/// * `config_file` - The configuration file, for error messages
///
/// # Errors
///
/// Returns [`ConfigError::InvalidPathPattern`] when the pattern is `**`, a
/// repetition such as `**/**`, or otherwise empty after sanitisation, uses `**` inside a segment such as
/// `a/**b`, or contains a backslash.
pub fn validate_and_sanitise_path(
    pattern: &str,
    field: ConfigField,
    config_file: &str,
) -> Result<String, ConfigError> {
    let invalid = |problem| ConfigError::InvalidPathPattern {
        config_file: config_file.to_string(),
        field,
        pattern: pattern.to_string(),
        problem,
    };

    // Paths are relative to the checkout root
    let path = pattern.trim_start_matches('/');

    if path
        .split('/')
        .any(|segment| segment.contains("**") && segment != "**")
    {
        return Err(invalid(PathPatternProblem::InvalidDoubleStar));
    }

    let sanitised = match path
        .strip_suffix("/**/")
        .or_else(|| path.strip_suffix("/**"))
    {
        Some(prefix) => {
            tracing::info!(
                "Stripped trailing \"**\" from {} pattern \"{}\" in {}",
                field,
                pattern,
                config_file
            );
            format!("{}/", prefix)
        }
        None => path.to_string(),
    };

    // `**/` alone is allowed, but repeating it still matches everything
    let segments = path.split('/').filter(|segment| !segment.is_empty());
    let only_double_stars =
        segments.clone().all(|segment| segment == "**") && segments.count() > 1;

    if sanitised.is_empty() || sanitised == "**" || only_double_stars {
        return Err(invalid(PathPatternProblem::Meaningless));
    }

    if sanitised.contains('\\') {
        return Err(invalid(PathPatternProblem::Backslash));
    }

    if sanitised.contains(UNSUPPORTED_GLOB_CHARS) {
        tracing::warn!(
            "{} pattern \"{}\" in {} contains an unsupported character. The filter pattern characters ?, +, [, ], ! are not supported and will be matched literally.",
            field,
            pattern,
            config_file
        );
    }

    Ok(sanitised)
}
