//! Extra command-line options for the analysis tool.
//!
//! Options come from a JSON document keyed by subcommand path. At every level
//! the `*` key applies to all subcommands below it:
//!
//! ```json
//! { "*": ["--verbose"], "resolve": { "queries": ["--threads", 2] } }
//! ```

use serde_json::Value;
use thiserror::Error;

/// Environment variable carrying the options document.
pub const EXTRA_OPTIONS_ENV_VAR: &str = "CODESCAN_ACTION_EXTRA_OPTIONS";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtraOptionsError {
    #[error("The extra options for '{path}' ('{value}') are not in an array.")]
    NotAnArray { path: String, value: String },

    #[error("The extra option for '{path}' ('{value}') is not a primitive value.")]
    InvalidElement { path: String, value: String },
}

/// Collect the options that apply to a subcommand.
///
/// Options from `*` keys come before the options of the exact path, outer
/// levels first.
///
/// # Arguments
/// * `options` - The options document; `null` means no options
/// * `command` - Subcommand path, e.g. `["resolve", "queries"]`
pub fn get_extra_options(options: &Value, command: &[&str]) -> Result<Vec<String>, ExtraOptionsError> {
    collect(Some(options), command, &mut Vec::new())
}

fn collect<'a>(
    options: Option<&'a Value>,
    command: &[&'a str],
    location: &mut Vec<&'a str>,
) -> Result<Vec<String>, ExtraOptionsError> {
    location.push("*");
    let mut result = as_extra_options(options.and_then(|o| o.get("*")), location)?;
    location.pop();

    match command.split_first() {
        None => result.extend(as_extra_options(options, location)?),
        Some((next, rest)) => {
            location.push(*next);
            result.extend(collect(options.and_then(|o| o.get(*next)), rest, location)?);
            location.pop();
        }
    }

    Ok(result)
}

fn as_extra_options(
    options: Option<&Value>,
    location: &[&str],
) -> Result<Vec<String>, ExtraOptionsError> {
    let items = match options {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(ExtraOptionsError::NotAnArray {
                path: location.join("."),
                value: other.to_string(),
            });
        }
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(ExtraOptionsError::InvalidElement {
                path: location.join("."),
                value: other.to_string(),
            }),
        })
        .collect()
}

/// Parse the options document from its environment variable value.
///
/// An empty value means no options.
pub fn parse_extra_options(raw: Option<&str>) -> Result<Value, serde_json::Error> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Value::Null),
        Some(raw) => serde_json::from_str(raw),
    }
}
