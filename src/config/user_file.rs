use super::error::{ConfigError, ConfigField};
use serde_yaml_ng::{Mapping, Value};

/// One entry of the `queries` sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryEntry {
    pub name: Option<String>,
    /// `None` when the key is missing or not a string; rejected when resolved.
    pub uses: Option<String>,
}

/// The user configuration file after type validation.
///
/// ```yaml
/// name: "My scan"
/// disable-default-queries: false
/// queries:
///   - name: Extra security
///     uses: security-extended
///   - uses: ./queries/custom
/// paths-ignore:
///   - node_modules
/// paths:
///   - src
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct UserConfigFile {
    pub name: Option<String>,
    pub disable_default_queries: bool,
    pub queries: Vec<QueryEntry>,
    pub paths_ignore: Vec<String>,
    pub paths: Vec<String>,
    /// The parsed document, kept verbatim for diagnostics.
    pub raw: serde_json::Value,
}

impl UserConfigFile {
    /// Parse and type-check a configuration file.
    ///
    /// # Arguments
    /// * `contents` - The YAML text
    /// * `config_file` - Display name of the file, used in error messages
    pub fn parse(contents: &str, config_file: &str) -> Result<Self, ConfigError> {
        let document: Value =
            serde_yaml_ng::from_str(contents).map_err(|source| ConfigError::ConfigFileParse {
                config_file: config_file.to_string(),
                source,
            })?;

        let mapping = match document {
            // An empty file configures nothing
            Value::Null => Mapping::new(),
            Value::Mapping(mapping) => mapping,
            _ => {
                return Err(ConfigError::ConfigFileFormatInvalid {
                    config_file: config_file.to_string(),
                });
            }
        };

        let invalid = |field| ConfigError::FieldInvalid {
            config_file: config_file.to_string(),
            field,
        };

        let name = match mapping.get(ConfigField::Name.as_str()) {
            None => None,
            Some(Value::String(name)) if !name.is_empty() => Some(name.clone()),
            Some(_) => return Err(invalid(ConfigField::Name)),
        };

        let disable_default_queries =
            match mapping.get(ConfigField::DisableDefaultQueries.as_str()) {
                None => false,
                Some(Value::Bool(disable)) => *disable,
                Some(_) => return Err(invalid(ConfigField::DisableDefaultQueries)),
            };

        let queries = match mapping.get(ConfigField::Queries.as_str()) {
            None => Vec::new(),
            Some(Value::Sequence(entries)) => entries
                .iter()
                .map(|entry| query_entry(entry, config_file))
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(invalid(ConfigField::Queries)),
        };

        let paths_ignore = string_list(&mapping, ConfigField::PathsIgnore)
            .ok_or_else(|| invalid(ConfigField::PathsIgnore))?;
        let paths =
            string_list(&mapping, ConfigField::Paths).ok_or_else(|| invalid(ConfigField::Paths))?;

        let raw = serde_json::to_value(&mapping).map_err(|_| {
            ConfigError::ConfigFileFormatInvalid {
                config_file: config_file.to_string(),
            }
        })?;

        Ok(Self {
            name,
            disable_default_queries,
            queries,
            paths_ignore,
            paths,
            raw,
        })
    }
}

fn query_entry(entry: &Value, config_file: &str) -> Result<QueryEntry, ConfigError> {
    let Value::Mapping(entry) = entry else {
        return Err(ConfigError::QueryUsesInvalid {
            config_file: Some(config_file.to_string()),
            uses: None,
        });
    };

    Ok(QueryEntry {
        name: entry.get("name").and_then(Value::as_str).map(str::to_string),
        uses: entry.get("uses").and_then(Value::as_str).map(str::to_string),
    })
}

/// `None` when the field is present but not a sequence of non-empty strings.
fn string_list(mapping: &Mapping, field: ConfigField) -> Option<Vec<String>> {
    match mapping.get(field.as_str()) {
        None => Some(Vec::new()),
        Some(Value::Sequence(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                _ => None,
            })
            .collect(),
        Some(_) => None,
    }
}
