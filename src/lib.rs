// Codescan Action - configuration resolution for a CI static-analysis action
//
// This is the library crate containing configuration loading, the external
// collaborators it talks to, and the resource flag calculation.
// The binary crate (main.rs) provides the action entry point.

pub mod config;
pub mod logging;
pub mod models;
pub mod services;
pub mod settings;

// Re-export commonly used types for convenience
pub use config::{ConfigError, ConfigLoader, get_config, get_path_to_parsed_config_file};
pub use models::{Config, InitInputs, Language, QueryMap, RepositoryNwo};
pub use services::{AnalysisTool, CodeQlCli, GitHubClient, SourceHost};
pub use settings::ActionSettings;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
