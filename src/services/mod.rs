//! Services module - the collaborators configuration loading talks to.
//!
//! Everything that reaches outside the process lives here: the external
//! analysis tool, the source-hosting API, and the host machine itself.
//!
//! # Components
//!
//! - [`AnalysisTool`]: capability trait for resolving suites and paths to query
//!   files, implemented for the real binary by [`CodeQlCli`]
//! - [`SourceHost`]: capability trait for the source-hosting REST API,
//!   implemented by [`GitHubClient`]
//! - [`get_file_contents_using_api`]: downloads and decodes a remote
//!   configuration file
//! - [`get_languages`]: resolves the language set from input or auto-detection
//! - [`memory_flag`] / [`threads_flag`]: resource limits for the tool command line
//! - [`get_extra_options`]: user-supplied extra tool arguments
//!
//! The loader receives the two capability traits as explicit parameters, so
//! tests can substitute doubles for the binary and the network.
//!
//! # Usage Example
//!
//! ```ignore
//! use codescan_action::services::{CodeQlCli, GitHubClient, get_languages};
//!
//! let host = GitHubClient::new("https://api.github.com", &token)?;
//! let languages = get_languages("javascript,python", &repository, &host).await?;
//! ```

pub mod analysis_tool;
pub mod api;
pub mod extra_options;
pub mod languages;
pub mod remote_config;
pub mod resources;

pub use analysis_tool::{AnalysisTool, CodeQlCli, ResolveQueriesOutput, ResolvedQueries, ToolError};
pub use api::{ApiError, ApiResponse, DEFAULT_API_URL, GitHubClient, SourceHost};
pub use extra_options::{ExtraOptionsError, get_extra_options, parse_extra_options};
pub use languages::get_languages;
pub use remote_config::get_file_contents_using_api;
pub use resources::{FlagError, HostResources, get_memory_flag, get_threads_flag, memory_flag, threads_flag};
