//! Data models for the action.
//!
//! This module contains the core data structures shared by the loader and the services:
//! - [`Config`]: The resolved configuration persisted under the run's temp directory
//! - [`InitInputs`]: Workflow inputs consumed by [`ConfigLoader`](crate::config::ConfigLoader)
//! - [`Language`]: Supported analysis languages and their aliases
//! - [`QueryReference`], [`RemoteConfigReference`], [`RepositoryNwo`]: Parsed references
//!
//! # Architecture Note
//!
//! The models are designed to be:
//! - **Serializable**: [`Config`] derives `Serialize`/`Deserialize` for JSON persistence
//! - **Immutable**: A [`Config`] is built once per run and only read afterwards

pub mod config;
pub mod language;
pub mod reference;

pub use config::{Config, InitInputs, QueryMap};
pub use language::Language;
pub use reference::{QueryReference, RemoteConfigReference, RemoteQueryReference, RepositoryNwo};
