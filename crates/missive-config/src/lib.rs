//! Typed configuration loading for Missive.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict parsing (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use missive_config::ConfigLoader;
//! use missive_core::ConfigStore;
//!
//! # fn main() -> Result<(), missive_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()?
//!     .with_optional_file("missive.toml")?
//!     .with_env_prefix("MISSIVE")
//!     .load()?;
//!
//! let store = Arc::new(ConfigStore::new());
//! config.apply_to(&store);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [response]
//! max_trace_size = 50
//! response_size_limit = 10485760
//! max_interceptor_amount = 20
//! default_content_type = "application/json"
//! enable_size_validation = true
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! service_name = "users-api"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Every key can be overridden with `PREFIX__SECTION__KEY`, e.g.
//! `MISSIVE__RESPONSE__MAX_TRACE_SIZE=10` or `MISSIVE__LOGGING__FORMAT=pretty`.
//! Zero or negative numbers fall back to their defaults once applied.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{LogFormat, LoggingSection, MissiveConfig, ResponseSection};
pub use error::ConfigError;
pub use loader::ConfigLoader;
