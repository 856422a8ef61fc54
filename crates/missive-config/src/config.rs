//! Configuration types.
//!
//! [`MissiveConfig`] is the root of a configuration file. Its `[response]`
//! section feeds [`ConfigStore::update`], its `[logging]` section feeds
//! [`missive_telemetry::init_logging`].

use missive_core::{
    ConfigStore, ResponseConfig, DEFAULT_CONTENT_TYPE, DEFAULT_MAX_INTERCEPTOR_AMOUNT,
    DEFAULT_MAX_TRACE_SIZE, DEFAULT_RESPONSE_SIZE_LIMIT,
};
use missive_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Complete Missive configuration.
///
/// # Example
///
/// ```
/// use missive_config::MissiveConfig;
///
/// let config = MissiveConfig::default();
/// assert_eq!(config.response.max_trace_size, 50);
/// assert_eq!(config.logging.level, "info");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct MissiveConfig {
    /// Response limits and defaults.
    #[serde(default)]
    pub response: ResponseSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl MissiveConfig {
    /// Development preset: pretty, debug-level logs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            response: ResponseSection::default(),
            logging: LoggingSection {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                file_line_info: true,
                ..LoggingSection::default()
            },
        }
    }

    /// Production preset: JSON, info-level logs.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Validates the configuration.
    ///
    /// Response numbers are never rejected; out-of-range values fall back to
    /// their defaults when applied. Only the logging filter is checked.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `logging.level` is not a valid
    /// filter directive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.enabled {
            missive_telemetry::logging::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }
        Ok(())
    }

    /// Returns the response configuration this file describes.
    #[must_use]
    pub fn response_config(&self) -> ResponseConfig {
        self.response.to_response_config()
    }

    /// Returns the logging configuration this file describes.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        self.logging.to_log_config()
    }

    /// Installs the response section into `store`.
    pub fn apply_to(&self, store: &ConfigStore) {
        store.update(self.response_config());
    }
}

/// The `[response]` section.
///
/// Numbers are signed so that a negative value loads and is then treated
/// like zero, i.e. replaced by its default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ResponseSection {
    /// Maximum number of trace entries per response.
    pub max_trace_size: i64,

    /// Maximum encoded response size in bytes.
    pub response_size_limit: i64,

    /// Maximum number of registered interceptors.
    pub max_interceptor_amount: i64,

    /// Media type for emitted responses.
    pub default_content_type: String,

    /// Whether the size guard runs before delivery.
    pub enable_size_validation: bool,
}

impl Default for ResponseSection {
    fn default() -> Self {
        Self {
            max_trace_size: DEFAULT_MAX_TRACE_SIZE as i64,
            response_size_limit: DEFAULT_RESPONSE_SIZE_LIMIT as i64,
            max_interceptor_amount: DEFAULT_MAX_INTERCEPTOR_AMOUNT as i64,
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
            enable_size_validation: true,
        }
    }
}

impl ResponseSection {
    /// Converts to a [`ResponseConfig`], clamping negatives to zero.
    #[must_use]
    pub fn to_response_config(&self) -> ResponseConfig {
        ResponseConfig {
            max_trace_size: clamp_to_usize(self.max_trace_size),
            response_size_limit: clamp_to_usize(self.response_size_limit),
            max_interceptor_amount: clamp_to_usize(self.max_interceptor_amount),
            default_content_type: self.default_content_type.clone(),
            enable_size_validation: self.enable_size_validation,
        }
    }
}

fn clamp_to_usize(value: i64) -> usize {
    usize::try_from(value.max(0)).unwrap_or(usize::MAX)
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines.
    #[default]
    Json,
    /// Human-readable, multi-line.
    Pretty,
}

/// The `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive.
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include the event target.
    pub include_target: bool,

    /// Service name attached to interceptor log events.
    pub service_name: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        let defaults = LogConfig::default();
        Self {
            enabled: defaults.enabled,
            level: defaults.level,
            format: LogFormat::Json,
            file_line_info: defaults.file_line_info,
            include_target: defaults.include_target,
            service_name: defaults.service_name,
        }
    }
}

impl LoggingSection {
    /// Converts to a [`LogConfig`].
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            file_line_info: self.file_line_info,
            include_target: self.include_target,
            service_name: self.service_name.clone(),
        }
    }
}
