//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, LogFormat, MissiveConfig};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use missive_config::ConfigLoader;
///
/// # fn main() -> Result<(), missive_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("missive.toml")?
///     .with_env_prefix("MISSIVE")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: MissiveConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: MissiveConfig::default(),
            env_prefix: None,
        }
    }

    /// Start with default configuration values.
    ///
    /// This is what `new()` starts with, but can be chained for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = MissiveConfig::default();
        self
    }

    /// Start with the development preset.
    ///
    /// ```
    /// use missive_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = MissiveConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = MissiveConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is picked from the extension: `.toml` or `.json`.
    /// Sections missing from the file take their default values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format (`"toml"` or
    /// `"json"`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unknown.
    ///
    /// # Example
    ///
    /// ```
    /// use missive_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [response]
    ///     max_trace_size = 10
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.response.max_trace_size, 10);
    /// assert_eq!(config.response.default_content_type, "application/json");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => return Err(ConfigError::UnsupportedFormat(format.to_string())),
        };
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, for example
    /// `MISSIVE__RESPONSE__MAX_TRACE_SIZE=10` or `MISSIVE__LOGGING__LEVEL=debug`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file from the current directory (or its parents) into
    /// the process environment, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a `.env` file exists but is
    /// malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        self.apply_dotenv(".env", dotenvy::dotenv().map(|_| ()))
    }

    /// Load a specific dotenv file into the process environment, if it
    /// exists. Variables already set are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the file exists but is
    /// malformed.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let loaded = dotenvy::from_path(path);
        self.apply_dotenv(&path.display().to_string(), loaded)
    }

    fn apply_dotenv(self, source: &str, loaded: dotenvy::Result<()>) -> Result<Self, ConfigError> {
        match loaded {
            Ok(()) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::invalid_value(source, e.to_string())),
        }
    }

    /// Applies environment overrides (if a prefix was set), validates, and
    /// returns the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an environment variable cannot be parsed or
    /// validation fails.
    pub fn load(mut self) -> Result<MissiveConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars: Vec<(String, String)> = env::vars().collect();
            self.apply_env_vars(&prefix, vars)?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without environment overrides or
    /// validation.
    #[must_use]
    pub fn load_unvalidated(self) -> MissiveConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<MissiveConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    fn apply_env_vars<I>(&mut self, prefix: &str, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let scope = format!("{prefix}__");
        for (key, value) in vars {
            if let Some(path) = key.strip_prefix(&scope) {
                self.apply_env_var(&key, path, &value)?;
            }
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, path: &str, value: &str) -> Result<(), ConfigError> {
        let parts: Vec<&str> = path.split("__").collect();
        let response = &mut self.config.response;
        let logging = &mut self.config.logging;

        match parts.as_slice() {
            ["RESPONSE", "MAX_TRACE_SIZE"] => response.max_trace_size = parse_int(key, value)?,
            ["RESPONSE", "RESPONSE_SIZE_LIMIT"] => {
                response.response_size_limit = parse_int(key, value)?;
            }
            ["RESPONSE", "MAX_INTERCEPTOR_AMOUNT"] => {
                response.max_interceptor_amount = parse_int(key, value)?;
            }
            ["RESPONSE", "DEFAULT_CONTENT_TYPE"] => {
                response.default_content_type = value.to_string();
            }
            ["RESPONSE", "ENABLE_SIZE_VALIDATION"] => {
                response.enable_size_validation = parse_flag(key, value)?;
            }

            ["LOGGING", "ENABLED"] => logging.enabled = parse_flag(key, value)?,
            ["LOGGING", "LEVEL"] => logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "FILE_LINE_INFO"] => logging.file_line_info = parse_flag(key, value)?,
            ["LOGGING", "INCLUDE_TARGET"] => logging.include_target = parse_flag(key, value)?,
            ["LOGGING", "SERVICE_NAME"] => logging.service_name = value.to_string(),

            // Unknown keys under the prefix are ignored.
            _ => {}
        }

        Ok(())
    }
}

fn parse_int(key: &str, value: &str) -> Result<i64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, MissiveConfig::default());
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"response": {"max_interceptor_amount": 3}, "logging": {"format": "pretty"}}"#;
        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.response.max_interceptor_amount, 3);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_loader_with_string_unknown_format() {
        let result = ConfigLoader::new().with_string("a: 1", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/missive.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/missive.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, MissiveConfig::default());
    }

    #[test]
    fn test_loader_with_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[response]\nresponse_size_limit = 4096\nenable_size_validation = false\n\n[logging]\nlevel = \"warn\""
        )
        .unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.response.response_size_limit, 4096);
        assert!(!config.response.enable_size_validation);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_loader_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_loader_negative_file_value_falls_back() {
        let config = ConfigLoader::new()
            .with_string("[response]\nmax_trace_size = -4\n", "toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.response_config().normalized().max_trace_size, 50);
    }

    #[test]
    fn test_apply_env_vars_response_section() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_vars(
                "TEST",
                vars(&[
                    ("TEST__RESPONSE__MAX_TRACE_SIZE", "5"),
                    ("TEST__RESPONSE__DEFAULT_CONTENT_TYPE", "text/plain"),
                    ("TEST__RESPONSE__ENABLE_SIZE_VALIDATION", "off"),
                    ("OTHER__RESPONSE__MAX_TRACE_SIZE", "99"),
                ]),
            )
            .unwrap();

        assert_eq!(loader.config.response.max_trace_size, 5);
        assert_eq!(loader.config.response.default_content_type, "text/plain");
        assert!(!loader.config.response.enable_size_validation);
    }

    #[test]
    fn test_apply_env_vars_logging_section() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_vars(
                "TEST",
                vars(&[
                    ("TEST__LOGGING__LEVEL", "debug"),
                    ("TEST__LOGGING__FORMAT", "Pretty"),
                    ("TEST__LOGGING__SERVICE_NAME", "orders"),
                ]),
            )
            .unwrap();

        assert_eq!(loader.config.logging.level, "debug");
        assert_eq!(loader.config.logging.format, LogFormat::Pretty);
        assert_eq!(loader.config.logging.service_name, "orders");
    }

    #[test]
    fn test_apply_env_vars_prefix_must_be_followed_by_separator() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_vars("TEST", vars(&[("TESTING__RESPONSE__MAX_TRACE_SIZE", "1")]))
            .unwrap();
        assert_eq!(loader.config.response.max_trace_size, 50);
    }

    #[test]
    fn test_apply_env_var_invalid_integer() {
        let mut loader = ConfigLoader::new();
        let result = loader.apply_env_vars(
            "TEST",
            vars(&[("TEST__RESPONSE__RESPONSE_SIZE_LIMIT", "lots")]),
        );
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));
    }

    #[test]
    fn test_apply_env_var_negative_integer_accepted() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_vars("TEST", vars(&[("TEST__RESPONSE__MAX_INTERCEPTOR_AMOUNT", "-2")]))
            .unwrap();
        assert_eq!(loader.config.response.max_interceptor_amount, -2);
        assert_eq!(loader.config.response_config().max_interceptor_amount, 0);
    }

    #[test]
    fn test_loader_with_production_resets_preset() {
        let config = ConfigLoader::new()
            .with_development()
            .with_production()
            .load()
            .unwrap();
        assert_eq!(config, MissiveConfig::production());
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_unvalidated_skips_validation() {
        let loader = || {
            ConfigLoader::new()
                .with_string("[logging]\nlevel = \"missive=loud\"\n", "toml")
                .unwrap()
        };

        assert!(matches!(
            loader().load(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "logging.level"
        ));
        assert_eq!(loader().load_unvalidated().logging.level, "missive=loud");
    }

    #[test]
    fn test_dotenv_missing_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigLoader::new().with_dotenv_file(dir.path().join(".env"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_dotenv_file_sets_unset_variables() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "MISSIVE_LOADER_DOTENV_CHECK=from-dotenv").unwrap();

        ConfigLoader::new().with_dotenv_file(file.path()).unwrap();
        assert_eq!(
            env::var("MISSIVE_LOADER_DOTENV_CHECK").as_deref(),
            Ok("from-dotenv")
        );
    }

    #[test]
    fn test_dotenv_malformed_file_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "MISSIVE_LOADER_DOTENV_BROKEN=\"unterminated").unwrap();

        let result = ConfigLoader::new().with_dotenv_file(file.path());
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }
}
