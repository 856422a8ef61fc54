//! Response configuration and the process-wide configuration store.
//!
//! [`ResponseConfig`] holds the limits and defaults applied while building
//! and delivering responses. [`ConfigStore`] owns the process-wide copy behind
//! a read-write lock: construction and delivery take read snapshots, while
//! administrative updates take the write lock only for the swap itself.
//!
//! Updates never fail. Any zero numeric field or empty content type is
//! replaced with its built-in default before the new value is stored.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Default number of trace entries kept per response.
pub const DEFAULT_MAX_TRACE_SIZE: usize = 50;

/// Default encoded response size limit (10 MiB).
pub const DEFAULT_RESPONSE_SIZE_LIMIT: usize = 10 * 1024 * 1024;

/// Default number of interceptors the registry accepts.
pub const DEFAULT_MAX_INTERCEPTOR_AMOUNT: usize = 20;

/// Default media type for emitted responses.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Limits and defaults for response construction and delivery.
///
/// `Default` yields the built-in defaults. [`ResponseConfig::unset`] yields
/// the all-zero value that marks "no per-response override".
///
/// # Example
///
/// ```
/// use missive_core::ResponseConfig;
///
/// let config = ResponseConfig {
///     max_trace_size: 0,
///     ..ResponseConfig::default()
/// }
/// .normalized();
///
/// assert_eq!(config.max_trace_size, 50);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseConfig {
    /// Maximum number of trace entries kept on a response.
    pub max_trace_size: usize,

    /// Maximum encoded response size in bytes.
    pub response_size_limit: usize,

    /// Maximum number of registered interceptors.
    pub max_interceptor_amount: usize,

    /// Content type applied to new responses.
    pub default_content_type: String,

    /// Whether the size guard runs before delivery.
    pub enable_size_validation: bool,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            max_trace_size: DEFAULT_MAX_TRACE_SIZE,
            response_size_limit: DEFAULT_RESPONSE_SIZE_LIMIT,
            max_interceptor_amount: DEFAULT_MAX_INTERCEPTOR_AMOUNT,
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
            enable_size_validation: true,
        }
    }
}

impl ResponseConfig {
    /// Returns the all-zero configuration used as "no override".
    #[must_use]
    pub fn unset() -> Self {
        Self {
            max_trace_size: 0,
            response_size_limit: 0,
            max_interceptor_amount: 0,
            default_content_type: String::new(),
            enable_size_validation: false,
        }
    }

    /// Returns `true` when every numeric field is zero and the content type
    /// is empty.
    ///
    /// `enable_size_validation` does not take part in the check, so an
    /// override that only flips the toggle still counts as unset.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.max_trace_size == 0
            && self.response_size_limit == 0
            && self.max_interceptor_amount == 0
            && self.default_content_type.is_empty()
    }

    /// Replaces zero numeric fields and an empty content type with the
    /// built-in defaults. Other fields pass through unchanged.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.max_trace_size == 0 {
            self.max_trace_size = DEFAULT_MAX_TRACE_SIZE;
        }
        if self.response_size_limit == 0 {
            self.response_size_limit = DEFAULT_RESPONSE_SIZE_LIMIT;
        }
        if self.max_interceptor_amount == 0 {
            self.max_interceptor_amount = DEFAULT_MAX_INTERCEPTOR_AMOUNT;
        }
        if self.default_content_type.is_empty() {
            self.default_content_type = DEFAULT_CONTENT_TYPE.to_string();
        }
        self
    }
}

/// Process-wide response configuration.
///
/// Share it through an `Arc`; every response keeps a handle so trace
/// capacity and defaults are read at the moment they are needed.
#[derive(Debug, Default)]
pub struct ConfigStore {
    inner: RwLock<ResponseConfig>,
}

impl ConfigStore {
    /// Creates a store holding the built-in defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `config`, normalized.
    #[must_use]
    pub fn with_config(config: ResponseConfig) -> Self {
        Self {
            inner: RwLock::new(config.normalized()),
        }
    }

    /// Replaces the active configuration with a normalized copy of `config`.
    pub fn update(&self, config: ResponseConfig) {
        let config = config.normalized();
        tracing::debug!(
            max_trace_size = config.max_trace_size,
            response_size_limit = config.response_size_limit,
            max_interceptor_amount = config.max_interceptor_amount,
            default_content_type = %config.default_content_type,
            enable_size_validation = config.enable_size_validation,
            "response configuration updated"
        );
        *self.inner.write() = config;
    }

    /// Returns a snapshot of the active configuration.
    #[must_use]
    pub fn read(&self) -> ResponseConfig {
        self.inner.read().clone()
    }

    /// Returns the configuration in effect for one response.
    ///
    /// A set override wins outright, even when only one of its fields is
    /// non-zero; fields are never merged with the process-wide values.
    #[must_use]
    pub fn resolve(&self, instance_override: &ResponseConfig) -> ResponseConfig {
        if instance_override.is_unset() {
            self.read()
        } else {
            instance_override.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_defaults() {
        let config = ResponseConfig::default();
        assert_eq!(config.max_trace_size, 50);
        assert_eq!(config.response_size_limit, 10 * 1024 * 1024);
        assert_eq!(config.max_interceptor_amount, 20);
        assert_eq!(config.default_content_type, "application/json");
        assert!(config.enable_size_validation);
    }

    #[test]
    fn test_update_normalizes_invalid_fields() {
        let store = ConfigStore::new();
        store.update(ResponseConfig {
            max_trace_size: 0,
            response_size_limit: 512,
            max_interceptor_amount: 0,
            default_content_type: String::new(),
            enable_size_validation: false,
        });

        let config = store.read();
        assert_eq!(config.max_trace_size, DEFAULT_MAX_TRACE_SIZE);
        assert_eq!(config.response_size_limit, 512);
        assert_eq!(config.max_interceptor_amount, DEFAULT_MAX_INTERCEPTOR_AMOUNT);
        assert_eq!(config.default_content_type, DEFAULT_CONTENT_TYPE);
        assert!(!config.enable_size_validation);
    }

    #[test]
    fn test_resolve_unset_override_uses_store() {
        let store = ConfigStore::with_config(ResponseConfig {
            max_trace_size: 7,
            ..ResponseConfig::default()
        });

        let resolved = store.resolve(&ResponseConfig::unset());
        assert_eq!(resolved.max_trace_size, 7);
    }

    #[test]
    fn test_resolve_partial_override_replaces_everything() {
        let store = ConfigStore::new();
        let partial = ResponseConfig {
            max_trace_size: 3,
            ..ResponseConfig::unset()
        };

        let resolved = store.resolve(&partial);
        assert_eq!(resolved, partial);
        assert_eq!(resolved.response_size_limit, 0);
        assert_eq!(resolved.default_content_type, "");
    }

    #[test]
    fn test_toggle_alone_does_not_count_as_override() {
        let override_config = ResponseConfig {
            enable_size_validation: true,
            ..ResponseConfig::unset()
        };
        assert!(override_config.is_unset());
    }

    fn generation(g: usize) -> ResponseConfig {
        ResponseConfig {
            max_trace_size: g,
            response_size_limit: g * 1000,
            max_interceptor_amount: g,
            default_content_type: format!("application/v{g}+json"),
            enable_size_validation: g % 2 == 0,
        }
    }

    fn assert_consistent(config: &ResponseConfig) {
        let g = config.max_trace_size;
        assert!((1..=200).contains(&g), "unexpected generation {g}");
        assert_eq!(config, &generation(g), "torn snapshot");
    }

    #[test]
    fn test_concurrent_updates_never_tear_snapshots() {
        let store = ConfigStore::with_config(generation(1));

        std::thread::scope(|scope| {
            for writer in 0..2 {
                let store = &store;
                scope.spawn(move || {
                    for g in (1 + writer..=200).step_by(2) {
                        store.update(generation(g));
                    }
                });
            }

            for _ in 0..4 {
                let store = &store;
                scope.spawn(move || {
                    for _ in 0..500 {
                        assert_consistent(&store.read());
                        assert_consistent(&store.resolve(&ResponseConfig::unset()));
                    }
                });
            }
        });

        assert_consistent(&store.read());
    }

    proptest! {
        #[test]
        fn prop_update_keeps_valid_fields(
            trace in 0usize..200,
            limit in 0usize..1_000_000,
            interceptors in 0usize..50,
            content_type in "[a-z/]{0,12}",
            toggle in any::<bool>(),
        ) {
            let store = ConfigStore::new();
            store.update(ResponseConfig {
                max_trace_size: trace,
                response_size_limit: limit,
                max_interceptor_amount: interceptors,
                default_content_type: content_type.clone(),
                enable_size_validation: toggle,
            });
            let config = store.read();

            prop_assert_eq!(config.max_trace_size, if trace == 0 { DEFAULT_MAX_TRACE_SIZE } else { trace });
            prop_assert_eq!(config.response_size_limit, if limit == 0 { DEFAULT_RESPONSE_SIZE_LIMIT } else { limit });
            prop_assert_eq!(
                config.max_interceptor_amount,
                if interceptors == 0 { DEFAULT_MAX_INTERCEPTOR_AMOUNT } else { interceptors }
            );
            if content_type.is_empty() {
                prop_assert_eq!(config.default_content_type.as_str(), DEFAULT_CONTENT_TYPE);
            } else {
                prop_assert_eq!(config.default_content_type, content_type);
            }
            prop_assert_eq!(config.enable_size_validation, toggle);
        }
    }
}
