//! Interceptors and the bounded registry that holds them.
//!
//! An [`Interceptor`] observes every response right before it is written to
//! its destination. Interceptors are registered once, typically at startup,
//! and called in registration order on every send.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use missive_core::ConfigStore;
//! use missive_delivery::{FnInterceptor, InterceptorRegistry};
//!
//! let registry = InterceptorRegistry::new(Arc::new(ConfigStore::new()));
//! registry
//!     .register(FnInterceptor::new("audit", |_ctx, response, status| {
//!         println!("{} {}", status, response.message());
//!     }))
//!     .unwrap();
//!
//! assert_eq!(registry.len(), 1);
//! ```

use http::StatusCode;
use missive_core::{ConfigStore, MissiveError, MissiveResult, RequestContext, Response};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// An observer invoked immediately before a response is emitted.
///
/// # Invariants
///
/// - Interceptors observe; they cannot change what is emitted
/// - `ctx` is `Some` only when the caller supplied a non-empty context
/// - Any state an interceptor keeps is its own to synchronize
pub trait Interceptor: Send + Sync + 'static {
    /// Returns the name of this interceptor, used in logs.
    fn name(&self) -> &'static str;

    /// Observes `response`, which is about to be emitted with `status`.
    fn intercept(&self, ctx: Option<&RequestContext>, response: &Response, status: StatusCode);
}

/// An interceptor built from a closure.
pub struct FnInterceptor<F> {
    name: &'static str,
    func: F,
}

impl<F> FnInterceptor<F>
where
    F: Fn(Option<&RequestContext>, &Response, StatusCode) + Send + Sync + 'static,
{
    /// Creates a new closure-based interceptor.
    pub fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Interceptor for FnInterceptor<F>
where
    F: Fn(Option<&RequestContext>, &Response, StatusCode) + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn intercept(&self, ctx: Option<&RequestContext>, response: &Response, status: StatusCode) {
        (self.func)(ctx, response, status);
    }
}

impl<F> fmt::Debug for FnInterceptor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInterceptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered, bounded set of interceptors.
///
/// The bound is `max_interceptor_amount` from the process-wide
/// configuration, read at registration time.
pub struct InterceptorRegistry {
    interceptors: RwLock<Vec<Arc<dyn Interceptor>>>,
    store: Arc<ConfigStore>,
}

impl InterceptorRegistry {
    /// Creates an empty registry bounded by `store`.
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self {
            interceptors: RwLock::new(Vec::new()),
            store,
        }
    }

    /// Appends `interceptor`.
    ///
    /// Fails with [`MissiveError::InterceptorLimitExceeded`] and leaves the
    /// registry untouched when it is already full.
    pub fn register<I: Interceptor>(&self, interceptor: I) -> MissiveResult<()> {
        self.register_shared(Arc::new(interceptor))
    }

    /// Appends an interceptor that is already shared elsewhere.
    pub fn register_shared(&self, interceptor: Arc<dyn Interceptor>) -> MissiveResult<()> {
        let max = self.store.read().max_interceptor_amount;
        let mut interceptors = self.interceptors.write();
        if interceptors.len() >= max {
            return Err(MissiveError::InterceptorLimitExceeded {
                current: interceptors.len(),
                max,
            });
        }

        tracing::debug!(
            interceptor = interceptor.name(),
            position = interceptors.len(),
            "registered interceptor"
        );
        interceptors.push(interceptor);
        Ok(())
    }

    /// Removes every interceptor.
    pub fn clear(&self) {
        self.interceptors.write().clear();
    }

    /// Returns a copy of the current interceptors, in registration order.
    pub fn snapshot(&self) -> Vec<Arc<dyn Interceptor>> {
        self.interceptors.read().clone()
    }

    /// Returns the names of the registered interceptors.
    pub fn names(&self) -> Vec<&'static str> {
        self.interceptors.read().iter().map(|i| i.name()).collect()
    }

    /// Returns the number of registered interceptors.
    pub fn len(&self) -> usize {
        self.interceptors.read().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.interceptors.read().is_empty()
    }
}

impl fmt::Debug for InterceptorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorRegistry")
            .field("interceptors", &self.names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use missive_core::ResponseConfig;

    fn noop(name: &'static str) -> impl Interceptor {
        FnInterceptor::new(name, |_, _, _| {})
    }

    fn registry_with_limit(limit: usize) -> InterceptorRegistry {
        InterceptorRegistry::new(Arc::new(ConfigStore::with_config(ResponseConfig {
            max_interceptor_amount: limit,
            ..ResponseConfig::default()
        })))
    }

    #[test]
    fn test_register_preserves_order() {
        let registry = registry_with_limit(5);
        registry.register(noop("first")).unwrap();
        registry.register(noop("second")).unwrap();
        assert_eq!(registry.names(), vec!["first", "second"]);
    }

    #[test]
    fn test_register_at_limit_fails() {
        let registry = registry_with_limit(2);
        registry.register(noop("a")).unwrap();
        registry.register(noop("b")).unwrap();

        let err = registry.register(noop("c")).unwrap_err();
        assert!(matches!(
            err,
            MissiveError::InterceptorLimitExceeded { current: 2, max: 2 }
        ));
        assert_eq!(err.to_string(), "maximum number of interceptors reached: 2/2");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_limit_follows_store_updates() {
        let store = Arc::new(ConfigStore::with_config(ResponseConfig {
            max_interceptor_amount: 1,
            ..ResponseConfig::default()
        }));
        let registry = InterceptorRegistry::new(Arc::clone(&store));
        registry.register(noop("a")).unwrap();
        assert!(registry.register(noop("b")).is_err());

        store.update(ResponseConfig {
            max_interceptor_amount: 3,
            ..ResponseConfig::default()
        });
        assert!(registry.register(noop("b")).is_ok());
    }

    #[test]
    fn test_register_shared_keeps_caller_handle() {
        let registry = registry_with_limit(2);
        let shared: Arc<dyn Interceptor> = Arc::new(noop("shared"));

        registry.register_shared(Arc::clone(&shared)).unwrap();
        registry.register_shared(Arc::clone(&shared)).unwrap();
        assert_eq!(registry.names(), vec!["shared", "shared"]);
        assert_eq!(Arc::strong_count(&shared), 3);

        assert!(registry.register_shared(shared).is_err());
        assert_eq!(registry.len(), 2);
    }

    const NAMES: [&str; 6] = ["i0", "i1", "i2", "i3", "i4", "i5"];

    #[test]
    fn test_concurrent_register_and_snapshot() {
        let registry = registry_with_limit(4);

        std::thread::scope(|scope| {
            let writer = &registry;
            scope.spawn(move || {
                for _ in 0..200 {
                    for name in NAMES {
                        let _ = writer.register(noop(name));
                    }
                    writer.clear();
                }
            });

            for _ in 0..4 {
                let reader = &registry;
                scope.spawn(move || {
                    for _ in 0..500 {
                        let names: Vec<&str> =
                            reader.snapshot().iter().map(|i| i.name()).collect();
                        assert!(names.len() <= 4, "over limit: {names:?}");
                        assert_eq!(names, NAMES[..names.len()], "not a prefix");
                    }
                });
            }
        });

        assert!(registry.is_empty());
    }

    #[test]
    fn test_clear_and_snapshot_independence() {
        let registry = registry_with_limit(5);
        registry.register(noop("a")).unwrap();
        let snapshot = registry.snapshot();

        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name(), "a");
    }
}
