//! Field validation failures reported as a 400 envelope.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::trace::Formatted;
use crate::{ConfigStore, MissiveError, Response};

/// One failed field check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationTrace {
    /// Field path.
    pub field: String,
    /// What went wrong.
    pub message: String,
    /// The offending value, if worth echoing back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl ValidationTrace {
    /// Creates a failure without a value.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    /// Attaches the offending value.
    #[must_use]
    pub fn with_value<T: Serialize>(mut self, value: T) -> Self {
        self.value = serde_json::to_value(value)
            .ok()
            .filter(|v| !v.is_null());
        self
    }

    fn rendered_value(&self) -> Option<String> {
        self.value.as_ref().map(|value| match value {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        })
    }
}

impl fmt::Display for ValidationTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rendered_value() {
            Some(value) => write!(f, "({}) {}: {}", self.field, self.message, value),
            None => write!(f, "({}) {}", self.field, self.message),
        }
    }
}

impl From<&ValidationTrace> for MissiveError {
    fn from(trace: &ValidationTrace) -> Self {
        Self::Validation {
            field: trace.field.clone(),
            message: trace.message.clone(),
            value: trace.rendered_value().unwrap_or_else(|| "null".to_string()),
        }
    }
}

impl Response {
    /// Builds a 400 `"Validation failed"` response with one
    /// `validation: (<field>) <message>[: <value>]` trace entry per failure.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use missive_core::{ConfigStore, Response, ValidationTrace};
    ///
    /// let store = Arc::new(ConfigStore::new());
    /// let response = Response::validation_failed(
    ///     &store,
    ///     [ValidationTrace::new("email", "is required")],
    /// );
    ///
    /// assert_eq!(response.code(), 400);
    /// assert_eq!(response.trace(), ["validation: (email) is required"]);
    /// ```
    pub fn validation_failed<I>(store: &Arc<ConfigStore>, errors: I) -> Self
    where
        I: IntoIterator<Item = ValidationTrace>,
    {
        Self::bad_request(store, "Validation failed")
            .append_internal_trace("validation", errors.into_iter().map(Formatted))
    }
}
