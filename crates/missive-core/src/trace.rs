//! Bounded trace buffer attached to every response.
//!
//! Entries are stored as `"<prefix>: <text>"` in insertion order. The buffer
//! never grows past the resolved `max_trace_size`; what happens once it is
//! full depends on the [`TraceMode`]:
//!
//! | Mode | At capacity |
//! |------|-------------|
//! | [`TraceMode::Caller`] | last slot becomes the truncation marker, the rest of the call is dropped |
//! | [`TraceMode::Internal`] | last slot is overwritten with each further entry's bare text |
//!
//! Anything handed to the buffer must implement [`TraceText`]. Values that
//! have no textual form (a JSON number, an object) render as `None` and are
//! skipped.

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

use crate::MissiveError;

/// Prefix used for caller-facing entries when none is supplied.
pub const DEFAULT_TRACE_PREFIX: &str = "trace";

/// Returns the marker written into the last slot on caller-facing overflow.
#[must_use]
pub fn truncation_marker(capacity: usize) -> String {
    format!("Error: (trace truncated, max size: {capacity})")
}

/// How a full buffer treats further entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceMode {
    /// Entries added by handlers. Overflow leaves a single visible marker.
    Caller,
    /// Entries added by the library itself. Overflow overwrites the last slot
    /// so the most recent diagnostic is always visible.
    Internal,
}

/// Something that can be rendered as a trace entry.
///
/// Implemented for plain text, [`serde_json::Value`] (strings only), and the
/// [`ErrorText`] and [`Formatted`] adapters.
pub trait TraceText {
    /// Returns the entry text, or `None` to skip the entry.
    fn trace_text(&self) -> Option<Cow<'_, str>>;
}

impl TraceText for str {
    fn trace_text(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self))
    }
}

impl TraceText for String {
    fn trace_text(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.as_str()))
    }
}

impl TraceText for serde_json::Value {
    fn trace_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::String(text) => Some(Cow::Borrowed(text.as_str())),
            _ => None,
        }
    }
}

impl TraceText for MissiveError {
    fn trace_text(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Owned(self.to_string()))
    }
}

impl<T: TraceText + ?Sized> TraceText for &T {
    fn trace_text(&self) -> Option<Cow<'_, str>> {
        (**self).trace_text()
    }
}

impl<T: TraceText + ?Sized> TraceText for Box<T> {
    fn trace_text(&self) -> Option<Cow<'_, str>> {
        (**self).trace_text()
    }
}

/// Renders any error through its `Display` description.
///
/// ```
/// use missive_core::trace::{ErrorText, TraceText};
///
/// let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
/// assert_eq!(ErrorText(&err).trace_text().as_deref(), Some("disk full"));
/// ```
pub struct ErrorText<'a>(pub &'a (dyn std::error::Error + 'a));

impl TraceText for ErrorText<'_> {
    fn trace_text(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Owned(self.0.to_string()))
    }
}

/// Renders a value through a custom `Display` implementation.
pub struct Formatted<T>(pub T);

impl<T: fmt::Display> TraceText for Formatted<T> {
    fn trace_text(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Owned(self.0.to_string()))
    }
}

/// Ordered, bounded list of trace entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TraceBuffer {
    entries: Vec<String>,
}

impl TraceBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored entries.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends `entries` under `prefix`, honoring `capacity` and `mode`.
    pub fn append<I>(&mut self, capacity: usize, prefix: &str, mode: TraceMode, entries: I)
    where
        I: IntoIterator,
        I::Item: TraceText,
    {
        if capacity == 0 {
            return;
        }

        for entry in entries {
            let Some(text) = entry.trace_text() else {
                continue;
            };

            if self.entries.len() < capacity {
                self.entries.push(format!("{prefix}: {text}"));
                continue;
            }

            let last = capacity - 1;
            match mode {
                TraceMode::Internal => {
                    self.entries[last] = text.into_owned();
                }
                TraceMode::Caller => {
                    let marker = truncation_marker(capacity);
                    if self.entries[last] != marker {
                        self.entries[last] = marker;
                    }
                    break;
                }
            }
        }
    }
}
