//! Decoding envelopes on the receiving side.
//!
//! A client talking to a service that emits Missive envelopes can decode the
//! body into a [`ReceivedEnvelope`] and then pull `data` out as its own type.

use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{MissiveError, MissiveResult, PaginationMeta};

/// A decoded envelope. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceivedEnvelope {
    /// Originating module.
    pub module: Option<String>,
    /// Summary message.
    pub message: Option<String>,
    /// Raw payload.
    pub data: Option<serde_json::Value>,
    /// Trace entries.
    pub trace: Vec<String>,
    /// Creation time.
    pub timestamp: Option<DateTime<Utc>>,
    /// Pagination block.
    pub pagination: Option<PaginationMeta>,
    /// Reported status code.
    pub code: Option<u16>,
}

impl ReceivedEnvelope {
    /// Decodes an envelope from a response body.
    pub fn from_slice(body: &[u8]) -> MissiveResult<Self> {
        serde_json::from_slice(body).map_err(MissiveError::Decoding)
    }

    /// Decodes `data` into `T`. Returns `Ok(None)` when there is no payload.
    pub fn data_as<T: DeserializeOwned>(&self) -> MissiveResult<Option<T>> {
        self.data
            .as_ref()
            .map(|value| T::deserialize(value).map_err(MissiveError::Decoding))
            .transpose()
    }

    /// Returns the reported status code, if present and valid.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.code.and_then(|code| StatusCode::from_u16(code).ok())
    }
}

/// Decodes `body` and its payload in one step.
///
/// The envelope is returned even when it carries no payload.
pub fn extract<T: DeserializeOwned>(body: &[u8]) -> MissiveResult<(ReceivedEnvelope, Option<T>)> {
    let envelope = ReceivedEnvelope::from_slice(body)?;
    let data = envelope.data_as()?;
    Ok((envelope, data))
}
