//! Encoded size estimation and the pre-send size guard.
//!
//! The estimate runs the same JSON encoder the delivery pipeline uses, but
//! into a sink that only counts bytes.

use serde::Serialize;
use std::io;

use crate::{MissiveError, MissiveResult, ResponseConfig};

/// A writer that discards its input and remembers how much it saw.
#[derive(Debug, Default)]
struct ByteCounter {
    bytes: usize,
}

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Returns the number of bytes `value` occupies once JSON-encoded.
pub fn estimate<T: Serialize + ?Sized>(value: &T) -> MissiveResult<usize> {
    let mut counter = ByteCounter::default();
    serde_json::to_writer(&mut counter, value).map_err(MissiveError::encoding)?;
    Ok(counter.bytes)
}

/// Checks `value` against the size limit in `config`.
///
/// Returns `Ok(None)` when size validation is disabled, otherwise the
/// estimated size. Fails with [`MissiveError::SizeLimitExceeded`] when the
/// estimate is over the limit, or [`MissiveError::Encoding`] when the value
/// cannot be encoded at all.
pub fn validate<T: Serialize + ?Sized>(
    value: &T,
    config: &ResponseConfig,
) -> MissiveResult<Option<usize>> {
    if !config.enable_size_validation {
        return Ok(None);
    }

    let size = estimate(value)?;
    if size > config.response_size_limit {
        return Err(MissiveError::SizeLimitExceeded {
            size,
            max: config.response_size_limit,
        });
    }

    Ok(Some(size))
}
