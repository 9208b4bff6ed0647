//! Decoding of feed bodies into observations.
//!
//! The body must be a JSON array. Each element is decoded on its own, so
//! one malformed record (missing `world`, wrong type) is skipped without
//! discarding the rest. A body that is not an array at all is an error,
//! which callers treat the same as a transport failure. An empty array
//! is a valid answer meaning "no worlds tracked".

use citizen_cycle_types::{FeedRecord, Observation};
use serde_json::Value;
use tracing::warn;

/// Errors that make a whole feed body unusable.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The body is not valid JSON.
    #[error("feed body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The body is valid JSON but not an array.
    #[error("feed body is not a JSON array")]
    NotAnArray,
}

/// Result of parsing one feed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFeed {
    /// Records that decoded successfully, in body order.
    pub observations: Vec<Observation>,
    /// Number of records skipped as malformed.
    pub skipped: usize,
}

/// Parse a feed body into observations, skipping malformed records.
///
/// # Errors
///
/// Returns [`ParseError`] if the body is not a JSON array.
pub fn parse_feed(body: &str) -> Result<ParsedFeed, ParseError> {
    let value: Value = serde_json::from_str(body)?;
    let Value::Array(elements) = value else {
        return Err(ParseError::NotAnArray);
    };

    let mut observations = Vec::with_capacity(elements.len());
    let mut skipped: usize = 0;

    for (index, element) in elements.into_iter().enumerate() {
        match serde_json::from_value::<FeedRecord>(element) {
            Ok(record) => observations.push(Observation::from(record)),
            Err(e) => {
                skipped = skipped.saturating_add(1);
                warn!(index, error = %e, "skipping malformed feed record");
            }
        }
    }

    Ok(ParsedFeed {
        observations,
        skipped,
    })
}
