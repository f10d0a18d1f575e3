//! Response normalizer — recovers a JSON value from raw provider text.
//!
//! Order of attempts:
//! 1. Direct parse of the trimmed text.
//! 2. The first applicable entry of [`RECOVERY_STRATEGIES`], and only that one.
//!
//! Only delimiter stripping is performed. Malformed JSON syntax is never repaired.

use std::fmt;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// A way of locating a JSON candidate inside Markdown-wrapped model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Text after the first "```json" marker, up to the next "```" (or end of text).
    JsonFence,
    /// Text between the first and second "```" (or end of text).
    BareFence,
}

/// Recovery strategies in priority order.
pub const RECOVERY_STRATEGIES: [RecoveryStrategy; 2] =
    [RecoveryStrategy::JsonFence, RecoveryStrategy::BareFence];

impl RecoveryStrategy {
    /// Returns the candidate substring, or `None` when this strategy's delimiter is absent.
    pub fn extract(self, text: &str) -> Option<&str> {
        let marker = match self {
            RecoveryStrategy::JsonFence => JSON_FENCE,
            RecoveryStrategy::BareFence => FENCE,
        };
        let (_, rest) = text.split_once(marker)?;
        Some(up_to_fence(rest))
    }
}

fn up_to_fence(text: &str) -> &str {
    text.split_once(FENCE).map(|(body, _)| body).unwrap_or(text)
}

/// Which attempt produced the error that was finally reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseAttempt {
    Direct,
    Recovered(RecoveryStrategy),
}

impl fmt::Display for ParseAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAttempt::Direct => f.write_str("direct parse"),
            ParseAttempt::Recovered(RecoveryStrategy::JsonFence) => f.write_str("```json fence"),
            ParseAttempt::Recovered(RecoveryStrategy::BareFence) => f.write_str("``` fence"),
        }
    }
}

#[derive(Debug, Error)]
#[error("provider response is not valid JSON (last attempt: {attempt}): {source}")]
pub struct MalformedResponseError {
    pub attempt: ParseAttempt,
    #[source]
    pub source: serde_json::Error,
}

/// Parses provider output as JSON, tolerating Markdown code fences around the payload.
pub fn normalize(raw: &str) -> Result<Value, MalformedResponseError> {
    let text = raw.trim();

    let direct_err = match serde_json::from_str::<Value>(text) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    for strategy in RECOVERY_STRATEGIES {
        if let Some(candidate) = strategy.extract(text) {
            let value = serde_json::from_str(candidate.trim()).map_err(|source| {
                MalformedResponseError {
                    attempt: ParseAttempt::Recovered(strategy),
                    source,
                }
            })?;
            debug!("Direct JSON parse failed, recovered via {strategy:?}");
            return Ok(value);
        }
    }

    Err(MalformedResponseError {
        attempt: ParseAttempt::Direct,
        source: direct_err,
    })
}
