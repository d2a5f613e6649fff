//! Review payload types and completion parsing.
//!
//! One review round assembles provider fragments into a buffer, then parses
//! it here. The payload shape is fixed: an `issues` array whose records all
//! carry the five required fields. Anything else — prose, truncated JSON, a
//! missing field, a wrong type — is a [`MalformedCompletion`] and the round
//! is silently dropped.

pub mod session;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One editorial finding from the completion provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewIssue {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: String,
    /// 1-based paragraph number the issue refers to.
    pub paragraph: u32,
    pub description: String,
    pub suggestion: String,
}

/// The full structured result of one review round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPayload {
    pub issues: Vec<ReviewIssue>,
}

/// The assembled completion text did not match the expected payload shape.
#[derive(Debug, Error)]
#[error("completion did not parse as a review payload: {reason}")]
pub struct MalformedCompletion {
    reason: String,
}

/// Parse an assembled completion buffer into a validated payload.
///
/// Unknown extra fields from the provider are tolerated; missing required
/// fields or wrong types are not.
pub fn parse_completion(buffer: &str) -> Result<ReviewPayload, MalformedCompletion> {
    serde_json::from_str(buffer).map_err(|e| MalformedCompletion {
        reason: e.to_string(),
    })
}
