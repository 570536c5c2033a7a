//! Error types surfaced by the audit pipeline.
//!
//! Per the external contract, a failed audit is never propagated as an opaque
//! exception to the presentation layer: it is converted to an [`ErrorReport`]
//! and handed back as ordinary data (see [`crate::orchestrator::audit`]).

use serde::Serialize;
use thiserror::Error;

/// The kinds of failure the audit pipeline can terminate with.
///
/// Only [`AuditError::NotFound`], [`AuditError::UpstreamTransport`],
/// [`AuditError::InvalidInput`] and [`AuditError::Internal`] abort an audit.
/// Archive-scanner and cache failures are deliberately *not* represented here:
/// they degrade to empty signals and the audit continues (see §7 of the
/// design notes carried in `DESIGN.md`).
#[remain::sorted]
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit failed: {0}")]
    Internal(String),

    #[error("package name cannot be empty")]
    InvalidInput,

    #[error("Package not found")]
    NotFound,

    #[error("upstream registry request failed: {0}")]
    UpstreamTransport(#[from] UpstreamError),
}

/// Transport-level failure talking to the upstream registry: a network error,
/// a non-404 non-2xx response, or a response body that doesn't parse as JSON.
#[remain::sorted]
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("malformed JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed reading response body: {0}")]
    Io(#[from] std::io::Error),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
}

impl AuditError {
    /// HTTP-style status code a presentation layer would plausibly map this to.
    /// Only populated for [`AuditError::NotFound`]; absent otherwise, matching
    /// the registry's own `{error, status}` shape for 404s.
    pub fn status(&self) -> Option<u16> {
        match self {
            AuditError::NotFound => Some(404),
            _ => None,
        }
    }
}

/// The `{"error": ...}` object returned in place of a [`crate::model::RiskReport`]
/// when an audit cannot complete.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl From<&AuditError> for ErrorReport {
    fn from(error: &AuditError) -> Self {
        ErrorReport {
            error: error.to_string(),
            status: error.status(),
        }
    }
}
