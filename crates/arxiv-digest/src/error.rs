//! Error types for the digest pipeline.
//!
//! Per-run failures (`FetchError`, `SummaryError`, `DeliveryError`) are
//! contained inside a run. Only `ConfigError` may stop the process.

use thiserror::Error;

/// The paper source could not be queried or returned unusable data.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, timeout, body read).
    #[error("paper source request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The source answered with a non-success HTTP status.
    #[error("paper source returned HTTP {status}")]
    Status { status: u16 },

    /// The source answered with something that is not an Atom/XML feed.
    #[error("paper source returned unexpected content-type {content_type}: {preview}")]
    UnexpectedContentType {
        content_type: String,
        preview: String,
    },

    /// The feed could not be parsed.
    #[error("malformed feed: {0}")]
    Malformed(String),
}

/// A single paper could not be summarized well enough to be useful.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Nothing left to summarize after normalization.
    #[error("paper {id} has no abstract to summarize")]
    EmptyAbstract { id: String },

    /// The generative backend failed.
    #[error("summarization backend failed: {0}")]
    Backend(String),
}

/// The delivery transport rejected or failed the send.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Papers and summaries do not line up.
    #[error("digest has {papers} papers but {summaries} summaries")]
    LengthMismatch { papers: usize, summaries: usize },

    /// A sender or recipient address does not parse.
    #[error("invalid address {address}: {reason}")]
    Address { address: String, reason: String },

    /// The message could not be built.
    #[error("failed to build message: {0}")]
    Message(String),

    /// The SMTP transport failed (auth, network, rejection).
    #[error("SMTP transport failed: {0}")]
    Transport(String),
}

/// Configuration is missing or malformed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("{0} is not set")]
    Missing(&'static str),

    /// A variable is set but does not parse.
    #[error("{var} is invalid ({value:?}): {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    /// Hint shown to the operator next to the error.
    #[must_use]
    pub fn remediation(&self) -> &'static str {
        match self {
            Self::Missing(_) => "set the variable in the environment or in a .env file next to the binary",
            Self::Invalid { .. } => "fix the value in the environment or .env file and restart",
        }
    }
}

/// Why a run ended in `Failed`.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}
