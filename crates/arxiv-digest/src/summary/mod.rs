//! Per-paper summaries.
//!
//! A summary is either [`Summary::Full`] or [`Summary::Degraded`], so the
//! renderer can mark entries whose summarization fell back.

mod extractive;
mod openai;
mod prompts;

pub use extractive::{extractive_summary, DEFAULT_MAX_CHARS};
pub use openai::{OpenAiConfig, OpenAiSummarizer};
pub use prompts::PromptManager;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::arxiv::Paper;
use crate::error::SummaryError;

/// Text shown when a paper could not be summarized at all.
pub const PLACEHOLDER_TEXT: &str = "No summary available for this paper.";

/// Summary of one paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Summary {
    /// Produced by the configured summarizer.
    Full { text: String },
    /// Fallback text, with the reason the full summary was not produced.
    Degraded { text: String, reason: String },
}

impl Summary {
    /// Build a full summary.
    #[must_use]
    pub fn full(text: impl Into<String>) -> Self {
        Self::Full { text: text.into() }
    }

    /// Build a degraded summary.
    #[must_use]
    pub fn degraded(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Degraded {
            text: text.into(),
            reason: reason.into(),
        }
    }

    /// Stand-in for a paper whose summarization failed outright.
    #[must_use]
    pub fn placeholder(err: &SummaryError) -> Self {
        Self::degraded(PLACEHOLDER_TEXT, err.to_string())
    }

    /// Summary text regardless of variant.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Full { text } | Self::Degraded { text, .. } => text,
        }
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Fallback reason, if degraded.
    #[must_use]
    pub fn degraded_reason(&self) -> Option<&str> {
        match self {
            Self::Full { .. } => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }
}

/// Generative summarization backend.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Produce a one-paragraph summary of the paper.
    async fn summarize(&self, paper: &Paper) -> Result<String, SummaryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_accessors() {
        let full = Summary::full("short");
        assert_eq!(full.text(), "short");
        assert!(!full.is_degraded());
        assert_eq!(full.degraded_reason(), None);

        let degraded = Summary::degraded("cut…", "backend timeout");
        assert_eq!(degraded.text(), "cut…");
        assert!(degraded.is_degraded());
        assert_eq!(degraded.degraded_reason(), Some("backend timeout"));
    }

    #[test]
    fn test_placeholder() {
        let err = SummaryError::EmptyAbstract {
            id: "2501.00001".to_string(),
        };
        let summary = Summary::placeholder(&err);
        assert_eq!(summary.text(), PLACEHOLDER_TEXT);
        assert_eq!(
            summary.degraded_reason(),
            Some("paper 2501.00001 has no abstract to summarize")
        );
    }

    #[test]
    fn test_summary_serializes_tagged() {
        let json = serde_json::to_value(Summary::degraded("t", "r")).unwrap();
        assert_eq!(json["kind"], "degraded");
        assert_eq!(json["reason"], "r");
    }
}
