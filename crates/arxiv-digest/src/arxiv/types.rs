//! arXiv data types.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// New-style (`2501.01234`) and old-style (`hep-th/9901001`) ids, optionally
/// prefixed with `arXiv:` and suffixed with a version.
static ARXIV_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:arXiv:)?(\d{4}\.\d{4,5}|[a-z][a-z\-]*(?:\.[A-Z]{2})?/\d{7})(?:v\d+)?$")
        .expect("arXiv id regex is valid")
});

/// A retrieved paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    /// Canonical arXiv id without version (e.g. `2501.01234`).
    pub id: String,
    /// Paper title, whitespace-normalized.
    pub title: String,
    /// Authors in listed order.
    pub authors: Vec<String>,
    /// Abstract as published.
    pub abstract_text: String,
    /// First submission time.
    pub published: DateTime<Utc>,
    /// Last update time (equals `published` for v1).
    pub updated: DateTime<Utc>,
    /// Abstract page URL.
    pub url: String,
    /// PDF link if the feed carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    /// Primary category (e.g. `cs.LG`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_category: Option<String>,
    /// All categories the paper is listed under.
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Paper {
    /// The most recent of `published` and `updated`.
    #[must_use]
    pub fn latest_timestamp(&self) -> DateTime<Utc> {
        self.updated.max(self.published)
    }

    /// Authors joined for display, abbreviated after `max` names.
    #[must_use]
    pub fn author_line(&self, max: usize) -> String {
        if self.authors.len() <= max {
            return self.authors.join(", ");
        }
        let shown = self.authors[..max].join(", ");
        format!("{shown} et al.")
    }

    /// Case-insensitive keyword match against title and abstract.
    ///
    /// An empty keyword list matches everything.
    #[must_use]
    pub fn matches_any(&self, keywords: &[String]) -> bool {
        if keywords.is_empty() {
            return true;
        }
        let haystack = format!("{} {}", self.title, self.abstract_text).to_lowercase();
        keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .any(|k| haystack.contains(&k))
    }
}

/// Normalize an arXiv id or abs URL to its versionless canonical form.
///
/// Accepts `http://arxiv.org/abs/2501.01234v2`, `arXiv:2501.01234`,
/// `hep-th/9901001v1` and bare ids.
#[must_use]
pub fn normalize_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let tail = raw
        .split_once("/abs/")
        .map_or(raw, |(_, rest)| rest)
        .trim_end_matches('/');
    ARXIV_ID
        .captures(tail)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
pub(crate) fn sample_paper(id: &str, updated: DateTime<Utc>) -> Paper {
    Paper {
        id: id.to_string(),
        title: format!("Paper {id}"),
        authors: vec!["Ada Lovelace".to_string(), "Alan Turing".to_string()],
        abstract_text: format!(
            "We study problem {id}. Our method improves results. Code is released."
        ),
        published: updated,
        updated,
        url: format!("https://arxiv.org/abs/{id}"),
        pdf_url: Some(format!("https://arxiv.org/pdf/{id}")),
        primary_category: Some("cs.LG".to_string()),
        categories: vec!["cs.LG".to_string()],
    }
}
