//! arXiv paper source.
//!
//! Provides the [`PaperSource`] seam used by the fetcher and its arXiv
//! implementation backed by the Atom export API.

mod client;
mod feed;
mod types;

pub use client::{ArxivClient, DEFAULT_API_URL};
pub use feed::parse_atom_feed;
pub use types::{normalize_id, Paper};

#[cfg(test)]
pub(crate) use types::sample_paper;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::FetchError;

/// One query against a paper source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceQuery {
    /// Category filter (e.g. `cs.LG`); `None` means all categories.
    pub category: Option<String>,
    /// Keywords OR-ed together; empty means no keyword restriction.
    pub keywords: Vec<String>,
    /// Oldest timestamp of interest. Sources may return older entries;
    /// the fetcher filters again.
    pub since: DateTime<Utc>,
    /// Upper bound on records to return.
    pub max_results: usize,
}

/// Read-only query interface to an upstream paper catalog.
///
/// `Ok(vec![])` means the query succeeded with no results; any failure to
/// reach or understand the source is an `Err`.
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Run a query, newest entries first.
    async fn query(&self, query: &SourceQuery) -> Result<Vec<Paper>, FetchError>;
}
