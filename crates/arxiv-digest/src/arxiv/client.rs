//! HTTP client for the arXiv export API.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;

use super::feed::parse_atom_feed;
use super::types::Paper;
use super::{PaperSource, SourceQuery};
use crate::error::FetchError;

/// Public arXiv export endpoint.
pub const DEFAULT_API_URL: &str = "https://export.arxiv.org/api/query";

/// Entries requested per page.
const PAGE_SIZE: usize = 100;

/// arXiv asks clients to wait between consecutive requests.
const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(3);

/// arXiv Atom API client.
#[derive(Clone)]
pub struct ArxivClient {
    http: Client,
    base: String,
    page_delay: Duration,
}

impl ArxivClient {
    /// Create a client for the given API endpoint.
    pub fn new(base: impl Into<String>) -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(concat!("arxiv-digest/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base: base.into(),
            page_delay: DEFAULT_PAGE_DELAY,
        })
    }

    /// Override the pause between paged requests.
    #[must_use]
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Build an arXiv `search_query` expression.
    pub(crate) fn build_query(category: Option<&str>, keywords: &[String]) -> String {
        let mut parts: Vec<String> = vec![];

        if let Some(cat) = category.map(str::trim).filter(|c| !c.is_empty()) {
            parts.push(format!("cat:{cat}"));
        }

        let terms: Vec<String> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(|k| {
                if k.contains(char::is_whitespace) {
                    format!("all:\"{k}\"")
                } else {
                    format!("all:{k}")
                }
            })
            .collect();
        match terms.len() {
            0 => {}
            1 => parts.push(terms[0].clone()),
            _ => parts.push(format!("({})", terms.join(" OR "))),
        }

        if parts.is_empty() {
            "all:*".into()
        } else {
            parts.join(" AND ")
        }
    }

    /// Fetch one page of results, newest updates first.
    pub async fn search_page(
        &self,
        search_query: &str,
        start: usize,
        page_size: usize,
    ) -> Result<Vec<Paper>, FetchError> {
        let resp = self
            .http
            .get(&self.base)
            .query(&[("search_query", search_query)])
            .query(&[("start", start), ("max_results", page_size)])
            .query(&[("sortBy", "lastUpdatedDate"), ("sortOrder", "descending")])
            .header(ACCEPT, "application/atom+xml, application/xml;q=0.9, text/xml;q=0.8")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !(content_type.contains("xml") || content_type.contains("atom")) {
            let body = resp.text().await.unwrap_or_default();
            let mut preview: String = body.trim().chars().take(200).collect();
            if body.trim().chars().count() > 200 {
                preview.push('…');
            }
            return Err(FetchError::UnexpectedContentType {
                content_type,
                preview,
            });
        }

        let text = resp.text().await?;
        parse_atom_feed(&text)
    }
}

#[async_trait]
impl PaperSource for ArxivClient {
    fn name(&self) -> &'static str {
        "arxiv"
    }

    async fn query(&self, query: &SourceQuery) -> Result<Vec<Paper>, FetchError> {
        let search_query = Self::build_query(query.category.as_deref(), &query.keywords);
        let mut collected: Vec<Paper> = Vec::new();
        let mut start = 0;

        tracing::debug!(search_query, since = %query.since, "Querying arXiv");

        while collected.len() < query.max_results {
            if start > 0 && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }

            let page_size = (query.max_results - collected.len()).min(PAGE_SIZE);
            let page = self.search_page(&search_query, start, page_size).await?;
            let received = page.len();

            // Sorted by update time, so the page tail tells us whether older pages matter.
            let reached_window_start = page
                .last()
                .is_some_and(|p| p.latest_timestamp() < query.since);
            collected.extend(page);

            tracing::debug!(start, received, total = collected.len(), "Fetched arXiv page");

            if received < page_size || reached_window_start {
                break;
            }
            start += received;
        }

        collected.truncate(query.max_results);
        Ok(collected)
    }
}
