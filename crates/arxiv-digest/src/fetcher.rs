//! Paper selection and summarization.
//!
//! The lookback window for `days_back = N` is
//! `[00:00 UTC of (today - N days), now]`, both ends inclusive, so `0`
//! means "today (UTC) only". A paper qualifies when its `published` or
//! `updated` timestamp falls inside the window.

use chrono::{DateTime, Days, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::arxiv::{Paper, PaperSource, SourceQuery};
use crate::error::{FetchError, SummaryError};
use crate::summary::{extractive_summary, Summarizer, Summary, DEFAULT_MAX_CHARS};

/// What the fetcher looks for.
#[derive(Debug, Clone)]
pub struct InterestFilter {
    /// One source query is issued per category.
    pub categories: Vec<String>,
    /// Keywords; a paper must mention at least one. Empty accepts all.
    pub keywords: Vec<String>,
    /// Cap on papers returned per fetch.
    pub max_results: usize,
}

impl Default for InterestFilter {
    fn default() -> Self {
        Self {
            categories: vec!["cs.AI".to_string(), "cs.LG".to_string(), "cs.CL".to_string()],
            keywords: Vec::new(),
            max_results: 50,
        }
    }
}

/// Inclusive `[start, end]` lookback window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    /// Window covering `days_back` whole days before today plus today so far.
    #[must_use]
    pub fn lookback(days_back: u32, now: DateTime<Utc>) -> Self {
        let midnight = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map_or(now, |dt| dt.and_utc());
        let start = midnight
            .checked_sub_days(Days::new(u64::from(days_back)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end: now }
    }

    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }

    /// True if either of the paper's timestamps is inside the window.
    #[must_use]
    pub fn admits(&self, paper: &Paper) -> bool {
        self.contains(paper.updated) || self.contains(paper.published)
    }
}

/// Selects recent papers and derives per-paper summaries.
pub struct Fetcher {
    source: Arc<dyn PaperSource>,
    filter: InterestFilter,
    summarizer: Option<Arc<dyn Summarizer>>,
    summary_max_chars: usize,
}

impl Fetcher {
    /// Create a fetcher with extractive summaries only.
    #[must_use]
    pub fn new(source: Arc<dyn PaperSource>, filter: InterestFilter) -> Self {
        Self {
            source,
            filter,
            summarizer: None,
            summary_max_chars: DEFAULT_MAX_CHARS,
        }
    }

    /// Use a generative backend, falling back to extractive summaries.
    #[must_use]
    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Bound extractive summaries to `max_chars` characters.
    #[must_use]
    pub fn with_summary_max_chars(mut self, max_chars: usize) -> Self {
        self.summary_max_chars = max_chars;
        self
    }

    /// Papers matching the interest filter within the lookback window.
    pub async fn fetch_recent(&self, days_back: u32) -> Result<Vec<Paper>, FetchError> {
        self.fetch_recent_at(days_back, Utc::now()).await
    }

    /// [`Fetcher::fetch_recent`] against an explicit "now".
    pub async fn fetch_recent_at(
        &self,
        days_back: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<Paper>, FetchError> {
        let window = Window::lookback(days_back, now);
        tracing::info!(
            source = self.source.name(),
            days_back,
            window_start = %window.start,
            window_end = %window.end,
            "Fetching recent papers"
        );

        let categories: Vec<Option<String>> = if self.filter.categories.is_empty() {
            vec![None]
        } else {
            self.filter.categories.iter().cloned().map(Some).collect()
        };

        let mut raw = Vec::new();
        for category in categories {
            let query = SourceQuery {
                category,
                keywords: self.filter.keywords.clone(),
                since: window.start,
                max_results: self.filter.max_results,
            };
            let page = self.source.query(&query).await?;
            tracing::debug!(category = ?query.category, received = page.len(), "Source query done");
            raw.extend(page);
        }

        let received = raw.len();
        let papers = select(raw, &window, &self.filter);
        tracing::info!(received, selected = papers.len(), "Selected papers");
        Ok(papers)
    }

    /// Summarize one paper.
    ///
    /// Backend failures degrade to the extractive summary; only an empty
    /// abstract is an error.
    pub async fn summarize(&self, paper: &Paper) -> Result<Summary, SummaryError> {
        let Some(summarizer) = &self.summarizer else {
            return extractive_summary(paper, self.summary_max_chars).map(Summary::full);
        };

        match summarizer.summarize(paper).await {
            Ok(text) => Ok(Summary::full(text)),
            Err(err) => {
                tracing::warn!(
                    id = %paper.id,
                    backend = summarizer.name(),
                    error = %err,
                    "Summarizer failed, using abstract excerpt"
                );
                let text = extractive_summary(paper, self.summary_max_chars)?;
                Ok(Summary::degraded(text, err.to_string()))
            }
        }
    }
}

/// Window and keyword filtering, dedup by id, then newest-first ordering.
fn select(raw: Vec<Paper>, window: &Window, filter: &InterestFilter) -> Vec<Paper> {
    let mut by_id: HashMap<String, Paper> = HashMap::new();
    for paper in raw {
        if !window.admits(&paper) || !paper.matches_any(&filter.keywords) {
            continue;
        }
        match by_id.get(&paper.id) {
            Some(existing) if existing.updated >= paper.updated => {}
            _ => {
                by_id.insert(paper.id.clone(), paper);
            }
        }
    }

    let mut papers: Vec<Paper> = by_id.into_values().collect();
    papers.sort_by(|a, b| b.updated.cmp(&a.updated).then_with(|| a.id.cmp(&b.id)));
    papers.truncate(filter.max_results);
    papers
}
