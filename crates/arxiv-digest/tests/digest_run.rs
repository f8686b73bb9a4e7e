//! End-to-end digest runs: mock arXiv and OpenAI servers, recording delivery.

mod common;

use arxiv_digest::fetcher::{Fetcher, InterestFilter};
use arxiv_digest::runner::{
    DigestRunner, RunPhase, MARKER_FAILED, MARKER_SENT_EMPTY, MARKER_SENT_PAPERS, MARKER_START,
};
use arxiv_digest::summary::{OpenAiConfig, OpenAiSummarizer};
use arxiv_digest::RunError;
use chrono::{Duration, Utc};
use common::{arxiv_client, atom_feed, FeedEntry, RecordingDelivery, ATOM};
use serde_json::json;
use std::sync::Arc;
use tracing_test::traced_test;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn filter(categories: &[&str]) -> InterestFilter {
    InterestFilter {
        categories: categories.iter().map(|c| (*c).to_string()).collect(),
        keywords: vec![],
        max_results: 50,
    }
}

async fn mount_feed(server: &MockServer, category: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .and(query_param("search_query", format!("cat:{category}")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, ATOM))
        .mount(server)
        .await;
}

fn runner(arxiv: &MockServer, categories: &[&str], delivery: Arc<RecordingDelivery>) -> DigestRunner {
    let fetcher = Fetcher::new(Arc::new(arxiv_client(arxiv)), filter(categories));
    DigestRunner::new(fetcher, delivery)
}

#[tokio::test]
#[traced_test]
async fn test_papers_found_and_delivered() {
    let arxiv = MockServer::start().await;
    let now = Utc::now();
    mount_feed(
        &arxiv,
        "cs.LG",
        atom_feed(&[
            FeedEntry::new("2503.00001", now),
            FeedEntry::new("2503.00002", now),
            // Outside a lookback of one day.
            FeedEntry::new("2502.09999", now - Duration::days(10)),
        ]),
    )
    .await;

    let delivery = Arc::new(RecordingDelivery::default());
    let outcome = runner(&arxiv, &["cs.LG"], delivery.clone()).run(1).await;

    assert_eq!(outcome.phase, RunPhase::Completed);
    assert_eq!(outcome.papers_found, 2);
    assert_eq!(outcome.degraded_summaries, 0);
    assert_eq!(delivery.calls(), 1);
    assert_eq!(delivery.ids(0), vec!["2503.00001", "2503.00002"]);

    let summaries = delivery.summaries(0);
    assert_eq!(summaries.len(), 2);
    assert!(summaries
        .iter()
        .all(|s| !s.is_degraded() && s.text().starts_with("We propose a method.")));

    assert!(logs_contain(MARKER_START));
    assert!(logs_contain(MARKER_SENT_PAPERS));
    assert!(logs_contain("sent 2 papers"));
}

#[tokio::test]
async fn test_duplicates_across_categories_collapse() {
    let arxiv = MockServer::start().await;
    let now = Utc::now();
    let mut cross = FeedEntry::new("2503.00007", now);
    cross.category = "cs.AI";
    mount_feed(&arxiv, "cs.LG", atom_feed(&[FeedEntry::new("2503.00007", now)])).await;
    mount_feed(&arxiv, "cs.AI", atom_feed(&[cross, FeedEntry::new("2503.00008", now)])).await;

    let delivery = Arc::new(RecordingDelivery::default());
    let outcome = runner(&arxiv, &["cs.LG", "cs.AI"], delivery.clone()).run(0).await;

    assert!(outcome.is_success());
    assert_eq!(delivery.ids(0), vec!["2503.00007", "2503.00008"]);
}

#[tokio::test]
#[traced_test]
async fn test_no_papers_still_sends_notice() {
    let arxiv = MockServer::start().await;
    mount_feed(&arxiv, "cs.LG", atom_feed(&[])).await;

    let delivery = Arc::new(RecordingDelivery::default());
    let outcome = runner(&arxiv, &["cs.LG"], delivery.clone()).run(0).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.papers_found, 0);
    assert_eq!(delivery.calls(), 1);
    assert!(delivery.ids(0).is_empty());
    assert!(delivery.summaries(0).is_empty());

    assert!(logs_contain(MARKER_SENT_EMPTY));
    assert!(logs_contain("no new papers"));
    assert!(!logs_contain(MARKER_SENT_PAPERS));
}

#[tokio::test]
#[traced_test]
async fn test_source_outage_sends_nothing() {
    let arxiv = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&arxiv)
        .await;

    let delivery = Arc::new(RecordingDelivery::default());
    let outcome = runner(&arxiv, &["cs.LG"], delivery.clone()).run(1).await;

    assert_eq!(outcome.phase, RunPhase::Failed);
    assert!(matches!(outcome.error, Some(RunError::Fetch(_))));
    assert_eq!(delivery.calls(), 0);

    assert!(logs_contain(MARKER_FAILED));
    assert!(logs_contain("returned HTTP 503"));
    assert!(!logs_contain("DIGEST_SENT"));
}

#[tokio::test]
#[traced_test]
async fn test_delivery_failure_is_reported() {
    let arxiv = MockServer::start().await;
    mount_feed(&arxiv, "cs.LG", atom_feed(&[FeedEntry::new("2503.00001", Utc::now())])).await;

    let delivery = Arc::new(RecordingDelivery {
        reject: true,
        ..Default::default()
    });
    let outcome = runner(&arxiv, &["cs.LG"], delivery.clone()).run(0).await;

    assert_eq!(outcome.phase, RunPhase::Failed);
    assert!(matches!(outcome.error, Some(RunError::Delivery(_))));
    assert_eq!(delivery.calls(), 1);

    assert!(logs_contain(MARKER_FAILED));
    assert!(logs_contain("connection refused"));
}

#[tokio::test]
async fn test_repeated_runs_select_same_papers() {
    let arxiv = MockServer::start().await;
    let now = Utc::now();
    mount_feed(
        &arxiv,
        "cs.LG",
        atom_feed(&[
            FeedEntry::new("2503.00003", now),
            FeedEntry::new("2503.00001", now),
            FeedEntry::new("2503.00002", now - Duration::seconds(1)),
        ]),
    )
    .await;

    let delivery = Arc::new(RecordingDelivery::default());
    let runner = runner(&arxiv, &["cs.LG"], delivery.clone());
    runner.run(0).await;
    runner.run(0).await;

    assert_eq!(delivery.calls(), 2);
    assert_eq!(delivery.ids(0), delivery.ids(1));
    assert_eq!(delivery.summaries(0), delivery.summaries(1));
}

#[tokio::test]
async fn test_openai_summaries_used() {
    let arxiv = MockServer::start().await;
    let openai = MockServer::start().await;
    mount_feed(&arxiv, "cs.LG", atom_feed(&[FeedEntry::new("2503.00001", Utc::now())])).await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "A concise\n summary."},
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&openai)
        .await;

    let summarizer =
        OpenAiSummarizer::new(OpenAiConfig::new("test-key").with_base_url(openai.uri())).unwrap();
    let fetcher = Fetcher::new(Arc::new(arxiv_client(&arxiv)), filter(&["cs.LG"]))
        .with_summarizer(Arc::new(summarizer));
    let delivery = Arc::new(RecordingDelivery::default());
    let outcome = DigestRunner::new(fetcher, delivery.clone()).run(0).await;

    assert!(outcome.is_success());
    let summaries = delivery.summaries(0);
    assert_eq!(summaries[0].text(), "A concise summary.");
    assert!(!summaries[0].is_degraded());
}

#[tokio::test]
async fn test_openai_failure_degrades_summary() {
    let arxiv = MockServer::start().await;
    let openai = MockServer::start().await;
    mount_feed(&arxiv, "cs.LG", atom_feed(&[FeedEntry::new("2503.00001", Utc::now())])).await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream overloaded"))
        .mount(&openai)
        .await;

    let summarizer =
        OpenAiSummarizer::new(OpenAiConfig::new("test-key").with_base_url(openai.uri())).unwrap();
    let fetcher = Fetcher::new(Arc::new(arxiv_client(&arxiv)), filter(&["cs.LG"]))
        .with_summarizer(Arc::new(summarizer));
    let delivery = Arc::new(RecordingDelivery::default());
    let outcome = DigestRunner::new(fetcher, delivery.clone()).run(0).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.degraded_summaries, 1);
    let summaries = delivery.summaries(0);
    assert!(summaries[0].is_degraded());
    assert!(summaries[0].text().starts_with("We propose a method."));
    assert!(summaries[0]
        .degraded_reason()
        .is_some_and(|r| r.contains("upstream overloaded")));
}
