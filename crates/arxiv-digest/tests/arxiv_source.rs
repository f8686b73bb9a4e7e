//! arXiv client contract tests against a mock export API.

mod common;

use arxiv_digest::arxiv::{PaperSource, SourceQuery};
use arxiv_digest::error::FetchError;
use chrono::{Duration, TimeZone, Utc};
use common::{arxiv_client, atom_feed, FeedEntry, ATOM};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn query(category: &str, max_results: usize) -> SourceQuery {
    SourceQuery {
        category: Some(category.to_string()),
        keywords: vec![],
        since: Utc.with_ymd_and_hms(2025, 3, 11, 0, 0, 0).unwrap(),
        max_results,
    }
}

#[tokio::test]
async fn test_query_sends_expected_parameters() {
    let server = MockServer::start().await;
    let updated = Utc.with_ymd_and_hms(2025, 3, 12, 10, 0, 0).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/query"))
        .and(query_param("search_query", "cat:cs.LG"))
        .and(query_param("sortBy", "lastUpdatedDate"))
        .and(query_param("sortOrder", "descending"))
        .and(query_param("start", "0"))
        .and(query_param("max_results", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            atom_feed(&[
                FeedEntry::new("2503.00001", updated),
                FeedEntry::new("2503.00002", updated - Duration::hours(1)),
            ]),
            ATOM,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let papers = arxiv_client(&server).query(&query("cs.LG", 5)).await.unwrap();

    assert_eq!(papers.len(), 2);
    assert_eq!(papers[0].id, "2503.00001");
    assert_eq!(papers[0].updated, updated);
    assert_eq!(papers[0].primary_category.as_deref(), Some("cs.LG"));
    assert_eq!(
        papers[1].pdf_url.as_deref(),
        Some("http://arxiv.org/pdf/2503.00002v1")
    );
}

#[tokio::test]
async fn test_query_stops_paging_at_window_start() {
    let server = MockServer::start().await;
    let old = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
    let recent = Utc.with_ymd_and_hms(2025, 3, 12, 10, 0, 0).unwrap();

    let mut entries: Vec<FeedEntry<'_>> = Vec::new();
    let ids: Vec<String> = (0..100).map(|i| format!("2503.{:05}", i + 1)).collect();
    for (i, id) in ids.iter().enumerate() {
        entries.push(FeedEntry::new(id, if i < 50 { recent } else { old }));
    }

    // A full page whose tail predates the window: no second request.
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(atom_feed(&entries), ATOM))
        .expect(1)
        .mount(&server)
        .await;

    let papers = arxiv_client(&server)
        .query(&query("cs.LG", 500))
        .await
        .unwrap();
    assert_eq!(papers.len(), 100);
}

#[tokio::test]
async fn test_http_error_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = arxiv_client(&server)
        .query(&query("cs.LG", 10))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 503 }));
}

#[tokio::test]
async fn test_html_response_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body>Rate limited</body></html>", "text/html"),
        )
        .mount(&server)
        .await;

    let err = arxiv_client(&server)
        .query(&query("cs.LG", 10))
        .await
        .unwrap_err();
    match err {
        FetchError::UnexpectedContentType {
            content_type,
            preview,
        } => {
            assert!(content_type.starts_with("text/html"));
            assert!(preview.contains("Rate limited"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_api_error_entry_is_malformed() {
    let server = MockServer::start().await;
    let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_1234</id>
    <title>Error</title>
    <summary>incorrect id format for 1234</summary>
  </entry>
</feed>"#;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, ATOM))
        .mount(&server)
        .await;

    let err = arxiv_client(&server)
        .query(&query("cs.LG", 10))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Malformed(msg) if msg.contains("incorrect id format")));
}
