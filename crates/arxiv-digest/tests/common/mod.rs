//! Shared fixtures for integration tests.

#![allow(dead_code)]

use arxiv_digest::arxiv::{ArxivClient, Paper};
use arxiv_digest::delivery::Delivery;
use arxiv_digest::error::DeliveryError;
use arxiv_digest::summary::Summary;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Mutex;
use std::time::Duration;
use wiremock::MockServer;

pub const ATOM: &str = "application/atom+xml";

/// One `<entry>` worth of test data.
pub struct FeedEntry<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub summary: &'a str,
    pub updated: DateTime<Utc>,
    pub category: &'a str,
}

impl<'a> FeedEntry<'a> {
    pub fn new(id: &'a str, updated: DateTime<Utc>) -> Self {
        Self {
            id,
            title: "A study of things",
            summary: "We propose a method. It works well on benchmarks. Code is available.",
            updated,
            category: "cs.LG",
        }
    }
}

/// Render an arXiv-style Atom feed.
pub fn atom_feed(entries: &[FeedEntry<'_>]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title>ArXiv Query</title>
"#,
    );
    for e in entries {
        let ts = e.updated.to_rfc3339_opts(SecondsFormat::Secs, true);
        xml.push_str(&format!(
            r#"  <entry>
    <id>http://arxiv.org/abs/{id}v1</id>
    <updated>{ts}</updated>
    <published>{ts}</published>
    <title>{title}</title>
    <summary>{summary}</summary>
    <author><name>Ada Lovelace</name></author>
    <link href="http://arxiv.org/abs/{id}v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/{id}v1" rel="related" type="application/pdf"/>
    <arxiv:primary_category term="{cat}" scheme="http://arxiv.org/schemas/atom"/>
    <category term="{cat}" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
"#,
            id = e.id,
            ts = ts,
            title = e.title,
            summary = e.summary,
            cat = e.category,
        ));
    }
    xml.push_str("</feed>\n");
    xml
}

/// Client against a mock server, without the inter-page pause.
pub fn arxiv_client(server: &MockServer) -> ArxivClient {
    ArxivClient::new(format!("{}/api/query", server.uri()))
        .unwrap()
        .with_page_delay(Duration::ZERO)
}

/// Records every batch handed to it.
#[derive(Default)]
pub struct RecordingDelivery {
    pub reject: bool,
    pub batches: Mutex<Vec<(Vec<String>, Vec<Summary>)>>,
}

impl RecordingDelivery {
    pub fn calls(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    pub fn ids(&self, call: usize) -> Vec<String> {
        self.batches.lock().unwrap()[call].0.clone()
    }

    pub fn summaries(&self, call: usize) -> Vec<Summary> {
        self.batches.lock().unwrap()[call].1.clone()
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, papers: &[Paper], summaries: &[Summary]) -> Result<(), DeliveryError> {
        self.batches.lock().unwrap().push((
            papers.iter().map(|p| p.id.clone()).collect(),
            summaries.to_vec(),
        ));
        if self.reject {
            Err(DeliveryError::Transport("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}
