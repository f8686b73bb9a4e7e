//! Digest content rendering.
//!
//! Builds the email subject, HTML body and plain-text body for one run.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::arxiv::Paper;
use crate::error::DeliveryError;
use crate::summary::Summary;

/// Authors listed before "et al.".
const MAX_AUTHORS: usize = 4;

/// Rendered email content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDigest {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Renders digest content from papers and their summaries.
pub struct DigestRenderer;

impl DigestRenderer {
    /// Render subject, HTML and text bodies.
    ///
    /// Fails if the two sequences differ in length.
    pub fn render(
        papers: &[Paper],
        summaries: &[Summary],
        generated_at: DateTime<Utc>,
    ) -> Result<RenderedDigest, DeliveryError> {
        if papers.len() != summaries.len() {
            return Err(DeliveryError::LengthMismatch {
                papers: papers.len(),
                summaries: summaries.len(),
            });
        }

        Ok(RenderedDigest {
            subject: Self::subject(papers.len(), generated_at),
            html: Self::generate_html(papers, summaries, generated_at),
            text: Self::generate_text(papers, summaries, generated_at),
        })
    }

    /// Subject line; distinguishes empty days from digests with papers.
    #[must_use]
    pub fn subject(count: usize, generated_at: DateTime<Utc>) -> String {
        let date = generated_at.format("%Y-%m-%d");
        match count {
            0 => format!("arXiv Digest {date}: no new papers today"),
            1 => format!("arXiv Digest {date}: 1 new paper"),
            n => format!("arXiv Digest {date}: {n} new papers"),
        }
    }

    /// Generate HTML email content.
    #[must_use]
    pub fn generate_html(
        papers: &[Paper],
        summaries: &[Summary],
        generated_at: DateTime<Utc>,
    ) -> String {
        let date_str = generated_at.format("%B %d, %Y").to_string();

        let body_html = if papers.is_empty() {
            String::from(
                r#"<div class="empty">
                <p>No new papers matched your interests today.</p>
                <p class="muted">You will receive the next digest at the usual time.</p>
            </div>"#,
            )
        } else {
            let mut entries_html = String::new();
            for (index, (paper, summary)) in papers.iter().zip(summaries).enumerate() {
                Self::write_entry_html(&mut entries_html, index + 1, paper, summary);
            }
            entries_html
        };

        let count_label = if papers.len() == 1 {
            "new paper"
        } else {
            "new papers"
        };

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', sans-serif;
            line-height: 1.6;
            color: #1f2937;
            background-color: #f3f4f6;
            margin: 0;
            padding: 20px;
        }}
        .container {{
            max-width: 720px;
            margin: 0 auto;
            background: #ffffff;
            border-radius: 12px;
            overflow: hidden;
            border: 1px solid #e5e7eb;
        }}
        .header {{
            background: linear-gradient(135deg, #b31b1b 0%, #7f1d1d 100%);
            color: white;
            padding: 24px 28px;
        }}
        .header h1 {{
            margin: 0 0 6px 0;
            font-size: 24px;
        }}
        .header .subtitle {{
            opacity: 0.9;
            font-size: 14px;
        }}
        .content {{
            padding: 24px;
        }}
        .summary-stat {{
            font-size: 32px;
            font-weight: 700;
            color: #b31b1b;
        }}
        .summary-label {{
            color: #6b7280;
            font-size: 14px;
            margin-bottom: 20px;
        }}
        .paper {{
            border: 1px solid #e5e7eb;
            border-radius: 8px;
            padding: 16px;
            margin-bottom: 14px;
        }}
        .paper.degraded {{
            border-left: 4px solid #d97706;
        }}
        .paper-title {{
            font-size: 17px;
            font-weight: 600;
            margin: 0 0 4px 0;
        }}
        .paper-title a {{
            color: #111827;
            text-decoration: none;
        }}
        .meta {{
            color: #6b7280;
            font-size: 13px;
            margin-bottom: 8px;
        }}
        .summary {{
            margin: 8px 0;
            font-size: 14px;
        }}
        .degraded-note {{
            color: #b45309;
            font-size: 12px;
            font-style: italic;
        }}
        .tag {{
            display: inline-block;
            background: #fee2e2;
            color: #991b1b;
            padding: 1px 8px;
            border-radius: 4px;
            font-size: 11px;
            margin-right: 4px;
        }}
        .links a {{
            color: #b31b1b;
            font-size: 13px;
            margin-right: 12px;
        }}
        .empty {{
            text-align: center;
            padding: 24px 0;
        }}
        .footer {{
            background: #f9fafb;
            padding: 14px 24px;
            text-align: center;
            font-size: 12px;
            color: #9ca3af;
            border-top: 1px solid #e5e7eb;
        }}
        .muted {{
            color: #9ca3af;
        }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>arXiv Daily Digest</h1>
            <div class="subtitle">{date_str}</div>
        </div>
        <div class="content">
            <div class="summary-stat">{count}</div>
            <div class="summary-label">{count_label}</div>
            {body_html}
        </div>
        <div class="footer">
            Generated by arxiv-digest &bull; data from arXiv.org
        </div>
    </div>
</body>
</html>"#,
            date_str = date_str,
            count = papers.len(),
            count_label = count_label,
            body_html = body_html,
        )
    }

    fn write_entry_html(out: &mut String, number: usize, paper: &Paper, summary: &Summary) {
        let (class, note) = match summary.degraded_reason() {
            Some(reason) => (
                "paper degraded",
                format!(
                    r#"<div class="degraded-note">Abbreviated summary ({})</div>"#,
                    html_escape(reason)
                ),
            ),
            None => ("paper", String::new()),
        };

        let tags = paper
            .primary_category
            .iter()
            .map(|c| format!(r#"<span class="tag">{}</span>"#, html_escape(c)))
            .collect::<String>();

        let pdf_link = paper
            .pdf_url
            .as_deref()
            .map(|u| format!(r#"<a href="{}">PDF</a>"#, html_escape(u)))
            .unwrap_or_default();

        let _ = write!(
            out,
            r#"
            <div class="{class}">
                <h2 class="paper-title">{number}. <a href="{url}">{title}</a></h2>
                <div class="meta">{authors} &bull; {date} {tags}</div>
                <p class="summary">{summary}</p>
                {note}
                <div class="links"><a href="{url}">arXiv:{id}</a>{pdf_link}</div>
            </div>
"#,
            class = class,
            number = number,
            url = html_escape(&paper.url),
            title = html_escape(&paper.title),
            authors = html_escape(&paper.author_line(MAX_AUTHORS)),
            date = paper.updated.format("%Y-%m-%d"),
            tags = tags,
            summary = html_escape(summary.text()),
            note = note,
            id = html_escape(&paper.id),
            pdf_link = pdf_link,
        );
    }

    /// Generate plain-text email content.
    #[must_use]
    pub fn generate_text(
        papers: &[Paper],
        summaries: &[Summary],
        generated_at: DateTime<Utc>,
    ) -> String {
        let date_str = generated_at.format("%B %d, %Y").to_string();

        let mut text = format!(
            "arXiv Daily Digest
{date_str}

{count} new paper(s)
{rule}

",
            date_str = date_str,
            count = papers.len(),
            rule = "=".repeat(72),
        );

        if papers.is_empty() {
            text.push_str("No new papers matched your interests today.\n\n");
        }

        for (index, (paper, summary)) in papers.iter().zip(summaries).enumerate() {
            let _ = write!(
                text,
                "{number}. {title}
   {authors} | {date}{category}
   {url}

   {summary}
",
                number = index + 1,
                title = paper.title,
                authors = paper.author_line(MAX_AUTHORS),
                date = paper.updated.format("%Y-%m-%d"),
                category = paper
                    .primary_category
                    .as_deref()
                    .map(|c| format!(" | {c}"))
                    .unwrap_or_default(),
                url = paper.url,
                summary = summary.text(),
            );
            if let Some(reason) = summary.degraded_reason() {
                let _ = writeln!(text, "   [abbreviated summary: {reason}]");
            }
            text.push_str("\n---\n\n");
        }

        text.push_str("Generated by arxiv-digest - data from arXiv.org\n");
        text
    }
}

/// Simple HTML escaping for user content.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
