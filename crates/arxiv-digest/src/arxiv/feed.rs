//! Atom feed parsing for the arXiv export API.

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::types::{normalize_id, Paper};
use crate::error::FetchError;

/// Text-bearing elements we collect inside an `<entry>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Title,
    Summary,
    Published,
    Updated,
    AuthorName,
}

#[derive(Debug, Default)]
struct EntryBuilder {
    id: String,
    title: String,
    summary: String,
    published: String,
    updated: String,
    authors: Vec<String>,
    html_url: Option<String>,
    pdf_url: Option<String>,
    primary_category: Option<String>,
    categories: Vec<String>,
}

impl EntryBuilder {
    fn commit(&mut self, field: Field, text: String) {
        match field {
            Field::Id => self.id = text,
            Field::Title => self.title = text,
            Field::Summary => self.summary = text,
            Field::Published => self.published = text,
            Field::Updated => self.updated = text,
            Field::AuthorName => self.authors.push(collapse_whitespace(&text)),
        }
    }

    fn link(&mut self, e: &BytesStart<'_>) {
        let mut rel = None;
        let mut href = None;
        let mut typ = None;
        let mut title = None;
        for attr in e.attributes().flatten() {
            let value = String::from_utf8_lossy(&attr.value).to_string();
            match attr.key.local_name().as_ref() {
                b"rel" => rel = Some(value),
                b"href" => href = Some(value),
                b"type" => typ = Some(value),
                b"title" => title = Some(value),
                _ => {}
            }
        }
        let Some(href) = href else { return };
        let is_pdf = typ.as_deref().is_some_and(|t| t.contains("pdf"))
            || title.as_deref().is_some_and(|t| t.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            self.pdf_url.get_or_insert(href);
        } else if rel.as_deref() == Some("alternate") {
            self.html_url.get_or_insert(href);
        }
    }

    fn category(&mut self, e: &BytesStart<'_>, primary: bool) {
        let term = e
            .attributes()
            .flatten()
            .find(|a| a.key.local_name().as_ref() == b"term")
            .map(|a| String::from_utf8_lossy(&a.value).to_string());
        let Some(term) = term else { return };
        if primary {
            self.primary_category = Some(term);
        } else if !self.categories.contains(&term) {
            self.categories.push(term);
        }
    }

    fn build(self) -> Result<Paper, FetchError> {
        // arXiv reports bad queries as a single entry under /api/errors.
        if self.id.contains("/api/errors") {
            return Err(FetchError::Malformed(format!(
                "arXiv API error: {}",
                collapse_whitespace(&self.summary)
            )));
        }

        let id = normalize_id(&self.id)
            .ok_or_else(|| FetchError::Malformed(format!("unrecognized entry id {:?}", self.id)))?;
        let published = parse_timestamp(&self.published, "published", &id)?;
        let updated = if self.updated.trim().is_empty() {
            published
        } else {
            parse_timestamp(&self.updated, "updated", &id)?
        };

        Ok(Paper {
            url: self
                .html_url
                .unwrap_or_else(|| format!("https://arxiv.org/abs/{id}")),
            id,
            title: collapse_whitespace(&self.title),
            authors: self.authors,
            abstract_text: collapse_whitespace(&self.summary),
            published,
            updated,
            pdf_url: self.pdf_url,
            primary_category: self.primary_category,
            categories: self.categories,
        })
    }
}

fn parse_timestamp(raw: &str, field: &str, id: &str) -> Result<DateTime<Utc>, FetchError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| FetchError::Malformed(format!("entry {id}: bad {field} timestamp {raw:?}: {e}")))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse an arXiv Atom feed into papers, in feed order.
///
/// A document without a `<feed>` root is malformed; a feed without entries
/// is an empty result.
pub fn parse_atom_feed(xml: &str) -> Result<Vec<Paper>, FetchError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut saw_feed = false;
    let mut papers = Vec::new();
    let mut entry: Option<EntryBuilder> = None;
    let mut in_author = false;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| FetchError::Malformed(format!("XML parse error: {e}")))?;
        match event {
            Event::Start(e) => {
                let local = e.local_name();
                let name = local.as_ref();
                if let Some(cur) = entry.as_mut() {
                    match name {
                        b"author" => in_author = true,
                        b"link" => cur.link(&e),
                        b"primary_category" => cur.category(&e, true),
                        b"category" => cur.category(&e, false),
                        _ => {
                            field = match name {
                                b"id" => Some(Field::Id),
                                b"title" => Some(Field::Title),
                                b"summary" => Some(Field::Summary),
                                b"published" => Some(Field::Published),
                                b"updated" => Some(Field::Updated),
                                b"name" if in_author => Some(Field::AuthorName),
                                _ => None,
                            };
                            text.clear();
                        }
                    }
                } else if name == b"feed" {
                    saw_feed = true;
                } else if name == b"entry" {
                    entry = Some(EntryBuilder::default());
                    in_author = false;
                }
            }
            Event::Empty(e) => {
                if let Some(cur) = entry.as_mut() {
                    match e.local_name().as_ref() {
                        b"link" => cur.link(&e),
                        b"primary_category" => cur.category(&e, true),
                        b"category" => cur.category(&e, false),
                        _ => {}
                    }
                }
            }
            Event::Text(t) => {
                if field.is_some() {
                    let unescaped = t
                        .unescape()
                        .map_err(|e| FetchError::Malformed(format!("bad text node: {e}")))?;
                    text.push_str(&unescaped);
                }
            }
            Event::CData(c) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"entry" => {
                    if let Some(done) = entry.take() {
                        papers.push(done.build()?);
                    }
                    field = None;
                }
                b"author" => in_author = false,
                _ => {
                    if let (Some(f), Some(cur)) = (field.take(), entry.as_mut()) {
                        cur.commit(f, std::mem::take(&mut text));
                    }
                }
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_feed {
        return Err(FetchError::Malformed("response has no <feed> root".to_string()));
    }
    if entry.is_some() {
        return Err(FetchError::Malformed("truncated <entry>".to_string()));
    }

    tracing::debug!(count = papers.len(), "Parsed arXiv feed");
    Ok(papers)
}
