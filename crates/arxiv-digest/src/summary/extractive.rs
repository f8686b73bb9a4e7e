//! Deterministic extractive summaries built from the abstract.

use crate::arxiv::Paper;
use crate::error::SummaryError;

/// Default upper bound on summary length, in characters.
pub const DEFAULT_MAX_CHARS: usize = 600;

/// Leading sentences of the abstract that fit in `max_chars`.
///
/// If the first sentence alone is too long it is cut at a character
/// boundary and an ellipsis is appended. Fails only when the abstract is
/// empty after whitespace normalization.
pub fn extractive_summary(paper: &Paper, max_chars: usize) -> Result<String, SummaryError> {
    let normalized = paper.abstract_text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return Err(SummaryError::EmptyAbstract {
            id: paper.id.clone(),
        });
    }

    let max_chars = max_chars.max(1);
    if normalized.chars().count() <= max_chars {
        return Ok(normalized);
    }

    let mut out = String::new();
    for sentence in sentences(&normalized) {
        let joined = if out.is_empty() {
            sentence.chars().count()
        } else {
            out.chars().count() + 1 + sentence.chars().count()
        };
        if joined > max_chars {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(sentence);
    }

    if out.is_empty() {
        let truncated: String = normalized.chars().take(max_chars.saturating_sub(1)).collect();
        out = format!("{}…", truncated.trim_end());
    }
    Ok(out)
}

/// Split on `.`, `!` or `?` followed by a space.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut begin = 0;
    let mut prev_terminal = false;
    for (idx, ch) in text.char_indices() {
        if ch == ' ' && prev_terminal {
            out.push(&text[begin..idx]);
            begin = idx + 1;
        }
        prev_terminal = matches!(ch, '.' | '!' | '?');
    }
    if begin < text.len() {
        out.push(&text[begin..]);
    }
    out
}
