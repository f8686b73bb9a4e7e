//! Prompt template management.

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::SummaryError;

/// Manages Handlebars prompt templates.
pub struct PromptManager {
    handlebars: Handlebars<'static>,
}

impl PromptManager {
    /// Create a new prompt manager with embedded templates.
    pub fn new() -> Result<Self, SummaryError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        // Prompts are plain text, not HTML.
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars
            .register_template_string("summarize", SUMMARIZE_TEMPLATE)
            .map_err(|e| SummaryError::Backend(format!("invalid prompt template: {e}")))?;

        Ok(Self { handlebars })
    }

    /// Render a template with the given data.
    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String, SummaryError> {
        self.handlebars
            .render(template, data)
            .map_err(|e| SummaryError::Backend(format!("prompt render failed: {e}")))
    }
}

/// System prompt for paper summaries.
pub const SYSTEM_PROMPT: &str = "You write concise, faithful summaries of research papers for a daily email digest. \
Use only the information in the title and abstract. Answer with a single plain-text paragraph, no markdown.";

/// Per-paper summarization prompt template.
const SUMMARIZE_TEMPLATE: &str = r"Summarize this arXiv paper in at most {{max_sentences}} sentences.
State the problem, the approach, and the main result.

Title: {{title}}
Authors: {{authors}}
{{#if category}}Category: {{category}}
{{/if}}
Abstract:
{{abstract}}
";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_summarize() {
        let prompts = PromptManager::new().unwrap();
        let rendered = prompts
            .render(
                "summarize",
                &json!({
                    "max_sentences": 3,
                    "title": "Attention <Is> All You Need",
                    "authors": "Vaswani et al.",
                    "category": "cs.CL",
                    "abstract": "We propose the Transformer.",
                }),
            )
            .unwrap();
        assert!(rendered.contains("at most 3 sentences"));
        assert!(rendered.contains("Title: Attention <Is> All You Need"));
        assert!(rendered.contains("Category: cs.CL"));
        assert!(rendered.contains("We propose the Transformer."));
    }

    #[test]
    fn test_render_missing_field_fails() {
        let prompts = PromptManager::new().unwrap();
        let err = prompts.render("summarize", &json!({"title": "x"})).unwrap_err();
        assert!(matches!(err, SummaryError::Backend(_)));
    }
}
