//! Grounding prompt assembly.
//!
//! Builds the single prompt sent to the generation provider: a fixed
//! instruction block, the numbered evidence snippets, the rendered
//! conversation history, and the raw question.

use crate::evidence::EvidenceItem;
use crate::session::Turn;
use grounder_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Grounding prompt template.
///
/// The instruction block tells the model to answer from the snippets,
/// convert Fahrenheit to Celsius when asked, prefer the most recently
/// stated value when sources conflict, and cite with bracketed numbers
/// matching the evidence.
const GROUNDING_TEMPLATE: &str = "You are a helpful assistant. Use the following search result snippets to answer the question. \
Try to extract relevant factual data, and if it includes temperatures in Fahrenheit, convert it to Celsius when asked. \
If you find multiple values, use the most recent one mentioned. Include citation numbers like [1] when appropriate.\n\n\
Make sure to include the correct citation number in your answer.\n\
Combine your knowledge with the search results to provide a detailed answer.\n\n\
Search Results:\n{{evidence}}\n\
Conversation History:\n{{history}}\n\
User Question: {{question}}\n\
Answer:";

/// Render prior turns as alternating `Q:`/`A:` lines, in order.
pub fn render_history(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| format!("Q: {}\nA: {}", turn.question, turn.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render evidence items as one snippet line each, in citation order.
pub fn render_evidence(items: &[EvidenceItem]) -> String {
    items
        .iter()
        .map(|item| item.snippet.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the grounding prompt from its three variable parts.
pub fn build_grounding_prompt(
    evidence: &str,
    history: &str,
    question: &str,
) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text prompt, no HTML escaping
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("grounding", GROUNDING_TEMPLATE)
        .map_err(|e| AppError::Generation(format!("Failed to register template: {}", e)))?;

    let mut variables = HashMap::new();
    variables.insert("evidence", evidence);
    variables.insert("history", history);
    variables.insert("question", question);

    handlebars
        .render("grounding", &variables)
        .map_err(|e| AppError::Generation(format!("Failed to render template: {}", e)))
}
