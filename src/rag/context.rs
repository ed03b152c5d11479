//! Prompt splicing for augmented queries
use serde::{Deserialize, Serialize};

/// Joins the user's query to the retrieved passage
pub const REFERENCE_SEPARATOR: &str = " /// here is a reference text related to this query: ";

/// Collapse every line break to a single space (`\r\n` counts as one break)
pub fn normalize_query(text: &str) -> String {
    text.replace("\r\n", " ").replace(&['\n', '\r'][..], " ")
}

/// Splice a reference passage onto the original query
pub fn augment_prompt(query: &str, reference: &str) -> String {
    let mut prompt = String::with_capacity(query.len() + REFERENCE_SEPARATOR.len() + reference.len());
    prompt.push_str(query);
    prompt.push_str(REFERENCE_SEPARATOR);
    prompt.push_str(reference);
    prompt
}

/// Query and reference halves of an augmented prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptParts {
    pub query: String,
    pub reference: String,
}

/// Split an augmented prompt back at the last separator
pub fn split_prompt(prompt: &str) -> Option<PromptParts> {
    prompt.rfind(REFERENCE_SEPARATOR).map(|idx| PromptParts {
        query: prompt[..idx].to_string(),
        reference: prompt[idx + REFERENCE_SEPARATOR.len()..].to_string(),
    })
}
