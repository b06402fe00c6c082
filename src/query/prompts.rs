//! Prompt templates for answer synthesis and query rewriting.

use std::path::Path;

use crate::types::{AppError, Result};

/// QA template used when answers carry numbered citations.
pub const CITATION_QA_TEMPLATE: &str = "\
Please provide an answer based solely on the provided sources. \
When referencing information from a source, cite the appropriate source(s) using their corresponding numbers. \
Every answer should include at least one source citation. \
Only cite a source when you are explicitly referencing it. \
If none of the sources are helpful, you should indicate that. \
For example:
Source 1:
The sky is red in the evening and blue in the morning.
Source 2:
Water is wet when the sky is red.
Query: When is water wet?
Answer: Water will be wet when the sky is red [2], which occurs in the evening [1].
Now it's your turn. Below are several numbered sources of information:
------
{context_str}
------
Query: {query_str}
Answer: ";

/// QA template used when citations are disabled.
pub const TEXT_QA_TEMPLATE: &str = "\
Context information is below.
---------------------
{context_str}
---------------------
Given the context information and not prior knowledge, answer the query.
Query: {query_str}
Answer: ";

/// Prompt used by the HyDE transform to produce a hypothetical passage.
pub const HYDE_PROMPT: &str = "\
Please write a passage to answer the question. \
Try to include as many key details as possible.

Question: {query_str}

Passage: ";

const CONTEXT_PLACEHOLDER: &str = "{context_str}";
const QUERY_PLACEHOLDER: &str = "{query_str}";

/// A QA prompt template with `{context_str}` and `{query_str}` placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Create a template, validating that both placeholders are present.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();

        for placeholder in [CONTEXT_PLACEHOLDER, QUERY_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(AppError::Config(format!(
                    "QA template is missing the {} placeholder",
                    placeholder
                )));
            }
        }

        Ok(Self { template })
    }

    /// Load a template from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let template = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!(
                "Failed to read QA template at {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::new(template)
    }

    /// The built-in citation QA template.
    pub fn citation_qa() -> Self {
        Self {
            template: CITATION_QA_TEMPLATE.to_string(),
        }
    }

    /// The built-in plain QA template.
    pub fn text_qa() -> Self {
        Self {
            template: TEXT_QA_TEMPLATE.to_string(),
        }
    }

    /// Fill in the placeholders.
    pub fn format(&self, context_str: &str, query_str: &str) -> String {
        self.template
            .replace(CONTEXT_PLACEHOLDER, context_str)
            .replace(QUERY_PLACEHOLDER, query_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_templates_are_valid() {
        PromptTemplate::new(CITATION_QA_TEMPLATE).unwrap();
        PromptTemplate::new(TEXT_QA_TEMPLATE).unwrap();
    }

    #[test]
    fn test_format_substitutes_both_placeholders() {
        let template = PromptTemplate::new("ctx: {context_str}\nq: {query_str}").unwrap();
        let formatted = template.format("the context", "the question");
        assert_eq!(formatted, "ctx: the context\nq: the question");
    }

    #[test]
    fn test_missing_placeholder_rejected() {
        assert!(PromptTemplate::new("no placeholders here").is_err());
        assert!(PromptTemplate::new("only {context_str}").is_err());
        assert!(PromptTemplate::new("only {query_str}").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = std::env::temp_dir().join("docqa_test_prompts");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("template.txt");
        std::fs::write(&path, "{context_str} -- {query_str}").unwrap();

        let template = PromptTemplate::from_file(&path).unwrap();
        assert_eq!(template.format("a", "b"), "a -- b");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_from_file_missing() {
        assert!(PromptTemplate::from_file("/nonexistent/template.txt").is_err());
    }
}
