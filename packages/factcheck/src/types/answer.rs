//! Answers synthesized for claim components, with their citations.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::document::Document;

/// Text used when a component has no evidence to answer from.
pub const INSUFFICIENT_EVIDENCE: &str =
    "Insufficient evidence: no documents were retrieved for this question.";

/// An explicit, model-asserted reference into a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Citation {
    /// URL of the cited document
    pub source_url: String,

    /// Title of the cited document
    pub source_title: String,

    /// Quoted or paraphrased passage
    pub snippet: String,
}

impl Citation {
    /// Create a citation.
    pub fn new(
        source_url: impl Into<String>,
        source_title: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            source_title: source_title.into(),
            snippet: snippet.into(),
        }
    }

    /// Cite a document, taking url and title from its metadata.
    pub fn from_document(document: &Document, snippet: impl Into<String>) -> Self {
        Self::new(
            document.url().unwrap_or_default(),
            document.title().unwrap_or_default(),
            snippet,
        )
    }
}

/// What the answer synthesizer produces: text plus explicit citations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerDraft {
    /// Answer text
    pub text: String,

    /// Explicit citations, possibly empty
    #[serde(default)]
    pub citations: Vec<Citation>,
}

impl AnswerDraft {
    /// Create a draft without citations.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            citations: Vec::new(),
        }
    }

    /// Add a citation.
    pub fn with_citation(mut self, citation: Citation) -> Self {
        self.citations.push(citation);
        self
    }

    /// The well-formed answer for a component with no evidence.
    pub fn insufficient_evidence() -> Self {
        Self::new(INSUFFICIENT_EVIDENCE)
    }
}

/// A synthesized answer with explicit and implicit citations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Answer text
    pub text: String,

    /// Explicit citations asserted by the synthesizer
    #[serde(default)]
    pub citations: Vec<Citation>,

    /// Documents consulted during synthesis (implicit citations)
    #[serde(default)]
    pub retrieved_docs: Vec<Document>,
}

impl Answer {
    /// Combine a draft with the documents it was synthesized from.
    pub fn from_draft(draft: AnswerDraft, retrieved_docs: Vec<Document>) -> Self {
        Self {
            text: draft.text,
            citations: draft.citations,
            retrieved_docs,
        }
    }

    /// Whether the answer was produced without any evidence.
    pub fn is_unsupported(&self) -> bool {
        self.retrieved_docs.is_empty() && self.citations.is_empty()
    }

    /// Answer text with any trailing "Reasoning:" section removed.
    pub fn summary_text(&self) -> &str {
        self.text
            .split("Reasoning:")
            .next()
            .unwrap_or(&self.text)
            .trim()
    }

    /// Citations that point at one of the retrieved documents.
    pub fn grounded_citations(&self) -> impl Iterator<Item = &Citation> {
        self.citations.iter().filter(move |c| {
            self.retrieved_docs
                .iter()
                .any(|d| d.url() == Some(c.source_url.as_str()))
        })
    }
}
