//! Evidence documents held by the document store.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Metadata key for a document's title.
pub const META_TITLE: &str = "title";
/// Metadata key for a document's URL.
pub const META_URL: &str = "url";
/// Metadata key for the provider or origin of a document.
pub const META_SOURCE: &str = "source";
/// Metadata key for the chunk index of a split document.
pub const META_CHUNK: &str = "chunk";

/// Stable identity of a document, derived from its content and URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Compute the identity for a content/url pair.
    pub fn derive(content: &str, url: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        // Separator keeps ("ab", "c") distinct from ("a", "bc")
        hasher.update([0u8]);
        hasher.update(url.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0[..self.0.len().min(12)])
    }
}

/// A piece of evidence: content plus string metadata.
///
/// Documents are immutable once constructed; the store hands out clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Evidence text
    pub content: String,

    /// Metadata (title, url, source, ...) in insertion order
    #[serde(default)]
    pub metadata: IndexMap<String, String>,
}

impl Document {
    /// Create a document with no metadata.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: IndexMap::new(),
        }
    }

    /// Create a document with metadata.
    pub fn with_metadata_map(
        content: impl Into<String>,
        metadata: IndexMap<String, String>,
    ) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Add a metadata key-value pair.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the title.
    pub fn with_title(self, title: impl Into<String>) -> Self {
        self.with_metadata(META_TITLE, title)
    }

    /// Set the URL.
    pub fn with_url(self, url: impl Into<String>) -> Self {
        self.with_metadata(META_URL, url)
    }

    /// Set the source.
    pub fn with_source(self, source: impl Into<String>) -> Self {
        self.with_metadata(META_SOURCE, source)
    }

    /// Identity derived from content and URL.
    pub fn id(&self) -> DocumentId {
        DocumentId::derive(&self.content, self.url().unwrap_or(""))
    }

    /// Title metadata, if present.
    pub fn title(&self) -> Option<&str> {
        self.metadata.get(META_TITLE).map(String::as_str)
    }

    /// URL metadata, if present.
    pub fn url(&self) -> Option<&str> {
        self.metadata.get(META_URL).map(String::as_str)
    }

    /// Source metadata, if present.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(META_SOURCE).map(String::as_str)
    }
}

/// A document as stored in the index, with its insertion sequence number.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Monotonic insertion sequence (0-based), used for tie-breaking
    pub seq: u64,

    /// Identity computed at insertion
    pub id: DocumentId,

    /// The document itself
    pub document: Document,
}

/// A retrieval hit with the scores that ranked it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    /// Insertion sequence of the hit
    pub seq: u64,

    /// The document
    pub document: Document,

    /// Normalized lexical score in [0, 1]
    pub lexical: f32,

    /// Normalized semantic score in [0, 1]
    pub semantic: f32,

    /// Weighted fusion of the two
    pub fused: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_uses_content_and_url() {
        let a = Document::new("inflation fell").with_url("https://a.example");
        let b = Document::new("inflation fell").with_url("https://b.example");
        let c = Document::new("inflation fell")
            .with_url("https://a.example")
            .with_title("Different title");

        assert_ne!(a.id(), b.id());
        // Title is not part of identity
        assert_eq!(a.id(), c.id());
    }

    #[test]
    fn test_identity_separator() {
        assert_ne!(DocumentId::derive("ab", "c"), DocumentId::derive("a", "bc"));
    }

    #[test]
    fn test_metadata_accessors() {
        let doc = Document::new("text")
            .with_title("Report")
            .with_url("https://example.com/report")
            .with_source("tavily");

        assert_eq!(doc.title(), Some("Report"));
        assert_eq!(doc.url(), Some("https://example.com/report"));
        assert_eq!(doc.source(), Some("tavily"));

        let keys: Vec<_> = doc.metadata.keys().cloned().collect();
        assert_eq!(keys, vec!["title", "url", "source"]);
    }
}
