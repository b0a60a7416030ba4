//! Evidence acquisition from an optional web searcher.
//!
//! Acquisition never fails a run: provider, auth and network errors are
//! logged and treated as "no new evidence", leaving retrieval to run against
//! whatever the index already holds.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::pipeline::chunk::chunk_document;
use crate::traits::searcher::{SearchResult, WebSearcher};
use crate::types::{config::ChunkConfig, document::Document};

/// Turns search queries into evidence documents.
#[derive(Clone, Default)]
pub struct EvidenceAcquirer {
    searcher: Option<Arc<dyn WebSearcher>>,
    chunking: Option<ChunkConfig>,
    timeout: Option<Duration>,
}

impl EvidenceAcquirer {
    /// Create an acquirer backed by a searcher.
    pub fn new(searcher: Arc<dyn WebSearcher>) -> Self {
        Self {
            searcher: Some(searcher),
            chunking: None,
            timeout: None,
        }
    }

    /// Closed-corpus mode: every fetch returns nothing.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Chunk excerpts before they are indexed.
    pub fn with_chunking(mut self, chunking: Option<ChunkConfig>) -> Self {
        self.chunking = chunking;
        self
    }

    /// Bound each search call.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.searcher.is_some()
    }

    /// Search for a query and convert the results to documents.
    ///
    /// Returns an empty list when disabled, on provider failure, or on
    /// timeout.
    pub async fn fetch(&self, query: &str) -> Vec<Document> {
        let Some(searcher) = &self.searcher else {
            return Vec::new();
        };

        let search = searcher.search(query);
        let outcome = match self.timeout {
            Some(deadline) => match tokio::time::timeout(deadline, search).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(query, provider = searcher.name(), ?deadline, "Web search timed out");
                    return Vec::new();
                }
            },
            None => search.await,
        };

        match outcome {
            Ok(results) => {
                debug!(
                    query,
                    provider = searcher.name(),
                    count = results.len(),
                    "Web search returned"
                );
                to_documents(results, searcher.name(), self.chunking.as_ref())
            }
            Err(e) => {
                warn!(
                    error = %e,
                    query,
                    provider = searcher.name(),
                    "Web search failed, using existing evidence"
                );
                Vec::new()
            }
        }
    }
}

/// Convert search results to documents.
///
/// Results with a blank excerpt carry no evidence and are skipped. Metadata
/// holds the title, URL and source (falling back to the provider name).
pub fn to_documents(
    results: Vec<SearchResult>,
    provider: &str,
    chunking: Option<&ChunkConfig>,
) -> Vec<Document> {
    results
        .into_iter()
        .filter(|r| !r.excerpt.trim().is_empty())
        .flat_map(|r| {
            let source = if r.source.is_empty() {
                provider.to_string()
            } else {
                r.source
            };
            let document = Document::new(r.excerpt)
                .with_title(r.title)
                .with_url(r.url)
                .with_source(source);

            match chunking {
                Some(config) => chunk_document(document, config),
                None => vec![document],
            }
        })
        .collect()
}
