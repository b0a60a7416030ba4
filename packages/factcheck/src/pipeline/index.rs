//! The hybrid retriever: a run-scoped index over evidence documents.
//!
//! Each document is embedded for semantic lookup and tokenized into a BM25
//! index for lexical lookup. Queries rank every indexed document by the fused
//! score (see [`crate::pipeline::recall`]) and return the top `k`.
//!
//! The index only grows. Embeddings are computed before the write lock is
//! taken, and a batch is published to both halves of the index under a
//! single lock acquisition, so readers never see a document that is present
//! in one half but not the other.

use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{FactCheckError, Result};
use crate::pipeline::lexical::LexicalIndex;
use crate::pipeline::recall::{fuse_scores, rank_top_k, semantic_scores};
use crate::stores::MemoryStore;
use crate::traits::embedder::Embedder;
use crate::types::{
    config::RetrieverConfig,
    document::{Document, ScoredDocument},
};

#[derive(Debug, Default)]
struct IndexState {
    store: MemoryStore,
    lexical: LexicalIndex,
}

/// Hybrid lexical and semantic index over the documents of one run.
///
/// # Example
///
/// ```rust,ignore
/// let retriever = HybridRetriever::new(embedder, RetrieverConfig::default());
///
/// retriever
///     .add(vec![Document::new("CPI rose 3.1% in January").with_url("https://bls.gov")])
///     .await?;
///
/// let docs = retriever.retrieve("inflation rate January 2024", 2).await?;
/// ```
pub struct HybridRetriever<E: Embedder> {
    embedder: Arc<E>,
    config: RetrieverConfig,
    state: RwLock<IndexState>,
}

impl<E: Embedder> HybridRetriever<E> {
    /// Create an empty retriever.
    pub fn new(embedder: Arc<E>, config: RetrieverConfig) -> Self {
        let state = IndexState {
            store: MemoryStore::new(config.dedup),
            lexical: LexicalIndex::new(),
        };
        Self {
            embedder,
            config,
            state: RwLock::new(state),
        }
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Index raw contents with parallel metadata maps.
    ///
    /// `metadatas` may be empty (no metadata for any document) or must match
    /// `contents` in length. Empty input is a no-op.
    pub async fn add_documents(
        &self,
        contents: Vec<String>,
        metadatas: Vec<IndexMap<String, String>>,
    ) -> Result<usize> {
        if !metadatas.is_empty() && metadatas.len() != contents.len() {
            return Err(FactCheckError::Config(format!(
                "{} contents but {} metadata maps",
                contents.len(),
                metadatas.len()
            )));
        }

        let mut metadatas = metadatas.into_iter();
        let documents = contents
            .into_iter()
            .map(|content| {
                Document::with_metadata_map(content, metadatas.next().unwrap_or_default())
            })
            .collect();

        self.add(documents).await
    }

    /// Index documents, returning how many were stored.
    ///
    /// Documents with blank content are skipped. Under identity dedup,
    /// documents already indexed (or repeated within the batch) are skipped
    /// too. Skipped documents are not counted.
    pub async fn add(&self, documents: Vec<Document>) -> Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let candidates: Vec<Document> = {
            let state = self.state.read().await;
            let mut seen = HashSet::new();
            documents
                .into_iter()
                .filter(|doc| !doc.content.trim().is_empty())
                .filter(|doc| {
                    let id = doc.id();
                    !state.store.is_duplicate(&id) && (seen.insert(id) || !self.dedups())
                })
                .collect()
        };

        if candidates.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = candidates.iter().map(|d| d.content.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != candidates.len() {
            return Err(FactCheckError::Embedding(format!(
                "expected {} embeddings, got {}",
                candidates.len(),
                embeddings.len()
            )));
        }

        let mut state = self.state.write().await;
        let mut added = 0;
        for (document, embedding) in candidates.into_iter().zip(embeddings) {
            let text = document.content.clone();
            if state.store.insert(document, embedding).is_some() {
                state.lexical.add(&text);
                added += 1;
            }
        }

        debug!(added, total = state.store.len(), "Indexed documents");
        Ok(added)
    }

    /// Top `k` documents for a query, best first.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Document>> {
        Ok(self
            .retrieve_scored(query, k)
            .await?
            .into_iter()
            .map(|scored| scored.document)
            .collect())
    }

    /// Top `k` documents for a query with their normalized and fused scores.
    ///
    /// A blank query or an empty index returns an empty list without
    /// embedding the query.
    pub async fn retrieve_scored(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>> {
        if k == 0 || query.trim().is_empty() || self.is_empty().await {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;

        let state = self.state.read().await;
        let entries = state.store.entries();

        let lexical = state.lexical.score_all(query);
        let semantic = semantic_scores(
            &query_embedding,
            entries.iter().map(|e| e.embedding.as_slice()),
        );

        let ranked = rank_top_k(
            fuse_scores(&lexical, &semantic, self.config.lexical_weight),
            k,
        );

        debug!(query, k, returned = ranked.len(), "Retrieved documents");

        Ok(ranked
            .into_iter()
            .map(|score| {
                let entry = &entries[score.index];
                ScoredDocument {
                    seq: entry.stored.seq,
                    document: entry.stored.document.clone(),
                    lexical: score.lexical,
                    semantic: score.semantic,
                    fused: score.fused,
                }
            })
            .collect())
    }

    /// Number of indexed documents.
    pub async fn len(&self) -> usize {
        self.state.read().await.store.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of every indexed document in insertion order.
    pub async fn documents(&self) -> Vec<Document> {
        self.state.read().await.store.documents().cloned().collect()
    }

    fn dedups(&self) -> bool {
        self.config.dedup == crate::types::config::DedupPolicy::Identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockEmbedder;
    use crate::types::config::DedupPolicy;

    fn retriever(config: RetrieverConfig) -> HybridRetriever<MockEmbedder> {
        HybridRetriever::new(Arc::new(MockEmbedder::new()), config)
    }

    #[tokio::test]
    async fn test_empty_index_returns_nothing() {
        let retriever = retriever(RetrieverConfig::default());
        assert!(retriever.retrieve("anything", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_documents_empty_is_noop() {
        let retriever = retriever(RetrieverConfig::default());
        assert_eq!(retriever.add_documents(vec![], vec![]).await.unwrap(), 0);
        assert!(retriever.is_empty().await);
    }

    #[tokio::test]
    async fn test_add_documents_with_metadata() {
        let retriever = retriever(RetrieverConfig::default());
        let mut meta = IndexMap::new();
        meta.insert("title".to_string(), "User Provided Context".to_string());

        let added = retriever
            .add_documents(vec!["Context text".to_string()], vec![meta])
            .await
            .unwrap();

        assert_eq!(added, 1);
        let docs = retriever.documents().await;
        assert_eq!(docs[0].title(), Some("User Provided Context"));
    }

    #[tokio::test]
    async fn test_add_documents_metadata_mismatch() {
        let retriever = retriever(RetrieverConfig::default());
        let result = retriever
            .add_documents(
                vec!["a".to_string(), "b".to_string()],
                vec![IndexMap::new()],
            )
            .await;
        assert!(matches!(result, Err(FactCheckError::Config(_))));
    }

    #[tokio::test]
    async fn test_retrieve_ranks_relevant_first() {
        let retriever = retriever(RetrieverConfig::default());
        retriever
            .add(vec![
                Document::new("The football season starts in August."),
                Document::new("Inflation fell to 3.4 percent in January 2024."),
                Document::new("A new bakery opened downtown."),
            ])
            .await
            .unwrap();

        let docs = retriever.retrieve("inflation January 2024", 1).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].content.contains("Inflation"));
    }

    #[tokio::test]
    async fn test_identity_dedup_within_batch() {
        let retriever = retriever(RetrieverConfig::default());
        let doc = Document::new("Repeated excerpt").with_url("https://example.com/a");

        let added = retriever.add(vec![doc.clone(), doc.clone()]).await.unwrap();
        assert_eq!(added, 1);
        assert_eq!(retriever.add(vec![doc]).await.unwrap(), 0);
        assert_eq!(retriever.len().await, 1);
    }

    #[tokio::test]
    async fn test_no_dedup_stores_duplicates() {
        let retriever = retriever(RetrieverConfig::default().with_dedup(DedupPolicy::None));
        let doc = Document::new("Repeated excerpt").with_url("https://example.com/a");

        assert_eq!(retriever.add(vec![doc.clone(), doc]).await.unwrap(), 2);

        let scored = retriever.retrieve_scored("repeated excerpt", 5).await.unwrap();
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].seq, 0);
        assert_eq!(scored[1].seq, 1);
    }

    #[tokio::test]
    async fn test_blank_documents_are_skipped() {
        let retriever = retriever(RetrieverConfig::default());
        let added = retriever
            .add(vec![Document::new("  \n"), Document::new("CPI rose 3.1%")])
            .await
            .unwrap();

        assert_eq!(added, 1);
        assert_eq!(retriever.documents().await[0].content, "CPI rose 3.1%");
    }

    #[tokio::test]
    async fn test_blank_query_returns_nothing() {
        let embedder = Arc::new(MockEmbedder::new());
        let retriever = HybridRetriever::new(embedder.clone(), RetrieverConfig::default());
        retriever.add(vec![Document::new("text")]).await.unwrap();
        let before = embedder.call_count();

        assert!(retriever.retrieve(" ", 3).await.unwrap().is_empty());
        assert_eq!(embedder.call_count(), before);
    }

    #[tokio::test]
    async fn test_zero_k_returns_nothing() {
        let retriever = retriever(RetrieverConfig::default());
        retriever.add(vec![Document::new("text")]).await.unwrap();
        assert!(retriever.retrieve("text", 0).await.unwrap().is_empty());
    }
}
