//! Append-only in-memory document store.
//!
//! Owned by a single retriever for the lifetime of one run and discarded with
//! it. Documents are never mutated or removed once stored.

use std::collections::HashSet;

use crate::types::{
    config::DedupPolicy,
    document::{Document, DocumentId, StoredDocument},
};

/// A stored document together with its semantic embedding.
#[derive(Debug, Clone)]
pub struct Entry {
    pub stored: StoredDocument,
    pub embedding: Vec<f32>,
}

/// In-memory storage for evidence documents and their embeddings.
///
/// Sequence numbers are assigned monotonically at insert time and are the
/// insertion order used for tie-breaking at retrieval.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Vec<Entry>,
    ids: HashSet<DocumentId>,
    dedup: DedupPolicy,
}

impl MemoryStore {
    /// Create a new empty store with the given deduplication policy.
    pub fn new(dedup: DedupPolicy) -> Self {
        Self {
            entries: Vec::new(),
            ids: HashSet::new(),
            dedup,
        }
    }

    /// Whether a document with this identity is already stored.
    pub fn contains(&self, id: &DocumentId) -> bool {
        self.ids.contains(id)
    }

    /// Whether inserting this document would be skipped as a duplicate.
    pub fn is_duplicate(&self, id: &DocumentId) -> bool {
        self.dedup == DedupPolicy::Identity && self.contains(id)
    }

    /// Append a document, returning its sequence number.
    ///
    /// Returns `None` when the dedup policy rejects it.
    pub fn insert(&mut self, document: Document, embedding: Vec<f32>) -> Option<u64> {
        let id = document.id();
        if self.is_duplicate(&id) {
            return None;
        }

        let seq = self.entries.len() as u64;
        self.ids.insert(id.clone());
        self.entries.push(Entry {
            stored: StoredDocument { seq, id, document },
            embedding,
        });
        Some(seq)
    }

    /// Get the number of stored documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Documents in insertion order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.entries.iter().map(|e| &e.stored.document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequences_are_monotonic() {
        let mut store = MemoryStore::new(DedupPolicy::None);
        assert_eq!(store.insert(Document::new("a"), vec![1.0]), Some(0));
        assert_eq!(store.insert(Document::new("b"), vec![1.0]), Some(1));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_identity_dedup() {
        let mut store = MemoryStore::new(DedupPolicy::Identity);
        let doc = Document::new("CPI rose 3.1%").with_url("https://bls.gov/cpi");

        assert_eq!(store.insert(doc.clone(), vec![]), Some(0));
        assert_eq!(store.insert(doc.clone(), vec![]), None);

        // Same content from a different URL is a different document
        let mirrored = Document::new("CPI rose 3.1%").with_url("https://mirror.example/cpi");
        assert_eq!(store.insert(mirrored, vec![]), Some(1));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_no_dedup_keeps_duplicates() {
        let mut store = MemoryStore::new(DedupPolicy::None);
        let doc = Document::new("same").with_url("https://example.com");
        store.insert(doc.clone(), vec![]);
        store.insert(doc, vec![]);

        assert_eq!(store.len(), 2);
        let seqs: Vec<u64> = store.entries().iter().map(|e| e.stored.seq).collect();
        assert_eq!(seqs, vec![0, 1]);
    }
}
