//! Ranking properties of the hybrid retriever.

use proptest::prelude::*;
use std::sync::Arc;

use factcheck::{
    testing::MockEmbedder, DedupPolicy, Document, HybridRetriever, RetrieverConfig,
    ScoredDocument,
};

const VOCAB: &[&str] = &[
    "inflation", "rate", "january", "prices", "wages", "jobs", "percent", "2024", "rent", "energy",
];

fn retriever(weight: f32) -> HybridRetriever<MockEmbedder> {
    HybridRetriever::new(
        Arc::new(MockEmbedder::new()),
        RetrieverConfig::default().with_lexical_weight(weight),
    )
}

fn documents(contents: &[String]) -> Vec<Document> {
    contents
        .iter()
        .enumerate()
        .map(|(i, c)| Document::new(format!("{c} doc{i}")))
        .collect()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Whether a ranking is ordered by `key` descending with insertion order
/// breaking ties.
fn ordered_by(ranking: &[ScoredDocument], key: impl Fn(&ScoredDocument) -> f32) -> bool {
    ranking.windows(2).all(|pair| {
        let (a, b) = (key(&pair[0]), key(&pair[1]));
        a > b || (a == b && pair[0].seq < pair[1].seq)
    })
}

#[tokio::test]
async fn test_lexical_only_weight_follows_bm25() {
    let retriever = retriever(1.0);
    retriever
        .add(vec![
            Document::new("apple apple banana"),
            Document::new("cherry date"),
            Document::new("apple cherry"),
        ])
        .await
        .unwrap();

    let ranked = retriever.retrieve_scored("apple", 3).await.unwrap();
    let seqs: Vec<u64> = ranked.iter().map(|d| d.seq).collect();
    assert_eq!(seqs, vec![0, 2, 1]);
    assert_eq!(ranked[0].fused, 1.0);
    assert_eq!(ranked[2].fused, 0.0);
}

#[tokio::test]
async fn test_semantic_only_weight_follows_cosine() {
    let embedder = MockEmbedder::new()
        .with_embedding("query", vec![1.0, 0.0])
        .with_embedding("orthogonal", vec![0.0, 1.0])
        .with_embedding("diagonal", vec![1.0, 1.0])
        .with_embedding("aligned", vec![2.0, 0.0]);
    let retriever = HybridRetriever::new(
        Arc::new(embedder),
        RetrieverConfig::default().with_lexical_weight(0.0),
    );
    retriever
        .add(vec![
            Document::new("orthogonal"),
            Document::new("diagonal"),
            Document::new("aligned"),
        ])
        .await
        .unwrap();

    let docs = retriever.retrieve("query", 3).await.unwrap();
    let contents: Vec<&str> = docs.iter().map(|d| d.content.as_str()).collect();
    assert_eq!(contents, vec!["aligned", "diagonal", "orthogonal"]);
}

#[tokio::test]
async fn test_ties_break_by_insertion_order() {
    let retriever = HybridRetriever::new(
        Arc::new(MockEmbedder::new()),
        RetrieverConfig::default().with_dedup(DedupPolicy::None),
    );
    let doc = Document::new("same excerpt").with_url("https://example.com/same");
    retriever
        .add(vec![doc.clone(), doc.clone(), doc])
        .await
        .unwrap();

    let ranked = retriever.retrieve_scored("same excerpt", 2).await.unwrap();
    let seqs: Vec<u64> = ranked.iter().map(|d| d.seq).collect();
    assert_eq!(seqs, vec![0, 1]);
}

#[tokio::test]
async fn test_empty_index_skips_embedding() {
    let embedder = Arc::new(MockEmbedder::new());
    let retriever = HybridRetriever::new(embedder.clone(), RetrieverConfig::default());

    assert!(retriever.retrieve("inflation", 5).await.unwrap().is_empty());
    assert_eq!(embedder.call_count(), 0);
}

#[tokio::test]
async fn test_embedding_failure_propagates() {
    let embedder = Arc::new(MockEmbedder::new());
    let retriever = HybridRetriever::new(embedder.clone(), RetrieverConfig::default());
    retriever.add(vec![Document::new("text")]).await.unwrap();

    embedder.set_failing(true);
    assert!(retriever.retrieve("text", 1).await.is_err());
    assert!(retriever.add(vec![Document::new("more")]).await.is_err());
    assert_eq!(retriever.len().await, 1);
}

fn contents_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::collection::vec(prop::sample::select(VOCAB), 1..6).prop_map(|words| words.join(" ")),
        1..12,
    )
}

fn query_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(VOCAB), 1..4).prop_map(|words| words.join(" "))
}

proptest! {
    #[test]
    fn prop_returns_min_of_k_and_size(
        contents in contents_strategy(),
        query in query_strategy(),
        k in 0usize..16
    ) {
        let rt = runtime();
        let (len, n) = rt.block_on(async {
            let retriever = retriever(0.5);
            let n = retriever.add(documents(&contents)).await.unwrap();
            (retriever.retrieve(&query, k).await.unwrap().len(), n)
        });
        prop_assert_eq!(n, contents.len());
        prop_assert_eq!(len, k.min(n));
    }

    #[test]
    fn prop_retrieval_is_deterministic(
        contents in contents_strategy(),
        query in query_strategy(),
        weight in 0.0f32..=1.0
    ) {
        let rt = runtime();
        let (first, second) = rt.block_on(async {
            let retriever = retriever(weight);
            retriever.add(documents(&contents)).await.unwrap();
            let first = retriever.retrieve_scored(&query, 5).await.unwrap();
            let second = retriever.retrieve_scored(&query, 5).await.unwrap();
            (first, second)
        });
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_top_k_is_prefix_of_full_ranking(
        contents in contents_strategy(),
        query in query_strategy(),
        weight in 0.0f32..=1.0,
        k in 1usize..12
    ) {
        let rt = runtime();
        let (full, top) = rt.block_on(async {
            let retriever = retriever(weight);
            retriever.add(documents(&contents)).await.unwrap();
            let full = retriever.retrieve_scored(&query, usize::MAX).await.unwrap();
            let top = retriever.retrieve_scored(&query, k).await.unwrap();
            (full, top)
        });
        prop_assert!(ordered_by(&full, |d| d.fused));
        prop_assert_eq!(&full[..top.len()], &top[..]);
        for doc in &full {
            prop_assert!((0.0..=1.0).contains(&doc.lexical));
            prop_assert!((0.0..=1.0).contains(&doc.semantic));
        }
    }

    #[test]
    fn prop_extreme_weights_follow_single_signal(
        contents in contents_strategy(),
        query in query_strategy()
    ) {
        let rt = runtime();
        let (lexical, semantic) = rt.block_on(async {
            let lexical_only = retriever(1.0);
            lexical_only.add(documents(&contents)).await.unwrap();
            let semantic_only = retriever(0.0);
            semantic_only.add(documents(&contents)).await.unwrap();
            (
                lexical_only.retrieve_scored(&query, usize::MAX).await.unwrap(),
                semantic_only.retrieve_scored(&query, usize::MAX).await.unwrap(),
            )
        });
        prop_assert!(lexical.iter().all(|d| d.fused == d.lexical));
        prop_assert!(ordered_by(&lexical, |d| d.lexical));
        prop_assert!(semantic.iter().all(|d| d.fused == d.semantic));
        prop_assert!(ordered_by(&semantic, |d| d.semantic));
    }

    #[test]
    fn prop_index_only_grows(
        first in contents_strategy(),
        second in contents_strategy(),
        query in query_strategy()
    ) {
        let rt = runtime();
        let (before, after) = rt.block_on(async {
            let retriever = retriever(0.5);
            let mut all = first.clone();
            all.extend(second.iter().cloned());
            let docs = documents(&all);

            retriever.add(docs[..first.len()].to_vec()).await.unwrap();
            let before = retriever.retrieve(&query, usize::MAX).await.unwrap();
            retriever.add(docs[first.len()..].to_vec()).await.unwrap();
            let after = retriever.retrieve(&query, usize::MAX).await.unwrap();
            (before, after)
        });
        prop_assert_eq!(before.len(), first.len());
        prop_assert_eq!(after.len(), first.len() + second.len());
        for doc in &before {
            prop_assert!(after.contains(doc));
        }
    }
}
