//! Score fusion and ranking for hybrid recall.
//!
//! Lexical (BM25) and semantic (cosine) scores live on unrelated scales, so
//! both are min-max normalized over the candidate set before being combined
//! as `w * lexical + (1 - w) * semantic`.

use std::cmp::Ordering;

use crate::traits::embedder::cosine_similarity;

/// Rescale scores into [0, 1].
///
/// A constant vector maps to 1.0 when its value is positive and 0.0
/// otherwise, so an all-zero lexical signal contributes nothing. Non-finite
/// scores count as 0.0.
pub fn min_max_normalize(scores: &[f32]) -> Vec<f32> {
    let clean: Vec<f32> = scores
        .iter()
        .map(|s| if s.is_finite() { *s } else { 0.0 })
        .collect();

    let min = clean.iter().copied().fold(f32::INFINITY, f32::min);
    let max = clean.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    if clean.is_empty() {
        return clean;
    }

    let range = max - min;
    if range <= f32::EPSILON {
        let value = if max > 0.0 { 1.0 } else { 0.0 };
        return vec![value; clean.len()];
    }

    clean.iter().map(|s| (s - min) / range).collect()
}

/// Cosine similarity of the query against each embedding, in order.
pub fn semantic_scores<'a>(
    query_embedding: &[f32],
    embeddings: impl IntoIterator<Item = &'a [f32]>,
) -> Vec<f32> {
    embeddings
        .into_iter()
        .map(|emb| cosine_similarity(query_embedding, emb))
        .collect()
}

/// Per-candidate scores after normalization and fusion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedScore {
    /// Position of the candidate (its insertion sequence)
    pub index: usize,
    pub lexical: f32,
    pub semantic: f32,
    pub fused: f32,
}

/// Normalize both score vectors and combine them with `lexical_weight`.
///
/// Both slices must be indexed by insertion order and have equal length.
pub fn fuse_scores(lexical: &[f32], semantic: &[f32], lexical_weight: f32) -> Vec<FusedScore> {
    debug_assert_eq!(lexical.len(), semantic.len());

    let lexical = min_max_normalize(lexical);
    let semantic = min_max_normalize(semantic);
    let w = lexical_weight.clamp(0.0, 1.0);

    lexical
        .iter()
        .zip(&semantic)
        .enumerate()
        .map(|(index, (&lex, &sem))| FusedScore {
            index,
            lexical: lex,
            semantic: sem,
            fused: w * lex + (1.0 - w) * sem,
        })
        .collect()
}

/// Keep the top `k` by fused score, descending; ties go to the earlier index.
pub fn rank_top_k(mut scores: Vec<FusedScore>, k: usize) -> Vec<FusedScore> {
    scores.sort_by(|a, b| {
        b.fused
            .partial_cmp(&a.fused)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.index.cmp(&b.index))
    });
    scores.truncate(k);
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_max_normalize() {
        let normalized = min_max_normalize(&[2.0, 4.0, 6.0]);
        assert_eq!(normalized, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_min_max_constant_vectors() {
        assert_eq!(min_max_normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
        assert_eq!(min_max_normalize(&[0.7, 0.7]), vec![1.0, 1.0]);
        assert_eq!(min_max_normalize(&[-0.3]), vec![0.0]);
        assert!(min_max_normalize(&[]).is_empty());
    }

    #[test]
    fn test_min_max_non_finite() {
        let normalized = min_max_normalize(&[f32::NAN, 1.0]);
        assert_eq!(normalized, vec![0.0, 1.0]);
    }

    #[test]
    fn test_fuse_weights() {
        let lexical = [10.0, 0.0];
        let semantic = [0.1, 0.9];

        let lexical_only = fuse_scores(&lexical, &semantic, 1.0);
        assert_eq!(lexical_only[0].fused, 1.0);
        assert_eq!(lexical_only[1].fused, 0.0);

        let semantic_only = fuse_scores(&lexical, &semantic, 0.0);
        assert_eq!(semantic_only[0].fused, 0.0);
        assert_eq!(semantic_only[1].fused, 1.0);

        let even = fuse_scores(&lexical, &semantic, 0.5);
        assert_eq!(even[0].fused, 0.5);
        assert_eq!(even[1].fused, 0.5);
    }

    #[test]
    fn test_rank_top_k_tie_break() {
        let scores = fuse_scores(&[1.0, 3.0, 3.0, 2.0], &[0.0; 4], 1.0);
        let ranked: Vec<usize> = rank_top_k(scores, 3).iter().map(|s| s.index).collect();
        assert_eq!(ranked, vec![1, 2, 3]);
    }

    #[test]
    fn test_rank_top_k_bounded() {
        let scores = fuse_scores(&[1.0, 2.0], &[1.0, 2.0], 0.5);
        assert_eq!(rank_top_k(scores.clone(), 10).len(), 2);
        assert!(rank_top_k(scores, 0).is_empty());
    }

    #[test]
    fn test_semantic_scores() {
        let embeddings = [vec![1.0, 0.0], vec![0.0, 1.0]];
        let scores = semantic_scores(&[1.0, 0.0], embeddings.iter().map(|e| e.as_slice()));
        assert!((scores[0] - 1.0).abs() < 1e-6);
        assert!(scores[1].abs() < 1e-6);
    }
}
