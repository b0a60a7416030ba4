//! Incremental BM25 index for the lexical half of hybrid retrieval.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static RE_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+").unwrap());

const K1: f32 = 1.2;
const B: f32 = 0.75;

/// Split text into lowercase alphanumeric tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    RE_TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Term statistics over every document added so far.
///
/// Documents are addressed by their position, which matches the store's
/// insertion sequence.
#[derive(Debug, Default)]
pub struct LexicalIndex {
    term_freqs: Vec<HashMap<String, u32>>,
    doc_lengths: Vec<usize>,
    doc_freq: HashMap<String, usize>,
    total_len: usize,
}

impl LexicalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index one document's text.
    pub fn add(&mut self, text: &str) {
        let tokens = tokenize(text);

        let mut tf: HashMap<String, u32> = HashMap::new();
        for token in &tokens {
            *tf.entry(token.clone()).or_default() += 1;
        }
        for term in tf.keys() {
            *self.doc_freq.entry(term.clone()).or_default() += 1;
        }

        self.total_len += tokens.len();
        self.doc_lengths.push(tokens.len());
        self.term_freqs.push(tf);
    }

    pub fn len(&self) -> usize {
        self.term_freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.term_freqs.is_empty()
    }

    /// BM25 score of the query against every indexed document, in order.
    pub fn score_all(&self, query: &str) -> Vec<f32> {
        let total_docs = self.len();
        if total_docs == 0 {
            return Vec::new();
        }

        let avg_doc_len = (self.total_len as f32 / total_docs as f32).max(1.0);

        let mut terms = tokenize(query);
        terms.sort();
        terms.dedup();

        let idfs: Vec<(&str, f32)> = terms
            .iter()
            .filter_map(|term| {
                let df = *self.doc_freq.get(term)?;
                Some((term.as_str(), idf(df, total_docs)))
            })
            .collect();

        self.term_freqs
            .iter()
            .zip(&self.doc_lengths)
            .map(|(tf, &len)| {
                idfs.iter()
                    .map(|(term, idf)| {
                        let freq = tf.get(*term).copied().unwrap_or(0) as f32;
                        if freq == 0.0 {
                            return 0.0;
                        }
                        let norm = K1 * (1.0 - B + B * len as f32 / avg_doc_len);
                        idf * freq * (K1 + 1.0) / (freq + norm)
                    })
                    .sum()
            })
            .collect()
    }
}

fn idf(df: usize, total_docs: usize) -> f32 {
    let n = total_docs as f32;
    let df = df as f32;
    (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Inflation fell to 2% in Jan-2024!"),
            vec!["inflation", "fell", "to", "2", "in", "jan", "2024"]
        );
        assert!(tokenize("  ... ").is_empty());
    }

    #[test]
    fn test_empty_index_scores_nothing() {
        let index = LexicalIndex::new();
        assert!(index.score_all("anything").is_empty());
    }

    #[test]
    fn test_matching_document_scores_higher() {
        let mut index = LexicalIndex::new();
        index.add("The weather in Paris was mild.");
        index.add("Inflation fell to 2 percent in January.");
        index.add("Stock markets rallied.");

        let scores = index.score_all("inflation January");
        assert_eq!(scores.len(), 3);
        assert!(scores[1] > scores[0]);
        assert!(scores[1] > scores[2]);
        assert_eq!(scores[0], 0.0);
    }

    #[test]
    fn test_rare_terms_weigh_more() {
        let mut index = LexicalIndex::new();
        index.add("inflation report");
        index.add("inflation data");
        index.add("unemployment data");

        let scores = index.score_all("report");
        let common = index.score_all("inflation");
        assert!(scores[0] > common[0]);
    }

    #[test]
    fn test_unknown_terms_score_zero() {
        let mut index = LexicalIndex::new();
        index.add("some text");
        assert_eq!(index.score_all("absent"), vec![0.0]);
    }
}
