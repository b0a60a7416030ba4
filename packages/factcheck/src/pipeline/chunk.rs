//! Sentence-preserving text chunking for long evidence.

use crate::types::config::ChunkConfig;
use crate::types::document::{Document, META_CHUNK};

/// Split text into sentences at `.`, `!` or `?` followed by whitespace.
///
/// Terminal punctuation stays with its sentence; the separating whitespace
/// is dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let end = i + c.len_utf8();
        match chars.peek() {
            Some((_, next)) if next.is_whitespace() => {}
            _ => continue,
        }

        sentences.push(&text[start..end]);
        while let Some((_, next)) = chars.peek() {
            if !next.is_whitespace() {
                break;
            }
            chars.next();
        }
        start = chars.peek().map(|(j, _)| *j).unwrap_or(text.len());
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

/// Chunk text into pieces of at most `max_chunk_size` bytes.
///
/// Sentences are never split, so a single sentence longer than the limit
/// becomes its own oversized chunk. Each new chunk starts with the trailing
/// sentences of the previous one that fit within `max_overlap`.
pub fn chunk_text(text: &str, max_chunk_size: usize, max_overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0;

    for sentence in split_sentences(text) {
        if current.is_empty() || current_len + sentence.len() + 1 <= max_chunk_size {
            current_len += sentence.len() + usize::from(!current.is_empty());
            current.push(sentence);
            continue;
        }

        chunks.push(current.join(" "));

        let mut overlap: Vec<&str> = Vec::new();
        let mut overlap_len = 0;
        for s in current.iter().rev() {
            if overlap_len + s.len() + 1 > max_overlap {
                break;
            }
            overlap_len += s.len() + 1;
            overlap.insert(0, *s);
        }
        while !overlap.is_empty() && overlap_len + sentence.len() > max_chunk_size {
            overlap_len -= overlap.remove(0).len() + 1;
        }

        current = overlap;
        current.push(sentence);
        current_len = current.iter().map(|s| s.len()).sum::<usize>() + current.len() - 1;
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }
    chunks
}

/// Split a document into chunk documents carrying its metadata plus a
/// `chunk` index. Documents that fit in one chunk are returned unchanged.
pub fn chunk_document(document: Document, config: &ChunkConfig) -> Vec<Document> {
    let chunks = chunk_text(&document.content, config.max_chunk_size, config.max_overlap);
    if chunks.len() <= 1 {
        return vec![document];
    }

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            Document::with_metadata_map(chunk, document.metadata.clone())
                .with_metadata(META_CHUNK, i.to_string())
        })
        .collect()
}
