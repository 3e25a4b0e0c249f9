//! Chunk store abstraction for Kontekst.
//!
//! Provides a trait-based interface for chunk persistence backends with
//! similarity-ranked retrieval.

mod memory;
mod sqlite;

pub use memory::MemoryChunkStore;
pub use sqlite::SqliteChunkStore;

use crate::error::{KontekstError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chunk awaiting storage: content paired with its embedding.
///
/// The store assigns `chunk_index` by position within the submitted set.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    /// Text content of this chunk.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

/// A persisted chunk of a document.
///
/// `(doc_id, chunk_index)` is the unique key; records are immutable once
/// stored and replaced only as a whole set per document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Identifier of the owning document.
    pub doc_id: String,
    /// Zero-based position of this chunk within the document.
    pub chunk_index: usize,
    /// Text content of this chunk.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// When this chunk was ingested.
    pub created_at: DateTime<Utc>,
}

impl ChunkRecord {
    /// Create a new chunk record stamped with the current time.
    pub fn new(doc_id: String, chunk_index: usize, content: String, embedding: Vec<f32>) -> Self {
        Self {
            doc_id,
            chunk_index,
            content,
            embedding,
            created_at: Utc::now(),
        }
    }

}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk.
    pub chunk: ChunkRecord,
    /// Cosine similarity to the query (higher is better).
    pub score: f32,
}

/// Summary information about an ingested document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedDocument {
    /// Document ID.
    pub doc_id: String,
    /// Number of stored chunks.
    pub chunk_count: u32,
    /// When the document was (last) ingested.
    pub ingested_at: DateTime<Utc>,
}

/// Trait for chunk store implementations.
///
/// Callers supply chunks with non-empty content and embeddings of the
/// index's configured dimension; the store treats them as opaque.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Atomically replace all chunks for a document with the given set,
    /// assigning `chunk_index` by position. On failure the prior state
    /// stays intact.
    async fn upsert_document(&self, doc_id: &str, chunks: &[EmbeddedChunk]) -> Result<usize>;

    /// Return the `top_k` chunks most similar to the query embedding,
    /// across all documents or restricted to `filter_doc_id`.
    ///
    /// Results are ranked by descending cosine similarity with ties broken
    /// by `(doc_id, chunk_index)` ascending. Fewer than `top_k` stored
    /// chunks is not an error; `top_k == 0` is.
    async fn query(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filter_doc_id: Option<&str>,
    ) -> Result<Vec<SearchResult>>;

    /// Remove all chunks for a document. No-op if the id is absent.
    async fn delete_document(&self, doc_id: &str) -> Result<usize>;

    /// List all ingested documents.
    async fn list_documents(&self) -> Result<Vec<IndexedDocument>>;

    /// Get a specific document's summary.
    async fn get_document(&self, doc_id: &str) -> Result<Option<IndexedDocument>>;

    /// Check if a document is ingested.
    async fn is_document_ingested(&self, doc_id: &str) -> Result<bool>;

    /// Get all chunks for a document, ordered by `chunk_index`.
    async fn get_chunks(&self, doc_id: &str) -> Result<Vec<ChunkRecord>>;

    /// Get total chunk count across all documents.
    async fn chunk_count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Reject a zero `top_k` before any work is done.
pub(crate) fn validate_top_k(top_k: usize) -> Result<()> {
    if top_k == 0 {
        return Err(KontekstError::InvalidArgument(
            "top_k must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Rank scored results: descending similarity, ties broken by
/// `(doc_id, chunk_index)` ascending, truncated to `top_k`.
pub(crate) fn rank_results(mut results: Vec<SearchResult>, top_k: usize) -> Vec<SearchResult> {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk.doc_id.cmp(&b.chunk.doc_id))
            .then_with(|| a.chunk.chunk_index.cmp(&b.chunk.chunk_index))
    });
    results.truncate(top_k);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_rank_tie_break() {
        let make = |doc_id: &str, chunk_index: usize| SearchResult {
            chunk: ChunkRecord::new(
                doc_id.to_string(),
                chunk_index,
                "text".to_string(),
                vec![1.0, 0.0],
            ),
            score: 0.5,
        };

        // All scores equal: order falls back to (doc_id, chunk_index)
        let ranked = rank_results(vec![make("b", 0), make("a", 1), make("a", 0)], 10);
        let keys: Vec<(String, usize)> = ranked
            .iter()
            .map(|r| (r.chunk.doc_id.clone(), r.chunk.chunk_index))
            .collect();

        assert_eq!(
            keys,
            vec![
                ("a".to_string(), 0),
                ("a".to_string(), 1),
                ("b".to_string(), 0)
            ]
        );
    }

    #[test]
    fn test_rank_truncates_to_top_k() {
        let results: Vec<SearchResult> = (0..5)
            .map(|i| SearchResult {
                chunk: ChunkRecord::new("doc".to_string(), i, "text".to_string(), vec![1.0]),
                score: i as f32 * 0.1,
            })
            .collect();

        let ranked = rank_results(results, 2);
        assert_eq!(ranked.len(), 2);
        assert!(ranked[0].score >= ranked[1].score);
    }
}
