//! In-memory chunk store implementation.
//!
//! Useful for testing and small corpora. The map is keyed by document, so
//! replacing a document's chunk set is a single write under the lock.

use super::{
    cosine_similarity, rank_results, validate_top_k, ChunkRecord, ChunkStore, EmbeddedChunk,
    IndexedDocument, SearchResult,
};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory chunk store.
pub struct MemoryChunkStore {
    documents: RwLock<HashMap<String, Vec<ChunkRecord>>>,
}

impl MemoryChunkStore {
    /// Create a new in-memory chunk store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryChunkStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChunkStore for MemoryChunkStore {
    async fn upsert_document(&self, doc_id: &str, chunks: &[EmbeddedChunk]) -> Result<usize> {
        let now = Utc::now();
        let records: Vec<ChunkRecord> = chunks
            .iter()
            .enumerate()
            .map(|(chunk_index, chunk)| ChunkRecord {
                doc_id: doc_id.to_string(),
                chunk_index,
                content: chunk.content.clone(),
                embedding: chunk.embedding.clone(),
                created_at: now,
            })
            .collect();

        let mut docs = self.documents.write().unwrap();
        docs.insert(doc_id.to_string(), records);
        Ok(chunks.len())
    }

    async fn query(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filter_doc_id: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        validate_top_k(top_k)?;

        let docs = self.documents.read().unwrap();

        let results: Vec<SearchResult> = docs
            .iter()
            .filter(|(doc_id, _)| filter_doc_id.map_or(true, |f| f == doc_id.as_str()))
            .flat_map(|(_, records)| records.iter())
            .map(|record| SearchResult {
                chunk: record.clone(),
                score: cosine_similarity(query_embedding, &record.embedding),
            })
            .collect();

        Ok(rank_results(results, top_k))
    }

    async fn delete_document(&self, doc_id: &str) -> Result<usize> {
        let mut docs = self.documents.write().unwrap();
        Ok(docs.remove(doc_id).map(|records| records.len()).unwrap_or(0))
    }

    async fn list_documents(&self) -> Result<Vec<IndexedDocument>> {
        let docs = self.documents.read().unwrap();

        let mut documents: Vec<IndexedDocument> = docs
            .iter()
            .map(|(doc_id, records)| IndexedDocument {
                doc_id: doc_id.clone(),
                chunk_count: records.len() as u32,
                ingested_at: records
                    .iter()
                    .map(|r| r.created_at)
                    .max()
                    .unwrap_or_else(Utc::now),
            })
            .collect();

        documents.sort_by(|a, b| {
            b.ingested_at
                .cmp(&a.ingested_at)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });

        Ok(documents)
    }

    async fn get_document(&self, doc_id: &str) -> Result<Option<IndexedDocument>> {
        let documents = self.list_documents().await?;
        Ok(documents.into_iter().find(|d| d.doc_id == doc_id))
    }

    async fn is_document_ingested(&self, doc_id: &str) -> Result<bool> {
        let docs = self.documents.read().unwrap();
        Ok(docs.contains_key(doc_id))
    }

    async fn get_chunks(&self, doc_id: &str) -> Result<Vec<ChunkRecord>> {
        let docs = self.documents.read().unwrap();
        let mut records = docs.get(doc_id).cloned().unwrap_or_default();
        records.sort_by_key(|r| r.chunk_index);
        Ok(records)
    }

    async fn chunk_count(&self) -> Result<usize> {
        let docs = self.documents.read().unwrap();
        Ok(docs.values().map(|records| records.len()).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn embedded(content: &str, embedding: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk {
            content: content.to_string(),
            embedding,
        }
    }

    #[tokio::test]
    async fn test_memory_chunk_store() {
        let store = MemoryChunkStore::new();

        store
            .upsert_document(
                "doc1",
                &[
                    embedded("Hello world", vec![1.0, 0.0, 0.0]),
                    embedded("Goodbye world", vec![0.0, 1.0, 0.0]),
                ],
            )
            .await
            .unwrap();

        assert_eq!(store.chunk_count().await.unwrap(), 2);

        let results = store.query(&[1.0, 0.0, 0.0], 10, None).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score > results[1].score);
        assert_eq!(results[0].chunk.chunk_index, 0);

        let documents = store.list_documents().await.unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].chunk_count, 2);
    }

    #[tokio::test]
    async fn test_upsert_replaces_prior_chunks() {
        let store = MemoryChunkStore::new();

        store
            .upsert_document(
                "doc1",
                &[
                    embedded("old a", vec![1.0, 0.0]),
                    embedded("old b", vec![0.0, 1.0]),
                ],
            )
            .await
            .unwrap();

        store
            .upsert_document("doc1", &[embedded("new", vec![1.0, 1.0])])
            .await
            .unwrap();

        let chunks = store.get_chunks("doc1").await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "new");
        assert_eq!(chunks[0].chunk_index, 0);

        // Nothing from the prior generation is queryable
        let results = store.query(&[1.0, 0.0], 10, None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.content, "new");
    }

    #[tokio::test]
    async fn test_query_top_k_bounds() {
        let store = MemoryChunkStore::new();
        store
            .upsert_document("doc1", &[embedded("only", vec![1.0, 0.0])])
            .await
            .unwrap();

        // Fewer than top_k stored: all available, not an error
        let results = store.query(&[1.0, 0.0], 3, None).await.unwrap();
        assert_eq!(results.len(), 1);

        let err = store.query(&[1.0, 0.0], 0, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_query_filter_restricts_to_document() {
        let store = MemoryChunkStore::new();
        store
            .upsert_document("doc1", &[embedded("one", vec![1.0, 0.0])])
            .await
            .unwrap();
        store
            .upsert_document("doc2", &[embedded("two", vec![1.0, 0.0])])
            .await
            .unwrap();

        let results = store
            .query(&[1.0, 0.0], 10, Some("doc2"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results.iter().all(|r| r.chunk.doc_id == "doc2"));
    }

    #[tokio::test]
    async fn test_delete_document_noop_when_absent() {
        let store = MemoryChunkStore::new();
        assert_eq!(store.delete_document("nope").await.unwrap(), 0);

        store
            .upsert_document("doc1", &[embedded("one", vec![1.0])])
            .await
            .unwrap();
        assert_eq!(store.delete_document("doc1").await.unwrap(), 1);
        assert!(!store.is_document_ingested("doc1").await.unwrap());
    }
}
