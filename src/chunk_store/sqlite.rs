//! SQLite-based chunk store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity.
//! For production use cases with large corpora, consider using the
//! sqlite-vec extension or a dedicated vector database.

use super::{
    cosine_similarity, rank_results, validate_top_k, ChunkRecord, ChunkStore, EmbeddedChunk,
    IndexedDocument, SearchResult,
};
use crate::error::{KontekstError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS document_chunks (
    doc_id TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (doc_id, chunk_index)
);

CREATE INDEX IF NOT EXISTS idx_document_chunks_doc_id ON document_chunks(doc_id);
"#;

/// SQLite-based chunk store.
///
/// The connection mutex plus a transaction per replacement gives mutual
/// exclusion on a document's chunk set: concurrent re-ingestions of the
/// same `doc_id` never interleave partial writes.
pub struct SqliteChunkStore {
    conn: Mutex<Connection>,
}

impl SqliteChunkStore {
    /// Create a new SQLite chunk store.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite chunk store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite chunk store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChunkRecord> {
        let chunk_index: i64 = row.get(1)?;
        let embedding_bytes: Vec<u8> = row.get(3)?;
        let created_at_str: String = row.get(4)?;

        Ok(ChunkRecord {
            doc_id: row.get(0)?,
            chunk_index: chunk_index as usize,
            content: row.get(2)?,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

#[async_trait]
impl ChunkStore for SqliteChunkStore {
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    async fn upsert_document(&self, doc_id: &str, chunks: &[EmbeddedChunk]) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| KontekstError::Store(format!("Failed to acquire lock: {}", e)))?;

        let tx = conn.unchecked_transaction()?;
        let now = Utc::now().to_rfc3339();

        // Replace the whole chunk set in one transaction so readers never
        // observe a partial document
        tx.execute(
            "DELETE FROM document_chunks WHERE doc_id = ?1",
            params![doc_id],
        )?;

        for (chunk_index, chunk) in chunks.iter().enumerate() {
            let embedding_bytes = Self::embedding_to_bytes(&chunk.embedding);

            tx.execute(
                r#"
                INSERT INTO document_chunks (doc_id, chunk_index, content, embedding, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    doc_id,
                    chunk_index as i64,
                    chunk.content,
                    embedding_bytes,
                    now,
                ],
            )?;
        }

        tx.commit()?;
        info!("Stored {} chunks for document {}", chunks.len(), doc_id);
        Ok(chunks.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn query(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filter_doc_id: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        validate_top_k(top_k)?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| KontekstError::Store(format!("Failed to acquire lock: {}", e)))?;

        let base = "SELECT doc_id, chunk_index, content, embedding, created_at FROM document_chunks";

        let records: Vec<ChunkRecord> = match filter_doc_id {
            Some(filter) => {
                let mut stmt = conn.prepare(&format!("{} WHERE doc_id = ?1", base))?;
                let rows = stmt.query_map(params![filter], Self::row_to_record)?;
                rows.filter_map(|r| r.ok()).collect()
            }
            None => {
                let mut stmt = conn.prepare(base)?;
                let rows = stmt.query_map([], Self::row_to_record)?;
                rows.filter_map(|r| r.ok()).collect()
            }
        };

        let results: Vec<SearchResult> = records
            .into_iter()
            .map(|record| {
                let score = cosine_similarity(query_embedding, &record.embedding);
                SearchResult {
                    chunk: record,
                    score,
                }
            })
            .collect();

        let ranked = rank_results(results, top_k);
        debug!("Found {} matching chunks", ranked.len());
        Ok(ranked)
    }

    #[instrument(skip(self))]
    async fn delete_document(&self, doc_id: &str) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| KontekstError::Store(format!("Failed to acquire lock: {}", e)))?;

        let deleted = conn.execute(
            "DELETE FROM document_chunks WHERE doc_id = ?1",
            params![doc_id],
        )?;

        info!("Deleted {} chunks for document {}", deleted, doc_id);
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn list_documents(&self) -> Result<Vec<IndexedDocument>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| KontekstError::Store(format!("Failed to acquire lock: {}", e)))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT doc_id, COUNT(*) as chunk_count, MAX(created_at) as ingested_at
            FROM document_chunks
            GROUP BY doc_id
            ORDER BY ingested_at DESC, doc_id ASC
            "#,
        )?;

        let documents = stmt.query_map([], |row| {
            let ingested_at_str: String = row.get(2)?;
            Ok(IndexedDocument {
                doc_id: row.get(0)?,
                chunk_count: row.get(1)?,
                ingested_at: DateTime::parse_from_rfc3339(&ingested_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;

        let result: Vec<IndexedDocument> = documents.filter_map(|d| d.ok()).collect();
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn get_document(&self, doc_id: &str) -> Result<Option<IndexedDocument>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| KontekstError::Store(format!("Failed to acquire lock: {}", e)))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT doc_id, COUNT(*) as chunk_count, MAX(created_at) as ingested_at
            FROM document_chunks
            WHERE doc_id = ?1
            GROUP BY doc_id
            "#,
        )?;

        let document = stmt.query_row(params![doc_id], |row| {
            let ingested_at_str: String = row.get(2)?;
            Ok(IndexedDocument {
                doc_id: row.get(0)?,
                chunk_count: row.get(1)?,
                ingested_at: DateTime::parse_from_rfc3339(&ingested_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        });

        match document {
            Ok(d) => Ok(Some(d)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn is_document_ingested(&self, doc_id: &str) -> Result<bool> {
        let document = self.get_document(doc_id).await?;
        Ok(document.is_some())
    }

    #[instrument(skip(self))]
    async fn get_chunks(&self, doc_id: &str) -> Result<Vec<ChunkRecord>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| KontekstError::Store(format!("Failed to acquire lock: {}", e)))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT doc_id, chunk_index, content, embedding, created_at
            FROM document_chunks
            WHERE doc_id = ?1
            ORDER BY chunk_index
            "#,
        )?;

        let rows = stmt.query_map(params![doc_id], Self::row_to_record)?;
        let result: Vec<ChunkRecord> = rows.filter_map(|r| r.ok()).collect();
        debug!("Found {} chunks for document {}", result.len(), doc_id);
        Ok(result)
    }

    async fn chunk_count(&self) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| KontekstError::Store(format!("Failed to acquire lock: {}", e)))?;

        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM document_chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::Arc;

    fn embedded(content: &str, embedding: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk {
            content: content.to_string(),
            embedding,
        }
    }

    #[tokio::test]
    async fn test_sqlite_chunk_store() {
        let store = SqliteChunkStore::in_memory().unwrap();

        store
            .upsert_document(
                "doc1",
                &[
                    embedded("This is test content", vec![1.0, 0.0, 0.0]),
                    embedded("More test content", vec![0.0, 1.0, 0.0]),
                ],
            )
            .await
            .unwrap();

        let documents = store.list_documents().await.unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].doc_id, "doc1");
        assert_eq!(documents[0].chunk_count, 2);

        let results = store.query(&[1.0, 0.0, 0.0], 10, None).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!((results[0].score - 1.0).abs() < 0.001);

        let deleted = store.delete_document("doc1").await.unwrap();
        assert_eq!(deleted, 2);
        assert!(store.list_documents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_embedding_roundtrip() {
        let store = SqliteChunkStore::in_memory().unwrap();
        let embedding = vec![0.25, -1.5, 3.75, 0.0];

        store
            .upsert_document("doc1", &[embedded("content", embedding.clone())])
            .await
            .unwrap();

        let chunks = store.get_chunks("doc1").await.unwrap();
        assert_eq!(chunks[0].embedding, embedding);
    }

    #[tokio::test]
    async fn test_reingest_replaces_atomically() {
        let store = SqliteChunkStore::in_memory().unwrap();

        store
            .upsert_document(
                "doc1",
                &[
                    embedded("old a", vec![1.0, 0.0]),
                    embedded("old b", vec![0.0, 1.0]),
                    embedded("old c", vec![1.0, 1.0]),
                ],
            )
            .await
            .unwrap();

        store
            .upsert_document(
                "doc1",
                &[
                    embedded("new a", vec![1.0, 0.0]),
                    embedded("new b", vec![0.0, 1.0]),
                ],
            )
            .await
            .unwrap();

        let chunks = store.get_chunks("doc1").await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.content.starts_with("new")));
        assert_eq!(
            chunks.iter().map(|c| c.chunk_index).collect::<Vec<_>>(),
            vec![0, 1]
        );
    }

    #[tokio::test]
    async fn test_query_validates_top_k() {
        let store = SqliteChunkStore::in_memory().unwrap();
        let err = store.query(&[1.0], 0, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_query_filter_and_ordering() {
        let store = SqliteChunkStore::in_memory().unwrap();

        store
            .upsert_document(
                "alpha",
                &[
                    embedded("exact", vec![1.0, 0.0]),
                    embedded("orthogonal", vec![0.0, 1.0]),
                ],
            )
            .await
            .unwrap();
        store
            .upsert_document("beta", &[embedded("close", vec![0.9, 0.1])])
            .await
            .unwrap();

        let results = store.query(&[1.0, 0.0], 10, None).await.unwrap();
        assert_eq!(results.len(), 3);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(results[0].chunk.doc_id, "alpha");
        assert_eq!(results[1].chunk.doc_id, "beta");

        let filtered = store.query(&[1.0, 0.0], 10, Some("beta")).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].chunk.doc_id, "beta");
    }

    #[tokio::test]
    async fn test_concurrent_reingest_never_interleaves() {
        let store = Arc::new(SqliteChunkStore::in_memory().unwrap());

        let set_a: Vec<EmbeddedChunk> = (0..8)
            .map(|i| embedded(&format!("a{}", i), vec![1.0, i as f32]))
            .collect();
        let set_b: Vec<EmbeddedChunk> = (0..5)
            .map(|i| embedded(&format!("b{}", i), vec![0.0, i as f32]))
            .collect();

        let store_a = store.clone();
        let store_b = store.clone();
        let chunks_a = set_a.clone();
        let chunks_b = set_b.clone();

        let (ra, rb) = tokio::join!(
            tokio::spawn(async move { store_a.upsert_document("doc", &chunks_a).await }),
            tokio::spawn(async move { store_b.upsert_document("doc", &chunks_b).await }),
        );
        ra.unwrap().unwrap();
        rb.unwrap().unwrap();

        // Final state is exactly one submitted set, never a mix
        let stored = store.get_chunks("doc").await.unwrap();
        let contents: Vec<&str> = stored.iter().map(|c| c.content.as_str()).collect();

        let all_a = stored.len() == set_a.len()
            && contents.iter().all(|c| c.starts_with('a'));
        let all_b = stored.len() == set_b.len()
            && contents.iter().all(|c| c.starts_with('b'));
        assert!(all_a || all_b, "stored state mixes both submissions: {:?}", contents);
    }

    #[tokio::test]
    async fn test_on_disk_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunks.db");

        {
            let store = SqliteChunkStore::new(&path).unwrap();
            store
                .upsert_document("doc1", &[embedded("persisted", vec![1.0, 0.0])])
                .await
                .unwrap();
        }

        let reopened = SqliteChunkStore::new(&path).unwrap();
        assert!(reopened.is_document_ingested("doc1").await.unwrap());
        assert_eq!(reopened.chunk_count().await.unwrap(), 1);
    }
}
