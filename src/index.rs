//! Document index coordination.
//!
//! Ties the chunker, embedder, and chunk store together behind the two
//! boundary operations: ingest a document and query for relevant chunks.

use crate::chunk_store::{
    ChunkStore, EmbeddedChunk, IndexedDocument, MemoryChunkStore, SearchResult, SqliteChunkStore,
};
use crate::chunking::{ChunkerConfig, TextChunker};
use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{KontekstError, Result};
use crate::retry::{with_retry, RetryPolicy};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Configuration for a [`DocumentIndex`].
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Chunker parameters.
    pub chunker: ChunkerConfig,
    /// Retry budget for transient embedding/store failures.
    pub retry: RetryPolicy,
    /// Per-phase timeout for ingestion (embedding phase, storage phase).
    pub phase_timeout: Duration,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            retry: RetryPolicy::default(),
            phase_timeout: Duration::from_secs(120),
        }
    }
}

/// The semantic chunk index.
///
/// Owns chunking and coordinates the embedder and chunk store; both are
/// injected so tests can swap in stubs and in-memory backends.
pub struct DocumentIndex {
    chunker: TextChunker,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn ChunkStore>,
    retry: RetryPolicy,
    phase_timeout: Duration,
}

impl DocumentIndex {
    /// Create an index from injected components.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn ChunkStore>,
        config: IndexConfig,
    ) -> Result<Self> {
        Ok(Self {
            chunker: TextChunker::new(config.chunker)?,
            embedder,
            store,
            retry: config.retry,
            phase_timeout: config.phase_timeout,
        })
    }

    /// Create an index from settings, wiring up the configured backends.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let embedder = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        let store: Arc<dyn ChunkStore> = match settings.store.provider.as_str() {
            "sqlite" => Arc::new(SqliteChunkStore::new(&settings.sqlite_path())?),
            "memory" => Arc::new(MemoryChunkStore::new()),
            other => {
                return Err(KontekstError::Config(format!(
                    "unknown store provider: {}",
                    other
                )))
            }
        };

        let config = IndexConfig {
            chunker: ChunkerConfig {
                target_words: settings.chunking.target_words,
                overlap_fraction: settings.chunking.overlap_fraction,
            },
            retry: RetryPolicy {
                max_retries: settings.retry.max_retries,
                backoff: Duration::from_millis(settings.retry.backoff_ms),
            },
            phase_timeout: Duration::from_secs(settings.ingestion.timeout_seconds),
        };

        Self::new(embedder, store, config)
    }

    /// Get a reference to the chunk store.
    pub fn store(&self) -> Arc<dyn ChunkStore> {
        self.store.clone()
    }

    /// Get a reference to the embedder.
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Ingest a document: chunk, embed, and atomically replace its stored
    /// chunk set. Returns the number of chunks stored.
    #[instrument(skip(self, raw_text), fields(doc_id = %doc_id))]
    pub async fn ingest_document(&self, doc_id: &str, raw_text: &str) -> Result<usize> {
        if doc_id.trim().is_empty() {
            return Err(KontekstError::InvalidArgument(
                "doc_id must not be empty".to_string(),
            ));
        }

        let chunks = self.chunker.chunk(raw_text)?;
        debug!("Split document into {} chunks", chunks.len());

        let embeddings = match tokio::time::timeout(
            self.phase_timeout,
            with_retry(&self.retry, "chunk embedding", || {
                self.embedder.embed_batch(&chunks)
            }),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(KontekstError::Embedding(format!(
                    "embedding phase timed out after {}s",
                    self.phase_timeout.as_secs()
                )))
            }
        };

        // Dimension invariant: chunks are never stored with a missing or
        // mis-sized embedding
        let dimensions = self.embedder.dimensions();
        if embeddings.len() != chunks.len() {
            return Err(KontekstError::Embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimensions) {
            return Err(KontekstError::Embedding(format!(
                "embedding dimension mismatch: expected {}, got {}",
                dimensions,
                bad.len()
            )));
        }

        let embedded: Vec<EmbeddedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(content, embedding)| EmbeddedChunk { content, embedding })
            .collect();

        let count = match tokio::time::timeout(
            self.phase_timeout,
            with_retry(&self.retry, "chunk storage", || {
                self.store.upsert_document(doc_id, &embedded)
            }),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(KontekstError::Store(format!(
                    "storage phase timed out after {}s",
                    self.phase_timeout.as_secs()
                )))
            }
        };

        info!("Ingested {} chunks for document {}", count, doc_id);
        Ok(count)
    }

    /// Query for the top-k chunks most relevant to the given text.
    #[instrument(skip(self, query_text), fields(top_k = top_k))]
    pub async fn query(
        &self,
        query_text: &str,
        top_k: usize,
        filter_doc_id: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(KontekstError::InvalidArgument(
                "top_k must be at least 1".to_string(),
            ));
        }
        if query_text.trim().is_empty() {
            return Err(KontekstError::InvalidDocument(
                "query text is empty".to_string(),
            ));
        }

        let embedding = with_retry(&self.retry, "query embedding", || {
            self.embedder.embed(query_text)
        })
        .await?;

        with_retry(&self.retry, "store query", || {
            self.store.query(&embedding, top_k, filter_doc_id)
        })
        .await
    }

    /// Remove all chunks for a document.
    pub async fn delete_document(&self, doc_id: &str) -> Result<usize> {
        self.store.delete_document(doc_id).await
    }

    /// List all ingested documents.
    pub async fn list_documents(&self) -> Result<Vec<IndexedDocument>> {
        self.store.list_documents().await
    }

    /// Check if a document is ingested.
    pub async fn is_document_ingested(&self, doc_id: &str) -> Result<bool> {
        self.store.is_document_ingested(doc_id).await
    }
}

/// Read a document file's text for ingestion.
///
/// Plain-text formats only; anything else is rejected rather than
/// silently mis-chunked.
pub fn read_document_text(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "md" | "markdown" | "text" => std::fs::read_to_string(path).map_err(|e| {
            KontekstError::InvalidDocument(format!("cannot read {}: {}", path.display(), e))
        }),
        other => Err(KontekstError::InvalidDocument(format!(
            "unsupported document type '{}' (expected txt or markdown): {}",
            other,
            path.display()
        ))),
    }
}
