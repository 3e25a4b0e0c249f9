//! Kontekst - Semantic Document Retrieval
//!
//! A CLI tool for building a semantic chunk index over documents and
//! surfacing the most relevant passages as a conversation unfolds.
//!
//! The name "Kontekst" comes from the Norwegian/Scandinavian word for "context."
//!
//! # Overview
//!
//! Kontekst allows you to:
//! - Ingest documents into a searchable vector index (chunk, embed, store)
//! - Query the index for the top-k most similar chunks
//! - Run a live "context box" over a diarized transcript, surfacing the
//!   relevant document passages for each spoken segment
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `chunking` - Deterministic word-window chunking
//! - `embedding` - Embedding generation
//! - `chunk_store` - Chunk persistence and similarity query
//! - `index` - Document ingestion and query coordination
//! - `session` - The live context retrieval loop
//! - `transcript` - Diarized transcript input model
//! - `retry` - Bounded backoff for transient failures
//!
//! # Example
//!
//! ```rust,no_run
//! use kontekst::config::Settings;
//! use kontekst::index::DocumentIndex;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let index = DocumentIndex::from_settings(&settings)?;
//!
//!     let count = index.ingest_document("briefing", "Some document text.").await?;
//!     println!("Ingested {} chunks", count);
//!
//!     let results = index.query("what was agreed?", 3, Some("briefing")).await?;
//!     for result in results {
//!         println!("[{:.2}] {}", result.score, result.chunk.content);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod chunk_store;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod openai;
pub mod retry;
pub mod session;
pub mod transcript;

pub use error::{KontekstError, Result};
