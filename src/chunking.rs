//! Document chunking.
//!
//! Splits raw document text into bounded, overlapping word windows.
//! Chunking is a pure function of the input text and the chunker
//! configuration, which keeps re-ingestion idempotent.

use crate::error::{KontekstError, Result};

/// Configuration for the word-window chunker.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Target chunk size in words.
    pub target_words: usize,
    /// Fraction of the target shared between adjacent chunks (0.0 <= f < 1.0).
    pub overlap_fraction: f64,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            target_words: 500,
            overlap_fraction: 0.1,
        }
    }
}

/// Word-window chunker.
///
/// Splits on whitespace and emits windows of up to `target_words` words,
/// where adjacent windows share a trailing/leading overlap.
#[derive(Debug)]
pub struct TextChunker {
    config: ChunkerConfig,
}

impl TextChunker {
    /// Create a chunker, validating the configuration.
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        if config.target_words == 0 {
            return Err(KontekstError::InvalidArgument(
                "chunk target size must be at least 1 word".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&config.overlap_fraction) {
            return Err(KontekstError::InvalidArgument(format!(
                "overlap fraction must be in [0, 1), got {}",
                config.overlap_fraction
            )));
        }
        Ok(Self { config })
    }

    /// Overlap between adjacent chunks, in words.
    pub fn overlap_words(&self) -> usize {
        (self.config.overlap_fraction * self.config.target_words as f64).floor() as usize
    }

    /// Split text into an ordered sequence of chunk strings.
    ///
    /// Documents shorter than the target produce exactly one chunk.
    /// Empty or whitespace-only input is rejected.
    pub fn chunk(&self, text: &str) -> Result<Vec<String>> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Err(KontekstError::InvalidDocument(
                "document is empty or whitespace-only".to_string(),
            ));
        }

        let target = self.config.target_words;
        // overlap_fraction < 1 guarantees the window always advances
        let step = target - self.overlap_words();

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < words.len() {
            let end = (start + target).min(words.len());
            chunks.push(words[start..end].join(" "));
            if end == words.len() {
                break;
            }
            start += step;
        }

        Ok(chunks)
    }
}
