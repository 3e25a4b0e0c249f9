//! The live context retrieval loop.
//!
//! A [`RetrievalSession`] repeatedly surfaces the most relevant document
//! chunks as new transcript segments arrive. It remembers the identity of
//! the last surfaced result set so unchanged results can be suppressed
//! instead of re-emitted, and it isolates failures per segment so one bad
//! lookup never aborts the loop.

mod keywords;

pub use keywords::extract_keywords;

use crate::chunk_store::SearchResult;
use crate::error::Result;
use crate::index::DocumentIndex;
use crate::transcript::{Transcript, TranscriptSegment};
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-session retrieval options.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Number of chunks to surface per segment.
    pub top_k: usize,
    /// Restrict retrieval to one document.
    pub doc_id: Option<String>,
    /// Suppress re-emission when the surfaced set is unchanged.
    pub suppress_unchanged: bool,
    /// Maximum keywords to extract per segment.
    pub max_keywords: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            top_k: 3,
            doc_id: None,
            suppress_unchanged: true,
            max_keywords: 5,
        }
    }
}

/// Whether a segment's retrieval changed the surfaced context.
#[derive(Debug, Clone)]
pub enum ContextUpdate {
    /// A new or reordered result set to surface.
    Changed(Vec<SearchResult>),
    /// Identical to the previously surfaced set; emission suppressed.
    Unchanged,
}

/// The context produced for one transcript segment.
#[derive(Debug, Clone)]
pub struct SegmentContext {
    /// Keywords extracted from the segment text.
    pub keywords: Vec<String>,
    /// The retrieval outcome.
    pub update: ContextUpdate,
}

/// Outcome of one segment in a transcript run.
#[derive(Debug)]
pub struct SegmentReport {
    /// The segment that was processed.
    pub segment: TranscriptSegment,
    /// Its context, or the failure that was isolated.
    pub outcome: Result<SegmentContext>,
}

/// A live context retrieval session.
pub struct RetrievalSession {
    index: Arc<DocumentIndex>,
    options: SessionOptions,
    last_surfaced: Option<Vec<(String, usize)>>,
}

impl RetrievalSession {
    /// Create a new session over an index.
    pub fn new(index: Arc<DocumentIndex>, options: SessionOptions) -> Self {
        Self {
            index,
            options,
            last_surfaced: None,
        }
    }

    /// Process one segment of query text: extract keywords, retrieve the
    /// top-k chunks, and compare against the previously surfaced set.
    pub async fn on_segment(&mut self, text: &str) -> Result<SegmentContext> {
        let keywords = extract_keywords(text, self.options.max_keywords);

        let results = self
            .index
            .query(text, self.options.top_k, self.options.doc_id.as_deref())
            .await?;

        let identities: Vec<(String, usize)> = results
            .iter()
            .map(|r| (r.chunk.doc_id.clone(), r.chunk.chunk_index))
            .collect();

        let unchanged = self.last_surfaced.as_ref() == Some(&identities);
        self.last_surfaced = Some(identities);

        let update = if unchanged && self.options.suppress_unchanged {
            debug!("Surfaced set unchanged, suppressing emission");
            ContextUpdate::Unchanged
        } else {
            ContextUpdate::Changed(results)
        };

        Ok(SegmentContext { keywords, update })
    }

    /// Run the live loop over a whole transcript.
    ///
    /// Blank segments are skipped. A failing segment is recorded in its
    /// report and the loop continues with the next segment.
    pub async fn process_transcript(&mut self, transcript: &Transcript) -> Vec<SegmentReport> {
        let mut reports = Vec::with_capacity(transcript.segments.len());

        for segment in &transcript.segments {
            if segment.text.trim().is_empty() {
                continue;
            }

            let outcome = self.on_segment(&segment.text).await;
            if let Err(e) = &outcome {
                warn!(
                    "Context lookup failed for segment at {:.1}s: {}",
                    segment.start_seconds, e
                );
            }

            reports.push(SegmentReport {
                segment: segment.clone(),
                outcome,
            });
        }

        reports
    }
}
