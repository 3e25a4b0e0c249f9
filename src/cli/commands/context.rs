//! Context command implementation - the live context box.

use crate::cli::Output;
use crate::config::Settings;
use crate::index::DocumentIndex;
use crate::session::{ContextUpdate, RetrievalSession, SessionOptions};
use crate::transcript::{format_timestamp, Transcript, TranscriptSegment};
use anyhow::Result;
use console::style;
use std::path::Path;
use std::sync::Arc;

/// Run the context command over a transcript file.
pub async fn run_context(
    transcript_path: &str,
    doc: Option<&str>,
    top_k: usize,
    all: bool,
    json: bool,
    settings: Settings,
) -> Result<()> {
    let transcript = Transcript::load(Path::new(transcript_path))?;

    let index = Arc::new(DocumentIndex::from_settings(&settings)?);
    let options = SessionOptions {
        top_k,
        doc_id: doc.map(|d| d.to_string()),
        suppress_unchanged: settings.session.suppress_unchanged && !all,
        max_keywords: settings.session.max_keywords,
    };
    let mut session = RetrievalSession::new(index, options);

    let mut failures = 0usize;

    for segment in &transcript.segments {
        if segment.text.trim().is_empty() {
            continue;
        }

        // Per-segment failure isolation: report and keep going
        match session.on_segment(&segment.text).await {
            Ok(context) => {
                if json {
                    println!("{}", segment_json(segment, &context.keywords, &context.update));
                } else {
                    print_segment(segment, &context.keywords, &context.update);
                }
            }
            Err(e) => {
                failures += 1;
                Output::warning(&format!(
                    "Segment at {} failed: {}",
                    format_timestamp(segment.start_seconds),
                    e
                ));
            }
        }
    }

    if failures > 0 {
        Output::warning(&format!("{} segments failed", failures));
    }

    Ok(())
}

/// One JSON line per segment, mirroring the transcript wire format.
fn segment_json(
    segment: &TranscriptSegment,
    keywords: &[String],
    update: &ContextUpdate,
) -> String {
    let matches = match update {
        ContextUpdate::Changed(results) => serde_json::json!(results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "doc_id": r.chunk.doc_id,
                    "chunk_index": r.chunk.chunk_index,
                    "content": r.chunk.content,
                    "similarity": r.score,
                })
            })
            .collect::<Vec<_>>()),
        ContextUpdate::Unchanged => serde_json::Value::Null,
    };

    serde_json::json!({
        "segment": {
            "start": segment.start_seconds,
            "end": segment.end_seconds,
            "speaker": segment.speaker,
            "text": segment.text,
        },
        "keywords": keywords,
        "unchanged": matches!(update, ContextUpdate::Unchanged),
        "context_matches": matches,
    })
    .to_string()
}

fn print_segment(segment: &TranscriptSegment, keywords: &[String], update: &ContextUpdate) {
    let speaker = segment.speaker.as_deref().unwrap_or("?");
    println!(
        "\n[{} - {}] {}",
        format_timestamp(segment.start_seconds),
        format_timestamp(segment.end_seconds),
        style(speaker).bold()
    );
    println!("  {}", segment.text.trim());

    if !keywords.is_empty() {
        Output::kv("keywords", &keywords.join(", "));
    }

    match update {
        ContextUpdate::Changed(results) if results.is_empty() => {
            Output::kv("context", "no matching chunks");
        }
        ContextUpdate::Changed(results) => {
            for result in results {
                Output::search_result(
                    &result.chunk.doc_id,
                    result.chunk.chunk_index,
                    result.score,
                    &result.chunk.content,
                );
            }
        }
        ContextUpdate::Unchanged => {
            Output::kv("context", "unchanged");
        }
    }
}
