//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::index::DocumentIndex;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let index = DocumentIndex::from_settings(&settings)?;

    match index.list_documents().await {
        Ok(documents) => {
            if documents.is_empty() {
                Output::info(
                    "No documents ingested yet. Use 'kontekst ingest <file> --doc-id <id>' to add one.",
                );
            } else {
                Output::header(&format!("Ingested Documents ({})", documents.len()));
                println!();

                for document in &documents {
                    Output::document_info(
                        &document.doc_id,
                        document.chunk_count,
                        &document.ingested_at.format("%Y-%m-%d %H:%M").to_string(),
                    );
                }

                let total_chunks: u32 = documents.iter().map(|d| d.chunk_count).sum();
                println!();
                Output::kv("Total documents", &documents.len().to_string());
                Output::kv("Total chunks", &total_chunks.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list documents: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
