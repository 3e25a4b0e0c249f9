//! Ingest command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::index::{read_document_text, DocumentIndex};
use anyhow::Result;
use std::path::Path;

/// Run the ingest command.
pub async fn run_ingest(file: &str, doc_id: &str, force: bool, settings: Settings) -> Result<()> {
    let index = DocumentIndex::from_settings(&settings)?;

    if !force && index.is_document_ingested(doc_id).await? {
        Output::warning(&format!(
            "Document '{}' is already ingested. Use --force to replace it.",
            doc_id
        ));
        return Ok(());
    }

    let text = read_document_text(Path::new(file))?;

    let spinner = Output::spinner("Chunking and embedding...");
    let result = index.ingest_document(doc_id, &text).await;
    spinner.finish_and_clear();

    match result {
        Ok(count) => {
            Output::success(&format!("Ingested {} chunks for '{}'", count, doc_id));
        }
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            return Err(anyhow::anyhow!("{}", e));
        }
    }

    Ok(())
}
