//! Delete command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::index::DocumentIndex;
use anyhow::Result;

/// Run the delete command.
pub async fn run_delete(doc_id: &str, settings: Settings) -> Result<()> {
    let index = DocumentIndex::from_settings(&settings)?;

    match index.delete_document(doc_id).await {
        Ok(0) => {
            Output::info(&format!("No chunks stored for '{}'", doc_id));
        }
        Ok(count) => {
            Output::success(&format!("Deleted {} chunks for '{}'", count, doc_id));
        }
        Err(e) => {
            Output::error(&format!("Delete failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
