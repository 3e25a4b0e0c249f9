//! Search command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::index::DocumentIndex;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    limit: usize,
    doc: Option<&str>,
    settings: Settings,
) -> Result<()> {
    let index = DocumentIndex::from_settings(&settings)?;

    let spinner = Output::spinner("Searching...");
    let results = index.query(query, limit, doc).await;
    spinner.finish_and_clear();

    match results {
        Ok(results) => {
            if results.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", results.len()));

                for result in &results {
                    Output::search_result(
                        &result.chunk.doc_id,
                        result.chunk.chunk_index,
                        result.score,
                        &result.chunk.content,
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(anyhow::anyhow!("{}", e));
        }
    }

    Ok(())
}
