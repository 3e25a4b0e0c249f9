//! CLI module for Kontekst.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Kontekst - Semantic Document Retrieval
///
/// A CLI tool for building a semantic chunk index over documents and
/// surfacing relevant passages live against a diarized transcript.
/// The name "Kontekst" comes from the Norwegian/Scandinavian word for "context."
#[derive(Parser, Debug)]
#[command(name = "kontekst")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Kontekst and verify configuration
    Init,

    /// Ingest a document into the index
    Ingest {
        /// Path to a plain-text or markdown document
        file: String,

        /// Document identifier (stable across re-ingestion)
        #[arg(long)]
        doc_id: String,

        /// Re-ingest even if the document is already indexed
        #[arg(short, long)]
        force: bool,
    },

    /// Search the index for relevant chunks
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Restrict results to one document
        #[arg(short, long)]
        doc: Option<String>,
    },

    /// Run the live context box over a transcript
    Context {
        /// Path to a diarized transcript JSON file
        transcript: String,

        /// Restrict retrieval to one document
        #[arg(short, long)]
        doc: Option<String>,

        /// Number of chunks to surface per segment
        #[arg(short = 'k', long, default_value = "3")]
        top_k: usize,

        /// Emit every segment's results, even when unchanged
        #[arg(long)]
        all: bool,

        /// Emit JSON lines instead of formatted output
        #[arg(long)]
        json: bool,
    },

    /// List ingested documents
    List,

    /// Delete a document's chunks from the index
    Delete {
        /// Document identifier to delete
        doc_id: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
