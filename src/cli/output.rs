//! CLI output formatting utilities.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print document info.
    pub fn document_info(doc_id: &str, chunks: u32, ingested_at: &str) {
        println!(
            "  {} {} ({} chunks, ingested {})",
            style("*").cyan(),
            style(doc_id).bold(),
            chunks,
            style(ingested_at).dim()
        );
    }

    /// Print a search result.
    pub fn search_result(doc_id: &str, chunk_index: usize, score: f32, content: &str) {
        println!(
            "\n{} {} #{} (score: {:.2})",
            style(">>").green(),
            style(doc_id).bold(),
            chunk_index,
            score
        );
        println!("   {}", content_preview(content, 200));
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate content for single-result display.
pub fn content_preview(content: &str, max_chars: usize) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview_short() {
        assert_eq!(content_preview("  hello  ", 10), "hello");
    }

    #[test]
    fn test_content_preview_truncates() {
        let long = "x".repeat(300);
        let preview = content_preview(&long, 200);
        assert!(preview.ends_with("..."));
        assert!(preview.chars().count() <= 203);
    }
}
