//! Error types for Kontekst.

use thiserror::Error;

/// Library-level error type for Kontekst operations.
#[derive(Error, Debug)]
pub enum KontekstError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Chunk store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),
}

/// The failure kinds every error maps onto.
///
/// Callers route on the kind: invalid input is surfaced immediately, while
/// embedding/store failures are candidates for bounded retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Empty or malformed document/transcript input.
    InvalidDocument,
    /// Bad caller-supplied parameter (top_k, overlap fraction, config).
    InvalidArgument,
    /// The embedding provider failed or is unreachable.
    EmbeddingUnavailable,
    /// The persistence backend failed.
    StoreUnavailable,
}

impl KontekstError {
    /// Classify this error into one of the four failure kinds.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDocument(_) | Self::Json(_) => ErrorKind::InvalidDocument,
            Self::Config(_) | Self::InvalidArgument(_) | Self::TomlParse(_) => {
                ErrorKind::InvalidArgument
            }
            Self::Embedding(_) | Self::OpenAI(_) | Self::Http(_) => {
                ErrorKind::EmbeddingUnavailable
            }
            Self::Store(_) | Self::Database(_) | Self::Io(_) => ErrorKind::StoreUnavailable,
        }
    }

    /// Whether the failure is worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::EmbeddingUnavailable | ErrorKind::StoreUnavailable
        )
    }
}

/// Result type alias for Kontekst operations.
pub type Result<T> = std::result::Result<T, KontekstError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            KontekstError::InvalidDocument("empty".into()).kind(),
            ErrorKind::InvalidDocument
        );
        assert_eq!(
            KontekstError::InvalidArgument("top_k".into()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            KontekstError::Embedding("rate limit".into()).kind(),
            ErrorKind::EmbeddingUnavailable
        );
        assert_eq!(
            KontekstError::Store("locked".into()).kind(),
            ErrorKind::StoreUnavailable
        );
    }

    #[test]
    fn test_transience() {
        assert!(KontekstError::Embedding("timeout".into()).is_transient());
        assert!(KontekstError::Store("busy".into()).is_transient());
        assert!(!KontekstError::InvalidDocument("empty".into()).is_transient());
        assert!(!KontekstError::InvalidArgument("zero".into()).is_transient());
    }
}
