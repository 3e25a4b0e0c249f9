//! Configuration settings for Kontekst.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub store: StoreSettings,
    pub session: SessionSettings,
    pub retry: RetrySettings,
    pub ingestion: IngestionSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.kontekst".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Document chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Target chunk size in words.
    pub target_words: usize,
    /// Fraction of the target shared between adjacent chunks (0.0 <= f < 1.0).
    pub overlap_fraction: f64,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            target_words: 500,
            overlap_fraction: 0.1,
        }
    }
}

/// Chunk store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Chunk store provider (sqlite, memory).
    pub provider: String,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.kontekst/chunks.db".to_string(),
        }
    }
}

/// Live context session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Number of chunks to surface per segment.
    pub top_k: usize,
    /// Suppress re-emission when the surfaced set is unchanged.
    pub suppress_unchanged: bool,
    /// Maximum keywords to extract per segment.
    pub max_keywords: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            suppress_unchanged: true,
            max_keywords: 5,
        }
    }
}

/// Retry policy for transient embedding/store failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Base delay between attempts in milliseconds.
    pub backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_ms: 500,
        }
    }
}

/// Ingestion pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionSettings {
    /// Per-phase timeout in seconds for embedding and storage of a document.
    pub timeout_seconds: u64,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 120,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::KontekstError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kontekst")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.store.sqlite_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.embedding.dimensions, 1536);
        assert_eq!(settings.chunking.target_words, 500);
        assert!((settings.chunking.overlap_fraction - 0.1).abs() < f64::EPSILON);
        assert_eq!(settings.session.top_k, 3);
        assert!(settings.session.suppress_unchanged);
    }

    #[test]
    fn test_partial_config_parses() {
        let settings: Settings = toml::from_str(
            r#"
            [session]
            top_k = 5
            suppress_unchanged = false
            "#,
        )
        .unwrap();

        assert_eq!(settings.session.top_k, 5);
        assert!(!settings.session.suppress_unchanged);
        // Unspecified sections fall back to defaults
        assert_eq!(settings.store.provider, "sqlite");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.session.top_k = 7;
        settings.save_to(&path).unwrap();

        let reloaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(reloaded.session.top_k, 7);
    }
}
