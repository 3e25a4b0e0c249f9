//! Configuration module for Kontekst.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, IngestionSettings, RetrySettings,
    SessionSettings, Settings, StoreSettings,
};
