//! Error types for Versify.

use thiserror::Error;

/// Library-level error type for Versify operations.
#[derive(Error, Debug)]
pub enum VersifyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audio decode failed: {0}")]
    Decode(String),

    #[error("Song not found: {0}")]
    SongNotFound(i64),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Versify operations.
pub type Result<T> = std::result::Result<T, VersifyError>;
