//! Transcription module for Versify.
//!
//! Turns a canonical WAV file into plain spoken-word text. The whole file is
//! sent as a single recording window; there is no chunking.
//!
//! Failures are typed so the caller can tell confirmed silence apart from an
//! unreachable service and retry only the latter.

mod whisper;

pub use whisper::{is_api_key_configured, WhisperTranscriber};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Why no transcript was produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionError {
    /// The backend answered but heard nothing usable.
    #[error("no speech detected")]
    NoSpeech,

    /// The backend could not be reached.
    #[error("speech service unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the request, or the audio could not be read.
    #[error("speech service rejected the request: {0}")]
    Rejected(String),
}

impl TranscriptionError {
    /// Only connectivity problems are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TranscriptionError::Unavailable(_))
    }
}

/// Result of a transcription attempt.
pub type TranscriptionResult = std::result::Result<String, TranscriptionError>;

/// Trait for speech-recognition backends.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a canonical audio file into plain text.
    async fn transcribe(&self, audio_path: &Path) -> TranscriptionResult;
}

/// Interpret backend text, treating empty output as silence.
pub fn transcript_from_text(text: &str) -> TranscriptionResult {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(TranscriptionError::NoSpeech)
    } else {
        Ok(trimmed.to_string())
    }
}
