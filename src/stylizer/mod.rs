//! Lyric stylizer.
//!
//! Wraps a text-generation backend with the lyrics instruction prompt. The
//! stylizer is total: every failure becomes sentinel text, never an error.

mod generator;

pub use generator::CommandGenerator;

use crate::config::Prompts;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Written when there is nothing to turn into lyrics.
pub const LYRICS_NOT_POSSIBLE: &str = "Lyrics could not be generated.";

/// Written when a stage failed.
pub const LYRICS_FAILED: &str = "Lyrics generation failed.";

/// Failure of the text-generation backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("generation program not found: {0}")]
    ToolNotFound(String),

    #[error("failed to run generation program: {0}")]
    Spawn(String),

    #[error("generation exited with {}: {}", exit_label(.code), .stderr)]
    Exit { code: Option<i32>, stderr: String },

    #[error("generation timed out after {0:?}")]
    TimedOut(Duration),

    #[error("generation produced no output")]
    EmptyOutput,
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {}", c),
        None => "a signal".to_string(),
    }
}

/// Trait for text-generation backends.
#[async_trait]
pub trait LyricGenerator: Send + Sync {
    /// Run one generation for `prompt` and return the raw text.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Outcome of stylizing one transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum Stylized {
    /// Generated lyrics, trimmed.
    Lyrics(String),
    /// The transcript was empty; the backend was not called.
    NotPossible,
    /// The backend failed.
    Failed(GenerationError),
}

impl Stylized {
    /// Text to store in the lyrics field.
    pub fn text(&self) -> &str {
        match self {
            Stylized::Lyrics(text) => text,
            Stylized::NotPossible => LYRICS_NOT_POSSIBLE,
            Stylized::Failed(_) => LYRICS_FAILED,
        }
    }
}

/// Turns raw transcripts into lyrics.
pub struct LyricStylizer {
    generator: Arc<dyn LyricGenerator>,
    prompts: Prompts,
}

impl LyricStylizer {
    pub fn new(generator: Arc<dyn LyricGenerator>, prompts: Prompts) -> Self {
        Self { generator, prompts }
    }

    /// Render the instruction prompt for `transcript`.
    pub fn build_prompt(&self, transcript: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), transcript.to_string());
        self.prompts
            .render_with_custom(&self.prompts.lyrics.instruction, &vars)
    }

    /// Stylize a transcript. Never fails.
    #[instrument(skip_all, fields(transcript_len = transcript.len()))]
    pub async fn stylize(&self, transcript: &str) -> Stylized {
        if transcript.trim().is_empty() {
            info!("Empty transcript, skipping generation");
            return Stylized::NotPossible;
        }

        let prompt = self.build_prompt(transcript);
        debug!("Prompt is {} bytes", prompt.len());

        match self.generator.generate(&prompt).await {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    warn!("Generation returned empty output");
                    Stylized::Failed(GenerationError::EmptyOutput)
                } else {
                    Stylized::Lyrics(text.to_string())
                }
            }
            Err(e) => {
                warn!("Generation failed: {}", e);
                Stylized::Failed(e)
            }
        }
    }
}
