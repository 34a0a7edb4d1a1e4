//! Configuration module for Versify.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{LyricsPrompts, Prompts};
pub use settings::{
    DatabaseSettings, GeneralSettings, GenerationSettings, NormalizerSettings, PromptSettings,
    ServerSettings, Settings, TranscriptionSettings,
};
