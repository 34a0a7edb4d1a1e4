//! Versify - lyrics for a music-sharing catalog
//!
//! Turns an uploaded song into lyrics: the audio is normalized to WAV,
//! transcribed with an OpenAI-compatible speech API, and the transcript is
//! rewritten as song lyrics by an external text-generation program. The
//! result is stored on the song's catalog record.
//!
//! # Architecture
//!
//! - `config` - Configuration and prompt templates
//! - `audio` - Format normalization (ffmpeg)
//! - `transcription` - Speech-to-text
//! - `stylizer` - Transcript to lyrics via an external generator
//! - `catalog` - Song persistence (SQLite)
//! - `orchestrator` - Pipeline coordination
//! - `cli` - Command line and HTTP surfaces
//!
//! # Example
//!
//! ```rust,no_run
//! use versify::config::Settings;
//! use versify::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(&settings)?;
//!
//!     let report = orchestrator.process_stored_song(1).await?;
//!     println!("{}", report.lyrics);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod stylizer;
pub mod transcription;

pub use error::{Result, VersifyError};
