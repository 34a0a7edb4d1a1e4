//! Lyrics command implementation.

use crate::audio::is_canonical;
use crate::catalog::SongStore;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::VersifyError;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::PathBuf;

/// Run the lyrics command.
pub async fn run_lyrics(id: i64, audio: Option<String>, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(&settings)?;

    let song = orchestrator
        .store()
        .get(id)
        .await?
        .ok_or(VersifyError::SongNotFound(id))?;

    let audio_path = match audio {
        Some(path) => Settings::expand_path(&path),
        None => PathBuf::from(&song.file_path),
    };

    if let Err(e) = preflight::check(
        Operation::GenerateLyrics {
            needs_decode: !is_canonical(&audio_path),
        },
        &settings,
    ) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let spinner = Output::spinner(&format!("Generating lyrics for '{}'...", song.title));
    let result = orchestrator.process_song(id, &audio_path).await;
    spinner.finish_and_clear();

    let report = result?;
    Output::report(&report);

    Ok(())
}
