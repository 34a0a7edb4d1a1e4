//! Add command implementation.

use crate::audio::is_canonical;
use crate::catalog::{store_upload, NewSong, SongStore, SqliteSongStore};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::sync::Arc;

/// Song metadata collected from the command line.
pub struct AddArgs {
    pub file: String,
    pub title: String,
    pub artist: String,
    pub genre: Option<String>,
    pub language: Option<String>,
    pub uploader: Option<i64>,
    pub generate: bool,
}

/// Run the add command.
pub async fn run_add(args: AddArgs, settings: Settings) -> Result<()> {
    let source = Settings::expand_path(&args.file);

    // Fail before copying anything if generation could not run anyway.
    if args.generate {
        if let Err(e) = preflight::check(
            Operation::GenerateLyrics {
                needs_decode: !is_canonical(&source),
            },
            &settings,
        ) {
            Output::error(&e.to_string());
            return Err(e.into());
        }
    }

    let store = Arc::new(SqliteSongStore::new(&settings.sqlite_path())?);

    let stored = store_upload(&source, &settings.uploads_dir())?;
    let stored = std::fs::canonicalize(&stored).unwrap_or(stored);

    let song = store
        .insert(&NewSong {
            title: args.title,
            artist_name: args.artist,
            genre: args.genre,
            language: args.language,
            file_path: stored.to_string_lossy().to_string(),
            uploader_id: args.uploader,
        })
        .await?;

    Output::success(&format!("Added '{}' by {} as #{}", song.title, song.artist_name, song.id));
    Output::kv("File", &song.file_path);

    if args.generate {
        let orchestrator = Orchestrator::with_store(&settings, store)?;

        let spinner = Output::spinner("Generating lyrics...");
        let result = orchestrator.process_stored_song(song.id).await;
        spinner.finish_and_clear();

        Output::report(&result?);
    } else {
        Output::info(&format!(
            "Generate lyrics later with 'versify lyrics {}'.",
            song.id
        ));
    }

    Ok(())
}
