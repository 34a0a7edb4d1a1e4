//! Show command implementation.

use crate::catalog::{SongStore, SqliteSongStore};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::VersifyError;
use anyhow::Result;

/// Run the show command.
pub async fn run_show(id: i64, settings: Settings) -> Result<()> {
    let store = SqliteSongStore::new(&settings.sqlite_path())?;
    let song = store.get(id).await?.ok_or(VersifyError::SongNotFound(id))?;

    Output::header(&song.title);
    Output::kv("Id", &song.id.to_string());
    Output::kv("Artist", &song.artist_name);
    if let Some(genre) = &song.genre {
        Output::kv("Genre", genre);
    }
    if let Some(language) = &song.language {
        Output::kv("Language", language);
    }
    if let Some(uploader) = song.uploader_id {
        Output::kv("Uploader", &uploader.to_string());
    }
    Output::kv("File", &song.file_path);
    Output::kv("Added", &song.created_at.format("%Y-%m-%d %H:%M").to_string());
    if let Some(updated) = song.lyrics_updated_at {
        Output::kv("Lyrics updated", &updated.format("%Y-%m-%d %H:%M").to_string());
    }

    println!();
    match &song.lyrics {
        Some(lyrics) => println!("{}", lyrics),
        None => Output::info(&format!(
            "No lyrics yet. Generate them with 'versify lyrics {}'.",
            song.id
        )),
    }

    Ok(())
}
