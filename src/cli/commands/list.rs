//! List command implementation.

use crate::catalog::{SongStore, SqliteSongStore};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let store = SqliteSongStore::new(&settings.sqlite_path())?;

    match store.list().await {
        Ok(songs) => {
            if songs.is_empty() {
                Output::info("No songs yet. Use 'versify add <file>' to upload one.");
            } else {
                Output::header(&format!("Songs ({})", songs.len()));
                println!();

                for song in &songs {
                    Output::song_line(song);
                }

                let with_lyrics = songs.iter().filter(|s| s.lyrics.is_some()).count();
                println!();
                Output::kv("Total songs", &songs.len().to_string());
                Output::kv("With lyrics", &with_lyrics.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list songs: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
