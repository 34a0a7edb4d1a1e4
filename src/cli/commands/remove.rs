//! Remove command implementation.

use crate::audio::{is_canonical, wav_sibling};
use crate::catalog::{SongStore, SqliteSongStore};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::VersifyError;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Run the remove command.
pub async fn run_remove(id: i64, keep_file: bool, settings: Settings) -> Result<()> {
    let store = SqliteSongStore::new(&settings.sqlite_path())?;
    let song = store.get(id).await?.ok_or(VersifyError::SongNotFound(id))?;

    store.delete(id).await?;
    Output::success(&format!("Removed '{}' (#{})", song.title, song.id));

    if keep_file {
        return Ok(());
    }

    for path in audio_files(Path::new(&song.file_path)) {
        match std::fs::remove_file(&path) {
            Ok(()) => Output::kv("Deleted", &path.display().to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if path == Path::new(&song.file_path) {
                    Output::warning(&format!("Audio file already gone: {}", song.file_path));
                }
            }
            Err(e) => {
                Output::warning(&format!("Could not delete {}: {}", path.display(), e));
            }
        }
    }

    Ok(())
}

/// The uploaded file plus the WAV the normalizer decoded next to it.
fn audio_files(file: &Path) -> Vec<PathBuf> {
    let mut files = vec![file.to_path_buf()];
    if !is_canonical(file) {
        files.push(wav_sibling(file));
    }
    files
}
