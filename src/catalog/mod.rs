//! Song catalog.
//!
//! The lyrics pipeline borrows two capabilities from here: look a song up by
//! id, and overwrite its lyrics. The rest exists for the CLI and HTTP API.

mod sqlite;
mod upload;

pub use sqlite::SqliteSongStore;
pub use upload::{sanitize_filename, store_upload};

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub title: String,
    pub artist_name: String,
    pub genre: Option<String>,
    pub language: Option<String>,
    /// Where the uploaded audio lives on disk.
    pub file_path: String,
    pub lyrics: Option<String>,
    pub uploader_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub lyrics_updated_at: Option<DateTime<Utc>>,
}

/// Fields supplied when registering a song.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSong {
    pub title: String,
    pub artist_name: String,
    pub genre: Option<String>,
    pub language: Option<String>,
    pub file_path: String,
    pub uploader_id: Option<i64>,
}

/// Trait for song persistence backends.
#[async_trait]
pub trait SongStore: Send + Sync {
    /// Register a new song.
    async fn insert(&self, song: &NewSong) -> Result<Song>;

    /// Find a song by id.
    async fn get(&self, id: i64) -> Result<Option<Song>>;

    /// All songs, newest first.
    async fn list(&self) -> Result<Vec<Song>>;

    /// Replace the lyrics of one song and commit.
    ///
    /// Fails with `SongNotFound` without writing anything if `id` is unknown.
    async fn update_lyrics(&self, id: i64, lyrics: &str) -> Result<Song>;

    /// Delete a song. Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool>;
}
