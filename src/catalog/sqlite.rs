//! SQLite-based song catalog.

use super::{NewSong, Song, SongStore};
use crate::error::{Result, VersifyError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS songs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        artist_name TEXT NOT NULL,
        genre TEXT,
        language TEXT,
        file_path TEXT NOT NULL,
        lyrics TEXT,
        uploader_id INTEGER,
        created_at TEXT NOT NULL,
        lyrics_updated_at TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_songs_uploader ON songs(uploader_id);
"#;

const SONG_COLUMNS: &str = "id, title, artist_name, genre, language, file_path, lyrics, \
                            uploader_id, created_at, lyrics_updated_at";

/// SQLite-based song store.
pub struct SqliteSongStore {
    conn: Mutex<Connection>,
}

impl SqliteSongStore {
    /// Open (or create) the catalog at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened song catalog at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory catalog (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| VersifyError::Catalog(format!("Failed to acquire lock: {}", e)))
    }

    fn query_song(conn: &Connection, id: i64) -> Result<Option<Song>> {
        let song = conn
            .query_row(
                &format!("SELECT {SONG_COLUMNS} FROM songs WHERE id = ?1"),
                params![id],
                row_to_song,
            )
            .optional()?;
        Ok(song)
    }
}

fn parse_time(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_song(row: &Row<'_>) -> rusqlite::Result<Song> {
    let created_at: String = row.get(8)?;
    let lyrics_updated_at: Option<String> = row.get(9)?;

    Ok(Song {
        id: row.get(0)?,
        title: row.get(1)?,
        artist_name: row.get(2)?,
        genre: row.get(3)?,
        language: row.get(4)?,
        file_path: row.get(5)?,
        lyrics: row.get(6)?,
        uploader_id: row.get(7)?,
        created_at: parse_time(&created_at),
        lyrics_updated_at: lyrics_updated_at.as_deref().map(parse_time),
    })
}

#[async_trait]
impl SongStore for SqliteSongStore {
    #[instrument(skip(self, song), fields(title = %song.title))]
    async fn insert(&self, song: &NewSong) -> Result<Song> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO songs (title, artist_name, genre, language, file_path, uploader_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                song.title,
                song.artist_name,
                song.genre,
                song.language,
                song.file_path,
                song.uploader_id,
                Utc::now().to_rfc3339(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!("Inserted song {}", id);

        Self::query_song(&conn, id)?.ok_or(VersifyError::SongNotFound(id))
    }

    async fn get(&self, id: i64) -> Result<Option<Song>> {
        let conn = self.lock()?;
        Self::query_song(&conn, id)
    }

    async fn list(&self) -> Result<Vec<Song>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {SONG_COLUMNS} FROM songs ORDER BY created_at DESC, id DESC"
        ))?;
        let songs = stmt
            .query_map([], row_to_song)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(songs)
    }

    #[instrument(skip(self, lyrics))]
    async fn update_lyrics(&self, id: i64, lyrics: &str) -> Result<Song> {
        let mut conn = self.lock()?;
        // Rolled back on drop unless committed.
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE songs SET lyrics = ?1, lyrics_updated_at = ?2 WHERE id = ?3",
            params![lyrics, Utc::now().to_rfc3339(), id],
        )?;

        if updated == 0 {
            return Err(VersifyError::SongNotFound(id));
        }

        let song = Self::query_song(&tx, id)?.ok_or(VersifyError::SongNotFound(id))?;
        tx.commit()?;

        info!("Lyrics updated for song: {}", song.title);
        Ok(song)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM songs WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}
