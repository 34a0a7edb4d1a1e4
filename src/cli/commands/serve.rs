//! HTTP API server for integration with other systems.
//!
//! Exposes the song catalog and lets a web front end trigger lyrics
//! generation after an upload.

use crate::catalog::{Song, SongStore};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::VersifyError;
use crate::orchestrator::Orchestrator;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::{Path as StdPath, PathBuf};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
    /// Only audio under this directory may be named in a request.
    uploads_dir: PathBuf,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(&settings)?;
    let app = router(Arc::new(AppState {
        orchestrator,
        uploads_dir: settings.uploads_dir(),
    }));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Versify API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("List songs", "GET  /songs");
    Output::kv("Get song", "GET  /songs/{id}");
    Output::kv("Generate lyrics", "POST /songs/{id}/lyrics[?audio_path=...]");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/songs", get(list_songs))
        .route("/songs/{id}", get(get_song))
        .route("/songs/{id}/lyrics", post(generate_lyrics))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize, Default)]
struct LyricsQuery {
    /// Audio to transcribe instead of the song's stored file.
    audio_path: Option<String>,
}

#[derive(Serialize)]
struct SongListResponse {
    songs: Vec<Song>,
    total: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(e: VersifyError) -> Response {
    let status = match e {
        VersifyError::SongNotFound(_) => StatusCode::NOT_FOUND,
        VersifyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!("Request failed: {}", e);
    }
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

/// Resolve a requested audio path, refusing anything outside `uploads_dir`.
fn resolve_audio_path(raw: &str, uploads_dir: &StdPath) -> crate::error::Result<PathBuf> {
    let invalid = || VersifyError::InvalidInput(format!("audio_path not allowed: {}", raw));

    let uploads = std::fs::canonicalize(uploads_dir).map_err(|_| invalid())?;
    let path = std::fs::canonicalize(raw).map_err(|_| invalid())?;
    if path.starts_with(&uploads) && path.is_file() {
        Ok(path)
    } else {
        Err(invalid())
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_songs(State(state): State<Arc<AppState>>) -> Response {
    match state.orchestrator.store().list().await {
        Ok(songs) => Json(SongListResponse {
            total: songs.len(),
            songs,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_song(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    match state.orchestrator.store().get(id).await {
        Ok(Some(song)) => Json(song).into_response(),
        Ok(None) => error_response(VersifyError::SongNotFound(id)),
        Err(e) => error_response(e),
    }
}

async fn generate_lyrics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<LyricsQuery>,
) -> Response {
    let result = match query.audio_path {
        Some(raw) => match resolve_audio_path(&raw, &state.uploads_dir) {
            Ok(path) => state.orchestrator.process_song(id, &path).await,
            Err(e) => Err(e),
        },
        None => state.orchestrator.process_stored_song(id).await,
    };

    match result {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(e),
    }
}
