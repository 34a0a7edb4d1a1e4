//! Lyrics pipeline orchestrator.
//!
//! Runs normalize → transcribe → stylize for one song and writes the result to
//! the song's lyrics field. The lyrics field only ever receives the final
//! stylized text or one of the two sentinels.

use crate::audio::{FfmpegNormalizer, Normalizer};
use crate::catalog::{SongStore, SqliteSongStore};
use crate::config::{Prompts, Settings};
use crate::error::{Result, VersifyError};
use crate::stylizer::{CommandGenerator, LyricStylizer, Stylized, LYRICS_FAILED};
use crate::transcription::{Transcriber, TranscriptionError, WhisperTranscriber};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Position of a job in the pipeline. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Normalizing,
    Transcribing,
    Stylizing,
    Persisting,
    Done,
    Failed,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Normalizing => "normalizing",
            PipelineStage::Transcribing => "transcribing",
            PipelineStage::Stylizing => "stylizing",
            PipelineStage::Persisting => "persisting",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What ended up in the lyrics field, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LyricsOutcome {
    /// Real lyrics were generated.
    Generated,
    /// No usable transcript; the placeholder was written.
    NotPossible { reason: String },
    /// A stage failed; the failure sentinel was written.
    Failed { stage: PipelineStage, reason: String },
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Correlates log lines for this run.
    pub job_id: Uuid,
    pub song_id: i64,
    pub title: String,
    /// Audio the transcriber actually read.
    pub audio_path: Option<PathBuf>,
    /// Text written to the lyrics field.
    pub lyrics: String,
    pub outcome: LyricsOutcome,
}

/// How transcription failures are retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_millis(1000),
        }
    }
}

/// The main orchestrator for the lyrics pipeline.
pub struct Orchestrator {
    normalizer: Arc<dyn Normalizer>,
    transcriber: Arc<dyn Transcriber>,
    stylizer: LyricStylizer,
    store: Arc<dyn SongStore>,
    retry: RetryPolicy,
}

impl Orchestrator {
    /// Create an orchestrator wired to ffmpeg, Whisper, the configured
    /// generation command and the SQLite catalog.
    pub fn new(settings: &Settings) -> Result<Self> {
        let store = Arc::new(SqliteSongStore::new(&settings.sqlite_path())?);
        Self::with_store(settings, store)
    }

    /// Same as [`Orchestrator::new`] but sharing an existing catalog.
    pub fn with_store(settings: &Settings, store: Arc<dyn SongStore>) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let normalizer = Arc::new(FfmpegNormalizer::with_config(&settings.normalizer));
        let transcriber = Arc::new(WhisperTranscriber::with_config(&settings.transcription)?);
        let generator = Arc::new(CommandGenerator::with_config(&settings.generation));

        info!(
            "Lyrics pipeline: {} → {} → {}",
            settings.normalizer.program, settings.transcription.model, settings.generation.program
        );

        Ok(Self::with_components(
            normalizer,
            transcriber,
            LyricStylizer::new(generator, prompts),
            store,
            RetryPolicy {
                max_retries: settings.transcription.max_retries,
                delay: Duration::from_millis(settings.transcription.retry_delay_ms),
            },
        ))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        normalizer: Arc<dyn Normalizer>,
        transcriber: Arc<dyn Transcriber>,
        stylizer: LyricStylizer,
        store: Arc<dyn SongStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            normalizer,
            transcriber,
            stylizer,
            store,
            retry,
        }
    }

    /// Get a reference to the song catalog.
    pub fn store(&self) -> Arc<dyn SongStore> {
        self.store.clone()
    }

    /// Run the pipeline for a song using the audio file stored on its record.
    pub async fn process_stored_song(&self, song_id: i64) -> Result<PipelineReport> {
        let song = self
            .store
            .get(song_id)
            .await?
            .ok_or(VersifyError::SongNotFound(song_id))?;

        self.process_song(song_id, Path::new(&song.file_path)).await
    }

    /// Generate lyrics for `song_id` from `audio_path` and persist them.
    ///
    /// Returns `SongNotFound` without touching anything if the song does not
    /// exist. Stage failures are not errors: they end up as sentinel text and
    /// are described by the report's outcome.
    #[instrument(skip(self, audio_path), fields(job_id = tracing::field::Empty, audio = %audio_path.display()))]
    pub async fn process_song(&self, song_id: i64, audio_path: &Path) -> Result<PipelineReport> {
        let job_id = Uuid::new_v4();
        tracing::Span::current().record("job_id", tracing::field::display(job_id));

        // Checked up front so a bad id costs no decoding or API calls.
        let song = self
            .store
            .get(song_id)
            .await?
            .ok_or(VersifyError::SongNotFound(song_id))?;
        info!("Generating lyrics for '{}'", song.title);

        let (lyrics, outcome, normalized) = self.run_stages(audio_path).await;

        info!(stage = %PipelineStage::Persisting, "Writing lyrics");
        let song = self.store.update_lyrics(song_id, &lyrics).await?;

        let final_stage = match outcome {
            LyricsOutcome::Failed { .. } => PipelineStage::Failed,
            _ => PipelineStage::Done,
        };
        info!(stage = %final_stage, "Lyrics pipeline finished");

        Ok(PipelineReport {
            job_id,
            song_id,
            title: song.title,
            audio_path: normalized,
            lyrics,
            outcome,
        })
    }

    /// Normalize, transcribe and stylize. Always yields text for the lyrics field.
    async fn run_stages(&self, audio_path: &Path) -> (String, LyricsOutcome, Option<PathBuf>) {
        info!(stage = %PipelineStage::Normalizing, "Normalizing audio");
        let wav_path = match self.normalizer.normalize(audio_path).await {
            Ok(path) => path,
            Err(e) => {
                warn!(stage = %PipelineStage::Failed, "Normalization failed: {}", e);
                let outcome = LyricsOutcome::Failed {
                    stage: PipelineStage::Normalizing,
                    reason: e.to_string(),
                };
                return (LYRICS_FAILED.to_string(), outcome, None);
            }
        };

        info!(stage = %PipelineStage::Transcribing, "Transcribing audio");
        let (transcript, transcription_error) = match self.transcribe_with_retry(&wav_path).await {
            Ok(text) => (text, None),
            Err(e) => {
                warn!("Continuing with an empty transcript: {}", e);
                (String::new(), Some(e))
            }
        };

        info!(stage = %PipelineStage::Stylizing, "Stylizing transcript");
        let stylized = self.stylizer.stylize(&transcript).await;
        let lyrics = stylized.text().to_string();

        let outcome = match stylized {
            Stylized::Lyrics(_) => LyricsOutcome::Generated,
            Stylized::NotPossible => LyricsOutcome::NotPossible {
                reason: transcription_error
                    .unwrap_or(TranscriptionError::NoSpeech)
                    .to_string(),
            },
            Stylized::Failed(e) => LyricsOutcome::Failed {
                stage: PipelineStage::Stylizing,
                reason: e.to_string(),
            },
        };

        (lyrics, outcome, Some(wav_path))
    }

    /// Transcribe, retrying only while the service is unreachable.
    async fn transcribe_with_retry(
        &self,
        wav_path: &Path,
    ) -> std::result::Result<String, TranscriptionError> {
        let mut attempt = 0;
        loop {
            match self.transcriber.transcribe(wav_path).await {
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    warn!(
                        "Transcription attempt {} failed ({}), retrying in {:?}",
                        attempt, e, self.retry.delay
                    );
                    tokio::time::sleep(self.retry.delay).await;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NewSong;
    use crate::stylizer::{GenerationError, LyricGenerator, LYRICS_NOT_POSSIBLE};
    use crate::transcription::TranscriptionResult;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mirrors the real normalizer's path handling without running a decoder.
    struct FakeNormalizer {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Normalizer for FakeNormalizer {
        async fn normalize(&self, source: &Path) -> Result<PathBuf> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(VersifyError::Decode("corrupt header".into()));
            }
            if crate::audio::is_canonical(source) {
                Ok(source.to_path_buf())
            } else {
                Ok(crate::audio::wav_sibling(source))
            }
        }
    }

    /// Replays scripted results, then keeps returning the last one.
    struct FakeTranscriber {
        replies: Mutex<VecDeque<TranscriptionResult>>,
        calls: AtomicUsize,
        seen: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl Transcriber for FakeTranscriber {
        async fn transcribe(&self, audio_path: &Path) -> TranscriptionResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(audio_path.to_path_buf());
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.pop_front().unwrap()
            } else {
                replies.front().cloned().unwrap()
            }
        }
    }

    struct FakeGenerator {
        reply: std::result::Result<String, GenerationError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LyricGenerator for FakeGenerator {
        async fn generate(&self, _prompt: &str) -> std::result::Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    struct Harness {
        orchestrator: Orchestrator,
        store: Arc<SqliteSongStore>,
        normalizer: Arc<FakeNormalizer>,
        transcriber: Arc<FakeTranscriber>,
        generator: Arc<FakeGenerator>,
    }

    fn harness(
        decode_fails: bool,
        transcripts: Vec<TranscriptionResult>,
        generation: std::result::Result<String, GenerationError>,
    ) -> Harness {
        let store = Arc::new(SqliteSongStore::in_memory().unwrap());
        let normalizer = Arc::new(FakeNormalizer {
            fail: decode_fails,
            calls: AtomicUsize::new(0),
        });
        let transcriber = Arc::new(FakeTranscriber {
            replies: Mutex::new(transcripts.into()),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        });
        let generator = Arc::new(FakeGenerator {
            reply: generation,
            calls: AtomicUsize::new(0),
        });

        let orchestrator = Orchestrator::with_components(
            normalizer.clone(),
            transcriber.clone(),
            LyricStylizer::new(generator.clone(), Prompts::default()),
            store.clone(),
            RetryPolicy {
                max_retries: 2,
                delay: Duration::ZERO,
            },
        );

        Harness {
            orchestrator,
            store,
            normalizer,
            transcriber,
            generator,
        }
    }

    async fn add_song(store: &SqliteSongStore, file: &str) -> i64 {
        store
            .insert(&NewSong {
                title: "Demo".to_string(),
                artist_name: "Someone".to_string(),
                file_path: file.to_string(),
                ..NewSong::default()
            })
            .await
            .unwrap()
            .id
    }

    async fn stored_lyrics(store: &SqliteSongStore, id: i64) -> Option<String> {
        store.get(id).await.unwrap().unwrap().lyrics
    }

    #[tokio::test]
    async fn test_end_to_end_generated_lyrics() {
        let h = harness(
            false,
            vec![Ok("hello world this is a test".into())],
            Ok("Hello world, this is a test song".into()),
        );
        let id = add_song(&h.store, "/uploads/voice.mp3").await;

        let report = h
            .orchestrator
            .process_song(id, Path::new("/uploads/voice.mp3"))
            .await
            .unwrap();

        assert_eq!(report.outcome, LyricsOutcome::Generated);
        assert_eq!(report.lyrics, "Hello world, this is a test song");
        assert_eq!(report.audio_path, Some(PathBuf::from("/uploads/voice.wav")));
        assert_eq!(
            stored_lyrics(&h.store, id).await.as_deref(),
            Some("Hello world, this is a test song")
        );
        assert_eq!(
            h.transcriber.seen.lock().unwrap().as_slice(),
            &[PathBuf::from("/uploads/voice.wav")]
        );
    }

    #[tokio::test]
    async fn test_end_to_end_silence_writes_placeholder() {
        let h = harness(false, vec![Ok(String::new())], Ok("never used".into()));
        let id = add_song(&h.store, "/uploads/silence.wav").await;

        let report = h
            .orchestrator
            .process_song(id, Path::new("/uploads/silence.wav"))
            .await
            .unwrap();

        assert!(matches!(report.outcome, LyricsOutcome::NotPossible { .. }));
        assert_eq!(stored_lyrics(&h.store, id).await.as_deref(), Some(LYRICS_NOT_POSSIBLE));
        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(report.audio_path, Some(PathBuf::from("/uploads/silence.wav")));
    }

    #[tokio::test]
    async fn test_no_speech_is_not_retried() {
        let h = harness(false, vec![Err(TranscriptionError::NoSpeech)], Ok("x".into()));
        let id = add_song(&h.store, "/uploads/quiet.wav").await;

        let report = h
            .orchestrator
            .process_song(id, Path::new("/uploads/quiet.wav"))
            .await
            .unwrap();

        assert_eq!(h.transcriber.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            report.outcome,
            LyricsOutcome::NotPossible {
                reason: TranscriptionError::NoSpeech.to_string()
            }
        );
        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unavailable_service_is_retried() {
        let h = harness(
            false,
            vec![
                Err(TranscriptionError::Unavailable("connection reset".into())),
                Ok("second time lucky".into()),
            ],
            Ok("Second time lucky".into()),
        );
        let id = add_song(&h.store, "/uploads/take.wav").await;

        let report = h
            .orchestrator
            .process_song(id, Path::new("/uploads/take.wav"))
            .await
            .unwrap();

        assert_eq!(h.transcriber.calls.load(Ordering::SeqCst), 2);
        assert_eq!(report.outcome, LyricsOutcome::Generated);
        assert_eq!(stored_lyrics(&h.store, id).await.as_deref(), Some("Second time lucky"));
    }

    #[tokio::test]
    async fn test_exhausted_retries_collapse_to_placeholder() {
        let h = harness(
            false,
            vec![Err(TranscriptionError::Unavailable("dns failure".into()))],
            Ok("never used".into()),
        );
        let id = add_song(&h.store, "/uploads/take.wav").await;

        let report = h
            .orchestrator
            .process_song(id, Path::new("/uploads/take.wav"))
            .await
            .unwrap();

        // One attempt plus two retries.
        assert_eq!(h.transcriber.calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            report.outcome,
            LyricsOutcome::NotPossible { ref reason } if reason.contains("dns failure")
        ));
        assert_eq!(stored_lyrics(&h.store, id).await.as_deref(), Some(LYRICS_NOT_POSSIBLE));
        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generation_failure_writes_sentinel_once() {
        let h = harness(
            false,
            vec![Ok("some spoken words".into())],
            Err(GenerationError::Exit {
                code: Some(1),
                stderr: "model not found".into(),
            }),
        );
        let id = add_song(&h.store, "/uploads/voice.mp3").await;

        let report = h
            .orchestrator
            .process_song(id, Path::new("/uploads/voice.mp3"))
            .await
            .unwrap();

        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            report.outcome,
            LyricsOutcome::Failed { stage: PipelineStage::Stylizing, .. }
        ));
        assert_eq!(stored_lyrics(&h.store, id).await.as_deref(), Some(LYRICS_FAILED));
    }

    #[tokio::test]
    async fn test_decode_failure_skips_later_stages() {
        let h = harness(true, vec![Ok("unused".into())], Ok("unused".into()));
        let id = add_song(&h.store, "/uploads/corrupt.mp3").await;

        let report = h
            .orchestrator
            .process_song(id, Path::new("/uploads/corrupt.mp3"))
            .await
            .unwrap();

        assert!(matches!(
            report.outcome,
            LyricsOutcome::Failed { stage: PipelineStage::Normalizing, .. }
        ));
        assert!(report.audio_path.is_none());
        assert_eq!(stored_lyrics(&h.store, id).await.as_deref(), Some(LYRICS_FAILED));
        assert_eq!(h.transcriber.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_song_writes_nothing() {
        let h = harness(false, vec![Ok("words".into())], Ok("Lyrics".into()));
        let other = add_song(&h.store, "/uploads/other.mp3").await;

        let err = h
            .orchestrator
            .process_song(other + 100, Path::new("/uploads/voice.mp3"))
            .await
            .unwrap_err();

        assert!(matches!(err, VersifyError::SongNotFound(id) if id == other + 100));
        assert!(stored_lyrics(&h.store, other).await.is_none());
        assert_eq!(h.normalizer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.transcriber.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_process_stored_song_uses_record_path() {
        let h = harness(false, vec![Ok("words".into())], Ok("Words, sung".into()));
        let id = add_song(&h.store, "/uploads/stored.flac").await;

        let report = h.orchestrator.process_stored_song(id).await.unwrap();

        assert_eq!(report.audio_path, Some(PathBuf::from("/uploads/stored.wav")));
        assert_eq!(report.lyrics, "Words, sung");
    }

    #[tokio::test]
    async fn test_rerun_overwrites_previous_lyrics() {
        let h = harness(true, vec![Ok("unused".into())], Ok("unused".into()));
        let id = add_song(&h.store, "/uploads/voice.mp3").await;
        h.store.update_lyrics(id, "Old verse").await.unwrap();

        h.orchestrator
            .process_song(id, Path::new("/uploads/voice.mp3"))
            .await
            .unwrap();

        assert_eq!(stored_lyrics(&h.store, id).await.as_deref(), Some(LYRICS_FAILED));
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = LyricsOutcome::Failed {
            stage: PipelineStage::Normalizing,
            reason: "bad".into(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["stage"], "normalizing");
    }
}
