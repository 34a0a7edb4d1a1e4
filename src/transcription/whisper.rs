//! OpenAI Whisper transcription implementation.

use super::{transcript_from_text, Transcriber, TranscriptionError, TranscriptionResult};
use crate::config::TranscriptionSettings;
use crate::error::Result;
use crate::openai::create_client;
use async_openai::error::{ApiError, OpenAIError};
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, instrument, warn};

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    language: Option<String>,
}

impl WhisperTranscriber {
    /// Create a new Whisper transcriber with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(&TranscriptionSettings::default())
    }

    /// Create a new Whisper transcriber with custom configuration.
    pub fn with_config(settings: &TranscriptionSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
            model: settings.model.clone(),
            language: settings.language.clone(),
        })
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> TranscriptionResult {
        // One recording window: the entire file goes out in a single request.
        let file_bytes = tokio::fs::read(audio_path).await.map_err(|e| {
            TranscriptionError::Rejected(format!("cannot read {}: {}", audio_path.display(), e))
        })?;
        debug!("Submitting {} bytes for transcription", file_bytes.len());

        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(AudioInput::from_vec_u8(file_name, file_bytes))
            .model(&self.model)
            .response_format(AudioResponseFormat::Json);

        if let Some(lang) = &self.language {
            request_builder.language(lang);
        }

        let request = request_builder
            .build()
            .map_err(|e| TranscriptionError::Rejected(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(classify_api_error)?;

        let result = transcript_from_text(&response.text);
        if let Err(TranscriptionError::NoSpeech) = &result {
            warn!("Backend returned no speech");
        }
        result
    }
}

/// Split client failures into "could not reach" and "refused".
///
/// The client reports 5xx answers as API errors, and an HTML error page from
/// a proxy as a deserialization error. Both mean the service is down.
fn classify_api_error(err: OpenAIError) -> TranscriptionError {
    match err {
        OpenAIError::Reqwest(e) => TranscriptionError::Unavailable(e.to_string()),
        OpenAIError::JSONDeserialize(e) => TranscriptionError::Unavailable(e.to_string()),
        OpenAIError::ApiError(api) if is_server_error(&api) => {
            TranscriptionError::Unavailable(api.to_string())
        }
        other => TranscriptionError::Rejected(other.to_string()),
    }
}

fn is_server_error(api: &ApiError) -> bool {
    static STATUS_5XX: OnceLock<Regex> = OnceLock::new();
    let re = STATUS_5XX.get_or_init(|| Regex::new(r"\b5\d{2}\b").expect("valid status pattern"));

    match api.r#type.as_deref() {
        Some("server_error") | Some("service_unavailable") => true,
        Some("invalid_request_error") | Some("authentication_error") => false,
        _ => re.is_match(&api.message),
    }
}

/// Check if the OpenAI API key is configured.
pub fn is_api_key_configured() -> bool {
    std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_is_not_retryable() {
        let err = classify_api_error(OpenAIError::InvalidArgument("bad model".into()));
        assert!(matches!(err, TranscriptionError::Rejected(_)));
        assert!(!err.is_retryable());
    }

    fn api_error(message: &str, kind: Option<&str>) -> OpenAIError {
        OpenAIError::ApiError(ApiError {
            message: message.to_string(),
            r#type: kind.map(str::to_string),
            param: None,
            code: None,
        })
    }

    #[test]
    fn test_server_errors_are_retryable() {
        let err = classify_api_error(api_error("503 Service Unavailable", Some("server_error")));
        assert!(matches!(err, TranscriptionError::Unavailable(_)));
        assert!(err.is_retryable());

        let err = classify_api_error(api_error("upstream returned 502 Bad Gateway", None));
        assert!(err.is_retryable());

        let html = serde_json::from_str::<serde_json::Value>("<html>502 Bad Gateway</html>")
            .unwrap_err();
        let err = classify_api_error(OpenAIError::JSONDeserialize(html));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        let err = classify_api_error(api_error(
            "Invalid file format. Supported formats: flac, mp3, wav",
            Some("invalid_request_error"),
        ));
        assert!(matches!(err, TranscriptionError::Rejected(_)));
        assert!(!err.is_retryable());

        let err = classify_api_error(api_error("Incorrect API key provided", None));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_unreadable_file_is_rejected() {
        let transcriber = WhisperTranscriber::new().unwrap();
        let err = transcriber
            .transcribe(Path::new("/definitely/missing/voice.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptionError::Rejected(_)));
    }
}
