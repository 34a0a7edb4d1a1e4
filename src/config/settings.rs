//! Configuration settings for Versify.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub database: DatabaseSettings,
    pub normalizer: NormalizerSettings,
    pub transcription: TranscriptionSettings,
    pub generation: GenerationSettings,
    pub prompts: PromptSettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory uploaded audio files are copied into.
    pub uploads_dir: String,
    /// Log level (trace, debug, info, warn, error) used when no `-v` is given.
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.versify".to_string(),
            uploads_dir: "~/.versify/uploads".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Song catalog settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Path to the SQLite catalog database.
    pub sqlite_path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            sqlite_path: "~/.versify/catalog.db".to_string(),
        }
    }
}

/// Audio normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerSettings {
    /// Decoder executable.
    pub program: String,
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Output channel count.
    pub channels: u16,
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            sample_rate: 16_000,
            channels: 1,
        }
    }
}

/// Speech recognition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Transcription model name.
    pub model: String,
    /// Optional language hint (ISO-639-1).
    pub language: Option<String>,
    /// Alternative OpenAI-compatible API base URL (e.g. a self-hosted Whisper server).
    pub api_base: Option<String>,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries when the service is unreachable. Silence is never retried.
    pub max_retries: u32,
    /// Delay between retries in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            language: None,
            api_base: None,
            timeout_secs: 300,
            max_retries: 2,
            retry_delay_ms: 1000,
        }
    }
}

/// External text-generation process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Executable to run.
    pub program: String,
    /// Arguments. `{{prompt}}` is replaced by the rendered prompt; if absent the
    /// prompt is appended as the last argument.
    pub args: Vec<String>,
    /// Seconds to wait before the process is killed.
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            program: "ollama".to_string(),
            args: vec![
                "run".to_string(),
                "mistral:latest".to_string(),
                "{{prompt}}".to_string(),
            ],
            timeout_secs: 300,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

/// HTTP API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::VersifyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("versify")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded uploads directory path.
    pub fn uploads_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.uploads_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.database.sqlite_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.normalizer.program, "ffmpeg");
        assert_eq!(settings.transcription.model, "whisper-1");
        assert_eq!(settings.generation.program, "ollama");
        assert_eq!(settings.generation.timeout_secs, 300);
        assert!(settings.generation.args.iter().any(|a| a == "{{prompt}}"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [generation]
            program = "llm"
            timeout_secs = 10

            [transcription]
            max_retries = 0
            "#,
        )
        .unwrap();

        assert_eq!(settings.generation.program, "llm");
        assert_eq!(settings.generation.timeout_secs, 10);
        assert_eq!(settings.generation.args.len(), 3);
        assert_eq!(settings.transcription.max_retries, 0);
        assert_eq!(settings.transcription.retry_delay_ms, 1000);
        assert_eq!(settings.server.port, 3000);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.transcription.language = Some("en".to_string());
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.transcription.language.as_deref(), Some("en"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = PathBuf::from("/nonexistent/versify/config.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.database.sqlite_path, "~/.versify/catalog.db");
    }
}
