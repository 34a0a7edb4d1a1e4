//! Canonical-format normalization using ffmpeg.

use super::{is_canonical, wav_sibling, Normalizer};
use crate::config::NormalizerSettings;
use crate::error::{Result, VersifyError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Decodes arbitrary audio into a WAV sibling file with ffmpeg.
pub struct FfmpegNormalizer {
    program: String,
    sample_rate: u32,
    channels: u16,
}

impl FfmpegNormalizer {
    /// Create a normalizer with default settings (ffmpeg, 16 kHz mono).
    pub fn new() -> Self {
        Self::with_config(&NormalizerSettings::default())
    }

    /// Create a normalizer from settings.
    pub fn with_config(settings: &NormalizerSettings) -> Self {
        Self {
            program: settings.program.clone(),
            sample_rate: settings.sample_rate,
            channels: settings.channels,
        }
    }

    /// Decodes `source` into `dest` as PCM WAV.
    async fn decode_to_wav(&self, source: &Path, dest: &Path) -> Result<()> {
        debug!("Converting {:?} to WAV", source);

        let result = Command::new(&self.program)
            .arg("-i").arg(source)
            .arg("-vn")
            .arg("-ac").arg(self.channels.to_string())
            .arg("-ar").arg(self.sample_rate.to_string())
            .arg("-y")
            .arg("-loglevel").arg("error")
            .arg(dest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => {
                let err = String::from_utf8_lossy(&out.stderr);
                Err(VersifyError::Decode(format!(
                    "{} could not decode {}: {}",
                    self.program,
                    source.display(),
                    err.trim()
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(VersifyError::ToolNotFound(self.program.clone()))
            }
            Err(e) => Err(VersifyError::Decode(format!("{} error: {e}", self.program))),
        }
    }
}

impl Default for FfmpegNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Normalizer for FfmpegNormalizer {
    #[instrument(skip(self), fields(source = %source.display()))]
    async fn normalize(&self, source: &Path) -> Result<PathBuf> {
        if is_canonical(source) {
            debug!("Already canonical, skipping decode");
            return Ok(source.to_path_buf());
        }

        if !source.exists() {
            return Err(VersifyError::Decode(format!(
                "Source audio not found: {}",
                source.display()
            )));
        }

        let target = wav_sibling(source);
        self.decode_to_wav(source, &target).await?;

        info!("Normalized audio written to {}", target.display());
        Ok(target)
    }
}
