//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, VersifyError};
use crate::transcription::is_api_key_configured;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Lyrics generation needs the speech API and the generation program,
    /// plus the decoder when the source is not already WAV.
    GenerateLyrics { needs_decode: bool },
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::GenerateLyrics { needs_decode } => {
            if settings.transcription.api_base.is_none() {
                check_api_key()?;
            }
            if needs_decode {
                check_tool(&settings.normalizer.program)?;
            }
            check_tool(&settings.generation.program)?;
        }
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    if is_api_key_configured() {
        Ok(())
    } else {
        Err(VersifyError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        ))
    }
}

/// Version flag understood by `name`.
pub fn version_arg(name: &str) -> &'static str {
    // ffmpeg/ffprobe use -version (single dash), others use --version
    let base = std::path::Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name);
    match base {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg(version_arg(name)).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(VersifyError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(VersifyError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(VersifyError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
