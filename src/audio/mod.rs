//! Audio format normalization.
//!
//! The transcriber only accepts WAV. Anything else is decoded into a sibling
//! `.wav` file first; the uploaded file is never touched.

mod normalizer;

pub use normalizer::FfmpegNormalizer;

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Extension of the canonical waveform format.
pub const CANONICAL_EXTENSION: &str = "wav";

/// Trait for bringing an audio file into the canonical format.
#[async_trait]
pub trait Normalizer: Send + Sync {
    /// Return a path to a canonical version of `source`.
    ///
    /// Canonical inputs come back unchanged. Other inputs are decoded into a
    /// sibling file with the same stem.
    async fn normalize(&self, source: &Path) -> Result<PathBuf>;
}

/// Whether `path` already names a canonical (WAV) file.
pub fn is_canonical(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(CANONICAL_EXTENSION))
        .unwrap_or(false)
}

/// Path of the WAV file written next to `source`.
pub fn wav_sibling(source: &Path) -> PathBuf {
    source.with_extension(CANONICAL_EXTENSION)
}
