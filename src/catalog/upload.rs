//! Copying audio into the uploads directory.

use crate::error::{Result, VersifyError};
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

/// Reduce a file name to letters, digits, `.`, `_` and `-`.
///
/// Leading dots are removed so an upload can never become a hidden file or
/// climb out of the uploads directory.
pub fn sanitize_filename(name: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let re = UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid filename pattern"));

    let cleaned = re.replace_all(name.trim(), "_");
    let cleaned = cleaned.trim_start_matches(['.', '_']);
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Copy `source` into `uploads_dir` under a sanitized, non-clashing name.
///
/// Normalization writes a `.wav` next to each upload, so two uploads never
/// share a stem: `voice.wav` and `voice.mp3` would otherwise end up decoding
/// into the same file.
pub fn store_upload(source: &Path, uploads_dir: &Path) -> Result<PathBuf> {
    if !source.is_file() {
        return Err(VersifyError::InvalidInput(format!(
            "Not a file: {}",
            source.display()
        )));
    }

    std::fs::create_dir_all(uploads_dir)?;

    let name = source
        .file_name()
        .and_then(|n| n.to_str())
        .map(sanitize_filename)
        .unwrap_or_else(|| "upload".to_string());

    let stem = Path::new(&name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("upload")
        .to_string();
    let ext = Path::new(&name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_string);

    let taken = stems_in(uploads_dir)?;
    let mut candidate = stem.clone();
    let mut counter = 1;
    while taken.contains(&candidate) {
        candidate = format!("{}_{}", stem, counter);
        counter += 1;
    }

    let target = match ext {
        Some(ext) => uploads_dir.join(format!("{}.{}", candidate, ext)),
        None => uploads_dir.join(&candidate),
    };

    std::fs::copy(source, &target)?;
    info!("Stored upload at {}", target.display());
    Ok(target)
}

/// File stems already present in `dir`.
fn stems_in(dir: &Path) -> Result<HashSet<String>> {
    let mut stems = HashSet::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            stems.insert(stem.to_string());
        }
    }
    Ok(stems)
}
