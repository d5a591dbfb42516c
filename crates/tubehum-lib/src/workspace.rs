use crate::error::TubeHumError;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
const MAX_NAME_LEN: usize = 100;

/// Makes a collection title usable as a single path component.
pub fn sanitize_dir_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = cleaned.trim().trim_matches('.');
    let truncated: String = trimmed.chars().take(MAX_NAME_LEN).collect();
    let truncated = truncated.trim_end();

    if truncated.is_empty() {
        "untitled".to_string()
    } else {
        truncated.to_string()
    }
}

pub fn destination_name(prefix: &str, title: Option<&str>, now: DateTime<Local>) -> String {
    let stem = match title {
        Some(title) => sanitize_dir_name(title),
        None => prefix.to_string(),
    };
    format!("{}_{}", stem, now.format(TIMESTAMP_FORMAT))
}

/// Creates the per-batch destination directory under `base`.
pub fn create_destination(
    base: &Path,
    prefix: &str,
    title: Option<&str>,
) -> Result<PathBuf, TubeHumError> {
    let path = base.join(destination_name(prefix, title, Local::now()));

    fs::create_dir_all(&path).map_err(|e| TubeHumError::DestinationDirectoryCreation {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    tracing::info!(path = %path.display(), "Created destination directory");
    Ok(path)
}

/// Recursively removes leftover files whose names end in one of
/// `extensions`. Returns how many files were removed.
pub fn cleanup_temp_files(dir: &Path, extensions: &[String]) -> Result<usize, TubeHumError> {
    let mut removed = 0;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            removed += cleanup_temp_files(&path, extensions)?;
            continue;
        }

        let name = entry.file_name();
        let name = name.to_string_lossy();
        if extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
            match fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "Removed temporary file");
                    removed += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Could not remove temporary file: {}", e)
                }
            }
        }
    }

    Ok(removed)
}
