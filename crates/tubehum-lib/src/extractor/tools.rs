use std::path::{Path, PathBuf};

/// Finds an external program: an explicit path wins (bare names are looked
/// up on PATH), otherwise `default_name` is searched on PATH.
pub fn locate_tool(explicit: Option<&Path>, default_name: &str) -> Option<PathBuf> {
    match explicit {
        Some(path) if path.components().count() > 1 || path.is_absolute() => {
            path.exists().then(|| path.to_path_buf())
        }
        Some(name) => which::which(name).ok(),
        None => which::which(default_name).ok(),
    }
}
