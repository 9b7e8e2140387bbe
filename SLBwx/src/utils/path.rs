//! Path utilities

use std::path::Path;

/// Normalize path separators to forward slashes (stored texture paths use `\`)
pub fn normalize_path<P: AsRef<Path>>(path: P) -> String {
    path.as_ref().to_string_lossy().replace('\\', "/")
}

/// `path` below `base` with `/` separators; `None` outside `base`
#[must_use]
pub fn relative_path<P: AsRef<Path>>(path: P, base: P) -> Option<String> {
    path.as_ref()
        .strip_prefix(base.as_ref())
        .ok()
        .map(normalize_path)
}

/// Case-insensitive identity of a stored texture path
#[must_use]
pub fn texture_key(path: &str) -> String {
    normalize_path(path).to_lowercase()
}

/// File stem of a `/` or `\` separated path, for display
#[must_use]
pub fn file_stem(path: &str) -> String {
    let normalized = normalize_path(path);
    let name = normalized.rsplit('/').next().unwrap_or_default();
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}
