//! Texture path resolution
//!
//! Texture paths are stored relative to the model, usually with `\`
//! separators and inconsistent case. Candidates are tried in order:
//!
//! 1. the model's directory (exact, then case-insensitive per component)
//! 2. a sibling `Graphic` directory, breadth-first
//! 3. the nearest ancestor directory named `Graphic`, breadth-first
//!
//! The first existing file wins. Directory scans are bounded by depth and
//! a visited set, so symlink loops terminate.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use super::types::TextureResolution;
use crate::utils::normalize_path;

/// Name of the art directory searched for textures.
pub const GRAPHIC_DIR: &str = "Graphic";

/// Default depth limit for the `Graphic` directory search.
pub const MAX_GRAPHIC_SEARCH_DEPTH: usize = 8;

/// Outcome of resolving one texture path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureLookup {
    pub resolution: TextureResolution,
    pub search_roots: Vec<PathBuf>,
}

/// Resolve a stored texture path against the model directory.
#[must_use]
pub fn resolve_texture(stored: &str, asset_dir: Option<&Path>, max_depth: usize) -> TextureLookup {
    let components = path_components(stored);
    let mut search_roots = Vec::new();

    let Some(asset_dir) = asset_dir else {
        return TextureLookup {
            resolution: TextureResolution::Unresolved,
            search_roots,
        };
    };
    if components.is_empty() {
        return TextureLookup {
            resolution: TextureResolution::Unresolved,
            search_roots,
        };
    }

    search_roots.push(asset_dir.to_path_buf());
    if let Some(found) = find_relative(asset_dir, &components) {
        return resolved(found, search_roots);
    }

    if let Some(graphic) = find_child_dir(asset_dir, GRAPHIC_DIR) {
        search_roots.push(graphic.clone());
        if let Some(found) = search_breadth_first(&graphic, &components, max_depth) {
            return resolved(found, search_roots);
        }
    }

    if let Some(ancestor) = asset_dir
        .ancestors()
        .skip(1)
        .find(|p| is_named(p, GRAPHIC_DIR))
    {
        search_roots.push(ancestor.to_path_buf());
        if let Some(found) = search_breadth_first(ancestor, &components, max_depth) {
            return resolved(found, search_roots);
        }
    }

    tracing::debug!(texture = stored, roots = ?search_roots, "texture not found");
    TextureLookup {
        resolution: TextureResolution::Unresolved,
        search_roots,
    }
}

fn resolved(path: PathBuf, search_roots: Vec<PathBuf>) -> TextureLookup {
    TextureLookup {
        resolution: TextureResolution::Resolved(path),
        search_roots,
    }
}

/// Split a stored path into its non-empty components.
fn path_components(stored: &str) -> Vec<String> {
    normalize_path(stored)
        .split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .map(str::to_string)
        .collect()
}

fn is_named(path: &Path, name: &str) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().eq_ignore_ascii_case(name))
}

/// Child directory of `dir` whose name matches case-insensitively.
fn find_child_dir(dir: &Path, name: &str) -> Option<PathBuf> {
    let exact = dir.join(name);
    if exact.is_dir() {
        return Some(exact);
    }
    sorted_entries(dir)
        .into_iter()
        .find(|p| p.is_dir() && is_named(p, name))
}

/// Walk `components` from `root`, matching each one case-insensitively.
fn find_relative(root: &Path, components: &[String]) -> Option<PathBuf> {
    let exact = components.iter().fold(root.to_path_buf(), |p, c| p.join(c));
    if exact.is_file() {
        return Some(exact);
    }

    let mut current = root.to_path_buf();
    for (i, component) in components.iter().enumerate() {
        let last = i + 1 == components.len();
        let direct = current.join(component);
        let matches = |p: &Path| if last { p.is_file() } else { p.is_dir() };
        current = if matches(&direct) {
            direct
        } else {
            sorted_entries(&current)
                .into_iter()
                .find(|p| is_named(p, component) && matches(p))?
        };
    }
    Some(current)
}

/// Breadth-first search for `components` under every directory below `root`.
fn search_breadth_first(root: &Path, components: &[String], max_depth: usize) -> Option<PathBuf> {
    let mut queue = VecDeque::from([(root.to_path_buf(), 0usize)]);
    let mut visited = HashSet::new();

    while let Some((dir, depth)) = queue.pop_front() {
        let key = fs::canonicalize(&dir).unwrap_or_else(|_| dir.clone());
        if !visited.insert(key) {
            continue;
        }
        if let Some(found) = find_relative(&dir, components) {
            return Some(found);
        }
        if depth < max_depth {
            for child in sorted_entries(&dir).into_iter().filter(|p| p.is_dir()) {
                queue.push_back((child, depth + 1));
            }
        }
    }
    None
}

/// Directory entries in name order, so searches are deterministic.
fn sorted_entries(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();
    paths
}
