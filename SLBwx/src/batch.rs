//! Batch import
//!
//! Finds `.BNX` / `.PNX` files under a directory and imports them in
//! parallel. Each file is decoded from its own buffer; failures are
//! counted and reported per file, never propagated.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use crate::formats::bwx::{BWX_EXTENSIONS, Dialect};
use crate::import::{ImportOptions, import_file};
use crate::scene::SceneSummary;
use crate::utils::{normalize_path, relative_path};

/// Progress of a running batch import
#[derive(Debug, Clone)]
pub struct ImportProgress {
    /// 1-based index of the file being imported
    pub current: usize,
    pub total: usize,
    /// Path relative to the batch root, for display
    pub file: String,
}

/// Outcome for one file of a batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchImportEntry {
    pub path: PathBuf,
    pub dialect: Option<Dialect>,
    pub summary: Option<SceneSummary>,
    /// Number of diagnostics recorded while building
    pub diagnostics: usize,
    pub error: Option<String>,
}

impl BatchImportEntry {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a batch import
#[derive(Debug, Clone, Serialize)]
pub struct BatchImportResult {
    /// Number of files imported
    pub success_count: usize,
    /// Number of files that failed to import
    pub fail_count: usize,
    /// One entry per input file, in input order
    pub results: Vec<BatchImportEntry>,
}

/// Find all BWX model files in a directory recursively
///
/// # Returns
/// A sorted list of paths whose extension is `bnx` or `pnx` (any case).
pub fn find_bwx_files<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let mut files: Vec<_> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| {
            e.path().is_file()
                && e.path().extension().is_some_and(|ext| {
                    BWX_EXTENSIONS
                        .iter()
                        .any(|known| ext.eq_ignore_ascii_case(known))
                })
        })
        .map(|e| e.path().to_path_buf())
        .collect();

    files.sort();
    files
}

/// Import many files in parallel
///
/// # Arguments
/// * `files` - Files to import
/// * `source_base` - Base directory used to shorten paths in progress updates
/// * `options` - Import options applied to every file
/// * `progress` - Callback for progress updates
pub fn batch_import<F>(
    files: &[PathBuf],
    source_base: &Path,
    options: &ImportOptions,
    progress: F,
) -> BatchImportResult
where
    F: Fn(&ImportProgress) + Send + Sync,
{
    let success_counter = AtomicUsize::new(0);
    let fail_counter = AtomicUsize::new(0);
    let processed = AtomicUsize::new(0);
    let total = files.len();

    let results: Vec<BatchImportEntry> = files
        .par_iter()
        .map(|path| {
            let display_path = relative_path(path.as_path(), source_base)
                .unwrap_or_else(|| normalize_path(path));

            let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(&ImportProgress {
                current,
                total,
                file: display_path.clone(),
            });

            match import_file(path, options) {
                Ok(scene) => {
                    success_counter.fetch_add(1, Ordering::SeqCst);
                    BatchImportEntry {
                        path: path.clone(),
                        dialect: Some(scene.dialect),
                        summary: Some(scene.summary()),
                        diagnostics: scene.diagnostics.len(),
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::warn!(file = %display_path, error = %e, "import failed");
                    fail_counter.fetch_add(1, Ordering::SeqCst);
                    BatchImportEntry {
                        path: path.clone(),
                        dialect: None,
                        summary: None,
                        diagnostics: 0,
                        error: Some(e.to_string()),
                    }
                }
            }
        })
        .collect();

    BatchImportResult {
        success_count: success_counter.load(Ordering::SeqCst),
        fail_count: fail_counter.load(Ordering::SeqCst),
        results,
    }
}
