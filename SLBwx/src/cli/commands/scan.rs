//! Scan command

use std::path::Path;
use std::time::Instant;

use indicatif::ProgressBar;

use crate::batch::{batch_import, find_bwx_files};
use crate::cli::progress::{CUBE, LOOKING_GLASS, bar_style, print_done, print_step};
use crate::import::ImportOptions;

/// Import every model under `dir` and report failures.
pub fn execute(
    dir: &Path,
    json: Option<&Path>,
    quiet: bool,
    options: &ImportOptions,
) -> anyhow::Result<()> {
    let started = Instant::now();
    print_step(1, 2, LOOKING_GLASS, "Finding BNX/PNX files...");
    let files = find_bwx_files(dir);

    if files.is_empty() {
        println!("No BNX/PNX files found in: {}", dir.display());
        return Ok(());
    }

    print_step(2, 2, CUBE, &format!("Importing {} files...", files.len()));
    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(files.len() as u64)
    };
    pb.set_style(bar_style());
    pb.set_message("Importing");

    let result = batch_import(&files, dir, options, |progress| {
        pb.set_message(progress.file.clone());
        pb.inc(1);
    });
    pb.finish_and_clear();

    for entry in result.results.iter().filter(|e| !e.is_ok()) {
        println!(
            "  Failed {}: {}",
            entry.path.display(),
            entry.error.as_deref().unwrap_or_default()
        );
    }
    println!(
        "Imported {} files, {} failed",
        result.success_count, result.fail_count
    );

    if let Some(json) = json {
        std::fs::write(json, serde_json::to_string_pretty(&result)?)?;
        println!("Written to: {}", json.display());
    }

    print_done(started.elapsed());
    Ok(())
}
