//! Dump command

use std::path::Path;

use crate::formats::bwx::decode_with_options;
use crate::import::{ImportOptions, import_bytes};

/// Write the scene, or the raw records, as pretty JSON.
pub fn execute(
    path: &Path,
    output: Option<&Path>,
    raw: bool,
    options: &ImportOptions,
) -> anyhow::Result<()> {
    let data = std::fs::read(path)?;
    let json = if raw {
        let container = decode_with_options(&data, &options.decode_options())?;
        serde_json::to_string_pretty(&container)?
    } else {
        let scene = import_bytes(&data, Some(path), options)?;
        serde_json::to_string_pretty(&scene)?
    };

    match output {
        Some(output) => {
            std::fs::write(output, json)?;
            println!("Written to: {}", output.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
