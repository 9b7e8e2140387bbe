//! Textures command

use std::path::Path;

use crate::import::{ImportOptions, import_file};

/// List the textures a model references and where each one resolved.
pub fn execute(path: &Path, missing_only: bool, options: &ImportOptions) -> anyhow::Result<()> {
    let scene = import_file(path, options)?;

    println!("Textures for: {}", path.display());
    println!();
    for texture in &scene.textures {
        match texture.resolved_path() {
            Some(found) if !missing_only => {
                println!("  {} -> {}", texture.path, found.display());
            }
            Some(_) => {}
            None => {
                println!("  {} -> (not found)", texture.path);
                for root in &texture.search_roots {
                    println!("      searched {}", root.display());
                }
            }
        }
    }

    let missing = scene
        .textures
        .iter()
        .filter(|t| t.resolved_path().is_none())
        .count();
    println!();
    println!("{} textures, {} missing", scene.textures.len(), missing);
    Ok(())
}
