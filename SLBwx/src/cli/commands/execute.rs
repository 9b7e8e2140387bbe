//! Command execution implementations

use super::Commands;
use super::{dump, inspect, scan, textures};

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Inspect {
                path,
                objects,
                import,
            } => inspect::execute(path, *objects, &import.options()),
            Commands::Dump {
                path,
                output,
                raw,
                import,
            } => dump::execute(path, output.as_deref(), *raw, &import.options()),
            Commands::Textures {
                path,
                missing,
                import,
            } => textures::execute(path, *missing, &import.options()),
            Commands::Scan {
                dir,
                json,
                quiet,
                import,
            } => scan::execute(dir, json.as_deref(), *quiet, &import.options()),
        }
    }
}
