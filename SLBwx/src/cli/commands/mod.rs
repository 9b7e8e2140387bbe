use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::import::ImportOptions;

pub mod dump;
pub mod execute;
pub mod inspect;
pub mod scan;
pub mod textures;

/// Import switches shared by every command
#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// Skip shape-key and transform animation tracks
    #[arg(long)]
    pub no_animations: bool,

    /// Skip cameras
    #[arg(long)]
    pub no_cameras: bool,

    /// Keep effect/event helper objects (EV_, EP_, @, SFX, billboard)
    #[arg(long)]
    pub keep_helpers: bool,

    /// Fail on dangling references instead of dropping them
    #[arg(long)]
    pub strict: bool,

    /// Depth limit for the Graphic texture directory search
    #[arg(long, default_value_t = crate::scene::MAX_GRAPHIC_SEARCH_DEPTH)]
    pub graphic_depth: usize,
}

impl ImportArgs {
    #[must_use]
    pub fn options(&self) -> ImportOptions {
        let mut options = ImportOptions::default().with_graphic_search_depth(self.graphic_depth);
        if self.no_animations {
            options = options.no_animations();
        }
        if self.no_cameras {
            options = options.no_cameras();
        }
        if self.keep_helpers {
            options = options.keep_helper_objects();
        }
        if self.strict {
            options = options.strict();
        }
        options
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the structure of a BNX/PNX file
    Inspect {
        /// Source BNX/PNX file
        path: PathBuf,

        /// List every object with its mesh and track counts
        #[arg(short, long)]
        objects: bool,

        #[command(flatten)]
        import: ImportArgs,
    },

    /// Dump the scene (or the raw records) as JSON
    Dump {
        /// Source BNX/PNX file
        path: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Dump decoded records instead of the built scene
        #[arg(long)]
        raw: bool,

        #[command(flatten)]
        import: ImportArgs,
    },

    /// List texture references and where they resolved
    Textures {
        /// Source BNX/PNX file
        path: PathBuf,

        /// Only show textures that were not found
        #[arg(short, long)]
        missing: bool,

        #[command(flatten)]
        import: ImportArgs,
    },

    /// Import every BNX/PNX file under a directory
    Scan {
        /// Directory to search
        dir: PathBuf,

        /// Write per-file results as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,

        #[command(flatten)]
        import: ImportArgs,
    },
}
