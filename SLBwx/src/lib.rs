//! # SLBwx
//!
//! A pure-Rust library for reading ShiningLore BWX 3D assets.
//!
//! ## Supported Formats
//!
//! - **BNX / PNX** - BWX containers in both dialects:
//!   - **SLv1** - `OBJ2` / `MESH` records, inline vertex arrays
//!   - **SLv2** - `DXOBJ` / `DXMESH` records, packed vertex buffers
//!
//! Decoding yields raw records ([`formats::bwx::RawContainer`]); building
//! yields a renderer-agnostic [`scene::Scene`] with meshes, materials,
//! textures, shape-key and transform tracks, and cameras.
//!
//! ## Quick Start
//!
//! ### Importing a Model
//!
//! ```no_run
//! use slbwx::import::{import_file, ImportOptions};
//!
//! let scene = import_file("Graphic/Hero/HEROBIO_default.PNX", &ImportOptions::default())?;
//! println!("{} objects, {} textures", scene.objects.len(), scene.textures.len());
//!
//! for texture in &scene.textures {
//!     if texture.resolved_path().is_none() {
//!         println!("missing: {}", texture.path);
//!     }
//! }
//! # Ok::<(), slbwx::Error>(())
//! ```
//!
//! ### Decoding Raw Records
//!
//! ```no_run
//! use slbwx::formats::bwx::read_bwx;
//!
//! let raw = read_bwx("HEROBIO_default.PNX")?;
//! println!("{} ({} mesh frames)", raw.dialect(), raw.frame_count());
//! # Ok::<(), slbwx::Error>(())
//! ```
//!
//! ### Using the Prelude
//!
//! ```
//! use slbwx::prelude::*;
//!
//! // Now you have access to:
//! // - import_file, import_bytes, ImportOptions
//! // - decode, RawContainer, Dialect
//! // - Scene, Object, Mesh, Material, Texture, Camera
//! // - Error, Result, and more
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `slbwx` command-line binary

pub mod error;
pub mod formats;
pub mod scene;
pub mod import;
pub mod batch;
pub mod utils;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::formats::bwx::{
        DecodeOptions, Dialect, RawContainer, decode, decode_with_options, read_bwx,
    };

    pub use crate::import::{ImportOptions, import_bytes, import_file};
    pub use crate::scene::{
        Camera, Diagnostic, FaceGroup, Material, Mesh, Object, Scene, SceneSummary,
        ShapeKeyTrack, Texture, TextureResolution, TrackTarget, Transform, TransformTrack,
        Vertex, build,
    };

    pub use crate::batch::{BatchImportResult, batch_import, find_bwx_files};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
