//! Intermediate scene model and the builder that produces it
//!
//! [`build`] turns a [`RawContainer`](crate::formats::bwx::RawContainer) into
//! a [`Scene`]: UVs, winding and normals are normalized, materials and
//! textures are linked, and shape-key and transform tracks are assembled.

pub mod builder;
pub mod hierarchy;
pub mod normals;
pub mod textures;
pub mod types;

pub use builder::build;
pub use hierarchy::validate_hierarchy;
pub use normals::smooth_normals;
pub use textures::{GRAPHIC_DIR, MAX_GRAPHIC_SEARCH_DEPTH, TextureLookup, resolve_texture};
pub use types::*;
