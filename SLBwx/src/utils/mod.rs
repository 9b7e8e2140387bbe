//! Utility functions

pub mod path;

pub use path::{file_stem, normalize_path, relative_path, texture_key};
