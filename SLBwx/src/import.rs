//! Import entry points: decode a BWX file and build its scene
//!
//! ```no_run
//! use slbwx::import::{import_file, ImportOptions};
//!
//! let scene = import_file("HEROBIO_default.PNX", &ImportOptions::default().no_cameras())?;
//! for object in &scene.objects {
//!     println!("{} ({} tracks)", object.name, object.transform_tracks.len());
//! }
//! # Ok::<(), slbwx::Error>(())
//! ```

use std::path::Path;

use crate::error::Result;
use crate::formats::bwx::{DecodeOptions, decode_with_options};
use crate::scene::{MAX_GRAPHIC_SEARCH_DEPTH, Scene, build};

/// Name prefixes of effect, event and billboard helper objects.
pub const HELPER_OBJECT_PREFIXES: [&str; 5] = ["EV_", "EP_", "@", "SFX", "billboard"];

/// Whether `name` is a helper object rather than renderable geometry.
#[must_use]
pub fn is_helper_object(name: &str) -> bool {
    HELPER_OBJECT_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Animation name carried in a model file name.
///
/// `HEROBIO_default.PNX` names `default`; a stem without `_` names itself.
#[must_use]
pub fn animation_name_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy();
    let name = stem.split_once('_').map_or(&*stem, |(_, rest)| rest);
    Some(name.to_string())
}

/// Options for importing a BWX model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Build shape-key and transform tracks
    pub import_animations: bool,
    /// Build cameras from `CAM` records
    pub import_cameras: bool,
    /// Leave out effect/event helper objects (`EV_`, `EP_`, `@`, `SFX`, `billboard`)
    pub skip_helper_objects: bool,
    /// Fail on dangling material, track or parent references instead of
    /// dropping them with a diagnostic
    pub strict_references: bool,
    /// Depth limit for the `Graphic` texture directory search
    pub graphic_search_depth: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            import_animations: true,
            import_cameras: true,
            skip_helper_objects: true,
            strict_references: false,
            graphic_search_depth: MAX_GRAPHIC_SEARCH_DEPTH,
        }
    }
}

impl ImportOptions {
    /// Skip shape-key and transform track construction
    #[must_use]
    pub fn no_animations(mut self) -> Self {
        self.import_animations = false;
        self
    }

    /// Skip camera construction
    #[must_use]
    pub fn no_cameras(mut self) -> Self {
        self.import_cameras = false;
        self
    }

    /// Keep helper objects in the scene
    #[must_use]
    pub fn keep_helper_objects(mut self) -> Self {
        self.skip_helper_objects = false;
        self
    }

    /// Treat dangling references as errors
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict_references = true;
        self
    }

    /// Set the `Graphic` search depth limit
    #[must_use]
    pub fn with_graphic_search_depth(mut self, depth: usize) -> Self {
        self.graphic_search_depth = depth;
        self
    }

    pub(crate) fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            animations: self.import_animations,
            cameras: self.import_cameras,
        }
    }
}

/// Import a `.BNX` / `.PNX` file.
///
/// Textures are resolved relative to the file's directory.
///
/// # Errors
/// Returns [`crate::Error::Io`] if the file cannot be read, or any decode or
/// build error.
pub fn import_file<P: AsRef<Path>>(path: P, options: &ImportOptions) -> Result<Scene> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "importing BWX file");
    let data = std::fs::read(path)?;
    import_bytes(&data, Some(path), options)
}

/// Import a BWX buffer.
///
/// `base_path` is the model's file path (or its directory); it anchors
/// texture resolution and names the animation. Without it, every texture
/// is unresolved.
pub fn import_bytes(data: &[u8], base_path: Option<&Path>, options: &ImportOptions) -> Result<Scene> {
    let raw = decode_with_options(data, &options.decode_options())?;
    build(&raw, base_path, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ImportOptions::default();
        assert!(options.import_animations);
        assert!(options.import_cameras);
        assert!(options.skip_helper_objects);
        assert!(!options.strict_references);
        assert_eq!(options.graphic_search_depth, MAX_GRAPHIC_SEARCH_DEPTH);
    }

    #[test]
    fn test_builder_methods() {
        let options = ImportOptions::default()
            .no_animations()
            .no_cameras()
            .keep_helper_objects()
            .strict()
            .with_graphic_search_depth(2);
        assert_eq!(
            options.decode_options(),
            DecodeOptions {
                animations: false,
                cameras: false
            }
        );
        assert!(!options.skip_helper_objects);
        assert!(options.strict_references);
        assert_eq!(options.graphic_search_depth, 2);
    }

    #[test]
    fn test_helper_objects() {
        assert!(is_helper_object("EV_door"));
        assert!(is_helper_object("@dummy"));
        assert!(is_helper_object("SFX01"));
        assert!(is_helper_object("billboard_tree"));
        assert!(!is_helper_object("Billboard"));
        assert!(!is_helper_object("body"));
    }

    #[test]
    fn test_animation_name_from_path() {
        assert_eq!(
            animation_name_from_path(Path::new("model/HEROBIO_default.PNX")).as_deref(),
            Some("default")
        );
        assert_eq!(
            animation_name_from_path(Path::new("HERO_attack_01.pnx")).as_deref(),
            Some("attack_01")
        );
        assert_eq!(
            animation_name_from_path(Path::new("character.PNX")).as_deref(),
            Some("character")
        );
    }

    #[test]
    fn test_import_missing_file() {
        let err = import_file("/nonexistent/model.pnx", &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
