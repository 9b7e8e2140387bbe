//! Scene model produced from a decoded BWX container
//!
//! All cross references are indices into the owning `Vec`s of [`Scene`],
//! so the model can be cloned and serialized freely.

use std::path::{Path, PathBuf};

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::formats::bwx::Dialect;

/// Vertical field of view given to every camera (degrees).
pub const DEFAULT_CAMERA_FOV: f32 = 38.6;

// ============================================================================
// Scene
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub dialect: Dialect,
    /// HEAD name.
    pub name: String,
    /// HEAD description.
    pub description: String,
    /// Derived from the file name (`HEROBIO_default.PNX` -> `default`).
    pub animation_name: String,
    pub textures: Vec<Texture>,
    pub materials: Vec<Material>,
    pub objects: Vec<Object>,
    pub cameras: Vec<Camera>,
    /// Non-fatal findings collected while building.
    pub diagnostics: Vec<Diagnostic>,
}

/// Counts for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSummary {
    pub objects: usize,
    pub meshes: usize,
    pub vertices: usize,
    pub faces: usize,
    pub materials: usize,
    pub textures: usize,
    pub unresolved_textures: usize,
    pub shape_key_tracks: usize,
    pub transform_tracks: usize,
    pub cameras: usize,
}

impl Scene {
    #[must_use]
    pub fn summary(&self) -> SceneSummary {
        let meshes = self.objects.iter().filter_map(|o| o.mesh.as_ref());
        SceneSummary {
            objects: self.objects.len(),
            meshes: meshes.clone().count(),
            vertices: meshes.clone().map(|m| m.vertices.len()).sum(),
            faces: meshes.map(|m| m.faces.len()).sum(),
            materials: self.materials.len(),
            textures: self.textures.len(),
            unresolved_textures: self
                .textures
                .iter()
                .filter(|t| t.resolved_path().is_none())
                .count(),
            shape_key_tracks: self
                .objects
                .iter()
                .filter(|o| o.shape_keys.is_some())
                .count(),
            transform_tracks: self.transform_tracks().count(),
            cameras: self.cameras.len(),
        }
    }

    /// Every transform track in the scene, objects first, then cameras.
    pub fn transform_tracks(&self) -> impl Iterator<Item = &TransformTrack> {
        self.objects
            .iter()
            .flat_map(|o| o.transform_tracks.iter())
            .chain(
                self.cameras
                    .iter()
                    .flat_map(|c| c.track.iter().chain(c.target_track.iter())),
            )
    }

    /// Find an object by name.
    #[must_use]
    pub fn object(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|o| o.name == name)
    }
}

// ============================================================================
// Textures and materials
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureResolution {
    Resolved(PathBuf),
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Texture {
    /// Path as stored, with `/` separators.
    pub path: String,
    /// File stem for display.
    pub name: String,
    /// Directories that were searched, in order.
    pub search_roots: Vec<PathBuf>,
    pub resolution: TextureResolution,
}

impl Texture {
    #[must_use]
    pub fn resolved_path(&self) -> Option<&Path> {
        match &self.resolution {
            TextureResolution::Resolved(path) => Some(path),
            TextureResolution::Unresolved => None,
        }
    }
}

/// One sub-material of a BWX material group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Name of the owning material group.
    pub name: String,
    /// Index of the material group in the file.
    pub group: usize,
    /// Position within the group.
    pub slot: usize,
    /// RGBA in 0..=1.
    pub diffuse: [f32; 4],
    pub ambient: [f32; 4],
    pub specular: [f32; 4],
    pub shininess: f32,
    pub highlight: f32,
    pub flags: i64,
    pub blend: i64,
    /// Index into [`Scene::textures`].
    pub texture: Option<usize>,
}

/// Unpack an ARGB colour word into RGBA floats.
#[must_use]
pub fn unpack_argb(value: i64) -> [f32; 4] {
    let v = value as u32;
    let channel = |shift: u32| ((v >> shift) & 0xFF) as f32 / 255.0;
    [channel(16), channel(8), channel(0), channel(24)]
}

// ============================================================================
// Geometry
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// V is bottom-up for both dialects.
    pub uv: [f32; 2],
}

/// A run of faces sharing one material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceGroup {
    /// Index into [`Scene::materials`].
    pub material: Option<usize>,
    pub first_face: usize,
    pub face_count: usize,
}

/// Triangle mesh with counter-clockwise front faces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<[u32; 3]>,
    pub groups: Vec<FaceGroup>,
}

// ============================================================================
// Animation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeKeyFrame {
    pub timeline: u32,
    pub frame: f32,
    /// One position per vertex of the owning mesh.
    pub positions: Vec<[f32; 3]>,
}

/// Per-vertex morph animation. Timelines strictly increase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeKeyTrack {
    pub name: String,
    pub frames: Vec<ShapeKeyFrame>,
}

/// Decomposed affine transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: [f32; 3],
    /// Quaternion `[x, y, z, w]`.
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
        }
    }
}

impl Transform {
    /// Decompose a column-major 4x4 matrix.
    ///
    /// Singular matrices keep their translation with zero scale.
    #[must_use]
    pub fn from_matrix(matrix: &[f32; 16]) -> Self {
        let mat = Mat4::from_cols_array(matrix);
        let det = mat.determinant();
        if det == 0.0 || !det.is_finite() {
            return Self {
                translation: mat.w_axis.truncate().to_array(),
                rotation: Quat::IDENTITY.to_array(),
                scale: Vec3::ZERO.to_array(),
            };
        }
        let (scale, rotation, translation) = mat.to_scale_rotation_translation();
        Self {
            translation: translation.to_array(),
            rotation: rotation.to_array(),
            scale: scale.to_array(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformSample {
    pub timeline: u32,
    pub frame: f32,
    /// Column-major, translation in elements 12..15.
    pub matrix: [f32; 16],
    pub transform: Transform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackTarget {
    /// Index into [`Scene::objects`].
    Object(usize),
    /// Index into [`Scene::cameras`].
    Camera(usize),
}

/// Time-sampled transforms. Timelines strictly increase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformTrack {
    pub name: String,
    pub target: TrackTarget,
    pub samples: Vec<TransformSample>,
}

// ============================================================================
// Objects and cameras
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub name: String,
    /// Index into [`Scene::objects`]; `None` for roots.
    pub parent: Option<usize>,
    /// Whether the stored faces were clockwise (`MSHX`).
    pub reversed_winding: bool,
    pub mesh: Option<Mesh>,
    pub shape_keys: Option<ShapeKeyTrack>,
    pub transform_tracks: Vec<TransformTrack>,
    /// Rest pose from the first matrix sample.
    pub transform: Option<Transform>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub fov_degrees: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_degrees: DEFAULT_CAMERA_FOV,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub name: String,
    pub projection: Projection,
    /// Eye transform of the first frame.
    pub transform: Option<Transform>,
    /// Look-at point of the first frame.
    pub target: Option<[f32; 3]>,
    /// Eye animation.
    pub track: Option<TransformTrack>,
    /// Look-at animation.
    pub target_track: Option<TransformTrack>,
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Something the builder tolerated rather than failed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// No candidate file existed for a texture path.
    UnresolvedTexture { path: String },
    /// A reference was dropped because its target does not exist.
    DanglingReference {
        kind: String,
        owner: String,
        index: i64,
        len: usize,
    },
    /// A helper object (effects, billboards, events) was left out.
    SkippedHelperObject { name: String },
    /// A string contained bytes outside EUC-KR and was decoded lossily.
    UndecodableString { offset: usize },
    /// A top-level block that is not decoded.
    OpaqueBlock { name: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnresolvedTexture { path } => write!(f, "texture not found: {path}"),
            Self::DanglingReference {
                kind,
                owner,
                index,
                len,
            } => write!(
                f,
                "{owner}: dropped {kind} reference {index} ({len} available)"
            ),
            Self::SkippedHelperObject { name } => write!(f, "skipped helper object {name}"),
            Self::UndecodableString { offset } => {
                write!(f, "string at {offset:#x} contained undecodable bytes")
            }
            Self::OpaqueBlock { name } => write!(f, "block {name} not decoded"),
        }
    }
}
