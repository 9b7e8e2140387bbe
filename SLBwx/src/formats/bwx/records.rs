//! Raw records produced by the decoder
//!
//! These mirror the on-disk layout of one dialect with the envelope and
//! tagging stripped away. Nothing here is normalized: UVs, winding and
//! cross-references are exactly as stored. See [`crate::scene`] for the
//! linked model.

use serde::{Deserialize, Serialize};

use super::{DIRECTION_MNHX, DIRECTION_MSHX, Dialect};

/// Decoded HEAD block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHeader {
    pub name: String,
    pub description: String,
    /// Version word as stored (0x0500 or 0x0602).
    pub version: u16,
    pub dialect: Dialect,
}

/// `TEX` record attached to a sub-material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTexture {
    pub flags: i64,
    /// File name as stored, usually relative with `\` separators.
    pub filename: String,
}

/// `SUBMTRL` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSubMaterial {
    /// Packed ARGB colours.
    pub diffuse: i64,
    pub ambient: i64,
    pub specular: i64,
    pub shininess: f32,
    pub highlight: f32,
    pub flags: i64,
    pub blend: i64,
    pub texture: Option<RawTexture>,
}

/// `MTRL` record: a named group of sub-materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMaterial {
    pub name: String,
    pub sub_materials: Vec<RawSubMaterial>,
}

/// Per-object winding flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawDirection {
    /// `MNHX`
    Normal,
    /// `MSHX`: stored faces are clockwise-front.
    Reversed,
}

impl RawDirection {
    #[must_use]
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            DIRECTION_MNHX => Some(Self::Normal),
            DIRECTION_MSHX => Some(Self::Reversed),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_reversed(self) -> bool {
        self == Self::Reversed
    }
}

/// One vertex frame of a mesh (`MESHF` / `DXMESHF`).
///
/// The first frame is the base mesh; later frames replace positions only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMeshFrame {
    pub timeline: u32,
    pub positions: Vec<[f32; 3]>,
    /// Empty for SLv1, which stores no normals.
    pub normals: Vec<[f32; 3]>,
    /// Empty when the frame carries no UVs (SLv1 frames after the first).
    pub uvs: Vec<[f32; 2]>,
}

/// `MESH` / `DXMESH` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMesh {
    /// Slot in the owning object's material group.
    pub sub_material: Option<i64>,
    pub frames: Vec<RawMeshFrame>,
    /// Triangle list, three indices per face.
    pub indices: Vec<u32>,
}

/// One `MATRIX` sample: 16 floats, translation in elements 12..15.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMatrixSample {
    pub timeline: u32,
    pub matrix: [f32; 16],
}

/// A `MATRIX` record and the object it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMatrixTrack {
    /// Index of the owning object in [`RawContainer::objects`].
    pub object: usize,
    pub samples: Vec<RawMatrixSample>,
}

/// `OBJ2` / `DXOBJ` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObject {
    pub name: String,
    /// Index into [`RawContainer::materials`]; negative means none.
    pub material: i64,
    pub direction: RawDirection,
    pub meshes: Vec<RawMesh>,
    /// BWX files store no hierarchy, so the decoder always leaves this empty.
    pub parent: Option<usize>,
}

/// One `B` frame of a camera record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCameraFrame {
    pub timeline: u32,
    pub eye: [f32; 16],
    pub target: [f32; 16],
    pub unknown: [f32; 6],
}

/// `CAM` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCamera {
    pub name: String,
    pub frames: Vec<RawCameraFrame>,
}

/// Everything decoded from one BWX buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawContainer {
    pub header: RawHeader,
    pub materials: Vec<RawMaterial>,
    pub objects: Vec<RawObject>,
    pub transform_tracks: Vec<RawMatrixTrack>,
    pub cameras: Vec<RawCamera>,
    /// Names of blocks kept opaque (`LIGHT`, `SOUND`, ...).
    pub extra_blocks: Vec<String>,
    /// Offsets of strings decoded with replacement characters.
    pub lossy_strings: Vec<usize>,
}

impl RawContainer {
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.header.dialect
    }

    /// Total number of mesh frames across all objects.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.objects
            .iter()
            .flat_map(|o| &o.meshes)
            .map(|m| m.frames.len())
            .sum()
    }
}
