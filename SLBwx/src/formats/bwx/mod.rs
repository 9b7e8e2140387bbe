//! BWX container format (ShiningLore `.BNX` / `.PNX` models)
//!
//! A BWX file is a `BWXF` envelope holding named top-level blocks. Every
//! block payload is built from one tagged value encoding (see [`Value`]),
//! nested into arrays whose leading string names the record type.
//!
//! Two dialects share the envelope and differ in their object records:
//! - **SLv1** (`OBJ2`/`MESH`): one tagged value per vertex, UVs per vertex,
//!   no stored normals
//! - **SLv2** (`DXOBJ`/`DXMESH`): interleaved 32-byte vertex buffers and
//!   u16 index buffers

mod cursor;
pub mod decoder;
mod grammar;
pub mod records;
pub mod strings;
pub mod value;

use serde::{Deserialize, Serialize};

pub use cursor::{BwxCursor, LengthPrefix, TextEncoding};
pub use decoder::{DecodeOptions, decode, decode_with_options, read_bwx};
pub use records::{
    RawCamera, RawCameraFrame, RawContainer, RawDirection, RawHeader, RawMaterial, RawMatrixSample,
    RawMatrixTrack, RawMesh, RawMeshFrame, RawObject, RawSubMaterial, RawTexture,
};
pub use value::Value;

/// File magic at offset 0.
pub const BWX_MAGIC: &[u8; 4] = b"BWXF";

/// Envelope terminator after the last block.
pub const BWX_ENDING: &[u8; 4] = b"FXWB";

/// String stored in the `"0"` signature block.
pub const SLBWX_SIGNATURE: &str = "SLBWX";

/// Magic integer stored in the HEAD block ("PNX\0").
pub const PNX_MAGIC: i32 = 0x504E5800;

/// Magic integer stored in each camera record ("CAMR").
pub const CAMR_MAGIC: i32 = 0x43414D52;

/// HEAD version word for SLv1.
pub const SLV1_VERSION: u16 = 0x0500;

/// HEAD version word for SLv2.
pub const SLV2_VERSION: u16 = 0x0602;

/// Direction word for normal winding ("MNHX").
pub const DIRECTION_MNHX: u32 = 0x4D4E4858;

/// Direction word for reversed winding ("MSHX").
pub const DIRECTION_MSHX: u32 = 0x4D534858;

/// Inline-block tag of an SLv1 matrix sample (timeline + 16 floats).
pub const MATRIX_MARKER_SLV1: u8 = 0xC4;

/// Inline-block tag of an SLv2 matrix sample (timeline + 16 floats + 7 floats).
pub const MATRIX_MARKER_SLV2: u8 = 0xE0;

/// Size of one interleaved SLv2 vertex (position, normal, uv).
pub const VERTEX_SIZE_SLV2: usize = 32;

/// Trailing padding vertices appended to every SLv2 vertex buffer.
pub const EXTRA_VERTICES_SLV2: usize = 2;

/// Timeline ticks per animation frame.
pub const TIMELINE_BASE: u32 = 32;

/// File extensions used by BWX models.
pub const BWX_EXTENSIONS: &[&str] = &["bnx", "pnx"];

/// BWX dialect, selected once from the HEAD version word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// `OBJ2` / `MESH` records.
    SLv1,
    /// `DXOBJ` / `DXMESH` records.
    SLv2,
}

impl Dialect {
    /// Map a HEAD version word to its dialect.
    #[must_use]
    pub fn from_version(version: u16) -> Option<Self> {
        match version {
            SLV1_VERSION => Some(Self::SLv1),
            SLV2_VERSION => Some(Self::SLv2),
            _ => None,
        }
    }

    /// Dialect that owns a top-level object block name, if any.
    #[must_use]
    pub fn of_object_block(name: &str) -> Option<Self> {
        match name {
            "OBJ2" | "OBJECT" => Some(Self::SLv1),
            "DXOBJ" | "SPOB" => Some(Self::SLv2),
            _ => None,
        }
    }

    /// Type string leading each object record.
    #[must_use]
    pub fn object_tag(self) -> &'static str {
        match self {
            Self::SLv1 => "OBJ2",
            Self::SLv2 => "DXOBJ",
        }
    }

    /// Inline-block tag of a matrix sample.
    #[must_use]
    pub fn matrix_marker(self) -> u8 {
        match self {
            Self::SLv1 => MATRIX_MARKER_SLV1,
            Self::SLv2 => MATRIX_MARKER_SLV2,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SLv1 => write!(f, "SLv1"),
            Self::SLv2 => write!(f, "SLv2"),
        }
    }
}

/// Convert a timeline value to an animation frame number.
#[must_use]
pub fn timeline_to_frame(timeline: u32) -> f32 {
    timeline as f32 / TIMELINE_BASE as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_version() {
        assert_eq!(Dialect::from_version(0x0500), Some(Dialect::SLv1));
        assert_eq!(Dialect::from_version(0x0602), Some(Dialect::SLv2));
        assert_eq!(Dialect::from_version(0x0601), None);
    }

    #[test]
    fn test_object_block_names() {
        assert_eq!(Dialect::of_object_block("OBJECT"), Some(Dialect::SLv1));
        assert_eq!(Dialect::of_object_block("SPOB"), Some(Dialect::SLv2));
        assert_eq!(Dialect::of_object_block("CAM"), None);
    }

    #[test]
    fn test_timeline_to_frame() {
        assert!((timeline_to_frame(96) - 3.0).abs() < f32::EPSILON);
        assert!((timeline_to_frame(16) - 0.5).abs() < f32::EPSILON);
    }
}
