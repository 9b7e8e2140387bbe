//! Record readers for the structured BWX blocks
//!
//! Every structured record opens with an `A size count` header followed by
//! a string naming its type. The `size` field is not reliable in files
//! written by third-party tools and is ignored; `count` gates optional and
//! repeated fields.

#![allow(clippy::cast_possible_truncation)]

use byteorder::{ByteOrder, LittleEndian};

use super::cursor::BwxCursor;
use super::decoder::DecodeOptions;
use super::records::{
    RawCamera, RawCameraFrame, RawDirection, RawHeader, RawMaterial, RawMatrixSample,
    RawMatrixTrack, RawMesh, RawMeshFrame, RawObject, RawSubMaterial, RawTexture,
};
use super::value::{TAG_ARRAY, TAG_BYTES, TAG_I32, TAG_INLINE, Value};
use super::{CAMR_MAGIC, Dialect, PNX_MAGIC, SLBWX_SIGNATURE, VERTEX_SIZE_SLV2};
use crate::error::{Error, Result};

/// Smallest encoded `A size count` record.
const MIN_RECORD_SIZE: usize = 3;

/// Smallest encoded tagged value.
const MIN_VALUE_SIZE: usize = 1;

/// Timeline + 16 floats.
const MATRIX_SAMPLE_SIZE: usize = 4 + 16 * 4;

/// SLv2 samples carry 7 extra floats.
const MATRIX_SAMPLE_EXTRA_SLV2: usize = 7 * 4;

/// Timeline + eye matrix + target matrix + 6 floats.
const CAMERA_FRAME_SIZE: usize = 4 + 16 * 4 + 16 * 4 + 6 * 4;

/// `B` tag and a one-byte size ahead of each camera frame.
const MIN_CAMERA_FRAME_SIZE: usize = 2 + CAMERA_FRAME_SIZE;

/// Fields of an object record before the optional trailing value appears.
const OBJECT_BASE_FIELDS: usize = 10;

/// Fields of a sub-material record before the optional `TEX` record.
const SUB_MATERIAL_BASE_FIELDS: usize = 8;

// ============================================================================
// Shared field readers
// ============================================================================

/// Read an `A size count` header and return `count`.
fn read_record_header(cursor: &mut BwxCursor<'_>) -> Result<usize> {
    cursor.expect_u8(TAG_ARRAY, "array")?;
    let _size = cursor.read_varint()?;
    cursor.read_count()
}

fn expect_record_type(cursor: &mut BwxCursor<'_>, name: &str) -> Result<()> {
    let offset = cursor.position();
    let value = Value::read(cursor)?;
    if value.as_str() == Some(name) {
        Ok(())
    } else {
        Err(Error::malformed(
            offset,
            format!("expected {name} record, found {}", value.describe()),
        ))
    }
}

/// A name or description field. Non-string values read as empty text.
fn read_text(cursor: &mut BwxCursor<'_>) -> Result<String> {
    Ok(match Value::read(cursor)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn read_int(cursor: &mut BwxCursor<'_>, what: &str) -> Result<i64> {
    let offset = cursor.position();
    let value = Value::read(cursor)?;
    value.as_int().ok_or_else(|| {
        Error::malformed(
            offset,
            format!("expected integer {what}, found {}", value.describe()),
        )
    })
}

fn read_float(cursor: &mut BwxCursor<'_>, what: &str) -> Result<f32> {
    let offset = cursor.position();
    let value = Value::read(cursor)?;
    value.as_f32().ok_or_else(|| {
        Error::malformed(
            offset,
            format!("expected float {what}, found {}", value.describe()),
        )
    })
}

/// A non-negative integer value used as a length.
fn read_length(cursor: &mut BwxCursor<'_>, what: &str) -> Result<usize> {
    let offset = cursor.position();
    let value = read_int(cursor, what)?;
    usize::try_from(value)
        .map_err(|_| Error::malformed(offset, format!("negative {what} {value}")))
}

fn read_timeline(cursor: &mut BwxCursor<'_>) -> Result<u32> {
    let offset = cursor.position();
    let value = read_int(cursor, "timeline")?;
    u32::try_from(value)
        .map_err(|_| Error::malformed(offset, format!("timeline {value} out of range")))
}

/// A `B` payload or inline block, borrowed from the buffer.
fn read_raw_bytes<'a>(cursor: &mut BwxCursor<'a>, what: &str) -> Result<&'a [u8]> {
    let offset = cursor.position();
    let tag = cursor.read_u8()?;
    let len = if tag == TAG_BYTES {
        cursor.read_count()?
    } else if tag > TAG_INLINE {
        usize::from(tag & 0x7F)
    } else {
        return Err(Error::malformed(
            offset,
            format!("expected raw bytes for {what}, found tag {tag:#04x}"),
        ));
    };
    cursor.read_fixed_bytes(len)
}

fn read_float_block<const N: usize>(cursor: &mut BwxCursor<'_>, what: &str) -> Result<[f32; N]> {
    let offset = cursor.position();
    let bytes = read_raw_bytes(cursor, what)?;
    if bytes.len() < N * 4 {
        return Err(Error::malformed(
            offset,
            format!("{what} block holds {} bytes, expected {}", bytes.len(), N * 4),
        ));
    }
    let mut out = [0f32; N];
    LittleEndian::read_f32_into(&bytes[..N * 4], &mut out);
    Ok(out)
}

fn expect_i32_const(cursor: &mut BwxCursor<'_>, expected: i32, what: &str) -> Result<()> {
    cursor.expect_u8(TAG_I32, what)?;
    let offset = cursor.position();
    let found = cursor.read_i32()?;
    if found != expected {
        return Err(Error::malformed(
            offset,
            format!("expected {what} {expected:#010x}, found {found:#010x}"),
        ));
    }
    Ok(())
}

fn skip_values(cursor: &mut BwxCursor<'_>, count: usize) -> Result<()> {
    for _ in 0..count {
        Value::skip(cursor)?;
    }
    Ok(())
}

/// Faces must be whole triangles over the base frame's vertices.
fn validate_triangles(indices: &[u32], vertex_count: usize, offset: usize) -> Result<()> {
    if indices.len() % 3 != 0 {
        return Err(Error::malformed(
            offset,
            format!("index count {} is not a multiple of 3", indices.len()),
        ));
    }
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(Error::malformed(
            offset,
            format!("vertex index {bad} out of range for {vertex_count} vertices"),
        ));
    }
    Ok(())
}

// ============================================================================
// Signature, HEAD, MTRL
// ============================================================================

/// The `"0"` block: a single `SLBWX` string.
pub(super) fn read_signature(cursor: &mut BwxCursor<'_>) -> Result<()> {
    expect_record_type(cursor, SLBWX_SIGNATURE)
}

pub(super) fn read_header(cursor: &mut BwxCursor<'_>) -> Result<RawHeader> {
    let _count = read_record_header(cursor)?;
    let name = read_text(cursor)?;
    let description = read_text(cursor)?;
    expect_i32_const(cursor, PNX_MAGIC, "PNX magic")?;
    cursor.expect_u8(b'W', "version")?;
    let version_offset = cursor.position();
    let version = cursor.read_u16()?;
    let dialect = Dialect::from_version(version).ok_or(Error::UnknownDialect {
        offset: version_offset,
        version,
    })?;
    Value::skip(cursor)?;

    tracing::debug!(%dialect, name = %name, "read HEAD");
    Ok(RawHeader {
        name,
        description,
        version,
        dialect,
    })
}

pub(super) fn read_materials(cursor: &mut BwxCursor<'_>) -> Result<Vec<RawMaterial>> {
    let count = read_record_header(cursor)?;
    cursor.check_count(count, MIN_RECORD_SIZE, "material")?;
    let mut materials = Vec::with_capacity(count);
    for _ in 0..count {
        materials.push(read_material(cursor)?);
    }
    tracing::debug!(count = materials.len(), "read MTRL");
    Ok(materials)
}

fn read_material(cursor: &mut BwxCursor<'_>) -> Result<RawMaterial> {
    let start = cursor.position();
    let count = read_record_header(cursor)?;
    expect_record_type(cursor, "MTRL")?;
    let name = read_text(cursor)?;

    let sub_count = count.checked_sub(2).ok_or_else(|| {
        Error::malformed(start, format!("MTRL record declares {count} fields"))
    })?;
    cursor.check_count(sub_count, MIN_RECORD_SIZE, "sub-material")?;
    let mut sub_materials = Vec::with_capacity(sub_count);
    for _ in 0..sub_count {
        sub_materials.push(read_sub_material(cursor)?);
    }

    Ok(RawMaterial {
        name,
        sub_materials,
    })
}

fn read_sub_material(cursor: &mut BwxCursor<'_>) -> Result<RawSubMaterial> {
    let count = read_record_header(cursor)?;
    expect_record_type(cursor, "SUBMTRL")?;
    let diffuse = read_int(cursor, "diffuse colour")?;
    let ambient = read_int(cursor, "ambient colour")?;
    let specular = read_int(cursor, "specular colour")?;
    let shininess = read_float(cursor, "shininess")?;
    let highlight = read_float(cursor, "highlight")?;
    let flags = read_int(cursor, "material flags")?;
    let blend = read_int(cursor, "blend mode")?;
    let texture = if count > SUB_MATERIAL_BASE_FIELDS {
        Some(read_texture(cursor)?)
    } else {
        None
    };

    Ok(RawSubMaterial {
        diffuse,
        ambient,
        specular,
        shininess,
        highlight,
        flags,
        blend,
        texture,
    })
}

fn read_texture(cursor: &mut BwxCursor<'_>) -> Result<RawTexture> {
    let _count = read_record_header(cursor)?;
    expect_record_type(cursor, "TEX")?;
    let flags = read_int(cursor, "texture flags")?;
    let filename = read_text(cursor)?;
    Ok(RawTexture { flags, filename })
}

// ============================================================================
// Objects
// ============================================================================

/// Read an object block, appending to `objects` and `tracks`.
///
/// Track owner indices continue from the objects already decoded, so
/// several object blocks in one file stay consistent.
pub(super) fn read_objects(
    cursor: &mut BwxCursor<'_>,
    dialect: Dialect,
    options: &DecodeOptions,
    objects: &mut Vec<RawObject>,
    tracks: &mut Vec<RawMatrixTrack>,
) -> Result<()> {
    let count = read_record_header(cursor)?;
    cursor.check_count(count, MIN_RECORD_SIZE, "object")?;
    objects.reserve(count);
    for _ in 0..count {
        let index = objects.len();
        let object = read_object(cursor, dialect, options, index, tracks)?;
        objects.push(object);
    }
    tracing::debug!(%dialect, count, "read object block");
    Ok(())
}

fn read_object(
    cursor: &mut BwxCursor<'_>,
    dialect: Dialect,
    options: &DecodeOptions,
    index: usize,
    tracks: &mut Vec<RawMatrixTrack>,
) -> Result<RawObject> {
    let field_count = read_record_header(cursor)?;
    expect_record_type(cursor, dialect.object_tag())?;
    let name = read_text(cursor)?;
    Value::skip(cursor)?;
    let material = read_int(cursor, "object material")?;
    skip_values(cursor, 2)?;
    let direction = read_direction(cursor)?;

    let mesh_count = read_record_header(cursor)?;
    cursor.check_count(mesh_count, MIN_RECORD_SIZE, "mesh")?;
    let mut meshes = Vec::with_capacity(mesh_count);
    for _ in 0..mesh_count {
        meshes.push(match dialect {
            Dialect::SLv1 => read_mesh_v1(cursor, options)?,
            Dialect::SLv2 => read_mesh_v2(cursor, options)?,
        });
    }

    let matrix_count = read_record_header(cursor)?;
    cursor.check_count(matrix_count, MIN_RECORD_SIZE, "matrix")?;
    for _ in 0..matrix_count {
        tracks.push(read_matrix_track(cursor, dialect, options, index)?);
    }

    // sfx, then one more value in longer records
    Value::skip(cursor)?;
    if field_count > OBJECT_BASE_FIELDS {
        Value::skip(cursor)?;
    }

    tracing::debug!(object = %name, meshes = meshes.len(), matrices = matrix_count, "read object");
    Ok(RawObject {
        name,
        material,
        direction,
        meshes,
        parent: None,
    })
}

fn read_direction(cursor: &mut BwxCursor<'_>) -> Result<RawDirection> {
    cursor.expect_u8(TAG_I32, "direction")?;
    let offset = cursor.position();
    let value = cursor.read_u32()?;
    RawDirection::from_u32(value).ok_or_else(|| {
        Error::malformed(offset, format!("unknown direction flag {value:#010x}"))
    })
}

fn read_matrix_track(
    cursor: &mut BwxCursor<'_>,
    dialect: Dialect,
    options: &DecodeOptions,
    object: usize,
) -> Result<RawMatrixTrack> {
    let start = cursor.position();
    let count = read_record_header(cursor)?;
    expect_record_type(cursor, "MATRIX")?;
    let sample_count = count
        .checked_sub(1)
        .ok_or_else(|| Error::malformed(start, "MATRIX record declares no fields"))?;

    let extra = match dialect {
        Dialect::SLv1 => 0,
        Dialect::SLv2 => MATRIX_SAMPLE_EXTRA_SLV2,
    };
    cursor.check_count(sample_count, 1 + MATRIX_SAMPLE_SIZE + extra, "matrix sample")?;

    let keep = sample_count.min(options.frame_limit());
    let mut samples = Vec::with_capacity(keep);
    for i in 0..sample_count {
        cursor.expect_u8(dialect.matrix_marker(), "matrix sample")?;
        if i < keep {
            let timeline = cursor.read_u32()?;
            let matrix = cursor.read_f32_array::<16>()?;
            cursor.skip(extra)?;
            samples.push(RawMatrixSample { timeline, matrix });
        } else {
            cursor.skip(MATRIX_SAMPLE_SIZE + extra)?;
        }
    }

    Ok(RawMatrixTrack { object, samples })
}

// ============================================================================
// SLv1 meshes (MESH / MESHF)
// ============================================================================

fn read_mesh_v1(cursor: &mut BwxCursor<'_>, options: &DecodeOptions) -> Result<RawMesh> {
    let _count = read_record_header(cursor)?;
    expect_record_type(cursor, "MESH")?;

    let frame_count = read_record_header(cursor)?;
    cursor.check_count(frame_count, MIN_RECORD_SIZE, "mesh frame")?;
    let keep = frame_count.min(options.frame_limit());
    let mut frames = Vec::with_capacity(keep);
    for i in 0..frame_count {
        if i < keep {
            frames.push(read_frame_v1(cursor)?);
        } else {
            skip_frame_v1(cursor)?;
        }
    }

    let sub_count = read_record_header(cursor)?;
    cursor.check_count(sub_count, MIN_VALUE_SIZE, "sub-material")?;
    let mut sub_material = None;
    for _ in 0..sub_count {
        let slot = read_int(cursor, "sub-material")?;
        sub_material.get_or_insert(slot);
    }

    let index_offset = cursor.position();
    let index_count = read_record_header(cursor)?;
    cursor.check_count(index_count, MIN_VALUE_SIZE, "index")?;
    let mut indices = Vec::with_capacity(index_count);
    for _ in 0..index_count {
        let offset = cursor.position();
        let index = read_int(cursor, "vertex index")?;
        indices.push(
            u32::try_from(index)
                .map_err(|_| Error::malformed(offset, format!("vertex index {index} out of range")))?,
        );
    }
    skip_values(cursor, 4)?;

    let vertex_count = frames.first().map_or(0, |f| f.positions.len());
    validate_triangles(&indices, vertex_count, index_offset)?;

    Ok(RawMesh {
        sub_material,
        frames,
        indices,
    })
}

fn read_frame_v1(cursor: &mut BwxCursor<'_>) -> Result<RawMeshFrame> {
    let _count = read_record_header(cursor)?;
    expect_record_type(cursor, "MESHF")?;
    let timeline = read_timeline(cursor)?;

    let vertex_count = read_record_header(cursor)?;
    cursor.check_count(vertex_count, MIN_VALUE_SIZE, "vertex")?;
    let mut positions = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        positions.push(read_float_block::<3>(cursor, "position")?);
    }

    // Only the first frame carries UVs; later frames hold an empty array.
    let uv_offset = cursor.position();
    let uv_count = read_record_header(cursor)?;
    cursor.check_count(uv_count, MIN_VALUE_SIZE, "uv")?;
    let mut uvs = Vec::with_capacity(uv_count);
    for _ in 0..uv_count {
        uvs.push(read_float_block::<2>(cursor, "uv")?);
    }
    if !uvs.is_empty() && uvs.len() != positions.len() {
        return Err(Error::malformed(
            uv_offset,
            format!("{} UVs for {} vertices", uvs.len(), positions.len()),
        ));
    }

    Ok(RawMeshFrame {
        timeline,
        positions,
        normals: Vec::new(),
        uvs,
    })
}

fn skip_frame_v1(cursor: &mut BwxCursor<'_>) -> Result<()> {
    let _count = read_record_header(cursor)?;
    expect_record_type(cursor, "MESHF")?;
    Value::skip(cursor)?;
    for what in ["vertex", "uv"] {
        let count = read_record_header(cursor)?;
        cursor.check_count(count, MIN_VALUE_SIZE, what)?;
        skip_values(cursor, count)?;
    }
    Ok(())
}

// ============================================================================
// SLv2 meshes (DXMESH / DXMESHF)
// ============================================================================

fn read_mesh_v2(cursor: &mut BwxCursor<'_>, options: &DecodeOptions) -> Result<RawMesh> {
    let _count = read_record_header(cursor)?;
    expect_record_type(cursor, "DXMESH")?;
    let sub_material = read_int(cursor, "sub-material")?;

    let frame_count = read_record_header(cursor)?;
    cursor.check_count(frame_count, MIN_RECORD_SIZE, "mesh frame")?;
    let keep = frame_count.min(options.frame_limit());
    let mut frames = Vec::with_capacity(keep);
    for i in 0..frame_count {
        if i < keep {
            frames.push(read_frame_v2(cursor)?);
        } else {
            skip_frame_v2(cursor)?;
        }
    }

    let index_offset = cursor.position();
    let index_count = read_length(cursor, "index count")?;
    let buffer_offset = cursor.position();
    let buffer = read_raw_bytes(cursor, "index buffer")?;
    if buffer.len() < index_count.saturating_mul(2) {
        return Err(Error::malformed(
            buffer_offset,
            format!(
                "index buffer holds {} bytes, {index_count} indices need {}",
                buffer.len(),
                index_count.saturating_mul(2)
            ),
        ));
    }
    let indices: Vec<u32> = buffer
        .chunks_exact(2)
        .take(index_count)
        .map(|b| u32::from(LittleEndian::read_u16(b)))
        .collect();

    let vertex_count = frames.first().map_or(0, |f| f.positions.len());
    validate_triangles(&indices, vertex_count, index_offset)?;

    Ok(RawMesh {
        sub_material: Some(sub_material),
        frames,
        indices,
    })
}

fn read_frame_v2(cursor: &mut BwxCursor<'_>) -> Result<RawMeshFrame> {
    let _count = read_record_header(cursor)?;
    expect_record_type(cursor, "DXMESHF")?;
    let timeline = read_timeline(cursor)?;
    Value::skip(cursor)?; // vertex type, always 0x15
    let vertex_count = read_length(cursor, "vertex count")?;

    let size_offset = cursor.position();
    let vertex_size = read_length(cursor, "vertex size")?;
    if vertex_size != VERTEX_SIZE_SLV2 {
        return Err(Error::malformed(
            size_offset,
            format!("unsupported vertex size {vertex_size}, expected {VERTEX_SIZE_SLV2}"),
        ));
    }

    let buffer_offset = cursor.position();
    let buffer = read_raw_bytes(cursor, "vertex buffer")?;
    let needed = vertex_count.saturating_mul(VERTEX_SIZE_SLV2);
    if buffer.len() < needed {
        return Err(Error::malformed(
            buffer_offset,
            format!(
                "vertex buffer holds {} bytes, {vertex_count} vertices need {needed}",
                buffer.len()
            ),
        ));
    }

    let mut positions = Vec::with_capacity(vertex_count);
    let mut normals = Vec::with_capacity(vertex_count);
    let mut uvs = Vec::with_capacity(vertex_count);
    for chunk in buffer.chunks_exact(VERTEX_SIZE_SLV2).take(vertex_count) {
        let mut v = [0f32; 8];
        LittleEndian::read_f32_into(chunk, &mut v);
        positions.push([v[0], v[1], v[2]]);
        normals.push([v[3], v[4], v[5]]);
        uvs.push([v[6], v[7]]);
    }

    Ok(RawMeshFrame {
        timeline,
        positions,
        normals,
        uvs,
    })
}

fn skip_frame_v2(cursor: &mut BwxCursor<'_>) -> Result<()> {
    let _count = read_record_header(cursor)?;
    expect_record_type(cursor, "DXMESHF")?;
    // timeline, vertex type, vertex count, vertex size, vertex buffer
    skip_values(cursor, 5)
}

// ============================================================================
// Cameras
// ============================================================================

pub(super) fn read_cameras(
    cursor: &mut BwxCursor<'_>,
    options: &DecodeOptions,
    cameras: &mut Vec<RawCamera>,
) -> Result<()> {
    let count = read_record_header(cursor)?;
    cursor.check_count(count, MIN_RECORD_SIZE, "camera")?;
    let limit = if options.cameras {
        options.frame_limit()
    } else {
        0
    };
    for _ in 0..count {
        let camera = read_camera(cursor, limit)?;
        if options.cameras {
            cameras.push(camera);
        }
    }
    tracing::debug!(count, kept = options.cameras, "read CAM");
    Ok(())
}

fn read_camera(cursor: &mut BwxCursor<'_>, frame_limit: usize) -> Result<RawCamera> {
    let start = cursor.position();
    let count = read_record_header(cursor)?;
    expect_record_type(cursor, "CAM")?;
    let name = read_text(cursor)?;
    expect_i32_const(cursor, CAMR_MAGIC, "CAMR magic")?;
    Value::skip(cursor)?;

    let frame_count = count
        .checked_sub(4)
        .ok_or_else(|| Error::malformed(start, format!("CAM record declares {count} fields")))?;
    cursor.check_count(frame_count, MIN_CAMERA_FRAME_SIZE, "camera frame")?;

    let keep = frame_count.min(frame_limit);
    let mut frames = Vec::with_capacity(keep);
    for i in 0..frame_count {
        cursor.expect_u8(TAG_BYTES, "camera frame")?;
        let _size = cursor.read_varint()?;
        if i < keep {
            let timeline = cursor.read_u32()?;
            let eye = cursor.read_f32_array::<16>()?;
            let target = cursor.read_f32_array::<16>()?;
            let unknown = cursor.read_f32_array::<6>()?;
            frames.push(RawCameraFrame {
                timeline,
                eye,
                target,
                unknown,
            });
        } else {
            cursor.skip(CAMERA_FRAME_SIZE)?;
        }
    }

    Ok(RawCamera { name, frames })
}
