//! BWX decoding entry points

use std::path::Path;

use super::cursor::{BwxCursor, LengthPrefix, TextEncoding};
use super::grammar;
use super::records::{RawContainer, RawHeader};
use super::value::Value;
use super::{BWX_ENDING, BWX_MAGIC, Dialect};
use crate::error::{Error, Result};

/// Smallest encoded top-level block: empty name and a one-byte value.
const MIN_BLOCK_SIZE: usize = 2;

/// Which optional records the decoder materializes.
///
/// Disabled records are still walked so later offsets stay correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Keep every mesh frame and matrix sample. When off, only the first
    /// of each is kept (base mesh and rest pose).
    pub animations: bool,
    /// Keep `CAM` records.
    pub cameras: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            animations: true,
            cameras: true,
        }
    }
}

impl DecodeOptions {
    /// Number of frames/samples to keep per record.
    pub(crate) fn frame_limit(&self) -> usize {
        if self.animations { usize::MAX } else { 1 }
    }
}

/// Read and decode a BWX file from disk.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read, or any decode error
/// from [`decode`].
///
/// [`Error::Io`]: crate::Error::Io
pub fn read_bwx<P: AsRef<Path>>(path: P) -> Result<RawContainer> {
    let data = std::fs::read(path)?;
    decode(&data)
}

/// Decode a BWX buffer with default options.
pub fn decode(data: &[u8]) -> Result<RawContainer> {
    decode_with_options(data, &DecodeOptions::default())
}

/// Decode a BWX buffer.
///
/// The dialect comes from the HEAD version word alone; object blocks must
/// follow HEAD and belong to that dialect.
///
/// # Errors
///
/// - [`Error::InvalidMagic`] if the buffer does not start with `BWXF`
/// - [`Error::TruncatedData`] if a record runs past the end of the buffer
/// - [`Error::MalformedStructure`] if a record does not match its shape or a
///   count cannot fit in the remaining bytes
/// - [`Error::UnknownDialect`] if the HEAD version is neither SLv1 nor SLv2
pub fn decode_with_options(data: &[u8], options: &DecodeOptions) -> Result<RawContainer> {
    let mut cursor = BwxCursor::new(data);

    let magic: [u8; 4] = cursor.read_array()?;
    if &magic != BWX_MAGIC {
        return Err(Error::InvalidMagic(magic));
    }
    // Content size is approximate in tool-written files.
    let _content_size = cursor.read_varint()?;
    let block_count = cursor.read_count()?;
    cursor.check_count(block_count, MIN_BLOCK_SIZE, "block")?;

    let mut header: Option<RawHeader> = None;
    let mut materials = Vec::new();
    let mut objects = Vec::new();
    let mut transform_tracks = Vec::new();
    let mut cameras = Vec::new();
    let mut extra_blocks = Vec::new();

    for _ in 0..block_count {
        let block_offset = cursor.position();
        let name = cursor.read_prefixed_string(LengthPrefix::VarInt, TextEncoding::Utf8)?;
        tracing::debug!(block = %name, offset = block_offset, "reading block");

        match name.as_str() {
            "0" => grammar::read_signature(&mut cursor)?,
            "HEAD" => {
                if header.is_some() {
                    return Err(Error::malformed(block_offset, "duplicate HEAD block"));
                }
                header = Some(grammar::read_header(&mut cursor)?);
            }
            "MTRL" => materials.extend(grammar::read_materials(&mut cursor)?),
            "CAM" => grammar::read_cameras(&mut cursor, options, &mut cameras)?,
            other => match Dialect::of_object_block(other) {
                Some(block_dialect) => {
                    let dialect = header
                        .as_ref()
                        .map(|h| h.dialect)
                        .ok_or_else(|| {
                            Error::malformed(block_offset, format!("{other} block before HEAD"))
                        })?;
                    if block_dialect != dialect {
                        return Err(Error::malformed(
                            block_offset,
                            format!("{block_dialect} {other} block in a {dialect} container"),
                        ));
                    }
                    grammar::read_objects(
                        &mut cursor,
                        dialect,
                        options,
                        &mut objects,
                        &mut transform_tracks,
                    )?;
                }
                None => {
                    Value::skip(&mut cursor)?;
                    extra_blocks.push(other.to_string());
                }
            },
        }
    }

    let ending_offset = cursor.position();
    let ending: [u8; 4] = cursor.read_array()?;
    if &ending != BWX_ENDING {
        return Err(Error::malformed(
            ending_offset,
            format!("expected FXWB ending, found {ending:?}"),
        ));
    }
    if cursor.remaining() > 0 {
        tracing::debug!(trailing = cursor.remaining(), "ignoring bytes after FXWB");
    }

    let header =
        header.ok_or_else(|| Error::malformed(ending_offset, "container has no HEAD block"))?;

    tracing::debug!(
        dialect = %header.dialect,
        materials = materials.len(),
        objects = objects.len(),
        tracks = transform_tracks.len(),
        cameras = cameras.len(),
        "decoded BWX container"
    );

    Ok(RawContainer {
        header,
        materials,
        objects,
        transform_tracks,
        cameras,
        extra_blocks,
        lossy_strings: cursor.take_lossy_strings(),
    })
}
