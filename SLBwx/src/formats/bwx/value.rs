//! Tagged value encoding shared by every BWX block
//!
//! Each value starts with a type byte:
//!
//! | Tag           | Payload                                           |
//! |---------------|---------------------------------------------------|
//! | `0x00..=0x1F` | none, the tag is the integer                      |
//! | `A` (0x41)    | size varint, count varint, opaque data            |
//! | `B` (0x42)    | varint-prefixed bytes                             |
//! | `C` (0x43)    | u8, negated                                       |
//! | `D` (0x44)    | size, count, count x (name, `A` array)            |
//! | `F` (0x46)    | f32                                               |
//! | `H` (0x48)    | u16, negated                                      |
//! | `I` (0x49)    | i32                                               |
//! | `S` (0x53)    | varint-prefixed EUC-KR string                     |
//! | `W` (0x57)    | u16                                               |
//! | `Y` (0x59)    | u8                                                |
//! | `0x80..`      | inline bytes, length `tag & 0x7F`                 |
//!
//! Any other tag carries no payload.

use super::cursor::{BwxCursor, LengthPrefix, TextEncoding};
use crate::error::{Error, Result};

pub const TAG_ARRAY: u8 = 0x41;
pub const TAG_BYTES: u8 = 0x42;
pub const TAG_NEG_U8: u8 = 0x43;
pub const TAG_DICT: u8 = 0x44;
pub const TAG_F32: u8 = 0x46;
pub const TAG_NEG_U16: u8 = 0x48;
pub const TAG_I32: u8 = 0x49;
pub const TAG_STRING: u8 = 0x53;
pub const TAG_U16: u8 = 0x57;
pub const TAG_U8: u8 = 0x59;
pub const TAG_INLINE: u8 = 0x80;

/// Smallest encoded dictionary entry: empty name, `A`, size, count.
const MIN_DICT_ENTRY_SIZE: usize = 4;

/// A decoded tagged value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Tag with no payload.
    Null,
    Int(i64),
    Float(f32),
    String(String),
    /// `B` payloads and inline blocks.
    Bytes(Vec<u8>),
    /// Generic array; the elements are kept undecoded.
    Array { count: usize, data: Vec<u8> },
    /// Named arrays.
    Dict(Vec<(String, Value)>),
}

impl Value {
    /// Read one value at the cursor.
    pub fn read(cursor: &mut BwxCursor<'_>) -> Result<Self> {
        let tag = cursor.read_u8()?;
        if tag > TAG_INLINE {
            let bytes = cursor.read_fixed_bytes(usize::from(tag & 0x7F))?;
            return Ok(Self::Bytes(bytes.to_vec()));
        }
        if tag < 0x20 {
            return Ok(Self::Int(i64::from(tag)));
        }
        Ok(match tag {
            TAG_ARRAY => {
                let (count, data) = read_array_body(cursor)?;
                Self::Array {
                    count,
                    data: data.to_vec(),
                }
            }
            TAG_BYTES => {
                let len = cursor.read_count()?;
                Self::Bytes(cursor.read_fixed_bytes(len)?.to_vec())
            }
            TAG_NEG_U8 => Self::Int(-i64::from(cursor.read_u8()?)),
            TAG_DICT => Self::Dict(read_dict_body(cursor)?),
            TAG_F32 => Self::Float(cursor.read_f32()?),
            TAG_NEG_U16 => Self::Int(-i64::from(cursor.read_u16()?)),
            TAG_I32 => Self::Int(i64::from(cursor.read_i32()?)),
            TAG_STRING => Self::String(
                cursor.read_prefixed_string(LengthPrefix::VarInt, TextEncoding::EucKr)?,
            ),
            TAG_U16 => Self::Int(i64::from(cursor.read_u16()?)),
            TAG_U8 => Self::Int(i64::from(cursor.read_u8()?)),
            _ => Self::Null,
        })
    }

    /// Advance past one value without building it.
    pub fn skip(cursor: &mut BwxCursor<'_>) -> Result<()> {
        let tag = cursor.read_u8()?;
        if tag > TAG_INLINE {
            return cursor.skip(usize::from(tag & 0x7F));
        }
        if tag < 0x20 {
            return Ok(());
        }
        match tag {
            TAG_ARRAY => read_array_body(cursor).map(|_| ()),
            TAG_BYTES | TAG_STRING => {
                let len = cursor.read_count()?;
                cursor.skip(len)
            }
            TAG_NEG_U8 | TAG_U8 => cursor.skip(1),
            TAG_NEG_U16 | TAG_U16 => cursor.skip(2),
            TAG_F32 | TAG_I32 => cursor.skip(4),
            TAG_DICT => {
                let _size = cursor.read_varint()?;
                let count = cursor.read_count()?;
                cursor.check_count(count, MIN_DICT_ENTRY_SIZE, "dictionary entry")?;
                for _ in 0..count {
                    let len = cursor.read_count()?;
                    cursor.skip(len)?;
                    cursor.expect_u8(TAG_ARRAY, "dictionary array")?;
                    read_array_body(cursor)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Integer payload, if this is an integer value.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float payload; integers are widened.
    #[must_use]
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Short description for error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Int(v) => format!("int {v}"),
            Self::Float(v) => format!("float {v}"),
            Self::String(s) => format!("string {s:?}"),
            Self::Bytes(b) => format!("{} raw bytes", b.len()),
            Self::Array { count, .. } => format!("array of {count}"),
            Self::Dict(entries) => format!("dictionary of {}", entries.len()),
        }
    }
}

/// Read the body of a generic `A` array (after the tag).
fn read_array_body<'a>(cursor: &mut BwxCursor<'a>) -> Result<(usize, &'a [u8])> {
    let size_offset = cursor.position();
    let size = cursor.read_count()?;
    let count_start = cursor.position();
    let count = cursor.read_count()?;
    let count_len = cursor.position() - count_start;
    let data_len = size.checked_sub(count_len).ok_or_else(|| {
        Error::malformed(
            size_offset,
            format!("array size {size} is smaller than its count field"),
        )
    })?;
    Ok((count, cursor.read_fixed_bytes(data_len)?))
}

fn read_dict_body(cursor: &mut BwxCursor<'_>) -> Result<Vec<(String, Value)>> {
    let _size = cursor.read_varint()?;
    let count = cursor.read_count()?;
    cursor.check_count(count, MIN_DICT_ENTRY_SIZE, "dictionary entry")?;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let name = cursor.read_prefixed_string(LengthPrefix::VarInt, TextEncoding::EucKr)?;
        cursor.expect_u8(TAG_ARRAY, "dictionary array")?;
        let (count, data) = read_array_body(cursor)?;
        entries.push((
            name,
            Value::Array {
                count,
                data: data.to_vec(),
            },
        ));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read_all(data: &[u8]) -> Vec<Value> {
        let mut cursor = BwxCursor::new(data);
        let mut values = Vec::new();
        while cursor.remaining() > 0 {
            values.push(Value::read(&mut cursor).unwrap());
        }
        values
    }

    #[test]
    fn test_scalar_values() {
        let data = [
            0x07, // small int
            0x59, 0xC8, // u8
            0x57, 0x34, 0x12, // u16
            0x43, 0x05, // negated u8
            0x48, 0x00, 0x01, // negated u16
            0x49, 0xFE, 0xFF, 0xFF, 0xFF, // i32
            0x46, 0x00, 0x00, 0x00, 0x40, // f32
            0x30, // unknown tag
        ];
        assert_eq!(
            read_all(&data),
            vec![
                Value::Int(7),
                Value::Int(200),
                Value::Int(0x1234),
                Value::Int(-5),
                Value::Int(-256),
                Value::Int(-2),
                Value::Float(2.0),
                Value::Null,
            ]
        );
    }

    #[test]
    fn test_string_and_bytes() {
        let data = [
            0x53, 0x05, b'M', b'E', b'S', b'H', 0x00, // string
            0x42, 0x02, 0xAA, 0xBB, // raw bytes
            0x83, 0x01, 0x02, 0x03, // inline block
            0x80, // empty inline tag carries no payload
        ];
        assert_eq!(
            read_all(&data),
            vec![
                Value::String("MESH".to_string()),
                Value::Bytes(vec![0xAA, 0xBB]),
                Value::Bytes(vec![1, 2, 3]),
                Value::Null,
            ]
        );
    }

    #[test]
    fn test_generic_array() {
        // size 3 = count varint (1 byte) + 2 data bytes
        let data = [0x41, 0x03, 0x02, 0x01, 0x02];
        assert_eq!(
            read_all(&data),
            vec![Value::Array {
                count: 2,
                data: vec![1, 2]
            }]
        );
    }

    #[test]
    fn test_dictionary() {
        let data = [
            0x44, 0x00, 0x01, // size, count
            0x02, b'k', 0x00, // name
            0x41, 0x02, 0x01, 0x09, // array with one byte
        ];
        assert_eq!(
            read_all(&data),
            vec![Value::Dict(vec![(
                "k".to_string(),
                Value::Array {
                    count: 1,
                    data: vec![9]
                }
            )])]
        );
    }

    #[test]
    fn test_skip_matches_read() {
        let data = [
            0x53, 0x02, b'x', 0x00, 0x41, 0x03, 0x02, 0x01, 0x02, 0x8C, 0, 0, 0, 0, 0, 0, 0, 0, 0,
            0, 0, 0, 0x49, 1, 2, 3, 4,
        ];
        let mut read_cursor = BwxCursor::new(&data);
        let mut skip_cursor = BwxCursor::new(&data);
        for _ in 0..4 {
            Value::read(&mut read_cursor).unwrap();
            Value::skip(&mut skip_cursor).unwrap();
            assert_eq!(read_cursor.position(), skip_cursor.position());
        }
        assert_eq!(skip_cursor.remaining(), 0);
    }

    #[test]
    fn test_array_size_smaller_than_count() {
        let data = [0x41, 0x00, 0x01];
        let mut cursor = BwxCursor::new(&data);
        assert!(matches!(
            Value::read(&mut cursor),
            Err(Error::MalformedStructure { offset: 1, .. })
        ));
    }

    #[test]
    fn test_truncated_inline_block() {
        let data = [0x8C, 0x00, 0x00];
        let mut cursor = BwxCursor::new(&data);
        assert!(matches!(
            Value::read(&mut cursor),
            Err(Error::TruncatedData {
                offset: 1,
                needed: 12,
                remaining: 2
            })
        ));
    }
}
