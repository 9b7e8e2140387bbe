//! Bounds-checked reader over an in-memory BWX buffer

use byteorder::{ByteOrder, LittleEndian};

use super::strings::decode_text;
use crate::error::{Error, Result};

/// Longest LEB128 encoding of a `u64`.
const MAX_VARINT_LEN: usize = 10;

/// Width of the length field in front of a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthPrefix {
    /// Unsigned LEB128 length (the BWX default).
    VarInt,
    /// One byte.
    U8,
    /// Little-endian u16.
    U16,
    /// Little-endian u32.
    U32,
}

/// Character set used to decode string bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Block names.
    Utf8,
    /// Object, material and texture names (Korean content).
    EucKr,
}

impl TextEncoding {
    pub(crate) fn encoding(self) -> &'static encoding_rs::Encoding {
        match self {
            Self::Utf8 => encoding_rs::UTF_8,
            Self::EucKr => encoding_rs::EUC_KR,
        }
    }
}

/// Sequential little-endian reader.
///
/// Reads never go past the end of the buffer: a short read fails with
/// [`Error::TruncatedData`] and leaves the offset unchanged.
#[derive(Debug)]
pub struct BwxCursor<'a> {
    data: &'a [u8],
    pos: usize,
    lossy_strings: Vec<usize>,
}

impl<'a> BwxCursor<'a> {
    /// Create a cursor at offset 0.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            lossy_strings: Vec::new(),
        }
    }

    /// Current read offset.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total buffer length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left after the current offset.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Offsets of strings that contained undecodable bytes.
    #[must_use]
    pub fn lossy_strings(&self) -> &[usize] {
        &self.lossy_strings
    }

    pub(crate) fn take_lossy_strings(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.lossy_strings)
    }

    /// Move to an absolute offset. Seeking to the buffer end is allowed.
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(Error::OutOfRange {
                offset,
                len: self.data.len(),
            });
        }
        self.pos = offset;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(Error::TruncatedData {
                offset: self.pos,
                needed: n,
                remaining,
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Borrow the next `n` bytes.
    pub fn read_fixed_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Look at the next byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8> {
        self.data.get(self.pos).copied().ok_or(Error::TruncatedData {
            offset: self.pos,
            needed: 1,
            remaining: 0,
        })
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    /// Read `N` consecutive little-endian floats.
    pub fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N]> {
        let bytes = self.take(N * 4)?;
        let mut out = [0f32; N];
        LittleEndian::read_f32_into(bytes, &mut out);
        Ok(out)
    }

    /// Read an unsigned LEB128 integer.
    pub fn read_varint(&mut self) -> Result<u64> {
        let start = self.pos;
        let mut value = 0u64;
        for i in 0..MAX_VARINT_LEN {
            let byte = self.read_u8()?;
            if i == MAX_VARINT_LEN - 1 && byte > 1 {
                return Err(Error::malformed(start, "varint overflows 64 bits"));
            }
            value |= u64::from(byte & 0x7F) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(Error::malformed(start, "varint longer than 10 bytes"))
    }

    /// Read a varint used as a length or repeat count.
    pub fn read_count(&mut self) -> Result<usize> {
        let start = self.pos;
        let value = self.read_varint()?;
        usize::try_from(value)
            .map_err(|_| Error::malformed(start, format!("count {value} does not fit in memory")))
    }

    /// Read a length-prefixed string, cut at the first NUL.
    ///
    /// Undecodable byte sequences become U+FFFD; the string offset is
    /// remembered in [`Self::lossy_strings`].
    pub fn read_prefixed_string(
        &mut self,
        prefix: LengthPrefix,
        encoding: TextEncoding,
    ) -> Result<String> {
        let len = match prefix {
            LengthPrefix::VarInt => self.read_count()?,
            LengthPrefix::U8 => usize::from(self.read_u8()?),
            LengthPrefix::U16 => usize::from(self.read_u16()?),
            LengthPrefix::U32 => self.read_u32()? as usize,
        };
        let offset = self.pos;
        let bytes = self.take(len)?;
        let (text, lossy) = decode_text(bytes, encoding);
        if lossy {
            tracing::warn!(offset, "replaced undecodable bytes in string {text:?}");
            self.lossy_strings.push(offset);
        }
        Ok(text)
    }

    /// Consume one byte and require it to equal `expected`.
    pub fn expect_u8(&mut self, expected: u8, what: &str) -> Result<()> {
        let offset = self.pos;
        let found = self.read_u8()?;
        if found != expected {
            return Err(Error::malformed(
                offset,
                format!("expected {what} tag {expected:#04x}, found {found:#04x}"),
            ));
        }
        Ok(())
    }

    /// Reject a repeat count the remaining bytes cannot hold.
    ///
    /// Every record but the last must fit at `min_size` bytes; a single
    /// short final record is left to fail as truncated data at its own offset.
    pub fn check_count(&self, count: usize, min_size: usize, what: &str) -> Result<usize> {
        let needed = count.saturating_sub(1).saturating_mul(min_size);
        if needed > self.remaining() {
            return Err(Error::malformed(
                self.pos,
                format!(
                    "{what} count {count} needs at least {needed} bytes, {} remaining",
                    self.remaining()
                ),
            ));
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives() {
        let data = [0x01, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0x00, 0x00, 0x80, 0x3F];
        let mut cursor = BwxCursor::new(&data);
        assert_eq!(cursor.read_u8().unwrap(), 1);
        assert_eq!(cursor.read_u16().unwrap(), 0x1234);
        assert_eq!(cursor.read_u32().unwrap(), 0x12345678);
        assert!((cursor.read_f32().unwrap() - 1.0).abs() < f32::EPSILON);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_signed_reads() {
        let data = [0xFF, 0xFF, 0xFE, 0xFF, 0xFF, 0xFF];
        let mut cursor = BwxCursor::new(&data);
        assert_eq!(cursor.read_i16().unwrap(), -1);
        assert_eq!(cursor.read_i32().unwrap(), -2);
    }

    #[test]
    fn test_truncated_read_keeps_offset() {
        let data = [0x01, 0x02, 0x03];
        let mut cursor = BwxCursor::new(&data);
        cursor.skip(1).unwrap();
        let err = cursor.read_u32().unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedData {
                offset: 1,
                needed: 4,
                remaining: 2
            }
        ));
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_seek_bounds() {
        let data = [0u8; 4];
        let mut cursor = BwxCursor::new(&data);
        cursor.seek(4).unwrap();
        assert_eq!(cursor.remaining(), 0);
        assert!(matches!(
            cursor.seek(5),
            Err(Error::OutOfRange { offset: 5, len: 4 })
        ));
    }

    #[test]
    fn test_varint() {
        let data = [0x05, 0xAC, 0x02, 0xFF, 0xFF, 0x03];
        let mut cursor = BwxCursor::new(&data);
        assert_eq!(cursor.read_varint().unwrap(), 5);
        assert_eq!(cursor.read_varint().unwrap(), 300);
        assert_eq!(cursor.read_varint().unwrap(), 0xFFFF);
    }

    #[test]
    fn test_unterminated_varint_is_truncated() {
        let data = [0x80, 0x80];
        let mut cursor = BwxCursor::new(&data);
        assert!(matches!(
            cursor.read_varint(),
            Err(Error::TruncatedData { offset: 2, .. })
        ));
    }

    #[test]
    fn test_prefixed_strings() {
        let data = [0x04, b'H', b'E', b'A', b'D', 0x03, 0x00, b'a', b'b', b'c'];
        let mut cursor = BwxCursor::new(&data);
        assert_eq!(
            cursor
                .read_prefixed_string(LengthPrefix::VarInt, TextEncoding::Utf8)
                .unwrap(),
            "HEAD"
        );
        assert_eq!(
            cursor
                .read_prefixed_string(LengthPrefix::U16, TextEncoding::Utf8)
                .unwrap(),
            "abc"
        );
    }

    #[test]
    fn test_lossy_string_offset_recorded() {
        let data = [0x02, 0xFF, b'A'];
        let mut cursor = BwxCursor::new(&data);
        let text = cursor
            .read_prefixed_string(LengthPrefix::VarInt, TextEncoding::EucKr)
            .unwrap();
        assert_eq!(text, "\u{FFFD}A");
        assert_eq!(cursor.lossy_strings(), &[1]);
    }

    #[test]
    fn test_check_count() {
        let data = [0u8; 10];
        let cursor = BwxCursor::new(&data);
        assert_eq!(cursor.check_count(11, 1, "value").unwrap(), 11);
        assert!(cursor.check_count(12, 1, "value").is_err());
        assert!(cursor.check_count(usize::MAX, 3, "object").is_err());
        assert_eq!(cursor.check_count(0, 100, "object").unwrap(), 0);
    }
}
