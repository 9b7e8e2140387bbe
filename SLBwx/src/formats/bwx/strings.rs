//! String decoding for BWX names and paths

use std::borrow::Cow;

use super::cursor::TextEncoding;

/// Decode stored string bytes, stopping at the first NUL.
///
/// Returns the text and whether any bytes had to be replaced with U+FFFD.
#[must_use]
pub fn decode_text(bytes: &[u8], encoding: TextEncoding) -> (String, bool) {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let (text, had_errors) = encoding
        .encoding()
        .decode_without_bom_handling(&bytes[..end]);
    let text = match text {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => s,
    };
    (text, had_errors)
}
