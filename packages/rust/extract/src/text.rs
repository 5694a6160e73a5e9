//! Plain-text decoding with a Latin-1 fallback.

use crate::Extracted;

/// How many leading bytes are inspected for NUL when sniffing binaries.
const SNIFF_LEN: usize = 8 * 1024;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const UTF16_LE_BOM: &[u8] = b"\xFF\xFE";
const UTF16_BE_BOM: &[u8] = b"\xFE\xFF";

/// Decode file contents as UTF-8, falling back to Latin-1.
///
/// Latin-1 maps every byte to a code point, so the fallback cannot fail.
/// UTF-16 is recognised by its BOM only. Otherwise content with a NUL byte
/// near the start is treated as binary.
pub fn decode_text(bytes: &[u8]) -> Extracted {
    if let Some(text) = decode_utf16(bytes) {
        return Extracted::Text(text);
    }

    let sniff = &bytes[..bytes.len().min(SNIFF_LEN)];
    if sniff.contains(&0) {
        return Extracted::Binary;
    }

    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(text) => Extracted::Text(text.to_string()),
        Err(_) => Extracted::Text(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

fn decode_utf16(bytes: &[u8]) -> Option<String> {
    let (body, from_bytes): (&[u8], fn([u8; 2]) -> u16) =
        if let Some(body) = bytes.strip_prefix(UTF16_LE_BOM) {
            (body, u16::from_le_bytes)
        } else if let Some(body) = bytes.strip_prefix(UTF16_BE_BOM) {
            (body, u16::from_be_bytes)
        } else {
            return None;
        };

    let units = body.chunks_exact(2).map(|pair| from_bytes([pair[0], pair[1]]));
    Some(
        char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect(),
    )
}
