//! Modified UTF-8 as stored in `string_data_item`.
//!
//! Code points are one, two or three bytes long; supplementary characters arrive as a pair of
//! three-byte surrogates and U+0000 as `C0 80`, so a plain zero byte always ends the string.

use crate::dex::error::DexError;
use crate::dex::read_uleb128;
use log::warn;

/// Reads a `string_data_item` at `*ix`: the declared UTF-16 length, then MUTF-8 data up to the
/// first zero byte. The declared length is informational and never bounds the scan.
pub(crate) fn read_string_data(bytes: &[u8], ix: &mut usize) -> Result<String, DexError>
{
    let _utf16_size = read_uleb128(bytes, ix)?;
    let start = *ix;
    let len = bytes[start..]
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| err!(Truncated, "unterminated string data at 0x{:x}", start))?;
    *ix = start + len + 1;
    Ok(decode_mutf8(&bytes[start..start + len]))
}

/// Decodes MUTF-8 bytes (without the terminator) into a `String`.
pub fn decode_mutf8(raw: &[u8]) -> String
{
    match cesu8::from_java_cesu8(raw)
    {
        Ok(s) => s.into_owned(),
        Err(_) => {
            warn!("[mutf8] {} byte string is not well formed, decoding leniently", raw.len());
            decode_lenient(raw)
        }
    }
}

// Combines lead and continuation bits without checking them, so unpaired surrogates and stray
// continuation bytes degrade to U+FFFD instead of failing.
fn decode_lenient(raw: &[u8]) -> String
{
    let next = |i: usize| raw.get(i).map_or(0, |&b| (b & 0x3F) as u16);

    let mut units = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len()
    {
        let b = raw[i] as u16;
        if b & 0x80 == 0
        {
            units.push(b);
            i += 1;
        }
        else if b & 0xE0 == 0xC0
        {
            units.push(((b & 0x1F) << 6) | next(i + 1));
            i += 2;
        }
        else if b & 0xF0 == 0xE0
        {
            units.push(((b & 0x0F) << 12) | (next(i + 1) << 6) | next(i + 2));
            i += 3;
        }
        else
        {
            units.push(0xFFFD);
            i += 1;
        }
    }
    String::from_utf16_lossy(&units)
}
