use crate::dex::error::DexError;

/// Longest valid encoding of a 32-bit value.
const MAX_ULEB128_LEN: usize = 5;

pub fn encode_uleb128(value: u32) -> Vec<u8> {
    let mut result = Vec::with_capacity(MAX_ULEB128_LEN);
    let mut remaining = value;

    loop {
        let mut byte = (remaining & 0x7F) as u8;
        remaining >>= 7;

        if remaining != 0 {
            byte |= 0x80;
        }

        result.push(byte);

        if remaining == 0 {
            break;
        }
    }

    result
}

/// Decodes one unsigned LEB128 value, returning it with the number of bytes consumed.
///
/// Running out of input before the continuation bit clears is `Truncated`. A fifth byte that
/// still asks for more, or carries bits above bit 31, is `Malformed`.
pub fn decode_uleb128(encoded: &[u8]) -> Result<(u32, usize), DexError> {
    let mut value: u32 = 0;
    let mut shift: u32 = 0;

    for (count, &byte) in encoded.iter().enumerate() {
        value |= ((byte & 0x7F) as u32).wrapping_shl(shift);

        if count + 1 == MAX_ULEB128_LEN && byte & 0x70 != 0 {
            fail!(Malformed, "uleb128 value does not fit in 32 bits (last byte 0x{:02x})", byte);
        }
        if byte & 0x80 == 0 {
            return Ok((value, count + 1));
        }
        if count + 1 == MAX_ULEB128_LEN {
            fail!(Malformed, "uleb128 continues past {} bytes", MAX_ULEB128_LEN);
        }
        shift += 7;
    }

    fail!(Truncated, "uleb128 runs off the end of the buffer after {} bytes", encoded.len())
}
