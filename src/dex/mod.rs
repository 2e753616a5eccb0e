#[macro_use]
pub mod error;

pub mod checksum;
pub mod class_data;
pub mod code;
pub(crate) mod dex_file;
pub mod header;
pub mod leb;
pub mod mutf8;
pub(crate) mod resolver;
pub mod tables;

pub use dex_file::DexFile;
pub use error::{DexError, ErrorKind};

use crate::dex::leb::decode_uleb128;
#[cfg(test)]
use crate::dex::leb::encode_uleb128;

// Basic type reading and writing
#[cfg(test)]
pub(crate) fn read_u1(bytes: &[u8], ix: &mut usize) -> Result<u8, DexError>
{
    if bytes.len() < *ix + 1
    {
        fail!(Truncated, "unexpected end of stream reading u1 at index 0x{:x}", *ix);
    }
    let result = bytes[*ix];
    *ix += 1;
    Ok(result)
}

pub(crate) fn read_u2(bytes: &[u8], ix: &mut usize) -> Result<u16, DexError>
{
    if bytes.len() < *ix + 2
    {
        fail!(Truncated, "unexpected end of stream reading u2 at index 0x{:x}", *ix);
    }
    let result = u16::from_le_bytes([bytes[*ix], bytes[*ix + 1]]);
    *ix += 2;
    Ok(result)
}

pub(crate) fn read_u4(bytes: &[u8], ix: &mut usize) -> Result<u32, DexError>
{
    if bytes.len() < *ix + 4
    {
        fail!(Truncated, "unexpected end of stream reading u4 at index 0x{:x}", *ix);
    }
    let result = u32::from_le_bytes([bytes[*ix], bytes[*ix + 1], bytes[*ix + 2], bytes[*ix + 3]]);
    *ix += 4;
    Ok(result)
}

pub(crate) fn read_uleb128(bytes: &[u8], ix: &mut usize) -> Result<u32, DexError>
{
    if *ix > bytes.len()
    {
        fail!(Truncated, "uleb128 offset 0x{:x} is past the end of the file", *ix);
    }
    let (val, size) = decode_uleb128(&bytes[*ix..])
        .map_err(|e| DexError::with_context(e, format!("uleb128 at 0x{:x}", *ix)))?;
    *ix += size;
    Ok(val)
}

pub(crate) fn read_x<const N: usize>(bytes: &[u8], ix: &mut usize) -> Result<[u8; N], DexError>
{
    if bytes.len() < *ix + N
    {
        fail!(Truncated, "buffer too short for {} byte read at 0x{:x}", N, *ix);
    }
    let mut v = [0u8; N];
    v.copy_from_slice(&bytes[*ix..*ix + N]);
    *ix += N;
    Ok(v)
}

/// Fails unless `count` records of `stride` bytes starting at `offset` lie inside the image.
pub(crate) fn check_extent(bytes: &[u8], offset: usize, count: usize, stride: usize) -> Result<(), DexError>
{
    let end = count
        .checked_mul(stride)
        .and_then(|len| len.checked_add(offset));
    match end
    {
        Some(end) if end <= bytes.len() => Ok(()),
        _ => fail!(Truncated, "{} x {} bytes at 0x{:x} exceeds file size 0x{:x}", count, stride, offset, bytes.len()),
    }
}

pub(crate) fn write_u2(buffer: &mut Vec<u8>, val: u16) -> usize
{
    buffer.extend_from_slice(&val.to_le_bytes());
    2
}

pub(crate) fn write_u4(buffer: &mut Vec<u8>, val: u32) -> usize
{
    buffer.extend_from_slice(&val.to_le_bytes());
    4
}

#[cfg(test)]
pub(crate) fn write_uleb128(buffer: &mut Vec<u8>, val: u32) -> usize
{
    let encoded = encode_uleb128(val);
    let c = encoded.len();
    buffer.extend(encoded);
    c
}

pub(crate) fn write_x(buffer: &mut Vec<u8>, val: &[u8]) -> usize
{
    let len = val.len();
    buffer.extend(val);
    len
}
