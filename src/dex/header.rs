/* Dex file header */

use crate::dex::error::DexError;
use crate::dex::{read_u4, read_x, write_u4, write_x};

pub const DEX_MAGIC_PREFIX: [u8; 4] = [ 0x64, 0x65, 0x78, 0x0a ];
pub const DEX_FILE_MAGIC: [u8; 8] = [ 0x64, 0x65, 0x78, 0x0a, 0x30, 0x33, 0x35, 0x00 ];
pub const HEADER_SIZE: u32 = 0x70;
pub const ENDIAN_CONSTANT: u32 = 0x12345678;

/// The fixed `header_item` at offset 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 8],
    pub checksum: u32,
    pub signature: [u8; 20],
    pub file_size: u32,
    pub header_size: u32,
    pub endian_tag: u32,
    pub link_size: u32,
    pub link_off: u32,
    pub map_off: u32,
    pub string_ids_size: u32,
    pub string_ids_off: u32,
    pub type_ids_size: u32,
    pub type_ids_off: u32,
    pub proto_ids_size: u32,
    pub proto_ids_off: u32,
    pub field_ids_size: u32,
    pub field_ids_off: u32,
    pub method_ids_size: u32,
    pub method_ids_off: u32,
    pub class_defs_size: u32,
    pub class_defs_off: u32,
    pub data_size: u32,
    pub data_off: u32,
}

impl Header
{
    /// Decodes the header, checking only the magic prefix and `header_size`. Table offsets are
    /// validated by whoever dereferences them.
    pub fn read(bytes: &[u8]) -> Result<Header, DexError>
    {
        let prefix = &bytes[..bytes.len().min(4)];
        if prefix != DEX_MAGIC_PREFIX {
            fail!(BadMagic, "invalid magic value {:02x?}", prefix);
        }
        if bytes.len() < HEADER_SIZE as usize {
            fail!(Truncated, "need 0x{:x} bytes for the header, file has 0x{:x}", HEADER_SIZE, bytes.len());
        }

        let mut ix = 0;
        let magic: [u8; 8] = read_x(bytes, &mut ix)?;

        let header = Header {
            magic,
            checksum: read_u4(bytes, &mut ix)?,
            signature: read_x(bytes, &mut ix)?,
            file_size: read_u4(bytes, &mut ix)?,
            header_size: read_u4(bytes, &mut ix)?,
            endian_tag: read_u4(bytes, &mut ix)?,
            link_size: read_u4(bytes, &mut ix)?,
            link_off: read_u4(bytes, &mut ix)?,
            map_off: read_u4(bytes, &mut ix)?,
            string_ids_size: read_u4(bytes, &mut ix)?,
            string_ids_off: read_u4(bytes, &mut ix)?,
            type_ids_size: read_u4(bytes, &mut ix)?,
            type_ids_off: read_u4(bytes, &mut ix)?,
            proto_ids_size: read_u4(bytes, &mut ix)?,
            proto_ids_off: read_u4(bytes, &mut ix)?,
            field_ids_size: read_u4(bytes, &mut ix)?,
            field_ids_off: read_u4(bytes, &mut ix)?,
            method_ids_size: read_u4(bytes, &mut ix)?,
            method_ids_off: read_u4(bytes, &mut ix)?,
            class_defs_size: read_u4(bytes, &mut ix)?,
            class_defs_off: read_u4(bytes, &mut ix)?,
            data_size: read_u4(bytes, &mut ix)?,
            data_off: read_u4(bytes, &mut ix)?,
        };

        if header.header_size != HEADER_SIZE {
            fail!(BadHeaderSize, "header_size is 0x{:x}, expected 0x{:x}", header.header_size, HEADER_SIZE);
        }

        Ok(header)
    }

    pub fn write(&self, bytes: &mut Vec<u8>) -> usize
    {
        let mut c = 0;
        c += write_x(bytes, &self.magic);
        c += write_u4(bytes, self.checksum);
        c += write_x(bytes, &self.signature);
        c += write_u4(bytes, self.file_size);
        c += write_u4(bytes, self.header_size);
        c += write_u4(bytes, self.endian_tag);
        c += write_u4(bytes, self.link_size);
        c += write_u4(bytes, self.link_off);
        c += write_u4(bytes, self.map_off);
        c += write_u4(bytes, self.string_ids_size);
        c += write_u4(bytes, self.string_ids_off);
        c += write_u4(bytes, self.type_ids_size);
        c += write_u4(bytes, self.type_ids_off);
        c += write_u4(bytes, self.proto_ids_size);
        c += write_u4(bytes, self.proto_ids_off);
        c += write_u4(bytes, self.field_ids_size);
        c += write_u4(bytes, self.field_ids_off);
        c += write_u4(bytes, self.method_ids_size);
        c += write_u4(bytes, self.method_ids_off);
        c += write_u4(bytes, self.class_defs_size);
        c += write_u4(bytes, self.class_defs_off);
        c += write_u4(bytes, self.data_size);
        c += write_u4(bytes, self.data_off);
        c
    }

    /// Return the numeric DEX version from the magic, e.g. 35, 37, 38, 39.
    pub fn version(&self) -> u32
    {
        let d = &self.magic[4..7];
        if d.iter().all(u8::is_ascii_digit) {
            d.iter().fold(0, |acc, b| acc * 10 + (b - b'0') as u32)
        } else {
            35
        }
    }
}
