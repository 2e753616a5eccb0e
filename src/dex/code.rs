/* code_item reading and in-place write-back */

use crate::dex::error::DexError;
use crate::dex::{check_extent, read_u2, read_u4, write_u2, write_u4};

/// Size of the fixed part of a `code_item` preceding `insns`.
pub const CODE_HEADER_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeHeader
{
    pub registers_size: u16,
    pub ins_size: u16,
    pub outs_size: u16,
    pub tries_size: u16,
    pub debug_info_off: u32,
    pub insns_size: u32,
}

impl CodeHeader
{
    fn read(bytes: &[u8], ix: &mut usize) -> Result<CodeHeader, DexError>
    {
        Ok(CodeHeader {
            registers_size: read_u2(bytes, ix)?,
            ins_size: read_u2(bytes, ix)?,
            outs_size: read_u2(bytes, ix)?,
            tries_size: read_u2(bytes, ix)?,
            debug_info_off: read_u4(bytes, ix)?,
            insns_size: read_u4(bytes, ix)?,
        })
    }
}

/// A decoded view of one method's `code_item`.
///
/// Changing `insns` does nothing to the file until [`CodeBlock::write_back`] copies them over
/// the original location, which is why the block remembers where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock
{
    offset: usize,
    header: CodeHeader,
    pub insns: Vec<u16>,
}

impl CodeBlock
{
    pub fn read(bytes: &[u8], offset: usize) -> Result<CodeBlock, DexError>
    {
        let mut ix = offset;
        let header = CodeHeader::read(bytes, &mut ix)?;

        let count = header.insns_size as usize;
        check_extent(bytes, ix, count, 2)
            .map_err(|e| DexError::with_context(e, format!("insns of code_item at 0x{:x}", offset)))?;
        let mut insns = Vec::with_capacity(count);
        for _ in 0..count { insns.push(read_u2(bytes, &mut ix)?); }

        Ok(CodeBlock { offset, header, insns })
    }

    /// Offset of the `code_item` in the file.
    pub fn offset(&self) -> usize
    {
        self.offset
    }

    pub fn header(&self) -> &CodeHeader
    {
        &self.header
    }

    /// Overwrites the original instruction bytes with the current `insns`. The header is left
    /// alone, so the instruction count must not have changed.
    pub fn write_back(&self, bytes: &mut [u8]) -> Result<(), DexError>
    {
        if self.insns.len() != self.header.insns_size as usize {
            fail!(CodeSizeMismatch, "code_item at 0x{:x} holds {} units, header says {}",
                  self.offset, self.insns.len(), self.header.insns_size);
        }
        let start = self.offset + CODE_HEADER_SIZE;
        check_extent(bytes, start, self.insns.len(), 2)?;

        for (unit, dst) in self.insns.iter().zip(bytes[start..].chunks_exact_mut(2)) {
            dst.copy_from_slice(&unit.to_le_bytes());
        }
        Ok(())
    }

    /// Replaces every instruction unit with zero (`nop`).
    pub fn zero(&mut self)
    {
        self.insns.iter_mut().for_each(|u| *u = 0);
    }

    /// Appends the extraction record: `debug_info_off`, `insns_size`, then the raw units, all
    /// little-endian.
    pub fn write_aux_record(&self, bytes: &mut Vec<u8>) -> usize
    {
        let mut c = 0;
        c += write_u4(bytes, self.header.debug_info_off);
        c += write_u4(bytes, self.insns.len() as u32);
        for &u in &self.insns { c += write_u2(bytes, u); }
        c
    }
}
