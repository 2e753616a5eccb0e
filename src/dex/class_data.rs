/* class_data_item walking */

use crate::dex::code::CodeBlock;
use crate::dex::error::DexError;
use crate::dex::read_uleb128;
use crate::dex::tables::{ClassDefItem, MethodId};
use bitflags::bitflags;
use log::debug;
use std::collections::BTreeMap;

bitflags! {
    /// Access flags shared by classes, fields and methods.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const PUBLIC = 0x1;
        const PRIVATE = 0x2;
        const PROTECTED = 0x4;
        const STATIC = 0x8;
        const FINAL = 0x10;
        const SYNCHRONIZED = 0x20;
        const VOLATILE = 0x40;
        const BRIDGE = 0x40;
        const TRANSIENT = 0x80;
        const VARARGS = 0x80;
        const NATIVE = 0x100;
        const INTERFACE = 0x200;
        const ABSTRACT = 0x400;
        const STRICT = 0x800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const CONSTRUCTOR = 0x10000;
        const DECLARED_SYNCHRONIZED = 0x20000;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMethod
{
    pub method_idx: MethodId,
    pub access_flags: AccessFlags,
    /// Offset of the `code_item`, zero for abstract and native methods.
    pub code_off: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassData {
    pub static_fields_size: u32,
    pub instance_fields_size: u32,
    pub direct_methods: Vec<EncodedMethod>,
    pub virtual_methods: Vec<EncodedMethod>,
}

impl ClassData
{
    /// Decodes a `class_data_item`. Field entries are skipped; only the method lists are kept.
    pub fn read(bytes: &[u8], ix: &mut usize) -> Result<ClassData, DexError>
    {
        let static_fields_size = read_uleb128(bytes, ix)?;
        let instance_fields_size = read_uleb128(bytes, ix)?;
        let direct_methods_size = read_uleb128(bytes, ix)?;
        let virtual_methods_size = read_uleb128(bytes, ix)?;

        for _ in 0..(static_fields_size as u64 + instance_fields_size as u64) {
            read_uleb128(bytes, ix)?; // field_idx_diff
            read_uleb128(bytes, ix)?; // access_flags
        }

        let direct_methods = read_encoded_methods(bytes, ix, direct_methods_size)?;
        // Virtual method deltas start over from zero.
        let virtual_methods = read_encoded_methods(bytes, ix, virtual_methods_size)?;

        Ok(ClassData { static_fields_size, instance_fields_size, direct_methods, virtual_methods })
    }

    pub fn methods(&self) -> impl Iterator<Item = &EncodedMethod>
    {
        self.direct_methods.iter().chain(self.virtual_methods.iter())
    }
}

fn read_encoded_methods(bytes: &[u8], ix: &mut usize, count: u32) -> Result<Vec<EncodedMethod>, DexError>
{
    let mut methods = vec![];
    let mut last: MethodId = 0;
    for _ in 0..count {
        let method_idx = last + read_uleb128(bytes, ix)? as MethodId;
        last = method_idx;
        let access_flags = AccessFlags::from_bits_retain(read_uleb128(bytes, ix)?);
        let code_off = read_uleb128(bytes, ix)?;
        methods.push(EncodedMethod { method_idx, access_flags, code_off });
    }
    Ok(methods)
}

/// Walks every class def that has class data, returning the walked items (one per class def,
/// `None` where `class_data_off` is zero) and the code blocks keyed by global method index.
pub(crate) fn walk_class_data(
    bytes: &[u8],
    class_defs: &[ClassDefItem],
    method_count: usize,
) -> Result<(Vec<Option<ClassData>>, BTreeMap<MethodId, CodeBlock>), DexError>
{
    let mut walked = Vec::with_capacity(class_defs.len());
    let mut code = BTreeMap::new();

    for (i, c) in class_defs.iter().enumerate()
    {
        if c.class_data_off == 0 {
            walked.push(None);
            continue;
        }

        let context = || format!("class_data of class_defs[{}] at 0x{:x}", i, c.class_data_off);
        let mut ix = c.class_data_off as usize;
        let data = ClassData::read(bytes, &mut ix).map_err(|e| DexError::with_context(e, context()))?;

        for m in data.methods()
        {
            if m.method_idx >= method_count {
                return Err(DexError::with_context(
                    err!(IndexOutOfRange, "method index {} out of range (table has {})", m.method_idx, method_count),
                    context(),
                ));
            }
            if m.code_off != 0 {
                let block = CodeBlock::read(bytes, m.code_off as usize)
                    .map_err(|e| DexError::with_context(e, format!("method {}", m.method_idx)))
                    .map_err(|e| DexError::with_context(e, context()))?;
                code.insert(m.method_idx, block);
            }
        }

        debug!(
            "[class_data] class_defs[{}]: {} direct, {} virtual methods",
            i, data.direct_methods.len(), data.virtual_methods.len()
        );
        walked.push(Some(data));
    }

    Ok((walked, code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dex::write_uleb128;

    fn encode_class_data(fields: &[(u32, u32)], direct: &[(u32, u32, u32)], virt: &[(u32, u32, u32)]) -> Vec<u8>
    {
        let mut bytes = vec![];
        write_uleb128(&mut bytes, fields.len() as u32);
        write_uleb128(&mut bytes, 0);
        write_uleb128(&mut bytes, direct.len() as u32);
        write_uleb128(&mut bytes, virt.len() as u32);
        for &(delta, flags) in fields {
            write_uleb128(&mut bytes, delta);
            write_uleb128(&mut bytes, flags);
        }
        for &(delta, flags, off) in direct.iter().chain(virt.iter()) {
            write_uleb128(&mut bytes, delta);
            write_uleb128(&mut bytes, flags);
            write_uleb128(&mut bytes, off);
        }
        bytes
    }

    #[test]
    fn virtual_indices_restart_from_zero()
    {
        let bytes = encode_class_data(&[], &[(2, 0x1, 0), (1, 0x2, 0)], &[(0, 0x1, 0), (3, 0x401, 0)]);
        let mut ix = 0;
        let data = ClassData::read(&bytes, &mut ix).unwrap();
        assert_eq!(ix, bytes.len());

        let direct: Vec<_> = data.direct_methods.iter().map(|m| m.method_idx).collect();
        let virt: Vec<_> = data.virtual_methods.iter().map(|m| m.method_idx).collect();
        assert_eq!(direct, vec![2, 3]);
        assert_eq!(virt, vec![0, 3]);
        assert!(data.virtual_methods[1].access_flags.contains(AccessFlags::ABSTRACT));
    }

    #[test]
    fn fields_are_skipped()
    {
        let bytes = encode_class_data(&[(0, 0x8), (300, 0x19)], &[(5, 0x10001, 0)], &[]);
        let mut ix = 0;
        let data = ClassData::read(&bytes, &mut ix).unwrap();
        assert_eq!(data.static_fields_size, 2);
        assert_eq!(data.direct_methods[0].method_idx, 5);
        assert!(data.direct_methods[0].access_flags.contains(AccessFlags::CONSTRUCTOR | AccessFlags::PUBLIC));
    }

    #[test]
    fn truncated_class_data()
    {
        let mut bytes = encode_class_data(&[], &[(2, 0x1, 0)], &[]);
        bytes.pop();
        let mut ix = 0;
        assert_eq!(ClassData::read(&bytes, &mut ix).unwrap_err().kind(), crate::dex::ErrorKind::Truncated);
    }
}
