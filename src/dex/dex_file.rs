/* Dex file: parsed tables over a single byte image */

use crate::dex::checksum::{self, IntegrityStatus};
use crate::dex::class_data::{walk_class_data, ClassData};
use crate::dex::code::CodeBlock;
use crate::dex::error::DexError;
use crate::dex::header::{Header, ENDIAN_CONSTANT};
use crate::dex::resolver;
use crate::dex::tables::{IndexTables, MethodId};
use crate::query::MethodQuery;
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// A parsed dex file.
///
/// The original bytes stay the source of truth. Tables are decoded once at load; the only thing
/// that may change afterwards is the instructions of a [`CodeBlock`], and those reach the output
/// through [`DexFile::to_bytes`] which writes modified blocks back into a copy of the image.
#[derive(Debug)]
pub struct DexFile {
    header: Header,
    tables: IndexTables,
    class_data: Vec<Option<ClassData>>,
    code: BTreeMap<MethodId, CodeBlock>,
    modified: BTreeSet<MethodId>,
    data: Vec<u8>,
}

impl DexFile {

    pub fn from_bytes(bytes: &[u8]) -> Result<DexFile, DexError>
    {
        let header = Header::read(bytes)?;

        if header.file_size as usize != bytes.len() {
            warn!("[dex] header file_size 0x{:x} but image is 0x{:x} bytes", header.file_size, bytes.len());
        }
        if header.endian_tag != ENDIAN_CONSTANT {
            warn!("[dex] unexpected endian tag 0x{:08x}", header.endian_tag);
        }

        let status = checksum::verify(bytes)?;
        if !status.is_valid() {
            warn!("[dex] stored integrity fields are stale: {:?}", status);
        }

        let tables = IndexTables::read(bytes, &header)?;
        let (class_data, code) = walk_class_data(bytes, &tables.class_defs, tables.methods.len())?;

        info!(
            "[dex] loaded version {} dex: {} methods, {} with code, {} classes",
            header.version(), tables.methods.len(), code.len(), tables.class_defs.len()
        );

        Ok(DexFile {
            header,
            tables,
            class_data,
            code,
            modified: BTreeSet::new(),
            data: bytes.to_vec(),
        })
    }

    pub fn from_file(path: &Path) -> Result<DexFile, DexError>
    {
        let bytes = fs::read(path)
            .map_err(|e| DexError::with_context(e.into(), path.display().to_string()))?;
        DexFile::from_bytes(&bytes)
    }

    pub fn header(&self) -> &Header
    {
        &self.header
    }

    pub fn tables(&self) -> &IndexTables
    {
        &self.tables
    }

    /// The walked class data for class def `i`, if it has any.
    pub fn class_data(&self, i: usize) -> Option<&ClassData>
    {
        self.class_data.get(i).and_then(Option::as_ref)
    }

    /// The bytes as loaded, without any pending instruction changes.
    pub fn original_bytes(&self) -> &[u8]
    {
        &self.data
    }

    pub fn find_method(&self, class_name: &str, method_name: &str, shorty: &str) -> Option<MethodId>
    {
        resolver::find_method(&self.tables, class_name, method_name, shorty)
    }

    pub fn find(&self, query: &MethodQuery) -> Option<MethodId>
    {
        self.find_method(query.class_name(), query.method_name(), query.shorty())
    }

    pub fn method_descriptor(&self, id: MethodId) -> Option<String>
    {
        self.tables.method_descriptor(id)
    }

    /// The code of a method, `None` for unknown ids and for abstract or native methods.
    pub fn code(&self, id: MethodId) -> Option<&CodeBlock>
    {
        self.code.get(&id)
    }

    /// Mutable access to a method's code; the block is written back on the next save.
    pub fn code_mut(&mut self, id: MethodId) -> Option<&mut CodeBlock>
    {
        let block = self.code.get_mut(&id)?;
        self.modified.insert(id);
        Some(block)
    }

    /// Replaces a method's instructions. The new sequence must be the same length as the old.
    pub fn set_code(&mut self, id: MethodId, insns: Vec<u16>) -> Result<(), DexError>
    {
        let Some(block) = self.code.get_mut(&id) else {
            if id < self.tables.methods.len() {
                fail!(MethodHasNoCode, "method {} has no code_item", id);
            }
            fail!(MethodNotFound, "method {} does not exist", id);
        };
        if insns.len() != block.insns.len() {
            fail!(CodeSizeMismatch, "method {} has {} instruction units, got {}", id, block.insns.len(), insns.len());
        }
        block.insns = insns;
        self.modified.insert(id);
        Ok(())
    }

    /// Builds the output image: modified code blocks written back over a copy of the original
    /// bytes, then signature and checksum recomputed.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DexError>
    {
        let mut out = self.data.clone();
        for id in &self.modified {
            if let Some(block) = self.code.get(id) {
                block.write_back(&mut out)
                    .map_err(|e| DexError::with_context(e, format!("method {}", id)))?;
            }
        }
        checksum::recompute(&mut out)?;
        Ok(out)
    }

    /// Writes the output image in one go. Nothing touches `path` unless the image was built.
    pub fn save(&self, path: &Path) -> Result<(), DexError>
    {
        let bytes = self.to_bytes()?;
        fs::write(path, &bytes)
            .map_err(|e| DexError::with_context(e.into(), path.display().to_string()))?;
        info!("[dex] wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    /// Checks the stored checksum and signature against the loaded bytes.
    pub fn verify_integrity(&self) -> Result<IntegrityStatus, DexError>
    {
        checksum::verify(&self.data)
    }
}
