/* Extract a method's code and leave nops in its place */

use crate::dex::code::CodeBlock;
use crate::dex::tables::MethodId;
use crate::dex::{DexError, DexFile};
use crate::query::MethodQuery;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// What [`hollow_method`] took out of the dex file.
#[derive(Debug, Clone)]
pub struct HollowedMethod {
    pub method_idx: MethodId,
    pub descriptor: String,
    /// The code block as it was before zeroing.
    pub original: CodeBlock,
    /// `original` serialized with [`CodeBlock::write_aux_record`].
    pub aux_record: Vec<u8>,
}

/// Finds the method named by `query`, records its instructions and zeroes them in `dex`.
///
/// Fails with `MethodNotFound` or `MethodHasNoCode` when there is nothing to hollow; the file is
/// left untouched in both cases.
pub fn hollow_method(dex: &mut DexFile, query: &MethodQuery) -> Result<HollowedMethod, DexError>
{
    let method_idx = dex.find(query)
        .ok_or_else(|| err!(MethodNotFound, "no method matches {}", query))?;
    let descriptor = dex.method_descriptor(method_idx).unwrap_or_else(|| query.to_string());

    let block = dex.code_mut(method_idx)
        .ok_or_else(|| err!(MethodHasNoCode, "{} is abstract or native", descriptor))?;

    let original = block.clone();
    let mut aux_record = Vec::with_capacity(8 + 2 * original.insns.len());
    original.write_aux_record(&mut aux_record);
    block.zero();

    info!("[hollow] {} (method {}): {} code units at 0x{:x}",
          descriptor, method_idx, original.insns.len(), original.offset());

    Ok(HollowedMethod { method_idx, descriptor, original, aux_record })
}

/// Input and output locations for [`hollow_file`].
#[derive(Debug, Clone)]
pub struct HollowRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub aux_output: PathBuf,
    pub query: MethodQuery,
}

/// Loads `input`, hollows the requested method and writes both the aux record and the rewritten
/// dex. Each output goes to a sibling `.part` file first and is renamed into place only once both
/// have been written, so a failed write leaves neither output behind.
pub fn hollow_file(request: &HollowRequest) -> Result<HollowedMethod, DexError>
{
    let mut dex = DexFile::from_file(&request.input)?;
    let hollowed = hollow_method(&mut dex, &request.query)?;
    let image = dex.to_bytes()?;

    let dex_part = part_path(&request.output);
    let aux_part = part_path(&request.aux_output);

    let staged = write_file(&dex_part, &image)
        .and_then(|_| write_file(&aux_part, &hollowed.aux_record));
    if let Err(e) = staged {
        discard(&[dex_part.as_path(), aux_part.as_path()]);
        return Err(e);
    }

    if let Err(e) = rename_file(&dex_part, &request.output) {
        discard(&[dex_part.as_path(), aux_part.as_path()]);
        return Err(e);
    }
    if let Err(e) = rename_file(&aux_part, &request.aux_output) {
        discard(&[aux_part.as_path(), request.output.as_path()]);
        return Err(e);
    }

    info!("[hollow] wrote {} and {}", request.output.display(), request.aux_output.display());
    Ok(hollowed)
}

fn part_path(path: &Path) -> PathBuf
{
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), DexError>
{
    fs::write(path, contents)
        .map_err(|e| DexError::with_context(e.into(), path.display().to_string()))
}

fn rename_file(from: &Path, to: &Path) -> Result<(), DexError>
{
    fs::rename(from, to)
        .map_err(|e| DexError::with_context(e.into(), to.display().to_string()))
}

fn discard(paths: &[&Path])
{
    for path in paths {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("[hollow] could not remove {}: {}", path.display(), e);
            }
        }
    }
}
