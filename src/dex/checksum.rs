//! The two self-referential integrity fields of the header.
//!
//! The SHA-1 signature covers everything after itself; the Adler-32 checksum covers everything
//! after itself *including* the signature, so the signature has to be written first.

use crate::dex::error::DexError;
use crate::dex::header::HEADER_SIZE;
use adler::adler32_slice;
use sha1::{Digest, Sha1};

pub const CHECKSUM_OFFSET: usize = 8;
pub const SIGNATURE_OFFSET: usize = 12;
pub const SIGNATURE_END: usize = 32;

/// Adler-32 as used by the `checksum` field. The empty input yields 1.
pub fn adler32(data: &[u8]) -> u32
{
    adler32_slice(data)
}

pub fn sha1(data: &[u8]) -> [u8; 20]
{
    let mut hasher = Sha1::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest);
    out
}

fn check_len(bytes: &[u8]) -> Result<(), DexError>
{
    if bytes.len() < HEADER_SIZE as usize {
        fail!(Truncated, "0x{:x} bytes is too short to carry a dex header", bytes.len());
    }
    Ok(())
}

pub fn compute_signature(bytes: &[u8]) -> Result<[u8; 20], DexError>
{
    check_len(bytes)?;
    Ok(sha1(&bytes[SIGNATURE_END..]))
}

pub fn compute_checksum(bytes: &[u8]) -> Result<u32, DexError>
{
    check_len(bytes)?;
    Ok(adler32(&bytes[SIGNATURE_OFFSET..]))
}

/// Rewrites signature then checksum in place and returns the new values.
pub fn recompute(bytes: &mut [u8]) -> Result<(u32, [u8; 20]), DexError>
{
    let signature = compute_signature(bytes)?;
    bytes[SIGNATURE_OFFSET..SIGNATURE_END].copy_from_slice(&signature);

    let checksum = compute_checksum(bytes)?;
    bytes[CHECKSUM_OFFSET..SIGNATURE_OFFSET].copy_from_slice(&checksum.to_le_bytes());

    Ok((checksum, signature))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrityStatus
{
    pub checksum_ok: bool,
    pub signature_ok: bool,
}

impl IntegrityStatus
{
    pub fn is_valid(&self) -> bool
    {
        self.checksum_ok && self.signature_ok
    }
}

/// Compares the stored fields with freshly computed ones without modifying anything.
pub fn verify(bytes: &[u8]) -> Result<IntegrityStatus, DexError>
{
    check_len(bytes)?;
    let stored_checksum = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    let checksum = compute_checksum(bytes)?;
    let signature = compute_signature(bytes)?;
    Ok(IntegrityStatus {
        checksum_ok: stored_checksum == checksum,
        signature_ok: bytes[SIGNATURE_OFFSET..SIGNATURE_END] == signature,
    })
}
