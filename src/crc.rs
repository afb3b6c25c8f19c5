//! CRC-32C (Castagnoli) for miniSEED v3 record integrity.
//!
//! The CRC field in a v3 record (bytes 28-31) is treated as zero during
//! computation; the result is stored there little-endian.

use crc::{CRC_32_ISCSI, Crc};

const CASTAGNOLI: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

/// Byte range of the CRC field in a v3 fixed header.
const CRC_FIELD: std::ops::Range<usize> = 28..32;

/// Compute CRC-32C (Castagnoli) over the given data.
pub fn crc32c(data: &[u8]) -> u32 {
    CASTAGNOLI.checksum(data)
}

/// CRC of a v3 record with its CRC field read as zeros.
fn record_crc(record: &[u8]) -> u32 {
    let mut digest = CASTAGNOLI.digest();
    digest.update(&record[..CRC_FIELD.start]);
    digest.update(&[0u8; 4]);
    digest.update(&record[CRC_FIELD.end..]);
    digest.finalize()
}

/// Compute and store the CRC-32C of a miniSEED v3 record.
///
/// Records shorter than the CRC field are left untouched.
pub fn compute_v3_crc(record: &mut [u8]) -> u32 {
    if record.len() < CRC_FIELD.end {
        return crc32c(record);
    }
    let crc = record_crc(record);
    record[CRC_FIELD].copy_from_slice(&crc.to_le_bytes());
    crc
}

/// CRC stored in a v3 record.
pub fn stored_v3_crc(record: &[u8]) -> Option<u32> {
    let bytes = record.get(CRC_FIELD)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// CRC a v3 record should carry, `None` if it is too short to have one.
pub fn expected_v3_crc(record: &[u8]) -> Option<u32> {
    (record.len() >= CRC_FIELD.end).then(|| record_crc(record))
}

/// Verify the CRC-32C of a miniSEED v3 record.
pub fn verify_v3_crc(record: &[u8]) -> bool {
    match (stored_v3_crc(record), expected_v3_crc(record)) {
        (Some(stored), Some(computed)) => stored == computed,
        _ => false,
    }
}
