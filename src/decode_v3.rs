//! Decode miniSEED v3 records from raw bytes.
//!
//! The v3 format uses a 40-byte fixed header (little-endian), followed by
//! variable-length Source Identifier, optional extra headers (JSON), and
//! data payload. CRC-32C integrity checking is performed automatically.

use crate::crc;
use crate::decode::decode_data;
use crate::encode_v3::V3_HEADER_SIZE;
use crate::record::MseedRecord;
use crate::sid::SourceId;
use crate::time::NanoTime;
use crate::types::{ByteOrder, EncodingFormat, FormatVersion};
use crate::{MseedError, Result};

/// Decode a single miniSEED v3 record from raw bytes.
pub fn decode_v3(data: &[u8]) -> Result<MseedRecord> {
    if data.len() < V3_HEADER_SIZE {
        return Err(MseedError::RecordTooShort {
            expected: V3_HEADER_SIZE,
            actual: data.len(),
        });
    }

    if data[0] != b'M' || data[1] != b'S' || data[2] != 3 {
        return Err(MseedError::InvalidV3Header(
            "missing 'MS' magic or version != 3".into(),
        ));
    }

    let flags = data[3];
    let nanosecond = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    let year = u16::from_le_bytes([data[8], data[9]]);
    let day = u16::from_le_bytes([data[10], data[11]]);
    let hour = data[12];
    let minute = data[13];
    let second = data[14];
    let encoding_code = data[15];
    let sample_rate = f64::from_le_bytes(
        data[16..24]
            .try_into()
            .map_err(|_| MseedError::InvalidV3Header("bad sample rate bytes".into()))?,
    );
    let num_samples = u32::from_le_bytes([data[24], data[25], data[26], data[27]]) as usize;
    let pub_version = data[32];

    let total_length = peek_v3_record_length(data)?;
    if data.len() < total_length {
        return Err(MseedError::RecordTooShort {
            expected: total_length,
            actual: data.len(),
        });
    }
    let record_bytes = &data[..total_length];

    let stored = crc::stored_v3_crc(record_bytes).unwrap_or_default();
    let computed = crc::expected_v3_crc(record_bytes).unwrap_or_default();
    if stored != computed {
        return Err(MseedError::CrcMismatch { stored, computed });
    }

    let sid_length = data[33] as usize;
    let extra_length = u16::from_le_bytes([data[34], data[35]]) as usize;

    let sid_end = V3_HEADER_SIZE + sid_length;
    let sid_str = std::str::from_utf8(&record_bytes[V3_HEADER_SIZE..sid_end])
        .map_err(|_| MseedError::InvalidV3Header("invalid UTF-8 in SID".into()))?;
    let source_id = SourceId::parse(sid_str);

    // Extra headers are skipped; only the payload after them is decoded
    let data_section = &record_bytes[sid_end + extra_length..];
    let encoding = EncodingFormat::from_code(encoding_code)?;
    let samples = decode_data(data_section, encoding, num_samples, ByteOrder::Little)?;

    let record = MseedRecord {
        format_version: FormatVersion::V3,
        start_time: NanoTime {
            year,
            day,
            hour,
            minute,
            second,
            nanosecond,
        },
        sample_rate,
        encoding,
        samples,
        record_length: total_length as u32,
        flags,
        publication_version: pub_version,
        crc: stored,
        ..MseedRecord::new_v3()
    };
    Ok(record.with_source_id(source_id))
}

/// Peek at a v3 record to determine its total length.
///
/// Requires at least 40 bytes (the fixed header).
pub(crate) fn peek_v3_record_length(data: &[u8]) -> Result<usize> {
    if data.len() < V3_HEADER_SIZE {
        return Err(MseedError::RecordTooShort {
            expected: V3_HEADER_SIZE,
            actual: data.len(),
        });
    }
    let sid_length = data[33] as usize;
    let extra_length = u16::from_le_bytes([data[34], data[35]]) as usize;
    let data_length = u32::from_le_bytes([data[36], data[37], data[38], data[39]]) as usize;
    Ok(V3_HEADER_SIZE + sid_length + extra_length + data_length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode_v3::encode_v3;
    use crate::record::Samples;

    fn sample_record() -> Vec<u8> {
        let record = MseedRecord::new_v3()
            .with_nslc("IU", "ANMO", "00", "BHZ")
            .with_sample_rate(40.0)
            .with_encoding(EncodingFormat::Int32)
            .with_samples(Samples::Int(vec![5, 6, 7]));
        encode_v3(&record).unwrap()
    }

    #[test]
    fn test_v3_crc_mismatch_detected() {
        let mut bytes = sample_record();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(matches!(
            decode_v3(&bytes),
            Err(MseedError::CrcMismatch { .. })
        ));
    }

    #[test]
    fn test_v3_bad_magic() {
        let mut bytes = sample_record();
        bytes[2] = 2;
        assert!(matches!(
            decode_v3(&bytes),
            Err(MseedError::InvalidV3Header(_))
        ));
    }

    #[test]
    fn test_v3_truncated() {
        let bytes = sample_record();
        assert!(matches!(
            decode_v3(&bytes[..bytes.len() - 4]),
            Err(MseedError::RecordTooShort { .. })
        ));
    }

    #[test]
    fn test_peek_length_matches_encoded_size() {
        let bytes = sample_record();
        assert_eq!(peek_v3_record_length(&bytes).unwrap(), bytes.len());
    }

    #[test]
    fn test_v3_decoded_fields() {
        let decoded = decode_v3(&sample_record()).unwrap();
        assert_eq!(decoded.format_version, FormatVersion::V3);
        assert_eq!(decoded.nslc(), "IU.ANMO.00.BHZ");
        assert_eq!(decoded.sample_rate, 40.0);
        assert_eq!(decoded.samples, Samples::Int(vec![5, 6, 7]));
        assert_eq!(decoded.sequence_number, "000000");
    }
}
