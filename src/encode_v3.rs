//! Encode an [`MseedRecord`] into miniSEED v3 record bytes.
//!
//! The v3 format uses a 40-byte fixed header (little-endian), followed by
//! the variable-length Source Identifier and the data payload. CRC-32C is
//! computed over the entire record.

use crate::crc;
use crate::encode::encode_data;
use crate::record::MseedRecord;
use crate::types::ByteOrder;
use crate::{MseedError, Result};

/// Size of the v3 fixed header.
pub const V3_HEADER_SIZE: usize = 40;

/// Encode a [`MseedRecord`] into miniSEED v3 record bytes.
pub fn encode_v3(record: &MseedRecord) -> Result<Vec<u8>> {
    let encoding = record.encoding;

    // Uncompressed v3 payloads are always little-endian
    let data_payload = encode_data(&record.samples, encoding, ByteOrder::Little)?;

    let sid_bytes = record.source_id.as_str().as_bytes();
    if sid_bytes.len() > u8::MAX as usize {
        return Err(MseedError::EncodeError(format!(
            "SID too long: {} bytes (max 255)",
            sid_bytes.len()
        )));
    }
    let num_samples = u32::try_from(record.samples.len())
        .map_err(|_| MseedError::EncodeError("too many samples for one record".into()))?;
    let data_length = u32::try_from(data_payload.len())
        .map_err(|_| MseedError::EncodeError("data payload too large".into()))?;

    let total_length = V3_HEADER_SIZE + sid_bytes.len() + data_payload.len();
    let mut buf = vec![0u8; total_length];

    // --- Fixed header (40 bytes, little-endian) ---

    buf[0] = b'M';
    buf[1] = b'S';
    buf[2] = 3;
    buf[3] = record.flags;
    buf[4..8].copy_from_slice(&record.start_time.nanosecond.to_le_bytes());
    buf[8..10].copy_from_slice(&record.start_time.year.to_le_bytes());
    buf[10..12].copy_from_slice(&record.start_time.day.to_le_bytes());
    buf[12] = record.start_time.hour;
    buf[13] = record.start_time.minute;
    buf[14] = record.start_time.second;
    buf[15] = encoding.to_code();
    buf[16..24].copy_from_slice(&record.sample_rate.to_le_bytes());
    buf[24..28].copy_from_slice(&num_samples.to_le_bytes());
    // CRC (28-31): zeroed, computed after
    buf[32] = record.publication_version;
    buf[33] = sid_bytes.len() as u8;
    // Extra headers length (34-35): none
    buf[36..40].copy_from_slice(&data_length.to_le_bytes());

    // --- Variable sections ---

    let data_start = V3_HEADER_SIZE + sid_bytes.len();
    buf[V3_HEADER_SIZE..data_start].copy_from_slice(sid_bytes);
    buf[data_start..].copy_from_slice(&data_payload);

    crc::compute_v3_crc(&mut buf);

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode;
    use crate::record::Samples;
    use crate::sid::SourceId;
    use crate::time::NanoTime;
    use crate::types::{EncodingFormat, FormatVersion};

    fn v3(samples: Samples, encoding: EncodingFormat) -> MseedRecord {
        MseedRecord::new_v3()
            .with_nslc("IU", "ANMO", "00", "BHZ")
            .with_sample_rate(20.0)
            .with_encoding(encoding)
            .with_samples(samples)
    }

    #[test]
    fn test_v3_encode_decode_roundtrip_int32() {
        let record = v3(
            Samples::Int(vec![1, -2, 3, -4, 100_000, -100_000]),
            EncodingFormat::Int32,
        )
        .with_start_time(NanoTime {
            year: 2025,
            day: 100,
            hour: 12,
            minute: 30,
            second: 45,
            nanosecond: 500_000_001,
        })
        .with_publication_version(2);

        let encoded = encode_v3(&record).unwrap();
        assert_eq!(&encoded[0..3], b"MS\x03");

        let decoded = decode::decode(&encoded).unwrap();
        assert_eq!(decoded.format_version, FormatVersion::V3);
        assert_eq!(decoded.nslc(), "IU.ANMO.00.BHZ");
        assert_eq!(decoded.sample_rate, 20.0);
        assert_eq!(decoded.start_time, record.start_time);
        assert_eq!(decoded.publication_version, 2);
        assert_eq!(decoded.samples, record.samples);
    }

    #[test]
    fn test_v3_encode_decode_roundtrip_text() {
        let record = v3(Samples::Text(b"event at 12:00".to_vec()), EncodingFormat::Text);
        let decoded = decode::decode(&encode_v3(&record).unwrap()).unwrap();
        assert_eq!(decoded.samples, Samples::Text(b"event at 12:00".to_vec()));
    }

    #[test]
    fn test_v3_encode_decode_roundtrip_float32() {
        let record = v3(
            Samples::Float(vec![0.0, 1.5, -1.5, 3.25, f32::MIN_POSITIVE]),
            EncodingFormat::Float32,
        );
        let decoded = decode::decode(&encode_v3(&record).unwrap()).unwrap();
        assert_eq!(decoded.samples, record.samples);
    }

    #[test]
    fn test_v3_sample_rate_kept_exactly() {
        let record = v3(Samples::Int(vec![1]), EncodingFormat::Int32).with_sample_rate(1.0 / 3.0);
        let decoded = decode::decode(&encode_v3(&record).unwrap()).unwrap();
        assert_eq!(decoded.sample_rate, 1.0 / 3.0);
    }

    #[test]
    fn test_v3_keeps_source_id_verbatim() {
        let sid = SourceId::parse("FDSN:XX_LONGSTATION_99_L_H_Z");
        let record = v3(Samples::Int(vec![7]), EncodingFormat::Int32).with_source_id(sid.clone());
        let decoded = decode::decode(&encode_v3(&record).unwrap()).unwrap();
        assert_eq!(decoded.source_id, sid);
        assert_eq!(decoded.station, "LONGSTATION");
    }

    #[test]
    fn test_v3_encode_crc_valid() {
        let record = v3(Samples::Int(vec![42]), EncodingFormat::Int32);
        let encoded = encode_v3(&record).unwrap();
        assert!(crc::verify_v3_crc(&encoded));
    }

    #[test]
    fn test_v3_empty_record() {
        let record = v3(Samples::Double(vec![]), EncodingFormat::Float64);
        let encoded = encode_v3(&record).unwrap();
        assert_eq!(encoded.len(), V3_HEADER_SIZE + record.source_id.as_str().len());
        let decoded = decode::decode(&encoded).unwrap();
        assert_eq!(decoded.samples, Samples::Double(vec![]));
    }

    #[test]
    fn test_v3_encode_via_top_level_encode() {
        let record = v3(Samples::Int(vec![1, 2, 3]), EncodingFormat::Int32);
        let encoded = crate::encode::encode(&record).unwrap();
        assert_eq!(&encoded[0..3], b"MS\x03");
    }
}
