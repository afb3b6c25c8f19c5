//! Decode miniSEED records from raw bytes.
//!
//! The main entry point is [`decode()`], which detects v2 or v3 and parses a
//! single record into an [`MseedRecord`]. For multi-record data, see
//! [`MseedReader`](crate::MseedReader).

use crate::decode_v3::decode_v3;
use crate::encode::V2_HEADER_SIZE;
use crate::record::{MseedRecord, Samples};
use crate::sid::SourceId;
use crate::time::{BTime, NanoTime};
use crate::types::{ByteOrder, EncodingFormat, FormatVersion};
use crate::{MseedError, Result};

/// Decode a single miniSEED record, v2 or v3.
pub fn decode(data: &[u8]) -> Result<MseedRecord> {
    if is_v3(data) {
        decode_v3(data)
    } else {
        decode_v2(data)
    }
}

/// True when `data` starts with the v3 `MS\x03` signature.
pub(crate) fn is_v3(data: &[u8]) -> bool {
    data.starts_with(b"MS\x03")
}

/// Decode a single miniSEED v2 record from raw bytes.
pub fn decode_v2(data: &[u8]) -> Result<MseedRecord> {
    if data.len() < V2_HEADER_SIZE {
        return Err(MseedError::RecordTooShort {
            expected: V2_HEADER_SIZE,
            actual: data.len(),
        });
    }

    let sequence_number = header_str(&data[0..6])?.to_string();
    let quality = data[6] as char;
    let station = header_str(&data[8..13])?.trim().to_string();
    let location = header_str(&data[13..15])?.trim().to_string();
    let channel = header_str(&data[15..18])?.trim().to_string();
    let network = header_str(&data[18..20])?.trim().to_string();

    // BTIME (bytes 20-29)
    let btime = BTime {
        year: u16::from_be_bytes([data[20], data[21]]),
        day: u16::from_be_bytes([data[22], data[23]]),
        hour: data[24],
        minute: data[25],
        second: data[26],
        // byte 27 is unused
        fract: u16::from_be_bytes([data[28], data[29]]),
    };

    let num_samples = u16::from_be_bytes([data[30], data[31]]) as usize;
    let sample_rate_factor = i16::from_be_bytes([data[32], data[33]]);
    let sample_rate_multiplier = i16::from_be_bytes([data[34], data[35]]);

    let data_offset = u16::from_be_bytes([data[44], data[45]]) as usize;
    let first_blockette = u16::from_be_bytes([data[46], data[47]]) as usize;

    let (encoding, byte_order_val, record_length_power) =
        find_blockette_1000(data, first_blockette)?;

    // Optional blockettes: 1001 refines the start time, 100 the rate
    let chain = blockettes(data, first_blockette);
    let body = |kind: u16| {
        chain
            .iter()
            .find(|&&(k, at)| k == kind && at + 8 <= data.len())
            .map(|&(_, at)| &data[at + 4..at + 8])
    };
    let microseconds = body(1001).map(|b| b[1] as i8);
    let sample_rate = match body(100) {
        Some(b) => f64::from(f32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        None => compute_sample_rate(sample_rate_factor, sample_rate_multiplier),
    };

    let byte_order = if byte_order_val == 1 {
        ByteOrder::Big
    } else {
        ByteOrder::Little
    };
    let record_length = 1u32
        .checked_shl(record_length_power.into())
        .ok_or(MseedError::InvalidHeader)?;
    if data.len() < record_length as usize {
        return Err(MseedError::RecordTooShort {
            expected: record_length as usize,
            actual: data.len(),
        });
    }
    if data_offset > record_length as usize {
        return Err(MseedError::InvalidHeader);
    }

    let encoding = EncodingFormat::from_code(encoding)?;

    let mut start_time = NanoTime::from_btime(&btime);
    if let Some(us) = microseconds {
        start_time = start_time
            .with_microsecond_offset(us)
            .ok_or(MseedError::InvalidHeader)?;
    }

    let data_section = &data[data_offset..record_length as usize];
    let samples = decode_data(data_section, encoding, num_samples, byte_order)?;

    let record = MseedRecord {
        sequence_number,
        quality,
        start_time,
        sample_rate,
        encoding,
        byte_order,
        record_length,
        samples,
        format_version: FormatVersion::V2,
        ..MseedRecord::new()
    };
    Ok(record.with_nslc(&network, &station, &location, &channel))
}

fn header_str(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| MseedError::InvalidHeader)
}

/// Nominal rate of a v2 factor/multiplier pair.
pub(crate) fn compute_sample_rate(factor: i16, multiplier: i16) -> f64 {
    if factor == 0 || multiplier == 0 {
        return 0.0;
    }
    let f = factor as f64;
    let m = multiplier as f64;
    match (factor > 0, multiplier > 0) {
        (true, true) => f * m,
        (true, false) => -f / m,
        (false, true) => -m / f,
        (false, false) => 1.0 / (f * m),
    }
}

/// Walk the blockette chain from `offset`, returning (type, offset) pairs.
fn blockettes(data: &[u8], mut offset: usize) -> Vec<(u16, usize)> {
    let mut chain = Vec::new();
    // A chain longer than the record must be looping
    for _ in 0..data.len() / 4 {
        if offset + 4 > data.len() {
            break;
        }
        let blockette_type = u16::from_be_bytes([data[offset], data[offset + 1]]);
        let next_offset = u16::from_be_bytes([data[offset + 2], data[offset + 3]]) as usize;
        chain.push((blockette_type, offset));

        if next_offset == 0 {
            break;
        }
        offset = next_offset;
    }
    chain
}

/// Find blockette 1000 in the chain starting at `offset`.
///
/// Returns (encoding, byte order, record length power).
pub(crate) fn find_blockette_1000(data: &[u8], offset: usize) -> Result<(u8, u8, u8)> {
    blockettes(data, offset)
        .into_iter()
        .find(|&(kind, at)| kind == 1000 && at + 8 <= data.len())
        .map(|(_, at)| (data[at + 4], data[at + 5], data[at + 6]))
        .ok_or(MseedError::MissingBlockette1000)
}

/// Decode a data payload of `num_samples` samples.
pub(crate) fn decode_data(
    data: &[u8],
    encoding: EncodingFormat,
    num_samples: usize,
    byte_order: ByteOrder,
) -> Result<Samples> {
    let needed = num_samples * encoding.wire_width();
    if data.len() < needed {
        return Err(MseedError::RecordTooShort {
            expected: needed,
            actual: data.len(),
        });
    }
    let data = &data[..needed];

    let samples = match encoding {
        EncodingFormat::Text => Samples::Text(data.to_vec()),
        EncodingFormat::Int16 => Samples::Int(
            read_values(data, byte_order, i16::from_be_bytes, i16::from_le_bytes)
                .into_iter()
                .map(i32::from)
                .collect(),
        ),
        EncodingFormat::Int32 => Samples::Int(read_values(
            data,
            byte_order,
            i32::from_be_bytes,
            i32::from_le_bytes,
        )),
        EncodingFormat::Float32 => Samples::Float(read_values(
            data,
            byte_order,
            f32::from_be_bytes,
            f32::from_le_bytes,
        )),
        EncodingFormat::Float64 => Samples::Double(read_values(
            data,
            byte_order,
            f64::from_be_bytes,
            f64::from_le_bytes,
        )),
    };

    if samples.len() != num_samples {
        return Err(MseedError::SampleCountMismatch {
            expected: num_samples,
            actual: samples.len(),
        });
    }
    Ok(samples)
}

fn read_values<T, const N: usize>(
    data: &[u8],
    byte_order: ByteOrder,
    be: fn([u8; N]) -> T,
    le: fn([u8; N]) -> T,
) -> Vec<T> {
    data.chunks_exact(N)
        .map(|chunk| {
            let mut bytes = [0u8; N];
            bytes.copy_from_slice(chunk);
            match byte_order {
                ByteOrder::Big => be(bytes),
                ByteOrder::Little => le(bytes),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode;

    #[test]
    fn test_decode_too_short() {
        assert!(matches!(
            decode(&[0u8; 20]),
            Err(MseedError::RecordTooShort { expected: 48, actual: 20 })
        ));
    }

    #[test]
    fn test_decode_missing_blockette_1000() {
        let mut bytes = encode(&MseedRecord::new()).unwrap();
        bytes[48..50].copy_from_slice(&100u16.to_be_bytes());
        assert!(matches!(
            decode(&bytes),
            Err(MseedError::MissingBlockette1000)
        ));
    }

    #[test]
    fn test_decode_self_referencing_blockette_chain() {
        let mut bytes = encode(&MseedRecord::new()).unwrap();
        bytes[48..50].copy_from_slice(&100u16.to_be_bytes());
        bytes[50..52].copy_from_slice(&48u16.to_be_bytes());
        assert!(matches!(
            decode(&bytes),
            Err(MseedError::MissingBlockette1000)
        ));
    }

    #[test]
    fn test_decode_unknown_encoding() {
        let mut bytes = encode(&MseedRecord::new()).unwrap();
        bytes[52] = 99;
        assert!(matches!(
            decode(&bytes),
            Err(MseedError::UnsupportedEncoding(99))
        ));
    }

    #[test]
    fn test_decode_truncated_record() {
        let bytes = encode(&MseedRecord::new()).unwrap();
        assert!(matches!(
            decode(&bytes[..256]),
            Err(MseedError::RecordTooShort { expected: 512, .. })
        ));
    }

    #[test]
    fn test_compute_sample_rate() {
        assert_eq!(compute_sample_rate(100, 1), 100.0);
        assert_eq!(compute_sample_rate(-10, 1), 0.1);
        assert_eq!(compute_sample_rate(25, -10), 2.5);
        assert_eq!(compute_sample_rate(0, 0), 0.0);
    }

    #[test]
    fn test_decode_synthesizes_source_id() {
        let bytes = encode(&MseedRecord::new().with_nslc("GE", "DAV", "10", "HHE")).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.source_id.as_str(), "FDSN:GE_DAV_10_H_H_E");
    }
}
