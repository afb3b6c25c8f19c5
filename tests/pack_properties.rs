//! Property-based round trips: any N >= 0 samples of a supported encoding
//! come back from the written file unchanged.

use mseed_pack::{
    FormatVersion, MseedReader, PackOptions, PackRequest, Samples, pack,
};
use proptest::prelude::*;

fn options(v3: bool) -> PackOptions {
    PackOptions {
        format_version: if v3 { FormatVersion::V3 } else { FormatVersion::V2 },
        flush: false,
        ..PackOptions::default()
    }
}

/// Pack `data` and concatenate the samples of every record in the file.
fn pack_and_read(encoding: u8, data: &[u8], count: usize, v3: bool) -> Samples {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prop.mseed");
    let request = PackRequest::new(encoding, data, count)
        .with_station_id("XX.PROP.00.BHZ")
        .with_start_time("2025-01-01T00:00:00")
        .with_sample_rate(50.0)
        .with_record_length(512);
    pack(&request, &path, &options(v3)).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let records = MseedReader::new(&bytes)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert!(!records.is_empty());

    let mut joined = records[0].samples.slice(0..0);
    for record in records {
        joined = match (joined, record.samples) {
            (Samples::Text(mut a), Samples::Text(b)) => {
                a.extend(b);
                Samples::Text(a)
            }
            (Samples::Int(mut a), Samples::Int(b)) => {
                a.extend(b);
                Samples::Int(a)
            }
            (Samples::Float(mut a), Samples::Float(b)) => {
                a.extend(b);
                Samples::Float(a)
            }
            (Samples::Double(mut a), Samples::Double(b)) => {
                a.extend(b);
                Samples::Double(a)
            }
            (a, b) => panic!("mixed sample types {a:?} / {b:?}"),
        };
    }
    joined
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn int32_round_trip(values in prop::collection::vec(any::<i32>(), 0..600), v3 in any::<bool>()) {
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        prop_assert_eq!(pack_and_read(3, &data, values.len(), v3), Samples::Int(values));
    }

    #[test]
    fn int16_round_trip(values in prop::collection::vec(any::<i16>(), 0..600), v3 in any::<bool>()) {
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        let widened = values.iter().map(|&v| i32::from(v)).collect();
        prop_assert_eq!(pack_and_read(1, &data, values.len(), v3), Samples::Int(widened));
    }

    #[test]
    fn float32_round_trip_bit_exact(values in prop::collection::vec(any::<f32>(), 0..600), v3 in any::<bool>()) {
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        let Samples::Float(out) = pack_and_read(4, &data, values.len(), v3) else {
            panic!("expected float samples");
        };
        let bits: Vec<u32> = out.iter().map(|v| v.to_bits()).collect();
        let expected: Vec<u32> = values.iter().map(|v| v.to_bits()).collect();
        prop_assert_eq!(bits, expected);
    }

    #[test]
    fn float64_round_trip_bit_exact(values in prop::collection::vec(any::<f64>(), 0..300), v3 in any::<bool>()) {
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        let Samples::Double(out) = pack_and_read(5, &data, values.len(), v3) else {
            panic!("expected double samples");
        };
        let bits: Vec<u64> = out.iter().map(|v| v.to_bits()).collect();
        let expected: Vec<u64> = values.iter().map(|v| v.to_bits()).collect();
        prop_assert_eq!(bits, expected);
    }

    #[test]
    fn text_round_trip(text in prop::collection::vec(1u8..=255, 0..1200), v3 in any::<bool>()) {
        prop_assert_eq!(pack_and_read(0, &text, text.len(), v3), Samples::Text(text));
    }
}
