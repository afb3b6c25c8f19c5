//! Encode an [`MseedRecord`] into miniSEED record bytes.
//!
//! The main entry point is [`encode()`], which dispatches on the record's
//! format version. v2 records are serialized here into a buffer of the
//! configured record length; v3 lives in [`encode_v3`](crate::encode_v3).

use crate::decode::compute_sample_rate;
use crate::encode_v3::encode_v3;
use crate::record::{MseedRecord, Samples};
use crate::time::{BTime, NanoTime};
use crate::types::{ByteOrder, EncodingFormat, FormatVersion};
use crate::{MseedError, Result};

/// Size of the v2 fixed header.
pub const V2_HEADER_SIZE: usize = 48;
/// Offset of the data section when blockette 1000 is the only blockette.
pub const V2_DATA_OFFSET: usize = 56;
/// Blockette 1001 (microsecond start-time offset), header included.
const B1001_SIZE: usize = 8;
/// Blockette 100 (actual sample rate), header included.
const B100_SIZE: usize = 12;
/// Smallest v2 record length accepted.
pub const V2_MIN_RECORD_LENGTH: u32 = 128;
/// Largest v2 record length accepted.
pub const V2_MAX_RECORD_LENGTH: u32 = 65536;

/// Encode a [`MseedRecord`] into miniSEED bytes for its format version.
pub fn encode(record: &MseedRecord) -> Result<Vec<u8>> {
    match record.format_version {
        FormatVersion::V2 => encode_v2(record),
        FormatVersion::V3 => encode_v3(record),
    }
}

/// Blockettes a v2 record needs beyond blockette 1000, and where its data
/// section starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct V2Layout {
    pub factor: i16,
    pub multiplier: i16,
    /// Start-time microseconds finer than BTIME, written as blockette 1001.
    pub microseconds: Option<i8>,
    /// Rate written as blockette 100 when factor/multiplier only approximate it.
    pub actual_rate: Option<f32>,
    pub data_offset: usize,
}

impl V2Layout {
    pub fn new(start_time: NanoTime, sample_rate: f64) -> Result<Self> {
        let (factor, multiplier) = decompose_sample_rate(sample_rate)?;
        let nominal = compute_sample_rate(factor, multiplier);

        let us = start_time.microsecond_offset();
        let microseconds = (us != 0).then_some(us);
        let actual_rate = ((nominal - sample_rate).abs() > sample_rate * 1e-9)
            .then_some(sample_rate as f32);

        let mut data_offset = V2_DATA_OFFSET;
        if microseconds.is_some() {
            data_offset += B1001_SIZE;
        }
        if actual_rate.is_some() {
            data_offset += B100_SIZE;
        }
        Ok(Self {
            factor,
            multiplier,
            microseconds,
            actual_rate,
            data_offset,
        })
    }
}

/// Encode a [`MseedRecord`] into miniSEED v2 record bytes.
pub fn encode_v2(record: &MseedRecord) -> Result<Vec<u8>> {
    let rec_len = record.record_length;
    if !rec_len.is_power_of_two()
        || !(V2_MIN_RECORD_LENGTH..=V2_MAX_RECORD_LENGTH).contains(&rec_len)
    {
        return Err(MseedError::EncodeError(format!(
            "record_length must be a power of 2 between {V2_MIN_RECORD_LENGTH} and \
             {V2_MAX_RECORD_LENGTH}, got {rec_len}"
        )));
    }
    let rec_len_power = rec_len.ilog2() as u8;
    let rec_len = rec_len as usize;

    let num_samples = u16::try_from(record.samples.len()).map_err(|_| {
        MseedError::EncodeError(format!(
            "{} samples do not fit a v2 record",
            record.samples.len()
        ))
    })?;
    let layout = V2Layout::new(record.start_time, record.sample_rate)?;

    // Blockette type and body, chained in this order after the fixed header
    let mut chain: Vec<(u16, Vec<u8>)> = vec![(
        1000,
        vec![
            record.encoding.to_code(),
            record.byte_order.to_flag(),
            rec_len_power,
            0,
        ],
    )];
    if let Some(us) = layout.microseconds {
        // Timing quality, microseconds, reserved, frame count
        chain.push((1001, vec![0, us as u8, 0, 0]));
    }
    if let Some(rate) = layout.actual_rate {
        let mut body = rate.to_be_bytes().to_vec();
        // Flags and reserved bytes
        body.extend([0; 4]);
        chain.push((100, body));
    }

    let mut buf = vec![0u8; rec_len];

    // --- Fixed header (48 bytes) ---

    // Sequence number (bytes 0-5)
    write_field(&mut buf[0..6], "sequence number", &record.sequence_number)?;
    // Quality indicator (byte 6), reserved (byte 7)
    buf[6] = record.quality as u8;
    buf[7] = b' ';

    write_field(&mut buf[8..13], "station", &record.station)?;
    write_field(&mut buf[13..15], "location", &record.location)?;
    write_field(&mut buf[15..18], "channel", &record.channel)?;
    write_field(&mut buf[18..20], "network", &record.network)?;

    // BTIME (bytes 20-29)
    write_btime(&mut buf[20..30], &record.start_time.to_btime());

    // Number of samples (bytes 30-31)
    buf[30..32].copy_from_slice(&num_samples.to_be_bytes());

    // Sample rate factor and multiplier (bytes 32-35)
    buf[32..34].copy_from_slice(&layout.factor.to_be_bytes());
    buf[34..36].copy_from_slice(&layout.multiplier.to_be_bytes());

    // Activity, I/O and data quality flags (36-38): all 0
    // Number of blockettes (byte 39)
    buf[39] = chain.len() as u8;

    // Time correction (40-43): 0
    // Beginning of data (44-45), first blockette (46-47)
    buf[44..46].copy_from_slice(&(layout.data_offset as u16).to_be_bytes());
    buf[46..48].copy_from_slice(&(V2_HEADER_SIZE as u16).to_be_bytes());

    // --- Blockettes from offset 48 ---
    let mut offset = V2_HEADER_SIZE;
    for (i, (kind, body)) in chain.iter().enumerate() {
        let end = offset + 4 + body.len();
        let next = if i + 1 < chain.len() { end } else { 0 };
        buf[offset..offset + 2].copy_from_slice(&kind.to_be_bytes());
        buf[offset + 2..offset + 4].copy_from_slice(&(next as u16).to_be_bytes());
        buf[offset + 4..end].copy_from_slice(body);
        offset = end;
    }
    debug_assert_eq!(offset, layout.data_offset);

    let encoded_data = encode_data(&record.samples, record.encoding, record.byte_order)?;

    if layout.data_offset + encoded_data.len() > rec_len {
        return Err(MseedError::EncodeError(format!(
            "encoded data ({} bytes) exceeds record capacity ({} bytes from offset {})",
            encoded_data.len(),
            rec_len - layout.data_offset,
            layout.data_offset,
        )));
    }

    buf[layout.data_offset..layout.data_offset + encoded_data.len()]
        .copy_from_slice(&encoded_data);

    Ok(buf)
}

/// Write an ASCII header field, right-padded with spaces.
///
/// Values wider than the field are rejected rather than cut.
fn write_field(dest: &mut [u8], name: &str, src: &str) -> Result<()> {
    let bytes = src.as_bytes();
    if bytes.len() > dest.len() || !src.is_ascii() {
        return Err(MseedError::EncodeError(format!(
            "{name} {src:?} does not fit a {}-character v2 header field",
            dest.len()
        )));
    }
    for (i, slot) in dest.iter_mut().enumerate() {
        *slot = bytes.get(i).copied().unwrap_or(b' ');
    }
    Ok(())
}

fn write_btime(dest: &mut [u8], bt: &BTime) {
    dest[0..2].copy_from_slice(&bt.year.to_be_bytes());
    dest[2..4].copy_from_slice(&bt.day.to_be_bytes());
    dest[4] = bt.hour;
    dest[5] = bt.minute;
    dest[6] = bt.second;
    dest[7] = 0; // unused
    dest[8..10].copy_from_slice(&bt.fract.to_be_bytes());
}

/// Largest magnitude of the v2 rate factor and multiplier.
const RATE_LIMIT: i64 = i16::MAX as i64;

/// Decompose a sample rate (Hz) into a (factor, multiplier) pair.
///
/// Exact forms are preferred: a whole rate or period, split into two
/// factors when it exceeds 32767, then a power-of-ten divisor. Anything
/// else gets the closest fraction with both terms in range. Zero is
/// allowed and encodes as (0, 0), as used by text records.
fn decompose_sample_rate(rate: f64) -> Result<(i16, i16)> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(MseedError::EncodeError(format!(
            "sample rate must be a non-negative number, got {rate}"
        )));
    }
    if rate == 0.0 {
        return Ok((0, 0));
    }

    if rate >= 1.0 {
        if let Some((factor, multiplier)) = whole_product(rate) {
            return Ok((factor, multiplier));
        }
    } else if let Some((factor, multiplier)) = whole_product(1.0 / rate) {
        // Sub-hertz: the period, as -factor (x multiplier)
        return Ok(match multiplier {
            1 => (-factor, 1),
            m => (-factor, -m),
        });
    }

    // Decimal rates: factor / divisor, signalled by a negative multiplier
    for divisor in [10i16, 100, 1000, 10000] {
        let scaled = rate * f64::from(divisor);
        if is_whole(scaled) && (1.0..=RATE_LIMIT as f64).contains(&scaled.round()) {
            return Ok((scaled.round() as i16, -divisor));
        }
    }

    if let Some((numerator, denominator)) = closest_fraction(rate) {
        return Ok((numerator, -denominator));
    }
    // Below 1/32767 Hz: nearest whole period
    if rate < 1.0 {
        if let Some((factor, multiplier)) = whole_product((1.0 / rate).round()) {
            return Ok((-factor, -multiplier));
        }
    }

    Err(MseedError::EncodeError(format!(
        "sample rate {rate} Hz has no v2 factor/multiplier representation"
    )))
}

fn is_whole(x: f64) -> bool {
    (x - x.round()).abs() <= 1e-9 * x.max(1.0)
}

/// Split a whole number into two positive factors that fit an `i16`,
/// smallest second factor first.
fn whole_product(x: f64) -> Option<(i16, i16)> {
    if !is_whole(x) || x.round() > (RATE_LIMIT * RATE_LIMIT) as f64 {
        return None;
    }
    let n = x.round() as i64;
    let first = ((n + RATE_LIMIT - 1) / RATE_LIMIT).max(1);
    (first..=RATE_LIMIT)
        .find(|m| n % m == 0 && n / m <= RATE_LIMIT)
        .map(|m| ((n / m) as i16, m as i16))
}

/// Best rational approximation `p / q` of `x` with `1 <= p, q <= 32767`,
/// from the continued fraction expansion.
fn closest_fraction(x: f64) -> Option<(i16, i16)> {
    let (mut p0, mut p1) = (0i64, 1i64);
    let (mut q0, mut q1) = (1i64, 0i64);
    let mut rest = x;

    loop {
        let term = rest.floor();
        if term > RATE_LIMIT as f64 {
            break;
        }
        let term = term as i64;
        let (p2, q2) = (term * p1 + p0, term * q1 + q0);
        if p2 > RATE_LIMIT || q2 > RATE_LIMIT {
            break;
        }
        (p0, p1, q0, q1) = (p1, p2, q1, q2);

        let frac = rest - rest.floor();
        if frac <= f64::EPSILON || (p1 as f64 / q1 as f64 - x).abs() <= f64::EPSILON * x {
            break;
        }
        rest = 1.0 / frac;
    }

    (p1 >= 1 && q1 >= 1).then_some((p1 as i16, q1 as i16))
}

/// Serialize samples into the data payload for `encoding`.
pub(crate) fn encode_data(
    samples: &Samples,
    encoding: EncodingFormat,
    byte_order: ByteOrder,
) -> Result<Vec<u8>> {
    match (encoding, samples) {
        (EncodingFormat::Text, Samples::Text(bytes)) => Ok(bytes.clone()),
        (EncodingFormat::Int16, Samples::Int(ints)) => {
            let narrowed = ints
                .iter()
                .map(|&v| {
                    i16::try_from(v).map_err(|_| {
                        MseedError::EncodeError(format!("sample {v} out of INT16 range"))
                    })
                })
                .collect::<Result<Vec<i16>>>()?;
            Ok(pack_values(&narrowed, byte_order, i16::to_be_bytes, i16::to_le_bytes))
        }
        (EncodingFormat::Int32, Samples::Int(ints)) => {
            Ok(pack_values(ints, byte_order, i32::to_be_bytes, i32::to_le_bytes))
        }
        (EncodingFormat::Float32, Samples::Float(floats)) => {
            Ok(pack_values(floats, byte_order, f32::to_be_bytes, f32::to_le_bytes))
        }
        (EncodingFormat::Float64, Samples::Double(doubles)) => {
            Ok(pack_values(doubles, byte_order, f64::to_be_bytes, f64::to_le_bytes))
        }
        (encoding, samples) => Err(MseedError::EncodeError(format!(
            "{encoding} encoding cannot carry '{}' samples",
            samples.sample_type()
        ))),
    }
}

fn pack_values<T: Copy, const N: usize>(
    values: &[T],
    byte_order: ByteOrder,
    be: fn(T) -> [u8; N],
    le: fn(T) -> [u8; N],
) -> Vec<u8> {
    let mut data = Vec::with_capacity(values.len() * N);
    for &val in values {
        match byte_order {
            ByteOrder::Big => data.extend_from_slice(&be(val)),
            ByteOrder::Little => data.extend_from_slice(&le(val)),
        }
    }
    data
}
