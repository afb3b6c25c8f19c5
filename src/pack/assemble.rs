//! Record descriptor assembly.
//!
//! Assembly runs in two steps so that everything fallible happens before the
//! converted buffer changes hands: [`assemble`] validates the metadata and
//! allocates the descriptor, then [`PendingDescriptor::attach`] moves the
//! samples in.

use crate::error::{Allocation, PackError};
use crate::pack::encoding::EncodingSpec;
use crate::record::Samples;
use crate::sid::{MAX_SID_LEN, SourceId};
use crate::time::NanoTime;
use crate::types::{ByteOrder, EncodingFormat, FormatVersion, SampleType};

/// Scalar metadata supplied by the caller.
#[derive(Debug, Clone, Copy)]
pub struct RecordMetadata<'a> {
    pub station_id: &'a str,
    pub record_length: u32,
    pub publication_version: u8,
    pub start_time: &'a str,
    pub sample_rate: f64,
    pub byte_order: ByteOrder,
    pub format_version: FormatVersion,
}

/// A validated descriptor still waiting for its samples.
#[derive(Debug)]
pub struct PendingDescriptor {
    station_id: String,
    source_id: SourceId,
    record_length: u32,
    publication_version: u8,
    format_version: FormatVersion,
    byte_order: ByteOrder,
    start_time: NanoTime,
    sample_rate: f64,
    encoding: EncodingFormat,
}

/// Everything the writer needs for one packing call. Immutable once built.
#[derive(Debug)]
pub struct RecordDescriptor {
    station_id: String,
    source_id: SourceId,
    record_length: u32,
    publication_version: u8,
    format_version: FormatVersion,
    byte_order: ByteOrder,
    start_time: NanoTime,
    sample_rate: f64,
    encoding: EncodingFormat,
    sample_count: usize,
    sample_type: SampleType,
    samples: Samples,
}

/// v2 header widths of the network, station, location and channel codes.
const V2_CODE_WIDTHS: [(&str, usize); 4] = [
    ("network code", 2),
    ("station code", 5),
    ("location code", 2),
    ("channel code", 3),
];

#[cfg(test)]
thread_local! {
    /// Makes the next descriptor allocation on this thread fail.
    pub(crate) static FAIL_DESCRIPTOR_ALLOC: std::cell::Cell<bool> =
        const { std::cell::Cell::new(false) };
}

/// Validate `meta` and allocate a descriptor for the resolved encoding.
pub fn assemble(
    meta: &RecordMetadata<'_>,
    encoding: &EncodingSpec,
) -> Result<PendingDescriptor, PackError> {
    let source_id = SourceId::parse(meta.station_id);
    check_capacity(&source_id, meta.format_version)?;

    let start_time = NanoTime::parse(meta.start_time)
        .ok_or_else(|| PackError::TimestampParseFailure(meta.start_time.to_string()))?;

    if !meta.sample_rate.is_finite() || meta.sample_rate < 0.0 {
        return Err(PackError::InvalidArgument(format!(
            "sample rate must be a non-negative number, got {}",
            meta.sample_rate
        )));
    }

    let station_id = alloc_station_id(meta.station_id)?;

    Ok(PendingDescriptor {
        source_id,
        station_id,
        record_length: meta.record_length,
        publication_version: meta.publication_version,
        format_version: meta.format_version,
        byte_order: meta.byte_order,
        start_time,
        sample_rate: meta.sample_rate,
        encoding: encoding.format,
    })
}

/// The id as stored must fit [`MAX_SID_LEN`]; v2 also needs every code to fit
/// its fixed-width header field.
fn check_capacity(source_id: &SourceId, version: FormatVersion) -> Result<(), PackError> {
    let len = source_id.as_str().len();
    if len > MAX_SID_LEN {
        return Err(PackError::StationIdTooLong {
            field: "source id",
            len,
            max: MAX_SID_LEN,
        });
    }
    if version == FormatVersion::V3 {
        return Ok(());
    }

    let (network, station, location, channel) = source_id.to_nslc();
    let codes = [network, station, location, channel];
    for ((field, max), code) in V2_CODE_WIDTHS.into_iter().zip(codes) {
        if code.len() > max {
            return Err(PackError::StationIdTooLong {
                field,
                len: code.len(),
                max,
            });
        }
        if !code.is_ascii() {
            return Err(PackError::InvalidArgument(format!(
                "{field} {code:?} is not ASCII"
            )));
        }
    }
    Ok(())
}

fn alloc_station_id(text: &str) -> Result<String, PackError> {
    #[cfg(test)]
    if FAIL_DESCRIPTOR_ALLOC.replace(false) {
        return Err(PackError::OutOfMemory(Allocation::Descriptor));
    }

    let mut station_id = String::new();
    station_id
        .try_reserve_exact(MAX_SID_LEN)
        .map_err(|_| PackError::OutOfMemory(Allocation::Descriptor))?;
    station_id.push_str(text);
    Ok(station_id)
}

impl PendingDescriptor {
    /// Take ownership of the converted samples.
    pub fn attach(self, samples: Samples) -> RecordDescriptor {
        RecordDescriptor {
            station_id: self.station_id,
            source_id: self.source_id,
            record_length: self.record_length,
            publication_version: self.publication_version,
            format_version: self.format_version,
            byte_order: self.byte_order,
            start_time: self.start_time,
            sample_rate: self.sample_rate,
            encoding: self.encoding,
            sample_count: samples.len(),
            sample_type: samples.sample_type(),
            samples,
        }
    }
}

impl RecordDescriptor {
    /// Station id exactly as the caller supplied it.
    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    pub fn source_id(&self) -> &SourceId {
        &self.source_id
    }

    pub fn record_length(&self) -> u32 {
        self.record_length
    }

    pub fn publication_version(&self) -> u8 {
        self.publication_version
    }

    pub fn format_version(&self) -> FormatVersion {
        self.format_version
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn start_time(&self) -> NanoTime {
        self.start_time
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn encoding(&self) -> EncodingFormat {
        self.encoding
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }
}
