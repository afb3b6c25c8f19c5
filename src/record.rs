//! Unified miniSEED record type for v2 and v3.
//!
//! [`MseedRecord`] is one wire-level record: what the encoders serialize and
//! the decoders produce. The packing core never builds these directly; the
//! file writer cuts a [`RecordDescriptor`](crate::RecordDescriptor) into as
//! many records as its samples need.

use std::fmt;
use std::ops::Range;

use crate::sid::SourceId;
use crate::time::NanoTime;
use crate::types::{ByteOrder, EncodingFormat, FormatVersion, SampleType};

/// A single miniSEED record (v2 or v3).
///
/// Version-specific fields carry defaults when not applicable: v3 records
/// decode with `sequence_number = "000000"` and quality `'D'`, v2 records
/// get a `source_id` synthesized from their NSLC codes.
#[derive(Debug, Clone, PartialEq)]
pub struct MseedRecord {
    pub format_version: FormatVersion,

    pub network: String,
    pub station: String,
    pub location: String,
    pub channel: String,
    /// FDSN Source Identifier. Synthesized from NSLC for v2 records.
    pub source_id: SourceId,

    pub start_time: NanoTime,
    pub sample_rate: f64,
    pub encoding: EncodingFormat,
    pub samples: Samples,

    // v2-specific
    pub sequence_number: String,
    pub quality: char,
    pub byte_order: ByteOrder,
    /// Record length in bytes (fixed for v2, actual size for decoded v3).
    pub record_length: u32,

    // v3-specific
    pub flags: u8,
    pub publication_version: u8,
    pub crc: u32,
}

impl MseedRecord {
    /// Create a new `MseedRecord` with v2 defaults.
    ///
    /// Defaults: sequence "000001", quality 'D', empty NSLC,
    /// big-endian, 512-byte records, INT32, no samples.
    pub fn new() -> Self {
        Self {
            format_version: FormatVersion::V2,
            network: String::new(),
            station: String::new(),
            location: String::new(),
            channel: String::new(),
            source_id: SourceId::from_nslc("", "", "", ""),
            start_time: NanoTime::epoch(),
            sample_rate: 1.0,
            encoding: EncodingFormat::Int32,
            samples: Samples::Int(vec![]),
            sequence_number: "000001".into(),
            quality: 'D',
            byte_order: ByteOrder::Big,
            record_length: 512,
            flags: 0,
            publication_version: 0,
            crc: 0,
        }
    }

    /// Create a new `MseedRecord` with v3 defaults.
    pub fn new_v3() -> Self {
        Self {
            format_version: FormatVersion::V3,
            sequence_number: "000000".into(),
            byte_order: ByteOrder::Little,
            record_length: 0, // v3: variable length, set during encode
            ..Self::new()
        }
    }

    /// Set network, station, location, and channel codes.
    /// Also updates `source_id` to match.
    pub fn with_nslc(
        mut self,
        network: &str,
        station: &str,
        location: &str,
        channel: &str,
    ) -> Self {
        self.network = network.into();
        self.station = station.into();
        self.location = location.into();
        self.channel = channel.into();
        self.source_id = SourceId::from_nslc(network, station, location, channel);
        self
    }

    /// Set the source identifier and derive the NSLC codes from it.
    pub fn with_source_id(mut self, sid: SourceId) -> Self {
        let (network, station, location, channel) = sid.to_nslc();
        self.network = network;
        self.station = station;
        self.location = location;
        self.channel = channel;
        self.source_id = sid;
        self
    }

    pub fn with_start_time(mut self, time: NanoTime) -> Self {
        self.start_time = time;
        self
    }

    /// Set the sample rate in Hz.
    pub fn with_sample_rate(mut self, rate: f64) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn with_encoding(mut self, enc: EncodingFormat) -> Self {
        self.encoding = enc;
        self
    }

    pub fn with_samples(mut self, samples: Samples) -> Self {
        self.samples = samples;
        self
    }

    /// Set the record length (power of 2 for v2, ignored by the v3 encoder).
    pub fn with_record_length(mut self, len: u32) -> Self {
        self.record_length = len;
        self
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Set the v2 sequence number (six characters, zero padded).
    pub fn with_sequence_number(mut self, sequence: u32) -> Self {
        self.sequence_number = format!("{:06}", sequence % 1_000_000);
        self
    }

    pub fn with_publication_version(mut self, version: u8) -> Self {
        self.publication_version = version;
        self
    }

    /// Return the NSLC identifier: `"NET.STA.LOC.CHA"`.
    pub fn nslc(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.network, self.station, self.location, self.channel
        )
    }
}

impl Default for MseedRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MseedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} Hz | {} samples ({}) [{}]",
            self.nslc(),
            self.start_time,
            self.sample_rate,
            self.samples.len(),
            self.encoding,
            self.format_version,
        )
    }
}

/// Typed, densely packed sample data.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    Text(Vec<u8>),
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Samples::Text(v) => v.len(),
            Samples::Int(v) => v.len(),
            Samples::Float(v) => v.len(),
            Samples::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sample_type(&self) -> SampleType {
        match self {
            Samples::Text(_) => SampleType::Text,
            Samples::Int(_) => SampleType::Int,
            Samples::Float(_) => SampleType::Float,
            Samples::Double(_) => SampleType::Double,
        }
    }

    /// Empty sample set of the given type.
    pub fn empty(sample_type: SampleType) -> Self {
        match sample_type {
            SampleType::Text => Samples::Text(vec![]),
            SampleType::Int => Samples::Int(vec![]),
            SampleType::Float => Samples::Float(vec![]),
            SampleType::Double => Samples::Double(vec![]),
        }
    }

    /// Copy of the samples in `range`. Panics if the range is out of bounds.
    pub fn slice(&self, range: Range<usize>) -> Self {
        match self {
            Samples::Text(v) => Samples::Text(v[range].to_vec()),
            Samples::Int(v) => Samples::Int(v[range].to_vec()),
            Samples::Float(v) => Samples::Float(v[range].to_vec()),
            Samples::Double(v) => Samples::Double(v[range].to_vec()),
        }
    }

    /// Address range of the backing allocation, for aliasing checks.
    pub fn address_range(&self) -> Range<usize> {
        fn range_of<T>(v: &[T]) -> Range<usize> {
            let start = v.as_ptr() as usize;
            start..start + std::mem::size_of_val(v)
        }
        match self {
            Samples::Text(v) => range_of(v),
            Samples::Int(v) => range_of(v),
            Samples::Float(v) => range_of(v),
            Samples::Double(v) => range_of(v),
        }
    }
}
