//! Pack in-memory seismic sample arrays into miniSEED files.
//!
//! The packing core takes an untyped sample buffer plus station metadata,
//! resolves the encoding, converts the samples into an owned typed buffer,
//! assembles a record descriptor and hands it to a [`RecordWriter`]. The
//! bundled [`MseedFileWriter`] writes miniSEED v2 (the default) or v3 records
//! through the codec in [`encode`] / [`encode_v3`].
//!
//! # Packing samples
//!
//! ```
//! use mseed_pack::{MseedReader, PackOptions, PackRequest, Samples, pack};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("hello.mseed");
//!
//! let request = PackRequest::new(0, b"HELLO", 5)
//!     .with_station_id("XX.STA..")
//!     .with_start_time("2025-01-01T00:00:00")
//!     .with_record_length(512);
//! assert_eq!(pack(&request, &path, &PackOptions::default()).unwrap(), 1);
//!
//! let bytes = std::fs::read(&path).unwrap();
//! let records: Vec<_> = MseedReader::new(&bytes)
//!     .collect::<Result<Vec<_>, _>>()
//!     .unwrap();
//! assert_eq!(records[0].samples, Samples::Text(b"HELLO".to_vec()));
//! ```
//!
//! # Status codes
//!
//! [`pack_status`] and the C entry points report `0` on success, `1` for any
//! recoverable packing error and `-1` when the record descriptor itself could
//! not be allocated. See [`PackError::status`].
//!
//! # Building a record directly
//!
//! ```
//! use mseed_pack::{MseedRecord, Samples, EncodingFormat, NanoTime, FormatVersion, encode, decode};
//!
//! let record = MseedRecord::new_v3()
//!     .with_nslc("IU", "ANMO", "00", "BHZ")
//!     .with_start_time(NanoTime {
//!         year: 2025, day: 100, hour: 12,
//!         minute: 30, second: 45, nanosecond: 500_000_000,
//!     })
//!     .with_sample_rate(20.0)
//!     .with_encoding(EncodingFormat::Float64)
//!     .with_samples(Samples::Double(vec![1.0, -2.5, 3.25]));
//!
//! let bytes = encode(&record).unwrap();
//! let decoded = decode(&bytes).unwrap();
//! assert_eq!(decoded.format_version, FormatVersion::V3);
//! assert_eq!(decoded.start_time.nanosecond, 500_000_000);
//! ```

pub mod config;
pub mod crc;
pub mod decode;
pub mod decode_v3;
pub mod encode;
pub mod encode_v3;
pub mod error;
#[cfg(feature = "ffi")]
pub mod ffi;
pub mod logging;
pub mod pack;
pub mod reader;
pub mod record;
pub mod sid;
pub mod time;
pub mod types;
pub mod writer;

pub use config::{ConfigError, PackOptions};
pub use error::{
    Allocation, MseedError, PackError, Result, STATUS_FATAL, STATUS_OK, STATUS_PACK_ERROR,
};
pub use logging::init_logging;
pub use pack::{
    DEFAULT_RECORD_LENGTH, PackCall, PackRequest, RecordDescriptor, Stage, pack, pack_status,
    pack_with_writer,
};
pub use reader::MseedReader;
pub use record::{MseedRecord, Samples};
pub use sid::{MAX_SID_LEN, SourceId};
pub use time::{BTime, NanoTime};
pub use types::{ByteOrder, EncodingFormat, FormatVersion, SampleType};
pub use writer::{MseedFileWriter, RecordWriter, WriteMode, WriterOptions};

pub use decode::decode;
pub use encode::encode;
