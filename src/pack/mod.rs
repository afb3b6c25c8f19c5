//! Packing an untyped in-memory sample array into a miniSEED file.
//!
//! A call resolves the encoding code, converts the caller's bytes into an
//! owned typed buffer, assembles a [`RecordDescriptor`] around it and hands
//! that to a [`RecordWriter`]. Every exit path releases what was built; the
//! caller's buffer is only borrowed.
//!
//! ```no_run
//! use std::path::Path;
//! use mseed_pack::{PackOptions, PackRequest, pack};
//!
//! let samples: Vec<u8> = [1.5f32, -2.25, 3.0]
//!     .iter()
//!     .flat_map(|v| v.to_ne_bytes())
//!     .collect();
//! let request = PackRequest::new(4, &samples, 3)
//!     .with_station_id("XX.STA..BHZ")
//!     .with_start_time("2025-01-01T00:00:00")
//!     .with_sample_rate(100.0)
//!     .with_record_length(512);
//!
//! let records = pack(&request, Path::new("out.mseed"), &PackOptions::default())?;
//! assert_eq!(records, 1);
//! # Ok::<(), mseed_pack::PackError>(())
//! ```

pub mod assemble;
pub mod convert;
pub mod encoding;
pub mod lifecycle;

use std::path::Path;

use log::error;

pub use assemble::{PendingDescriptor, RecordDescriptor, RecordMetadata};
pub use convert::StridedSamples;
pub use encoding::{EncodingSpec, resolve};
pub use lifecycle::{PackCall, Stage};

use crate::config::PackOptions;
use crate::error::{PackError, STATUS_OK};
use crate::types::ByteOrder;
use crate::writer::{MseedFileWriter, RecordWriter};

/// Record length used when the caller passes zero or a negative value.
pub const DEFAULT_RECORD_LENGTH: u32 = 4096;

/// Inputs of one packing call.
#[derive(Debug, Clone, Copy)]
pub struct PackRequest<'a> {
    data: &'a [u8],
    sample_count: usize,
    stride: Option<usize>,
    encoding: u8,
    station_id: &'a str,
    record_length: i32,
    publication_version: u8,
    start_time: &'a str,
    sample_rate: f64,
    byte_order: i32,
}

impl<'a> PackRequest<'a> {
    /// `sample_count` elements of encoding `encoding`, in native byte order.
    ///
    /// Station id and start time are required; the rest default to a
    /// 4096-byte record, publication version 1, 1 Hz and big-endian.
    pub fn new(encoding: u8, data: &'a [u8], sample_count: usize) -> Self {
        Self {
            data,
            sample_count,
            stride: None,
            encoding,
            station_id: "",
            record_length: 0,
            publication_version: 1,
            start_time: "",
            sample_rate: 1.0,
            byte_order: 1,
        }
    }

    /// 32-bit integer samples written big-endian.
    pub fn integer(data: &'a [u8], sample_count: usize) -> Self {
        Self::new(3, data, sample_count).with_byte_order(1)
    }

    /// 32-bit float samples written big-endian.
    pub fn real(data: &'a [u8], sample_count: usize) -> Self {
        Self::new(4, data, sample_count).with_byte_order(1)
    }

    pub fn with_station_id(mut self, station_id: &'a str) -> Self {
        self.station_id = station_id;
        self
    }

    pub fn with_start_time(mut self, start_time: &'a str) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Zero or negative selects [`DEFAULT_RECORD_LENGTH`].
    pub fn with_record_length(mut self, record_length: i32) -> Self {
        self.record_length = record_length;
        self
    }

    pub fn with_publication_version(mut self, version: u8) -> Self {
        self.publication_version = version;
        self
    }

    /// 0 for little-endian, 1 for big-endian.
    pub fn with_byte_order(mut self, flag: i32) -> Self {
        self.byte_order = flag;
        self
    }

    /// Distance in bytes between consecutive elements.
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = Some(stride);
        self
    }

    pub fn encoding(&self) -> u8 {
        self.encoding
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    fn record_length(&self) -> u32 {
        u32::try_from(self.record_length)
            .ok()
            .filter(|&len| len > 0)
            .unwrap_or(DEFAULT_RECORD_LENGTH)
    }
}

/// Pack `request` into `path` with the file writer.
pub fn pack(request: &PackRequest<'_>, path: &Path, options: &PackOptions) -> Result<usize, PackError> {
    pack_with_writer(request, path, options, &MseedFileWriter)
}

/// Like [`pack`], returning the caller-visible status code.
pub fn pack_status(request: &PackRequest<'_>, path: &Path, options: &PackOptions) -> i32 {
    match pack(request, path, options) {
        Ok(_) => STATUS_OK,
        Err(e) => e.status(),
    }
}

/// Pack `request` through any [`RecordWriter`].
pub fn pack_with_writer<W>(
    request: &PackRequest<'_>,
    path: &Path,
    options: &PackOptions,
    writer: &W,
) -> Result<usize, PackError>
where
    W: RecordWriter + ?Sized,
{
    run(request, path, options, writer).inspect_err(|e| error!("{e}"))
}

fn run<W>(
    request: &PackRequest<'_>,
    path: &Path,
    options: &PackOptions,
    writer: &W,
) -> Result<usize, PackError>
where
    W: RecordWriter + ?Sized,
{
    let mut call = PackCall::new(request.data);

    let spec = call.resolve(request.encoding)?;
    let byte_order = ByteOrder::from_flag(request.byte_order).ok_or_else(|| {
        PackError::InvalidArgument(format!("byte order flag must be 0 or 1, got {}", request.byte_order))
    })?;

    call.convert(request.stride.unwrap_or(spec.element_width), request.sample_count)?;
    call.assemble(&RecordMetadata {
        station_id: request.station_id,
        record_length: request.record_length(),
        publication_version: request.publication_version,
        start_time: request.start_time,
        sample_rate: request.sample_rate,
        byte_order,
        format_version: options.format_version,
    })?;
    let written = call.write(writer, path, &options.writer_options())?;
    call.release();
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::MseedReader;
    use crate::record::Samples;
    use crate::writer::WriterOptions;
    use crate::{MseedError, Result};

    struct RejectingWriter;

    impl RecordWriter for RejectingWriter {
        fn write_records(&self, _: &RecordDescriptor, _: &Path, _: &WriterOptions) -> Result<usize> {
            Err(MseedError::EncodeError("rejected".into()))
        }
    }

    fn read_back(path: &Path) -> Vec<crate::MseedRecord> {
        let bytes = std::fs::read(path).unwrap();
        MseedReader::new(&bytes).collect::<Result<Vec<_>>>().unwrap()
    }

    #[test]
    fn test_record_length_default() {
        let req = PackRequest::new(3, &[], 0);
        assert_eq!(req.record_length(), 4096);
        assert_eq!(req.with_record_length(-1).record_length(), 4096);
        assert_eq!(req.with_record_length(512).record_length(), 512);
    }

    #[test]
    fn test_integer_and_real_presets() {
        let int = PackRequest::integer(&[], 0);
        assert_eq!((int.encoding(), int.byte_order), (3, 1));
        let real = PackRequest::real(&[], 0);
        assert_eq!((real.encoding(), real.byte_order), (4, 1));
    }

    #[test]
    fn test_pack_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.mseed");
        let request = PackRequest::new(0, b"HELLO\0", 5)
            .with_station_id("XX.STA..")
            .with_start_time("2025-01-01T00:00:00")
            .with_record_length(512);

        assert_eq!(pack_status(&request, &path, &PackOptions::default()), 0);
        let records = read_back(&path);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].samples, Samples::Text(b"HELLO".to_vec()));
        assert_eq!(records[0].samples.sample_type().as_char(), 'a');
    }

    #[test]
    fn test_pack_little_endian_int16() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("int16.mseed");
        let data: Vec<u8> = [-5i16, 0, 300].iter().flat_map(|v| v.to_ne_bytes()).collect();
        let request = PackRequest::new(1, &data, 3)
            .with_station_id("XX.STA.00.BHZ")
            .with_start_time("2025-001T00:00:00")
            .with_byte_order(0)
            .with_record_length(256);

        assert_eq!(pack(&request, &path, &PackOptions::default()).unwrap(), 1);
        assert_eq!(read_back(&path)[0].samples, Samples::Int(vec![-5, 0, 300]));
    }

    #[test]
    fn test_invalid_byte_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.mseed");
        let request = PackRequest::integer(&[0; 4], 1)
            .with_station_id("XX.STA..")
            .with_start_time("2025-01-01")
            .with_byte_order(2);

        assert!(matches!(
            pack(&request, &path, &PackOptions::default()),
            Err(PackError::InvalidArgument(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_writer_error_becomes_write_failure() {
        let request = PackRequest::real(&[0; 4], 1)
            .with_station_id("XX.STA..")
            .with_start_time("2025-01-01");
        let err = pack_with_writer(
            &request,
            Path::new("out.mseed"),
            &PackOptions::default(),
            &RejectingWriter,
        )
        .unwrap_err();
        assert!(matches!(err, PackError::WriteFailure { .. }));
        assert_eq!(err.status(), 1);
    }

    #[test]
    fn test_huge_count_against_short_buffer() {
        let request = PackRequest::integer(&[0; 8], usize::MAX / 8)
            .with_station_id("XX.STA..")
            .with_start_time("2025-01-01");
        let err = pack_with_writer(&request, Path::new("x"), &PackOptions::default(), &RejectingWriter)
            .unwrap_err();
        assert!(matches!(err, PackError::BufferTooShort { actual: 8, .. }));
        assert_eq!(err.status(), 1);
    }

    #[test]
    fn test_descriptor_allocation_failure_is_fatal() {
        use std::cell::Cell;

        struct CountingWriter(Cell<usize>);

        impl RecordWriter for CountingWriter {
            fn write_records(&self, _: &RecordDescriptor, _: &Path, _: &WriterOptions) -> Result<usize> {
                self.0.set(self.0.get() + 1);
                Ok(1)
            }
        }

        let data: Vec<u8> = [1i32, 2].iter().flat_map(|v| v.to_ne_bytes()).collect();
        let request = PackRequest::integer(&data, 2)
            .with_station_id("XX.STA.00.BHZ")
            .with_start_time("2025-01-01");
        let writer = CountingWriter(Cell::new(0));

        assemble::FAIL_DESCRIPTOR_ALLOC.set(true);
        let err = pack_with_writer(&request, Path::new("x"), &PackOptions::default(), &writer)
            .unwrap_err();
        assert!(matches!(err, PackError::OutOfMemory(crate::Allocation::Descriptor)));
        assert_eq!(err.status(), -1);
        assert_eq!(writer.0.get(), 0);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oom.mseed");
        assemble::FAIL_DESCRIPTOR_ALLOC.set(true);
        assert_eq!(pack_status(&request, &path, &PackOptions::default()), -1);
        assert!(!path.exists());

        // The next call on this thread allocates normally
        assert_eq!(
            pack_with_writer(&request, Path::new("x"), &PackOptions::default(), &writer).unwrap(),
            1
        );
    }
}
