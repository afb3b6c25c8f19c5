//! Writing a [`RecordDescriptor`] to a miniSEED file.
//!
//! The descriptor's samples are cut into as many records as the record
//! length allows. Every record is encoded in memory before the target file
//! is opened, so encode errors never touch the output path. I/O errors after
//! that point can leave a partially written file behind; nothing is rolled
//! back.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, info};
use serde::Deserialize;

use crate::encode::{V2_MAX_RECORD_LENGTH, V2_MIN_RECORD_LENGTH, V2Layout, encode};
use crate::encode_v3::V3_HEADER_SIZE;
use crate::pack::RecordDescriptor;
use crate::record::MseedRecord;
use crate::time::NanoTime;
use crate::types::FormatVersion;
use crate::{MseedError, Result};

/// What to do with an existing output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Truncate and replace.
    #[default]
    Overwrite,
    /// Add records after the existing content.
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Sync file contents to disk before returning.
    pub flush: bool,
    /// Above 0, every record written is logged at info level.
    pub verbosity: u8,
    pub mode: WriteMode,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            flush: true,
            verbosity: 0,
            mode: WriteMode::Overwrite,
        }
    }
}

/// Serializes a descriptor to `path`, returning the number of records written.
pub trait RecordWriter {
    fn write_records(
        &self,
        descriptor: &RecordDescriptor,
        path: &Path,
        options: &WriterOptions,
    ) -> Result<usize>;
}

/// Writes records to the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct MseedFileWriter;

impl RecordWriter for MseedFileWriter {
    fn write_records(
        &self,
        descriptor: &RecordDescriptor,
        path: &Path,
        options: &WriterOptions,
    ) -> Result<usize> {
        let records = encode_records(descriptor)?;

        let file = open_output(path, options.mode)?;
        let mut out = BufWriter::new(file);
        let mut bytes = 0;
        for (i, record) in records.iter().enumerate() {
            out.write_all(record)?;
            bytes += record.len();
            if options.verbosity > 0 {
                info!("wrote record {} ({} bytes) to {}", i + 1, record.len(), path.display());
            }
        }
        let file = out.into_inner().map_err(|e| e.into_error())?;
        if options.flush {
            file.sync_all()?;
        }

        debug!(
            "packed {} samples into {} records ({bytes} bytes) in {}",
            descriptor.sample_count(),
            records.len(),
            path.display()
        );
        Ok(records.len())
    }
}

fn open_output(path: &Path, mode: WriteMode) -> std::io::Result<File> {
    let mut opts = OpenOptions::new();
    match mode {
        WriteMode::Overwrite => opts.write(true).create(true).truncate(true),
        WriteMode::Append => opts.append(true).create(true),
    };
    opts.open(path)
}

/// Split the descriptor's samples into records and encode each one.
///
/// Zero samples still produce one (empty) record.
pub fn encode_records(descriptor: &RecordDescriptor) -> Result<Vec<Vec<u8>>> {
    let records = split_records(descriptor)?;
    records.iter().map(encode).collect()
}

/// Build the wire-level records for a descriptor without encoding them.
///
/// A v2 record's capacity depends on its own start time and the rate, since
/// blockettes 1001 and 100 are only written when needed.
pub fn split_records(descriptor: &RecordDescriptor) -> Result<Vec<MseedRecord>> {
    let samples = descriptor.samples();

    let template = match descriptor.format_version() {
        FormatVersion::V2 => MseedRecord::new().with_byte_order(descriptor.byte_order()),
        FormatVersion::V3 => MseedRecord::new_v3(),
    }
    .with_source_id(descriptor.source_id().clone())
    .with_sample_rate(descriptor.sample_rate())
    .with_encoding(descriptor.encoding())
    .with_record_length(descriptor.record_length())
    .with_publication_version(descriptor.publication_version());

    let mut records = Vec::new();
    let mut offset = 0;
    loop {
        let start_time = descriptor
            .start_time()
            .after_samples(offset, descriptor.sample_rate())
            .ok_or_else(|| {
                MseedError::EncodeError(format!("start time of sample {offset} is out of range"))
            })?;
        let end = (offset + samples_per_record(descriptor, start_time)?).min(samples.len());

        records.push(
            template
                .clone()
                .with_sequence_number(records.len() as u32 + 1)
                .with_start_time(start_time)
                .with_samples(samples.slice(offset..end)),
        );
        offset = end;
        // Zero samples still make one record
        if offset >= samples.len() {
            break;
        }
    }
    Ok(records)
}

/// Most samples one record starting at `start_time` can carry.
fn samples_per_record(descriptor: &RecordDescriptor, start_time: NanoTime) -> Result<usize> {
    let record_length = descriptor.record_length();
    let width = descriptor.encoding().wire_width();

    let capacity = match descriptor.format_version() {
        FormatVersion::V2 => {
            if !record_length.is_power_of_two()
                || !(V2_MIN_RECORD_LENGTH..=V2_MAX_RECORD_LENGTH).contains(&record_length)
            {
                return Err(MseedError::EncodeError(format!(
                    "record_length must be a power of 2 between {V2_MIN_RECORD_LENGTH} and \
                     {V2_MAX_RECORD_LENGTH}, got {record_length}"
                )));
            }
            let layout = V2Layout::new(start_time, descriptor.sample_rate())?;
            let room = (record_length as usize).saturating_sub(layout.data_offset);
            (room / width).min(u16::MAX as usize)
        }
        FormatVersion::V3 => {
            let overhead = V3_HEADER_SIZE + descriptor.source_id().as_str().len();
            (record_length as usize).saturating_sub(overhead) / width
        }
    };

    if capacity == 0 {
        return Err(MseedError::EncodeError(format!(
            "record length {record_length} leaves no room for {} samples",
            descriptor.encoding()
        )));
    }
    Ok(capacity)
}
