//! Per-call ownership of the converted buffer and the record descriptor.
//!
//! A [`PackCall`] walks through the packing stages in order. Whatever it has
//! built so far is dropped by [`PackCall::release`], which runs on every
//! failure, at the end of a successful call, and from `Drop` if the call is
//! abandoned. The caller's input slice is only ever borrowed.

use std::fmt;
use std::mem;
use std::ops::Range;
use std::path::Path;

use log::debug;

use crate::error::PackError;
use crate::pack::assemble::{RecordDescriptor, RecordMetadata, assemble};
use crate::pack::convert::convert_strided;
use crate::pack::encoding::{EncodingSpec, resolve};
use crate::record::Samples;
use crate::writer::{RecordWriter, WriterOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Entered,
    Resolved,
    Converted,
    Assembled,
    Written,
    Released,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Entered => "entered",
            Stage::Resolved => "resolved",
            Stage::Converted => "converted",
            Stage::Assembled => "assembled",
            Stage::Written => "written",
            Stage::Released => "released",
        };
        f.write_str(name)
    }
}

/// State of one packing call.
#[derive(Debug)]
pub struct PackCall<'a> {
    input: &'a [u8],
    stage: Stage,
    spec: Option<EncodingSpec>,
    buffer: Option<Samples>,
    descriptor: Option<RecordDescriptor>,
}

impl<'a> PackCall<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            stage: Stage::Entered,
            spec: None,
            buffer: None,
            descriptor: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The assembled descriptor, once the call has reached that stage.
    pub fn descriptor(&self) -> Option<&RecordDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn resolve(&mut self, code: u8) -> Result<EncodingSpec, PackError> {
        self.expect(Stage::Entered)?;
        let spec = self.fail_with(resolve(code))?;
        debug!("resolved encoding {code} to {} ({}-byte elements)", spec.format, spec.element_width);
        self.spec = Some(spec);
        self.stage = Stage::Resolved;
        Ok(spec)
    }

    /// Copy `count` elements spaced `stride` bytes apart out of the input.
    pub fn convert(&mut self, stride: usize, count: usize) -> Result<&Samples, PackError> {
        self.expect(Stage::Resolved)?;
        let spec = self.resolved()?;
        let samples = self.fail_with(convert_strided(self.input, &spec, stride, count))?;
        self.stage = Stage::Converted;
        Ok(self.buffer.insert(samples))
    }

    pub fn assemble(&mut self, meta: &RecordMetadata<'_>) -> Result<&RecordDescriptor, PackError> {
        self.expect(Stage::Converted)?;
        let spec = self.resolved()?;
        let pending = self.fail_with(assemble(meta, &spec))?;
        let samples = match self.buffer.take() {
            Some(samples) => samples,
            None => return self.fail_with(Err(stage_error("assemble", Stage::Converted))),
        };
        let descriptor = pending.attach(samples);
        debug!(
            "assembled {} descriptor: {} {} samples, record length {}",
            descriptor.station_id(),
            descriptor.sample_count(),
            descriptor.sample_type(),
            descriptor.record_length()
        );
        self.stage = Stage::Assembled;
        Ok(self.descriptor.insert(descriptor))
    }

    /// Hand the descriptor to `writer`, returning the number of records written.
    pub fn write<W>(
        &mut self,
        writer: &W,
        path: &Path,
        options: &WriterOptions,
    ) -> Result<usize, PackError>
    where
        W: RecordWriter + ?Sized,
    {
        self.expect(Stage::Assembled)?;
        let result = match &self.descriptor {
            Some(descriptor) => writer
                .write_records(descriptor, path, options)
                .map_err(|source| PackError::WriteFailure {
                    path: path.to_path_buf(),
                    source,
                }),
            None => Err(stage_error("write", Stage::Assembled)),
        };
        let written = self.fail_with(result)?;
        self.stage = Stage::Written;
        Ok(written)
    }

    /// Drop everything this call owns. Safe to call more than once.
    pub fn release(&mut self) {
        if self.stage == Stage::Released {
            return;
        }
        debug!("releasing pack call at stage {}", self.stage);

        let input = address_range(self.input);
        if let Some(samples) = self.buffer.take() {
            discard(samples, &input);
        }
        if let Some(descriptor) = self.descriptor.take() {
            if overlaps(&descriptor.samples().address_range(), &input) {
                mem::forget(descriptor);
            }
        }
        self.spec = None;
        self.stage = Stage::Released;
    }

    fn expect(&self, stage: Stage) -> Result<(), PackError> {
        if self.stage == stage {
            Ok(())
        } else {
            Err(PackError::InvalidArgument(format!(
                "pack call is {}, expected {stage}",
                self.stage
            )))
        }
    }

    fn resolved(&mut self) -> Result<EncodingSpec, PackError> {
        match self.spec {
            Some(spec) => Ok(spec),
            None => self.fail_with(Err(stage_error("convert", Stage::Resolved))),
        }
    }

    fn fail_with<T>(&mut self, result: Result<T, PackError>) -> Result<T, PackError> {
        if result.is_err() {
            self.release();
        }
        result
    }
}

impl Drop for PackCall<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

fn stage_error(step: &str, stage: Stage) -> PackError {
    PackError::InvalidArgument(format!("{step} needs a {stage} pack call"))
}

fn address_range(bytes: &[u8]) -> Range<usize> {
    let start = bytes.as_ptr() as usize;
    start..start + bytes.len()
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    !a.is_empty() && !b.is_empty() && a.start < b.end && b.start < a.end
}

/// Drop `samples` unless they share memory with the caller's input.
fn discard(samples: Samples, input: &Range<usize>) {
    if overlaps(&samples.address_range(), input) {
        mem::forget(samples);
    }
}
