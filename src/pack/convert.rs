//! Sample conversion from a caller's untyped buffer.
//!
//! The caller hands in raw bytes laid out as an in-memory array: elements of
//! the resolved width, in native byte order, spaced `stride` bytes apart.
//! [`StridedSamples`] is a bounds-checked view over those elements and
//! [`convert_strided`] copies them densely into an owned [`Samples`].
//!
//! INT16 input is read at its declared 2-byte width and widened to `i32`;
//! callers do not pre-widen. Every other encoding is read at the width of its
//! destination type.

use log::debug;

use crate::error::{Allocation, PackError};
use crate::pack::encoding::EncodingSpec;
use crate::record::Samples;
use crate::types::EncodingFormat;

/// Bounds-checked view of `count` elements of `width` bytes placed every
/// `stride` bytes in a borrowed buffer.
#[derive(Debug, Clone, Copy)]
pub struct StridedSamples<'a> {
    data: &'a [u8],
    width: usize,
    stride: usize,
    count: usize,
}

impl<'a> StridedSamples<'a> {
    /// Densely packed elements (`stride == width`).
    pub fn new(data: &'a [u8], width: usize, count: usize) -> Result<Self, PackError> {
        Self::with_stride(data, width, width, count)
    }

    pub fn with_stride(
        data: &'a [u8],
        width: usize,
        stride: usize,
        count: usize,
    ) -> Result<Self, PackError> {
        if width == 0 || stride < width {
            return Err(PackError::InvalidArgument(format!(
                "stride {stride} cannot hold {width}-byte elements"
            )));
        }
        let expected = match count {
            0 => 0,
            n => (n - 1)
                .checked_mul(stride)
                .and_then(|offset| offset.checked_add(width))
                .ok_or_else(|| {
                    PackError::InvalidArgument(format!("{count} samples overflow the address space"))
                })?,
        };
        if data.len() < expected {
            return Err(PackError::BufferTooShort {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            stride,
            count,
        })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Bytes of element `index`.
    pub fn get(&self, index: usize) -> Option<&'a [u8]> {
        if index >= self.count {
            return None;
        }
        let start = index * self.stride;
        self.data.get(start..start + self.width)
    }

    /// Element bytes in order.
    pub fn iter(self) -> impl Iterator<Item = &'a [u8]> {
        let width = self.width;
        self.data
            .chunks(self.stride)
            .take(self.count)
            .map(move |chunk| &chunk[..width])
    }
}

/// Number of text elements before the first NUL element.
pub fn text_len(data: &[u8], stride: usize) -> usize {
    data.chunks(stride.max(1))
        .take_while(|chunk| chunk[0] != 0)
        .count()
}

/// Convert densely packed input (`stride` equal to the element width).
pub fn convert(data: &[u8], spec: &EncodingSpec, count: usize) -> Result<Samples, PackError> {
    convert_strided(data, spec, spec.element_width, count)
}

/// Copy `count` elements read every `stride` bytes into an owned buffer.
///
/// For text the count comes from scanning for a NUL terminator and `count`
/// is ignored; numeric encodings trust `count`.
pub fn convert_strided(
    data: &[u8],
    spec: &EncodingSpec,
    stride: usize,
    count: usize,
) -> Result<Samples, PackError> {
    let count = match spec.format {
        EncodingFormat::Text => {
            let scanned = text_len(data, stride);
            if scanned != count {
                debug!("text length {scanned} overrides declared sample count {count}");
            }
            scanned
        }
        _ => count,
    };
    let view = StridedSamples::with_stride(data, spec.element_width, stride, count)?;

    let samples = match spec.format {
        EncodingFormat::Text => Samples::Text(collect(view, |[b]: [u8; 1]| b)?),
        EncodingFormat::Int16 => {
            Samples::Int(collect(view, |b: [u8; 2]| i32::from(i16::from_ne_bytes(b)))?)
        }
        EncodingFormat::Int32 => Samples::Int(collect(view, i32::from_ne_bytes)?),
        EncodingFormat::Float32 => Samples::Float(collect(view, f32::from_ne_bytes)?),
        EncodingFormat::Float64 => Samples::Double(collect(view, f64::from_ne_bytes)?),
    };
    debug!(
        "converted {} {} samples (stride {stride})",
        samples.len(),
        spec.format
    );
    Ok(samples)
}

/// Empty vector with room for exactly `count` elements.
pub fn reserve<T>(count: usize) -> Result<Vec<T>, PackError> {
    let mut out = Vec::new();
    out.try_reserve_exact(count)
        .map_err(|_| PackError::OutOfMemory(Allocation::SampleBuffer))?;
    Ok(out)
}

fn collect<T, const N: usize>(
    view: StridedSamples<'_>,
    read: fn([u8; N]) -> T,
) -> Result<Vec<T>, PackError> {
    let mut out = reserve(view.len())?;
    out.extend(view.iter().map(|chunk| {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&chunk[..N]);
        read(bytes)
    }));
    Ok(out)
}
