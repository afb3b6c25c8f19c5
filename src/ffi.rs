//! C ABI.
//!
//! `pack_miniseed` takes its scalars by value; the `_`-suffixed adapters
//! take every scalar by reference, the Fortran calling convention, and
//! delegate. All entry points return the status codes of
//! [`PackError::status`](crate::PackError::status) and write miniSEED v2 with
//! default options.

use std::ffi::{CStr, c_char, c_double, c_int, c_void};
use std::path::Path;

use crate::config::PackOptions;
use crate::error::PackError;
use crate::logging::init_logging;
use crate::pack::{PackRequest, pack_status, resolve};
use crate::types::EncodingFormat;

/// Pack `num_samples` elements at `data` into `outfile`.
///
/// # Safety
///
/// `data` must point to `num_samples` readable elements of the width
/// implied by `encoding`, or to a NUL-terminated string for text.
/// `station_id`, `starttime` and `outfile` must be NUL-terminated strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pack_miniseed(
    data: *const c_void,
    station_id: *const c_char,
    record_length: c_int,
    encoding: u8,
    byteorder: c_int,
    pubversion: u8,
    starttime: *const c_char,
    sampling_rate: c_double,
    num_samples: c_int,
    outfile: *const c_char,
) -> c_int {
    let request = unsafe {
        request_from_raw(
            data,
            station_id,
            record_length,
            encoding,
            byteorder,
            pubversion,
            starttime,
            sampling_rate,
            num_samples,
            outfile,
        )
    };
    match request {
        Ok((request, outfile)) => pack_status(&request, Path::new(outfile), &PackOptions::default()),
        Err(e) => {
            log::error!("{e}");
            e.status()
        }
    }
}

/// By-reference form of [`pack_miniseed`].
///
/// # Safety
///
/// As [`pack_miniseed`]; every scalar pointer must be valid for reads.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pack_miniseed_generic_(
    data: *const c_void,
    station_id: *const c_char,
    record_length: *const c_int,
    encoding: *const u8,
    byteorder: *const c_int,
    pubversion: *const u8,
    starttime: *const c_char,
    sampling_rate: *const c_double,
    num_samples: *const c_int,
    outfile: *const c_char,
) -> c_int {
    let scalars = unsafe {
        (
            record_length.as_ref(),
            encoding.as_ref(),
            byteorder.as_ref(),
            pubversion.as_ref(),
            sampling_rate.as_ref(),
            num_samples.as_ref(),
        )
    };
    let (Some(&reclen), Some(&enc), Some(&order), Some(&pubv), Some(&rate), Some(&count)) = scalars
    else {
        let err = PackError::InvalidArgument("null scalar argument".into());
        log::error!("{err}");
        return err.status();
    };
    unsafe {
        pack_miniseed(
            data, station_id, reclen, enc, order, pubv, starttime, rate, count, outfile,
        )
    }
}

/// 32-bit integer samples, written big-endian.
///
/// # Safety
///
/// As [`pack_miniseed_generic_`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pack_miniseed_integer_(
    data: *const c_void,
    station_id: *const c_char,
    record_length: *const c_int,
    pubversion: *const u8,
    starttime: *const c_char,
    sampling_rate: *const c_double,
    num_samples: *const c_int,
    outfile: *const c_char,
) -> c_int {
    let (encoding, byteorder) = (EncodingFormat::Int32.to_code(), 1);
    unsafe {
        pack_miniseed_generic_(
            data,
            station_id,
            record_length,
            &encoding,
            &byteorder,
            pubversion,
            starttime,
            sampling_rate,
            num_samples,
            outfile,
        )
    }
}

/// 32-bit float samples, written big-endian.
///
/// # Safety
///
/// As [`pack_miniseed_generic_`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pack_miniseed_real_(
    data: *const c_void,
    station_id: *const c_char,
    record_length: *const c_int,
    pubversion: *const u8,
    starttime: *const c_char,
    sampling_rate: *const c_double,
    num_samples: *const c_int,
    outfile: *const c_char,
) -> c_int {
    let (encoding, byteorder) = (EncodingFormat::Float32.to_code(), 1);
    unsafe {
        pack_miniseed_generic_(
            data,
            station_id,
            record_length,
            &encoding,
            &byteorder,
            pubversion,
            starttime,
            sampling_rate,
            num_samples,
            outfile,
        )
    }
}

/// Install the stderr log sink. Later calls are ignored.
#[unsafe(no_mangle)]
pub extern "C" fn mseed_pack_init_logging(verbosity: c_int) {
    init_logging(verbosity.clamp(0, u8::MAX.into()) as u8);
}

#[allow(clippy::too_many_arguments)]
unsafe fn request_from_raw<'a>(
    data: *const c_void,
    station_id: *const c_char,
    record_length: c_int,
    encoding: u8,
    byteorder: c_int,
    pubversion: u8,
    starttime: *const c_char,
    sampling_rate: c_double,
    num_samples: c_int,
    outfile: *const c_char,
) -> Result<(PackRequest<'a>, &'a str), PackError> {
    let spec = resolve(encoding)?;
    let count = usize::try_from(num_samples)
        .map_err(|_| PackError::InvalidArgument(format!("negative sample count {num_samples}")))?;

    let station_id = unsafe { c_str(station_id, "station id")? };
    let starttime = unsafe { c_str(starttime, "start time")? };
    let outfile = unsafe { c_str(outfile, "output file")? };

    if data.is_null() {
        return Err(PackError::InvalidArgument("null sample buffer".into()));
    }
    let input: &'a [u8] = match spec.format {
        EncodingFormat::Text => unsafe { CStr::from_ptr(data.cast()) }.to_bytes(),
        _ => {
            let len = count.checked_mul(spec.element_width).ok_or_else(|| {
                PackError::InvalidArgument(format!("{count} samples overflow the address space"))
            })?;
            unsafe { std::slice::from_raw_parts(data.cast::<u8>(), len) }
        }
    };

    let request = PackRequest::new(encoding, input, count)
        .with_station_id(station_id)
        .with_record_length(record_length)
        .with_byte_order(byteorder)
        .with_publication_version(pubversion)
        .with_start_time(starttime)
        .with_sample_rate(sampling_rate);
    Ok((request, outfile))
}

unsafe fn c_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, PackError> {
    if ptr.is_null() {
        return Err(PackError::InvalidArgument(format!("null {what}")));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| PackError::InvalidArgument(format!("{what} is not valid UTF-8")))
}

#[cfg(test)]
mod tests {
    use std::ffi::CString;
    use std::ptr;

    use super::*;
    use crate::reader::MseedReader;
    use crate::record::Samples;

    fn c(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    #[test]
    fn test_pack_miniseed_text() {
        let dir = tempfile::tempdir().unwrap();
        let out = c(dir.path().join("text.mseed").to_str().unwrap());
        let (sid, start, text) = (c("XX.STA.."), c("2025-01-01T00:00:00"), c("HELLO"));

        let status = unsafe {
            pack_miniseed(
                text.as_ptr().cast(),
                sid.as_ptr(),
                512,
                0,
                1,
                1,
                start.as_ptr(),
                1.0,
                5,
                out.as_ptr(),
            )
        };
        assert_eq!(status, 0);

        let bytes = std::fs::read(dir.path().join("text.mseed")).unwrap();
        let record = MseedReader::new(&bytes).next().unwrap().unwrap();
        assert_eq!(record.samples, Samples::Text(b"HELLO".to_vec()));
    }

    #[test]
    fn test_pack_miniseed_real_by_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("real.mseed");
        let out = c(path.to_str().unwrap());
        let (sid, start) = (c("XX.STA.00.BHZ"), c("2025-01-01T00:00:00"));
        let values = [1.5f32, -2.25, 3.0];
        let (reclen, pubv, rate, count) = (512, 1u8, 100.0, 3);

        let status = unsafe {
            pack_miniseed_real_(
                values.as_ptr().cast(),
                sid.as_ptr(),
                &reclen,
                &pubv,
                start.as_ptr(),
                &rate,
                &count,
                out.as_ptr(),
            )
        };
        assert_eq!(status, 0);

        let bytes = std::fs::read(&path).unwrap();
        let record = MseedReader::new(&bytes).next().unwrap().unwrap();
        assert_eq!(record.samples, Samples::Float(values.to_vec()));
    }

    #[test]
    fn test_pack_miniseed_integer_by_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("int.mseed");
        let out = c(path.to_str().unwrap());
        let (sid, start) = (c("XX.STA.00.BHZ"), c("2025,001,00:00:00"));
        let values = [10i32, -20, 30, -40];
        let (reclen, pubv, rate, count) = (0, 1u8, 20.0, 4);

        let status = unsafe {
            pack_miniseed_integer_(
                values.as_ptr().cast(),
                sid.as_ptr(),
                &reclen,
                &pubv,
                start.as_ptr(),
                &rate,
                &count,
                out.as_ptr(),
            )
        };
        assert_eq!(status, 0);
        // Non-positive record length selects 4096
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 4096);
    }

    #[test]
    fn test_unknown_encoding_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never.mseed");
        let out = c(path.to_str().unwrap());
        let (sid, start) = (c("XX.STA.."), c("2025-01-01"));

        let status = unsafe {
            pack_miniseed(
                ptr::null(),
                sid.as_ptr(),
                512,
                99,
                1,
                1,
                start.as_ptr(),
                1.0,
                0,
                out.as_ptr(),
            )
        };
        assert_eq!(status, 1);
        assert!(!path.exists());
    }

    #[test]
    fn test_null_pointers_and_negative_count() {
        let (sid, start, out) = (c("XX.STA.."), c("2025-01-01"), c("unused.mseed"));
        let values = [0i32; 1];
        unsafe {
            assert_eq!(
                pack_miniseed(values.as_ptr().cast(), ptr::null(), 512, 3, 1, 1, start.as_ptr(), 1.0, 1, out.as_ptr()),
                1
            );
            assert_eq!(
                pack_miniseed(ptr::null(), sid.as_ptr(), 512, 3, 1, 1, start.as_ptr(), 1.0, 1, out.as_ptr()),
                1
            );
            assert_eq!(
                pack_miniseed(values.as_ptr().cast(), sid.as_ptr(), 512, 3, 1, 1, start.as_ptr(), 1.0, -1, out.as_ptr()),
                1
            );
            assert_eq!(
                pack_miniseed_generic_(
                    values.as_ptr().cast(),
                    sid.as_ptr(),
                    ptr::null(),
                    &3u8,
                    &1,
                    &1u8,
                    start.as_ptr(),
                    &1.0,
                    &1,
                    out.as_ptr(),
                ),
                1
            );
        }
        assert!(!Path::new("unused.mseed").exists());
    }
}
