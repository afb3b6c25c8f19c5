//! Error types for the miniSEED codec and the packing core.
//!
//! [`MseedError`] covers wire-format encoding, decoding and file output.
//! [`PackError`] is the taxonomy reported by [`pack`](crate::pack()), each
//! variant mapping onto a caller-visible status code.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MseedError {
    #[error("record too short: expected at least {expected} bytes, got {actual}")]
    RecordTooShort { expected: usize, actual: usize },

    #[error("invalid fixed header")]
    InvalidHeader,

    #[error("invalid v3 header: {0}")]
    InvalidV3Header(String),

    #[error("CRC-32C mismatch: stored {stored:#010X}, computed {computed:#010X}")]
    CrcMismatch { stored: u32, computed: u32 },

    #[error("unsupported encoding format: {0}")]
    UnsupportedEncoding(u8),

    #[error("blockette 1000 not found")]
    MissingBlockette1000,

    #[error("sample count mismatch: header says {expected}, decoded {actual}")]
    SampleCountMismatch { expected: usize, actual: usize },

    #[error("encode error: {0}")]
    EncodeError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MseedError>;

/// Status returned for a successful call.
pub const STATUS_OK: i32 = 0;
/// Status for any recoverable packing error.
pub const STATUS_PACK_ERROR: i32 = 1;
/// Status when the record descriptor itself could not be allocated.
pub const STATUS_FATAL: i32 = -1;

/// What a failed allocation was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    SampleBuffer,
    Descriptor,
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SampleBuffer => write!(f, "sample buffer"),
            Self::Descriptor => write!(f, "record descriptor"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PackError {
    #[error("unrecognized encoding: {0}")]
    UnsupportedEncoding(u8),

    #[error("could not allocate {0}, out of memory?")]
    OutOfMemory(Allocation),

    #[error("cannot parse start time {0:?}")]
    TimestampParseFailure(String),

    /// `field` is `"source id"` for the whole id, or the v2 header code
    /// that overflowed.
    #[error("station id {field} is {len} bytes, at most {max} allowed")]
    StationIdTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("sample buffer holds {actual} bytes, {expected} needed")]
    BufferTooShort { expected: usize, actual: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("error writing miniSEED to {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: MseedError,
    },
}

impl PackError {
    /// Caller-visible status code for this error.
    pub fn status(&self) -> i32 {
        match self {
            Self::OutOfMemory(Allocation::Descriptor) => STATUS_FATAL,
            _ => STATUS_PACK_ERROR,
        }
    }
}
