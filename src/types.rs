//! Shared types: [`ByteOrder`], [`EncodingFormat`], [`FormatVersion`] and
//! [`SampleType`].

use std::fmt;

use serde::Deserialize;

use crate::{MseedError, Result};

/// miniSEED format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatVersion {
    /// miniSEED v2 (SEED Manual, 48-byte fixed header + blockettes).
    #[default]
    V2,
    /// miniSEED v3 (FDSN, 40-byte fixed header, little-endian).
    V3,
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V2 => write!(f, "miniSEED v2"),
            Self::V3 => write!(f, "miniSEED v3"),
        }
    }
}

/// Byte order for multi-byte fields in a miniSEED record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Big,
    Little,
}

impl ByteOrder {
    /// Interpret a blockette 1000 style flag: `0` little, `1` big.
    pub fn from_flag(flag: i32) -> Option<Self> {
        match flag {
            0 => Some(Self::Little),
            1 => Some(Self::Big),
            _ => None,
        }
    }

    pub fn to_flag(self) -> u8 {
        match self {
            Self::Big => 1,
            Self::Little => 0,
        }
    }
}

/// Encoding format for sample data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingFormat {
    /// ASCII text (code 0).
    Text,
    /// 16-bit signed integer (code 1).
    Int16,
    /// 32-bit signed integer (code 3).
    Int32,
    /// 32-bit IEEE float (code 4).
    Float32,
    /// 64-bit IEEE double (code 5).
    Float64,
}

impl EncodingFormat {
    /// Convert a raw encoding code (from Blockette 1000 or the v3 header).
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Text),
            1 => Ok(Self::Int16),
            3 => Ok(Self::Int32),
            4 => Ok(Self::Float32),
            5 => Ok(Self::Float64),
            _ => Err(MseedError::UnsupportedEncoding(code)),
        }
    }

    /// Convert to the raw encoding code.
    pub fn to_code(self) -> u8 {
        match self {
            Self::Text => 0,
            Self::Int16 => 1,
            Self::Int32 => 3,
            Self::Float32 => 4,
            Self::Float64 => 5,
        }
    }

    /// Bytes one sample occupies in the data payload.
    pub fn wire_width(self) -> usize {
        match self {
            Self::Text => 1,
            Self::Int16 => 2,
            Self::Int32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }
}

impl fmt::Display for EncodingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "TEXT"),
            Self::Int16 => write!(f, "INT16"),
            Self::Int32 => write!(f, "INT32"),
            Self::Float32 => write!(f, "FLOAT32"),
            Self::Float64 => write!(f, "FLOAT64"),
        }
    }
}

/// In-memory sample representation, tagged the way libmseed tags it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    /// `'a'`: text bytes.
    Text,
    /// `'i'`: 32-bit integers.
    Int,
    /// `'f'`: 32-bit floats.
    Float,
    /// `'d'`: 64-bit floats.
    Double,
}

impl SampleType {
    pub fn as_char(self) -> char {
        match self {
            Self::Text => 'a',
            Self::Int => 'i',
            Self::Float => 'f',
            Self::Double => 'd',
        }
    }

    /// Width of one element in the in-memory representation.
    pub fn width(self) -> usize {
        match self {
            Self::Text => 1,
            Self::Int | Self::Float => 4,
            Self::Double => 8,
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
