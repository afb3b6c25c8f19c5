//! Encoding code resolution.

use crate::error::PackError;
use crate::types::{EncodingFormat, SampleType};

/// Resolved encoding: what the caller's elements look like and what they
/// become in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingSpec {
    pub format: EncodingFormat,
    /// Width of one element in the caller's buffer.
    pub element_width: usize,
    pub sample_type: SampleType,
}

impl EncodingSpec {
    pub fn code(&self) -> u8 {
        self.format.to_code()
    }

    /// Whether elements are widened on conversion (declared width smaller
    /// than the in-memory type).
    pub fn widens(&self) -> bool {
        self.element_width < self.sample_type.width()
    }
}

const ENCODING_TABLE: [EncodingSpec; 5] = [
    EncodingSpec {
        format: EncodingFormat::Text,
        element_width: 1,
        sample_type: SampleType::Text,
    },
    EncodingSpec {
        format: EncodingFormat::Int16,
        element_width: 2,
        sample_type: SampleType::Int,
    },
    EncodingSpec {
        format: EncodingFormat::Int32,
        element_width: 4,
        sample_type: SampleType::Int,
    },
    EncodingSpec {
        format: EncodingFormat::Float32,
        element_width: 4,
        sample_type: SampleType::Float,
    },
    EncodingSpec {
        format: EncodingFormat::Float64,
        element_width: 8,
        sample_type: SampleType::Double,
    },
];

/// Look up `code` in the encoding table.
pub fn resolve(code: u8) -> Result<EncodingSpec, PackError> {
    ENCODING_TABLE
        .iter()
        .find(|spec| spec.code() == code)
        .copied()
        .ok_or(PackError::UnsupportedEncoding(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_codes() {
        let expect = [
            (0u8, 1usize, 'a'),
            (1, 2, 'i'),
            (3, 4, 'i'),
            (4, 4, 'f'),
            (5, 8, 'd'),
        ];
        for (code, width, tag) in expect {
            let spec = resolve(code).unwrap();
            assert_eq!(spec.code(), code);
            assert_eq!(spec.element_width, width, "code {code}");
            assert_eq!(spec.sample_type.as_char(), tag, "code {code}");
        }
    }

    #[test]
    fn test_resolve_unknown_codes() {
        for code in [2u8, 6, 10, 11, 30, 99, 255] {
            assert!(matches!(
                resolve(code),
                Err(PackError::UnsupportedEncoding(c)) if c == code
            ));
        }
    }

    #[test]
    fn test_only_int16_widens() {
        let widening: Vec<u8> = ENCODING_TABLE
            .iter()
            .filter(|s| s.widens())
            .map(|s| s.code())
            .collect();
        assert_eq!(widening, vec![1]);
    }
}
