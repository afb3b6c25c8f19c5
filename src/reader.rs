//! Iterator-based reader for multi-record miniSEED data.
//!
//! Use [`MseedReader`] to iterate over concatenated records in a byte slice,
//! such as the contents of a file written by [`pack`](crate::pack()).

use crate::decode::{self, find_blockette_1000, is_v3};
use crate::decode_v3::peek_v3_record_length;
use crate::encode::V2_HEADER_SIZE;
use crate::record::MseedRecord;
use crate::{MseedError, Result};

/// Iterator over miniSEED records (v2 or v3) in a byte slice.
///
/// Each call to `next()` decodes the next record and advances past it.
/// Iteration stops when the data is exhausted or a decode error occurs.
///
/// # Example
///
/// ```
/// use mseed_pack::{encode, MseedRecord, MseedReader, Samples};
///
/// let record = MseedRecord::new()
///     .with_nslc("XX", "TEST", "00", "BHZ")
///     .with_samples(Samples::Int(vec![1, 2, 3]));
/// let data = encode(&record).unwrap();
///
/// let records: Vec<_> = MseedReader::new(&data)
///     .collect::<Result<Vec<_>, _>>()
///     .unwrap();
/// assert_eq!(records.len(), 1);
/// ```
pub struct MseedReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> MseedReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn fail(&mut self, err: MseedError) -> Option<Result<MseedRecord>> {
        // Move offset to end to stop iteration
        self.offset = self.data.len();
        Some(Err(err))
    }
}

impl Iterator for MseedReader<'_> {
    type Item = Result<MseedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.data.len() {
            return None;
        }

        let remaining = &self.data[self.offset..];
        let record_length = match peek_record_length(remaining) {
            Ok(len) => len,
            Err(e) => return self.fail(e),
        };

        if remaining.len() < record_length {
            return self.fail(MseedError::RecordTooShort {
                expected: record_length,
                actual: remaining.len(),
            });
        }

        match decode::decode(&remaining[..record_length]) {
            Ok(record) => {
                self.offset += record_length;
                Some(Ok(record))
            }
            Err(e) => self.fail(e),
        }
    }
}

/// Length of the record at the start of `data`.
fn peek_record_length(data: &[u8]) -> Result<usize> {
    if is_v3(data) {
        return peek_v3_record_length(data);
    }
    if data.len() < V2_HEADER_SIZE {
        return Err(MseedError::RecordTooShort {
            expected: V2_HEADER_SIZE,
            actual: data.len(),
        });
    }
    let first_blockette = u16::from_be_bytes([data[46], data[47]]) as usize;
    let (_, _, record_length_power) = find_blockette_1000(data, first_blockette)?;
    1usize
        .checked_shl(record_length_power.into())
        .ok_or(MseedError::InvalidHeader)
}
