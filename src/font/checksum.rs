//! Table checksums and the binary-search fields shared by the sfnt header
//! and the format-4 cmap subtable.

use byteorder::{BigEndian, ByteOrder};

/// Sum a table as big-endian 32-bit words with wraparound.
///
/// Callers pass buffers already padded to a multiple of 4 bytes; a trailing
/// partial word is ignored.
pub fn checksum(data: &[u8]) -> u32 {
    data.chunks_exact(4)
        .fold(0u32, |sum, word| sum.wrapping_add(BigEndian::read_u32(word)))
}

/// Round `len` up to the next multiple of 4.
pub fn pad4(len: usize) -> usize {
    (len + 3) & !3
}

/// `searchRange`, `entrySelector` and `rangeShift` for a binary search over
/// `count` records of `record_size` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinarySearchParams {
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
}

/// Canonical `entrySelector` values for table counts 0 through 20.
const ENTRY_SELECTORS: [u16; 21] = [0, 0, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 3, 3, 3, 3, 4, 4, 4, 4, 4];

impl BinarySearchParams {
    pub fn for_count(count: u16, record_size: u16) -> Self {
        let entry_selector = match ENTRY_SELECTORS.get(count as usize) {
            Some(&selector) => selector,
            None => 15 - count.leading_zeros() as u16,
        };
        let search_range = (1u16 << entry_selector).wrapping_mul(record_size);
        let range_shift = count.wrapping_mul(record_size).wrapping_sub(search_range);
        BinarySearchParams {
            search_range,
            entry_selector,
            range_shift,
        }
    }

    /// Parameters for the sfnt table directory (16-byte records).
    pub fn for_tables(num_tables: u16) -> Self {
        Self::for_count(num_tables, 16)
    }

    /// Parameters for a format-4 segment array (2-byte entries).
    pub fn for_segments(seg_count: u16) -> Self {
        Self::for_count(seg_count, 2)
    }
}
